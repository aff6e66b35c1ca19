//! Unified error types for the dfv-core crate.
//!
//! Mode violations that can be caused by client/server races are not errors:
//! the selection resolver recovers from them and reports a
//! [`SelectionWarning`](crate::SelectionWarning) instead.

use thiserror::Error;

/// Error type for all data frame view operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DataViewError {
    // =========================================================================
    // INPUT ERRORS
    // =========================================================================
    /// The rendered value could not be converted to a data frame.
    #[error("{context} {type_name}")]
    TypeConversion {
        /// Leading sentence of the message.
        context: String,
        /// Name of the unsupported type.
        type_name: String,
    },

    /// A client patch batch did not have the expected shape.
    #[error("Malformed patch #{index} sent to output '{output_id}': {reason}")]
    MalformedPatch {
        /// Output that received the batch.
        output_id: String,
        /// Position of the offending entry in the batch.
        index: usize,
        /// What was wrong with the entry.
        reason: String,
    },

    /// A patch callback returned a patch with an invalid shape.
    #[error(
        "The return value of {output_id}'s `patches_fn()` (typically set by `set_patches_fn`) \
         is invalid at index {index}: {reason}. Each item must have a row_index (`usize`), \
         column_index (`usize`), and value (`CellValue`) within the data bounds."
    )]
    InvalidPatchOutput {
        /// Output whose callback produced the value.
        output_id: String,
        /// Position of the offending patch in the callback output.
        index: usize,
        /// What was wrong with the patch.
        reason: String,
    },

    /// A user supplied patch callback failed.
    #[error("Patch callback for output '{output_id}' failed: {message}")]
    PatchCallback {
        /// Output whose callback failed.
        output_id: String,
        /// Message reported by the callback.
        message: String,
    },

    // =========================================================================
    // INDEX ERRORS
    // =========================================================================
    /// A column index outside `0..ncols`.
    #[error("Column index {column} is out of bounds for data with {ncols} columns")]
    ColumnOutOfBounds {
        /// Requested column.
        column: usize,
        /// Number of columns in the data.
        ncols: usize,
    },

    /// A row index outside `0..nrows`.
    #[error("Row index {row} is out of bounds for data with {nrows} rows")]
    RowOutOfBounds {
        /// Requested row.
        row: usize,
        /// Number of rows in the data.
        nrows: usize,
    },

    // =========================================================================
    // SELECTION ERRORS
    // =========================================================================
    /// Selection mode configuration is invalid.
    #[error("Invalid selection modes: {message}")]
    InvalidSelectionMode {
        /// Description of the conflict.
        message: String,
    },

    /// A selection feature that is not implemented yet.
    #[error("{feature} is not yet supported")]
    UnsupportedSelection {
        /// Name of the unsupported feature.
        feature: String,
    },

    /// A programmatic selection update that the current modes do not allow.
    #[error(
        "Current selection modes do not support {kind} based selection. \
         Current selection modes: {modes}"
    )]
    SelectionNotAllowed {
        /// Granularity of the rejected selection.
        kind: String,
        /// The configured selection modes.
        modes: String,
    },

    // =========================================================================
    // LIFECYCLE ERRORS
    // =========================================================================
    /// The output was bound under a different session than it was created in.
    #[error(
        "The session used when creating the renderer ({created}) is not the same session \
         used when executing the renderer ({active})"
    )]
    SessionMismatch {
        /// Session that created the output.
        created: String,
        /// Session that tried to execute it.
        active: String,
    },

    /// The output was used before it was bound to a session.
    #[error("Output has not been bound to a session; call `bind()` first")]
    NotBound,

    /// A read happened before any data was rendered.
    #[error("Output '{output_id}' has no rendered data")]
    NotRendered {
        /// Output that was read.
        output_id: String,
    },

    // =========================================================================
    // WRAPPED ERRORS
    // =========================================================================
    /// Polars DataFrame operation error.
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type alias for data frame view operations.
pub type Result<T> = std::result::Result<T, DataViewError>;

impl DataViewError {
    /// Check if this error can be fixed by the client resending a corrected request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedPatch { .. }
                | Self::ColumnOutOfBounds { .. }
                | Self::RowOutOfBounds { .. }
                | Self::NotRendered { .. }
        )
    }
}
