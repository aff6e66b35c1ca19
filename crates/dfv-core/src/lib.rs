//! Interactive data frame view engine.
//!
//! Takes a rendered table, tracks cell-level edits, and derives the rows and
//! selection the browser is showing as the user sorts, filters and selects.
//!
//! # Overview
//!
//! This crate provides:
//! - **Tabular data adapter**: normalize render values into a Polars `DataFrame`
//! - **Patch store**: copy-on-write map of the latest edit per cell
//! - **Patched view**: the rendered data with every patch overlaid
//! - **Sort/filter pipeline**: ordered view row positions
//! - **Cell selection resolver**: reconcile browser selections with the view
//! - **Edit request handler**: run user patch callbacks over client batches
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dfv_core::{ColumnSort, DataFrameOutput, DataGrid, MemorySession, SelectionMode};
//!
//! let session = Arc::new(MemorySession::new("session-1"));
//! let mut output = DataFrameOutput::new(session.clone());
//! output.bind("grid", session.as_ref())?;
//!
//! let grid = DataGrid::new(df).with_selection_mode(&[SelectionMode::Rows])?;
//! let render = output.render(Some(grid.into()))?;
//!
//! output.set_input_column_sort(vec![ColumnSort::desc(1)]);
//! let view = output.data_view(false)?;
//! ```
//!
//! # Coordinates
//!
//! Patches and selections always address rows and columns of the rendered
//! frame, never positions within the sorted or filtered view.

mod config;
mod edit;
mod error;
mod grid;
mod memo;
mod output;
mod patch;
mod patched;
mod payload;
mod selection;
mod session;
mod table;
mod view;

// Error type
pub use error::{DataViewError, Result};

// Configuration
pub use config::{NullPlacement, StringFilterMode, ViewConfig};

// Tabular data
pub use grid::{DataGrid, Dimension, FrameOptions, FrameStyle, Renderable, Summary};
pub use table::{TabularData, ToDataFrame, frame_column_names, frame_shape};

// Patches
pub use patch::{CellHtml, CellPatch, CellValue, HtmlContent, PatchStore};
pub use patched::apply_frame_patches;

// Views
pub use view::{ColumnFilter, ColumnSort, FilterValue, data_view_rows, subset_frame};

// Selection
pub use selection::{
    AxisMode, CellSelection, RectMode, ResolvedSelection, SelectionMode, SelectionModes,
    SelectionRequest, SelectionWarning, resolve_cell_selection,
};

// Edits
pub use edit::{
    PatchFn, PatchFnError, PatchHandlers, PatchesFn, parse_patch_batch, validate_patch_output,
};

// Payload
pub use payload::{FrameJson, FrameRender, PatchInfo, TypeHint, frame_type_hints};

// Session and output
pub use memo::{Memo, Source};
pub use output::{DataFrameOutput, patches_handler_name};
pub use session::{DATA_FRAME_MESSAGE, MemorySession, SentMessage, Session, SessionId};
