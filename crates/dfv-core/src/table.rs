//! Tabular data adapter.
//!
//! Normalizes whatever a render function returns into a Polars [`DataFrame`],
//! whose row and column positions are the index space used by patches, views
//! and selections.

use std::fmt;

use polars::prelude::*;

use crate::error::{DataViewError, Result};

/// Conversion escape hatch for table types that are not a native [`DataFrame`].
///
/// Implementations should be cheap to call more than once; the adapter calls
/// it exactly once per render.
pub trait ToDataFrame {
    fn to_data_frame(&self) -> PolarsResult<DataFrame>;

    /// Name used in diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl ToDataFrame for LazyFrame {
    fn to_data_frame(&self) -> PolarsResult<DataFrame> {
        self.clone().collect()
    }
}

impl ToDataFrame for Vec<Column> {
    fn to_data_frame(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(self.clone())
    }
}

/// A value returned from a render function before it is normalized.
pub enum TabularData {
    /// Already a native frame.
    Native(DataFrame),
    /// Something that knows how to convert itself.
    Convertible(Box<dyn ToDataFrame + Send + Sync>),
    /// A host value with no known conversion.
    Unsupported {
        /// Name of the host type, for the error message.
        type_name: String,
    },
}

impl TabularData {
    pub fn convertible<T>(value: T) -> Self
    where
        T: ToDataFrame + Send + Sync + 'static,
    {
        Self::Convertible(Box::new(value))
    }

    pub fn unsupported(type_name: impl Into<String>) -> Self {
        Self::Unsupported {
            type_name: type_name.into(),
        }
    }

    /// Convert to the canonical frame.
    ///
    /// `context` is the leading sentence of the error raised for unsupported
    /// values, e.g. "render.data_frame doesn't know how to render objects of type".
    pub fn into_data_frame(self, context: &str) -> Result<DataFrame> {
        match self {
            Self::Native(df) => Ok(df),
            Self::Convertible(value) => {
                tracing::warn!(
                    type_name = value.type_name(),
                    "Returned data is not a native DataFrame; converting it. \
                     Convert the value before returning it to silence this warning."
                );
                value.to_data_frame().map_err(|err| DataViewError::TypeConversion {
                    context: context.to_string(),
                    type_name: format!("{} ({err})", value.type_name()),
                })
            }
            Self::Unsupported { type_name } => Err(DataViewError::TypeConversion {
                context: context.to_string(),
                type_name,
            }),
        }
    }
}

impl From<DataFrame> for TabularData {
    fn from(df: DataFrame) -> Self {
        Self::Native(df)
    }
}

impl From<LazyFrame> for TabularData {
    fn from(lf: LazyFrame) -> Self {
        Self::convertible(lf)
    }
}

impl fmt::Debug for TabularData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(df) => f.debug_tuple("Native").field(&df.shape()).finish(),
            Self::Convertible(value) => f
                .debug_tuple("Convertible")
                .field(&value.type_name())
                .finish(),
            Self::Unsupported { type_name } => f
                .debug_struct("Unsupported")
                .field("type_name", type_name)
                .finish(),
        }
    }
}

/// `(nrows, ncols)` of a frame.
pub fn frame_shape(data: &DataFrame) -> (usize, usize) {
    data.shape()
}

/// Column names in positional order.
pub fn frame_column_names(data: &DataFrame) -> Vec<String> {
    data.get_columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect()
}
