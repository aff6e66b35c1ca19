//! Render payload sent to the browser.

use dfv_common::any_to_json;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::grid::FrameOptions;
use crate::patch::CellPatch;
use crate::selection::SelectionModes;
use crate::table::frame_column_names;

/// Column type hint used by the browser to pick filters and alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TypeHint {
    Numeric,
    String,
    Html,
    Boolean,
    Datetime,
    Unknown,
}

impl TypeHint {
    pub fn for_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::String => Self::String,
            DataType::Boolean => Self::Boolean,
            dtype if dtype.is_numeric() => Self::Numeric,
            dtype if dtype.is_temporal() => Self::Datetime,
            _ => Self::Unknown,
        }
    }
}

/// Type hints for every column of `data`, in column order.
pub fn frame_type_hints(data: &DataFrame) -> Vec<TypeHint> {
    data.get_columns()
        .iter()
        .map(|column| TypeHint::for_dtype(column.dtype()))
        .collect()
}

/// Mark string columns holding a markup patch as `html`.
pub fn apply_html_hints(hints: &mut [TypeHint], patches: &[CellPatch]) {
    for patch in patches.iter().filter(|patch| patch.value.is_html()) {
        if let Some(hint) = hints.get_mut(patch.column_index)
            && *hint == TypeHint::String
        {
            *hint = TypeHint::Html;
        }
    }
}

/// Serialized table: column names, row-major cells, hints and options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameJson {
    pub columns: Vec<String>,
    pub data: Vec<Vec<Value>>,
    pub type_hints: Vec<TypeHint>,
    pub options: FrameOptions,
}

impl FrameJson {
    pub fn from_frame(data: &DataFrame, options: FrameOptions) -> Result<Self> {
        let (nrows, _) = data.shape();
        let mut rows = vec![Vec::with_capacity(data.width()); nrows];
        for column in data.get_columns() {
            for (row, cells) in rows.iter_mut().enumerate() {
                cells.push(any_to_json(column.get(row)?));
            }
        }
        Ok(Self {
            columns: frame_column_names(data),
            data: rows,
            type_hints: frame_type_hints(data),
            options,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchInfo {
    pub key: String,
}

/// The value returned by a render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRender {
    pub payload: FrameJson,
    pub patch_info: PatchInfo,
    pub selection_modes: SelectionModes,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::grid::DataGrid;
    use crate::patch::CellValue;

    fn sample() -> DataFrame {
        DataFrame::new(vec![
            Series::new("name".into(), &[Some("a"), None]).into(),
            Series::new("n".into(), &[1i64, 2]).into(),
            Series::new("x".into(), &[0.5f64, f64::NAN]).into(),
            Series::new("flag".into(), &[true, false]).into(),
        ])
        .expect("frame")
    }

    #[test]
    fn test_type_hints() {
        assert_eq!(
            frame_type_hints(&sample()),
            vec![
                TypeHint::String,
                TypeHint::Numeric,
                TypeHint::Numeric,
                TypeHint::Boolean
            ]
        );
        assert_eq!(
            serde_json::to_value(TypeHint::Numeric).expect("json"),
            json!({"type": "numeric"})
        );
    }

    #[test]
    fn test_html_hint_only_applies_to_string_columns() {
        let mut hints = frame_type_hints(&sample());
        apply_html_hints(
            &mut hints,
            &[
                CellPatch::new(0, 0, CellValue::html("<i>a</i>")),
                CellPatch::new(0, 1, CellValue::html("<i>1</i>")),
            ],
        );
        assert_eq!(hints[0], TypeHint::Html);
        assert_eq!(hints[1], TypeHint::Numeric);
    }

    #[test]
    fn test_frame_json_is_row_major() {
        let frame = sample();
        let json = FrameJson::from_frame(&frame, DataGrid::new(frame.clone()).options)
            .expect("payload");
        assert_eq!(json.columns, vec!["name", "n", "x", "flag"]);
        assert_eq!(
            json.data,
            vec![
                vec![json!("a"), json!(1), json!(0.5), json!(true)],
                vec![json!(null), json!(2), json!(null), json!(false)],
            ]
        );
    }
}
