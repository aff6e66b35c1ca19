//! Patched-view derivation.
//!
//! Overlays the patch store on the rendered frame. Cloning a [`DataFrame`]
//! only clones column handles, so untouched columns stay shared with the
//! rendered data and only patched columns are rebuilt.

use std::collections::BTreeMap;

use polars::prelude::*;

use crate::error::{DataViewError, Result};
use crate::patch::{CellPatch, CellValue};

/// Apply every patch to a shallow copy of `data`.
///
/// Patched values are parsed into the column's numeric type when every patch
/// for that column parses; otherwise the column is converted to strings.
pub fn apply_frame_patches(data: &DataFrame, patches: &[CellPatch]) -> Result<DataFrame> {
    if patches.is_empty() {
        return Ok(data.clone());
    }

    let (nrows, ncols) = data.shape();
    let mut by_column: BTreeMap<usize, Vec<(usize, &CellValue)>> = BTreeMap::new();
    for patch in patches {
        if patch.column_index >= ncols {
            return Err(DataViewError::ColumnOutOfBounds {
                column: patch.column_index,
                ncols,
            });
        }
        if patch.row_index >= nrows {
            return Err(DataViewError::RowOutOfBounds {
                row: patch.row_index,
                nrows,
            });
        }
        by_column
            .entry(patch.column_index)
            .or_default()
            .push((patch.row_index, &patch.value));
    }

    let mut patched = data.clone();
    for (column_index, edits) in by_column {
        let series = patch_column(&data.get_columns()[column_index], &edits)?;
        patched.with_column(series)?;
    }

    tracing::debug!(patches = patches.len(), rows = nrows, "applied cell patches");
    Ok(patched)
}

fn patch_column(column: &Column, edits: &[(usize, &CellValue)]) -> Result<Series> {
    let series = column.as_materialized_series();
    let name = series.name().clone();
    let dtype = series.dtype();

    if dtype.is_integer() {
        if let Some(parsed) = parse_edits(edits, |text| text.parse::<i64>().ok()) {
            let base = series.cast(&DataType::Int64)?;
            let mut values: Vec<Option<i64>> = base.i64()?.into_iter().collect();
            for (row, value) in parsed {
                values[row] = Some(value);
            }
            return Ok(Series::new(name, values));
        }
    }

    if dtype.is_numeric() {
        if let Some(parsed) = parse_edits(edits, |text| text.parse::<f64>().ok()) {
            let base = series.cast(&DataType::Float64)?;
            let mut values: Vec<Option<f64>> = base.f64()?.into_iter().collect();
            for (row, value) in parsed {
                values[row] = Some(value);
            }
            return Ok(Series::new(name, values));
        }
    }

    let base = series.cast(&DataType::String)?;
    let mut values: Vec<Option<String>> = base
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    for (row, value) in edits {
        values[*row] = Some(value.as_str().to_string());
    }
    Ok(Series::new(name, values))
}

fn parse_edits<T>(
    edits: &[(usize, &CellValue)],
    parse: impl Fn(&str) -> Option<T>,
) -> Option<Vec<(usize, T)>> {
    edits
        .iter()
        .map(|(row, value)| match *value {
            CellValue::Text(text) => parse(text.trim()).map(|parsed| (*row, parsed)),
            CellValue::Html(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        DataFrame::new(vec![
            Series::new("name".into(), &["b", "a", "c"]).into(),
            Series::new("n".into(), &[2i64, 1, 3]).into(),
            Series::new("x".into(), &[0.5f64, 1.5, 2.5]).into(),
        ])
        .expect("frame")
    }

    fn cell(df: &DataFrame, row: usize, col: usize) -> String {
        dfv_common::any_to_string(df.get_columns()[col].get(row).expect("cell"))
    }

    #[test]
    fn test_no_patches_returns_same_data() {
        let df = sample();
        let patched = apply_frame_patches(&df, &[]).expect("patched");
        assert!(patched.equals(&df));
    }

    #[test]
    fn test_string_patch() {
        let df = sample();
        let patched = apply_frame_patches(&df, &[CellPatch::new(1, 0, "z")]).expect("patched");
        assert_eq!(cell(&patched, 1, 0), "z");
        assert_eq!(cell(&patched, 0, 0), "b");
        // The rendered data is untouched.
        assert_eq!(cell(&df, 1, 0), "a");
    }

    #[test]
    fn test_numeric_patch_keeps_numeric_column() {
        let df = sample();
        let patched = apply_frame_patches(
            &df,
            &[CellPatch::new(0, 1, "10"), CellPatch::new(2, 2, "9.25")],
        )
        .expect("patched");
        assert_eq!(patched.get_columns()[1].dtype(), &DataType::Int64);
        assert_eq!(patched.get_columns()[2].dtype(), &DataType::Float64);
        assert_eq!(cell(&patched, 0, 1), "10");
        assert_eq!(cell(&patched, 2, 2), "9.25");
    }

    #[test]
    fn test_integer_column_widens_to_float() {
        let patched =
            apply_frame_patches(&sample(), &[CellPatch::new(0, 1, "2.5")]).expect("patched");
        assert_eq!(patched.get_columns()[1].dtype(), &DataType::Float64);
        assert_eq!(cell(&patched, 0, 1), "2.5");
    }

    #[test]
    fn test_non_numeric_patch_converts_column_to_string() {
        let patched =
            apply_frame_patches(&sample(), &[CellPatch::new(0, 1, "many")]).expect("patched");
        assert_eq!(patched.get_columns()[1].dtype(), &DataType::String);
        assert_eq!(cell(&patched, 0, 1), "many");
        assert_eq!(cell(&patched, 1, 1), "1");
    }

    #[test]
    fn test_html_patch_is_stored_as_text() {
        let patches = [CellPatch::new(2, 0, CellValue::html("<b>c</b>"))];
        let patched = apply_frame_patches(&sample(), &patches).expect("patched");
        assert_eq!(cell(&patched, 2, 0), "<b>c</b>");
    }

    #[test]
    fn test_out_of_bounds_patch_fails() {
        let err = apply_frame_patches(&sample(), &[CellPatch::new(3, 0, "z")]).expect_err("row");
        assert!(matches!(err, DataViewError::RowOutOfBounds { row: 3, nrows: 3 }));

        let err = apply_frame_patches(&sample(), &[CellPatch::new(0, 3, "z")]).expect_err("col");
        assert!(matches!(err, DataViewError::ColumnOutOfBounds { column: 3, ncols: 3 }));
    }
}
