//! Sort/filter pipeline and view subsetting.
//!
//! The browser describes its view declaratively: an ordered list of column
//! sorts and a set of column filters. [`data_view_rows`] turns those into the
//! ordered row positions (in rendered-data coordinates) the browser displays,
//! always evaluated against the patched data.

use std::cmp::Ordering;

use dfv_common::{SortKey, any_to_f64, any_to_string};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{NullPlacement, ViewConfig};
use crate::error::{DataViewError, Result};

/// One level of a multi-column sort. The first entry of a sort list dominates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSort {
    pub col: usize,
    pub desc: bool,
}

impl ColumnSort {
    pub fn asc(col: usize) -> Self {
        Self { col, desc: false }
    }

    pub fn desc(col: usize) -> Self {
        Self { col, desc: true }
    }
}

/// Filter criterion: text match or an inclusive numeric range.
///
/// On the wire a range is a two element array where either bound may be `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Range(Option<f64>, Option<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub col: usize,
    pub value: FilterValue,
}

impl ColumnFilter {
    pub fn text(col: usize, value: impl Into<String>) -> Self {
        Self {
            col,
            value: FilterValue::Text(value.into()),
        }
    }

    pub fn range(col: usize, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            col,
            value: FilterValue::Range(min, max),
        }
    }

    fn matches(&self, cell: AnyValue<'_>, config: &ViewConfig) -> bool {
        match &self.value {
            FilterValue::Text(needle) => config.string_filter.matches(&any_to_string(cell), needle),
            FilterValue::Range(min, max) => match any_to_f64(cell) {
                Some(v) if !v.is_nan() => {
                    min.is_none_or(|min| v >= min) && max.is_none_or(|max| v <= max)
                }
                _ => false,
            },
        }
    }
}

fn check_column(col: usize, ncols: usize) -> Result<()> {
    if col >= ncols {
        return Err(DataViewError::ColumnOutOfBounds { column: col, ncols });
    }
    Ok(())
}

/// Compute the filtered and sorted row positions of `data`.
///
/// Filters are AND-ed together. Sorting applies a stable sort per key,
/// iterating the sort list in reverse so the first key ends up outermost.
/// Every referenced column must exist.
pub fn data_view_rows(
    data: &DataFrame,
    sort: &[ColumnSort],
    filter: &[ColumnFilter],
    config: &ViewConfig,
) -> Result<Vec<usize>> {
    let (nrows, ncols) = data.shape();
    for column_sort in sort {
        check_column(column_sort.col, ncols)?;
    }
    for column_filter in filter {
        check_column(column_filter.col, ncols)?;
    }

    let mut rows: Vec<usize> = (0..nrows).collect();
    for column_filter in filter {
        let column = &data.get_columns()[column_filter.col];
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if column_filter.matches(column.get(row)?, config) {
                kept.push(row);
            }
        }
        rows = kept;
    }

    for column_sort in sort.iter().rev() {
        let column = &data.get_columns()[column_sort.col];
        let keys = (0..nrows)
            .map(|row| column.get(row).map(SortKey::from_any))
            .collect::<PolarsResult<Vec<_>>>()?;
        rows.sort_by(|&a, &b| compare_keys(&keys[a], &keys[b], column_sort.desc, config.nulls));
    }

    tracing::trace!(
        rows = rows.len(),
        total = nrows,
        sorts = sort.len(),
        filters = filter.len(),
        "derived data view rows"
    );
    Ok(rows)
}

fn compare_keys(a: &SortKey, b: &SortKey, desc: bool, nulls: NullPlacement) -> Ordering {
    let missing_order = match nulls {
        NullPlacement::First => Ordering::Less,
        NullPlacement::Last => Ordering::Greater,
    };
    match (a.is_missing(), b.is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => missing_order,
        (false, true) => missing_order.reverse(),
        (false, false) => {
            let ordering = a.cmp_present(b);
            if desc { ordering.reverse() } else { ordering }
        }
    }
}

/// Return a subset of `data` by row positions and column positions.
///
/// `None` keeps every row (or column). Row order follows `rows`.
pub fn subset_frame(
    data: &DataFrame,
    rows: Option<&[usize]>,
    cols: Option<&[usize]>,
) -> Result<DataFrame> {
    let (nrows, ncols) = data.shape();

    let mut subset = match cols {
        None => data.clone(),
        Some([]) => return Ok(DataFrame::empty()),
        Some(cols) => {
            let mut names = Vec::with_capacity(cols.len());
            for &col in cols {
                check_column(col, ncols)?;
                names.push(data.get_columns()[col].name().clone());
            }
            data.select(names)?
        }
    };

    if let Some(rows) = rows {
        let mut indices = Vec::with_capacity(rows.len());
        for &row in rows {
            if row >= nrows {
                return Err(DataViewError::RowOutOfBounds { row, nrows });
            }
            indices.push(row as IdxSize);
        }
        subset = subset.take(&IdxCa::from_vec("rows".into(), indices))?;
    }
    Ok(subset)
}
