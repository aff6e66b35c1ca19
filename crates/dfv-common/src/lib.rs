//! Shared utilities for the data frame view crates.
//!
//! Everything here operates on single Polars [`AnyValue`](polars::prelude::AnyValue)
//! cells: display strings for string filters, numeric coercion for range
//! filters, JSON conversion for render payloads and sort keys for the
//! multi-column sort.

mod value;

pub use value::{SortKey, any_to_f64, any_to_json, any_to_string, format_numeric, parse_f64};
