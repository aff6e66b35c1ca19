//! Polars AnyValue utility functions.
//!
//! This module provides helper functions for working with Polars `AnyValue` types,
//! including display strings, numeric coercion, JSON conversion and sort keys.

use std::cmp::Ordering;

use polars::prelude::*;
use serde_json::{Number, Value};

/// Converts a Polars `AnyValue` to the string shown in a grid cell.
///
/// Returns an empty string for `Null` and formats floats without
/// unnecessary trailing zeros.
///
/// # Examples
///
/// ```
/// use polars::prelude::AnyValue;
/// use dfv_common::any_to_string;
///
/// assert_eq!(any_to_string(AnyValue::Null), "");
/// assert_eq!(any_to_string(AnyValue::Int32(42)), "42");
/// assert_eq!(any_to_string(AnyValue::Float64(2.50)), "2.5");
/// assert_eq!(any_to_string(AnyValue::Boolean(true)), "true");
/// ```
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => {
            let s = other.to_string();
            // Display wraps some values in quotes
            if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
                s[1..s.len() - 1].to_string()
            } else {
                s
            }
        }
    }
}

/// Formats a floating-point number as a string without trailing zeros after decimal.
///
/// Integer-valued floats like 40.0 are formatted as "40", not "4".
///
/// # Examples
///
/// ```
/// use dfv_common::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(1.50), "1.5");
/// assert_eq!(format_numeric(100.0), "100");
/// ```
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        s
    }
}

/// Converts an `AnyValue` to `f64`, returning `None` for non-numeric or null values.
///
/// Strings are parsed, so a patched text cell holding "12" still takes part in
/// numeric range filters. Booleans are not numeric.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Null | AnyValue::Boolean(_) => None,
        AnyValue::String(s) => parse_f64(s),
        AnyValue::StringOwned(s) => parse_f64(s.as_str()),
        other if other.dtype().is_numeric() => other.extract::<f64>(),
        _ => None,
    }
}

/// Parses a string as `f64`, returning `None` for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Converts a cell to a JSON scalar for the browser payload.
///
/// Integers stay integers, non-finite floats become `null` and anything
/// without a native JSON form is sent as its display string.
pub fn any_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Float32(v) => float_to_json(f64::from(v)),
        AnyValue::Float64(v) => float_to_json(v),
        other => {
            let dtype = other.dtype();
            let number = if dtype.is_unsigned_integer() {
                other.extract::<u64>().map(Number::from)
            } else if dtype.is_integer() {
                other.extract::<i64>().map(Number::from)
            } else {
                None
            };
            match number {
                Some(n) => Value::Number(n),
                None => Value::String(any_to_string(other)),
            }
        }
    }
}

fn float_to_json(v: f64) -> Value {
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}

/// Comparable projection of a cell used by the view sort.
///
/// `Missing` covers nulls and NaN; callers decide where missing values go.
/// Present values of different kinds order as booleans, then numbers, then text.
/// Text that parses as a number keys as that number, so a numeric column that
/// was converted to strings by an edit keeps its numeric order.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SortKey {
    /// Build the sort key for a cell.
    pub fn from_any(value: AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => Self::Missing,
            AnyValue::Boolean(b) => Self::Bool(b),
            AnyValue::String(s) => Self::from_text(s),
            AnyValue::StringOwned(s) => Self::from_text(s.as_str()),
            other if other.dtype().is_numeric() => match other.extract::<f64>() {
                Some(v) if !v.is_nan() => Self::Number(v),
                _ => Self::Missing,
            },
            other => Self::Text(any_to_string(other)),
        }
    }

    fn from_text(text: &str) -> Self {
        match parse_f64(text) {
            Some(v) if !v.is_nan() => Self::Number(v),
            _ => Self::Text(text.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Compare two present keys. Missing keys compare equal to each other and
    /// greater than everything else; view code places them explicitly.
    pub fn cmp_present(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
            Self::Missing => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_to_string_null() {
        assert_eq!(any_to_string(AnyValue::Null), "");
    }

    #[test]
    fn test_any_to_string_integers() {
        assert_eq!(any_to_string(AnyValue::Int32(42)), "42");
        assert_eq!(any_to_string(AnyValue::Int64(-100)), "-100");
        assert_eq!(any_to_string(AnyValue::UInt32(0)), "0");
    }

    #[test]
    fn test_any_to_string_floats() {
        assert_eq!(any_to_string(AnyValue::Float64(1.5)), "1.5");
        assert_eq!(any_to_string(AnyValue::Float64(1.0)), "1");
    }

    #[test]
    fn test_any_to_string_boolean() {
        assert_eq!(any_to_string(AnyValue::Boolean(true)), "true");
        assert_eq!(any_to_string(AnyValue::Boolean(false)), "false");
    }

    #[test]
    fn test_format_numeric() {
        assert_eq!(format_numeric(0.0), "0");
        assert_eq!(format_numeric(40.0), "40");
        assert_eq!(format_numeric(1000.0), "1000");
        assert_eq!(format_numeric(40.50), "40.5");
    }

    #[test]
    fn test_any_to_f64() {
        assert_eq!(any_to_f64(AnyValue::Null), None);
        assert_eq!(any_to_f64(AnyValue::Int32(42)), Some(42.0));
        assert_eq!(any_to_f64(AnyValue::Float64(3.25)), Some(3.25));
        assert_eq!(any_to_f64(AnyValue::String(" 2.5 ")), Some(2.5));
        assert_eq!(any_to_f64(AnyValue::String("N2")), None);
        assert_eq!(any_to_f64(AnyValue::Boolean(true)), None);
    }

    #[test]
    fn test_any_to_json() {
        assert_eq!(any_to_json(AnyValue::Null), Value::Null);
        assert_eq!(any_to_json(AnyValue::Int64(7)), serde_json::json!(7));
        assert_eq!(any_to_json(AnyValue::UInt32(7)), serde_json::json!(7));
        assert_eq!(any_to_json(AnyValue::Float64(1.5)), serde_json::json!(1.5));
        assert_eq!(any_to_json(AnyValue::Float64(f64::NAN)), Value::Null);
        assert_eq!(any_to_json(AnyValue::String("a")), serde_json::json!("a"));
        assert_eq!(any_to_json(AnyValue::Boolean(false)), serde_json::json!(false));
    }

    #[test]
    fn test_sort_key_from_any() {
        assert_eq!(SortKey::from_any(AnyValue::Null), SortKey::Missing);
        assert_eq!(SortKey::from_any(AnyValue::Float64(f64::NAN)), SortKey::Missing);
        assert_eq!(SortKey::from_any(AnyValue::Int32(3)), SortKey::Number(3.0));
        assert_eq!(
            SortKey::from_any(AnyValue::String("a")),
            SortKey::Text("a".to_string())
        );
    }

    #[test]
    fn test_sort_key_numeric_text() {
        assert_eq!(SortKey::from_any(AnyValue::String("10")), SortKey::Number(10.0));
        assert_eq!(SortKey::from_any(AnyValue::String(" 2.5 ")), SortKey::Number(2.5));
        assert_eq!(
            SortKey::from_any(AnyValue::String("NaN")),
            SortKey::Text("NaN".to_string())
        );
        assert_eq!(SortKey::from_any(AnyValue::String("")), SortKey::Text(String::new()));

        let ten = SortKey::from_any(AnyValue::String("10"));
        let three = SortKey::from_any(AnyValue::String("3"));
        assert_eq!(three.cmp_present(&ten), Ordering::Less);
    }

    #[test]
    fn test_sort_key_ordering() {
        let one = SortKey::Number(1.0);
        let two = SortKey::Number(2.0);
        assert_eq!(one.cmp_present(&two), Ordering::Less);
        assert_eq!(
            SortKey::Text("a".into()).cmp_present(&SortKey::Text("z".into())),
            Ordering::Less
        );
        assert_eq!(
            SortKey::Bool(true).cmp_present(&SortKey::Number(0.0)),
            Ordering::Less
        );
        assert_eq!(
            SortKey::Number(10.0).cmp_present(&SortKey::Text("1".into())),
            Ordering::Less
        );
    }
}
