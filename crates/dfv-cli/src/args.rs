//! Parsers for the `--sort`, `--filter` and `--patch` argument forms.
//!
//! Columns may be given by position or by name; names are resolved once the
//! CSV has been loaded.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};

use dfv_core::{ColumnFilter, ColumnSort};

/// A column given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl ColumnRef {
    /// Resolve against the loaded frame's column names.
    pub fn resolve(&self, names: &[String]) -> Result<usize> {
        match self {
            Self::Index(index) if *index < names.len() => Ok(*index),
            Self::Index(index) => bail!(
                "column {index} is out of bounds for data with {} columns",
                names.len()
            ),
            Self::Name(name) => names
                .iter()
                .position(|candidate| candidate == name)
                .ok_or_else(|| anyhow!("unknown column '{name}'")),
        }
    }
}

impl FromStr for ColumnRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            bail!("column must not be empty");
        }
        Ok(match s.parse::<usize>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Name(s.to_string()),
        })
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// `COL` or `COL:asc` or `COL:desc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortArg {
    pub column: ColumnRef,
    pub desc: bool,
}

impl SortArg {
    pub fn resolve(&self, names: &[String]) -> Result<ColumnSort> {
        Ok(ColumnSort {
            col: self.column.resolve(names)?,
            desc: self.desc,
        })
    }
}

impl FromStr for SortArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (column, desc) = match s.rsplit_once(':') {
            Some((column, "desc")) => (column, true),
            Some((column, "asc")) => (column, false),
            Some((_, direction)) => {
                bail!("sort direction must be 'asc' or 'desc', got '{direction}'")
            }
            None => (s, false),
        };
        Ok(Self {
            column: column.parse()?,
            desc,
        })
    }
}

/// What a `--filter` matches.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterArgValue {
    Text(String),
    Range(Option<f64>, Option<f64>),
}

/// `COL=TEXT` or `COL=MIN..MAX`, where either range bound may be omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterArg {
    pub column: ColumnRef,
    pub value: FilterArgValue,
}

impl FilterArg {
    pub fn resolve(&self, names: &[String]) -> Result<ColumnFilter> {
        let col = self.column.resolve(names)?;
        Ok(match &self.value {
            FilterArgValue::Text(text) => ColumnFilter::text(col, text.clone()),
            FilterArgValue::Range(min, max) => ColumnFilter::range(col, *min, *max),
        })
    }
}

impl FromStr for FilterArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (column, value) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("filter must look like COL=TEXT or COL=MIN..MAX"))?;
        let value = match value.split_once("..") {
            Some((min, max)) => FilterArgValue::Range(parse_bound(min)?, parse_bound(max)?),
            None => FilterArgValue::Text(value.to_string()),
        };
        Ok(Self {
            column: column.parse()?,
            value,
        })
    }
}

fn parse_bound(bound: &str) -> Result<Option<f64>> {
    let bound = bound.trim();
    if bound.is_empty() {
        return Ok(None);
    }
    let value: f64 = bound
        .parse()
        .with_context(|| format!("range bound '{bound}' is not a number"))?;
    Ok(Some(value))
}

/// `ROW,COL=VALUE`; the row is a position in the loaded data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchArg {
    pub row: usize,
    pub column: ColumnRef,
    pub value: String,
}

impl FromStr for PatchArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (target, value) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("patch must look like ROW,COL=VALUE"))?;
        let (row, column) = target
            .split_once(',')
            .ok_or_else(|| anyhow!("patch target must look like ROW,COL"))?;
        let row = row
            .trim()
            .parse()
            .with_context(|| format!("patch row '{row}' is not a row number"))?;
        Ok(Self {
            row,
            column: column.parse()?,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["id".to_string(), "name".to_string()]
    }

    #[test]
    fn test_column_ref_by_index_or_name() {
        assert_eq!("1".parse::<ColumnRef>().unwrap(), ColumnRef::Index(1));
        assert_eq!(
            "name".parse::<ColumnRef>().unwrap(),
            ColumnRef::Name("name".to_string())
        );
        assert_eq!(ColumnRef::Name("name".into()).resolve(&names()).unwrap(), 1);
        assert!(ColumnRef::Index(2).resolve(&names()).is_err());
        assert!(ColumnRef::Name("age".into()).resolve(&names()).is_err());
        assert!("".parse::<ColumnRef>().is_err());
    }

    #[test]
    fn test_sort_directions() {
        let sort: SortArg = "name:desc".parse().unwrap();
        assert!(sort.desc);
        assert_eq!(sort.resolve(&names()).unwrap(), ColumnSort::desc(1));

        let sort: SortArg = "0".parse().unwrap();
        assert_eq!(sort.resolve(&names()).unwrap(), ColumnSort::asc(0));

        assert!("0:up".parse::<SortArg>().is_err());
    }

    #[test]
    fn test_filter_forms() {
        let filter: FilterArg = "name=ali".parse().unwrap();
        assert_eq!(filter.value, FilterArgValue::Text("ali".to_string()));

        let filter: FilterArg = "id=2..".parse().unwrap();
        assert_eq!(filter.value, FilterArgValue::Range(Some(2.0), None));
        assert_eq!(
            filter.resolve(&names()).unwrap(),
            ColumnFilter::range(0, Some(2.0), None)
        );

        let filter: FilterArg = "id=..1.5".parse().unwrap();
        assert_eq!(filter.value, FilterArgValue::Range(None, Some(1.5)));

        assert!("id".parse::<FilterArg>().is_err());
        assert!("id=a..b".parse::<FilterArg>().is_err());
    }

    #[test]
    fn test_patch_form() {
        let patch: PatchArg = "3,name=Zed, Jr.".parse().unwrap();
        assert_eq!(patch.row, 3);
        assert_eq!(patch.column, ColumnRef::Name("name".to_string()));
        assert_eq!(patch.value, "Zed, Jr.");

        assert!("x,1=a".parse::<PatchArg>().is_err());
        assert!("1=a".parse::<PatchArg>().is_err());
    }
}
