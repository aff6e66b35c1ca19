//! Engine configuration.
//!
//! ```toml
//! string_filter = "contains_insensitive"
//! nulls = "last"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How a string column filter matches cell text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFilterMode {
    /// Case-insensitive substring match (the browser grid's own behavior).
    #[default]
    ContainsInsensitive,
    /// Case-sensitive substring match.
    Contains,
    /// Case-sensitive prefix match.
    Prefix,
    /// Whole-cell equality.
    Exact,
}

impl StringFilterMode {
    /// Returns true if `text` matches the filter `needle`.
    pub fn matches(self, text: &str, needle: &str) -> bool {
        match self {
            Self::ContainsInsensitive => text.to_lowercase().contains(&needle.to_lowercase()),
            Self::Contains => text.contains(needle),
            Self::Prefix => text.starts_with(needle),
            Self::Exact => text == needle,
        }
    }
}

/// Where missing (null or NaN) values go when sorting.
///
/// Placement does not flip with the sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullPlacement {
    First,
    #[default]
    Last,
}

/// Configuration for view derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub string_filter: StringFilterMode,
    pub nulls: NullPlacement,
}

impl ViewConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    #[must_use]
    pub fn with_string_filter(mut self, mode: StringFilterMode) -> Self {
        self.string_filter = mode;
        self
    }

    #[must_use]
    pub fn with_nulls(mut self, placement: NullPlacement) -> Self {
        self.nulls = placement;
        self
    }
}
