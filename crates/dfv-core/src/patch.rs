//! Cell patches and the patch store.
//!
//! A patch records the latest edited value of one cell, addressed by its
//! position in the rendered (unsorted, unfiltered) data. The store keeps at
//! most one patch per coordinate.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Markup payload understood by the browser grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellHtml {
    pub is_shiny_html: bool,
    pub obj: HtmlContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlContent {
    pub html: String,
}

/// A rendering-agnostic cell value: plain text or markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Html(CellHtml),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn html(markup: impl Into<String>) -> Self {
        Self::Html(CellHtml {
            is_shiny_html: true,
            obj: HtmlContent {
                html: markup.into(),
            },
        })
    }

    /// The raw text stored into the data frame cell.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Html(html) => &html.obj.html,
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, Self::Html(_))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPatch {
    pub row_index: usize,
    pub column_index: usize,
    pub value: CellValue,
}

impl CellPatch {
    pub fn new(row_index: usize, column_index: usize, value: impl Into<CellValue>) -> Self {
        Self {
            row_index,
            column_index,
            value: value.into(),
        }
    }

    pub fn key(&self) -> (usize, usize) {
        (self.row_index, self.column_index)
    }
}

#[derive(Debug, Clone, Default)]
struct PatchMap {
    patches: Vec<CellPatch>,
    positions: HashMap<(usize, usize), usize>,
}

/// Copy-on-write map from `(row_index, column_index)` to the latest patch.
///
/// Cloning a store is O(1) and yields a snapshot: later writes through either
/// handle copy the map first, so other holders never observe them.
#[derive(Debug, Clone, Default)]
pub struct PatchStore {
    inner: Arc<PatchMap>,
}

impl PatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the patch at a coordinate and return the stored patch.
    ///
    /// An overwrite keeps the coordinate's original enumeration position.
    pub fn set(
        &mut self,
        row_index: usize,
        column_index: usize,
        value: impl Into<CellValue>,
    ) -> CellPatch {
        let patch = CellPatch::new(row_index, column_index, value);
        let map = Arc::make_mut(&mut self.inner);
        match map.positions.get(&patch.key()) {
            Some(&position) => map.patches[position] = patch.clone(),
            None => {
                map.positions.insert(patch.key(), map.patches.len());
                map.patches.push(patch.clone());
            }
        }
        patch
    }

    pub fn get(&self, row_index: usize, column_index: usize) -> Option<&CellPatch> {
        self.inner
            .positions
            .get(&(row_index, column_index))
            .map(|&position| &self.inner.patches[position])
    }

    /// All patches in first-insertion order.
    pub fn all(&self) -> &[CellPatch] {
        &self.inner.patches
    }

    pub fn len(&self) -> usize {
        self.inner.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.patches.is_empty()
    }

    /// Drop every patch. Snapshots taken earlier keep their content.
    pub fn reset(&mut self) {
        self.inner = Arc::default();
    }

    /// Returns true if both handles still share the same map.
    pub fn same_snapshot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
