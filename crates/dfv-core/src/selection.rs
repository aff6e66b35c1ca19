//! Selection modes and the cell selection resolver.
//!
//! The browser reports selections in rendered-data row coordinates, possibly
//! stale with respect to the current sort and filter. [`resolve_cell_selection`]
//! reconciles such a request with the configured [`SelectionModes`] and the
//! current data view rows.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DataViewError, Result};

/// A selection granularity a user may enable on a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    None,
    Row,
    Rows,
    Col,
    Cols,
    Cell,
    Region,
}

impl SelectionMode {
    pub const ALL: [Self; 7] = [
        Self::None,
        Self::Row,
        Self::Rows,
        Self::Col,
        Self::Cols,
        Self::Cell,
        Self::Region,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Row => "row",
            Self::Rows => "rows",
            Self::Col => "col",
            Self::Cols => "cols",
            Self::Cell => "cell",
            Self::Region => "region",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionMode {
    type Err = DataViewError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| DataViewError::InvalidSelectionMode {
                message: format!(
                    "Unknown selection mode: {s}. Valid selection modes: {}",
                    join(Self::ALL)
                ),
            })
    }
}

fn join(modes: impl IntoIterator<Item = SelectionMode>) -> String {
    modes
        .into_iter()
        .map(SelectionMode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Cardinality of row or column selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisMode {
    #[default]
    None,
    Single,
    Multiple,
}

/// Shape of rectangular selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RectMode {
    #[default]
    None,
    Cell,
    Region,
}

/// The selection granularities an output permits, fixed at render time.
///
/// Serializes as `{"row": ..., "col": ..., "rect": ...}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionModes {
    pub row: AxisMode,
    pub col: AxisMode,
    pub rect: RectMode,
}

impl SelectionModes {
    /// Build modes from the user-facing mode list.
    ///
    /// An empty list means `none`. Column and rectangle modes are recognised
    /// but rejected as unsupported.
    pub fn from_modes(modes: &[SelectionMode]) -> Result<Self> {
        let set: BTreeSet<SelectionMode> = modes.iter().copied().collect();
        let mut result = Self::default();
        if set.is_empty() || (set.len() == 1 && set.contains(&SelectionMode::None)) {
            return Ok(result);
        }
        if set.contains(&SelectionMode::None) {
            let extra = set.iter().copied().filter(|mode| *mode != SelectionMode::None);
            return Err(DataViewError::InvalidSelectionMode {
                message: format!(
                    "Cannot have other selection modes included with `none`. \
                     Extra selection modes: {}",
                    join(extra)
                ),
            });
        }
        for (a, b) in [
            (SelectionMode::Row, SelectionMode::Rows),
            (SelectionMode::Col, SelectionMode::Cols),
            (SelectionMode::Cell, SelectionMode::Region),
        ] {
            if set.contains(&a) && set.contains(&b) {
                return Err(DataViewError::InvalidSelectionMode {
                    message: format!("Cannot have both `{a}` and `{b}` in selection modes."),
                });
            }
        }

        if set.contains(&SelectionMode::Row) {
            result.row = AxisMode::Single;
        } else if set.contains(&SelectionMode::Rows) {
            result.row = AxisMode::Multiple;
        }
        if set.contains(&SelectionMode::Col) || set.contains(&SelectionMode::Cols) {
            return Err(DataViewError::UnsupportedSelection {
                feature: "Column based cell selection".to_string(),
            });
        }
        if set.contains(&SelectionMode::Cell) {
            return Err(DataViewError::UnsupportedSelection {
                feature: "Cell based cell selection".to_string(),
            });
        }
        if set.contains(&SelectionMode::Region) {
            return Err(DataViewError::UnsupportedSelection {
                feature: "Region based cell selection".to_string(),
            });
        }
        Ok(result)
    }

    /// Parse mode names, e.g. `["rows"]`.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let modes = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<SelectionMode>>>()?;
        Self::from_modes(&modes)
    }

    /// True when every granularity is disabled.
    pub fn is_none(&self) -> bool {
        !self.has_row() && !self.has_col() && !self.has_rect()
    }

    pub fn has_row(&self) -> bool {
        self.row != AxisMode::None
    }

    pub fn has_col(&self) -> bool {
        self.col != AxisMode::None
    }

    pub fn has_rect(&self) -> bool {
        self.rect != RectMode::None
    }
}

impl fmt::Display for SelectionModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row={:?}, col={:?}, rect={:?}",
            self.row, self.col, self.rect
        )
    }
}

/// A reconciled selection, in rendered-data coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CellSelection {
    #[default]
    None,
    Row {
        rows: Vec<usize>,
    },
    Col {
        cols: Vec<usize>,
    },
    Rect {
        rows: (usize, usize),
        cols: (usize, usize),
    },
}

impl CellSelection {
    pub fn rows(rows: impl IntoIterator<Item = usize>) -> Self {
        Self::Row {
            rows: rows.into_iter().collect(),
        }
    }

    /// The `type` tag as sent on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Row { .. } => "row",
            Self::Col { .. } => "col",
            Self::Rect { .. } => "rect",
        }
    }

    /// Selected row positions, for row selections.
    pub fn selected_rows(&self) -> Option<&[usize]> {
        match self {
            Self::Row { rows } => Some(rows),
            _ => None,
        }
    }
}

/// A selection as requested by the browser or by server code.
///
/// On the wire `"all"` selects every view row; anything else is a
/// [`CellSelection`] object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireRequest", into = "WireRequest")]
pub enum SelectionRequest {
    All,
    Cells(CellSelection),
}

impl From<CellSelection> for SelectionRequest {
    fn from(selection: CellSelection) -> Self {
        Self::Cells(selection)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireRequest {
    Keyword(String),
    Cells(CellSelection),
}

impl TryFrom<WireRequest> for SelectionRequest {
    type Error = String;

    fn try_from(value: WireRequest) -> std::result::Result<Self, Self::Error> {
        match value {
            WireRequest::Keyword(keyword) if keyword == "all" => Ok(Self::All),
            WireRequest::Keyword(other) => Err(format!("unknown selection keyword `{other}`")),
            WireRequest::Cells(selection) => Ok(Self::Cells(selection)),
        }
    }
}

impl From<SelectionRequest> for WireRequest {
    fn from(value: SelectionRequest) -> Self {
        match value {
            SelectionRequest::All => Self::Keyword("all".to_string()),
            SelectionRequest::Cells(selection) => Self::Cells(selection),
        }
    }
}

/// A recoverable mode violation that was coerced to a legal selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionWarning {
    /// Selection requested while every mode is `none`.
    ModesAreNone,
    /// Row selection requested without a row mode.
    RowSelectionNotAllowed { modes: SelectionModes },
    /// More than one row requested in single-row mode.
    TruncatedToSingleRow { requested: usize },
    /// Rows no longer present in the view were dropped.
    DroppedStaleRows { rows: Vec<usize> },
    /// `all` requested in single-row mode.
    AllRowsInSingleMode,
}

impl fmt::Display for SelectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModesAreNone => f.write_str(
                "Cell selection cannot be updated when the selection mode is `none`. \
                 Enable `row` or `rows` selection to allow cell selection.",
            ),
            Self::RowSelectionNotAllowed { modes } => write!(
                f,
                "Current selection modes do not support row based selection ({modes}); \
                 the selection was cleared."
            ),
            Self::TruncatedToSingleRow { requested } => write!(
                f,
                "Attempted to select {requested} rows when the selection mode is `row`. \
                 Only the first row supplied will be selected."
            ),
            Self::DroppedStaleRows { rows } => {
                write!(f, "Dropped selected rows not in the current view: {rows:?}")
            }
            Self::AllRowsInSingleMode => f.write_str(
                "Attempted to select all rows when the selection mode is `row`. \
                 Only the first row in the view will be selected.",
            ),
        }
    }
}

/// Resolver output: the legal selection and any coercions applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub selection: CellSelection,
    pub warnings: Vec<SelectionWarning>,
}

impl ResolvedSelection {
    fn none_with(warnings: Vec<SelectionWarning>) -> Self {
        Self {
            selection: CellSelection::None,
            warnings,
        }
    }
}

/// Reconcile a requested selection with the modes and current view rows.
///
/// Mode violations are coerced and reported as warnings. Column and rectangle
/// selections fail because no supported mode can hold them. Every resolved
/// row is a member of `view_rows`.
pub fn resolve_cell_selection(
    request: Option<&SelectionRequest>,
    modes: &SelectionModes,
    view_rows: &[usize],
) -> Result<ResolvedSelection> {
    let resolved = match request {
        None | Some(SelectionRequest::Cells(CellSelection::None)) => ResolvedSelection::default(),
        Some(_) if modes.is_none() => {
            ResolvedSelection::none_with(vec![SelectionWarning::ModesAreNone])
        }
        Some(SelectionRequest::All) => resolve_all(modes, view_rows),
        Some(SelectionRequest::Cells(CellSelection::Row { rows })) => {
            resolve_rows(rows, modes, view_rows)
        }
        Some(SelectionRequest::Cells(CellSelection::Col { .. })) => {
            return Err(DataViewError::UnsupportedSelection {
                feature: "Column selection".to_string(),
            });
        }
        Some(SelectionRequest::Cells(CellSelection::Rect { .. })) => {
            return Err(DataViewError::UnsupportedSelection {
                feature: "Rectangle region selection".to_string(),
            });
        }
    };

    for warning in &resolved.warnings {
        tracing::warn!(kind = resolved.selection.kind(), "{warning}");
    }
    Ok(resolved)
}

fn resolve_all(modes: &SelectionModes, view_rows: &[usize]) -> ResolvedSelection {
    match modes.row {
        AxisMode::None => ResolvedSelection::none_with(vec![
            SelectionWarning::RowSelectionNotAllowed { modes: *modes },
        ]),
        AxisMode::Multiple => ResolvedSelection {
            selection: CellSelection::rows(view_rows.iter().copied()),
            warnings: Vec::new(),
        },
        AxisMode::Single => ResolvedSelection {
            selection: CellSelection::rows(view_rows.first().copied()),
            warnings: vec![SelectionWarning::AllRowsInSingleMode],
        },
    }
}

fn resolve_rows(
    requested: &[usize],
    modes: &SelectionModes,
    view_rows: &[usize],
) -> ResolvedSelection {
    if !modes.has_row() {
        return ResolvedSelection::none_with(vec![SelectionWarning::RowSelectionNotAllowed {
            modes: *modes,
        }]);
    }

    let in_view: HashSet<usize> = view_rows.iter().copied().collect();
    let mut seen = HashSet::with_capacity(requested.len());
    let mut rows = Vec::with_capacity(requested.len());
    let mut stale = Vec::new();
    for &row in requested {
        if !seen.insert(row) {
            continue;
        }
        if in_view.contains(&row) {
            rows.push(row);
        } else {
            stale.push(row);
        }
    }

    let mut warnings = Vec::new();
    if !stale.is_empty() {
        warnings.push(SelectionWarning::DroppedStaleRows { rows: stale });
    }
    if modes.row == AxisMode::Single && rows.len() > 1 {
        warnings.push(SelectionWarning::TruncatedToSingleRow {
            requested: rows.len(),
        });
        rows.truncate(1);
    }

    ResolvedSelection {
        selection: CellSelection::Row { rows },
        warnings,
    }
}
