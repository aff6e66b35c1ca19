//! `DataGrid` / `DataTable` render wrappers and their browser options.

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::selection::{SelectionMode, SelectionModes};
use crate::table::TabularData;

/// A CSS length, or a number of pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Pixels(f64),
    Css(String),
}

impl From<&str> for Dimension {
    fn from(value: &str) -> Self {
        Self::Css(value.to_string())
    }
}

impl From<f64> for Dimension {
    fn from(value: f64) -> Self {
        Self::Pixels(value)
    }
}

/// Summary line setting: on/off, or a template with `{start}`, `{end}` and
/// `{total}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Summary {
    Enabled(bool),
    Template(String),
}

impl Default for Summary {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

impl Summary {
    pub const DEFAULT_TEMPLATE: &'static str = "Viewing rows {start} through {end} of {total}";

    /// Render the summary line, or `None` when disabled.
    pub fn render(&self, start: usize, end: usize, total: usize) -> Option<String> {
        let template = match self {
            Self::Enabled(false) => return None,
            Self::Enabled(true) => Self::DEFAULT_TEMPLATE,
            Self::Template(template) => template.as_str(),
        };
        Some(
            template
                .replace("{start}", &start.to_string())
                .replace("{end}", &end.to_string())
                .replace("{total}", &total.to_string()),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStyle {
    Grid,
    Table,
}

/// Options sent to the browser with the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOptions {
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub summary: Summary,
    pub filters: bool,
    pub editable: bool,
    pub style: FrameStyle,
    /// Grids without an explicit height fill their container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
}

/// Frame plus grid options and selection modes.
#[derive(Debug, Clone)]
pub struct DataGrid {
    pub data: DataFrame,
    pub options: FrameOptions,
    pub selection_modes: SelectionModes,
}

impl DataGrid {
    /// Interactive grid with default options.
    pub fn new(data: DataFrame) -> Self {
        Self {
            data,
            options: FrameOptions {
                width: Some(Dimension::from("fit-content")),
                height: None,
                summary: Summary::default(),
                filters: false,
                editable: false,
                style: FrameStyle::Grid,
                fill: Some(true),
            },
            selection_modes: SelectionModes::default(),
        }
    }

    /// Table-styled variant with a fixed default height.
    pub fn table(data: DataFrame) -> Self {
        let mut grid = Self::new(data);
        grid.options.style = FrameStyle::Table;
        grid.options.height = Some(Dimension::from("500px"));
        grid.options.fill = None;
        grid
    }

    #[must_use]
    pub fn with_width(mut self, width: impl Into<Dimension>) -> Self {
        self.options.width = Some(width.into());
        self
    }

    #[must_use]
    pub fn with_height(mut self, height: Option<Dimension>) -> Self {
        if self.options.style == FrameStyle::Grid {
            self.options.fill = Some(height.is_none());
        }
        self.options.height = height;
        self
    }

    #[must_use]
    pub fn with_summary(mut self, summary: Summary) -> Self {
        self.options.summary = summary;
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: bool) -> Self {
        self.options.filters = filters;
        self
    }

    #[must_use]
    pub fn with_editable(mut self, editable: bool) -> Self {
        self.options.editable = editable;
        self
    }

    /// Set the permitted selection modes, validating the combination.
    pub fn with_selection_mode(mut self, modes: &[SelectionMode]) -> Result<Self> {
        self.selection_modes = SelectionModes::from_modes(modes)?;
        Ok(self)
    }
}

/// A value returned from a render function.
#[derive(Debug)]
pub enum Renderable {
    Grid(DataGrid),
    Data(TabularData),
}

impl From<DataGrid> for Renderable {
    fn from(grid: DataGrid) -> Self {
        Self::Grid(grid)
    }
}

impl From<DataFrame> for Renderable {
    fn from(data: DataFrame) -> Self {
        Self::Data(TabularData::Native(data))
    }
}

impl From<TabularData> for Renderable {
    fn from(data: TabularData) -> Self {
        Self::Data(data)
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;
    use serde_json::json;

    use super::*;
    use super::Dimension;
    use crate::error::DataViewError;
    use crate::selection::AxisMode;

    fn sample() -> DataFrame {
        DataFrame::new(vec![Series::new("a".into(), &[1i64, 2]).into()]).expect("frame")
    }

    #[test]
    fn test_grid_defaults() {
        let grid = DataGrid::new(sample());
        assert_eq!(
            serde_json::to_value(&grid.options).expect("json"),
            json!({
                "width": "fit-content",
                "height": null,
                "summary": true,
                "filters": false,
                "editable": false,
                "style": "grid",
                "fill": true,
            })
        );
        assert!(grid.selection_modes.is_none());
    }

    #[test]
    fn test_table_defaults() {
        let table = DataGrid::table(sample());
        let options = serde_json::to_value(&table.options).expect("json");
        assert_eq!(options["style"], "table");
        assert_eq!(options["height"], "500px");
        assert!(options.get("fill").is_none());
    }

    #[test]
    fn test_explicit_height_disables_fill() {
        let grid = DataGrid::new(sample()).with_height(Some(Dimension::from(300.0)));
        assert_eq!(grid.options.fill, Some(false));
        assert_eq!(grid.options.height, Some(Dimension::Pixels(300.0)));
    }

    #[test]
    fn test_selection_mode_builder() {
        let grid = DataGrid::new(sample())
            .with_selection_mode(&[SelectionMode::Rows])
            .expect("valid");
        assert_eq!(grid.selection_modes.row, AxisMode::Multiple);

        let err = DataGrid::new(sample())
            .with_selection_mode(&[SelectionMode::Row, SelectionMode::Rows])
            .expect_err("conflict");
        assert!(matches!(err, DataViewError::InvalidSelectionMode { .. }));
    }

    #[test]
    fn test_summary_templates() {
        assert_eq!(
            Summary::default().render(1, 10, 20).as_deref(),
            Some("Viewing rows 1 through 10 of 20")
        );
        let custom = Summary::Template("Viendo filas {start} a {end} de {total}".to_string());
        assert_eq!(
            custom.render(3, 4, 5).as_deref(),
            Some("Viendo filas 3 a 4 de 5")
        );
        assert_eq!(Summary::Enabled(false).render(1, 2, 3), None);
    }
}
