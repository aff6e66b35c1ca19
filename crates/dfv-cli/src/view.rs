//! The `view` command: load a CSV, replay browser interactions, report the view.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use polars::prelude::{CsvReadOptions, DataFrame, SerReader};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use dfv_common::any_to_string;
use dfv_core::{
    CellSelection, DataFrameOutput, DataGrid, FrameJson, FrameRender, MemorySession,
    SelectionMode, SelectionModes, SelectionWarning, ViewConfig, frame_column_names,
};

use crate::args::{FilterArg, PatchArg, SortArg};

const SESSION_ID: &str = "dfv";
const OUTPUT_ID: &str = "view";

/// Everything the browser would have done to the grid, in command-line form.
#[derive(Debug, Clone, Default)]
pub struct ViewRequest {
    pub csv: PathBuf,
    pub sort: Vec<SortArg>,
    pub filter: Vec<FilterArg>,
    pub patches: Vec<PatchArg>,
    pub selection_modes: Vec<SelectionMode>,
    pub select_rows: Option<Vec<usize>>,
    /// Report only the selected rows of the view.
    pub selected_only: bool,
    pub config: ViewConfig,
}

/// The outcome of a [`ViewRequest`].
#[derive(Debug, Clone)]
pub struct ViewReport {
    pub columns: Vec<String>,
    /// Data rows shown, in view order.
    pub rows: Vec<usize>,
    pub frame: DataFrame,
    pub selection: CellSelection,
    pub warnings: Vec<SelectionWarning>,
    pub summary: Option<String>,
    pub render: FrameRender,
}

/// Read a CSV with a header row.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to read CSV: {}", path.display()))?;
    Ok(df)
}

/// Load a TOML engine configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<ViewConfig> {
    let Some(path) = path else {
        return Ok(ViewConfig::default());
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    ViewConfig::from_toml_str(&source)
        .with_context(|| format!("Invalid config: {}", path.display()))
}

/// Render the CSV and replay edits, sort, filter and selection as browser input.
pub async fn run_view(request: &ViewRequest) -> Result<ViewReport> {
    let data = load_csv(&request.csv)?;
    info!(
        path = %request.csv.display(),
        rows = data.height(),
        columns = data.width(),
        "loaded csv"
    );
    let columns = frame_column_names(&data);

    let session = Arc::new(MemorySession::new(SESSION_ID));
    let mut output = DataFrameOutput::new(session.clone()).with_config(request.config);
    output.bind(OUTPUT_ID, session.as_ref())?;

    let grid = DataGrid::new(data)
        .with_editable(!request.patches.is_empty())
        .with_selection_mode(&request.selection_modes)?;
    let render = output
        .render(Some(grid.into()))?
        .context("render produced no output")?;

    if !request.patches.is_empty() {
        let batch = patch_batch(&request.patches, &columns)?;
        let applied = output.handle_patches(&batch).await?;
        debug!(count = applied.len(), "applied patches");
    }

    let sort = request
        .sort
        .iter()
        .map(|sort| sort.resolve(&columns))
        .collect::<Result<Vec<_>>>()?;
    let filter = request
        .filter
        .iter()
        .map(|filter| filter.resolve(&columns))
        .collect::<Result<Vec<_>>>()?;
    output.set_input_column_sort(sort);
    output.set_input_column_filter(filter);
    if let Some(rows) = &request.select_rows {
        output.set_input_cell_selection(Some(CellSelection::rows(rows.iter().copied()).into()));
    }

    let resolved = output.resolved_selection()?;
    let view_rows = output.data_view_rows()?;
    let rows: Vec<usize> = if request.selected_only {
        let chosen: HashSet<usize> = resolved
            .selection
            .selected_rows()
            .unwrap_or_default()
            .iter()
            .copied()
            .collect();
        view_rows.iter().copied().filter(|row| chosen.contains(row)).collect()
    } else {
        view_rows.to_vec()
    };
    let frame = output.data_view(request.selected_only)?;
    let total = view_rows.len();
    let summary = output.summary(usize::from(total > 0), total)?;

    Ok(ViewReport {
        columns,
        rows,
        frame,
        selection: resolved.selection,
        warnings: resolved.warnings,
        summary,
        render,
    })
}

fn patch_batch(patches: &[PatchArg], columns: &[String]) -> Result<Value> {
    let entries = patches
        .iter()
        .map(|patch| {
            Ok(json!({
                "row_index": patch.row,
                "column_index": patch.column.resolve(columns)?,
                "value": patch.value,
            }))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::Array(entries))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewJson<'a> {
    rows: &'a [usize],
    view: FrameJson,
    cell_selection: &'a CellSelection,
    selection_modes: SelectionModes,
    warnings: Vec<String>,
    summary: Option<&'a str>,
}

impl ViewReport {
    /// The view as JSON, in the shape the browser receives cells and selection.
    pub fn to_json(&self) -> Result<Value> {
        let view = FrameJson::from_frame(&self.frame, self.render.payload.options.clone())?;
        let report = ViewJson {
            rows: &self.rows,
            view,
            cell_selection: &self.selection,
            selection_modes: self.render.selection_modes,
            warnings: self.warnings.iter().map(ToString::to_string).collect(),
            summary: self.summary.as_deref(),
        };
        Ok(serde_json::to_value(report)?)
    }

    /// The view as a table, with the data row of each line in the first column.
    ///
    /// At most `max_rows` lines are included.
    pub fn to_table(&self, max_rows: usize) -> Table {
        let selected: HashSet<usize> = self
            .selection
            .selected_rows()
            .unwrap_or_default()
            .iter()
            .copied()
            .collect();

        let mut table = Table::new();
        let mut header = vec![header_cell("#")];
        header.extend(self.columns.iter().map(|name| header_cell(name)));
        table.set_header(header);
        apply_table_style(&mut table);
        if let Some(column) = table.column_mut(0) {
            column.set_cell_alignment(CellAlignment::Right);
        }

        let columns = self.frame.get_columns();
        for (position, row) in self.rows.iter().enumerate().take(max_rows) {
            let label = if selected.contains(row) {
                Cell::new(format!("*{row}")).fg(Color::Green)
            } else {
                Cell::new(row)
            };
            let mut cells = vec![label];
            cells.extend(columns.iter().map(|column| {
                let text = column.get(position).map(any_to_string).unwrap_or_default();
                Cell::new(text)
            }));
            table.add_row(cells);
        }
        table
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
