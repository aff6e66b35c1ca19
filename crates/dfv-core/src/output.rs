//! The data frame output: one rendered frame plus its session-scoped state.
//!
//! `DataFrameOutput` owns the patch store, the client-reported sort, filter
//! and selection, and memoized derivations of them. Writes go through
//! `&mut self`, so edits within a session are serialized; reads take `&self`
//! and recompute lazily when a dependency version changed.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use polars::prelude::DataFrame;
use serde::Serialize;
use serde_json::{Value, json};

use crate::config::ViewConfig;
use crate::edit::{PatchFnError, PatchHandlers, parse_patch_batch, validate_patch_output};
use crate::error::{DataViewError, Result};
use crate::grid::{DataGrid, Renderable};
use crate::memo::{Memo, Source};
use crate::patch::{CellPatch, CellValue, PatchStore};
use crate::patched::apply_frame_patches;
use crate::payload::{
    FrameJson, FrameRender, PatchInfo, TypeHint, apply_html_hints, frame_type_hints,
};
use crate::selection::{
    CellSelection, ResolvedSelection, SelectionModes, SelectionRequest, resolve_cell_selection,
};
use crate::session::{DATA_FRAME_MESSAGE, Session};
use crate::view::{ColumnFilter, ColumnSort, data_view_rows, subset_frame};

const UNSUPPORTED_DATA: &str = "render.data_frame doesn't know how to render objects of type";

/// Name of the session handler that receives patch batches for `output_id`.
pub fn patches_handler_name(output_id: &str) -> String {
    format!("data_frame_patches_{output_id}")
}

/// A data frame output bound to one session.
pub struct DataFrameOutput {
    session: Arc<dyn Session>,
    output_id: Option<String>,
    handlers: PatchHandlers,

    config: Source<ViewConfig>,

    rendered: Source<Option<DataGrid>>,
    patches: Source<PatchStore>,
    sort: Source<Vec<ColumnSort>>,
    filter: Source<Vec<ColumnFilter>>,
    selection_input: Source<Option<SelectionRequest>>,

    patched: Memo<DataFrame>,
    view_rows: Memo<Arc<[usize]>>,
    selection: Memo<ResolvedSelection>,
    view: Memo<DataFrame>,
    view_selected: Memo<DataFrame>,
}

impl DataFrameOutput {
    /// Create an output in the session that will execute it.
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self {
            session,
            output_id: None,
            handlers: PatchHandlers::default(),
            config: Source::default(),
            rendered: Source::default(),
            patches: Source::default(),
            sort: Source::default(),
            filter: Source::default(),
            selection_input: Source::default(),
            patched: Memo::new(),
            view_rows: Memo::new(),
            selection: Memo::new(),
            view: Memo::new(),
            view_selected: Memo::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ViewConfig) -> Self {
        self.set_config(config);
        self
    }

    /// Replace the engine configuration; views and selection are derived anew.
    pub fn set_config(&mut self, config: ViewConfig) {
        self.config.set(config);
    }

    pub fn config(&self) -> &ViewConfig {
        self.config.get()
    }

    /// Attach the output id, checking that `active` is the creating session.
    pub fn bind(&mut self, output_id: impl Into<String>, active: &dyn Session) -> Result<()> {
        if active.id() != self.session.id() {
            return Err(DataViewError::SessionMismatch {
                created: self.session.id().to_string(),
                active: active.id().to_string(),
            });
        }
        self.output_id = Some(output_id.into());
        Ok(())
    }

    pub fn output_id(&self) -> Result<&str> {
        self.output_id.as_deref().ok_or(DataViewError::NotBound)
    }

    // =========================================================================
    // RENDER
    // =========================================================================

    /// Start a new render generation.
    ///
    /// All state of the previous generation is dropped first. `None` leaves the
    /// output empty; anything else is normalized to a [`DataGrid`].
    pub fn render(&mut self, value: Option<Renderable>) -> Result<Option<FrameRender>> {
        let output_id = self.output_id()?.to_string();
        let handler = patches_handler_name(&output_id);

        self.reset();
        self.session.set_message_handler(&handler, false);

        let grid = match value {
            None => {
                tracing::debug!(output_id = %output_id, "render returned no data");
                return Ok(None);
            }
            Some(Renderable::Grid(grid)) => grid,
            Some(Renderable::Data(data)) => {
                DataGrid::new(data.into_data_frame(UNSUPPORTED_DATA)?)
            }
        };

        let payload = FrameJson::from_frame(&grid.data, grid.options.clone())?;
        let key = self.session.set_message_handler(&handler, true);
        let selection_modes = grid.selection_modes;
        let (nrows, ncols) = grid.data.shape();
        self.rendered.set(Some(grid));

        tracing::info!(
            output_id = %output_id,
            rows = nrows,
            columns = ncols,
            selection = %selection_modes,
            "rendered data frame"
        );
        Ok(Some(FrameRender {
            payload,
            patch_info: PatchInfo { key },
            selection_modes,
        }))
    }

    fn reset(&mut self) {
        self.rendered.set(None);
        self.patches.update(PatchStore::reset);
        self.sort.set(Vec::new());
        self.filter.set(Vec::new());
        self.selection_input.set(None);
        for memo in [&self.patched, &self.view, &self.view_selected] {
            memo.invalidate();
        }
        self.view_rows.invalidate();
        self.selection.invalidate();
    }

    // =========================================================================
    // READ SURFACES
    // =========================================================================

    fn grid(&self) -> Result<&DataGrid> {
        self.rendered
            .get()
            .as_ref()
            .ok_or_else(|| DataViewError::NotRendered {
                output_id: self.output_id.clone().unwrap_or_default(),
            })
    }

    /// The rendered data, without patches.
    pub fn data(&self) -> Result<DataFrame> {
        Ok(self.grid()?.data.clone())
    }

    pub fn selection_modes(&self) -> Result<SelectionModes> {
        Ok(self.grid()?.selection_modes)
    }

    /// Current patches in first-insertion order.
    pub fn cell_patches(&self) -> &[CellPatch] {
        self.patches.get().all()
    }

    pub fn sort(&self) -> &[ColumnSort] {
        self.sort.get()
    }

    pub fn filter(&self) -> &[ColumnFilter] {
        self.filter.get()
    }

    /// The rendered data with every patch applied.
    pub fn data_patched(&self) -> Result<DataFrame> {
        let deps = [self.rendered.version(), self.patches.version()];
        self.patched.get_or_try_compute(&deps, || {
            apply_frame_patches(&self.grid()?.data, self.patches.get().all())
        })
    }

    /// Row positions the browser displays, in display order.
    pub fn data_view_rows(&self) -> Result<Arc<[usize]>> {
        let deps = [
            self.rendered.version(),
            self.patches.version(),
            self.config.version(),
            self.sort.version(),
            self.filter.version(),
        ];
        self.view_rows.get_or_try_compute(&deps, || {
            let rows = data_view_rows(
                &self.data_patched()?,
                self.sort.get(),
                self.filter.get(),
                self.config.get(),
            )?;
            Ok(rows.into())
        })
    }

    /// Column positions the browser displays. Columns are never hidden.
    pub fn data_view_cols(&self) -> Result<Vec<usize>> {
        Ok((0..self.grid()?.data.width()).collect())
    }

    /// The reconciled selection together with any coercions that were applied.
    pub fn resolved_selection(&self) -> Result<ResolvedSelection> {
        let deps = [
            self.rendered.version(),
            self.patches.version(),
            self.config.version(),
            self.sort.version(),
            self.filter.version(),
            self.selection_input.version(),
        ];
        self.selection.get_or_try_compute(&deps, || {
            resolve_cell_selection(
                self.selection_input.get().as_ref(),
                &self.grid()?.selection_modes,
                &self.data_view_rows()?,
            )
        })
    }

    pub fn cell_selection(&self) -> Result<CellSelection> {
        Ok(self.resolved_selection()?.selection)
    }

    /// The patched data as viewed in the browser.
    ///
    /// With `selected`, only view rows that are part of the current row
    /// selection are kept, still in view order.
    pub fn data_view(&self, selected: bool) -> Result<DataFrame> {
        let mut deps = vec![
            self.rendered.version(),
            self.patches.version(),
            self.config.version(),
            self.sort.version(),
            self.filter.version(),
        ];
        if !selected {
            return self.view.get_or_try_compute(&deps, || {
                let rows = self.data_view_rows()?;
                subset_frame(&self.data_patched()?, Some(&rows[..]), None)
            });
        }

        deps.push(self.selection_input.version());
        self.view_selected.get_or_try_compute(&deps, || {
            let selection = self.cell_selection()?;
            let chosen: HashSet<usize> = selection
                .selected_rows()
                .unwrap_or_default()
                .iter()
                .copied()
                .collect();
            let rows: Vec<usize> = self
                .data_view_rows()?
                .iter()
                .copied()
                .filter(|row| chosen.contains(row))
                .collect();
            subset_frame(&self.data_patched()?, Some(rows.as_slice()), None)
        })
    }

    /// Column type hints of the patched data; string columns holding a markup
    /// patch become `html`.
    pub fn type_hints(&self) -> Result<Vec<TypeHint>> {
        let mut hints = frame_type_hints(&self.data_patched()?);
        apply_html_hints(&mut hints, self.patches.get().all());
        Ok(hints)
    }

    /// Summary line for the rows `start..=end` (1-based) of the current view.
    pub fn summary(&self, start: usize, end: usize) -> Result<Option<String>> {
        let total = self.data_view_rows()?.len();
        Ok(self.grid()?.options.summary.render(start, end, total))
    }

    // =========================================================================
    // EDITS
    // =========================================================================

    pub fn set_patch_fn<F, Fut>(&mut self, f: F)
    where
        F: Fn(CellPatch) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<CellValue, PatchFnError>> + Send + 'static,
    {
        self.handlers.set_patch_fn(f);
    }

    pub fn set_patches_fn<F, Fut>(&mut self, f: F)
    where
        F: Fn(Vec<CellPatch>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Vec<CellPatch>, PatchFnError>> + Send + 'static,
    {
        self.handlers.set_patches_fn(f);
    }

    /// Process a patch batch sent by the client.
    ///
    /// The batch is parsed, passed through the user callbacks and validated as
    /// a whole before anything is stored. Returns the stored patches.
    pub async fn handle_patches(&mut self, batch: &Value) -> Result<Vec<Value>> {
        let output_id = self.output_id()?.to_string();
        let shape = self.grid()?.data.shape();
        let requested = parse_patch_batch(&output_id, batch)?;
        tracing::debug!(output_id = %output_id, patches = requested.len(), "received patch batch");

        let handlers = self.handlers.clone();
        let processed = handlers.run(requested).await.map_err(|err| {
            DataViewError::PatchCallback {
                output_id: output_id.clone(),
                message: err.to_string(),
            }
        })?;
        validate_patch_output(&output_id, &processed, shape)?;

        let stored = self.patches.update(|store| {
            processed
                .into_iter()
                .map(|patch| store.set(patch.row_index, patch.column_index, patch.value))
                .collect::<Vec<_>>()
        });
        tracing::debug!(output_id = %output_id, stored = stored.len(), "stored cell patches");

        stored
            .iter()
            .map(|patch| serde_json::to_value(patch).map_err(DataViewError::from))
            .collect()
    }

    /// Set a single cell value from server code.
    pub fn set_cell_value(
        &mut self,
        row_index: usize,
        column_index: usize,
        value: impl Into<CellValue>,
    ) -> Result<CellPatch> {
        let (nrows, ncols) = self.grid()?.data.shape();
        if row_index >= nrows {
            return Err(DataViewError::RowOutOfBounds { row: row_index, nrows });
        }
        if column_index >= ncols {
            return Err(DataViewError::ColumnOutOfBounds {
                column: column_index,
                ncols,
            });
        }
        Ok(self
            .patches
            .update(|store| store.set(row_index, column_index, value)))
    }

    // =========================================================================
    // CLIENT INPUTS
    // =========================================================================

    pub fn set_input_cell_selection(&mut self, selection: Option<SelectionRequest>) {
        self.selection_input.set(selection);
    }

    pub fn set_input_column_sort(&mut self, sort: Vec<ColumnSort>) {
        self.sort.set(sort);
    }

    pub fn set_input_column_filter(&mut self, filter: Vec<ColumnFilter>) {
        self.filter.set(filter);
    }

    // =========================================================================
    // SERVER-INITIATED UPDATES
    // =========================================================================

    /// Ask the browser to change the selection, and mirror it locally.
    ///
    /// Row selections fail outright when the modes have no row granularity;
    /// other mode violations are coerced with warnings.
    pub fn update_cell_selection(
        &mut self,
        selection: Option<SelectionRequest>,
    ) -> Result<ResolvedSelection> {
        let modes = self.selection_modes()?;
        let wants_rows = matches!(
            selection,
            Some(SelectionRequest::All | SelectionRequest::Cells(CellSelection::Row { .. }))
        );
        if wants_rows && !modes.is_none() && !modes.has_row() {
            return Err(DataViewError::SelectionNotAllowed {
                kind: "row".to_string(),
                modes: modes.to_string(),
            });
        }

        let view_rows = self.data_view_rows()?;
        let resolved = resolve_cell_selection(selection.as_ref(), &modes, &view_rows)?;
        self.send_message(
            "updateCellSelection",
            json!({ "cellSelection": &resolved.selection }),
        )?;
        self.selection_input
            .set(Some(SelectionRequest::Cells(resolved.selection.clone())));
        Ok(resolved)
    }

    /// Ask the browser to sort, and mirror it locally.
    pub fn update_sort(&mut self, sort: Vec<ColumnSort>) -> Result<()> {
        let ncols = self.grid()?.data.width();
        check_columns(sort.iter().map(|s| s.col), ncols)?;
        self.send_message("updateColumnSort", json!({ "sort": &sort }))?;
        self.sort.set(sort);
        Ok(())
    }

    /// Ask the browser to filter, and mirror it locally.
    pub fn update_filter(&mut self, filter: Vec<ColumnFilter>) -> Result<()> {
        let ncols = self.grid()?.data.width();
        check_columns(filter.iter().map(|f| f.col), ncols)?;
        self.send_message("updateColumnFilter", json!({ "filter": &filter }))?;
        self.filter.set(filter);
        Ok(())
    }

    fn send_message(&self, handler: &str, obj: Value) -> Result<()> {
        let message = OutboundMessage {
            id: self.session.ns(self.output_id()?),
            handler,
            obj,
        };
        tracing::debug!(id = %message.id, handler, "sending data frame message");
        self.session
            .send_custom_message(DATA_FRAME_MESSAGE, serde_json::to_value(&message)?);
        Ok(())
    }
}

#[derive(Serialize)]
struct OutboundMessage<'a> {
    id: String,
    handler: &'a str,
    obj: Value,
}

fn check_columns(cols: impl IntoIterator<Item = usize>, ncols: usize) -> Result<()> {
    for column in cols {
        if column >= ncols {
            return Err(DataViewError::ColumnOutOfBounds { column, ncols });
        }
    }
    Ok(())
}
