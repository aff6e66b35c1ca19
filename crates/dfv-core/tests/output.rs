//! Integration tests for the data frame output: sort, filter, edit and selection
//! flowing through one rendered frame.

use std::sync::Arc;

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use serde_json::json;

use dfv_core::{
    CellPatch, CellSelection, CellValue, ColumnFilter, ColumnSort, DataFrameOutput, DataGrid,
    DataViewError, MemorySession, PatchFnError, SelectionMode, SelectionWarning,
};

fn test_df(columns: Vec<(&str, Vec<&str>)>) -> DataFrame {
    let cols: Vec<Column> = columns
        .into_iter()
        .map(|(name, values)| {
            Series::new(
                name.into(),
                values.iter().copied().map(String::from).collect::<Vec<_>>(),
            )
            .into_column()
        })
        .collect();
    DataFrame::new(cols).unwrap()
}

fn render(df: DataFrame, modes: &[SelectionMode]) -> (Arc<MemorySession>, DataFrameOutput) {
    let session = Arc::new(MemorySession::new("session-1"));
    let mut output = DataFrameOutput::new(session.clone());
    output.bind("grid", session.as_ref()).unwrap();
    let grid = DataGrid::new(df)
        .with_editable(true)
        .with_selection_mode(modes)
        .unwrap();
    output.render(Some(grid.into())).unwrap();
    (session, output)
}

fn column_values(df: &DataFrame, col: usize) -> Vec<String> {
    let column = &df.get_columns()[col];
    (0..df.height())
        .map(|row| dfv_common::any_to_string(column.get(row).unwrap()))
        .collect()
}

#[tokio::test]
async fn test_sort_then_edit_resorts_on_patched_values() {
    let df = DataFrame::new(vec![
        Series::new("letter".into(), &["b", "a"]).into(),
        Series::new("n".into(), &[2i64, 1]).into(),
    ])
    .unwrap();
    let (_, mut output) = render(df, &[]);

    output.set_input_column_sort(vec![ColumnSort::asc(0)]);
    assert_eq!(&*output.data_view_rows().unwrap(), &[1, 0]);
    assert_eq!(column_values(&output.data_view(false).unwrap(), 0), vec!["a", "b"]);

    let echoed = output
        .handle_patches(&json!([{"row_index": 1, "column_index": 0, "value": "z"}]))
        .await
        .unwrap();
    assert_eq!(echoed, vec![json!({"row_index": 1, "column_index": 0, "value": "z"})]);

    assert_eq!(column_values(&output.data_patched().unwrap(), 0)[1], "z");
    assert_eq!(&*output.data_view_rows().unwrap(), &[0, 1]);
    assert_eq!(column_values(&output.data_view(false).unwrap(), 0), vec!["b", "z"]);
    // The rendered data itself is never modified.
    assert_eq!(column_values(&output.data().unwrap(), 0), vec!["b", "a"]);
}

#[test]
fn test_text_edit_keeps_numeric_order_of_other_rows() {
    let df = DataFrame::new(vec![Series::new("n".into(), &[2i64, 10, 3]).into()]).unwrap();
    let (_, mut output) = render(df, &[]);
    output.set_input_column_sort(vec![ColumnSort::asc(0)]);
    assert_eq!(&*output.data_view_rows().unwrap(), &[0, 2, 1]);

    output.set_cell_value(0, 0, "x").unwrap();
    assert_eq!(&*output.data_view_rows().unwrap(), &[2, 1, 0]);

    output.set_input_column_sort(vec![ColumnSort::desc(0)]);
    assert_eq!(&*output.data_view_rows().unwrap(), &[0, 1, 2]);
}

#[tokio::test]
async fn test_filter_then_patch_removes_row_from_view() {
    let df = test_df(vec![("code", vec!["N1", "N2A", "N2B", "N3"])]);
    let (_, mut output) = render(df, &[]);

    output.set_input_column_filter(vec![ColumnFilter::text(0, "N2")]);
    assert_eq!(&*output.data_view_rows().unwrap(), &[1, 2]);

    output
        .handle_patches(&json!([{"row_index": 1, "column_index": 0, "value": "N9"}]))
        .await
        .unwrap();
    assert_eq!(&*output.data_view_rows().unwrap(), &[2]);
    assert_eq!(column_values(&output.data_view(false).unwrap(), 0), vec!["N2B"]);
}

#[tokio::test]
async fn test_batch_callback_narrowing() {
    let df = test_df(vec![("code", vec!["a", "b", "c"])]);
    let (_, mut output) = render(df, &[]);
    output.set_patches_fn(|patches: Vec<CellPatch>| async move {
        Ok::<_, PatchFnError>(patches.into_iter().take(1).collect())
    });

    let echoed = output
        .handle_patches(&json!([
            {"row_index": 0, "column_index": 0, "value": "x"},
            {"row_index": 1, "column_index": 0, "value": "y"},
            {"row_index": 2, "column_index": 0, "value": "z"},
        ]))
        .await
        .unwrap();

    assert_eq!(echoed.len(), 1);
    assert_eq!(output.cell_patches(), &[CellPatch::new(0, 0, "x")]);
}

#[tokio::test]
async fn test_patch_fn_formats_values() {
    let df = test_df(vec![("code", vec!["a", "b"])]);
    let (_, mut output) = render(df, &[]);
    output.set_patch_fn(|patch: CellPatch| async move {
        Ok::<_, PatchFnError>(CellValue::html(format!("<b>{}</b>", patch.value)))
    });

    let echoed = output
        .handle_patches(&json!([{"row_index": 0, "column_index": 0, "value": "q"}]))
        .await
        .unwrap();
    assert_eq!(
        echoed[0]["value"],
        json!({"isShinyHtml": true, "obj": {"html": "<b>q</b>"}})
    );
    assert_eq!(column_values(&output.data_patched().unwrap(), 0)[0], "<b>q</b>");
}

#[tokio::test]
async fn test_invalid_callback_output_stores_nothing() {
    let df = test_df(vec![("code", vec!["a", "b"])]);
    let (_, mut output) = render(df, &[]);
    output.set_patches_fn(|_patches: Vec<CellPatch>| async move {
        Ok::<_, PatchFnError>(vec![CellPatch::new(0, 0, "ok"), CellPatch::new(9, 0, "bad")])
    });

    let err = output
        .handle_patches(&json!([{"row_index": 0, "column_index": 0, "value": "x"}]))
        .await
        .unwrap_err();
    assert!(matches!(err, DataViewError::InvalidPatchOutput { index: 1, .. }));
    assert!(err.to_string().contains("grid's `patches_fn()`"));
    assert!(output.cell_patches().is_empty());
}

#[tokio::test]
async fn test_callback_failure_is_reported() {
    let df = test_df(vec![("code", vec!["a"])]);
    let (_, mut output) = render(df, &[]);
    output.set_patch_fn(|_patch: CellPatch| async move {
        Err::<CellValue, PatchFnError>("value must be numeric".into())
    });

    let err = output
        .handle_patches(&json!([{"row_index": 0, "column_index": 0, "value": "x"}]))
        .await
        .unwrap_err();
    assert!(matches!(err, DataViewError::PatchCallback { .. }));
    assert!(err.to_string().contains("value must be numeric"));
}

#[tokio::test]
async fn test_malformed_batch_is_rejected_whole() {
    let df = test_df(vec![("code", vec!["a", "b"])]);
    let (_, mut output) = render(df, &[]);

    let err = output
        .handle_patches(&json!([
            {"row_index": 0, "column_index": 0, "value": "x"},
            {"row_index": "one", "column_index": 0, "value": "y"},
        ]))
        .await
        .unwrap_err();
    assert!(matches!(err, DataViewError::MalformedPatch { index: 1, .. }));
    assert!(output.cell_patches().is_empty());
}

#[test]
fn test_rows_selection_in_single_row_mode_is_truncated() {
    let df = test_df(vec![("code", vec!["a", "b", "c"])]);
    let (_, mut output) = render(df, &[SelectionMode::Row]);

    output.set_input_cell_selection(Some(CellSelection::rows([0, 2]).into()));
    let resolved = output.resolved_selection().unwrap();
    assert_eq!(resolved.selection, CellSelection::rows([0]));
    assert_eq!(
        resolved.warnings,
        vec![SelectionWarning::TruncatedToSingleRow { requested: 2 }]
    );
}

#[test]
fn test_filter_drops_stale_selected_rows() {
    let df = test_df(vec![("code", vec!["N1", "N2A", "N2B", "N3"])]);
    let (_, mut output) = render(df, &[SelectionMode::Rows]);

    output.set_input_cell_selection(Some(CellSelection::rows([0, 1, 2]).into()));
    assert_eq!(output.cell_selection().unwrap(), CellSelection::rows([0, 1, 2]));

    output.set_input_column_filter(vec![ColumnFilter::text(0, "N2")]);
    assert_eq!(output.cell_selection().unwrap(), CellSelection::rows([1, 2]));
    assert_eq!(
        column_values(&output.data_view(true).unwrap(), 0),
        vec!["N2A", "N2B"]
    );
}

#[test]
fn test_rerender_resets_state() {
    let df = test_df(vec![("code", vec!["b", "a"])]);
    let (session, mut output) = render(df.clone(), &[SelectionMode::Rows]);
    output.set_input_column_sort(vec![ColumnSort::asc(0)]);
    output.set_input_cell_selection(Some(CellSelection::rows([1]).into()));
    output.set_cell_value(0, 0, "c").unwrap();

    output.render(Some(df.into())).unwrap();
    assert!(output.sort().is_empty());
    assert!(output.cell_patches().is_empty());
    assert_eq!(output.cell_selection().unwrap(), CellSelection::None);
    assert_eq!(&*output.data_view_rows().unwrap(), &[0, 1]);
    assert!(session.handler_enabled("data_frame_patches_grid"));
}
