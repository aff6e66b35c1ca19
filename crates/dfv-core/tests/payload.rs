//! Snapshot of the render payload sent to the browser.

use std::sync::Arc;

use polars::prelude::{DataFrame, NamedFrom, Series};

use dfv_core::{DataFrameOutput, DataGrid, MemorySession, SelectionMode};

#[test]
fn test_render_payload_snapshot() {
    let df = DataFrame::new(vec![
        Series::new("name".into(), &[Some("a"), None]).into(),
        Series::new("n".into(), &[1i64, 2]).into(),
    ])
    .unwrap();
    let grid = DataGrid::new(df)
        .with_editable(true)
        .with_selection_mode(&[SelectionMode::Rows])
        .unwrap();

    let session = Arc::new(MemorySession::new("session-1"));
    let mut output = DataFrameOutput::new(session.clone());
    output.bind("grid", session.as_ref()).unwrap();
    let render = output.render(Some(grid.into())).unwrap().unwrap();

    insta::assert_json_snapshot!(render, @r#"
    {
      "payload": {
        "columns": [
          "name",
          "n"
        ],
        "data": [
          [
            "a",
            1
          ],
          [
            null,
            2
          ]
        ],
        "typeHints": [
          {
            "type": "string"
          },
          {
            "type": "numeric"
          }
        ],
        "options": {
          "width": "fit-content",
          "height": null,
          "summary": true,
          "filters": false,
          "editable": true,
          "style": "grid",
          "fill": true
        }
      },
      "patchInfo": {
        "key": "data_frame_patches_grid"
      },
      "selectionModes": {
        "row": "multiple",
        "col": "none",
        "rect": "none"
      }
    }
    "#);
}

#[test]
fn test_table_payload_options() {
    let df = DataFrame::new(vec![Series::new("n".into(), &[1i64]).into()]).unwrap();
    let session = Arc::new(MemorySession::new("session-1"));
    let mut output = DataFrameOutput::new(session.clone());
    output.bind("table", session.as_ref()).unwrap();
    let render = output
        .render(Some(DataGrid::table(df).into()))
        .unwrap()
        .unwrap();

    let value = serde_json::to_value(&render.payload.options).unwrap();
    assert_eq!(value["style"], "table");
    assert_eq!(value["height"], "500px");
    assert_eq!(render.patch_info.key, "data_frame_patches_table");
}
