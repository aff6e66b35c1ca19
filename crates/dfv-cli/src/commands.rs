use anyhow::{Context, Result};
use comfy_table::Table;

use dfv_cli::view::{ViewRequest, load_config, run_view};
use dfv_core::{SelectionMode, SelectionModes};

use crate::cli::ViewArgs;

pub fn run_modes() {
    let mut table = Table::new();
    table.set_header(vec!["Mode", "Selects", "Supported"]);
    for mode in SelectionMode::ALL {
        let selects = match mode {
            SelectionMode::None => "nothing",
            SelectionMode::Row => "a single row",
            SelectionMode::Rows => "any number of rows",
            SelectionMode::Col => "a single column",
            SelectionMode::Cols => "any number of columns",
            SelectionMode::Cell => "a single cell",
            SelectionMode::Region => "a rectangular region",
        };
        let supported = if SelectionModes::from_modes(&[mode]).is_ok() {
            "yes"
        } else {
            "not yet"
        };
        table.add_row(vec![mode.as_str(), selects, supported]);
    }
    println!("{table}");
}

pub fn run_view_command(args: &ViewArgs) -> Result<()> {
    let selection_modes = args
        .selection_mode
        .iter()
        .map(|name| name.parse::<SelectionMode>())
        .collect::<Result<Vec<_>, _>>()?;
    let request = ViewRequest {
        csv: args.csv.clone(),
        sort: args.sort.clone(),
        filter: args.filter.clone(),
        patches: args.patch.clone(),
        selection_modes,
        select_rows: args.select_rows.clone(),
        selected_only: args.selected,
        config: load_config(args.config.as_deref())?,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("start async runtime")?;
    let report = runtime.block_on(run_view(&request))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.to_json()?)?);
        return Ok(());
    }

    println!("{}", report.to_table(args.max_rows));
    if report.rows.len() > args.max_rows {
        println!("... {} more rows", report.rows.len() - args.max_rows);
    }
    if let Some(summary) = &report.summary {
        println!("{summary}");
    }
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(())
}
