//! CLI argument definitions for the data frame viewer.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use dfv_cli::args::{FilterArg, PatchArg, SortArg};

#[derive(Parser)]
#[command(
    name = "dfv",
    version,
    about = "Data frame viewer - replay grid interactions against a CSV",
    long_about = "Load a CSV into the interactive data frame view engine.\n\n\
                  Sorts, filters, cell edits and row selections are applied the way a\n\
                  browser grid would send them, and the resulting view is printed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show a CSV the way the grid would after the given interactions.
    View(ViewArgs),

    /// List the accepted selection modes.
    Modes,
}

#[derive(Parser)]
pub struct ViewArgs {
    /// CSV file with a header row.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Sort by a column (name or position); repeat for tie breakers.
    #[arg(long = "sort", value_name = "COL[:desc]")]
    pub sort: Vec<SortArg>,

    /// Filter a column by text or by an inclusive numeric range.
    ///
    /// Either range bound may be left out, as in `age=18..` or `age=..65`.
    #[arg(long = "filter", value_name = "COL=TEXT|COL=MIN..MAX")]
    pub filter: Vec<FilterArg>,

    /// Edit a cell of the loaded data before sorting and filtering.
    #[arg(long = "patch", value_name = "ROW,COL=VALUE")]
    pub patch: Vec<PatchArg>,

    /// Allowed selection mode (none, row, rows, col, cols, cell, region).
    ///
    /// Repeat to combine modes of different granularity.
    #[arg(long = "selection-mode", value_name = "MODE")]
    pub selection_mode: Vec<String>,

    /// Rows of the loaded data selected in the grid.
    #[arg(long = "select-rows", value_name = "R,R", value_delimiter = ',')]
    pub select_rows: Option<Vec<usize>>,

    /// Only show the selected rows of the view.
    #[arg(long = "selected")]
    pub selected: bool,

    /// TOML file with engine settings (string_filter, nulls).
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the view as JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,

    /// Maximum number of rows to print in table output.
    #[arg(long = "max-rows", value_name = "N", default_value_t = 50)]
    pub max_rows: usize,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
