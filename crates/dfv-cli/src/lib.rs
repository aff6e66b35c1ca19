//! CLI library components for the data frame viewer.

pub mod args;
pub mod logging;
pub mod view;
