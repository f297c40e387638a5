//! vnmacro - Vietnam macroeconomy chart data
//!
//! Loads the site's CSV and boundary files, reconciles country names,
//! classifies values and writes one plotting-ready JSON document per chart.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod resolve;
pub mod scale;
pub mod stats;
pub mod telemetry;

pub use config::{ConfigError, SiteConfig};
pub use pipeline::{run, ChartKind, RunReport};
