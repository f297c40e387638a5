//! Scale module - numeric value to color/category mapping

mod linear;
mod threshold;

pub use linear::{LinearColorScale, Rgb};
pub use threshold::{LegendEntry, ThresholdScale};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScaleError {
    #[error("expected {expected} labels for {boundaries} boundaries, got {actual}")]
    LabelCount {
        boundaries: usize,
        expected: usize,
        actual: usize,
    },
    #[error("boundaries must be finite and strictly increasing (index {0})")]
    Unordered(usize),
    #[error("'{0}' is not a #rrggbb color")]
    InvalidColor(String),
    #[error("a linear color scale needs at least two stops")]
    TooFewStops,
}

/// Inflation choropleth boundaries (percent).
pub const INFLATION_THRESHOLDS: [f64; 7] = [-5.0, 0.0, 2.0, 5.0, 10.0, 20.0, 50.0];

/// Deflation greens through hyperinflation reds, one per bucket.
pub const INFLATION_COLORS: [&str; 8] = [
    "#2e7d32", "#66bb6a", "#ffeb3b", "#ff9800", "#f44336", "#c62828", "#8e0000", "#8e0000",
];

/// Fill for features without a value.
pub const NO_DATA_COLOR: &str = "#e0e0e0";
