//! Charts module - plotting-ready chart documents

pub mod choropleth;
pub mod food;
pub mod heatmap;
pub mod sankey;
pub mod series;

pub use choropleth::{ChoroplethBuilder, ChoroplethChart, FeatureFill, MapFrame, MapOverlay};
pub use food::{FoodBuilder, FoodChart};
pub use heatmap::{HeatmapBuilder, HeatmapCell, HeatmapChart};
pub use sankey::{format_pct, round2, SankeyChart, SankeyDiagram, SankeyModel};
pub use series::{DualLineChart, DualPoint, LineChart, SeriesChartBuilder};

use crate::data::{GeoError, LoaderError, ProcessorError};
use crate::scale::ScaleError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Scale(#[from] ScaleError),
    #[error(transparent)]
    Geo(#[from] GeoError),
    #[error("No data for year {0}")]
    MissingYear(String),
    #[error("Series '{0}' has no values")]
    EmptySeries(String),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize chart: {0}")]
    Json(#[from] serde_json::Error),
}
