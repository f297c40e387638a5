//! Data module - CSV loading, typing and reshaping

pub mod dataset;
pub mod geo;
pub mod loader;
pub mod processor;
pub mod schema;

pub use dataset::{CountryDataset, YearValues};
pub use geo::{parse_boundaries, GeoError, GeoFeature};
pub use loader::{Cell, CsvTable, DataLoader, LoaderError, TypedRow};
pub use processor::{
    Condition, DataProcessor, JoinedPoint, LongRecord, ProcessorError, RowMatcher, SeriesOrder,
    SeriesPoint,
};
pub use schema::{parse_year, TableSchema, ValueColumns};
