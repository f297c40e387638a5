//! Chart Pipeline
//! Loads each configured chart's files, builds the chart and writes it as JSON.
//!
//! Charts run concurrently and fail independently: one missing file or
//! row is logged and leaves every other chart untouched.

use crate::charts::choropleth::ChoroplethBuilder;
use crate::charts::{ChartError, FoodBuilder, HeatmapBuilder, SankeyModel, SeriesChartBuilder};
use crate::config::{
    BoundarySource, DualChartConfig, FoodConfig, HeatmapConfig, LineChartConfig, MapConfig,
    SankeyConfig, SiteConfig,
};
use crate::data::{
    parse_boundaries, CountryDataset, CsvTable, DataLoader, GeoError, GeoFeature, LoaderError, TableSchema,
};
use crate::resolve::AliasTable;
use futures::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, info_span, warn, Instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    GdpGrowth,
    CpiVsGdp,
    FoodConsumption,
    CpiHeatmap,
    InflationMap,
    Sankey,
}

impl ChartKind {
    pub fn name(self) -> &'static str {
        match self {
            ChartKind::GdpGrowth => "gdp_growth",
            ChartKind::CpiVsGdp => "cpi_vs_gdp",
            ChartKind::FoodConsumption => "food_consumption",
            ChartKind::CpiHeatmap => "cpi_heatmap",
            ChartKind::InflationMap => "inflation_map",
            ChartKind::Sankey => "sankey",
        }
    }

    pub fn output_name(self) -> String {
        format!("{}.json", self.name())
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one run, in configuration order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub written: Vec<(ChartKind, PathBuf)>,
    pub failed: Vec<(ChartKind, ChartError)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

type ChartJob<'a> = BoxFuture<'a, (ChartKind, Result<PathBuf, ChartError>)>;

fn job<'a, F>(kind: ChartKind, work: F) -> ChartJob<'a>
where
    F: Future<Output = Result<PathBuf, ChartError>> + Send + 'a,
{
    async move { (kind, work.await) }
        .instrument(info_span!("chart", %kind))
        .boxed()
}

/// Build every enabled chart.
pub async fn run(config: &SiteConfig) -> RunReport {
    let aliases = AliasTable::builtin().extended(&config.aliases);
    let aliases = &aliases;

    let mut jobs: Vec<ChartJob<'_>> = Vec::new();
    if let Some(c) = &config.gdp_growth {
        jobs.push(job(ChartKind::GdpGrowth, gdp_growth(config, c)));
    }
    if let Some(c) = &config.cpi_vs_gdp {
        jobs.push(job(ChartKind::CpiVsGdp, cpi_vs_gdp(config, c)));
    }
    if let Some(c) = &config.food_consumption {
        jobs.push(job(ChartKind::FoodConsumption, food_consumption(config, c)));
    }
    if let Some(c) = &config.cpi_heatmap {
        jobs.push(job(ChartKind::CpiHeatmap, cpi_heatmap(config, c)));
    }
    if let Some(c) = &config.inflation_map {
        jobs.push(job(ChartKind::InflationMap, inflation_map(config, c, aliases)));
    }
    if let Some(c) = &config.sankey {
        jobs.push(job(ChartKind::Sankey, sankey(config, c)));
    }
    info!(charts = jobs.len(), "building charts");

    let mut report = RunReport::default();
    for (kind, result) in join_all(jobs).await {
        match result {
            Ok(path) => {
                info!(chart = %kind, path = %path.display(), "chart written");
                report.written.push((kind, path));
            }
            Err(e) => {
                error!(chart = %kind, error = %e, "chart failed");
                report.failed.push((kind, e));
            }
        }
    }
    report
}

async fn read(path: PathBuf) -> Result<Vec<u8>, ChartError> {
    let bytes = tokio::fs::read(&path).await.map_err(|source| LoaderError::Io {
        path: path.display().to_string(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "read file");
    Ok(bytes)
}

async fn read_table(path: PathBuf, schema: &TableSchema) -> Result<CsvTable, ChartError> {
    let bytes = read(path).await?;
    Ok(DataLoader::parse_bytes(bytes, schema)?)
}

async fn write_json<T>(out_dir: &Path, kind: ChartKind, chart: &T) -> Result<PathBuf, ChartError>
where
    T: Serialize + Sync,
{
    let path = out_dir.join(kind.output_name());
    let io_err = |source| ChartError::Io {
        path: path.display().to_string(),
        source,
    };
    let bytes = serde_json::to_vec_pretty(chart)?;
    tokio::fs::create_dir_all(out_dir).await.map_err(io_err)?;
    tokio::fs::write(&path, bytes).await.map_err(io_err)?;
    Ok(path)
}

async fn gdp_growth(config: &SiteConfig, c: &LineChartConfig) -> Result<PathBuf, ChartError> {
    let table = read_table(config.data_path(&c.file), &c.schema).await?;
    let chart = SeriesChartBuilder::line(&table, &c.row, &c.title, &c.unit)?;
    write_json(&config.out_dir, ChartKind::GdpGrowth, &chart).await
}

async fn cpi_vs_gdp(config: &SiteConfig, c: &DualChartConfig) -> Result<PathBuf, ChartError> {
    let (inflation, gdp) = tokio::try_join!(
        read_table(config.data_path(&c.inflation_file), &c.schema),
        read_table(config.data_path(&c.gdp_file), &c.schema),
    )?;
    let chart = SeriesChartBuilder::dual(
        &c.title,
        &inflation,
        &c.inflation_row,
        &gdp,
        &c.gdp_row,
        &c.events,
    )?;
    write_json(&config.out_dir, ChartKind::CpiVsGdp, &chart).await
}

async fn food_consumption(config: &SiteConfig, c: &FoodConfig) -> Result<PathBuf, ChartError> {
    let schema = TableSchema::category(&c.category_column);
    let table = read_table(config.data_path(&c.file), &schema).await?;
    let chart = FoodBuilder::build(&table, &c.category_column, &c.title, &c.unit, c.year)?;
    write_json(&config.out_dir, ChartKind::FoodConsumption, &chart).await
}

async fn cpi_heatmap(config: &SiteConfig, c: &HeatmapConfig) -> Result<PathBuf, ChartError> {
    let scale = c.scale()?;
    let schema = TableSchema::category(&c.category_column);
    let table = read_table(config.data_path(&c.file), &schema).await?;
    let chart = HeatmapBuilder::build(&table, &c.category_column, &c.title, &scale, c.neutral)?;
    write_json(&config.out_dir, ChartKind::CpiHeatmap, &chart).await
}

/// First boundary source that reads and parses.
async fn load_boundaries(
    config: &SiteConfig,
    sources: &[BoundarySource],
) -> Result<Vec<GeoFeature>, ChartError> {
    let mut last_error = None;
    for source in sources {
        let path = config.data_path(&source.file);
        let loaded = match read(path.clone()).await {
            Ok(bytes) => parse_boundaries(&bytes, source.object.as_deref()).map_err(ChartError::from),
            Err(e) => Err(e),
        };
        match loaded {
            Ok(features) => {
                info!(path = %path.display(), features = features.len(), "loaded boundaries");
                return Ok(features);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "boundary source unusable, trying next");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or(ChartError::Geo(GeoError::NoFeatures)))
}

async fn inflation_map(
    config: &SiteConfig,
    c: &MapConfig,
    aliases: &AliasTable,
) -> Result<PathBuf, ChartError> {
    let scale = c.scale()?;
    let (table, features) = tokio::try_join!(
        read_table(config.data_path(&c.file), &c.schema),
        load_boundaries(config, &c.boundaries),
    )?;
    let dataset = CountryDataset::from_table(&table, &c.name_column)?;
    info!(countries = dataset.len(), "loaded inflation dataset");

    let chart = ChoroplethBuilder::build(&dataset, aliases, &features, &scale, &c.options)?;
    write_json(&config.out_dir, ChartKind::InflationMap, &chart).await
}

async fn sankey(config: &SiteConfig, c: &SankeyConfig) -> Result<PathBuf, ChartError> {
    let schemas = (
        SankeyModel::sectors_schema(),
        SankeyModel::macro_schema(),
        SankeyModel::io_schema(),
    );
    let (sectors, macros, io) = tokio::try_join!(
        read_table(config.data_path(&c.sectors_file), &schemas.0),
        read_table(config.data_path(&c.macro_file), &schemas.1),
        read_table(config.data_path(&c.io_file), &schemas.2),
    )?;
    let model = SankeyModel::from_tables(&sectors, &macros, &io);
    let comparison = c
        .comparison
        .as_ref()
        .map(|y| (y.base.as_str(), y.compare.as_str()));
    let chart = model.chart(&c.title, &c.years, &c.default_year, comparison)?;
    write_json(&config.out_dir, ChartKind::Sankey, &chart).await
}
