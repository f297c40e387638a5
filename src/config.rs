//! Site Configuration
//! Which charts to build, from which files, with which scales.

use crate::charts::choropleth::MapOptions;
use crate::data::{RowMatcher, TableSchema, ValueColumns};
use crate::scale::{
    LinearColorScale, Rgb, ScaleError, ThresholdScale, INFLATION_COLORS, INFLATION_THRESHOLDS,
    NO_DATA_COLOR,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{section}: {source}")]
    Scale {
        section: &'static str,
        #[source]
        source: ScaleError,
    },
    #[error("{section}: {message}")]
    Invalid {
        section: &'static str,
        message: String,
    },
}

fn invalid(section: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        section,
        message: message.into(),
    }
}

/// A chart section left out of the file is not built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    /// Extra `alias -> canonical` country names on top of the built-in table.
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
    #[serde(default)]
    pub gdp_growth: Option<LineChartConfig>,
    #[serde(default)]
    pub cpi_vs_gdp: Option<DualChartConfig>,
    #[serde(default)]
    pub food_consumption: Option<FoodConfig>,
    #[serde(default)]
    pub cpi_heatmap: Option<HeatmapConfig>,
    #[serde(default)]
    pub inflation_map: Option<MapConfig>,
    #[serde(default)]
    pub sankey: Option<SankeyConfig>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("out")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineChartConfig {
    pub file: String,
    pub schema: TableSchema,
    pub row: RowMatcher,
    pub title: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DualChartConfig {
    pub inflation_file: String,
    pub gdp_file: String,
    pub schema: TableSchema,
    pub inflation_row: RowMatcher,
    pub gdp_row: RowMatcher,
    pub title: String,
    /// Notes shown on the matching year's point.
    #[serde(default)]
    pub events: IndexMap<i32, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FoodConfig {
    pub file: String,
    pub category_column: String,
    pub title: String,
    pub unit: String,
    /// Ranking year; latest year when absent.
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeatmapConfig {
    pub file: String,
    pub category_column: String,
    pub title: String,
    pub domain: Vec<f64>,
    pub colors: Vec<String>,
    pub neutral: f64,
}

impl HeatmapConfig {
    pub fn scale(&self) -> Result<LinearColorScale, ScaleError> {
        LinearColorScale::new(&self.domain, &self.colors)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundarySource {
    pub file: String,
    /// Topology object holding the countries; `None` for GeoJSON.
    #[serde(default)]
    pub object: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapConfig {
    pub file: String,
    pub schema: TableSchema,
    pub name_column: String,
    /// Tried in order; the first that loads is used.
    pub boundaries: Vec<BoundarySource>,
    pub thresholds: Vec<f64>,
    pub colors: Vec<String>,
    pub options: MapOptions,
}

impl MapConfig {
    pub fn scale(&self) -> Result<ThresholdScale<String>, ScaleError> {
        for color in &self.colors {
            Rgb::parse_hex(color)?;
        }
        ThresholdScale::new(self.thresholds.clone(), self.colors.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YearComparison {
    pub base: String,
    pub compare: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SankeyConfig {
    pub sectors_file: String,
    pub macro_file: String,
    pub io_file: String,
    pub title: String,
    /// Diagram years; every year with data when empty.
    #[serde(default)]
    pub years: Vec<String>,
    pub default_year: String,
    #[serde(default)]
    pub comparison: Option<YearComparison>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let events: IndexMap<i32, String> = [
            (1996, "Normalization: Economy stabilizes post-Doi Moi reforms."),
            (1997, "Asian Financial Crisis: Regional impact dampens growth."),
            (1998, "Crisis Impact: Growth slows, inflation rises moderately."),
            (1999, "Recovery: Inflation stabilizes, growth begins to recover."),
            (2000, "Deflation: Weak domestic demand despite growth."),
            (2001, "Deflation continues: Global slowdown impacts prices."),
            (2002, "Recovery: Domestic demand picks up, prices normalize."),
            (2003, "Expansion: Strong growth, mild inflation."),
            (2004, "Heating Up: Rapid credit growth fuels inflation."),
            (2005, "Pre-WTO Boom: Strong investment drives prices up."),
            (2006, "High Growth: Economy overheats before WTO entry."),
            (2007, "WTO Accession: Massive capital inflows, asset bubbles."),
            (2008, "Crisis Spike: Oil >$140/bbl + internal overheating."),
            (2009, "Stimulus: Gov pumps money to counter global crisis."),
            (2010, "Instability: Devaluation & stimulus lag effects."),
            (2011, "Peak Instability: Resolution 11 passes to curb inflation."),
            (2012, "Stabilization: Credit tightening cools the economy."),
            (2013, "Single Digit: Inflation successfully brought under control."),
            (2014, "Low Oil: Global oil collapse aids price stability."),
            (2015, "Golden Era: High growth, record low inflation."),
            (2016, "Stable Growth: Robust exports, stable macro."),
            (2017, "Broad Growth: Strong FDI, controlled CPI."),
            (2018, "Trade War: Vietnam benefits, manufacturing boom."),
            (2019, "Peak Stability: 7% growth with <3% inflation."),
            (2020, "COVID-19: Demand shock crashes inflation."),
            (2021, "Supply Crunch: Low base effect, supply chain issues."),
            (2022, "The Divergence: High growth vs controlled CPI (subsidies)."),
            (2023, "Global Slowdown: External demand weakens growth."),
            (2024, "Recovery: Gradual return to trend growth."),
        ]
        .into_iter()
        .map(|(year, note)| (year, note.to_string()))
        .collect();

        Self {
            data_dir: default_data_dir(),
            out_dir: default_out_dir(),
            aliases: IndexMap::new(),
            gdp_growth: Some(LineChartConfig {
                file: "GDP growth.csv".into(),
                schema: TableSchema::world_bank(1960, 2100),
                row: RowMatcher::contains("Country Name", "viet"),
                title: "Vietnam GDP Growth".into(),
                unit: "%".into(),
            }),
            cpi_vs_gdp: Some(DualChartConfig {
                inflation_file: "inflation-consumer-price.csv".into(),
                gdp_file: "gdp-growth-rate.csv".into(),
                schema: TableSchema::world_bank(1960, 2100),
                inflation_row: RowMatcher::equals("Country Code", "VNM")
                    .and_equals("Indicator Code", "FP.CPI.TOTL.ZG"),
                gdp_row: RowMatcher::equals("Country Code", "VNM")
                    .and_equals("Indicator Code", "NY.GDP.MKTP.KD.ZG"),
                title: "Inflation vs GDP Growth".into(),
                events,
            }),
            food_consumption: Some(FoodConfig {
                file: "food_consumption.csv".into(),
                category_column: "Category".into(),
                title: "Food Consumption".into(),
                unit: "kg/person".into(),
                year: None,
            }),
            cpi_heatmap: Some(HeatmapConfig {
                file: "CPI_average_year.csv".into(),
                category_column: "Category".into(),
                title: "CPI by Commodity Group".into(),
                domain: vec![95.0, 100.0, 115.0],
                colors: vec!["#4575b4".into(), "#ffffff".into(), "#d73027".into()],
                neutral: 100.0,
            }),
            inflation_map: Some(MapConfig {
                file: "global_inflation_data.csv".into(),
                schema: TableSchema::new(
                    ["country_name", "indicator_name"],
                    ValueColumns::YearRange {
                        first: 1980,
                        last: 2100,
                    },
                ),
                name_column: "country_name".into(),
                boundaries: vec![
                    BoundarySource {
                        file: "world-countries-110m.json".into(),
                        object: Some("countries".into()),
                    },
                    BoundarySource {
                        file: "world.geojson".into(),
                        object: None,
                    },
                ],
                thresholds: INFLATION_THRESHOLDS.to_vec(),
                colors: INFLATION_COLORS.iter().map(|c| c.to_string()).collect(),
                options: MapOptions {
                    title: "Global Inflation".into(),
                    unit: "%".into(),
                    first_year: 2000,
                    last_year: 2024,
                    selected_year: 2024,
                    focus_country: "Vietnam".into(),
                    no_data_color: NO_DATA_COLOR.into(),
                },
            }),
            sankey: Some(SankeyConfig {
                sectors_file: "sectors.csv".into(),
                macro_file: "macro.csv".into(),
                io_file: "io_mapping.csv".into(),
                title: "How Inflation Flows Through Vietnam's Economy".into(),
                years: vec!["2021".into(), "2022".into()],
                default_year: "2022".into(),
                comparison: Some(YearComparison {
                    base: "2021".into(),
                    compare: "2022".into(),
                }),
            }),
        }
    }
}

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolve a data file name against `data_dir`.
    pub fn data_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// Check scales, year ranges and required lists before anything runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scale_err =
            |section: &'static str| move |source: ScaleError| ConfigError::Scale { section, source };

        if let Some(c) = &self.gdp_growth {
            check_schema("gdp_growth", &c.schema)?;
        }
        if let Some(c) = &self.cpi_vs_gdp {
            check_schema("cpi_vs_gdp", &c.schema)?;
        }
        if let Some(c) = &self.cpi_heatmap {
            c.scale().map_err(scale_err("cpi_heatmap"))?;
        }
        if let Some(c) = &self.inflation_map {
            check_schema("inflation_map", &c.schema)?;
            c.scale().map_err(scale_err("inflation_map"))?;
            Rgb::parse_hex(&c.options.no_data_color).map_err(scale_err("inflation_map"))?;
            if c.boundaries.is_empty() {
                return Err(invalid("inflation_map", "no boundary files configured"));
            }
            let o = &c.options;
            if o.first_year > o.last_year || !(o.first_year..=o.last_year).contains(&o.selected_year) {
                return Err(invalid(
                    "inflation_map",
                    format!(
                        "selected year {} outside {}..={}",
                        o.selected_year, o.first_year, o.last_year
                    ),
                ));
            }
        }
        if let Some(c) = &self.sankey {
            if !c.years.is_empty() && !c.years.contains(&c.default_year) {
                return Err(invalid(
                    "sankey",
                    format!("default year {} is not among the diagram years", c.default_year),
                ));
            }
        }
        Ok(())
    }
}

fn check_schema(section: &'static str, schema: &TableSchema) -> Result<(), ConfigError> {
    if let ValueColumns::YearRange { first, last } = schema.values {
        if first > last {
            return Err(invalid(section, format!("empty year range {first}..={last}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SiteConfig::default();
        config.validate().unwrap();
        assert_eq!(config.data_path("macro.csv"), PathBuf::from("data/macro.csv"));
        let events = &config.cpi_vs_gdp.as_ref().unwrap().events;
        assert!(events.contains_key(&2008));
    }

    #[test]
    fn missing_sections_are_disabled() {
        let config = SiteConfig::from_json(
            r#"{
                "data_dir": "site/data",
                "food_consumption": {
                    "file": "food.csv",
                    "category_column": "Category",
                    "title": "Food",
                    "unit": "kg"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.out_dir, PathBuf::from("out"));
        assert!(config.gdp_growth.is_none());
        assert!(config.sankey.is_none());
        assert_eq!(config.food_consumption.unwrap().year, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(SiteConfig::from_json(r#"{ "data_dri": "x" }"#).is_err());
    }

    #[test]
    fn unknown_map_option_is_rejected() {
        let mut json = serde_json::to_value(SiteConfig::default()).unwrap();
        json["inflation_map"]["options"]["focus_contry"] = "Vietnam".into();
        assert!(SiteConfig::from_json(&json.to_string()).is_err());
    }

    #[test]
    fn default_round_trips_through_json() {
        let json = serde_json::to_string(&SiteConfig::default()).unwrap();
        assert_eq!(SiteConfig::from_json(&json).unwrap(), SiteConfig::default());
    }

    #[test]
    fn bad_scales_fail_validation() {
        let mut config = SiteConfig::default();
        if let Some(map) = config.inflation_map.as_mut() {
            map.colors.pop();
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Scale {
                section: "inflation_map",
                ..
            })
        ));

        let mut config = SiteConfig::default();
        if let Some(heat) = config.cpi_heatmap.as_mut() {
            heat.colors[1] = "white".into();
        }
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        if let Some(map) = config.inflation_map.as_mut() {
            map.options.selected_year = 2030;
        }
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }
}
