//! Inflation Choropleth
//! Colors boundary features by their resolved country's value, one frame per year.

use crate::charts::ChartError;
use crate::data::{CountryDataset, GeoFeature};
use crate::resolve::{AliasTable, EntityResolver, MatchKind, Resolution};
use crate::scale::{LegendEntry, ThresholdScale};
use crate::stats::StatsCalculator;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Timeline and overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapOptions {
    pub title: String,
    pub unit: String,
    pub first_year: i32,
    pub last_year: i32,
    pub selected_year: i32,
    pub focus_country: String,
    pub no_data_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureFill {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Dataset key the feature resolved to.
    pub matched: Option<String>,
    pub match_kind: Option<MatchKind>,
    pub value: Option<f64>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapOverlay {
    /// Mean over every country with a value that year.
    pub global_average: Option<f64>,
    pub global_color: Option<String>,
    pub focus_country: String,
    pub focus_value: Option<f64>,
    pub focus_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFrame {
    pub year: i32,
    pub with_data: usize,
    pub fills: Vec<FeatureFill>,
    pub overlay: MapOverlay,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResolutionStats {
    pub features: usize,
    pub matched: usize,
    pub by_kind: IndexMap<MatchKind, usize>,
    pub unmatched: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoroplethChart {
    pub title: String,
    pub unit: String,
    pub selected_year: i32,
    pub no_data_color: String,
    pub legend: Vec<LegendEntry<String>>,
    pub resolution: ResolutionStats,
    pub frames: Vec<MapFrame>,
}

pub struct ChoroplethBuilder;

impl ChoroplethBuilder {
    pub fn build(
        dataset: &CountryDataset,
        aliases: &AliasTable,
        features: &[GeoFeature],
        scale: &ThresholdScale<String>,
        options: &MapOptions,
    ) -> Result<ChoroplethChart, ChartError> {
        if options.first_year > options.last_year {
            return Err(ChartError::MissingYear(format!(
                "{}..={}",
                options.first_year, options.last_year
            )));
        }
        if !(options.first_year..=options.last_year).contains(&options.selected_year) {
            return Err(ChartError::MissingYear(options.selected_year.to_string()));
        }

        // Names do not change between years, so each feature is resolved once.
        let resolver = EntityResolver::new(dataset, aliases);
        let resolved: Vec<(&GeoFeature, Option<Resolution<'_>>)> =
            features.iter().map(|f| (f, resolver.resolve(&f.name))).collect();
        let focus = resolver.resolve(&options.focus_country);

        let resolution = Self::resolution_stats(&resolved);
        info!(
            features = resolution.features,
            matched = resolution.matched,
            unmatched = resolution.unmatched.len(),
            "resolved map features"
        );
        for name in &resolution.unmatched {
            debug!(feature = %name, "no dataset entry for feature");
        }

        let frames: Vec<MapFrame> = (options.first_year..=options.last_year)
            .into_par_iter()
            .map(|year| Self::frame(year, dataset, &resolved, focus.as_ref(), scale, options))
            .collect();

        Ok(ChoroplethChart {
            title: options.title.clone(),
            unit: options.unit.clone(),
            selected_year: options.selected_year,
            no_data_color: options.no_data_color.clone(),
            legend: scale.legend(&options.unit),
            resolution,
            frames,
        })
    }

    fn frame(
        year: i32,
        dataset: &CountryDataset,
        resolved: &[(&GeoFeature, Option<Resolution<'_>>)],
        focus: Option<&Resolution<'_>>,
        scale: &ThresholdScale<String>,
        options: &MapOptions,
    ) -> MapFrame {
        let year_key = year.to_string();
        let color_of = |value: f64| scale.classify(value).cloned();

        let fills: Vec<FeatureFill> = resolved
            .iter()
            .map(|(feature, hit)| {
                let value = hit.as_ref().and_then(|r| r.values.get(&year_key).copied());
                FeatureFill {
                    id: feature.id.clone(),
                    name: feature.name.clone(),
                    matched: hit.as_ref().map(|r| r.key.to_string()),
                    match_kind: hit.as_ref().map(|r| r.kind),
                    value,
                    color: value
                        .and_then(color_of)
                        .unwrap_or_else(|| options.no_data_color.clone()),
                }
            })
            .collect();

        let global_average = StatsCalculator::mean(&dataset.values_for_year(&year_key));
        let focus_value = focus.and_then(|r| r.values.get(&year_key).copied());

        MapFrame {
            year,
            with_data: fills.iter().filter(|f| f.value.is_some()).count(),
            fills,
            overlay: MapOverlay {
                global_average,
                global_color: global_average.and_then(color_of),
                focus_country: focus
                    .map(|r| r.key.to_string())
                    .unwrap_or_else(|| options.focus_country.clone()),
                focus_value,
                focus_color: focus_value.and_then(color_of),
            },
        }
    }

    fn resolution_stats(resolved: &[(&GeoFeature, Option<Resolution<'_>>)]) -> ResolutionStats {
        let mut stats = ResolutionStats {
            features: resolved.len(),
            ..Default::default()
        };
        for (feature, hit) in resolved {
            match hit {
                Some(r) => {
                    stats.matched += 1;
                    *stats.by_kind.entry(r.kind).or_insert(0) += 1;
                }
                None => stats.unmatched.push(feature.name.clone()),
            }
        }
        stats
    }
}
