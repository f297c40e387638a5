//! CPI Heatmap
//! Category-by-year index values colored around a neutral level.

use crate::charts::ChartError;
use crate::data::{CsvTable, DataProcessor};
use crate::scale::{LinearColorScale, NO_DATA_COLOR};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStatus {
    Inflation,
    Deflation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub group: String,
    pub period: String,
    pub value: f64,
    pub color: String,
    pub status: PriceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRow {
    pub group: String,
    /// First word of the group name, for the axis.
    pub short_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapChart {
    pub title: String,
    pub rows: Vec<HeatmapRow>,
    pub periods: Vec<String>,
    pub cells: Vec<HeatmapCell>,
    pub color_domain: Vec<f64>,
    pub color_range: Vec<String>,
    pub neutral: f64,
}

pub struct HeatmapBuilder;

impl HeatmapBuilder {
    /// Values above `neutral` are inflation, the rest deflation.
    pub fn build(
        table: &CsvTable,
        group_column: &str,
        title: &str,
        scale: &LinearColorScale,
        neutral: f64,
    ) -> Result<HeatmapChart, ChartError> {
        let records = DataProcessor::stack_to_long(table, group_column);
        if records.is_empty() {
            return Err(ChartError::EmptySeries(title.to_string()));
        }

        let rows = DataProcessor::get_groups(table, group_column)
            .into_iter()
            .map(|group| HeatmapRow {
                short_label: short_label(&group).to_string(),
                group,
            })
            .collect();

        let cells: Vec<HeatmapCell> = records
            .into_iter()
            .map(|r| HeatmapCell {
                color: scale.color(r.value).unwrap_or_else(|| NO_DATA_COLOR.to_string()),
                status: if r.value > neutral {
                    PriceStatus::Inflation
                } else {
                    PriceStatus::Deflation
                },
                group: r.group,
                period: r.period,
                value: r.value,
            })
            .collect();

        debug!(cells = cells.len(), "built heatmap");

        Ok(HeatmapChart {
            title: title.to_string(),
            rows,
            periods: table.value_columns.clone(),
            cells,
            color_domain: scale.domain(),
            color_range: scale.colors(),
            neutral,
        })
    }
}

fn short_label(group: &str) -> &str {
    group.split_whitespace().next().unwrap_or(group)
}
