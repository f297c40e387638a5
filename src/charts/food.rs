//! Food Consumption Chart
//! Per-category series plus a ranking for one year.

use crate::charts::ChartError;
use crate::data::{parse_year, CsvTable, DataProcessor, ProcessorError, SeriesPoint};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySeries {
    pub category: String,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedValue {
    pub category: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodChart {
    pub title: String,
    pub unit: String,
    pub years: Vec<i32>,
    pub series: Vec<CategorySeries>,
    pub selected_year: i32,
    /// Largest first; equal values keep file order.
    pub ranking: Vec<RankedValue>,
}

pub struct FoodBuilder;

impl FoodBuilder {
    /// `year` defaults to the latest year column.
    pub fn build(
        table: &CsvTable,
        category_column: &str,
        title: &str,
        unit: &str,
        year: Option<i32>,
    ) -> Result<FoodChart, ChartError> {
        let mut years = table
            .value_columns
            .iter()
            .map(|c| parse_year(c).ok_or_else(|| ProcessorError::InvalidYear(c.clone())))
            .collect::<Result<Vec<i32>, _>>()?;
        years.sort_unstable();

        let selected_year = match year.or_else(|| years.last().copied()) {
            Some(y) => y,
            None => return Err(ChartError::EmptySeries(title.to_string())),
        };
        let column = table
            .value_columns
            .iter()
            .find(|c| parse_year(c) == Some(selected_year))
            .ok_or_else(|| ChartError::MissingYear(selected_year.to_string()))?;

        let mut series = Vec::new();
        for row in &table.rows {
            let Some(category) = row.text(category_column) else {
                continue;
            };
            series.push(CategorySeries {
                category: category.to_string(),
                points: DataProcessor::row_to_series(row, &table.value_columns)?,
            });
        }

        let mut ranking: Vec<RankedValue> = DataProcessor::period_values(table, category_column, column)?
            .into_iter()
            .map(|(category, value)| RankedValue { category, value })
            .collect();
        ranking.sort_by(|a, b| b.value.total_cmp(&a.value));

        debug!(categories = series.len(), selected_year, "built food chart");

        Ok(FoodChart {
            title: title.to_string(),
            unit: unit.to_string(),
            years,
            series,
            selected_year,
            ranking,
        })
    }
}
