//! Series Charts
//! GDP growth line chart and the CPI vs GDP dual-line chart.

use crate::charts::ChartError;
use crate::data::{CsvTable, DataProcessor, RowMatcher, SeriesPoint};
use crate::stats::{SeriesSummary, StatsCalculator};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

/// Single series over years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: String,
    pub unit: String,
    pub points: Vec<SeriesPoint>,
    /// `[min, max]` widened by 10% of each end's magnitude.
    pub y_domain: [f64; 2],
    pub summary: SeriesSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DualPoint {
    pub year: i32,
    pub inflation: f64,
    pub gdp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisDomains {
    pub inflation: [f64; 2],
    pub gdp: [f64; 2],
}

/// Inflation and GDP growth aligned on year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DualLineChart {
    pub title: String,
    pub points: Vec<DualPoint>,
    /// One y-axis per series.
    pub dual_axis: AxisDomains,
    /// Shared y-axis.
    pub single_axis: [f64; 2],
    pub inflation: SeriesSummary,
    pub gdp: SeriesSummary,
}

/// Builds line charts from wide tables.
pub struct SeriesChartBuilder;

impl SeriesChartBuilder {
    /// The first row matching `matcher`, as an ascending series.
    pub fn select_series(table: &CsvTable, matcher: &RowMatcher) -> Result<Vec<SeriesPoint>, ChartError> {
        let row = DataProcessor::find_row(table, matcher)?;
        let points = DataProcessor::row_to_series(row, &table.value_columns)?;
        if points.is_empty() {
            return Err(ChartError::EmptySeries(matcher.to_string()));
        }
        Ok(points)
    }

    pub fn line(table: &CsvTable, matcher: &RowMatcher, title: &str, unit: &str) -> Result<LineChart, ChartError> {
        let points = Self::select_series(table, matcher)?;
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        let summary = StatsCalculator::summarize(&values)
            .ok_or_else(|| ChartError::EmptySeries(title.to_string()))?;

        debug!(title, points = points.len(), "built line chart");

        Ok(LineChart {
            title: title.to_string(),
            unit: unit.to_string(),
            y_domain: StatsCalculator::padded_domain(summary.min, summary.max, 0.1, 0.1),
            points,
            summary,
        })
    }

    /// Join inflation and GDP growth on year and attach event notes.
    pub fn dual(
        title: &str,
        inflation: &CsvTable,
        inflation_row: &RowMatcher,
        gdp: &CsvTable,
        gdp_row: &RowMatcher,
        events: &IndexMap<i32, String>,
    ) -> Result<DualLineChart, ChartError> {
        let inflation_series = Self::select_series(inflation, inflation_row)?;
        let gdp_series = Self::select_series(gdp, gdp_row)?;

        let points: Vec<DualPoint> = DataProcessor::join_series(&inflation_series, &gdp_series)
            .into_iter()
            .map(|p| DualPoint {
                year: p.year,
                inflation: p.left,
                gdp: p.right,
                note: events.get(&p.year).cloned(),
            })
            .collect();

        let infl_values: Vec<f64> = points.iter().map(|p| p.inflation).collect();
        let gdp_values: Vec<f64> = points.iter().map(|p| p.gdp).collect();
        let (Some(infl), Some(growth)) = (
            StatsCalculator::summarize(&infl_values),
            StatsCalculator::summarize(&gdp_values),
        ) else {
            return Err(ChartError::EmptySeries(title.to_string()));
        };

        debug!(title, points = points.len(), "built dual line chart");

        Ok(DualLineChart {
            title: title.to_string(),
            points,
            dual_axis: AxisDomains {
                inflation: StatsCalculator::zero_anchored_domain(infl.min, infl.max, 1.1),
                gdp: StatsCalculator::zero_anchored_domain(growth.min, growth.max, 1.15),
            },
            single_axis: StatsCalculator::zero_anchored_domain(
                infl.min.min(growth.min),
                infl.max.max(growth.max),
                1.1,
            ),
            inflation: infl,
            gdp: growth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataLoader, TableSchema};
    use approx::assert_relative_eq;

    const INFLATION: &str = "\
Country Name,Country Code,Indicator Name,Indicator Code,2019,2020,2021,2022
Thailand,THA,Inflation,FP.CPI.TOTL.ZG,0.7,-0.8,1.2,6.1
Viet Nam,VNM,Inflation,FP.CPI.TOTL.ZG,2.8,3.2,1.8,3.2
";

    const GDP: &str = "\
Country Name,Country Code,Indicator Name,Indicator Code,2019,2020,2021,2022
Viet Nam,VNM,GDP growth,NY.GDP.MKTP.KD.ZG,7.4,2.9,2.6,
";

    fn table(text: &str) -> CsvTable {
        DataLoader::parse_text(text, &TableSchema::world_bank(1960, 2024)).unwrap()
    }

    #[test]
    fn line_chart_pads_domain() {
        let chart = SeriesChartBuilder::line(
            &table(GDP),
            &RowMatcher::contains("Country Name", "viet"),
            "GDP growth",
            "%",
        )
        .unwrap();
        assert_eq!(chart.points.len(), 3);
        assert_relative_eq!(chart.y_domain[0], 2.6 * 0.9, epsilon = 1e-9);
        assert_relative_eq!(chart.y_domain[1], 7.4 * 1.1, epsilon = 1e-9);
        assert_eq!(chart.summary.count, 3);
    }

    #[test]
    fn dual_chart_joins_on_year() {
        let mut events = IndexMap::new();
        events.insert(2020, "COVID-19".to_string());
        let chart = SeriesChartBuilder::dual(
            "CPI vs GDP",
            &table(INFLATION),
            &RowMatcher::equals("Country Code", "VNM"),
            &table(GDP),
            &RowMatcher::equals("Country Code", "VNM"),
            &events,
        )
        .unwrap();

        let years: Vec<i32> = chart.points.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2019, 2020, 2021]);
        assert_eq!(chart.points[1].note.as_deref(), Some("COVID-19"));
        assert_eq!(chart.points[0].note, None);

        assert_eq!(chart.dual_axis.inflation[0], 0.0);
        assert_relative_eq!(chart.dual_axis.inflation[1], 3.2 * 1.1, epsilon = 1e-9);
        assert_relative_eq!(chart.dual_axis.gdp[1], 7.4 * 1.15, epsilon = 1e-9);
        assert_relative_eq!(chart.single_axis[1], 7.4 * 1.1, epsilon = 1e-9);
    }

    #[test]
    fn missing_row_is_reported() {
        let err = SeriesChartBuilder::line(
            &table(GDP),
            &RowMatcher::equals("Country Code", "XXX"),
            "GDP growth",
            "%",
        )
        .unwrap_err();
        assert!(matches!(err, ChartError::Processor(_)));
    }
}
