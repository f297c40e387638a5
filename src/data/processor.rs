//! Data Processor Module
//! Reshapes typed rows into series and long-format records.

use crate::data::loader::{CsvTable, TypedRow};
use crate::data::schema::parse_year;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Column '{0}' is not a year")]
    InvalidYear(String),
    #[error("No row matches {0}")]
    RowNotFound(RowMatcher),
    #[error("Column '{0}' is not a value column")]
    NotAValueColumn(String),
}

/// One `{year, value}` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: f64,
}

/// Long-format record, one per non-null cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRecord {
    pub group: String,
    pub period: String,
    pub value: f64,
}

/// Two series aligned on year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JoinedPoint {
    pub year: i32,
    pub left: f64,
    pub right: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeriesOrder {
    #[default]
    YearAscending,
    /// Largest first; ties keep their input order.
    ValueDescending,
}

/// A single test against a row's text cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Equals { column: String, value: String },
    ContainsIgnoreCase { column: String, needle: String },
}

impl Condition {
    fn matches(&self, row: &TypedRow) -> bool {
        match self {
            Condition::Equals { column, value } => row.text(column) == Some(value.as_str()),
            Condition::ContainsIgnoreCase { column, needle } => row
                .text(column)
                .is_some_and(|t| t.to_lowercase().contains(&needle.to_lowercase())),
        }
    }
}

/// Selects the first row satisfying every condition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowMatcher(pub Vec<Condition>);

impl RowMatcher {
    pub fn equals(column: &str, value: &str) -> Self {
        Self(Vec::new()).and_equals(column, value)
    }

    pub fn and_equals(mut self, column: &str, value: &str) -> Self {
        self.0.push(Condition::Equals {
            column: column.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn contains(column: &str, needle: &str) -> Self {
        Self(vec![Condition::ContainsIgnoreCase {
            column: column.to_string(),
            needle: needle.to_string(),
        }])
    }

    pub fn matches(&self, row: &TypedRow) -> bool {
        self.0.iter().all(|c| c.matches(row))
    }
}

impl fmt::Display for RowMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|c| match c {
                Condition::Equals { column, value } => format!("{column} = {value:?}"),
                Condition::ContainsIgnoreCase { column, needle } => {
                    format!("{column} ~ {needle:?}")
                }
            })
            .collect();
        write!(f, "[{}]", parts.join(" and "))
    }
}

/// Handles reshaping operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Pick the requested year columns out of a row as an ascending series.
    ///
    /// Null cells are dropped; everything else keeps its position.
    pub fn row_to_series(row: &TypedRow, years: &[String]) -> Result<Vec<SeriesPoint>, ProcessorError> {
        let mut points = Vec::with_capacity(years.len());
        for column in years {
            let year = parse_year(column).ok_or_else(|| ProcessorError::InvalidYear(column.clone()))?;
            if let Some(value) = row.number(column) {
                points.push(SeriesPoint { year, value });
            }
        }
        Self::sort_series(&mut points, SeriesOrder::YearAscending);
        Ok(points)
    }

    /// Stable sort in place.
    pub fn sort_series(points: &mut [SeriesPoint], order: SeriesOrder) {
        match order {
            SeriesOrder::YearAscending => points.sort_by_key(|p| p.year),
            SeriesOrder::ValueDescending => points.sort_by(|a, b| b.value.total_cmp(&a.value)),
        }
    }

    /// Transform a wide table to long format (stack operation).
    ///
    /// Output order: row by row, periods in value-column order.
    pub fn stack_to_long(table: &CsvTable, group_col: &str) -> Vec<LongRecord> {
        let mut records = Vec::new();
        for row in &table.rows {
            let Some(group) = row.text(group_col) else {
                continue;
            };
            for period in &table.value_columns {
                if let Some(value) = row.number(period) {
                    records.push(LongRecord {
                        group: group.to_string(),
                        period: period.clone(),
                        value,
                    });
                }
            }
        }
        records
    }

    /// Inner join on year, ascending.
    pub fn join_series(left: &[SeriesPoint], right: &[SeriesPoint]) -> Vec<JoinedPoint> {
        let right: BTreeMap<i32, f64> = right.iter().map(|p| (p.year, p.value)).collect();
        let mut joined: Vec<JoinedPoint> = left
            .iter()
            .filter_map(|p| {
                right.get(&p.year).map(|r| JoinedPoint {
                    year: p.year,
                    left: p.value,
                    right: *r,
                })
            })
            .collect();
        joined.sort_by_key(|p| p.year);
        joined.dedup_by_key(|p| p.year);
        joined
    }

    pub fn find_row<'t>(table: &'t CsvTable, matcher: &RowMatcher) -> Result<&'t TypedRow, ProcessorError> {
        table
            .rows
            .iter()
            .find(|row| matcher.matches(row))
            .ok_or_else(|| ProcessorError::RowNotFound(matcher.clone()))
    }

    /// Distinct values of a text column, in first-seen order.
    pub fn get_groups(table: &CsvTable, column: &str) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        for row in &table.rows {
            if let Some(g) = row.text(column) {
                if !groups.iter().any(|seen| seen == g) {
                    groups.push(g.to_string());
                }
            }
        }
        groups
    }

    /// Every row's value for one period, as `(group, value)` in row order.
    pub fn period_values(
        table: &CsvTable,
        group_col: &str,
        period: &str,
    ) -> Result<Vec<(String, f64)>, ProcessorError> {
        if !table.value_columns.iter().any(|c| c == period) {
            return Err(ProcessorError::NotAValueColumn(period.to_string()));
        }
        Ok(table
            .rows
            .iter()
            .filter_map(|row| Some((row.text(group_col)?.to_string(), row.number(period)?)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{Cell, DataLoader};
    use crate::data::schema::TableSchema;

    fn years(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn vietnam_row_becomes_ordered_series() {
        let row: TypedRow = [
            ("Country Name".to_string(), Cell::Text("Vietnam".into())),
            ("2020".to_string(), Cell::Number(2.9)),
            ("2021".to_string(), Cell::Number(2.6)),
        ]
        .into_iter()
        .collect();
        let series = DataProcessor::row_to_series(&row, &years(&["2020", "2021"])).unwrap();
        assert_eq!(
            series,
            vec![
                SeriesPoint { year: 2020, value: 2.9 },
                SeriesPoint { year: 2021, value: 2.6 }
            ]
        );
    }

    #[test]
    fn nulls_are_dropped_and_years_sorted() {
        let row: TypedRow = [
            ("2022".to_string(), Cell::Number(8.0)),
            ("2020".to_string(), Cell::Null),
            ("2019".to_string(), Cell::Number(7.0)),
        ]
        .into_iter()
        .collect();
        let series = DataProcessor::row_to_series(&row, &years(&["2022", "2020", "2019"])).unwrap();
        let got: Vec<i32> = series.iter().map(|p| p.year).collect();
        assert_eq!(got, vec![2019, 2022]);
    }

    #[test]
    fn non_year_column_is_rejected() {
        let row = TypedRow::default();
        let err = DataProcessor::row_to_series(&row, &years(&["Total"])).unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidYear(c) if c == "Total"));
    }

    #[test]
    fn value_sort_is_stable() {
        let mut points = vec![
            SeriesPoint { year: 1, value: 5.0 },
            SeriesPoint { year: 2, value: 9.0 },
            SeriesPoint { year: 3, value: 5.0 },
            SeriesPoint { year: 4, value: 1.0 },
        ];
        DataProcessor::sort_series(&mut points, SeriesOrder::ValueDescending);
        let got: Vec<i32> = points.iter().map(|p| p.year).collect();
        assert_eq!(got, vec![2, 1, 3, 4]);
    }

    #[test]
    fn stack_to_long_skips_empty_cells() {
        let table = DataLoader::parse_text(
            "Category,2021,2022\nFood,101.2,\nTransport,98.5,104.0\n",
            &TableSchema::category("Category"),
        )
        .unwrap();
        let long = DataProcessor::stack_to_long(&table, "Category");
        assert_eq!(long.len(), 3);
        assert_eq!(long[0].group, "Food");
        assert_eq!(long[2].period, "2022");
        assert_eq!(long[2].value, 104.0);
    }

    #[test]
    fn join_keeps_common_years() {
        let a = [
            SeriesPoint { year: 2019, value: 2.8 },
            SeriesPoint { year: 2020, value: 3.2 },
        ];
        let b = [
            SeriesPoint { year: 2020, value: 2.9 },
            SeriesPoint { year: 2021, value: 2.6 },
        ];
        let joined = DataProcessor::join_series(&a, &b);
        assert_eq!(
            joined,
            vec![JoinedPoint {
                year: 2020,
                left: 3.2,
                right: 2.9
            }]
        );
    }

    #[test]
    fn find_row_reports_the_matcher() {
        let table = DataLoader::parse_text(
            "Country Name,Country Code,Indicator Name,Indicator Code,2020\nChad,TCD,GDP,NY,1.0\n",
            &TableSchema::world_bank(1960, 2024),
        )
        .unwrap();
        let matcher = RowMatcher::equals("Country Code", "VNM");
        let err = DataProcessor::find_row(&table, &matcher).unwrap_err();
        assert!(err.to_string().contains("Country Code = \"VNM\""));

        let found =
            DataProcessor::find_row(&table, &RowMatcher::contains("Country Name", "CHA")).unwrap();
        assert_eq!(found.text("Country Code"), Some("TCD"));
    }
}
