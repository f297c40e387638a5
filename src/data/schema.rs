//! Table Schema Module
//! Names which columns of a CSV are dimensions (text) and which hold values.

use crate::data::loader::LoaderError;
use serde::{Deserialize, Serialize};

/// Which columns carry numeric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueColumns {
    /// Exactly these columns; every one must exist.
    Named(Vec<String>),
    /// Every column named by a year in the inclusive range.
    YearRange { first: i32, last: i32 },
    /// Every non-dimension column with a non-empty name.
    Rest,
}

/// Column layout a table is validated against at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSchema {
    pub dimensions: Vec<String>,
    pub values: ValueColumns,
    /// Non-blank preamble lines before the header (World Bank exports carry 2).
    #[serde(default)]
    pub skip_rows: usize,
}

impl TableSchema {
    pub fn new<I, S>(dimensions: I, values: ValueColumns) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            values,
            skip_rows: 0,
        }
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    /// `Country Name, Country Code, Indicator Name, Indicator Code, <years>`
    pub fn world_bank(first: i32, last: i32) -> Self {
        Self::new(
            ["Country Name", "Country Code", "Indicator Name", "Indicator Code"],
            ValueColumns::YearRange { first, last },
        )
    }

    /// `country_name, indicator_name, <years>`
    pub fn simple_wide(first: i32, last: i32) -> Self {
        Self::new(
            ["country_name", "indicator_name"],
            ValueColumns::YearRange { first, last },
        )
    }

    /// `<category>, <periods>`
    pub fn category(column: &str) -> Self {
        Self::new([column], ValueColumns::Rest)
    }

    pub fn is_dimension(&self, column: &str) -> bool {
        self.dimensions.iter().any(|d| d == column)
    }

    /// Check the header against the schema and pick the value columns.
    ///
    /// Named columns keep the schema's order; the other variants keep file order.
    pub(crate) fn select_value_columns(&self, headers: &[String]) -> Result<Vec<String>, LoaderError> {
        for dim in &self.dimensions {
            if !headers.contains(dim) {
                return Err(LoaderError::MissingColumn(dim.clone()));
            }
        }

        let selected: Vec<String> = match &self.values {
            ValueColumns::Named(names) => {
                if let Some(missing) = names.iter().find(|n| !headers.contains(n)) {
                    return Err(LoaderError::MissingColumn(missing.clone()));
                }
                names.clone()
            }
            ValueColumns::YearRange { first, last } => headers
                .iter()
                .filter(|h| !self.is_dimension(h))
                .filter(|h| {
                    parse_year(h).is_some_and(|year| (*first..=*last).contains(&year))
                })
                .cloned()
                .collect(),
            ValueColumns::Rest => headers
                .iter()
                .filter(|h| !h.is_empty() && !self.is_dimension(h))
                .cloned()
                .collect(),
        };

        if selected.is_empty() {
            return Err(LoaderError::NoValueColumns);
        }
        Ok(selected)
    }
}

/// Parse a 4-digit year column name.
pub fn parse_year(column: &str) -> Option<i32> {
    let column = column.trim();
    if column.len() != 4 || !column.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    column.parse().ok()
}
