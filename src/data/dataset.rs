//! Country Dataset Module
//! Canonical country name -> year -> value, built once from a wide table.

use crate::data::loader::{CsvTable, LoaderError};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Year (4-digit string) -> value, ascending by year.
pub type YearValues = BTreeMap<String, f64>;

/// Immutable per-country indicator values; country order is file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CountryDataset {
    countries: IndexMap<String, YearValues>,
}

impl CountryDataset {
    /// Build from a table whose value columns are years.
    ///
    /// Rows with a blank name are skipped. A repeated name replaces the
    /// earlier row.
    pub fn from_table(table: &CsvTable, name_column: &str) -> Result<Self, LoaderError> {
        if !table.has_column(name_column) {
            return Err(LoaderError::MissingColumn(name_column.to_string()));
        }

        let mut countries: IndexMap<String, YearValues> = IndexMap::new();
        let mut skipped = 0usize;

        for row in &table.rows {
            let Some(name) = row.text(name_column).map(str::trim).filter(|n| !n.is_empty()) else {
                skipped += 1;
                continue;
            };

            let values: YearValues = table
                .value_columns
                .iter()
                .filter_map(|year| row.number(year).map(|v| (year.clone(), v)))
                .collect();

            if countries.insert(name.to_string(), values).is_some() {
                warn!(country = name, "duplicate country row replaces earlier one");
            }
        }

        debug!(countries = countries.len(), skipped, "built country dataset");
        Ok(Self { countries })
    }

    pub fn get(&self, country: &str) -> Option<&YearValues> {
        self.countries.get(country)
    }

    pub fn get_key_value(&self, country: &str) -> Option<(&String, &YearValues)> {
        self.countries.get_key_value(country)
    }

    pub fn contains(&self, country: &str) -> bool {
        self.countries.contains_key(country)
    }

    pub fn value(&self, country: &str, year: &str) -> Option<f64> {
        self.get(country).and_then(|v| v.get(year)).copied()
    }

    /// Every country's value for `year`, in country order, skipping gaps.
    pub fn values_for_year(&self, year: &str) -> Vec<f64> {
        self.countries
            .values()
            .filter_map(|v| v.get(year).copied())
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.countries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &YearValues)> {
        self.countries.iter()
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

impl FromIterator<(String, YearValues)> for CountryDataset {
    fn from_iter<I: IntoIterator<Item = (String, YearValues)>>(iter: I) -> Self {
        Self {
            countries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::DataLoader;
    use crate::data::schema::TableSchema;

    fn table(text: &str) -> CsvTable {
        DataLoader::parse_text(text, &TableSchema::simple_wide(1980, 2024)).unwrap()
    }

    #[test]
    fn keeps_only_numeric_years() {
        let t = table("country_name,indicator_name,2022,2023\nVietnam,CPI,3.2,\n");
        let ds = CountryDataset::from_table(&t, "country_name").unwrap();
        assert_eq!(ds.value("Vietnam", "2022"), Some(3.2));
        assert_eq!(ds.value("Vietnam", "2023"), None);
        assert_eq!(ds.get("Vietnam").map(|v| v.len()), Some(1));
    }

    #[test]
    fn blank_names_skipped_and_duplicates_replace() {
        let t = table(
            "country_name,indicator_name,2022\n,CPI,1.0\n Chad ,CPI,2.0\nChad,CPI,3.0\n",
        );
        let ds = CountryDataset::from_table(&t, "country_name").unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.value("Chad", "2022"), Some(3.0));
    }

    #[test]
    fn values_for_year_follow_file_order() {
        let t = table("country_name,indicator_name,2022\nB,CPI,1.5\nA,CPI,\nC,CPI,-0.5\n");
        let ds = CountryDataset::from_table(&t, "country_name").unwrap();
        assert_eq!(ds.values_for_year("2022"), vec![1.5, -0.5]);
    }

    #[test]
    fn unknown_name_column_is_rejected() {
        let t = table("country_name,indicator_name,2022\nB,CPI,1.5\n");
        assert!(CountryDataset::from_table(&t, "Country Name").is_err());
    }
}
