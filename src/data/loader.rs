//! CSV Data Loader Module
//! Reads delimited text into typed rows using Polars.

use crate::data::schema::TableSchema;
use indexmap::IndexMap;
use polars::prelude::*;
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Input is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("No header line found")]
    Empty,
    #[error("Missing column '{0}'")]
    MissingColumn(String),
    #[error("Schema selects no value columns")]
    NoValueColumns,
    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),
}

/// One typed cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Null,
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// One parsed record keyed by column name, in file column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TypedRow {
    cells: IndexMap<String, Cell>,
}

impl TypedRow {
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.get(column)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Cell::as_number)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Cell::as_text)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<(String, Cell)> for TypedRow {
    fn from_iter<I: IntoIterator<Item = (String, Cell)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// Parsed CSV: header plus typed rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvTable {
    /// Every header name in file order, trimmed.
    pub headers: Vec<String>,
    pub dimensions: Vec<String>,
    /// Value columns picked by the schema.
    pub value_columns: Vec<String>,
    pub rows: Vec<TypedRow>,
}

impl CsvTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse a numeric cell; blanks and non-finite text are missing data.
pub fn parse_number(raw: &str) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Handles CSV loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load and type a CSV file.
    pub fn load_file(path: &Path, schema: &TableSchema) -> Result<CsvTable, LoaderError> {
        let bytes = std::fs::read(path).map_err(|source| LoaderError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_bytes(bytes, schema)
    }

    pub fn parse_bytes(bytes: Vec<u8>, schema: &TableSchema) -> Result<CsvTable, LoaderError> {
        let text = String::from_utf8(bytes)?;
        Self::parse_text(&text, schema)
    }

    /// Parse CSV text.
    ///
    /// A leading byte-order mark and blank lines are dropped, then
    /// `schema.skip_rows` preamble lines. Records shorter than the header are
    /// padded with nulls; longer records fail the whole parse.
    pub fn parse_text(text: &str, schema: &TableSchema) -> Result<CsvTable, LoaderError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let lines: Vec<&str> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .skip(schema.skip_rows)
            .collect();
        if lines.is_empty() {
            return Err(LoaderError::Empty);
        }

        let df = Self::read_frame(lines.join("\n").into_bytes())?;

        // Polars keeps header names verbatim; rows are keyed by the trimmed name.
        let raw_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let headers: Vec<String> = raw_names.iter().map(|s| s.trim().to_string()).collect();
        if let Some(dup) = Self::duplicate_header(&headers) {
            return Err(LoaderError::DuplicateColumn(dup));
        }

        let value_columns = schema.select_value_columns(&headers)?;

        let mut columns: Vec<(String, bool, Vec<Option<String>>)> = Vec::new();
        for (raw, name) in raw_names.iter().zip(&headers) {
            let is_value = value_columns.contains(name);
            if !is_value && !schema.is_dimension(name) {
                continue;
            }
            columns.push((name.clone(), is_value, Self::column_cells(&df, raw)?));
        }

        let rows = (0..df.height())
            .map(|i| {
                columns
                    .iter()
                    .map(|(name, is_value, cells)| {
                        let raw = cells[i].as_deref().map(str::trim).unwrap_or("");
                        let cell = if *is_value {
                            parse_number(raw).map_or(Cell::Null, Cell::Number)
                        } else if raw.is_empty() {
                            Cell::Null
                        } else {
                            Cell::Text(raw.to_string())
                        };
                        (name.clone(), cell)
                    })
                    .collect()
            })
            .collect::<Vec<TypedRow>>();

        debug!(
            rows = rows.len(),
            columns = headers.len(),
            value_columns = value_columns.len(),
            "parsed csv"
        );

        Ok(CsvTable {
            headers,
            dimensions: schema.dimensions.clone(),
            value_columns,
            rows,
        })
    }

    /// First repeated header, including repeats Polars renamed to `<name>_duplicated_<n>`.
    fn duplicate_header(headers: &[String]) -> Option<String> {
        for (i, name) in headers.iter().enumerate() {
            if headers[..i].contains(name) {
                return Some(name.clone());
            }
            if let Some((base, n)) = name.rsplit_once("_duplicated_") {
                if n.bytes().all(|b| b.is_ascii_digit()) && headers.iter().any(|h| h == base) {
                    return Some(base.to_string());
                }
            }
        }
        None
    }

    /// Every column as text; type conversion happens per schema afterwards.
    fn read_frame(bytes: Vec<u8>) -> Result<DataFrame, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Ok(df)
    }

    fn column_cells(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, LoaderError> {
        let column = df.column(name)?.cast(&DataType::String)?;
        let cells = column
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
        Ok(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::ValueColumns;

    fn wide() -> TableSchema {
        TableSchema::new(["Country Name"], ValueColumns::YearRange { first: 2019, last: 2021 })
    }

    #[test]
    fn strips_bom_and_blank_lines() {
        let text = "\u{feff}Country Name,2020,2021\n\n  \nVietnam,2.9,2.6\n";
        let table = DataLoader::parse_text(text, &wide()).unwrap();
        assert_eq!(table.headers, vec!["Country Name", "2020", "2021"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].text("Country Name"), Some("Vietnam"));
        assert_eq!(table.rows[0].number("2021"), Some(2.6));
    }

    #[test]
    fn blank_and_malformed_cells_are_null() {
        let text = "Country Name,2019,2020,2021\nVietnam,,abc,2.6\n";
        let table = DataLoader::parse_text(text, &wide()).unwrap();
        let row = &table.rows[0];
        assert!(row.get("2019").unwrap().is_null());
        assert!(row.get("2020").unwrap().is_null());
        assert_eq!(row.number("2021"), Some(2.6));
    }

    #[test]
    fn quoted_names_keep_their_commas() {
        let text = "Country Name,2020\n\"Korea, Rep.\",0.5\n";
        let table = DataLoader::parse_text(text, &wide()).unwrap();
        assert_eq!(table.rows[0].text("Country Name"), Some("Korea, Rep."));
    }

    #[test]
    fn short_record_is_padded_with_null() {
        let text = "Country Name,2019,2020,2021\nVietnam,7.4\n";
        let table = DataLoader::parse_text(text, &wide()).unwrap();
        let row = &table.rows[0];
        assert_eq!(row.len(), 4);
        assert_eq!(row.number("2019"), Some(7.4));
        assert!(row.get("2020").unwrap().is_null());
        assert!(row.get("2021").unwrap().is_null());
    }

    #[test]
    fn long_record_is_rejected() {
        let text = "Country Name,2020\nVietnam,2.9,2.6,9.9\n";
        let err = DataLoader::parse_text(text, &wide()).unwrap_err();
        assert!(matches!(err, LoaderError::Csv(_)));
    }

    #[test]
    fn preamble_rows_are_skipped() {
        let text = "\"Data Source\",\"World Development Indicators\",\n\n\"Last Updated Date\",\"2024-06-28\",\n\nCountry Name,2020\nVietnam,2.9\n";
        let table = DataLoader::parse_text(text, &wide().with_skip_rows(2)).unwrap();
        assert_eq!(table.rows[0].number("2020"), Some(2.9));
    }

    #[test]
    fn world_bank_export_has_two_preamble_lines() {
        let text = "\"Data Source\",\"World Development Indicators\",\n\n\"Last Updated Date\",\"2024-06-28\",\n\n\
Country Name,Country Code,Indicator Name,Indicator Code,2020\n\
Viet Nam,VNM,GDP growth,NY.GDP.MKTP.KD.ZG,2.9\n\
Thailand,THA,GDP growth,NY.GDP.MKTP.KD.ZG,-6.1\n";
        let table = DataLoader::parse_text(text, &TableSchema::world_bank(2020, 2020).with_skip_rows(2)).unwrap();
        assert_eq!(table.len(), 2);
        assert!(DataLoader::parse_text(text, &TableSchema::world_bank(2020, 2020).with_skip_rows(4)).is_err());
    }

    #[test]
    fn repeated_header_is_rejected() {
        let text = "Country Name,2020, 2020\nVietnam,2.9,3.0\n";
        let err = DataLoader::parse_text(text, &wide()).unwrap_err();
        assert!(matches!(err, LoaderError::DuplicateColumn(c) if c == "2020"));
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = DataLoader::parse_text("\u{feff}\n\n", &wide()).unwrap_err();
        assert!(matches!(err, LoaderError::Empty));
    }

    #[test]
    fn undeclared_columns_are_not_kept() {
        let text = "Country Name,Country Code,2020\nVietnam,VNM,2.9\n";
        let table = DataLoader::parse_text(text, &wide()).unwrap();
        let cols: Vec<&str> = table.rows[0].columns().collect();
        assert_eq!(cols, vec!["Country Name", "2020"]);
    }
}
