//! Data sources producing point tables.
//!
//! A [`DataSource`] yields its raw table; the provided
//! [`retrieve_points`](DataSource::retrieve_points) keeps the rows that can
//! take part in a spatial operation.

use crate::compute::temporal::parse_date;
use crate::config::CoordinateFields;
use crate::error::{BrammError, Result};
use bramm_types::table::PointTable;
use bramm_types::value::Value;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

/// Anything that can produce a point table.
pub trait DataSource {
    /// The full table as stored in the source.
    fn retrieve_table(&self) -> Result<PointTable>;

    /// Rows with numeric longitude and latitude.
    fn retrieve_points(&self, fields: &CoordinateFields) -> Result<PointTable> {
        let table = self.retrieve_table()?;
        let coords = table
            .coordinates(&fields.longitude, &fields.latitude)
            .ok_or_else(|| {
                let absent = if table.has_column(&fields.longitude) {
                    &fields.latitude
                } else {
                    &fields.longitude
                };
                BrammError::missing_column(absent)
            })?;

        let mask: Vec<bool> = coords.iter().map(Option::is_some).collect();
        let points = table.filter_mask(&mask);
        if points.len() < table.len() {
            log::debug!(
                "{} of {} rows have no usable coordinates",
                table.len() - points.len(),
                table.len()
            );
        }
        Ok(points)
    }
}

/// Source over a table already in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    table: PointTable,
}

impl MemorySource {
    pub fn new(table: PointTable) -> Self {
        Self { table }
    }
}

impl DataSource for MemorySource {
    fn retrieve_table(&self) -> Result<PointTable> {
        Ok(self.table.clone())
    }
}

/// Source reading a JSON array of flat objects.
///
/// Columns appear in first-seen key order; keys absent from an object
/// become missing values. Text in the listed date fields is parsed into
/// dates.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    date_fields: Vec<String>,
}

impl JsonFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            date_fields: Vec::new(),
        }
    }

    pub fn with_date_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for JsonFileSource {
    fn retrieve_table(&self) -> Result<PointTable> {
        let source = std::fs::read_to_string(&self.path)?;
        let table = table_from_json_str(&source, &self.date_fields)?;
        log::info!(
            "Loaded {} rows x {} columns from {}",
            table.len(),
            table.columns().len(),
            self.path.display()
        );
        Ok(table)
    }
}

pub fn from_table(table: PointTable) -> MemorySource {
    MemorySource::new(table)
}

pub fn from_json_file<P: AsRef<Path>>(path: P) -> JsonFileSource {
    JsonFileSource::new(path)
}

/// Parses a JSON array of flat objects into a table.
pub fn table_from_json_str(source: &str, date_fields: &[String]) -> Result<PointTable> {
    let parsed: serde_json::Value = serde_json::from_str(source)?;
    let serde_json::Value::Array(records) = parsed else {
        return Err(BrammError::InvalidInput(
            "Expected a JSON array of records".to_string(),
        ));
    };

    let mut columns: Vec<String> = Vec::new();
    let mut seen = FxHashSet::default();
    for (pos, record) in records.iter().enumerate() {
        let serde_json::Value::Object(fields) = record else {
            return Err(BrammError::InvalidInput(format!(
                "Record {} is not a JSON object",
                pos
            )));
        };
        for key in fields.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }

    let dated: FxHashSet<&str> = date_fields.iter().map(String::as_str).collect();
    let mut unparsed_dates = 0usize;
    let mut table = PointTable::new(columns.clone());

    for (pos, record) in records.iter().enumerate() {
        let mut values = Vec::with_capacity(columns.len());
        for column in &columns {
            let value = match record.get(column) {
                None => Value::Null,
                Some(raw) => json_to_value(raw).ok_or_else(|| {
                    BrammError::InvalidInput(format!(
                        "Record {} field '{}' is not a scalar",
                        pos, column
                    ))
                })?,
            };

            let value = match value {
                Value::Text(text) if dated.contains(column.as_str()) => match parse_date(&text) {
                    Some(date) => Value::Date(date),
                    None => {
                        unparsed_dates += 1;
                        Value::Null
                    }
                },
                other => other,
            };
            values.push(value);
        }
        table.push(values)?;
    }

    if unparsed_dates > 0 {
        log::warn!("{} date values could not be parsed", unparsed_dates);
    }

    Ok(table)
}

/// Scalar JSON value as a cell; `None` for arrays and objects.
fn json_to_value(raw: &serde_json::Value) -> Option<Value> {
    match raw {
        serde_json::Value::Null => Some(Value::Null),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => Some(n.as_f64().map(Value::Number).unwrap_or(Value::Null)),
        serde_json::Value::String(s) => Some(Value::Text(s.clone())),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}
