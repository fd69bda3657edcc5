//! Duplicate handling for repeated samples.
//!
//! Two kinds of duplicates show up in survey exports: several samples taken
//! at the same place on the same day, and the same place revisited on
//! different dates. The first are aggregated into one row, the second are
//! reduced to the most recent visit.

use crate::compute::temporal::date_of;
use crate::error::{BrammError, Result};
use bramm_types::table::{PointTable, Row};
use bramm_types::value::Value;
use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use std::fmt;
use std::str::FromStr;

/// How numeric values of same-place same-day samples are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Mean,
    Sum,
    Median,
    /// Keep the first sample of each group unchanged.
    Remove,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Mean => "mean",
            Aggregation::Sum => "sum",
            Aggregation::Median => "median",
            Aggregation::Remove => "remove",
        }
    }

    /// Combined value, `None` when there is nothing to combine.
    fn combine(&self, values: &mut [f64]) -> Option<f64> {
        match self {
            Aggregation::Sum => Some(values.iter().sum()),
            _ if values.is_empty() => None,
            Aggregation::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            Aggregation::Median => {
                values.sort_by(|a, b| a.total_cmp(b));
                let mid = values.len() / 2;
                if values.len() % 2 == 0 {
                    Some((values[mid - 1] + values[mid]) / 2.0)
                } else {
                    Some(values[mid])
                }
            }
            Aggregation::Remove => values.first().copied(),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = BrammError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(Aggregation::Mean),
            "sum" => Ok(Aggregation::Sum),
            "median" => Ok(Aggregation::Median),
            "remove" => Ok(Aggregation::Remove),
            other => Err(BrammError::InvalidConfig(format!(
                "Unrecognized aggregating method '{}', expected one of mean, sum, median, remove",
                other
            ))),
        }
    }
}

/// Bit pattern of a coordinate, with both zeros mapped to one key.
fn coordinate_key(value: &Value) -> Option<u64> {
    value.as_f64().map(|v| if v == 0.0 { 0 } else { v.to_bits() })
}

/// Removes same-location duplicates from a table.
///
/// # Examples
///
/// ```rust
/// use bramm::preprocessing::DuplicatesRemoval;
/// use bramm::{PointTable, Value};
///
/// let mut table = PointTable::new(vec![
///     "date".into(), "longitude".into(), "latitude".into(), "zinc".into(),
/// ]);
/// table.push(vec!["2010-05-01".into(), 2.0.into(), 45.0.into(), 10.0.into()])?;
/// table.push(vec!["2010-05-01".into(), 2.0.into(), 45.0.into(), 20.0.into()])?;
/// table.push(vec!["2015-07-12".into(), 2.0.into(), 45.0.into(), 40.0.into()])?;
///
/// let cleaned = DuplicatesRemoval::new("mean".parse()?).process_duplicates(&table)?;
/// assert_eq!(cleaned.len(), 1);
/// assert_eq!(cleaned.value(0, "zinc"), Some(&Value::from(40.0)));
/// # Ok::<(), bramm::BrammError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicatesRemoval {
    pub method: Aggregation,
    pub date_field: String,
    pub longitude_field: String,
    pub latitude_field: String,
}

impl Default for DuplicatesRemoval {
    fn default() -> Self {
        Self::new(Aggregation::default())
    }
}

impl DuplicatesRemoval {
    pub fn new(method: Aggregation) -> Self {
        Self {
            method,
            date_field: "date".to_string(),
            longitude_field: "longitude".to_string(),
            latitude_field: "latitude".to_string(),
        }
    }

    pub fn with_date_field(mut self, field: impl Into<String>) -> Self {
        self.date_field = field.into();
        self
    }

    pub fn with_coordinate_fields(
        mut self,
        longitude: impl Into<String>,
        latitude: impl Into<String>,
    ) -> Self {
        self.longitude_field = longitude.into();
        self.latitude_field = latitude.into();
        self
    }

    fn key_columns(&self, table: &PointTable) -> Result<(usize, usize, usize)> {
        let find = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| BrammError::missing_column(name))
        };
        Ok((
            find(self.date_field.as_str())?,
            find(self.longitude_field.as_str())?,
            find(self.latitude_field.as_str())?,
        ))
    }

    /// Collapse rows sharing date, longitude and latitude into one.
    ///
    /// Numeric columns are combined with the configured method, ignoring
    /// missing values; other columns keep the group's first non-missing
    /// value. Rows with a missing date or coordinate are dropped. Groups come
    /// out in order of first appearance and keep their first row's identity.
    pub fn aggregate_samples(&self, table: &PointTable) -> Result<PointTable> {
        let (date_col, lon_col, lat_col) = self.key_columns(table)?;

        let mut slots: FxHashMap<(NaiveDate, u64, u64), usize> = FxHashMap::default();
        let mut groups: Vec<Vec<&Row>> = Vec::new();
        let mut incomplete = 0usize;

        for row in table {
            let key = (
                date_of(&row.values[date_col]),
                coordinate_key(&row.values[lon_col]),
                coordinate_key(&row.values[lat_col]),
            );
            let (Some(date), Some(lon), Some(lat)) = key else {
                incomplete += 1;
                continue;
            };
            let slot = *slots.entry((date, lon, lat)).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(row);
        }

        if incomplete > 0 {
            log::warn!(
                "Dropped {} rows without date or coordinates while aggregating",
                incomplete
            );
        }

        let numeric = numeric_columns(table);
        let mut aggregated = table.empty_like();
        for group in &groups {
            let values = (0..table.columns().len())
                .map(|col| {
                    if self.method == Aggregation::Remove {
                        group[0].values[col].clone()
                    } else if !numeric[col] {
                        first_present(group, col)
                    } else {
                        let mut present: Vec<f64> =
                            group.iter().filter_map(|r| r.values[col].as_f64()).collect();
                        self.method
                            .combine(&mut present)
                            .map(Value::from)
                            .unwrap_or(Value::Null)
                    }
                })
                .collect();
            aggregated.push_row(Row::new(group[0].id, values))?;
        }

        log::debug!(
            "Aggregated {} rows into {} samples with method '{}'",
            table.len(),
            aggregated.len(),
            self.method
        );
        Ok(aggregated)
    }

    /// Keep, for every location, only the most recently dated row.
    ///
    /// Undated rows lose against any dated row at the same place; ties keep
    /// the earliest row. Surviving rows keep their input order.
    pub fn remove_spatial_overlap(&self, table: &PointTable) -> Result<PointTable> {
        let (date_col, lon_col, lat_col) = self.key_columns(table)?;

        let mut best: FxHashMap<(Option<u64>, Option<u64>), (usize, Option<NaiveDate>)> =
            FxHashMap::default();

        for (pos, row) in table.iter().enumerate() {
            let location = (
                coordinate_key(&row.values[lon_col]),
                coordinate_key(&row.values[lat_col]),
            );
            let date = date_of(&row.values[date_col]);
            best.entry(location)
                .and_modify(|(kept, kept_date)| {
                    if date > *kept_date {
                        *kept = pos;
                        *kept_date = date;
                    }
                })
                .or_insert((pos, date));
        }

        let mut positions: Vec<usize> = best.values().map(|(pos, _)| *pos).collect();
        positions.sort_unstable();

        let kept = table.take(&positions);
        log::debug!(
            "Spatial overlap removal kept {} of {} rows",
            kept.len(),
            table.len()
        );
        Ok(kept)
    }

    /// Aggregate same-day samples, then keep the latest visit per location.
    pub fn process_duplicates(&self, table: &PointTable) -> Result<PointTable> {
        let aggregated = self.aggregate_samples(table)?;
        self.remove_spatial_overlap(&aggregated)
    }
}

/// Columns whose non-missing values are all numbers.
fn numeric_columns(table: &PointTable) -> Vec<bool> {
    (0..table.columns().len())
        .map(|col| {
            table.iter().all(|row| {
                let value = &row.values[col];
                value.is_missing() || value.as_f64().is_some()
            })
        })
        .collect()
}

fn first_present(group: &[&Row], col: usize) -> Value {
    group
        .iter()
        .map(|row| &row.values[col])
        .find(|v| !v.is_missing())
        .cloned()
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bramm_types::table::RowId;

    fn samples() -> PointTable {
        let mut table = PointTable::new(vec![
            "date".into(),
            "longitude".into(),
            "latitude".into(),
            "zinc".into(),
            "site".into(),
        ]);
        let rows: [(&str, f64, f64, Value, &str); 6] = [
            ("2010-05-01", 2.0, 45.0, 10.0.into(), "A"),
            ("2010-05-01", 2.0, 45.0, 20.0.into(), "A-bis"),
            ("2010-05-01", 2.0, 45.0, 60.0.into(), "A-ter"),
            ("2015-07-12", 2.0, 45.0, 40.0.into(), "A"),
            ("2012-01-01", 3.0, 46.0, Value::Null, "B"),
            ("2012-01-01", 3.0, 46.0, 7.0.into(), "B"),
        ];
        for (date, lon, lat, zinc, site) in rows {
            table
                .push(vec![date.into(), lon.into(), lat.into(), zinc, site.into()])
                .unwrap();
        }
        table
    }

    #[test]
    fn test_parse_methods() {
        assert_eq!("median".parse::<Aggregation>().unwrap(), Aggregation::Median);
        assert_eq!("SUM".parse::<Aggregation>().unwrap(), Aggregation::Sum);
        assert!(matches!(
            "max".parse::<Aggregation>(),
            Err(BrammError::InvalidConfig(_))
        ));
        assert_eq!(Aggregation::Remove.to_string(), "remove");
    }

    #[test]
    fn test_aggregate_mean() {
        let out = DuplicatesRemoval::new(Aggregation::Mean)
            .aggregate_samples(&samples())
            .unwrap();

        assert_eq!(out.ids(), vec![RowId(0), RowId(3), RowId(4)]);
        assert_eq!(out.value(0, "zinc"), Some(&Value::from(30.0)));
        assert_eq!(out.value(0, "site"), Some(&Value::from("A")));
        assert_eq!(out.value(2, "zinc"), Some(&Value::from(7.0)));
    }

    #[test]
    fn test_aggregate_other_methods() {
        let table = samples();
        let median = DuplicatesRemoval::new(Aggregation::Median)
            .aggregate_samples(&table)
            .unwrap();
        assert_eq!(median.value(0, "zinc"), Some(&Value::from(20.0)));

        let sum = DuplicatesRemoval::new(Aggregation::Sum)
            .aggregate_samples(&table)
            .unwrap();
        assert_eq!(sum.value(0, "zinc"), Some(&Value::from(90.0)));

        let first = DuplicatesRemoval::new(Aggregation::Remove)
            .aggregate_samples(&table)
            .unwrap();
        assert_eq!(first.value(0, "zinc"), Some(&Value::from(10.0)));
        assert_eq!(first.value(2, "zinc"), Some(&Value::Null));
    }

    #[test]
    fn test_incomplete_keys_dropped() {
        let mut table = samples();
        table
            .push(vec![Value::Null, 2.0.into(), 45.0.into(), 1.0.into(), "C".into()])
            .unwrap();
        let out = DuplicatesRemoval::default().aggregate_samples(&table).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_spatial_overlap_keeps_latest() {
        let out = DuplicatesRemoval::default()
            .remove_spatial_overlap(&samples())
            .unwrap();
        assert_eq!(out.ids(), vec![RowId(3), RowId(4)]);
    }

    #[test]
    fn test_process_duplicates() {
        let out = DuplicatesRemoval::default().process_duplicates(&samples()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.value(0, "zinc"), Some(&Value::from(40.0)));
        assert_eq!(out.value(1, "site"), Some(&Value::from("B")));
    }

    #[test]
    fn test_custom_fields_and_missing_column() {
        let remover = DuplicatesRemoval::default()
            .with_date_field("date_complete")
            .with_coordinate_fields("x", "y");
        assert!(matches!(
            remover.process_duplicates(&samples()),
            Err(BrammError::MissingColumn { .. })
        ));
    }
}
