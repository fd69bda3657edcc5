use crate::value::Value;
use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a row, stable across filtering, joining and subsetting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A record: its identity plus one value per table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(id: RowId, values: Vec<Value>) -> Self {
        Self { id, values }
    }
}

/// Returned when a row does not have one value per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowArityError {
    pub expected: usize,
    pub found: usize,
}

impl fmt::Display for RowArityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row has {} values but the table has {} columns",
            self.found, self.expected
        )
    }
}

impl std::error::Error for RowArityError {}

/// Ordered collection of geolocated records.
///
/// Columns keep their insertion order and rows keep theirs, so every
/// operation producing a new table is deterministic.
///
/// # Examples
///
/// ```
/// use bramm_types::table::PointTable;
/// use bramm_types::value::Value;
///
/// let mut table = PointTable::new(vec!["longitude".into(), "latitude".into()]);
/// let id = table.push(vec![Value::from(2.0), Value::from(45.0)]).unwrap();
///
/// assert_eq!(table.value(0, "latitude"), Some(&Value::from(45.0)));
/// assert_eq!(table.row_by_id(id).map(|row| row.values.len()), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawPointTable")]
pub struct PointTable {
    columns: Vec<String>,
    rows: Vec<Row>,
    next_id: u64,
}

/// Serialized form of a [`PointTable`], checked before use.
#[derive(Deserialize)]
struct RawPointTable {
    columns: Vec<String>,
    rows: Vec<Row>,
    #[serde(default)]
    next_id: u64,
}

impl TryFrom<RawPointTable> for PointTable {
    type Error = RowArityError;

    fn try_from(raw: RawPointTable) -> Result<Self, Self::Error> {
        let mut table = PointTable::new(raw.columns);
        table.next_id = raw.next_id;
        for row in raw.rows {
            table.push_row(row)?;
        }
        Ok(table)
    }
}

impl PointTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            next_id: 0,
        }
    }

    /// Create an empty table sharing this table's columns.
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: Vec::new(),
            next_id: 0,
        }
    }

    /// Append a row with a freshly assigned identity.
    pub fn push(&mut self, values: Vec<Value>) -> Result<RowId, RowArityError> {
        let id = RowId(self.next_id);
        self.push_row(Row::new(id, values))?;
        Ok(id)
    }

    /// Append a row keeping its existing identity.
    pub fn push_row(&mut self, row: Row) -> Result<(), RowArityError> {
        if row.values.len() != self.columns.len() {
            return Err(RowArityError {
                expected: self.columns.len(),
                found: row.values.len(),
            });
        }
        self.next_id = self.next_id.max(row.id.0 + 1);
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn ids(&self) -> Vec<RowId> {
        self.rows.iter().map(|row| row.id).collect()
    }

    pub fn row_by_id(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|row| row.id == id)
    }

    /// Value at `row` (positional) in column `column`.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.values.get(col)
    }

    /// All values of one column, in row order. `None` when the column is absent.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row.values[col]).collect())
    }

    /// Longitude/latitude pairs read from the two named columns.
    ///
    /// Rows whose coordinates are missing or non-numeric yield `None`.
    /// Returns `None` when either column is absent.
    pub fn coordinates(&self, longitude: &str, latitude: &str) -> Option<Vec<Option<Point>>> {
        let lon = self.column_index(longitude)?;
        let lat = self.column_index(latitude)?;
        Some(
            self.rows
                .iter()
                .map(|row| {
                    let x = row.values[lon].as_f64()?;
                    let y = row.values[lat].as_f64()?;
                    Some(Point::new(x, y))
                })
                .collect(),
        )
    }

    /// Rows at the given positions, in the given order, identities preserved.
    pub fn take(&self, positions: &[usize]) -> Self {
        let mut out = self.empty_like();
        for &pos in positions {
            if let Some(row) = self.rows.get(pos) {
                out.next_id = out.next_id.max(row.id.0 + 1);
                out.rows.push(row.clone());
            }
        }
        out
    }

    /// Rows where `mask` is true. Positions past the mask's end are dropped.
    pub fn filter_mask(&self, mask: &[bool]) -> Self {
        let positions: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(pos, keep)| keep.then_some(pos))
            .collect();
        self.take(&positions)
    }

    /// Rows satisfying `predicate`, identities preserved.
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Row) -> bool,
    {
        let positions: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(pos, row)| predicate(row).then_some(pos))
            .collect();
        self.take(&positions)
    }

    /// Apply `f` to every value of a column in place. Returns false when the
    /// column is absent.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> bool
    where
        F: FnMut(&Value) -> Value,
    {
        let Some(col) = self.column_index(name) else {
            return false;
        };
        for row in &mut self.rows {
            row.values[col] = f(&row.values[col]);
        }
        true
    }

    /// Append a column, one value per existing row.
    pub fn add_column(&mut self, name: String, values: Vec<Value>) -> Result<(), RowArityError> {
        if values.len() != self.rows.len() {
            return Err(RowArityError {
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        self.columns.push(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.values.push(value);
        }
        Ok(())
    }

    /// Remove a column. Returns false when the column is absent.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(col) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(col);
        for row in &mut self.rows {
            row.values.remove(col);
        }
        true
    }
}

impl<'a> IntoIterator for &'a PointTable {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PointTable {
        let mut table = PointTable::new(vec!["longitude".into(), "latitude".into()]);
        table.push(vec![Value::from(1.0), Value::from(2.0)]).unwrap();
        table.push(vec![Value::Null, Value::from(3.0)]).unwrap();
        table.push(vec![Value::from(4.0), Value::from(5.0)]).unwrap();
        table
    }

    #[test]
    fn test_push_rejects_wrong_arity() {
        let mut table = sample();
        let err = table.push(vec![Value::from(1.0)]).unwrap_err();
        assert_eq!(err.expected, 2);
        assert_eq!(err.found, 1);
    }

    #[test]
    fn test_coordinates_skip_missing() {
        let table = sample();
        let coords = table.coordinates("longitude", "latitude").unwrap();
        assert_eq!(coords[0], Some(Point::new(1.0, 2.0)));
        assert_eq!(coords[1], None);
        assert!(table.coordinates("lon", "latitude").is_none());
    }

    #[test]
    fn test_subsets_keep_identity() {
        let table = sample();
        let subset = table.filter_mask(&[false, true, true]);
        assert_eq!(subset.ids(), vec![RowId(1), RowId(2)]);

        let mut grown = subset.clone();
        let id = grown.push(vec![Value::from(0.0), Value::from(0.0)]).unwrap();
        assert_eq!(id, RowId(3));
    }

    #[test]
    fn test_deserialize_checks_row_arity() {
        let json = serde_json::to_string(&sample()).unwrap();
        let restored: PointTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, sample());

        let ragged = r#"{"columns":["longitude","latitude"],"rows":[{"id":0,"values":[{"Number":1.0}]}]}"#;
        let err = serde_json::from_str::<PointTable>(ragged).unwrap_err();
        assert!(err.to_string().contains("1 values but the table has 2 columns"));
    }

    #[test]
    fn test_add_and_map_column() {
        let mut table = sample();
        table
            .add_column("flag".into(), vec![true.into(), false.into(), true.into()])
            .unwrap();
        assert_eq!(table.columns().len(), 3);

        assert!(table.map_column("latitude", |v| Value::from(v.as_f64().unwrap_or(0.0) * 2.0)));
        assert_eq!(table.value(2, "latitude"), Some(&Value::from(10.0)));
        assert!(!table.map_column("missing", |v| v.clone()));

        assert!(table.drop_column("longitude"));
        assert_eq!(table.columns(), &["latitude".to_string(), "flag".to_string()]);
        assert_eq!(table.rows()[0].values.len(), 2);
        assert!(!table.drop_column("longitude"));
    }
}
