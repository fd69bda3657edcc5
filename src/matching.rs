//! Nearest-neighbor record linkage between two point tables.
//!
//! [`Matcher::nearest_join`] attaches to every row of a driving (left) table
//! the attributes of its great-circle nearest row in a reference (right)
//! table, keeping only pairs closer than the configured distance threshold.
//! The driving table's row identities are kept in the output, so the output
//! never has more rows than the driving table.
//!
//! The convenience wrappers fix the domain direction between a primary
//! dataset (moss samples) and a secondary, dated dataset (soil survey
//! points). The secondary dataset is restricted to recent survey rounds with
//! [`Matcher::filter_by_year`] before any search.
//!
//! ## Ties
//!
//! When several reference rows are equidistant from a driving row, the one
//! appearing first in the reference table wins.

use crate::compute::spatial::{NearestIndex, radians_to_km, to_radians};
use crate::compute::temporal::year_of;
use crate::compute::validation::{validate_geographic_point, validate_radian_point};
use crate::config::{
    CoordinateFields, DistanceOutput, JoinOptions, MatcherConfig, PairOptions, ThresholdMode,
};
use crate::error::{BrammError, Result};
use bramm_types::table::{PointTable, Row, RowId};
use bramm_types::value::Value;
use geo::Point;
use rustc_hash::FxHashSet;

/// One accepted driving/reference pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPair {
    pub left: RowId,
    pub right: RowId,
    /// Central angle between the two rows, in radians.
    pub distance: f64,
}

impl MatchPair {
    pub fn distance_km(&self) -> f64 {
        radians_to_km(self.distance)
    }
}

/// Result of a nearest join.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutput {
    /// Driving rows within the threshold, extended with their match's columns.
    pub matched: PointTable,
    /// Reference rows never selected as a nearest match, when requested.
    /// Not affected by the distance threshold.
    pub leftovers: Option<PointTable>,
    /// Accepted pairs in driving-table order.
    pub pairs: Vec<MatchPair>,
}

/// Nearest match of one driving row, before thresholding.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    left: usize,
    right: usize,
    distance: f64,
}

/// Geodesic nearest-neighbor matcher.
///
/// # Examples
///
/// ```rust
/// use bramm::{JoinOptions, Matcher, MatcherConfig, PointTable, Value};
///
/// let mut moss = PointTable::new(vec!["id".into(), "longitude".into(), "latitude".into()]);
/// moss.push(vec![Value::from(1_i64), Value::from(0.0), Value::from(0.0)])?;
///
/// let mut soil = PointTable::new(vec!["id".into(), "longitude".into(), "latitude".into()]);
/// soil.push(vec![Value::from(10_i64), Value::from(0.0), Value::from(0.0)])?;
/// soil.push(vec![Value::from(11_i64), Value::from(1.0), Value::from(1.0)])?;
///
/// let matcher = Matcher::new(MatcherConfig::default().with_km_threshold(5000.0))?;
/// let out = matcher.nearest_join(&moss, &soil, &JoinOptions::new().want_leftovers(true))?;
///
/// assert_eq!(out.matched.value(0, "id_right"), Some(&Value::from(10_i64)));
/// assert_eq!(out.leftovers.unwrap().len(), 1);
/// # Ok::<(), bramm::BrammError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatcherConfig,
}

impl Matcher {
    pub fn new(config: MatcherConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Distance threshold in radians.
    pub fn rad_threshold(&self) -> f64 {
        self.config.rad_threshold()
    }

    /// Copy of `table` with its longitude and latitude columns in radians.
    ///
    /// Missing values stay missing; non-numeric values become missing.
    pub fn convert_to_radians(table: &PointTable, fields: &CoordinateFields) -> Result<PointTable> {
        require_columns(table, fields)?;

        let mut converted = table.clone();
        for column in [&fields.longitude, &fields.latitude] {
            converted.map_column(column, |value| match value.as_f64() {
                Some(degrees) => Value::from(degrees.to_radians()),
                None => Value::Null,
            });
        }
        Ok(converted)
    }

    /// Rows whose `date_field` falls in `min_year` or later.
    ///
    /// Rows with a missing or unparseable date are dropped.
    pub fn filter_by_year(table: &PointTable, date_field: &str, min_year: i32) -> Result<PointTable> {
        let col = table
            .column_index(date_field)
            .ok_or_else(|| BrammError::missing_column(date_field))?;

        let mut undated = 0usize;
        let filtered = table.filter(|row| match year_of(&row.values[col]) {
            Some(year) => year >= min_year,
            None => {
                undated += 1;
                false
            }
        });

        if undated > 0 {
            log::warn!(
                "Dropped {} rows with missing or unparseable '{}'",
                undated,
                date_field
            );
        }
        log::debug!(
            "Year filter >= {} on '{}': kept {} of {} rows",
            min_year,
            date_field,
            filtered.len(),
            table.len()
        );

        Ok(filtered)
    }

    /// [`filter_by_year`](Self::filter_by_year) with the configured date
    /// field and year threshold.
    pub fn apply_year_threshold(&self, table: &PointTable) -> Result<PointTable> {
        Self::filter_by_year(table, &self.config.date_field, self.config.year_threshold)
    }

    /// Match every `left` row to its nearest `right` row.
    ///
    /// # Errors
    ///
    /// - `MissingColumn` if a coordinate column is absent
    /// - `EmptyInput` if either side has no row with usable coordinates
    /// - `InvalidInput` if a coordinate is out of range
    /// - `InvalidConfig` if suffixing cannot produce unique column names
    pub fn nearest_join(
        &self,
        left: &PointTable,
        right: &PointTable,
        options: &JoinOptions,
    ) -> Result<JoinOutput> {
        let (left_pos, left_points) = usable_points(left, &options.left, options.radians, "left")?;
        let (right_pos, right_points) =
            usable_points(right, &options.right, options.radians, "right")?;

        if right_points.is_empty() {
            return Err(BrammError::EmptyInput(
                "reference table has no rows with coordinates".to_string(),
            ));
        }
        if left_points.is_empty() {
            return Err(BrammError::EmptyInput(
                "driving table has no rows with coordinates".to_string(),
            ));
        }

        let index = NearestIndex::build(&right_points);
        let candidates: Vec<Candidate> = left_pos
            .iter()
            .zip(&left_points)
            .filter_map(|(&pos, point)| {
                index.nearest(*point).map(|hit| Candidate {
                    left: pos,
                    right: right_pos[hit.index],
                    distance: hit.distance,
                })
            })
            .collect();

        let layout = MergeLayout::new(
            left,
            right,
            &options.suffixes,
            &self.config.distance_column,
            self.config.distance_output,
        )?;
        let threshold = self.rad_threshold();

        let (matched, accepted) = match self.config.threshold_mode {
            ThresholdMode::PreMerge => {
                let accepted: Vec<Candidate> = candidates
                    .iter()
                    .copied()
                    .filter(|c| c.distance <= threshold)
                    .collect();
                (layout.merge(left, right, &accepted)?, accepted)
            }
            ThresholdMode::PostMerge => {
                let merged = layout.merge(left, right, &candidates)?;
                let mask: Vec<bool> = candidates.iter().map(|c| c.distance <= threshold).collect();
                let matched = merged.filter_mask(&mask);

                let accepted = candidates
                    .iter()
                    .zip(&mask)
                    .filter_map(|(c, keep)| keep.then_some(*c))
                    .collect();
                (matched, accepted)
            }
        };

        let leftovers = options.want_leftovers.then(|| {
            let selected: FxHashSet<usize> = candidates.iter().map(|c| c.right).collect();
            let positions: Vec<usize> = (0..right.len()).filter(|p| !selected.contains(p)).collect();
            right.take(&positions)
        });

        log::info!(
            "Nearest join: {} of {} driving rows matched within {} km, {} reference rows",
            matched.len(),
            left.len(),
            self.config.km_threshold,
            right.len()
        );

        let pairs = accepted
            .iter()
            .map(|c| MatchPair {
                left: left.rows()[c.left].id,
                right: right.rows()[c.right].id,
                distance: c.distance,
            })
            .collect();

        Ok(JoinOutput {
            matched,
            leftovers,
            pairs,
        })
    }

    /// Match the dated secondary table onto the primary one.
    ///
    /// The output follows the primary table: each primary row appears at most
    /// once, matched or dropped by the threshold.
    pub fn match_to_primary(
        &self,
        primary: &PointTable,
        secondary: &PointTable,
        options: &PairOptions,
    ) -> Result<JoinOutput> {
        let recent = self.apply_year_threshold(secondary)?;

        let join = JoinOptions {
            radians: options.radians,
            left: options.primary.clone(),
            right: options.secondary.clone(),
            suffixes: (
                self.config.primary_suffix.clone(),
                self.config.secondary_suffix.clone(),
            ),
            want_leftovers: options.want_leftovers,
        };
        self.nearest_join(primary, &recent, &join)
    }

    /// Match the primary table onto the dated secondary one.
    ///
    /// The output follows the year-filtered secondary table; leftovers are
    /// primary rows. Suffixes stay attached to their dataset: colliding
    /// secondary columns get `secondary_suffix` and colliding primary columns
    /// get `primary_suffix`, even though the secondary table drives here.
    pub fn match_to_secondary(
        &self,
        primary: &PointTable,
        secondary: &PointTable,
        options: &PairOptions,
    ) -> Result<JoinOutput> {
        let recent = self.apply_year_threshold(secondary)?;

        let join = JoinOptions {
            radians: options.radians,
            left: options.secondary.clone(),
            right: options.primary.clone(),
            suffixes: (
                self.config.secondary_suffix.clone(),
                self.config.primary_suffix.clone(),
            ),
            want_leftovers: options.want_leftovers,
        };
        self.nearest_join(&recent, primary, &join)
    }
}

fn require_columns(table: &PointTable, fields: &CoordinateFields) -> Result<()> {
    for column in [&fields.longitude, &fields.latitude] {
        if !table.has_column(column) {
            return Err(BrammError::missing_column(column.as_str()));
        }
    }
    Ok(())
}

/// Positions and radian coordinates of the rows usable in a search.
fn usable_points(
    table: &PointTable,
    fields: &CoordinateFields,
    radians: bool,
    side: &str,
) -> Result<(Vec<usize>, Vec<Point>)> {
    require_columns(table, fields)?;
    let coords = table
        .coordinates(&fields.longitude, &fields.latitude)
        .ok_or_else(|| BrammError::missing_column(fields.longitude.as_str()))?;

    let mut positions = Vec::with_capacity(coords.len());
    let mut points = Vec::with_capacity(coords.len());
    for (pos, coord) in coords.into_iter().enumerate() {
        let Some(point) = coord else {
            continue;
        };
        let checked = if radians {
            validate_radian_point(&point)
        } else {
            validate_geographic_point(&point)
        };
        checked.map_err(|e| match e {
            BrammError::InvalidInput(msg) => {
                BrammError::InvalidInput(format!("{} row {}: {}", side, table.rows()[pos].id, msg))
            }
            other => other,
        })?;
        positions.push(pos);
        points.push(if radians { point } else { to_radians(point) });
    }

    let skipped = table.len() - positions.len();
    if skipped > 0 {
        log::warn!("Skipping {} {} rows without coordinates", skipped, side);
    }

    Ok((positions, points))
}

/// Output column names of a merge, with collisions suffixed.
struct MergeLayout {
    columns: Vec<String>,
    distance: DistanceOutput,
}

impl MergeLayout {
    fn new(
        left: &PointTable,
        right: &PointTable,
        suffixes: &(String, String),
        distance_column: &str,
        distance: DistanceOutput,
    ) -> Result<Self> {
        let rename = |name: &String, other: &PointTable, suffix: &str| {
            if other.has_column(name) {
                format!("{}{}", name, suffix)
            } else {
                name.clone()
            }
        };

        let mut columns: Vec<String> = left
            .columns()
            .iter()
            .map(|c| rename(c, right, &suffixes.0))
            .chain(right.columns().iter().map(|c| rename(c, left, &suffixes.1)))
            .collect();
        if distance != DistanceOutput::Drop {
            columns.push(distance_column.to_string());
        }

        let mut seen = FxHashSet::default();
        for name in columns.iter().map(String::as_str) {
            if !seen.insert(name) {
                return Err(BrammError::InvalidConfig(format!(
                    "Column '{}' appears twice in the joined table, choose other suffixes",
                    name
                )));
            }
        }

        Ok(Self { columns, distance })
    }

    fn merge(
        &self,
        left: &PointTable,
        right: &PointTable,
        candidates: &[Candidate],
    ) -> Result<PointTable> {
        let mut merged = PointTable::new(self.columns.clone());
        for c in candidates {
            let driving = &left.rows()[c.left];
            let mut values = driving.values.clone();
            values.extend(right.rows()[c.right].values.iter().cloned());
            match self.distance {
                DistanceOutput::Drop => {}
                DistanceOutput::Radians => values.push(Value::from(c.distance)),
                DistanceOutput::Kilometers => values.push(Value::from(radians_to_km(c.distance))),
            }
            merged.push_row(Row::new(driving.id, values))?;
        }
        Ok(merged)
    }
}
