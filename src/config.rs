//! Per-call configuration for matching and grid generation.
//!
//! Nothing here is global: callers build a config value and pass it to the
//! component that needs it.

use crate::compute::spatial::km_to_radians;
use crate::error::{BrammError, Result};
use serde::de::Error;

/// Names of the longitude/latitude columns of one point table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoordinateFields {
    #[serde(default = "CoordinateFields::default_longitude")]
    pub longitude: String,
    #[serde(default = "CoordinateFields::default_latitude")]
    pub latitude: String,
}

impl CoordinateFields {
    pub fn new(longitude: impl Into<String>, latitude: impl Into<String>) -> Self {
        Self {
            longitude: longitude.into(),
            latitude: latitude.into(),
        }
    }

    fn default_longitude() -> String {
        "longitude".to_string()
    }

    fn default_latitude() -> String {
        "latitude".to_string()
    }
}

impl Default for CoordinateFields {
    fn default() -> Self {
        Self {
            longitude: Self::default_longitude(),
            latitude: Self::default_latitude(),
        }
    }
}

/// When the distance threshold is applied relative to the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Merge every nearest pair, then drop rows beyond the threshold.
    #[default]
    PostMerge,
    /// Mask rows beyond the threshold before merging.
    PreMerge,
}

/// Whether and how the nearest distance is kept in the matched table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceOutput {
    #[default]
    Drop,
    Radians,
    Kilometers,
}

/// Acceptance thresholds and naming used by [`Matcher`](crate::matching::Matcher).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatcherConfig {
    /// Reference rows dated before this year are not eligible.
    #[serde(default = "MatcherConfig::default_year_threshold")]
    pub year_threshold: i32,

    /// Maximum accepted nearest distance, in kilometers.
    #[serde(default = "MatcherConfig::default_km_threshold")]
    pub km_threshold: f64,

    /// Date column of the secondary (dated) dataset.
    #[serde(default = "MatcherConfig::default_date_field")]
    pub date_field: String,

    #[serde(default = "MatcherConfig::default_primary_suffix")]
    pub primary_suffix: String,

    #[serde(default = "MatcherConfig::default_secondary_suffix")]
    pub secondary_suffix: String,

    #[serde(default = "MatcherConfig::default_distance_column")]
    pub distance_column: String,

    #[serde(default)]
    pub threshold_mode: ThresholdMode,

    #[serde(default)]
    pub distance_output: DistanceOutput,
}

impl MatcherConfig {
    const fn default_year_threshold() -> i32 {
        2000
    }

    const fn default_km_threshold() -> f64 {
        1.0
    }

    fn default_date_field() -> String {
        "date_complete".to_string()
    }

    fn default_primary_suffix() -> String {
        "_moss".to_string()
    }

    fn default_secondary_suffix() -> String {
        "_rmqs".to_string()
    }

    fn default_distance_column() -> String {
        "distance".to_string()
    }

    pub fn with_year_threshold(mut self, year: i32) -> Self {
        self.year_threshold = year;
        self
    }

    pub fn with_km_threshold(mut self, km: f64) -> Self {
        self.km_threshold = km;
        self
    }

    pub fn with_date_field(mut self, field: impl Into<String>) -> Self {
        self.date_field = field.into();
        self
    }

    pub fn with_suffixes(mut self, primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        self.primary_suffix = primary.into();
        self.secondary_suffix = secondary.into();
        self
    }

    pub fn with_threshold_mode(mut self, mode: ThresholdMode) -> Self {
        self.threshold_mode = mode;
        self
    }

    pub fn with_distance_output(mut self, output: DistanceOutput) -> Self {
        self.distance_output = output;
        self
    }

    /// Distance threshold in radians on a sphere of radius 6371 km.
    pub fn rad_threshold(&self) -> f64 {
        km_to_radians(self.km_threshold)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.km_threshold.is_finite() || self.km_threshold < 0.0 {
            return Err(BrammError::InvalidConfig(format!(
                "Distance threshold must be a finite non-negative number of km, got: {}",
                self.km_threshold
            )));
        }

        if self.primary_suffix == self.secondary_suffix {
            return Err(BrammError::InvalidConfig(format!(
                "Primary and secondary suffixes must differ, both are '{}'",
                self.primary_suffix
            )));
        }

        if self.date_field.is_empty() || self.distance_column.is_empty() {
            return Err(BrammError::InvalidConfig(
                "Date field and distance column names must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: MatcherConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: MatcherConfig = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            year_threshold: Self::default_year_threshold(),
            km_threshold: Self::default_km_threshold(),
            date_field: Self::default_date_field(),
            primary_suffix: Self::default_primary_suffix(),
            secondary_suffix: Self::default_secondary_suffix(),
            distance_column: Self::default_distance_column(),
            threshold_mode: ThresholdMode::default(),
            distance_output: DistanceOutput::default(),
        }
    }
}

/// Options of a single [`nearest_join`](crate::matching::Matcher::nearest_join) call.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOptions {
    /// Coordinates are already in radians.
    pub radians: bool,
    pub left: CoordinateFields,
    pub right: CoordinateFields,
    /// Appended to colliding column names of the left and right tables.
    pub suffixes: (String, String),
    pub want_leftovers: bool,
}

impl JoinOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn radians(mut self, radians: bool) -> Self {
        self.radians = radians;
        self
    }

    pub fn left_fields(mut self, fields: CoordinateFields) -> Self {
        self.left = fields;
        self
    }

    pub fn right_fields(mut self, fields: CoordinateFields) -> Self {
        self.right = fields;
        self
    }

    pub fn suffixes(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.suffixes = (left.into(), right.into());
        self
    }

    pub fn want_leftovers(mut self, want: bool) -> Self {
        self.want_leftovers = want;
        self
    }
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            radians: false,
            left: CoordinateFields::default(),
            right: CoordinateFields::default(),
            suffixes: ("_left".to_string(), "_right".to_string()),
            want_leftovers: false,
        }
    }
}

/// Options of the primary/secondary convenience wrappers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PairOptions {
    pub radians: bool,
    pub primary: CoordinateFields,
    pub secondary: CoordinateFields,
    pub want_leftovers: bool,
}

impl PairOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn radians(mut self, radians: bool) -> Self {
        self.radians = radians;
        self
    }

    pub fn primary_fields(mut self, fields: CoordinateFields) -> Self {
        self.primary = fields;
        self
    }

    pub fn secondary_fields(mut self, fields: CoordinateFields) -> Self {
        self.secondary = fields;
        self
    }

    pub fn want_leftovers(mut self, want: bool) -> Self {
        self.want_leftovers = want;
        self
    }
}

/// Column names of a generated grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridFields {
    pub longitude: String,
    pub latitude: String,
    /// Boolean selection column written in [`GridMode::Annotated`].
    pub inside: String,
}

impl Default for GridFields {
    fn default() -> Self {
        Self {
            longitude: "longitude".to_string(),
            latitude: "latitude".to_string(),
            inside: "inland".to_string(),
        }
    }
}

/// Shape of the table returned by [`RegularGrid`](crate::grid::RegularGrid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridMode {
    /// Only the mesh points inside the boundary.
    #[default]
    InsideOnly,
    /// Every mesh point with a boolean inside flag.
    Annotated,
}
