//! Spatial record linkage and boundary-clipped grid sampling for moss
//! biomonitoring and soil survey data.
//!
//! ```rust
//! use bramm::{Boundary, GridMode, JoinOptions, Matcher, MatcherConfig, RegularGrid};
//! use geo::polygon;
//!
//! let boundary = Boundary::from_polygon(polygon![
//!     (x: 2.0, y: 45.0),
//!     (x: 3.5, y: 45.0),
//!     (x: 3.5, y: 46.2),
//!     (x: 2.0, y: 46.2),
//! ])?;
//! let grid = RegularGrid::new(boundary).retrieve_grid(0.5, GridMode::InsideOnly)?;
//! let stations = RegularGrid::new(Boundary::from_polygon(polygon![
//!     (x: 2.0, y: 45.0),
//!     (x: 3.0, y: 45.0),
//!     (x: 3.0, y: 46.0),
//! ])?)
//! .retrieve_grid(1.0, GridMode::InsideOnly)?;
//!
//! let matcher = Matcher::new(MatcherConfig::default().with_km_threshold(30.0))?;
//! let joined = matcher.nearest_join(&grid, &stations, &JoinOptions::new())?;
//! assert!(joined.matched.len() <= grid.len());
//! # Ok::<(), bramm::BrammError>(())
//! ```

pub mod boundary;
pub mod compute;
pub mod config;
pub mod error;
pub mod grid;
pub mod loaders;
pub mod matching;
pub mod preprocessing;

pub use boundary::Boundary;
pub use error::{BrammError, Result};
pub use grid::{GridAxes, MAX_GRID_POINTS, RegularGrid};
pub use matching::{JoinOutput, MatchPair, Matcher};

pub use config::{
    CoordinateFields, DistanceOutput, GridFields, GridMode, JoinOptions, MatcherConfig,
    PairOptions, ThresholdMode,
};

pub use loaders::{DataSource, JsonFileSource, MemorySource, from_json_file, from_table};

pub use bramm_types::table::{PointTable, Row, RowId};
pub use bramm_types::value::Value;

pub use geo::{MultiPolygon, Point, Polygon};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{BrammError, Result};

    pub use crate::{Boundary, GridMode, RegularGrid};

    pub use crate::{JoinOptions, Matcher, MatcherConfig, PairOptions};

    pub use crate::{CoordinateFields, DataSource, PointTable, RowId, Value};

    pub use geo::{Point, Polygon};
}
