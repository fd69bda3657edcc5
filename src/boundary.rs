//! Geographic boundary of a sampling region.
//!
//! A [`Boundary`] wraps a (multi-)polygon in degrees and derives its
//! bounding box twice: exactly, and rounded outward to whole degrees so that
//! a grid seeded from the rounded box fully covers the shape.

use crate::compute::geojson::multi_polygon_from_geojson;
use crate::compute::validation::validate_multi_polygon;
use crate::error::{BrammError, Result};
use geo::{BoundingRect, Intersects, MultiPolygon, Point, Polygon, Rect};
use std::path::Path;
use std::str::FromStr;

/// Immutable region polygon with its exact and rounded bounds.
///
/// # Examples
///
/// ```rust
/// use bramm::Boundary;
/// use geo::polygon;
///
/// let boundary = Boundary::from_polygon(polygon![
///     (x: 2.0, y: 45.0),
///     (x: 3.5, y: 45.0),
///     (x: 3.5, y: 46.2),
///     (x: 2.0, y: 46.2),
/// ])?;
///
/// assert_eq!(boundary.lon_max(), 3.5);
/// assert_eq!(boundary.rounded_bounds(), (2, 45, 4, 47));
/// # Ok::<(), bramm::BrammError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    polygon: MultiPolygon,
    bounds: Rect,
}

impl Boundary {
    pub fn from_multi_polygon(polygon: MultiPolygon) -> Result<Self> {
        validate_multi_polygon(&polygon)?;

        let bounds = polygon
            .bounding_rect()
            .ok_or_else(|| BrammError::Geometry("Boundary polygon has no extent".to_string()))?;

        log::debug!(
            "Boundary with {} part(s), bounds ({}, {}, {}, {})",
            polygon.0.len(),
            bounds.min().x,
            bounds.min().y,
            bounds.max().x,
            bounds.max().y
        );

        Ok(Self { polygon, bounds })
    }

    pub fn from_polygon(polygon: Polygon) -> Result<Self> {
        Self::from_multi_polygon(MultiPolygon::new(vec![polygon]))
    }

    /// Boundary from GeoJSON text: a Feature, a Geometry or a FeatureCollection.
    pub fn from_geojson_str(source: &str) -> Result<Self> {
        Self::from_multi_polygon(multi_polygon_from_geojson(source)?)
    }

    /// Boundary read from a GeoJSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_geojson_str(&source)
    }

    pub fn polygon(&self) -> &MultiPolygon {
        &self.polygon
    }

    /// Exact bounding box.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn lon_min(&self) -> f64 {
        self.bounds.min().x
    }

    pub fn lat_min(&self) -> f64 {
        self.bounds.min().y
    }

    pub fn lon_max(&self) -> f64 {
        self.bounds.max().x
    }

    pub fn lat_max(&self) -> f64 {
        self.bounds.max().y
    }

    /// Minimum longitude rounded down.
    pub fn lon_rmin(&self) -> i64 {
        self.lon_min().floor() as i64
    }

    /// Minimum latitude rounded down.
    pub fn lat_rmin(&self) -> i64 {
        self.lat_min().floor() as i64
    }

    /// Maximum longitude rounded up.
    pub fn lon_rmax(&self) -> i64 {
        self.lon_max().ceil() as i64
    }

    /// Maximum latitude rounded up.
    pub fn lat_rmax(&self) -> i64 {
        self.lat_max().ceil() as i64
    }

    /// `(lon_rmin, lat_rmin, lon_rmax, lat_rmax)`
    pub fn rounded_bounds(&self) -> (i64, i64, i64, i64) {
        (
            self.lon_rmin(),
            self.lat_rmin(),
            self.lon_rmax(),
            self.lat_rmax(),
        )
    }

    /// Whether (lon, lat) lies inside the boundary or on its edge.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.polygon.intersects(&Point::new(lon, lat))
    }
}

impl FromStr for Boundary {
    type Err = BrammError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_geojson_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use std::io::Write;

    fn rectangle() -> Boundary {
        Boundary::from_polygon(polygon![
            (x: 2.0, y: 45.0),
            (x: 3.5, y: 45.0),
            (x: 3.5, y: 46.2),
            (x: 2.0, y: 46.2),
        ])
        .unwrap()
    }

    #[test]
    fn test_exact_and_rounded_bounds() {
        let boundary = rectangle();
        assert_eq!(boundary.lon_min(), 2.0);
        assert_eq!(boundary.lat_min(), 45.0);
        assert_eq!(boundary.lon_max(), 3.5);
        assert_eq!(boundary.lat_max(), 46.2);
        assert_eq!(boundary.rounded_bounds(), (2, 45, 4, 47));
    }

    #[test]
    fn test_rounding_is_outward_for_negative_coordinates() {
        let boundary = Boundary::from_polygon(polygon![
            (x: -4.7, y: -1.2),
            (x: -0.3, y: -1.2),
            (x: -0.3, y: 0.4),
        ])
        .unwrap();
        assert_eq!(boundary.rounded_bounds(), (-5, -2, 0, 1));
    }

    #[test]
    fn test_contains_includes_edges() {
        let boundary = rectangle();
        assert!(boundary.contains(2.5, 45.5));
        assert!(boundary.contains(2.0, 45.0));
        assert!(boundary.contains(3.5, 45.7));
        assert!(!boundary.contains(3.6, 45.7));
    }

    #[test]
    fn test_multi_part_bounds() {
        let multi = MultiPolygon::new(vec![
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
            polygon![(x: 5.0, y: 5.0), (x: 6.5, y: 5.0), (x: 6.5, y: 6.5)],
        ]);
        let boundary = Boundary::from_multi_polygon(multi).unwrap();
        assert_eq!(boundary.rounded_bounds(), (0, 0, 7, 7));
        assert!(!boundary.contains(3.0, 3.0));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"type":"Feature","properties":{{"name":"region"}},"geometry":{{"type":"Polygon","coordinates":[[[2.0,45.0],[3.5,45.0],[3.5,46.2],[2.0,46.2],[2.0,45.0]]]}}}}"#
        )
        .unwrap();

        let boundary = Boundary::from_path(file.path()).unwrap();
        assert_eq!(boundary, rectangle());
    }

    #[test]
    fn test_malformed_sources() {
        assert!(matches!(
            "{}".parse::<Boundary>(),
            Err(BrammError::Geometry(_))
        ));
        assert!(matches!(
            Boundary::from_path("/definitely/not/here.geojson"),
            Err(BrammError::Io(_))
        ));
        assert!(Boundary::from_multi_polygon(MultiPolygon::new(vec![])).is_err());
    }
}
