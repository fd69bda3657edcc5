//! Validation for geographic coordinates, boundary geometry and grid steps.

use crate::error::{BrammError, Result};
use geo::{MultiPolygon, Point, Polygon};
use std::f64::consts::{FRAC_PI_2, PI};

/// Validates a (lon, lat) point in degrees.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use bramm::compute::validation::validate_geographic_point;
/// use geo::Point;
///
/// assert!(validate_geographic_point(&Point::new(2.35, 48.85)).is_ok());
/// assert!(validate_geographic_point(&Point::new(200.0, 40.0)).is_err());
/// assert!(validate_geographic_point(&Point::new(-74.0, 95.0)).is_err());
/// ```
pub fn validate_geographic_point(point: &Point) -> Result<()> {
    validate_in_range(point, 180.0, 90.0, "")
}

/// Validates a (lon, lat) point in radians.
///
/// Longitude: [-π, π], Latitude: [-π/2, π/2]
pub fn validate_radian_point(point: &Point) -> Result<()> {
    validate_in_range(point, PI, FRAC_PI_2, " (radians)")
}

fn validate_in_range(point: &Point, lon_max: f64, lat_max: f64, unit: &str) -> Result<()> {
    let (x, y) = (point.x(), point.y());

    if !x.is_finite() {
        return Err(BrammError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            x
        )));
    }

    if !y.is_finite() {
        return Err(BrammError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            y
        )));
    }

    if !(-lon_max..=lon_max).contains(&x) {
        return Err(BrammError::InvalidInput(format!(
            "Longitude out of range [{}, {}]{}: {}",
            -lon_max, lon_max, unit, x
        )));
    }

    if !(-lat_max..=lat_max).contains(&y) {
        return Err(BrammError::InvalidInput(format!(
            "Latitude out of range [{}, {}]{}: {}",
            -lat_max, lat_max, unit, y
        )));
    }

    Ok(())
}

/// Validates all polygon coordinates (exterior and interior rings).
///
/// # Examples
///
/// ```
/// use bramm::compute::validation::validate_polygon;
/// use geo::{polygon, Polygon};
///
/// let poly: Polygon = polygon![
///     (x: 2.0, y: 45.0),
///     (x: 3.5, y: 45.0),
///     (x: 3.5, y: 46.2),
///     (x: 2.0, y: 46.2),
///     (x: 2.0, y: 45.0),
/// ];
///
/// assert!(validate_polygon(&poly).is_ok());
/// ```
pub fn validate_polygon(polygon: &Polygon) -> Result<()> {
    if polygon.exterior().0.len() < 4 {
        return Err(BrammError::Geometry(format!(
            "Exterior ring needs at least 4 positions, got {}",
            polygon.exterior().0.len()
        )));
    }

    for (idx, coord) in polygon.exterior().coords().enumerate() {
        let point = Point::from(*coord);
        validate_geographic_point(&point).map_err(|e| {
            BrammError::Geometry(format!("Exterior ring point at index {}: {}", idx, e))
        })?;
    }

    for (ring_idx, interior) in polygon.interiors().iter().enumerate() {
        for (idx, coord) in interior.coords().enumerate() {
            let point = Point::from(*coord);
            validate_geographic_point(&point).map_err(|e| {
                BrammError::Geometry(format!(
                    "Interior ring {} point at index {}: {}",
                    ring_idx, idx, e
                ))
            })?;
        }
    }

    Ok(())
}

/// Validates every part of a multi-polygon. At least one part is required.
pub fn validate_multi_polygon(multi: &MultiPolygon) -> Result<()> {
    if multi.0.is_empty() {
        return Err(BrammError::Geometry(
            "Boundary has no polygon part".to_string(),
        ));
    }

    for (part, polygon) in multi.0.iter().enumerate() {
        validate_polygon(polygon)
            .map_err(|e| BrammError::Geometry(format!("Part {}: {}", part, e)))?;
    }

    Ok(())
}

/// Validates a grid spacing: finite and strictly positive.
pub fn validate_step(step: f64) -> Result<()> {
    if !step.is_finite() || step <= 0.0 {
        return Err(BrammError::InvalidConfig(format!(
            "Grid step must be a finite positive number, got: {}",
            step
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_valid_geographic_point() {
        let paris = Point::new(2.3522, 48.8566);
        assert!(validate_geographic_point(&paris).is_ok());

        // Edge cases
        assert!(validate_geographic_point(&Point::new(180.0, 0.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(-180.0, 0.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(0.0, 90.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(0.0, -90.0)).is_ok());
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(validate_geographic_point(&Point::new(180.1, 40.0)).is_err());
        assert!(validate_geographic_point(&Point::new(-74.0, -90.1)).is_err());
        assert!(validate_geographic_point(&Point::new(f64::NAN, 40.0)).is_err());
        assert!(validate_geographic_point(&Point::new(0.0, f64::INFINITY)).is_err());
    }

    #[test]
    fn test_radian_ranges() {
        assert!(validate_radian_point(&Point::new(PI, FRAC_PI_2)).is_ok());
        assert!(validate_radian_point(&Point::new(3.5, 0.0)).is_err());
        assert!(validate_radian_point(&Point::new(0.0, 1.6)).is_err());
    }

    #[test]
    fn test_validate_polygon() {
        let valid: Polygon = polygon![
            (x: 2.0, y: 45.0),
            (x: 3.0, y: 45.0),
            (x: 3.0, y: 46.0),
            (x: 2.0, y: 45.0),
        ];
        assert!(validate_polygon(&valid).is_ok());

        let invalid: Polygon = polygon![
            (x: 2.0, y: 45.0),
            (x: 999.0, y: 45.0),
            (x: 3.0, y: 46.0),
            (x: 2.0, y: 45.0),
        ];
        assert!(matches!(validate_polygon(&invalid), Err(BrammError::Geometry(_))));
    }

    #[test]
    fn test_empty_multi_polygon() {
        assert!(validate_multi_polygon(&MultiPolygon::new(vec![])).is_err());
    }

    #[test]
    fn test_validate_step() {
        assert!(validate_step(0.5).is_ok());
        assert!(matches!(validate_step(0.0), Err(BrammError::InvalidConfig(_))));
        assert!(validate_step(-1.0).is_err());
        assert!(validate_step(f64::NAN).is_err());
    }
}
