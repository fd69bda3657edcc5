//! Great-circle helpers working in radians on a spherical Earth.

use geo::Point;

/// Mean Earth radius used for every km <-> radian conversion.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[inline]
pub fn km_to_radians(km: f64) -> f64 {
    km / EARTH_RADIUS_KM
}

#[inline]
pub fn radians_to_km(radians: f64) -> f64 {
    radians * EARTH_RADIUS_KM
}

/// Degree point (lon, lat) to radian point.
#[inline]
pub fn to_radians(point: Point) -> Point {
    Point::new(point.x().to_radians(), point.y().to_radians())
}

/// Central angle between two radian points, by the haversine formula.
///
/// # Examples
///
/// ```
/// use bramm::compute::spatial::haversine_radians;
/// use geo::Point;
///
/// let equator = Point::new(0.0, 0.0);
/// let pole = Point::new(0.0, std::f64::consts::FRAC_PI_2);
/// let angle = haversine_radians(equator, pole);
/// assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
/// ```
#[inline]
pub fn haversine_radians(a: Point, b: Point) -> f64 {
    let dlat = b.y() - a.y();
    let dlon = b.x() - a.x();
    let h = (dlat / 2.0).sin().powi(2) + a.y().cos() * b.y().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Radian point on the unit sphere, as a 3D cartesian vector.
///
/// Chord length between two such vectors grows monotonically with their
/// central angle, so Euclidean nearest neighbors are great-circle nearest
/// neighbors.
#[inline]
pub fn unit_vector(point: Point) -> [f64; 3] {
    let (lon, lat) = (point.x(), point.y());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Distance, Haversine};

    #[test]
    fn test_haversine_matches_geo() {
        let paris = Point::new(2.3522, 48.8566);
        let lyon = Point::new(4.8357, 45.7640);

        let meters = Haversine.distance(paris, lyon);
        let km = radians_to_km(haversine_radians(to_radians(paris), to_radians(lyon)));

        // geo uses a 6371.0088 km mean radius
        assert!((km - meters / 1000.0).abs() < 0.1, "{} vs {}", km, meters / 1000.0);
    }

    #[test]
    fn test_zero_distance() {
        let p = to_radians(Point::new(-1.5, 47.2));
        assert_eq!(haversine_radians(p, p), 0.0);
    }

    #[test]
    fn test_km_radian_conversion() {
        assert!((km_to_radians(6371.0) - 1.0).abs() < 1e-15);
        assert!((radians_to_km(km_to_radians(12.5)) - 12.5).abs() < 1e-12);
    }

    #[test]
    fn test_unit_vector_norm() {
        let v = unit_vector(to_radians(Point::new(123.0, -33.0)));
        let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_antipodal_distance() {
        let a = to_radians(Point::new(0.0, 0.0));
        let b = to_radians(Point::new(180.0, 0.0));
        assert!((haversine_radians(a, b) - std::f64::consts::PI).abs() < 1e-12);
    }
}
