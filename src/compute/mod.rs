//! Compute layer: coordinate validation, GeoJSON conversion, spherical
//! geometry and the nearest-neighbor index used by the matcher.
//!
//! Nothing in this module touches I/O beyond string (de)serialization.

pub mod geojson;
pub mod spatial;
pub mod temporal;
pub mod validation;

pub use spatial::{
    EARTH_RADIUS_KM, NearestIndex, Neighbor, haversine_radians, km_to_radians, radians_to_km,
    to_radians,
};
