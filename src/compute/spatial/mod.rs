//! Spherical geometry on longitude/latitude pairs.

pub mod index;
pub mod sphere;

pub use index::{NearestIndex, Neighbor};
pub use sphere::{
    EARTH_RADIUS_KM, haversine_radians, km_to_radians, radians_to_km, to_radians, unit_vector,
};
