//! Pluggable great-circle distance.

use geo::{Distance as _, Haversine};
use safe_route_route_models::Coordinate;

/// A geo-distance primitive.
///
/// The scorer takes `Option<&dyn GeoDistance>`; environments without a
/// distance implementation pass `None` and get travel-time-only ranking.
pub trait GeoDistance: Send + Sync {
    /// Great-circle distance between two coordinates in meters.
    fn distance_meters(&self, a: Coordinate, b: Coordinate) -> f64;
}

/// Haversine distance on the mean Earth radius, backed by [`geo`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineDistance;

impl GeoDistance for HaversineDistance {
    fn distance_meters(&self, a: Coordinate, b: Coordinate) -> f64 {
        Haversine.distance(a.to_point(), b.to_point())
    }
}
