//! Proximity scoring of a single route.

use safe_route_route_models::{Coordinate, Route, RouteScore};

use crate::{ScoringConfig, distance::GeoDistance};

/// Scores `route` against `incidents`.
///
/// Every path point of every step is tested against the incidents. A
/// point within `config.radius_meters` of any incident is one hit; the
/// scan for that point stops at the first incident in range, so one point
/// is never counted twice. Hits accumulate across points, so a route that
/// lingers near a single incident collects several.
///
/// With `distance` set to `None` the scan is skipped: no hits, and the
/// cost is the travel time alone.
#[must_use]
pub fn score(
    route: &Route,
    incidents: &[Coordinate],
    config: &ScoringConfig,
    distance: Option<&dyn GeoDistance>,
) -> RouteScore {
    let travel_time_seconds = route.duration_seconds();

    let hits = distance.map_or(0, |distance| {
        count_exposed_points(route, incidents, config.radius_meters, distance)
    });
    let incidents_near_route = u32::try_from(hits).unwrap_or(u32::MAX);

    RouteScore {
        total_cost_seconds: travel_time_seconds
            + f64::from(incidents_near_route) * config.penalty_seconds_per_incident,
        incidents_near_route,
        travel_time_seconds,
    }
}

fn count_exposed_points(
    route: &Route,
    incidents: &[Coordinate],
    radius_meters: f64,
    distance: &dyn GeoDistance,
) -> usize {
    if incidents.is_empty() {
        return 0;
    }

    route
        .points()
        .filter(|point| {
            incidents
                .iter()
                .any(|incident| distance.distance_meters(**point, *incident) <= radius_meters)
        })
        .count()
}
