//! Free-form origin/destination resolution.

use safe_route_route_models::{Coordinate, Waypoint};

/// Resolves user input into a [`Waypoint`].
///
/// `"lat, lng"` with exactly two numeric tokens that form a valid
/// coordinate becomes [`Waypoint::Coordinate`]. Anything else, including
/// malformed or out-of-range numbers, is passed through unchanged as a
/// [`Waypoint::Place`] query for the routing provider.
#[must_use]
pub fn resolve_origin(input: &str) -> Waypoint {
    if input.contains(',')
        && let Some(coordinate) = parse_lat_lng(input)
    {
        return Waypoint::Coordinate(coordinate);
    }
    Waypoint::Place(input.to_string())
}

fn parse_lat_lng(input: &str) -> Option<Coordinate> {
    let mut tokens = input.split(',').map(str::trim);
    let lat = tokens.next()?.parse::<f64>().ok()?;
    let lng = tokens.next()?.parse::<f64>().ok()?;
    if tokens.next().is_some() {
        return None;
    }
    Coordinate::new(lat, lng).ok()
}

/// Resolves the origin, falling back to the device location when the
/// typed origin is blank. Returns `None` when neither is available.
#[must_use]
pub fn resolve_origin_or_device(
    origin: &str,
    device_location: Option<Coordinate>,
) -> Option<Waypoint> {
    if origin.trim().is_empty() {
        device_location.map(Waypoint::Coordinate)
    } else {
        Some(resolve_origin(origin))
    }
}
