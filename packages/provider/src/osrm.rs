//! OSRM walking route client.
//!
//! Queries the `/route/v1/{profile}/{lng},{lat};{lng},{lat}` endpoint with
//! `steps=true&geometries=geojson` so every step carries its own line
//! geometry and duration. OSRM answers `"code": "NoRoute"` (sometimes as
//! an HTTP 400) when the two points are not connected; that is reported as
//! an empty route list rather than an error.
//!
//! See <https://project-osrm.org/docs/v5.24.0/api/#route-service>

use async_trait::async_trait;
use safe_route_route_models::{Coordinate, Route, RouteLeg, Step, Waypoint};
use safe_route_routing::{ProviderError, RouteOptions, RoutingProvider};
use serde_json::Value;

use crate::places::PlaceDirectory;
use crate::{ClientError, retry};

/// Routing provider backed by an OSRM-compatible server.
#[derive(Debug, Clone)]
pub struct OsrmRoutingProvider {
    client: reqwest::Client,
    base_url: String,
    profile: String,
    places: PlaceDirectory,
}

impl OsrmRoutingProvider {
    /// Creates a provider for `base_url` (without the `/route/v1` suffix).
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        profile: &str,
        places: PlaceDirectory,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            profile: profile.to_string(),
            places,
        }
    }

    fn locate(&self, waypoint: &Waypoint) -> Result<Coordinate, ProviderError> {
        match waypoint {
            Waypoint::Coordinate(c) => Ok(*c),
            Waypoint::Place(name) => {
                self.places
                    .lookup(name)
                    .ok_or_else(|| ProviderError::UnknownPlace {
                        name: name.clone(),
                    })
            }
        }
    }

    fn route_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.base_url, self.profile, origin.lng, origin.lat, destination.lng, destination.lat
        )
    }
}

#[async_trait]
impl RoutingProvider for OsrmRoutingProvider {
    async fn get_routes(
        &self,
        origin: &Waypoint,
        destination: &Waypoint,
        options: RouteOptions,
    ) -> Result<Vec<Route>, ProviderError> {
        let from = self.locate(origin)?;
        let to = self.locate(destination)?;
        let url = self.route_url(from, to);
        let alternatives = if options.alternatives { "true" } else { "false" };

        log::debug!("OSRM request: {url} (alternatives={alternatives})");

        let result = retry::send_json(|| {
            self.client.get(&url).query(&[
                ("alternatives", alternatives),
                ("steps", "true"),
                ("geometries", "geojson"),
                ("overview", "false"),
            ])
        })
        .await;

        let body = match result {
            Ok(body) => body,
            Err(ClientError::Status {
                status,
                body: Some(text),
            }) if status == 400 => {
                // OSRM reports unroutable pairs as 400 with a JSON code.
                serde_json::from_str::<Value>(&text).map_err(|_| {
                    ProviderError::from(ClientError::Status {
                        status,
                        body: Some(text.clone()),
                    })
                })?
            }
            Err(e) => return Err(e.into()),
        };

        let routes = parse_response(&body)?;
        log::debug!("OSRM returned {} route(s)", routes.len());
        Ok(routes)
    }
}

/// Parses an OSRM route response into [`Route`]s in server order.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] if the body is not a well-formed OSRM
/// route response, or [`ProviderError::Unavailable`] if OSRM reports an
/// error other than `NoRoute`.
pub fn parse_response(body: &Value) -> Result<Vec<Route>, ProviderError> {
    let code = body
        .get("code")
        .and_then(Value::as_str)
        .ok_or_else(|| parse_error("OSRM response missing 'code'"))?;

    match code {
        "Ok" => {}
        "NoRoute" => return Ok(vec![]),
        other => {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            return Err(ProviderError::Unavailable {
                message: format!("OSRM returned {other}: {message}"),
            });
        }
    }

    let routes = body
        .get("routes")
        .and_then(Value::as_array)
        .ok_or_else(|| parse_error("OSRM response missing 'routes' array"))?;

    routes.iter().map(parse_route).collect()
}

fn parse_route(route: &Value) -> Result<Route, ProviderError> {
    let legs = route
        .get("legs")
        .and_then(Value::as_array)
        .ok_or_else(|| parse_error("route missing 'legs' array"))?
        .iter()
        .map(parse_leg)
        .collect::<Result<Vec<_>, _>>()?;

    let summary = route
        .get("legs")
        .and_then(Value::as_array)
        .and_then(|legs| legs.first())
        .and_then(|leg| leg.get("summary"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string);

    Ok(Route { legs, summary })
}

fn parse_leg(leg: &Value) -> Result<RouteLeg, ProviderError> {
    let duration_seconds = number(leg, "duration")?;
    let steps = leg
        .get("steps")
        .and_then(Value::as_array)
        .ok_or_else(|| parse_error("leg missing 'steps' array"))?
        .iter()
        .map(parse_step)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RouteLeg {
        steps,
        duration_seconds,
    })
}

fn parse_step(step: &Value) -> Result<Step, ProviderError> {
    let duration_seconds = number(step, "duration")?;
    let coords = step
        .pointer("/geometry/coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| parse_error("step missing geometry.coordinates"))?;

    let path = coords
        .iter()
        .map(|pair| {
            let pair = pair
                .as_array()
                .filter(|p| p.len() >= 2)
                .ok_or_else(|| parse_error("coordinate is not a [lng, lat] pair"))?;
            let lng = pair[0]
                .as_f64()
                .ok_or_else(|| parse_error("longitude is not a number"))?;
            let lat = pair[1]
                .as_f64()
                .ok_or_else(|| parse_error("latitude is not a number"))?;
            Coordinate::new(lat, lng).map_err(|e| parse_error(&e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Step {
        path,
        duration_seconds,
    })
}

fn number(value: &Value, field: &str) -> Result<f64, ProviderError> {
    value
        .get(field)
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .ok_or_else(|| parse_error(&format!("missing or invalid '{field}'")))
}

fn parse_error(message: &str) -> ProviderError {
    ProviderError::Parse {
        message: message.to_string(),
    }
}
