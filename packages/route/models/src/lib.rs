#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route geometry and safety score types.
//!
//! These are the value types exchanged between the routing provider, the
//! incident-aware scorer, and whatever view layer displays the chosen
//! route. A [`Route`] is only ever produced by a routing provider; the
//! scoring code reads it but never rewrites its geometry.

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate.
///
/// Construct through [`Coordinate::new`] to get range validation. Values
/// deserialized from a provider are checked with [`Coordinate::is_valid`]
/// at the boundary where they enter the system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, `[-90, 90]`.
    pub lat: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub lng: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if either component is NaN,
    /// infinite, or outside its valid range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidCoordinateError> {
        let coordinate = Self { lat, lng };
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(InvalidCoordinateError { lat, lng })
        }
    }

    /// Whether both components are finite and within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Converts to a [`geo::Point`] (x = longitude, y = latitude).
    #[must_use]
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lng, self.lat)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

/// Error returned when a latitude/longitude pair is not a valid
/// [`Coordinate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidCoordinateError {
    /// The rejected latitude.
    pub lat: f64,
    /// The rejected longitude.
    pub lng: f64,
}

impl std::fmt::Display for InvalidCoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid coordinate ({}, {}): expected finite lat in [-90, 90] and lng in [-180, 180]",
            self.lat, self.lng
        )
    }
}

impl std::error::Error for InvalidCoordinateError {}

/// An origin or destination as handed to the routing provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Waypoint {
    /// A geographic coordinate.
    Coordinate(Coordinate),
    /// A free-text place query (e.g. "Main Library").
    Place(String),
}

impl std::fmt::Display for Waypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coordinate(c) => write!(f, "({c})"),
            Self::Place(name) => write!(f, "\"{name}\""),
        }
    }
}

/// One turn-by-turn step: a polyline plus the time to walk it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Ordered path points.
    pub path: Vec<Coordinate>,
    /// Walking time for this step in seconds.
    pub duration_seconds: f64,
}

/// A leg between two waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    /// Ordered steps of this leg.
    pub steps: Vec<Step>,
    /// Walking time for the whole leg in seconds, as reported by the
    /// provider.
    pub duration_seconds: f64,
}

/// A complete candidate route returned by a routing provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Ordered legs.
    pub legs: Vec<RouteLeg>,
    /// Provider-supplied label (e.g. the main streets used), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Route {
    /// Total travel time: the sum of all leg durations (0 with no legs).
    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        self.legs.iter().map(|leg| leg.duration_seconds).sum()
    }

    /// Iterates over every path point of every step, in route order.
    pub fn points(&self) -> impl Iterator<Item = &Coordinate> {
        self.legs
            .iter()
            .flat_map(|leg| leg.steps.iter())
            .flat_map(|step| step.path.iter())
    }

    /// Number of path points across all steps.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points().count()
    }

    /// Exports the route as a `GeoJSON` feature collection with one
    /// `LineString` per step.
    ///
    /// Steps with fewer than two points cannot form a line and are skipped.
    #[must_use]
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features = Vec::new();

        for (leg_index, leg) in self.legs.iter().enumerate() {
            for (step_index, step) in leg.steps.iter().enumerate() {
                if step.path.len() < 2 {
                    continue;
                }

                let line: geo::LineString<f64> =
                    step.path.iter().map(|c| (c.lng, c.lat)).collect();

                let mut properties = JsonObject::new();
                properties.insert("legIndex".to_string(), leg_index.into());
                properties.insert("stepIndex".to_string(), step_index.into());
                properties.insert("durationSeconds".to_string(), step.duration_seconds.into());

                features.push(Feature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::from(&line))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                });
            }
        }

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    /// Serializes [`Route::to_geojson`] to a `GeoJSON` string.
    #[must_use]
    pub fn to_geojson_string(&self) -> String {
        GeoJson::from(self.to_geojson()).to_string()
    }
}

/// Safety-adjusted cost of one route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteScore {
    /// Travel time plus incident penalties, in seconds.
    pub total_cost_seconds: f64,
    /// Number of path points that passed within the incident radius.
    /// Counts exposure, not distinct incidents.
    pub incidents_near_route: u32,
    /// Sum of leg durations in seconds.
    pub travel_time_seconds: f64,
}

/// The [`RouteScore`] attached to the chosen route for display.
///
/// Carried as `Option<SafetySummary>`: `None` means incidents were not
/// considered for this route.
pub type SafetySummary = RouteScore;
