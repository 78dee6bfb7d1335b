#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Safety incident types.
//!
//! An [`Incident`] is a read-only record produced by the incident feed.
//! Coordinates are optional: a report filed against a building without a
//! precise location is still a valid incident for display, it just cannot
//! take part in route scoring. Use [`incident_coordinates`] to get the
//! scoreable subset.

use chrono::{DateTime, Utc};
use safe_route_route_models::Coordinate;
use serde::{Deserialize, Serialize};

/// A safety incident as consumed by the routing core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Feed-assigned identifier.
    pub id: i64,
    /// Location of the incident. `None` if the report lacked a valid
    /// latitude/longitude.
    pub coordinate: Option<Coordinate>,
    /// Free-form category as entered by the reporter (e.g. "theft").
    pub category: String,
    /// Short title.
    pub title: String,
    /// When the report was filed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<DateTime<Utc>>,
    /// Building the report was filed against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_name: Option<String>,
    /// Room within the building.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
}

/// An incident report exactly as listed by the campus report endpoint.
///
/// `lat`/`lng` are independently nullable on the wire; both must be
/// present and form a valid [`Coordinate`] for the resulting
/// [`Incident`] to be scoreable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
    /// Report ID.
    pub id: i64,
    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created_at: Option<String>,
    /// Category.
    #[serde(default)]
    pub category: String,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Building name.
    #[serde(default)]
    pub building_name: Option<String>,
    /// Room number.
    #[serde(default)]
    pub room_number: Option<String>,
    /// Latitude.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude.
    #[serde(default)]
    pub lng: Option<f64>,
}

impl From<IncidentReport> for Incident {
    fn from(report: IncidentReport) -> Self {
        let coordinate = match (report.lat, report.lng) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng).ok(),
            _ => None,
        };

        Self {
            id: report.id,
            coordinate,
            category: report.category,
            title: report.title,
            reported_at: report.created_at.as_deref().and_then(parse_timestamp),
            building_name: report.building_name,
            room_number: report.room_number,
        }
    }
}

/// Parses either an RFC 3339 timestamp or a naive ISO 8601 one (assumed
/// UTC), which is what the report listing emits.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Returns the coordinates of every incident that has one, in feed order.
///
/// Incidents without a coordinate are dropped; they cannot be scored.
#[must_use]
pub fn incident_coordinates(incidents: &[Incident]) -> Vec<Coordinate> {
    incidents.iter().filter_map(|i| i.coordinate).collect()
}
