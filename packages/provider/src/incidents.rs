//! Campus incident report listing client.
//!
//! The listing endpoint returns a bare JSON array of report objects. Each
//! report is converted into an [`Incident`]; reports whose coordinates are
//! missing or invalid are kept but carry no coordinate.

use async_trait::async_trait;
use safe_route_incident_models::{Incident, IncidentReport};
use safe_route_routing::{FeedError, IncidentFeed};

use crate::retry;

/// Incident feed backed by an HTTP listing endpoint.
#[derive(Debug, Clone)]
pub struct HttpIncidentFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpIncidentFeed {
    /// Creates a feed reading from `url`.
    #[must_use]
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl IncidentFeed for HttpIncidentFeed {
    async fn list_incidents(&self) -> Result<Vec<Incident>, FeedError> {
        let body = retry::send_json(|| self.client.get(&self.url)).await?;
        let incidents = parse_incidents(body)?;

        let located = incidents.iter().filter(|i| i.coordinate.is_some()).count();
        log::debug!(
            "Fetched {} incident(s) from {} ({located} with coordinates)",
            incidents.len(),
            self.url
        );

        Ok(incidents)
    }
}

/// Converts a listing response body into incidents, in listing order.
///
/// # Errors
///
/// Returns [`FeedError::Parse`] if the body is not an array of reports.
pub fn parse_incidents(body: serde_json::Value) -> Result<Vec<Incident>, FeedError> {
    let reports: Vec<IncidentReport> =
        serde_json::from_value(body).map_err(|e| FeedError::Parse {
            message: e.to_string(),
        })?;
    Ok(reports.into_iter().map(Incident::from).collect())
}
