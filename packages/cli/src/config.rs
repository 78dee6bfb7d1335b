//! Application configuration.
//!
//! Loaded from an optional TOML file, then overridden from the
//! environment:
//!
//! ```toml
//! [scoring]
//! radius_meters = 80.0
//! penalty_seconds_per_incident = 900.0
//!
//! [routing]
//! base_url = "https://routing.openstreetmap.de/routed-foot"
//! profile = "foot"
//! places_file = "places.toml"
//!
//! [incidents]
//! base_url = "http://127.0.0.1:5000/api/report-incidents/"
//! poll_interval_secs = 60
//! ```
//!
//! Unset endpoints fall back to the embedded service registry.

use std::path::{Path, PathBuf};
use std::time::Duration;

use safe_route_provider::service_registry::{
    ServiceConfig, default_incident_service, default_routing_service,
};
use safe_route_provider::{ConfigError, PlaceDirectory};
use safe_route_scoring::ScoringConfig;
use serde::Deserialize;

/// Overrides `scoring.radius_meters`.
pub const ENV_RADIUS: &str = "SAFE_ROUTE_RADIUS_METERS";
/// Overrides `scoring.penalty_seconds_per_incident`.
pub const ENV_PENALTY: &str = "SAFE_ROUTE_PENALTY_SECONDS";
/// Overrides `routing.base_url`.
pub const ENV_OSRM_URL: &str = "SAFE_ROUTE_OSRM_URL";
/// Overrides `incidents.base_url`.
pub const ENV_INCIDENTS_URL: &str = "SAFE_ROUTE_INCIDENTS_URL";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Proximity scoring parameters.
    pub scoring: ScoringConfig,
    /// Routing provider endpoint.
    pub routing: RoutingSection,
    /// Incident feed endpoint.
    pub incidents: IncidentsSection,
}

/// `[routing]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoutingSection {
    /// OSRM base URL.
    pub base_url: Option<String>,
    /// OSRM profile.
    pub profile: Option<String>,
    /// Place directory TOML; the embedded campus directory when unset.
    pub places_file: Option<PathBuf>,
}

/// `[incidents]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IncidentsSection {
    /// Report listing URL.
    pub base_url: Option<String>,
    /// Poll interval for `watch`.
    pub poll_interval_secs: Option<u64>,
}

impl AppConfig {
    /// Parses configuration from TOML text without applying the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid TOML for this shape
    /// or holds invalid values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration file (if any) and applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or an
    /// override is not a valid value.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                toml::from_str(&std::fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides looked up by environment variable name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric override does not
    /// parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_RADIUS) {
            self.scoring.radius_meters = parse_number(ENV_RADIUS, &value)?;
        }
        if let Some(value) = lookup(ENV_PENALTY) {
            self.scoring.penalty_seconds_per_incident = parse_number(ENV_PENALTY, &value)?;
        }
        if let Some(value) = lookup(ENV_OSRM_URL) {
            self.routing.base_url = Some(value);
        }
        if let Some(value) = lookup(ENV_INCIDENTS_URL) {
            self.incidents.base_url = Some(value);
        }
        Ok(())
    }

    /// Checks scoring parameters and the poll interval.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate().map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })?;
        if self.incidents.poll_interval_secs == Some(0) {
            return Err(ConfigError::Invalid {
                message: "incidents.poll_interval_secs must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// OSRM base URL and profile, falling back to the default routing
    /// service.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if neither the configuration nor
    /// the registry names a routing endpoint.
    pub fn routing_endpoint(&self) -> Result<(String, String), ConfigError> {
        let (default_url, default_profile) = match default_routing_service().map(|s| s.provider)
        {
            Some(ServiceConfig::Osrm { base_url, profile }) => (Some(base_url), Some(profile)),
            _ => (None, None),
        };

        let base_url = self
            .routing
            .base_url
            .clone()
            .or(default_url)
            .ok_or_else(|| ConfigError::Invalid {
                message: "no routing endpoint configured".to_string(),
            })?;
        let profile = self
            .routing
            .profile
            .clone()
            .or(default_profile)
            .unwrap_or_else(|| "foot".to_string());

        Ok((base_url, profile))
    }

    /// Incident listing URL and poll interval, falling back to the default
    /// incident service.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if neither the configuration nor
    /// the registry names an incident endpoint.
    pub fn incidents_endpoint(&self) -> Result<(String, Duration), ConfigError> {
        let (default_url, default_interval) =
            match default_incident_service().map(|s| s.provider) {
                Some(ServiceConfig::IncidentReports {
                    base_url,
                    poll_interval_secs,
                }) => (Some(base_url), Some(poll_interval_secs)),
                _ => (None, None),
            };

        let base_url = self
            .incidents
            .base_url
            .clone()
            .or(default_url)
            .ok_or_else(|| ConfigError::Invalid {
                message: "no incident feed configured".to_string(),
            })?;
        let secs = self
            .incidents
            .poll_interval_secs
            .or(default_interval)
            .unwrap_or(60);

        Ok((base_url, Duration::from_secs(secs)))
    }

    /// The configured place directory, or the embedded campus one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configured file cannot be loaded.
    pub fn places(&self) -> Result<PlaceDirectory, ConfigError> {
        self.routing
            .places_file
            .as_deref()
            .map_or_else(|| Ok(PlaceDirectory::embedded()), PlaceDirectory::load)
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        message: format!("{key} must be a number, got '{value}'"),
    })
}
