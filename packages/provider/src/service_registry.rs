//! Compile-time registry of provider service configurations.
//!
//! Each routing or incident service is defined in a TOML file under
//! `services/`. The registry embeds these at compile time and exposes them
//! via [`all_services`] and [`enabled_services`].

use serde::Deserialize;

/// A provider service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderService {
    /// Unique identifier (e.g., `"osrm_foot"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be picked as a default.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Preference order within a kind; lower values win.
    pub priority: u32,
    /// Service-specific configuration.
    pub provider: ServiceConfig,
}

/// Service-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceConfig {
    /// OSRM-compatible routing server.
    Osrm {
        /// Server base URL, without the `/route/v1` suffix.
        base_url: String,
        /// Routing profile segment of the URL (e.g., `"foot"`).
        #[serde(default = "default_profile")]
        profile: String,
    },
    /// Campus incident report listing.
    IncidentReports {
        /// Listing URL.
        base_url: String,
        /// How often the listing is re-fetched when watching.
        #[serde(default = "default_poll_interval")]
        poll_interval_secs: u64,
    },
}

const fn default_true() -> bool {
    true
}

fn default_profile() -> String {
    "foot".to_string()
}

const fn default_poll_interval() -> u64 {
    60
}

impl ProviderService {
    /// Returns the service's base URL regardless of variant.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ServiceConfig::Osrm { base_url, .. }
            | ServiceConfig::IncidentReports { base_url, .. } => base_url,
        }
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("osrm", include_str!("../services/osrm.toml")),
    (
        "campus_incidents",
        include_str!("../services/campus_incidents.toml"),
    ),
];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 2;

/// Returns all service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<ProviderService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse provider service '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled services, sorted by priority (ascending).
#[must_use]
pub fn enabled_services() -> Vec<ProviderService> {
    let mut services: Vec<ProviderService> =
        all_services().into_iter().filter(|s| s.enabled).collect();
    services.sort_by_key(|s| s.priority);
    services
}

/// The highest-priority enabled routing service.
#[must_use]
pub fn default_routing_service() -> Option<ProviderService> {
    enabled_services()
        .into_iter()
        .find(|s| matches!(s.provider, ServiceConfig::Osrm { .. }))
}

/// The highest-priority enabled incident service.
#[must_use]
pub fn default_incident_service() -> Option<ProviderService> {
    enabled_services()
        .into_iter()
        .find(|s| matches!(s.provider, ServiceConfig::IncidentReports { .. }))
}
