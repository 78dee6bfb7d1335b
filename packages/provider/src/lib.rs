#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP implementations of the routing collaborators.
//!
//! - [`osrm::OsrmRoutingProvider`]: walking routes from an OSRM-compatible
//!   `/route/v1` endpoint. Place names are resolved through a
//!   [`places::PlaceDirectory`] first.
//! - [`incidents::HttpIncidentFeed`]: the campus incident report listing.
//!
//! Endpoints default to the services embedded from `services/` (see
//! [`service_registry`]). Every request goes through [`retry`].

pub mod incidents;
pub mod osrm;
pub mod places;
pub mod retry;
pub mod service_registry;

use std::time::Duration;

use safe_route_routing::{FeedError, ProviderError};
use thiserror::Error;

pub use incidents::HttpIncidentFeed;
pub use osrm::OsrmRoutingProvider;
pub use places::PlaceDirectory;

/// Per-request timeout for provider HTTP calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the HTTP layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-retryable or exhausted error status.
    #[error("HTTP {status}")]
    Status {
        /// Response status code.
        status: u16,
        /// Response body, if it could be read.
        body: Option<String>,
    },

    /// Response body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ClientError> for ProviderError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Json(e) => Self::Parse {
                message: e.to_string(),
            },
            other => Self::Unavailable {
                message: other.to_string(),
            },
        }
    }
}

impl From<ClientError> for FeedError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Json(e) => Self::Parse {
                message: e.to_string(),
            },
            other => Self::Unavailable {
                message: other.to_string(),
            },
        }
    }
}

/// Errors loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid TOML for the expected shape.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// File parsed but holds unusable values.
    #[error("invalid configuration: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },
}

/// Builds the shared HTTP client.
///
/// # Errors
///
/// Returns [`ClientError::Http`] if the TLS backend cannot be initialised.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("safe_route/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
