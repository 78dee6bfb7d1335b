#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident-aware routing orchestration.
//!
//! Ties the pure scoring core to its two external collaborators:
//!
//! - a [`RoutingProvider`] that returns geometric route alternatives
//!   between two waypoints, and
//! - an [`IncidentFeed`] that lists currently active incident reports.
//!
//! The [`orchestrator`] re-derives the route every time the origin,
//! destination, device location, or incident set changes. Inputs arrive
//! as snapshots on a channel and are consumed by a single worker task;
//! a newer snapshot supersedes whatever request is still in flight.

pub mod origin;
pub mod orchestrator;
pub mod poller;

use async_trait::async_trait;
use safe_route_incident_models::Incident;
use safe_route_route_models::{Route, Waypoint};
use safe_route_scoring::ScoringError;
use thiserror::Error;

pub use orchestrator::{
    OrchestratorEvent, OrchestratorHandle, RouteInputs, RoutePublication, RoutingOrchestrator,
    RoutingState,
};
pub use origin::resolve_origin;

/// Errors reported by a [`RoutingProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider could not be reached or failed to answer.
    #[error("routing provider unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The provider answered with something that could not be understood.
    #[error("routing provider response could not be parsed: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// A place-name waypoint could not be located.
    #[error("unknown place: {name}")]
    UnknownPlace {
        /// The place name as given.
        name: String,
    },
}

/// Errors reported by an [`IncidentFeed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The feed could not be reached or failed to answer.
    #[error("incident feed unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The feed answered with a body that could not be parsed.
    #[error("incident feed response could not be parsed: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors from one orchestration cycle or from talking to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The routing provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Route selection failed.
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// The routing task ended abnormally, for example by panicking inside
    /// the provider.
    #[error("routing task failed: {message}")]
    TaskFailed {
        /// Description of the failure.
        message: String,
    },

    /// The orchestrator worker has stopped and no longer accepts input.
    #[error("routing orchestrator is closed")]
    Closed,
}

/// Per-request options for [`RoutingProvider::get_routes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteOptions {
    /// Ask the provider for alternative routes in addition to its primary
    /// one.
    pub alternatives: bool,
}

/// A source of walking routes between two waypoints.
///
/// Implementations return routes in the provider's preference order (the
/// primary route first) and return an empty list when no path exists.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Fetches routes from `origin` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the provider cannot be reached, its
    /// response cannot be parsed, or a place name cannot be located.
    async fn get_routes(
        &self,
        origin: &Waypoint,
        destination: &Waypoint,
        options: RouteOptions,
    ) -> Result<Vec<Route>, ProviderError>;
}

/// A source of currently active incident reports.
#[async_trait]
pub trait IncidentFeed: Send + Sync {
    /// Lists active incidents.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] on transient fetch or parse failures. Callers
    /// keep their last known incident set in that case.
    async fn list_incidents(&self) -> Result<Vec<Incident>, FeedError>;
}
