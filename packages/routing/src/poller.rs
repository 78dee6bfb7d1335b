//! Periodic incident refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::{IncidentFeed, OrchestratorHandle, RoutingError};

/// Fetches incidents once and hands them to the orchestrator.
///
/// A feed failure is logged and leaves the last known incident set in
/// place. Returns whether the fetch succeeded.
///
/// # Errors
///
/// Returns [`RoutingError::Closed`] if the orchestrator has stopped.
pub async fn refresh_incidents(
    feed: &dyn IncidentFeed,
    handle: &OrchestratorHandle,
) -> Result<bool, RoutingError> {
    match feed.list_incidents().await {
        Ok(incidents) => {
            log::debug!("Incident feed returned {} incident(s)", incidents.len());
            handle.set_incidents(incidents)?;
            Ok(true)
        }
        Err(e) => {
            log::warn!(
                "Incident feed fetch failed, keeping {} known incident(s): {e}",
                handle.snapshot().incidents.len()
            );
            Ok(false)
        }
    }
}

/// Polls `feed` every `interval` until the orchestrator stops.
///
/// The first fetch happens immediately.
///
/// # Errors
///
/// Returns [`RoutingError::Closed`] once the orchestrator no longer
/// accepts input.
pub async fn poll_incidents(
    feed: Arc<dyn IncidentFeed>,
    handle: OrchestratorHandle,
    interval: Duration,
) -> Result<(), RoutingError> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        refresh_incidents(feed.as_ref(), &handle).await?;
    }
}
