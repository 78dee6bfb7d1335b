//! The routing orchestrator worker.
//!
//! Inputs (origin, destination, device location, incidents) are held by an
//! [`OrchestratorHandle`]. Every change sends a full [`RouteInputs`]
//! snapshot to a single worker task, which decides what to do:
//!
//! | Inputs | Request | Published state |
//! |---|---|---|
//! | no destination, or no origin and no device location | none | nothing ([`RoutingState::Idle`]) |
//! | no scoreable incidents | primary route only | [`RoutingState::Direct`] |
//! | scoreable incidents | alternatives, then [`select_best`] | [`RoutingState::SafetyScored`] |
//! | provider returned no routes | as above | [`RoutingState::Unreachable`] |
//!
//! Each snapshot starts a new generation. Starting a generation aborts the
//! in-flight request of the previous one, and any result that still
//! arrives tagged with an older generation is dropped without being
//! reported. A request whose task panics is reported as
//! [`OrchestratorEvent::ProviderFailed`] like any other failure.

use std::sync::{Arc, Mutex, PoisonError};

use safe_route_incident_models::{Incident, incident_coordinates};
use safe_route_route_models::{Coordinate, Route, SafetySummary, Waypoint};
use safe_route_scoring::{
    GeoDistance, HaversineDistance, ScoringConfig, ScoringError, select_best,
};
use serde::Serialize;
use strum_macros::Display;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};

use crate::origin::{resolve_origin, resolve_origin_or_device};
use crate::{RouteOptions, RoutingError, RoutingProvider};

/// The last-known value of every signal the orchestrator reacts to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteInputs {
    /// Typed origin: `"lat, lng"` or a place name. May be blank.
    pub origin: String,
    /// Typed destination. Blank means idle.
    pub destination: String,
    /// Device position, used when `origin` is blank.
    pub device_location: Option<Coordinate>,
    /// Current incident set from the feed.
    pub incidents: Vec<Incident>,
}

/// Which branch of the orchestration produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingState {
    /// Not enough input to request a route.
    Idle,
    /// No scoreable incidents; the provider's primary route is used as-is.
    Direct,
    /// Alternatives were scored against incidents and the cheapest chosen.
    SafetyScored,
    /// The provider found no path.
    Unreachable,
}

/// A route result for the view layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePublication {
    /// Generation of the snapshot this result was computed from.
    pub generation: u64,
    /// How the result was obtained.
    pub state: RoutingState,
    /// Resolved origin.
    pub origin: Waypoint,
    /// Resolved destination.
    pub destination: Waypoint,
    /// The chosen route, or `None` when unreachable.
    pub route: Option<Route>,
    /// Safety summary of the chosen route, or `None` when incidents were
    /// not considered.
    pub safety: Option<SafetySummary>,
}

/// Output of the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorEvent {
    /// A new route result for the most recent inputs.
    Published(RoutePublication),
    /// The routing provider failed for the most recent inputs. Nothing is
    /// published, so the previous result stays current.
    ProviderFailed {
        /// Generation of the failed request.
        generation: u64,
        /// Human-readable failure description.
        message: String,
    },
}

/// A request the worker should issue for one snapshot.
#[derive(Debug, Clone, PartialEq)]
struct RouteRequest {
    origin: Waypoint,
    destination: Waypoint,
    incidents: Vec<Coordinate>,
}

/// Decides whether `inputs` warrant a provider request.
fn plan(inputs: &RouteInputs) -> Option<RouteRequest> {
    if inputs.destination.trim().is_empty() {
        return None;
    }
    let origin = resolve_origin_or_device(&inputs.origin, inputs.device_location)?;

    Some(RouteRequest {
        origin,
        destination: resolve_origin(&inputs.destination),
        incidents: incident_coordinates(&inputs.incidents),
    })
}

/// Runs one orchestration cycle against the provider.
async fn compute(
    provider: &dyn RoutingProvider,
    request: RouteRequest,
    config: &ScoringConfig,
    distance: Option<&dyn GeoDistance>,
    generation: u64,
) -> Result<RoutePublication, RoutingError> {
    let RouteRequest {
        origin,
        destination,
        incidents,
    } = request;

    let alternatives = !incidents.is_empty();
    let mut routes = provider
        .get_routes(&origin, &destination, RouteOptions { alternatives })
        .await?;

    let (state, route, safety) = if routes.is_empty() {
        (RoutingState::Unreachable, None, None)
    } else if alternatives {
        let selection = select_best(&routes, &incidents, config, distance)?;
        let (index, score) = (selection.index, selection.score);
        log::debug!(
            "Selected route {} of {} (score: {score:?})",
            index + 1,
            routes.len()
        );
        (
            RoutingState::SafetyScored,
            Some(routes.swap_remove(index)),
            score,
        )
    } else {
        (RoutingState::Direct, Some(routes.swap_remove(0)), None)
    };

    Ok(RoutePublication {
        generation,
        state,
        origin,
        destination,
        route,
        safety,
    })
}

/// Configures and spawns the orchestrator worker.
pub struct RoutingOrchestrator {
    provider: Arc<dyn RoutingProvider>,
    config: ScoringConfig,
    distance: Option<Arc<dyn GeoDistance>>,
}

impl RoutingOrchestrator {
    /// Creates an orchestrator that scores with haversine distance.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidConfig`] if `config` does not
    /// validate; a NaN or negative penalty would make every cost unordered.
    pub fn new(
        provider: Arc<dyn RoutingProvider>,
        config: ScoringConfig,
    ) -> Result<Self, ScoringError> {
        config.validate()?;
        Ok(Self {
            provider,
            config,
            distance: Some(Arc::new(HaversineDistance)),
        })
    }

    /// Replaces the distance capability. `None` selects travel-time-only
    /// ranking.
    #[must_use]
    pub fn with_distance(mut self, distance: Option<Arc<dyn GeoDistance>>) -> Self {
        self.distance = distance;
        self
    }

    /// Spawns the worker on the current tokio runtime.
    ///
    /// Returns the input handle, the event stream, and the worker's join
    /// handle. The worker exits once every [`OrchestratorHandle`] clone is
    /// dropped and the request in flight at that point (if any) has been
    /// published.
    #[must_use]
    pub fn spawn(
        self,
    ) -> (
        OrchestratorHandle,
        mpsc::UnboundedReceiver<OrchestratorEvent>,
        JoinHandle<()>,
    ) {
        let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let handle = OrchestratorHandle {
            inputs: Arc::new(Mutex::new(RouteInputs::default())),
            snapshots: snapshot_tx,
        };
        let worker = tokio::spawn(self.run(snapshot_rx, event_tx));

        (handle, event_rx, worker)
    }

    async fn run(
        self,
        mut snapshots: mpsc::UnboundedReceiver<RouteInputs>,
        events: mpsc::UnboundedSender<OrchestratorEvent>,
    ) {
        if self.distance.is_none() {
            log::warn!("No distance capability configured; routes are ranked by travel time only");
        }

        let (result_tx, mut results) =
            mpsc::unbounded_channel::<(u64, Result<RoutePublication, RoutingError>)>();

        let mut generation: u64 = 0;
        let mut in_flight: Option<AbortHandle> = None;
        let mut last_seen: Option<RouteInputs> = None;
        let mut accepting = true;

        loop {
            // Newer inputs are handled before pending results, so a result
            // that lands alongside a newer snapshot is already stale.
            tokio::select! {
                biased;

                snapshot = snapshots.recv(), if accepting => {
                    let Some(inputs) = snapshot else {
                        accepting = false;
                        if in_flight.is_none() {
                            break;
                        }
                        continue;
                    };

                    if last_seen.as_ref() == Some(&inputs) {
                        continue;
                    }

                    generation += 1;
                    if let Some(task) = in_flight.take() {
                        log::debug!("Generation {generation} supersedes in-flight request");
                        task.abort();
                    }

                    let Some(request) = plan(&inputs) else {
                        log::debug!("Generation {generation}: {}", RoutingState::Idle);
                        last_seen = Some(inputs);
                        continue;
                    };
                    last_seen = Some(inputs);

                    log::debug!(
                        "Generation {generation}: routing {} -> {} with {} incident(s)",
                        request.origin,
                        request.destination,
                        request.incidents.len()
                    );

                    let provider = Arc::clone(&self.provider);
                    let distance = self.distance.clone();
                    let config = self.config;
                    let tx = result_tx.clone();
                    let request_generation = generation;

                    let task = tokio::spawn(async move {
                        compute(
                            provider.as_ref(),
                            request,
                            &config,
                            distance.as_deref(),
                            request_generation,
                        )
                        .await
                    });
                    in_flight = Some(task.abort_handle());

                    // Reports the outcome, including a panic inside the
                    // provider. An aborted task reports nothing.
                    tokio::spawn(async move {
                        let result = match task.await {
                            Ok(result) => result,
                            Err(e) if e.is_cancelled() => return,
                            Err(e) => Err(RoutingError::TaskFailed {
                                message: e.to_string(),
                            }),
                        };
                        // The worker may already be gone; nothing to report to.
                        let _ = tx.send((request_generation, result));
                    });
                }
                Some((result_generation, result)) = results.recv() => {
                    if result_generation != generation {
                        log::debug!(
                            "Discarding result of superseded generation {result_generation}"
                        );
                        continue;
                    }
                    in_flight = None;

                    let event = match result {
                        Ok(publication) => {
                            log::info!(
                                "Generation {}: {} ({})",
                                publication.generation,
                                publication.state,
                                publication.safety.map_or_else(
                                    || "no safety summary".to_string(),
                                    |s| format!(
                                        "{} exposed point(s), cost {:.0}s",
                                        s.incidents_near_route, s.total_cost_seconds
                                    ),
                                )
                            );
                            OrchestratorEvent::Published(publication)
                        }
                        Err(e) => {
                            log::error!("Generation {generation}: routing failed: {e}");
                            OrchestratorEvent::ProviderFailed {
                                generation,
                                message: e.to_string(),
                            }
                        }
                    };

                    if events.send(event).is_err() {
                        log::debug!("Event receiver dropped, stopping orchestrator");
                        break;
                    }
                    if !accepting {
                        break;
                    }
                }
            }
        }

        if let Some(task) = in_flight {
            task.abort();
        }
    }
}

/// Input side of a running orchestrator.
///
/// Cheap to clone. Every setter updates the shared last-known inputs and,
/// if anything changed, sends the full snapshot to the worker.
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    inputs: Arc<Mutex<RouteInputs>>,
    snapshots: mpsc::UnboundedSender<RouteInputs>,
}

impl OrchestratorHandle {
    /// Sets the typed origin.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Closed`] if the worker has stopped.
    pub fn set_origin(&self, origin: impl Into<String>) -> Result<(), RoutingError> {
        let origin = origin.into();
        self.update(|inputs| inputs.origin = origin)
    }

    /// Sets the typed destination.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Closed`] if the worker has stopped.
    pub fn set_destination(&self, destination: impl Into<String>) -> Result<(), RoutingError> {
        let destination = destination.into();
        self.update(|inputs| inputs.destination = destination)
    }

    /// Sets or clears the device location.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Closed`] if the worker has stopped.
    pub fn set_device_location(&self, location: Option<Coordinate>) -> Result<(), RoutingError> {
        self.update(|inputs| inputs.device_location = location)
    }

    /// Replaces the incident set.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Closed`] if the worker has stopped.
    pub fn set_incidents(&self, incidents: Vec<Incident>) -> Result<(), RoutingError> {
        self.update(|inputs| inputs.incidents = incidents)
    }

    /// Replaces every input at once.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Closed`] if the worker has stopped.
    pub fn submit(&self, new_inputs: RouteInputs) -> Result<(), RoutingError> {
        self.update(|inputs| *inputs = new_inputs)
    }

    /// Returns a copy of the current inputs.
    #[must_use]
    pub fn snapshot(&self) -> RouteInputs {
        self.inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, apply: impl FnOnce(&mut RouteInputs)) -> Result<(), RoutingError> {
        let mut inputs = self.inputs.lock().unwrap_or_else(PoisonError::into_inner);
        let before = inputs.clone();
        apply(&mut inputs);
        if *inputs == before {
            return Ok(());
        }
        // Sent under the lock so snapshots reach the worker in update order.
        self.snapshots
            .send(inputs.clone())
            .map_err(|_| RoutingError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use safe_route_route_models::{RouteLeg, Step};
    use tokio::sync::Notify;

    use super::*;
    use crate::ProviderError;

    const CAMPUS: Coordinate = Coordinate {
        lat: 43.6577,
        lng: -79.3788,
    };

    fn incident(id: i64, coordinate: Option<Coordinate>) -> Incident {
        Incident {
            id,
            coordinate,
            category: "theft".to_string(),
            title: format!("Incident {id}"),
            reported_at: None,
            building_name: None,
            room_number: None,
        }
    }

    fn route(label: &str, duration_seconds: f64, path: Vec<Coordinate>) -> Route {
        Route {
            legs: vec![RouteLeg {
                steps: vec![Step {
                    path,
                    duration_seconds,
                }],
                duration_seconds,
            }],
            summary: Some(label.to_string()),
        }
    }

    /// Fast route passes straight over the campus incident; the detour
    /// stays ~1 km away.
    fn fast_and_detour() -> Vec<Route> {
        vec![
            route("fast", 500.0, vec![CAMPUS, CAMPUS, CAMPUS]),
            route(
                "detour",
                600.0,
                vec![Coordinate {
                    lat: CAMPUS.lat + 0.01,
                    lng: CAMPUS.lng,
                }],
            ),
        ]
    }

    #[derive(Default)]
    struct FakeProvider {
        calls: AtomicUsize,
        alternatives_requested: Mutex<Vec<bool>>,
        origins: Mutex<Vec<Waypoint>>,
        /// Requests to this destination block forever.
        stall_destination: Option<String>,
        stalled: Notify,
        fail: bool,
        panic: bool,
        unreachable: bool,
        /// Runs once, just before the next successful response.
        before_return: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    }

    #[async_trait]
    impl RoutingProvider for FakeProvider {
        async fn get_routes(
            &self,
            origin: &Waypoint,
            destination: &Waypoint,
            options: RouteOptions,
        ) -> Result<Vec<Route>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.alternatives_requested
                .lock()
                .unwrap()
                .push(options.alternatives);
            self.origins.lock().unwrap().push(origin.clone());

            if let (Some(stall), Waypoint::Place(name)) = (&self.stall_destination, destination)
                && stall == name
            {
                self.stalled.notify_one();
                std::future::pending::<()>().await;
            }
            assert!(!self.panic, "provider bug");
            if self.fail {
                return Err(ProviderError::Unavailable {
                    message: "connection refused".to_string(),
                });
            }
            if self.unreachable {
                return Ok(vec![]);
            }

            let mut routes = fast_and_detour();
            if !options.alternatives {
                routes.truncate(1);
            }
            let hook = self.before_return.lock().unwrap().take();
            if let Some(hook) = hook {
                hook();
            }
            Ok(routes)
        }
    }

    async fn next_event(
        events: &mut mpsc::UnboundedReceiver<OrchestratorEvent>,
    ) -> OrchestratorEvent {
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for orchestrator event")
            .expect("orchestrator stopped without an event")
    }

    async fn next_publication(
        events: &mut mpsc::UnboundedReceiver<OrchestratorEvent>,
    ) -> RoutePublication {
        match next_event(events).await {
            OrchestratorEvent::Published(p) => p,
            other => panic!("expected publication, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_incidents_requests_single_direct_route() {
        let provider = Arc::new(FakeProvider::default());
        let (handle, mut events, _worker) =
            RoutingOrchestrator::new(provider.clone(), ScoringConfig::default())
                .unwrap()
                .spawn();

        handle
            .submit(RouteInputs {
                origin: "Library".to_string(),
                destination: "Gym".to_string(),
                ..RouteInputs::default()
            })
            .unwrap();

        let publication = next_publication(&mut events).await;
        assert_eq!(publication.state, RoutingState::Direct);
        assert!(publication.safety.is_none());
        assert_eq!(
            publication.route.unwrap().summary.as_deref(),
            Some("fast")
        );
        assert_eq!(*provider.alternatives_requested.lock().unwrap(), vec![false]);
    }

    #[tokio::test]
    async fn incidents_trigger_alternatives_and_scoring() {
        let provider = Arc::new(FakeProvider::default());
        let (handle, mut events, _worker) =
            RoutingOrchestrator::new(provider.clone(), ScoringConfig::default())
                .unwrap()
                .spawn();

        handle
            .submit(RouteInputs {
                origin: "43.6500, -79.3800".to_string(),
                destination: "Gym".to_string(),
                device_location: None,
                incidents: vec![incident(1, Some(CAMPUS)), incident(2, None)],
            })
            .unwrap();

        let publication = next_publication(&mut events).await;
        assert_eq!(publication.state, RoutingState::SafetyScored);
        assert_eq!(
            publication.route.as_ref().unwrap().summary.as_deref(),
            Some("detour")
        );
        let safety = publication.safety.unwrap();
        assert_eq!(safety.incidents_near_route, 0);
        assert!((safety.total_cost_seconds - 600.0).abs() < f64::EPSILON);
        assert_eq!(
            publication.origin,
            Waypoint::Coordinate(Coordinate {
                lat: 43.65,
                lng: -79.38
            })
        );
        assert_eq!(*provider.alternatives_requested.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn incidents_without_coordinates_route_directly() {
        let provider = Arc::new(FakeProvider::default());
        let (handle, mut events, _worker) =
            RoutingOrchestrator::new(provider.clone(), ScoringConfig::default())
                .unwrap()
                .spawn();

        handle
            .submit(RouteInputs {
                origin: "Library".to_string(),
                destination: "Gym".to_string(),
                device_location: None,
                incidents: vec![incident(1, None), incident(2, None)],
            })
            .unwrap();

        let publication = next_publication(&mut events).await;
        assert_eq!(publication.state, RoutingState::Direct);
        assert!(publication.safety.is_none());
    }

    #[tokio::test]
    async fn empty_provider_result_is_unreachable() {
        let provider = Arc::new(FakeProvider {
            unreachable: true,
            ..FakeProvider::default()
        });
        let (handle, mut events, _worker) =
            RoutingOrchestrator::new(provider, ScoringConfig::default())
                .unwrap()
                .spawn();

        handle
            .submit(RouteInputs {
                origin: "Library".to_string(),
                destination: "Island".to_string(),
                device_location: None,
                incidents: vec![incident(1, Some(CAMPUS))],
            })
            .unwrap();

        let publication = next_publication(&mut events).await;
        assert_eq!(publication.state, RoutingState::Unreachable);
        assert!(publication.route.is_none());
        assert!(publication.safety.is_none());
    }

    #[tokio::test]
    async fn idle_inputs_issue_no_request() {
        let provider = Arc::new(FakeProvider::default());
        let (handle, mut events, _worker) =
            RoutingOrchestrator::new(provider.clone(), ScoringConfig::default())
                .unwrap()
                .spawn();

        // Origin without destination, then destination without origin.
        handle.set_origin("Library").unwrap();
        handle.set_origin("").unwrap();
        handle.set_destination("Gym").unwrap();
        // Device location completes the inputs.
        handle.set_device_location(Some(CAMPUS)).unwrap();

        let publication = next_publication(&mut events).await;
        assert_eq!(publication.generation, 4);
        assert_eq!(publication.origin, Waypoint::Coordinate(CAMPUS));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *provider.origins.lock().unwrap(),
            vec![Waypoint::Coordinate(CAMPUS)]
        );
    }

    #[tokio::test]
    async fn provider_failure_is_reported_not_published() {
        let provider = Arc::new(FakeProvider {
            fail: true,
            ..FakeProvider::default()
        });
        let (handle, mut events, worker) =
            RoutingOrchestrator::new(provider, ScoringConfig::default())
                .unwrap()
                .spawn();

        handle
            .submit(RouteInputs {
                origin: "Library".to_string(),
                destination: "Gym".to_string(),
                ..RouteInputs::default()
            })
            .unwrap();

        match next_event(&mut events).await {
            OrchestratorEvent::ProviderFailed {
                generation,
                message,
            } => {
                assert_eq!(generation, 1);
                assert!(message.contains("connection refused"), "{message}");
            }
            other @ OrchestratorEvent::Published(_) => panic!("unexpected {other:?}"),
        }

        drop(handle);
        worker.await.unwrap();
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn newer_inputs_supersede_in_flight_request() {
        let provider = Arc::new(FakeProvider {
            stall_destination: Some("Slow Hall".to_string()),
            ..FakeProvider::default()
        });
        let (handle, mut events, worker) =
            RoutingOrchestrator::new(provider.clone(), ScoringConfig::default())
                .unwrap()
                .spawn();

        handle.set_origin("Library").unwrap();
        handle.set_destination("Slow Hall").unwrap();
        provider.stalled.notified().await;

        handle.set_destination("Gym").unwrap();

        let publication = next_publication(&mut events).await;
        assert_eq!(publication.generation, 3);
        assert_eq!(publication.destination, Waypoint::Place("Gym".to_string()));

        drop(handle);
        worker.await.unwrap();
        assert!(
            events.recv().await.is_none(),
            "superseded request must not publish"
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn result_arriving_after_newer_inputs_is_discarded() {
        let provider = Arc::new(FakeProvider::default());
        let (handle, mut events, worker) =
            RoutingOrchestrator::new(provider.clone(), ScoringConfig::default())
                .unwrap()
                .spawn();

        // The first request finishes only after the destination has
        // already moved on, so its result reaches the worker stale.
        let newer = handle.clone();
        *provider.before_return.lock().unwrap() = Some(Box::new(move || {
            newer.set_destination("Gym").unwrap();
        }));

        handle
            .submit(RouteInputs {
                origin: "Library".to_string(),
                destination: "Science Hall".to_string(),
                ..RouteInputs::default()
            })
            .unwrap();

        let publication = next_publication(&mut events).await;
        assert_eq!(publication.generation, 2);
        assert_eq!(publication.destination, Waypoint::Place("Gym".to_string()));

        drop(handle);
        worker.await.unwrap();
        assert!(events.recv().await.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn panicking_provider_is_reported_and_worker_exits() {
        let provider = Arc::new(FakeProvider {
            panic: true,
            ..FakeProvider::default()
        });
        let (handle, mut events, worker) =
            RoutingOrchestrator::new(provider, ScoringConfig::default())
                .unwrap()
                .spawn();

        handle
            .submit(RouteInputs {
                origin: "Library".to_string(),
                destination: "Gym".to_string(),
                ..RouteInputs::default()
            })
            .unwrap();
        drop(handle);

        match next_event(&mut events).await {
            OrchestratorEvent::ProviderFailed {
                generation,
                message,
            } => {
                assert_eq!(generation, 1);
                assert!(message.contains("panicked"), "{message}");
            }
            other @ OrchestratorEvent::Published(_) => panic!("unexpected {other:?}"),
        }

        tokio::time::timeout(Duration::from_secs(5), worker)
            .await
            .expect("worker did not exit")
            .unwrap();
        assert!(events.recv().await.is_none());
    }

    #[test]
    fn rejects_invalid_scoring_config() {
        let config = ScoringConfig {
            penalty_seconds_per_incident: f64::NAN,
            ..ScoringConfig::default()
        };
        let result = RoutingOrchestrator::new(Arc::new(FakeProvider::default()), config);
        assert!(matches!(result, Err(ScoringError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn unchanged_inputs_do_not_recompute() {
        let provider = Arc::new(FakeProvider::default());
        let (handle, mut events, worker) =
            RoutingOrchestrator::new(provider.clone(), ScoringConfig::default())
                .unwrap()
                .spawn();

        let incidents = vec![incident(1, Some(CAMPUS))];
        handle.set_origin("Library").unwrap();
        handle.set_destination("Gym").unwrap();
        let _ = next_publication(&mut events).await;

        handle.set_incidents(incidents.clone()).unwrap();
        let _ = next_publication(&mut events).await;
        handle.set_incidents(incidents).unwrap();
        handle.set_destination("Gym").unwrap();

        drop(handle);
        worker.await.unwrap();
        assert!(events.recv().await.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn without_distance_capability_ranks_by_travel_time() {
        let provider = Arc::new(FakeProvider::default());
        let (handle, mut events, _worker) =
            RoutingOrchestrator::new(provider, ScoringConfig::default())
                .unwrap()
                .with_distance(None)
                .spawn();

        handle
            .submit(RouteInputs {
                origin: "Library".to_string(),
                destination: "Gym".to_string(),
                device_location: None,
                incidents: vec![incident(1, Some(CAMPUS))],
            })
            .unwrap();

        let publication = next_publication(&mut events).await;
        assert_eq!(publication.state, RoutingState::SafetyScored);
        assert_eq!(
            publication.route.unwrap().summary.as_deref(),
            Some("fast")
        );
        assert_eq!(publication.safety.unwrap().incidents_near_route, 0);
    }

    #[test]
    fn plan_requires_destination_and_some_origin() {
        assert!(plan(&RouteInputs::default()).is_none());
        assert!(
            plan(&RouteInputs {
                origin: "Library".to_string(),
                destination: "   ".to_string(),
                ..RouteInputs::default()
            })
            .is_none()
        );
        assert!(
            plan(&RouteInputs {
                destination: "Gym".to_string(),
                ..RouteInputs::default()
            })
            .is_none()
        );

        let request = plan(&RouteInputs {
            origin: "Library".to_string(),
            destination: "43.66, -79.38".to_string(),
            device_location: None,
            incidents: vec![incident(1, Some(CAMPUS)), incident(2, None)],
        })
        .unwrap();
        assert_eq!(request.origin, Waypoint::Place("Library".to_string()));
        assert_eq!(
            request.destination,
            Waypoint::Coordinate(Coordinate {
                lat: 43.66,
                lng: -79.38
            })
        );
        assert_eq!(request.incidents, vec![CAMPUS]);
    }
}
