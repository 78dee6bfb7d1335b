//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use safe_route_incident_models::{Incident, IncidentReport, incident_coordinates};
use safe_route_provider::{
    DEFAULT_TIMEOUT, HttpIncidentFeed, OsrmRoutingProvider, build_client,
};
use safe_route_route_models::{Coordinate, Route};
use safe_route_routing::origin::resolve_origin;
use safe_route_routing::poller::poll_incidents;
use safe_route_routing::{
    IncidentFeed, OrchestratorEvent, OrchestratorHandle, RouteInputs, RoutePublication,
    RoutingOrchestrator,
};
use safe_route_scoring::selector::score_all;
use safe_route_scoring::{HaversineDistance, select_best};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::AppConfig;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Origin, destination and device position for `route` and `watch`.
pub struct RouteRequest {
    pub origin: String,
    pub destination: String,
    pub device_location: Option<Coordinate>,
}

impl RouteRequest {
    fn into_inputs(self, incidents: Vec<Incident>) -> RouteInputs {
        RouteInputs {
            origin: self.origin,
            destination: self.destination,
            device_location: self.device_location,
            incidents,
        }
    }
}

/// Validates `--lat`/`--lng` into a coordinate.
///
/// # Errors
///
/// Returns an error if the pair is out of range.
pub fn device_location(lat: Option<f64>, lng: Option<f64>) -> CliResult<Option<Coordinate>> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(Some(Coordinate::new(lat, lng)?)),
        _ => Ok(None),
    }
}

/// `resolve`: prints the waypoint an input string resolves to.
///
/// # Errors
///
/// Returns an error if the waypoint cannot be serialized.
pub fn resolve(input: &str) -> CliResult<()> {
    let waypoint = resolve_origin(input);
    println!("{}", serde_json::to_string_pretty(&waypoint)?);
    Ok(())
}

/// `score`: scores routes from a file and prints every score plus the
/// selection.
///
/// # Errors
///
/// Returns an error if either file cannot be read or parsed, or the route
/// file holds no routes.
pub fn score(config: &AppConfig, routes_path: &Path, incidents_path: &Path) -> CliResult<()> {
    let routes: Vec<Route> = serde_json::from_str(&std::fs::read_to_string(routes_path)?)?;
    let incidents = read_incidents(incidents_path)?;
    let coordinates = incident_coordinates(&incidents);

    log::info!(
        "Scoring {} route(s) against {} located incident(s) (radius {} m, penalty {} s)",
        routes.len(),
        coordinates.len(),
        config.scoring.radius_meters,
        config.scoring.penalty_seconds_per_incident
    );

    let distance = HaversineDistance;
    let scores = score_all(&routes, &coordinates, &config.scoring, Some(&distance));
    let selection = select_best(&routes, &coordinates, &config.scoring, Some(&distance))?;

    let output = serde_json::json!({
        "scores": scores,
        "selectedIndex": selection.index,
        "selectedScore": selection.score,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// `route`: runs one orchestration cycle and prints its result.
///
/// # Errors
///
/// Returns an error if configuration is unusable, the inputs are idle, or
/// the routing provider fails.
pub async fn route(
    config: &AppConfig,
    request: RouteRequest,
    incidents_path: Option<&Path>,
    geojson: bool,
) -> CliResult<()> {
    let client = build_client(DEFAULT_TIMEOUT)?;

    let incidents = if let Some(path) = incidents_path {
        read_incidents(path)?
    } else {
        let (url, _) = config.incidents_endpoint()?;
        let feed = HttpIncidentFeed::new(client.clone(), &url);
        match feed.list_incidents().await {
            Ok(incidents) => incidents,
            Err(e) => {
                log::warn!("Incident feed unavailable, routing without incidents: {e}");
                Vec::new()
            }
        }
    };

    let (handle, mut events, worker) = spawn_orchestrator(config, client)?;
    handle.submit(request.into_inputs(incidents))?;
    drop(handle);

    let mut published = None;
    while let Some(event) = events.recv().await {
        match event {
            OrchestratorEvent::Published(publication) => published = Some(publication),
            OrchestratorEvent::ProviderFailed { message, .. } => {
                return Err(format!("routing failed: {message}").into());
            }
        }
    }
    worker.await?;

    let Some(publication) = published else {
        return Err("nothing to route: a destination and an origin (or --lat/--lng) are required"
            .into());
    };

    if geojson {
        match &publication.route {
            Some(route) => println!("{}", route.to_geojson_string()),
            None => return Err(format!("no route found ({})", publication.state).into()),
        }
    } else {
        print_publication(&publication)?;
    }

    Ok(())
}

/// `watch`: keeps the route current while polling incidents, until
/// Ctrl-C.
///
/// # Errors
///
/// Returns an error if configuration is unusable or the orchestrator stops
/// unexpectedly.
pub async fn watch(config: &AppConfig, request: RouteRequest) -> CliResult<()> {
    let client = build_client(DEFAULT_TIMEOUT)?;
    let (url, interval) = config.incidents_endpoint()?;
    let feed: Arc<dyn IncidentFeed> = Arc::new(HttpIncidentFeed::new(client.clone(), &url));

    let (handle, mut events, worker) = spawn_orchestrator(config, client)?;
    handle.submit(request.into_inputs(Vec::new()))?;

    log::info!("Watching incidents from {url} every {interval:?}; press Ctrl-C to stop");
    let poller = tokio::spawn(poll_incidents(feed, handle.clone(), interval));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Stopping");
                break;
            }
            event = events.recv() => match event {
                Some(OrchestratorEvent::Published(publication)) => print_publication(&publication)?,
                Some(OrchestratorEvent::ProviderFailed { generation, message }) => {
                    log::error!("Route #{generation} failed, keeping previous route: {message}");
                }
                None => break,
            },
        }
    }

    poller.abort();
    drop(handle);
    worker.abort();
    Ok(())
}

fn spawn_orchestrator(
    config: &AppConfig,
    client: reqwest::Client,
) -> CliResult<(
    OrchestratorHandle,
    UnboundedReceiver<OrchestratorEvent>,
    tokio::task::JoinHandle<()>,
)> {
    let (base_url, profile) = config.routing_endpoint()?;
    let places = config.places()?;
    log::debug!(
        "Routing via {base_url} (profile {profile}, {} place name(s))",
        places.len()
    );

    let provider = OsrmRoutingProvider::new(client, &base_url, &profile, places);
    Ok(RoutingOrchestrator::new(Arc::new(provider), config.scoring)?.spawn())
}

fn read_incidents(path: &Path) -> CliResult<Vec<Incident>> {
    let reports: Vec<IncidentReport> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    Ok(reports.into_iter().map(Incident::from).collect())
}

fn print_publication(publication: &RoutePublication) -> CliResult<()> {
    log::info!(
        "Route #{} {}: {}",
        publication.generation,
        publication.state,
        publication.route.as_ref().map_or_else(
            || "no route".to_string(),
            |route| format!("{:.0} s walking", route.duration_seconds())
        )
    );
    println!("{}", serde_json::to_string_pretty(publication)?);
    Ok(())
}
