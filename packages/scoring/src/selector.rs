//! Picks the lowest-cost route from a provider's alternatives.

use safe_route_route_models::{Coordinate, Route, RouteScore};

use crate::{ScoringConfig, ScoringError, distance::GeoDistance, scorer};

/// The outcome of [`select_best`]: a borrowed candidate plus its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    /// Position of the chosen route in the input slice.
    pub index: usize,
    /// The chosen route, exactly as supplied.
    pub route: &'a Route,
    /// The chosen route's score, or `None` when scoring was skipped
    /// because there were no incidents.
    pub score: Option<RouteScore>,
}

/// Scores every candidate, preserving input order.
#[must_use]
pub fn score_all(
    routes: &[Route],
    incidents: &[Coordinate],
    config: &ScoringConfig,
    distance: Option<&dyn GeoDistance>,
) -> Vec<RouteScore> {
    routes
        .iter()
        .map(|route| scorer::score(route, incidents, config, distance))
        .collect()
}

/// Selects the route with the strictly smallest total cost.
///
/// With no incidents, scoring is skipped and the provider's primary route
/// (`routes[0]`) is returned with no score. Ties go to the earlier route.
///
/// # Errors
///
/// Returns [`ScoringError::EmptyRouteSet`] if `routes` is empty.
pub fn select_best<'a>(
    routes: &'a [Route],
    incidents: &[Coordinate],
    config: &ScoringConfig,
    distance: Option<&dyn GeoDistance>,
) -> Result<Selection<'a>, ScoringError> {
    let Some(primary) = routes.first() else {
        return Err(ScoringError::EmptyRouteSet);
    };

    if incidents.is_empty() {
        return Ok(Selection {
            index: 0,
            route: primary,
            score: None,
        });
    }

    let scores = score_all(routes, incidents, config, distance);

    let mut best_index = 0;
    for (index, candidate) in scores.iter().enumerate().skip(1) {
        if candidate.total_cost_seconds < scores[best_index].total_cost_seconds {
            best_index = index;
        }
    }

    Ok(Selection {
        index: best_index,
        route: &routes[best_index],
        score: Some(scores[best_index]),
    })
}

#[cfg(test)]
mod tests {
    use safe_route_route_models::{RouteLeg, Step};

    use super::*;
    use crate::HaversineDistance;

    const INCIDENT: Coordinate = Coordinate {
        lat: 43.6577,
        lng: -79.3788,
    };

    /// A single-step route whose first `near` points sit on the incident
    /// and whose remaining points are ~1 km away.
    fn route(duration_seconds: f64, near: usize, far: usize, label: &str) -> Route {
        let mut path = vec![INCIDENT; near];
        path.extend(std::iter::repeat_n(
            Coordinate {
                lat: INCIDENT.lat + 0.01,
                lng: INCIDENT.lng,
            },
            far,
        ));
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

    #[test]
    fn penalized_shortcut_loses_to_clean_detour() {
        // A: 600 s, clean. B: 500 s, 3 exposed points -> 500 + 2700.
        let routes = vec![route(500.0, 3, 2, "B"), route(600.0, 0, 5, "A")];
        let sel = select_best(
            &routes,
            &[INCIDENT],
            &ScoringConfig::default(),
            Some(&HaversineDistance),
        )
        .unwrap();

        assert_eq!(sel.index, 1);
        assert_eq!(sel.route.summary.as_deref(), Some("A"));
        let s = sel.score.unwrap();
        assert!((s.total_cost_seconds - 600.0).abs() < f64::EPSILON);

        let scores = score_all(
            &routes,
            &[INCIDENT],
            &ScoringConfig::default(),
            Some(&HaversineDistance),
        );
        assert!((scores[0].total_cost_seconds - 3200.0).abs() < f64::EPSILON);
        assert_eq!(scores[0].incidents_near_route, 3);
    }

    #[test]
    fn no_incidents_returns_primary_unscored() {
        let routes = vec![route(900.0, 0, 1, "slow"), route(100.0, 0, 1, "fast")];
        let sel = select_best(
            &routes,
            &[],
            &ScoringConfig::default(),
            Some(&HaversineDistance),
        )
        .unwrap();
        assert_eq!(sel.index, 0);
        assert_eq!(sel.route.summary.as_deref(), Some("slow"));
        assert!(sel.score.is_none());
    }

    #[test]
    fn empty_route_set_is_an_error() {
        let err = select_best(
            &[],
            &[INCIDENT],
            &ScoringConfig::default(),
            Some(&HaversineDistance),
        )
        .unwrap_err();
        assert_eq!(err, ScoringError::EmptyRouteSet);

        assert!(select_best(&[], &[], &ScoringConfig::default(), None).is_err());
    }

    #[test]
    fn ties_keep_the_earliest_route() {
        let routes = vec![
            route(700.0, 0, 2, "first"),
            route(700.0, 0, 2, "second"),
            route(700.0, 0, 2, "third"),
        ];
        let sel = select_best(
            &routes,
            &[INCIDENT],
            &ScoringConfig::default(),
            Some(&HaversineDistance),
        )
        .unwrap();
        assert_eq!(sel.index, 0);
        assert_eq!(sel.route.summary.as_deref(), Some("first"));
    }

    #[test]
    fn winner_is_drawn_verbatim_from_candidates() {
        let routes = vec![
            route(300.0, 1, 4, "a"),
            route(400.0, 0, 4, "b"),
            route(200.0, 2, 1, "c"),
        ];
        let sel = select_best(
            &routes,
            &[INCIDENT],
            &ScoringConfig::default(),
            Some(&HaversineDistance),
        )
        .unwrap();
        assert!(std::ptr::eq(sel.route, &routes[sel.index]));
        assert_eq!(sel.route, &routes[1]);
    }

    #[test]
    fn degenerate_fallback_ranks_by_travel_time() {
        let routes = vec![route(500.0, 5, 0, "exposed-fast"), route(600.0, 0, 5, "clean")];
        let sel = select_best(&routes, &[INCIDENT], &ScoringConfig::default(), None).unwrap();
        assert_eq!(sel.index, 0);
        assert_eq!(sel.score.unwrap().incidents_near_route, 0);
    }

    #[test]
    fn selection_is_idempotent() {
        let routes = vec![
            route(500.0, 1, 3, "x"),
            route(520.0, 1, 3, "y"),
            route(1800.0, 0, 3, "z"),
        ];
        let cfg = ScoringConfig::default();
        let first = select_best(&routes, &[INCIDENT], &cfg, Some(&HaversineDistance)).unwrap();
        let second = select_best(&routes, &[INCIDENT], &cfg, Some(&HaversineDistance)).unwrap();
        assert_eq!(first.index, second.index);
        assert_eq!(first.score, second.score);
    }
}
