#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident-aware route scoring and selection.
//!
//! Given candidate routes from a routing provider and the coordinates of
//! recently reported incidents, [`scorer::score`] computes a
//! safety-adjusted cost per route and [`selector::select_best`] picks the
//! cheapest one. Everything here is synchronous and pure: no I/O, no
//! hidden state, and identical inputs always produce identical outputs.
//!
//! Distance computation is injected through the [`distance::GeoDistance`]
//! capability. Passing `None` selects the degenerate fallback, where
//! incidents are ignored and routes are ranked by travel time alone.

pub mod distance;
pub mod scorer;
pub mod selector;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use distance::{GeoDistance, HaversineDistance};
pub use scorer::score;
pub use selector::{Selection, select_best};

/// Default radius around an incident within which a path point counts
/// as exposed.
pub const DEFAULT_RADIUS_METERS: f64 = 80.0;

/// Default penalty per exposed path point (15 minutes).
pub const DEFAULT_PENALTY_SECONDS_PER_INCIDENT: f64 = 900.0;

/// Tunable scoring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScoringConfig {
    /// Radius in meters around each incident.
    #[serde(default = "default_radius_meters")]
    pub radius_meters: f64,
    /// Seconds added to the route cost per exposed path point.
    #[serde(default = "default_penalty_seconds")]
    pub penalty_seconds_per_incident: f64,
}

const fn default_radius_meters() -> f64 {
    DEFAULT_RADIUS_METERS
}

const fn default_penalty_seconds() -> f64 {
    DEFAULT_PENALTY_SECONDS_PER_INCIDENT
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            radius_meters: DEFAULT_RADIUS_METERS,
            penalty_seconds_per_incident: DEFAULT_PENALTY_SECONDS_PER_INCIDENT,
        }
    }
}

impl ScoringConfig {
    /// Checks that both parameters are finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), ScoringError> {
        if !self.radius_meters.is_finite() || self.radius_meters < 0.0 {
            return Err(ScoringError::InvalidConfig {
                message: format!(
                    "radius_meters must be finite and >= 0, got {}",
                    self.radius_meters
                ),
            });
        }
        if !self.penalty_seconds_per_incident.is_finite() || self.penalty_seconds_per_incident < 0.0
        {
            return Err(ScoringError::InvalidConfig {
                message: format!(
                    "penalty_seconds_per_incident must be finite and >= 0, got {}",
                    self.penalty_seconds_per_incident
                ),
            });
        }
        Ok(())
    }
}

/// Errors from route selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// No candidate routes were supplied.
    #[error("no candidate routes to select from")]
    EmptyRouteSet,

    /// Scoring parameters are unusable.
    #[error("invalid scoring configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let cfg = ScoringConfig::default();
        assert!((cfg.radius_meters - 80.0).abs() < f64::EPSILON);
        assert!((cfg.penalty_seconds_per_incident - 900.0).abs() < f64::EPSILON);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: ScoringConfig = toml::from_str("radius_meters = 50.0").unwrap();
        assert!((cfg.radius_meters - 50.0).abs() < f64::EPSILON);
        assert!((cfg.penalty_seconds_per_incident - 900.0).abs() < f64::EPSILON);

        let cfg: ScoringConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, ScoringConfig::default());
    }

    #[test]
    fn validate_rejects_negative_and_non_finite() {
        let cfg = ScoringConfig {
            radius_meters: -1.0,
            ..ScoringConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ScoringError::InvalidConfig { .. })
        ));

        let cfg = ScoringConfig {
            penalty_seconds_per_incident: f64::NAN,
            ..ScoringConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
