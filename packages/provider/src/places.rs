//! Named campus locations.
//!
//! OSRM only routes between coordinates, so place-name waypoints are
//! looked up here first. The directory is a TOML list of `[[places]]`
//! tables; a default campus directory is embedded at compile time.

use std::collections::BTreeMap;
use std::path::Path;

use safe_route_route_models::Coordinate;
use serde::Deserialize;

use crate::ConfigError;

const EMBEDDED_CAMPUS: &str = include_str!("../places/campus.toml");

/// One named location.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    /// Display name.
    pub name: String,
    /// Alternative names that resolve to the same location.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
struct PlacesFile {
    #[serde(default)]
    places: Vec<Place>,
}

/// Case-insensitive name → coordinate lookup.
#[derive(Debug, Clone, Default)]
pub struct PlaceDirectory {
    by_key: BTreeMap<String, Coordinate>,
}

impl PlaceDirectory {
    /// Returns the embedded default campus directory.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (a compile-time guarantee
    /// since the file ships with the crate).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml_str(EMBEDDED_CAMPUS)
            .unwrap_or_else(|e| panic!("Failed to parse embedded campus places: {e}"))
    }

    /// Parses a directory from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed, a coordinate is
    /// invalid, or two places claim the same name.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let file: PlacesFile = toml::from_str(s)?;
        let mut by_key = BTreeMap::new();

        for place in file.places {
            let coordinate =
                Coordinate::new(place.lat, place.lng).map_err(|e| ConfigError::Invalid {
                    message: format!("place '{}': {e}", place.name),
                })?;

            for name in std::iter::once(&place.name).chain(place.aliases.iter()) {
                let key = normalize(name);
                if key.is_empty() {
                    return Err(ConfigError::Invalid {
                        message: format!("place '{}' has an empty name or alias", place.name),
                    });
                }
                if by_key.insert(key, coordinate).is_some() {
                    return Err(ConfigError::Invalid {
                        message: format!("duplicate place name '{name}'"),
                    });
                }
            }
        }

        Ok(Self { by_key })
    }

    /// Loads a directory from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let directory = Self::from_toml_str(&text)?;
        log::info!(
            "Loaded {} place name(s) from {}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    /// Looks up a place by name or alias, ignoring case and surrounding
    /// whitespace.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Coordinate> {
        self.by_key.get(&normalize(name)).copied()
    }

    /// Number of names (including aliases) in the directory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Whether the directory has no names.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
