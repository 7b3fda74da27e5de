use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::models::{Category, CategoryRegistry};
use crate::overpass::{DEFAULT_ENDPOINT, DEFAULT_USER_AGENT};
use crate::render::{DEFAULT_MAP_NAME, DEFAULT_ZOOM};
use crate::resolver::MatchMode;

/// Extra seconds the HTTP client waits beyond the server-side query timeout
const HTTP_TIMEOUT_SLACK_SECS: u64 = 15;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub overpass: OverpassConfig,
    pub map: MapConfig,
    pub proximity: ProximityConfig,
    /// Replaces the built-in registry when non-empty
    pub categories: Vec<Category>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OverpassConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub zoom: u8,
    pub output: PathBuf,
    pub fit_bounds: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProximityConfig {
    pub threshold_feet: f64,
    /// Switch to the R-tree filter above this many records
    pub index_above: usize,
    pub match_mode: MatchMode,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 60,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            output: PathBuf::from(DEFAULT_MAP_NAME),
            fit_bounds: false,
        }
    }
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            threshold_feet: 500.0,
            index_above: 256,
            match_mode: MatchMode::Substring,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.endpoint_url()?;
        Ok(config)
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        Url::parse(&self.overpass.endpoint)
            .with_context(|| format!("Invalid Overpass endpoint: {}", self.overpass.endpoint))
    }

    /// Client-side request timeout. Overpass may spend the whole `[timeout:N]`
    /// budget before answering, so the HTTP deadline runs past it.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.overpass.timeout_secs.saturating_add(HTTP_TIMEOUT_SLACK_SECS))
    }

    /// Configured registry, or the built-in one when no categories are listed
    pub fn registry(&self) -> Result<CategoryRegistry> {
        if self.categories.is_empty() {
            return Ok(CategoryRegistry::default());
        }
        CategoryRegistry::new(self.categories.clone()).context("Invalid category configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.overpass.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.map.zoom, 15);
        assert_eq!(config.map.output, PathBuf::from("search_results_map.html"));
        assert_eq!(config.proximity.threshold_feet, 500.0);
        assert_eq!(config.proximity.match_mode, MatchMode::Substring);
        assert_eq!(config.registry().unwrap().len(), 9);
        assert!(config.http_timeout() > Duration::from_secs(config.overpass.timeout_secs));
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml(
            r#"
            [overpass]
            endpoint = "https://overpass.kumi.systems/api/interpreter"
            timeout_secs = 30

            [map]
            zoom = 13
            fit_bounds = true

            [proximity]
            threshold_feet = 250.0
            match_mode = "word_boundary"

            [[categories]]
            label = "parks"
            synonyms = ["park", "garden"]
            query_fragment = '["leisure"="park"]'
            color = "green"
            "#,
        )
        .unwrap();

        assert_eq!(config.overpass.timeout_secs, 30);
        assert_eq!(config.http_timeout(), Duration::from_secs(45));
        assert_eq!(config.overpass.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.map.zoom, 13);
        assert!(config.map.fit_bounds);
        assert_eq!(config.proximity.match_mode, MatchMode::WordBoundary);
        assert_eq!(config.proximity.index_above, 256);

        let registry = config.registry().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.color("parks"), Some("green"));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let result = Config::from_toml("[overpass]\nendpoint = \"not a url\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_categories_rejected() {
        let config = Config::from_toml(
            r#"
            [[categories]]
            label = "a"
            synonyms = []
            query_fragment = '["k"="v"]'
            color = "red"
            "#,
        )
        .unwrap();
        assert!(config.registry().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poimap.toml");
        fs::write(&path, "[map]\nzoom = 11\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.map.zoom, 11);
        assert!(Config::load_from_file(dir.path().join("absent.toml")).is_err());
    }
}
