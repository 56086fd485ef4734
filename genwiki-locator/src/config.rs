//! Configuration for genwiki-locator
//!
//! Loaded from `~/.config/genwiki/locator.toml` (or `--config` /
//! `GENWIKI_CONFIG`). Every section and field is optional; missing values
//! fall back to the compiled defaults below.
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [locator]
//! search_limit = 11
//! max_distance_km = 3.0
//! ambiguity = "strict"
//!
//! [endpoints]
//! gov_url = "https://gov.genealogy.net/api/getObject"
//! ```

use genwiki_common::config::{
    default_data_dir, expand_home, load_toml_config, ConfigFileResolver, LoggingConfig,
};
use genwiki_common::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Module name used for the config file (`locator.toml`)
pub const MODULE_NAME: &str = "locator";

/// Handling of exact-match lookups that return more than one item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguityPolicy {
    /// Fail the resolution call with `ConflictingEvidence`
    #[default]
    Strict,
    /// Log a warning and record the reference as null
    Lenient,
}

/// Complete locator configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    pub logging: LoggingConfig,
    pub locator: LocatorSettings,
    pub endpoints: Endpoints,
}

impl LocatorConfig {
    /// Resolve the config file location and load it
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = ConfigFileResolver::new(MODULE_NAME).resolve(cli_path);
        load_toml_config(path.as_deref())
    }
}

/// Engine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorSettings {
    /// Top-K for name searches
    pub search_limit: usize,
    /// Maximum accepted distance between gazetteer and candidate position
    pub max_distance_km: f64,
    /// Geocoder attempts on transient failures
    pub geocoder_max_retries: u32,
    /// Initial geocoder backoff; doubled after every failed attempt
    pub geocoder_backoff_ms: u64,
    pub ambiguity: AmbiguityPolicy,
    /// Label language for exact reference lookups
    pub reference_language: String,
    /// Label language for hierarchy paths
    pub path_language: String,
    /// GOV response cache; `None` disables caching
    pub cache_dir: Option<PathBuf>,
    /// Root of the location page store
    pub store_dir: Option<PathBuf>,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            search_limit: 11,
            max_distance_km: 3.0,
            geocoder_max_retries: 3,
            geocoder_backoff_ms: 1000,
            ambiguity: AmbiguityPolicy::Strict,
            reference_language: "en".to_string(),
            path_language: "de".to_string(),
            cache_dir: Some(PathBuf::from("~/.govapi")),
            store_dir: None,
            user_agent: format!("genwiki-locator/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
        }
    }
}

impl LocatorSettings {
    /// Cache directory with `~` expanded
    pub fn resolved_cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.as_deref().map(expand_home)
    }

    /// Store root with `~` expanded, defaulting below the data folder
    pub fn resolved_store_dir(&self) -> PathBuf {
        match &self.store_dir {
            Some(dir) => expand_home(dir),
            None => default_data_dir().join("locations"),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn geocoder_backoff(&self) -> Duration {
        Duration::from_millis(self.geocoder_backoff_ms)
    }
}

/// Service endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub gov_url: String,
    pub sparql_url: String,
    pub wikidata_api_url: String,
    pub nominatim_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gov_url: "https://gov.genealogy.net/api/getObject".to_string(),
            sparql_url: "https://query.wikidata.org/sparql".to_string(),
            wikidata_api_url: "https://www.wikidata.org/w/api.php".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org/search".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LocatorSettings::default();
        assert_eq!(settings.search_limit, 11);
        assert_eq!(settings.max_distance_km, 3.0);
        assert_eq!(settings.geocoder_max_retries, 3);
        assert_eq!(settings.ambiguity, AmbiguityPolicy::Strict);
        assert_eq!(settings.path_language, "de");
    }

    #[test]
    fn test_partial_toml() {
        let config: LocatorConfig = toml::from_str(
            r#"
            [locator]
            max_distance_km = 5.5
            ambiguity = "lenient"

            [endpoints]
            gov_url = "http://localhost:9000/getObject"
            "#,
        )
        .unwrap();

        assert_eq!(config.locator.max_distance_km, 5.5);
        assert_eq!(config.locator.ambiguity, AmbiguityPolicy::Lenient);
        assert_eq!(config.locator.search_limit, 11);
        assert_eq!(config.endpoints.gov_url, "http://localhost:9000/getObject");
        assert_eq!(config.endpoints.sparql_url, Endpoints::default().sparql_url);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_ambiguity_policy_is_rejected() {
        let result: std::result::Result<LocatorConfig, _> =
            toml::from_str("[locator]\nambiguity = \"maybe\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_store_dir_override() {
        let settings = LocatorSettings {
            store_dir: Some(PathBuf::from("/srv/genwiki/locations")),
            ..Default::default()
        };
        assert_eq!(
            settings.resolved_store_dir(),
            PathBuf::from("/srv/genwiki/locations")
        );
    }

    #[test]
    fn test_cache_can_be_disabled() {
        let settings = LocatorSettings {
            cache_dir: None,
            ..Default::default()
        };
        assert!(settings.resolved_cache_dir().is_none());
    }
}
