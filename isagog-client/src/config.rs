// Copyright 2025 Isagog Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Client configuration
//!
//! Values come from, in priority order: environment variables, a TOML file,
//! built-in defaults.

use anyhow::Result;
use isagog_query::ApiVersion;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_KG_ROUTE: &str = "ISAGOG_KG_ROUTE";
pub const ENV_NLP_ROUTE: &str = "ISAGOG_AI_NLP_ROUTE";
pub const ENV_DATASET: &str = "ISAGOG_DATASET";
pub const ENV_API_VERSION: &str = "ISAGOG_API_VERSION";
pub const ENV_TIMEOUT: &str = "ISAGOG_TIMEOUT_SECS";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub kg: KgConfig,
    #[serde(default)]
    pub nlp: NlpConfig,
}

/// Knowledge graph service settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct KgConfig {
    /// Query endpoint
    #[serde(default = "default_kg_route")]
    pub route: String,

    /// Dataset added to every request, if any
    #[serde(default)]
    pub dataset: Option<String>,

    /// Dict format the service speaks
    #[serde(default)]
    pub version: ApiVersion,

    /// Request timeout in seconds
    #[serde(default = "default_kg_timeout")]
    pub timeout_secs: u64,
}

/// NLP service settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NlpConfig {
    #[serde(default = "default_nlp_route")]
    pub route: String,

    /// Parts of speech kept when extracting search words
    #[serde(default = "default_search_pos")]
    pub search_pos: Vec<String>,

    /// Parts of speech considered lexical
    #[serde(default = "default_lexical_pos")]
    pub lexical_pos: Vec<String>,

    #[serde(default = "default_nlp_timeout")]
    pub timeout_secs: u64,
}

fn default_kg_route() -> String {
    "https://ai.isagog.com/api/kg".to_string()
}

fn default_kg_timeout() -> u64 {
    30
}

fn default_nlp_route() -> String {
    "https://ai.isagog.com/api/nlp".to_string()
}

fn default_search_pos() -> Vec<String> {
    vec!["NOUN".to_string(), "PROPN".to_string()]
}

fn default_lexical_pos() -> Vec<String> {
    ["NOUN", "PROPN", "VERB", "ADJ"].iter().map(|s| s.to_string()).collect()
}

fn default_nlp_timeout() -> u64 {
    20
}

impl Default for KgConfig {
    fn default() -> Self {
        Self {
            route: default_kg_route(),
            dataset: None,
            version: ApiVersion::default(),
            timeout_secs: default_kg_timeout(),
        }
    }
}

impl KgConfig {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            ..Default::default()
        }
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn with_version(mut self, version: ApiVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            route: default_nlp_route(),
            search_pos: default_search_pos(),
            lexical_pos: default_lexical_pos(),
            timeout_secs: default_nlp_timeout(),
        }
    }
}

impl NlpConfig {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - ISAGOG_KG_ROUTE: knowledge graph query endpoint
    /// - ISAGOG_AI_NLP_ROUTE: NLP service endpoint
    /// - ISAGOG_DATASET: dataset sent with every query
    /// - ISAGOG_API_VERSION: dict format, `latest` or `v1.0.0`
    /// - ISAGOG_TIMEOUT_SECS: request timeout for both services
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load configuration with priority: env > file > defaults
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) if path.exists() => {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            }
            Some(path) => {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env();
        Ok(config)
    }

    /// Overrides the fields whose variable is set. Unparsable values are
    /// ignored with a warning.
    fn apply_env(&mut self) {
        if let Ok(route) = std::env::var(ENV_KG_ROUTE) {
            self.kg.route = route;
        }

        if let Ok(route) = std::env::var(ENV_NLP_ROUTE) {
            self.nlp.route = route;
        }

        if let Ok(dataset) = std::env::var(ENV_DATASET) {
            self.kg.dataset = Some(dataset).filter(|d| !d.is_empty());
        }

        if let Ok(version) = std::env::var(ENV_API_VERSION) {
            match version.parse() {
                Ok(version) => self.kg.version = version,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_API_VERSION, e),
            }
        }

        if let Ok(timeout) = std::env::var(ENV_TIMEOUT) {
            match timeout.parse() {
                Ok(secs) => {
                    self.kg.timeout_secs = secs;
                    self.nlp.timeout_secs = secs;
                }
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_TIMEOUT, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process wide.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in [ENV_KG_ROUTE, ENV_NLP_ROUTE, ENV_DATASET, ENV_API_VERSION, ENV_TIMEOUT] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.nlp.route, "https://ai.isagog.com/api/nlp");
        assert_eq!(config.kg.timeout(), Duration::from_secs(30));
        assert_eq!(config.nlp.timeout(), Duration::from_secs(20));
        assert_eq!(config.kg.version, ApiVersion::Latest);
        assert!(config.kg.dataset.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            [kg]
            route = "http://localhost:9000/query"
            version = "v1.0.0"

            [nlp]
            search_pos = ["NOUN"]
            "#,
        )
        .unwrap();

        assert_eq!(config.kg.route, "http://localhost:9000/query");
        assert_eq!(config.kg.version, ApiVersion::V1_0_0);
        assert_eq!(config.kg.timeout_secs, 30);
        assert_eq!(config.nlp.search_pos, vec!["NOUN"]);
        assert_eq!(config.nlp.lexical_pos, default_lexical_pos());
    }

    #[test]
    fn test_env_config() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var(ENV_KG_ROUTE, "http://kg.test/query");
        std::env::set_var(ENV_DATASET, "films");
        std::env::set_var(ENV_API_VERSION, "v1.0.0");
        std::env::set_var(ENV_TIMEOUT, "5");

        let config = ClientConfig::from_env();
        assert_eq!(config.kg.route, "http://kg.test/query");
        assert_eq!(config.kg.dataset.as_deref(), Some("films"));
        assert_eq!(config.kg.version, ApiVersion::V1_0_0);
        assert_eq!(config.kg.timeout_secs, 5);
        assert_eq!(config.nlp.timeout_secs, 5);
        assert_eq!(config.nlp.route, default_nlp_route());

        clear_env();
    }

    #[test]
    fn test_bad_env_values_ignored() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var(ENV_API_VERSION, "v9");
        std::env::set_var(ENV_TIMEOUT, "soon");

        let config = ClientConfig::from_env();
        assert_eq!(config.kg.version, ApiVersion::Latest);
        assert_eq!(config.kg.timeout_secs, 30);

        clear_env();
    }

    #[test]
    fn test_load_env_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("isagog.toml");
        std::fs::write(
            &path,
            "[kg]\nroute = \"http://file/query\"\ndataset = \"from-file\"\n",
        )
        .unwrap();

        std::env::set_var(ENV_DATASET, "from-env");
        let config = ClientConfig::load(Some(path)).unwrap();
        assert_eq!(config.kg.route, "http://file/query");
        assert_eq!(config.kg.dataset.as_deref(), Some("from-env"));

        clear_env();
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let config = ClientConfig::load(Some(PathBuf::from("/nonexistent/isagog.toml"))).unwrap();
        assert_eq!(config, ClientConfig::default());
    }
}
