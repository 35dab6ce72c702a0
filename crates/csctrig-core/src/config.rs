//! # Configuration System
//!
//! YAML configuration for trigger emulation jobs:
//!
//! - Cathode search (pattern family, layer threshold, candidate slots, ranking)
//! - Anode search (layer threshold, chain depth, ghost window)
//! - LUT source (fit-results file, or geometric fits when absent)
//! - Logging
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path given by `CSCTRIG_CONFIG` environment variable
//! 2. `./csctrig.yaml` (current directory)
//! 3. `~/.config/csctrig/config.yaml` (user config)
//! 4. `/etc/csctrig/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! clct:
//!   catalog: combined
//!   min_layers: 4
//!   ranking: cfeb
//!
//! alct:
//!   min_layers: 4
//!   chain_depth: 64
//!
//! lut:
//!   path: "/data/luts/linearFits.lut"
//!
//! logging:
//!   level: debug
//!   format: json
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::CatalogKind;
use crate::clct::Ranking;
use crate::constants::{ALCT_SLOTS, CLCT_SLOTS, NLAYERS, N_KEY_WIRE_GROUPS};
use crate::error::ConfigError;
use crate::observe::LogConfig;

/// Cathode extractor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClctConfig {
    /// Pattern family to scan with
    pub catalog: CatalogKind,
    /// Layers a pattern needs to produce a candidate
    pub min_layers: usize,
    /// Candidates kept per chamber
    pub max_candidates: usize,
    /// Ordering used to pick the best candidate
    pub ranking: Ranking,
}

impl Default for ClctConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogKind::Upgrade,
            min_layers: 3,
            max_candidates: CLCT_SLOTS,
            ranking: Ranking::Quality,
        }
    }
}

/// Anode extractor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlctConfig {
    /// Layers a wire pattern needs to be valid
    pub min_layers: usize,
    /// Candidates given a track number
    pub max_candidates: usize,
    /// Capacity of the per-chamber candidate chain
    pub chain_depth: usize,
    /// Largest first-bx difference at which neighbours count as ghosts
    pub ghost_window: u8,
}

impl Default for AlctConfig {
    fn default() -> Self {
        Self {
            min_layers: 4,
            max_candidates: ALCT_SLOTS,
            chain_depth: N_KEY_WIRE_GROUPS,
            ghost_window: 2,
        }
    }
}

/// LUT source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LutConfig {
    /// Fit-results file; geometric fits are used when unset
    pub path: Option<PathBuf>,
}

/// Complete trigger emulation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Configuration version
    pub version: String,
    pub clct: ClctConfig,
    pub alct: AlctConfig,
    pub lut: LutConfig,
    pub logging: LogConfig,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            clct: ClctConfig::default(),
            alct: AlctConfig::default(),
            lut: LutConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl TriggerConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns the default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("CSCTRIG_CONFIG") {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            return Self::load_from(&path);
        }

        for path in &Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Self::default())
    }

    /// Load and validate configuration from one file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config = Self::parse(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./csctrig.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "csctrig") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/csctrig/config.yaml"));

        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=NLAYERS).contains(&self.clct.min_layers) {
            return Err(ConfigError::ValidationError(format!(
                "clct.min_layers must be 1-{}",
                NLAYERS
            )));
        }
        if self.clct.max_candidates == 0 {
            return Err(ConfigError::ValidationError(
                "clct.max_candidates must be > 0".to_string(),
            ));
        }
        if !(1..=NLAYERS).contains(&self.alct.min_layers) {
            return Err(ConfigError::ValidationError(format!(
                "alct.min_layers must be 1-{}",
                NLAYERS
            )));
        }
        if self.alct.chain_depth == 0 || self.alct.chain_depth > N_KEY_WIRE_GROUPS {
            return Err(ConfigError::ValidationError(format!(
                "alct.chain_depth must be 1-{}",
                N_KEY_WIRE_GROUPS
            )));
        }
        if self.alct.max_candidates > self.alct.chain_depth {
            return Err(ConfigError::ValidationError(
                "alct.max_candidates cannot exceed alct.chain_depth".to_string(),
            ));
        }
        if let Some(path) = &self.lut.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(
                    "lut.path must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        let config = Self {
            clct: ClctConfig {
                catalog: CatalogKind::Combined,
                ..Default::default()
            },
            lut: LutConfig {
                path: Some(PathBuf::from("linearFits.lut")),
            },
            ..Default::default()
        };

        serde_yaml::to_string(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{LogFormat, LogLevel};

    #[test]
    fn test_default_config() {
        let config = TriggerConfig::default();
        assert_eq!(config.clct.min_layers, 3);
        assert_eq!(config.clct.max_candidates, 2);
        assert_eq!(config.clct.catalog, CatalogKind::Upgrade);
        assert_eq!(config.alct.min_layers, 4);
        assert!(config.lut.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
clct:
  catalog: legacy
  min_layers: 4
  ranking: cfeb

alct:
  chain_depth: 32

lut:
  path: "/data/fits.lut"

logging:
  level: debug
  format: json
"#;

        let config = TriggerConfig::parse(yaml).unwrap();
        assert_eq!(config.clct.catalog, CatalogKind::Legacy);
        assert_eq!(config.clct.min_layers, 4);
        assert_eq!(config.clct.ranking, Ranking::Cfeb);
        assert_eq!(config.clct.max_candidates, 2);
        assert_eq!(config.alct.chain_depth, 32);
        assert_eq!(config.lut.path, Some(PathBuf::from("/data/fits.lut")));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            TriggerConfig::parse("clct:\n  catalog: sideways\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = TriggerConfig::default();
        config.clct.min_layers = 0;
        assert!(config.validate().is_err());

        config.clct.min_layers = 7;
        assert!(config.validate().is_err());

        let mut config = TriggerConfig::default();
        config.alct.chain_depth = 1;
        assert!(config.validate().is_err());

        let mut config = TriggerConfig::default();
        config.clct.max_candidates = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_yaml() {
        let yaml = TriggerConfig::example_yaml();
        assert!(yaml.contains("clct:"));
        assert!(yaml.contains("combined"));
        let parsed = TriggerConfig::parse(&yaml).unwrap();
        assert_eq!(parsed.clct.catalog, CatalogKind::Combined);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("csctrig.yaml");
        let mut config = TriggerConfig::default();
        config.alct.ghost_window = 3;
        config.save(&path).unwrap();

        let loaded = TriggerConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            TriggerConfig::load_from(Path::new("/nonexistent/csctrig.yaml")),
            Err(ConfigError::ReadError(_))
        ));
    }

    #[test]
    fn test_config_search_paths() {
        let paths = TriggerConfig::config_search_paths();
        assert!(!paths.is_empty());
        assert!(paths[0].ends_with("csctrig.yaml"));
    }
}
