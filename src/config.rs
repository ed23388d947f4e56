// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! `RIFTS__SECTION__KEY` environment variables. CLI flags are applied by
//! the commands on top of the result.

use crate::community::LouvainConfig;
use crate::error::ConfigError;
use crate::loader::LoaderOptions;
use crate::metrics::PageRankConfig;
use crate::roles::RoleThresholds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Metric settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Minimum links (any sentiment) before a community is ranked by controversy
    pub min_posts: usize,
    /// PageRank parameters
    pub pagerank: PageRankConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            min_posts: 10,
            pagerank: PageRankConfig::default(),
        }
    }
}

/// Report settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Entries shown per ranking
    pub top: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { top: 10 }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How input files are parsed
    pub input: LoaderOptions,
    /// Role thresholds
    pub roles: RoleThresholds,
    /// Metric settings
    pub metrics: MetricsConfig,
    /// Community detection settings
    pub community: LouvainConfig,
    /// Report settings
    pub report: ReportConfig,
}

impl Config {
    /// Reject values that would make the analysis meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pagerank = &self.metrics.pagerank;
        if !(0.0..1.0).contains(&pagerank.damping) {
            return Err(ConfigError::OutOfRange {
                key: "metrics.pagerank.damping",
                reason: format!("{} is not in [0, 1)", pagerank.damping),
            });
        }
        if !(pagerank.tolerance.is_finite() && pagerank.tolerance > 0.0) {
            return Err(ConfigError::OutOfRange {
                key: "metrics.pagerank.tolerance",
                reason: format!("{} is not a positive number", pagerank.tolerance),
            });
        }
        if !(self.roles.dominance_ratio.is_finite() && self.roles.dominance_ratio >= 1.0) {
            return Err(ConfigError::OutOfRange {
                key: "roles.dominance_ratio",
                reason: format!("{} is not a finite number >= 1", self.roles.dominance_ratio),
            });
        }
        if !(0.0..=1.0).contains(&self.roles.bridge_max_clustering) {
            return Err(ConfigError::OutOfRange {
                key: "roles.bridge_max_clustering",
                reason: format!("{} is not in [0, 1]", self.roles.bridge_max_clustering),
            });
        }
        let resolution = self.community.resolution;
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(ConfigError::OutOfRange {
                key: "community.resolution",
                reason: format!("{resolution} is not a positive number"),
            });
        }
        Ok(())
    }

    /// Serialize to TOML for display
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Default config file location in the platform config directory
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "hyperpolymath", "rifts").map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, the default location is
/// used when present.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

    match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound(p.to_path_buf()));
            }
            debug!("Reading config from {}", p.display());
            builder = builder.add_source(config::File::from(p).format(config::FileFormat::Toml));
        }
        None => {
            if let Some(p) = default_path().filter(|p| p.exists()) {
                debug!("Reading config from {}", p.display());
                builder = builder.add_source(config::File::from(p).format(config::FileFormat::Toml));
            }
        }
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("RIFTS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.input.delimiter, '\t');
        assert_eq!(config.report.top, 10);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rifts.toml");
        fs::write(
            &path,
            "[roles]\nmin_activity = 2\ndominance_ratio = 3.5\n\n[report]\ntop = 3\n",
        )
        .unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.roles.min_activity, 2);
        assert!((config.roles.dominance_ratio - 3.5).abs() < f64::EPSILON);
        assert_eq!(config.roles.bridge_min_degree, 10);
        assert_eq!(config.report.top, 3);
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = load(Some(Path::new("/nonexistent/rifts.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rifts.toml");
        fs::write(&path, "[metrics.pagerank]\ndamping = 1.5\n").unwrap();

        let err = load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("metrics.pagerank.damping"));
    }

    #[test]
    fn test_nan_and_infinite_rejected() {
        let mut config = Config::default();
        config.roles.dominance_ratio = f64::NAN;
        assert!(config.validate().is_err());
        config.roles.dominance_ratio = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.community.resolution = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.metrics.pagerank.tolerance = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.metrics.pagerank.damping = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_toml_round_trips() {
        let text = Config::default().to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.roles, RoleThresholds::default());
    }
}
