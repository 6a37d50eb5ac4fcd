//! Lot configuration management.
//!
//! Handles loading, saving, and validating parkade configuration including:
//! - Assignment strategy and park retry bound
//! - Billing precision
//! - Audit history size
//! - Initial spot inventory
//! - HTTP server bind settings
//!
//! Sources are layered with the `config` crate: built-in defaults, then an
//! optional TOML file, then `PARKADE__SECTION__KEY` environment variables.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ParkingSpot;
use crate::strategy::StrategyKind;
use crate::types::{SizeClass, SpotId};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "PARKADE_CONFIG";

/// Prefix for environment overrides (`PARKADE__LOT__STRATEGY=nearest`).
pub const ENV_PREFIX: &str = "PARKADE";

/// Largest supported number of fractional digits on fees.
pub const MAX_FEE_SCALE: u32 = 10;

/// Errors raised while loading, validating or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The layered sources could not be merged or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The configuration could not be rendered as TOML.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The configuration file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A single field holds an invalid value.
    #[error("{field}: {message}")]
    Validation {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Several fields hold invalid values.
    #[error("{} validation errors", .0.len())]
    MultipleValidationErrors(Vec<ConfigError>),
}

/// A specialized result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Root lot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LotConfig {
    /// Lot-wide engine settings.
    #[serde(default)]
    pub lot: LotSettings,

    /// Fee precision settings.
    #[serde(default)]
    pub billing: BillingConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Spots registered at startup.
    #[serde(default)]
    pub spots: Vec<SpotSeed>,
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotSettings {
    /// Display name of the lot.
    pub name: String,

    /// Built-in assignment strategy.
    pub strategy: StrategyKind,

    /// How many times `park` re-queries candidates after losing a race.
    pub max_park_attempts: u32,

    /// Number of closed tickets kept for audit.
    pub history_limit: usize,
}

impl Default for LotSettings {
    fn default() -> Self {
        Self {
            name: "parkade".to_string(),
            strategy: StrategyKind::SmallestFit,
            max_park_attempts: 3,
            history_limit: 10_000,
        }
    }
}

/// Billing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Fractional digits kept on computed fees (banker's rounding).
    pub fee_scale: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self { fee_scale: 4 }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,

    /// TCP port to bind.
    pub port: u16,

    /// Use production logging (JSON files + compact stdout).
    pub production: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            production: false,
        }
    }
}

/// A spot declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotSeed {
    /// Spot identity.
    pub id: u64,

    /// Size class.
    pub size_class: u8,

    /// Hourly rate.
    pub hourly_rate: Decimal,

    /// Location coordinate along the lot.
    #[serde(default)]
    pub location: i64,
}

impl From<&SpotSeed> for ParkingSpot {
    fn from(seed: &SpotSeed) -> Self {
        Self::new(
            SpotId(seed.id),
            SizeClass(seed.size_class),
            seed.hourly_rate,
            seed.location,
        )
    }
}

impl LotConfig {
    /// Load configuration from the default locations.
    ///
    /// If `PARKADE_CONFIG` is set the file it names must exist; otherwise
    /// the platform default path is used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or the merged result is
    /// invalid.
    pub fn load() -> ConfigResult<Self> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from(Path::new(&path)),
            None => {
                let path = default_config_path();
                let file = path.exists().then_some(path.as_path());
                Self::load_from_sources(file, env_source())
            }
        }
    }

    /// Load configuration from an explicit TOML file plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file does not exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Self::load_from_sources(Some(path), env_source())
    }

    /// Load from an optional file and a caller-supplied environment source.
    ///
    /// # Errors
    ///
    /// Returns an error if the sources cannot be merged, deserialized or
    /// validated.
    pub fn load_from_sources(
        file: Option<&Path>,
        env: config::Environment,
    ) -> ConfigResult<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);
        if let Some(path) = file {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        let loaded: Self = builder.add_source(env).build()?.try_deserialize()?;
        loaded.validate()?;
        tracing::debug!(
            lot = %loaded.lot.name,
            strategy = ?loaded.lot.strategy,
            spots = loaded.spots.len(),
            "Configuration loaded"
        );
        Ok(loaded)
    }

    /// Write configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check every field, reporting all problems at once.
    ///
    /// # Errors
    ///
    /// Returns a single [`ConfigError::Validation`] or
    /// [`ConfigError::MultipleValidationErrors`].
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();
        let mut invalid = |field: &str, message: String| {
            errors.push(ConfigError::Validation {
                field: field.to_string(),
                message,
            });
        };

        if self.lot.name.trim().is_empty() {
            invalid("lot.name", "must not be empty".to_string());
        }
        if self.lot.max_park_attempts == 0 {
            invalid("lot.max_park_attempts", "must be at least 1".to_string());
        }
        if self.lot.history_limit == 0 {
            invalid("lot.history_limit", "must be at least 1".to_string());
        }
        if self.billing.fee_scale > MAX_FEE_SCALE {
            invalid(
                "billing.fee_scale",
                format!("must be at most {MAX_FEE_SCALE}"),
            );
        }

        let mut seen = std::collections::BTreeSet::new();
        for (index, spot) in self.spots.iter().enumerate() {
            if !seen.insert(spot.id) {
                invalid(
                    &format!("spots[{index}].id"),
                    format!("duplicate spot id {}", spot.id),
                );
            }
            if spot.size_class == 0 {
                invalid(
                    &format!("spots[{index}].size_class"),
                    "must be at least 1".to_string(),
                );
            }
            if spot.hourly_rate.is_sign_negative() && !spot.hourly_rate.is_zero() {
                invalid(
                    &format!("spots[{index}].hourly_rate"),
                    format!("rate {} is negative", spot.hourly_rate),
                );
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::MultipleValidationErrors(errors)),
        }
    }
}

/// Environment overrides: `PARKADE__LOT__STRATEGY`, `PARKADE__SERVER__PORT`, ...
fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

/// Default configuration file location.
///
/// Linux deployments read `/etc/parkade/config.toml`; elsewhere the
/// platform config directory is used.
#[must_use]
pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/etc/parkade/config.toml")
    }
    #[cfg(not(target_os = "linux"))]
    {
        directories::ProjectDirs::from("", "", "parkade").map_or_else(
            || PathBuf::from("config.toml"),
            |dirs| dirs.config_dir().join("config.toml"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn no_env() -> config::Environment {
        config::Environment::with_prefix("PARKADE_TEST")
            .separator("__")
            .source(Some(HashMap::new()))
    }

    fn env_with(pairs: &[(&str, &str)]) -> config::Environment {
        let map = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect::<HashMap<_, _>>();
        config::Environment::with_prefix("PARKADE_TEST")
            .separator("__")
            .try_parsing(true)
            .source(Some(map))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = LotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lot.max_park_attempts, 3);
        assert_eq!(config.billing.fee_scale, 4);
        assert_eq!(config.lot.strategy, StrategyKind::SmallestFit);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = LotConfig::load_from_sources(None, no_env()).unwrap();
        assert_eq!(config, LotConfig::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lot.toml");
        std::fs::write(
            &path,
            r#"
[lot]
name = "Harbour Garage"
strategy = "nearest"

[[spots]]
id = 1
size_class = 2
hourly_rate = "2.50"
location = 10

[[spots]]
id = 2
size_class = 3
hourly_rate = "4"
"#,
        )
        .unwrap();

        let config = LotConfig::load_from_sources(Some(&path), no_env()).unwrap();
        assert_eq!(config.lot.name, "Harbour Garage");
        assert_eq!(config.lot.strategy, StrategyKind::Nearest);
        // Unspecified keys keep their defaults
        assert_eq!(config.lot.max_park_attempts, 3);
        assert_eq!(config.spots.len(), 2);
        assert_eq!(config.spots[0].hourly_rate, dec!(2.50));
        assert_eq!(config.spots[1].location, 0);
    }

    #[test]
    fn test_environment_overrides_file() {
        let env = env_with(&[
            ("PARKADE_TEST__LOT__STRATEGY", "nearest"),
            ("PARKADE_TEST__SERVER__PORT", "8080"),
        ]);
        let config = LotConfig::load_from_sources(None, env).unwrap();
        assert_eq!(config.lot.strategy, StrategyKind::Nearest);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = LotConfig::load_from(Path::new("/nonexistent/parkade.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = LotConfig::default();
        config.lot.max_park_attempts = 0;
        config.billing.fee_scale = 30;
        config.spots = vec![
            SpotSeed {
                id: 1,
                size_class: 1,
                hourly_rate: dec!(1),
                location: 0,
            },
            SpotSeed {
                id: 1,
                size_class: 1,
                hourly_rate: dec!(-1),
                location: 0,
            },
        ];

        match config.validate() {
            Err(ConfigError::MultipleValidationErrors(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_size_class_rejected() {
        let mut config = LotConfig::default();
        config.spots.push(SpotSeed {
            id: 3,
            size_class: 0,
            hourly_rate: dec!(1),
            location: 0,
        });
        match config.validate() {
            Err(ConfigError::Validation { field, .. }) => assert_eq!(field, "spots[0].size_class"),
            other => panic!("expected a size class error, got {other:?}"),
        }
    }

    #[test]
    fn test_single_validation_error() {
        let mut config = LotConfig::default();
        config.lot.name = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("lot.name"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = LotConfig::default();
        config.lot.name = "Saved".to_string();
        config.spots.push(SpotSeed {
            id: 9,
            size_class: 1,
            hourly_rate: dec!(1.25),
            location: -4,
        });
        config.save(&path).unwrap();

        let loaded = LotConfig::load_from_sources(Some(&path), no_env()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_seed_into_spot() {
        let seed = SpotSeed {
            id: 5,
            size_class: 3,
            hourly_rate: dec!(6),
            location: 40,
        };
        let spot = ParkingSpot::from(&seed);
        assert_eq!(spot.id, SpotId(5));
        assert_eq!(spot.size, SizeClass::OVERSIZED);
        assert!(spot.is_available());
    }

    #[test]
    fn test_config_error_into_parking_error() {
        let err: crate::ParkingError = ConfigError::Validation {
            field: "lot.name".into(),
            message: "must not be empty".into(),
        }
        .into();
        assert!(err.is_config_error());
    }
}
