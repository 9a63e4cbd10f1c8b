//! Configuration management for the CLI

use anyhow::{Context, Result};
use estimator_lib::predictor::OutputConfig;
use estimator_lib::{LocationPriceTable, ModelRegistry, TrainingConfig};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `REEST_TRAINING__SEED=42`
const ENV_PREFIX: &str = "REEST";

/// CLI configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Training settings applied to every category
    pub training: TrainingConfig,
    /// Overhead rates and classification thresholds
    pub output: OutputConfig,
    /// Extra or overridden location prices per square metre
    pub locations: BTreeMap<String, f64>,
}

impl Config {
    /// Load the config file (if any) layered under environment variables
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(default_path) = Self::config_path() {
                    builder = builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to read configuration")?;
        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Default configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("reest").join("config.toml"))
    }

    /// Default location table extended with configured entries
    pub fn price_table(&self) -> Result<LocationPriceTable> {
        LocationPriceTable::default()
            .extended(self.locations.iter().map(|(name, price)| (name.clone(), *price)))
            .context("Invalid location price in configuration")
    }

    /// Build a registry from this configuration
    pub fn registry(&self) -> Result<ModelRegistry> {
        Ok(ModelRegistry::with_tables(
            self.price_table()?,
            Default::default(),
            self.training.clone(),
        )
        .with_output_config(self.output.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[training]\nseed = 7\nsample_count = 300\n\n[locations]\n\"حي العليا\" = 9000.0\n"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.training.seed, Some(7));
        assert_eq!(config.training.sample_count, 300);
        assert_eq!(config.training.default_epochs, 50);

        let table = config.price_table().unwrap();
        assert_eq!(table.price("حي العليا").unwrap(), 9000.0);
        assert_eq!(table.price("جدة").unwrap(), 2800.0);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/reest.toml"))).is_err());
    }

    #[test]
    fn test_rejects_bad_location_price() {
        let mut config = Config::default();
        config.locations.insert("حي".to_string(), -1.0);
        assert!(config.price_table().is_err());
    }
}
