//! Configuration Loader
//!
//! Environment-aware loading on top of the `config` crate. Sources are layered
//! in this order, later ones winning:
//!
//! 1. `<dir>/tasklist.toml`
//! 2. `<dir>/environments/<env>.toml` (optional)
//! 3. `TASKLIST_*` environment variables, `__` separating nested keys
//!    (`TASKLIST_LIMITS__MAX_ITEM_BATCH=20`)

use super::error::{ConfigResult, ConfigurationError};
use super::TaskListConfig;
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const BASE_FILE: &str = "tasklist.toml";
const ENV_PREFIX: &str = "TASKLIST";

/// Loaded, validated configuration plus where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: TaskListConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    /// This is useful for testing without modifying global environment variables
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            environment = %environment,
            config_directory = %config_directory.display(),
            "Loading configuration"
        );

        let base_path = config_directory.join(BASE_FILE);
        if !base_path.is_file() {
            return Err(ConfigurationError::config_file_not_found(vec![base_path]));
        }

        let env_path = config_directory
            .join("environments")
            .join(format!("{environment}.toml"));

        let merged = Config::builder()
            .add_source(Self::toml_source(&base_path))
            .add_source(Self::toml_source(&env_path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: TaskListConfig = merged.try_deserialize()?;
        config.validate()?;

        info!(
            environment = %environment,
            max_item_batch = config.limits.max_item_batch,
            max_list_batch = config.limits.max_list_batch,
            element_timeout_ms = config.batch.element_timeout_ms,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Wrap an already-built configuration, validating it first
    pub fn from_config(config: TaskListConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: Self::detect_environment(),
            config_directory: PathBuf::from("config"),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &TaskListConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect current environment: TASKLIST_ENV || APP_ENV || 'development'
    pub fn detect_environment() -> String {
        env::var("TASKLIST_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn toml_source(path: &Path) -> File<config::FileSourceFile, FileFormat> {
        File::from(path.to_path_buf()).format(FileFormat::Toml)
    }
}
