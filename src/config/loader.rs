//! Configuration Loader
//!
//! Layers built-in defaults, an optional TOML file and `FLEETCHECK__*`
//! environment variables with the `config` crate, then validates the result.

use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

use super::error::{ConfigResult, ConfigurationError};
use super::FleetConfig;
use crate::constants::{CONFIG_ENV_PREFIX, DEFAULT_CONFIG_FILE};

/// Keys whose environment values are comma-separated lists
const LIST_KEYS: [&str; 3] = [
    "diagnostics.critical_checks",
    "diagnostics.infra_namespaces",
    "ssh.extra_options",
];

/// Load configuration.
///
/// An explicit `path` must exist; without one, `./fleetcheck.toml` is used
/// only if present.
pub fn load(path: Option<&Path>) -> ConfigResult<FleetConfig> {
    let defaults = Config::try_from(&FleetConfig::default())
        .map_err(|e| ConfigurationError::load_error("defaults", e))?;

    let mut builder = Config::builder().add_source(defaults);

    builder = match path {
        Some(explicit) => {
            if !explicit.is_file() {
                return Err(ConfigurationError::FileNotFound {
                    path: explicit.display().to_string(),
                });
            }
            debug!(path = %explicit.display(), "Loading configuration file");
            builder.add_source(File::from(explicit).format(FileFormat::Toml).required(true))
        }
        None => builder.add_source(
            File::from(Path::new(DEFAULT_CONFIG_FILE))
                .format(FileFormat::Toml)
                .required(false),
        ),
    };

    builder = builder.add_source(environment_source());

    let config: FleetConfig = builder
        .build()
        .map_err(|e| ConfigurationError::load_error(source_name(path), e))?
        .try_deserialize()
        .map_err(|e| ConfigurationError::load_error(source_name(path), e))?;

    config.validate()?;

    debug!(
        timeout_ms = config.executor.timeout_ms,
        max_attempts = config.retry.max_attempts,
        pool_size = config.fanout.pool_size,
        "Configuration loaded"
    );

    Ok(config)
}

fn environment_source() -> Environment {
    let mut env = Environment::with_prefix(CONFIG_ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .try_parsing(true);
    for key in LIST_KEYS {
        env = env.with_list_parse_key(key);
    }
    env
}

fn source_name(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| format!("defaults/{DEFAULT_CONFIG_FILE}/environment"))
}
