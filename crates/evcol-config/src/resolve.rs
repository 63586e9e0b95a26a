//! Config resolution: CLI → env → config file → defaults.
//!
//! A missing file at the default location is not an error; the built-in
//! defaults apply. A missing file at an explicitly requested path is.

use crate::pipeline::{PipelineConfig, UnderflowPolicy};
use crate::CONFIG_FILE_NAME;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Env var naming an explicit config file.
pub const ENV_CONFIG: &str = "EVCOL_CONFIG";
/// Env override for `x_offset`.
pub const ENV_X_OFFSET: &str = "EVCOL_X_OFFSET";
/// Env override for `y_offset`.
pub const ENV_Y_OFFSET: &str = "EVCOL_Y_OFFSET";
/// Env override for `capacity_hint`.
pub const ENV_CAPACITY_HINT: &str = "EVCOL_CAPACITY_HINT";

/// Errors from config loading and resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

/// Where the file layer of a resolved config came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ConfigOrigin {
    /// A config file was found and loaded.
    File(PathBuf),
    /// No config file; built-in defaults.
    Defaults,
}

/// Command-line overrides. `None` leaves the lower layer in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub x_offset: Option<i64>,
    pub y_offset: Option<i64>,
    pub capacity_hint: Option<usize>,
    pub underflow: Option<UnderflowPolicy>,
    pub start_ts: Option<i64>,
    pub delta_t: Option<i64>,
    pub max_duration: Option<i64>,
    pub compression_level: Option<i32>,
}

/// Outcome of [`resolve_config`].
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub config: PipelineConfig,
    pub origin: ConfigOrigin,
}

/// Default config file location (`$XDG_CONFIG_HOME/evcol/config.json`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("evcol").join(CONFIG_FILE_NAME))
}

/// Load and parse one config file.
pub fn load_config_file(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve the effective configuration from the process environment.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig, ConfigError> {
    resolve_config_with_env(overrides, |var| std::env::var(var).ok())
}

/// Resolve the effective configuration with an injectable env lookup.
pub fn resolve_config_with_env<F>(
    overrides: &ConfigOverrides,
    env: F,
) -> Result<ResolvedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = overrides
        .config_path
        .clone()
        .or_else(|| env(ENV_CONFIG).map(PathBuf::from));

    let (mut config, origin) = match explicit {
        Some(path) => (load_config_file(&path)?, ConfigOrigin::File(path)),
        None => match default_config_path() {
            Some(path) if path.is_file() => (load_config_file(&path)?, ConfigOrigin::File(path)),
            _ => (PipelineConfig::default(), ConfigOrigin::Defaults),
        },
    };

    if let Some(v) = parse_env::<i64, _>(&env, ENV_X_OFFSET)? {
        config.x_offset = v;
    }
    if let Some(v) = parse_env::<i64, _>(&env, ENV_Y_OFFSET)? {
        config.y_offset = v;
    }
    if let Some(v) = parse_env::<usize, _>(&env, ENV_CAPACITY_HINT)? {
        config.capacity_hint = v;
    }

    apply_overrides(&mut config, overrides);

    Ok(ResolvedConfig { config, origin })
}

fn parse_env<T, F>(env: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match env(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
    }
}

fn apply_overrides(config: &mut PipelineConfig, o: &ConfigOverrides) {
    if let Some(input) = &o.input {
        config.input = Some(input.clone());
    }
    if let Some(output) = &o.output {
        config.output = Some(output.clone());
    }
    if let Some(v) = o.x_offset {
        config.x_offset = v;
    }
    if let Some(v) = o.y_offset {
        config.y_offset = v;
    }
    if let Some(v) = o.capacity_hint {
        config.capacity_hint = v;
    }
    if let Some(v) = o.underflow {
        config.underflow = v;
    }
    if let Some(v) = o.start_ts {
        config.source.start_ts = v;
    }
    if let Some(v) = o.delta_t {
        config.source.delta_t = v;
    }
    if let Some(v) = o.max_duration {
        config.source.max_duration = Some(v);
    }
    if let Some(v) = o.compression_level {
        config.writer.compression_level = v;
    }
}
