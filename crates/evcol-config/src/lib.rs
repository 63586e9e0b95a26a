//! evcol configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the pipeline configuration file
//! - Config resolution (CLI → env → config file → defaults)
//! - Semantic validation

pub mod pipeline;
pub mod resolve;
pub mod validate;

pub use pipeline::{
    PipelineConfig, SourceConfig, UnderflowPolicy, WriterSettings, DEFAULT_COMPRESSION_LEVEL,
    DEFAULT_ROW_GROUP_SIZE,
};
pub use resolve::{
    default_config_path, load_config_file, resolve_config, resolve_config_with_env, ConfigError,
    ConfigOrigin, ConfigOverrides, ResolvedConfig,
};
pub use validate::{validate, ValidationError, ValidationResult};

/// File name looked up under the user config directory.
pub const CONFIG_FILE_NAME: &str = "config.json";
