//! schemaconf Runtime - Loader orchestration and built-in collaborators.
//!
//! This crate provides:
//! - The pipeline orchestrator (`ConfigLoader`, `ConfigLoaderBuilder`)
//! - Providers for files, environment variables and in-memory data
//! - JSON/YAML/TOML parsing through serde decoders
//! - The environment-expansion and merge transformers
//! - The default binder (`JsonBinder`) and validator (`ConstraintValidator`)
//! - Logging configuration
//!
//! # Feature Flags
//!
//! - `yaml-config` *(default)*: YAML documents
//! - `toml-config` *(default)*: TOML documents
//! - `json-log`: JSON log output
//!
//! ```ignore
//! use schemaconf_runtime::prelude::*;
//!
//! let loader = ConfigLoader::builder()
//!     .provider(FileProvider::new("config.yaml"))
//!     .parser(FormatParser::yaml())
//!     .transformer(ExpandEnv::new())
//!     .build()?;
//!
//! let config: AppConfig = loader.load_into()?;
//! ```

pub mod bind;
pub mod format;
pub mod loader;
pub mod logging;
pub mod source;
pub mod transform;
pub mod validate;

// Re-exports
pub use bind::JsonBinder;
pub use format::{Format, FormatParser};
pub use loader::{ConfigLoader, ConfigLoaderBuilder};
pub use logging::{LoggingBuilder, LoggingConfig, SpanEvents};
pub use source::{EnvProvider, FileProvider, StaticProvider};
pub use transform::{ExpandEnv, ExpandError, Merge};
pub use validate::ConstraintValidator;

// Re-export tracing for use by other crates
pub use tracing;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        ConfigLoader, ConstraintValidator, EnvProvider, ExpandEnv, FileProvider, Format,
        FormatParser, JsonBinder, Merge, StaticProvider,
    };
    pub use schemaconf_core::{ConfigError, ConfigResult, Duration, Validate};
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
