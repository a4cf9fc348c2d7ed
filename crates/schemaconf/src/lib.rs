//! # schemaconf
//!
//! Load configuration from pluggable sources, rewrite it through an
//! ordered chain of transformers, bind it onto typed schema structs and
//! check their declarative constraints.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────┐   ┌──────────────────┐   ┌────────┐   ┌────────┐   ┌───────────┐
//! │ Provider │──▶│ Parser │──▶│ Transformer chain│──▶│ Encode │──▶│ Binder │──▶│ Validator │
//! └──────────┘   └────────┘   └──────────────────┘   └────────┘   └────────┘   └───────────┘
//! ```
//!
//! - **Provider**: where configuration comes from (file, environment, memory)
//! - **Parser**: JSON, YAML or TOML bytes to a value tree
//! - **Transformers**: tree rewrites such as `${VAR}` expansion
//! - **Binder**: the tree onto a `serde` schema type
//! - **Validator**: `#[validate(...)]` rules, reported per field path
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use schemaconf::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize, Validate)]
//! #[serde(default)]
//! struct Bootstrap {
//!     server: Server,
//! }
//!
//! #[derive(Debug, Default, Deserialize, Validate)]
//! #[serde(default)]
//! struct Server {
//!     #[validate(required)]
//!     addr: String,
//!     timeout: Duration,
//! }
//!
//! fn main() -> ConfigResult<()> {
//!     let loader = ConfigLoader::builder()
//!         .provider(FileProvider::new("config.yaml"))
//!         .parser(FormatParser::yaml())
//!         .transformer(ExpandEnv::new())
//!         .build()?;
//!
//!     let bootstrap: Bootstrap = loader.load_into()?;
//!     println!("listening on {}", bootstrap.server.addr);
//!     Ok(())
//! }
//! ```
//!
//! `#[derive(Validate)]` expands to paths under `schemaconf_core`, so crates
//! using the derive also depend on `schemaconf-core`.
//!
//! ## Features
//!
//! - `yaml-config`: YAML documents (default)
//! - `toml-config`: TOML documents (default)
//! - `json-log`: JSON log output

pub use schemaconf_core as core;
pub use schemaconf_runtime as runtime;

pub use schemaconf_macros::Validate;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use schemaconf::prelude::*;
/// ```
pub mod prelude {
    // Pipeline
    pub use schemaconf_runtime::{ConfigLoader, ConfigLoaderBuilder};

    // Collaborator traits
    pub use schemaconf_core::{Parser, Provider, SchemaBinder, Transformer, Validator};

    // Built-in collaborators
    pub use schemaconf_runtime::{
        ConstraintValidator, EnvProvider, ExpandEnv, FileProvider, Format, FormatParser,
        JsonBinder, Merge, StaticProvider,
    };

    // Schema support: the trait and its derive share a name
    pub use schemaconf_core::{Duration, Validate};
    pub use schemaconf_macros::Validate;

    // Data and errors
    pub use schemaconf_core::{ConfigError, ConfigResult, Tree, Value};

    // Logging
    pub use schemaconf_runtime::logging::{LoggingBuilder, LoggingConfig, init_from_config};
    pub use schemaconf_runtime::tracing::{debug, error, info, trace, warn};
}
