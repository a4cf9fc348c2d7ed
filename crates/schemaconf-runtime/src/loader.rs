//! Configuration loader orchestrating the pipeline.
//!
//! A load cycle runs four stages, each owned by a pluggable collaborator:
//!
//! 1. **Read** - the [`Provider`] yields a tree, or raw bytes that the
//!    [`Parser`] decodes into one
//! 2. **Transform** - the [`TransformChain`] rewrites the tree in
//!    registration order
//! 3. **Bind** - the tree is encoded and the [`SchemaBinder`] maps it onto
//!    the caller's schema type
//! 4. **Validate** - the [`Validator`] checks the bound message
//!
//! [`ConfigLoader::load`] runs stages 1 and 2 and keeps the result;
//! [`ConfigLoader::scan`] runs stages 3 and 4 against it.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemaconf_runtime::format::FormatParser;
//! use schemaconf_runtime::source::FileProvider;
//! use schemaconf_runtime::transform::ExpandEnv;
//! use schemaconf_runtime::ConfigLoader;
//!
//! let loader = ConfigLoader::builder()
//!     .provider(FileProvider::new("config.yaml"))
//!     .parser(FormatParser::yaml())
//!     .transformer(ExpandEnv::new())
//!     .build()?;
//!
//! loader.load()?;
//! let mut bootstrap = Bootstrap::default();
//! loader.scan(&mut bootstrap)?;
//! ```

use std::fmt;

use parking_lot::Mutex;
use schemaconf_core::{
    BoxedParser, BoxedProvider, BoxedSchemaBinder, BoxedTransformer, BoxedValidator, ConfigError,
    ConfigResult, Encoder, JsonEncoder, Parser, Provider, SchemaBinder, TransformChain,
    Transformer, Tree, Validate, Validator, is_message,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::bind::JsonBinder;
use crate::validate::ConstraintValidator;

/// Builder for [`ConfigLoader`].
///
/// Only the provider is mandatory. Without a parser the provider must
/// decode its own data. Encoder, binder and validator default to
/// [`JsonEncoder`], [`JsonBinder`] and [`ConstraintValidator`].
#[derive(Default)]
pub struct ConfigLoaderBuilder {
    provider: Option<BoxedProvider>,
    parser: Option<BoxedParser>,
    chain: TransformChain,
    encoder: Option<Box<dyn Encoder>>,
    binder: Option<BoxedSchemaBinder>,
    validator: Option<BoxedValidator>,
}

impl ConfigLoaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration source.
    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Sets the decoder for the provider's raw bytes.
    pub fn parser(mut self, parser: impl Parser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Appends a transformer; transformers run in the order added.
    pub fn transformer(mut self, transformer: impl Transformer + 'static) -> Self {
        self.chain.push(transformer);
        self
    }

    /// Appends several boxed transformers, keeping their order.
    pub fn transformers<I>(mut self, transformers: I) -> Self
    where
        I: IntoIterator<Item = BoxedTransformer>,
    {
        for transformer in transformers {
            self.chain.push_boxed(transformer);
        }
        self
    }

    pub fn encoder(mut self, encoder: impl Encoder + 'static) -> Self {
        self.encoder = Some(Box::new(encoder));
        self
    }

    pub fn binder(mut self, binder: impl SchemaBinder + 'static) -> Self {
        self.binder = Some(Box::new(binder));
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Builds the loader.
    ///
    /// Fails with [`ConfigError::NoProvider`] if no provider was set.
    pub fn build(self) -> ConfigResult<ConfigLoader> {
        let provider = self.provider.ok_or(ConfigError::NoProvider)?;

        debug!(
            source = %provider.describe(),
            parser = self.parser.as_ref().map(|p| p.format()),
            transformers = ?self.chain.names(),
            "Configuration loader built"
        );

        Ok(ConfigLoader {
            provider,
            parser: self.parser,
            chain: self.chain,
            encoder: self.encoder.unwrap_or_else(|| Box::new(JsonEncoder)),
            binder: self.binder.unwrap_or_else(|| Box::new(JsonBinder)),
            validator: self
                .validator
                .unwrap_or_else(|| Box::new(ConstraintValidator::new())),
            tree: Mutex::new(None),
        })
    }
}

/// Loads configuration through the provider, parser and transformer
/// chain, then binds and validates it onto schema types.
///
/// The loader is `Send + Sync`. Its collaborators are fixed at build time;
/// the last loaded tree sits behind a mutex and is replaced by every
/// [`load`](Self::load).
pub struct ConfigLoader {
    provider: BoxedProvider,
    parser: Option<BoxedParser>,
    chain: TransformChain,
    encoder: Box<dyn Encoder>,
    binder: BoxedSchemaBinder,
    validator: BoxedValidator,
    tree: Mutex<Option<Tree>>,
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("provider", &self.provider.describe())
            .field("parser", &self.parser.as_ref().map(|p| p.format()))
            .field("chain", &self.chain)
            .field("loaded", &self.tree.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl ConfigLoader {
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder::new()
    }

    /// Reads and transforms the configuration, replacing the stored tree.
    ///
    /// On failure the stored tree is cleared, so a later
    /// [`scan`](Self::scan) reports [`ConfigError::NotLoaded`] instead of
    /// binding stale data.
    pub fn load(&self) -> ConfigResult<()> {
        let result = self.read().and_then(|tree| self.chain.run(tree));

        let mut slot = self.tree.lock();
        match result {
            Ok(tree) => {
                info!(
                    source = %self.provider.describe(),
                    keys = tree.len(),
                    transformers = self.chain.len(),
                    "Configuration loaded"
                );
                *slot = Some(tree);
                Ok(())
            }
            Err(err) => {
                *slot = None;
                Err(err)
            }
        }
    }

    fn read(&self) -> ConfigResult<Tree> {
        match &self.parser {
            None => {
                debug!(source = %self.provider.describe(), "Reading decoded configuration");
                Ok(self.provider.read()?)
            }
            Some(parser) => {
                let bytes = self.provider.read_bytes()?;
                debug!(
                    source = %self.provider.describe(),
                    format = parser.format(),
                    bytes = bytes.len(),
                    "Parsing configuration"
                );
                Ok(parser.unmarshal(&bytes)?)
            }
        }
    }

    /// Binds the loaded tree onto `target` and validates it.
    ///
    /// `target` is overwritten on successful binding, even if validation
    /// then fails.
    pub fn scan<T>(&self, target: &mut T) -> ConfigResult<()>
    where
        T: DeserializeOwned + Validate,
    {
        let target_name = std::any::type_name::<T>();
        let encoded = {
            let slot = self.tree.lock();
            let tree = slot.as_ref().ok_or(ConfigError::NotLoaded)?;
            if !is_message::<T>() {
                return Err(ConfigError::TargetType {
                    target: target_name.to_string(),
                });
            }
            self.encoder.encode(tree)?
        };

        self.binder.unmarshal(&encoded, &mut *target)?;
        debug!(target = target_name, "Configuration bound");

        if let Err(err) = self.validator.validate(&*target) {
            warn!(
                target = target_name,
                violations = err.violations.len(),
                "Configuration failed validation"
            );
            return Err(err.into());
        }
        Ok(())
    }

    /// Loads the configuration and scans it into a fresh `T`.
    pub fn load_into<T>(&self) -> ConfigResult<T>
    where
        T: DeserializeOwned + Validate + Default,
    {
        self.load()?;
        let mut target = T::default();
        self.scan(&mut target)?;
        Ok(target)
    }

    /// Returns a copy of the last loaded tree.
    pub fn tree(&self) -> Option<Tree> {
        self.tree.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use schemaconf_core::{BoxError, Duration, SourceError, Value, tree};
    use schemaconf_macros::Validate;
    use serde::Deserialize;

    use super::*;
    use crate::format::FormatParser;
    use crate::source::{EnvProvider, FileProvider, StaticProvider};
    use crate::transform::{ExpandEnv, Merge};

    #[derive(Debug, Default, Deserialize, Validate)]
    #[serde(default)]
    struct Bootstrap {
        server: Server,
    }

    #[derive(Debug, Default, Deserialize, Validate)]
    #[serde(default)]
    struct Server {
        http: Http,
    }

    #[derive(Debug, Default, Deserialize, Validate)]
    #[serde(default)]
    struct Http {
        #[validate(required)]
        addr: String,
        timeout: Duration,
    }

    const JSON: &str = r#"{"server": {"http": {"addr": "${HTTP_ADDR}", "timeout": "1s"}}}"#;

    fn expand_with(addr: Option<&'static str>) -> ExpandEnv {
        ExpandEnv::new().with_lookup(move |name| match name {
            "HTTP_ADDR" => addr.map(str::to_string),
            _ => None,
        })
    }

    /// Records which read method the loader used.
    #[derive(Default)]
    struct RecordingProvider {
        tree: Tree,
        read_calls: AtomicUsize,
        read_bytes_called: AtomicBool,
    }

    impl Provider for RecordingProvider {
        fn read_bytes(&self) -> Result<Vec<u8>, SourceError> {
            self.read_bytes_called.store(true, Ordering::SeqCst);
            Err(SourceError::other("read_bytes must not be called"))
        }

        fn read(&self) -> Result<Tree, SourceError> {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.tree.clone())
        }
    }

    #[test]
    fn test_loader_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConfigLoader>();
    }

    #[test]
    fn test_build_requires_provider() {
        let err = ConfigLoader::builder()
            .parser(FormatParser::json())
            .transformer(ExpandEnv::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoProvider));
    }

    #[test]
    fn test_expands_binds_and_validates() {
        let loader = ConfigLoader::builder()
            .provider(StaticProvider::bytes(JSON))
            .parser(FormatParser::json())
            .transformer(expand_with(Some("localhost:8080")))
            .build()
            .unwrap();

        let bootstrap: Bootstrap = loader.load_into().unwrap();
        assert_eq!(bootstrap.server.http.addr, "localhost:8080");
        assert_eq!(bootstrap.server.http.timeout, Duration::from_secs(1));
    }

    #[cfg(feature = "yaml-config")]
    #[test]
    fn test_yaml_document_end_to_end() {
        let yaml = "server:\n  http:\n    addr: ${HTTP_ADDR}\n    timeout: 0.200s\n";
        let loader = ConfigLoader::builder()
            .provider(StaticProvider::bytes(yaml))
            .parser(FormatParser::yaml())
            .transformer(expand_with(Some("localhost:8080")))
            .build()
            .unwrap();

        let bootstrap: Bootstrap = loader.load_into().unwrap();
        assert_eq!(bootstrap.server.http.addr, "localhost:8080");
        assert_eq!(bootstrap.server.http.timeout, Duration::from_millis(200));
    }

    #[test]
    fn test_unset_variable_fails_validation() {
        let loader = ConfigLoader::builder()
            .provider(StaticProvider::bytes(JSON))
            .parser(FormatParser::json())
            .transformer(expand_with(None))
            .build()
            .unwrap();

        loader.load().unwrap();
        let mut bootstrap = Bootstrap::default();
        let err = loader.scan(&mut bootstrap).unwrap_err();

        let validation = err.as_validation().unwrap();
        assert_eq!(validation.violations.len(), 1);
        let violation = &validation.violations[0];
        assert_eq!(violation.field_path(), "server.http.addr");
        assert_eq!(violation.constraint_id(), "required");
        assert_eq!(violation.message(), "value is required");
        assert!(err.to_string().contains("server.http.addr: value is required"));
    }

    #[test]
    fn test_absent_field_fails_validation() {
        let loader = ConfigLoader::builder()
            .provider(StaticProvider::bytes(r#"{"server": {"http": {}}}"#))
            .parser(FormatParser::json())
            .transformer(expand_with(Some("localhost:8080")))
            .build()
            .unwrap();

        let err = loader.load_into::<Bootstrap>().unwrap_err();
        let first = err.as_validation().and_then(|v| v.first()).unwrap();
        assert_eq!(first.field_path(), "server.http.addr");
        assert_eq!(first.constraint_id(), "required");
        assert_eq!(first.message(), "value is required");
    }

    #[test]
    fn test_without_parser_only_read_is_used() {
        let provider = Arc::new(RecordingProvider {
            tree: tree! { "server" => tree! { "http" => tree! { "addr" => "${HTTP_ADDR}" } } },
            ..Default::default()
        });
        let loader = ConfigLoader::builder()
            .provider(Arc::clone(&provider))
            .transformer(expand_with(Some(":9090")))
            .build()
            .unwrap();

        let bootstrap: Bootstrap = loader.load_into().unwrap();
        assert_eq!(bootstrap.server.http.addr, ":9090");
        assert_eq!(provider.read_calls.load(Ordering::SeqCst), 1);
        assert!(!provider.read_bytes_called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_custom_transformer_can_empty_the_tree() {
        let loader = ConfigLoader::builder()
            .provider(StaticProvider::bytes(JSON))
            .parser(FormatParser::json())
            .transformer(expand_with(Some("localhost:8080")))
            .transformer(|_tree: Tree| -> Result<Tree, BoxError> { Ok(Tree::new()) })
            .build()
            .unwrap();

        loader.load().unwrap();
        assert_eq!(loader.tree(), Some(Tree::new()));

        let mut bootstrap = Bootstrap::default();
        let err = loader.scan(&mut bootstrap).unwrap_err();
        assert_eq!(
            err.as_validation().and_then(|v| v.first()).map(|v| v.field_path()),
            Some("server.http.addr")
        );
    }

    #[test]
    fn test_invalid_duration_is_a_bind_error() {
        let loader = ConfigLoader::builder()
            .provider(StaticProvider::tree(tree! {
                "server" => tree! { "http" => tree! { "addr" => "x", "timeout" => "abc" } },
            }))
            .build()
            .unwrap();

        loader.load().unwrap();
        let err = loader.scan(&mut Bootstrap::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Bind(_)));
        assert!(err.to_string().contains("invalid duration \"abc\""));
        assert!(err.to_string().contains("server.http.timeout"));
    }

    #[test]
    fn test_bind_error_names_the_field_path() {
        let loader = ConfigLoader::builder()
            .provider(StaticProvider::bytes(r#"{"server": {"http": {"addr": 5}}}"#))
            .parser(FormatParser::json())
            .build()
            .unwrap();

        loader.load().unwrap();
        let err = loader.scan(&mut Bootstrap::default()).unwrap_err();
        let ConfigError::Bind(bind) = &err else {
            panic!("expected a bind error, got {err:?}");
        };
        assert_eq!(bind.path.as_deref(), Some("server.http.addr"));
        assert!(err.to_string().contains("server.http.addr"));
    }

    #[test]
    fn test_transformer_failure_stops_the_chain() {
        let third_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&third_ran);
        let loader = ConfigLoader::builder()
            .provider(StaticProvider::bytes(JSON))
            .parser(FormatParser::json())
            .transformers([
                Box::new(expand_with(Some("a"))) as BoxedTransformer,
                Box::new(|_tree: Tree| -> Result<Tree, BoxError> { Err("boom".into()) }),
                Box::new(move |tree: Tree| -> Result<Tree, BoxError> {
                    flag.store(true, Ordering::SeqCst);
                    Ok(tree)
                }),
            ])
            .build()
            .unwrap();

        let err = loader.load().unwrap_err();
        match &err {
            ConfigError::Transform { index, source, .. } => {
                assert_eq!(*index, 1);
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!third_ran.load(Ordering::SeqCst));
        assert!(loader.tree().is_none());
    }

    #[test]
    fn test_expansion_errors_surface_as_transform_errors() {
        let loader = ConfigLoader::builder()
            .provider(StaticProvider::tree(tree! { "addr" => "${UNTERMINATED" }))
            .transformer(ExpandEnv::new())
            .build()
            .unwrap();

        let err = loader.load().unwrap_err();
        assert!(matches!(err, ConfigError::Transform { index: 0, .. }));
        assert!(err.to_string().contains("expand-env"));
    }

    #[test]
    fn test_scan_before_load() {
        let loader = ConfigLoader::builder()
            .provider(StaticProvider::tree(Tree::new()))
            .build()
            .unwrap();

        let err = loader.scan(&mut Bootstrap::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NotLoaded));
    }

    #[test]
    fn test_failed_load_clears_previous_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"server": {"http": {"addr": "first"}}}"#).unwrap();

        let loader = ConfigLoader::builder()
            .provider(FileProvider::new(&path))
            .parser(FormatParser::json())
            .build()
            .unwrap();
        loader.load().unwrap();
        assert!(loader.tree().is_some());

        std::fs::write(&path, "{").unwrap();
        let err = loader.load().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(matches!(
            loader.scan(&mut Bootstrap::default()),
            Err(ConfigError::NotLoaded)
        ));
    }

    #[test]
    fn test_each_load_rereads_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let loader = ConfigLoader::builder()
            .provider(FileProvider::new(&path))
            .parser(FormatParser::json())
            .build()
            .unwrap();

        std::fs::write(&path, r#"{"server": {"http": {"addr": "first"}}}"#).unwrap();
        let first: Bootstrap = loader.load_into().unwrap();
        std::fs::write(&path, r#"{"server": {"http": {"addr": "second"}}}"#).unwrap();
        let second: Bootstrap = loader.load_into().unwrap();

        assert_eq!(first.server.http.addr, "first");
        assert_eq!(second.server.http.addr, "second");
    }

    #[test]
    fn test_missing_file_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::builder()
            .provider(FileProvider::new(dir.path().join("absent.json")))
            .parser(FormatParser::json())
            .build()
            .unwrap();

        let err = loader.load().unwrap_err();
        assert!(matches!(err, ConfigError::Source(SourceError::NotFound(_))));
    }

    #[test]
    fn test_non_message_target_is_rejected() {
        let loader = ConfigLoader::builder()
            .provider(StaticProvider::tree(tree! { "a" => "b" }))
            .build()
            .unwrap();
        loader.load().unwrap();

        let err = loader.scan(&mut String::new()).unwrap_err();
        assert!(matches!(err, ConfigError::TargetType { .. }));

        let mut map = std::collections::HashMap::<String, Value>::new();
        loader.scan(&mut map).unwrap();
        assert_eq!(map["a"], Value::from("b"));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let loader = ConfigLoader::builder()
            .provider(StaticProvider::tree(tree! {
                "server" => tree! { "http" => tree! { "addr" => "x", "extra" => true } },
                "unrelated" => vec![Value::from(1_i64)],
            }))
            .build()
            .unwrap();

        let bootstrap: Bootstrap = loader.load_into().unwrap();
        assert_eq!(bootstrap.server.http.addr, "x");
    }

    #[test]
    fn test_environment_overlay_then_expansion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"server": {"http": {"addr": "file", "timeout": "2s"}}}"#)
            .unwrap();

        temp_env::with_vars(
            [
                ("SCHEMACONF_LOADER_SERVER__HTTP__ADDR", Some("${LISTEN_HOST}:8080")),
                ("LISTEN_HOST", Some("0.0.0.0")),
            ],
            || {
                let loader = ConfigLoader::builder()
                    .provider(FileProvider::new(&path))
                    .parser(FormatParser::json())
                    .transformer(Merge::from_provider(EnvProvider::prefixed(
                        "SCHEMACONF_LOADER_",
                    )))
                    .transformer(ExpandEnv::new())
                    .build()
                    .unwrap();

                let bootstrap: Bootstrap = loader.load_into().unwrap();
                assert_eq!(bootstrap.server.http.addr, "0.0.0.0:8080");
                assert_eq!(bootstrap.server.http.timeout, Duration::from_secs(2));
            },
        );
    }
}
