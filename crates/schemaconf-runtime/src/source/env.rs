//! Environment variables as a configuration source.

use figment::Figment;
use figment::providers::Env;
use schemaconf_core::{Provider, SourceError, Tree, Value, encode};
use tracing::trace;

/// Reads prefixed environment variables into a nested tree.
///
/// The prefix is stripped, the rest of the name is lowercased and split
/// on the separator (`__` by default):
///
/// - `APP_SERVER__HTTP__ADDR=:8080` becomes `server.http.addr = ":8080"`
/// - `APP_SERVER__HTTP__PORT=8080` becomes `server.http.port = 8080`
///
/// Values that look like booleans or numbers are typed accordingly.
#[derive(Debug, Clone)]
pub struct EnvProvider {
    prefix: String,
    separator: String,
}

impl EnvProvider {
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: "__".to_string(),
        }
    }

    /// Replaces the nesting separator.
    pub fn split(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    fn figment(&self) -> Figment {
        Figment::from(Env::prefixed(&self.prefix).split(self.separator.as_str()))
    }
}

impl Provider for EnvProvider {
    fn read_bytes(&self) -> Result<Vec<u8>, SourceError> {
        let tree = self.read()?;
        encode(&tree).map_err(|e| SourceError::other(e.to_string()))
    }

    fn read(&self) -> Result<Tree, SourceError> {
        let value: Value = self
            .figment()
            .extract()
            .map_err(|e| SourceError::other(format!("environment: {e}")))?;
        match value {
            Value::Mapping(tree) => {
                trace!(prefix = %self.prefix, keys = tree.len(), "Read environment variables");
                Ok(tree)
            }
            Value::Null => Ok(Tree::new()),
            other => Err(SourceError::other(format!(
                "environment produced {} instead of a mapping",
                other.kind()
            ))),
        }
    }

    fn describe(&self) -> String {
        format!("environment {}*", self.prefix)
    }
}
