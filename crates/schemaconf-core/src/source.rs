//! Source-side collaborators: where configuration comes from and how raw
//! bytes become a tree.

use std::sync::Arc;

use crate::error::{ParseError, SourceError};
use crate::value::Tree;

/// A configuration source (file, remote store, environment, ...).
///
/// The loader calls [`read`](Provider::read) when no [`Parser`] is
/// configured and [`read_bytes`](Provider::read_bytes) otherwise. Trees
/// returned by `read` must be nested (`{server: {http: {addr: ..}}}`), not
/// flat dotted keys.
pub trait Provider: Send + Sync {
    /// Returns the raw configuration bytes, to be decoded by a [`Parser`].
    fn read_bytes(&self) -> Result<Vec<u8>, SourceError>;

    /// Returns the configuration already decoded into a tree.
    fn read(&self) -> Result<Tree, SourceError>;

    /// Human-readable description used in logs.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// A configuration format decoder.
pub trait Parser: Send + Sync {
    /// Decodes raw bytes into a tree.
    fn unmarshal(&self, data: &[u8]) -> Result<Tree, ParseError>;

    /// Format name used in errors and logs.
    fn format(&self) -> &str;
}

/// Boxed provider.
pub type BoxedProvider = Box<dyn Provider>;

/// Boxed parser.
pub type BoxedParser = Box<dyn Parser>;

impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn read_bytes(&self) -> Result<Vec<u8>, SourceError> {
        (**self).read_bytes()
    }

    fn read(&self) -> Result<Tree, SourceError> {
        (**self).read()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<P: Parser + ?Sized> Parser for Arc<P> {
    fn unmarshal(&self, data: &[u8]) -> Result<Tree, ParseError> {
        (**self).unmarshal(data)
    }

    fn format(&self) -> &str {
        (**self).format()
    }
}
