//! In-memory configuration, for defaults and tests.

use schemaconf_core::{Provider, SourceError, Tree, decode, encode};

/// Serves a fixed tree or a fixed byte buffer.
///
/// A byte buffer is returned unchanged by `read_bytes`; `read` decodes it
/// as JSON. A tree is returned by `read`; `read_bytes` encodes it as JSON.
#[derive(Debug, Clone)]
pub enum StaticProvider {
    Tree(Tree),
    Bytes(Vec<u8>),
}

impl StaticProvider {
    pub fn tree(tree: Tree) -> Self {
        Self::Tree(tree)
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl Provider for StaticProvider {
    fn read_bytes(&self) -> Result<Vec<u8>, SourceError> {
        match self {
            Self::Tree(tree) => encode(tree).map_err(|e| SourceError::other(e.to_string())),
            Self::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    fn read(&self) -> Result<Tree, SourceError> {
        match self {
            Self::Tree(tree) => Ok(tree.clone()),
            Self::Bytes(bytes) => decode(bytes).map_err(|e| SourceError::other(e.to_string())),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Tree(_) => "static tree".to_string(),
            Self::Bytes(bytes) => format!("static buffer ({} bytes)", bytes.len()),
        }
    }
}
