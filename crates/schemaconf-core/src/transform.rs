//! Transformers and the ordered chain that applies them.

use std::fmt;

use tracing::{debug, trace};

use crate::codec;
use crate::error::{BoxError, ConfigError, ConfigResult};
use crate::value::Tree;

/// A fallible rewrite of a configuration tree.
///
/// Transformers receive the output of the previous one and hand ownership
/// of their result to the next.
pub trait Transformer: Send + Sync {
    fn transform(&self, tree: Tree) -> Result<Tree, BoxError>;

    /// Name reported in errors and logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Transformer for F
where
    F: Fn(Tree) -> Result<Tree, BoxError> + Send + Sync,
{
    fn transform(&self, tree: Tree) -> Result<Tree, BoxError> {
        self(tree)
    }
}

/// Boxed transformer.
pub type BoxedTransformer = Box<dyn Transformer>;

// =============================================================================
// Chain
// =============================================================================

/// Transformers applied left to right in registration order.
///
/// `run(t)` is `tN(...t1(t))`. The first failure aborts the chain; the
/// tree it was working on is dropped with the error.
#[derive(Default)]
pub struct TransformChain {
    transformers: Vec<BoxedTransformer>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transformer to the end of the chain.
    pub fn push(&mut self, transformer: impl Transformer + 'static) {
        self.transformers.push(Box::new(transformer));
    }

    /// Appends an already boxed transformer.
    pub fn push_boxed(&mut self, transformer: BoxedTransformer) {
        self.transformers.push(transformer);
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Transformer names in the order they run.
    pub fn names(&self) -> Vec<&str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    /// Runs every transformer over `tree`.
    pub fn run(&self, tree: Tree) -> ConfigResult<Tree> {
        let mut current = tree;
        for (index, transformer) in self.transformers.iter().enumerate() {
            let name = transformer.name();
            trace!(index, transformer = name, keys = current.len(), "Applying transformer");
            current = transformer
                .transform(current)
                .map_err(|source| ConfigError::transform(index, name, source))?;
        }
        debug!(count = self.transformers.len(), "Transformer chain finished");
        Ok(current)
    }
}

impl fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformChain")
            .field("transformers", &self.names())
            .finish()
    }
}

impl FromIterator<BoxedTransformer> for TransformChain {
    fn from_iter<I: IntoIterator<Item = BoxedTransformer>>(iter: I) -> Self {
        Self {
            transformers: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Byte-Level Adapter
// =============================================================================

/// Adapts a rewrite over the encoded byte form into a tree transformer.
///
/// The tree is encoded once, handed to the function, and the result is
/// decoded exactly once. The function sees the encoding as a whole, so it
/// is responsible for not emitting bytes that change structure (for
/// example unescaped quotes inside a string).
pub struct ByteTransformer<F> {
    name: String,
    rewrite: F,
}

impl<F> ByteTransformer<F>
where
    F: Fn(Vec<u8>) -> Result<Vec<u8>, BoxError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, rewrite: F) -> Self {
        Self {
            name: name.into(),
            rewrite,
        }
    }
}

impl<F> Transformer for ByteTransformer<F>
where
    F: Fn(Vec<u8>) -> Result<Vec<u8>, BoxError> + Send + Sync,
{
    fn transform(&self, tree: Tree) -> Result<Tree, BoxError> {
        let encoded = codec::encode(&tree)?;
        let rewritten = (self.rewrite)(encoded)?;
        Ok(codec::decode(&rewritten)?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
