//! Deep merge of an overlay tree onto the loaded tree.

use schemaconf_core::{BoxError, Provider, Transformer, Tree, Value};
use tracing::trace;

/// Merges `overlay` into `base`.
///
/// Mappings merge key by key, recursively. Any other overlay value
/// replaces the base value outright. New keys are appended in overlay
/// order; existing keys keep their position.
pub fn deep_merge(base: &mut Tree, overlay: Tree) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
                deep_merge(existing, incoming);
            }
            (Some(slot), value) => *slot = value,
            (None, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Transformer that overlays a fixed tree, or a second provider's tree.
///
/// Useful for layering environment overrides on top of a file:
///
/// ```rust,ignore
/// ConfigLoader::builder()
///     .provider(FileProvider::new("config.yaml"))
///     .parser(FormatParser::yaml())
///     .transformer(Merge::from_provider(EnvProvider::prefixed("APP_")))
/// ```
pub struct Merge {
    overlay: Overlay,
}

enum Overlay {
    Tree(Tree),
    Provider(Box<dyn Provider>),
}

impl Merge {
    pub fn new(overlay: Tree) -> Self {
        Self {
            overlay: Overlay::Tree(overlay),
        }
    }

    /// Reads the overlay from `provider` each time the transformer runs.
    pub fn from_provider(provider: impl Provider + 'static) -> Self {
        Self {
            overlay: Overlay::Provider(Box::new(provider)),
        }
    }
}

impl Transformer for Merge {
    fn transform(&self, mut tree: Tree) -> Result<Tree, BoxError> {
        let overlay = match &self.overlay {
            Overlay::Tree(overlay) => overlay.clone(),
            Overlay::Provider(provider) => provider.read()?,
        };
        trace!(keys = overlay.len(), "Merging overlay");
        deep_merge(&mut tree, overlay);
        Ok(tree)
    }

    fn name(&self) -> &str {
        "merge"
    }
}
