//! Default [`SchemaBinder`]: serde over the JSON encoding.

use schemaconf_core::{BindError, BindTarget, SchemaBinder};
use tracing::trace;

/// Binds the encoded tree with `serde_json`.
///
/// Unknown fields are skipped unless the target type opts into
/// `#[serde(deny_unknown_fields)]`. Errors carry the dotted path of the
/// offending field alongside serde's message.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBinder;

impl SchemaBinder for JsonBinder {
    fn unmarshal(&self, encoded: &[u8], target: &mut dyn BindTarget) -> Result<(), BindError> {
        let name = target.target_name();
        trace!(target = name, bytes = encoded.len(), "Binding configuration");
        let mut de = serde_json::Deserializer::from_slice(encoded);
        target.bind_json(&mut de)
    }
}
