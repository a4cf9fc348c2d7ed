//! Built-in transformers.
//!
//! - [`ExpandEnv`] - shell-style `${NAME}` expansion over string leaves
//! - [`Merge`] - deep merge of an overlay tree or a second provider
//!
//! Closures `Fn(Tree) -> Result<Tree, BoxError>` and
//! [`ByteTransformer`](schemaconf_core::ByteTransformer) cover ad hoc steps.

mod expand_env;
mod merge;

pub use expand_env::{ExpandEnv, ExpandError, Lookup, UnterminatedReference, expand_str};
pub use merge::{Merge, deep_merge};
