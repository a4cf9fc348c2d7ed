//! Core types for the schemaconf configuration pipeline.
//!
//! This crate provides:
//! - The value tree every source decodes into (`Value`, `Tree`)
//! - The lossless JSON bridge between a tree and the binder input (`codec`)
//! - Collaborator traits: `Provider`, `Parser`, `Transformer`,
//!   `SchemaBinder`, `Validator`, `Encoder`
//! - The ordered transformer chain
//! - Declarative field constraints (`Validate` and its rule helpers)
//! - The pipeline error taxonomy
//!
//! The orchestrating `ConfigLoader` and the concrete sources live in
//! `schemaconf-runtime`.

pub mod bind;
pub mod codec;
pub mod duration;
pub mod error;
pub mod path;
pub mod source;
pub mod transform;
pub mod validate;
pub mod value;

pub use bind::{BindTarget, BoxedSchemaBinder, SchemaBinder, is_message};
pub use codec::{Encoder, JsonEncoder, decode, encode};
pub use duration::Duration;
pub use error::{
    BindError, BoxError, CodecError, ConfigError, ConfigResult, ParseError, Position,
    SourceError, ValidationError, Violation,
};
pub use path::{FieldPath, PathSegment};
pub use source::{BoxedParser, BoxedProvider, Parser, Provider};
pub use transform::{BoxedTransformer, ByteTransformer, TransformChain, Transformer};
pub use validate::{BoxedValidator, Report, Validate, Validator};
pub use value::{Mapping, Number, Tree, Value, get_path};

#[doc(hidden)]
pub mod __private {
    pub use regex::Regex;
    pub use std::sync::OnceLock;
}
