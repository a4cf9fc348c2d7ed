//! The boundary between the encoded tree and a typed schema message.

use std::fmt;

use serde::de::{self, DeserializeOwned, Deserializer, Visitor};

use crate::error::BindError;

/// Maps an encoded tree onto a typed target.
///
/// Fields present in the encoding but unknown to the target are discarded,
/// not rejected.
pub trait SchemaBinder: Send + Sync {
    fn unmarshal(&self, encoded: &[u8], target: &mut dyn BindTarget) -> Result<(), BindError>;
}

/// Boxed schema binder.
pub type BoxedSchemaBinder = Box<dyn SchemaBinder>;

/// Object-safe view of a value that a binder can populate.
///
/// Implemented for every `T: DeserializeOwned`.
pub trait BindTarget {
    /// Rust type name of the target.
    fn target_name(&self) -> &'static str;

    /// Returns `true` if the target type is shaped like a message, i.e. it
    /// deserializes from a map or struct.
    fn accepts_mapping(&self) -> bool;

    /// Replaces the target with the value read from `de`.
    ///
    /// Failures inside the document name the offending field path.
    fn bind_json(
        &mut self,
        de: &mut serde_json::Deserializer<serde_json::de::SliceRead<'_>>,
    ) -> Result<(), BindError>;
}

impl<T: DeserializeOwned> BindTarget for T {
    fn target_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn accepts_mapping(&self) -> bool {
        is_message::<T>()
    }

    fn bind_json(
        &mut self,
        de: &mut serde_json::Deserializer<serde_json::de::SliceRead<'_>>,
    ) -> Result<(), BindError> {
        let target = std::any::type_name::<T>();
        *self = serde_path_to_error::deserialize(&mut *de).map_err(|e| {
            let path = e.path().to_string();
            let err = BindError::new(target, e.into_inner());
            if path == "." { err } else { err.at(path) }
        })?;
        de.end().map_err(|e| BindError::new(target, e))
    }
}

/// Returns `true` if `T` asks its deserializer for a map or a struct.
///
/// Detected by driving `T::deserialize` against a deserializer that
/// records the first request it receives and then stops.
pub fn is_message<T: DeserializeOwned>() -> bool {
    match T::deserialize(Probe) {
        Ok(_) => false,
        Err(outcome) => outcome.0,
    }
}

struct Probe;

#[derive(Debug)]
struct ProbeOutcome(bool);

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "message" } else { "not a message" })
    }
}

impl std::error::Error for ProbeOutcome {}

impl de::Error for ProbeOutcome {
    fn custom<M: fmt::Display>(_msg: M) -> Self {
        Self(false)
    }
}

impl<'de> Deserializer<'de> for Probe {
    type Error = ProbeOutcome;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(ProbeOutcome(false))
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(ProbeOutcome(true))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(ProbeOutcome(true))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct enum identifier ignored_any
    }
}
