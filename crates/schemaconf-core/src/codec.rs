//! Lossless bridge between a [`Tree`] and its linear JSON encoding.
//!
//! The encoding is what the schema binder consumes. `decode(encode(t))`
//! yields a tree equal to `t` for every valid tree: integers stay exact,
//! floats use the shortest representation that parses back to the same
//! bit pattern, and string contents are escaped so they never reopen
//! structure.

use crate::error::CodecError;
use crate::value::{Tree, Value};

/// Turns the final tree into the byte form handed to the binder.
pub trait Encoder: Send + Sync {
    fn encode(&self, tree: &Tree) -> Result<Vec<u8>, CodecError>;
}

/// The default encoder: compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode(&self, tree: &Tree) -> Result<Vec<u8>, CodecError> {
        encode(tree)
    }
}

/// Encodes a tree as compact JSON.
pub fn encode(tree: &Tree) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(tree).map_err(CodecError::Encode)
}

/// Decodes JSON bytes into a tree. The document root must be a mapping.
pub fn decode(bytes: &[u8]) -> Result<Tree, CodecError> {
    match serde_json::from_slice::<Value>(bytes).map_err(CodecError::Decode)? {
        Value::Mapping(tree) => Ok(tree),
        other => Err(CodecError::NotAMapping { found: other.kind() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Mapping, Number};
    use proptest::prelude::*;

    fn arb_key() -> impl Strategy<Value = String> {
        // Structural characters are deliberately part of the alphabet.
        "[a-z_{}\"\\\\:,\\[\\] ]{1,8}"
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| Value::Number(n.into())),
            any::<u64>().prop_map(|n| Value::Number(n.into())),
            any::<f64>()
                .prop_filter_map("finite", Number::from_f64)
                .prop_map(Value::Number),
            ".*".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Sequence),
                prop::collection::vec((arb_key(), inner), 0..6)
                    .prop_map(|pairs| Value::Mapping(pairs.into_iter().collect::<Mapping>())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(pairs in prop::collection::vec((arb_key(), arb_value()), 0..8)) {
            let tree: Tree = pairs.into_iter().collect();
            let bytes = encode(&tree).unwrap();
            prop_assert_eq!(decode(&bytes).unwrap(), tree);
        }
    }

    #[test]
    fn test_structural_characters_stay_inside_strings() {
        let tree = crate::tree! {
            "a" => r#"x", "b": {"c": 1}, "d": ""#,
            "b" => 2_i64,
        };
        let decoded = decode(&encode(&tree).unwrap()).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded, tree);
    }

    #[test]
    fn test_key_order_survives_round_trip() {
        let tree = crate::tree! { "zeta" => 1_i64, "alpha" => 2_i64, "mid" => 3_i64 };
        let decoded = decode(&encode(&tree).unwrap()).unwrap();
        let keys: Vec<_> = decoded.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_decode_rejects_non_mapping_root() {
        let err = decode(b"[1, 2]").unwrap_err();
        assert!(matches!(err, CodecError::NotAMapping { found: "sequence" }));
    }

    #[test]
    fn test_large_integers_are_exact() {
        let tree = crate::tree! { "big" => u64::MAX, "small" => i64::MIN };
        let decoded = decode(&encode(&tree).unwrap()).unwrap();
        assert_eq!(decoded["big"].as_number().and_then(Number::as_u64), Some(u64::MAX));
        assert_eq!(decoded["small"].as_number().and_then(Number::as_i64), Some(i64::MIN));
    }
}
