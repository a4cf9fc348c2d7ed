//! Shell-style environment expansion over string leaves.
//!
//! Every `String` leaf of the tree is scanned left to right for
//! references and rewritten in place; keys, sequence order and non-string
//! leaves are never touched. Supported forms:
//!
//! | Form | Result |
//! |------|--------|
//! | `$NAME`, `${NAME}` | the value, or `""` when unset |
//! | `${NAME:-word}` | the value when set and non-empty, else `word` |
//! | `${NAME:+word}` | `word` when set and non-empty, else `""` |
//!
//! Expansion is single pass: substituted values and words are copied
//! literally and never scanned again. A `$` that does not start one of
//! these forms is kept as is; an unterminated `${` is an error.
//!
//! # Example
//!
//! ```rust
//! use schemaconf_runtime::transform::ExpandEnv;
//!
//! let expand = ExpandEnv::from_pairs([("HTTP_ADDR", "localhost:8080")]);
//! assert_eq!(expand.expand("${HTTP_ADDR}").unwrap(), "localhost:8080");
//! assert_eq!(expand.expand("${MISSING:-fallback}").unwrap(), "fallback");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use schemaconf_core::{BoxError, FieldPath, PathSegment, Transformer, Tree, Value};
use thiserror::Error;
use tracing::debug;

/// Resolves a variable name to its value; `None` means unset.
pub type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Errors reported by [`ExpandEnv`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    /// A `${` without its closing brace.
    #[error("unterminated variable reference at `{path}` (byte {offset}): {raw:?}")]
    Unterminated {
        /// Path of the offending leaf, e.g. `server.http.addr`.
        path: String,
        /// The leaf as it appeared in the tree.
        raw: String,
        /// Byte offset of the `$` that opened the reference.
        offset: usize,
    },
}

/// A `${` with no matching `}` at byte `offset`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unterminated variable reference at byte {offset}")]
pub struct UnterminatedReference {
    pub offset: usize,
}

/// A parsed braced reference.
enum Reference<'a> {
    Plain(&'a str),
    Default { name: &'a str, word: &'a str },
    Alternate { name: &'a str, word: &'a str },
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn name_len(s: &str) -> usize {
    s.bytes().take_while(|b| is_name_byte(*b)).count()
}

/// Byte index of the `}` closing a reference whose body starts `body`.
fn closing_brace(body: &str) -> Option<usize> {
    let mut depth = 1_usize;
    for (i, b) in body.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_braced(body: &str) -> Option<Reference<'_>> {
    let len = name_len(body);
    if len == 0 {
        return None;
    }
    let (name, tail) = body.split_at(len);
    if tail.is_empty() {
        Some(Reference::Plain(name))
    } else if let Some(word) = tail.strip_prefix(":-") {
        Some(Reference::Default { name, word })
    } else if let Some(word) = tail.strip_prefix(":+") {
        Some(Reference::Alternate { name, word })
    } else {
        None
    }
}

fn set_and_non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Expands every reference in `input` using `lookup`.
pub fn expand_str<F>(input: &str, lookup: F) -> Result<String, UnterminatedReference>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];

        if let Some(body) = after.strip_prefix('{') {
            let close = closing_brace(body).ok_or(UnterminatedReference {
                offset: input.len() - rest.len() + dollar,
            })?;
            match parse_braced(&body[..close]) {
                Some(Reference::Plain(name)) => {
                    out.push_str(&lookup(name).unwrap_or_default());
                }
                Some(Reference::Default { name, word }) => {
                    match set_and_non_empty(lookup(name)) {
                        Some(value) => out.push_str(&value),
                        None => out.push_str(word),
                    }
                }
                Some(Reference::Alternate { name, word }) => {
                    if set_and_non_empty(lookup(name)).is_some() {
                        out.push_str(word);
                    }
                }
                // `$` + `{` + body + `}` copied verbatim.
                None => out.push_str(&rest[dollar..dollar + close + 3]),
            }
            rest = &body[close + 1..];
        } else {
            let len = name_len(after);
            if len == 0 {
                out.push('$');
            } else if let Some(value) = lookup(&after[..len]) {
                out.push_str(&value);
            }
            rest = &after[len..];
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Transformer that expands environment references in string leaves.
#[derive(Clone)]
pub struct ExpandEnv {
    lookup: Lookup,
}

impl Default for ExpandEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExpandEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpandEnv").finish_non_exhaustive()
    }
}

impl ExpandEnv {
    /// Expands against the process environment.
    pub fn new() -> Self {
        Self {
            lookup: Arc::new(|name| std::env::var(name).ok()),
        }
    }

    /// Replaces the lookup function.
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Arc::new(lookup);
        self
    }

    /// Expands against a fixed set of variables.
    pub fn from_map(vars: HashMap<String, String>) -> Self {
        Self::new().with_lookup(move |name| vars.get(name).cloned())
    }

    /// Expands against a fixed list of `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::from_map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Expands a single string.
    pub fn expand(&self, input: &str) -> Result<String, UnterminatedReference> {
        expand_str(input, |name| (self.lookup)(name))
    }

    fn expand_value(
        &self,
        value: &mut Value,
        path: &mut FieldPath,
        rewritten: &mut usize,
    ) -> Result<(), ExpandError> {
        match value {
            Value::String(text) => {
                if !text.contains('$') {
                    return Ok(());
                }
                let expanded = self.expand(text).map_err(|err| ExpandError::Unterminated {
                    path: path.to_string(),
                    raw: text.clone(),
                    offset: err.offset,
                })?;
                if expanded != *text {
                    *rewritten += 1;
                    *text = expanded;
                }
            }
            Value::Sequence(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    path.push(PathSegment::Index(i));
                    self.expand_value(item, path, rewritten)?;
                    path.pop();
                }
            }
            Value::Mapping(map) => self.expand_mapping(map, path, rewritten)?,
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
        Ok(())
    }

    fn expand_mapping(
        &self,
        map: &mut Tree,
        path: &mut FieldPath,
        rewritten: &mut usize,
    ) -> Result<(), ExpandError> {
        for (key, value) in map.iter_mut() {
            path.push(PathSegment::Field(key.clone()));
            self.expand_value(value, path, rewritten)?;
            path.pop();
        }
        Ok(())
    }
}

impl Transformer for ExpandEnv {
    fn transform(&self, mut tree: Tree) -> Result<Tree, BoxError> {
        let mut rewritten = 0;
        self.expand_mapping(&mut tree, &mut FieldPath::root(), &mut rewritten)?;
        debug!(leaves = rewritten, "Expanded environment references");
        Ok(tree)
    }

    fn name(&self) -> &str {
        "expand-env"
    }
}

#[cfg(test)]
mod tests {
    use schemaconf_core::{Mapping, tree};

    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "HTTP_ADDR" => Some("localhost:8080".to_string()),
            "EMPTY" => Some(String::new()),
            "QUOTED" => Some(r#"a", "b": {"c"#.to_string()),
            "NESTED" => Some("${HTTP_ADDR}".to_string()),
            _ => None,
        }
    }

    fn expand(input: &str) -> String {
        expand_str(input, lookup).unwrap()
    }

    #[test]
    fn test_plain_references() {
        assert_eq!(expand("${HTTP_ADDR}"), "localhost:8080");
        assert_eq!(expand("$HTTP_ADDR"), "localhost:8080");
        assert_eq!(expand("${MISSING}"), "");
        assert_eq!(expand("$MISSING"), "");
    }

    #[test]
    fn test_default_form() {
        assert_eq!(expand("${MISSING:-fallback}"), "fallback");
        assert_eq!(expand("${EMPTY:-fallback}"), "fallback");
        assert_eq!(expand("${HTTP_ADDR:-fallback}"), "localhost:8080");
        assert_eq!(expand("${MISSING:-}"), "");
    }

    #[test]
    fn test_alternate_form() {
        assert_eq!(expand("${HTTP_ADDR:+set}"), "set");
        assert_eq!(expand("${EMPTY:+set}"), "");
        assert_eq!(expand("${MISSING:+set}"), "");
    }

    #[test]
    fn test_text_without_references_is_unchanged() {
        for text in ["", "plain", "root:root@tcp(127.0.0.1:3306)/test", "{}[]\"'"] {
            assert_eq!(expand(text), text);
        }
    }

    #[test]
    fn test_bare_names_stop_at_non_name_characters() {
        assert_eq!(expand("http://$HTTP_ADDR/path"), "http://localhost:8080/path");
        assert_eq!(expand("$HTTP_ADDR-suffix"), "localhost:8080-suffix");
        assert_eq!(expand("${HTTP_ADDR}x"), "localhost:8080x");
    }

    #[test]
    fn test_lone_dollars_are_literal() {
        assert_eq!(expand("cost: 5$"), "cost: 5$");
        assert_eq!(expand("$ $-$."), "$ $-$.");
        assert_eq!(expand("${}"), "${}");
        assert_eq!(expand("${HTTP_ADDR-x}"), "${HTTP_ADDR-x}");
    }

    #[test]
    fn test_substitutions_are_not_rescanned() {
        assert_eq!(expand("${NESTED}"), "${HTTP_ADDR}");
        assert_eq!(expand("${MISSING:-$HTTP_ADDR}"), "$HTTP_ADDR");
        assert_eq!(expand("${MISSING:-${HTTP_ADDR}}"), "${HTTP_ADDR}");
    }

    #[test]
    fn test_multiple_references_in_one_string() {
        assert_eq!(
            expand("${HTTP_ADDR} and $HTTP_ADDR and ${MISSING:-x}"),
            "localhost:8080 and localhost:8080 and x"
        );
    }

    #[test]
    fn test_unterminated_reference_is_an_error() {
        let err = expand_str("abc ${HTTP_ADDR", lookup).unwrap_err();
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn test_transform_preserves_structure_and_types() {
        let transformer = ExpandEnv::new().with_lookup(lookup);
        let input = tree! {
            "server" => tree! {
                "http" => tree! {
                    "addr" => "${HTTP_ADDR}",
                    "port" => 8080_i64,
                    "tls" => false,
                },
                "tags" => vec![Value::from("a"), Value::from("$QUOTED"), Value::Null],
            },
            "ratio" => Value::Number(schemaconf_core::Number::from_f64(0.5).unwrap()),
        };

        let output = transformer.transform(input.clone()).unwrap();

        let http = output["server"].get_path("http").and_then(Value::as_mapping).unwrap();
        assert_eq!(http["addr"].as_str(), Some("localhost:8080"));
        assert_eq!(http["port"], input["server"].get_path("http.port").cloned().unwrap());
        assert_eq!(http["tls"], Value::Bool(false));

        let tags = output["server"].get_path("tags").and_then(Value::as_sequence).unwrap();
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[1].as_str(), Some(r#"a", "b": {"c"#));
        assert!(tags[2].is_null());

        assert_eq!(output["ratio"], input["ratio"]);
        let keys = |m: &Mapping| m.keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&output), keys(&input));
        assert_eq!(keys(http), ["addr", "port", "tls"]);
    }

    #[test]
    fn test_transform_reports_offending_leaf() {
        let transformer = ExpandEnv::new().with_lookup(lookup);
        let input = tree! {
            "server" => tree! { "http" => tree! { "addr" => "${HTTP_ADDR" } },
        };

        let err = transformer.transform(input).unwrap_err();
        let err = err.downcast_ref::<ExpandError>().unwrap();
        assert_eq!(
            err,
            &ExpandError::Unterminated {
                path: "server.http.addr".to_string(),
                raw: "${HTTP_ADDR".to_string(),
                offset: 0,
            }
        );
    }

    #[test]
    fn test_sequence_paths_in_errors() {
        let transformer = ExpandEnv::new().with_lookup(lookup);
        let input = tree! { "hosts" => vec![Value::from("ok"), Value::from("${BROKEN")] };
        let err = transformer.transform(input).unwrap_err();
        assert!(err.to_string().contains("`hosts[1]`"));
    }

    #[test]
    fn test_default_lookup_reads_process_environment() {
        temp_env::with_vars(
            [
                ("SCHEMACONF_TEST_SET", Some("from-env")),
                ("SCHEMACONF_TEST_UNSET", None),
            ],
            || {
                let transformer = ExpandEnv::new();
                let output = transformer
                    .transform(tree! {
                        "set" => "${SCHEMACONF_TEST_SET}",
                        "unset" => "${SCHEMACONF_TEST_UNSET}",
                    })
                    .unwrap();
                assert_eq!(output["set"].as_str(), Some("from-env"));
                assert_eq!(output["unset"].as_str(), Some(""));
            },
        );
    }

    #[test]
    fn test_from_pairs() {
        let transformer = ExpandEnv::from_pairs([("A", "1"), ("B", "2")]);
        assert_eq!(transformer.expand("$A-${B}").unwrap(), "1-2");
        assert_eq!(transformer.name(), "expand-env");
    }
}
