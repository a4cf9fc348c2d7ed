//! Document formats and the serde-backed [`Parser`].
//!
//! # Feature Flags
//!
//! - `yaml-config` *(default)*: YAML documents
//! - `toml-config` *(default)*: TOML documents
//!
//! JSON is always available. Selecting a disabled format is not a build
//! error; parsing with it fails with a [`ParseError`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use schemaconf_core::{ParseError, Parser, Tree, Value};
use tracing::trace;

/// A configuration document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// Returns the format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }

    /// Detects the format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    /// File extensions recognized for this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Json => &["json"],
            Self::Yaml => &["yaml", "yml"],
            Self::Toml => &["toml"],
        }
    }

    /// Returns `true` if support for this format was compiled in.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Json => true,
            Self::Yaml => cfg!(feature = "yaml-config"),
            Self::Toml => cfg!(feature = "toml-config"),
        }
    }

    /// Formats compiled into this build, in search order.
    pub fn enabled() -> impl Iterator<Item = Format> {
        [Self::Yaml, Self::Toml, Self::Json]
            .into_iter()
            .filter(Format::is_enabled)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            other => Err(ParseError::new(other, "unknown configuration format")),
        }
    }
}

/// Decodes JSON, YAML or TOML documents into a tree.
///
/// The document root must be a mapping; an empty YAML document is an
/// empty tree. Keys keep their document order.
#[derive(Debug, Clone, Copy)]
pub struct FormatParser {
    format: Format,
}

impl FormatParser {
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    pub fn json() -> Self {
        Self::new(Format::Json)
    }

    pub fn yaml() -> Self {
        Self::new(Format::Yaml)
    }

    pub fn toml() -> Self {
        Self::new(Format::Toml)
    }

    fn decode(&self, text: &str) -> Result<Value, ParseError> {
        let format = self.format.as_str();
        match self.format {
            Format::Json => serde_json::from_str(text).map_err(|e| {
                ParseError::new(format, strip_location(&e.to_string(), e.line(), e.column()))
                    .at(e.line(), e.column())
            }),
            #[cfg(feature = "yaml-config")]
            Format::Yaml => serde_yaml::from_str(text).map_err(|e| match e.location() {
                Some(loc) => ParseError::new(
                    format,
                    strip_location(&e.to_string(), loc.line(), loc.column()),
                )
                .at(loc.line(), loc.column()),
                None => ParseError::new(format, e.to_string()),
            }),
            #[cfg(feature = "toml-config")]
            Format::Toml => toml::from_str(text).map_err(|e| {
                let err = ParseError::new(format, e.message());
                match e.span() {
                    Some(span) => {
                        let (line, column) = line_column(text, span.start);
                        err.at(line, column)
                    }
                    None => err,
                }
            }),
            #[allow(unreachable_patterns)]
            disabled => Err(ParseError::new(
                format,
                format!("support for {disabled} is not enabled"),
            )),
        }
    }
}

/// Drops the ` at line L column C` suffix decoders append.
fn strip_location(message: &str, line: usize, column: usize) -> String {
    let suffix = format!(" at line {line} column {column}");
    message.strip_suffix(&suffix).unwrap_or(message).to_string()
}

/// One-based line and column of a byte offset.
#[cfg(feature = "toml-config")]
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = text.get(..offset).unwrap_or(text);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

impl Parser for FormatParser {
    fn unmarshal(&self, data: &[u8]) -> Result<Tree, ParseError> {
        let format = self.format.as_str();
        let text = std::str::from_utf8(data)
            .map_err(|e| ParseError::new(format, format!("document is not valid UTF-8: {e}")))?;

        match self.decode(text)? {
            Value::Mapping(tree) => {
                trace!(format, keys = tree.len(), "Parsed configuration document");
                Ok(tree)
            }
            Value::Null if self.format == Format::Yaml => Ok(Tree::new()),
            other => Err(ParseError::new(
                format,
                format!("document root must be a mapping, found {}", other.kind()),
            )),
        }
    }

    fn format(&self) -> &str {
        self.format.as_str()
    }
}
