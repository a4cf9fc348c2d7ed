//! Error taxonomy for the configuration pipeline.
//!
//! Each stage has its own error type so collaborators can be implemented
//! independently; [`ConfigError`] wraps them with the stage that failed.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error used at collaborator seams whose causes are open-ended.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Stage Errors
// =============================================================================

/// A provider failed to produce bytes or a tree.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The configured file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Reading the source failed.
    #[error("failed to read configuration source: {0}")]
    Io(#[from] std::io::Error),

    /// The source produced data that could not be turned into a tree.
    #[error("configuration source produced invalid data: {0}")]
    Format(#[from] ParseError),

    /// Any other provider-specific failure.
    #[error("{0}")]
    Other(String),
}

impl SourceError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// A line/column position inside a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// A parser failed to decode bytes into a tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to parse {format} configuration{}: {reason}", .position.map(|p| format!(" at {p}")).unwrap_or_default())]
pub struct ParseError {
    /// Format name, e.g. `yaml`.
    pub format: String,
    /// Decoder message.
    pub reason: String,
    /// Where the decoder stopped, when it reports one.
    pub position: Option<Position>,
}

impl ParseError {
    pub fn new(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            reason: reason.into(),
            position: None,
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.position = Some(Position { line, column });
        self
    }
}

/// The tree could not be converted to or from its linear encoding.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("failed to encode configuration tree: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode configuration tree: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("configuration root must be a mapping, found {found}")]
    NotAMapping { found: &'static str },
}

/// The encoded tree could not be mapped onto the target schema type.
#[derive(Error, Debug)]
#[error("failed to bind configuration onto `{target}`{}: {source}", .path.as_ref().map(|p| format!(" at `{p}`")).unwrap_or_default())]
pub struct BindError {
    /// Type name of the bind target.
    pub target: String,
    /// Dotted path of the offending field, when the binder tracks one.
    pub path: Option<String>,
    #[source]
    pub source: BoxError,
}

impl BindError {
    pub fn new(target: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            target: target.into(),
            path: None,
            source: source.into(),
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// A single constraint that a bound message violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field_path: String,
    pub constraint_id: String,
    pub message: String,
}

impl Violation {
    pub fn new(
        field_path: impl Into<String>,
        constraint_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            constraint_id: constraint_id.into(),
            message: message.into(),
        }
    }

    pub fn field_path(&self) -> &str {
        &self.field_path
    }

    pub fn constraint_id(&self) -> &str {
        &self.constraint_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}]",
            self.field_path, self.message, self.constraint_id
        )
    }
}

/// The bound message violated one or more declarative constraints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Violations in the order they were found.
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation error:")?;
        for violation in &self.violations {
            write!(f, "\n - {violation}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Pipeline Error
// =============================================================================

/// Errors surfaced by the configuration pipeline, tagged with the stage
/// that failed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The loader was built without a provider.
    #[error("no configuration provider configured")]
    NoProvider,

    /// The provider failed.
    #[error("read config: {0}")]
    Source(#[from] SourceError),

    /// The parser failed.
    #[error("parse config: {0}")]
    Parse(#[from] ParseError),

    /// A transformer in the chain failed.
    #[error("transform config: transformer #{index} ({name}) failed: {source}")]
    Transform {
        /// Zero-based position in the chain.
        index: usize,
        /// Name reported by the transformer.
        name: String,
        #[source]
        source: BoxError,
    },

    /// Encoding the final tree failed.
    #[error("encode config: {0}")]
    Codec(#[from] CodecError),

    /// Binding onto the schema type failed.
    #[error("bind config: {0}")]
    Bind(#[from] BindError),

    /// Declarative constraints were violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The target is not a message type.
    #[error("target type `{target}` is not a schema message")]
    TargetType { target: String },

    /// `scan` was called before a successful `load`.
    #[error("configuration has not been loaded")]
    NotLoaded,
}

impl ConfigError {
    /// Creates a transform error for the transformer at `index`.
    pub fn transform(index: usize, name: impl Into<String>, source: BoxError) -> Self {
        Self::Transform {
            index,
            name: name.into(),
            source,
        }
    }

    /// Returns the validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for pipeline operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
