//! Configuration files on the local filesystem.

use std::path::{Path, PathBuf};

use schemaconf_core::{Parser, Provider, SourceError, Tree};
use tracing::{debug, info, trace};

use crate::format::{Format, FormatParser};

/// Reads a single configuration file.
///
/// [`read_bytes`](Provider::read_bytes) returns the file contents as is.
/// [`read`](Provider::read) also decodes them, picking the format from the
/// file extension.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format implied by the file extension.
    pub fn format(&self) -> Option<Format> {
        Format::from_path(&self.path)
    }

    /// Searches the default locations for `{name}.{ext}`.
    ///
    /// Looks in the current directory, then in `<config dir>/<name>`, and
    /// tries every enabled format's extensions in turn.
    pub fn discover(name: &str) -> Option<Self> {
        Self::discover_in(&default_search_paths(name), name)
    }

    /// Searches `search_paths` in order for `{name}.{ext}`.
    pub fn discover_in(search_paths: &[PathBuf], name: &str) -> Option<Self> {
        for dir in search_paths {
            for format in Format::enabled() {
                for ext in format.extensions() {
                    let candidate = dir.join(format!("{name}.{ext}"));
                    trace!(path = %candidate.display(), "Probing configuration file");
                    if candidate.is_file() {
                        info!(path = %candidate.display(), "Found configuration file");
                        return Some(Self::new(candidate));
                    }
                }
            }
        }
        debug!(name, "No configuration file found");
        None
    }
}

fn default_search_paths(name: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd);
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(name));
    }
    paths
}

impl Provider for FileProvider {
    fn read_bytes(&self) -> Result<Vec<u8>, SourceError> {
        if !self.path.exists() {
            return Err(SourceError::NotFound(self.path.clone()));
        }
        debug!(path = %self.path.display(), "Reading configuration file");
        Ok(std::fs::read(&self.path)?)
    }

    fn read(&self) -> Result<Tree, SourceError> {
        let format = self.format().ok_or_else(|| {
            SourceError::other(format!(
                "cannot infer configuration format from {}",
                self.path.display()
            ))
        })?;
        let bytes = self.read_bytes()?;
        Ok(FormatParser::new(format).unmarshal(&bytes)?)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
