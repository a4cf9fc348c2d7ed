//! Built-in providers.
//!
//! - [`FileProvider`] - a file on disk, optionally discovered by name
//! - [`EnvProvider`] - prefixed environment variables
//! - [`StaticProvider`] - a fixed tree or byte buffer

mod env;
mod file;
mod memory;

pub use env::EnvProvider;
pub use file::FileProvider;
pub use memory::StaticProvider;
