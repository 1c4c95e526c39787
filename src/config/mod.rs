//! Configuration Component
//!
//! Build-root scoped configuration for version calculation and descriptor
//! handling. Hosts provide configuration through a [`ConfigurationProvider`];
//! the bundled [`FileConfigurationProvider`] reads an optional
//! `.buildver.toml` at the build root and falls back to defaults.

pub mod error;
pub mod provider;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use provider::{ConfigurationProvider, FileConfigurationProvider, StaticConfigurationProvider};
pub use types::{BranchPolicy, Configuration, LookupPolicy, ScriptType, Strategy, UNSET_DEPTH};

/// Name of the optional configuration file at the build root
pub const CONFIG_FILE_NAME: &str = ".buildver.toml";
