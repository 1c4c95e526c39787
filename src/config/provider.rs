//! Configuration providers

use std::path::Path;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::types::Configuration;
use crate::config::CONFIG_FILE_NAME;

/// Source of configuration and of the descriptor ignore policy.
///
/// `ignore` decisions must be stable for the duration of a build: the
/// interceptor consults them on every descriptor read.
pub trait ConfigurationProvider: Send + Sync {
    fn configuration(&self) -> ConfigResult<Configuration>;

    /// Whether the descriptor at `path` is excluded from version handling
    fn ignore(&self, path: &Path) -> bool;
}

/// Provider backed by an optional `.buildver.toml` file at the build root.
///
/// The file is read and parsed exactly once, at load time: ignore decisions
/// and configuration stay stable for the whole build even if the file is
/// edited while the build runs. A missing file yields the default
/// configuration; a present but malformed file is a fatal configuration
/// error.
#[derive(Debug)]
pub struct FileConfigurationProvider {
    configuration: Configuration,
}

impl FileConfigurationProvider {
    pub fn load(root_directory: &Path) -> ConfigResult<Self> {
        let path = root_directory.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            log::debug!(
                "no configuration file at {}, using defaults",
                path.display()
            );
            return Ok(Self {
                configuration: Configuration::default(),
            });
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let configuration = toml::from_str(&raw).map_err(|e| ConfigError::Malformed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(Self { configuration })
    }

    fn matches_ignore_patterns(configuration: &Configuration, path: &Path) -> bool {
        let candidate = path.to_string_lossy();
        configuration.ignore_patterns.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(&candidate))
                .unwrap_or_else(|e| {
                    log::warn!("invalid ignore pattern '{}': {}", pattern, e);
                    false
                })
        })
    }
}

impl ConfigurationProvider for FileConfigurationProvider {
    fn configuration(&self) -> ConfigResult<Configuration> {
        Ok(self.configuration.clone())
    }

    fn ignore(&self, path: &Path) -> bool {
        Self::matches_ignore_patterns(&self.configuration, path)
    }
}

/// Provider wrapping a preconstructed configuration, for tests and for hosts
/// with their own configuration layer.
pub struct StaticConfigurationProvider {
    configuration: Configuration,
}

impl StaticConfigurationProvider {
    pub fn new(configuration: Configuration) -> Self {
        Self { configuration }
    }
}

impl ConfigurationProvider for StaticConfigurationProvider {
    fn configuration(&self) -> ConfigResult<Configuration> {
        Ok(self.configuration.clone())
    }

    fn ignore(&self, path: &Path) -> bool {
        FileConfigurationProvider::matches_ignore_patterns(&self.configuration, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let provider = FileConfigurationProvider::load(dir.path()).unwrap();
        let cfg = provider.configuration().unwrap();
        assert_eq!(cfg, Configuration::default());
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "fail-if-dirty = \"maybe\"").unwrap();
        let err = FileConfigurationProvider::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_decisions_stable_after_load() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "ignore-patterns = [\"**/vendored/**\"]",
        )
        .unwrap();
        let provider = FileConfigurationProvider::load(dir.path()).unwrap();
        assert!(provider.ignore(Path::new("/build/vendored/module.toml")));

        // editing the file mid-build must not change decisions
        fs::write(dir.path().join(CONFIG_FILE_NAME), "ignore-patterns = []").unwrap();
        assert!(provider.ignore(Path::new("/build/vendored/module.toml")));
    }

    #[test]
    fn test_ignore_patterns() {
        let mut cfg = Configuration::default();
        cfg.ignore_patterns = vec!["**/vendored/**".to_string()];
        let provider = StaticConfigurationProvider::new(cfg);

        assert!(provider.ignore(Path::new("/build/vendored/lib/module.toml")));
        assert!(!provider.ignore(Path::new("/build/app/module.toml")));
    }
}
