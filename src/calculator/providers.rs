//! Read-only views over calculator results
//!
//! A [`BuildSession`](crate::session::BuildSession) must not keep the
//! calculator resource alive for the whole build, so the opening path
//! snapshots the computed version plus all metadata into an [`InfoProvider`]
//! and closes the calculator immediately afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use strum::IntoEnumIterator;

use crate::calculator::error::CalculatorResult;
use crate::calculator::metadata::MetadataKey;
use crate::calculator::traits::VersionCalculator;
use crate::config::Configuration;

/// Immutable snapshot of a calculator's version and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoProvider {
    version: String,
    metadata: BTreeMap<MetadataKey, String>,
}

impl InfoProvider {
    /// Compute the version on `calculator` and snapshot all available
    /// metadata keys.
    pub fn from_calculator(calculator: &mut dyn VersionCalculator) -> CalculatorResult<Self> {
        let version = calculator.version()?;
        let mut metadata = BTreeMap::new();
        for key in MetadataKey::iter() {
            if let Some(value) = calculator.meta(key) {
                metadata.insert(key, value);
            }
        }
        Ok(Self { version, metadata })
    }

    /// Build a snapshot directly from parts (used by tests and by hosts with
    /// externally computed results).
    pub fn from_parts(version: String, metadata: BTreeMap<MetadataKey, String>) -> Self {
        Self { version, metadata }
    }

    /// Replace the version while keeping all metadata, for user-requested
    /// version overrides.
    pub fn with_version(mut self, version: String) -> Self {
        self.version = version;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn meta(&self, key: MetadataKey) -> Option<&str> {
        self.metadata.get(&key).map(String::as_str)
    }

    pub fn metadata(&self) -> &BTreeMap<MetadataKey, String> {
        &self.metadata
    }
}

/// Calculator returning a preset version and metadata bag.
///
/// No repository access happens; the configuration is accepted and ignored.
#[derive(Debug, Clone)]
pub struct FixedVersionCalculator {
    root: PathBuf,
    version: String,
    metadata: BTreeMap<MetadataKey, String>,
    computed: bool,
}

impl FixedVersionCalculator {
    pub fn new(root: PathBuf, version: impl Into<String>) -> Self {
        Self {
            root,
            version: version.into(),
            metadata: BTreeMap::new(),
            computed: false,
        }
    }

    pub fn with_metadata(mut self, key: MetadataKey, value: impl Into<String>) -> Self {
        self.metadata.insert(key, value.into());
        self
    }
}

impl VersionCalculator for FixedVersionCalculator {
    fn root_directory(&self) -> &Path {
        &self.root
    }

    fn apply_configuration(&mut self, _configuration: &Configuration) -> CalculatorResult<()> {
        Ok(())
    }

    fn version(&mut self) -> CalculatorResult<String> {
        self.computed = true;
        Ok(self.version.clone())
    }

    fn meta(&self, key: MetadataKey) -> Option<String> {
        if !self.computed {
            return None;
        }
        self.metadata.get(&key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_provider_snapshots_fixed_calculator() {
        let mut calc = FixedVersionCalculator::new(PathBuf::from("/tmp/repo"), "1.2.3")
            .with_metadata(MetadataKey::BaseTag, "v1.2.3")
            .with_metadata(MetadataKey::Dirty, "false");

        // Metadata is unavailable before the first version query
        assert_eq!(calc.meta(MetadataKey::BaseTag), None);

        let provider = InfoProvider::from_calculator(&mut calc).unwrap();
        assert_eq!(provider.version(), "1.2.3");
        assert_eq!(provider.meta(MetadataKey::BaseTag), Some("v1.2.3"));
        assert_eq!(provider.meta(MetadataKey::GitSha1Full), None);
    }

    #[test]
    fn test_with_version_keeps_metadata() {
        let provider = InfoProvider::from_parts(
            "1.0.0".to_string(),
            BTreeMap::from([(MetadataKey::Dirty, "true".to_string())]),
        );
        let overridden = provider.with_version("9.9.9".to_string());
        assert_eq!(overridden.version(), "9.9.9");
        assert_eq!(overridden.meta(MetadataKey::Dirty), Some("true"));
    }
}
