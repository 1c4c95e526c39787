//! Host build context
//!
//! The handle a host build driver passes into every core entry point: the
//! build root identifying the session, and the mutable user-property bag
//! that doubles as the cross-phase communication channel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::extension::{
    EXPORT_PROPERTIES_PROPERTY, FORCE_COMPUTATION_PROPERTY, SKIP_PROPERTY, USE_FLATTEN_PROPERTY,
    USE_VERSION_PROPERTY,
};

pub struct BuildContext {
    root_directory: PathBuf,
    user_properties: Mutex<HashMap<String, String>>,
}

impl BuildContext {
    pub fn new(root_directory: PathBuf) -> Self {
        Self {
            root_directory,
            user_properties: Mutex::new(HashMap::new()),
        }
    }

    /// Builder-style property preset, mainly for hosts and tests
    pub fn with_property(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Root directory of the multi-module build, the session identity key
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    pub fn property(&self, key: &str) -> Option<String> {
        self.user_properties
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set_property(&self, key: impl Into<String>, value: impl Into<String>) {
        self.user_properties
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// A flag property counts as set when present with an empty value or
    /// anything but "false" (mirrors `-Dflag` command line usage).
    fn flag(&self, key: &str) -> bool {
        match self.property(key) {
            Some(value) => value.is_empty() || !value.eq_ignore_ascii_case("false"),
            None => false,
        }
    }

    /// Whether the user requested versioning to be skipped for this build
    pub fn should_skip(&self) -> bool {
        self.flag(SKIP_PROPERTY)
    }

    /// Flatten strategy is the default; "false" selects attach
    pub fn use_flatten(&self) -> bool {
        match self.property(USE_FLATTEN_PROPERTY) {
            Some(value) => !value.eq_ignore_ascii_case("false"),
            None => true,
        }
    }

    pub fn version_override(&self) -> Option<String> {
        self.property(USE_VERSION_PROPERTY).filter(|v| !v.is_empty())
    }

    pub fn export_properties_path(&self) -> Option<PathBuf> {
        self.property(EXPORT_PROPERTIES_PROPERTY)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    pub fn force_computation(&self) -> bool {
        self.flag(FORCE_COMPUTATION_PROPERTY)
    }
}
