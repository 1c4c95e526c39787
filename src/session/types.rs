//! Build session state
//!
//! One [`BuildSession`] exists per build root for the duration of one build
//! invocation. The resolved version and metadata are immutable once the
//! session is open; only the discovered-module set grows, monotonically, as
//! descriptors are intercepted.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::calculator::{InfoProvider, MetadataKey};
use crate::core::sync::handle_mutex_poison;
use crate::descriptor::model::Descriptor;
use crate::session::error::{SessionError, SessionResult};

/// Module identity: group id, artifact id and the version originally
/// declared in the descriptor, captured when the descriptor is first read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gav {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl Gav {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    /// Snapshot the identity of a descriptor, resolving group id and version
    /// through the parent reference when inherited.
    pub fn from_descriptor(descriptor: &Descriptor) -> Self {
        Self {
            group_id: descriptor.effective_group_id().unwrap_or("").to_string(),
            artifact_id: descriptor.artifact_id.clone().unwrap_or_default(),
            version: descriptor.effective_version().unwrap_or("").to_string(),
        }
    }
}

impl fmt::Display for Gav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.group_id, self.artifact_id, self.version)
    }
}

/// Serializable snapshot of a session, the wire form used for the
/// user-property channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionState {
    session_id: String,
    root_directory: PathBuf,
    resolved_version: String,
    metadata: BTreeMap<String, String>,
    modules: Vec<Gav>,
}

/// Versioning state for one build root.
pub struct BuildSession {
    session_id: String,
    root_directory: PathBuf,
    resolved_version: String,
    metadata: BTreeMap<MetadataKey, String>,
    discovered: Mutex<Vec<Gav>>,
}

impl BuildSession {
    /// Create a session from an opened calculator snapshot.
    pub fn new(root_directory: PathBuf, provider: &InfoProvider) -> Self {
        Self {
            session_id: session_id_for(&root_directory),
            root_directory,
            resolved_version: provider.version().to_string(),
            metadata: provider.metadata().clone(),
            discovered: Mutex::new(Vec::new()),
        }
    }

    /// Stable identifier derived from the canonical root directory
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Canonical build root directory, the session's identity key
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// The single version string propagated to all in-scope descriptors
    pub fn resolved_version(&self) -> &str {
        &self.resolved_version
    }

    pub fn metadata(&self, key: MetadataKey) -> Option<&str> {
        self.metadata.get(&key).map(String::as_str)
    }

    /// Register a discovered module, first-seen snapshot only.
    ///
    /// Safe under concurrent descriptor reads: exactly one registration wins
    /// for a given identity, duplicates are dropped. Returns whether the
    /// module was newly added.
    pub fn register_module(&self, gav: Gav) -> SessionResult<bool> {
        let mut discovered = handle_mutex_poison(self.discovered.lock(), |message| {
            SessionError::Internal { message }
        })?;
        if discovered.contains(&gav) {
            return Ok(false);
        }
        discovered.push(gav);
        Ok(true)
    }

    /// Discovered modules in registration order
    pub fn modules(&self) -> SessionResult<Vec<Gav>> {
        let discovered = handle_mutex_poison(self.discovered.lock(), |message| {
            SessionError::Internal { message }
        })?;
        Ok(discovered.clone())
    }

    /// Serialize the session into the opaque wire form for the build-phase
    /// property channel.
    pub fn serialize_to(&self) -> SessionResult<String> {
        let state = SessionState {
            session_id: self.session_id.clone(),
            root_directory: self.root_directory.clone(),
            resolved_version: self.resolved_version.clone(),
            metadata: self
                .metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            modules: self.modules()?,
        };
        serde_json::to_string(&state).map_err(|e| SessionError::Serialization {
            message: e.to_string(),
        })
    }

    /// Recover a session from its serialized form.
    pub fn deserialize_from(raw: &str) -> SessionResult<Self> {
        let state: SessionState =
            serde_json::from_str(raw).map_err(|e| SessionError::Serialization {
                message: e.to_string(),
            })?;
        let metadata = state
            .metadata
            .iter()
            .filter_map(|(k, v)| MetadataKey::from_str(k).ok().map(|key| (key, v.clone())))
            .collect();
        Ok(Self {
            session_id: state.session_id,
            root_directory: state.root_directory,
            resolved_version: state.resolved_version,
            metadata,
            discovered: Mutex::new(state.modules),
        })
    }
}

impl fmt::Debug for BuildSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildSession")
            .field("session_id", &self.session_id)
            .field("root_directory", &self.root_directory)
            .field("resolved_version", &self.resolved_version)
            .finish_non_exhaustive()
    }
}

/// Derive a stable session id from the canonical root directory path.
fn session_id_for(root: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(root.to_string_lossy().as_bytes());
    format!("session-{:x}", hasher.finalize())
}
