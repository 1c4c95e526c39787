//! Session Registry
//!
//! Process-wide map from canonical build-root directory to the live
//! [`BuildSession`] for that root. At most one live session exists per root;
//! opening is memoized per key so re-entrant build entry points observe the
//! first opener's result instead of computing a second session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::sync::handle_mutex_poison;
use crate::session::error::{SessionError, SessionResult};
use crate::session::types::BuildSession;

/// An entry is `None` when opening was explicitly skipped for that root
/// (user request or a tolerated open failure); callers treat that the same
/// as "no session" but the skip decision itself is memoized.
type Entry = Option<Arc<BuildSession>>;

/// Normalize a build root into the registry key form. Canonicalization keeps
/// re-entrant invocations with differently spelled roots on the same entry;
/// roots that do not exist (tests, synthetic builds) fall back to the literal
/// path.
pub fn registry_key(root: &Path) -> PathBuf {
    root.canonicalize().unwrap_or_else(|_| root.to_path_buf())
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<PathBuf, Entry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `root_key`, creating it through `factory` if no
    /// entry exists yet.
    ///
    /// Exactly one factory invocation happens per key: concurrent callers
    /// block on the registry lock and observe the winner's memoized entry.
    /// A factory returning `Ok(None)` records a skipped open; a factory
    /// error leaves no entry behind so a later caller may retry.
    pub fn open(
        &self,
        root_key: &Path,
        factory: impl FnOnce() -> SessionResult<Entry>,
    ) -> SessionResult<Entry> {
        let mut sessions = handle_mutex_poison(self.sessions.lock(), |message| {
            SessionError::Internal { message }
        })?;

        if let Some(existing) = sessions.get(root_key) {
            log::debug!(
                "session already open for {}, reusing",
                root_key.display()
            );
            return Ok(existing.clone());
        }

        let created = factory()?;
        sessions.insert(root_key.to_path_buf(), created.clone());
        Ok(created)
    }

    /// Non-blocking lookup; never triggers session computation.
    ///
    /// Returns `None` both when no entry exists and when the entry records a
    /// skipped open - in either case the caller must not rewrite descriptors.
    /// A poisoned lock only means some other caller panicked; the map itself
    /// is still valid, so the entry is served rather than silently dropping
    /// version propagation for the rest of the build.
    pub fn lookup(&self, root_key: &Path) -> Option<Arc<BuildSession>> {
        let sessions = self
            .sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions.get(root_key).cloned().flatten()
    }

    /// Remove the entry for `root_key`. No-op when absent; idempotent.
    pub fn close(&self, root_key: &Path) -> SessionResult<()> {
        let mut sessions = handle_mutex_poison(self.sessions.lock(), |message| {
            SessionError::Internal { message }
        })?;
        if sessions.remove(root_key).is_some() {
            log::debug!("closed session for {}", root_key.display());
        }
        Ok(())
    }
}
