//! Public API for session services
//!
//! The registry is process-wide state: every consumer (lifecycle entry
//! points, descriptor interception) must observe the same sessions. Hosts
//! embedding several independent cores can construct their own
//! [`SessionRegistry`] and inject it instead.

use std::sync::{Arc, LazyLock};

use crate::session::registry::SessionRegistry;

/// Global session registry instance
static SESSION_REGISTRY: LazyLock<Arc<SessionRegistry>> = LazyLock::new(|| {
    log::trace!("Initializing session registry");
    Arc::new(SessionRegistry::new())
});

/// Access the shared session registry. Each call returns the same instance.
pub fn get_session_registry() -> Arc<SessionRegistry> {
    SESSION_REGISTRY.clone()
}
