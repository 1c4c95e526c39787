//! Build Session Component
//!
//! One versioning session per build root: the [`BuildSession`] holds the
//! resolved version and metadata snapshot, the [`SessionRegistry`] owns
//! session lifecycle process-wide, and the [`ConcurrencyGuard`] serializes
//! the expensive opening path against concurrent and re-entrant invocation.

pub mod api;
pub mod error;
pub mod guard;
pub mod registry;
pub mod types;

pub use api::get_session_registry;
pub use error::{SessionError, SessionResult};
pub use guard::{with_context, ConcurrencyGuard, ExecutionContext, NoContext};
pub use registry::{registry_key, SessionRegistry};
pub use types::{BuildSession, Gav};
