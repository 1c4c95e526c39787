//! Extension Component
//!
//! Host-facing surface: the [`BuildContext`] handle the build driver passes
//! into every entry point, the [`BuildExtension`] lifecycle participant that
//! opens/closes sessions and triggers the reactor rewrite, and the
//! [`SessionOpener`] that turns configuration plus a calculator into a live
//! session.

pub mod context;
pub mod lifecycle;
pub mod opener;

pub use context::BuildContext;
pub use lifecycle::BuildExtension;
pub use opener::{CalculatorFactory, SessionOpener};

/// Prefix of every user property this extension reads or writes
pub const PROPERTY_PREFIX: &str = "buildver.";

/// Presence (empty or "true") skips versioning for the build
pub const SKIP_PROPERTY: &str = "buildver.skip";

/// Overrides the calculated version with a user-supplied one
pub const USE_VERSION_PROPERTY: &str = "buildver.use-version";

/// "false" selects the attach-modified-descriptor strategy instead of flatten
pub const USE_FLATTEN_PROPERTY: &str = "buildver.use-flatten";

/// Overrides the flatten plugin version pinned by default
pub const FLATTEN_VERSION_PROPERTY: &str = "buildver.flatten.version";

/// Overrides the build phase the publication execution is bound to
pub const REPLACEMENT_PHASE_PROPERTY: &str = "buildver.replacement-phase";

/// When set, all resolved metadata is exported to this properties file path
pub const EXPORT_PROPERTIES_PROPERTY: &str = "buildver.export-properties";

/// Forces version computation even when a result could be reused
pub const FORCE_COMPUTATION_PROPERTY: &str = "buildver.force-computation";

/// Well-known key under which the serialized session state is published
pub const SESSION_PROPERTIES_KEY: &str = "buildver.session";
