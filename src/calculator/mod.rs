//! Version Calculator Component
//!
//! Boundary to the version-derivation collaborator. A calculator is a
//! stateful resource opened on a repository root directory: configuration is
//! applied before the first version query, the computed version and its
//! metadata are then frozen for the calculator's lifetime.
//!
//! Two implementations are provided:
//!
//! - [`GitVersionCalculator`]: derives the version from repository history
//!   via `gix` (base tag, commit distance, dirty state, commit id)
//! - [`FixedVersionCalculator`]: returns a preset version, used by tests and
//!   by hosts that compute versions externally

pub mod error;
pub mod git;
pub mod metadata;
pub mod providers;
pub mod traits;

pub use error::{CalculatorError, CalculatorResult};
pub use git::GitVersionCalculator;
pub use metadata::MetadataKey;
pub use providers::{FixedVersionCalculator, InfoProvider};
pub use traits::VersionCalculator;
