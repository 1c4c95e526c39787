//! Version calculator trait

use std::path::Path;

use crate::calculator::error::CalculatorResult;
use crate::calculator::metadata::MetadataKey;
use crate::config::Configuration;

/// A stateful version-derivation resource with an explicit lifecycle.
///
/// Implementations are opened on a repository root directory. All
/// configuration must be applied before the first [`version`](Self::version)
/// query; afterwards the computed version and its metadata are frozen and
/// [`meta`](Self::meta) serves values from that computation.
pub trait VersionCalculator: Send {
    /// Root directory the calculator was opened on
    fn root_directory(&self) -> &Path;

    /// Apply the full configuration. Fails once a version has been computed.
    fn apply_configuration(&mut self, configuration: &Configuration) -> CalculatorResult<()>;

    /// Request computation even when the host would normally reuse a
    /// previously exported result. Default implementations ignore this.
    fn set_force_computation(&mut self, _force: bool) -> CalculatorResult<()> {
        Ok(())
    }

    /// Compute (or return the already computed) version string.
    ///
    /// Failure to compute is fatal for the build.
    fn version(&mut self) -> CalculatorResult<String>;

    /// Metadata from the last computation. Returns `None` for keys the
    /// implementation does not provide, and for every key before the first
    /// successful [`version`](Self::version) call.
    fn meta(&self, key: MetadataKey) -> Option<String>;

    /// Release underlying resources. Idempotent.
    fn close(&mut self) -> CalculatorResult<()> {
        Ok(())
    }
}
