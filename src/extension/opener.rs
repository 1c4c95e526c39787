//! Session opening
//!
//! Turns a build root plus configuration into a live [`BuildSession`]: open
//! a calculator, apply configuration, compute the version, snapshot the
//! metadata and release the calculator resource. The computed values are
//! also published into the host property bag and, on request, to a
//! properties file.

use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use crate::calculator::{
    CalculatorResult, GitVersionCalculator, InfoProvider, MetadataKey, VersionCalculator,
};
use crate::config::ConfigurationProvider;
use crate::extension::{BuildContext, PROPERTY_PREFIX};
use crate::session::{registry_key, BuildSession, SessionError, SessionResult};

/// Creates the calculator for a build root. Injectable so hosts and tests
/// can substitute repository access.
pub type CalculatorFactory =
    Box<dyn Fn(&Path) -> CalculatorResult<Box<dyn VersionCalculator>> + Send + Sync>;

pub struct SessionOpener {
    configuration: Arc<dyn ConfigurationProvider>,
    calculator_factory: CalculatorFactory,
}

impl SessionOpener {
    pub fn new(
        configuration: Arc<dyn ConfigurationProvider>,
        calculator_factory: CalculatorFactory,
    ) -> Self {
        Self {
            configuration,
            calculator_factory,
        }
    }

    /// Opener backed by the git calculator, the production arrangement.
    pub fn with_git_calculator(configuration: Arc<dyn ConfigurationProvider>) -> Self {
        Self::new(
            configuration,
            Box::new(|root| {
                GitVersionCalculator::open(root).map(|c| Box::new(c) as Box<dyn VersionCalculator>)
            }),
        )
    }

    /// Open a session for `context`'s build root.
    ///
    /// The calculator lives only for the duration of this call; the session
    /// keeps an immutable snapshot of its results.
    pub fn open(&self, context: &BuildContext) -> SessionResult<Arc<BuildSession>> {
        let configuration = self.configuration.configuration()?;

        let mut calculator = (self.calculator_factory)(context.root_directory())?;
        calculator.apply_configuration(&configuration)?;
        if context.force_computation() {
            calculator.set_force_computation(true)?;
        }

        let provider = InfoProvider::from_calculator(calculator.as_mut())?;
        calculator.close()?;

        if configuration.fail_if_dirty && provider.meta(MetadataKey::Dirty) == Some("true") {
            return Err(SessionError::DirtyRepository);
        }

        let provider = match context.version_override() {
            Some(version) => {
                log::info!("using user-provided version {}", version);
                provider.with_version(version)
            }
            None => provider,
        };

        log::info!(
            "resolved version {} for {}",
            provider.version(),
            context.root_directory().display()
        );

        publish_to_context(context, &provider);

        if let Some(path) = context.export_properties_path() {
            export_properties_file(&path, &provider)?;
        }

        let root_key = registry_key(context.root_directory());
        Ok(Arc::new(BuildSession::new(root_key, &provider)))
    }
}

/// Make the resolved version and every metadata value available as
/// `buildver.<key>` user properties.
fn publish_to_context(context: &BuildContext, provider: &InfoProvider) {
    context.set_property(
        format!("{}{}", PROPERTY_PREFIX, MetadataKey::CalculatedVersion),
        provider.version(),
    );
    for (key, value) in provider.metadata() {
        context.set_property(format!("{}{}", PROPERTY_PREFIX, key), value.clone());
    }
}

/// Write the same properties to `path` in `key=value` line format. A write
/// failure is fatal: the user explicitly asked for the file.
fn export_properties_file(path: &Path, provider: &InfoProvider) -> SessionResult<()> {
    let export = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        writeln!(
            file,
            "{}{}={}",
            PROPERTY_PREFIX,
            MetadataKey::CalculatedVersion,
            provider.version()
        )?;
        for (key, value) in provider.metadata() {
            writeln!(file, "{}{}={}", PROPERTY_PREFIX, key, value)?;
        }
        Ok(())
    };

    export().map_err(|e| SessionError::PropertiesExport {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    log::info!("exported version properties to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::FixedVersionCalculator;
    use crate::config::{Configuration, StaticConfigurationProvider};
    use crate::extension::{
        EXPORT_PROPERTIES_PROPERTY, FORCE_COMPUTATION_PROPERTY, USE_VERSION_PROPERTY,
    };
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn opener_with(version: &'static str, configuration: Configuration) -> SessionOpener {
        SessionOpener::new(
            Arc::new(StaticConfigurationProvider::new(configuration)),
            Box::new(move |root| {
                Ok(Box::new(
                    FixedVersionCalculator::new(root.to_path_buf(), version)
                        .with_metadata(MetadataKey::Dirty, "true")
                        .with_metadata(MetadataKey::BaseTag, "v1.0.0"),
                ))
            }),
        )
    }

    #[test]
    fn test_open_snapshots_version_and_metadata() {
        let opener = opener_with("1.0.1", Configuration::default());
        let context = BuildContext::new(PathBuf::from("/build/root"));

        let session = opener.open(&context).unwrap();
        assert_eq!(session.resolved_version(), "1.0.1");
        assert_eq!(session.metadata(MetadataKey::BaseTag), Some("v1.0.0"));
        assert_eq!(
            context.property("buildver.calculated-version").as_deref(),
            Some("1.0.1")
        );
        assert_eq!(
            context.property("buildver.base-tag").as_deref(),
            Some("v1.0.0")
        );
    }

    #[test]
    fn test_dirty_repository_fails_when_configured() {
        let mut cfg = Configuration::default();
        cfg.fail_if_dirty = true;
        let opener = opener_with("1.0.1", cfg);
        let context = BuildContext::new(PathBuf::from("/build/root"));

        let err = opener.open(&context).unwrap_err();
        assert!(matches!(err, SessionError::DirtyRepository));
    }

    #[test]
    fn test_version_override_keeps_metadata() {
        let opener = opener_with("1.0.1", Configuration::default());
        let context = BuildContext::new(PathBuf::from("/build/root"))
            .with_property(USE_VERSION_PROPERTY, "7.7.7");

        let session = opener.open(&context).unwrap();
        assert_eq!(session.resolved_version(), "7.7.7");
        assert_eq!(session.metadata(MetadataKey::BaseTag), Some("v1.0.0"));
    }

    #[test]
    fn test_properties_export_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out/version.properties");
        let opener = opener_with("1.0.1", Configuration::default());
        let context = BuildContext::new(PathBuf::from("/build/root"))
            .with_property(EXPORT_PROPERTIES_PROPERTY, target.to_string_lossy());

        opener.open(&context).unwrap();

        let content = std::fs::read_to_string(&target).unwrap();
        assert!(content.contains("buildver.calculated-version=1.0.1"));
        assert!(content.contains("buildver.base-tag=v1.0.0"));
    }

    #[test]
    fn test_properties_export_failure_is_fatal_and_names_the_path() {
        let opener = opener_with("1.0.1", Configuration::default());
        let context = BuildContext::new(PathBuf::from("/build/root"))
            .with_property(EXPORT_PROPERTIES_PROPERTY, "/dev/null/impossible/x.properties");

        let err = opener.open(&context).unwrap_err();
        match err {
            SessionError::PropertiesExport { path, .. } => {
                assert!(path.contains("impossible"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_force_computation_is_forwarded() {
        // FixedVersionCalculator accepts the flag via the default no-op; this
        // exercises the wiring without a repository.
        let opener = opener_with("1.0.1", Configuration::default());
        let context = BuildContext::new(PathBuf::from("/build/root"))
            .with_property(FORCE_COMPUTATION_PROPERTY, "true");
        assert!(opener.open(&context).is_ok());
    }
}
