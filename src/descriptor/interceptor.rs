//! Descriptor interception
//!
//! The in-memory rewrite applied to every descriptor the host build driver
//! reads. When a live session exists for the build root and the descriptor
//! belongs to the session's module tree, the resolved version is propagated
//! into it; the root descriptor additionally receives the publication plugin
//! and the scm tag. Descriptors without a session, without a file location,
//! ignored by configuration or out of scope pass through untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ConfigurationProvider;
use crate::descriptor::error::DescriptorResult;
use crate::descriptor::model::Descriptor;
use crate::descriptor::publication::apply_root_publication;
use crate::descriptor::scope::{is_in_scope, is_parent_in_scope};
use crate::extension::{BuildContext, SESSION_PROPERTIES_KEY};
use crate::session::{registry_key, BuildSession, Gav, SessionError, SessionRegistry};

/// Where a descriptor was read from. Hosts may feed descriptors that never
/// came from disk (synthetic or in-memory models); those carry no location.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSource {
    pub location: Option<PathBuf>,
}

impl DescriptorSource {
    pub fn from_file(location: impl Into<PathBuf>) -> Self {
        Self {
            location: Some(location.into()),
        }
    }

    /// A source with no backing file; such descriptors are never rewritten
    pub fn in_memory() -> Self {
        Self::default()
    }
}

pub struct DescriptorInterceptor {
    registry: Arc<SessionRegistry>,
    configuration: Arc<dyn ConfigurationProvider>,
}

impl DescriptorInterceptor {
    pub fn new(
        registry: Arc<SessionRegistry>,
        configuration: Arc<dyn ConfigurationProvider>,
    ) -> Self {
        Self {
            registry,
            configuration,
        }
    }

    /// Rewrite `descriptor` against the live session for `context`'s build
    /// root, if any. Pass-through outcomes return the descriptor unchanged;
    /// only scope resolution and module registration can fail.
    pub fn process(
        &self,
        mut descriptor: Descriptor,
        source: &DescriptorSource,
        context: &BuildContext,
    ) -> DescriptorResult<Descriptor> {
        let Some(session) = self.registry.lookup(&registry_key(context.root_directory())) else {
            log::debug!(
                "no open session for {}, descriptor left untouched",
                context.root_directory().display()
            );
            return Ok(descriptor);
        };

        let Some(location) = source.location.as_deref() else {
            log::debug!("descriptor has no file location, left untouched");
            return Ok(descriptor);
        };

        if self.configuration.ignore(location) {
            log::info!(
                "descriptor {} is ignored by configuration",
                location.display()
            );
            return Ok(descriptor);
        }

        if !is_in_scope(location, session.root_directory())? {
            log::debug!(
                "descriptor {} is outside the session tree, left untouched",
                location.display()
            );
            return Ok(descriptor);
        }

        session.register_module(Gav::from_descriptor(&descriptor))?;

        if descriptor.version.is_some() {
            log::debug!(
                "setting version {} on descriptor {}",
                session.resolved_version(),
                location.display()
            );
            descriptor.version = Some(session.resolved_version().to_string());
        }

        self.rewrite_parent_version(&mut descriptor, location, &session)?;

        if is_session_root(location, &session) {
            // a broken configuration is fatal, not a silent default
            let skip_update = self
                .configuration
                .configuration()
                .map_err(SessionError::from)?
                .skip_descriptor_update;
            apply_root_publication(&mut descriptor, context, &session, skip_update);
        }

        // republish the session snapshot so later build phases can recover it
        context.set_property(SESSION_PROPERTIES_KEY, session.serialize_to()?);

        Ok(descriptor)
    }

    fn rewrite_parent_version(
        &self,
        descriptor: &mut Descriptor,
        location: &Path,
        session: &BuildSession,
    ) -> DescriptorResult<()> {
        let Some(parent) = descriptor.parent.as_mut() else {
            return Ok(());
        };
        if parent.version.is_none() {
            return Ok(());
        }
        let Some(relative_path) = parent.relative_path.as_deref() else {
            return Ok(());
        };
        let descriptor_dir = location.parent().unwrap_or_else(|| Path::new(""));

        if is_parent_in_scope(relative_path, descriptor_dir, session.root_directory())? {
            log::debug!(
                "setting parent version {} on descriptor {}",
                session.resolved_version(),
                location.display()
            );
            parent.version = Some(session.resolved_version().to_string());
        }
        Ok(())
    }
}

/// The root descriptor is the one whose own directory is the session root.
fn is_session_root(location: &Path, session: &BuildSession) -> bool {
    let Some(dir) = location.parent() else {
        return false;
    };
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    let root = registry_key(session.root_directory());
    dir == root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{InfoProvider, MetadataKey};
    use crate::config::{Configuration, StaticConfigurationProvider};
    use crate::descriptor::io::DESCRIPTOR_FILE_NAME;
    use crate::descriptor::publication::{FLATTEN_PLUGIN_ARTIFACT_ID, FLATTEN_PLUGIN_GROUP_ID};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    const ROOT_DESCRIPTOR: &str = r#"
        group-id = "com.acme"
        artifact-id = "acme-aggregate"
        version = "0.0.0"
        modules = ["moduleA"]
    "#;

    const CHILD_DESCRIPTOR: &str = r#"
        artifact-id = "moduleA"

        [parent]
        group-id = "com.acme"
        artifact-id = "acme-aggregate"
        version = "0.0.0"
        relative-path = "../module.toml"
    "#;

    struct Fixture {
        _root: TempDir,
        interceptor: DescriptorInterceptor,
        context: BuildContext,
        session: Arc<BuildSession>,
    }

    fn fixture(version: &str, configuration: Configuration) -> Fixture {
        let root = TempDir::new().unwrap();
        let root_dir = root.path().canonicalize().unwrap();
        fs::write(root_dir.join(DESCRIPTOR_FILE_NAME), ROOT_DESCRIPTOR).unwrap();
        let child_dir = root_dir.join("moduleA");
        fs::create_dir_all(&child_dir).unwrap();
        fs::write(child_dir.join(DESCRIPTOR_FILE_NAME), CHILD_DESCRIPTOR).unwrap();

        let provider = InfoProvider::from_parts(version.to_string(), BTreeMap::new());
        let session = Arc::new(BuildSession::new(root_dir.clone(), &provider));
        let registry = Arc::new(SessionRegistry::new());
        registry
            .open(&root_dir, || Ok(Some(Arc::clone(&session))))
            .unwrap();

        Fixture {
            _root: root,
            interceptor: DescriptorInterceptor::new(
                registry,
                Arc::new(StaticConfigurationProvider::new(configuration)),
            ),
            context: BuildContext::new(root_dir),
            session,
        }
    }

    fn read(fixture: &Fixture, relative: &str) -> (Descriptor, DescriptorSource) {
        let path = fixture.context.root_directory().join(relative);
        let raw = fs::read_to_string(&path).unwrap();
        (
            toml::from_str(&raw).unwrap(),
            DescriptorSource::from_file(path),
        )
    }

    #[test]
    fn test_root_descriptor_gets_version_and_publication_plugin() {
        let f = fixture("1.2.3", Configuration::default());
        let (descriptor, source) = read(&f, DESCRIPTOR_FILE_NAME);

        let rewritten = f
            .interceptor
            .process(descriptor, &source, &f.context)
            .unwrap();

        assert_eq!(rewritten.version.as_deref(), Some("1.2.3"));
        let plugins = &rewritten.build.as_ref().unwrap().plugins;
        assert!(plugins
            .iter()
            .any(|p| p.matches(FLATTEN_PLUGIN_GROUP_ID, FLATTEN_PLUGIN_ARTIFACT_ID)));
        assert!(f.context.property(SESSION_PROPERTIES_KEY).is_some());
    }

    #[test]
    fn test_child_descriptor_gets_parent_version_not_publication() {
        let f = fixture("1.2.3", Configuration::default());
        let (descriptor, source) = read(&f, "moduleA/module.toml");

        let rewritten = f
            .interceptor
            .process(descriptor, &source, &f.context)
            .unwrap();

        // child declares no version of its own
        assert!(rewritten.version.is_none());
        assert_eq!(
            rewritten.parent.as_ref().unwrap().version.as_deref(),
            Some("1.2.3")
        );
        assert!(rewritten.build.is_none());
    }

    #[test]
    fn test_registration_snapshots_original_identity() {
        let f = fixture("1.2.3", Configuration::default());
        let (descriptor, source) = read(&f, DESCRIPTOR_FILE_NAME);
        f.interceptor
            .process(descriptor, &source, &f.context)
            .unwrap();

        let modules = f.session.modules().unwrap();
        assert_eq!(modules, vec![Gav::new("com.acme", "acme-aggregate", "0.0.0")]);
    }

    #[test]
    fn test_no_session_passes_through() {
        let f = fixture("1.2.3", Configuration::default());
        let context = BuildContext::new(PathBuf::from("/some/other/build"));
        let (descriptor, source) = read(&f, DESCRIPTOR_FILE_NAME);

        let untouched = f.interceptor.process(descriptor, &source, &context).unwrap();
        assert_eq!(untouched.version.as_deref(), Some("0.0.0"));
        assert!(context.property(SESSION_PROPERTIES_KEY).is_none());
    }

    #[test]
    fn test_in_memory_descriptor_passes_through() {
        let f = fixture("1.2.3", Configuration::default());
        let descriptor: Descriptor = toml::from_str(ROOT_DESCRIPTOR).unwrap();

        let untouched = f
            .interceptor
            .process(descriptor, &DescriptorSource::in_memory(), &f.context)
            .unwrap();
        assert_eq!(untouched.version.as_deref(), Some("0.0.0"));
    }

    #[test]
    fn test_ignored_descriptor_passes_through() {
        let mut cfg = Configuration::default();
        cfg.ignore_patterns = vec!["**/moduleA/**".to_string()];
        let f = fixture("1.2.3", cfg);
        let (descriptor, source) = read(&f, "moduleA/module.toml");

        let untouched = f
            .interceptor
            .process(descriptor, &source, &f.context)
            .unwrap();
        assert_eq!(
            untouched.parent.as_ref().unwrap().version.as_deref(),
            Some("0.0.0")
        );
        assert!(f.session.modules().unwrap().is_empty());
    }

    #[test]
    fn test_skip_descriptor_update_suppresses_plugin_but_keeps_version() {
        let mut cfg = Configuration::default();
        cfg.skip_descriptor_update = true;
        let f = fixture("1.2.3", cfg);
        let (descriptor, source) = read(&f, DESCRIPTOR_FILE_NAME);

        let rewritten = f
            .interceptor
            .process(descriptor, &source, &f.context)
            .unwrap();

        assert_eq!(rewritten.version.as_deref(), Some("1.2.3"));
        assert!(rewritten.build.is_none() || rewritten.build.as_ref().unwrap().plugins.is_empty());
    }

    struct FailingConfiguration;

    impl ConfigurationProvider for FailingConfiguration {
        fn configuration(&self) -> crate::config::ConfigResult<Configuration> {
            Err(crate::config::ConfigError::Invalid {
                message: "unusable configuration".to_string(),
            })
        }

        fn ignore(&self, _path: &Path) -> bool {
            false
        }
    }

    #[test]
    fn test_broken_configuration_is_fatal_for_the_root() {
        let root = TempDir::new().unwrap();
        let root_dir = root.path().canonicalize().unwrap();
        fs::write(root_dir.join(DESCRIPTOR_FILE_NAME), ROOT_DESCRIPTOR).unwrap();

        let provider = InfoProvider::from_parts("1.2.3".to_string(), BTreeMap::new());
        let session = Arc::new(BuildSession::new(root_dir.clone(), &provider));
        let registry = Arc::new(SessionRegistry::new());
        registry
            .open(&root_dir, || Ok(Some(Arc::clone(&session))))
            .unwrap();

        let interceptor = DescriptorInterceptor::new(registry, Arc::new(FailingConfiguration));
        let context = BuildContext::new(root_dir.clone());
        let raw = fs::read_to_string(root_dir.join(DESCRIPTOR_FILE_NAME)).unwrap();
        let descriptor: Descriptor = toml::from_str(&raw).unwrap();

        let err = interceptor
            .process(
                descriptor,
                &DescriptorSource::from_file(root_dir.join(DESCRIPTOR_FILE_NAME)),
                &context,
            )
            .unwrap_err();
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_scm_tag_set_on_root() {
        let f = {
            let root = TempDir::new().unwrap();
            let root_dir = root.path().canonicalize().unwrap();
            fs::write(
                root_dir.join(DESCRIPTOR_FILE_NAME),
                format!("{}\n[scm]\nurl = \"https://example.org/r\"\n", ROOT_DESCRIPTOR),
            )
            .unwrap();

            let provider = InfoProvider::from_parts(
                "1.0.0".to_string(),
                BTreeMap::from([
                    (MetadataKey::BaseTag, "v1.0.0".to_string()),
                    (MetadataKey::HeadVersionAnnotatedTags, "v1.0.0".to_string()),
                ]),
            );
            let session = Arc::new(BuildSession::new(root_dir.clone(), &provider));
            let registry = Arc::new(SessionRegistry::new());
            registry
                .open(&root_dir, || Ok(Some(Arc::clone(&session))))
                .unwrap();
            Fixture {
                _root: root,
                interceptor: DescriptorInterceptor::new(
                    registry,
                    Arc::new(StaticConfigurationProvider::new(Configuration::default())),
                ),
                context: BuildContext::new(root_dir),
                session,
            }
        };

        let (descriptor, source) = read(&f, DESCRIPTOR_FILE_NAME);
        let rewritten = f
            .interceptor
            .process(descriptor, &source, &f.context)
            .unwrap();
        assert_eq!(rewritten.scm.unwrap().tag.as_deref(), Some("1.0.0"));
    }
}
