//! Version-publication strategies for the root descriptor
//!
//! Exactly one of two mutually exclusive mechanisms publishes the resolved
//! descriptor as the build artifact's effective descriptor:
//!
//! - **Flatten**: delegate to a flatten-style plugin that writes a fully
//!   resolved descriptor during an early build phase
//! - **Attach**: inject this extension's own plugin with an execution that
//!   republishes the rewritten descriptor late in the build
//!
//! Both are plain data construction over the descriptor's build/plugin
//! collections and are idempotent on re-processing.

use crate::calculator::MetadataKey;
use crate::descriptor::model::{
    BuildSection, Descriptor, Execution, Plugin, PluginDependency, PluginManagement,
};
use crate::extension::{BuildContext, FLATTEN_VERSION_PROPERTY, REPLACEMENT_PHASE_PROPERTY};
use crate::session::BuildSession;

/// Coordinates of this extension as injected into descriptors
pub const EXTENSION_GROUP_ID: &str = "io.buildver";
pub const EXTENSION_ARTIFACT_ID: &str = "buildver-extension";
/// The running extension's own version
pub const EXTENSION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Goal republishing the rewritten descriptor as the artifact's descriptor
pub const GOAL_ATTACH_MODIFIED_DESCRIPTORS: &str = "attach-modified-descriptors";

/// Third-party flatten plugin coordinates
pub const FLATTEN_PLUGIN_GROUP_ID: &str = "io.buildver.plugins";
pub const FLATTEN_PLUGIN_ARTIFACT_ID: &str = "flatten-plugin";
pub const DEFAULT_FLATTEN_PLUGIN_VERSION: &str = "1.0.1";

const DEFAULT_FLATTEN_PHASE: &str = "validate";
const DEFAULT_ATTACH_PHASE: &str = "prepare-package";

/// Descriptor elements the flatten plugin resolves to effective values;
/// dependency-management alone is kept verbatim.
const RESOLVED_ELEMENTS: &[&str] = &[
    "build",
    "ci-management",
    "contributors",
    "dependencies",
    "description",
    "developers",
    "distribution-management",
    "inception-year",
    "issue-management",
    "mailing-lists",
    "modules",
    "name",
    "organization",
    "parent",
    "plugin-management",
    "plugin-repositories",
    "prerequisites",
    "profiles",
    "properties",
    "reporting",
    "repositories",
    "scm",
    "url",
    "version",
];

/// Apply the selected publication strategy plus the scm tag update to the
/// root descriptor. Called by the interceptor exactly when the descriptor's
/// own directory equals the build root.
pub fn apply_root_publication(
    descriptor: &mut Descriptor,
    context: &BuildContext,
    session: &BuildSession,
    skip_descriptor_update: bool,
) {
    if context.use_flatten() {
        if skip_descriptor_update {
            log::info!(
                "descriptor update is disabled, no flatten plugin execution will be defined"
            );
        } else if is_flatten_plugin_declared(descriptor) {
            log::info!("flatten plugin already declared, keeping the user's own execution");
        } else {
            log::info!("adding flatten plugin execution with buildver defaults");
            add_flatten_plugin(descriptor, context);
        }
    } else {
        add_attach_plugin(descriptor, context);
    }

    update_scm_tag(session, descriptor);
}

fn ensure_build_section(descriptor: &mut Descriptor) -> &mut BuildSection {
    descriptor.build.get_or_insert_with(BuildSection::default)
}

/// Whether the user already declares the flatten plugin explicitly
pub fn is_flatten_plugin_declared(descriptor: &Descriptor) -> bool {
    descriptor
        .build
        .as_ref()
        .map(|b| {
            b.plugins
                .iter()
                .any(|p| p.matches(FLATTEN_PLUGIN_GROUP_ID, FLATTEN_PLUGIN_ARTIFACT_ID))
        })
        .unwrap_or(false)
}

fn replacement_phase(context: &BuildContext, default: &str) -> String {
    context
        .property(REPLACEMENT_PHASE_PROPERTY)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn add_flatten_plugin(descriptor: &mut Descriptor, context: &BuildContext) {
    let version = context
        .property(FLATTEN_VERSION_PROPERTY)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_FLATTEN_PLUGIN_VERSION.to_string());

    let execution = Execution {
        id: Some("buildver-flatten".to_string()),
        phase: Some(replacement_phase(context, DEFAULT_FLATTEN_PHASE)),
        goals: vec!["flatten".to_string()],
        configuration: Some(flatten_configuration()),
    };

    ensure_build_section(descriptor).plugins.push(Plugin {
        group_id: FLATTEN_PLUGIN_GROUP_ID.to_string(),
        artifact_id: FLATTEN_PLUGIN_ARTIFACT_ID.to_string(),
        version: Some(version),
        dependencies: Vec::new(),
        executions: vec![execution],
    });
}

/// Flatten plugin configuration tree: mechanical construction from the fixed
/// element list.
pub fn flatten_configuration() -> toml::Value {
    let mut elements = toml::Table::new();
    elements.insert(
        "dependency-management".to_string(),
        toml::Value::String("keep".to_string()),
    );
    for name in RESOLVED_ELEMENTS {
        elements.insert(name.to_string(), toml::Value::String("resolve".to_string()));
    }

    let mut configuration = toml::Table::new();
    configuration.insert(
        "flatten-mode".to_string(),
        toml::Value::String("defaults".to_string()),
    );
    configuration.insert("update-descriptor".to_string(), toml::Value::Boolean(true));
    configuration.insert("elements".to_string(), toml::Value::Table(elements));
    toml::Value::Table(configuration)
}

fn add_attach_plugin(descriptor: &mut Descriptor, context: &BuildContext) {
    let BuildSection {
        plugins,
        plugin_management,
    } = ensure_build_section(descriptor);
    let management = plugin_management.get_or_insert_with(PluginManagement::default);

    // plugin-management entry pinned to the running extension's version
    ensure_extension_entry(&mut management.plugins);
    if let Some(managed) = management
        .plugins
        .iter_mut()
        .find(|p| p.matches(EXTENSION_GROUP_ID, EXTENSION_ARTIFACT_ID))
    {
        managed.version = Some(EXTENSION_VERSION.to_string());
        pin_extension_dependency(managed);
    }

    // plugin entry carrying the attach execution at the requested phase
    ensure_extension_entry(plugins);
    let phase = replacement_phase(context, DEFAULT_ATTACH_PHASE);
    if let Some(plugin) = plugins
        .iter_mut()
        .find(|p| p.matches(EXTENSION_GROUP_ID, EXTENSION_ARTIFACT_ID))
    {
        ensure_attach_goal(plugin, &phase);
    }
}

fn ensure_extension_entry(plugins: &mut Vec<Plugin>) {
    if !plugins
        .iter()
        .any(|p| p.matches(EXTENSION_GROUP_ID, EXTENSION_ARTIFACT_ID))
    {
        plugins.insert(
            0,
            Plugin {
                group_id: EXTENSION_GROUP_ID.to_string(),
                artifact_id: EXTENSION_ARTIFACT_ID.to_string(),
                ..Plugin::default()
            },
        );
    }
}

fn pin_extension_dependency(managed: &mut Plugin) {
    let existing = managed.dependencies.iter_mut().find(|d| {
        d.group_id.eq_ignore_ascii_case(EXTENSION_GROUP_ID)
            && d.artifact_id.eq_ignore_ascii_case(EXTENSION_ARTIFACT_ID)
    });
    match existing {
        Some(dependency) => dependency.version = Some(EXTENSION_VERSION.to_string()),
        None => managed.dependencies.push(PluginDependency {
            group_id: EXTENSION_GROUP_ID.to_string(),
            artifact_id: EXTENSION_ARTIFACT_ID.to_string(),
            version: Some(EXTENSION_VERSION.to_string()),
        }),
    }
}

fn ensure_attach_goal(plugin: &mut Plugin, phase: &str) {
    if !plugin
        .executions
        .iter()
        .any(|e| e.phase.as_deref() == Some(phase))
    {
        plugin.executions.push(Execution {
            phase: Some(phase.to_string()),
            ..Execution::default()
        });
    }
    if let Some(execution) = plugin
        .executions
        .iter_mut()
        .find(|e| e.phase.as_deref() == Some(phase))
    {
        if !execution
            .goals
            .iter()
            .any(|g| g == GOAL_ATTACH_MODIFIED_DESCRIPTORS)
        {
            execution
                .goals
                .push(GOAL_ATTACH_MODIFIED_DESCRIPTORS.to_string());
        }
    }
}

/// Set the source-control tag on the root descriptor: the resolved version
/// when it originated from an annotated tag on the current commit, otherwise
/// the full commit id when available.
pub fn update_scm_tag(session: &BuildSession, descriptor: &mut Descriptor) {
    let Some(scm) = descriptor.scm.as_mut() else {
        return;
    };

    if version_is_from_tag(session) {
        scm.tag = Some(session.resolved_version().to_string());
    } else if let Some(sha1) = session.metadata(MetadataKey::GitSha1Full) {
        scm.tag = Some(sha1.to_string());
    }
}

/// The version came from a tag when the base tag is among the annotated
/// version tags present on the current commit.
fn version_is_from_tag(session: &BuildSession) -> bool {
    let Some(base_tag) = session
        .metadata(MetadataKey::BaseTag)
        .filter(|t| !t.is_empty())
    else {
        return false;
    };
    session
        .metadata(MetadataKey::HeadVersionAnnotatedTags)
        .map(|tags| tags.split(',').any(|t| t == base_tag))
        .unwrap_or(false)
}
