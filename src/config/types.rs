//! Configuration data model

use serde::{Deserialize, Serialize};

/// Sentinel for "no maximum search depth configured"
pub const UNSET_DEPTH: i32 = -1;

/// Version derivation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Maven,
    Configurable,
    Pattern,
    Script,
}

/// Tag lookup policy when several base tags are reachable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupPolicy {
    Max,
    Latest,
    Nearest,
}

/// Script engine for script-based strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptType {
    BeanShell,
    Groovy,
}

/// Branch qualifier policy: a branch-name pattern plus the transformations
/// applied to matching names before they are used as version qualifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BranchPolicy {
    pub pattern: String,
    #[serde(default)]
    pub transformations: Vec<String>,
}

/// Full configuration consumed by the session opening path.
///
/// All calculator-facing fields must be applied before the first version
/// query; `skip_descriptor_update` and `ignore_patterns` affect descriptor
/// interception only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    pub strategy: Option<Strategy>,
    pub policy: Option<LookupPolicy>,
    pub maven_like: bool,
    pub auto_increment_patch: bool,
    pub use_dirty: bool,
    pub use_commit_distance: bool,
    pub use_git_commit_timestamp: bool,
    pub use_git_commit_id: bool,
    pub use_snapshot: bool,
    pub use_default_branching_policy: bool,
    pub fail_if_dirty: bool,
    /// When set, no publication plugin is injected into the root descriptor
    pub skip_descriptor_update: bool,
    pub git_commit_id_length: usize,
    /// Maximum commit depth searched for a base tag; [`UNSET_DEPTH`] = unbounded
    pub max_search_depth: i32,
    /// Comma separated branch names that never contribute a version qualifier
    pub non_qualifier_branches: String,
    pub version_pattern: Option<String>,
    pub tag_version_pattern: Option<String>,
    /// Regex selecting which tags are version tags; the first capture group
    /// extracts the version part
    pub regex_version_tag: Option<String>,
    pub script: Option<String>,
    pub script_type: Option<ScriptType>,
    pub branch_policies: Vec<BranchPolicy>,
    /// Glob patterns for descriptor locations excluded from interception
    pub ignore_patterns: Vec<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            strategy: None,
            policy: None,
            maven_like: true,
            auto_increment_patch: true,
            use_dirty: false,
            use_commit_distance: false,
            use_git_commit_timestamp: false,
            use_git_commit_id: false,
            use_snapshot: true,
            use_default_branching_policy: true,
            fail_if_dirty: false,
            skip_descriptor_update: false,
            git_commit_id_length: 8,
            max_search_depth: UNSET_DEPTH,
            non_qualifier_branches: "master,main".to_string(),
            version_pattern: None,
            tag_version_pattern: None,
            regex_version_tag: None,
            script: None,
            script_type: None,
            branch_policies: Vec::new(),
            ignore_patterns: Vec::new(),
        }
    }
}
