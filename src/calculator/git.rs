//! Git-backed version calculator
//!
//! Derives a version from repository history: the nearest version tag on the
//! first-parent line gives the base version, commit distance / commit id /
//! dirty state / branch name contribute qualifiers according to the applied
//! configuration. The derivation policy is intentionally plain; hosts with
//! richer policies plug in their own [`VersionCalculator`] implementation.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::calculator::error::{CalculatorError, CalculatorResult};
use crate::calculator::metadata::MetadataKey;
use crate::calculator::traits::VersionCalculator;
use crate::config::{Configuration, UNSET_DEPTH};

/// Default pattern recognising version tags, capture group 1 = version part
const DEFAULT_VERSION_TAG_PATTERN: &str = r"^v?([0-9]+(?:\.[0-9]+){0,2})$";

#[derive(Debug, Clone)]
struct TagInfo {
    name: String,
    annotated: bool,
}

#[derive(Debug, Clone)]
struct Computed {
    version: String,
    metadata: BTreeMap<MetadataKey, String>,
}

/// Version calculator reading repository history through `gix`.
pub struct GitVersionCalculator {
    repo: gix::Repository,
    root: PathBuf,
    configuration: Configuration,
    force_computation: bool,
    computed: Option<Computed>,
}

impl GitVersionCalculator {
    /// Open a calculator on the repository containing `root`.
    pub fn open(root: &Path) -> CalculatorResult<Self> {
        let repo = gix::discover(root).map_err(|e| CalculatorError::Repository {
            message: format!("Failed to open repository '{}': {}", root.display(), e),
        })?;
        Ok(Self {
            repo,
            root: root.to_path_buf(),
            configuration: Configuration::default(),
            force_computation: false,
            computed: None,
        })
    }

    fn tag_pattern(&self) -> CalculatorResult<Regex> {
        let pattern = self
            .configuration
            .regex_version_tag
            .as_deref()
            .unwrap_or(DEFAULT_VERSION_TAG_PATTERN);
        Regex::new(pattern).map_err(|e| CalculatorError::Configuration {
            message: format!("invalid version tag pattern '{}': {}", pattern, e),
        })
    }

    /// Collect version tags per target commit, peeling annotated tags.
    fn collect_version_tags(
        &self,
        pattern: &Regex,
    ) -> CalculatorResult<HashMap<gix::ObjectId, Vec<TagInfo>>> {
        let mut tags: HashMap<gix::ObjectId, Vec<TagInfo>> = HashMap::new();

        let platform = self
            .repo
            .references()
            .map_err(|e| CalculatorError::Git {
                message: format!("Failed to enumerate references: {}", e),
            })?;
        let tag_refs = platform.tags().map_err(|e| CalculatorError::Git {
            message: format!("Failed to enumerate tags: {}", e),
        })?;

        for reference in tag_refs.flatten() {
            let name = reference.name().shorten().to_string();
            if !pattern.is_match(&name) {
                continue;
            }

            let direct_target = match reference.try_id() {
                Some(id) => id.detach(),
                None => continue, // symbolic ref, not a tag we handle
            };
            let annotated = self
                .repo
                .find_object(direct_target)
                .map(|obj| obj.kind == gix::object::Kind::Tag)
                .unwrap_or(false);

            let mut reference = reference;
            let commit_id = match reference.peel_to_id_in_place() {
                Ok(id) => id.detach(),
                Err(e) => {
                    log::debug!("cannot peel tag '{}': {}", name, e);
                    continue;
                }
            };

            tags.entry(commit_id)
                .or_default()
                .push(TagInfo { name, annotated });
        }

        Ok(tags)
    }

    /// Walk the first-parent line from HEAD looking for the nearest version
    /// tag. Returns the base tag (annotated preferred) and the commit
    /// distance to it.
    fn find_base_tag(
        &self,
        head_id: gix::ObjectId,
        tags: &HashMap<gix::ObjectId, Vec<TagInfo>>,
    ) -> CalculatorResult<(Option<TagInfo>, u32)> {
        let max_depth = self.configuration.max_search_depth;
        let mut current = head_id;
        let mut distance: u32 = 0;

        loop {
            if let Some(candidates) = tags.get(&current) {
                let best = candidates
                    .iter()
                    .find(|t| t.annotated)
                    .or_else(|| candidates.first())
                    .cloned();
                return Ok((best, distance));
            }

            if max_depth != UNSET_DEPTH && distance as i32 >= max_depth {
                return Ok((None, distance));
            }

            let commit = self
                .repo
                .find_commit(current)
                .map_err(|e| CalculatorError::Git {
                    message: format!("Failed to read commit {}: {}", current, e),
                })?;
            let parent = commit.parent_ids().next().map(|p| p.detach());
            match parent {
                Some(parent) => {
                    current = parent;
                    distance += 1;
                }
                None => return Ok((None, distance)),
            }
        }
    }

    fn base_version(&self, base_tag: Option<&TagInfo>, pattern: &Regex) -> Option<String> {
        base_tag.and_then(|tag| {
            pattern
                .captures(&tag.name)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        })
    }

    fn branch_qualifier(&self, branch: Option<&str>) -> Option<String> {
        let branch = branch?;
        let non_qualifier = self
            .configuration
            .non_qualifier_branches
            .split(',')
            .map(str::trim)
            .any(|b| b == branch);
        if non_qualifier {
            return None;
        }

        // First matching branch policy wins; an empty transformation list
        // keeps the captured name as-is.
        for policy in &self.configuration.branch_policies {
            let Ok(re) = Regex::new(&policy.pattern) else {
                log::warn!("invalid branch policy pattern '{}'", policy.pattern);
                continue;
            };
            if let Some(captures) = re.captures(branch) {
                if policy.transformations.iter().any(|t| t == "IGNORE") {
                    return None;
                }
                let mut qualifier = captures
                    .get(1)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| branch.to_string());
                for transformation in &policy.transformations {
                    qualifier = match transformation.as_str() {
                        "LOWERCASE_EN" => qualifier.to_lowercase(),
                        "UPPERCASE_EN" => qualifier.to_uppercase(),
                        "REPLACE_UNEXPECTED_CHARS_UNDERSCORE" => sanitize(&qualifier),
                        other => {
                            log::warn!("unknown branch transformation '{}'", other);
                            qualifier
                        }
                    };
                }
                return Some(qualifier);
            }
        }

        if self.configuration.use_default_branching_policy {
            Some(sanitize(branch))
        } else {
            None
        }
    }

    fn compute(&mut self) -> CalculatorResult<Computed> {
        let cfg = self.configuration.clone();
        let pattern = self.tag_pattern()?;

        let head = self
            .repo
            .rev_parse_single("HEAD")
            .map_err(|e| CalculatorError::Git {
                message: format!("Failed to resolve HEAD: {}", e),
            })?;
        let head_id = head.detach();
        let head_commit = self
            .repo
            .find_commit(head_id)
            .map_err(|e| CalculatorError::Git {
                message: format!("Failed to read HEAD commit: {}", e),
            })?;

        let sha1_full = head_id.to_string();
        let sha1_short = sha1_full
            .get(..cfg.git_commit_id_length.min(40))
            .unwrap_or(&sha1_full)
            .to_string();

        let commit_seconds = head_commit
            .time()
            .map_err(|e| CalculatorError::Git {
                message: format!("Failed to read commit time: {}", e),
            })?
            .seconds;
        let timestamp = chrono::DateTime::from_timestamp(commit_seconds, 0)
            .map(|dt| dt.format("%Y%m%d%H%M%S").to_string());

        let branch = self
            .repo
            .head_name()
            .ok()
            .flatten()
            .map(|name| name.shorten().to_string());

        let dirty = self.repo.is_dirty().map_err(|e| CalculatorError::Git {
            message: format!("Failed to determine dirty state: {}", e),
        })?;

        let tags = self.collect_version_tags(&pattern)?;
        let (base_tag, distance) = self.find_base_tag(head_id, &tags)?;
        let base_version = self.base_version(base_tag.as_ref(), &pattern);

        let head_tags = tags.get(&head_id);
        let annotated_at_head = join_tags(head_tags, true);
        let lightweight_at_head = join_tags(head_tags, false);

        let version = compose_version(
            &cfg,
            base_version.as_deref(),
            distance,
            dirty,
            &sha1_full,
            timestamp.as_deref(),
            self.branch_qualifier(branch.as_deref()).as_deref(),
        );

        let mut metadata = BTreeMap::new();
        metadata.insert(MetadataKey::CalculatedVersion, version.clone());
        metadata.insert(MetadataKey::Dirty, dirty.to_string());
        metadata.insert(MetadataKey::GitSha1Full, sha1_full);
        metadata.insert(MetadataKey::GitSha1Short, sha1_short);
        metadata.insert(MetadataKey::CommitDistance, distance.to_string());
        if let Some(tag) = &base_tag {
            metadata.insert(MetadataKey::BaseTag, tag.name.clone());
        }
        if let Some(base) = &base_version {
            metadata.insert(MetadataKey::BaseVersion, base.clone());
        }
        if !annotated_at_head.is_empty() {
            metadata.insert(MetadataKey::HeadVersionAnnotatedTags, annotated_at_head);
        }
        if !lightweight_at_head.is_empty() {
            metadata.insert(
                MetadataKey::HeadVersionLightweightTags,
                lightweight_at_head,
            );
        }
        if let Some(branch) = branch {
            metadata.insert(MetadataKey::BranchName, branch);
        }
        if let Some(ts) = timestamp {
            metadata.insert(MetadataKey::CommitTimestamp, ts);
        }

        Ok(Computed { version, metadata })
    }
}

fn sanitize(qualifier: &str) -> String {
    qualifier
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn join_tags(tags: Option<&Vec<TagInfo>>, annotated: bool) -> String {
    tags.map(|list| {
        list.iter()
            .filter(|t| t.annotated == annotated)
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    })
    .unwrap_or_default()
}

/// Compose the version string from the base version and qualifiers.
fn compose_version(
    cfg: &Configuration,
    base_version: Option<&str>,
    distance: u32,
    dirty: bool,
    sha1_full: &str,
    timestamp: Option<&str>,
    branch_qualifier: Option<&str>,
) -> String {
    let mut version = base_version.unwrap_or("0.0.0").to_string();
    let exactly_on_tag = base_version.is_some() && distance == 0 && !dirty;

    if !exactly_on_tag {
        if cfg.auto_increment_patch && base_version.is_some() {
            version = increment_patch(&version);
        }

        if cfg.maven_like && cfg.use_snapshot {
            if let Some(branch) = branch_qualifier {
                version.push('-');
                version.push_str(branch);
            }
            version.push_str("-SNAPSHOT");
            return version;
        }

        if let Some(branch) = branch_qualifier {
            version.push('-');
            version.push_str(branch);
        }
        if cfg.use_commit_distance {
            version.push_str(&format!("-{}", distance));
        }
        if cfg.use_git_commit_timestamp {
            if let Some(ts) = timestamp {
                version.push_str(&format!("-{}", ts));
            }
        }
        if cfg.use_git_commit_id {
            let len = cfg.git_commit_id_length.min(40);
            version.push_str(&format!("-{}", &sha1_full[..len]));
        }
    }

    if cfg.use_dirty && dirty {
        version.push_str("-dirty");
    }

    version
}

fn increment_patch(version: &str) -> String {
    let mut parts: Vec<u64> = version
        .split('.')
        .map(|p| p.parse().unwrap_or(0))
        .collect();
    while parts.len() < 3 {
        parts.push(0);
    }
    parts[2] += 1;
    format!("{}.{}.{}", parts[0], parts[1], parts[2])
}

impl VersionCalculator for GitVersionCalculator {
    fn root_directory(&self) -> &Path {
        &self.root
    }

    fn apply_configuration(&mut self, configuration: &Configuration) -> CalculatorResult<()> {
        if self.computed.is_some() {
            return Err(CalculatorError::Configuration {
                message: "configuration must be applied before the first version query".to_string(),
            });
        }
        self.configuration = configuration.clone();
        Ok(())
    }

    fn set_force_computation(&mut self, force: bool) -> CalculatorResult<()> {
        self.force_computation = force;
        Ok(())
    }

    fn version(&mut self) -> CalculatorResult<String> {
        if self.force_computation {
            self.computed = None;
            self.force_computation = false;
        }
        if let Some(computed) = &self.computed {
            return Ok(computed.version.clone());
        }
        let computed = self.compute()?;
        let version = computed.version.clone();
        self.computed = Some(computed);
        Ok(version)
    }

    fn meta(&self, key: MetadataKey) -> Option<String> {
        self.computed
            .as_ref()
            .and_then(|c| c.metadata.get(&key))
            .cloned()
    }
}
