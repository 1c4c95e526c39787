//! Scope resolution for descriptor locations
//!
//! A descriptor is in scope when its canonical containing directory is
//! lexically contained within the session's root directory path,
//! case-insensitively. The substring test deliberately over-approximates:
//! a sibling directory sharing the root as a path prefix (`/build/app` vs
//! `/build/app-other`) also tests as contained. Downstream consumers depend
//! on these exact semantics; do not tighten them.

use std::path::{Component, Path, PathBuf};

use crate::descriptor::error::{DescriptorError, DescriptorResult};

/// Whether the descriptor at `location` belongs to the multi-module tree
/// rooted at `build_root`.
///
/// Locations that do not resolve to a regular file (in-memory or synthetic
/// sources) are always out of scope: scope cannot be proven, so the
/// descriptor is never mutated.
pub fn is_in_scope(location: &Path, build_root: &Path) -> DescriptorResult<bool> {
    if !location.is_file() {
        return Ok(false);
    }

    let containing_dir = location
        .parent()
        .ok_or_else(|| DescriptorError::Io {
            message: format!("descriptor '{}' has no parent directory", location.display()),
        })?
        .canonicalize()
        .map_err(|e| DescriptorError::Io {
            message: format!(
                "cannot resolve canonical path of '{}': {}",
                location.display(),
                e
            ),
        })?;
    let root = canonical_or_normalized(build_root);

    Ok(contains_ignore_case(&containing_dir, &root))
}

/// Whether the parent declared by a descriptor in `descriptor_dir` with
/// `relative_path` also belongs to the tree rooted at `build_root`.
///
/// A blank relative path yields `false`: no scope decision is made and the
/// parent reference stays untouched.
pub fn is_parent_in_scope(
    relative_path: &str,
    descriptor_dir: &Path,
    build_root: &Path,
) -> DescriptorResult<bool> {
    if relative_path.trim().is_empty() {
        return Ok(false);
    }

    let resolved = descriptor_dir.join(relative_path);
    // the relative path may name the parent descriptor file or its directory
    let parent_dir = if relative_path.ends_with('/') || resolved.is_dir() {
        resolved
    } else {
        resolved
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(resolved)
    };

    let parent_dir = canonical_or_normalized(&parent_dir);
    let root = canonical_or_normalized(build_root);

    Ok(contains_ignore_case(&parent_dir, &root))
}

/// Case-insensitive substring containment on path strings.
fn contains_ignore_case(candidate: &Path, root: &Path) -> bool {
    let candidate = candidate.to_string_lossy().to_lowercase();
    let root = root.to_string_lossy().to_lowercase();
    candidate.contains(&root)
}

/// Canonicalize when possible, otherwise normalize lexically. Parent
/// references may point outside the tree to locations that do not exist;
/// those must still produce a usable path for the containment test.
fn canonical_or_normalized(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "artifact-id = \"x\"\n").unwrap();
    }

    #[test]
    fn test_nested_descriptor_is_in_scope() {
        let root = TempDir::new().unwrap();
        let descriptor = root.path().join("moduleA/module.toml");
        touch(&descriptor);

        assert!(is_in_scope(&descriptor, root.path()).unwrap());
    }

    #[test]
    fn test_descriptor_outside_root_is_out_of_scope() {
        let root = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let descriptor = elsewhere.path().join("module.toml");
        touch(&descriptor);

        assert!(!is_in_scope(&descriptor, root.path()).unwrap());
    }

    #[test]
    fn test_missing_location_is_out_of_scope() {
        let root = TempDir::new().unwrap();
        let descriptor = root.path().join("not-there/module.toml");
        assert!(!is_in_scope(&descriptor, root.path()).unwrap());
    }

    #[test]
    fn test_sibling_sharing_prefix_is_contained_by_substring_semantics() {
        // Known over-approximation: /X-other contains /X as a substring.
        let base = TempDir::new().unwrap();
        let root = base.path().join("app");
        let sibling = base.path().join("app-other");
        fs::create_dir_all(&root).unwrap();
        let descriptor = sibling.join("module.toml");
        touch(&descriptor);

        assert!(is_in_scope(&descriptor, &root).unwrap());
    }

    #[test]
    fn test_parent_inside_root_is_in_scope() {
        let root = TempDir::new().unwrap();
        let parent = root.path().join("module.toml");
        touch(&parent);
        let child_dir = root.path().join("moduleA");
        fs::create_dir_all(&child_dir).unwrap();

        assert!(is_parent_in_scope("../module.toml", &child_dir, root.path()).unwrap());
    }

    #[test]
    fn test_parent_outside_root_is_out_of_scope() {
        let root = TempDir::new().unwrap();
        let child_dir = root.path().join("moduleA");
        fs::create_dir_all(&child_dir).unwrap();

        assert!(
            !is_parent_in_scope("../../../elsewhere/module.toml", &child_dir, root.path())
                .unwrap()
        );
    }

    #[test]
    fn test_blank_relative_path_makes_no_decision() {
        let root = TempDir::new().unwrap();
        assert!(!is_parent_in_scope("", root.path(), root.path()).unwrap());
        assert!(!is_parent_in_scope("   ", root.path(), root.path()).unwrap());
    }
}
