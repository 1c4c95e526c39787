//! Reactor rewriting
//!
//! After project discovery the whole multi-module tree is materialized once:
//! every member descriptor is rewritten with the resolved version and written
//! to its auxiliary sibling file. The original `module.toml` files are never
//! modified; the auxiliary copies are what the publication plugin attaches.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::descriptor::error::{DescriptorError, DescriptorResult};
use crate::descriptor::io::{aux_descriptor_path, read_descriptor, write_descriptor};
use crate::descriptor::model::Descriptor;
use crate::session::BuildSession;

/// Writes the rewritten descriptor tree for one session. The rewrite runs at
/// most once per build; [`reset`](Self::reset) re-arms the rewriter when the
/// session ends so the next build in the same process rewrites again.
pub struct ReactorRewriter {
    done: AtomicBool,
}

impl Default for ReactorRewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactorRewriter {
    pub fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
        }
    }

    /// Walk the module tree from the session root, rewrite every member and
    /// write it to its auxiliary sibling. Returns the root auxiliary path,
    /// or `None` when the rewrite already ran.
    pub fn rewrite(
        &self,
        session: &BuildSession,
        root_descriptor_path: &Path,
    ) -> DescriptorResult<Option<PathBuf>> {
        if self.done.swap(true, Ordering::SeqCst) {
            log::debug!("reactor already rewritten for this build, skipping");
            return Ok(None);
        }

        let mut visited = BTreeSet::new();
        let root_aux =
            rewrite_tree(session, root_descriptor_path, &mut visited)?.ok_or_else(|| {
                DescriptorError::Io {
                    message: format!(
                        "root descriptor '{}' does not exist",
                        root_descriptor_path.display()
                    ),
                }
            })?;

        log::info!(
            "rewrote {} descriptor(s) under {}",
            visited.len(),
            session.root_directory().display()
        );
        Ok(Some(root_aux))
    }

    /// Re-arm the rewriter for the next build. Called on session teardown;
    /// the auxiliary files of the finished build would otherwise stay stale
    /// when the same process runs another build.
    pub fn reset(&self) {
        self.done.store(false, Ordering::SeqCst);
    }
}

/// Depth-first rewrite of the descriptor at `path` and its aggregated
/// members. Cycles and diamond aggregations are visited once.
fn rewrite_tree(
    session: &BuildSession,
    path: &Path,
    visited: &mut BTreeSet<PathBuf>,
) -> DescriptorResult<Option<PathBuf>> {
    let path = match path.canonicalize() {
        Ok(canonical) => canonical,
        Err(_) => {
            log::warn!("module descriptor {} not found, skipping", path.display());
            return Ok(None);
        }
    };
    if !visited.insert(path.clone()) {
        return Ok(None);
    }

    let mut descriptor = read_descriptor(&path)?;
    rewrite_versions(session, &mut descriptor, &path);

    let module_dir = path.parent().unwrap_or_else(|| Path::new(""));
    for member in &descriptor.modules {
        let member_path = resolve_member(module_dir, member);
        rewrite_tree(session, &member_path, visited)?;
    }

    let aux = aux_descriptor_path(&path);
    write_descriptor(&aux, &descriptor)?;
    log::debug!("wrote rewritten descriptor {}", aux.display());
    Ok(Some(aux))
}

fn rewrite_versions(session: &BuildSession, descriptor: &mut Descriptor, path: &Path) {
    if descriptor.version.is_some() {
        descriptor.version = Some(session.resolved_version().to_string());
    }
    // the root has no parent inside the tree; members inherit the version
    if !is_root(session, path) {
        if let Some(parent) = descriptor.parent.as_mut() {
            if parent.version.is_some() {
                parent.version = Some(session.resolved_version().to_string());
            }
        }
    }
}

fn is_root(session: &BuildSession, descriptor_path: &Path) -> bool {
    let root = session
        .root_directory()
        .canonicalize()
        .unwrap_or_else(|_| session.root_directory().to_path_buf());
    descriptor_path.parent() == Some(root.as_path())
}

/// A member entry names the module directory; the descriptor file name is
/// appended unless the entry already points at a file.
fn resolve_member(module_dir: &Path, member: &str) -> PathBuf {
    let candidate = module_dir.join(member);
    if candidate.is_file() {
        candidate
    } else {
        candidate.join(crate::descriptor::io::DESCRIPTOR_FILE_NAME)
    }
}
