//! Descriptor file IO
//!
//! Descriptors live in `module.toml` files. Rewritten copies always target
//! the fixed auxiliary sibling name, never the original file, so the source
//! of truth on disk stays untouched.

use std::path::{Path, PathBuf};

use crate::descriptor::error::{DescriptorError, DescriptorResult};
use crate::descriptor::model::Descriptor;

/// Canonical descriptor file name inside a module directory
pub const DESCRIPTOR_FILE_NAME: &str = "module.toml";

/// Fixed sibling name for rewritten descriptor copies
pub const AUX_DESCRIPTOR_FILE_NAME: &str = "module.buildver.toml";

/// Auxiliary sibling path for a descriptor location
pub fn aux_descriptor_path(descriptor_path: &Path) -> PathBuf {
    descriptor_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(AUX_DESCRIPTOR_FILE_NAME)
}

pub fn read_descriptor(path: &Path) -> DescriptorResult<Descriptor> {
    let raw = std::fs::read_to_string(path).map_err(|e| DescriptorError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    toml::from_str(&raw).map_err(|e| DescriptorError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

pub fn write_descriptor(path: &Path, descriptor: &Descriptor) -> DescriptorResult<()> {
    let rendered = toml::to_string_pretty(descriptor).map_err(|e| DescriptorError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    std::fs::write(path, rendered).map_err(|e| DescriptorError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
