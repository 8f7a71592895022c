//! Filesystem helpers for materializing blocks.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::errors::DomainError;

/// Map a recorded block path onto the filesystem.
///
/// Without an output directory the recorded path is used as written, relative
/// to the working directory. With one, only the normal components of the
/// recorded path are kept so the target always stays inside `output_dir`.
pub fn resolve_target(output_dir: Option<&Path>, recorded: &str) -> Result<PathBuf, DomainError> {
    let Some(output_dir) = output_dir.filter(|dir| !dir.as_os_str().is_empty()) else {
        return Ok(PathBuf::from(recorded));
    };

    let mut target = output_dir.to_path_buf();
    let mut pushed = false;
    for component in Path::new(recorded).components() {
        if let Component::Normal(part) = component {
            target.push(part);
            pushed = true;
        }
    }

    if !pushed {
        return Err(DomainError::EmptyBlockTarget {
            path: recorded.to_owned(),
        });
    }
    Ok(target)
}

/// Write `content` to `path`, creating parent directories and replacing any
/// existing file.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
