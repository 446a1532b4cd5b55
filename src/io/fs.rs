use std::{fs, path::Path};

use anyhow::{bail, Context, Result};

/// Create `path` as a directory if needed; fail if something else is there.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() && !path.is_dir() {
        bail!("Output path exists but is not a directory: {}", path.display());
    }
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create output directory {}", path.display()))
}

/// Fail unless `path` is an existing directory.
pub fn require_dir_exists(path: &Path) -> Result<()> {
    if !path.is_dir() {
        bail!("Input directory does not exist: {}", path.display());
    }
    Ok(())
}
