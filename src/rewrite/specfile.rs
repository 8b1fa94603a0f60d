use anyhow::{Context, Result, bail};
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

use super::fix_spec;

/// Result of rewriting one spec file.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecChange {
    pub path: PathBuf,
    pub changed: bool,
    /// The rewritten text.
    pub text: String,
}

/// Locate the one spec file in a package checkout.
pub fn find_spec_file<R: Runtime>(runtime: &R, package_dir: &Path) -> Result<PathBuf> {
    let mut found = runtime.glob(package_dir, "*.spec")?;
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => bail!("No spec file found in {:?}", package_dir),
        n => bail!(
            "Expected exactly one spec file in {:?}, found {}: {:?}",
            package_dir,
            n,
            found
        ),
    }
}

/// Rewrite the requires directives of a spec file.
///
/// The whole file is read before anything is written. With `write` unset,
/// or when nothing changed, the file on disk is left alone.
#[tracing::instrument(skip(runtime))]
pub fn fix_spec_file<R: Runtime>(runtime: &R, path: &Path, write: bool) -> Result<SpecChange> {
    let spec = runtime
        .read_to_string(path)
        .with_context(|| format!("Failed to read spec file {:?}", path))?;

    let text = fix_spec(&spec);
    let changed = text != spec;
    debug!("Spec file {:?} changed: {}", path, changed);

    if write && changed {
        runtime
            .write(path, text.as_bytes())
            .with_context(|| format!("Failed to write spec file {:?}", path))?;
    }

    Ok(SpecChange {
        path: path.to_path_buf(),
        changed,
        text,
    })
}
