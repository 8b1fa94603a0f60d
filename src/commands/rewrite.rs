use anyhow::Result;
use log::info;
use std::path::PathBuf;

use crate::{
    rewrite::{SpecChange, fix_spec_file},
    runtime::Runtime,
};

/// Rewrite the requires directives of each spec file in turn.
///
/// With `dry_run` the files are left alone and the rewritten text is printed.
#[tracing::instrument(skip(runtime))]
pub fn rewrite<R: Runtime>(runtime: &R, specs: &[PathBuf], dry_run: bool) -> Result<Vec<SpecChange>> {
    let mut changes = Vec::with_capacity(specs.len());
    for spec in specs {
        let change = fix_spec_file(runtime, spec, !dry_run)?;
        if dry_run {
            print!("{}", change.text);
        } else if change.changed {
            println!("   rewrote {}", spec.display());
        } else {
            info!("Nothing to rewrite in {:?}", spec);
        }
        changes.push(change);
    }
    Ok(changes)
}
