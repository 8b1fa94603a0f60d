use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;

use crate::runtime::{Invocation, Runtime};

use super::{ToolError, run_checked};

fn git(repo: &Path) -> Invocation {
    Invocation::new("git").current_dir(repo)
}

/// Add a remote, treating an existing remote of that name as done.
pub fn remote_add<R: Runtime>(runtime: &R, repo: &Path, name: &str, url: &str) -> Result<()> {
    match run_checked(runtime, &git(repo).args(["remote", "add", name, url])) {
        Ok(_) => Ok(()),
        Err(e) => match e.downcast_ref::<ToolError>() {
            Some(tool) if tool.output_contains("already exists") => {
                info!("Remote {} already configured", name);
                Ok(())
            }
            _ => Err(e),
        },
    }
}

pub fn add<R: Runtime>(runtime: &R, repo: &Path, path: &Path) -> Result<()> {
    run_checked(runtime, &git(repo).arg("add").path_arg(path))?;
    Ok(())
}

pub fn commit<R: Runtime>(runtime: &R, repo: &Path, message: &str) -> Result<()> {
    run_checked(runtime, &git(repo).args(["commit", "-m", message]))?;
    Ok(())
}

/// Force-push `branch` to `remote`.
pub fn force_push<R: Runtime>(runtime: &R, repo: &Path, remote: &str, branch: &str) -> Result<()> {
    run_checked(runtime, &git(repo).args(["push", "-f", remote, branch]))?;
    Ok(())
}

/// The working tree diff of one file.
pub fn diff<R: Runtime>(runtime: &R, repo: &Path, path: &Path) -> Result<String> {
    let out = run_checked(runtime, &git(repo).args(["--no-pager", "diff"]).path_arg(path))?;
    Ok(out.stdout)
}

/// Subjects of the commits on `HEAD` that `base` does not have, newest first.
pub fn commits_since<R: Runtime>(runtime: &R, repo: &Path, base: &str) -> Result<Vec<String>> {
    let range = format!("{}..HEAD", base);
    let out = run_checked(runtime, &git(repo).args(["log", "--format=%s", &range]))
        .with_context(|| format!("Failed to list commits in {}", range))?;
    let subjects: Vec<String> = out
        .stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.to_string())
        .collect();
    debug!("Commits in {}: {:?}", range, subjects);
    Ok(subjects)
}
