//! fedpkg, rpmdev-bumpspec, mock, rpm, koji and kinit.

use anyhow::{Result, bail};
use log::debug;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::runtime::{Invocation, Runtime};

use super::run_checked;

/// Marker koji prints once a build finished well.
pub const KOJI_SUCCESS_MARKER: &str = "completed successfully";

static KOJI_TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Task info: (https?://\S+?taskID=\d+)").unwrap());

/// Clone a package's dist-git repository into `dest`.
pub fn fedpkg_clone<R: Runtime>(runtime: &R, package: &str, dest: &Path) -> Result<()> {
    run_checked(
        runtime,
        &Invocation::new("fedpkg").args(["clone", package]).path_arg(dest),
    )?;
    Ok(())
}

/// Build the source rpm of a checkout and return its path.
pub fn fedpkg_srpm<R: Runtime>(runtime: &R, package_dir: &Path) -> Result<PathBuf> {
    run_checked(
        runtime,
        &Invocation::new("fedpkg").arg("srpm").current_dir(package_dir),
    )?;

    let mut srpms = runtime.glob(package_dir, "*.src.rpm")?;
    match srpms.len() {
        1 => Ok(srpms.remove(0)),
        0 => bail!("fedpkg srpm produced no source rpm in {:?}", package_dir),
        n => bail!("Expected one source rpm in {:?}, found {}", package_dir, n),
    }
}

/// Bump the release and add a changelog entry.
pub fn bumpspec<R: Runtime>(
    runtime: &R,
    spec: &Path,
    comment: &str,
    user: Option<&str>,
) -> Result<()> {
    let mut invocation = Invocation::new("rpmdev-bumpspec")
        .args(["-c", comment])
        .path_arg(spec);
    if let Some(user) = user {
        invocation = invocation.args(["-u", user]);
    }
    run_checked(runtime, &invocation)?;
    Ok(())
}

/// Rebuild a source rpm in a mock chroot.
pub fn mock_build<R: Runtime>(runtime: &R, root: &str, srpm: &Path) -> Result<()> {
    run_checked(
        runtime,
        &Invocation::new("mock").args(["-q", "-r", root]).path_arg(srpm),
    )?;
    Ok(())
}

/// Requirements declared by a binary rpm, split on whitespace.
pub fn rpm_requires<R: Runtime>(runtime: &R, rpm: &Path) -> Result<Vec<String>> {
    let out = run_checked(runtime, &Invocation::new("rpm").arg("-qRp").path_arg(rpm))?;
    Ok(out.stdout.split_whitespace().map(String::from).collect())
}

/// Submit a scratch build and wait for it. Returns the task link.
pub fn koji_scratch_build<R: Runtime>(runtime: &R, target: &str, srpm: &Path) -> Result<String> {
    let out = run_checked(
        runtime,
        &Invocation::new("koji")
            .args(["build", "--scratch", "--noprogress", target])
            .path_arg(srpm),
    )?;
    debug!("Koji scratch build output: {}", out.stdout);
    parse_koji_output(&out.stdout)
}

/// Pull the task link out of a finished koji build's output.
pub fn parse_koji_output(output: &str) -> Result<String> {
    if !output.contains(KOJI_SUCCESS_MARKER) {
        bail!(
            "Koji scratch build did not complete successfully. Output: {}",
            output.trim()
        );
    }
    match KOJI_TASK_RE.captures(output) {
        Some(caps) => Ok(caps[1].to_string()),
        None => bail!("Koji build succeeded but printed no task link"),
    }
}

/// Obtain a Kerberos ticket, feeding the password on stdin.
pub fn kinit<R: Runtime>(runtime: &R, principal: &str, password: &str) -> Result<()> {
    run_checked(
        runtime,
        &Invocation::new("kinit")
            .arg(principal)
            .stdin(format!("{}\n", password)),
    )?;
    Ok(())
}
