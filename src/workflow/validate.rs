use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::path::Path;

use crate::rewrite::is_unversioned;
use crate::runtime::Runtime;
use crate::tools::packaging;

use super::options::ValidationSettings;

/// Build the package locally and in koji. Returns the scratch build link.
#[tracing::instrument(skip(runtime, settings))]
pub fn validate<R: Runtime>(
    runtime: &R,
    package_dir: &Path,
    settings: &ValidationSettings,
) -> Result<String> {
    let srpm = packaging::fedpkg_srpm(runtime, package_dir).context("Building the source rpm")?;
    debug!("Source rpm: {:?}", srpm);

    info!("Running mock build in {}", settings.mock_root);
    packaging::mock_build(runtime, &settings.mock_root, &srpm).context("Mock build")?;
    check_built_requires(runtime, &settings.mock_result_dir)?;

    info!("Running koji scratch build against {}", settings.koji_target);
    let link = packaging::koji_scratch_build(runtime, &settings.koji_target, &srpm)
        .context("Koji scratch build")?;
    info!("Koji scratch build: {}", link);
    Ok(link)
}

/// Fail when any built rpm still requires an unversioned python name.
pub fn check_built_requires<R: Runtime>(runtime: &R, result_dir: &Path) -> Result<()> {
    let rpms = runtime.glob(result_dir, "*.rpm")?;
    if rpms.is_empty() {
        bail!("Mock left no rpms in {:?}", result_dir);
    }

    for rpm in &rpms {
        let requires = packaging::rpm_requires(runtime, rpm)?;
        if let Some(name) = requires.iter().find(|r| is_unversioned(r)) {
            bail!("Misnamed requires {:?} still present in {:?}", name, rpm);
        }
    }
    debug!("No misnamed requires in {} built rpm(s)", rpms.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, ProcessOutput};
    use std::path::PathBuf;

    const KOJI_OK: &str = "Created task: 42\n\
        Task info: https://koji.fedoraproject.org/koji/taskinfo?taskID=42\n\
        42 build (rawhide, foo-1.0-2.src.rpm) completed successfully\n";

    fn settings() -> ValidationSettings {
        ValidationSettings {
            mock_root: "fedora-rawhide-x86_64".to_string(),
            mock_result_dir: PathBuf::from("/mock/result"),
            koji_target: "rawhide".to_string(),
        }
    }

    fn expect_globs(runtime: &mut MockRuntime) {
        runtime.expect_glob().returning(|dir, pattern| match pattern {
            "*.src.rpm" => Ok(vec![dir.join("foo-1.0-2.src.rpm")]),
            "*.rpm" => Ok(vec![
                dir.join("foo-1.0-2.noarch.rpm"),
                dir.join("foo-1.0-2.src.rpm"),
            ]),
            _ => Ok(vec![]),
        });
    }

    #[test]
    fn test_validate_returns_scratch_link() {
        let mut runtime = MockRuntime::new();
        expect_globs(&mut runtime);
        runtime.expect_run().returning(|inv| {
            let out = match inv.program.as_str() {
                "rpm" => "python2-six\npython(abi) = 2.7\nrpmlib(CompressedFileNames) <= 3.0.4-1\n",
                "koji" => KOJI_OK,
                _ => "",
            };
            Ok(ProcessOutput::ok(out))
        });

        let link = validate(&runtime, Path::new("/work/foo"), &settings()).unwrap();
        assert_eq!(
            link,
            "https://koji.fedoraproject.org/koji/taskinfo?taskID=42"
        );
    }

    #[test]
    fn test_validate_rejects_leftover_misnamed_requires() {
        let mut runtime = MockRuntime::new();
        expect_globs(&mut runtime);
        runtime.expect_run().returning(|inv| match inv.program.as_str() {
            "rpm" => Ok(ProcessOutput::ok("python2-six python-setuptools")),
            "koji" => panic!("koji must not run after a failed check"),
            _ => Ok(ProcessOutput::ok("")),
        });

        let err = validate(&runtime, Path::new("/work/foo"), &settings()).unwrap_err();
        assert!(err.to_string().contains("python-setuptools"));
    }

    #[test]
    fn test_validate_mock_failure() {
        let mut runtime = MockRuntime::new();
        expect_globs(&mut runtime);
        runtime.expect_run().returning(|inv| match inv.program.as_str() {
            "mock" => Ok(ProcessOutput::failed("ERROR: Exception(foo.src.rpm)")),
            "fedpkg" => Ok(ProcessOutput::ok("Wrote: foo.src.rpm")),
            other => panic!("unexpected program {}", other),
        });

        let err = validate(&runtime, Path::new("/work/foo"), &settings()).unwrap_err();
        assert_eq!(err.to_string(), "Mock build");
    }

    #[test]
    fn test_check_built_requires_needs_rpms() {
        let mut runtime = MockRuntime::new();
        runtime.expect_glob().returning(|_, _| Ok(vec![]));
        assert!(check_built_requires(&runtime, Path::new("/mock/result")).is_err());
    }
}
