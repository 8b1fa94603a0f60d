//! The per-package fix workflow.
//!
//! For each candidate: check eligibility, clone, rewrite the spec file, add a
//! changelog entry, optionally test-build, optionally publish. A failing
//! package is recorded and the run moves on to the next one.

mod error;
mod options;
mod publish;
mod report;
mod validate;

use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::forge::{Forge, PullRequestOpener};
use crate::rewrite::{find_spec_file, fix_spec_file};
use crate::runtime::Runtime;
use crate::tools::{git, packaging};

pub use error::WorkflowError;
pub use options::{
    Credentials, DEFAULT_BRANCH, Identity, PublishSettings, ValidationSettings, WorkflowOptions,
    changelog_comment,
};
pub use report::{FixedPackage, Outcome, Report};

pub struct Workflow<R: Runtime, F: Forge, P: PullRequestOpener> {
    pub runtime: R,
    pub forge: F,
    pub opener: P,
    pub options: WorkflowOptions,
}

impl<R: Runtime, F: Forge, P: PullRequestOpener> Workflow<R, F, P> {
    pub fn new(runtime: R, forge: F, opener: P, options: WorkflowOptions) -> Self {
        Self {
            runtime,
            forge,
            opener,
            options,
        }
    }

    /// Process every package in order and sort them by outcome.
    pub async fn run(&self, packages: &[String]) -> Report {
        let mut report = Report::default();
        for (i, package) in packages.iter().enumerate() {
            info!("[{}/{}] {}", i + 1, packages.len(), package);
            let outcome = self.process_package(package).await;
            report.record(package, &outcome);
        }
        report
    }

    /// Run the workflow for one package. Never fails; errors become the outcome.
    #[tracing::instrument(skip(self))]
    pub async fn process_package(&self, package: &str) -> Outcome {
        match self.is_eligible(package).await {
            Ok(true) => {}
            Ok(false) => {
                info!("{} has a long-term branch, skipping", package);
                return Outcome::Ineligible;
            }
            Err(e) => {
                warn!("{}: {}", package, e);
                return Outcome::Failed(e);
            }
        }

        match self.fix_package(package).await {
            Ok(fixed) => {
                info!("{} fixed", package);
                Outcome::Fixed(fixed)
            }
            Err(e) => {
                warn!("{}: {}", package, e);
                Outcome::Failed(e)
            }
        }
    }

    /// Eligible when none of the package's branches is long-term.
    pub async fn is_eligible(&self, package: &str) -> Result<bool, WorkflowError> {
        let branches = self
            .forge
            .list_branches(package)
            .await
            .map_err(WorkflowError::eligibility)?;
        let long_term = branches
            .iter()
            .find(|b| self.options.long_term_branches.contains(b));
        if let Some(branch) = long_term {
            info!("{} has branch {}", package, branch);
        }
        Ok(long_term.is_none())
    }

    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.options.work_dir.join(package)
    }

    async fn fix_package(&self, package: &str) -> Result<FixedPackage, WorkflowError> {
        let dir = self.package_dir(package);

        info!("Cloning {} into {:?}", package, dir);
        packaging::fedpkg_clone(&self.runtime, package, &dir)
            .map_err(WorkflowError::acquisition)?;

        let spec = self.patch(&dir).map_err(WorkflowError::patch)?;

        let scratch_build = match &self.options.validation {
            Some(settings) => Some(
                validate::validate(&self.runtime, &dir, settings)
                    .map_err(WorkflowError::validation)?,
            ),
            None => None,
        };

        let pull_request = match &self.options.publish {
            Some(settings) => {
                let change = publish::Change {
                    package,
                    package_dir: &dir,
                    spec: &spec,
                    scratch_build: scratch_build.as_deref(),
                };
                let pr = publish::publish(
                    &self.runtime,
                    &self.forge,
                    &self.opener,
                    settings,
                    &change,
                )
                .await
                .map_err(WorkflowError::publication)?;
                Some(pr.url)
            }
            None => None,
        };

        Ok(FixedPackage {
            scratch_build,
            pull_request,
        })
    }

    /// Rewrite the spec file and add the changelog entry. Returns the spec path.
    fn patch(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let spec = find_spec_file(&self.runtime, dir)?;
        let change = fix_spec_file(&self.runtime, &spec, true)?;
        if !change.changed {
            anyhow::bail!("No misnamed requires found in {:?}", spec);
        }

        packaging::bumpspec(
            &self.runtime,
            &spec,
            &changelog_comment(),
            self.options.changelog_user.as_deref(),
        )?;

        match git::diff(&self.runtime, dir, &spec) {
            Ok(diff) => info!("Changes in {:?}:\n{}", spec, diff),
            Err(e) => warn!("Could not show the diff of {:?}: {:#}", spec, e),
        }
        Ok(spec)
    }
}
