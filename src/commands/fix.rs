use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::{
    candidates::CandidateSource,
    forge::{Forge, PullRequestOpener},
    retry::RetryPolicy,
    runtime::Runtime,
    tools::packaging,
    workflow::{
        Credentials, Identity, PublishSettings, Report, ValidationSettings, Workflow,
        WorkflowError, WorkflowOptions,
    },
};

use super::config::Config;

/// Prefix of the working directory created when none is given.
const TEMP_DIR_PREFIX: &str = "misreq-";

/// Everything `misreq fix` was asked to do.
#[derive(Debug, Clone)]
pub struct FixRequest {
    pub source: CandidateSource,
    pub dirname: Option<PathBuf>,
    pub cleandir: bool,
    pub limit: Option<usize>,
    pub changelog_user: Option<String>,
    pub no_test: bool,
    pub pagure: bool,
    pub branch: String,
    pub credentials: Credentials,
    pub api_url: Option<String>,
}

/// Credentials are checked before anything else happens.
#[tracing::instrument(skip_all)]
pub async fn fix<R: Runtime>(runtime: R, request: FixRequest) -> Result<Report> {
    let fork_user = request.credentials.fork_user(request.pagure)?;
    let identity = request.credentials.identity()?;

    let config = Config::new(
        runtime,
        request.credentials.pagure_token.as_deref(),
        request.api_url.clone(),
    )?;
    run(config, &request, fork_user, identity).await
}

pub async fn run<R: Runtime, F: Forge, P: PullRequestOpener>(
    config: Config<R, F, P>,
    request: &FixRequest,
    fork_user: Option<String>,
    identity: Option<Identity>,
) -> Result<Report> {
    if let Some(identity) = identity {
        info!("Obtaining a Kerberos ticket for {}", identity.principal());
        packaging::kinit(&config.runtime, &identity.principal(), &identity.password)
            .map_err(|e| WorkflowError::Configuration(format!("kinit failed: {:#}", e)))?;
    }

    let work_dir = prepare_work_dir(&config.runtime, request.dirname.as_deref(), request.cleandir)?;
    info!("Working directory: {:?}", work_dir);

    let mut packages = request.source.load(&config.runtime)?;
    if let Some(limit) = request.limit {
        packages.truncate(limit);
    }
    info!("{} package(s) to process", packages.len());

    let mut options = WorkflowOptions::new(work_dir);
    options.changelog_user = request.changelog_user.clone();
    options.validation = (!request.no_test).then(ValidationSettings::default);
    options.publish = fork_user.map(|fork_user| PublishSettings {
        fork_user,
        branch: request.branch.clone(),
        push_retry: RetryPolicy::fork_push(),
    });

    let workflow = Workflow::new(config.runtime, config.forge, config.opener, options);
    Ok(workflow.run(&packages).await)
}

/// The directory packages get cloned into.
///
/// A given directory is created if needed and emptied first with `cleandir`.
/// Without one, a fresh temporary directory is created and left in place.
pub fn prepare_work_dir<R: Runtime>(
    runtime: &R,
    dirname: Option<&Path>,
    cleandir: bool,
) -> Result<PathBuf> {
    match dirname {
        Some(dir) => {
            if cleandir && runtime.exists(dir) {
                info!("Cleaning {:?}", dir);
                runtime
                    .remove_dir_all(dir)
                    .with_context(|| format!("Failed to clean {:?}", dir))?;
            }
            runtime.create_dir_all(dir)?;
            Ok(dir.to_path_buf())
        }
        None => runtime.create_temp_dir(TEMP_DIR_PREFIX),
    }
}
