use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::path::Path;

use crate::forge::{Forge, PullRequest, PullRequestDraft, PullRequestOpener};
use crate::runtime::Runtime;
use crate::tools::{ToolError, git};

use super::options::{COMMIT_MESSAGE, PublishSettings, pull_request_description};

/// Push failures meaning the fork is not writable yet.
const FORK_NOT_READY_MARKERS: &[&str] = &[
    "denied by fallthru",
    "access denied",
    "does not appear to be a git repository",
    "repository not found",
];

/// Whether a failed push is worth another attempt.
pub fn is_fork_not_ready(error: &anyhow::Error) -> bool {
    match error.downcast_ref::<ToolError>() {
        Some(tool) => FORK_NOT_READY_MARKERS
            .iter()
            .any(|marker| tool.output_contains(marker)),
        None => false,
    }
}

/// Everything the publication step needs about one package.
pub struct Change<'a> {
    pub package: &'a str,
    pub package_dir: &'a Path,
    pub spec: &'a Path,
    pub scratch_build: Option<&'a str>,
}

/// Commit the change, push it to the user's fork and propose it upstream.
#[tracing::instrument(skip_all, fields(package = change.package))]
pub async fn publish<R, F, P>(
    runtime: &R,
    forge: &F,
    opener: &P,
    settings: &PublishSettings,
    change: &Change<'_>,
) -> Result<PullRequest>
where
    R: Runtime,
    F: Forge,
    P: PullRequestOpener,
{
    let user = settings.fork_user.as_str();
    let dir = change.package_dir;

    forge.ensure_fork(change.package).await?;
    let fork_url = forge.fork_ssh_url(user, change.package).await?;
    debug!("Fork URL: {}", fork_url);

    git::remote_add(runtime, dir, user, &fork_url)?;
    git::add(runtime, dir, change.spec)?;
    git::commit(runtime, dir, COMMIT_MESSAGE)?;

    settings
        .push_retry
        .run(
            &format!("Pushing to {}", fork_url),
            is_fork_not_ready,
            |attempt| async move {
                debug!("Push attempt {}", attempt);
                git::force_push(runtime, dir, user, &settings.branch)
            },
        )
        .await?;
    info!("Pushed {} to {}", settings.branch, fork_url);

    ensure_single_commit(runtime, dir, &settings.branch)?;

    let draft = PullRequestDraft {
        package: change.package.to_string(),
        fork_user: user.to_string(),
        branch: settings.branch.clone(),
        title: COMMIT_MESSAGE.to_string(),
        description: pull_request_description(change.scratch_build),
    };
    let pr = opener.open(&draft).await?;
    info!("Pull request opened: {}", pr.url);
    Ok(pr)
}

/// The fork must differ from upstream by exactly our commit.
fn ensure_single_commit<R: Runtime>(runtime: &R, dir: &Path, branch: &str) -> Result<()> {
    let base = format!("origin/{}", branch);
    let commits = git::commits_since(runtime, dir, &base)
        .context("Could not compare the fork with upstream")?;
    if commits != [COMMIT_MESSAGE] {
        bail!(
            "The pushed branch does not differ from {} by exactly one fix commit, \
             it needs manual inspection. Commits: {:?}",
            base,
            commits
        );
    }
    Ok(())
}
