//! Forge abstraction: branches, forks and pull requests of package repos.
//!
//! Package repositories live in the `rpms` namespace of a Pagure instance.
//! [`Forge`] covers the REST calls the workflow needs; opening a pull request
//! is a separate capability, [`PullRequestOpener`], so it can be backed by
//! whatever the forge offers without touching the workflow.

mod pagure;
mod pull_request;

use anyhow::Result;
use async_trait::async_trait;

pub use pagure::{DEFAULT_INSTANCE_URL, PagureForge};
pub use pull_request::{PagurePullRequests, PullRequest, PullRequestDraft, PullRequestOpener};

#[cfg(test)]
pub use pull_request::MockPullRequestOpener;

/// Namespace of package repositories.
pub const NAMESPACE: &str = "rpms";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    /// Names of the package repository's branches.
    async fn list_branches(&self, package: &str) -> Result<Vec<String>>;

    /// Fork the package repository for the authenticated user.
    /// An existing fork is not an error.
    async fn ensure_fork(&self, package: &str) -> Result<()>;

    /// SSH clone URL of `user`'s fork of the package.
    async fn fork_ssh_url(&self, user: &str, package: &str) -> Result<String>;
}
