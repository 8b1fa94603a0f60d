use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

use crate::http::HttpClient;

use super::NAMESPACE;

/// What to propose: from `fork_user`'s fork branch into the upstream branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDraft {
    pub package: String,
    pub fork_user: String,
    pub branch: String,
    pub title: String,
    pub description: String,
}

/// A pull request the forge accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    pub url: String,
}

/// Capability to open a pull request on the forge.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PullRequestOpener: Send + Sync {
    async fn open(&self, draft: &PullRequestDraft) -> Result<PullRequest>;
}

#[derive(Deserialize, Debug)]
struct Created {
    id: u64,
    title: String,
    full_url: Option<String>,
}

/// Opens pull requests through Pagure's `pull-request/new` endpoint.
pub struct PagurePullRequests {
    http_client: HttpClient,
    instance_url: String,
}

impl PagurePullRequests {
    pub fn new(http_client: HttpClient, instance_url: &str) -> Self {
        Self {
            http_client,
            instance_url: instance_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PullRequestOpener for PagurePullRequests {
    #[tracing::instrument(skip(self, draft), fields(package = %draft.package))]
    async fn open(&self, draft: &PullRequestDraft) -> Result<PullRequest> {
        let url = format!(
            "{}/api/0/{}/{}/pull-request/new",
            self.instance_url, NAMESPACE, draft.package
        );
        let form = [
            ("title", draft.title.as_str()),
            ("initial_comment", draft.description.as_str()),
            ("branch_to", draft.branch.as_str()),
            ("branch_from", draft.branch.as_str()),
            ("repo_from", draft.package.as_str()),
            ("repo_from_username", draft.fork_user.as_str()),
            ("repo_from_namespace", NAMESPACE),
        ];

        let created: Created = self
            .http_client
            .post_form_json(&url, &form)
            .await
            .with_context(|| format!("Failed to open a pull request for {}", draft.package))?;
        debug!("Pull request #{} created", created.id);

        // A different title means the forge picked up other commits.
        if created.title != draft.title {
            bail!(
                "Opening the pull request did not go well, it needs manual inspection. \
                 Expected title {:?}, got {:?}",
                draft.title,
                created.title
            );
        }

        let url = created.full_url.unwrap_or_else(|| {
            format!(
                "{}/{}/{}/pull-request/{}",
                self.instance_url, NAMESPACE, draft.package, created.id
            )
        });

        Ok(PullRequest {
            id: created.id,
            title: created.title,
            url,
        })
    }
}
