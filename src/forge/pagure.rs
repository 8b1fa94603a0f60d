//! Pagure REST API client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
#[cfg(test)]
use reqwest::Client;

use crate::http::{ApiError, HttpClient};

use super::{Forge, NAMESPACE};

/// The Fedora package sources forge.
pub const DEFAULT_INSTANCE_URL: &str = "https://src.fedoraproject.org";

/// Pagure API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Branches {
        pub branches: Vec<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct GitUrls {
        pub urls: Urls,
    }

    #[derive(Deserialize, Debug)]
    pub struct Urls {
        pub ssh: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct Message {
        pub message: Option<String>,
    }
}

/// Pagure forge client.
pub struct PagureForge {
    http_client: HttpClient,
    instance_url: String,
}

impl PagureForge {
    /// Used primarily for testing.
    #[cfg(test)]
    pub fn with_instance_url(client: Client, instance_url: &str) -> Self {
        Self::from_http_client(HttpClient::new(client), instance_url)
    }

    /// Create from an existing HttpClient.
    pub fn from_http_client(http_client: HttpClient, instance_url: &str) -> Self {
        Self {
            http_client,
            instance_url: instance_url.trim_end_matches('/').to_string(),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/0/{}", self.instance_url, path)
    }
}

#[async_trait]
impl Forge for PagureForge {
    #[tracing::instrument(skip(self))]
    async fn list_branches(&self, package: &str) -> Result<Vec<String>> {
        let url = self.api(&format!("{}/{}/git/branches", NAMESPACE, package));
        debug!("Fetching branches from {}...", url);
        let branches: api::Branches = self
            .http_client
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to list branches of {}", package))?;
        Ok(branches.branches)
    }

    #[tracing::instrument(skip(self))]
    async fn ensure_fork(&self, package: &str) -> Result<()> {
        let url = self.api("fork");
        let form = [("wait", "true"), ("namespace", NAMESPACE), ("repo", package)];

        match self
            .http_client
            .post_form_json::<_, api::Message>(&url, &form)
            .await
        {
            Ok(response) => {
                debug!("Fork created: {:?}", response.message);
                Ok(())
            }
            Err(e) => match e.downcast_ref::<ApiError>() {
                Some(api) if api.message().contains("already exists") => {
                    info!("A fork of {} already exists", package);
                    Ok(())
                }
                _ => Err(e.context(format!("Failed to fork {}", package))),
            },
        }
    }

    #[tracing::instrument(skip(self))]
    async fn fork_ssh_url(&self, user: &str, package: &str) -> Result<String> {
        let url = self.api(&format!("fork/{}/{}/{}/git/urls", user, NAMESPACE, package));
        let urls: api::GitUrls = self
            .http_client
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to get git URLs of {}'s fork of {}", user, package))?;
        Ok(urls.urls.ssh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_list_branches() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/0/rpms/python-foo/git/branches")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"branches": ["el6", "f28", "master"], "total_branches": 3}"#)
            .create_async()
            .await;

        let forge = PagureForge::with_instance_url(Client::new(), &server.url());
        let branches = forge.list_branches("python-foo").await.unwrap();

        mock.assert_async().await;
        assert_eq!(branches, vec!["el6", "f28", "master"]);
    }

    #[tokio::test]
    async fn test_list_branches_unknown_package() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/0/rpms/nope/git/branches")
            .with_status(404)
            .with_body(r#"{"error": "Project not found", "error_code": "ENOPROJECT"}"#)
            .create_async()
            .await;

        let forge = PagureForge::with_instance_url(Client::new(), &server.url());
        let err = forge.list_branches("nope").await.unwrap_err();
        assert!(err.to_string().contains("Failed to list branches of nope"));
        assert!(format!("{:#}", err).contains("Project not found"));
    }

    #[tokio::test]
    async fn test_ensure_fork_creates_fork() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/0/fork")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("namespace".into(), "rpms".into()),
                Matcher::UrlEncoded("repo".into(), "foo".into()),
                Matcher::UrlEncoded("wait".into(), "true".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "Repo \"rpms/foo\" cloned to \"jdoe/rpms/foo\""}"#)
            .create_async()
            .await;

        let forge = PagureForge::with_instance_url(Client::new(), &server.url());
        forge.ensure_fork("foo").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ensure_fork_already_exists_is_ok() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/0/fork")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Repo \"forks/jdoe/rpms/foo\" already exists", "error_code": "ENOCODE"}"#)
            .create_async()
            .await;

        let forge = PagureForge::with_instance_url(Client::new(), &server.url());
        forge.ensure_fork("foo").await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_fork_other_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/0/fork")
            .with_status(401)
            .with_body(r#"{"error": "Invalid or expired token", "error_code": "EINVALIDTOK"}"#)
            .create_async()
            .await;

        let forge = PagureForge::with_instance_url(Client::new(), &server.url());
        let err = forge.ensure_fork("foo").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_fork_ssh_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/0/fork/jdoe/rpms/foo/git/urls")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"urls": {"git": "https://src.example/forks/jdoe/rpms/foo.git",
                             "ssh": "ssh://jdoe@pkgs.example/forks/jdoe/rpms/foo.git"},
                    "total_urls": 2}"#,
            )
            .create_async()
            .await;

        let forge = PagureForge::with_instance_url(Client::new(), &format!("{}/", server.url()));
        let url = forge.fork_ssh_url("jdoe", "foo").await.unwrap();

        mock.assert_async().await;
        assert_eq!(url, "ssh://jdoe@pkgs.example/forks/jdoe/rpms/foo.git");
    }
}
