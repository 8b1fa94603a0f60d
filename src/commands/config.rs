use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::{
    forge::{DEFAULT_INSTANCE_URL, Forge, PagureForge, PagurePullRequests, PullRequestOpener},
    http::HttpClient,
    runtime::Runtime,
};

pub struct Config<R: Runtime, F: Forge, P: PullRequestOpener> {
    pub runtime: R,
    pub forge: F,
    pub opener: P,
}

impl<R: Runtime> Config<R, PagureForge, PagurePullRequests> {
    pub fn new(runtime: R, pagure_token: Option<&str>, api_url: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = pagure_token {
            let mut auth_value = HeaderValue::from_str(&format!("token {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using pagure token for authentication: {}", mask_token(token));
        }

        let client = Client::builder()
            .user_agent("misreq-cli")
            .default_headers(headers)
            .build()?;

        let instance_url = api_url.as_deref().unwrap_or(DEFAULT_INSTANCE_URL);
        let http_client = HttpClient::new(client);
        let forge = PagureForge::from_http_client(http_client.clone(), instance_url);
        let opener = PagurePullRequests::new(http_client, instance_url);

        Ok(Self {
            runtime,
            forge,
            opener,
        })
    }
}

/// First and last four characters, or nothing for short tokens.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockito::{Matcher, Server};

    /// Helper function to verify Authorization header behavior
    /// - `token`: Some(token) to test with a pagure token, None to test without
    async fn verify_authorization_header(token: Option<&str>) {
        let mut server = Server::new_async().await;

        let expected_header = match token {
            Some(t) => Matcher::Exact(format!("token {}", t)),
            None => Matcher::Missing,
        };

        let mock = server
            .mock("GET", "/api/0/rpms/foo/git/branches")
            .match_header("Authorization", expected_header)
            .match_header("User-Agent", "misreq-cli")
            .with_status(200)
            .with_body(r#"{"branches": ["master"]}"#)
            .create_async()
            .await;

        let config = Config::new(MockRuntime::new(), token, Some(server.url())).unwrap();
        let branches = config.forge.list_branches("foo").await.unwrap();

        mock.assert_async().await;
        assert_eq!(branches, vec!["master"]);
    }

    #[tokio::test]
    async fn test_config_new_with_pagure_token() {
        verify_authorization_header(Some("ABCDEFGHIJKLMNOPQRSTUVWXYZ")).await;
    }

    #[tokio::test]
    async fn test_config_new_without_pagure_token() {
        verify_authorization_header(None).await;
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "*********");
        assert_eq!(mask_token("ABCDEFGHIJKLMNOP"), "ABCD*********MNOP");
    }
}
