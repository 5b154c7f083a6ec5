//! REST client for the hosting provider's repository contents API.
//!
//! ```text
//! GET /repos/{owner}/{repo}/contents/{path}?ref={branch}   -> 200 { sha } | 404
//! PUT /repos/{owner}/{repo}/contents/{path}                -> 2xx { content: { sha } }
//!     { message, content, branch, sha? }
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::marker::{RevisionMarker, WriteReceipt};
use crate::RevisionStore;

/// Default public API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("catalog-sync/", env!("CARGO_PKG_VERSION"));
const ACCEPT_JSON: &str = "application/vnd.github+json";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and as whom to talk to the contents API.
#[derive(Clone)]
pub struct GitHubConfig {
    /// Base URL, e.g. `https://api.github.com`.
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Branch every read and write targets.
    pub branch: String,
    /// Bearer token with contents write access.
    pub token: String,
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// HTTP client for one repository branch.
pub struct GitHubContentsClient {
    client: reqwest::Client,
    config: GitHubConfig,
}

/// Body of a `PUT` contents request.
#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ContentMeta {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: Option<ContentMeta>,
}

impl GitHubContentsClient {
    /// Create a client with its own connection pool.
    pub fn new(config: GitHubConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: GitHubConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// `{api_base}/repos/{owner}/{repo}/contents/{path}` with each path
    /// segment percent-encoded.
    fn contents_url(&self, path: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| StoreError::InvalidUrl(format!("{}: {e}", self.config.api_base)))?;

        url.path_segments_mut()
            .map_err(|()| {
                StoreError::InvalidUrl(format!("{} cannot be a base URL", self.config.api_base))
            })?
            .pop_if_empty()
            .extend([
                "repos",
                self.config.owner.as_str(),
                self.config.repo.as_str(),
                "contents",
            ])
            .extend(path.split('/').filter(|segment| !segment.is_empty()));

        Ok(url)
    }

    // ---- private helpers ----

    /// Build a [`StoreError::Api`] from a non-success response, keeping the
    /// body text for the caller.
    async fn api_error(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        StoreError::Api { status, body }
    }
}

#[async_trait]
impl RevisionStore for GitHubContentsClient {
    async fn read_marker(&self, path: &str) -> Result<Option<RevisionMarker>, StoreError> {
        let url = self.contents_url(path)?;

        let response = self
            .client
            .get(url)
            .query(&[("ref", self.config.branch.as_str())])
            .bearer_auth(&self.config.token)
            .header(ACCEPT, ACCEPT_JSON)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(path, "Path not present in store");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Self::api_error(response).await);
        }

        let meta: ContentMeta = response.json().await.map_err(|e| StoreError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path, marker = %meta.sha, "Read revision marker");
        Ok(Some(RevisionMarker::new(meta.sha)))
    }

    async fn write(
        &self,
        path: &str,
        content_base64: &str,
        message: &str,
        marker: Option<&RevisionMarker>,
    ) -> Result<WriteReceipt, StoreError> {
        let url = self.contents_url(path)?;
        let body = PutContentsRequest {
            message,
            content: content_base64,
            branch: &self.config.branch,
            sha: marker.map(RevisionMarker::as_str),
        };

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.config.token)
            .header(ACCEPT, ACCEPT_JSON)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        // The write already happened; a body we cannot parse only costs us
        // the new marker.
        let new_marker = response
            .json::<PutContentsResponse>()
            .await
            .ok()
            .and_then(|r| r.content)
            .map(|c| RevisionMarker::new(c.sha));

        tracing::debug!(path, created = marker.is_none(), "Wrote path");
        Ok(WriteReceipt {
            path: path.to_string(),
            created: marker.is_none(),
            marker: new_marker,
        })
    }
}
