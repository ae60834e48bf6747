//! Queuegate HTTP Client
//!
//! A small, type-safe client for the two GitHub Actions REST endpoints the
//! gate consumes: listing workflow runs by status and listing the jobs of a
//! run.
//!
//! # Example
//!
//! ```no_run
//! use queuegate_client::ActionsClient;
//! use queuegate_core::domain::run::RunStatus;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ActionsClient::new("https://api.github.com", "octo-org", "octo-repo", "ghp")?;
//!
//!     let runs = client.list_workflow_runs(RunStatus::InProgress).await?;
//!     println!("{} run(s) in progress", runs.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod runs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::debug;

/// Page size requested from list endpoints (the API maximum)
pub const PER_PAGE: usize = 100;

const USER_AGENT: &str = concat!("queuegate/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

/// HTTP client for the GitHub Actions API, scoped to one repository
#[derive(Clone)]
pub struct ActionsClient {
    /// Base URL of the API (e.g., "https://api.github.com")
    base_url: String,
    owner: String,
    repo: String,
    token: String,
    /// HTTP client instance
    client: Client,
}

impl ActionsClient {
    /// Create a new client with the standard GitHub headers preconfigured
    ///
    /// # Arguments
    /// * `base_url` - The API base URL (e.g., "https://api.github.com")
    /// * `owner` - Repository owner (user or organisation)
    /// * `repo` - Repository name
    /// * `token` - Bearer token used for every request
    pub fn new(
        base_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self::with_client(base_url, owner, repo, token, client))
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    /// The caller is responsible for the `Accept` and `User-Agent` headers.
    pub fn with_client(
        base_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
            client,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `owner/repo` this client is scoped to
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.base_url,
            self.owner,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Fetch every page of a list endpoint
    ///
    /// `split` pulls `(total_count, items)` out of one decoded page. Paging
    /// stops on a short page or once `total_count` items were collected.
    async fn get_all_pages<P, T, F>(
        &self,
        url: &str,
        filters: &[(&str, String)],
        split: F,
    ) -> Result<Vec<T>>
    where
        P: DeserializeOwned,
        F: Fn(P) -> (u64, Vec<T>),
    {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self
                .client
                .get(url)
                .bearer_auth(&self.token)
                .query(filters)
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())])
                .send()
                .await?;

            let (total_count, batch) = split(self.handle_response::<P>(response).await?);
            let fetched = batch.len();
            items.extend(batch);

            debug!(
                "GET {} page {}: {} item(s), {}/{} collected",
                url,
                page,
                fetched,
                items.len(),
                total_count
            );

            if !has_more_pages(items.len(), total_count, fetched) {
                return Ok(items);
            }
            page += 1;
        }
    }

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

impl fmt::Debug for ActionsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionsClient")
            .field("base_url", &self.base_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .finish()
    }
}

fn has_more_pages(collected: usize, total_count: u64, last_page_len: usize) -> bool {
    last_page_len == PER_PAGE && (collected as u64) < total_count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ActionsClient {
        ActionsClient::with_client(base_url, "octo-org", "octo-repo", "secret", Client::new())
    }

    #[test]
    fn test_client_creation() {
        let client = ActionsClient::new("https://api.github.com", "octo-org", "octo-repo", "t")
            .unwrap();
        assert_eq!(client.base_url(), "https://api.github.com");
        assert_eq!(client.repository(), "octo-org/octo-repo");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = client("https://ghe.example.com/api/v3/");
        assert_eq!(client.base_url(), "https://ghe.example.com/api/v3");
        assert_eq!(
            client.repo_url("/actions/runs"),
            "https://ghe.example.com/api/v3/repos/octo-org/octo-repo/actions/runs"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", client("https://api.github.com"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_has_more_pages() {
        assert!(has_more_pages(100, 250, 100));
        assert!(!has_more_pages(250, 250, 50));
        // Full page but nothing left according to total_count
        assert!(!has_more_pages(100, 100, 100));
        // Short page ends paging even if total_count moved in between
        assert!(!has_more_pages(130, 400, 30));
        assert!(!has_more_pages(0, 0, 0));
    }
}
