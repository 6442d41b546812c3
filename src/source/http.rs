//! Shared outbound HTTP client
//!
//! Every GET goes through the response cache first, then the retry executor,
//! then reqwest. Source-host calls carry the GitHub media type and, when
//! configured, a bearer token.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{DEFAULT_CACHE_TTL_MS, USER_AGENT};
use crate::source::cache::ResponseCache;
use crate::source::error::SourceError;
use crate::source::retry::{RetryPolicy, with_retry};

/// Which credentials and headers a request needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Plain request
    Anonymous,
    /// Source-host API call (GitHub media type, optional bearer token)
    SourceHost,
}

pub struct HttpClient {
    client: reqwest::Client,
    github_token: Option<String>,
    retry: RetryPolicy,
    cache: ResponseCache<String>,
    cache_ttl: Duration,
    request_count: AtomicUsize,
}

impl HttpClient {
    pub fn new(github_token: Option<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            github_token,
            retry: RetryPolicy::default(),
            cache: ResponseCache::new(),
            cache_ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            request_count: AtomicUsize::new(0),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Number of requests actually sent (cache hits excluded, retries included)
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn cache(&self) -> &ResponseCache<String> {
        &self.cache
    }

    /// Fetches a response body as text
    pub async fn get_text(&self, url: &str, auth: Auth) -> Result<String, SourceError> {
        let key = format!("GET {auth:?} {url}");
        self.cache
            .get_or_fetch(
                &key,
                || with_retry(&self.retry, || self.send(url, auth)),
                self.cache_ttl,
            )
            .await
    }

    /// Fetches and deserializes a JSON response body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        auth: Auth,
    ) -> Result<T, SourceError> {
        let body = self.get_text(url, auth).await?;
        serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse response from {}: {}", url, e);
            SourceError::InvalidResponse(format!("{url}: {e}"))
        })
    }

    async fn send(&self, url: &str, auth: Auth) -> Result<String, SourceError> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        debug!("GET {}", url);

        let mut request = self.client.get(url);
        if auth == Auth::SourceHost {
            request = request.header("Accept", "application/vnd.github+json");
            if let Some(token) = &self.github_token {
                request = request.bearer_auth(token);
            }
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(SourceError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            warn!("{} returned status {}", url, status);
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
