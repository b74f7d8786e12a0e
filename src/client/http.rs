//! Search Console REST Client
//!
//! HTTP adapter for the Webmasters v3 search analytics API.

use super::types::{QueryRequest, QueryResponse, SiteEntry, SitesResponse};
use super::{AnalyticsClient, ClientError};
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longest server-requested wait honoured after a 429
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Search Console REST API client
pub struct SearchConsoleClient {
    client: Client,
    config: ClientConfig,
    access_token: String,
}

impl SearchConsoleClient {
    /// Create a client authorized with an OAuth access token
    pub fn new(config: ClientConfig, access_token: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("searchtap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            access_token: access_token.into(),
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn sites_url(&self) -> String {
        format!("{}/webmasters/v3/sites", self.base_url())
    }

    fn query_url(&self, site_url: &str) -> String {
        format!(
            "{}/webmasters/v3/sites/{}/searchAnalytics/query",
            self.base_url(),
            urlencoding::encode(site_url)
        )
    }

    /// Send a request with retry logic and decode the JSON body
    async fn send_json<T, F>(&self, build: F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = ClientError::Unavailable;
        let mut retry_after: Option<Duration> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // Server hint wins; otherwise backoff 1s, 4s, 9s...
                let delay = retry_after
                    .take()
                    .unwrap_or_else(|| Duration::from_secs((attempt as u64).pow(2)));
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %last_error, "retrying backend request");
                tokio::time::sleep(delay).await;
            }

            let response = match build().bearer_auth(&self.access_token).send().await {
                Ok(response) => response,
                Err(e) => {
                    last_error = if e.is_timeout() {
                        ClientError::Timeout
                    } else if e.is_connect() {
                        ClientError::Unavailable
                    } else {
                        ClientError::Request(e)
                    };
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return response.json::<T>().await.map_err(ClientError::Request);
            }

            match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    let text = response.text().await.unwrap_or_default();
                    return Err(ClientError::Auth(text));
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    retry_after = retry_after_hint(response.headers());
                    last_error = ClientError::RateLimited;
                }
                s if s.is_server_error() => {
                    let text = response.text().await.unwrap_or_default();
                    last_error = ClientError::Api {
                        status: s.as_u16(),
                        message: text,
                    };
                }
                s => {
                    let text = response.text().await.unwrap_or_default();
                    return Err(ClientError::Api {
                        status: s.as_u16(),
                        message: text,
                    });
                }
            }
        }

        Err(last_error)
    }
}

/// Delay requested by a `Retry-After: <seconds>` header, capped
fn retry_after_hint(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}

#[async_trait]
impl AnalyticsClient for SearchConsoleClient {
    async fn list_sites(&self) -> Result<Vec<SiteEntry>, ClientError> {
        let url = self.sites_url();
        let sites: SitesResponse = self.send_json(|| self.client.get(&url)).await?;
        Ok(sites.site_entry)
    }

    async fn query(
        &self,
        site_url: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse, ClientError> {
        let url = self.query_url(site_url);
        self.send_json(|| self.client.post(&url).json(request)).await
    }
}
