//! Reporting Backend Adapter
//!
//! The stream core talks to the search analytics backend only through
//! the [`AnalyticsClient`] trait. Each call is awaited before the next
//! one is issued; timeouts and retries live inside the adapter.
//!
//! - [`SearchConsoleClient`]: REST adapter for the Webmasters v3 API

mod http;
mod types;

pub use http::SearchConsoleClient;
pub use types::{QueryRequest, QueryResponse, Row, SiteEntry, UNVERIFIED_PERMISSION};

use async_trait::async_trait;
use thiserror::Error;

/// Interface to the reporting backend
#[async_trait]
pub trait AnalyticsClient: Send + Sync {
    /// List every site visible to the account
    async fn list_sites(&self) -> Result<Vec<SiteEntry>, ClientError>;

    /// Execute one search analytics query against a site
    async fn query(
        &self,
        site_url: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse, ClientError>;
}

/// Errors that can occur when talking to the reporting backend
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Backend unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited")]
    RateLimited,
}
