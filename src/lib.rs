//! # searchtap
//!
//! Incremental extraction of search-analytics data. Rows are pulled per
//! verified site and per day, shaped into flat records and emitted as a
//! line-delimited message stream together with a resumable checkpoint.
//!
//! ## Features
//!
//! - **Incremental**: Per-stream date checkpoint, advanced only after a complete run
//! - **Cheap discovery**: One date probe per site skips days without data
//! - **Pagination**: Pages of 1000 rows until a short page
//! - **Resilient adapter**: Retries with backoff on timeouts, 429 and 5xx
//!
//! ## Modules
//!
//! - [`stream`]: Extraction engine and checkpoint lifecycle
//! - [`client`]: Reporting backend adapter
//! - [`sink`]: Message output
//! - [`state`]: Persisted bookmarks
//! - [`auth`]: OAuth credentials
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use searchtap::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_with_env(std::path::Path::new("config.toml"))?;
//!
//!     // Rotate the access token
//!     let credentials_file = CredentialsFile::new(config.credentials_file()?);
//!     let mut credentials = credentials_file.load()?;
//!     TokenClient::new(&config.client)?.refresh(&mut credentials).await?;
//!     credentials_file.save(&credentials)?;
//!
//!     let client = SearchConsoleClient::new(config.client.clone(), credentials.access_token()?)?;
//!     let stream = StreamDefinition::from_names(&config.tap.dimensions)?;
//!
//!     let mut state = TapState::new();
//!     let mut sink = JsonLinesSink::stdout();
//!     let summary = StreamRunner::new(&client, stream, RunOptions::from_config(&config.tap))
//!         .run(&mut state, &mut sink)
//!         .await?;
//!
//!     eprintln!("emitted {} records", summary.records_emitted);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod logging;
pub mod schema;
pub mod sink;
pub mod state;
pub mod stream;

#[cfg(test)]
mod testing;

// Re-export top-level types for convenience
pub use stream::{
    ConfigurationError, Dimension, ExtractError, ExtractResult, Record, RunOptions, RunOutcome,
    RunPhase, RunSummary, ShapeError, StreamDefinition, StreamRunner,
};

pub use client::{AnalyticsClient, ClientError, QueryRequest, QueryResponse, Row, SearchConsoleClient, SiteEntry};

pub use config::{Config, ConfigError, LoggingConfig, TapConfig};

pub use sink::{JsonLinesSink, Sink, SinkError};

pub use state::{StateError, TapState};

pub use auth::{AuthError, CredentialsFile, OAuthCredentials, TokenClient};

pub use logging::{init_logging, LoggingError};
