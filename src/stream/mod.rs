//! Search Analytics Stream
//!
//! Incremental extraction of one search-analytics stream:
//!
//! - **dimension**: Dimensions and stream definitions
//! - **sites**: Verified-site resolution and allow-list checks
//! - **windows**: Day windows and the date probe
//! - **paginate**: Row pagination within a window
//! - **record**: Row to record shaping
//! - **runner**: Orchestration and checkpoint lifecycle
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! list_sites → resolve → checkpoint → for each site:
//!     probe(date) → for each day: page → shape → sink
//! → checkpoint (advanced or restored) → state
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use searchtap::client::SearchConsoleClient;
//! use searchtap::config::ClientConfig;
//! use searchtap::sink::JsonLinesSink;
//! use searchtap::state::TapState;
//! use searchtap::stream::{RunOptions, StreamDefinition, StreamRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SearchConsoleClient::new(ClientConfig::default(), "access-token")?;
//!     let stream = StreamDefinition::from_names(&["page", "query"])?;
//!
//!     let mut state = TapState::new();
//!     let mut sink = JsonLinesSink::stdout();
//!     let summary = StreamRunner::new(&client, stream, RunOptions::default())
//!         .run(&mut state, &mut sink)
//!         .await?;
//!
//!     println!("{} records, checkpoint {:?}", summary.records_emitted, summary.checkpoint);
//!     Ok(())
//! }
//! ```

pub mod dimension;
pub mod error;
pub mod paginate;
pub mod record;
pub mod runner;
pub mod sites;
pub mod windows;

pub use dimension::{Dimension, StreamDefinition};
pub use error::{ConfigurationError, ExtractError, ExtractResult, ShapeError};
pub use paginate::{Paginator, ROW_LIMIT};
pub use record::{shape_record, Record, SITE_URL_FIELD, TIMESTAMP_FIELD};
pub use runner::{
    RunOptions, RunOutcome, RunPhase, RunSummary, StreamRunner, BOOKMARK_PROPERTY,
};
pub use sites::{resolve_sites, verified_site_urls};
pub use windows::{default_start_date, discover_days, Window, DEFAULT_LOOKBACK_WEEKS};
