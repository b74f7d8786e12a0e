//! Stream Runner
//!
//! Drives one stream through site resolution, window discovery,
//! pagination and record shaping, and owns the checkpoint lifecycle.
//!
//! ```text
//! Init → ResolvingEntities → LoadingCheckpoint → Extracting → Finalizing → Done
//!                                                     │            ▲
//!                                                     └──(error)───┘
//! ```
//!
//! The checkpoint is all-or-nothing per run: it moves to the end of the
//! latest drained window only when every window of every site was
//! drained. An error while extracting restores the checkpoint loaded at
//! the start of the run, which is then persisted unchanged.

use super::dimension::StreamDefinition;
use super::error::{ConfigurationError, ExtractResult};
use super::paginate::Paginator;
use super::record::shape_record;
use super::sites::resolve_sites;
use super::windows::{default_start_date, discover_days, Window};
use crate::client::AnalyticsClient;
use crate::config::TapConfig;
use crate::schema::record_schema;
use crate::sink::Sink;
use crate::state::TapState;
use chrono::{NaiveDate, Utc};
use std::fmt;

/// State property holding the checkpoint date
pub const BOOKMARK_PROPERTY: &str = "timestamp";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    ResolvingEntities,
    LoadingCheckpoint,
    Extracting,
    Finalizing,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Init => "init",
            RunPhase::ResolvingEntities => "resolving_entities",
            RunPhase::LoadingCheckpoint => "loading_checkpoint",
            RunPhase::Extracting => "extracting",
            RunPhase::Finalizing => "finalizing",
            RunPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Per-run inputs besides the stream itself
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Allow-list of sites; `None` extracts every verified site
    pub site_urls: Option<Vec<String>>,
    /// First day to extract when the state holds no checkpoint
    pub start_date: Option<NaiveDate>,
    /// Last day the backend is asked about
    pub today: NaiveDate,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            site_urls: None,
            start_date: None,
            today: Utc::now().date_naive(),
        }
    }
}

impl RunOptions {
    pub fn from_config(config: &TapConfig) -> Self {
        Self {
            site_urls: config.site_urls.clone(),
            start_date: config.start_date,
            ..Self::default()
        }
    }

    /// Builder method: pin "today"
    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every window was drained and the checkpoint may have advanced
    Completed,
    /// Extraction stopped early; the previous checkpoint was kept
    Degraded { error: String },
}

/// Result of a stream run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub stream_id: String,
    pub sites: usize,
    pub sites_completed: usize,
    pub windows_drained: u64,
    pub records_emitted: u64,
    pub previous_checkpoint: Option<String>,
    pub checkpoint: Option<String>,
    pub outcome: RunOutcome,
}

impl RunSummary {
    pub fn is_degraded(&self) -> bool {
        matches!(self.outcome, RunOutcome::Degraded { .. })
    }
}

#[derive(Debug, Default)]
struct Progress {
    sites_completed: usize,
    windows_drained: u64,
    records_emitted: u64,
    candidate: Option<NaiveDate>,
}

impl Progress {
    fn window_drained(&mut self, window: Window) {
        self.windows_drained += 1;
        self.candidate = Some(match self.candidate {
            Some(current) => current.max(window.end),
            None => window.end,
        });
    }
}

/// Runs one stream against a backend
pub struct StreamRunner<'a> {
    client: &'a dyn AnalyticsClient,
    stream: StreamDefinition,
    options: RunOptions,
    phase: RunPhase,
}

impl<'a> StreamRunner<'a> {
    pub fn new(client: &'a dyn AnalyticsClient, stream: StreamDefinition, options: RunOptions) -> Self {
        Self {
            client,
            stream,
            options,
            phase: RunPhase::Init,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn stream(&self) -> &StreamDefinition {
        &self.stream
    }

    /// Run the stream, emitting records and the final state to `sink`.
    ///
    /// Configuration errors, failures while listing sites, and sink
    /// failures outside extraction are returned. Errors raised while
    /// extracting are logged and reported through
    /// [`RunOutcome::Degraded`] after the previous checkpoint has been
    /// persisted.
    pub async fn run(
        &mut self,
        state: &mut TapState,
        sink: &mut dyn Sink,
    ) -> ExtractResult<RunSummary> {
        let stream_id = self.stream.id().to_string();

        self.phase = RunPhase::ResolvingEntities;
        let entries = self.client.list_sites().await?;
        let sites = resolve_sites(&entries, self.options.site_urls.as_deref())?;
        tracing::info!(stream = %stream_id, sites = sites.len(), "resolved sites");

        self.phase = RunPhase::LoadingCheckpoint;
        let backup = state
            .get_bookmark(&stream_id, BOOKMARK_PROPERTY)
            .map(str::to_owned);
        let start_date = match &backup {
            Some(value) => {
                tracing::info!(stream = %stream_id, checkpoint = %value, "previous state");
                parse_checkpoint(&stream_id, value)?
            }
            None => self
                .options
                .start_date
                .unwrap_or_else(|| default_start_date(self.options.today)),
        };

        sink.write_schema(
            &stream_id,
            &record_schema(),
            &self.stream.key_properties(),
            &[BOOKMARK_PROPERTY.to_string()],
        )?;

        self.phase = RunPhase::Extracting;
        let mut progress = Progress::default();
        let outcome = match self.extract(&sites, start_date, sink, &mut progress).await {
            Ok(()) => RunOutcome::Completed,
            Err(e) => {
                tracing::error!(stream = %stream_id, error = %e, "stream encountered an error");
                tracing::info!(stream = %stream_id, "emitting last successful checkpoint");
                RunOutcome::Degraded {
                    error: e.to_string(),
                }
            }
        };

        self.phase = RunPhase::Finalizing;
        let checkpoint = match outcome {
            RunOutcome::Completed => advance(backup.as_deref(), progress.candidate),
            RunOutcome::Degraded { .. } => backup.clone(),
        };
        if let Some(value) = &checkpoint {
            state.set_bookmark(&stream_id, BOOKMARK_PROPERTY, value);
        }

        tracing::info!(stream = %stream_id, state = %state.as_value(), "emitting state");
        sink.write_state(state)?;
        sink.flush()?;

        self.phase = RunPhase::Done;
        tracing::info!(
            stream = %stream_id,
            records = progress.records_emitted,
            windows = progress.windows_drained,
            "done"
        );

        Ok(RunSummary {
            stream_id,
            sites: sites.len(),
            sites_completed: progress.sites_completed,
            windows_drained: progress.windows_drained,
            records_emitted: progress.records_emitted,
            previous_checkpoint: backup,
            checkpoint,
            outcome,
        })
    }

    async fn extract(
        &self,
        sites: &[String],
        start_date: NaiveDate,
        sink: &mut dyn Sink,
        progress: &mut Progress,
    ) -> ExtractResult<()> {
        let stream_id = self.stream.id();
        let dimensions = self.stream.dimensions();

        for site_url in sites {
            let days = discover_days(self.client, site_url, start_date, self.options.today).await?;
            tracing::info!(
                stream = %stream_id,
                site_url = %site_url,
                %start_date,
                days = days.len(),
                "extracting days with data"
            );

            for day in days {
                let window = Window::day(day);
                let mut pager = Paginator::new(self.client, site_url, window, dimensions);

                while let Some(rows) = pager.next_page().await? {
                    for row in rows {
                        let record = shape_record(row, dimensions, window.start, site_url)?;
                        sink.write_record(stream_id, &record, Utc::now())?;
                        progress.records_emitted += 1;
                    }
                }

                tracing::debug!(
                    stream = %stream_id,
                    site_url = %site_url,
                    day = %window.start,
                    pages = pager.pages_fetched(),
                    "window drained"
                );
                progress.window_drained(window);
            }

            progress.sites_completed += 1;
        }

        Ok(())
    }
}

/// Parse a persisted checkpoint, accepting only canonical `YYYY-MM-DD`
fn parse_checkpoint(stream_id: &str, value: &str) -> Result<NaiveDate, ConfigurationError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .filter(|date| date.format(DATE_FORMAT).to_string() == value)
        .ok_or_else(|| ConfigurationError::InvalidCheckpoint {
            stream_id: stream_id.to_string(),
            value: value.to_string(),
        })
}

/// New checkpoint after a completed run; never moves backwards
fn advance(previous: Option<&str>, candidate: Option<NaiveDate>) -> Option<String> {
    let candidate = candidate.map(|date| date.format(DATE_FORMAT).to_string());
    match (previous, candidate) {
        (Some(prev), Some(next)) if next.as_str() > prev => Some(next),
        (Some(prev), _) => Some(prev.to_string()),
        (None, next) => next,
    }
}
