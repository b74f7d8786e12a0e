//! searchtap
//!
//! Extracts one search-analytics stream and writes SCHEMA, RECORD and
//! STATE messages to stdout, one JSON object per line.

use anyhow::Context;
use clap::Parser;
use searchtap::auth::{CredentialsFile, TokenClient};
use searchtap::client::SearchConsoleClient;
use searchtap::config::{generate_default_config, Config};
use searchtap::logging::init_logging;
use searchtap::schema::catalog;
use searchtap::sink::JsonLinesSink;
use searchtap::state::TapState;
use searchtap::stream::{RunOptions, RunOutcome, StreamDefinition, StreamRunner};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "searchtap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Incremental search-analytics extractor")]
pub struct Cli {
    /// Config file (TOML, or JSON when the extension is .json).
    /// Defaults to the first of the standard config locations that exists.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// State file from a previous run
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Print the catalog for the configured stream and exit
    #[arg(short, long)]
    pub discover: bool,

    /// Print a default config file and exit
    #[arg(long)]
    pub print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_logging(&config.logging)?;

    tracing::info!("searchtap v{}", env!("CARGO_PKG_VERSION"));

    let stream = StreamDefinition::from_names(&config.tap.dimensions)?;
    tracing::info!(stream = stream.id(), "stream selected");

    if cli.discover {
        println!("{}", serde_json::to_string_pretty(&catalog(&stream))?);
        return Ok(());
    }

    let credentials_file = CredentialsFile::new(config.credentials_file()?);
    let mut credentials = credentials_file
        .load()
        .context("failed to load OAuth credentials")?;
    TokenClient::new(&config.client)?
        .refresh(&mut credentials)
        .await
        .context("failed to refresh OAuth credentials")?;
    credentials_file
        .save(&credentials)
        .context("failed to write rotated OAuth credentials")?;

    let client = SearchConsoleClient::new(config.client.clone(), credentials.access_token()?)?;

    let mut state = match &cli.state {
        Some(path) => TapState::load(path)
            .with_context(|| format!("failed to load state from {:?}", path))?,
        None => TapState::new(),
    };

    let mut sink = JsonLinesSink::stdout();
    let mut runner = StreamRunner::new(&client, stream, RunOptions::from_config(&config.tap));
    let summary = runner.run(&mut state, &mut sink).await?;

    match &summary.outcome {
        RunOutcome::Completed => tracing::info!(
            stream = %summary.stream_id,
            records = summary.records_emitted,
            checkpoint = ?summary.checkpoint,
            "sync completed"
        ),
        RunOutcome::Degraded { error } => tracing::warn!(
            stream = %summary.stream_id,
            records = summary.records_emitted,
            checkpoint = ?summary.checkpoint,
            error = %error,
            "sync stopped early, previous checkpoint kept"
        ),
    }

    Ok(())
}
