//! searchtap-auth
//!
//! Creates or refreshes the OAuth2 credentials file used by `searchtap`.
//! An existing file is refreshed in place; otherwise the installed-app
//! consent flow is run interactively.

use anyhow::Context;
use clap::Parser;
use searchtap::auth::{authorize_url, CredentialsFile, TokenClient, OOB_REDIRECT_URI};
use searchtap::config::{ClientConfig, LoggingConfig};
use searchtap::logging::init_logging;
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "searchtap-auth")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Create or refresh searchtap OAuth2 credentials")]
pub struct Cli {
    /// Credentials file to create or refresh
    #[arg(long, env = "OAUTH2_CREDENTIALS_FILE")]
    pub credentials_file: PathBuf,

    /// OAuth client id, needed only for a new file
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret, needed only for a new file
    #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
    pub client_secret: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LoggingConfig::default())?;

    let file = CredentialsFile::new(&cli.credentials_file);
    let tokens = TokenClient::new(&ClientConfig::default())?;

    let credentials = if file.exists() {
        let mut credentials = file.load()?;
        tokens.refresh(&mut credentials).await?;
        credentials
    } else {
        let client_id = cli.client_id.context("GOOGLE_CLIENT_ID is required for a new credentials file")?;
        let client_secret = cli
            .client_secret
            .context("GOOGLE_CLIENT_SECRET is required for a new credentials file")?;

        eprintln!(
            "Go to the following link in your browser: {}",
            authorize_url(&client_id, OOB_REDIRECT_URI)
        );
        let code = prompt("Enter verification code: ")?;

        tokens
            .exchange_code(&client_id, &client_secret, &code, OOB_REDIRECT_URI)
            .await?
    };

    file.save(&credentials)?;
    tracing::info!(path = ?file.path(), "credentials written");
    Ok(())
}

fn prompt(message: &str) -> anyhow::Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{}", message)?;
    stderr.flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read verification code")?;

    let code = line.trim();
    anyhow::ensure!(!code.is_empty(), "no verification code entered");
    Ok(code.to_string())
}
