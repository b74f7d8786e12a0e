//! OAuth 2.0 credentials
//!
//! Loads the credentials file, refreshes the access token against the
//! token endpoint and writes the rotated credentials back. Unknown fields
//! in the file are carried through untouched.

use crate::config::ClientConfig;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Read-only access to search analytics
pub const OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/webmasters.readonly";

/// Redirect URI for installed apps without a local listener
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const EXPIRY_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Contents of the credentials file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthCredentials {
    #[serde(default)]
    pub access_token: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_expiry: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OAuthCredentials {
    /// Current access token, if one was ever issued
    pub fn access_token(&self) -> Result<&str, AuthError> {
        self.access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::NoAccessToken)
    }

    fn apply(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.access_token = Some(response.access_token);
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = refresh_token;
        }
        self.token_expiry = response
            .expires_in
            .map(|secs| (now + Duration::seconds(secs)).format(EXPIRY_FORMAT).to_string());
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Credentials file on disk
#[derive(Debug, Clone)]
pub struct CredentialsFile {
    path: PathBuf,
}

impl CredentialsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<OAuthCredentials, AuthError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| AuthError::Io {
            path: self.path.clone(),
            error: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| AuthError::Parse {
            path: self.path.clone(),
            error: e.to_string(),
        })
    }

    /// Write the credentials through a temporary file and rename it into place
    pub fn save(&self, credentials: &OAuthCredentials) -> Result<(), AuthError> {
        let io_err = |e: std::io::Error| AuthError::Io {
            path: self.path.clone(),
            error: e.to_string(),
        };

        let payload = serde_json::to_string(credentials).map_err(|e| AuthError::Parse {
            path: self.path.clone(),
            error: e.to_string(),
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, payload).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

/// Client for the OAuth token endpoint
pub struct TokenClient {
    client: Client,
    token_uri: String,
}

impl TokenClient {
    pub fn new(config: &ClientConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("searchtap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuthError::Request(e.to_string()))?;
        Ok(Self {
            client,
            token_uri: config.token_uri.clone(),
        })
    }

    /// Exchange the refresh token for a new access token
    pub async fn refresh(&self, credentials: &mut OAuthCredentials) -> Result<(), AuthError> {
        tracing::info!("refreshing credentials");
        let response = self
            .post_form(
                &credentials.token_uri,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", credentials.refresh_token.as_str()),
                    ("client_id", credentials.client_id.as_str()),
                    ("client_secret", credentials.client_secret.as_str()),
                ],
            )
            .await?;
        credentials.apply(response, Utc::now());
        tracing::info!(expiry = ?credentials.token_expiry, "credentials refreshed");
        Ok(())
    }

    /// Exchange an authorization code for a fresh set of credentials
    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<OAuthCredentials, AuthError> {
        let token_uri = self.token_uri.clone();
        let response = self
            .post_form(
                &token_uri,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("client_id", client_id),
                    ("client_secret", client_secret),
                    ("redirect_uri", redirect_uri),
                ],
            )
            .await?;

        let refresh_token = response
            .refresh_token
            .clone()
            .ok_or_else(|| AuthError::Rejected("no refresh token in response".into()))?;

        let mut credentials = OAuthCredentials {
            access_token: None,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            refresh_token,
            token_expiry: None,
            token_uri,
            extra: Map::new(),
        };
        credentials.apply(response, Utc::now());
        Ok(credentials)
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(format!("{}: {}", status.as_u16(), text)));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))
    }
}

/// Consent page URL for the installed-app flow
pub fn authorize_url(client_id: &str, redirect_uri: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&access_type=offline&prompt=consent",
        AUTHORIZE_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(OAUTH_SCOPE),
    )
}

/// Credential errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to access credentials file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Invalid credentials file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Token request failed: {0}")]
    Request(String),

    #[error("Token endpoint rejected the request: {0}")]
    Rejected(String),

    #[error("Credentials hold no access token")]
    NoAccessToken,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> Value {
        json!({
            "access_token": "old-token",
            "client_id": "id.apps.googleusercontent.com",
            "client_secret": "secret",
            "refresh_token": "refresh-1",
            "token_expiry": "2021-01-01T00:00:00Z",
            "token_uri": "https://oauth2.googleapis.com/token",
            "user_agent": null,
            "invalid": false,
            "_class": "OAuth2Credentials"
        })
    }

    #[test]
    fn test_load_and_save_keep_unknown_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.json");
        std::fs::write(&path, sample().to_string()).unwrap();

        let file = CredentialsFile::new(&path);
        let credentials = file.load().unwrap();
        assert_eq!(credentials.refresh_token, "refresh-1");
        assert_eq!(credentials.access_token().unwrap(), "old-token");
        assert_eq!(credentials.extra["_class"], "OAuth2Credentials");

        file.save(&credentials).unwrap();
        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, sample());
        assert!(!temp_dir.path().join("credentials.json.tmp").exists());
    }

    #[test]
    fn test_token_uri_defaults() {
        let credentials: OAuthCredentials = serde_json::from_value(json!({
            "client_id": "id",
            "client_secret": "secret",
            "refresh_token": "refresh"
        }))
        .unwrap();
        assert_eq!(credentials.token_uri, "https://oauth2.googleapis.com/token");
        assert!(matches!(credentials.access_token(), Err(AuthError::NoAccessToken)));
    }

    #[test]
    fn test_apply_rotates_tokens() {
        let mut credentials: OAuthCredentials = serde_json::from_value(sample()).unwrap();
        let now = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();

        credentials.apply(
            TokenResponse {
                access_token: "new-token".into(),
                refresh_token: None,
                expires_in: Some(3600),
            },
            now,
        );
        assert_eq!(credentials.access_token.as_deref(), Some("new-token"));
        assert_eq!(credentials.refresh_token, "refresh-1");
        assert_eq!(credentials.token_expiry.as_deref(), Some("2021-06-01T13:00:00Z"));

        credentials.apply(
            TokenResponse {
                access_token: "newer-token".into(),
                refresh_token: Some("refresh-2".into()),
                expires_in: None,
            },
            now,
        );
        assert_eq!(credentials.refresh_token, "refresh-2");
        assert_eq!(credentials.token_expiry, None);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = CredentialsFile::new(temp_dir.path().join("absent.json"));
        assert!(!file.exists());
        assert!(matches!(file.load(), Err(AuthError::Io { .. })));
    }

    #[test]
    fn test_authorize_url() {
        let url = authorize_url("my id", OOB_REDIRECT_URI);
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=my%20id"));
        assert!(url.contains("redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2.0%3Aoob"));
        assert!(url.contains("webmasters.readonly"));
    }
}
