use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use crate::config::IngestConfig;

use super::{IngestError, SheetSink};

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Assertion lifetime; Google caps it at one hour.
const ASSERTION_TTL_SECS: i64 = 3600;
/// Refresh cached tokens this long before they expire.
const TOKEN_SLACK_SECS: i64 = 60;

/// The fields of a service-account key file this sink needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".into()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, IngestError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| IngestError::Credentials(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| IngestError::Credentials(format!("{}: {e}", path.display())))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_TTL_SECS
}

struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Google Sheets `values.append` sink authenticated with a service account.
pub struct GoogleSheetsSink {
    client: reqwest::Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    api_base: String,
    range: String,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleSheetsSink {
    pub fn new(
        mut key: ServiceAccountKey,
        api_base: &str,
        range: &str,
        token_uri: Option<&str>,
    ) -> Result<Self, IngestError> {
        if let Some(uri) = token_uri {
            key.token_uri = uri.to_string();
        }
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            key,
            encoding_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            range: range.to_string(),
            token: Mutex::new(None),
        })
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self, IngestError> {
        let path = config
            .credentials_path
            .as_deref()
            .ok_or_else(|| IngestError::Credentials("ingest.credentials_path is not set".into()))?;
        let key = ServiceAccountKey::from_file(path)?;
        Self::new(
            key,
            &config.api_base,
            &config.range,
            config.token_uri.as_deref(),
        )
    }

    fn assertion(&self, now: i64) -> Result<String, IngestError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Return a cached access token, exchanging a fresh assertion when needed.
    async fn access_token(&self) -> Result<String, IngestError> {
        let mut cached = self.token.lock().await;
        let now = Utc::now().timestamp();
        if let Some(token) = cached.as_ref()
            && token.expires_at - TOKEN_SLACK_SECS > now
        {
            return Ok(token.value.clone());
        }

        let assertion = self.assertion(now)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Token {
                status: status.as_u16(),
                body,
            });
        }
        let token: TokenResponse = response.json().await?;
        tracing::debug!(expires_in = token.expires_in, "Obtained spreadsheet access token");

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: now + token.expires_in,
        });
        Ok(value)
    }
}

#[async_trait]
impl SheetSink for GoogleSheetsSink {
    async fn append_row(&self, sheet_id: &str, values: Vec<String>) -> Result<(), IngestError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v4/spreadsheets/{sheet_id}/values/{}:append",
            self.api_base, self.range
        );
        let response = self
            .client
            .post(url)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(token)
            .json(&json!({ "values": [values] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Append {
                status: status.as_u16(),
                body,
            });
        }
        tracing::debug!(sheet_id, "Appended spreadsheet row");
        Ok(())
    }
}
