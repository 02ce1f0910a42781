use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::redemption::window::SubmissionWindow;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
    /// Externally reachable base URL of this server, used to build
    /// retrievable URLs for files kept in the filesystem store.
    pub public_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}

impl DatabaseConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    S3,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory of the filesystem backend.
    pub data_dir: PathBuf,
    #[cfg(feature = "s3")]
    pub s3: Option<common::storage::s3::S3Settings>,
}

/// Fee schedule and form rules for registrations.
#[derive(Debug, Deserialize, Clone)]
pub struct RegistrationConfig {
    #[serde(default = "default_standard_fee")]
    pub standard_fee: i64,
    /// Fee charged when the prior-discount flag is set.
    #[serde(default = "default_discounted_fee")]
    pub discounted_fee: i64,
    /// Role value for which the college field is optional.
    #[serde(default = "default_college_exempt_role")]
    pub college_exempt_role: String,
    /// Quiet period before a draft snapshot is persisted.
    #[serde(default = "default_draft_quiet_period_ms")]
    pub draft_quiet_period_ms: u64,
}

fn default_standard_fee() -> i64 {
    150_000
}
fn default_discounted_fee() -> i64 {
    100_000
}
fn default_college_exempt_role() -> String {
    "Professional".into()
}
fn default_draft_quiet_period_ms() -> u64 {
    1500
}

impl RegistrationConfig {
    pub fn draft_quiet_period(&self) -> Duration {
        Duration::from_millis(self.draft_quiet_period_ms)
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            standard_fee: default_standard_fee(),
            discounted_fee: default_discounted_fee(),
            college_exempt_role: default_college_exempt_role(),
            draft_quiet_period_ms: default_draft_quiet_period_ms(),
        }
    }
}

/// Upload ceilings for submissions and payment proofs.
#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
    #[serde(default = "default_max_image_bytes")]
    pub max_proof_bytes: u64,
    #[serde(default = "default_max_caption_chars")]
    pub max_caption_chars: usize,
}

fn default_max_image_bytes() -> u64 {
    10 * 1024 * 1024
}
fn default_max_document_bytes() -> u64 {
    5 * 1024 * 1024
}
fn default_max_caption_chars() -> usize {
    250
}

/// Headroom over the file ceilings for text fields and multipart framing.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

impl LimitsConfig {
    /// Request body ceiling for a registration submit: two proofs.
    pub fn registration_body_bytes(&self) -> usize {
        body_bytes(self.max_proof_bytes.saturating_mul(2))
    }

    /// Request body ceiling for a code redemption: two images or one document.
    pub fn submission_body_bytes(&self) -> usize {
        body_bytes(
            self.max_image_bytes
                .saturating_mul(2)
                .max(self.max_document_bytes),
        )
    }
}

fn body_bytes(files: u64) -> usize {
    usize::try_from(files.saturating_add(MULTIPART_OVERHEAD_BYTES)).unwrap_or(usize::MAX)
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
            max_document_bytes: default_max_document_bytes(),
            max_proof_bytes: default_max_image_bytes(),
            max_caption_chars: default_max_caption_chars(),
        }
    }
}

/// Messaging sink (Telegram Bot API).
#[derive(Debug, Deserialize, Clone)]
pub struct NotifierConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".into()
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base: default_telegram_api_base(),
            bot_token: String::new(),
            chat_id: String::new(),
        }
    }
}

/// Spreadsheet sink (Google Sheets, service-account auth).
#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Path to the service-account JSON key.
    pub credentials_path: Option<PathBuf>,
    #[serde(default)]
    pub photo_sheet_id: String,
    #[serde(default)]
    pub essay_sheet_id: String,
    /// A1 range rows are appended after.
    #[serde(default = "default_sheet_range")]
    pub range: String,
    #[serde(default = "default_sheets_api_base")]
    pub api_base: String,
    /// Overrides the token endpoint from the credentials file.
    pub token_uri: Option<String>,
}

fn default_sheet_range() -> String {
    "Sheet1!A1".into()
}
fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com".into()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            credentials_path: None,
            photo_sheet_id: String::new(),
            essay_sheet_id: String::new(),
            range: default_sheet_range(),
            api_base: default_sheets_api_base(),
            token_uri: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EventsConfig {
    /// Bearer secret required on the change-event intake and operator routes.
    #[serde(default)]
    pub webhook_secret: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CodesConfig {
    /// CSV of `code,category` rows issued at startup.
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub window: SubmissionWindow,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub codes: CodesConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.public_url", "http://127.0.0.1:3000")?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.data_dir", "./data/objects")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., EVENTREG__DATABASE__URL)
            .add_source(
                Environment::with_prefix("EVENTREG")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Base URL under which the filesystem store's objects are served.
    pub fn files_base_url(&self) -> String {
        format!(
            "{}/api/v1/files",
            self.server.public_url.trim_end_matches('/')
        )
    }
}
