use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 4310;
const DEFAULT_SESSION_TTL_HOURS: u32 = 48;
const DEFAULT_EXTERNAL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_UPLOAD_MAX_BYTES: u64 = 5 * 1024 * 1024;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── QuestsConfig ─────────────────────────────────────────────────────────────

/// Daily quest source configuration (`[quests]` in config.toml).
///
/// `source = "catalog"` picks from the built-in template catalog.
/// `source = "generated"` asks the generative service at `generator_url` for
/// the day's three quests, falling back to the catalog on any failure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuestsConfig {
    /// Quest source: "catalog" (default) | "generated".
    pub source: String,
    /// Generative quest service endpoint. Required when `source = "generated"`.
    pub generator_url: Option<String>,
    /// Request timeout for the generative service in seconds (default: 10).
    pub timeout_secs: u64,
}

impl Default for QuestsConfig {
    fn default() -> Self {
        Self {
            source: "catalog".to_string(),
            generator_url: None,
            timeout_secs: DEFAULT_EXTERNAL_TIMEOUT_SECS,
        }
    }
}

// ─── SentimentConfig ──────────────────────────────────────────────────────────

/// Sentiment-scoring service configuration (`[sentiment]` in config.toml).
///
/// When `url` is unset, reflections are stored with a neutral score of 0.0.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Scoring endpoint; POST {"text": ...} returns {"score": -1.0..1.0}.
    pub url: Option<String>,
    /// Request timeout in seconds (default: 10).
    pub timeout_secs: u64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: DEFAULT_EXTERNAL_TIMEOUT_SECS,
        }
    }
}

// ─── UploadsConfig ────────────────────────────────────────────────────────────

/// Profile photo upload limits (`[uploads]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadsConfig {
    /// Maximum accepted photo size in bytes (default: 5 MiB).
    pub max_bytes: u64,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
        }
    }
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// HTTP server port (default: 4310).
    port: Option<u16>,
    /// Log level filter string, e.g. "debug", "info,questd=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json" (structured).
    log_format: Option<String>,
    /// Bind address (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Hours before an auth session token expires (default: 48; 0 = never).
    session_ttl_hours: Option<u32>,
    /// Daily quest source configuration (`[quests]`).
    quests: Option<QuestsConfig>,
    /// Sentiment service configuration (`[sentiment]`).
    sentiment: Option<SentimentConfig>,
    /// Photo upload limits (`[uploads]`).
    uploads: Option<UploadsConfig>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── QuestdConfig ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct QuestdConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub log: String,
    /// Log output format: "pretty" (default) | "json".
    pub log_format: String,
    /// Bind address for the HTTP server (QUESTD_BIND env var, default: "127.0.0.1").
    pub bind_address: String,
    /// Hours before an auth session token expires (0 = never).
    pub session_ttl_hours: u32,
    /// Daily quest source: catalog or generated-with-fallback.
    pub quests: QuestsConfig,
    /// Sentiment service endpoint + timeout.
    pub sentiment: SentimentConfig,
    /// Photo upload limits.
    pub uploads: UploadsConfig,
}

impl QuestdConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let log_format = std::env::var("QUESTD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let bind_address = bind_address
            .or(std::env::var("QUESTD_BIND").ok().filter(|s| !s.is_empty()))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let session_ttl_hours = toml
            .session_ttl_hours
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS);

        let mut quests = toml.quests.unwrap_or_default();
        if let Some(url) = std::env::var("QUESTD_GENERATOR_URL")
            .ok()
            .filter(|s| !s.is_empty())
        {
            quests.generator_url = Some(url);
        }

        let mut sentiment = toml.sentiment.unwrap_or_default();
        if let Some(url) = std::env::var("QUESTD_SENTIMENT_URL")
            .ok()
            .filter(|s| !s.is_empty())
        {
            sentiment.url = Some(url);
        }

        let uploads = toml.uploads.unwrap_or_default();

        Self {
            port,
            data_dir,
            log,
            log_format,
            bind_address,
            session_ttl_hours,
            quests,
            sentiment,
            uploads,
        }
    }

    /// Directory where uploaded profile photos are stored.
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/questd
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("questd");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/questd or ~/.local/share/questd
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("questd");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("questd");
        }
    }
    #[cfg(target_os = "windows")]
    {
        // %APPDATA%\questd
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("questd");
        }
    }
    // Fallback
    PathBuf::from(".questd")
}
