//! Application settings storage
//!
//! Stores configuration like the Google API key in a JSON file in the app data directory.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Global settings instance
static SETTINGS: RwLock<Option<Settings>> = RwLock::new(None);

/// App data directory (set during init)
static DATA_DIR: RwLock<Option<PathBuf>> = RwLock::new(None);

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
const SETTINGS_FILE: &str = "settings.json";
const INDEX_FILE: &str = "pdfchat-index.bin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub google_api_key: Option<String>,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Chunks retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_chat_model() -> String {
    "gemini-pro".to_string()
}

fn default_embedding_model() -> String {
    "models/embedding-001".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_chunk_size() -> usize {
    10_000
}

fn default_chunk_overlap() -> usize {
    1_000
}

fn default_top_k() -> usize {
    4
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            google_api_key: None,
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
        }
    }
}

impl Settings {
    /// Load settings from disk or create default
    fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("[Settings] Ignoring unreadable {:?}: {}", path, e);
                Settings::default()
            }),
            Err(_) => Settings::default(),
        }
    }

    /// Save settings to disk
    fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Apply a `key = value` pair as given on the command line
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "google-api-key" => {
                self.google_api_key = if value.is_empty() { None } else { Some(value.to_string()) };
            }
            "chat-model" => self.chat_model = value.to_string(),
            "embedding-model" => self.embedding_model = value.to_string(),
            "temperature" => self.temperature = parse_value(key, value)?,
            "chunk-size" => self.chunk_size = parse_value(key, value)?,
            "chunk-overlap" => self.chunk_overlap = parse_value(key, value)?,
            "top-k" => self.top_k = parse_value(key, value)?,
            _ => return Err(Error::config(format!("Unknown config key: {}", key))),
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk-size must be greater than 0"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(format!(
                "chunk-overlap ({}) must be smaller than chunk-size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(Error::config("top-k must be greater than 0"));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::config(format!("Invalid value for {}: {}", key, value)))
}

/// Initialize settings with the app data directory
pub fn init(app_data_dir: PathBuf) {
    let settings = Settings::load(&app_data_dir.join(SETTINGS_FILE));

    if let Ok(mut dir) = DATA_DIR.write() {
        *dir = Some(app_data_dir);
    }
    if let Ok(mut guard) = SETTINGS.write() {
        *guard = Some(settings);
    }
}

/// Default data directory for the CLI
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("com.pdfchat.app"))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn data_dir() -> PathBuf {
    DATA_DIR
        .read()
        .ok()
        .and_then(|d| d.clone())
        .unwrap_or_else(default_data_dir)
}

/// Where the vector index is persisted between runs
pub fn index_path() -> PathBuf {
    data_dir().join(INDEX_FILE)
}

/// Snapshot of the current settings
pub fn get() -> Settings {
    SETTINGS
        .read()
        .ok()
        .and_then(|s| s.clone())
        .unwrap_or_default()
}

/// Mutate and persist the settings
pub fn update<F>(f: F) -> Result<()>
where
    F: FnOnce(&mut Settings) -> Result<()>,
{
    let mut guard = SETTINGS
        .write()
        .map_err(|_| Error::Lock("Failed to acquire settings lock".to_string()))?;

    let mut next = guard.clone().unwrap_or_default();
    f(&mut next)?;
    next.save(&data_dir().join(SETTINGS_FILE))?;
    *guard = Some(next);
    Ok(())
}

/// Get the current API key (checks env var first, then stored setting)
pub fn get_api_key() -> Option<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.is_empty() {
            return Some(key);
        }
    }

    get().google_api_key.filter(|k| !k.is_empty())
}

pub fn has_api_key() -> bool {
    get_api_key().is_some()
}

/// "env", "settings", or "none"
pub fn api_key_source() -> &'static str {
    if std::env::var(API_KEY_ENV).map(|k| !k.is_empty()).unwrap_or(false) {
        "env"
    } else if get().google_api_key.map(|k| !k.is_empty()).unwrap_or(false) {
        "settings"
    } else {
        "none"
    }
}

/// Set and save the API key. An empty key clears it.
pub fn set_api_key(key: String) -> Result<()> {
    update(|s| s.set_value("google-api-key", &key))?;
    tracing::info!("[Settings] API key {}", if key.is_empty() { "cleared" } else { "saved" });
    Ok(())
}

pub fn get_masked_api_key() -> Option<String> {
    get_api_key().map(|key| mask_key(&key))
}

/// Shows first 8 and last 4 chars of long keys, stars otherwise
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "*".repeat(chars.len())
    }
}
