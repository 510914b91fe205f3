//! Configuration management for the DDNS agent
//!
//! Holds the `{url, interval}` record that drives the update loop.
//! The record is loaded once at startup and replaced wholesale on save.
//! Supports Windows, macOS, and Linux.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;

use crate::security::Sanitizer;

/// Interval used when the record does not carry one
pub const DEFAULT_INTERVAL_MINUTES: u32 = 5;

/// File name of the persisted record inside the base directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Errors that can occur when saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The interval text is not a positive integer
    #[error("Invalid interval: {0:?}")]
    InvalidInterval(String),

    /// Writing the config file failed
    #[error("Failed to write config: {0}")]
    Io(#[from] io::Error),

    /// The record could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The persisted agent configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// DDNS update URL; empty means unconfigured
    #[serde(default)]
    pub url: String,
    /// Minutes to wait between update attempts, always >= 1
    #[serde(rename = "interval", default = "default_interval")]
    pub interval_minutes: u32,
}

fn default_interval() -> u32 {
    DEFAULT_INTERVAL_MINUTES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::new(),
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
        }
    }
}

impl Config {
    /// Creates a record, trimming the URL
    pub fn new(url: impl AsRef<str>, interval_minutes: u32) -> Self {
        Self {
            url: url.as_ref().trim().to_string(),
            interval_minutes,
        }
    }

    /// Returns true if an update URL is present
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Wait time between two attempts
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_minutes.max(1)) * 60)
    }

    /// Reads a record from disk
    ///
    /// Never fails: a missing, unreadable or corrupt file yields the empty
    /// record so the UI can still open.
    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, starting empty", path.display());
                return Self::default();
            }
            Err(e) => {
                tracing::warn!("Failed to read config {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str::<Config>(&content) {
            Ok(config) => config.normalized(),
            Err(e) => {
                tracing::warn!("Ignoring corrupt config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn normalized(mut self) -> Self {
        if self.interval_minutes == 0 {
            self.interval_minutes = DEFAULT_INTERVAL_MINUTES;
        }
        self
    }

    /// Writes the record as a whole-file replacement
    fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Parses user-entered interval text as a positive number of minutes
pub fn parse_interval(text: &str) -> Result<u32, ConfigError> {
    match text.trim().parse::<u32>() {
        Ok(minutes) if minutes >= 1 => Ok(minutes),
        _ => Err(ConfigError::InvalidInterval(text.to_string())),
    }
}

/// Gets the agent's base directory (cross-platform)
///
/// Holds the config file and, when installed, the executable itself.
pub fn base_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("DDNSAgent"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|p| PathBuf::from(p).join("Library/Application Support/DDNSAgent"))
    }

    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|p| PathBuf::from(p).join(".config")))
            .map(|p| p.join("ddns-agent"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

/// Gets the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    base_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Single source of truth for the agent's [`Config`]
///
/// Writes only happen from the UI thread; the worker reads snapshots.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<Config>,
}

impl ConfigStore {
    /// Opens the store at `path`, loading whatever is there
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = Config::load_from(&path);
        tracing::info!(
            "Loaded config from {} (url: {}, interval: {} min)",
            path.display(),
            Sanitizer::sanitize_url(&current.url),
            current.interval_minutes
        );
        Self {
            path,
            current: RwLock::new(current),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads durable storage and replaces the in-memory record
    pub fn load(&self) -> Config {
        let config = Config::load_from(&self.path);
        self.replace(config.clone());
        config
    }

    /// Snapshot of the current record
    pub fn current(&self) -> Config {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validates and persists a new record
    ///
    /// On any error the stored and in-memory records are left untouched.
    pub fn save(&self, url: &str, interval_text: &str) -> Result<Config, ConfigError> {
        let interval_minutes = parse_interval(interval_text)?;
        let config = Config::new(url, interval_minutes);

        config.write_to(&self.path)?;
        self.replace(config.clone());

        tracing::info!(
            "Saved config (url: {}, interval: {} min)",
            Sanitizer::sanitize_url(&config.url),
            config.interval_minutes
        );
        Ok(config)
    }

    fn replace(&self, config: Config) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::open(dir.path().join(CONFIG_FILE_NAME))
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.url, "");
        assert_eq!(config.interval_minutes, 5);
        assert!(!config.is_configured());
        assert_eq!(config.interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_missing_file_yields_empty_record() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.current(), Config::default());
    }

    #[test]
    fn test_corrupt_file_yields_empty_record() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{ not json").unwrap();

        let store = store_in(&dir);
        assert_eq!(store.current(), Config::default());
    }

    #[test]
    fn test_file_format() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save("http://example.com/update", "7").unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["url"], "http://example.com/update");
        assert_eq!(value["interval"], 7);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"url": "https://ddns.example.net/?token=abc"}"#,
        )
        .unwrap();

        let config = store_in(&dir).current();
        assert_eq!(config.url, "https://ddns.example.net/?token=abc");
        assert_eq!(config.interval_minutes, DEFAULT_INTERVAL_MINUTES);
    }

    #[test]
    fn test_zero_interval_on_disk_is_normalized() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"url": "http://a", "interval": 0}"#,
        )
        .unwrap();

        assert_eq!(store_in(&dir).current().interval_minutes, DEFAULT_INTERVAL_MINUTES);
    }

    #[test]
    fn test_save_then_reload_keeps_interval() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        for n in [1u32, 2, 5, 60, 1440, u32::MAX] {
            let saved = store.save("http://example.com/update", &n.to_string()).unwrap();
            assert_eq!(saved.interval_minutes, n);

            let reloaded = ConfigStore::open(store.path()).current();
            assert_eq!(reloaded.interval_minutes, n);
            assert_eq!(store.load(), reloaded);
        }
    }

    #[test]
    fn test_invalid_interval_leaves_record_untouched() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let before = store.save("http://example.com/update", "10").unwrap();
        let raw_before = fs::read_to_string(store.path()).unwrap();

        for text in ["0", "-3", "abc", "", "  ", "1.5", "99999999999"] {
            let err = store.save("http://other.example.com", text).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidInterval(_)), "{text:?}");
            assert_eq!(store.current(), before);
            assert_eq!(fs::read_to_string(store.path()).unwrap(), raw_before);
        }
    }

    #[test]
    fn test_save_trims_url_and_interval_whitespace() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let saved = store.save("  http://example.com/update \n", " 3 ").unwrap();
        assert_eq!(saved, Config::new("http://example.com/update", 3));
        assert_eq!(store.current(), saved);
    }

    #[test]
    fn test_save_replaces_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"url": "http://old", "interval": 9, "extra": true}"#).unwrap();

        let store = ConfigStore::open(&path);
        store.save("http://new", "4").unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value.get("extra").is_none());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::open(dir.path().join("nested").join(CONFIG_FILE_NAME));

        store.save("", "5").unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("1").unwrap(), 1);
        assert_eq!(parse_interval(" 15 ").unwrap(), 15);
        assert!(parse_interval("0").is_err());
        assert!(parse_interval("-1").is_err());
        assert!(parse_interval("five").is_err());
    }

    #[test]
    fn test_base_dir_exists() {
        // Only checks the lookup doesn't panic on this platform
        let _ = base_dir();
        if let Some(path) = default_config_path() {
            assert!(path.ends_with(CONFIG_FILE_NAME));
        }
    }
}
