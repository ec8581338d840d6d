//! Shell configuration
//!
//! Everything has a compiled-in default. On the web a developer can override
//! fields through a JSON blob in LocalStorage; native builds use the defaults.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts;

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    pub fn level(&self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }

    pub fn filter(&self) -> log::LevelFilter {
        self.level().to_level_filter()
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!("unknown log level '{}'", s)),
        }
    }
}

/// Host shell configuration
///
/// The persistence record name is not configurable; it is always
/// [`consts::RECORD_NAME`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// IndexedDB database name (directory name on native)
    pub database: String,
    /// IndexedDB object store holding the record
    pub object_store: String,
    /// Logger verbosity
    pub log_level: LogLevel,
    /// Emulated display refresh rate for the native loop (Hz)
    pub frame_rate: u32,
    /// Storage root for the native file backend
    pub data_dir: Option<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            database: consts::DATABASE_NAME.to_string(),
            object_store: consts::OBJECT_STORE_NAME.to_string(),
            log_level: LogLevel::Info,
            frame_rate: consts::DEFAULT_FRAME_RATE,
            data_dir: None,
        }
    }
}

impl ShellConfig {
    /// Parse overrides; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(json)?;
        if config.frame_rate == 0 {
            log::warn!("frame_rate 0 is invalid, using {}", consts::DEFAULT_FRAME_RATE);
            config.frame_rate = consts::DEFAULT_FRAME_RATE;
        }
        Ok(config)
    }

    /// Time between emulated frames on native, in milliseconds
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.frame_rate.max(1) as f64
    }

    /// LocalStorage key for developer overrides
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "frame_shell_config";

    /// Load overrides from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded shell config overrides from LocalStorage");
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring malformed shell config: {}", e),
                }
            }
        }

        log::info!("Using default shell config");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.database, consts::DATABASE_NAME);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ShellConfig::from_json(r#"{"log_level":"Debug"}"#).unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.database, consts::DATABASE_NAME);
        assert_eq!(config.frame_rate, consts::DEFAULT_FRAME_RATE);
    }

    #[test]
    fn test_record_name_cannot_be_overridden() {
        let config = ShellConfig::from_json(r#"{"record":"other","frame_rate":30}"#).unwrap();
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config, ShellConfig { frame_rate: 30, ..ShellConfig::default() });
    }

    #[test]
    fn test_zero_frame_rate_rejected() {
        let config = ShellConfig::from_json(r#"{"frame_rate":0}"#).unwrap();
        assert_eq!(config.frame_rate, consts::DEFAULT_FRAME_RATE);
        assert!((config.frame_interval_ms() - 1000.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(ShellConfig::from_json("{not json").is_err());
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("trace"), Ok(LogLevel::Trace));
        assert!("loud".parse::<LogLevel>().is_err());
        for level in [LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Debug, LogLevel::Trace] {
            assert_eq!(level.as_str().parse::<LogLevel>(), Ok(level));
        }
        assert_eq!(LogLevel::Debug.filter(), log::LevelFilter::Debug);
        assert_eq!(LogLevel::Error.as_str(), "Error");
    }
}
