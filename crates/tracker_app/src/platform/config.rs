use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracker_engine::{ClientSettings, EngineSettings};

use super::logging::LogDestination;

pub(crate) const CONFIG_FILENAME: &str = "tracker.ron";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

/// Settings read from `tracker.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub server_url: String,
    pub download_dir: PathBuf,
    pub poll_interval_ms: u64,
    pub status_line_grace_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: Option<u64>,
    pub log_destination: LogDestination,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000/".to_string(),
            download_dir: PathBuf::from("./downloads"),
            poll_interval_ms: 2000,
            status_line_grace_ms: 5000,
            connect_timeout_ms: 10_000,
            request_timeout_ms: None,
            log_destination: LogDestination::File,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            client: ClientSettings {
                base_url: self.server_url.clone(),
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                request_timeout: self.request_timeout_ms.map(Duration::from_millis),
                ..ClientSettings::default()
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            download_dir: self.download_dir.clone(),
        }
    }

    pub fn status_line_grace(&self) -> Duration {
        Duration::from_millis(self.status_line_grace_ms)
    }

    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(self.log_level.trim()).unwrap_or(LevelFilter::Info)
    }

    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())
    }
}

/// Resolves the config path from the first CLI argument, if any.
pub(crate) fn config_path(mut args: impl Iterator<Item = String>) -> PathBuf {
    args.nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

/// Reads the config file. A missing file yields the defaults.
pub(crate) fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("tracker.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracker.ron");
        fs::write(
            &path,
            r#"(server_url: "http://music.lan:9000/", request_timeout_ms: Some(30000), log_destination: Both)"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server_url, "http://music.lan:9000/");
        assert_eq!(config.request_timeout_ms, Some(30_000));
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.status_line_grace_ms, 5000);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracker.ron");
        fs::write(&path, "(server_url: 42").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn maps_onto_engine_settings() {
        let config = AppConfig {
            poll_interval_ms: 250,
            connect_timeout_ms: 1500,
            request_timeout_ms: Some(8000),
            download_dir: PathBuf::from("/srv/music"),
            ..AppConfig::default()
        };
        let settings = config.engine_settings();
        assert_eq!(settings.poll_interval, Duration::from_millis(250));
        assert_eq!(settings.client.connect_timeout, Duration::from_millis(1500));
        assert_eq!(settings.client.request_timeout, Some(Duration::from_secs(8)));
        assert_eq!(settings.client.base_url, "http://127.0.0.1:8000/");
        assert_eq!(settings.download_dir, PathBuf::from("/srv/music"));
        assert_eq!(config.status_line_grace(), Duration::from_secs(5));
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let mut config = AppConfig::default();
        assert_eq!(config.level_filter(), LevelFilter::Info);
        config.log_level = "Debug".to_string();
        assert_eq!(config.level_filter(), LevelFilter::Debug);
        config.log_level = "chatty".to_string();
        assert_eq!(config.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn first_argument_overrides_path() {
        let args = ["track-fetcher", "/etc/tracker.ron"].map(String::from);
        assert_eq!(config_path(args.into_iter()), PathBuf::from("/etc/tracker.ron"));
        let args = ["track-fetcher".to_string()];
        assert_eq!(config_path(args.into_iter()), PathBuf::from(CONFIG_FILENAME));
    }

    #[test]
    fn serialized_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracker.ron");
        let config = AppConfig {
            log_level: "warn".to_string(),
            ..AppConfig::default()
        };
        fs::write(&path, config.to_ron().unwrap()).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }
}
