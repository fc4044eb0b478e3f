//! Runtime configuration.
//!
//! `AppConfig` is read from a JSON file under the platform config directory
//! and then overridden from `SAFEZONE_*` environment variables. Without a
//! Firebase project and API key the app runs in offline demo mode.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::Platform;
use crate::store::{FirestoreConfig, StoreResult};
use crate::util::normalize_text_option;
use crate::Result;

const CONFIG_DIR: &str = "safezone";
const CONFIG_FILE: &str = "config.json";

pub const ENV_PROJECT_ID: &str = "SAFEZONE_FIREBASE_PROJECT_ID";
pub const ENV_API_KEY: &str = "SAFEZONE_FIREBASE_API_KEY";
pub const ENV_POLL_INTERVAL_SECS: &str = "SAFEZONE_POLL_INTERVAL_SECS";
pub const ENV_PLATFORM: &str = "SAFEZONE_PLATFORM";
pub const ENV_FIRESTORE_URL: &str = "SAFEZONE_FIRESTORE_URL";
pub const ENV_AUTH_URL: &str = "SAFEZONE_AUTH_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub firebase_project_id: Option<String>,
    #[serde(default)]
    pub firebase_api_key: Option<String>,
    /// Override for the Firestore endpoint, e.g. a local emulator.
    #[serde(default)]
    pub firestore_base_url: Option<String>,
    /// Firebase Auth emulator host, e.g. `http://127.0.0.1:9099`.
    #[serde(default)]
    pub firebase_auth_url: Option<String>,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub platform: Option<Platform>,
}

/// Which report store the app talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMode {
    Firestore(FirestoreConfig),
    /// In-memory store seeded with sample reports.
    Offline,
}

impl AppConfig {
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            firebase_project_id: normalize_text_option(self.firebase_project_id),
            firebase_api_key: normalize_text_option(self.firebase_api_key),
            firestore_base_url: normalize_text_option(self.firestore_base_url),
            firebase_auth_url: normalize_text_option(self.firebase_auth_url),
            poll_interval_secs: self.poll_interval_secs.filter(|secs| *secs > 0),
            platform: self.platform,
        }
    }

    /// Apply `SAFEZONE_*` overrides read through `lookup`.
    ///
    /// Blank or unparseable values leave the file value in place.
    #[must_use]
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(project_id) = normalize_text_option(lookup(ENV_PROJECT_ID)) {
            self.firebase_project_id = Some(project_id);
        }
        if let Some(api_key) = normalize_text_option(lookup(ENV_API_KEY)) {
            self.firebase_api_key = Some(api_key);
        }
        if let Some(url) = normalize_text_option(lookup(ENV_FIRESTORE_URL)) {
            self.firestore_base_url = Some(url);
        }
        if let Some(url) = normalize_text_option(lookup(ENV_AUTH_URL)) {
            self.firebase_auth_url = Some(url);
        }
        if let Some(raw) = normalize_text_option(lookup(ENV_POLL_INTERVAL_SECS)) {
            match raw.parse::<u64>() {
                Ok(secs) => self.poll_interval_secs = Some(secs),
                Err(error) => {
                    tracing::warn!("Ignoring {}={}: {}", ENV_POLL_INTERVAL_SECS, raw, error);
                }
            }
        }
        if let Some(raw) = normalize_text_option(lookup(ENV_PLATFORM)) {
            match raw.parse::<Platform>() {
                Ok(platform) => self.platform = Some(platform),
                Err(error) => tracing::warn!("Ignoring {}: {}", ENV_PLATFORM, error),
            }
        }
        self.normalized()
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub const fn has_firebase(&self) -> bool {
        self.firebase_project_id.is_some() && self.firebase_api_key.is_some()
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs.map(Duration::from_secs)
    }

    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_default()
    }

    /// Identity toolkit and secure token endpoints under the auth emulator
    /// host, when one is configured.
    pub fn auth_endpoints(&self) -> Option<(String, String)> {
        let base = self.firebase_auth_url.as_deref()?.trim_end_matches('/');
        Some((
            format!("{base}/identitytoolkit.googleapis.com/v1"),
            format!("{base}/securetoken.googleapis.com/v1"),
        ))
    }

    /// Firestore settings, or offline mode when the project is not set.
    pub fn backend_mode(&self) -> StoreResult<BackendMode> {
        let (Some(project_id), Some(api_key)) = (
            self.firebase_project_id.clone(),
            self.firebase_api_key.clone(),
        ) else {
            return Ok(BackendMode::Offline);
        };

        let mut config = FirestoreConfig::new(project_id, api_key)?;
        if let Some(url) = &self.firestore_base_url {
            config = config.with_base_url(url.as_str())?;
        }
        if let Some(interval) = self.poll_interval() {
            config = config.with_poll_interval(interval);
        }
        Ok(BackendMode::Firestore(config))
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Load the config file and apply environment overrides.
pub fn resolve_config(path: Option<&Path>) -> AppConfig {
    let path = path.map_or_else(default_config_path, Path::to_path_buf);
    load_config_from_path(&path).with_env_overrides()
}

/// Read the config file; a missing or malformed file yields the default.
pub fn load_config_from_path(path: &Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config.normalized(),
            Err(error) => {
                tracing::warn!("Failed to parse config at {}: {}", path.display(), error);
                AppConfig::default()
            }
        },
        Err(error) => {
            tracing::warn!("Failed to read config at {}: {}", path.display(), error);
            AppConfig::default()
        }
    }
}

pub fn save_config_to_path(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(&config.clone().normalized())?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn missing_file_means_offline_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_path(&dir.path().join("absent.json"));

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.backend_mode().unwrap(), BackendMode::Offline);
        assert_eq!(config.platform(), Platform::Android);
    }

    #[test]
    fn saved_config_round_trips_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            firebase_project_id: Some("  safezone-demo ".to_string()),
            firebase_api_key: Some(String::new()),
            poll_interval_secs: Some(0),
            platform: Some(Platform::Ios),
            ..AppConfig::default()
        };

        save_config_to_path(&config, &path).unwrap();
        let loaded = load_config_from_path(&path);
        assert_eq!(loaded.firebase_project_id.as_deref(), Some("safezone-demo"));
        assert_eq!(loaded.firebase_api_key, None);
        assert_eq!(loaded.poll_interval_secs, None);
        assert_eq!(loaded.platform(), Platform::Ios);
        assert!(!loaded.has_firebase());
    }

    #[test]
    fn malformed_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config_from_path(&path), AppConfig::default());
    }

    #[test]
    fn environment_overrides_file_values() {
        let file = AppConfig {
            firebase_project_id: Some("from-file".to_string()),
            poll_interval_secs: Some(10),
            ..AppConfig::default()
        };

        let config = file.with_overrides(lookup(&[
            (ENV_API_KEY, "key-123"),
            (ENV_POLL_INTERVAL_SECS, "2"),
            (ENV_PLATFORM, "iOS"),
            (ENV_PROJECT_ID, "   "),
        ]));

        assert_eq!(config.firebase_project_id.as_deref(), Some("from-file"));
        assert_eq!(config.firebase_api_key.as_deref(), Some("key-123"));
        assert_eq!(config.poll_interval(), Some(Duration::from_secs(2)));
        assert_eq!(config.platform(), Platform::Ios);

        let BackendMode::Firestore(firestore) = config.backend_mode().unwrap() else {
            panic!("expected firestore backend");
        };
        assert_eq!(firestore.project_id, "from-file");
        assert_eq!(firestore.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let config = AppConfig::default().with_overrides(lookup(&[
            (ENV_POLL_INTERVAL_SECS, "soon"),
            (ENV_PLATFORM, "windows"),
        ]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn bad_emulator_url_is_rejected() {
        let config = AppConfig {
            firebase_project_id: Some("demo".to_string()),
            firebase_api_key: Some("key".to_string()),
            firestore_base_url: Some("localhost:8080".to_string()),
            ..AppConfig::default()
        };
        assert!(config.backend_mode().is_err());
    }

    #[test]
    fn auth_emulator_host_expands_to_both_endpoints() {
        assert_eq!(AppConfig::default().auth_endpoints(), None);

        let config = AppConfig::default()
            .with_overrides(lookup(&[(ENV_AUTH_URL, " http://127.0.0.1:9099/ ")]));
        assert_eq!(
            config.auth_endpoints(),
            Some((
                "http://127.0.0.1:9099/identitytoolkit.googleapis.com/v1".to_string(),
                "http://127.0.0.1:9099/securetoken.googleapis.com/v1".to_string(),
            ))
        );
    }
}
