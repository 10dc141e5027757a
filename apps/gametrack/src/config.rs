//! Host configuration.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/gametrack/gametrack.toml`
//! - Windows: `%APPDATA%/gametrack/gametrack.toml`
//!
//! The file holds API keys, so it is written with 0600 permissions on Unix.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gametrack_store::FirestoreConfig;
use gametrack_tracker::{Defaults, NO_DESCRIPTION, PLACEHOLDER_IMAGE};
use serde::{Deserialize, Serialize};

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// RAWG API key sent with every search and detail request.
    #[serde(default)]
    pub rawg_api_key: String,

    /// Image stored for games without cover art.
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,

    /// Document store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Document store settings. An empty project id selects the in-memory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub api_key: String,

    /// Seconds between collection polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_placeholder_image() -> String {
    PLACEHOLDER_IMAGE.into()
}

fn default_poll_interval_secs() -> u64 {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rawg_api_key: String::new(),
            placeholder_image: default_placeholder_image(),
            store: StoreConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: String::new(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Normalization fallbacks derived from this configuration.
    pub fn defaults(&self) -> Defaults {
        let image = if self.placeholder_image.is_empty() {
            PLACEHOLDER_IMAGE.to_string()
        } else {
            self.placeholder_image.clone()
        };
        Defaults {
            description: NO_DESCRIPTION.to_string(),
            image,
        }
    }

    /// Firestore settings, or `None` when the in-memory store should be used.
    pub fn firestore(&self) -> Option<FirestoreConfig> {
        if self.store.project_id.is_empty() {
            return None;
        }
        let mut config = FirestoreConfig::new(&self.store.project_id, &self.store.api_key);
        config.poll_interval = Duration::from_secs(self.store.poll_interval_secs.max(1));
        Some(config)
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("gametrack")
            .join("gametrack.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("gametrack").join("gametrack.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/gametrack/gametrack.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.rawg_api_key.is_empty());
        assert_eq!(config.placeholder_image, PLACEHOLDER_IMAGE);
        assert!(config.store.project_id.is_empty());
        assert_eq!(config.store.poll_interval_secs, 2);
        assert!(config.firestore().is_none());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            rawg_api_key = "k"

            [store]
            project_id = "demo"
            "#,
        )
        .unwrap();

        assert_eq!(config.rawg_api_key, "k");
        assert_eq!(config.placeholder_image, PLACEHOLDER_IMAGE);
        assert_eq!(config.store.project_id, "demo");
        assert!(config.store.api_key.is_empty());
        assert_eq!(config.store.poll_interval_secs, 2);
    }

    #[test]
    fn project_id_selects_firestore() {
        let config = Config {
            store: StoreConfig {
                project_id: "demo".into(),
                api_key: "secret".into(),
                poll_interval_secs: 5,
            },
            ..Config::default()
        };

        let firestore = config.firestore().unwrap();
        assert_eq!(firestore.project_id, "demo");
        assert_eq!(firestore.api_key, "secret");
        assert_eq!(firestore.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let mut config = Config::default();
        config.store.project_id = "demo".into();
        config.store.poll_interval_secs = 0;
        assert_eq!(config.firestore().unwrap().poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn custom_placeholder_feeds_defaults() {
        let config = Config {
            placeholder_image: "https://cdn.example/none.png".into(),
            ..Config::default()
        };
        let defaults = config.defaults();
        assert_eq!(defaults.image, "https://cdn.example/none.png");
        assert_eq!(defaults.description, NO_DESCRIPTION);

        let blank = Config {
            placeholder_image: String::new(),
            ..Config::default()
        };
        assert_eq!(blank.defaults().image, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn config_path_not_empty() {
        let path = config_path().unwrap();
        assert!(path.to_string_lossy().contains("gametrack"));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("gametrack.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gametrack.toml");

        let config = Config {
            rawg_api_key: "rawg-key".into(),
            store: StoreConfig {
                project_id: "tracker-prod".into(),
                api_key: "fs-key".into(),
                poll_interval_secs: 3,
            },
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gametrack.toml");
        std::fs::write(&path, "store = 5").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
