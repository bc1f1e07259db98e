//! Client configuration.
//!
//! The minimal server configuration is the MyTardis URL, a username and an API
//! key, usually stored in `~/.config/mytardisclient/mytardisclient.toml`:
//!
//! ```toml
//! [mytardisclient]
//! url = "https://mytardis.example.com"
//! username = "demofacility"
//! apikey = "644be179cc6773c30fc471bad61b50c90897146c"
//!
//! [cache]
//! enabled = true
//! expiration_secs = 30
//! ```
//!
//! The older key names `mytardis_url` and `api_key` are still accepted.
//! A [`Config`] is built once at startup and passed by reference to the
//! [`Client`](crate::api::Client); there is no global configuration.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::MytardisError;

/// Response cache entries older than this are refetched.
pub const DEFAULT_CACHE_EXPIRATION_SECS: u64 = 30;

const CONFIG_FILE_NAME: &str = "mytardisclient.toml";
const CACHE_FILE_NAME: &str = "mytardisclient.cache.json";

/// On-disk layout of the config file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    mytardisclient: ServerSection,
    #[serde(default)]
    cache: CacheSettings,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ServerSection {
    #[serde(default, alias = "mytardis_url")]
    url: String,
    #[serde(default)]
    username: String,
    #[serde(default, alias = "api_key")]
    apikey: String,
}

/// Settings for the optional GET response cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Whether the CLI wraps its transport in a response cache.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Seconds before a cached response is considered stale.
    #[serde(default = "default_cache_expiration")]
    pub expiration_secs: u64,
    /// Cache file location. Defaults to the platform cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_expiration() -> u64 {
    DEFAULT_CACHE_EXPIRATION_SECS
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            expiration_secs: default_cache_expiration(),
            path: None,
        }
    }
}

impl CacheSettings {
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }
}

/// MyTardis server configuration: URL, username and API key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Where this config was loaded from and will be saved to.
    pub path: Option<PathBuf>,
    /// The MyTardis URL, e.g. `https://mytardis.example.com`.
    pub url: String,
    /// The MyTardis username, e.g. `demofacility`.
    pub username: String,
    /// The MyTardis API key.
    pub apikey: String,
    pub cache: CacheSettings,
}

impl Config {
    /// Builds a config in memory, without a backing file.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        apikey: impl Into<String>,
    ) -> Self {
        Self {
            path: None,
            url: url.into(),
            username: username.into(),
            apikey: apikey.into(),
            cache: CacheSettings::default(),
        }
    }

    /// Platform default config location
    /// (`~/.config/mytardisclient/mytardisclient.toml` on Linux).
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads settings from `path`.
    ///
    /// A missing file is not an error: the result has empty credentials and
    /// will fail [`Config::validate`] until they are supplied some other way.
    pub fn load(path: &Path) -> Result<Self, MytardisError> {
        let file = if path.exists() {
            log::info!("Reading settings from: {}", path.display());
            let text = fs::read_to_string(path)?;
            toml::from_str::<ConfigFile>(&text).map_err(|source| MytardisError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            ConfigFile::default()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            url: file.mytardisclient.url,
            username: file.mytardisclient.username,
            apikey: file.mytardisclient.apikey,
            cache: file.cache,
        })
    }

    /// Writes the config back to [`Config::path`], creating parent directories.
    pub fn save(&self) -> Result<(), MytardisError> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| MytardisError::configuration("no config file path to save to"))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = ConfigFile {
            mytardisclient: ServerSection {
                url: self.url.clone(),
                username: self.username.clone(),
                apikey: self.apikey.clone(),
            },
            cache: self.cache.clone(),
        };
        let text = toml::to_string_pretty(&file).map_err(|source| MytardisError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text)?;
        log::info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Replaces any of URL, username or API key that are supplied.
    pub fn apply_overrides(
        &mut self,
        url: Option<String>,
        username: Option<String>,
        apikey: Option<String>,
    ) {
        if let Some(url) = url {
            self.url = url;
        }
        if let Some(username) = username {
            self.username = username;
        }
        if let Some(apikey) = apikey {
            self.apikey = apikey;
        }
    }

    /// Ensures the config has a username, an API key and an http(s) URL.
    pub fn validate(&self) -> Result<(), MytardisError> {
        if self.username.is_empty() {
            return Err(MytardisError::configuration(
                "MyTardis username is missing from config.",
            ));
        }
        if self.apikey.is_empty() {
            return Err(MytardisError::configuration(
                "MyTardis API key is missing from config.",
            ));
        }
        if self.url.is_empty() {
            return Err(MytardisError::configuration(
                "MyTardis URL is missing from config.",
            ));
        }
        let parsed = url::Url::parse(&self.url).map_err(|_| {
            MytardisError::configuration(format!(
                "Invalid MyTardis URL found in config: {}",
                self.url
            ))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().unwrap_or("").is_empty()
        {
            return Err(MytardisError::configuration(format!(
                "Invalid MyTardis URL found in config: {}",
                self.url
            )));
        }
        Ok(())
    }

    /// Host (and port, if any) of the configured URL.
    pub fn hostname(&self) -> Option<String> {
        let parsed = url::Url::parse(&self.url).ok()?;
        let host = parsed.host_str()?;
        Some(match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    }

    /// The URL with any trailing slash removed, ready for `/api/v1/...`.
    pub fn api_base(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Headers sent with every API request, including API key authorization.
    pub fn default_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                "Authorization",
                format!("ApiKey {}:{}", self.username, self.apikey),
            ),
            ("Content-Type", "application/json".to_string()),
            ("Accept", "application/json".to_string()),
        ]
    }

    /// Cache file location: the configured path or the platform cache directory.
    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache
            .path
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.cache_dir().join(CACHE_FILE_NAME)))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "mytardisclient")
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attrs = serde_json::json!({
            "path": self.path.as_ref().map(|p| p.display().to_string()),
            "url": self.url,
            "username": self.username,
            "apikey": self.apikey,
            "cache_enabled": self.cache.enabled,
            "cache_expiration_secs": self.cache.expiration_secs,
            "cache_path": self.cache_path().map(|p| p.display().to_string()),
        });
        let text = serde_json::to_string_pretty(&attrs).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
