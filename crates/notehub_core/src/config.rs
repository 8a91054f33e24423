//! Configuration types for notehub.
//!
//! This module provides the [`Config`] struct which stores the repository
//! coordinates, the access token and tuning knobs for the synchronization
//! layer. Configuration is persisted as TOML (typically at
//! `~/.config/notehub/config.toml` on Unix systems).
//!
//! # Key Configuration Fields
//!
//! - `token`: Personal access token for the contents API
//! - `owner` / `repo` / `branch`: Repository the notes live in
//! - `daily_folder`: Folder holding `YYYY-MM-DD.md` daily notes
//! - `autosave_debounce_ms`: Quiescence before an edited document is saved
//!
//! Configuration is read once at startup. Operations never consult it
//! directly; they receive the immutable [`Credentials`] produced by
//! [`Config::credentials`], which is also where missing values are reported.
//!
//! # Example
//!
//! ```ignore
//! use notehub_core::config::Config;
//!
//! let config = Config::load()?.with_env_overrides();
//! let credentials = config.credentials()?;
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{NotehubError, Result};

/// Default contents API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Environment variable overriding [`Config::token`]
pub const ENV_TOKEN: &str = "NOTEHUB_GITHUB_TOKEN";
/// Environment variable overriding [`Config::owner`]
pub const ENV_OWNER: &str = "NOTEHUB_REPO_OWNER";
/// Environment variable overriding [`Config::repo`]
pub const ENV_REPO: &str = "NOTEHUB_REPO_NAME";
/// Environment variable overriding [`Config::branch`]
pub const ENV_BRANCH: &str = "NOTEHUB_BRANCH";

const MIN_DEBOUNCE_MS: u64 = 1_000;
const MAX_DEBOUNCE_MS: u64 = 3_000;

fn default_branch() -> String {
    "main".to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_daily_folder() -> String {
    "Daily".to_string()
}

fn default_autosave_debounce_ms() -> u64 {
    1_500
}

fn default_recent_days() -> usize {
    7
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// `Config` represents the parts of notehub that the user can configure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Access token sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Repository owner (user or organization)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Repository name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Branch all reads and commits target
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Base URL of the contents API (override for GitHub Enterprise)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Folder holding daily notes, relative to the repository root
    #[serde(default = "default_daily_folder")]
    pub daily_folder: String,

    /// Quiescence before an edited document is saved (clamped to 1–3 s)
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,

    /// How many days `daily` lists by default
    #[serde(default = "default_recent_days")]
    pub recent_days: usize,

    /// Transport timeout; expiry surfaces as `Unavailable`
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            owner: None,
            repo: None,
            branch: default_branch(),
            api_base_url: default_api_base_url(),
            daily_folder: default_daily_folder(),
            autosave_debounce_ms: default_autosave_debounce_ms(),
            recent_days: default_recent_days(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Create a config for the given repository
    pub fn new(token: impl Into<String>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            owner: Some(owner.into()),
            repo: Some(repo.into()),
            ..Self::default()
        }
    }

    /// Validate the repository coordinates and produce immutable credentials.
    ///
    /// Empty strings count as missing.
    pub fn credentials(&self) -> Result<Credentials> {
        let token = non_empty(&self.token).ok_or(NotehubError::MissingConfiguration("token"))?;
        let owner = non_empty(&self.owner).ok_or(NotehubError::MissingConfiguration("owner"))?;
        let repo = non_empty(&self.repo).ok_or(NotehubError::MissingConfiguration("repo"))?;
        let branch = self.branch.trim();
        if branch.is_empty() {
            return Err(NotehubError::MissingConfiguration("branch"));
        }

        Ok(Credentials {
            token: token.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
            api_base_url: self.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Autosave debounce as a duration, clamped to the supported window.
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(
            self.autosave_debounce_ms
                .clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS),
        )
    }

    /// Transport timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (non-empty values win).
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(ENV_TOKEN) {
            self.token = Some(token);
        }
        if let Some(owner) = get(ENV_OWNER) {
            self.owner = Some(owner);
        }
        if let Some(repo) = get(ENV_REPO) {
            self.repo = Some(repo);
        }
        if let Some(branch) = get(ENV_BRANCH) {
            self.branch = branch;
        }
        self
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the config file path (~/.config/notehub/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("notehub").join("config.toml"))
    }

    /// Load config from default location, or return default if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            return Self::load_from(&path);
        }

        Ok(Config::default())
    }

    /// Save config to default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(NotehubError::NoConfigDir)?;
        self.save_to(&path)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Validated, immutable repository credentials.
///
/// Only obtainable through [`Config::credentials`], so holding one proves
/// that every required value is present.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    owner: String,
    repo: String,
    branch: String,
    api_base_url: String,
}

impl Credentials {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// `owner/repo`, as used in search qualifiers.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_values_are_reported_by_name() {
        let config = Config::default();
        assert!(matches!(
            config.credentials(),
            Err(NotehubError::MissingConfiguration("token"))
        ));

        let mut config = Config::new("t", "octo", "notes");
        config.repo = Some("   ".to_string());
        assert!(matches!(
            config.credentials(),
            Err(NotehubError::MissingConfiguration("repo"))
        ));
    }

    #[test]
    fn test_credentials_trim_base_url() {
        let mut config = Config::new("t", "octo", "notes");
        config.api_base_url = "https://ghe.example.com/api/v3/".to_string();
        let creds = config.credentials().unwrap();
        assert_eq!(creds.api_base_url(), "https://ghe.example.com/api/v3");
        assert_eq!(creds.branch(), "main");
        assert_eq!(creds.full_name(), "octo/notes");
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let creds = Config::new("secret-token", "octo", "notes")
            .credentials()
            .unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let env: HashMap<&str, &str> = [
            (ENV_TOKEN, "from-env"),
            (ENV_BRANCH, "notes"),
            (ENV_OWNER, ""),
        ]
        .into_iter()
        .collect();

        let config = Config::new("from-file", "octo", "notes")
            .with_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.token.as_deref(), Some("from-env"));
        assert_eq!(config.branch, "notes");
        // Empty override is ignored
        assert_eq!(config.owner.as_deref(), Some("octo"));
    }

    #[test]
    fn test_debounce_is_clamped() {
        let mut config = Config::default();
        assert_eq!(config.autosave_debounce(), Duration::from_millis(1_500));
        config.autosave_debounce_ms = 10;
        assert_eq!(config.autosave_debounce(), Duration::from_secs(1));
        config.autosave_debounce_ms = 60_000;
        assert_eq!(config.autosave_debounce(), Duration::from_secs(3));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::new("t", "octo", "notes");
        config.daily_folder = "Journal/Daily".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.token.as_deref(), Some("t"));
        assert_eq!(loaded.daily_folder, "Journal/Daily");
        assert_eq!(loaded.recent_days, 7);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("owner = \"octo\"\nrepo = \"notes\"\n").unwrap();
        assert_eq!(config.branch, "main");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.token.is_none());
    }
}
