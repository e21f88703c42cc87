use crate::assistant::BabyProfile;
use crate::auth::AuthUser;
use crate::conversation::DEFAULT_HISTORY_LIMIT;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    api: ApiConfig,
    #[serde(default)]
    auth: AuthConfig,
    storage: StorageConfig,
    #[serde(default)]
    profile: ProfileConfig,
    #[serde(default)]
    history: HistoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiConfig {
    url: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AuthConfig {
    user_id: Option<String>,
    email: Option<String>,
    access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct StorageConfig {
    #[serde(default)]
    backend: StorageBackend,
    data_dir: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ProfileConfig {
    baby_id: Option<String>,
    name: Option<String>,
    birth_date: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct HistoryConfig {
    limit: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_timeout: Duration,
    pub user: Option<AuthUser>,
    pub storage_backend: StorageBackend,
    pub data_dir: PathBuf,
    pub profile: BabyProfile,
    pub history_limit: u64,
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        let config_file: ConfigFile =
            toml::from_str(content).context("Failed to parse config file")?;

        let user = match (config_file.auth.user_id, config_file.auth.access_token) {
            (Some(id), Some(access_token)) => Some(AuthUser {
                id,
                email: config_file.auth.email,
                access_token,
            }),
            (None, None) => None,
            _ => bail!("auth.user_id and auth.access_token must be set together"),
        };

        if config_file.history.limit == 0 {
            bail!("history.limit must be greater than zero");
        }

        Ok(Self {
            api_url: config_file.api.url,
            api_timeout: Duration::from_secs(config_file.api.timeout_secs),
            user,
            storage_backend: config_file.storage.backend,
            data_dir: config_file.storage.data_dir.into(),
            profile: BabyProfile {
                id: config_file.profile.baby_id,
                name: config_file.profile.name,
                birth_date: config_file.profile.birth_date,
                notes: config_file.profile.notes,
            },
            history_limit: config_file.history.limit,
        })
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(&content)
    }

    pub fn load() -> Result<Self> {
        let path = std::env::var("LUMI_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::from_file(&path)
    }
}
