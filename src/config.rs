use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceRegistry;
use crate::error::{AppError, AppResult};

const APP_DIR_NAME: &str = "depcomment";
const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 30;

pub fn config_directory() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| {
            AppError::Configuration("unable to locate a configuration directory".to_string())
        })
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

/// Settings persisted between runs by `config init` and `login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredConfig {
    pub jira_base_url: Option<String>,
    pub jira_email: Option<String>,
    pub jira_token: Option<String>,
    pub default_issue: Option<String>,
    pub services_root: Option<String>,
    pub services: Option<Vec<String>>,
    pub blocked_services: Vec<String>,
    pub scan_timeout_secs: Option<u64>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jira_base_url: Option<String>,
    pub jira_email: Option<String>,
    pub jira_token: Option<String>,
    pub default_issue: Option<String>,
    pub services_root: Option<String>,
    pub registry: ServiceRegistry,
    pub blocked_services: Vec<String>,
    pub scan_timeout: Duration,
    pub workspace_root: PathBuf,
}

impl AppConfig {
    pub fn load(workspace_hint: &Path) -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Ok(Self::from_sources(stored, workspace_hint, |key| {
            env::var(key).ok()
        }))
    }

    /// Layers `DEPCOMMENT_*` variables from `lookup` over the stored settings.
    pub fn from_sources(
        stored: StoredConfig,
        workspace_hint: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let registry = match &stored.services {
            Some(names) if !names.is_empty() => ServiceRegistry::new(names.iter().cloned()),
            _ => ServiceRegistry::default(),
        };

        Self {
            jira_base_url: var("DEPCOMMENT_JIRA_BASE_URL").or(stored.jira_base_url),
            jira_email: var("DEPCOMMENT_JIRA_EMAIL").or(stored.jira_email),
            jira_token: var("DEPCOMMENT_JIRA_TOKEN").or(stored.jira_token),
            default_issue: var("DEPCOMMENT_ISSUE").or(stored.default_issue),
            services_root: var("DEPCOMMENT_SERVICES_ROOT").or(stored.services_root),
            registry,
            blocked_services: stored.blocked_services,
            scan_timeout: Duration::from_secs(
                stored
                    .scan_timeout_secs
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_SCAN_TIMEOUT_SECS),
            ),
            workspace_root: workspace_hint.to_path_buf(),
        }
    }
}
