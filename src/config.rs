use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

use crate::backend::DEFAULT_BACKEND_URL;

pub const BACKEND_URL_ENV: &str = "DOCFLOW_BACKEND_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub backend_url: Option<String>,
    pub start_dir: Option<PathBuf>,
    pub log_filter: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Remember the directory of the last uploaded document.
    pub fn save_start_dir(dir: &Path) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.start_dir = Some(dir.to_path_buf());
        config.save()
    }

    /// Backend origin: CLI flag, then environment, then config file, then
    /// the local default.
    pub fn resolve_backend_url(&self, cli_override: Option<&str>) -> String {
        let env_value = std::env::var(BACKEND_URL_ENV).ok();
        pick_backend_url(cli_override, env_value.as_deref(), self.backend_url.as_deref())
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("docflow").join("config.json"))
    }
}

fn pick_backend_url(cli: Option<&str>, env: Option<&str>, file: Option<&str>) -> String {
    [cli, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(DEFAULT_BACKEND_URL)
        .trim_end_matches('/')
        .to_string()
}
