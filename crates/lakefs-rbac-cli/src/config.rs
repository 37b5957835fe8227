use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::OutputFormat;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ProfileConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn output_format(&self) -> Result<Option<OutputFormat>> {
        self.format.as_deref().map(parse_format).transpose()
    }

    /// Sets one key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "endpoint" => self.endpoint = Some(value.to_string()),
            "format" => {
                parse_format(value)?;
                self.format = Some(value.to_string());
            }
            "timeout_secs" => {
                let secs = value
                    .parse::<u64>()
                    .with_context(|| format!("Invalid timeout_secs: {value}"))?;
                self.timeout_secs = Some(secs);
            }
            other => anyhow::bail!(
                "Unknown config key: {other}. Valid keys: endpoint, format, timeout_secs"
            ),
        }
        Ok(())
    }
}

fn parse_format(value: &str) -> Result<OutputFormat> {
    match value {
        "json" => Ok(OutputFormat::Json),
        "table" => Ok(OutputFormat::Table),
        other => anyhow::bail!("Unknown format: {other}. Valid formats: json, table"),
    }
}

pub type ConfigFile = BTreeMap<String, ProfileConfig>;

/// `~/.lakefs-rbac`, created on first use.
pub fn base_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".lakefs-rbac");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.toml")
}

pub fn load_all(dir: &Path) -> Result<ConfigFile> {
    let path = config_path(dir);
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg: ConfigFile =
        toml::from_str(&content).with_context(|| format!("Invalid config: {}", path.display()))?;
    Ok(cfg)
}

pub fn load_profile(dir: &Path, profile: &str) -> Result<ProfileConfig> {
    Ok(load_all(dir)?.remove(profile).unwrap_or_default())
}

pub fn save_profile(dir: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all(dir)?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::write(config_path(dir), content)?;
    Ok(())
}

pub fn resolve_endpoint(dir: &Path, cli_endpoint: Option<&str>, profile: &str) -> Result<String> {
    // 1. --endpoint flag / LAKEFS_ENDPOINT env
    if let Some(e) = cli_endpoint {
        return Ok(e.to_string());
    }
    // 2. config.toml profile
    if let Some(e) = load_profile(dir, profile)?.endpoint {
        return Ok(e);
    }
    // 3. Stored credentials for this profile
    if let Ok(Some(creds)) = crate::auth::load_credentials(dir, profile) {
        return Ok(creds.endpoint().to_string());
    }
    anyhow::bail!(
        "No endpoint configured. Use --endpoint, set LAKEFS_ENDPOINT, or run: lakefs-rbac login --endpoint <url>"
    )
}
