use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lakefs_rbac::HttpTransportConfig;
use serde::{Deserialize, Serialize};

/// Stored credentials: an access key pair (default) or a session token.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoredCredentials {
    #[serde(rename = "basic")]
    Basic {
        endpoint: String,
        access_key_id: String,
        secret_access_key: String,
    },
    #[serde(rename = "bearer")]
    Bearer { endpoint: String, token: String },
}

impl StoredCredentials {
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Basic { endpoint, .. } | Self::Bearer { endpoint, .. } => endpoint,
        }
    }

    /// Adds these credentials to a transport config.
    pub fn apply(&self, config: HttpTransportConfig) -> HttpTransportConfig {
        match self {
            Self::Basic {
                access_key_id,
                secret_access_key,
                ..
            } => config.with_basic_auth(access_key_id, secret_access_key),
            Self::Bearer { token, .. } => config.with_bearer_token(token),
        }
    }
}

fn creds_path(dir: &Path, profile: &str) -> PathBuf {
    dir.join(format!("credentials.{profile}.json"))
}

pub fn load_credentials(dir: &Path, profile: &str) -> Result<Option<StoredCredentials>> {
    let path = creds_path(dir, profile);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let creds: StoredCredentials = serde_json::from_str(&content)
        .with_context(|| format!("Invalid credentials file: {}", path.display()))?;
    Ok(Some(creds))
}

pub fn save_credentials(dir: &Path, profile: &str, creds: &StoredCredentials) -> Result<()> {
    let path = creds_path(dir, profile);
    let content = serde_json::to_string_pretty(creds)?;
    fs::write(&path, content)?;
    restrict_permissions(&path)?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

pub fn remove_credentials(dir: &Path, profile: &str) -> Result<bool> {
    let path = creds_path(dir, profile);
    if path.exists() {
        fs::remove_file(path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Picks credentials for a request: the key pair from the environment when
/// both halves are set, else whatever `login` stored.
pub fn resolve_credentials(dir: &Path, profile: &str, endpoint: &str) -> Result<Option<StoredCredentials>> {
    let from_env = (
        std::env::var("LAKEFS_ACCESS_KEY_ID").ok(),
        std::env::var("LAKEFS_SECRET_ACCESS_KEY").ok(),
    );
    if let (Some(access_key_id), Some(secret_access_key)) = from_env {
        return Ok(Some(StoredCredentials::Basic {
            endpoint: endpoint.to_string(),
            access_key_id,
            secret_access_key,
        }));
    }
    load_credentials(dir, profile)
}
