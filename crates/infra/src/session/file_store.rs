//! Session token persisted as a small JSON file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use homedash_core::SessionStore;
use homedash_domain::{HomedashError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::InfraError;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionFile {
    session_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<String>,
}

/// Stores the token at `path`, replacing the file atomically on save.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(InfraError::from(err).into()),
        };

        let file: SessionFile = serde_json::from_str(&contents).map_err(|e| {
            HomedashError::Serialization(format!(
                "corrupt session file {}: {e}",
                self.path.display()
            ))
        })?;

        let token = file.session_token.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    async fn save(&self, session_token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(InfraError::from)?;
        }

        let file = SessionFile {
            session_token: session_token.to_string(),
            saved_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        };
        let contents = serde_json::to_vec_pretty(&file).map_err(InfraError::from)?;

        let staging = self.staging_path();
        tokio::fs::write(&staging, contents).await.map_err(InfraError::from)?;
        restrict_permissions(&staging).await?;
        tokio::fs::rename(&staging, &self.path).await.map_err(InfraError::from)?;

        debug!(path = %self.path.display(), "session token persisted");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "session file removed");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .map_err(|err| InfraError::from(err).into())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
