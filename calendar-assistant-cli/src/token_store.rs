use std::path::PathBuf;

use async_trait::async_trait;

use calendar_assistant_core::{
    Error, Result,
    auth::{AccessToken, TokenStore},
};

/// Tokens kept as one JSON file per profile under the user's cache directory.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    cache_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        if !cache_dir.exists() {
            std::fs::create_dir_all(&cache_dir).map_err(|e| {
                Error::Config(format!(
                    "Failed to create token directory {}: {e}",
                    cache_dir.display()
                ))
            })?;
        }

        Ok(Self { cache_dir })
    }

    pub fn with_default_dir(app_name: &str) -> Result<Self> {
        let cache_dir = Self::get_default_cache_dir(app_name)?;
        Self::new(cache_dir)
    }

    fn get_default_cache_dir(app_name: &str) -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join("Library").join("Caches").join(app_name))
                .ok_or_else(|| Error::Config("Cannot determine cache directory".to_string()))
        }

        #[cfg(target_os = "linux")]
        {
            if let Some(cache_dir) = std::env::var_os("XDG_CACHE_HOME") {
                Ok(PathBuf::from(cache_dir).join(app_name))
            } else if let Some(home) = std::env::var_os("HOME") {
                Ok(PathBuf::from(home).join(".cache").join(app_name))
            } else {
                Err(Error::Config("Cannot determine cache directory".to_string()))
            }
        }

        #[cfg(target_os = "windows")]
        {
            std::env::var_os("LOCALAPPDATA")
                .map(|local_app_data| PathBuf::from(local_app_data).join(app_name))
                .ok_or_else(|| Error::Config("Cannot determine cache directory".to_string()))
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            Err(Error::Config(
                "Unsupported operating system for cache directory detection".to_string(),
            ))
        }
    }

    /// Profile names are escaped byte-wise (`_` plus two hex digits for
    /// anything but ASCII alphanumerics and `-`), so distinct profiles never
    /// share a file.
    fn token_file_path(&self, profile: &str) -> PathBuf {
        let mut name = String::with_capacity(profile.len());
        for byte in profile.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("_{byte:02x}"));
            }
        }
        self.cache_dir.join(format!("token-{name}.json"))
    }

    async fn remove(path: PathBuf) -> Result<()> {
        match tokio::fs::remove_file(&path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(Error::Config(format!(
                "Failed to delete token file {}: {e}",
                path.display()
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, profile: &str) -> Result<Option<AccessToken>> {
        let path = self.token_file_path(profile);
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read(&path).await?;
        match serde_json::from_slice::<AccessToken>(&content) {
            Ok(token) if token.is_expired() => {
                tracing::debug!(profile, "stored token expired, removing it");
                Self::remove(path).await?;
                Ok(None)
            }
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::warn!(profile, error = %e, "unreadable token file, removing it");
                Self::remove(path).await?;
                Ok(None)
            }
        }
    }

    async fn set(&self, profile: &str, token: &AccessToken) -> Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let path = self.token_file_path(profile);
        tokio::fs::write(&path, serde_json::to_vec(token)?).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).await?;
        }
        Ok(())
    }

    async fn delete(&self, profile: &str) -> Result<()> {
        Self::remove(self.token_file_path(profile)).await
    }
}
