//! Configuration management for Fryer

pub mod schema;

pub use schema::Config;

use crate::error::{FryerError, FryerResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fryer")
            .join("config.toml")
    }

    /// Get the default source cache root
    pub fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fryer")
            .join("sources")
    }

    /// Load configuration, falling back to defaults if not exists
    pub async fn load(&self) -> FryerResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> FryerResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| FryerError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| FryerError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Scratch directory for one source URL under the cache root.
///
/// Named by a hash of the URL, so sources sharing a file name never share
/// a scratch directory.
pub fn scratch_dir_for(cache_root: &Path, url: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let hash = hex::encode(hasher.finalize());
    cache_root.join(&hash[..16])
}

impl Config {
    /// Cache root, honoring an override
    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .unwrap_or_else(ConfigManager::default_cache_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.engine.program, "docker");
    }

    #[tokio::test]
    async fn load_from_file_reads_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[fetch]\nmax_redirects = 5\n[cache]\ndir = \"/var/cache/x\"\n")
            .unwrap();
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.fetch.max_redirects, 5);
        assert_eq!(config.cache_dir(), PathBuf::from("/var/cache/x"));
    }

    #[tokio::test]
    async fn invalid_config_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[fetch]\nmax_redirects = \"many\"\n").unwrap();
        let manager = ConfigManager::with_path(path.clone());

        let err = manager.load().await.unwrap_err();
        assert!(matches!(err, FryerError::ConfigInvalid { path: p, .. } if p == path));
    }

    #[test]
    fn scratch_dirs_differ_per_url() {
        let root = Path::new("/cache");
        let a = scratch_dir_for(root, "http://a.example.com/src.tar");
        let b = scratch_dir_for(root, "http://b.example.com/src.tar");
        assert_ne!(a, b);
        assert_eq!(a, scratch_dir_for(root, "http://a.example.com/src.tar"));
        assert!(a.starts_with(root));
    }
}
