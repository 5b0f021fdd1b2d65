//! Configuration schema for Fryer
//!
//! Configuration is stored at `~/.config/fryer/config.toml`

use crate::context::DOCKERFILE_NAME;
use crate::source::Fetcher;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Source download settings
    pub fetch: FetchConfig,

    /// Source cache settings
    pub cache: CacheConfig,

    /// Container engine settings
    pub engine: EngineConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Source download settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Redirects followed before giving up
    pub max_redirects: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_redirects: Fetcher::DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Source cache settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root of per-source scratch directories (default: user cache dir)
    pub dir: Option<PathBuf>,
}

/// Container engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine CLI to build with
    pub program: String,

    /// Dockerfile name inside the build context
    pub dockerfile: String,

    /// Remove intermediate containers after a build
    pub remove_intermediate: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
            dockerfile: DOCKERFILE_NAME.to_string(),
            remove_intermediate: true,
        }
    }
}
