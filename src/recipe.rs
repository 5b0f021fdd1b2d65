//! Recipe data
//!
//! The build context generator only needs a recipe's dependencies and its
//! ordered build steps. Recipes are plain data here, loaded from TOML:
//!
//! ```toml
//! [source]
//! url = "https://example.com/foo-1.0.tar.gz"
//! checksum = "sha256:..."
//!
//! [build_depends]
//! gcc = {}
//! make = { install = false }
//!
//! [depends]
//! libc6 = {}
//!
//! [[steps]]
//! name = "configure"
//! command = "./configure --prefix=/usr"
//! ```

use crate::error::{FryerError, FryerResult};
use crate::source::{FileMapping, Source, SourceOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// A package dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Whether the build image should install it
    #[serde(default = "default_install")]
    pub install: bool,
}

fn default_install() -> bool {
    true
}

impl Default for Dependency {
    fn default() -> Self {
        Self { install: true }
    }
}

/// One named build step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub command: String,
}

/// Dependencies and ordered build steps of a recipe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipe {
    pub build_depends: BTreeMap<String, Dependency>,
    pub depends: BTreeMap<String, Dependency>,
    pub steps: Vec<Step>,
}

impl Recipe {
    pub fn with_build_depend(mut self, name: impl Into<String>, install: bool) -> Self {
        self.build_depends.insert(name.into(), Dependency { install });
        self
    }

    pub fn with_depend(mut self, name: impl Into<String>, install: bool) -> Self {
        self.depends.insert(name.into(), Dependency { install });
        self
    }

    pub fn with_step(mut self, name: impl Into<String>, command: impl Into<String>) -> Self {
        self.steps.push(Step {
            name: name.into(),
            command: command.into(),
        });
        self
    }

    /// Packages the build image installs.
    ///
    /// Union of build and runtime dependencies (runtime entries override
    /// build entries of the same name), minus those marked `install = false`,
    /// sorted.
    pub fn install_list(&self) -> Vec<String> {
        let mut merged: BTreeMap<&str, bool> = BTreeMap::new();
        for (name, dep) in self.build_depends.iter().chain(self.depends.iter()) {
            merged.insert(name, dep.install);
        }
        merged
            .into_iter()
            .filter(|(_, install)| *install)
            .map(|(name, _)| name.to_string())
            .collect()
    }
}

/// `[source]` section of a recipe file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub url: String,

    #[serde(default)]
    pub checksum: Option<String>,

    #[serde(default)]
    pub extension: Option<String>,

    #[serde(default)]
    pub files: Option<Vec<FileMapping>>,
}

impl SourceSpec {
    pub fn to_source(&self) -> FryerResult<Source> {
        Source::new(
            &self.url,
            SourceOptions {
                extension: self.extension.clone(),
                checksum: self.checksum.clone(),
                file_map: self.files.clone(),
                span: None,
            },
        )
    }
}

/// A recipe file as stored on disk
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecipeFile {
    pub source: Option<SourceSpec>,
    pub build_depends: BTreeMap<String, Dependency>,
    pub depends: BTreeMap<String, Dependency>,
    pub steps: Vec<Step>,
}

impl RecipeFile {
    /// Read and parse a recipe file
    pub async fn load(path: &Path) -> FryerResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| FryerError::io(format!("reading recipe from {}", path.display()), e))?;
        let file = Self::parse(&content, path)?;
        debug!(
            path = %path.display(),
            steps = file.steps.len(),
            has_source = file.source.is_some(),
            "Loaded recipe"
        );
        Ok(file)
    }

    pub fn parse(content: &str, path: &Path) -> FryerResult<Self> {
        toml::from_str(content).map_err(|e| FryerError::RecipeInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn recipe(&self) -> Recipe {
        Recipe {
            build_depends: self.build_depends.clone(),
            depends: self.depends.clone(),
            steps: self.steps.clone(),
        }
    }
}
