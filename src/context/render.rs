//! Build instruction rendering
//!
//! Produces the Dockerfile and the `.build.sh` script that go into the
//! generated half of a build context.

use crate::error::{FryerError, FryerResult};
use crate::recipe::Recipe;
use crate::source::FileMapping;
use std::fmt;
use std::str::FromStr;

/// Directory the source lands in and the build runs from
pub const BUILD_ROOT: &str = "/tmp/build";

/// File name of the generated build script
pub const BUILD_SCRIPT_NAME: &str = ".build.sh";

/// Package-manager family of the build image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavour {
    Debian,
    Redhat,
}

impl Flavour {
    /// Flavour of a known distribution name
    pub fn for_distribution(distribution: &str) -> Option<Self> {
        match distribution {
            "debian" | "ubuntu" => Some(Self::Debian),
            "centos" | "redhat" | "fedora" => Some(Self::Redhat),
            _ => None,
        }
    }

    /// `RUN` directive installing `packages`
    pub fn install_directive(&self, packages: &[String]) -> String {
        let quoted: Vec<String> = packages.iter().map(|p| shell_quote(p)).collect();
        match self {
            Self::Debian => format!("RUN apt-get install --yes {}", quoted.join(" ")),
            Self::Redhat => format!("RUN yum -y install {}", quoted.join(" ")),
        }
    }
}

impl FromStr for Flavour {
    type Err = FryerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debian" => Ok(Self::Debian),
            "redhat" => Ok(Self::Redhat),
            other => Err(FryerError::UnknownFlavour(other.to_string())),
        }
    }
}

impl fmt::Display for Flavour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debian => "debian",
            Self::Redhat => "redhat",
        };
        write!(f, "{}", name)
    }
}

/// Variables the build context is rendered with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    /// Base image of the build
    pub image: String,

    pub distribution: Option<String>,

    /// Raw flavour value; only checked when something must be installed
    pub flavour: Option<String>,
}

impl Variables {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn with_flavour(mut self, flavour: impl Into<String>) -> Self {
        self.flavour = Some(flavour.into());
        self
    }

    /// Set the distribution, deriving the flavour from it when none is set
    pub fn with_distribution(mut self, distribution: impl Into<String>) -> Self {
        let distribution = distribution.into();
        if self.flavour.is_none() {
            self.flavour = Flavour::for_distribution(&distribution).map(|f| f.to_string());
        }
        self.distribution = Some(distribution);
        self
    }
}

/// Render the Dockerfile
pub fn dockerfile(
    variables: &Variables,
    recipe: &Recipe,
    file_map: &[FileMapping],
) -> FryerResult<String> {
    let mut lines = Vec::new();

    lines.push(format!("FROM {}", variables.image));
    lines.push(format!("RUN mkdir {}", BUILD_ROOT));
    lines.push(format!("WORKDIR {}", BUILD_ROOT));

    let packages = recipe.install_list();
    if !packages.is_empty() {
        let flavour: Flavour = variables.flavour.as_deref().unwrap_or("").parse()?;
        lines.push(flavour.install_directive(&packages));
    }

    for mapping in file_map {
        lines.push(format!("ADD {} {}", mapping.from, map_dir(&mapping.to)));
    }

    lines.push(format!("ADD {} {}/", BUILD_SCRIPT_NAME, BUILD_ROOT));
    lines.push(format!("ENTRYPOINT {}/{}", BUILD_ROOT, BUILD_SCRIPT_NAME));
    lines.push(String::new());

    Ok(lines.join("\n"))
}

/// Render the build script: strict mode, then each step announced and run
pub fn build_script(recipe: &Recipe) -> String {
    let mut lines = vec![
        "#!/bin/bash".to_string(),
        "set -e".to_string(),
        "set -x".to_string(),
    ];

    for step in &recipe.steps {
        lines.push(format!("echo '------> ' {}", shell_quote(&step.name)));
        lines.push(step.command.clone());
    }
    lines.push(String::new());

    lines.join("\n")
}

/// Place an archive-relative directory under the build root
pub fn map_dir(dir: &str) -> String {
    match dir {
        "" | "." => BUILD_ROOT.to_string(),
        dir => format!("{}/{}", BUILD_ROOT, dir.trim_start_matches('/')),
    }
}

/// Quote a word for a POSIX shell, leaving safe words bare
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.,:/+=@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}
