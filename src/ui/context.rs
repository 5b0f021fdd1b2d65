//! Terminal detection

use std::io::IsTerminal;

/// Decides whether status output is styled
#[derive(Debug, Clone)]
pub struct UiContext {
    fancy: bool,
}

impl UiContext {
    /// Detect the current environment
    pub fn detect() -> Self {
        Self {
            fancy: Self::detect_fancy(),
        }
    }

    /// Plain output (for tests or piped stderr)
    pub fn plain() -> Self {
        Self { fancy: false }
    }

    /// Check if we should use colored, symbol-prefixed output
    pub fn use_fancy_output(&self) -> bool {
        self.fancy
    }

    fn detect_fancy() -> bool {
        if !std::io::stderr().is_terminal() {
            return false;
        }

        // CI logs keep the bracketed prefixes
        !["CI", "GITHUB_ACTIONS", "GITLAB_CI", "BUILDKITE", "JENKINS_URL"]
            .iter()
            .any(|var| std::env::var(var).is_ok())
    }
}
