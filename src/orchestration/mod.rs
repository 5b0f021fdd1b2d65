//! Container engine boundary
//!
//! Build contexts are handed to an `ImageBuilder`; the default one drives
//! a docker-compatible command line.

mod builder;
mod cli_engine;

pub use builder::{BuildParams, ImageBuilder};
pub use cli_engine::CliImageBuilder;

/// Lines of engine output kept in a `BuildFailed` message
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Tail of a failed `build -q` run.
///
/// Quiet builds print the image id on stdout and the failing step on
/// stderr; both are joined and cut to the last `BUILD_ERROR_TAIL_LINES`.
pub(crate) fn build_error_output(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let skip = lines.len().saturating_sub(BUILD_ERROR_TAIL_LINES);
    lines[skip..].join("\n")
}
