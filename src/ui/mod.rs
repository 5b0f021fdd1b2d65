//! Status output for the CLI
//!
//! Everything goes to stderr: stdout may be carrying a build context.

mod context;
mod output;

pub use context::UiContext;
pub use output::{key_value, step_error_detail, step_info, step_ok_detail, step_warn_hint};
