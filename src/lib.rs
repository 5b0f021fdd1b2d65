//! Fryer - package build contexts from remote sources
//!
//! Fetches a recipe's source archive into a checksum-verified cache,
//! normalizes it to a tar stream, and joins it with a generated Dockerfile
//! and build script into one build context for a container engine.

pub mod cli;
pub mod config;
pub mod context;
pub mod cook;
pub mod error;
pub mod orchestration;
pub mod recipe;
pub mod source;
pub mod stream;
pub mod ui;

pub use error::{FryerError, FryerResult};
