//! Image builder abstraction
//!
//! The engine is only a sink: it takes one tar byte stream plus build
//! parameters and answers with an image id or a failure.

use crate::context::DOCKERFILE_NAME;
use crate::error::FryerResult;
use crate::stream::ByteSource;
use async_trait::async_trait;

/// Parameters passed alongside a build context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildParams {
    /// Tag for the built image
    pub tag: Option<String>,

    /// Recipe file name inside the context
    pub dockerfile: String,

    /// Remove intermediate containers after a successful build
    pub remove_intermediate: bool,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            tag: None,
            dockerfile: DOCKERFILE_NAME.to_string(),
            remove_intermediate: true,
        }
    }
}

/// Anything that can turn a build context stream into an image
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Build an image from `context`, returning its id.
    ///
    /// The context is consumed; dropping it early closes every source it
    /// was joined from.
    async fn build_image(&self, context: ByteSource, params: &BuildParams) -> FryerResult<String>;

    /// Get the human-readable engine name for display
    fn engine_name(&self) -> &str;
}
