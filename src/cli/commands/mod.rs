//! CLI command implementations

pub mod config;
pub mod context;
pub mod cook;
pub mod fetch;

pub use config::execute as config;
pub use context::execute as context;
pub use cook::execute as cook;
pub use fetch::execute as fetch;

use crate::cli::args::{RenderArgs, SourceArgs};
use crate::config::Config;
use crate::context::Variables;
use crate::cook::CookRequest;
use crate::error::FryerResult;
use crate::recipe::RecipeFile;
use crate::source::Fetcher;
use std::path::PathBuf;

/// Fetcher honoring the configured redirect budget
pub(crate) fn fetcher(config: &Config) -> Fetcher {
    Fetcher::with_max_redirects(config.fetch.max_redirects)
}

pub(crate) fn cache_root(args: &SourceArgs, config: &Config) -> PathBuf {
    args.cache_dir.clone().unwrap_or_else(|| config.cache_dir())
}

/// Load the recipe and resolve everything a context needs
pub(crate) async fn cook_request(
    source: &SourceArgs,
    render: &RenderArgs,
    config: &Config,
) -> FryerResult<CookRequest> {
    let file = RecipeFile::load(&source.recipe).await?;

    let mut variables = Variables::new(render.image.clone());
    if let Some(flavour) = &render.flavour {
        variables = variables.with_flavour(flavour.clone());
    }
    if let Some(distribution) = &render.distribution {
        variables = variables.with_distribution(distribution.clone());
    }

    Ok(CookRequest {
        variables,
        recipe: file.recipe(),
        source: file.source.as_ref().map(|s| s.to_source()).transpose()?,
        cache_root: cache_root(source, config),
        fetcher: fetcher(config),
    })
}
