//! Build context assembly and submission
//!
//! Fetching, hashing and decompression are blocking, so each request runs
//! its source work on a blocking worker. Several cooks in one process can
//! therefore fetch different sources concurrently.

use crate::config::scratch_dir_for;
use crate::context::{BuildContext, Variables};
use crate::error::{FryerError, FryerResult};
use crate::orchestration::{BuildParams, ImageBuilder};
use crate::recipe::Recipe;
use crate::source::{Fetcher, Source, SourceArchive};
use crate::stream::JoinedReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One build context request
#[derive(Clone)]
pub struct CookRequest {
    pub variables: Variables,
    pub recipe: Recipe,
    pub source: Option<Source>,

    /// Root under which each source gets its own scratch directory
    pub cache_root: PathBuf,

    pub fetcher: Fetcher,
}

/// A source that has been validated or fetched into its scratch directory
pub struct PreparedSource {
    pub archive: SourceArchive,
    pub cachekey: String,
    pub local_path: PathBuf,
}

/// Validate-or-fetch a source on a blocking worker
pub async fn prepare_source(
    source: Source,
    cache_root: PathBuf,
    fetcher: Fetcher,
) -> FryerResult<PreparedSource> {
    run_blocking(move || {
        let archive = open_source(&source, &cache_root, fetcher)?;
        let cachekey = archive.cachekey()?;
        let local_path = archive.cache().local_path();
        debug!(url = %source.url(), cachekey = %cachekey, "Source ready");
        Ok(PreparedSource {
            archive,
            cachekey,
            local_path,
        })
    })
    .await
}

/// Render the build files and open the full context stream
pub async fn assemble(request: CookRequest) -> FryerResult<JoinedReader> {
    run_blocking(move || {
        let CookRequest {
            variables,
            recipe,
            source,
            cache_root,
            fetcher,
        } = request;

        let archive = source
            .as_ref()
            .map(|s| open_source(s, &cache_root, fetcher))
            .transpose()?;

        BuildContext::new(variables, recipe, archive).tar_io()
    })
    .await
}

/// Assemble the context and hand it to the image builder
pub async fn cook(
    request: CookRequest,
    builder: &dyn ImageBuilder,
    params: &BuildParams,
) -> FryerResult<String> {
    let context = assemble(request).await?;
    info!(engine = builder.engine_name(), "Submitting build context");
    let image = builder.build_image(Box::new(context), params).await?;
    info!(image = %image, "Image built");
    Ok(image)
}

fn open_source(source: &Source, cache_root: &Path, fetcher: Fetcher) -> FryerResult<SourceArchive> {
    let scratch = scratch_dir_for(cache_root, source.url());
    std::fs::create_dir_all(&scratch).map_err(|e| {
        FryerError::io(format!("creating scratch dir {}", scratch.display()), e)
    })?;
    Ok(source.build_cache(scratch, fetcher))
}

async fn run_blocking<T, F>(f: F) -> FryerResult<T>
where
    F: FnOnce() -> FryerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FryerError::Internal(format!("blocking task failed: {}", e)))?
}
