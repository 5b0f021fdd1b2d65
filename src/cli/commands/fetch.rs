//! Fetch command - validate or download a source into the cache

use crate::cli::args::FetchArgs;
use crate::cli::commands::{cache_root, fetcher};
use crate::config::Config;
use crate::cook::prepare_source;
use crate::error::{FryerError, FryerResult};
use crate::recipe::RecipeFile;
use crate::source::{Source, SourceOptions};
use crate::ui::{self, UiContext};

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> FryerResult<()> {
    let ctx = UiContext::detect();

    let source = match args.url {
        Some(url) => Source::new(
            &url,
            SourceOptions {
                checksum: args.checksum,
                extension: args.extension,
                ..Default::default()
            },
        )?,
        None => {
            let file = RecipeFile::load(&args.source.recipe).await?;
            let declared = file.source.ok_or_else(|| FryerError::RecipeInvalid {
                path: args.source.recipe.clone(),
                reason: "no [source] section".to_string(),
            })?;
            declared.to_source()?
        }
    };

    let url = source.url().to_string();
    let had_checksum = source.checksum().is_some();
    let cache_root = cache_root(&args.source, config);
    let prepared = match prepare_source(source, cache_root, fetcher(config)).await {
        Ok(prepared) => prepared,
        Err(e) => {
            ui::step_error_detail(&ctx, "Fetch failed", &url);
            return Err(e);
        }
    };

    ui::step_ok_detail(&ctx, "Source ready", &url);
    ui::key_value(&ctx, "kind", &prepared.archive.kind().to_string());
    ui::key_value(&ctx, "path", &prepared.local_path.display().to_string());
    if !had_checksum {
        ui::step_warn_hint(
            &ctx,
            "No checksum configured, trusting the downloaded file",
            &format!("Pin it with checksum = \"sha256:{}\"", prepared.cachekey),
        );
    }

    // The key is the only stdout output, so scripts can capture it
    println!("{}", prepared.cachekey);
    Ok(())
}
