//! Context command - write a build context tar stream

use crate::cli::args::ContextArgs;
use crate::cli::commands::cook_request;
use crate::config::Config;
use crate::cook::assemble;
use crate::error::{FryerError, FryerResult};
use crate::ui::{self, UiContext};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Execute the context command
pub async fn execute(args: ContextArgs, config: &Config) -> FryerResult<()> {
    let ctx = UiContext::detect();
    let request = cook_request(&args.source, &args.render, config).await?;
    let mut reader = assemble(request).await?;

    let output = args.output.clone();
    let written = tokio::task::spawn_blocking(move || -> FryerResult<u64> {
        let copy_err =
            |e| FryerError::io(format!("writing build context to {}", output.display()), e);
        if output == Path::new("-") {
            let mut stdout = std::io::stdout().lock();
            let n = std::io::copy(&mut reader, &mut stdout).map_err(copy_err)?;
            stdout.flush().map_err(copy_err)?;
            Ok(n)
        } else {
            let mut file = std::fs::File::create(&output).map_err(copy_err)?;
            std::io::copy(&mut reader, &mut file).map_err(copy_err)
        }
    })
    .await
    .map_err(|e| FryerError::Internal(format!("context writer failed: {}", e)))??;

    debug!(bytes = written, "Build context written");
    if args.output != Path::new("-") {
        ui::step_ok_detail(
            &ctx,
            "Build context written",
            &args.output.display().to_string(),
        );
    }
    Ok(())
}
