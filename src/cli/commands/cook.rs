//! Cook command - build an image from a recipe

use crate::cli::args::CookArgs;
use crate::cli::commands::cook_request;
use crate::config::Config;
use crate::cook::cook;
use crate::error::FryerResult;
use crate::orchestration::{BuildParams, CliImageBuilder};
use crate::ui::{self, UiContext};

/// Execute the cook command
pub async fn execute(args: CookArgs, config: &Config) -> FryerResult<()> {
    let ctx = UiContext::detect();
    let request = cook_request(&args.source, &args.render, config).await?;

    let program = args
        .engine
        .clone()
        .unwrap_or_else(|| config.engine.program.clone());
    let builder = CliImageBuilder::new(program);
    let params = BuildParams {
        tag: args.tag.clone(),
        dockerfile: config.engine.dockerfile.clone(),
        remove_intermediate: config.engine.remove_intermediate && !args.keep_intermediate,
    };

    ui::step_info(&ctx, &format!("Building from {}", args.render.image));
    let image = cook(request, &builder, &params).await?;

    ui::step_ok_detail(&ctx, "Image built", &image);
    println!("{}", image);
    Ok(())
}
