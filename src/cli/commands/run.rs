use anyhow::Result;
use std::io;

use super::context::ReproContext;
use crate::cli::{AzureArgs, RunArgs};

pub async fn execute_run(azure: AzureArgs, args: RunArgs) -> Result<()> {
    let mut ctx = ReproContext::new(&azure, &mut io::stdin().lock())?;

    let settings = &mut ctx.repro.settings;
    if let Some(image) = args.image {
        settings.image = image;
    }
    if let Some(count) = args.recreate_count {
        settings.recreate_count = count;
    }
    if let Some(passes) = args.list_passes {
        settings.list_passes = passes;
    }
    settings.keep = args.keep;

    ctx.log_target();
    ctx.repro.run().await
}
