use anyhow::Result;
use std::io;

use super::context::ReproContext;
use crate::cli::{AzureArgs, ListArgs};

pub async fn execute_list(azure: AzureArgs, args: ListArgs) -> Result<()> {
    let ctx = ReproContext::new(&azure, &mut io::stdin().lock())?;
    ctx.log_target();

    for pass in 1..=args.passes {
        tracing::info!(pass, of = args.passes, "listing container groups");
        ctx.repro.list_container_groups().await?;
    }
    Ok(())
}
