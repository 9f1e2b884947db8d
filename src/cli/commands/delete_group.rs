use anyhow::Result;
use std::io;

use super::context::ReproContext;
use crate::cli::{AzureArgs, DeleteGroupArgs};

pub async fn execute_delete_group(azure: AzureArgs, args: DeleteGroupArgs) -> Result<()> {
    let ctx = ReproContext::new(&azure, &mut io::stdin().lock())?;
    ctx.log_target();

    tracing::info!(container_group = %args.name, "Deleting container group");
    ctx.repro.delete_container_group(&args.name).await?;
    tracing::info!(container_group = %args.name, "container group deleted");
    Ok(())
}
