use anyhow::Result;
use std::io::{self, BufRead, Write};

use super::context::ReproContext;
use crate::cli::{AzureArgs, CleanupArgs};

/// Anything but an explicit "yes" aborts
pub fn confirmed<R: BufRead>(stdin: &mut R) -> Result<bool> {
    let mut input = String::new();
    stdin.read_line(&mut input)?;
    Ok(input.trim() == "yes")
}

pub async fn execute_cleanup(azure: AzureArgs, args: CleanupArgs) -> Result<()> {
    let mut stdin = io::stdin().lock();
    let ctx = ReproContext::new(&azure, &mut stdin)?;
    ctx.log_target();

    let rg = ctx.repro.settings.resource_group.clone();
    if !ctx.repro.resource_groups.check_existence(&rg).await? {
        tracing::info!(resource_group = %rg, "Resource group does not exist (skipping)");
        return Ok(());
    }

    if !args.force {
        eprint!(
            "This will delete resource group '{}' and every container group in it. Are you sure? (yes/no): ",
            rg
        );
        io::stderr().flush()?;
        if !confirmed(&mut stdin)? {
            eprintln!("Aborted.");
            return Ok(());
        }
    }

    tracing::info!("Cleaning up. Deleting resource Group");
    ctx.repro.delete_resource_group().await?;
    tracing::info!(resource_group = %rg, "resource group deleted");
    Ok(())
}
