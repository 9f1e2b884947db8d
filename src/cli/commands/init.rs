use anyhow::{bail, Result};

use super::context::{config_path, resolve_endpoint};
use crate::azure::DEFAULT_ENDPOINT;
use crate::cli::config::Config;
use crate::cli::{AzureArgs, InitArgs};

/// Build the config `init` would write; only explicitly chosen values are recorded
pub fn config_from_args(azure: &AzureArgs, args: &InitArgs) -> Config {
    let endpoint = resolve_endpoint(azure, None);
    Config {
        subscription_id: azure.subscription_id.clone(),
        resource_group: azure.resource_group.clone(),
        location: azure.location.clone(),
        image: args.image.clone(),
        endpoint: (endpoint != DEFAULT_ENDPOINT).then_some(endpoint),
        recreate_count: None,
        poll_interval_secs: azure.poll_interval_secs,
    }
}

pub fn execute_init(azure: AzureArgs, args: InitArgs) -> Result<()> {
    let path = config_path(&azure);
    if path.exists() && !args.force {
        bail!("{} already exists. Use --force to overwrite.", path.display());
    }

    let config = config_from_args(&azure, &args);
    config.save_to(&path)?;

    eprintln!("Created {}", path.display());
    if let Some(ref sub) = config.subscription_id {
        eprintln!("  subscription_id: {}", sub);
    }
    if let Some(ref rg) = config.resource_group {
        eprintln!("  resource_group: {}", rg);
    }
    if let Some(ref location) = config.location {
        eprintln!("  location: {}", location);
    }
    eprintln!();
    eprintln!("Next: list-aci-issue run");

    Ok(())
}
