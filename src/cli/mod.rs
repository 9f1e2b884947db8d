pub mod commands;
pub mod config;
pub mod prompt;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "list-aci-issue")]
#[command(about = "Reproduce the Azure Container Instances list-by-resource-group issue")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub azure: AzureArgs,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Defaults to `run`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the resource group and container groups, list twice, clean up
    Run(RunArgs),
    /// List container groups in the resource group
    List(ListArgs),
    /// Delete a single container group
    DeleteGroup(DeleteGroupArgs),
    /// Delete the resource group and everything in it
    Cleanup(CleanupArgs),
    /// Write a config file with the current settings
    Init(InitArgs),
}

/// Connection and placement settings shared by every command
#[derive(clap::Args, Clone, Debug, Default)]
pub struct AzureArgs {
    /// Subscription to run in (prompted for when not given)
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID", global = true)]
    pub subscription_id: Option<String>,

    /// Resource group to create, list and delete [default: test-list-aci]
    #[arg(long, global = true)]
    pub resource_group: Option<String>,

    /// Azure region [default: eastus2]
    #[arg(long, global = true)]
    pub location: Option<String>,

    /// Resource Manager endpoint [default: https://management.azure.com]
    #[arg(long, env = "ARM_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Bearer token for Resource Manager (uses `az login` when absent)
    #[arg(long, env = "AZURE_ACCESS_TOKEN", hide_env_values = true, global = true)]
    pub access_token: Option<String>,

    /// Seconds between polls of long-running operations [default: 5]
    #[arg(long, global = true)]
    pub poll_interval_secs: Option<u64>,

    /// Config file with defaults for the flags above
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// Container image [default: alpine:latest]
    #[arg(long)]
    pub image: Option<String>,

    /// Number of cg-<i> groups to recreate [default: 1]
    #[arg(long)]
    pub recreate_count: Option<u32>,

    /// Number of list calls [default: 2]
    #[arg(long)]
    pub list_passes: Option<u32>,

    /// Leave the resource group in place afterwards
    #[arg(long)]
    pub keep: bool,
}

#[derive(clap::Args, Clone, Debug)]
pub struct ListArgs {
    /// Number of list calls
    #[arg(long, default_value = "1")]
    pub passes: u32,
}

#[derive(clap::Args, Clone, Debug)]
pub struct DeleteGroupArgs {
    /// Container group name
    pub name: String,
}

#[derive(clap::Args, Clone, Debug)]
pub struct CleanupArgs {
    /// Skip confirmation prompt
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Clone, Debug)]
pub struct InitArgs {
    /// Container image to record
    #[arg(long)]
    pub image: Option<String>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}
