use anyhow::{bail, Result};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::azure::{
    ArmClient, ContainerGroupsClient, DefaultCredential, PollOptions, ResourceGroupsClient,
    DEFAULT_ENDPOINT,
};
use crate::cli::config::{load_optional, Config, CONFIG_FILENAME};
use crate::cli::prompt::enter_input;
use crate::cli::AzureArgs;
use crate::repro::{
    Repro, ReproSettings, DEFAULT_IMAGE, DEFAULT_LOCATION, DEFAULT_RESOURCE_GROUP,
};

const SUBSCRIPTION_REQUIRED: &str = "SubscriptionID input is mandatory";

pub fn config_path(args: &AzureArgs) -> PathBuf {
    args.config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

/// Flag/env first, then config file, then the interactive prompt
pub fn resolve_subscription<R: BufRead>(
    arg: Option<String>,
    config: Option<&Config>,
    stdin: &mut R,
) -> Result<String> {
    let subscription = arg
        .or_else(|| config.and_then(|c| c.subscription_id.clone()))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| enter_input("SubscriptionID", stdin));

    let subscription = subscription.trim().to_string();
    if subscription.is_empty() {
        bail!(SUBSCRIPTION_REQUIRED);
    }
    Ok(subscription)
}

/// Merge flags over config over defaults; run-only knobs keep their defaults
pub fn resolve_settings(args: &AzureArgs, config: Option<&Config>) -> ReproSettings {
    let defaults = ReproSettings::default();
    ReproSettings {
        resource_group: args
            .resource_group
            .clone()
            .or_else(|| config.and_then(|c| c.resource_group.clone()))
            .unwrap_or_else(|| DEFAULT_RESOURCE_GROUP.to_string()),
        location: args
            .location
            .clone()
            .or_else(|| config.and_then(|c| c.location.clone()))
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
        image: config
            .and_then(|c| c.image.clone())
            .unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        recreate_count: config
            .and_then(|c| c.recreate_count)
            .unwrap_or(defaults.recreate_count),
        ..defaults
    }
}

pub fn resolve_poll_options(args: &AzureArgs, config: Option<&Config>) -> PollOptions {
    let mut options = PollOptions::default();
    if let Some(secs) = args
        .poll_interval_secs
        .or_else(|| config.and_then(|c| c.poll_interval_secs))
    {
        options.interval = Duration::from_secs(secs);
    }
    options
}

pub fn resolve_endpoint(args: &AzureArgs, config: Option<&Config>) -> String {
    args.endpoint
        .clone()
        .or_else(|| config.and_then(|c| c.endpoint.clone()))
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
}

/// Everything a command needs to talk to Azure
pub struct ReproContext {
    pub subscription_id: String,
    pub endpoint: String,
    pub repro: Repro,
}

impl ReproContext {
    pub fn new<R: BufRead>(args: &AzureArgs, stdin: &mut R) -> Result<Self> {
        let config = load_optional(config_path(args))?;
        Self::with_config(args, config.as_ref(), stdin)
    }

    pub fn with_config<R: BufRead>(
        args: &AzureArgs,
        config: Option<&Config>,
        stdin: &mut R,
    ) -> Result<Self> {
        let subscription_id = resolve_subscription(args.subscription_id.clone(), config, stdin)?;
        let endpoint = resolve_endpoint(args, config);
        let poll = resolve_poll_options(args, config);

        let credential = Arc::new(DefaultCredential::new(args.access_token.clone()));
        let arm = Arc::new(ArmClient::new(&endpoint, &subscription_id, credential)?);

        let repro = Repro::new(
            ResourceGroupsClient::new(arm.clone(), poll.clone()),
            ContainerGroupsClient::new(arm, poll),
            resolve_settings(args, config),
        );
        tracing::info!("clients are ready");

        Ok(Self {
            subscription_id,
            endpoint,
            repro,
        })
    }

    pub fn log_target(&self) {
        tracing::info!(
            subscription = %self.subscription_id,
            endpoint = %self.endpoint,
            resource_group = %self.repro.settings.resource_group,
            location = %self.repro.settings.location,
            "target"
        );
    }
}
