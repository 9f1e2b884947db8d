//! The reproduction sequence: ensure the resource group, create container
//! groups, list them twice, tear everything down.

use std::pin::pin;

use anyhow::{Context, Result};
use futures::TryStreamExt;
use rand::Rng;
use tracing::info;

use crate::azure::{ContainerGroup, ContainerGroupsClient, ResourceGroupsClient};
use crate::report;

pub const DEFAULT_RESOURCE_GROUP: &str = "test-list-aci";
pub const DEFAULT_LOCATION: &str = "eastus2";
pub const DEFAULT_IMAGE: &str = "alpine:latest";

#[derive(Clone, Debug)]
pub struct ReproSettings {
    pub resource_group: String,
    pub location: String,
    pub image: String,
    /// How many `cg-<i>` groups to (re)create
    pub recreate_count: u32,
    /// How many times to list the resource group
    pub list_passes: u32,
    /// Skip the final resource group deletion
    pub keep: bool,
}

impl Default for ReproSettings {
    fn default() -> Self {
        Self {
            resource_group: DEFAULT_RESOURCE_GROUP.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            recreate_count: 1,
            list_passes: 2,
            keep: false,
        }
    }
}

/// Name for the group created fresh on every run
pub fn brand_new_group_name() -> String {
    format!("cg-{}", rand::thread_rng().gen_range(0..i64::MAX))
}

/// Stable names, so reruns hit the update path of an existing group
pub fn recreated_group_name(index: u32) -> String {
    format!("cg-{}", index)
}

fn pass_label(pass: u32) -> String {
    match pass {
        0 => "Once".to_string(),
        1 => "Twice".to_string(),
        n => format!("{} times", n + 1),
    }
}

pub struct Repro {
    pub resource_groups: ResourceGroupsClient,
    pub container_groups: ContainerGroupsClient,
    pub settings: ReproSettings,
}

impl Repro {
    pub fn new(
        resource_groups: ResourceGroupsClient,
        container_groups: ContainerGroupsClient,
        settings: ReproSettings,
    ) -> Self {
        Self {
            resource_groups,
            container_groups,
            settings,
        }
    }

    pub async fn run(&self) -> Result<()> {
        self.ensure_resource_group().await?;

        info!("Create brand new container group");
        self.create_container_group(&brand_new_group_name()).await?;

        info!("Recreate container groups");
        for i in 0..self.settings.recreate_count {
            let name = recreated_group_name(i);
            self.create_container_group(&name).await?;
            info!("container group {} has been created", name);
        }

        for pass in 0..self.settings.list_passes {
            info!("Calling GetContainerGroupList {}", pass_label(pass));
            self.list_container_groups().await?;
        }

        if self.settings.keep {
            info!(
                resource_group = %self.settings.resource_group,
                "Keeping resource group; run `list-aci-issue cleanup` to delete it"
            );
            return Ok(());
        }

        info!("Cleaning up. Deleting resource Group");
        self.delete_resource_group().await
    }

    pub async fn ensure_resource_group(&self) -> Result<()> {
        let rg = &self.settings.resource_group;
        let exists = self
            .resource_groups
            .check_existence(rg)
            .await
            .with_context(|| format!("failed to check rg: {}", rg))?;

        if exists {
            info!("resources group already exist. Skipping creating new one");
            return Ok(());
        }

        let created = self
            .resource_groups
            .create_or_update(rg, &self.settings.location)
            .await
            .with_context(|| format!("failed to create rg: {}", rg))?;
        info!(
            "resources group created: {}",
            created.id.as_deref().unwrap_or(rg)
        );
        Ok(())
    }

    pub async fn create_container_group(&self, name: &str) -> Result<ContainerGroup> {
        let spec = ContainerGroup::repro_spec(name, &self.settings.location, &self.settings.image);
        self.container_groups
            .create_or_update(&self.settings.resource_group, name, &spec)
            .await
            .with_context(|| format!("failed to create container group {}", name))
    }

    /// Log a summary of every group in the resource group; returns how many were seen
    pub async fn list_container_groups(&self) -> Result<usize> {
        let mut groups = pin!(self
            .container_groups
            .list_by_resource_group(&self.settings.resource_group)
            .into_stream());

        let mut seen = 0;
        while let Some(group) = groups
            .try_next()
            .await
            .context("failed to advance page")?
        {
            info!("{}", report::summarize(&group));
            seen += 1;
        }
        info!(count = seen, "container groups listed");
        Ok(seen)
    }

    pub async fn delete_container_group(&self, name: &str) -> Result<()> {
        self.container_groups
            .delete(&self.settings.resource_group, name)
            .await
            .with_context(|| format!("failed to delete container group {}", name))
    }

    pub async fn delete_resource_group(&self) -> Result<()> {
        let rg = &self.settings.resource_group;
        self.resource_groups
            .delete(rg)
            .await
            .with_context(|| format!("failed to delete rg: {}", rg))
    }
}
