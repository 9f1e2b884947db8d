use std::sync::Arc;

use super::client::{segment, ArmClient};
use super::error::ArmError;
use super::lro::{PollOptions, Poller};
use super::models::ResourceGroup;

pub const API_VERSION: &str = "2021-04-01";

pub struct ResourceGroupsClient {
    arm: Arc<ArmClient>,
    poll: PollOptions,
}

impl ResourceGroupsClient {
    pub fn new(arm: Arc<ArmClient>, poll: PollOptions) -> Self {
        Self { arm, poll }
    }

    fn path(name: &str) -> String {
        format!("/resourcegroups/{}", segment(name))
    }

    /// HEAD the group: 204 means it exists, 404 means it does not
    pub async fn check_existence(&self, name: &str) -> Result<bool, ArmError> {
        match self.arm.head(&Self::path(name), API_VERSION).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn create_or_update(
        &self,
        name: &str,
        location: &str,
    ) -> Result<ResourceGroup, ArmError> {
        let body = ResourceGroup {
            location: Some(location.to_string()),
            ..Default::default()
        };
        let resp = self.arm.put(&Self::path(name), API_VERSION, &body).await?;
        resp.json()
    }

    /// Delete the group and everything in it, waiting for ARM to finish
    pub async fn delete(&self, name: &str) -> Result<(), ArmError> {
        let resp = self.arm.delete(&Self::path(name), API_VERSION).await?;
        Poller::new(&self.arm, &resp, None, self.poll.clone())
            .poll_until_done()
            .await
    }
}
