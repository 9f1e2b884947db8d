use std::sync::Arc;

use futures::stream::{self, Stream, TryStreamExt};

use super::client::{segment, ArmClient};
use super::error::ArmError;
use super::lro::{PollOptions, Poller};
use super::models::{ContainerGroup, Page};

pub const API_VERSION: &str = "2023-05-01";

pub struct ContainerGroupsClient {
    arm: Arc<ArmClient>,
    poll: PollOptions,
}

impl ContainerGroupsClient {
    pub fn new(arm: Arc<ArmClient>, poll: PollOptions) -> Self {
        Self { arm, poll }
    }

    fn collection_path(resource_group: &str) -> String {
        format!(
            "/resourceGroups/{}/providers/Microsoft.ContainerInstance/containerGroups",
            segment(resource_group)
        )
    }

    fn path(resource_group: &str, name: &str) -> String {
        format!("{}/{}", Self::collection_path(resource_group), segment(name))
    }

    /// PUT the group, wait for provisioning to finish and return the final resource
    pub async fn create_or_update(
        &self,
        resource_group: &str,
        name: &str,
        group: &ContainerGroup,
    ) -> Result<ContainerGroup, ArmError> {
        let path = Self::path(resource_group, name);
        let resp = self.arm.put(&path, API_VERSION, group).await?;

        let resource_url = format!(
            "{}?api-version={}",
            self.arm.subscription_url(&path),
            API_VERSION
        );
        Poller::new(&self.arm, &resp, Some(resource_url), self.poll.clone())
            .poll_until_done()
            .await?;

        self.get(resource_group, name).await
    }

    pub async fn get(&self, resource_group: &str, name: &str) -> Result<ContainerGroup, ArmError> {
        self.arm
            .get(&Self::path(resource_group, name), API_VERSION)
            .await?
            .json()
    }

    pub async fn delete(&self, resource_group: &str, name: &str) -> Result<(), ArmError> {
        let resp = self
            .arm
            .delete(&Self::path(resource_group, name), API_VERSION)
            .await?;
        Poller::new(&self.arm, &resp, None, self.poll.clone())
            .poll_until_done()
            .await
    }

    pub fn list_by_resource_group(&self, resource_group: &str) -> Pager {
        Pager {
            arm: self.arm.clone(),
            next: Some(PageRequest::First(Self::collection_path(resource_group))),
        }
    }
}

enum PageRequest {
    First(String),
    Next(String),
}

/// Walks `nextLink` until ARM stops handing one out
pub struct Pager {
    arm: Arc<ArmClient>,
    next: Option<PageRequest>,
}

impl Pager {
    pub fn more(&self) -> bool {
        self.next.is_some()
    }

    pub async fn next_page(&mut self) -> Result<Vec<ContainerGroup>, ArmError> {
        let resp = match self.next.take() {
            None => return Ok(Vec::new()),
            Some(PageRequest::First(path)) => self.arm.get(&path, API_VERSION).await?,
            Some(PageRequest::Next(url)) => self.arm.get_url(&url).await?,
        };

        let page: Page<ContainerGroup> = resp.json()?;
        self.next = page
            .next_link
            .filter(|link| !link.is_empty())
            .map(PageRequest::Next);
        Ok(page.value)
    }

    /// Every container group across all pages
    pub fn into_stream(self) -> impl Stream<Item = Result<ContainerGroup, ArmError>> {
        stream::try_unfold(self, |mut pager| async move {
            if !pager.more() {
                return Ok(None);
            }
            let items = pager.next_page().await?;
            Ok::<_, ArmError>(Some((
                stream::iter(items.into_iter().map(Ok::<_, ArmError>)),
                pager,
            )))
        })
        .try_flatten()
    }
}
