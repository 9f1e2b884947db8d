//! Azure Resource Manager access: credentials, transport, operation polling
//! and the two resource clients the repro needs.

pub mod auth;
pub mod client;
pub mod container_groups;
pub mod error;
pub mod lro;
pub mod models;
pub mod resource_groups;
pub mod retry;

pub use auth::{AzureCliCredential, DefaultCredential, StaticTokenCredential, TokenCredential};
pub use client::{ArmClient, DEFAULT_ENDPOINT};
pub use container_groups::{ContainerGroupsClient, Pager};
pub use error::ArmError;
pub use lro::PollOptions;
pub use models::{ContainerGroup, ResourceGroup};
pub use resource_groups::ResourceGroupsClient;
pub use retry::RetryConfig;
