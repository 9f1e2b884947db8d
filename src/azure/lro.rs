//! Long-running operation polling.
//!
//! ARM reports progress of PUT/DELETE operations through one of three channels,
//! checked in this order: the `Azure-AsyncOperation` header, the `Location`
//! header, or the `provisioningState` of the resource itself.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;

use super::client::{self, ArmClient, ArmResponse};
use super::error::{ArmError, ErrorBody};

pub const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";
pub const LOCATION_HEADER: &str = "location";

#[derive(Clone, Debug)]
pub struct PollOptions {
    /// Delay between polls when ARM sends no Retry-After
    pub interval: Duration,
    /// Give up after this long
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum OperationState {
    Succeeded,
    Failed,
    Canceled,
    Running,
}

impl OperationState {
    pub fn parse(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "succeeded" => OperationState::Succeeded,
            "failed" => OperationState::Failed,
            "canceled" | "cancelled" => OperationState::Canceled,
            _ => OperationState::Running,
        }
    }
}

#[derive(Deserialize)]
struct OperationStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, PartialEq, Eq)]
enum PollSource {
    AsyncOperation(String),
    Location(String),
    ProvisioningState(String),
    Done,
}

pub struct Poller<'a> {
    client: &'a ArmClient,
    source: PollSource,
    options: PollOptions,
    initial_delay: Option<Duration>,
}

impl<'a> Poller<'a> {
    /// `resource_url` enables provisioningState polling for PUTs that return
    /// neither operation header.
    pub fn new(
        client: &'a ArmClient,
        initial: &ArmResponse,
        resource_url: Option<String>,
        options: PollOptions,
    ) -> Self {
        Self {
            client,
            source: pick_source(initial, resource_url),
            options,
            initial_delay: retry_after(initial),
        }
    }

    pub async fn poll_until_done(self) -> Result<(), ArmError> {
        let deadline = Instant::now() + self.options.timeout;
        let mut delay = self.initial_delay.unwrap_or(self.options.interval);

        loop {
            let (state, message, next_delay) = match &self.source {
                PollSource::Done => return Ok(()),
                PollSource::AsyncOperation(url) => {
                    let resp = self.client.get_url(url).await?;
                    let op: OperationStatus = resp.json()?;
                    let state = op
                        .status
                        .as_deref()
                        .map(OperationState::parse)
                        .unwrap_or(OperationState::Running);
                    let message = op.error.and_then(|e| e.message).unwrap_or_default();
                    (state, message, retry_after(&resp))
                }
                PollSource::Location(url) => {
                    let resp = self.client.get_url(url).await?;
                    let state = if resp.status.as_u16() == 202 {
                        OperationState::Running
                    } else {
                        OperationState::Succeeded
                    };
                    (state, String::new(), retry_after(&resp))
                }
                PollSource::ProvisioningState(url) => {
                    let resp = self.client.get_url(url).await?;
                    let state = provisioning_state(&resp.body)
                        .map(|s| OperationState::parse(&s))
                        .unwrap_or(OperationState::Succeeded);
                    (state, String::new(), retry_after(&resp))
                }
            };

            match state {
                OperationState::Succeeded => return Ok(()),
                OperationState::Failed | OperationState::Canceled => {
                    return Err(ArmError::OperationFailed {
                        status: format!("{:?}", state),
                        message,
                    })
                }
                OperationState::Running => {}
            }

            if Instant::now() + delay > deadline {
                return Err(ArmError::Timeout(format!(
                    "operation still running after {:?}",
                    self.options.timeout
                )));
            }
            tracing::debug!(delay_ms = delay.as_millis() as u64, "operation in progress");
            tokio::time::sleep(delay).await;
            delay = next_delay.unwrap_or(self.options.interval);
        }
    }
}

fn pick_source(initial: &ArmResponse, resource_url: Option<String>) -> PollSource {
    if let Some(url) = initial.header(ASYNC_OPERATION_HEADER) {
        return PollSource::AsyncOperation(url.to_string());
    }
    if initial.status.as_u16() == 202 {
        if let Some(url) = initial.header(LOCATION_HEADER) {
            return PollSource::Location(url.to_string());
        }
    }
    match (resource_url, provisioning_state(&initial.body)) {
        (Some(url), Some(state)) if OperationState::parse(&state) == OperationState::Running => {
            PollSource::ProvisioningState(url)
        }
        _ => PollSource::Done,
    }
}

fn retry_after(resp: &ArmResponse) -> Option<Duration> {
    client::retry_after(&resp.headers)
}

fn provisioning_state(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/properties/provisioningState")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
