//! Bearer tokens for Azure Resource Manager.
//!
//! A token passed in explicitly wins; otherwise the Azure CLI login is used,
//! the same way `az` itself would authenticate.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::Mutex;

use super::error::ArmError;

/// Audience for management-plane tokens
pub const ARM_RESOURCE: &str = "https://management.azure.com/";

/// Tokens this close to expiry are refreshed
const REFRESH_MARGIN_MINUTES: i64 = 5;

#[derive(Clone, Debug)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(exp) => exp - ChronoDuration::minutes(REFRESH_MARGIN_MINUTES) > now,
            None => true,
        }
    }
}

#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self) -> Result<AccessToken, ArmError>;
}

/// Token supplied by the caller (flag or AZURE_ACCESS_TOKEN)
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self) -> Result<AccessToken, ArmError> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_at: None,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    #[serde(default)]
    expires_on: Option<String>,
    #[serde(default, rename = "expires_on")]
    expires_on_unix: Option<i64>,
}

/// Parse the JSON printed by `az account get-access-token`
pub fn parse_cli_token(raw: &str) -> Result<AccessToken, ArmError> {
    let parsed: CliToken = serde_json::from_str(raw)
        .map_err(|e| ArmError::Credential(format!("unexpected az output: {}", e)))?;

    let expires_at = match parsed.expires_on_unix {
        Some(ts) => Utc.timestamp_opt(ts, 0).single(),
        // Older CLIs only report local wall-clock time
        None => parsed.expires_on.as_deref().and_then(|s| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .and_then(|naive| Local.from_local_datetime(&naive).earliest())
                .map(|local| local.with_timezone(&Utc))
        }),
    };

    Ok(AccessToken {
        token: parsed.access_token,
        expires_at,
    })
}

/// Uses the Azure CLI login session (`az login`)
pub struct AzureCliCredential {
    cached: Mutex<Option<AccessToken>>,
}

impl AzureCliCredential {
    pub fn new() -> Self {
        Self {
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<AccessToken, ArmError> {
        let output = Command::new("az")
            .args([
                "account",
                "get-access-token",
                "--resource",
                ARM_RESOURCE,
                "--output",
                "json",
            ])
            .output()
            .await
            .map_err(|e| {
                ArmError::Credential(format!(
                    "failed to execute az command ({}). Is Azure CLI installed?",
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ArmError::Credential(format!(
                "az account get-access-token failed: {}. Run 'az login' first.",
                stderr.trim()
            )));
        }

        parse_cli_token(&String::from_utf8_lossy(&output.stdout))
    }
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    async fn token(&self) -> Result<AccessToken, ArmError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.clone());
            }
        }

        tracing::debug!("requesting management token from Azure CLI");
        let token = self.fetch().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

/// Explicit token when given, Azure CLI otherwise
pub enum DefaultCredential {
    Static(StaticTokenCredential),
    AzureCli(AzureCliCredential),
}

impl DefaultCredential {
    pub fn new(access_token: Option<String>) -> Self {
        match access_token.filter(|t| !t.trim().is_empty()) {
            Some(token) => DefaultCredential::Static(StaticTokenCredential::new(token)),
            None => DefaultCredential::AzureCli(AzureCliCredential::new()),
        }
    }
}

#[async_trait]
impl TokenCredential for DefaultCredential {
    async fn token(&self) -> Result<AccessToken, ArmError> {
        match self {
            DefaultCredential::Static(c) => c.token().await,
            DefaultCredential::AzureCli(c) => c.token().await,
        }
    }
}
