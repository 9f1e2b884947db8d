use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use super::auth::TokenCredential;
use super::error::ArmError;
use super::retry::{with_retry, RetryConfig};

/// Public-cloud management endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Fully buffered ARM response
#[derive(Debug)]
pub struct ArmResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl ArmResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ArmError> {
        serde_json::from_str(&self.body).map_err(|e| ArmError::Decode(e.to_string()))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Azure Resource Manager client scoped to one subscription
pub struct ArmClient {
    http: Client,
    endpoint: String,
    subscription_id: String,
    credential: Arc<dyn TokenCredential>,
    retry: RetryConfig,
}

impl ArmClient {
    pub fn new(
        endpoint: &str,
        subscription_id: &str,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, ArmError> {
        let http = Client::builder()
            .user_agent(concat!("list-aci-issue/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            subscription_id: subscription_id.to_string(),
            credential,
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Absolute URL for a path below `/subscriptions/{id}`
    pub fn subscription_url(&self, path: &str) -> String {
        format!(
            "{}/subscriptions/{}{}",
            self.endpoint,
            urlencoding::encode(&self.subscription_id),
            path
        )
    }

    pub async fn head(&self, path: &str, api_version: &str) -> Result<ArmResponse, ArmError> {
        self.send(Method::HEAD, &self.subscription_url(path), Some(api_version), None::<&()>)
            .await
    }

    pub async fn get(&self, path: &str, api_version: &str) -> Result<ArmResponse, ArmError> {
        self.send(Method::GET, &self.subscription_url(path), Some(api_version), None::<&()>)
            .await
    }

    /// GET an absolute URL handed out by ARM (nextLink, operation status)
    pub async fn get_url(&self, url: &str) -> Result<ArmResponse, ArmError> {
        self.send(Method::GET, url, None, None::<&()>).await
    }

    pub async fn put<B: Serialize>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<ArmResponse, ArmError> {
        self.send(Method::PUT, &self.subscription_url(path), Some(api_version), Some(body))
            .await
    }

    pub async fn delete(&self, path: &str, api_version: &str) -> Result<ArmResponse, ArmError> {
        self.send(Method::DELETE, &self.subscription_url(path), Some(api_version), None::<&()>)
            .await
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        url: &str,
        api_version: Option<&str>,
        body: Option<&B>,
    ) -> Result<ArmResponse, ArmError> {
        with_retry(&self.retry, || {
            self.send_once(method.clone(), url, api_version, body)
        })
        .await
    }

    async fn send_once<B: Serialize>(
        &self,
        method: Method,
        url: &str,
        api_version: Option<&str>,
        body: Option<&B>,
    ) -> Result<ArmResponse, ArmError> {
        let token = self.credential.token().await?;

        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&token.token);
        if let Some(version) = api_version {
            request = request.query(&[("api-version", version)]);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, url, "ARM request");
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        tracing::debug!(%method, url, status = status.as_u16(), "ARM response");

        if !status.is_success() {
            return Err(ArmError::from_response(status, &body)
                .with_retry_after(retry_after(&headers)));
        }

        Ok(ArmResponse {
            status,
            headers,
            body,
        })
    }
}

/// `Retry-After` in whole seconds, the only form ARM sends
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Percent-encode one path segment (resource group or resource name)
pub fn segment(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}
