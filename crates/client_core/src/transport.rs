use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, Response};
use shared::{
    error::ApiError,
    protocol::{CreatePrivateLinkRequest, NodeTreeResponse},
};
use url::Url;

use crate::error::TransportError;

/// Loads the hierarchy the user picks nodes from.
#[async_trait]
pub trait NodeSource: Send + Sync {
    async fn fetch_nodes(&self, url: &Url) -> Result<NodeTreeResponse>;
}

/// Issues the link-creation request. Any error is a failed submission.
#[async_trait]
pub trait LinkSubmitter: Send + Sync {
    async fn create_link(
        &self,
        url: &Url,
        request: &CreatePrivateLinkRequest,
    ) -> Result<serde_json::Value>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NodeSource for HttpTransport {
    async fn fetch_nodes(&self, url: &Url) -> Result<NodeTreeResponse> {
        let res = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("failed to request node tree from {url}"))?;
        let tree = ensure_success(res)
            .await?
            .json::<NodeTreeResponse>()
            .await
            .context("malformed node tree response")?;
        Ok(tree)
    }
}

#[async_trait]
impl LinkSubmitter for HttpTransport {
    async fn create_link(
        &self,
        url: &Url,
        request: &CreatePrivateLinkRequest,
    ) -> Result<serde_json::Value> {
        let res = self
            .http
            .post(url.clone())
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await
            .with_context(|| format!("failed to submit link to {url}"))?;
        let body = ensure_success(res)
            .await?
            .json::<serde_json::Value>()
            .await
            .context("link creation response was not JSON")?;
        Ok(body)
    }
}

async fn ensure_success(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let raw = res.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiError>(&raw) {
        Ok(api_error) => api_error.message,
        Err(_) if raw.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => raw,
    };
    Err(TransportError::Status {
        status: status.as_u16(),
        message,
    }
    .into())
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
