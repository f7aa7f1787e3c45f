//! Generic adapter for platforms served by a sync gateway.
//!
//! The gateway exposes one endpoint per platform:
//! `POST {base_url}/platforms/{platform_id}/sync`.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use storesync_core::connections::PlatformConnection;
use storesync_core::errors::{Error, Result};
use storesync_core::sync::{DomainSet, SyncCounts, SyncDomain};

use super::errors::AdapterError;
use super::traits::PlatformAdapter;

/// Default timeout for gateway requests.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GatewaySyncRequest<'a> {
    connection_id: &'a str,
    tenant_id: &'a str,
    credentials_ref: &'a str,
    domains: Vec<SyncDomain>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewaySyncResponse {
    items_processed: u32,
    items_succeeded: u32,
    items_failed: u32,
}

impl From<GatewaySyncResponse> for SyncCounts {
    fn from(r: GatewaySyncResponse) -> Self {
        SyncCounts::new(r.items_processed, r.items_succeeded, r.items_failed)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    items_processed: Option<u32>,
    #[serde(default)]
    items_succeeded: Option<u32>,
    #[serde(default)]
    items_failed: Option<u32>,
}

/// HTTP adapter for one platform behind the sync gateway.
#[derive(Debug, Clone)]
pub struct HttpPlatformAdapter {
    client: reqwest::Client,
    platform_id: String,
    endpoint: String,
}

impl HttpPlatformAdapter {
    /// Create an adapter for `platform_id` behind the gateway at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(base_url: &str, platform_id: &str) -> Result<Self> {
        Self::with_timeout(
            base_url,
            platform_id,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(base_url: &str, platform_id: &str, timeout: Duration) -> Result<Self> {
        let platform_id = platform_id.trim();
        if platform_id.is_empty() {
            return Err(Error::Configuration(
                "Gateway adapter requires a platform id".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: sync_endpoint(base_url, platform_id),
            platform_id: platform_id.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

fn sync_endpoint(base_url: &str, platform_id: &str) -> String {
    format!(
        "{}/platforms/{}/sync",
        base_url.trim().trim_end_matches('/'),
        platform_id
    )
}

/// Maps a gateway response to counts or a classified failure.
fn parse_response(
    platform_id: &str,
    status: StatusCode,
    body: &str,
) -> std::result::Result<SyncCounts, AdapterError> {
    if status.is_success() {
        return serde_json::from_str::<GatewaySyncResponse>(body)
            .map(SyncCounts::from)
            .map_err(|e| AdapterError::Rejected {
                message: format!("invalid gateway response: {}", e),
                counts: None,
            });
    }

    let parsed: GatewayErrorResponse = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .or_else(|| parsed.error.clone())
        .unwrap_or_else(|| {
            let snippet: String = body.chars().take(200).collect();
            if snippet.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, snippet)
            }
        });

    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(AdapterError::RateLimited {
            platform: platform_id.to_string(),
        }),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(AdapterError::Unauthorized(message))
        }
        s if s.is_server_error() => Err(AdapterError::Transport(message)),
        _ => {
            let counts = parsed.items_processed.map(|processed| {
                let succeeded = parsed.items_succeeded.unwrap_or(0);
                let failed = parsed
                    .items_failed
                    .unwrap_or(processed.saturating_sub(succeeded));
                SyncCounts::new(processed, succeeded, failed)
            });
            Err(AdapterError::Rejected { message, counts })
        }
    }
}

#[async_trait]
impl PlatformAdapter for HttpPlatformAdapter {
    fn platform_id(&self) -> &str {
        &self.platform_id
    }

    async fn sync(
        &self,
        connection: &PlatformConnection,
        domains: &DomainSet,
    ) -> std::result::Result<SyncCounts, AdapterError> {
        let request = GatewaySyncRequest {
            connection_id: &connection.id,
            tenant_id: &connection.tenant_id,
            credentials_ref: &connection.credentials_ref,
            domains: domains.iter().copied().collect(),
        };
        debug!(
            "[Gateway] POST {} (connection {})",
            self.endpoint, connection.id
        );

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_response(&self.platform_id, status, &body)
    }
}
