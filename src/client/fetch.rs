use std::time::Duration;

use async_trait::async_trait;

use crate::error::{GeoConsentError, Result};

/// Fetches the visitor's policy from the policy endpoint as raw JSON.
#[async_trait]
pub trait PolicyFetcher: Send + Sync {
    async fn fetch(&self) -> Result<String>;
}

/// Fetcher over HTTP.
pub struct HttpPolicyFetcher {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpPolicyFetcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PolicyFetcher for HttpPolicyFetcher {
    async fn fetch(&self) -> Result<String> {
        let result = tokio::time::timeout(self.timeout, async {
            let response = self
                .client
                .get(&self.endpoint)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| GeoConsentError::PolicyFetch {
                    reason: format!("request failed: {e}"),
                })?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| GeoConsentError::PolicyFetch {
                    reason: format!("read failed: {e}"),
                })?;

            if !status.is_success() {
                return Err(GeoConsentError::Api {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok::<String, GeoConsentError>(body)
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(GeoConsentError::PolicyFetch {
                reason: format!("timed out after {}ms", self.timeout.as_millis()),
            }),
        }
    }
}
