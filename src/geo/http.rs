use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{GeoConsentError, Result};

use super::{anonymize_ip, GeoLookup, GeoLookupResult};

/// Body returned by the geolocation service. Field names vary between
/// providers and some send several spellings at once, so each is read
/// separately and the most specific one present wins.
#[derive(Debug, Deserialize)]
struct GeoServiceResponse {
    #[serde(default)]
    country_iso: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    region_code: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

impl GeoServiceResponse {
    fn into_lookup(self) -> GeoLookupResult {
        GeoLookupResult {
            country: [self.country_iso, self.country_code, self.country]
                .into_iter()
                .find_map(normalize),
            region: [self.region_code, self.region]
                .into_iter()
                .find_map(normalize),
        }
    }
}

/// Geo lookup over HTTP: `GET {base_url}/{anonymized_ip}`.
pub struct HttpGeoLookup {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpGeoLookup {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("geo-consent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeoConsentError::LookupUnavailable {
                reason: format!("http client init failed: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The lookup URL for a visitor. The address is anonymized here so no
    /// caller can leak a full IP to the service.
    pub fn lookup_url(&self, ip: IpAddr) -> String {
        format!("{}/{}", self.base_url, anonymize_ip(ip))
    }

    /// Perform the lookup, surfacing the failure reason.
    pub async fn try_resolve(&self, ip: IpAddr) -> Result<GeoLookupResult> {
        let url = self.lookup_url(ip);

        let result = tokio::time::timeout(self.timeout, async {
            let response = self.client.get(&url).send().await.map_err(|e| {
                GeoConsentError::LookupUnavailable {
                    reason: format!("request failed: {e}"),
                }
            })?;

            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|e| GeoConsentError::LookupUnavailable {
                    reason: format!("read failed: {e}"),
                })?;

            if status != reqwest::StatusCode::OK {
                return Err(GeoConsentError::Api {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).chars().take(200).collect(),
                });
            }
            if body.iter().all(u8::is_ascii_whitespace) {
                return Err(GeoConsentError::LookupUnavailable {
                    reason: "empty response body".into(),
                });
            }

            let parsed: GeoServiceResponse = serde_json::from_slice(&body).map_err(|e| {
                GeoConsentError::LookupUnavailable {
                    reason: format!("invalid response JSON: {e}"),
                }
            })?;

            Ok::<GeoLookupResult, GeoConsentError>(parsed.into_lookup())
        })
        .await;

        let lookup = match result {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(GeoConsentError::LookupUnavailable {
                    reason: format!("timed out after {}ms", self.timeout.as_millis()),
                })
            }
        };

        if lookup.country.is_none() {
            return Err(GeoConsentError::LookupUnavailable {
                reason: "response carried no country".into(),
            });
        }
        Ok(lookup)
    }
}

#[async_trait]
impl GeoLookup for HttpGeoLookup {
    async fn resolve(&self, ip: IpAddr) -> GeoLookupResult {
        match self.try_resolve(ip).await {
            Ok(lookup) => {
                tracing::debug!(
                    country = ?lookup.country,
                    region = ?lookup.region,
                    "geo lookup resolved"
                );
                lookup
            }
            Err(e) => {
                tracing::warn!(error = %e, "geo lookup failed, treating visitor as unknown");
                GeoLookupResult::unknown()
            }
        }
    }
}

fn normalize(code: Option<String>) -> Option<String> {
    code.map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
}
