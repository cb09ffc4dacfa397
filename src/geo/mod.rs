pub mod anonymize;
pub mod http;

use std::net::IpAddr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use anonymize::anonymize_ip;

/// Approximate visitor location. Both fields are absent when the lookup failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLookupResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl GeoLookupResult {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn country(code: impl Into<String>) -> Self {
        Self {
            country: Some(code.into()),
            region: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn is_unknown(&self) -> bool {
        self.country.is_none()
    }
}

/// Resolves a visitor address to an approximate location.
///
/// Implementations never fail: every error collapses to
/// [`GeoLookupResult::unknown`].
#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn resolve(&self, ip: IpAddr) -> GeoLookupResult;
}
