use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{GeoConsentError, Result};
use crate::settings::BannerSettings;

/// Name of the per-project configuration directory.
pub const PROJECT_DIR: &str = ".geo-consent";

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the policy endpoint listens on. Default: 127.0.0.1:8080.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// YAML file holding the ordered `location_groups`. Relative paths are
    /// taken from the project root.
    #[serde(default = "default_groups_path")]
    pub groups_path: PathBuf,

    /// How often the server checks the groups file for edits. 0 disables.
    #[serde(default = "default_reload_secs")]
    pub groups_reload_secs: u64,

    /// Take the visitor address from proxy headers instead of the peer.
    #[serde(default)]
    pub trust_proxy_headers: bool,

    #[serde(default)]
    pub geo: GeoServiceConfig,

    /// The site's raw default banner settings, before the override cascade.
    #[serde(default)]
    pub site: BannerSettings,

    #[serde(default)]
    pub client: ClientConfig,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".into()
}
fn default_groups_path() -> PathBuf {
    PathBuf::from(PROJECT_DIR).join("groups.yml")
}
fn default_reload_secs() -> u64 {
    5
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            groups_path: default_groups_path(),
            groups_reload_secs: default_reload_secs(),
            trust_proxy_headers: false,
            geo: GeoServiceConfig::default(),
            site: BannerSettings::default(),
            client: ClientConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load config from a YAML file. Returns default if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|e| GeoConsentError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load config from the project root. Checks `.geo-consent/config.yml`,
    /// then the global `~/.config/geo-consent/config.yml`.
    pub fn load_project(project_root: &Path) -> Result<Self> {
        let project_path = project_root.join(PROJECT_DIR).join("config.yml");
        let path = if project_path.exists() {
            project_path
        } else {
            super::dirs_global().join("config.yml")
        };
        let mut config = Self::load_from(&path)?;
        config.groups_path = config.groups_path_in(project_root);
        Ok(config)
    }

    /// The groups file path, anchored at `project_root` when relative.
    pub fn groups_path_in(&self, project_root: &Path) -> PathBuf {
        if self.groups_path.is_absolute() {
            self.groups_path.clone()
        } else {
            project_root.join(&self.groups_path)
        }
    }

    pub fn groups_reload_interval(&self) -> Option<Duration> {
        (self.groups_reload_secs > 0).then(|| Duration::from_secs(self.groups_reload_secs))
    }
}

/// The external IP-to-location service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoServiceConfig {
    /// Base URL; the anonymized address is appended as the last path segment.
    #[serde(default = "default_geo_url")]
    pub base_url: String,

    /// Request timeout in seconds, clamped to 2..=5. Default: 3.
    #[serde(default = "default_geo_timeout")]
    pub timeout_secs: u64,
}

fn default_geo_url() -> String {
    "http://127.0.0.1:8081/geo".into()
}
fn default_geo_timeout() -> u64 {
    3
}

pub const MIN_GEO_TIMEOUT_SECS: u64 = 2;
pub const MAX_GEO_TIMEOUT_SECS: u64 = 5;

impl Default for GeoServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_geo_url(),
            timeout_secs: default_geo_timeout(),
        }
    }
}

impl GeoServiceConfig {
    /// The bounded lookup timeout.
    pub fn timeout(&self) -> Duration {
        let secs = self
            .timeout_secs
            .clamp(MIN_GEO_TIMEOUT_SECS, MAX_GEO_TIMEOUT_SECS);
        if secs != self.timeout_secs {
            tracing::warn!(
                configured = self.timeout_secs,
                used = secs,
                "geo timeout out of range, clamped"
            );
        }
        Duration::from_secs(secs)
    }
}

/// Browser-side names and lifetimes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Cookie caching the last resolved policy JSON.
    #[serde(default = "default_policy_cookie")]
    pub policy_cookie: String,

    /// Cookie holding the visitor's consent decision.
    #[serde(default = "default_consent_cookie")]
    pub consent_cookie: String,

    /// Lifetime of the policy cache cookie, clamped to 1..=400. Default: 30.
    #[serde(default = "default_cache_ttl_days")]
    pub cache_ttl_days: i64,

    /// Consent categories granted by a synthesized full acceptance.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

fn default_policy_cookie() -> String {
    "geo_consent_policy".into()
}
fn default_consent_cookie() -> String {
    "geo_consent_preferences".into()
}
fn default_cache_ttl_days() -> i64 {
    30
}
fn default_categories() -> Vec<String> {
    vec![
        "necessary".into(),
        "functional".into(),
        "analytics".into(),
        "marketing".into(),
    ]
}

/// Browsers cap cookie lifetimes at 400 days.
pub const MAX_CACHE_TTL_DAYS: i64 = 400;

impl ClientConfig {
    /// The bounded policy cache lifetime in days.
    pub fn policy_cache_days(&self) -> i64 {
        let days = self.cache_ttl_days.clamp(1, MAX_CACHE_TTL_DAYS);
        if days != self.cache_ttl_days {
            tracing::warn!(
                configured = self.cache_ttl_days,
                used = days,
                "policy cache lifetime out of range, clamped"
            );
        }
        days
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            policy_cookie: default_policy_cookie(),
            consent_cookie: default_consent_cookie(),
            cache_ttl_days: default_cache_ttl_days(),
            categories: default_categories(),
        }
    }
}
