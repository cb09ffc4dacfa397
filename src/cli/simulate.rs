use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::cascade::{effective_settings, CallerContext};
use crate::client::{
    run_page_load, ApplierState, BannerHost, Cookie, CookieJar, HttpPolicyFetcher,
    MemoryCookieJar, TracingHost,
};
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::groups::{GroupStore, LocationGroupCollection};
use crate::server::{POLICY_PATH, SETTINGS_PATH};
use crate::settings::BannerSettings;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct SimulationReport {
    state: String,
    fetches: u32,
    policy: serde_json::Value,
    settings: BannerSettings,
    cookies: Vec<ReportedCookie>,
}

#[derive(Serialize)]
struct ReportedCookie {
    name: String,
    value: String,
    expires: Option<String>,
}

/// Play one headless page load against a running server.
///
/// `cached_policy` seeds the policy cookie, `consent_decided` seeds the
/// consent cookie, mimicking a returning visitor.
pub async fn run_simulate(
    project_root: &Path,
    server: &str,
    cached_policy: Option<&str>,
    consent_decided: bool,
) -> Result<()> {
    let (config, store) = super::load_project(project_root)?;
    let server = server.trim_end_matches('/');

    let initial = match fetch_site_settings(server).await {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(error = %e, "could not read site settings, using local config");
            local_site_settings(&config, &store.get_groups())
        }
    };

    let jar = Arc::new(MemoryCookieJar::new());
    if let Some(raw) = cached_policy {
        jar.set(Cookie::expiring_in_days(
            &config.client.policy_cookie,
            raw,
            config.client.policy_cache_days(),
        ));
    }
    if consent_decided {
        jar.set(Cookie::session(&config.client.consent_cookie, "{}"));
    }

    let host = BannerHost {
        cookies: jar.clone(),
        dom: Arc::new(TracingHost),
        consent_signal: Arc::new(TracingHost),
        scripts: Arc::new(TracingHost),
    };
    let fetcher = Arc::new(HttpPolicyFetcher::new(
        format!("{server}{POLICY_PATH}"),
        FETCH_TIMEOUT,
    ));

    let (settings, applier) = run_page_load(host, fetcher, config.client.clone(), initial).await?;

    let policy = match applier.outcome() {
        Some(outcome) => serde_json::to_value(&outcome.policy)?,
        None => serde_json::Value::Null,
    };
    let report = SimulationReport {
        state: state_name(applier.state()).into(),
        fetches: applier.fetch_count(),
        policy,
        settings,
        cookies: jar
            .all()
            .into_iter()
            .map(|c| ReportedCookie {
                name: c.name,
                value: c.value,
                expires: c.expires.map(|at| at.to_rfc3339()),
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// The settings a visitor page starts from when the server cannot be asked:
/// the configured site defaults read through the override cascade.
pub fn local_site_settings(
    config: &ServiceConfig,
    groups: &LocationGroupCollection,
) -> BannerSettings {
    effective_settings(&config.site, groups, CallerContext::Visitor)
}

async fn fetch_site_settings(server: &str) -> Result<BannerSettings> {
    let url = format!("{server}{SETTINGS_PATH}");
    let response = reqwest::Client::new()
        .get(&url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .map_err(|e| crate::error::GeoConsentError::PolicyFetch {
            reason: format!("{url}: {e}"),
        })?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| crate::error::GeoConsentError::PolicyFetch {
            reason: format!("{url}: {e}"),
        })?;
    if !status.is_success() {
        return Err(crate::error::GeoConsentError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

fn state_name(state: ApplierState) -> &'static str {
    match state {
        ApplierState::NotFetched => "not_fetched",
        ApplierState::CacheHit => "cache_hit",
        ApplierState::Fetching => "fetching",
        ApplierState::Applied => "applied",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::init::sample_groups;

    #[test]
    fn test_local_fallback_keeps_forced_deny() {
        let config = ServiceConfig::default();
        assert!(config.site.default_allow);

        let settings = local_site_settings(&config, &sample_groups());
        assert!(!settings.default_allow);
        assert!(settings.show_banner);
    }

    #[test]
    fn test_local_fallback_without_groups_is_raw() {
        let config = ServiceConfig::default();
        let settings = local_site_settings(&config, &LocationGroupCollection::default());
        assert_eq!(settings, config.site);
    }
}
