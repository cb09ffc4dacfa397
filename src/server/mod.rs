pub mod client_ip;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::cascade::{effective_settings, CallerContext};
use crate::error::{GeoConsentError, Result};
use crate::geo::GeoLookup;
use crate::groups::GroupStore;
use crate::resolver::{resolve, ResolvedPolicy};
use crate::settings::BannerSettings;

pub use client_ip::client_ip;

pub const POLICY_PATH: &str = "/api/v1/geo-policy";
pub const SETTINGS_PATH: &str = "/api/v1/settings";

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    pub groups: Arc<dyn GroupStore>,
    pub geo: Arc<dyn GeoLookup>,
    /// The site's raw default settings.
    pub site: Arc<BannerSettings>,
    pub trust_proxy_headers: bool,
}

impl AppState {
    /// Resolve the policy for a visitor address. Inert without groups: the
    /// geo service is not contacted at all.
    pub async fn resolve_policy(&self, ip: Option<IpAddr>) -> ResolvedPolicy {
        if !self.groups.has_groups() {
            return ResolvedPolicy::UseDefault;
        }
        let Some(ip) = ip else {
            tracing::debug!("no client address, using default consent policy");
            return ResolvedPolicy::UseDefault;
        };
        let lookup = self.geo.resolve(ip).await;
        resolve(&lookup, &self.groups.get_groups())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(POLICY_PATH, get(geo_policy))
        .route(SETTINGS_PATH, get(site_settings))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn geo_policy(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let peer = connect_info.map(|ConnectInfo(addr)| addr.ip());
    let ip = client_ip(&headers, peer, state.trust_proxy_headers);
    let policy = state.resolve_policy(ip).await;
    // Per-visitor answer: shared caches must not hand it to someone else.
    ([(header::CACHE_CONTROL, "private, no-store")], Json(policy))
}

#[derive(Debug, Deserialize)]
struct SettingsQuery {
    #[serde(default)]
    context: Option<String>,
}

async fn site_settings(
    State(state): State<AppState>,
    Query(query): Query<SettingsQuery>,
) -> std::result::Result<Json<BannerSettings>, (StatusCode, String)> {
    let caller = match query.context.as_deref() {
        None => CallerContext::Visitor,
        Some(raw) => raw
            .parse::<CallerContext>()
            .map_err(|e| (StatusCode::BAD_REQUEST, e))?,
    };
    let groups = state.groups.get_groups();
    Ok(Json(effective_settings(&state.site, &groups, caller)))
}

/// HTTP server for the policy endpoint.
pub struct PolicyServer {
    state: AppState,
    shutdown_signal: Arc<Notify>,
}

impl PolicyServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            shutdown_signal: Arc::new(Notify::new()),
        }
    }

    /// Serve until `shutdown` is called.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "policy endpoint listening");

        let shutdown = self.shutdown_signal.clone();
        axum::serve(
            listener,
            router(self.state.clone()).into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await
        .map_err(|e| GeoConsentError::Server {
            reason: format!("serve failed on {addr}: {e}"),
        })?;

        tracing::info!("policy endpoint shut down");
        Ok(())
    }

    /// Graceful shutdown.
    pub fn shutdown(&self) {
        self.shutdown_signal.notify_one();
    }
}
