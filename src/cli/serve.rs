use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::error::{GeoConsentError, Result};
use crate::geo::http::HttpGeoLookup;
use crate::groups::file::spawn_reloader;
use crate::server::{AppState, PolicyServer, POLICY_PATH};

/// Run the policy endpoint until Ctrl+C.
pub async fn run_serve(project_root: &Path, bind: Option<&str>) -> Result<()> {
    let (config, store) = super::load_project(project_root)?;
    let store = Arc::new(store);
    let geo = HttpGeoLookup::new(&config.geo.base_url, config.geo.timeout())?;

    let reloader = config
        .groups_reload_interval()
        .map(|every| spawn_reloader(store.clone(), every));

    let state = AppState {
        groups: store.clone(),
        geo: Arc::new(geo),
        site: Arc::new(config.site.clone()),
        trust_proxy_headers: config.trust_proxy_headers,
    };

    let bind_addr = bind.unwrap_or(&config.bind_addr);
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| GeoConsentError::Server {
            reason: format!("failed to bind {bind_addr}: {e}"),
        })?;

    eprintln!(
        "geo-consent: serving {} on http://{} ({} group(s) from {})",
        POLICY_PATH,
        listener.local_addr()?,
        store.snapshot().len(),
        store.path().display()
    );
    eprintln!("Press Ctrl+C to stop.\n");

    let server = Arc::new(PolicyServer::new(state));
    let stopper = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("geo-consent: shutting down");
            stopper.shutdown();
        }
    });

    let result = server.serve(listener).await;

    if let Some(handle) = reloader {
        handle.abort();
    }
    result
}
