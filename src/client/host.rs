use std::sync::Arc;

use crate::groups::ButtonKind;

use super::cookies::CookieJar;

/// The banner's rendered elements. Only valid once the banner is initialized.
pub trait BannerDom: Send + Sync {
    fn set_button_text(&self, kind: ButtonKind, text: &str);

    fn set_button_visible(&self, kind: ButtonKind, visible: bool);

    fn reorder_buttons(&self, order: &[ButtonKind]);

    /// Pre-check (or clear) the per-category toggles in the preferences panel.
    fn set_service_toggles(&self, checked: bool);

    fn set_banner_message(&self, message: &str);
}

/// An external consent-mode integration (tag managers and the like).
pub trait ConsentSignal: Send + Sync {
    fn signal_granted(&self);
}

/// Gate holding back scripts and iframes until consent.
pub trait ScriptGate: Send + Sync {
    fn unlock_all(&self);
}

/// Everything on the page the applier touches.
#[derive(Clone)]
pub struct BannerHost {
    pub cookies: Arc<dyn CookieJar>,
    pub dom: Arc<dyn BannerDom>,
    pub consent_signal: Arc<dyn ConsentSignal>,
    pub scripts: Arc<dyn ScriptGate>,
}

/// A host with no page behind it: every mutation is logged. Used for
/// headless runs against a live endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHost;

impl BannerDom for TracingHost {
    fn set_button_text(&self, kind: ButtonKind, text: &str) {
        tracing::info!(button = ?kind, text, "dom: button text");
    }

    fn set_button_visible(&self, kind: ButtonKind, visible: bool) {
        tracing::info!(button = ?kind, visible, "dom: button visibility");
    }

    fn reorder_buttons(&self, order: &[ButtonKind]) {
        tracing::info!(?order, "dom: button order");
    }

    fn set_service_toggles(&self, checked: bool) {
        tracing::info!(checked, "dom: preference toggles");
    }

    fn set_banner_message(&self, message: &str) {
        tracing::info!(message, "dom: banner message");
    }
}

impl ConsentSignal for TracingHost {
    fn signal_granted(&self) {
        tracing::info!("consent signal: granted");
    }
}

impl ScriptGate for TracingHost {
    fn unlock_all(&self) {
        tracing::info!("scripts: unlocked");
    }
}
