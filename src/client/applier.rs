use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use crate::config::ClientConfig;
use crate::error::{GeoConsentError, Result};
use crate::resolver::ResolvedPolicy;
use crate::settings::BannerSettings;

use super::apply::{plan_apply, ApplyPlan, ClientAppliedSnapshot, ConsentPreferences};
use super::cookies::Cookie;
use super::fetch::PolicyFetcher;
use super::host::BannerHost;
use super::ready::InitSignal;

/// Where the applier is in its one pass per page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplierState {
    NotFetched,
    CacheHit,
    Fetching,
    Applied,
}

/// The policy that was applied and what applying it did.
#[derive(Debug, Clone)]
pub struct AppliedOutcome {
    pub policy: ResolvedPolicy,
    pub plan: ApplyPlan,
}

#[derive(Default)]
struct DomSteps {
    buttons: AtomicBool,
    order: AtomicBool,
    toggles: AtomicBool,
    message: AtomicBool,
}

/// Returns true the first time it is called for `flag`.
fn first_time(flag: &AtomicBool) -> bool {
    !flag.swap(true, Ordering::SeqCst)
}

/// Fetch-or-reuse the visitor's policy and apply it to the banner, once.
pub struct PolicyApplier {
    host: BannerHost,
    fetcher: Arc<dyn PolicyFetcher>,
    config: ClientConfig,
    snapshot: ClientAppliedSnapshot,
    state: Mutex<ApplierState>,
    outcome: OnceCell<AppliedOutcome>,
    dom_steps: DomSteps,
    fetches: AtomicU32,
}

impl PolicyApplier {
    /// Create the applier, capturing `initial` as the page's snapshot.
    pub fn new(
        host: BannerHost,
        fetcher: Arc<dyn PolicyFetcher>,
        config: ClientConfig,
        initial: &BannerSettings,
    ) -> Self {
        Self {
            host,
            fetcher,
            config,
            snapshot: ClientAppliedSnapshot::capture(initial),
            state: Mutex::new(ApplierState::NotFetched),
            outcome: OnceCell::new(),
            dom_steps: DomSteps::default(),
            fetches: AtomicU32::new(0),
        }
    }

    pub fn state(&self) -> ApplierState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> &ClientAppliedSnapshot {
        &self.snapshot
    }

    /// Number of endpoint requests made. At most one per page load.
    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// The applied outcome, once resolution has finished.
    pub fn outcome(&self) -> Option<&AppliedOutcome> {
        self.outcome.get()
    }

    fn transition(&self, next: ApplierState) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        tracing::debug!(from = ?*state, to = ?next, "applier state");
        *state = next;
    }

    /// The banner's resolution hook: resolve the policy, apply the non-DOM
    /// effects, and return the settings the banner should finalize with.
    /// Runs once; later calls return the same settings.
    pub async fn resolve_settings(&self) -> BannerSettings {
        self.resolve().await.plan.settings.clone()
    }

    async fn resolve(&self) -> &AppliedOutcome {
        self.outcome.get_or_init(|| self.resolve_once()).await
    }

    async fn resolve_once(&self) -> AppliedOutcome {
        let policy = self.load_policy().await;
        let consent_decided = self.host.cookies.get(&self.config.consent_cookie).is_some();
        let plan = plan_apply(&policy, self.snapshot.settings(), &self.snapshot, consent_decided);

        if plan.signal_granted {
            self.host.consent_signal.signal_granted();
        }
        if plan.auto_accept {
            self.accept_all();
        }

        self.transition(ApplierState::Applied);
        AppliedOutcome { policy, plan }
    }

    /// Cached cookie first, then one fetch. Never fails.
    async fn load_policy(&self) -> ResolvedPolicy {
        if let Some(raw) = self.host.cookies.get(&self.config.policy_cookie) {
            match ResolvedPolicy::from_json(&raw) {
                Ok(policy) => {
                    self.transition(ApplierState::CacheHit);
                    return policy;
                }
                Err(e) => {
                    let e = GeoConsentError::MalformedCache {
                        reason: e.to_string(),
                    };
                    tracing::warn!(cookie = %self.config.policy_cookie, error = %e, "ignoring cached policy");
                }
            }
        }

        self.transition(ApplierState::Fetching);
        match self.fetch_policy().await {
            Ok((policy, raw)) => {
                self.host.cookies.set(Cookie::expiring_in_days(
                    &self.config.policy_cookie,
                    raw,
                    self.config.policy_cache_days(),
                ));
                policy
            }
            Err(e) => {
                tracing::warn!(error = %e, "policy fetch failed, using site defaults");
                ResolvedPolicy::UseDefault
            }
        }
    }

    async fn fetch_policy(&self) -> Result<(ResolvedPolicy, String)> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let raw = self.fetcher.fetch().await?;
        let policy = ResolvedPolicy::from_json(&raw)?;
        Ok((policy, raw))
    }

    /// Jurisdictions without a banner still get a working page: record full
    /// acceptance for the session and release gated content.
    fn accept_all(&self) {
        let preferences = ConsentPreferences::full_acceptance(&self.config.categories);
        match serde_json::to_string(&preferences) {
            Ok(json) => self
                .host
                .cookies
                .set(Cookie::session(&self.config.consent_cookie, json)),
            Err(e) => tracing::warn!(error = %e, "could not encode consent preferences"),
        }
        self.host.scripts.unlock_all();
        tracing::debug!("banner suppressed for this location, consent granted");
    }

    /// Apply the DOM-dependent parts of the outcome. Waits for `ready` if the
    /// banner is not initialized yet; each sub-step runs at most once.
    pub async fn apply_dom(&self, ready: &InitSignal) {
        let outcome = self.resolve().await;
        let patch = &outcome.plan.dom;
        if patch.is_empty() {
            return;
        }
        if !ready.is_ready() {
            ready.wait().await;
        }

        let dom = &self.host.dom;
        if first_time(&self.dom_steps.buttons) {
            for (kind, text) in &patch.button_texts {
                dom.set_button_text(*kind, text);
            }
            for (kind, visible) in &patch.button_visibility {
                dom.set_button_visible(*kind, *visible);
            }
        }
        if let Some(order) = &patch.button_order {
            if first_time(&self.dom_steps.order) {
                dom.reorder_buttons(order);
            }
        }
        if let Some(checked) = patch.service_toggles {
            if first_time(&self.dom_steps.toggles) {
                dom.set_service_toggles(checked);
            }
        }
        if let Some(message) = &patch.banner_message {
            if first_time(&self.dom_steps.message) {
                dom.set_banner_message(message);
            }
        }
    }
}

/// The banner's startup sequence. It waits on exactly one resolution hook
/// before finalizing its settings, then publishes its "initialized" signal.
pub struct BannerBootstrap {
    settings: BannerSettings,
    init: InitSignal,
    hook: Option<Arc<PolicyApplier>>,
}

impl BannerBootstrap {
    pub fn new(settings: BannerSettings) -> Self {
        Self {
            settings,
            init: InitSignal::new(),
            hook: None,
        }
    }

    pub fn init_signal(&self) -> InitSignal {
        self.init.clone()
    }

    /// Register the resolution hook. Only one may be registered.
    pub fn register_hook(&mut self, applier: Arc<PolicyApplier>) -> Result<()> {
        if self.hook.is_some() {
            return Err(GeoConsentError::HookAlreadyRegistered);
        }
        self.hook = Some(applier);
        Ok(())
    }

    /// Finalize the banner's settings and mark it initialized.
    pub async fn start(self) -> BannerSettings {
        let settings = match &self.hook {
            Some(applier) => applier.resolve_settings().await,
            None => self.settings,
        };
        self.init.publish();
        settings
    }
}

/// Run a full page load: register the applier with the banner bootstrap,
/// start the banner, and apply the DOM steps once it is initialized.
pub async fn run_page_load(
    host: BannerHost,
    fetcher: Arc<dyn PolicyFetcher>,
    config: ClientConfig,
    initial: BannerSettings,
) -> Result<(BannerSettings, Arc<PolicyApplier>)> {
    let applier = Arc::new(PolicyApplier::new(host, fetcher, config, &initial));
    let mut bootstrap = BannerBootstrap::new(initial);
    bootstrap.register_hook(applier.clone())?;

    let init = bootstrap.init_signal();
    let dom_task = {
        let applier = applier.clone();
        tokio::spawn(async move { applier.apply_dom(&init).await })
    };

    let settings = bootstrap.start().await;
    dom_task.await.map_err(|e| GeoConsentError::Server {
        reason: format!("dom task failed: {e}"),
    })?;
    Ok((settings, applier))
}
