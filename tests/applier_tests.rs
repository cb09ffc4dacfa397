//! The browser-side applier against recording test doubles.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use geo_consent::client::{
    plan_apply, run_page_load, ApplierState, BannerBootstrap, BannerDom, BannerHost,
    ClientAppliedSnapshot, ConsentPreferences, ConsentSignal, Cookie, CookieJar, InitSignal,
    MemoryCookieJar, PolicyApplier, PolicyFetcher, ScriptGate,
};
use geo_consent::config::ClientConfig;
use geo_consent::error::{GeoConsentError, Result};
use geo_consent::groups::{ButtonKind, ConsentMode, LocationGroup};
use geo_consent::location::Location;
use geo_consent::resolver::{MatchedPolicy, ResolvedPolicy};
use geo_consent::settings::BannerSettings;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

struct FakeFetcher {
    response: std::result::Result<String, String>,
    calls: AtomicU32,
}

impl FakeFetcher {
    fn ok(policy: &ResolvedPolicy) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(serde_json::to_string(policy).unwrap()),
            calls: AtomicU32::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            response: Err("connection refused".into()),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PolicyFetcher for FakeFetcher {
    async fn fetch(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .map_err(|reason| GeoConsentError::PolicyFetch { reason })
    }
}

#[derive(Default)]
struct RecordingPage {
    dom_calls: Mutex<Vec<String>>,
    granted: AtomicU32,
    unlocked: AtomicU32,
}

impl RecordingPage {
    fn dom_calls(&self) -> Vec<String> {
        self.dom_calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.dom_calls.lock().unwrap().push(call);
    }
}

impl BannerDom for RecordingPage {
    fn set_button_text(&self, kind: ButtonKind, text: &str) {
        self.record(format!("text {kind:?} {text}"));
    }

    fn set_button_visible(&self, kind: ButtonKind, visible: bool) {
        self.record(format!("visible {kind:?} {visible}"));
    }

    fn reorder_buttons(&self, order: &[ButtonKind]) {
        self.record(format!("order {order:?}"));
    }

    fn set_service_toggles(&self, checked: bool) {
        self.record(format!("toggles {checked}"));
    }

    fn set_banner_message(&self, message: &str) {
        self.record(format!("message {message}"));
    }
}

impl ConsentSignal for RecordingPage {
    fn signal_granted(&self) {
        self.granted.fetch_add(1, Ordering::SeqCst);
    }
}

impl ScriptGate for RecordingPage {
    fn unlock_all(&self) {
        self.unlocked.fetch_add(1, Ordering::SeqCst);
    }
}

struct Page {
    jar: Arc<MemoryCookieJar>,
    recorder: Arc<RecordingPage>,
}

impl Page {
    fn new() -> Self {
        Self {
            jar: Arc::new(MemoryCookieJar::new()),
            recorder: Arc::new(RecordingPage::default()),
        }
    }

    fn host(&self) -> BannerHost {
        BannerHost {
            cookies: self.jar.clone(),
            dom: self.recorder.clone(),
            consent_signal: self.recorder.clone(),
            scripts: self.recorder.clone(),
        }
    }
}

fn matched(group: LocationGroup, country: &str) -> ResolvedPolicy {
    ResolvedPolicy::Matched(Box::new(MatchedPolicy {
        group_id: group.id.clone(),
        matched_country: country.into(),
        group,
    }))
}

fn germany_opt_in() -> ResolvedPolicy {
    let mut group = LocationGroup::new("g1", "Germany", vec![Location::country("DE")]);
    group.consent_mode = ConsentMode::OptIn;
    group.banner_message = Some("Wir verwenden Cookies".into());
    group.button_order = vec![ButtonKind::Cancel, ButtonKind::Accept, ButtonKind::Preferences];
    matched(group, "DE")
}

fn no_banner_opt_out() -> ResolvedPolicy {
    let mut group = LocationGroup::new("us", "United States", vec![Location::country("US")]);
    group.consent_mode = ConsentMode::OptOut;
    group.show_banner = false;
    matched(group, "US")
}

fn site_defaults() -> BannerSettings {
    BannerSettings {
        banner_message: Some("We use cookies".into()),
        ..BannerSettings::default()
    }
}

fn applier(page: &Page, fetcher: Arc<FakeFetcher>, initial: &BannerSettings) -> PolicyApplier {
    PolicyApplier::new(page.host(), fetcher, ClientConfig::default(), initial)
}

const POLICY_COOKIE: &str = "geo_consent_policy";
const CONSENT_COOKIE: &str = "geo_consent_preferences";

// ---------------------------------------------------------------------------
// Fetch and cache
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_cookie_skips_network() {
    let page = Page::new();
    let policy = germany_opt_in();
    page.jar.set(Cookie::expiring_in_days(
        POLICY_COOKIE,
        serde_json::to_string(&policy).unwrap(),
        30,
    ));
    let fetcher = FakeFetcher::failing();
    let applier = applier(&page, fetcher.clone(), &site_defaults());

    let settings = applier.resolve_settings().await;

    assert_eq!(fetcher.calls(), 0);
    assert_eq!(applier.fetch_count(), 0);
    assert_eq!(settings.consent_type, ConsentMode::OptIn);
    assert_eq!(applier.outcome().unwrap().policy, policy);
    assert_eq!(applier.state(), ApplierState::Applied);
}

#[tokio::test]
async fn corrupt_cookie_fetches_once() {
    let page = Page::new();
    page.jar.set(Cookie::session(POLICY_COOKIE, "{not json"));
    let policy = germany_opt_in();
    let fetcher = FakeFetcher::ok(&policy);
    let applier = applier(&page, fetcher.clone(), &site_defaults());

    applier.resolve_settings().await;

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(applier.outcome().unwrap().policy, policy);
    let cached = page.jar.get(POLICY_COOKIE).unwrap();
    assert_eq!(ResolvedPolicy::from_json(&cached).unwrap(), policy);
}

#[tokio::test]
async fn fetched_policy_is_cached_for_thirty_days() {
    let page = Page::new();
    let fetcher = FakeFetcher::ok(&germany_opt_in());
    let applier = applier(&page, fetcher, &site_defaults());

    applier.resolve_settings().await;

    let cookie = page.jar.cookie(POLICY_COOKIE).expect("policy cookie written");
    let days = (cookie.expires.unwrap() - Utc::now()).num_days();
    assert!((29..=30).contains(&days), "expiry was {days} days out");
}

#[tokio::test]
async fn oversized_cache_lifetime_is_bounded() {
    let page = Page::new();
    let config = ClientConfig {
        cache_ttl_days: i64::MAX,
        ..ClientConfig::default()
    };
    let fetcher = FakeFetcher::ok(&germany_opt_in());
    let applier = PolicyApplier::new(page.host(), fetcher, config, &site_defaults());

    applier.resolve_settings().await;

    let cookie = page.jar.cookie(POLICY_COOKIE).expect("policy cookie written");
    let days = (cookie.expires.unwrap() - Utc::now()).num_days();
    assert!((399..=400).contains(&days), "expiry was {days} days out");
}

#[tokio::test]
async fn fetch_failure_uses_default_and_caches_nothing() {
    let page = Page::new();
    let fetcher = FakeFetcher::failing();
    let initial = site_defaults();
    let applier = applier(&page, fetcher.clone(), &initial);

    let settings = applier.resolve_settings().await;

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(settings, initial);
    assert!(applier.outcome().unwrap().policy.is_default());
    assert!(page.jar.get(POLICY_COOKIE).is_none());
}

#[tokio::test]
async fn resolution_runs_once() {
    let page = Page::new();
    let fetcher = FakeFetcher::ok(&germany_opt_in());
    let applier = applier(&page, fetcher.clone(), &site_defaults());

    let first = applier.resolve_settings().await;
    let second = applier.resolve_settings().await;

    assert_eq!(first, second);
    assert_eq!(fetcher.calls(), 1);
}

// ---------------------------------------------------------------------------
// Settings and side effects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn use_default_restores_snapshot() {
    let page = Page::new();
    let initial = site_defaults();
    let fetcher = FakeFetcher::ok(&ResolvedPolicy::UseDefault);
    let applier = applier(&page, fetcher, &initial);

    let settings = applier.resolve_settings().await;

    assert_eq!(&settings, applier.snapshot().settings());
    assert_eq!(settings, initial);
}

#[tokio::test]
async fn matched_policy_overwrites_settings() {
    let page = Page::new();
    let initial = site_defaults();
    let fetcher = FakeFetcher::ok(&germany_opt_in());
    let applier = applier(&page, fetcher, &initial);

    let settings = applier.resolve_settings().await;

    assert!(!settings.default_allow);
    assert_eq!(settings.consent_type, ConsentMode::OptIn);
    assert_eq!(settings.banner_message.as_deref(), Some("Wir verwenden Cookies"));
    assert_eq!(settings.button_order[0], ButtonKind::Cancel);
    // The snapshot is never touched.
    assert_eq!(applier.snapshot().settings(), &initial);
}

fn no_message_opt_out() -> ResolvedPolicy {
    let mut group = LocationGroup::new("br", "Brazil", vec![Location::country("BR")]);
    group.consent_mode = ConsentMode::OptOut;
    group.cancel_button_enabled = false;
    group.accept_button_text = "OK".into();
    matched(group, "BR")
}

#[test]
fn applying_twice_equals_applying_once() {
    let initial = site_defaults();
    let snapshot = ClientAppliedSnapshot::capture(&initial);

    for policy in [
        ResolvedPolicy::UseDefault,
        germany_opt_in(),
        no_banner_opt_out(),
        no_message_opt_out(),
    ] {
        for decided in [false, true] {
            let once = plan_apply(&policy, &initial, &snapshot, decided);
            let twice = plan_apply(&policy, &once.settings, &snapshot, decided);
            assert_eq!(twice.settings, once.settings);
            assert_eq!(twice, once);
        }
    }
}

#[test]
fn group_without_message_keeps_site_message() {
    let initial = site_defaults();
    let snapshot = ClientAppliedSnapshot::capture(&initial);

    let plan = plan_apply(&no_message_opt_out(), &initial, &snapshot, false);

    assert_eq!(plan.settings.banner_message.as_deref(), Some("We use cookies"));
    assert!(plan.dom.banner_message.is_none());
    assert!(!plan.settings.cancel_button.enabled);
    assert_eq!(plan.settings.accept_button.text, "OK");
}

#[tokio::test]
async fn granted_signalled_once_for_allow_by_default_site() {
    let page = Page::new();
    let fetcher = FakeFetcher::ok(&ResolvedPolicy::UseDefault);
    let applier = applier(&page, fetcher, &site_defaults());

    applier.resolve_settings().await;
    applier.resolve_settings().await;

    assert_eq!(page.recorder.granted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn granted_not_signalled_after_visitor_decided() {
    let page = Page::new();
    page.jar.set(Cookie::session(CONSENT_COOKIE, "{}"));
    let fetcher = FakeFetcher::ok(&ResolvedPolicy::UseDefault);
    let applier = applier(&page, fetcher, &site_defaults());

    applier.resolve_settings().await;

    assert_eq!(page.recorder.granted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn granted_not_signalled_for_deny_by_default_site() {
    let page = Page::new();
    let initial = BannerSettings {
        default_allow: false,
        ..site_defaults()
    };
    let fetcher = FakeFetcher::ok(&ResolvedPolicy::UseDefault);
    let applier = applier(&page, fetcher, &initial);

    applier.resolve_settings().await;

    assert_eq!(page.recorder.granted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn hidden_banner_accepts_everything() {
    let page = Page::new();
    let fetcher = FakeFetcher::ok(&no_banner_opt_out());
    let applier = applier(&page, fetcher, &site_defaults());

    let settings = applier.resolve_settings().await;

    assert!(!settings.show_banner);
    assert_eq!(page.recorder.unlocked.load(Ordering::SeqCst), 1);

    let cookie = page.jar.cookie(CONSENT_COOKIE).expect("consent cookie written");
    assert!(cookie.expires.is_none(), "consent cookie must be session-only");
    let prefs: ConsentPreferences = serde_json::from_str(&cookie.value).unwrap();
    assert!(prefs.accepted_all);
    assert_eq!(prefs.categories.len(), 4);
    assert!(prefs.categories.values().all(|granted| *granted));
}

// ---------------------------------------------------------------------------
// DOM application
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dom_waits_for_banner_init() {
    let page = Page::new();
    let fetcher = FakeFetcher::ok(&germany_opt_in());
    let applier = Arc::new(applier(&page, fetcher, &site_defaults()));
    let init = InitSignal::new();

    let task = {
        let applier = applier.clone();
        let init = init.clone();
        tokio::spawn(async move { applier.apply_dom(&init).await })
    };

    applier.resolve_settings().await;
    tokio::task::yield_now().await;
    assert!(page.recorder.dom_calls().is_empty());

    init.publish();
    task.await.unwrap();

    let calls = page.recorder.dom_calls();
    assert!(calls.contains(&"message Wir verwenden Cookies".to_string()));
    assert!(calls.contains(&"toggles false".to_string()));
    assert!(calls.iter().any(|c| c.starts_with("order [Cancel")));
}

#[tokio::test]
async fn dom_applied_immediately_when_ready() {
    let page = Page::new();
    let fetcher = FakeFetcher::ok(&germany_opt_in());
    let applier = applier(&page, fetcher, &site_defaults());
    let init = InitSignal::new();
    init.publish();

    applier.apply_dom(&init).await;

    assert!(!page.recorder.dom_calls().is_empty());
}

#[tokio::test]
async fn dom_steps_run_once() {
    let page = Page::new();
    let fetcher = FakeFetcher::ok(&germany_opt_in());
    let applier = applier(&page, fetcher, &site_defaults());
    let init = InitSignal::new();
    init.publish();

    applier.apply_dom(&init).await;
    let after_first = page.recorder.dom_calls().len();
    applier.apply_dom(&init).await;

    assert_eq!(page.recorder.dom_calls().len(), after_first);
    let order_calls = page
        .recorder
        .dom_calls()
        .iter()
        .filter(|c| c.starts_with("order"))
        .count();
    assert_eq!(order_calls, 1);
}

#[tokio::test]
async fn use_default_touches_no_dom() {
    let page = Page::new();
    let fetcher = FakeFetcher::ok(&ResolvedPolicy::UseDefault);
    let applier = applier(&page, fetcher, &site_defaults());
    let init = InitSignal::new();
    init.publish();

    applier.apply_dom(&init).await;

    assert!(page.recorder.dom_calls().is_empty());
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_hook_is_rejected() {
    let page = Page::new();
    let initial = site_defaults();
    let first = Arc::new(applier(&page, FakeFetcher::failing(), &initial));
    let second = Arc::new(applier(&page, FakeFetcher::failing(), &initial));

    let mut bootstrap = BannerBootstrap::new(initial);
    bootstrap.register_hook(first).unwrap();
    let err = bootstrap.register_hook(second).unwrap_err();
    assert!(matches!(err, GeoConsentError::HookAlreadyRegistered));
}

#[tokio::test]
async fn bootstrap_without_hook_keeps_settings() {
    let initial = site_defaults();
    let bootstrap = BannerBootstrap::new(initial.clone());
    let init = bootstrap.init_signal();

    let settings = bootstrap.start().await;

    assert_eq!(settings, initial);
    assert!(init.is_ready());
}

#[tokio::test]
async fn full_page_load() {
    let page = Page::new();
    let fetcher = FakeFetcher::ok(&germany_opt_in());

    let (settings, applier) = run_page_load(
        page.host(),
        fetcher.clone(),
        ClientConfig::default(),
        site_defaults(),
    )
    .await
    .unwrap();

    assert_eq!(settings.consent_type, ConsentMode::OptIn);
    assert_eq!(applier.state(), ApplierState::Applied);
    assert_eq!(fetcher.calls(), 1);
    assert!(page
        .recorder
        .dom_calls()
        .contains(&"message Wir verwenden Cookies".to_string()));
}
