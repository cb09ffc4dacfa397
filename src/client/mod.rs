//! Browser-side half: fetch or reuse the visitor's policy and apply it to the
//! live banner exactly once per page load.
//!
//! ```text
//! NotFetched ─┬─ valid cookie ──> CacheHit ─┐
//!             └─ otherwise ────> Fetching ──┴─> Applied
//! ```
//!
//! The page is reached through the traits in [`host`], so the same state
//! machine runs against a real banner binding, a headless logger, or test
//! doubles.

pub mod applier;
pub mod apply;
pub mod cookies;
pub mod fetch;
pub mod host;
pub mod ready;

pub use applier::{run_page_load, AppliedOutcome, ApplierState, BannerBootstrap, PolicyApplier};
pub use apply::{plan_apply, ApplyPlan, ClientAppliedSnapshot, ConsentPreferences, DomPatch};
pub use cookies::{Cookie, CookieJar, MemoryCookieJar};
pub use fetch::{HttpPolicyFetcher, PolicyFetcher};
pub use host::{BannerDom, BannerHost, ConsentSignal, ScriptGate, TracingHost};
pub use ready::InitSignal;
