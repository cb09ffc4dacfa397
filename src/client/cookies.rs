//! Browser cookie access for the applier.
//!
//! The applier only needs name-keyed reads and writes on the page's own
//! origin, so the jar is keyed by cookie name alone. [`MemoryCookieJar`] backs
//! headless runs and tests.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

/// A single cookie. `expires: None` is a session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub expires: Option<DateTime<Utc>>,
}

impl Cookie {
    /// A cookie living for the browser session only.
    pub fn session(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: None,
        }
    }

    /// A cookie expiring `days` from now. A lifetime past the representable
    /// range degrades to a session cookie.
    pub fn expiring_in_days(name: impl Into<String>, value: impl Into<String>, days: i64) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: Duration::try_days(days).and_then(|ttl| Utc::now().checked_add_signed(ttl)),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }
}

/// Name-keyed cookie storage for the current page.
pub trait CookieJar: Send + Sync {
    /// The value of a live cookie, `None` when absent or expired.
    fn get(&self, name: &str) -> Option<String>;

    /// Store a cookie, replacing any with the same name.
    fn set(&self, cookie: Cookie);

    fn remove(&self, name: &str);
}

/// In-memory jar. Expired cookies are invisible to `get`.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: RwLock<HashMap<String, Cookie>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full cookie including its expiry, for inspection.
    pub fn cookie(&self, name: &str) -> Option<Cookie> {
        let cookies = self.cookies.read().unwrap_or_else(|e| e.into_inner());
        cookies.get(name).cloned()
    }

    /// All live cookies, sorted by name.
    pub fn all(&self) -> Vec<Cookie> {
        let now = Utc::now();
        let cookies = self.cookies.read().unwrap_or_else(|e| e.into_inner());
        let mut live: Vec<Cookie> = cookies
            .values()
            .filter(|c| !c.is_expired_at(now))
            .cloned()
            .collect();
        live.sort_by(|a, b| a.name.cmp(&b.name));
        live
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let cookies = self.cookies.read().unwrap_or_else(|e| e.into_inner());
        cookies
            .get(name)
            .filter(|c| !c.is_expired_at(Utc::now()))
            .map(|c| c.value.clone())
    }

    fn set(&self, cookie: Cookie) {
        let mut cookies = self.cookies.write().unwrap_or_else(|e| e.into_inner());
        cookies.insert(cookie.name.clone(), cookie);
    }

    fn remove(&self, name: &str) {
        let mut cookies = self.cookies.write().unwrap_or_else(|e| e.into_inner());
        cookies.remove(name);
    }
}
