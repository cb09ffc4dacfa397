//! Fail-safe overrides applied to the site's default settings.
//!
//! These run ahead of, and independently from, per-visitor resolution. They
//! look at every configured group rather than the visitor's match, so the
//! defaults a page starts with (and falls back to when geolocation never
//! resolves) are never weaker than the strictest group.

use serde::{Deserialize, Serialize};

use crate::groups::{ConsentMode, LocationGroupCollection};
use crate::settings::BannerSettings;

/// Who is reading the setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerContext {
    /// A visitor-facing page.
    #[default]
    Visitor,
    /// Any administrative screen.
    Admin,
    /// The administrator editing the group-management screen.
    AdminGroups,
}

impl CallerContext {
    /// The group editor must see the stored values, not the forced ones.
    pub fn bypasses_overrides(&self) -> bool {
        matches!(self, CallerContext::AdminGroups)
    }

    pub fn is_visitor(&self) -> bool {
        matches!(self, CallerContext::Visitor)
    }
}

impl std::fmt::Display for CallerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallerContext::Visitor => write!(f, "visitor"),
            CallerContext::Admin => write!(f, "admin"),
            CallerContext::AdminGroups => write!(f, "admin_groups"),
        }
    }
}

impl std::str::FromStr for CallerContext {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "visitor" => Ok(CallerContext::Visitor),
            "admin" => Ok(CallerContext::Admin),
            "admin_groups" | "admin-groups" => Ok(CallerContext::AdminGroups),
            _ => Err(format!("unknown caller context: {s}")),
        }
    }
}

/// The banner is shown if the site or any group shows it.
pub fn force_enable_banner(
    raw: bool,
    groups: &LocationGroupCollection,
    caller: CallerContext,
) -> bool {
    if caller.bypasses_overrides() {
        return raw;
    }
    raw || groups.any(|g| g.show_banner)
}

/// Script blocking is on if the site or any group enables it.
pub fn force_enable_script_blocking(
    raw: bool,
    groups: &LocationGroupCollection,
    caller: CallerContext,
) -> bool {
    if caller.bypasses_overrides() {
        return raw;
    }
    raw || groups.any(|g| g.enable_script_blocking)
}

/// Any opt-in group forces the site default to deny. Visitor contexts only.
pub fn force_opt_in_default(
    raw: bool,
    groups: &LocationGroupCollection,
    caller: CallerContext,
) -> bool {
    if !caller.is_visitor() {
        return raw;
    }
    if groups.any(|g| g.consent_mode == ConsentMode::OptIn) {
        false
    } else {
        raw
    }
}

/// Read the site settings through all three overrides.
pub fn effective_settings(
    raw: &BannerSettings,
    groups: &LocationGroupCollection,
    caller: CallerContext,
) -> BannerSettings {
    let mut settings = raw.clone();
    settings.show_banner = force_enable_banner(raw.show_banner, groups, caller);
    settings.enable_script_blocking =
        force_enable_script_blocking(raw.enable_script_blocking, groups, caller);
    settings.default_allow = force_opt_in_default(raw.default_allow, groups, caller);

    if settings != *raw {
        tracing::debug!(
            %caller,
            show_banner = settings.show_banner,
            enable_script_blocking = settings.enable_script_blocking,
            default_allow = settings.default_allow,
            "site defaults tightened by location groups"
        );
    }
    settings
}
