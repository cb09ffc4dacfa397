use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::groups::ButtonKind;
use crate::resolver::{MatchedPolicy, ResolvedPolicy};
use crate::settings::{BannerSettings, ButtonSettings};

/// The banner settings as the page first loaded them. Captured once and
/// never modified; `UseDefault` restores from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAppliedSnapshot {
    original: BannerSettings,
}

impl ClientAppliedSnapshot {
    pub fn capture(settings: &BannerSettings) -> Self {
        Self {
            original: settings.clone(),
        }
    }

    pub fn settings(&self) -> &BannerSettings {
        &self.original
    }
}

/// Element-level changes that need the banner's DOM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomPatch {
    pub button_texts: Vec<(ButtonKind, String)>,
    pub button_visibility: Vec<(ButtonKind, bool)>,
    pub button_order: Option<Vec<ButtonKind>>,
    pub service_toggles: Option<bool>,
    pub banner_message: Option<String>,
}

impl DomPatch {
    pub fn is_empty(&self) -> bool {
        self.button_texts.is_empty()
            && self.button_visibility.is_empty()
            && self.button_order.is_none()
            && self.service_toggles.is_none()
            && self.banner_message.is_none()
    }
}

/// Everything applying a policy does, computed without touching the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyPlan {
    pub settings: BannerSettings,
    /// Tell the consent integration "granted" once.
    pub signal_granted: bool,
    /// Record full acceptance and unlock scripts without showing the banner.
    pub auto_accept: bool,
    pub dom: DomPatch,
}

/// Compute the settings and side effects for a resolved policy.
///
/// `consent_decided` is whether the visitor already has a consent-decision
/// cookie. The result depends only on the inputs, so applying a policy twice
/// yields the same settings as applying it once.
pub fn plan_apply(
    policy: &ResolvedPolicy,
    current: &BannerSettings,
    snapshot: &ClientAppliedSnapshot,
    consent_decided: bool,
) -> ApplyPlan {
    match policy {
        ResolvedPolicy::UseDefault => {
            let original = snapshot.settings();
            ApplyPlan {
                settings: original.clone(),
                signal_granted: original.default_allow && !consent_decided,
                auto_accept: false,
                dom: DomPatch::default(),
            }
        }
        ResolvedPolicy::Matched(matched) => plan_matched(matched, current, snapshot),
    }
}

fn plan_matched(
    matched: &MatchedPolicy,
    current: &BannerSettings,
    snapshot: &ClientAppliedSnapshot,
) -> ApplyPlan {
    let group = &matched.group;
    let mut settings = current.clone();

    settings.show_banner = group.show_banner;
    settings.enable_script_blocking = group.enable_script_blocking;
    settings.enable_consent_floating = group.enable_consent_floating;
    settings.manual_toggle_services = group.manual_toggle_services;
    settings.consent_type = matched.consent_type();
    settings.default_allow = matched.default_allow();
    settings.banner_message = group
        .banner_message
        .clone()
        .or_else(|| snapshot.settings().banner_message.clone());
    for kind in ButtonKind::ALL {
        *settings.button_mut(kind) =
            ButtonSettings::new(group.button_enabled(kind), group.button_text(kind));
    }
    settings.button_order = group.button_order.clone();

    let dom = DomPatch {
        button_texts: ButtonKind::ALL
            .iter()
            .map(|k| (*k, group.button_text(*k).to_string()))
            .collect(),
        button_visibility: ButtonKind::ALL
            .iter()
            .map(|k| (*k, group.button_enabled(*k)))
            .collect(),
        button_order: Some(group.button_order.clone()),
        service_toggles: Some(matched.default_allow()),
        banner_message: group.banner_message.clone(),
    };

    ApplyPlan {
        settings,
        signal_granted: false,
        auto_accept: !group.show_banner,
        dom,
    }
}

/// A consent decision as stored in the consent cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentPreferences {
    pub categories: BTreeMap<String, bool>,
    pub accepted_all: bool,
    pub decided_at: DateTime<Utc>,
}

impl ConsentPreferences {
    /// Every category granted, as if the visitor clicked accept.
    pub fn full_acceptance(categories: &[String]) -> Self {
        Self {
            categories: categories.iter().map(|c| (c.clone(), true)).collect(),
            accepted_all: true,
            decided_at: Utc::now(),
        }
    }
}
