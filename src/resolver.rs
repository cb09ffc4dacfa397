use serde::{Deserialize, Serialize};

use crate::error::{GeoConsentError, Result};
use crate::geo::GeoLookupResult;
use crate::groups::{ConsentMode, LocationGroup, LocationGroupCollection};
use crate::location::{continent_contains, Location, LocationType};

/// A location group that claimed the visitor, plus how it was claimed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPolicy {
    pub group_id: String,
    pub matched_country: String,
    #[serde(flatten)]
    pub group: LocationGroup,
}

impl MatchedPolicy {
    pub fn consent_type(&self) -> ConsentMode {
        self.group.consent_mode
    }

    /// Opt-in denies by default, opt-out allows by default.
    pub fn default_allow(&self) -> bool {
        self.group.consent_mode.default_allow()
    }
}

/// The policy a visitor receives: either the site defaults or a matched group.
///
/// Serialized as `{"use_default": true}` or as the flattened matched payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolicyWire", into = "PolicyWire")]
pub enum ResolvedPolicy {
    UseDefault,
    Matched(Box<MatchedPolicy>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PolicyWire {
    Default { use_default: bool },
    Matched(Box<MatchedPolicy>),
}

impl TryFrom<PolicyWire> for ResolvedPolicy {
    type Error = String;

    fn try_from(wire: PolicyWire) -> std::result::Result<Self, Self::Error> {
        match wire {
            PolicyWire::Default { use_default: true } => Ok(ResolvedPolicy::UseDefault),
            PolicyWire::Default { use_default: false } => {
                Err("use_default=false without a matched group".into())
            }
            PolicyWire::Matched(m) => Ok(ResolvedPolicy::Matched(m)),
        }
    }
}

impl From<ResolvedPolicy> for PolicyWire {
    fn from(policy: ResolvedPolicy) -> Self {
        match policy {
            ResolvedPolicy::UseDefault => PolicyWire::Default { use_default: true },
            ResolvedPolicy::Matched(m) => PolicyWire::Matched(m),
        }
    }
}

impl ResolvedPolicy {
    pub fn is_default(&self) -> bool {
        matches!(self, ResolvedPolicy::UseDefault)
    }

    pub fn matched(&self) -> Option<&MatchedPolicy> {
        match self {
            ResolvedPolicy::Matched(m) => Some(m),
            ResolvedPolicy::UseDefault => None,
        }
    }

    /// Parse a policy from its JSON wire form.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| GeoConsentError::InvalidPolicy {
            reason: e.to_string(),
        })
    }
}

/// Does a single matcher claim the looked-up location? Case-insensitive.
pub fn location_matches(location: &Location, lookup: &GeoLookupResult) -> bool {
    let Some(country) = lookup.country.as_deref().map(str::trim) else {
        return false;
    };
    let code = location.code.trim();
    match location.kind {
        LocationType::Country => code.eq_ignore_ascii_case(country),
        LocationType::UsState => {
            country.eq_ignore_ascii_case("US")
                && lookup
                    .region
                    .as_deref()
                    .is_some_and(|region| code.eq_ignore_ascii_case(region.trim()))
        }
        LocationType::Continent => continent_contains(code, country),
    }
}

/// First group, in collection order, with at least one matching location.
pub fn try_resolve<'a>(
    lookup: &GeoLookupResult,
    groups: &'a LocationGroupCollection,
) -> Result<&'a LocationGroup> {
    if groups.is_empty() {
        return Err(GeoConsentError::NoMatch {
            country: String::new(),
            region: String::new(),
        });
    }
    if lookup.is_unknown() {
        return Err(GeoConsentError::LookupUnavailable {
            reason: "visitor location unknown".into(),
        });
    }

    groups
        .iter()
        .find(|group| group.locations.iter().any(|loc| location_matches(loc, lookup)))
        .ok_or_else(|| GeoConsentError::NoMatch {
            country: lookup.country.clone().unwrap_or_default(),
            region: lookup.region.clone().unwrap_or_default(),
        })
}

/// Resolve a visitor's policy. Every failure collapses to `UseDefault`.
pub fn resolve(lookup: &GeoLookupResult, groups: &LocationGroupCollection) -> ResolvedPolicy {
    if groups.is_empty() {
        return ResolvedPolicy::UseDefault;
    }
    match try_resolve(lookup, groups) {
        Ok(group) => {
            let matched_country = lookup.country.clone().unwrap_or_default().to_ascii_uppercase();
            tracing::debug!(group = %group.id, country = %matched_country, "location group matched");
            ResolvedPolicy::Matched(Box::new(MatchedPolicy {
                group_id: group.id.clone(),
                matched_country,
                group: group.clone(),
            }))
        }
        Err(e) => {
            tracing::debug!(reason = %e, "using default consent policy");
            ResolvedPolicy::UseDefault
        }
    }
}
