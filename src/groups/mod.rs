pub mod file;

use serde::{Deserialize, Serialize};

use crate::location::Location;

/// Whether non-essential processing waits for consent or runs until objection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsentMode {
    #[serde(rename = "optin")]
    OptIn,
    #[serde(rename = "optout")]
    OptOut,
}

impl ConsentMode {
    /// Opt-out jurisdictions allow processing until the visitor objects.
    pub fn default_allow(&self) -> bool {
        matches!(self, ConsentMode::OptOut)
    }
}

impl std::fmt::Display for ConsentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsentMode::OptIn => write!(f, "optin"),
            ConsentMode::OptOut => write!(f, "optout"),
        }
    }
}

impl std::str::FromStr for ConsentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "optin" | "opt-in" => Ok(ConsentMode::OptIn),
            "optout" | "opt-out" => Ok(ConsentMode::OptOut),
            _ => Err(format!("unknown consent mode: {s}")),
        }
    }
}

/// The three banner buttons whose order a group may rearrange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonKind {
    Accept,
    Cancel,
    Preferences,
}

impl ButtonKind {
    pub const ALL: [ButtonKind; 3] = [ButtonKind::Accept, ButtonKind::Cancel, ButtonKind::Preferences];
}

pub fn default_button_order() -> Vec<ButtonKind> {
    ButtonKind::ALL.to_vec()
}

fn default_true() -> bool {
    true
}
fn default_consent_mode() -> ConsentMode {
    ConsentMode::OptIn
}
fn default_accept_text() -> String {
    "Accept".into()
}
fn default_cancel_text() -> String {
    "Reject".into()
}
fn default_preferences_text() -> String {
    "Preferences".into()
}

/// A named bundle of geographic matchers and the consent policy applied to
/// visitors that match any of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationGroup {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// A group with no locations never matches.
    #[serde(default)]
    pub locations: Vec<Location>,

    #[serde(default = "default_true")]
    pub show_banner: bool,

    #[serde(default = "default_true")]
    pub enable_script_blocking: bool,

    #[serde(default)]
    pub enable_consent_floating: bool,

    #[serde(default)]
    pub manual_toggle_services: bool,

    #[serde(default = "default_consent_mode")]
    pub consent_mode: ConsentMode,

    #[serde(default = "default_true")]
    pub accept_button_enabled: bool,
    #[serde(default = "default_accept_text")]
    pub accept_button_text: String,

    #[serde(default = "default_true")]
    pub cancel_button_enabled: bool,
    #[serde(default = "default_cancel_text")]
    pub cancel_button_text: String,

    #[serde(default = "default_true")]
    pub preferences_button_enabled: bool,
    #[serde(default = "default_preferences_text")]
    pub preferences_button_text: String,

    #[serde(default = "default_button_order")]
    pub button_order: Vec<ButtonKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_message: Option<String>,
}

impl LocationGroup {
    /// A group with the stock banner settings and the given matchers.
    pub fn new(id: impl Into<String>, name: impl Into<String>, locations: Vec<Location>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            locations,
            show_banner: true,
            enable_script_blocking: true,
            enable_consent_floating: false,
            manual_toggle_services: false,
            consent_mode: ConsentMode::OptIn,
            accept_button_enabled: true,
            accept_button_text: default_accept_text(),
            cancel_button_enabled: true,
            cancel_button_text: default_cancel_text(),
            preferences_button_enabled: true,
            preferences_button_text: default_preferences_text(),
            button_order: default_button_order(),
            banner_message: None,
        }
    }

    /// Text configured for one of the three buttons.
    pub fn button_text(&self, kind: ButtonKind) -> &str {
        match kind {
            ButtonKind::Accept => &self.accept_button_text,
            ButtonKind::Cancel => &self.cancel_button_text,
            ButtonKind::Preferences => &self.preferences_button_text,
        }
    }

    pub fn button_enabled(&self, kind: ButtonKind) -> bool {
        match kind {
            ButtonKind::Accept => self.accept_button_enabled,
            ButtonKind::Cancel => self.cancel_button_enabled,
            ButtonKind::Preferences => self.preferences_button_enabled,
        }
    }
}

/// The ordered group collection. Position is match priority: the first group
/// claiming a visitor wins, overlaps are left as configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationGroupCollection {
    groups: Vec<LocationGroup>,
}

impl LocationGroupCollection {
    pub fn new(groups: Vec<LocationGroup>) -> Self {
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Groups in priority order.
    pub fn iter(&self) -> std::slice::Iter<'_, LocationGroup> {
        self.groups.iter()
    }

    pub fn get(&self, id: &str) -> Option<&LocationGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Whether any group satisfies `pred`. False for an empty collection.
    pub fn any(&self, pred: impl Fn(&LocationGroup) -> bool) -> bool {
        self.groups.iter().any(pred)
    }
}

impl From<Vec<LocationGroup>> for LocationGroupCollection {
    fn from(groups: Vec<LocationGroup>) -> Self {
        Self::new(groups)
    }
}

impl<'a> IntoIterator for &'a LocationGroupCollection {
    type Item = &'a LocationGroup;
    type IntoIter = std::slice::Iter<'a, LocationGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Read-only access to the configured location groups.
pub trait GroupStore: Send + Sync {
    /// The current collection, empty when nothing is configured.
    fn get_groups(&self) -> LocationGroupCollection;

    /// Fast inert check. When false, no lookup or resolution happens.
    fn has_groups(&self) -> bool;
}

impl GroupStore for LocationGroupCollection {
    fn get_groups(&self) -> LocationGroupCollection {
        self.clone()
    }

    fn has_groups(&self) -> bool {
        !self.is_empty()
    }
}
