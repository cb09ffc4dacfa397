use serde::{Deserialize, Serialize};

use crate::groups::{default_button_order, ButtonKind, ConsentMode};

/// Enabled flag and label of one banner button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSettings {
    pub enabled: bool,
    pub text: String,
}

impl ButtonSettings {
    pub fn new(enabled: bool, text: impl Into<String>) -> Self {
        Self {
            enabled,
            text: text.into(),
        }
    }
}

/// The banner configuration a page starts from and that location policies
/// overwrite. The server serves the site's effective copy; the client keeps
/// the original as its snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerSettings {
    #[serde(default = "default_true")]
    pub show_banner: bool,

    #[serde(default)]
    pub enable_script_blocking: bool,

    #[serde(default = "default_true")]
    pub enable_consent_floating: bool,

    #[serde(default)]
    pub manual_toggle_services: bool,

    #[serde(default = "default_consent_type")]
    pub consent_type: ConsentMode,

    /// Whether non-essential services run before the visitor decides.
    #[serde(default = "default_true")]
    pub default_allow: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_message: Option<String>,

    #[serde(default = "default_accept")]
    pub accept_button: ButtonSettings,

    #[serde(default = "default_cancel")]
    pub cancel_button: ButtonSettings,

    #[serde(default = "default_preferences")]
    pub preferences_button: ButtonSettings,

    #[serde(default = "default_button_order")]
    pub button_order: Vec<ButtonKind>,
}

fn default_true() -> bool {
    true
}
fn default_consent_type() -> ConsentMode {
    ConsentMode::OptOut
}
fn default_accept() -> ButtonSettings {
    ButtonSettings::new(true, "Accept")
}
fn default_cancel() -> ButtonSettings {
    ButtonSettings::new(true, "Reject")
}
fn default_preferences() -> ButtonSettings {
    ButtonSettings::new(true, "Preferences")
}

impl Default for BannerSettings {
    fn default() -> Self {
        Self {
            show_banner: true,
            enable_script_blocking: false,
            enable_consent_floating: true,
            manual_toggle_services: false,
            consent_type: default_consent_type(),
            default_allow: true,
            banner_message: None,
            accept_button: default_accept(),
            cancel_button: default_cancel(),
            preferences_button: default_preferences(),
            button_order: default_button_order(),
        }
    }
}

impl BannerSettings {
    pub fn button(&self, kind: ButtonKind) -> &ButtonSettings {
        match kind {
            ButtonKind::Accept => &self.accept_button,
            ButtonKind::Cancel => &self.cancel_button,
            ButtonKind::Preferences => &self.preferences_button,
        }
    }

    pub fn button_mut(&mut self, kind: ButtonKind) -> &mut ButtonSettings {
        match kind {
            ButtonKind::Accept => &mut self.accept_button,
            ButtonKind::Cancel => &mut self.cancel_button,
            ButtonKind::Preferences => &mut self.preferences_button,
        }
    }
}
