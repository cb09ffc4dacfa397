use std::path::Path;

use crate::config::{ServiceConfig, PROJECT_DIR};
use crate::error::{GeoConsentError, Result};
use crate::groups::file::write_groups_file;
use crate::groups::{ButtonKind, ConsentMode, LocationGroup, LocationGroupCollection};
use crate::location::Location;

/// Starter groups: opt-in for Europe, opt-out with a "Do Not Sell" button
/// first for California.
pub fn sample_groups() -> LocationGroupCollection {
    let mut europe = LocationGroup::new("europe", "Europe", vec![Location::continent("EU")]);
    europe.consent_mode = ConsentMode::OptIn;
    europe.enable_script_blocking = true;

    let mut california = LocationGroup::new(
        "california",
        "California",
        vec![Location::us_state("CA")],
    );
    california.consent_mode = ConsentMode::OptOut;
    california.cancel_button_text = "Do Not Sell My Info".into();
    california.button_order = vec![ButtonKind::Cancel, ButtonKind::Accept, ButtonKind::Preferences];

    LocationGroupCollection::new(vec![europe, california])
}

/// Create `.geo-consent/` with a default config and starter groups.
pub async fn run_init(project_root: &Path) -> Result<()> {
    let dir = project_root.join(PROJECT_DIR);
    let config_path = dir.join("config.yml");
    if config_path.exists() {
        eprintln!("geo-consent: {} already initialized", dir.display());
        return Ok(());
    }

    std::fs::create_dir_all(&dir)?;
    let config = ServiceConfig::default();
    let yaml = serde_yaml::to_string(&config).map_err(|e| GeoConsentError::ConfigParse {
        path: config_path.clone(),
        reason: e.to_string(),
    })?;
    std::fs::write(&config_path, yaml)?;

    let groups_path = config.groups_path_in(project_root);
    if !groups_path.exists() {
        write_groups_file(&groups_path, &sample_groups())?;
    }

    eprintln!("geo-consent: initialized {}/", PROJECT_DIR);
    Ok(())
}
