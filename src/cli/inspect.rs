use std::net::IpAddr;
use std::path::Path;

use crate::cascade::{effective_settings, CallerContext};
use crate::error::Result;
use crate::geo::http::HttpGeoLookup;
use crate::geo::{anonymize_ip, GeoLookupResult};
use crate::groups::GroupStore;
use crate::resolver::resolve;

/// Resolve a location offline against the project's groups and print the
/// policy the endpoint would serve.
pub async fn run_resolve(project_root: &Path, country: Option<&str>, region: Option<&str>) -> Result<()> {
    let (_, store) = super::load_project(project_root)?;
    let lookup = GeoLookupResult {
        country: country.map(|c| c.to_ascii_uppercase()),
        region: region.map(|r| r.to_ascii_uppercase()),
    };
    let policy = resolve(&lookup, &store.get_groups());
    println!("{}", serde_json::to_string_pretty(&policy)?);
    Ok(())
}

/// Query the configured geo service for one address.
pub async fn run_lookup(project_root: &Path, ip: IpAddr) -> Result<()> {
    let (config, _) = super::load_project(project_root)?;
    let geo = HttpGeoLookup::new(&config.geo.base_url, config.geo.timeout())?;
    eprintln!(
        "geo-consent: looking up {} (sent as {})",
        ip,
        anonymize_ip(ip)
    );
    let lookup = geo.try_resolve(ip).await?;
    println!("{}", serde_json::to_string_pretty(&lookup)?);
    Ok(())
}

/// List groups in match-priority order.
pub async fn run_groups(project_root: &Path) -> Result<()> {
    let (_, store) = super::load_project(project_root)?;
    let groups = store.get_groups();
    if groups.is_empty() {
        println!("No location groups configured; every visitor gets the site defaults.");
        return Ok(());
    }

    for (priority, group) in groups.iter().enumerate() {
        println!(
            "{}. {} ({})\n  Mode: {}\n  Banner: {}\n  Script blocking: {}",
            priority + 1,
            group.id,
            if group.name.is_empty() { "-" } else { group.name.as_str() },
            group.consent_mode,
            if group.show_banner { "shown" } else { "hidden" },
            if group.enable_script_blocking { "on" } else { "off" },
        );
        if group.locations.is_empty() {
            println!("  Locations: none (never matches)");
        }
        for location in &group.locations {
            println!("  - {}", location);
        }
        println!();
    }

    println!("{} location group(s)", groups.len());
    Ok(())
}

/// Print the site settings as the given caller would read them.
pub async fn run_settings(project_root: &Path, caller: CallerContext) -> Result<()> {
    let (config, store) = super::load_project(project_root)?;
    let settings = effective_settings(&config.site, &store.get_groups(), caller);
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
