pub mod init;
pub mod inspect;
pub mod serve;
pub mod simulate;

use std::path::{Path, PathBuf};

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::groups::file::FileGroupStore;

/// The project root: `--project` if given, else the working directory.
pub fn project_root(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Load the project's config and open its groups file.
pub fn load_project(root: &Path) -> Result<(ServiceConfig, FileGroupStore)> {
    let config = ServiceConfig::load_project(root)?;
    let store = FileGroupStore::open(config.groups_path.clone())?;
    Ok((config, store))
}
