use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::error::{GeoConsentError, Result};

use super::{GroupStore, LocationGroupCollection};

/// On-disk shape of the groups file. The collection lives under one named key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupsFile {
    #[serde(default)]
    pub location_groups: LocationGroupCollection,
}

/// YAML-backed group store. The collection is held as an `Arc` snapshot that
/// `reload` swaps whole, so readers never see a partially updated list.
pub struct FileGroupStore {
    path: PathBuf,
    groups: RwLock<Arc<LocationGroupCollection>>,
    loaded_mtime: RwLock<Option<SystemTime>>,
}

impl FileGroupStore {
    /// Open the store. A missing file is an empty collection.
    pub fn open(path: PathBuf) -> Result<Self> {
        let groups = read_groups_file(&path)?;
        let mtime = modified_time(&path);
        tracing::info!(
            path = %path.display(),
            groups = groups.len(),
            "loaded location groups"
        );
        Ok(Self {
            path,
            groups: RwLock::new(Arc::new(groups)),
            loaded_mtime: RwLock::new(mtime),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file. On a parse failure the previous collection stays live.
    pub fn reload(&self) -> Result<()> {
        let mtime = modified_time(&self.path);
        let groups = read_groups_file(&self.path)?;
        let count = groups.len();
        {
            let mut guard = self.groups.write().unwrap_or_else(|e| e.into_inner());
            *guard = Arc::new(groups);
        }
        *self.loaded_mtime.write().unwrap_or_else(|e| e.into_inner()) = mtime;
        tracing::info!(path = %self.path.display(), groups = count, "reloaded location groups");
        Ok(())
    }

    /// Whether the file's modification time differs from the last load.
    pub fn is_stale(&self) -> bool {
        let loaded = *self.loaded_mtime.read().unwrap_or_else(|e| e.into_inner());
        modified_time(&self.path) != loaded
    }

    /// Cheap handle to the current snapshot.
    pub fn snapshot(&self) -> Arc<LocationGroupCollection> {
        self.groups.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl GroupStore for FileGroupStore {
    fn get_groups(&self) -> LocationGroupCollection {
        self.snapshot().as_ref().clone()
    }

    fn has_groups(&self) -> bool {
        !self.snapshot().is_empty()
    }
}

/// Read the collection from a YAML (or JSON) groups file.
pub fn read_groups_file(path: &Path) -> Result<LocationGroupCollection> {
    if !path.exists() {
        return Ok(LocationGroupCollection::default());
    }
    let contents = std::fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(LocationGroupCollection::default());
    }
    let file: GroupsFile =
        serde_yaml::from_str(&contents).map_err(|e| GeoConsentError::GroupsParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(file.location_groups)
}

/// Write a collection to disk, creating parent directories as needed.
pub fn write_groups_file(path: &Path, groups: &LocationGroupCollection) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = GroupsFile {
        location_groups: groups.clone(),
    };
    let yaml = serde_yaml::to_string(&file).map_err(|e| GeoConsentError::GroupsParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    std::fs::write(path, yaml)?;
    Ok(())
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Poll the groups file and reload it whenever its modification time changes.
pub fn spawn_reloader(store: Arc<FileGroupStore>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if !store.is_stale() {
                continue;
            }
            if let Err(e) = store.reload() {
                tracing::warn!(
                    path = %store.path().display(),
                    error = %e,
                    "keeping previous location groups"
                );
                // Do not retry the same broken file every tick.
                *store.loaded_mtime.write().unwrap_or_else(|e| e.into_inner()) =
                    modified_time(store.path());
            }
        }
    })
}
