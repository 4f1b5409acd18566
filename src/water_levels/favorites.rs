/// Favorite-station store.
///
/// Station codes are kept in a sorted set and, when a path is configured,
/// written to disk as a JSON array after every toggle. A missing file means
/// no favorites yet.

use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::WaterLevelLocalDataSource;
use crate::model::WaterLevelError;

pub struct FavoritesStore {
    path: Option<PathBuf>,
    favorites: Mutex<BTreeSet<String>>,
}

impl FavoritesStore {
    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            favorites: Mutex::new(BTreeSet::new()),
        }
    }

    /// Opens the archive at `path`, creating nothing until the first toggle.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, WaterLevelError> {
        let path = path.into();
        let favorites = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str::<BTreeSet<String>>(&contents)
                .map_err(|e| WaterLevelError::Parse(format!("{}: {}", path.display(), e)))?
        } else {
            BTreeSet::new()
        };

        debug!(path = %path.display(), count = favorites.len(), "loaded favorite stations");
        Ok(Self {
            path: Some(path),
            favorites: Mutex::new(favorites),
        })
    }

    /// Like `open`, but an unreadable archive starts the store empty.
    /// The archive is overwritten on the next toggle.
    pub fn open_or_empty(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::in_memory();
        };
        match Self::open(path) {
            Ok(store) => store,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "favorites archive unreadable, starting empty");
                Self {
                    path: Some(path.to_path_buf()),
                    favorites: Mutex::new(BTreeSet::new()),
                }
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self, favorites: &BTreeSet<String>) -> Result<(), WaterLevelError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(favorites)?)?;
        Ok(())
    }
}

impl WaterLevelLocalDataSource for FavoritesStore {
    fn toggle_station_favorite(&self, station_code: &str) -> Result<bool, WaterLevelError> {
        let mut favorites = self.favorites.lock();
        let now_favorite = if favorites.remove(station_code) {
            false
        } else {
            favorites.insert(station_code.to_string());
            true
        };

        if let Err(e) = self.persist(&favorites) {
            // Keep memory and disk in agreement.
            if now_favorite {
                favorites.remove(station_code);
            } else {
                favorites.insert(station_code.to_string());
            }
            return Err(e);
        }

        debug!(station_code, favorite = now_favorite, "toggled favorite station");
        Ok(now_favorite)
    }

    fn get_favorite_status(&self, station_code: &str) -> bool {
        self.favorites.lock().contains(station_code)
    }

    fn get_favorites(&self) -> Vec<String> {
        self.favorites.lock().iter().cloned().collect()
    }
}
