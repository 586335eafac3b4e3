//! JSON-on-disk show store.
//!
//! Every show lives in its own pretty-printed JSON file under
//! `<state_dir>/shows/`. The store is loaded wholesale on open, mutated in
//! memory during a pass and written back on [`Store::close`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::show::Show;

const SHOWS_DIR: &str = "shows";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize show '{title}': {source}")]
    Serialize {
        title: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode show at {}: {source}", .path.display())]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Show already exists: {0}")]
    AlreadyExists(String),
}

/// Shows keyed by title.
#[derive(Debug)]
pub struct Store {
    shows_dir: PathBuf,
    shows: BTreeMap<String, Show>,
}

impl Store {
    /// Load every show below `state_dir`, creating the directory layout if
    /// needed. Files that cannot be read or decoded are skipped.
    pub fn open(state_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let shows_dir = state_dir.as_ref().join(SHOWS_DIR);
        fs::create_dir_all(&shows_dir).map_err(|source| StoreError::Io {
            path: shows_dir.clone(),
            source,
        })?;

        let entries = fs::read_dir(&shows_dir).map_err(|source| StoreError::Io {
            path: shows_dir.clone(),
            source,
        })?;

        let mut shows = BTreeMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match load_show(&path) {
                Ok(show) => {
                    shows.insert(show.title.clone(), show);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable show"),
            }
        }

        info!(dir = %shows_dir.display(), shows = shows.len(), "Opened store");
        Ok(Self { shows_dir, shows })
    }

    pub fn shows(&self) -> &BTreeMap<String, Show> {
        &self.shows
    }

    pub fn shows_mut(&mut self) -> &mut BTreeMap<String, Show> {
        &mut self.shows
    }

    pub fn show(&self, title: &str) -> Option<&Show> {
        self.shows.get(title)
    }

    /// Add a freshly synced show. This is where the daily heuristic runs
    /// and gets cached on the show.
    pub fn create_show(&mut self, mut show: Show) -> Result<&mut Show, StoreError> {
        if self.shows.contains_key(&show.title) {
            return Err(StoreError::AlreadyExists(show.title));
        }
        show.update_is_daily();
        debug!(show = %show.title, is_daily = show.is_daily, "Created show");
        Ok(self.shows.entry(show.title.clone()).or_insert(show))
    }

    /// Write every show to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        for show in self.shows.values() {
            let path = self.shows_dir.join(show_filename(&show.title));
            let json =
                serde_json::to_vec_pretty(show).map_err(|source| StoreError::Serialize {
                    title: show.title.clone(),
                    source,
                })?;
            fs::write(&path, json).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            debug!(show = %show.title, path = %path.display(), "Stored show");
        }
        Ok(())
    }

    /// Flush and release the store.
    pub fn close(self) -> Result<(), StoreError> {
        self.flush()?;
        info!(shows = self.shows.len(), "Closed store");
        Ok(())
    }
}

/// File name for a show: every character outside `[a-zA-Z0-9]` becomes `_`.
pub fn show_filename(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.json", stem)
}

fn load_show(path: &Path) -> Result<Show, StoreError> {
    let bytes = fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Deserialize {
        path: path.to_path_buf(),
        source,
    })
}
