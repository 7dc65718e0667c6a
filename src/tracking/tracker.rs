//! Client that resolves run repositories by location

use std::path::{Path, PathBuf};

use dashmap::DashMap;

use super::{Repo, RepoRun, RunOptions, TrackingClient};
use crate::Result;

/// Opens one [`Repo`] per location and routes runs to it.
///
/// `RunOptions::repo` picks the repository; `None` selects
/// [`Repo::default_location`]. Repositories stay open for the life of
/// the tracker.
#[derive(Debug)]
pub struct Tracker {
    repos: DashMap<PathBuf, Repo>,
    persistent: bool,
}

impl Tracker {
    /// Tracker whose repositories are directories on disk.
    #[must_use]
    pub fn new() -> Self {
        Self {
            repos: DashMap::new(),
            persistent: true,
        }
    }

    /// Tracker whose repositories are in-memory stores keyed by location.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            repos: DashMap::new(),
            persistent: false,
        }
    }

    /// Get the repository at `location`, opening it on first use.
    ///
    /// # Errors
    ///
    /// Returns error if an on-disk repository cannot be opened.
    pub fn repo(&self, location: Option<&Path>) -> Result<Repo> {
        let location = location.map_or_else(Repo::default_location, Path::to_path_buf);
        if let Some(repo) = self.repos.get(&location) {
            return Ok(repo.value().clone());
        }

        let repo = if self.persistent {
            Repo::open(&location)?
        } else {
            Repo::in_memory()
        };
        Ok(self.repos.entry(location).or_insert(repo).value().clone())
    }

    /// Number of repositories opened so far.
    #[must_use]
    pub fn repo_count(&self) -> usize {
        self.repos.len()
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingClient for Tracker {
    type Handle = RepoRun;

    fn open_run(&self, options: &RunOptions) -> Result<RepoRun> {
        self.repo(options.repo.as_deref())?.open_run(options)
    }
}
