//! Source use-case service.
//!
//! # Responsibility
//! - Provide the entry points callers use to manage configured sources.
//! - Combine repository state with sources.list generation and detection.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - The service stays storage-agnostic through `SourceRepository`.

use crate::model::source::{SourceId, SourceRecord};
use crate::repo::source_repo::{RepoError, RepoResult, SourceListQuery, SourceRepository};
use crate::service::sources_list::{self, SyncError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Failure of a service operation that touches both storage and files.
#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    Sync(SyncError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Sync(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Sync(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<SyncError> for ServiceError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

/// Use-case service over a source repository.
pub struct SourceService<R: SourceRepository> {
    repo: R,
}

impl<R: SourceRepository> SourceService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates and saves a new source. The returned record carries its id.
    pub fn add_source(
        &self,
        url: impl Into<String>,
        repo: impl Into<String>,
        enabled: bool,
    ) -> RepoResult<SourceRecord> {
        let mut source = SourceRecord::new(url, repo, enabled);
        let id = self.repo.insert_source(&mut source)?;
        info!("event=source_add module=service status=ok source_id={id} enabled={enabled}");
        Ok(source)
    }

    /// Saves field edits; inserts the record first if it was never saved.
    pub fn update_source(&self, source: &mut SourceRecord) -> RepoResult<SourceId> {
        self.repo.save_source(source)
    }

    pub fn get_source(&self, id: SourceId) -> RepoResult<Option<SourceRecord>> {
        self.repo.get_source(id)
    }

    pub fn list_sources(&self, query: &SourceListQuery) -> RepoResult<Vec<SourceRecord>> {
        self.repo.list_sources(query)
    }

    /// Enabled sources in id order.
    pub fn enabled_sources(&self) -> RepoResult<Vec<SourceRecord>> {
        self.repo.list_sources(&SourceListQuery::enabled_only())
    }

    pub fn enable_source(&self, id: SourceId) -> RepoResult<()> {
        self.repo.set_enabled(id, true)
    }

    pub fn disable_source(&self, id: SourceId) -> RepoResult<()> {
        self.repo.set_enabled(id, false)
    }

    pub fn remove_source(&self, id: SourceId) -> RepoResult<()> {
        self.repo.delete_source(id)?;
        info!("event=source_remove module=service status=ok source_id={id}");
        Ok(())
    }

    /// Regenerates the sources.list at `path` from enabled sources.
    ///
    /// Returns the number of entries written.
    pub fn sync_sources_list(&self, path: &Path) -> Result<usize, ServiceError> {
        let enabled = self.enabled_sources()?;
        sources_list::write_sources_list(path, &enabled)?;
        Ok(enabled.len())
    }

    /// Package-list files in `dir` owned by enabled sources.
    pub fn detect_source_files(&self, dir: &Path) -> RepoResult<Vec<PathBuf>> {
        let enabled = self.enabled_sources()?;
        Ok(sources_list::detect_source_files(dir, &enabled))
    }
}
