//! Core library for managing apt package sources.
//!
//! Holds the source record, its SQLite storage adapter, and the services
//! that turn stored sources into apt configuration.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{
    default_log_level, init_logging, logging_status, normalize_level, LoggingError,
};
pub use model::source::{SourceId, SourceRecord};
pub use repo::source_repo::{
    RepoError, RepoResult, SourceListQuery, SourceRepository, SqliteSourceRepository,
};
pub use service::source_service::{ServiceError, SourceService};
pub use service::sources_list::{
    detect_source_files, package_list_prefix, render_sources_list, write_sources_list, SyncError,
    SOURCES_LIST_HEADER,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
