//! apt `sources.list` generation and package-list file detection.
//!
//! # Responsibility
//! - Render enabled sources as `deb` lines for apt.
//! - Derive the file-name prefix apt uses for a source's package lists.
//! - Find downloaded package-list files that belong to enabled sources.
//!
//! # Invariants
//! - Disabled sources never appear in rendered output or detection.
//! - A source whose URL does not parse yields no prefix and matches no file.

use crate::model::source::SourceRecord;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// First line of every generated sources.list.
pub const SOURCES_LIST_HEADER: &str = "# Generated by aptsource\n";

pub type SyncResult<T> = Result<T, SyncError>;

/// Failure while writing generated files.
#[derive(Debug)]
pub enum SyncError {
    Io { path: PathBuf, source: io::Error },
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to write `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Renders the sources.list body for the enabled entries of `sources`.
///
/// Each entry is `deb [trusted=yes] <url> <repo>` followed by a newline and
/// entries are separated by one more newline, so consecutive entries are
/// split by a blank line.
pub fn render_sources_list(sources: &[SourceRecord]) -> String {
    let entries = sources
        .iter()
        .filter(|source| source.enabled)
        .map(|source| format!("deb [trusted=yes] {} {}\n", source.url, source.repo))
        .collect::<Vec<_>>();

    let mut content = String::from(SOURCES_LIST_HEADER);
    content.push_str(&entries.join("\n"));
    content
}

/// Writes the rendered sources.list to `path`, creating parent directories.
pub fn write_sources_list(path: &Path, sources: &[SourceRecord]) -> SyncResult<()> {
    let content = render_sources_list(sources);
    let io_error = |source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, content).map_err(io_error)?;

    info!(
        "event=sources_list_write module=sync status=ok path={} entries={}",
        path.display(),
        sources.iter().filter(|source| source.enabled).count()
    );
    Ok(())
}

/// Returns the package-list file name prefix for `source`.
///
/// Layout: `<host>[:<port>][_<path>]_dists_<repo>_binary-`, where `/` in the
/// path and spaces in the repo become `_`. The port is included whenever the
/// URL spells one out, even if it is the scheme default. Returns `None` when
/// the URL cannot be parsed.
pub fn package_list_prefix(source: &SourceRecord) -> Option<String> {
    let url = match Url::parse(&source.url) {
        Ok(url) => url,
        Err(err) => {
            warn!(
                "event=package_list_prefix module=sync status=error source_id={} error={err}",
                source.id()
            );
            return None;
        }
    };

    let mut prefix = url.host_str().unwrap_or_default().to_string();
    if let Some(port) = explicit_port(&source.url, &url) {
        prefix.push_str(&format!(":{port}"));
    }

    let path = url.path().trim_matches('/');
    if !path.is_empty() {
        prefix.push('_');
        prefix.push_str(&path.replace('/', "_"));
    }

    prefix.push_str("_dists_");
    prefix.push_str(&source.repo.replace(' ', "_"));
    prefix.push_str("_binary-");
    Some(prefix)
}

/// Port written in the URL text. `Url::port` drops scheme defaults such as
/// `:443`, so those are recovered from the raw authority.
fn explicit_port(raw: &str, url: &Url) -> Option<u16> {
    if let Some(port) = url.port() {
        return Some(port);
    }
    let default_port = url.port_or_known_default()?;
    let authority = raw.trim().split_once("://")?.1.split(['/', '?', '#']).next()?;
    let host_and_port = authority.rsplit_once('@').map_or(authority, |(_, rest)| rest);
    host_and_port
        .rsplit_once(':')
        .and_then(|(_, port)| port.parse::<u16>().ok())
        .filter(|port| *port == default_port)
}

/// Lists files in `dir` that belong to enabled sources, sorted by path.
///
/// An unreadable directory yields an empty list.
pub fn detect_source_files(dir: &Path, sources: &[SourceRecord]) -> Vec<PathBuf> {
    let prefixes = sources
        .iter()
        .filter(|source| source.enabled)
        .filter_map(package_list_prefix)
        .collect::<Vec<_>>();

    if prefixes.is_empty() {
        return Vec::new();
    }

    match matching_files(dir, &prefixes) {
        Ok(files) => files,
        Err(err) => {
            error!(
                "event=detect_source_files module=sync status=error dir={} error={err}",
                dir.display()
            );
            Vec::new()
        }
    }
}

fn matching_files(dir: &Path, prefixes: &[String]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if prefixes.iter().any(|prefix| name.starts_with(prefix.as_str())) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
