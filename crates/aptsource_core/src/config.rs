//! Core configuration loaded from TOML.
//!
//! # Responsibility
//! - Describe where the source database and apt artifacts live.
//! - Supply defaults for every key so an empty file is valid.
//!
//! # Invariants
//! - Relative paths in a config file resolve against that file's directory.
//! - Loading never touches the database or log backend.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_DB_FILE: &str = "aptsource.db";
const DEFAULT_SOURCES_LIST: &str = "/etc/apt/sources.list.d/aptsource.list";
const DEFAULT_PACKAGE_LIST_DIR: &str = "/var/lib/apt/lists";

/// Errors while reading or parsing a config file.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Runtime settings shared by the CLI and embedders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite file holding the `sources` table.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Rolling log directory. File logging is off when unset.
    pub log_dir: Option<PathBuf>,
    /// Generated apt list file.
    pub sources_list_path: PathBuf,
    /// Directory where apt stores downloaded package lists.
    pub package_list_dir: PathBuf,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            sources_list_path: PathBuf::from(DEFAULT_SOURCES_LIST),
            package_list_dir: PathBuf::from(DEFAULT_PACKAGE_LIST_DIR),
        }
    }
}

impl CoreConfig {
    /// Reads and parses `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = config_base_dir(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&text, &base_dir).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses TOML text, resolving relative paths against `base_dir`.
    pub fn from_toml_str(text: &str, base_dir: &Path) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(text)?;
        config.db_path = resolve(base_dir, &config.db_path);
        config.sources_list_path = resolve(base_dir, &config.sources_list_path);
        config.package_list_dir = resolve(base_dir, &config.package_list_dir);
        config.log_dir = config.log_dir.as_deref().map(|dir| resolve(base_dir, dir));
        Ok(config)
    }
}

/// Absolute directory holding `path`, so that paths resolved from a config
/// opened by relative name stay valid after the working directory changes.
fn config_base_dir(path: &Path) -> io::Result<PathBuf> {
    match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => std::path::absolute(parent),
        None => std::env::current_dir(),
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use std::fs;
    use std::path::{Path, PathBuf};

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_toml_str("", Path::new("")).unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let config = CoreConfig::from_toml_str(
            r#"
            db_path = "state/sources.db"
            log_dir = "/var/log/aptsource"
            sources_list_path = "apt/aptsource.list"
            "#,
            Path::new("/opt/aptsource"),
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/opt/aptsource/state/sources.db"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/aptsource")));
        assert_eq!(
            config.sources_list_path,
            PathBuf::from("/opt/aptsource/apt/aptsource.list")
        );
        assert_eq!(config.package_list_dir, PathBuf::from("/var/lib/apt/lists"));
    }

    #[test]
    fn load_reports_missing_file_as_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = CoreConfig::load(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Io { path: reported, .. } if reported == path));
    }

    #[test]
    fn load_reports_malformed_toml_as_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aptsource.toml");
        fs::write(&path, "db_path = [unterminated").unwrap();

        let err = CoreConfig::load(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { path: reported, .. } if reported == path));
    }

    #[test]
    fn load_resolves_relative_paths_against_config_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aptsource.toml");
        fs::write(&path, "db_path = \"sources.db\"\nlog_dir = \"logs\"\n").unwrap();

        let config = CoreConfig::load(&path).unwrap();

        assert_eq!(config.db_path, dir.path().join("sources.db"));
        assert_eq!(config.log_dir, Some(dir.path().join("logs")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CoreConfig::from_toml_str("db = \"x\"", Path::new("")).unwrap_err();
        assert!(err.to_string().contains("unknown field"), "unexpected error: {err}");
    }
}
