//! Command line front end for `aptsource_core`.
//!
//! # Responsibility
//! - Map subcommands onto `SourceService` operations.
//! - Resolve configuration from file and flags before touching storage.

use anyhow::{Context, Result};
use aptsource_core::db::open_db;
use aptsource_core::{
    init_logging, normalize_level, CoreConfig, SourceId, SourceListQuery, SourceRecord,
    SourceService, SqliteSourceRepository,
};
use clap::{Parser, Subcommand};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "aptsource", version, about = "Manage apt package sources")]
struct Cli {
    /// TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the source database path.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Override the log level (trace|debug|info|warn|error).
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a source.
    Add {
        url: String,
        repo: String,
        /// Store the source without enabling it.
        #[arg(long)]
        disabled: bool,
    },
    /// List sources.
    List {
        /// Only show enabled sources.
        #[arg(long)]
        enabled: bool,
    },
    Enable {
        #[arg(value_parser = parse_source_id)]
        id: SourceId,
    },
    Disable {
        #[arg(value_parser = parse_source_id)]
        id: SourceId,
    },
    Remove {
        #[arg(value_parser = parse_source_id)]
        id: SourceId,
    },
    /// Write enabled sources to the apt sources.list.
    Sync {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show downloaded package lists that belong to enabled sources.
    Detect {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create `{}`", parent.display()))?;
    }
    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;
    let service = SourceService::new(SqliteSourceRepository::try_new(&conn)?);

    match cli.command {
        Command::Add {
            url,
            repo,
            disabled,
        } => {
            let source = service.add_source(url, repo, !disabled)?;
            println!("added source {}", source.id());
        }
        Command::List { enabled } => {
            let query = if enabled {
                SourceListQuery::enabled_only()
            } else {
                SourceListQuery::default()
            };
            for source in service.list_sources(&query)? {
                println!("{}", format_source(&source));
            }
        }
        Command::Enable { id } => {
            service.enable_source(id)?;
            println!("enabled source {id}");
        }
        Command::Disable { id } => {
            service.disable_source(id)?;
            println!("disabled source {id}");
        }
        Command::Remove { id } => {
            service.remove_source(id)?;
            println!("removed source {id}");
        }
        Command::Sync { output } => {
            let path = output.unwrap_or(config.sources_list_path);
            let written = service.sync_sources_list(&path)?;
            println!("wrote {written} source(s) to {}", path.display());
        }
        Command::Detect { dir } => {
            let dir = dir.unwrap_or(config.package_list_dir);
            for file in service.detect_source_files(&dir)? {
                println!("{}", file.display());
            }
        }
    }

    info!("event=cli_command module=cli status=ok");
    Ok(())
}

fn load_config(cli: &Cli) -> Result<CoreConfig> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    // Checked even when file logging is off so a typo never passes silently.
    config.log_level = normalize_level(&config.log_level)?.to_string();
    Ok(config)
}

fn parse_source_id(value: &str) -> Result<SourceId, String> {
    value
        .parse::<i64>()
        .ok()
        .and_then(SourceId::new)
        .ok_or_else(|| format!("`{value}` is not a positive source id"))
}

fn format_source(source: &SourceRecord) -> String {
    let state = if source.enabled { "enabled" } else { "disabled" };
    format!("{}\t{state}\t{}\t{}", source.id(), source.url, source.repo)
}

#[cfg(test)]
mod tests {
    use super::{format_source, load_config, parse_source_id, Cli};
    use aptsource_core::SourceRecord;
    use clap::{CommandFactory, Parser};

    #[test]
    fn unknown_log_level_is_rejected_without_log_dir() {
        let cli = Cli::try_parse_from(["aptsource", "--log-level", "bogus", "list"]).unwrap();

        let err = load_config(&cli).unwrap_err();

        assert!(err.to_string().contains("bogus"), "unexpected error: {err}");
    }

    #[test]
    fn log_level_flag_is_normalized() {
        let cli = Cli::try_parse_from(["aptsource", "--log-level", "WARNING", "list"]).unwrap();

        assert_eq!(load_config(&cli).unwrap().log_level, "warn");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_source_id_rejects_non_positive_and_garbage() {
        assert_eq!(parse_source_id("7").unwrap().get(), 7);
        assert!(parse_source_id("0").is_err());
        assert!(parse_source_id("-1").is_err());
        assert!(parse_source_id("abc").is_err());
    }

    #[test]
    fn format_source_shows_unsaved_id_as_zero() {
        let source = SourceRecord::new("https://a.example", "stable main", false);
        assert_eq!(
            format_source(&source),
            "0\tdisabled\thttps://a.example\tstable main"
        );
    }
}
