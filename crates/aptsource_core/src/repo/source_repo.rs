//! Source repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Map `SourceRecord` values to rows of the `sources` table and back.
//! - Own id assignment: the only path that gives a record its key.
//!
//! # Invariants
//! - Insert assigns the generated row id exactly once.
//! - Updates never change a record's id.
//! - Read paths reject corrupt rows instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::source::{SourceId, SourceRecord};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const SOURCES_TABLE: &str = "sources";
const SOURCE_COLUMNS: [&str; 4] = ["id", "url", "repo", "enabled"];
const SOURCE_SELECT_SQL: &str = "SELECT id, url, repo, enabled FROM sources";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from source persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// No row exists for this id.
    NotFound(SourceId),
    /// Update requested for a record that was never inserted.
    NotPersisted,
    /// Insert requested for a record that already has a row.
    AlreadyPersisted(SourceId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted back into a record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "source not found: {id}"),
            Self::NotPersisted => write!(f, "source has not been saved yet"),
            Self::AlreadyPersisted(id) => write!(f, "source already saved with id {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "source repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "source repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "source repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted source data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter and pagination options for listing sources.
#[derive(Debug, Clone, Default)]
pub struct SourceListQuery {
    /// `Some(true)` lists only enabled sources, `Some(false)` only disabled.
    pub enabled: Option<bool>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl SourceListQuery {
    /// Query for every enabled source in id order.
    pub fn enabled_only() -> Self {
        Self {
            enabled: Some(true),
            ..Self::default()
        }
    }
}

/// Repository interface for source persistence.
pub trait SourceRepository {
    /// Inserts an unsaved record and assigns its generated id.
    fn insert_source(&self, source: &mut SourceRecord) -> RepoResult<SourceId>;
    /// Writes `url`, `repo` and `enabled` of a saved record.
    fn update_source(&self, source: &SourceRecord) -> RepoResult<()>;
    /// Inserts when unsaved, updates otherwise. The id never changes once set.
    fn save_source(&self, source: &mut SourceRecord) -> RepoResult<SourceId>;
    fn get_source(&self, id: SourceId) -> RepoResult<Option<SourceRecord>>;
    fn list_sources(&self, query: &SourceListQuery) -> RepoResult<Vec<SourceRecord>>;
    fn set_enabled(&self, id: SourceId, enabled: bool) -> RepoResult<()>;
    fn delete_source(&self, id: SourceId) -> RepoResult<()>;
}

/// SQLite-backed source repository.
pub struct SqliteSourceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSourceRepository<'conn> {
    /// Creates a repository over a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version does not match.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema is
    ///   not the one this build expects.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SourceRepository for SqliteSourceRepository<'_> {
    fn insert_source(&self, source: &mut SourceRecord) -> RepoResult<SourceId> {
        if let Some(id) = source.source_id() {
            return Err(RepoError::AlreadyPersisted(id));
        }

        self.conn.execute(
            "INSERT INTO sources (url, repo, enabled) VALUES (?1, ?2, ?3);",
            params![
                source.url.as_str(),
                source.repo.as_str(),
                bool_to_int(source.enabled)
            ],
        )?;

        let raw_id = self.conn.last_insert_rowid();
        let id = SourceId::new(raw_id).ok_or_else(|| {
            RepoError::InvalidData(format!("sqlite generated non-positive row id {raw_id}"))
        })?;
        source
            .assign_id(id)
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;

        debug!("event=source_insert module=repo status=ok source_id={id}");
        Ok(id)
    }

    fn update_source(&self, source: &SourceRecord) -> RepoResult<()> {
        let id = source.source_id().ok_or(RepoError::NotPersisted)?;

        let changed = self.conn.execute(
            "UPDATE sources
             SET url = ?1, repo = ?2, enabled = ?3
             WHERE id = ?4;",
            params![
                source.url.as_str(),
                source.repo.as_str(),
                bool_to_int(source.enabled),
                id.get(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn save_source(&self, source: &mut SourceRecord) -> RepoResult<SourceId> {
        match source.source_id() {
            Some(id) => {
                self.update_source(source)?;
                Ok(id)
            }
            None => self.insert_source(source),
        }
    }

    fn get_source(&self, id: SourceId) -> RepoResult<Option<SourceRecord>> {
        let source = self
            .conn
            .query_row(
                &format!("{SOURCE_SELECT_SQL} WHERE id = ?1;"),
                [id.get()],
                |row| Ok(parse_source_row(row)),
            )
            .optional()?;

        source.transpose()
    }

    fn list_sources(&self, query: &SourceListQuery) -> RepoResult<Vec<SourceRecord>> {
        let mut sql = format!("{SOURCE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(enabled) = query.enabled {
            sql.push_str(" AND enabled = ?");
            bind_values.push(Value::Integer(bool_to_int(enabled)));
        }

        sql.push_str(" ORDER BY id ASC");

        match (query.limit, query.offset) {
            (Some(limit), offset) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                bind_values.push(Value::Integer(i64::from(limit)));
                bind_values.push(Value::Integer(i64::from(offset)));
            }
            (None, 0) => {}
            (None, offset) => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                bind_values.push(Value::Integer(i64::from(offset)));
            }
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut sources = Vec::new();

        while let Some(row) = rows.next()? {
            sources.push(parse_source_row(row)?);
        }

        Ok(sources)
    }

    fn set_enabled(&self, id: SourceId, enabled: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE sources SET enabled = ?1 WHERE id = ?2;",
            params![bool_to_int(enabled), id.get()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_source(&self, id: SourceId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM sources WHERE id = ?1;", [id.get()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        debug!("event=source_delete module=repo status=ok source_id={id}");
        Ok(())
    }
}

fn parse_source_row(row: &Row<'_>) -> RepoResult<SourceRecord> {
    let raw_id: i64 = row.get("id")?;
    let id = SourceId::new(raw_id)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid id `{raw_id}` in sources.id")))?;

    let enabled = match row.get::<_, i64>("enabled")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid enabled value `{other}` in sources.enabled"
            )));
        }
    };

    let mut source = SourceRecord::new(
        row.get::<_, String>("url")?,
        row.get::<_, String>("repo")?,
        enabled,
    );
    source
        .assign_id(id)
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    Ok(source)
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, SOURCES_TABLE)? {
        return Err(RepoError::MissingRequiredTable(SOURCES_TABLE));
    }

    for column in SOURCE_COLUMNS {
        if !table_has_column(conn, SOURCES_TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: SOURCES_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
