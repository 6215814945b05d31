//! Package source domain model.
//!
//! # Responsibility
//! - Define the record describing one configured remote package repository.
//! - Keep identity assignment out of reach of application code.
//!
//! # Invariants
//! - `id` is unassigned until the storage adapter inserts the record.
//! - Once assigned, `id` never changes for the lifetime of the value.
//! - `url` and `repo` are stored as given; the record validates nothing.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Row key of a persisted source.
///
/// Always positive. SQLite `AUTOINCREMENT` keys start at 1, so `0` is free
/// to mean "unassigned" on the raw integer accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SourceId(i64);

impl SourceId {
    /// Wraps a raw row key. Returns `None` for zero or negative values.
    pub fn new(raw: i64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// Returns the raw integer row key.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raised when something tries to re-key an already persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IdAlreadyAssigned {
    pub(crate) current: SourceId,
    pub(crate) attempted: SourceId,
}

impl Display for IdAlreadyAssigned {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "source already has id {}; refusing to reassign to {}",
            self.current, self.attempted
        )
    }
}

impl Error for IdAlreadyAssigned {}

/// One configured package repository: base URL, repository name and an
/// active flag.
///
/// `url`, `repo` and `enabled` are plain public fields. The identifier is
/// read through [`SourceRecord::id`] and written only by the storage layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Imported records always start unpersisted.
    #[serde(skip_deserializing)]
    id: Option<SourceId>,
    /// Base address of the remote repository.
    pub url: String,
    /// Repository identifier at that address (apt suite/component line).
    pub repo: String,
    /// Whether consumers should use this source.
    pub enabled: bool,
}

impl SourceRecord {
    /// Creates a source with all three user fields set. The id stays
    /// unassigned until the record is saved.
    pub fn new(url: impl Into<String>, repo: impl Into<String>, enabled: bool) -> Self {
        Self {
            id: None,
            url: url.into(),
            repo: repo.into(),
            enabled,
        }
    }

    /// Creates a blank record to be filled field by field.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Raw row key, `0` while the record has not been saved.
    pub fn id(&self) -> i64 {
        self.id.map_or(0, SourceId::get)
    }

    /// Typed row key, `None` while the record has not been saved.
    pub fn source_id(&self) -> Option<SourceId> {
        self.id
    }

    /// Whether the storage layer has assigned an id.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Sets the id exactly once. Called by the storage adapter after insert
    /// and when hydrating rows.
    pub(crate) fn assign_id(&mut self, id: SourceId) -> Result<(), IdAlreadyAssigned> {
        match self.id {
            Some(current) => Err(IdAlreadyAssigned {
                current,
                attempted: id,
            }),
            None => {
                self.id = Some(id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SourceId, SourceRecord};

    fn id(raw: i64) -> SourceId {
        SourceId::new(raw).expect("positive id")
    }

    #[test]
    fn assign_id_sets_key_and_keeps_fields() {
        let mut source = SourceRecord::new("https://example.com/repo", "main", true);

        source.assign_id(id(7)).expect("first assignment succeeds");

        assert_eq!(source.id(), 7);
        assert_eq!(source.source_id(), Some(id(7)));
        assert!(source.is_persisted());
        assert_eq!(source.url, "https://example.com/repo");
        assert_eq!(source.repo, "main");
        assert!(source.enabled);
    }

    #[test]
    fn assign_id_twice_is_rejected_and_keeps_first_key() {
        let mut source = SourceRecord::empty();
        source.assign_id(id(7)).unwrap();

        let err = source.assign_id(id(9)).unwrap_err();

        assert_eq!(err.current, id(7));
        assert_eq!(err.attempted, id(9));
        assert_eq!(source.id(), 7);
    }

    #[test]
    fn field_mutation_does_not_touch_id() {
        let mut source = SourceRecord::empty();
        source.assign_id(id(3)).unwrap();

        source.url = "https://mirror.example.org".to_string();
        source.repo = "stable main".to_string();
        source.enabled = true;

        assert_eq!(source.id(), 3);
        assert_eq!(source.url, "https://mirror.example.org");
    }

    #[test]
    fn source_id_rejects_non_positive_values() {
        assert_eq!(SourceId::new(0), None);
        assert_eq!(SourceId::new(-4), None);
        assert_eq!(SourceId::new(1).map(SourceId::get), Some(1));
    }
}
