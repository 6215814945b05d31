use aptsource_core::db::open_db_in_memory;
use aptsource_core::{
    RepoError, SourceId, SourceListQuery, SourceRecord, SourceRepository, SqliteSourceRepository,
};

#[test]
fn insert_assigns_id_and_get_roundtrips() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSourceRepository::try_new(&conn).unwrap();

    let mut source = SourceRecord::new("https://example.com/repo", "main", true);
    let id = repo.insert_source(&mut source).unwrap();

    assert_eq!(source.source_id(), Some(id));
    assert!(source.id() > 0);

    let loaded = repo.get_source(id).unwrap().unwrap();
    assert_eq!(loaded, source);
}

#[test]
fn ids_increase_and_are_not_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSourceRepository::try_new(&conn).unwrap();

    let mut first = SourceRecord::new("https://a", "main", true);
    let mut second = SourceRecord::new("https://b", "main", true);
    let first_id = repo.insert_source(&mut first).unwrap();
    let second_id = repo.insert_source(&mut second).unwrap();
    assert!(second_id > first_id);

    repo.delete_source(second_id).unwrap();
    let mut third = SourceRecord::new("https://c", "main", true);
    let third_id = repo.insert_source(&mut third).unwrap();

    assert!(third_id > second_id);
}

#[test]
fn second_save_updates_fields_without_changing_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSourceRepository::try_new(&conn).unwrap();

    let mut source = SourceRecord::empty();
    source.url = "https://x".to_string();
    source.repo = "r".to_string();
    let first_id = repo.save_source(&mut source).unwrap();

    source.enabled = true;
    source.repo = "stable main".to_string();
    let second_id = repo.save_source(&mut source).unwrap();

    assert_eq!(first_id, second_id);
    assert_eq!(source.source_id(), Some(first_id));

    let loaded = repo.get_source(first_id).unwrap().unwrap();
    assert!(loaded.enabled);
    assert_eq!(loaded.repo, "stable main");
    assert_eq!(repo.list_sources(&SourceListQuery::default()).unwrap().len(), 1);
}

#[test]
fn update_unsaved_record_returns_not_persisted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSourceRepository::try_new(&conn).unwrap();

    let err = repo
        .update_source(&SourceRecord::new("https://x", "main", true))
        .unwrap_err();

    assert!(matches!(err, RepoError::NotPersisted));
}

#[test]
fn update_after_row_deleted_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSourceRepository::try_new(&conn).unwrap();

    let mut source = SourceRecord::new("https://x", "main", true);
    let id = repo.insert_source(&mut source).unwrap();
    repo.delete_source(id).unwrap();

    let err = repo.update_source(&source).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));
}

#[test]
fn get_missing_source_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSourceRepository::try_new(&conn).unwrap();

    let missing = SourceId::new(99).unwrap();
    assert_eq!(repo.get_source(missing).unwrap(), None);
}

#[test]
fn list_filters_by_enabled_flag_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSourceRepository::try_new(&conn).unwrap();

    for (url, enabled) in [("https://a", true), ("https://b", false), ("https://c", true)] {
        repo.insert_source(&mut SourceRecord::new(url, "main", enabled))
            .unwrap();
    }

    let enabled = repo.list_sources(&SourceListQuery::enabled_only()).unwrap();
    let urls = enabled.iter().map(|s| s.url.as_str()).collect::<Vec<_>>();
    assert_eq!(urls, ["https://a", "https://c"]);

    let disabled = repo
        .list_sources(&SourceListQuery {
            enabled: Some(false),
            ..SourceListQuery::default()
        })
        .unwrap();
    assert_eq!(disabled.len(), 1);
    assert_eq!(disabled[0].url, "https://b");
}

#[test]
fn list_supports_limit_and_offset() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSourceRepository::try_new(&conn).unwrap();

    for index in 0..5 {
        repo.insert_source(&mut SourceRecord::new(format!("https://m{index}"), "main", true))
            .unwrap();
    }

    let page = repo
        .list_sources(&SourceListQuery {
            limit: Some(2),
            offset: 1,
            ..SourceListQuery::default()
        })
        .unwrap();
    let urls = page.iter().map(|s| s.url.as_str()).collect::<Vec<_>>();
    assert_eq!(urls, ["https://m1", "https://m2"]);

    let tail = repo
        .list_sources(&SourceListQuery {
            offset: 3,
            ..SourceListQuery::default()
        })
        .unwrap();
    assert_eq!(tail.len(), 2);
}

#[test]
fn set_enabled_and_delete_report_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSourceRepository::try_new(&conn).unwrap();
    let missing = SourceId::new(5).unwrap();

    assert!(matches!(
        repo.set_enabled(missing, true).unwrap_err(),
        RepoError::NotFound(id) if id == missing
    ));
    assert!(matches!(
        repo.delete_source(missing).unwrap_err(),
        RepoError::NotFound(id) if id == missing
    ));
}

#[test]
fn duplicate_url_and_repo_pairs_are_stored_separately() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSourceRepository::try_new(&conn).unwrap();

    let first = repo
        .insert_source(&mut SourceRecord::new("https://a", "main", true))
        .unwrap();
    let second = repo
        .insert_source(&mut SourceRecord::new("https://a", "main", true))
        .unwrap();

    assert_ne!(first, second);
}
