use std::sync::Arc;
use versekit_core::db::{open_db, open_db_in_memory};
use versekit_core::{
    Bible, BibleEditor, BibleMetadata, BibleRepository, BibleStore, MemoryClipboard,
    MemorySettings, NodeTree, SqliteBibleRepository, SqliteBibleStore, StoreError,
};

fn sample(name: &str) -> Bible {
    let mut meta = BibleMetadata::new(name);
    meta.language = "en".to_string();
    meta.copyright = "Public domain".to_string();
    Bible::from_books(
        meta,
        [
            NodeTree::book(1, "Genesis").with_children([
                NodeTree::chapter(1).with_children([
                    NodeTree::verse(1, "In the beginning"),
                    NodeTree::verse(2, "And the earth"),
                    NodeTree::verse(3, "And God said"),
                ]),
                NodeTree::chapter(2),
            ]),
            NodeTree::book(2, "Exodus"),
        ],
    )
    .unwrap()
}

#[test]
fn saved_documents_load_with_identical_ids_and_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBibleRepository::try_new(&conn).unwrap();
    let bible = sample("KJV");

    repo.save_bible(&bible).unwrap();
    let loaded = repo.load_bible(bible.meta.document_id).unwrap().unwrap();
    assert_eq!(loaded, bible);
}

#[test]
fn saving_again_replaces_previous_nodes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBibleRepository::try_new(&conn).unwrap();
    let bible = sample("KJV");
    repo.save_bible(&bible).unwrap();

    let smaller = Bible::restore(
        bible.meta.clone(),
        bible.root(),
        Vec::new(),
    )
    .unwrap();
    repo.save_bible(&smaller).unwrap();

    let loaded = repo.load_bible(bible.meta.document_id).unwrap().unwrap();
    assert_eq!(loaded.len(), 1);
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM bible_nodes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn create_refuses_existing_ids_and_list_sorts_by_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBibleRepository::try_new(&conn).unwrap();
    let kjv = sample("kjv");
    let asv = sample("ASV");

    repo.create_bible(&kjv).unwrap();
    repo.create_bible(&asv).unwrap();
    let err = repo.create_bible(&kjv).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(id) if id == kjv.meta.document_id));

    let names: Vec<String> = repo
        .list_bibles()
        .unwrap()
        .into_iter()
        .map(|summary| summary.name)
        .collect();
    assert_eq!(names, vec!["ASV", "kjv"]);
}

#[test]
fn delete_removes_document_and_missing_ids_are_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBibleRepository::try_new(&conn).unwrap();
    let bible = sample("KJV");
    repo.save_bible(&bible).unwrap();

    repo.delete_bible(bible.meta.document_id).unwrap();
    assert!(repo.load_bible(bible.meta.document_id).unwrap().is_none());
    assert!(matches!(
        repo.delete_bible(bible.meta.document_id),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn repository_requires_a_migrated_connection() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let err = SqliteBibleRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        StoreError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn corrupted_node_rows_are_rejected_on_load() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBibleRepository::try_new(&conn).unwrap();
    let bible = sample("KJV");
    repo.save_bible(&bible).unwrap();

    conn.execute(
        "UPDATE bible_nodes SET parent_uuid = ?1 WHERE kind = 'chapter';",
        [uuid::Uuid::new_v4().to_string()],
    )
    .unwrap();
    let err = repo.load_bible(bible.meta.document_id).unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
}

#[test]
fn sqlite_store_persists_through_the_editor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bibles.db");
    let store = Arc::new(SqliteBibleStore::new(&path));
    let bible = sample("KJV");
    let document_id = bible.meta.document_id;
    let genesis = bible.children(bible.root()).unwrap()[0];

    let mut editor = BibleEditor::new(
        bible,
        MemoryClipboard::new(),
        Box::new(MemorySettings::default()),
    );
    editor.attach_store(store.clone()).unwrap();
    editor.select([genesis]);
    editor.new_chapter().unwrap();
    editor.save().unwrap();
    let reports = editor.wait_for_persistence();
    assert!(reports[0].error.is_none());
    assert!(!editor.is_dirty());

    let loaded = store.load(document_id).unwrap();
    assert_eq!(&loaded, editor.document());
    assert_eq!(store.list().unwrap().len(), 1);

    editor.save_as(None).unwrap();
    editor.wait_for_persistence();
    let conn = open_db(&path).unwrap();
    let repo = SqliteBibleRepository::try_new(&conn).unwrap();
    let names: Vec<String> = repo
        .list_bibles()
        .unwrap()
        .into_iter()
        .map(|summary| summary.name)
        .collect();
    assert_eq!(names, vec!["Copy of KJV", "KJV"]);
    assert!(matches!(
        store.load(uuid::Uuid::new_v4()),
        Err(StoreError::NotFound(_))
    ));
}
