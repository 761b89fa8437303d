use std::sync::Arc;

use storage::repository::{KeyValueStore, Storage};
use storage::sqlite::SqliteRepository;
use storage::{RecordName, RecordStore};
use study_core::model::{
    AnswerLedger, AnswerRecord, OptionIndex, ProgressBook, QuestionId, Subject, SubjectCatalog,
};
use study_core::time::fixed_now;

#[tokio::test]
async fn sqlite_items_upsert_and_delete() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_items?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // Migrations are idempotent.
    repo.migrate().await.expect("migrate again");

    assert_eq!(repo.get_item("answers").await.unwrap(), None);

    repo.set_item("answers", "{}").await.unwrap();
    repo.set_item("answers", r#"{"math":{}}"#).await.unwrap();
    assert_eq!(
        repo.get_item("answers").await.unwrap().as_deref(),
        Some(r#"{"math":{}}"#)
    );

    repo.remove_item("answers").await.unwrap();
    assert_eq!(repo.get_item("answers").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_records_survive_reopening_the_store() {
    let url = "sqlite:file:memdb_records?mode=memory&cache=shared";
    let storage = Storage::sqlite(url).await.expect("connect sqlite");
    let records = RecordStore::new(Arc::clone(&storage.items)).with_namespace("ged");
    let catalog = SubjectCatalog::ged();

    let report = records.ensure_initialized(&catalog).await.unwrap();
    assert!(report.created_answers && report.created_progress);

    let mut ledger = AnswerLedger::new();
    ledger.record(
        Subject::new("science").unwrap(),
        QuestionId::new(5).unwrap(),
        AnswerRecord::new(OptionIndex::new(1).unwrap(), false, fixed_now()),
    );
    records.write(RecordName::Answers, &ledger).await.unwrap();

    // A second handle on the same shared-cache database sees the writes.
    let reopened = Storage::sqlite(url).await.expect("reopen sqlite");
    let records = RecordStore::new(Arc::clone(&reopened.items)).with_namespace("ged");
    let report = records.ensure_initialized(&catalog).await.unwrap();
    assert!(!report.created_answers && !report.created_progress);

    let loaded: AnswerLedger = records.read(RecordName::Answers).await.unwrap().unwrap();
    assert_eq!(loaded, ledger);
    let book: ProgressBook = records.read(RecordName::Progress).await.unwrap().unwrap();
    assert_eq!(book, ProgressBook::zeroed(&catalog));
}
