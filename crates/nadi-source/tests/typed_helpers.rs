//! Typed record helpers over the in-memory source

use nadi_model::{ClosureRecord, NewClosure, SiteId, Timestamp, Validate};
use nadi_source::{
    delete_record, insert_record, select_records, update_record, InMemorySource, RemoteError,
    Select,
};
use serde_json::json;

fn ts(raw: &str) -> Timestamp {
    raw.parse().unwrap()
}

#[tokio::test]
async fn inserted_record_is_selectable_by_scope() {
    let source = InMemorySource::new();
    let site = SiteId::new();
    let payload = NewClosure::new(Some(site), "Audit", ts("2025-01-10"), ts("2025-01-12"))
        .validate()
        .unwrap();

    let stored: ClosureRecord = insert_record(&source, &payload).await.unwrap();
    assert_eq!(stored.site_id, site);

    let rows: Vec<ClosureRecord> =
        select_records(&source, Select::from("nd_closures").eq("site_id", site))
            .await
            .unwrap();
    assert_eq!(rows, vec![stored]);

    let other: Vec<ClosureRecord> =
        select_records(&source, Select::from("nd_closures").eq("site_id", SiteId::new()))
            .await
            .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn update_and_delete_need_exactly_one_row() {
    let source = InMemorySource::new();
    let payload = NewClosure::new(Some(SiteId::new()), "Audit", ts("2025-01-10"), ts("2025-01-12"))
        .validate()
        .unwrap();
    let stored: ClosureRecord = insert_record(&source, &payload).await.unwrap();

    let renamed: ClosureRecord = update_record(&source, stored.id, &json!({"title": "Stock take"}))
        .await
        .unwrap();
    assert_eq!(renamed.title, "Stock take");
    assert_eq!(renamed.start_date, stored.start_date);

    let removed: ClosureRecord = delete_record(&source, stored.id).await.unwrap();
    assert_eq!(removed.id, stored.id);

    let again = delete_record::<ClosureRecord>(&source, stored.id).await.unwrap_err();
    assert!(again.is_not_found());
}

#[tokio::test]
async fn malformed_rows_are_decode_errors() {
    let source = InMemorySource::from_seed(json!({
        "nd_closures": [{"id": "not-a-uuid", "title": 7}]
    }))
    .unwrap();
    let err = select_records::<ClosureRecord>(&source, Select::from("nd_closures"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Decode { table, .. } if table == "nd_closures"));
}
