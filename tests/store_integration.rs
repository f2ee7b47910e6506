//! Visit store integration tests

use utmrelay::store::{SqliteVisitStore, VisitRecord, VisitStore};

fn visit(uri_to: &str) -> VisitRecord {
    VisitRecord {
        uri_to: uri_to.to_string(),
        uri_from: format!("http://www.example.com{uri_to}"),
        ip: "203.0.113.9".to_string(),
        host: "www.example.com".to_string(),
    }
}

#[tokio::test]
async fn sqlite_store_round_trips_visits() {
    let store = SqliteVisitStore::new("sqlite::memory:", 1).await.unwrap();
    store.init().await.unwrap();

    assert_eq!(store.visit_count().await.unwrap(), 0);

    store.record_visit(&visit("/landing")).await.unwrap();
    store.record_visit(&visit("/pricing")).await.unwrap();

    assert_eq!(store.visit_count().await.unwrap(), 2);
}

#[tokio::test]
async fn init_is_idempotent() {
    let store = SqliteVisitStore::new("sqlite::memory:", 1).await.unwrap();
    store.init().await.unwrap();
    store.init().await.unwrap();

    store.record_visit(&visit("/landing")).await.unwrap();
    assert_eq!(store.visit_count().await.unwrap(), 1);
}
