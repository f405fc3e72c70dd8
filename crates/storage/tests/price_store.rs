use std::sync::Arc;

use board::{default_items, PricedItem};
use storage::{Store, StoreError};

fn file_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}", dir.path().join("prices.db").display())
}

#[tokio::test]
async fn first_read_seeds_defaults_and_later_reads_match() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Store::new(file_url(&dir));

    let first = store.read_all().await.expect("first read");
    assert_eq!(first.items, default_items());

    for _ in 0..3 {
        let again = store.read_all().await.expect("repeat read");
        assert_eq!(again, first, "reads without writes must be identical");
    }
}

#[tokio::test]
async fn seeding_survives_reopening_the_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = file_url(&dir);

    let seeded = Store::new(url.clone()).read_all().await.expect("seed");
    let reopened = Store::connect(&url).await.expect("reopen");
    let read = reopened.read_all().await.expect("read");
    assert_eq!(read, seeded);
}

#[tokio::test]
async fn replace_then_read_returns_exactly_the_new_list() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Store::new(file_url(&dir));
    store.read_all().await.expect("seed");

    let list = vec![
        PricedItem::new(9, "Nhẫn trơn", 70_000_000, 71_000_000),
        PricedItem::new(2, "SJC 980", 80_000_000, 82_000_000),
    ];
    let written = store.replace_all(list.clone()).await.expect("replace");
    assert_eq!(written.items, list);

    let read = store.read_all().await.expect("read after replace");
    assert_eq!(read.items, list, "insertion order is kept, old rows are gone");
    assert_eq!(read.updated_at, written.updated_at);
}

#[tokio::test]
async fn empty_replace_is_rejected_and_keeps_prior_list() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Store::new(file_url(&dir));
    let before = store.read_all().await.expect("seed");

    let err = store.replace_all(Vec::new()).await.expect_err("empty list rejected");
    assert!(matches!(err, StoreError::Validation(_)));

    let after = store.read_all().await.expect("read");
    assert_eq!(after, before);
}

#[tokio::test]
async fn duplicate_ids_are_rejected_without_touching_rows() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Store::new(file_url(&dir));
    let before = store.read_all().await.expect("seed");

    let err = store
        .replace_all(vec![
            PricedItem::new(1, "a", 1, 1),
            PricedItem::new(1, "b", 2, 2),
        ])
        .await
        .expect_err("duplicates rejected");
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.read_all().await.expect("read"), before);
}

#[tokio::test]
async fn later_writer_wins_in_full() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Store::new(file_url(&dir));
    store.read_all().await.expect("seed");

    let first = vec![PricedItem::new(1, "SJC 9999", 1, 2)];
    let second = vec![PricedItem::new(2, "PNJ 9999", 3, 4)];
    store.replace_all(first).await.expect("first write");
    store.replace_all(second.clone()).await.expect("second write");

    assert_eq!(store.read_all().await.expect("read").items, second);
}

#[tokio::test]
async fn concurrent_readers_never_see_a_mixed_list() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(Store::new(file_url(&dir)));
    let old = store.read_all().await.expect("seed").items;
    let new: Vec<PricedItem> = (100..110)
        .map(|id| PricedItem::new(id, format!("item {id}"), 10, 20))
        .collect();

    let writer = {
        let store = Arc::clone(&store);
        let new = new.clone();
        tokio::spawn(async move {
            for _ in 0..5 {
                store.replace_all(new.clone()).await.expect("write");
            }
        })
    };

    for _ in 0..20 {
        // sqlite may report busy under contention; only successful reads are checked.
        if let Ok(snapshot) = store.read_all().await {
            assert!(
                snapshot.items == old || snapshot.items == new,
                "observed a torn list: {:?}",
                snapshot.items
            );
        }
    }
    writer.await.expect("writer task");
}

#[tokio::test]
async fn in_memory_store_keeps_state_across_calls() {
    let store = Store::new("sqlite::memory:");
    store.read_all().await.expect("seed");
    let list = vec![PricedItem::new(3, "PNJ 9999", 5, 6)];
    store.replace_all(list.clone()).await.expect("replace");
    assert_eq!(store.read_all().await.expect("read").items, list);
    assert!(store
        .validate_required_tables()
        .await
        .expect("tables")
        .is_empty());
}
