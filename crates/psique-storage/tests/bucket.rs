//! Integration tests against a real bucket.
//!
//! These tests need AWS credentials and a scratch bucket named in
//! `PSIQUE_TEST_BUCKET`. Everything is written under `it-tests/`.
//!
//! Run with: `cargo test -p psique-storage --test bucket -- --ignored`

use serde::{Deserialize, Serialize};

use psique_storage::bucket::Bucket;
use psique_storage::error::StorageError;
use psique_storage::{client, records};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Counter {
    value: u32,
}

async fn bucket() -> Bucket {
    let name = std::env::var("PSIQUE_TEST_BUCKET").expect("PSIQUE_TEST_BUCKET not set");
    Bucket::new(client::build_client().await, name)
}

#[tokio::test]
#[ignore]
async fn optimistic_save_rejects_stale_etag() {
    let bucket = bucket().await;
    let key = "it-tests/counter.json";

    records::save(&bucket, key, &Counter { value: 1 }).await.unwrap();
    let read = records::load_versioned::<Counter>(&bucket, key).await.unwrap();

    records::save_if_match(&bucket, key, &Counter { value: 2 }, &read.etag)
        .await
        .unwrap();
    let stale = records::save_if_match(&bucket, key, &Counter { value: 3 }, &read.etag).await;
    assert!(matches!(stale, Err(StorageError::PreconditionFailed { .. })));

    let current: Counter = records::load(&bucket, key).await.unwrap();
    assert_eq!(current.value, 2);

    bucket.delete_prefix("it-tests/").await.unwrap();
}

#[tokio::test]
#[ignore]
async fn load_all_skips_non_json_keys() {
    let bucket = bucket().await;
    records::save(&bucket, "it-tests/list/a.json", &Counter { value: 1 })
        .await
        .unwrap();
    bucket
        .put("it-tests/list/audio.m4a", b"raw".to_vec(), None)
        .await
        .unwrap();

    let all: Vec<Counter> = records::load_all(&bucket, "it-tests/list/").await.unwrap();
    assert_eq!(all, vec![Counter { value: 1 }]);

    let missing = records::load_optional::<Counter>(&bucket, "it-tests/list/none.json")
        .await
        .unwrap();
    assert!(missing.is_none());

    bucket.delete_prefix("it-tests/").await.unwrap();
}
