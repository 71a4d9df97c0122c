//! Tests for builder modules

use std::sync::Arc;

use chrono::{DateTime, Utc};
use prestoposti::builders::{build_store, WaitlistBuilder};
use prestoposti::config::{StoreBackendConfig, WaitlistConfig};
use prestoposti::core::{NullNotifier, PartyState, PartyStore, WaitlistError};
use prestoposti::infra::store::InMemoryPartyStore;
use prestoposti::util::{Clock, ManualClock};

#[test]
fn test_waitlist_builder_keeps_config() {
    let config = WaitlistConfig {
        seat_capacity: 4,
        ..WaitlistConfig::default()
    };
    let builder = WaitlistBuilder::new(config.clone());
    assert_eq!(builder.config(), &config);
}

#[tokio::test]
async fn test_build_applies_limits_and_clock() {
    let start = DateTime::<Utc>::from_timestamp(1_714_590_000, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let waitlist = WaitlistBuilder::new(WaitlistConfig {
        seat_capacity: 4,
        ..WaitlistConfig::default()
    })
    .with_clock(clock.clone())
    .build()
    .await
    .unwrap();

    assert_eq!(waitlist.limits().seat_capacity, 4);
    assert_eq!(waitlist.now(), clock.now());
    assert!(waitlist.join("Too big", 5).await.is_err());
}

#[tokio::test]
async fn test_build_rejects_invalid_config() {
    let result = WaitlistBuilder::new(WaitlistConfig {
        seat_capacity: 0,
        ..WaitlistConfig::default()
    })
    .build()
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_build_with_injected_store() {
    let store = Arc::new(InMemoryPartyStore::new());
    let service = WaitlistBuilder::new(WaitlistConfig::default())
        .with_store(store.clone())
        .build_service(Arc::new(NullNotifier))
        .await
        .unwrap();

    service.join("Party #1", 2).await.unwrap();
    let waiting = store.list(Some(PartyState::Waiting)).await.unwrap();
    assert_eq!(waiting.len(), 1);
}

#[tokio::test]
async fn test_build_store_in_memory() {
    let store = build_store(&StoreBackendConfig::InMemory).await.unwrap();
    assert!(store.list(None).await.unwrap().is_empty());
}

#[cfg(not(feature = "postgres"))]
#[tokio::test]
async fn test_build_store_postgres_requires_feature() {
    let result = build_store(&StoreBackendConfig::Postgres {
        url: "postgres://localhost/waitlist".to_string(),
        max_connections: 1,
    })
    .await;
    assert!(matches!(result, Err(WaitlistError::Validation(_))));
}

#[tokio::test]
async fn test_build_file_store_survives_rebuild() {
    let dir = std::env::temp_dir().join(format!(
        "prestoposti-builder-{}",
        uuid::Uuid::new_v4().simple()
    ));
    let config = WaitlistConfig {
        store: StoreBackendConfig::File {
            path: dir.clone(),
            stream: "queue".to_string(),
        },
        ..WaitlistConfig::default()
    };

    let id = {
        let waitlist = WaitlistBuilder::new(config.clone()).build().await.unwrap();
        let id = waitlist.join("Party #1", 3).await.unwrap().id;
        waitlist.close().await.unwrap();
        id
    };

    let reopened = WaitlistBuilder::new(config).build().await.unwrap();
    let party = reopened.get(&id).await.unwrap();
    assert_eq!(party.party_size, 3);
    assert_eq!(party.state, PartyState::Waiting);

    let _ = std::fs::remove_dir_all(dir);
}
