// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Club cache refresh and selection tests.

use club_hub::db::{collections, DocumentStore};
use club_hub::error::Degraded;
use club_hub::services::clubs::load_fallback_json;
use club_hub::services::{ClubCache, ClubSource};
use serde_json::json;
use std::sync::Arc;

mod common;
use common::{club_fields, FlakyStore};

const FALLBACK: &str = r#"[
    { "id": "f-2", "name": "Second", "description": "", "category": "ARTS",
      "organizerId": "o", "createdAt": "2020-01-01T00:00:00Z" },
    { "id": "f-1", "name": "First", "description": "", "category": "ARTS",
      "organizerId": "o", "createdAt": "2024-01-01T00:00:00Z" },
    { "id": "f-3", "name": "Third", "description": "", "category": "ARTS",
      "organizerId": "o", "createdAt": "2022-01-01T00:00:00Z" }
]"#;

fn cache(store: &Arc<FlakyStore>) -> ClubCache {
    ClubCache::with_fallback(store.clone(), load_fallback_json(FALLBACK).unwrap())
}

fn ids(cache: &ClubCache) -> Vec<String> {
    cache.items().into_iter().map(|c| c.id).collect()
}

async fn seed(store: &FlakyStore, id: &str, created_at: &str) {
    store
        .set_document(collections::CLUBS, id, &club_fields(id, created_at))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_empty_store_uses_fallback_in_authored_order() {
    let store = Arc::new(FlakyStore::new());
    let cache = cache(&store);
    assert_eq!(cache.source(), ClubSource::Unloaded);

    cache.refresh().await;

    // Authored order, not re-sorted by createdAt.
    assert_eq!(ids(&cache), vec!["f-2", "f-1", "f-3"]);
    assert_eq!(cache.source(), ClubSource::Fallback);
    assert!(matches!(
        cache.snapshot().last_degradation,
        Some(Degraded::Fetch { .. })
    ));
}

#[tokio::test]
async fn test_remote_clubs_sorted_newest_first() {
    let store = Arc::new(FlakyStore::new());
    seed(&store, "chess", "2024-02-01T12:00:00Z").await;
    seed(&store, "rowing", "2024-06-15T08:00:00Z").await;
    seed(&store, "poetry", "2023-10-31T20:00:00Z").await;
    seed(&store, "climbing", "2024-06-15T09:00:00Z").await;
    let cache = cache(&store);

    cache.refresh().await;

    assert_eq!(ids(&cache), vec!["climbing", "rowing", "chess", "poetry"]);
    assert_eq!(cache.source(), ClubSource::Remote);
    assert!(cache.snapshot().last_degradation.is_none());

    let club = cache.find("chess").expect("chess cached");
    assert_eq!(club.name, "chess");
    assert_eq!(club.organizer_id, "organizer");
}

#[tokio::test]
async fn test_store_failure_falls_back_without_error() {
    let store = Arc::new(FlakyStore::new());
    seed(&store, "chess", "2024-02-01T12:00:00Z").await;
    store.fail_reads(true);
    let cache = cache(&store);

    cache.refresh().await;

    assert_eq!(ids(&cache), vec!["f-2", "f-1", "f-3"]);
    let degraded = cache.snapshot().last_degradation.expect("degradation recorded");
    assert!(degraded.to_string().contains("injected failure"));
}

#[tokio::test]
async fn test_malformed_document_falls_back() {
    let store = Arc::new(FlakyStore::new());
    seed(&store, "chess", "2024-02-01T12:00:00Z").await;
    store
        .set_document(
            collections::CLUBS,
            "broken",
            &json!({ "name": "Broken", "createdAt": "2024-03-01T00:00:00Z" }),
        )
        .await
        .unwrap();
    let cache = cache(&store);

    cache.refresh().await;

    assert_eq!(cache.source(), ClubSource::Fallback);
    assert_eq!(ids(&cache), vec!["f-2", "f-1", "f-3"]);
}

#[tokio::test]
async fn test_refresh_fully_replaces_items() {
    let store = Arc::new(FlakyStore::new());
    seed(&store, "chess", "2024-02-01T12:00:00Z").await;
    let cache = cache(&store);

    cache.refresh().await;
    assert_eq!(ids(&cache), vec!["chess"]);

    store.fail_reads(true);
    cache.refresh().await;
    assert_eq!(ids(&cache), vec!["f-2", "f-1", "f-3"]);

    store.fail_reads(false);
    seed(&store, "rowing", "2025-01-01T00:00:00Z").await;
    cache.refresh().await;
    assert_eq!(ids(&cache), vec!["rowing", "chess"]);
    assert_eq!(cache.source(), ClubSource::Remote);
}

#[tokio::test]
async fn test_concurrent_refreshes_settle_consistently() {
    let store = Arc::new(FlakyStore::new());
    seed(&store, "a", "2024-01-01T00:00:00Z").await;
    seed(&store, "b", "2024-02-01T00:00:00Z").await;
    let cache = Arc::new(cache(&store));

    let refreshes = (0..5).map(|_| {
        let cache = cache.clone();
        async move { cache.refresh().await }
    });
    futures_util::future::join_all(refreshes).await;

    assert_eq!(ids(&cache), vec!["b", "a"]);
}

#[tokio::test]
async fn test_selection_keeps_duplicates_until_cleared() {
    let store = Arc::new(FlakyStore::new());
    let cache = cache(&store);
    cache.refresh().await;
    let club = cache.items()[0].clone();

    cache.select(club.clone());
    cache.select(club.clone());
    assert_eq!(cache.selected(), vec![club.clone(), club]);

    cache.clear_selection();
    assert!(cache.selected().is_empty());
}

#[tokio::test]
async fn test_selection_survives_refresh() {
    let store = Arc::new(FlakyStore::new());
    let cache = cache(&store);
    cache.refresh().await;
    cache.select(cache.items()[1].clone());

    cache.refresh().await;

    assert_eq!(cache.selected().len(), 1);
    assert_eq!(cache.selected()[0].id, "f-1");
}

#[tokio::test]
async fn test_subscribers_observe_refresh() {
    let store = Arc::new(FlakyStore::new());
    let cache = cache(&store);
    let mut rx = cache.subscribe();

    cache.refresh().await;

    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert_eq!(state.items.len(), 3);
    assert_eq!(state.source, ClubSource::Fallback);
}

#[tokio::test]
async fn test_bundled_fallback_used_by_default() {
    let store = Arc::new(FlakyStore::new());
    let cache = ClubCache::new(store).expect("bundled fallback loads");

    cache.refresh().await;

    assert_eq!(cache.source(), ClubSource::Fallback);
    assert!(!cache.items().is_empty());
}
