// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Club collection cache with bundled fallback data.
//!
//! `refresh` is best-effort: an empty or failed remote fetch is replaced
//! by the bundled sample clubs and never reported as an error.

use crate::db::{collections, Direction, Document, DocumentStore};
use crate::error::{Degraded, StoreError};
use crate::models::Club;
use crate::services::observable::Observable;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Sample clubs shipped with the binary.
const BUNDLED_FALLBACK: &str = include_str!("../../data/fallback_clubs.json");

/// Where the current `items` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClubSource {
    /// `refresh` has not completed yet.
    #[default]
    Unloaded,
    Remote,
    Fallback,
}

/// Snapshot of the cache.
#[derive(Debug, Clone, Default)]
pub struct ClubState {
    /// Newest first when remote; authored order when fallback.
    pub items: Vec<Club>,
    /// Clubs picked by the user this session. Duplicates are kept.
    pub selected: Vec<Club>,
    pub source: ClubSource,
    /// Why the last refresh fell back, if it did.
    pub last_degradation: Option<Degraded>,
}

/// Read-only local copy of the `clubs` collection plus the user's selection.
pub struct ClubCache {
    store: Arc<dyn DocumentStore>,
    fallback: Arc<[Club]>,
    state: Observable<ClubState>,
    refresh_lock: Mutex<()>,
}

impl ClubCache {
    /// Create a cache backed by the bundled fallback clubs.
    pub fn new(store: Arc<dyn DocumentStore>) -> Result<Self, FallbackError> {
        Ok(Self::with_fallback(store, load_fallback_json(BUNDLED_FALLBACK)?))
    }

    /// Create a cache with explicit fallback clubs.
    pub fn with_fallback(store: Arc<dyn DocumentStore>, fallback: Vec<Club>) -> Self {
        Self {
            store,
            fallback: fallback.into(),
            state: Default::default(),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Replace `items` from the remote store, or with fallback data.
    ///
    /// Concurrent calls run one at a time; each fully replaces `items`.
    pub async fn refresh(&self) {
        let _guard = self.refresh_lock.lock().await;

        let outcome = match self.fetch_remote().await {
            Ok(clubs) if !clubs.is_empty() => Ok(clubs),
            Ok(_) => Err(Degraded::Fetch {
                reason: "no clubs found".to_string(),
            }),
            Err(e) => Err(Degraded::Fetch {
                reason: e.to_string(),
            }),
        };

        match outcome {
            Ok(clubs) => {
                tracing::info!(count = clubs.len(), "Clubs refreshed from store");
                self.state.update(|s| {
                    s.items = clubs;
                    s.source = ClubSource::Remote;
                    s.last_degradation = None;
                });
            }
            Err(degraded) => {
                tracing::warn!(
                    error = %degraded,
                    fallback_count = self.fallback.len(),
                    "Using fallback clubs"
                );
                self.state.update(|s| {
                    s.items = self.fallback.to_vec();
                    s.source = ClubSource::Fallback;
                    s.last_degradation = Some(degraded);
                });
            }
        }
    }

    async fn fetch_remote(&self) -> Result<Vec<Club>, StoreError> {
        let docs = self
            .store
            .query_collection(collections::CLUBS, "createdAt", Direction::Descending)
            .await?;
        clubs_from_documents(&docs)
    }

    /// Append a club to the selection. Selecting twice keeps both entries.
    pub fn select(&self, club: Club) {
        tracing::debug!(club_id = %club.id, "Club selected");
        self.state.update(|s| s.selected.push(club));
    }

    pub fn clear_selection(&self) {
        self.state.update(|s| s.selected.clear());
    }

    pub fn items(&self) -> Vec<Club> {
        self.state.read(|s| s.items.clone())
    }

    pub fn selected(&self) -> Vec<Club> {
        self.state.read(|s| s.selected.clone())
    }

    pub fn source(&self) -> ClubSource {
        self.state.read(|s| s.source)
    }

    /// Look up a cached club by ID.
    pub fn find(&self, id: &str) -> Option<Club> {
        self.state
            .read(|s| s.items.iter().find(|c| c.id == id).cloned())
    }

    pub fn snapshot(&self) -> ClubState {
        self.state.get()
    }

    /// Observe cache changes.
    pub fn subscribe(&self) -> watch::Receiver<ClubState> {
        self.state.subscribe()
    }
}

/// Map query results to clubs, newest first.
///
/// A single malformed document fails the whole batch.
pub fn clubs_from_documents(docs: &[Document]) -> Result<Vec<Club>, StoreError> {
    let mut clubs = docs
        .iter()
        .map(Document::to_record::<Club>)
        .collect::<Result<Vec<_>, _>>()?;
    // Stable, so equal timestamps keep store order.
    clubs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(clubs)
}

/// Load fallback clubs from a JSON file.
pub fn load_fallback_file<P: AsRef<Path>>(path: P) -> Result<Vec<Club>, FallbackError> {
    let json =
        fs::read_to_string(path.as_ref()).map_err(|e| FallbackError::IoError(e.to_string()))?;
    load_fallback_json(&json)
}

/// Load fallback clubs from a JSON array.
pub fn load_fallback_json(json: &str) -> Result<Vec<Club>, FallbackError> {
    let clubs: Vec<Club> =
        serde_json::from_str(json).map_err(|e| FallbackError::ParseError(e.to_string()))?;
    if clubs.is_empty() {
        return Err(FallbackError::Empty);
    }
    tracing::debug!(count = clubs.len(), "Loaded fallback clubs");
    Ok(clubs)
}

/// Errors loading fallback data.
#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse fallback clubs: {0}")]
    ParseError(String),

    #[error("Fallback clubs must not be empty")]
    Empty,
}
