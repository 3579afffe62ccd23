// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use club_hub::db::{Direction, Document, DocumentStore, FirestoreDb, MemoryStore};
use club_hub::error::{ProviderError, StoreError};
use club_hub::models::Identity;
use club_hub::services::{AuthEvents, IdentityProvider, Persistence, Session};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

#[allow(dead_code)]
pub fn identity(uid: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: Some(format!("{}@example.com", uid)),
        display_name: Some(format!("Provider {}", uid)),
        photo_url: Some(format!("https://example.com/{}.png", uid)),
    }
}

/// Club document fields as the store holds them (no `id`).
#[allow(dead_code)]
pub fn club_fields(name: &str, created_at: &str) -> serde_json::Value {
    json!({
        "name": name,
        "description": format!("{} description", name),
        "category": "SOCIAL",
        "organizerId": "organizer",
        "createdAt": created_at,
    })
}

/// Wait until the session satisfies `pred`, failing the test after 2s.
#[allow(dead_code)]
pub async fn wait_for_session(
    rx: &mut watch::Receiver<Session>,
    pred: impl FnMut(&Session) -> bool,
) -> Session {
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
        .await
        .expect("timed out waiting for session state")
        .expect("session state dropped")
        .clone()
}

/// Give spawned tasks a chance to run.
#[allow(dead_code)]
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

/// Scriptable identity provider.
///
/// Notifications are delivered only when the test calls [`FakeProvider::emit`],
/// unless an initial state was configured for new subscribers.
#[derive(Default)]
pub struct FakeProvider {
    subscribe_calls: AtomicUsize,
    listeners: Mutex<Vec<mpsc::UnboundedSender<Option<Identity>>>>,
    initial: Mutex<Option<Option<Identity>>>,
    sign_in_result: Mutex<Option<Result<Identity, ProviderError>>>,
    fail_sign_out: AtomicBool,
    persistence: Mutex<Option<Persistence>>,
}

#[allow(dead_code)]
impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `user` to each new subscriber immediately.
    pub fn with_initial(user: Option<Identity>) -> Self {
        let provider = Self::default();
        *provider.initial.lock().unwrap() = Some(user);
        provider
    }

    pub fn set_sign_in_result(&self, result: Result<Identity, ProviderError>) {
        *self.sign_in_result.lock().unwrap() = Some(result);
    }

    pub fn fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn persistence(&self) -> Option<Persistence> {
        *self.persistence.lock().unwrap()
    }

    pub fn emit(&self, user: Option<Identity>) {
        self.listeners
            .lock()
            .unwrap()
            .retain(|tx| tx.send(user.clone()).is_ok());
    }

    /// Drop every listener, as a provider torn down mid-flight would.
    pub fn close(&self) {
        self.listeners.lock().unwrap().clear();
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn subscribe(&self) -> AuthEvents {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(initial) = self.initial.lock().unwrap().clone() {
            let _ = tx.send(initial);
        }
        self.listeners.lock().unwrap().push(tx);
        rx
    }

    async fn interactive_sign_in(&self) -> Result<Identity, ProviderError> {
        let result = self
            .sign_in_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Err(ProviderError::Cancelled));
        if let Ok(identity) = &result {
            self.emit(Some(identity.clone()));
        }
        result
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(ProviderError::Rejected("network down".to_string()));
        }
        self.emit(None);
        Ok(())
    }

    async fn set_persistence(&self, mode: Persistence) -> Result<(), ProviderError> {
        *self.persistence.lock().unwrap() = Some(mode);
        Ok(())
    }
}

/// Memory store whose reads and writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    creates: AtomicUsize,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful document creations.
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.get_document(collection, id).await
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: &serde_json::Value,
    ) -> Result<(), StoreError> {
        self.check(&self.fail_writes)?;
        self.inner.set_document(collection, id, data).await
    }

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        data: &serde_json::Value,
    ) -> Result<bool, StoreError> {
        self.check(&self.fail_writes)?;
        let created = self.inner.create_document(collection, id, data).await?;
        if created {
            self.creates.fetch_add(1, Ordering::SeqCst);
        }
        Ok(created)
    }

    async fn query_collection(
        &self,
        collection: &str,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<Document>, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner
            .query_collection(collection, order_by, direction)
            .await
    }
}
