// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session manager: mirrors the identity provider's auth state into an
//! observable [`Session`] and keeps the remote profile document in sync.
//!
//! Lifecycle: `Uninitialized -> Initializing -> Ready`. The move to
//! `Ready` happens once, after the first provider notification has been
//! fully applied. Later notifications flip between logged-in and
//! logged-out without leaving `Ready`.

use crate::db::{collections, Document, DocumentStore};
use crate::error::{AppError, Degraded, StoreError};
use crate::models::{Identity, UserProfile};
use crate::services::identity::{AuthEvents, IdentityProvider, Persistence};
use crate::services::observable::{InitGate, Observable};
use dashmap::DashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Initialization phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
}

/// Authentication state of this client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub phase: SessionPhase,
    pub profile: Option<UserProfile>,
}

impl Session {
    /// True iff a profile is present.
    pub fn is_logged_in(&self) -> bool {
        self.profile.is_some()
    }
}

type ProfileLocks = DashMap<String, Arc<tokio::sync::Mutex<()>>>;

struct Inner {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    state: Observable<Session>,
    gate: InitGate,
    listener: Mutex<Option<JoinHandle<()>>>,
    /// Per-user locks so concurrent sync paths don't both create a profile.
    profile_locks: ProfileLocks,
}

/// Owns the session state. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                store,
                state: Observable::default(),
                gate: InitGate::new(),
                listener: Mutex::new(None),
                profile_locks: DashMap::new(),
            }),
        }
    }

    /// Resolve once the provider has reported its first auth state.
    ///
    /// Only the first call registers the provider listener. Every call,
    /// concurrent or later, waits on the same first notification; calls
    /// made after it return immediately.
    pub async fn initialize(&self) {
        if self.inner.gate.begin() {
            tracing::info!("Initializing session");
            self.inner
                .state
                .update(|s| s.phase = SessionPhase::Initializing);

            let events = self.inner.provider.subscribe();
            let handle = tokio::spawn(listen(Arc::downgrade(&self.inner), events));

            match self.inner.listener.lock() {
                Ok(mut slot) => *slot = Some(handle),
                Err(e) => tracing::error!(error = %e, "Listener slot poisoned"),
            }
        }

        self.inner.gate.wait().await;
    }

    /// Run the interactive sign-in flow and sync the profile document.
    ///
    /// The provider's identity is applied immediately; it is then replaced
    /// by the stored profile if one exists. On failure nothing changes.
    pub async fn sign_in(&self) -> Result<UserProfile, AppError> {
        self.inner
            .provider
            .set_persistence(Persistence::Durable)
            .await
            .map_err(AppError::AuthFlow)?;

        let identity = self
            .inner
            .provider
            .interactive_sign_in()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Sign-in failed");
                AppError::AuthFlow(e)
            })?;

        tracing::info!(uid = %identity.uid, "Signed in");
        self.inner.set_profile(Some(UserProfile::from(&identity)));

        let profile = self.inner.load_or_create_profile(&identity).await;
        self.inner.set_profile(Some(profile.clone()));
        Ok(profile)
    }

    /// Sign out with the provider, then clear the local profile.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.inner.provider.sign_out().await.map_err(|e| {
            tracing::warn!(error = %e, "Sign-out failed");
            AppError::AuthFlow(e)
        })?;

        self.inner.set_profile(None);
        tracing::info!("Signed out");
        Ok(())
    }

    /// Snapshot of the whole session.
    pub fn session(&self) -> Session {
        self.inner.state.get()
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.state.read(Session::is_logged_in)
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.inner.state.read(|s| s.profile.clone())
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.gate.is_open()
    }

    /// Observe session changes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Unsubscribe from the provider. State is left as last observed.
    pub fn shutdown(&self) {
        let handle = match self.inner.listener.lock() {
            Ok(mut slot) => slot.take(),
            Err(e) => {
                tracing::error!(error = %e, "Listener slot poisoned");
                None
            }
        };
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!("Provider listener removed");
        }

        // The listener may have died before the first notification.
        if self.inner.gate.has_started() && !self.inner.gate.is_open() {
            tracing::warn!("Shut down before provider reported auth state, assuming signed out");
            self.inner.state.update(|s| {
                s.phase = SessionPhase::Ready;
                s.profile = None;
            });
            self.inner.gate.open();
        }
    }
}

/// Apply provider notifications in order until the manager is dropped.
async fn listen(weak: Weak<Inner>, mut events: AuthEvents) {
    while let Some(user) = events.recv().await {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        tracing::debug!(uid = ?user.as_ref().map(|u| &u.uid), "Auth state changed");

        let profile = match &user {
            Some(identity) => Some(inner.load_or_create_profile(identity).await),
            None => None,
        };
        inner.state.update(|s| {
            s.phase = SessionPhase::Ready;
            s.profile = profile;
        });

        if !inner.gate.is_open() {
            tracing::info!(logged_in = user.is_some(), "Session ready");
            inner.gate.open();
        }
    }

    // Provider went away; never leave initialize() callers hanging.
    if let Some(inner) = weak.upgrade() {
        if !inner.gate.is_open() {
            tracing::warn!("Provider closed before reporting auth state, assuming signed out");
            inner.state.update(|s| {
                s.phase = SessionPhase::Ready;
                s.profile = None;
            });
            inner.gate.open();
        }
    }
}

impl Inner {
    fn set_profile(&self, profile: Option<UserProfile>) {
        self.state.update(|s| s.profile = profile);
    }

    /// Load the stored profile, creating it from provider fields if absent.
    ///
    /// Never fails: store errors are logged and the provider fields are used.
    async fn load_or_create_profile(&self, identity: &Identity) -> UserProfile {
        let lock = self
            .profile_locks
            .entry(identity.uid.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let guard = lock.lock().await;

        let fallback = UserProfile::from(identity);
        let profile = match self.sync_profile(&fallback).await {
            Ok(profile) => profile,
            Err(source) => {
                let warning = Degraded::ProfileSync {
                    user_id: identity.uid.clone(),
                    source,
                };
                tracing::warn!(error = %warning, "Using provider profile fields");
                fallback
            }
        };

        drop(guard);
        drop(lock);
        // Only the map's reference left means nobody is waiting on this user.
        self.profile_locks
            .remove_if(&identity.uid, |_, lock| Arc::strong_count(lock) == 1);

        profile
    }

    async fn sync_profile(&self, candidate: &UserProfile) -> Result<UserProfile, StoreError> {
        let uid = candidate.uid.as_str();

        if let Some(doc) = self.store.get_document(collections::USERS, uid).await? {
            tracing::debug!(uid, "Loaded stored profile");
            return stored_profile(doc);
        }

        let data = serde_json::to_value(candidate).map_err(|e| StoreError::Malformed {
            id: uid.to_string(),
            reason: e.to_string(),
        })?;

        if self
            .store
            .create_document(collections::USERS, uid, &data)
            .await?
        {
            tracing::info!(uid, "Created profile document");
            return Ok(candidate.clone());
        }

        // Lost a create race with another client; the stored document wins.
        tracing::debug!(uid, "Profile created concurrently, loading stored copy");
        match self.store.get_document(collections::USERS, uid).await? {
            Some(doc) => stored_profile(doc),
            None => Ok(candidate.clone()),
        }
    }
}

/// Stored profiles are authoritative; older ones may omit `uid`, which is the document ID.
fn stored_profile(mut doc: Document) -> Result<UserProfile, StoreError> {
    if let serde_json::Value::Object(fields) = &mut doc.data {
        fields
            .entry("uid")
            .or_insert_with(|| serde_json::Value::String(doc.id.clone()));
    }
    doc.to_object()
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.listener.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}
