// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider abstraction and a local development provider.
//!
//! Providers push auth state changes to subscribers; the first message
//! every subscriber receives is the provider's current state (possibly
//! "no user"), followed by one message per sign-in/sign-out.

use crate::error::ProviderError;
use crate::models::Identity;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Stream of auth state notifications. Dropping it unsubscribes.
pub type AuthEvents = mpsc::UnboundedReceiver<Option<Identity>>;

/// How long a signed-in session survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persistence {
    /// Survives process restarts.
    Durable,
    /// Memory only.
    #[default]
    Session,
}

/// Client-visible contract of an external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a listener for auth state changes.
    fn subscribe(&self) -> AuthEvents;

    /// Run the interactive sign-in flow.
    async fn interactive_sign_in(&self) -> Result<Identity, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    async fn set_persistence(&self, mode: Persistence) -> Result<(), ProviderError>;
}

struct ProviderState {
    current: Option<Identity>,
    persistence: Persistence,
    listeners: Vec<mpsc::UnboundedSender<Option<Identity>>>,
}

/// Local provider for development and offline use.
///
/// Interactive sign-in succeeds with a preconfigured identity. With
/// [`Persistence::Durable`] the signed-in identity is kept as JSON in
/// `session_file` and restored on the next start.
pub struct LocalIdentityProvider {
    session_file: PathBuf,
    sign_in_identity: Option<Identity>,
    state: Mutex<ProviderState>,
}

impl LocalIdentityProvider {
    /// Create a provider, restoring a durable session from `session_file` if one exists.
    pub fn new(session_file: impl Into<PathBuf>, sign_in_identity: Option<Identity>) -> Self {
        let session_file = session_file.into();
        let restored = restore_session(&session_file);
        let persistence = if restored.is_some() {
            Persistence::Durable
        } else {
            Persistence::Session
        };

        Self {
            session_file,
            sign_in_identity,
            state: Mutex::new(ProviderState {
                current: restored,
                persistence,
                listeners: Vec::new(),
            }),
        }
    }

    /// Currently signed-in identity, if any.
    pub fn current(&self) -> Option<Identity> {
        self.lock().ok().and_then(|s| s.current.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ProviderState>, ProviderError> {
        self.state
            .lock()
            .map_err(|e| ProviderError::Other(format!("provider state poisoned: {}", e)))
    }

    fn persistence(&self) -> Result<Persistence, ProviderError> {
        Ok(self.lock()?.persistence)
    }

    /// Set the current identity and notify listeners.
    fn publish(&self, identity: Option<Identity>) -> Result<(), ProviderError> {
        let mut state = self.lock()?;
        state.current = identity.clone();
        // Closed receivers mean the listener unsubscribed.
        state
            .listeners
            .retain(|tx| tx.send(identity.clone()).is_ok());
        Ok(())
    }

    async fn persist(&self, identity: &Identity) -> Result<(), ProviderError> {
        if let Some(parent) = self.session_file.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ProviderError::Persistence(e.to_string()))?;
            }
        }
        let json = serde_json::to_vec(identity)
            .map_err(|e| ProviderError::Persistence(e.to_string()))?;
        tokio::fs::write(&self.session_file, json)
            .await
            .map_err(|e| ProviderError::Persistence(e.to_string()))
    }

    async fn forget(&self) -> Result<(), ProviderError> {
        match tokio::fs::remove_file(&self.session_file).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ProviderError::Persistence(e.to_string())),
        }
    }
}

fn restore_session(path: &Path) -> Option<Identity> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read saved session");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(identity) => Some(identity),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt saved session");
            None
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn subscribe(&self) -> AuthEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        match self.state.lock() {
            Ok(mut state) => {
                // Queue the current state so it is observed before any later change.
                if tx.send(state.current.clone()).is_ok() {
                    state.listeners.push(tx);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Provider state poisoned, listener not registered");
            }
        }
        rx
    }

    async fn interactive_sign_in(&self) -> Result<Identity, ProviderError> {
        let identity = self
            .sign_in_identity
            .clone()
            .ok_or(ProviderError::Cancelled)?;

        // Listeners only hear about sessions that were actually saved.
        if self.persistence()? == Persistence::Durable {
            self.persist(&identity).await?;
        }
        self.publish(Some(identity.clone()))?;

        tracing::info!(uid = %identity.uid, "Local sign-in completed");
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if self.persistence()? == Persistence::Durable {
            self.forget().await?;
        }
        self.publish(None)?;
        tracing::info!("Local sign-out completed");
        Ok(())
    }

    async fn set_persistence(&self, mode: Persistence) -> Result<(), ProviderError> {
        let current = {
            let mut state = self.lock()?;
            state.persistence = mode;
            state.current.clone()
        };

        match (mode, current) {
            (Persistence::Durable, Some(identity)) => self.persist(&identity).await,
            (Persistence::Session, _) => self.forget().await,
            (Persistence::Durable, None) => Ok(()),
        }
    }
}
