// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Club-Hub: session and club state for the campus clubs client.
//!
//! This crate keeps the signed-in user's profile in sync with the remote
//! document store and caches the club directory, falling back to bundled
//! sample clubs when the store has nothing usable.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

use config::Config;
use db::DocumentStore;
use services::{clubs, ClubCache, IdentityProvider, SessionManager};
use std::sync::Arc;

/// Shared application context, built once at startup and handed to consumers.
pub struct AppContext {
    pub config: Config,
    pub session: SessionManager,
    pub clubs: ClubCache,
}

impl AppContext {
    /// Wire the services to their collaborators.
    pub fn new(
        config: Config,
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> error::Result<Self> {
        let clubs = match &config.fallback_clubs_path {
            Some(path) => ClubCache::with_fallback(store.clone(), clubs::load_fallback_file(path)?),
            None => ClubCache::new(store.clone())?,
        };
        let session = SessionManager::new(provider, store);

        Ok(Self {
            config,
            session,
            clubs,
        })
    }

    /// Build the context and wait for the first auth state, as the host
    /// must before exposing protected views.
    pub async fn bootstrap(
        config: Config,
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> error::Result<Self> {
        let ctx = Self::new(config, provider, store)?;
        ctx.session.initialize().await;
        tracing::info!(
            logged_in = ctx.session.is_logged_in(),
            "Application context ready"
        );
        Ok(ctx)
    }
}
