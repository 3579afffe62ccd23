// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error taxonomy for the session and collection layer.
//!
//! Only [`AppError::AuthFlow`] is ever surfaced by the public session
//! operations. Store and provider failures that merely affect caching are
//! absorbed and reported through [`Degraded`] in the logs.

/// Application error type returned by public operations.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// An interactive sign-in or sign-out did not complete.
    #[error("Authentication flow failed: {0}")]
    AuthFlow(#[source] ProviderError),

    /// The store could not be reached at startup.
    #[error("Database error: {0}")]
    Database(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Fallback data error: {0}")]
    Fallback(#[from] crate::services::clubs::FallbackError),

    /// Host-level failures outside the session and club services.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when the user cancelled the interactive flow.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::AuthFlow(ProviderError::Cancelled))
    }
}

/// Opaque document store failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Malformed document {id}: {reason}")]
    Malformed { id: String, reason: String },

    #[error("Store error: {0}")]
    Other(String),
}

/// Opaque identity provider failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Sign-in cancelled by user")]
    Cancelled,

    #[error("Provider rejected request: {0}")]
    Rejected(String),

    #[error("Session persistence failed: {0}")]
    Persistence(String),

    #[error("Provider error: {0}")]
    Other(String),
}

/// Failures that are absorbed and logged instead of returned.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Degraded {
    /// Remote profile read/write failed; in-memory profile is still usable.
    #[error("Profile sync for {user_id} degraded: {source}")]
    ProfileSync { user_id: String, source: StoreError },

    /// Club fetch failed or came back empty; fallback data substituted.
    #[error("Club fetch degraded: {reason}")]
    Fetch { reason: String },
}

/// Result type alias for public operations.
pub type Result<T> = std::result::Result<T, AppError>;
