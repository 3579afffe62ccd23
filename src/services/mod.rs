// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session and collection state.

pub mod clubs;
pub mod identity;
pub mod observable;
pub mod session;

pub use clubs::{ClubCache, ClubSource, ClubState, FallbackError};
pub use identity::{AuthEvents, IdentityProvider, LocalIdentityProvider, Persistence};
pub use observable::{InitGate, Observable};
pub use session::{Session, SessionManager, SessionPhase};
