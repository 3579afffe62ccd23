// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod club;
pub mod user;

pub use club::{format_club_category, Club, ClubCategory};
pub use user::{Identity, UserProfile};
