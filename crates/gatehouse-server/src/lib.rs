// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Gatehouse login server.
//!
//! This crate provides the HTTP surface of Gatehouse: the "Log In with
//! Okta" page, the authorize redirect, and the OAuth callback that turns a
//! provider authorization code into a local session.

pub mod api;
pub mod oauth_state;
pub mod routes;
pub mod session;
pub mod settings;

pub use api::{create_app_state, create_router, AppState};
pub use oauth_state::OAuthStateStore;
pub use session::{SessionService, SESSION_COOKIE_NAME};
pub use settings::SqliteSettingsStore;
