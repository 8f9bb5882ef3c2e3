// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Local user model and provisioning for Gatehouse.
//!
//! This crate owns the pieces of login that touch local state:
//!
//! - [`types`] - ID newtypes shared across the auth system
//! - [`user`] - the [`LocalUser`] entity and provisioning password helpers
//! - [`store`] - the [`UserStore`] contract plus SQLite and in-memory
//!   implementations
//! - [`provision`] - mapping identity-provider claims to a local user,
//!   creating one on first login
//!
//! Provider-specific OAuth plumbing lives in its own crate; this crate
//! never sees tokens or client secrets, only resolved profile claims.

mod argon2_config;
pub mod provision;
pub mod store;
pub mod types;
pub mod user;

pub use provision::{ProviderProfile, ProvisionHooks, UserProvisioner};
pub use store::{
	create_pool, InMemoryUserStore, ProvisionError, SqliteUserStore, StoreError, UserStore,
};
pub use types::{SessionId, UserId};
pub use user::{LocalUser, NewLocalUser, DEFAULT_ROLE};
