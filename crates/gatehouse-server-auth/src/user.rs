// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The local user entity and provisioning password helpers.
//!
//! Users provisioned from an identity provider carry a random password
//! that exists only so the record satisfies the store's schema; it is
//! generated once, argon2-hashed, and never transmitted or logged. The
//! user authenticates exclusively through the provider from then on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::argon2_config::argon2_instance;
use crate::types::UserId;

/// Role assigned to provisioned users when no override is configured.
pub const DEFAULT_ROLE: &str = "subscriber";

/// Length of generated provisioning passwords before hashing.
const PASSWORD_LEN: usize = 32;

/// A user in the local store.
///
/// One provider profile maps to at most one local user, matched by
/// `username` equality. Username uniqueness is enforced by the store, not
/// by this type.
///
/// # PII Handling
///
/// `username` is typically the user's email address at the identity
/// provider and should be treated as PII in logs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalUser {
	/// Unique identifier for this user.
	pub id: UserId,

	/// Login name, derived from the provider's `preferred_username`.
	pub username: String,

	/// Assigned role. Empty only for legacy records that predate role
	/// assignment; the provisioner patches those on next login.
	pub role: String,

	/// When the user was created.
	pub created_at: DateTime<Utc>,
}

impl LocalUser {
	/// Returns true if this user has no assigned role.
	pub fn has_no_role(&self) -> bool {
		self.role.is_empty()
	}
}

/// Payload for creating a local user.
///
/// The password hash is computed before this struct is built so the
/// cleartext never travels through the store layer.
#[derive(Debug, Clone)]
pub struct NewLocalUser {
	/// Unique identifier for the new user.
	pub id: UserId,
	/// Login name; must be unique in the store.
	pub username: String,
	/// Argon2 hash of the generated provisioning password.
	pub password_hash: String,
	/// Role to assign.
	pub role: String,
}

impl NewLocalUser {
	/// Build a creation payload with a fresh id and a hashed random
	/// password.
	///
	/// # Errors
	///
	/// Returns the argon2 error if hashing the generated password fails.
	pub fn generate(
		username: impl Into<String>,
		role: impl Into<String>,
	) -> Result<Self, argon2::password_hash::Error> {
		Ok(Self {
			id: UserId::generate(),
			username: username.into(),
			password_hash: hash_password(&generate_password())?,
			role: role.into(),
		})
	}
}

/// Generate a random provisioning password from the thread-local CSPRNG.
///
/// The cleartext is returned only so it can be hashed; callers must not
/// store, transmit, or log it.
pub fn generate_password() -> String {
	use rand::{distributions::Alphanumeric, Rng};
	rand::thread_rng()
		.sample_iter(&Alphanumeric)
		.take(PASSWORD_LEN)
		.map(char::from)
		.collect()
}

/// Hash a password with the configured Argon2 instance.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
	use argon2::password_hash::{rand_core::OsRng, SaltString};
	use argon2::PasswordHasher;

	let salt = SaltString::generate(&mut OsRng);
	argon2_instance()
		.hash_password(password.as_bytes(), &salt)
		.map(|hash| hash.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn generated_passwords_are_fresh_and_fixed_length() {
		let a = generate_password();
		let b = generate_password();
		assert_eq!(a.len(), PASSWORD_LEN);
		assert_ne!(a, b);
	}

	#[test]
	fn hash_does_not_contain_cleartext() {
		let password = generate_password();
		let hash = hash_password(&password).unwrap();
		assert!(hash.starts_with("$argon2id$"));
		assert!(!hash.contains(&password));
	}

	#[test]
	fn new_local_user_carries_hash_not_password() {
		let user = NewLocalUser::generate("alice@example.com", DEFAULT_ROLE).unwrap();
		assert_eq!(user.username, "alice@example.com");
		assert_eq!(user.role, DEFAULT_ROLE);
		assert!(user.password_hash.starts_with("$argon2id$"));
	}

	#[test]
	fn has_no_role_detects_legacy_records() {
		let user = LocalUser {
			id: UserId::generate(),
			username: "alice@example.com".to_string(),
			role: String::new(),
			created_at: Utc::now(),
		};
		assert!(user.has_no_role());

		let user = LocalUser {
			role: DEFAULT_ROLE.to_string(),
			..user
		};
		assert!(!user.has_no_role());
	}
}
