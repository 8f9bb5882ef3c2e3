// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Mapping identity-provider claims to local users.
//!
//! [`UserProvisioner::resolve_user`] is the only part of the login flow
//! with persistent write side effects: it creates a local user on first
//! login and patches missing roles on legacy records. Resolution is
//! idempotent; a user provisioned by an attempt that later fails simply
//! gets picked up by the next attempt.
//!
//! Deployment-specific behavior is injected through [`ProvisionHooks`]
//! strategies resolved at construction time: a username transform, a
//! default-role override, and a new-user payload override.

use std::sync::Arc;

use crate::store::{ProvisionError, UserStore};
use crate::user::{LocalUser, NewLocalUser};

/// Profile claims handed over by an identity provider after a successful
/// login.
///
/// Transient: lives only for the duration of the callback handling it.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
	/// The provider's `preferred_username` claim.
	pub preferred_username: String,
	/// All remaining claims, for the hooks to inspect.
	pub claims: serde_json::Map<String, serde_json::Value>,
}

impl ProviderProfile {
	pub fn new(preferred_username: impl Into<String>) -> Self {
		Self {
			preferred_username: preferred_username.into(),
			claims: serde_json::Map::new(),
		}
	}
}

/// Derives the local username from the provider's preferred username.
pub type UsernameTransform = dyn Fn(&str) -> String + Send + Sync;

/// Supplies the local user directly from the profile, bypassing the
/// username lookup entirely. Returning `None` falls through to the normal
/// resolution path.
pub type UserLookupOverride = dyn Fn(&ProviderProfile) -> Option<LocalUser> + Send + Sync;

/// Overrides the role assigned to provisioned users, per profile.
pub type RoleOverride = dyn Fn(&ProviderProfile) -> String + Send + Sync;

/// Adjusts the creation payload before it is written to the store.
pub type NewUserOverride = dyn Fn(NewLocalUser, &ProviderProfile) -> NewLocalUser + Send + Sync;

/// Injectable strategies customizing provisioning.
///
/// All hooks are optional and applied synchronously at the points
/// documented on [`UserProvisioner::resolve_user`].
#[derive(Default)]
pub struct ProvisionHooks {
	/// Resolves the profile to an existing user directly, short-circuiting
	/// the username lookup.
	pub user_lookup: Option<Box<UserLookupOverride>>,
	/// Applied to `preferred_username` before the store lookup.
	pub username_transform: Option<Box<UsernameTransform>>,
	/// Replaces the configured default role.
	pub default_role: Option<Box<RoleOverride>>,
	/// Rewrites the creation payload for users about to be created.
	pub new_user: Option<Box<NewUserOverride>>,
}

impl std::fmt::Debug for ProvisionHooks {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProvisionHooks")
			.field("user_lookup", &self.user_lookup.is_some())
			.field("username_transform", &self.username_transform.is_some())
			.field("default_role", &self.default_role.is_some())
			.field("new_user", &self.new_user.is_some())
			.finish()
	}
}

/// Resolves provider profiles to local users, creating them on first
/// login.
pub struct UserProvisioner {
	store: Arc<dyn UserStore>,
	default_role: String,
	hooks: ProvisionHooks,
}

impl UserProvisioner {
	/// Create a provisioner over the given store with a fixed default
	/// role.
	pub fn new(store: Arc<dyn UserStore>, default_role: impl Into<String>) -> Self {
		Self {
			store,
			default_role: default_role.into(),
			hooks: ProvisionHooks::default(),
		}
	}

	/// Attach hooks. Resolved once at construction; never consulted
	/// through any ambient dispatch mechanism.
	pub fn with_hooks(mut self, hooks: ProvisionHooks) -> Self {
		self.hooks = hooks;
		self
	}

	/// Resolve a provider profile to a local user.
	///
	/// 1. If a lookup-override hook is set and returns a user, that user
	///    wins and the username lookup is skipped.
	/// 2. Compute the candidate username: the transform hook's output, or
	///    `preferred_username` verbatim.
	/// 3. Look up an existing user by exact username match.
	/// 4. If absent, create one with a fresh random password and the
	///    default role (payload hook applied last). Creation is atomic:
	///    a concurrent first login for the same username yields exactly
	///    one row and both callers resolve to it.
	/// 5. If the resolved user has no role (legacy record), assign the
	///    default role.
	///
	/// # Errors
	///
	/// [`ProvisionError::StoreConflict`] / [`ProvisionError::StoreWriteFailure`]
	/// when the store rejects the write. Both end the login attempt.
	#[tracing::instrument(skip_all, name = "UserProvisioner::resolve_user")]
	pub async fn resolve_user(&self, profile: &ProviderProfile) -> Result<LocalUser, ProvisionError> {
		let role = match &self.hooks.default_role {
			Some(override_fn) => override_fn(profile),
			None => self.default_role.clone(),
		};

		if let Some(lookup) = &self.hooks.user_lookup {
			if let Some(user) = lookup(profile) {
				return self.patch_role_if_missing(user, &role).await;
			}
		}

		let username = match &self.hooks.username_transform {
			Some(transform) => transform(&profile.preferred_username),
			None => profile.preferred_username.clone(),
		};

		if let Some(user) = self.store.find_by_username(&username).await? {
			return self.patch_role_if_missing(user, &role).await;
		}

		let mut new_user = NewLocalUser::generate(&username, &role)
			.map_err(|e| ProvisionError::StoreWriteFailure(format!("password hashing failed: {e}")))?;
		if let Some(hook) = &self.hooks.new_user {
			new_user = hook(new_user, profile);
		}

		let (user, created) = self.store.insert_if_absent(new_user).await?;
		if created {
			tracing::info!(user_id = %user.id, "provisioned new user");
		}
		self.patch_role_if_missing(user, &role).await
	}

	async fn patch_role_if_missing(
		&self,
		user: LocalUser,
		role: &str,
	) -> Result<LocalUser, ProvisionError> {
		if !user.has_no_role() {
			return Ok(user);
		}
		self.store.set_role(&user.id, role).await?;
		tracing::debug!(user_id = %user.id, "assigned default role to legacy user");
		Ok(LocalUser {
			role: role.to_string(),
			..user
		})
	}
}
