// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;

use axum::{routing::get, Router};
use gatehouse_server_auth::{SqliteUserStore, UserProvisioner, UserStore, DEFAULT_ROLE};
use gatehouse_server_auth_okta::{
	ConfigError, OktaOAuthClient, OktaOAuthConfig, SettingsStore,
};
use sqlx::SqlitePool;

use crate::oauth_state::OAuthStateStore;
use crate::routes;
use crate::session::SessionService;
use crate::settings::SqliteSettingsStore;

/// Rewrites the provider authorize URL before the redirect is issued.
///
/// Deployment hook, applied last: receives the fully built URL and returns
/// the one actually redirected to.
pub type LoginUrlHook = dyn Fn(&str) -> String + Send + Sync;

/// Shared application state for all routes.
#[derive(Clone)]
pub struct AppState {
	/// Persisted Okta credentials, read fresh per login request.
	pub settings: Arc<dyn SettingsStore>,
	/// Pending login attempts awaiting their callback.
	pub oauth_state_store: Arc<OAuthStateStore>,
	/// Local user lookup and creation.
	pub user_store: Arc<dyn UserStore>,
	/// Maps provider profiles to local users.
	pub provisioner: Arc<UserProvisioner>,
	/// Session issuance for resolved users.
	pub session_service: Arc<SessionService>,
	/// Public base URL of this deployment, no trailing slash.
	pub base_url: String,
	/// Optional authorize-URL rewrite hook.
	pub login_url_hook: Option<Arc<LoginUrlHook>>,
}

impl AppState {
	/// The callback URL registered with Okta, derived from the base URL so
	/// it always matches the route the callback handler listens on.
	pub fn redirect_uri(&self) -> String {
		format!("{}/auth/okta/callback", self.base_url)
	}

	/// Build an Okta client from current configuration.
	///
	/// Configuration is resolved per request (environment overrides first,
	/// then the settings store) so credential changes take effect without a
	/// restart.
	///
	/// # Errors
	///
	/// [`ConfigError::Incomplete`] when the deployment has no usable Okta
	/// credentials; login is disabled in that state.
	pub async fn okta_client(&self) -> Result<OktaOAuthClient, ConfigError> {
		let config = OktaOAuthConfig::load(self.settings.as_ref(), &self.redirect_uri()).await?;
		Ok(OktaOAuthClient::new(config))
	}
}

/// Create application state backed by the given SQLite pool.
///
/// Runs the users and settings migrations.
pub async fn create_app_state(
	pool: SqlitePool,
	base_url: impl Into<String>,
) -> Result<AppState, sqlx::Error> {
	let settings = SqliteSettingsStore::new(pool.clone());
	settings.migrate().await?;

	let user_store = SqliteUserStore::new(pool);
	user_store.migrate().await.map_err(|e| match e {
		gatehouse_server_auth::StoreError::Sqlx(e) => e,
		other => sqlx::Error::Protocol(other.to_string()),
	})?;
	let user_store: Arc<dyn UserStore> = Arc::new(user_store);

	let provisioner = Arc::new(UserProvisioner::new(Arc::clone(&user_store), DEFAULT_ROLE));

	let base_url = base_url.into().trim_end_matches('/').to_string();

	Ok(AppState {
		settings: Arc::new(settings),
		oauth_state_store: Arc::new(OAuthStateStore::new()),
		user_store,
		provisioner,
		session_service: Arc::new(SessionService::new()),
		base_url,
		login_url_hook: None,
	})
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/auth/login", get(routes::auth::login_page))
		.route("/auth/login/okta", get(routes::auth::login_okta))
		.route("/auth/okta/callback", get(routes::auth::callback_okta))
		.with_state(state)
}
