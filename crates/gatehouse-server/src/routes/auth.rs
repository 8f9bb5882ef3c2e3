// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Okta login routes.
//!
//! `GET /auth/login/okta` starts a login: it generates fresh anti-forgery
//! values, stores them server-side, binds the flow to the browser with a
//! short-lived HttpOnly cookie, and redirects to Okta's authorize endpoint.
//!
//! `GET /auth/okta/callback` completes it: verify the echoed `state`
//! against the stored pending login, exchange the authorization code for an
//! access token, fetch profile claims, resolve a local user, establish a
//! session. Any failure short-circuits to a terse rejection response;
//! response bodies never carry provider diagnostics or secrets.

use axum::{
	extract::{Query, State},
	http::{header, HeaderMap, StatusCode},
	response::{AppendHeaders, Html, IntoResponse, Response},
};
use gatehouse_server_auth::{ProviderProfile, ProvisionError};
use gatehouse_server_auth_okta::{AuthorizeRequest, ConfigError, ProfileError, TokenError};
use serde::Deserialize;

use crate::api::AppState;
use crate::oauth_state::PENDING_LOGIN_TTL;

/// Cookie binding a started login flow to the browser.
pub const FLOW_COOKIE_NAME: &str = "gatehouse_oauth_flow";

/// Where a completed login lands.
const POST_LOGIN_DESTINATION: &str = "/";

/// GET /auth/login - Minimal login page.
///
/// Renders the "Log In with Okta" link only when the deployment has usable
/// Okta credentials; an unconfigured deployment renders the page without
/// the link rather than erroring.
pub async fn login_page(State(state): State<AppState>) -> Html<String> {
	let body = match state.okta_client().await {
		Ok(_) => concat!(
			"<!doctype html><html><head><title>Log In</title></head><body>",
			"<h1>Log In</h1>",
			r#"<p><a href="/auth/login/okta">Log In with Okta</a></p>"#,
			"</body></html>"
		)
		.to_string(),
		Err(_) => concat!(
			"<!doctype html><html><head><title>Log In</title></head><body>",
			"<h1>Log In</h1>",
			"<p>Login is not available.</p>",
			"</body></html>"
		)
		.to_string(),
	};
	Html(body)
}

/// GET /auth/login/okta - Start an Okta login.
#[tracing::instrument(skip_all)]
pub async fn login_okta(State(state): State<AppState>) -> Response {
	let client = match state.okta_client().await {
		Ok(client) => client,
		Err(e) => {
			tracing::warn!(error = %e, "okta login requested but not configured");
			return CallbackRejection::NotConfigured.into_response();
		}
	};

	let request = AuthorizeRequest::generate();
	let flow_id = state
		.oauth_state_store
		.insert(&request.state, &request.nonce)
		.await;

	let mut url = client.authorization_url(&request.state, &request.nonce);
	if let Some(hook) = &state.login_url_hook {
		url = hook(&url);
	}

	tracing::debug!("redirecting to okta authorize endpoint");
	(
		AppendHeaders([(header::SET_COOKIE, flow_cookie(&flow_id))]),
		found(&url),
	)
		.into_response()
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
	pub code: Option<String>,
	pub state: Option<String>,
	pub error: Option<String>,
	#[allow(dead_code)]
	pub error_description: Option<String>,
}

/// GET /auth/okta/callback - Complete an Okta login.
#[tracing::instrument(skip_all)]
pub async fn callback_okta(
	State(state): State<AppState>,
	Query(query): Query<CallbackQuery>,
	headers: HeaderMap,
) -> Result<Response, CallbackRejection> {
	if let Some(error) = query.error {
		return Err(CallbackRejection::Provider { error });
	}

	// State verification comes before anything else: no token exchange may
	// happen for a callback this browser did not start.
	let pending = match cookie_value(&headers, FLOW_COOKIE_NAME) {
		Some(flow_id) => state.oauth_state_store.take(&flow_id).await,
		None => None,
	}
	.ok_or(CallbackRejection::StateMismatch)?;

	match query.state.as_deref() {
		Some(echoed) if echoed == pending.state => {}
		_ => return Err(CallbackRejection::StateMismatch),
	}

	let code = query.code.ok_or(CallbackRejection::MissingCode)?;

	let client = state.okta_client().await?;
	let token = client.exchange_code(&code).await?;
	let userinfo = client.fetch_userinfo(token.access_token.expose()).await?;

	let profile = ProviderProfile {
		preferred_username: userinfo.preferred_username,
		claims: userinfo.extra,
	};
	let user = state.provisioner.resolve_user(&profile).await?;

	let established = state.session_service.establish(&user).await;

	Ok((
		AppendHeaders([
			(
				header::SET_COOKIE,
				state.session_service.session_cookie(&established.token),
			),
			(header::SET_COOKIE, clear_flow_cookie()),
		]),
		found(POST_LOGIN_DESTINATION),
	)
		.into_response())
}

/// Why a callback was rejected.
///
/// Converted into a terse, fixed-text HTTP response; the detailed cause is
/// logged server-side only.
#[derive(Debug, thiserror::Error)]
pub enum CallbackRejection {
	#[error("okta login is not configured")]
	NotConfigured,

	#[error("identity provider reported an error")]
	Provider { error: String },

	#[error("missing authorization code")]
	MissingCode,

	#[error("login attempt could not be verified")]
	StateMismatch,

	#[error(transparent)]
	Token(#[from] TokenError),

	#[error(transparent)]
	Profile(#[from] ProfileError),

	#[error(transparent)]
	Provision(#[from] ProvisionError),
}

impl From<ConfigError> for CallbackRejection {
	fn from(_: ConfigError) -> Self {
		CallbackRejection::NotConfigured
	}
}

impl IntoResponse for CallbackRejection {
	fn into_response(self) -> Response {
		let (status, body) = match &self {
			CallbackRejection::NotConfigured => {
				(StatusCode::SERVICE_UNAVAILABLE, "okta login is not configured")
			}
			CallbackRejection::Provider { error } => {
				tracing::warn!(provider_error = %error, "okta reported an authorization error");
				(StatusCode::BAD_REQUEST, "the identity provider reported an error")
			}
			CallbackRejection::MissingCode => {
				(StatusCode::BAD_REQUEST, "missing authorization code")
			}
			CallbackRejection::StateMismatch => {
				tracing::warn!("callback state did not match a pending login");
				(
					StatusCode::FORBIDDEN,
					"login attempt could not be verified; please start again",
				)
			}
			CallbackRejection::Token(e) => {
				tracing::warn!(error = %e, "token exchange failed");
				(
					StatusCode::BAD_GATEWAY,
					"could not complete login with the identity provider",
				)
			}
			CallbackRejection::Profile(e) => {
				tracing::warn!(error = %e, "userinfo fetch failed");
				(
					StatusCode::BAD_GATEWAY,
					"could not complete login with the identity provider",
				)
			}
			CallbackRejection::Provision(e) => {
				tracing::error!(error = %e, "user provisioning failed");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					"could not resolve a local user account",
				)
			}
		};
		(status, body).into_response()
	}
}

/// A plain 302 Found redirect.
fn found(location: &str) -> Response {
	(
		StatusCode::FOUND,
		AppendHeaders([(header::LOCATION, location.to_string())]),
	)
		.into_response()
}

fn flow_cookie(flow_id: &str) -> String {
	format!(
		"{FLOW_COOKIE_NAME}={flow_id}; Path=/auth; HttpOnly; SameSite=Lax; Max-Age={}",
		PENDING_LOGIN_TTL.as_secs()
	)
}

fn clear_flow_cookie() -> String {
	format!("{FLOW_COOKIE_NAME}=; Path=/auth; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Extract a cookie value from the Cookie header.
fn cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
	headers
		.get(header::COOKIE)?
		.to_str()
		.ok()?
		.split(';')
		.find_map(|cookie| {
			let (name, value) = cookie.trim().split_once('=')?;
			if name == cookie_name {
				Some(value.to_string())
			} else {
				None
			}
		})
}
