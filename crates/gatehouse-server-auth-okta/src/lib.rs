// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Okta OAuth 2.0 / OpenID Connect authentication for Gatehouse.
//!
//! This module implements the Okta authorization code flow for
//! authenticating users against an Okta organization.
//!
//! # OAuth Flow
//!
//! The Okta flow consists of four steps:
//!
//! 1. **Authorization URL Generation**: Generate a URL carrying the client
//!    id, requested scopes, redirect URI, and fresh `state`/`nonce`
//!    anti-forgery values. The user is redirected to Okta to authenticate.
//!
//! 2. **User Authorization**: The user signs in at Okta and is redirected
//!    back to the configured `redirect_uri` with an authorization `code`
//!    and the echoed `state` parameter.
//!
//! 3. **Code Exchange**: Exchange the authorization code for an access
//!    token by calling Okta's token endpoint with HTTP Basic client
//!    credentials.
//!
//! 4. **Userinfo Access**: Use the access token to fetch the user's profile
//!    claims from Okta's userinfo endpoint.
//!
//! # Example
//!
//! ```rust,no_run
//! use gatehouse_server_auth_okta::{AuthorizeRequest, OktaOAuthClient, OktaOAuthConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OktaOAuthConfig::from_env()?;
//! let client = OktaOAuthClient::new(config);
//!
//! // Step 1: Generate authorization URL with fresh state/nonce
//! let request = AuthorizeRequest::generate();
//! let auth_url = client.authorization_url(&request.state, &request.nonce);
//!
//! // Step 2: User authorizes and is redirected back with a code
//! // (handled by your web server, which must verify `state`)
//!
//! // Step 3: Exchange the code for an access token
//! let token = client.exchange_code("authorization-code-from-callback").await?;
//!
//! // Step 4: Fetch profile claims
//! let claims = client.fetch_userinfo(token.access_token.expose()).await?;
//! println!("logged in as {}", claims.preferred_username);
//! # Ok(())
//! # }
//! ```
//!
//! # Security Considerations
//!
//! - The `client_secret` is wrapped in [`SecretString`] to prevent
//!   accidental logging. Access and id tokens in [`OktaTokenResponse`] are
//!   wrapped the same way.
//! - All tracing instrumentation skips sensitive parameters.
//! - The `state` value must be bound server-side to the browser that
//!   started the flow and verified on the callback before any code
//!   exchange happens. This crate only generates the values; the caller
//!   owns storage and verification.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use gatehouse_common_secret::SecretString;
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

/// Path suffixes appended to the organization base URL. Okta serves the
/// default authorization server under `/oauth2/default`.
const AUTHORIZE_PATH: &str = "/oauth2/default/v1/authorize";
const TOKEN_PATH: &str = "/oauth2/default/v1/token";
const USERINFO_PATH: &str = "/oauth2/default/v1/userinfo";

/// Environment variables that override persisted settings.
pub const ENV_ORG_URL: &str = "GATEHOUSE_SERVER_OKTA_ORG_URL";
pub const ENV_CLIENT_ID: &str = "GATEHOUSE_SERVER_OKTA_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "GATEHOUSE_SERVER_OKTA_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "GATEHOUSE_SERVER_OKTA_REDIRECT_URI";

/// Keys used when reading configuration from a [`SettingsStore`].
pub const SETTING_ORG_URL: &str = "okta_org_url";
pub const SETTING_CLIENT_ID: &str = "okta_client_id";
pub const SETTING_CLIENT_SECRET: &str = "okta_client_secret";

// =============================================================================
// Errors
// =============================================================================

/// Error raised by a [`SettingsStore`] implementation.
#[derive(Debug, thiserror::Error)]
#[error("settings store error: {0}")]
pub struct SettingsError(pub String);

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// A required value (org URL, client id, or client secret) was missing
	/// or blank. Login must be disabled in this state, not crash.
	#[error("incomplete configuration: missing {0}")]
	Incomplete(&'static str),

	/// The org URL was not an absolute https:// URL.
	#[error("invalid org URL: {0}")]
	InvalidOrgUrl(String),

	/// The settings store could not be read.
	#[error(transparent)]
	Settings(#[from] SettingsError),
}

/// Errors that can occur while exchanging an authorization code.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
	/// The HTTP request to Okta failed (network error, timeout, etc.).
	#[error("token request failed: {0}")]
	Transport(#[from] reqwest::Error),

	/// Okta answered with a non-success status (invalid code, bad client
	/// credentials, etc.).
	#[error("token endpoint returned status {status}")]
	BadStatus { status: reqwest::StatusCode },

	/// The response body was not valid JSON.
	#[error("failed to parse token response: {0}")]
	MalformedBody(String),

	/// The response parsed but carried no `access_token` field.
	#[error("token response did not contain an access token")]
	MissingAccessToken,
}

/// Errors that can occur while fetching userinfo claims.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
	/// The HTTP request to Okta failed (network error, timeout, etc.).
	#[error("userinfo request failed: {0}")]
	Transport(#[from] reqwest::Error),

	/// Okta answered with a non-success status (expired or invalid token).
	#[error("userinfo endpoint returned status {status}")]
	BadStatus { status: reqwest::StatusCode },

	/// The response body was not valid JSON.
	#[error("failed to parse userinfo response: {0}")]
	MalformedBody(String),

	/// The claims were parseable but `preferred_username` was absent.
	#[error("userinfo response did not contain preferred_username")]
	MissingRequiredClaim,
}

// =============================================================================
// Settings store
// =============================================================================

/// Persisted settings collaborator.
///
/// Gatehouse reads the Okta credentials from a settings store when no
/// environment override is present. The store is an external collaborator;
/// this crate only defines the read contract.
#[async_trait]
pub trait SettingsStore: Send + Sync {
	/// Fetch a single setting value. `Ok(None)` means the key has never
	/// been written.
	async fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Okta OAuth client.
///
/// The `client_secret` is wrapped in [`SecretString`] to prevent accidental
/// logging or exposure.
///
/// # Fields
///
/// - `org_url`: The Okta organization base URL (e.g.
///   `https://dev-123.okta.com`). Must be absolute https; trailing slashes
///   are normalized away.
/// - `client_id` / `client_secret`: Credentials of the web application
///   registered with Okta.
/// - `redirect_uri`: The callback URL registered with Okta. Must match the
///   callback route byte-for-byte, trailing slash included.
/// - `scopes`: OAuth scopes to request. Defaults to `openid profile`, the
///   minimum needed to receive `preferred_username`.
#[derive(Debug, Clone)]
pub struct OktaOAuthConfig {
	/// The Okta organization base URL.
	pub org_url: String,
	/// The OAuth application client ID.
	pub client_id: String,
	/// The OAuth application client secret (wrapped to prevent logging).
	pub client_secret: SecretString,
	/// The callback URL where Okta redirects after authorization.
	pub redirect_uri: String,
	/// OAuth scopes to request.
	pub scopes: Vec<String>,
}

impl OktaOAuthConfig {
	/// Default scopes requested from Okta.
	pub fn default_scopes() -> Vec<String> {
		vec!["openid".to_string(), "profile".to_string()]
	}

	/// Load configuration from environment variables only.
	///
	/// # Required Environment Variables
	///
	/// - `GATEHOUSE_SERVER_OKTA_ORG_URL`
	/// - `GATEHOUSE_SERVER_OKTA_CLIENT_ID`
	/// - `GATEHOUSE_SERVER_OKTA_CLIENT_SECRET`
	/// - `GATEHOUSE_SERVER_OKTA_REDIRECT_URI`
	///
	/// # Errors
	///
	/// Returns [`ConfigError::Incomplete`] if any required variable is not
	/// set, and [`ConfigError::InvalidOrgUrl`] if the org URL is not an
	/// absolute https URL.
	pub fn from_env() -> Result<Self, ConfigError> {
		let org_url = env::var(ENV_ORG_URL).map_err(|_| ConfigError::Incomplete("org URL"))?;
		let client_id =
			env::var(ENV_CLIENT_ID).map_err(|_| ConfigError::Incomplete("client id"))?;
		let client_secret =
			env::var(ENV_CLIENT_SECRET).map_err(|_| ConfigError::Incomplete("client secret"))?;
		let redirect_uri =
			env::var(ENV_REDIRECT_URI).map_err(|_| ConfigError::Incomplete("redirect URI"))?;

		let config = Self::new(org_url, client_id, client_secret, redirect_uri);
		config.validate()?;
		Ok(config)
	}

	/// Load configuration, preferring environment overrides and falling
	/// back to the persisted settings store.
	///
	/// The redirect URI is derived from the deployment's public base URL by
	/// the caller rather than persisted, so that it always matches the
	/// route the callback handler actually listens on.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::Incomplete`] when neither an environment
	/// override nor a persisted value exists for a required setting. In
	/// that state login must be disabled (no authorize link rendered).
	pub async fn load(
		store: &dyn SettingsStore,
		redirect_uri: &str,
	) -> Result<Self, ConfigError> {
		let org_url = match env::var(ENV_ORG_URL) {
			Ok(v) => Some(v),
			Err(_) => store.get(SETTING_ORG_URL).await?,
		};
		let client_id = match env::var(ENV_CLIENT_ID) {
			Ok(v) => Some(v),
			Err(_) => store.get(SETTING_CLIENT_ID).await?,
		};
		let client_secret = match env::var(ENV_CLIENT_SECRET) {
			Ok(v) => Some(v),
			Err(_) => store.get(SETTING_CLIENT_SECRET).await?,
		};

		let config = Self::new(
			org_url.ok_or(ConfigError::Incomplete("org URL"))?,
			client_id.ok_or(ConfigError::Incomplete("client id"))?,
			client_secret.ok_or(ConfigError::Incomplete("client secret"))?,
			redirect_uri.to_string(),
		);
		config.validate()?;
		Ok(config)
	}

	/// Build a configuration with default scopes, normalizing the org URL.
	pub fn new(
		org_url: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		redirect_uri: impl Into<String>,
	) -> Self {
		let org_url = org_url.into().trim_end_matches('/').to_string();
		Self {
			org_url,
			client_id: client_id.into(),
			client_secret: SecretString::new(client_secret.into()),
			redirect_uri: redirect_uri.into(),
			scopes: Self::default_scopes(),
		}
	}

	/// Validate that all configuration fields are usable.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::Incomplete`] if any field is blank and
	/// [`ConfigError::InvalidOrgUrl`] if the org URL is not absolute https.
	/// Plain http is accepted for loopback hosts only, for local
	/// development against a stub provider.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.org_url.trim().is_empty() {
			return Err(ConfigError::Incomplete("org URL"));
		}
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::Incomplete("client id"));
		}
		if self.client_secret.expose().trim().is_empty() {
			return Err(ConfigError::Incomplete("client secret"));
		}
		if self.redirect_uri.trim().is_empty() {
			return Err(ConfigError::Incomplete("redirect URI"));
		}
		match Url::parse(&self.org_url) {
			Ok(url) if url.scheme() == "https" => Ok(()),
			Ok(url) if url.scheme() == "http" && is_loopback_host(&url) => Ok(()),
			Ok(url) => Err(ConfigError::InvalidOrgUrl(format!(
				"scheme must be https, got {}",
				url.scheme()
			))),
			Err(e) => Err(ConfigError::InvalidOrgUrl(e.to_string())),
		}
	}

	/// The HTTP Basic credential sent to the token endpoint:
	/// `base64(client_id:client_secret)`.
	pub fn basic_credential(&self) -> String {
		BASE64.encode(format!(
			"{}:{}",
			self.client_id,
			self.client_secret.expose()
		))
	}

	/// The authorize endpoint URL for this org.
	pub fn authorize_endpoint(&self) -> String {
		format!("{}{}", self.org_url, AUTHORIZE_PATH)
	}

	/// The token endpoint URL for this org.
	pub fn token_endpoint(&self) -> String {
		format!("{}{}", self.org_url, TOKEN_PATH)
	}

	/// The userinfo endpoint URL for this org.
	pub fn userinfo_endpoint(&self) -> String {
		format!("{}{}", self.org_url, USERINFO_PATH)
	}

	/// Join scopes into a space-separated string for the authorization URL.
	pub fn scopes_string(&self) -> String {
		self.scopes.join(" ")
	}

	/// Parse a scope string into a vector of individual scopes.
	pub fn parse_scopes(scope_str: &str) -> Vec<String> {
		scope_str
			.split([' ', ','])
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	}
}

fn is_loopback_host(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain == "localhost",
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

// =============================================================================
// Authorization request
// =============================================================================

/// Anti-forgery values for one login attempt.
///
/// `state` and `nonce` are opaque, unguessable, and freshly generated per
/// attempt. The caller must persist them (bound to the user's browser) so
/// the callback can verify that the response belongs to the flow it
/// started; they are meaningless to Okta beyond being echoed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeRequest {
	/// CSRF protection token echoed back on the callback.
	pub state: String,
	/// Replay protection value bound into the issued id token.
	pub nonce: String,
}

impl AuthorizeRequest {
	/// Length of generated state and nonce values.
	const VALUE_LEN: usize = 32;

	/// Generate a fresh state/nonce pair from the thread-local CSPRNG.
	pub fn generate() -> Self {
		Self {
			state: random_string(Self::VALUE_LEN),
			nonce: random_string(Self::VALUE_LEN),
		}
	}
}

fn random_string(len: usize) -> String {
	use rand::{distributions::Alphanumeric, Rng};
	rand::thread_rng()
		.sample_iter(&Alphanumeric)
		.take(len)
		.map(char::from)
		.collect()
}

// =============================================================================
// Response types
// =============================================================================

/// Response from Okta's token endpoint after exchanging an authorization
/// code.
///
/// Only the access token is consumed by the login flow. The remaining
/// fields are parsed so that a richer provider response never fails the
/// exchange, but they are never persisted.
#[derive(Debug, Clone)]
pub struct OktaTokenResponse {
	/// The access token for the userinfo request (wrapped to prevent
	/// logging).
	pub access_token: SecretString,
	/// The token type (`Bearer`).
	pub token_type: Option<String>,
	/// Seconds until the access token expires.
	pub expires_in: Option<u64>,
	/// Granted scopes, space-separated.
	pub scope: Option<String>,
	/// OIDC id token, if `openid` scope was granted (unused, wrapped).
	pub id_token: Option<SecretString>,
	/// Refresh token, if offline access was granted (unused, wrapped).
	pub refresh_token: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct RawTokenResponse {
	access_token: Option<String>,
	token_type: Option<String>,
	expires_in: Option<u64>,
	scope: Option<String>,
	id_token: Option<String>,
	refresh_token: Option<String>,
}

impl RawTokenResponse {
	fn into_token_response(self) -> Result<OktaTokenResponse, TokenError> {
		let access_token = match self.access_token {
			Some(token) if !token.is_empty() => SecretString::new(token),
			_ => return Err(TokenError::MissingAccessToken),
		};
		Ok(OktaTokenResponse {
			access_token,
			token_type: self.token_type,
			expires_in: self.expires_in,
			scope: self.scope,
			id_token: self.id_token.map(SecretString::new),
			refresh_token: self.refresh_token.map(SecretString::new),
		})
	}
}

/// Profile claims from Okta's userinfo endpoint.
///
/// `preferred_username` is the only claim the login flow requires; all
/// other claims are retained verbatim for the provisioning hooks.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
	/// The user's preferred username, typically their email address.
	pub preferred_username: String,
	/// All remaining claims, untouched.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserInfo {
	/// Look up an additional claim by name.
	pub fn claim(&self, name: &str) -> Option<&serde_json::Value> {
		self.extra.get(name)
	}
}

#[derive(Debug, Deserialize)]
struct RawUserInfo {
	preferred_username: Option<String>,
	#[serde(flatten)]
	extra: serde_json::Map<String, serde_json::Value>,
}

impl RawUserInfo {
	fn into_userinfo(self) -> Result<UserInfo, ProfileError> {
		match self.preferred_username {
			Some(username) if !username.is_empty() => Ok(UserInfo {
				preferred_username: username,
				extra: self.extra,
			}),
			_ => Err(ProfileError::MissingRequiredClaim),
		}
	}
}

// =============================================================================
// Client
// =============================================================================

/// OAuth client for authenticating users via Okta.
///
/// This client handles the OAuth 2.0 authorization code flow against an
/// Okta organization: generating authorization URLs, exchanging codes for
/// tokens, and fetching userinfo claims.
///
/// # Example
///
/// ```rust,no_run
/// use gatehouse_server_auth_okta::{OktaOAuthClient, OktaOAuthConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = OktaOAuthConfig::from_env()?;
/// let client = OktaOAuthClient::new(config);
///
/// let request = gatehouse_server_auth_okta::AuthorizeRequest::generate();
/// let auth_url = client.authorization_url(&request.state, &request.nonce);
/// // Redirect user to auth_url...
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OktaOAuthClient {
	config: OktaOAuthConfig,
	http_client: reqwest::Client,
}

impl OktaOAuthClient {
	/// Create a new Okta OAuth client with the given configuration.
	///
	/// The underlying HTTP client carries the shared Gatehouse User-Agent
	/// and the default 10 second timeout, which bounds both outbound calls
	/// of the login flow.
	///
	/// # Panics
	///
	/// Panics if the HTTP client cannot be built (should never happen in
	/// practice).
	#[tracing::instrument(skip_all, name = "OktaOAuthClient::new")]
	pub fn new(config: OktaOAuthConfig) -> Self {
		let http_client = gatehouse_common_http::new_client();
		Self {
			config,
			http_client,
		}
	}

	/// The configuration this client was built with.
	pub fn config(&self) -> &OktaOAuthConfig {
		&self.config
	}

	/// Generate the Okta authorization URL for the OAuth flow.
	///
	/// The returned URL should be used to redirect the user to Okta. After
	/// authentication, Okta redirects back to the configured `redirect_uri`
	/// with `code` and `state` query parameters.
	///
	/// # Arguments
	///
	/// - `state`: Random, unguessable CSRF token, stored server-side and
	///   verified when the user is redirected back.
	/// - `nonce`: Random replay-protection value bound into the id token.
	///
	/// # Returns
	///
	/// A URL string that includes:
	/// - `client_id`: The application's OAuth client ID
	/// - `response_type=code` and `response_mode=query`
	/// - `scope`: The requested scopes (space-separated)
	/// - `redirect_uri`: Where Okta will redirect after authentication,
	///   byte-for-byte equal to the configured value
	/// - `state` / `nonce`: The anti-forgery values
	#[tracing::instrument(skip(self, state, nonce), fields(client_id = %self.config.client_id))]
	pub fn authorization_url(&self, state: &str, nonce: &str) -> String {
		let mut url =
			Url::parse(&self.config.authorize_endpoint()).expect("invalid authorize URL");

		url
			.query_pairs_mut()
			.append_pair("client_id", &self.config.client_id)
			.append_pair("response_type", "code")
			.append_pair("response_mode", "query")
			.append_pair("scope", &self.config.scopes_string())
			.append_pair("redirect_uri", &self.config.redirect_uri)
			.append_pair("state", state)
			.append_pair("nonce", nonce);

		url.to_string()
	}

	/// Exchange an authorization code for an access token.
	///
	/// Sends a `POST` to the token endpoint with `grant_type`, `code`, and
	/// `redirect_uri` as query parameters, an empty body, and the client
	/// credentials as an `Authorization: Basic` header.
	///
	/// # Errors
	///
	/// - [`TokenError::Transport`]: Network error or timeout.
	/// - [`TokenError::BadStatus`]: Okta rejected the exchange.
	/// - [`TokenError::MalformedBody`]: Response was not valid JSON.
	/// - [`TokenError::MissingAccessToken`]: Response carried no token.
	#[tracing::instrument(skip(self, code), name = "OktaOAuthClient::exchange_code")]
	pub async fn exchange_code(&self, code: &str) -> Result<OktaTokenResponse, TokenError> {
		tracing::debug!("exchanging authorization code for access token");

		let response = self
			.http_client
			.post(self.config.token_endpoint())
			.query(&[
				("grant_type", "authorization_code"),
				("code", code),
				("redirect_uri", self.config.redirect_uri.as_str()),
			])
			.header("Accept", "application/json")
			.header(
				"Authorization",
				format!("Basic {}", self.config.basic_credential()),
			)
			.header("Content-Length", "0")
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			tracing::warn!(status = %status, "token exchange rejected");
			return Err(TokenError::BadStatus { status });
		}

		let body = response.text().await?;
		let raw: RawTokenResponse = serde_json::from_str(&body)
			.map_err(|e| TokenError::MalformedBody(e.to_string()))?;
		raw.into_token_response()
	}

	/// Fetch the authenticated user's profile claims from Okta.
	///
	/// # Arguments
	///
	/// - `access_token`: The OAuth access token from [`exchange_code`].
	///
	/// # Errors
	///
	/// - [`ProfileError::Transport`]: Network error or timeout.
	/// - [`ProfileError::BadStatus`]: Token invalid or expired.
	/// - [`ProfileError::MalformedBody`]: Response was not valid JSON.
	/// - [`ProfileError::MissingRequiredClaim`]: No `preferred_username`.
	#[tracing::instrument(skip(self, access_token), name = "OktaOAuthClient::fetch_userinfo")]
	pub async fn fetch_userinfo(&self, access_token: &str) -> Result<UserInfo, ProfileError> {
		tracing::debug!("fetching Okta userinfo claims");

		let response = self
			.http_client
			.get(self.config.userinfo_endpoint())
			.header("Accept", "application/json")
			.header("Authorization", format!("Bearer {access_token}"))
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			tracing::warn!(status = %status, "userinfo request rejected");
			return Err(ProfileError::BadStatus { status });
		}

		let body = response.text().await?;
		let raw: RawUserInfo = serde_json::from_str(&body)
			.map_err(|e| ProfileError::MalformedBody(e.to_string()))?;
		raw.into_userinfo()
	}
}



#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		/// Authorization URLs must always contain required OAuth parameters
		/// regardless of the input values.
		#[test]
		fn authorization_url_always_has_required_params(
			client_id in "[a-zA-Z0-9]{1,40}",
			redirect_uri in "https://[a-z]{1,20}\\.[a-z]{2,5}/[a-z]{1,20}",
			state in "[a-zA-Z0-9]{1,64}",
			nonce in "[a-zA-Z0-9]{1,64}",
		) {
			let config = OktaOAuthConfig::new(
				"https://dev-1.example.com",
				client_id,
				"secret",
				redirect_uri,
			);

			let client = OktaOAuthClient::new(config);
			let url = client.authorization_url(&state, &nonce);

			prop_assert!(url.starts_with("https://dev-1.example.com/oauth2/default/v1/authorize?"));
			prop_assert!(url.contains("client_id="));
			prop_assert!(url.contains("response_type=code"));
			prop_assert!(url.contains("redirect_uri="));
			prop_assert!(url.contains("scope="));
			let state_param = format!("state={state}");
			let nonce_param = format!("nonce={nonce}");
			prop_assert!(url.contains(&state_param));
			prop_assert!(url.contains(&nonce_param));
		}

		/// Scope joining and parsing should roundtrip correctly.
		#[test]
		fn scope_join_and_parse_roundtrips(
			scopes in proptest::collection::vec("[a-z]{1,12}", 1..5)
		) {
			let mut config = OktaOAuthConfig::new(
				"https://dev-1.example.com",
				"abc",
				"xyz",
				"https://x/cb",
			);
			config.scopes = scopes.clone();

			let joined = config.scopes_string();
			let parsed = OktaOAuthConfig::parse_scopes(&joined);

			prop_assert_eq!(parsed, scopes);
		}

		/// Valid https configurations should always pass validation.
		#[test]
		fn valid_config_passes_validation(
			client_id in "[a-zA-Z0-9]{1,40}",
			client_secret in "[a-zA-Z0-9]{1,40}",
			org in "https://[a-z]{1,20}\\.[a-z]{2,5}",
		) {
			let config = OktaOAuthConfig::new(org, client_id, client_secret, "https://x/cb");
			prop_assert!(config.validate().is_ok());
		}

		/// Blank client credentials always fail validation.
		#[test]
		fn blank_credentials_fail_validation(
			client_secret in "[a-zA-Z0-9]{1,40}",
		) {
			let config = OktaOAuthConfig::new(
				"https://dev-1.example.com",
				"",
				client_secret,
				"https://x/cb",
			);
			prop_assert!(config.validate().is_err());
		}

		/// The client secret never appears in debug output.
		#[test]
		fn client_secret_never_in_debug(
			secret in "[a-zA-Z0-9]{10,40}"
		) {
			prop_assume!(!secret.contains("REDACTED"));

			let config = OktaOAuthConfig::new(
				"https://dev-1.example.com",
				"abc",
				secret.clone(),
				"https://x/cb",
			);

			let debug = format!("{config:?}");
			prop_assert!(!debug.contains(&secret));
		}

		/// Generated state values are unguessable alphanumerics of fixed
		/// length and fresh per call.
		#[test]
		fn generated_state_is_fresh(_i in 0..16u8) {
			let a = AuthorizeRequest::generate();
			let b = AuthorizeRequest::generate();
			prop_assert_eq!(a.state.len(), 32);
			prop_assert!(a.state.chars().all(|c| c.is_ascii_alphanumeric()));
			prop_assert_ne!(a.state, b.state);
		}
	}
}
