// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Session establishment for logged-in users.
//!
//! After the callback resolves a local user, [`SessionService::establish`]
//! mints a random 256-bit session token with an expiry and emits a login
//! event. The session mechanism is a collaborator boundary: sessions live
//! in memory with a TTL, and validating or revoking them is the only
//! contract the login flow relies on.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use gatehouse_server_auth::{LocalUser, SessionId, UserId};
use rand::RngCore;
use tokio::sync::RwLock;

/// Name of the session cookie set after a successful login.
pub const SESSION_COOKIE_NAME: &str = "gatehouse_session";

/// Default session lifetime: 7 days.
const DEFAULT_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Token length in bytes before hex encoding.
const TOKEN_LEN: usize = 32;

/// An established session.
#[derive(Debug, Clone)]
pub struct Session {
	pub id: SessionId,
	pub user_id: UserId,
	pub username: String,
	pub expires_at: DateTime<Utc>,
}

impl Session {
	fn is_expired(&self) -> bool {
		self.expires_at < Utc::now()
	}
}

/// A freshly established session together with its bearer token.
///
/// The token is returned exactly once, to be written into the session
/// cookie; it is not recoverable from the service afterwards.
pub struct EstablishedSession {
	pub token: String,
	pub session: Session,
}

/// Callback invoked after each successful login.
pub type LoginListener = dyn Fn(&LocalUser) + Send + Sync;

/// In-memory session service with TTL expiry.
pub struct SessionService {
	sessions: RwLock<HashMap<String, Session>>,
	ttl: Duration,
	login_listener: Option<Box<LoginListener>>,
}

impl Default for SessionService {
	fn default() -> Self {
		Self::new()
	}
}

impl SessionService {
	pub fn new() -> Self {
		Self {
			sessions: RwLock::new(HashMap::new()),
			ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
			login_listener: None,
		}
	}

	/// Override the session lifetime.
	pub fn with_ttl(mut self, ttl: Duration) -> Self {
		self.ttl = ttl;
		self
	}

	/// Register a listener invoked after each successful login.
	pub fn with_login_listener(
		mut self,
		listener: impl Fn(&LocalUser) + Send + Sync + 'static,
	) -> Self {
		self.login_listener = Some(Box::new(listener));
		self
	}

	/// Create a session for a resolved user and emit the login event.
	#[tracing::instrument(skip_all, fields(user_id = %user.id))]
	pub async fn establish(&self, user: &LocalUser) -> EstablishedSession {
		let token = generate_token();
		let session = Session {
			id: SessionId::generate(),
			user_id: user.id,
			username: user.username.clone(),
			expires_at: Utc::now() + self.ttl,
		};

		self.sessions
			.write()
			.await
			.insert(token.clone(), session.clone());

		tracing::info!(username = %user.username, "user logged in");
		if let Some(listener) = &self.login_listener {
			listener(user);
		}

		EstablishedSession { token, session }
	}

	/// Look up a session by bearer token. Expired sessions are absent.
	pub async fn validate(&self, token: &str) -> Option<Session> {
		let sessions = self.sessions.read().await;
		let session = sessions.get(token)?;
		if session.is_expired() {
			return None;
		}
		Some(session.clone())
	}

	/// Remove a session. Unknown tokens are not an error.
	pub async fn revoke(&self, token: &str) {
		self.sessions.write().await.remove(token);
	}

	/// Drop expired sessions. Returns how many were removed.
	pub async fn cleanup_expired(&self) -> usize {
		let mut sessions = self.sessions.write().await;
		let before = sessions.len();
		sessions.retain(|_, session| !session.is_expired());
		before - sessions.len()
	}

	/// Build the `Set-Cookie` value for a session token.
	pub fn session_cookie(&self, token: &str) -> String {
		format!(
			"{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
			self.ttl.num_seconds()
		)
	}
}

fn generate_token() -> String {
	let mut bytes = [0u8; TOKEN_LEN];
	rand::thread_rng().fill_bytes(&mut bytes);
	hex::encode(bytes)
}
