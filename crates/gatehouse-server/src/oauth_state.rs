// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server-side storage for in-flight OAuth login attempts.
//!
//! Starting a login stores the generated `state` and `nonce` under an
//! opaque flow id; the flow id travels back to the browser in a short-lived
//! HttpOnly cookie. The callback can then only be completed by the browser
//! that started the flow: it must present the cookie, and the `state`
//! echoed by the provider must match the stored value. Entries are
//! single-use ([`OAuthStateStore::take`] removes on read) and expire after
//! [`PENDING_LOGIN_TTL`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

/// How long a started login may wait for its callback.
pub const PENDING_LOGIN_TTL: Duration = Duration::from_secs(600);

/// Anti-forgery values for one started login.
#[derive(Debug, Clone)]
pub struct PendingLogin {
	pub state: String,
	pub nonce: String,
	created_at: Instant,
}

impl PendingLogin {
	fn is_expired(&self) -> bool {
		self.created_at.elapsed() > PENDING_LOGIN_TTL
	}
}

/// In-memory store of pending logins, keyed by opaque flow id.
#[derive(Default)]
pub struct OAuthStateStore {
	entries: RwLock<HashMap<String, PendingLogin>>,
}

impl OAuthStateStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Store a pending login and return the opaque flow id for the cookie.
	pub async fn insert(&self, state: impl Into<String>, nonce: impl Into<String>) -> String {
		let flow_id = Uuid::new_v4().to_string();
		let pending = PendingLogin {
			state: state.into(),
			nonce: nonce.into(),
			created_at: Instant::now(),
		};
		self.entries.write().await.insert(flow_id.clone(), pending);
		flow_id
	}

	/// Remove and return the pending login for a flow id.
	///
	/// Single-use: a second `take` for the same id returns `None`, so a
	/// replayed callback cannot verify. Expired entries are treated as
	/// absent.
	pub async fn take(&self, flow_id: &str) -> Option<PendingLogin> {
		let pending = self.entries.write().await.remove(flow_id)?;
		if pending.is_expired() {
			return None;
		}
		Some(pending)
	}

	/// Drop entries older than [`PENDING_LOGIN_TTL`]. Returns how many were
	/// removed.
	pub async fn cleanup_expired(&self) -> usize {
		let mut entries = self.entries.write().await;
		let before = entries.len();
		entries.retain(|_, pending| !pending.is_expired());
		before - entries.len()
	}

	pub async fn len(&self) -> usize {
		self.entries.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.read().await.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn take_returns_stored_values_once() {
		let store = OAuthStateStore::new();
		let flow_id = store.insert("state123", "nonce456").await;

		let pending = store.take(&flow_id).await.unwrap();
		assert_eq!(pending.state, "state123");
		assert_eq!(pending.nonce, "nonce456");

		assert!(store.take(&flow_id).await.is_none());
	}

	#[tokio::test]
	async fn take_of_unknown_flow_id_returns_none() {
		let store = OAuthStateStore::new();
		assert!(store.take("no-such-flow").await.is_none());
	}

	#[tokio::test]
	async fn flow_ids_are_unique_per_login() {
		let store = OAuthStateStore::new();
		let first = store.insert("s1", "n1").await;
		let second = store.insert("s2", "n2").await;
		assert_ne!(first, second);
		assert_eq!(store.len().await, 2);
	}

	#[tokio::test]
	async fn expired_entries_are_not_returned() {
		let store = OAuthStateStore::new();
		let flow_id = store.insert("state123", "nonce456").await;
		{
			let mut entries = store.entries.write().await;
			let pending = entries.get_mut(&flow_id).unwrap();
			pending.created_at = Instant::now() - PENDING_LOGIN_TTL - Duration::from_secs(1);
		}
		assert!(store.take(&flow_id).await.is_none());
	}

	#[tokio::test]
	async fn cleanup_removes_only_expired_entries() {
		let store = OAuthStateStore::new();
		let stale = store.insert("s1", "n1").await;
		store.insert("s2", "n2").await;
		{
			let mut entries = store.entries.write().await;
			let pending = entries.get_mut(&stale).unwrap();
			pending.created_at = Instant::now() - PENDING_LOGIN_TTL - Duration::from_secs(1);
		}

		assert_eq!(store.cleanup_expired().await, 1);
		assert_eq!(store.len().await, 1);
	}
}
