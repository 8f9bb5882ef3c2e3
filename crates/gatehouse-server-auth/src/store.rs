// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! User store contract and implementations.
//!
//! The provisioner's existence-check-then-insert must not race under
//! concurrent first logins with the same username, so the store exposes an
//! atomic [`UserStore::insert_if_absent`] instead of separate check and
//! insert operations. The SQLite implementation leans on the username
//! unique constraint with `ON CONFLICT DO NOTHING` plus a reselect; the
//! in-memory implementation serializes on a single mutex.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
	SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteRow, SqliteSynchronous,
};
use sqlx::Row;
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::Mutex;

use crate::types::UserId;
use crate::user::{LocalUser, NewLocalUser};

/// Errors from the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("corrupt store state: {0}")]
	Corrupt(String),
}

/// Errors surfaced by user provisioning.
///
/// Both variants are unrecoverable for the current login attempt; the
/// user restarts the flow.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
	/// The store reported a constraint conflict it could not resolve to an
	/// existing row.
	#[error("user store conflict: {0}")]
	StoreConflict(String),

	/// The store rejected the write for any other reason.
	#[error("user store write failed: {0}")]
	StoreWriteFailure(String),
}

impl From<StoreError> for ProvisionError {
	fn from(err: StoreError) -> Self {
		match err {
			StoreError::Corrupt(msg) => ProvisionError::StoreConflict(msg),
			other => ProvisionError::StoreWriteFailure(other.to_string()),
		}
	}
}

/// Storage contract for local users.
#[async_trait]
pub trait UserStore: Send + Sync {
	/// Look up a user by exact username match.
	async fn find_by_username(&self, username: &str) -> Result<Option<LocalUser>, StoreError>;

	/// Insert a user unless the username already exists.
	///
	/// Atomic with respect to concurrent calls for the same username:
	/// exactly one caller creates the row, every other caller receives the
	/// winner's row. Returns the stored user and whether this call created
	/// it.
	async fn insert_if_absent(&self, user: NewLocalUser) -> Result<(LocalUser, bool), StoreError>;

	/// Replace a user's role.
	async fn set_role(&self, id: &UserId, role: &str) -> Result<(), StoreError>;
}

// =============================================================================
// SQLite
// =============================================================================

/// Create a SqlitePool with WAL mode and common settings.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./gatehouse.db")
///
/// # Errors
/// Returns `StoreError` if the URL is invalid or connection fails.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StoreError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| StoreError::Corrupt(format!("invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// SQLite-backed user store.
#[derive(Debug, Clone)]
pub struct SqliteUserStore {
	pool: SqlitePool,
}

impl SqliteUserStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create the users table if it does not exist.
	pub async fn migrate(&self) -> Result<(), StoreError> {
		sqlx::query(
			r#"
			CREATE TABLE IF NOT EXISTS users (
				id TEXT PRIMARY KEY,
				username TEXT NOT NULL UNIQUE,
				password_hash TEXT NOT NULL,
				role TEXT NOT NULL,
				created_at TEXT NOT NULL
			)
			"#,
		)
		.execute(&self.pool)
		.await?;
		Ok(())
	}
}

fn row_to_user(row: &SqliteRow) -> Result<LocalUser, StoreError> {
	let id: String = row.get("id");
	let created_at: String = row.get("created_at");
	Ok(LocalUser {
		id: id
			.parse()
			.map_err(|e: uuid::Error| StoreError::Corrupt(e.to_string()))?,
		username: row.get("username"),
		role: row.get("role"),
		created_at: DateTime::parse_from_rfc3339(&created_at)
			.map_err(|e| StoreError::Corrupt(e.to_string()))?
			.with_timezone(&Utc),
	})
}

#[async_trait]
impl UserStore for SqliteUserStore {
	#[tracing::instrument(skip(self))]
	async fn find_by_username(&self, username: &str) -> Result<Option<LocalUser>, StoreError> {
		let row = sqlx::query("SELECT id, username, role, created_at FROM users WHERE username = ?")
			.bind(username)
			.fetch_optional(&self.pool)
			.await?;
		row.as_ref().map(row_to_user).transpose()
	}

	#[tracing::instrument(skip(self, user), fields(username = %user.username))]
	async fn insert_if_absent(&self, user: NewLocalUser) -> Result<(LocalUser, bool), StoreError> {
		let created_at = Utc::now();
		let result = sqlx::query(
			r#"
			INSERT INTO users (id, username, password_hash, role, created_at)
			VALUES (?, ?, ?, ?, ?)
			ON CONFLICT(username) DO NOTHING
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.username)
		.bind(&user.password_hash)
		.bind(&user.role)
		.bind(created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 1 {
			return Ok((
				LocalUser {
					id: user.id,
					username: user.username,
					role: user.role,
					created_at,
				},
				true,
			));
		}

		// Lost the race; the winner's row must be there.
		match self.find_by_username(&user.username).await? {
			Some(existing) => Ok((existing, false)),
			None => Err(StoreError::Corrupt(format!(
				"insert for {} conflicted but no row exists",
				user.username
			))),
		}
	}

	#[tracing::instrument(skip(self))]
	async fn set_role(&self, id: &UserId, role: &str) -> Result<(), StoreError> {
		sqlx::query("UPDATE users SET role = ? WHERE id = ?")
			.bind(role)
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;
		Ok(())
	}
}

// =============================================================================
// In-memory
// =============================================================================

/// In-memory user store for tests and single-process setups.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
	users: Mutex<HashMap<String, LocalUser>>,
}

impl InMemoryUserStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of stored users.
	pub async fn len(&self) -> usize {
		self.users.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.users.lock().await.is_empty()
	}
}

#[async_trait]
impl UserStore for InMemoryUserStore {
	async fn find_by_username(&self, username: &str) -> Result<Option<LocalUser>, StoreError> {
		Ok(self.users.lock().await.get(username).cloned())
	}

	async fn insert_if_absent(&self, user: NewLocalUser) -> Result<(LocalUser, bool), StoreError> {
		let mut users = self.users.lock().await;
		if let Some(existing) = users.get(&user.username) {
			return Ok((existing.clone(), false));
		}
		let stored = LocalUser {
			id: user.id,
			username: user.username.clone(),
			role: user.role,
			created_at: Utc::now(),
		};
		users.insert(user.username, stored.clone());
		Ok((stored, true))
	}

	async fn set_role(&self, id: &UserId, role: &str) -> Result<(), StoreError> {
		let mut users = self.users.lock().await;
		for user in users.values_mut() {
			if &user.id == id {
				user.role = role.to_string();
				return Ok(());
			}
		}
		Ok(())
	}
}
