// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! SQLite-backed settings store.
//!
//! Persists the deployment's Okta credentials (`okta_org_url`,
//! `okta_client_id`, `okta_client_secret`) as key/value rows. Values are
//! read fresh on every login request, so an operator updating a credential
//! does not require a restart. A single settings scope per deployment;
//! environment variables override persisted values at read time (the
//! override lives in the config loader, not here).

use async_trait::async_trait;
use chrono::Utc;
use gatehouse_server_auth_okta::{SettingsError, SettingsStore};
use sqlx::{Row, SqlitePool};

/// Settings store persisting key/value rows in SQLite.
#[derive(Clone)]
pub struct SqliteSettingsStore {
	pool: SqlitePool,
}

impl SqliteSettingsStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create the settings table if it does not exist.
	pub async fn migrate(&self) -> Result<(), sqlx::Error> {
		sqlx::query(
			r#"
			CREATE TABLE IF NOT EXISTS settings (
				key TEXT PRIMARY KEY,
				value TEXT NOT NULL,
				updated_at TEXT NOT NULL
			)
			"#,
		)
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	/// Write a setting, replacing any existing value.
	pub async fn set(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
		sqlx::query(
			r#"
			INSERT INTO settings (key, value, updated_at)
			VALUES (?, ?, ?)
			ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
			"#,
		)
		.bind(key)
		.bind(value)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	/// Remove a setting. Missing keys are not an error.
	pub async fn delete(&self, key: &str) -> Result<(), sqlx::Error> {
		sqlx::query("DELETE FROM settings WHERE key = ?")
			.bind(key)
			.execute(&self.pool)
			.await?;
		Ok(())
	}
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
	async fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
		let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
			.bind(key)
			.fetch_optional(&self.pool)
			.await
			.map_err(|e| SettingsError(e.to_string()))?;
		Ok(row.map(|r| r.get::<String, _>("value")))
	}
}
