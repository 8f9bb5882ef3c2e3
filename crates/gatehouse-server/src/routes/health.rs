// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Health HTTP handler.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub version: &'static str,
	/// Whether the deployment has usable Okta credentials. Informational;
	/// an unconfigured deployment is still alive.
	pub okta_configured: bool,
}

/// GET /health - Liveness probe.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
	let okta_configured = state.okta_client().await.is_ok();

	Json(HealthResponse {
		status: "ok",
		version: env!("CARGO_PKG_VERSION"),
		okta_configured,
	})
}
