// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Default timeout applied to identity-provider round trips.
///
/// Token exchange and userinfo fetches are blocking steps in a login; a
/// provider that has not answered within this window fails the attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates a new HTTP client with the standard Gatehouse User-Agent header
/// and the default timeout.
pub fn new_client() -> Client {
	new_client_with_timeout(DEFAULT_TIMEOUT)
}

/// Creates a new HTTP client builder with the standard Gatehouse User-Agent
/// header.
///
/// Use this when you need to customize the client (e.g., set timeout).
///
/// # Example
/// ```ignore
/// let client = gatehouse_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a new HTTP client with a custom timeout and the standard
/// User-Agent.
pub fn new_client_with_timeout(timeout: Duration) -> Client {
	builder()
		.timeout(timeout)
		.build()
		.expect("failed to build HTTP client")
}

/// Returns the standard Gatehouse User-Agent string.
///
/// Format: `gatehouse/{version}`
pub fn user_agent() -> String {
	format!("gatehouse/{}", env!("CARGO_PKG_VERSION"))
}
