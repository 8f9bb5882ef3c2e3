// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for Gatehouse.
//!
//! This crate provides a pre-configured HTTP client with a consistent
//! User-Agent header and timeout helpers. Outbound identity-provider calls
//! all go through clients built here so their timeouts and headers stay
//! uniform.

mod client;

pub use client::{builder, new_client, new_client_with_timeout, user_agent, DEFAULT_TIMEOUT};
