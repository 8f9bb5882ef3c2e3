// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Argon2 configuration for hashing provisioning passwords.
//!
//! Provisioned users never log in with their password (they authenticate
//! through the identity provider), but the stored hash must still be
//! production strength so a leaked database does not hand out credentials.
//!
//! Test builds use intentionally weak parameters for speed; they MUST NOT
//! be used in production.

use argon2::Argon2;
#[cfg(test)]
use argon2::{Algorithm, Params, Version};

/// Returns an Argon2 instance configured appropriately for the build
/// context.
///
/// In production returns `Argon2::default()` (Argon2id, ~19 MiB memory,
/// 2 iterations). In tests returns a minimal-cost instance.
#[inline]
pub(crate) fn argon2_instance() -> Argon2<'static> {
	#[cfg(test)]
	{
		// Fast, insecure parameters for tests ONLY.
		let params = Params::new(
			1024, // memory_kib: 1 MiB
			1,    // iterations
			1,    // parallelism
			None, // output length = default
		)
		.expect("valid Argon2 params for tests");
		Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
	}

	#[cfg(not(test))]
	{
		Argon2::default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn argon2_instance_returns_valid_hasher() {
		let argon2 = argon2_instance();
		let _ = format!("{argon2:?}");
	}
}
