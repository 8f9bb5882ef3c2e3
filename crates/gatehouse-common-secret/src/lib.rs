// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Secret wrapper type for sensitive string values.
//!
//! [`SecretString`] holds values such as OAuth client secrets and access
//! tokens. It guards against the two most common leak paths:
//!
//! - **Logging**: `Debug` and `Display` render `[REDACTED]` instead of the
//!   wrapped value. Reading the value requires an explicit call to
//!   [`SecretString::expose`], which is easy to audit for.
//! - **Memory reuse**: the inner string is zeroized when the wrapper is
//!   dropped.
//!
//! With the `serde` feature (default), secrets deserialize from plain JSON
//! strings so they can live inside response types, but they never serialize
//! back out — serialization always emits `[REDACTED]`.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Placeholder emitted wherever a secret would otherwise appear.
pub const REDACTED: &str = "[REDACTED]";

/// A string whose value must not appear in logs, errors, or serialized
/// output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
	/// Wrap a sensitive value.
	pub fn new(value: String) -> Self {
		Self(value)
	}

	/// Access the wrapped value.
	///
	/// Call sites of this method are the complete set of places the secret
	/// can escape; keep them few.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns true if the wrapped value is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let value = String::deserialize(deserializer)?;
		Ok(SecretString::new(value))
	}
}

#[cfg(feature = "serde")]
impl serde::Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn expose_returns_wrapped_value() {
		let secret = SecretString::new("hunter2".to_string());
		assert_eq!(secret.expose(), "hunter2");
	}

	#[test]
	fn debug_is_redacted() {
		let secret = SecretString::new("hunter2".to_string());
		assert_eq!(format!("{secret:?}"), REDACTED);
	}

	#[test]
	fn display_is_redacted() {
		let secret = SecretString::new("hunter2".to_string());
		assert_eq!(format!("{secret}"), REDACTED);
	}

	#[test]
	fn is_empty() {
		assert!(SecretString::new(String::new()).is_empty());
		assert!(!SecretString::new("x".to_string()).is_empty());
	}

	#[cfg(feature = "serde")]
	#[test]
	fn deserializes_from_plain_string() {
		let secret: SecretString = serde_json::from_str("\"tok123\"").unwrap();
		assert_eq!(secret.expose(), "tok123");
	}

	#[cfg(feature = "serde")]
	#[test]
	fn serializes_as_redacted() {
		let secret = SecretString::new("tok123".to_string());
		let json = serde_json::to_string(&secret).unwrap();
		assert_eq!(json, format!("\"{REDACTED}\""));
	}

	mod proptests {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			/// No secret value may ever leak through Debug formatting.
			#[test]
			fn debug_never_contains_value(value in "[a-zA-Z0-9]{8,40}") {
				prop_assume!(!REDACTED.contains(&value));
				let secret = SecretString::new(value.clone());
				let debug_output = format!("{secret:?}");
				prop_assert!(!debug_output.contains(&value));
			}

			/// Exposing always returns exactly what was wrapped.
			#[test]
			fn expose_roundtrips(value in ".{0,64}") {
				let secret = SecretString::new(value.clone());
				prop_assert_eq!(secret.expose(), value);
			}
		}
	}
}
