// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Argon2 password verification against the document owner's stored hash.
//!
//! Production uses `Argon2::default()` (Argon2id, ~19 MiB memory, 2
//! iterations). Tests use minimal parameters for speed; those MUST NOT be
//! used in production.

use argon2::password_hash::PasswordHash;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::AuthFailure;

/// Returns an Argon2 instance configured appropriately for the build context.
#[inline]
pub(crate) fn argon2_instance() -> Argon2<'static> {
	#[cfg(test)]
	{
		use argon2::{Algorithm, Params, Version};
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

/// Verify a submitted password against a stored PHC-format Argon2 hash.
///
/// The hash belongs to the document owner's account: the recipient proves
/// they hold the owner-shared credential, bound separately by email match.
pub fn verify_password(stored_hash: &str, submitted: &str) -> Result<(), AuthFailure> {
	let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthFailure::PasswordMismatch)?;
	argon2_instance()
		.verify_password(submitted.as_bytes(), &parsed)
		.map_err(|_| AuthFailure::PasswordMismatch)
}

/// Hash a password for storage, PHC string format.
///
/// Used by account provisioning and by tests; verification goes through
/// [`verify_password`].
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
	use argon2::password_hash::{rand_core::OsRng, SaltString};
	let salt = SaltString::generate(&mut OsRng);
	Ok(argon2_instance()
		.hash_password(password.as_bytes(), &salt)?
		.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_verify_accepts_correct_password() {
		let hash = hash_password("hunter2").unwrap();
		assert!(verify_password(&hash, "hunter2").is_ok());
	}

	#[test]
	fn test_verify_rejects_wrong_password() {
		let hash = hash_password("hunter2").unwrap();
		assert_eq!(
			verify_password(&hash, "hunter3"),
			Err(AuthFailure::PasswordMismatch)
		);
	}

	#[test]
	fn test_verify_rejects_malformed_hash() {
		assert_eq!(
			verify_password("not-a-phc-hash", "hunter2"),
			Err(AuthFailure::PasswordMismatch)
		);
	}
}
