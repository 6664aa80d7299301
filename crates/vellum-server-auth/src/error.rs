// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed authentication failures.
//!
//! A failure is never collapsed into a bare boolean: each variant tells the
//! caller whether to offer a retry ("resend code") or a terminal message
//! ("contact the sender"). Display strings are user-facing and never echo
//! secrets or internal codes.

use vellum_server_db::DbError;

/// Why one authentication challenge did not pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
	#[error("No verification code has been issued; ask the sender for one")]
	NotIssued,

	#[error("The verification code has expired; request a new one")]
	Expired,

	#[error("Too many incorrect attempts; a new code must be issued")]
	AttemptLimitReached,

	#[error("Incorrect verification code")]
	CodeMismatch { remaining: i64 },

	#[error("This account has no authenticator app enrolled; use the email code instead")]
	TwoFactorNotEnrolled,

	#[error("The signed-in email does not match this recipient")]
	EmailMismatch,

	#[error("Sign in to continue")]
	SessionRequired,

	#[error("Incorrect password")]
	PasswordMismatch,

	#[error("Passkey verification was rejected")]
	PasskeyRejected,

	#[error("No passkey challenge is outstanding; start the passkey flow again")]
	ChallengeNotIssued,

	#[error("The submitted proof does not match the required method")]
	UnsupportedProof,

	#[error("Verification timed out; try again")]
	ProviderTimeout,

	#[error("Verification is temporarily unavailable; try again")]
	ProviderUnavailable,
}

impl AuthFailure {
	/// Whether the caller can sensibly retry without sender intervention.
	pub fn is_retryable(&self) -> bool {
		match self {
			AuthFailure::Expired
			| AuthFailure::CodeMismatch { .. }
			| AuthFailure::PasswordMismatch
			| AuthFailure::PasskeyRejected
			| AuthFailure::ChallengeNotIssued
			| AuthFailure::ProviderTimeout
			| AuthFailure::ProviderUnavailable
			| AuthFailure::SessionRequired => true,

			AuthFailure::NotIssued
			| AuthFailure::AttemptLimitReached
			| AuthFailure::TwoFactorNotEnrolled
			| AuthFailure::EmailMismatch
			| AuthFailure::UnsupportedProof => false,
		}
	}
}

/// Challenge execution error: a typed failure or an infrastructure fault.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error(transparent)]
	Failure(#[from] AuthFailure),

	#[error("Storage error: {0}")]
	Storage(#[from] DbError),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_retryable_classification() {
		assert!(AuthFailure::Expired.is_retryable());
		assert!(AuthFailure::CodeMismatch { remaining: 2 }.is_retryable());
		assert!(AuthFailure::ProviderTimeout.is_retryable());
		assert!(!AuthFailure::AttemptLimitReached.is_retryable());
		assert!(!AuthFailure::NotIssued.is_retryable());
		assert!(!AuthFailure::TwoFactorNotEnrolled.is_retryable());
	}

	#[test]
	fn test_messages_do_not_leak_internals() {
		let message = AuthFailure::CodeMismatch { remaining: 1 }.to_string();
		assert!(!message.contains("hash"));
		assert!(!message.contains("sha"));
	}
}
