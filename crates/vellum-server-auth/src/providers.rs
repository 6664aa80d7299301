// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Collaborator traits for external identity and delivery services.
//!
//! The challenge executor never talks to SMTP, WebAuthn, or the account
//! directory directly; implementations of these traits are injected so the
//! executor stays testable and the external surfaces swappable.

use async_trait::async_trait;

use vellum_core::types::AccountId;

/// Failure from an external identity/credential collaborator.
///
/// Timeouts are raised by the executor itself; collaborators report
/// unavailability or rejection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
	#[error("provider unavailable: {0}")]
	Unavailable(String),

	#[error("provider rejected the request: {0}")]
	Rejected(String),
}

/// Account directory lookups the password and TOTP flows need.
#[async_trait]
pub trait OwnerDirectory: Send + Sync {
	/// The stored PHC-format password hash for an account, if one is set.
	async fn password_hash(&self, account: &AccountId) -> Result<Option<String>, ProviderError>;

	/// The account a recipient email belongs to, if any.
	async fn account_for_email(&self, email: &str) -> Result<Option<AccountId>, ProviderError>;
}

/// Authenticator-app verification against an account's enrolled secret.
#[async_trait]
pub trait TotpVerifier: Send + Sync {
	/// Whether the account has an authenticator app enrolled.
	async fn is_enrolled(&self, account: &AccountId) -> Result<bool, ProviderError>;

	/// Verify a time-based code against the enrolled secret.
	async fn verify_code(&self, account: &AccountId, code: &str) -> Result<bool, ProviderError>;
}

/// Platform passkey (WebAuthn) challenge issuance and verification.
#[async_trait]
pub trait PasskeyVerifier: Send + Sync {
	/// Issue a new challenge for a recipient email.
	///
	/// Returns `(challenge_ref, client_options)`: the reference is stored
	/// server-side, the options are forwarded to the platform authenticator.
	async fn issue_challenge(&self, email: &str) -> Result<(String, String), ProviderError>;

	/// Verify a serialized authenticator response against an issued
	/// challenge, returning an opaque assertion on success.
	async fn verify_response(
		&self,
		challenge_ref: &str,
		response: &str,
	) -> Result<String, ProviderError>;
}

/// Outbound delivery of one-time email codes. Fire-and-forget.
#[async_trait]
pub trait CodeMailer: Send + Sync {
	async fn send_code(&self, email: &str, code: &str) -> Result<(), ProviderError>;
}
