// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Challenge execution: validating a submitted proof against one required
//! authentication method.
//!
//! The executor owns code storage and delegates credential checks to the
//! injected collaborator traits. Every collaborator call is wrapped in a
//! timeout so a stalled identity provider degrades into a retryable
//! [`AuthFailure::ProviderTimeout`] instead of hanging a signing request.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use vellum_core::auth_options::AuthMethod;
use vellum_core::recipient::Recipient;
use vellum_core::types::{AccountId, RecipientId};
use vellum_server_config::AuthConfig;
use vellum_server_db::two_factor::{hash_code, CodeVerdict, TwoFactorRepository};

use crate::error::{AuthError, AuthFailure};
use crate::password::verify_password;
use crate::providers::{CodeMailer, OwnerDirectory, PasskeyVerifier, ProviderError, TotpVerifier};

/// A credential submitted alongside a signing action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmittedProof {
	/// No credential. Valid only when the resolved gate is `explicit_none`.
	None,
	/// An authenticated session carrying the signed-in email.
	Session { email: String },
	/// The document owner's account password.
	Password { password: String },
	/// Serialized platform authenticator response for an issued challenge.
	Passkey { response: String },
	/// Time-based code from an enrolled authenticator app.
	TwoFactorApp { code: String },
	/// One-time code delivered to the recipient's email.
	TwoFactorEmail { code: String },
	/// Code issued out-of-band by the document sender.
	ExternalCode { code: String },
}

impl SubmittedProof {
	/// The authentication method this proof can satisfy.
	pub fn method(&self) -> AuthMethod {
		match self {
			SubmittedProof::None => AuthMethod::ExplicitNone,
			SubmittedProof::Session { .. } => AuthMethod::Account,
			SubmittedProof::Password { .. } => AuthMethod::Password,
			SubmittedProof::Passkey { .. } => AuthMethod::Passkey,
			SubmittedProof::TwoFactorApp { .. } | SubmittedProof::TwoFactorEmail { .. } => {
				AuthMethod::TwoFactorAuth
			}
			SubmittedProof::ExternalCode { .. } => AuthMethod::ExternalTwoFactorAuth,
		}
	}
}

/// Evidence that one authentication challenge passed.
///
/// Recorded in the audit trail next to the signing event; never contains the
/// submitted credential itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionAuthProof {
	pub method: AuthMethod,
	pub recipient_id: RecipientId,
	pub verified_at: DateTime<Utc>,
	/// Opaque provider assertion for passkey verifications.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub assertion: Option<String>,
}

impl ActionAuthProof {
	fn passed(method: AuthMethod, recipient_id: RecipientId) -> Self {
		Self {
			method,
			recipient_id,
			verified_at: Utc::now(),
			assertion: None,
		}
	}
}

/// Everything the executor needs to know about who is being challenged.
#[derive(Debug, Clone)]
pub struct ChallengeContext {
	pub recipient: Recipient,
	/// Account of the document owner; password challenges verify against
	/// this account's stored hash.
	pub owner_account: AccountId,
	/// Direct-link envelopes have no bound recipient email, so the account
	/// gate passes without a session.
	pub direct_link: bool,
}

/// Validates submitted proofs against required authentication methods.
pub struct ChallengeExecutor {
	codes: TwoFactorRepository,
	directory: Arc<dyn OwnerDirectory>,
	totp: Arc<dyn TotpVerifier>,
	passkeys: Arc<dyn PasskeyVerifier>,
	mailer: Arc<dyn CodeMailer>,
	config: AuthConfig,
}

impl ChallengeExecutor {
	pub fn new(
		codes: TwoFactorRepository,
		directory: Arc<dyn OwnerDirectory>,
		totp: Arc<dyn TotpVerifier>,
		passkeys: Arc<dyn PasskeyVerifier>,
		mailer: Arc<dyn CodeMailer>,
		config: AuthConfig,
	) -> Self {
		Self {
			codes,
			directory,
			totp,
			passkeys,
			mailer,
			config,
		}
	}

	/// Validate `proof` against the set of methods the recipient may use.
	///
	/// The proof itself selects which allowed method it satisfies; a proof
	/// whose method is not in `allowed` fails with `UnsupportedProof` before
	/// any credential check runs.
	#[tracing::instrument(skip(self, ctx, proof), fields(recipient_id = %ctx.recipient.id))]
	pub async fn satisfy(
		&self,
		ctx: &ChallengeContext,
		allowed: &std::collections::BTreeSet<AuthMethod>,
		proof: &SubmittedProof,
	) -> Result<ActionAuthProof, AuthError> {
		let method = proof.method();
		if !allowed.contains(&method) {
			return Err(AuthFailure::UnsupportedProof.into());
		}
		self.execute(ctx, method, proof).await
	}

	/// Validate `proof` against one specific required method.
	#[tracing::instrument(skip(self, ctx, proof), fields(recipient_id = %ctx.recipient.id, method = %method))]
	pub async fn execute(
		&self,
		ctx: &ChallengeContext,
		method: AuthMethod,
		proof: &SubmittedProof,
	) -> Result<ActionAuthProof, AuthError> {
		let outcome = match (method, proof) {
			(AuthMethod::ExplicitNone, _) => {
				Ok(ActionAuthProof::passed(method, ctx.recipient.id))
			}

			(AuthMethod::Account, SubmittedProof::Session { email }) => {
				self.verify_session(ctx, email)
			}
			(AuthMethod::Account, SubmittedProof::None) if ctx.direct_link => {
				Ok(ActionAuthProof::passed(method, ctx.recipient.id))
			}
			(AuthMethod::Account, SubmittedProof::None) => {
				Err(AuthFailure::SessionRequired.into())
			}

			(AuthMethod::Password, SubmittedProof::Password { password }) => {
				self.verify_owner_password(ctx, password).await
			}

			(AuthMethod::Passkey, SubmittedProof::Passkey { response }) => {
				self.verify_passkey(ctx, response).await
			}

			(AuthMethod::TwoFactorAuth, SubmittedProof::TwoFactorApp { code }) => {
				self.verify_totp(ctx, code).await
			}
			(AuthMethod::TwoFactorAuth, SubmittedProof::TwoFactorEmail { code }) => {
				let verdict = self.codes.verify_email_code(&ctx.recipient.id, code).await?;
				verdict_to_outcome(verdict, method, ctx.recipient.id)
			}

			(AuthMethod::ExternalTwoFactorAuth, SubmittedProof::ExternalCode { code }) => {
				let verdict = self
					.codes
					.verify_external_code(&ctx.recipient.id, code)
					.await?;
				verdict_to_outcome(verdict, method, ctx.recipient.id)
			}

			_ => Err(AuthFailure::UnsupportedProof.into()),
		};

		match &outcome {
			Ok(_) => tracing::info!(method = %method, "challenge passed"),
			Err(AuthError::Failure(f)) => {
				tracing::warn!(method = %method, failure = %f, "challenge failed")
			}
			Err(AuthError::Storage(e)) => {
				tracing::error!(method = %method, error = %e, "challenge storage error")
			}
		}
		outcome
	}

	/// Issue a one-time email code to the recipient and dispatch it.
	///
	/// Replaces any outstanding code. Mail delivery is fire-and-forget: a
	/// mailer fault is logged, not surfaced, since the code row is already
	/// in place and the recipient can request a resend.
	#[tracing::instrument(skip(self, ctx), fields(recipient_id = %ctx.recipient.id))]
	pub async fn issue_email_code(&self, ctx: &ChallengeContext) -> Result<(), AuthError> {
		let code = generate_numeric_code();
		let expires_at =
			Utc::now() + chrono::Duration::seconds(self.config.email_code_expiry_secs);
		self.codes
			.issue_email_code(
				&ctx.recipient.id,
				&hash_code(&code),
				expires_at,
				self.config.email_code_max_attempts,
			)
			.await?;
		if let Err(e) = self.mailer.send_code(&ctx.recipient.email, &code).await {
			tracing::warn!(recipient_id = %ctx.recipient.id, error = %e, "email code dispatch failed");
		}
		Ok(())
	}

	/// Record a code the sender issued to the recipient out-of-band.
	#[tracing::instrument(skip(self, code))]
	pub async fn set_external_code(
		&self,
		recipient_id: &RecipientId,
		code: &str,
	) -> Result<(), AuthError> {
		self.codes
			.issue_external_code(
				recipient_id,
				&hash_code(code),
				None,
				self.config.external_code_max_attempts,
			)
			.await?;
		Ok(())
	}

	/// Start a passkey flow: issue a provider challenge and store the
	/// reference, invalidating any previous one.
	///
	/// Returns the serialized client options to forward to the platform
	/// authenticator.
	#[tracing::instrument(skip(self, ctx), fields(recipient_id = %ctx.recipient.id))]
	pub async fn issue_passkey_challenge(
		&self,
		ctx: &ChallengeContext,
	) -> Result<String, AuthError> {
		let (challenge_ref, options) = self
			.provider_call(self.passkeys.issue_challenge(&ctx.recipient.email))
			.await?;
		self.codes
			.set_passkey_challenge(&ctx.recipient.id, &challenge_ref)
			.await?;
		Ok(options)
	}

	fn verify_session(
		&self,
		ctx: &ChallengeContext,
		email: &str,
	) -> Result<ActionAuthProof, AuthError> {
		if !ctx.direct_link && !email.eq_ignore_ascii_case(&ctx.recipient.email) {
			return Err(AuthFailure::EmailMismatch.into());
		}
		Ok(ActionAuthProof::passed(AuthMethod::Account, ctx.recipient.id))
	}

	async fn verify_owner_password(
		&self,
		ctx: &ChallengeContext,
		submitted: &str,
	) -> Result<ActionAuthProof, AuthError> {
		let hash = self
			.provider_call(self.directory.password_hash(&ctx.owner_account))
			.await?;
		// A missing hash reads as a mismatch so callers cannot probe whether
		// the owner account has a password set.
		let hash = hash.ok_or(AuthFailure::PasswordMismatch)?;
		verify_password(&hash, submitted)?;
		Ok(ActionAuthProof::passed(AuthMethod::Password, ctx.recipient.id))
	}

	async fn verify_passkey(
		&self,
		ctx: &ChallengeContext,
		response: &str,
	) -> Result<ActionAuthProof, AuthError> {
		let challenge_ref = self
			.codes
			.take_passkey_challenge(&ctx.recipient.id)
			.await?
			.ok_or(AuthFailure::ChallengeNotIssued)?;
		let assertion = match self
			.with_timeout(self.passkeys.verify_response(&challenge_ref, response))
			.await?
		{
			Ok(assertion) => assertion,
			Err(ProviderError::Rejected(reason)) => {
				tracing::warn!(recipient_id = %ctx.recipient.id, reason = %reason, "passkey rejected");
				return Err(AuthFailure::PasskeyRejected.into());
			}
			Err(ProviderError::Unavailable(_)) => {
				return Err(AuthFailure::ProviderUnavailable.into());
			}
		};
		let mut proof = ActionAuthProof::passed(AuthMethod::Passkey, ctx.recipient.id);
		proof.assertion = Some(assertion);
		Ok(proof)
	}

	async fn verify_totp(
		&self,
		ctx: &ChallengeContext,
		code: &str,
	) -> Result<ActionAuthProof, AuthError> {
		let account = self
			.provider_call(self.directory.account_for_email(&ctx.recipient.email))
			.await?
			.ok_or(AuthFailure::TwoFactorNotEnrolled)?;
		if !self.provider_call(self.totp.is_enrolled(&account)).await? {
			return Err(AuthFailure::TwoFactorNotEnrolled.into());
		}
		if !self
			.provider_call(self.totp.verify_code(&account, code))
			.await?
		{
			return Err(AuthFailure::CodeMismatch { remaining: 0 }.into());
		}
		Ok(ActionAuthProof::passed(
			AuthMethod::TwoFactorAuth,
			ctx.recipient.id,
		))
	}

	/// Run a collaborator call under the configured timeout, mapping faults
	/// to retryable failures.
	async fn provider_call<T>(
		&self,
		fut: impl std::future::Future<Output = Result<T, ProviderError>>,
	) -> Result<T, AuthError> {
		match self.with_timeout(fut).await? {
			Ok(v) => Ok(v),
			Err(ProviderError::Unavailable(reason)) => {
				tracing::warn!(reason = %reason, "provider unavailable");
				Err(AuthFailure::ProviderUnavailable.into())
			}
			Err(ProviderError::Rejected(reason)) => {
				tracing::warn!(reason = %reason, "provider rejected request");
				Err(AuthFailure::ProviderUnavailable.into())
			}
		}
	}

	async fn with_timeout<T>(
		&self,
		fut: impl std::future::Future<Output = T>,
	) -> Result<T, AuthError> {
		let timeout = Duration::from_secs(self.config.provider_timeout_secs);
		tokio::time::timeout(timeout, fut)
			.await
			.map_err(|_| AuthFailure::ProviderTimeout.into())
	}
}

fn verdict_to_outcome(
	verdict: CodeVerdict,
	method: AuthMethod,
	recipient_id: RecipientId,
) -> Result<ActionAuthProof, AuthError> {
	match verdict {
		CodeVerdict::Match => Ok(ActionAuthProof::passed(method, recipient_id)),
		CodeVerdict::Mismatch { remaining } => {
			Err(AuthFailure::CodeMismatch { remaining }.into())
		}
		CodeVerdict::Expired => Err(AuthFailure::Expired.into()),
		CodeVerdict::AttemptLimitReached => Err(AuthFailure::AttemptLimitReached.into()),
		CodeVerdict::NotIssued => Err(AuthFailure::NotIssued.into()),
	}
}

/// Six-digit numeric one-time code.
fn generate_numeric_code() -> String {
	let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
	format!("{n:06}")
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::collections::BTreeSet;
	use std::sync::Mutex;

	use vellum_core::recipient::RecipientRole;
	use vellum_server_db::testing::{
		create_test_pool, insert_test_envelope, insert_test_recipient,
	};

	use crate::password::hash_password;

	struct MockDirectory {
		password_hash: Option<String>,
		account: Option<AccountId>,
	}

	#[async_trait]
	impl OwnerDirectory for MockDirectory {
		async fn password_hash(
			&self,
			_account: &AccountId,
		) -> Result<Option<String>, ProviderError> {
			Ok(self.password_hash.clone())
		}

		async fn account_for_email(
			&self,
			_email: &str,
		) -> Result<Option<AccountId>, ProviderError> {
			Ok(self.account)
		}
	}

	struct MockTotp {
		enrolled: bool,
		accepts: &'static str,
	}

	#[async_trait]
	impl TotpVerifier for MockTotp {
		async fn is_enrolled(&self, _account: &AccountId) -> Result<bool, ProviderError> {
			Ok(self.enrolled)
		}

		async fn verify_code(
			&self,
			_account: &AccountId,
			code: &str,
		) -> Result<bool, ProviderError> {
			Ok(code == self.accepts)
		}
	}

	struct MockPasskeys {
		accepts_response: &'static str,
	}

	#[async_trait]
	impl PasskeyVerifier for MockPasskeys {
		async fn issue_challenge(&self, _email: &str) -> Result<(String, String), ProviderError> {
			Ok(("challenge-ref-1".to_string(), "{\"options\":true}".to_string()))
		}

		async fn verify_response(
			&self,
			challenge_ref: &str,
			response: &str,
		) -> Result<String, ProviderError> {
			if challenge_ref == "challenge-ref-1" && response == self.accepts_response {
				Ok("assertion-ok".to_string())
			} else {
				Err(ProviderError::Rejected("bad assertion".to_string()))
			}
		}
	}

	/// Stalls forever; used to exercise the timeout path.
	struct StalledPasskeys;

	#[async_trait]
	impl PasskeyVerifier for StalledPasskeys {
		async fn issue_challenge(&self, _email: &str) -> Result<(String, String), ProviderError> {
			std::future::pending().await
		}

		async fn verify_response(
			&self,
			_challenge_ref: &str,
			_response: &str,
		) -> Result<String, ProviderError> {
			std::future::pending().await
		}
	}

	#[derive(Default)]
	struct RecordingMailer {
		sent: Mutex<Vec<(String, String)>>,
	}

	#[async_trait]
	impl CodeMailer for RecordingMailer {
		async fn send_code(&self, email: &str, code: &str) -> Result<(), ProviderError> {
			self.sent
				.lock()
				.unwrap()
				.push((email.to_string(), code.to_string()));
			Ok(())
		}
	}

	struct Fixture {
		executor: ChallengeExecutor,
		ctx: ChallengeContext,
		mailer: Arc<RecordingMailer>,
	}

	async fn fixture_with(
		directory: MockDirectory,
		totp: MockTotp,
		passkeys: Arc<dyn PasskeyVerifier>,
		config: AuthConfig,
	) -> Fixture {
		let pool = create_test_pool().await;
		let envelope_id = insert_test_envelope(&pool).await;
		let recipient_id = insert_test_recipient(&pool, envelope_id, "alice").await;

		let mut recipient = Recipient::new(
			envelope_id,
			"alice@example.com",
			"Alice",
			RecipientRole::Signer,
			"token-hash",
		);
		recipient.id = recipient_id;

		let mailer = Arc::new(RecordingMailer::default());
		let executor = ChallengeExecutor::new(
			TwoFactorRepository::new(pool),
			Arc::new(directory),
			Arc::new(totp),
			passkeys,
			mailer.clone(),
			config,
		);
		Fixture {
			executor,
			ctx: ChallengeContext {
				recipient,
				owner_account: AccountId::generate(),
				direct_link: false,
			},
			mailer,
		}
	}

	async fn fixture() -> Fixture {
		fixture_with(
			MockDirectory {
				password_hash: Some(hash_password("hunter2").unwrap()),
				account: Some(AccountId::generate()),
			},
			MockTotp {
				enrolled: true,
				accepts: "246810",
			},
			Arc::new(MockPasskeys {
				accepts_response: "good-response",
			}),
			AuthConfig::default(),
		)
		.await
	}

	#[tokio::test]
	async fn test_session_email_match_is_case_insensitive() {
		let f = fixture().await;
		let proof = SubmittedProof::Session {
			email: "Alice@Example.COM".to_string(),
		};
		let result = f.executor.execute(&f.ctx, AuthMethod::Account, &proof).await;
		assert_eq!(result.unwrap().method, AuthMethod::Account);
	}

	#[tokio::test]
	async fn test_session_email_mismatch() {
		let f = fixture().await;
		let proof = SubmittedProof::Session {
			email: "mallory@example.com".to_string(),
		};
		let err = f
			.executor
			.execute(&f.ctx, AuthMethod::Account, &proof)
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::Failure(AuthFailure::EmailMismatch)));
	}

	#[tokio::test]
	async fn test_direct_link_passes_account_gate_without_session() {
		let mut f = fixture().await;
		f.ctx.direct_link = true;
		let result = f
			.executor
			.execute(&f.ctx, AuthMethod::Account, &SubmittedProof::None)
			.await;
		assert_eq!(result.unwrap().method, AuthMethod::Account);
	}

	#[tokio::test]
	async fn test_missing_session_requires_sign_in() {
		let f = fixture().await;
		let err = f
			.executor
			.execute(&f.ctx, AuthMethod::Account, &SubmittedProof::None)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			AuthError::Failure(AuthFailure::SessionRequired)
		));
	}

	#[tokio::test]
	async fn test_owner_password() {
		let f = fixture().await;
		let ok = SubmittedProof::Password {
			password: "hunter2".to_string(),
		};
		assert!(f.executor.execute(&f.ctx, AuthMethod::Password, &ok).await.is_ok());

		let bad = SubmittedProof::Password {
			password: "hunter3".to_string(),
		};
		let err = f
			.executor
			.execute(&f.ctx, AuthMethod::Password, &bad)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			AuthError::Failure(AuthFailure::PasswordMismatch)
		));
	}

	#[tokio::test]
	async fn test_owner_without_password_reads_as_mismatch() {
		let f = fixture_with(
			MockDirectory {
				password_hash: None,
				account: None,
			},
			MockTotp {
				enrolled: false,
				accepts: "",
			},
			Arc::new(MockPasskeys {
				accepts_response: "good-response",
			}),
			AuthConfig::default(),
		)
		.await;
		let proof = SubmittedProof::Password {
			password: "anything".to_string(),
		};
		let err = f
			.executor
			.execute(&f.ctx, AuthMethod::Password, &proof)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			AuthError::Failure(AuthFailure::PasswordMismatch)
		));
	}

	#[tokio::test]
	async fn test_email_code_flow() {
		let f = fixture().await;
		f.executor.issue_email_code(&f.ctx).await.unwrap();

		let sent = f.mailer.sent.lock().unwrap().clone();
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].0, "alice@example.com");
		let code = sent[0].1.clone();
		assert_eq!(code.len(), 6);

		let proof = SubmittedProof::TwoFactorEmail { code };
		let result = f
			.executor
			.execute(&f.ctx, AuthMethod::TwoFactorAuth, &proof)
			.await;
		assert_eq!(result.unwrap().method, AuthMethod::TwoFactorAuth);
	}

	#[tokio::test]
	async fn test_email_code_without_issuance() {
		let f = fixture().await;
		let proof = SubmittedProof::TwoFactorEmail {
			code: "123456".to_string(),
		};
		let err = f
			.executor
			.execute(&f.ctx, AuthMethod::TwoFactorAuth, &proof)
			.await
			.unwrap_err();
		assert!(matches!(err, AuthError::Failure(AuthFailure::NotIssued)));
	}

	#[tokio::test]
	async fn test_external_code_attempt_limit_is_terminal() {
		// Exhaust the budget with wrong codes, then submit the correct one:
		// still refused until the sender issues a fresh code.
		let f = fixture().await;
		f.executor
			.set_external_code(&f.ctx.recipient.id, "482913")
			.await
			.unwrap();

		for _ in 0..3 {
			let wrong = SubmittedProof::ExternalCode {
				code: "999999".to_string(),
			};
			let err = f
				.executor
				.execute(&f.ctx, AuthMethod::ExternalTwoFactorAuth, &wrong)
				.await
				.unwrap_err();
			assert!(matches!(
				err,
				AuthError::Failure(AuthFailure::CodeMismatch { .. })
			));
		}

		let correct = SubmittedProof::ExternalCode {
			code: "482913".to_string(),
		};
		let err = f
			.executor
			.execute(&f.ctx, AuthMethod::ExternalTwoFactorAuth, &correct)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			AuthError::Failure(AuthFailure::AttemptLimitReached)
		));
	}

	#[tokio::test]
	async fn test_totp_requires_enrolment() {
		let f = fixture_with(
			MockDirectory {
				password_hash: None,
				account: Some(AccountId::generate()),
			},
			MockTotp {
				enrolled: false,
				accepts: "246810",
			},
			Arc::new(MockPasskeys {
				accepts_response: "good-response",
			}),
			AuthConfig::default(),
		)
		.await;
		let proof = SubmittedProof::TwoFactorApp {
			code: "246810".to_string(),
		};
		let err = f
			.executor
			.execute(&f.ctx, AuthMethod::TwoFactorAuth, &proof)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			AuthError::Failure(AuthFailure::TwoFactorNotEnrolled)
		));
	}

	#[tokio::test]
	async fn test_totp_verification() {
		let f = fixture().await;
		let proof = SubmittedProof::TwoFactorApp {
			code: "246810".to_string(),
		};
		assert!(f
			.executor
			.execute(&f.ctx, AuthMethod::TwoFactorAuth, &proof)
			.await
			.is_ok());
	}

	#[tokio::test]
	async fn test_passkey_challenge_is_consumed() {
		let f = fixture().await;
		f.executor.issue_passkey_challenge(&f.ctx).await.unwrap();

		let proof = SubmittedProof::Passkey {
			response: "good-response".to_string(),
		};
		let result = f
			.executor
			.execute(&f.ctx, AuthMethod::Passkey, &proof)
			.await
			.unwrap();
		assert_eq!(result.assertion.as_deref(), Some("assertion-ok"));

		// The challenge was consumed; a replay has nothing to verify against.
		let err = f
			.executor
			.execute(&f.ctx, AuthMethod::Passkey, &proof)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			AuthError::Failure(AuthFailure::ChallengeNotIssued)
		));
	}

	#[tokio::test]
	async fn test_passkey_rejection() {
		let f = fixture().await;
		f.executor.issue_passkey_challenge(&f.ctx).await.unwrap();

		let proof = SubmittedProof::Passkey {
			response: "tampered".to_string(),
		};
		let err = f
			.executor
			.execute(&f.ctx, AuthMethod::Passkey, &proof)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			AuthError::Failure(AuthFailure::PasskeyRejected)
		));
	}

	#[tokio::test]
	async fn test_stalled_provider_times_out() {
		// Fixture setup touches the database on a real clock; pause only
		// around the stalled provider call so the timeout fires instantly.
		let f = fixture_with(
			MockDirectory {
				password_hash: None,
				account: None,
			},
			MockTotp {
				enrolled: false,
				accepts: "",
			},
			Arc::new(StalledPasskeys),
			AuthConfig {
				provider_timeout_secs: 1,
				..AuthConfig::default()
			},
		)
		.await;
		tokio::time::pause();
		let err = f.executor.issue_passkey_challenge(&f.ctx).await.unwrap_err();
		assert!(matches!(
			err,
			AuthError::Failure(AuthFailure::ProviderTimeout)
		));
	}

	#[tokio::test]
	async fn test_satisfy_rejects_method_outside_gate() {
		let f = fixture().await;
		let allowed: BTreeSet<AuthMethod> =
			[AuthMethod::TwoFactorAuth].into_iter().collect();
		let proof = SubmittedProof::Password {
			password: "hunter2".to_string(),
		};
		let err = f.executor.satisfy(&f.ctx, &allowed, &proof).await.unwrap_err();
		assert!(matches!(
			err,
			AuthError::Failure(AuthFailure::UnsupportedProof)
		));
	}

	#[tokio::test]
	async fn test_satisfy_dispatches_to_matching_method() {
		let f = fixture().await;
		let allowed: BTreeSet<AuthMethod> = [AuthMethod::Account, AuthMethod::Password]
			.into_iter()
			.collect();
		let proof = SubmittedProof::Session {
			email: "alice@example.com".to_string(),
		};
		let result = f.executor.satisfy(&f.ctx, &allowed, &proof).await.unwrap();
		assert_eq!(result.method, AuthMethod::Account);
	}
}
