// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stub collaborators for tests that need a working [`ChallengeExecutor`].

use std::sync::Arc;

use async_trait::async_trait;

use vellum_core::types::AccountId;
use vellum_server_config::AuthConfig;
use vellum_server_db::TwoFactorRepository;

use crate::challenge::ChallengeExecutor;
use crate::providers::{CodeMailer, OwnerDirectory, PasskeyVerifier, ProviderError, TotpVerifier};

/// Directory with no accounts and no passwords.
pub struct EmptyDirectory;

#[async_trait]
impl OwnerDirectory for EmptyDirectory {
	async fn password_hash(&self, _account: &AccountId) -> Result<Option<String>, ProviderError> {
		Ok(None)
	}

	async fn account_for_email(&self, _email: &str) -> Result<Option<AccountId>, ProviderError> {
		Ok(None)
	}
}

/// Verifier with nobody enrolled.
pub struct NoTotp;

#[async_trait]
impl TotpVerifier for NoTotp {
	async fn is_enrolled(&self, _account: &AccountId) -> Result<bool, ProviderError> {
		Ok(false)
	}

	async fn verify_code(&self, _account: &AccountId, _code: &str) -> Result<bool, ProviderError> {
		Ok(false)
	}
}

/// Verifier that rejects every assertion.
pub struct NoPasskeys;

#[async_trait]
impl PasskeyVerifier for NoPasskeys {
	async fn issue_challenge(&self, _email: &str) -> Result<(String, String), ProviderError> {
		Err(ProviderError::Unavailable("no passkey provider".to_string()))
	}

	async fn verify_response(
		&self,
		_challenge_ref: &str,
		_response: &str,
	) -> Result<String, ProviderError> {
		Err(ProviderError::Rejected("no passkey provider".to_string()))
	}
}

/// Mailer that drops every message.
pub struct NullMailer;

#[async_trait]
impl CodeMailer for NullMailer {
	async fn send_code(&self, _email: &str, _code: &str) -> Result<(), ProviderError> {
		Ok(())
	}
}

/// Executor wired to stub collaborators. Code flows (email/external) work
/// against the repository's pool; session and explicit-none gates work as
/// normal; the provider-backed methods fail closed.
pub fn stub_executor(codes: TwoFactorRepository) -> ChallengeExecutor {
	ChallengeExecutor::new(
		codes,
		Arc::new(EmptyDirectory),
		Arc::new(NoTotp),
		Arc::new(NoPasskeys),
		Arc::new(NullMailer),
		AuthConfig::default(),
	)
}
