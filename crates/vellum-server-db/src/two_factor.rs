// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One-time code storage for the email and external two-factor flows.
//!
//! Codes are stored as SHA-256 hashes with a bounded attempt counter. The
//! counter increment is a guarded UPDATE (`attempts < max_attempts`), so two
//! racing verifications cannot both slip under the limit. Issuing a new code
//! replaces the row, which invalidates the previous code and resets the
//! counter.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use vellum_core::types::RecipientId;

use crate::error::Result;

/// SHA-256 hex digest of a verification code. Codes are never stored in
/// plaintext.
pub fn hash_code(code: &str) -> String {
	hex::encode(Sha256::digest(code.as_bytes()))
}

/// A stored one-time code with its attempt budget.
#[derive(Debug, Clone)]
pub struct ChallengeCode {
	pub recipient_id: RecipientId,
	pub code_hash: String,
	pub expires_at: Option<DateTime<Utc>>,
	pub attempts: i64,
	pub max_attempts: i64,
	pub issued_at: DateTime<Utc>,
}

/// Outcome of one verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeVerdict {
	/// Code matched; the stored code has been consumed.
	Match,
	/// Code did not match; `remaining` attempts left before lock-out.
	Mismatch { remaining: i64 },
	/// The code's expiry window has passed.
	Expired,
	/// The attempt budget is exhausted; a new code must be issued.
	AttemptLimitReached,
	/// No code has been issued for this recipient.
	NotIssued,
}

/// Which code table a flow operates on.
#[derive(Debug, Clone, Copy)]
enum CodeKind {
	Email,
	External,
}

impl CodeKind {
	fn table(self) -> &'static str {
		match self {
			CodeKind::Email => "email_codes",
			CodeKind::External => "external_codes",
		}
	}
}

/// Repository for one-time code issuance and verification.
#[derive(Clone)]
pub struct TwoFactorRepository {
	pool: SqlitePool,
}

impl TwoFactorRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Issue (or re-issue) an email one-time code for a recipient.
	#[tracing::instrument(skip(self, code_hash))]
	pub async fn issue_email_code(
		&self,
		recipient_id: &RecipientId,
		code_hash: &str,
		expires_at: DateTime<Utc>,
		max_attempts: i64,
	) -> Result<()> {
		self.issue(CodeKind::Email, recipient_id, code_hash, Some(expires_at), max_attempts)
			.await
	}

	/// Record a code the sender issued out-of-band to the recipient.
	#[tracing::instrument(skip(self, code_hash))]
	pub async fn issue_external_code(
		&self,
		recipient_id: &RecipientId,
		code_hash: &str,
		expires_at: Option<DateTime<Utc>>,
		max_attempts: i64,
	) -> Result<()> {
		self.issue(CodeKind::External, recipient_id, code_hash, expires_at, max_attempts)
			.await
	}

	/// Verify a submitted email code. Consumes one attempt.
	#[tracing::instrument(skip(self, submitted))]
	pub async fn verify_email_code(
		&self,
		recipient_id: &RecipientId,
		submitted: &str,
	) -> Result<CodeVerdict> {
		self.verify(CodeKind::Email, recipient_id, submitted).await
	}

	/// Verify a submitted external code. Consumes one attempt.
	#[tracing::instrument(skip(self, submitted))]
	pub async fn verify_external_code(
		&self,
		recipient_id: &RecipientId,
		submitted: &str,
	) -> Result<CodeVerdict> {
		self.verify(CodeKind::External, recipient_id, submitted).await
	}

	/// Record the passkey challenge reference issued to a recipient,
	/// invalidating any previous one.
	#[tracing::instrument(skip(self, challenge_ref))]
	pub async fn set_passkey_challenge(
		&self,
		recipient_id: &RecipientId,
		challenge_ref: &str,
	) -> Result<()> {
		sqlx::query(
			"INSERT OR REPLACE INTO passkey_challenges (recipient_id, challenge_ref, issued_at) VALUES (?, ?, ?)",
		)
		.bind(recipient_id.to_string())
		.bind(challenge_ref)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	/// Consume the current passkey challenge reference, if any.
	///
	/// Single use: the row is deleted on read so an aborted or completed
	/// challenge cannot be replayed.
	#[tracing::instrument(skip(self))]
	pub async fn take_passkey_challenge(
		&self,
		recipient_id: &RecipientId,
	) -> Result<Option<String>> {
		let row = sqlx::query(
			"DELETE FROM passkey_challenges WHERE recipient_id = ? RETURNING challenge_ref",
		)
		.bind(recipient_id.to_string())
		.fetch_optional(&self.pool)
		.await?;
		Ok(row.map(|r| r.get("challenge_ref")))
	}

	async fn issue(
		&self,
		kind: CodeKind,
		recipient_id: &RecipientId,
		code_hash: &str,
		expires_at: Option<DateTime<Utc>>,
		max_attempts: i64,
	) -> Result<()> {
		let sql = format!(
			"INSERT OR REPLACE INTO {} (recipient_id, code_hash, expires_at, attempts, max_attempts, issued_at) \
			 VALUES (?, ?, ?, 0, ?, ?)",
			kind.table()
		);
		sqlx::query(&sql)
			.bind(recipient_id.to_string())
			.bind(code_hash)
			.bind(expires_at.map(|t| t.to_rfc3339()))
			.bind(max_attempts)
			.bind(Utc::now().to_rfc3339())
			.execute(&self.pool)
			.await?;
		tracing::debug!(recipient_id = %recipient_id, table = kind.table(), "code issued");
		Ok(())
	}

	async fn verify(
		&self,
		kind: CodeKind,
		recipient_id: &RecipientId,
		submitted: &str,
	) -> Result<CodeVerdict> {
		let exists_sql = format!(
			"SELECT COUNT(*) as cnt FROM {} WHERE recipient_id = ?",
			kind.table()
		);
		let cnt: i64 = sqlx::query(&exists_sql)
			.bind(recipient_id.to_string())
			.fetch_one(&self.pool)
			.await?
			.get("cnt");
		if cnt == 0 {
			return Ok(CodeVerdict::NotIssued);
		}

		// Atomic attempt debit. Zero rows affected means the budget is gone,
		// and the method stays unusable until a fresh code is issued.
		let debit_sql = format!(
			"UPDATE {} SET attempts = attempts + 1 WHERE recipient_id = ? AND attempts < max_attempts \
			 RETURNING code_hash, expires_at, attempts, max_attempts",
			kind.table()
		);
		let Some(row) = sqlx::query(&debit_sql)
			.bind(recipient_id.to_string())
			.fetch_optional(&self.pool)
			.await?
		else {
			return Ok(CodeVerdict::AttemptLimitReached);
		};

		let code_hash: String = row.get("code_hash");
		let expires_at: Option<String> = row.get("expires_at");
		let attempts: i64 = row.get("attempts");
		let max_attempts: i64 = row.get("max_attempts");

		if let Some(expires_at) = expires_at {
			let expires_at = crate::envelope::parse_timestamp(&expires_at)?;
			if Utc::now() > expires_at {
				return Ok(CodeVerdict::Expired);
			}
		}

		if code_hash == hash_code(submitted) {
			// Single use: consume the code on success.
			let delete_sql = format!("DELETE FROM {} WHERE recipient_id = ?", kind.table());
			sqlx::query(&delete_sql)
				.bind(recipient_id.to_string())
				.execute(&self.pool)
				.await?;
			Ok(CodeVerdict::Match)
		} else {
			Ok(CodeVerdict::Mismatch {
				remaining: max_attempts - attempts,
			})
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_test_pool, insert_test_envelope, insert_test_recipient};
	use chrono::Duration;

	async fn setup() -> (TwoFactorRepository, RecipientId) {
		let pool = create_test_pool().await;
		let envelope_id = insert_test_envelope(&pool).await;
		let recipient_id = insert_test_recipient(&pool, envelope_id, "tf").await;
		(TwoFactorRepository::new(pool), recipient_id)
	}

	#[tokio::test]
	async fn test_not_issued() {
		let (repo, recipient_id) = setup().await;
		assert_eq!(
			repo.verify_external_code(&recipient_id, "123456").await.unwrap(),
			CodeVerdict::NotIssued
		);
	}

	#[tokio::test]
	async fn test_match_consumes_code() {
		let (repo, recipient_id) = setup().await;
		repo.issue_email_code(
			&recipient_id,
			&hash_code("482913"),
			Utc::now() + Duration::minutes(10),
			3,
		)
		.await
		.unwrap();

		assert_eq!(
			repo.verify_email_code(&recipient_id, "482913").await.unwrap(),
			CodeVerdict::Match
		);
		// Consumed: a replay of the same code finds nothing.
		assert_eq!(
			repo.verify_email_code(&recipient_id, "482913").await.unwrap(),
			CodeVerdict::NotIssued
		);
	}

	#[tokio::test]
	async fn test_mismatch_reports_remaining() {
		let (repo, recipient_id) = setup().await;
		repo.issue_email_code(
			&recipient_id,
			&hash_code("482913"),
			Utc::now() + Duration::minutes(10),
			3,
		)
		.await
		.unwrap();

		assert_eq!(
			repo.verify_email_code(&recipient_id, "000000").await.unwrap(),
			CodeVerdict::Mismatch { remaining: 2 }
		);
		assert_eq!(
			repo.verify_email_code(&recipient_id, "000000").await.unwrap(),
			CodeVerdict::Mismatch { remaining: 1 }
		);
	}

	#[tokio::test]
	async fn test_attempt_limit_sticks_even_for_correct_code() {
		// Three wrong codes with limit 3: the fourth attempt is refused even
		// when the submitted code is correct.
		let (repo, recipient_id) = setup().await;
		repo.issue_external_code(&recipient_id, &hash_code("482913"), None, 3)
			.await
			.unwrap();

		for _ in 0..3 {
			let verdict = repo
				.verify_external_code(&recipient_id, "999999")
				.await
				.unwrap();
			assert!(matches!(verdict, CodeVerdict::Mismatch { .. }));
		}

		assert_eq!(
			repo.verify_external_code(&recipient_id, "482913").await.unwrap(),
			CodeVerdict::AttemptLimitReached
		);
	}

	#[tokio::test]
	async fn test_reissue_resets_attempts_and_invalidates_old_code() {
		let (repo, recipient_id) = setup().await;
		repo.issue_external_code(&recipient_id, &hash_code("111111"), None, 1)
			.await
			.unwrap();
		let _ = repo.verify_external_code(&recipient_id, "000000").await.unwrap();
		assert_eq!(
			repo.verify_external_code(&recipient_id, "111111").await.unwrap(),
			CodeVerdict::AttemptLimitReached
		);

		repo.issue_external_code(&recipient_id, &hash_code("222222"), None, 1)
			.await
			.unwrap();
		// Old code no longer works; the new one does.
		assert_eq!(
			repo.verify_external_code(&recipient_id, "222222").await.unwrap(),
			CodeVerdict::Match
		);
	}

	#[tokio::test]
	async fn test_expired_code() {
		let (repo, recipient_id) = setup().await;
		repo.issue_email_code(
			&recipient_id,
			&hash_code("482913"),
			Utc::now() - Duration::minutes(1),
			3,
		)
		.await
		.unwrap();

		assert_eq!(
			repo.verify_email_code(&recipient_id, "482913").await.unwrap(),
			CodeVerdict::Expired
		);
	}

	#[tokio::test]
	async fn test_passkey_challenge_is_single_use() {
		let (repo, recipient_id) = setup().await;
		repo.set_passkey_challenge(&recipient_id, "challenge-1").await.unwrap();
		// Reissue invalidates the previous challenge.
		repo.set_passkey_challenge(&recipient_id, "challenge-2").await.unwrap();

		assert_eq!(
			repo.take_passkey_challenge(&recipient_id).await.unwrap().as_deref(),
			Some("challenge-2")
		);
		assert_eq!(repo.take_passkey_challenge(&recipient_id).await.unwrap(), None);
	}
}
