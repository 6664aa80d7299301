// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Recipient repository for database operations.
//!
//! Access tokens are stored as SHA-256 hashes, never in plaintext; lookups
//! go through [`RecipientRepository::get_by_token_hash`].

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, SqliteConnection};

use vellum_core::auth_options::AuthOptions;
use vellum_core::recipient::{Recipient, SigningStatus};
use vellum_core::types::{EnvelopeId, RecipientId};

use crate::envelope::{methods_from_json, methods_to_json, parse_column, parse_timestamp};
use crate::error::{DbError, Result};

#[async_trait]
pub trait RecipientStore: Send + Sync {
	async fn get_recipient(&self, id: &RecipientId) -> Result<Option<Recipient>>;
	async fn get_by_token_hash(&self, token_hash: &str) -> Result<Option<Recipient>>;
	async fn list_for_envelope(&self, envelope_id: &EnvelopeId) -> Result<Vec<Recipient>>;
	async fn create_recipient(&self, recipient: &Recipient) -> Result<()>;
	async fn delete_recipient(&self, id: &RecipientId) -> Result<bool>;
}

/// Repository for recipient database operations.
#[derive(Clone)]
pub struct RecipientRepository {
	pool: SqlitePool,
}

impl RecipientRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_recipient(&self, id: &RecipientId) -> Result<Option<Recipient>> {
		let row = sqlx::query(&select_sql("id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;
		row.map(row_to_recipient).transpose()
	}

	/// Resolve a recipient from the hash of their access token.
	#[tracing::instrument(skip(self, token_hash))]
	pub async fn get_by_token_hash(&self, token_hash: &str) -> Result<Option<Recipient>> {
		let row = sqlx::query(&select_sql("token_hash = ?"))
			.bind(token_hash)
			.fetch_optional(&self.pool)
			.await?;
		row.map(row_to_recipient).transpose()
	}

	/// All recipients of an envelope, in insertion order.
	#[tracing::instrument(skip(self))]
	pub async fn list_for_envelope(&self, envelope_id: &EnvelopeId) -> Result<Vec<Recipient>> {
		let rows = sqlx::query(&select_sql("envelope_id = ? ORDER BY created_at, id"))
			.bind(envelope_id.to_string())
			.fetch_all(&self.pool)
			.await?;
		rows.into_iter().map(row_to_recipient).collect()
	}

	#[tracing::instrument(skip(self, recipient), fields(recipient_id = %recipient.id))]
	pub async fn create_recipient(&self, recipient: &Recipient) -> Result<()> {
		let mut conn = self.pool.acquire().await?;
		insert(&mut conn, recipient).await
	}

	/// Delete a recipient; permitted only while they have not interacted.
	///
	/// Returns whether a row was removed. Signed recipients are immutable.
	#[tracing::instrument(skip(self))]
	pub async fn delete_recipient(&self, id: &RecipientId) -> Result<bool> {
		let result = sqlx::query(
			"DELETE FROM recipients WHERE id = ? AND signing_status = 'not_signed' AND send_status = 'not_sent'",
		)
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;
		Ok(result.rows_affected() == 1)
	}
}

#[async_trait]
impl RecipientStore for RecipientRepository {
	async fn get_recipient(&self, id: &RecipientId) -> Result<Option<Recipient>> {
		self.get_recipient(id).await
	}

	async fn get_by_token_hash(&self, token_hash: &str) -> Result<Option<Recipient>> {
		self.get_by_token_hash(token_hash).await
	}

	async fn list_for_envelope(&self, envelope_id: &EnvelopeId) -> Result<Vec<Recipient>> {
		self.list_for_envelope(envelope_id).await
	}

	async fn create_recipient(&self, recipient: &Recipient) -> Result<()> {
		self.create_recipient(recipient).await
	}

	async fn delete_recipient(&self, id: &RecipientId) -> Result<bool> {
		self.delete_recipient(id).await
	}
}

fn select_sql(predicate: &str) -> String {
	format!(
		"SELECT id, envelope_id, email, name, role, access_auth, action_auth, \
		 signing_order, send_status, signing_status, token_hash, rejection_reason, \
		 signed_at, created_at, updated_at FROM recipients WHERE {predicate}"
	)
}

/// Insert a recipient on an existing connection/transaction.
pub async fn insert(conn: &mut SqliteConnection, recipient: &Recipient) -> Result<()> {
	sqlx::query(
		r#"
		INSERT INTO recipients (
			id, envelope_id, email, name, role, access_auth, action_auth,
			signing_order, send_status, signing_status, token_hash,
			rejection_reason, signed_at, created_at, updated_at
		)
		VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(recipient.id.to_string())
	.bind(recipient.envelope_id.to_string())
	.bind(&recipient.email)
	.bind(&recipient.name)
	.bind(recipient.role.to_string())
	.bind(methods_to_json(&recipient.auth_overrides.access)?)
	.bind(methods_to_json(&recipient.auth_overrides.action)?)
	.bind(recipient.signing_order)
	.bind(recipient.send_status.to_string())
	.bind(recipient.signing_status.to_string())
	.bind(&recipient.token_hash)
	.bind(recipient.rejection_reason.as_deref())
	.bind(recipient.signed_at.map(|t| t.to_rfc3339()))
	.bind(recipient.created_at.to_rfc3339())
	.bind(recipient.updated_at.to_rfc3339())
	.execute(&mut *conn)
	.await?;
	Ok(())
}

/// All recipients of an envelope, on an existing connection/transaction.
pub async fn list_for_envelope(
	conn: &mut SqliteConnection,
	envelope_id: &EnvelopeId,
) -> Result<Vec<Recipient>> {
	let rows = sqlx::query(&select_sql("envelope_id = ? ORDER BY created_at, id"))
		.bind(envelope_id.to_string())
		.fetch_all(&mut *conn)
		.await?;
	rows.into_iter().map(row_to_recipient).collect()
}

/// Guarded send marker: flips `not_sent -> sent` and reports whether this
/// call did the flip. Callers gate notification side effects on the result,
/// which makes resends idempotent.
pub async fn mark_sent(conn: &mut SqliteConnection, id: &RecipientId) -> Result<bool> {
	let result = sqlx::query(
		"UPDATE recipients SET send_status = 'sent', updated_at = ? WHERE id = ? AND send_status = 'not_sent'",
	)
	.bind(Utc::now().to_rfc3339())
	.bind(id.to_string())
	.execute(&mut *conn)
	.await?;
	Ok(result.rows_affected() == 1)
}

/// Guarded completion marker: flips `not_signed -> signed`.
///
/// Returns `false` when the recipient had already signed (or rejected), so
/// the caller can surface a conflict instead of double-applying.
pub async fn mark_signed(conn: &mut SqliteConnection, id: &RecipientId) -> Result<bool> {
	let now = Utc::now().to_rfc3339();
	let result = sqlx::query(
		r#"
		UPDATE recipients SET signing_status = 'signed', signed_at = ?, updated_at = ?
		WHERE id = ? AND signing_status = 'not_signed'
		"#,
	)
	.bind(&now)
	.bind(&now)
	.bind(id.to_string())
	.execute(&mut *conn)
	.await?;
	Ok(result.rows_affected() == 1)
}

/// Guarded rejection marker: flips `not_signed -> rejected` with a reason.
pub async fn mark_rejected(
	conn: &mut SqliteConnection,
	id: &RecipientId,
	reason: &str,
) -> Result<bool> {
	let result = sqlx::query(
		r#"
		UPDATE recipients SET signing_status = 'rejected', rejection_reason = ?, updated_at = ?
		WHERE id = ? AND signing_status = 'not_signed'
		"#,
	)
	.bind(reason)
	.bind(Utc::now().to_rfc3339())
	.bind(id.to_string())
	.execute(&mut *conn)
	.await?;
	Ok(result.rows_affected() == 1)
}

fn row_to_recipient(row: SqliteRow) -> Result<Recipient> {
	let id: String = row.get("id");
	let envelope_id: String = row.get("envelope_id");
	let role: String = row.get("role");
	let access: String = row.get("access_auth");
	let action: String = row.get("action_auth");
	let send_status: String = row.get("send_status");
	let signing_status: String = row.get("signing_status");
	let signed_at: Option<String> = row.get("signed_at");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(Recipient {
		id: parse_column(&id, "recipient id")?,
		envelope_id: parse_column(&envelope_id, "envelope id")?,
		email: row.get("email"),
		name: row.get("name"),
		role: parse_column(&role, "recipient role")?,
		auth_overrides: AuthOptions {
			access: methods_from_json(&access)?,
			action: methods_from_json(&action)?,
		},
		signing_order: row.get("signing_order"),
		send_status: parse_column(&send_status, "send status")?,
		signing_status: parse_column(&signing_status, "signing status")?,
		token_hash: row.get("token_hash"),
		rejection_reason: row.get("rejection_reason"),
		signed_at: signed_at.as_deref().map(parse_timestamp).transpose()?,
		created_at: parse_timestamp(&created_at)?,
		updated_at: parse_timestamp(&updated_at)?,
	})
}
