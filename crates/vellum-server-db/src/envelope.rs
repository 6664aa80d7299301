// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Envelope repository for database operations.
//!
//! Pool-based reads live on [`EnvelopeRepository`]; the mutations the
//! workflow engine performs inside a transaction are free functions over
//! `&mut SqliteConnection` ([`insert`], [`lock_row`], [`transition_status`]).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, SqliteConnection};
use std::collections::BTreeSet;

use vellum_core::auth_options::{AuthMethod, AuthOptions};
use vellum_core::envelope::{Envelope, EnvelopeStatus};
use vellum_core::types::EnvelopeId;

use crate::error::{DbError, Result};

#[async_trait]
pub trait EnvelopeStore: Send + Sync {
	async fn get_envelope(&self, id: &EnvelopeId) -> Result<Option<Envelope>>;
	async fn create_envelope(&self, envelope: &Envelope) -> Result<()>;
	async fn soft_delete_envelope(&self, id: &EnvelopeId) -> Result<()>;
}

/// Repository for envelope database operations.
///
/// Envelopes are soft-deleted only: audit history keeps referencing them.
#[derive(Clone)]
pub struct EnvelopeRepository {
	pool: SqlitePool,
}

impl EnvelopeRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Fetch an envelope by id, excluding soft-deleted rows.
	#[tracing::instrument(skip(self))]
	pub async fn get_envelope(&self, id: &EnvelopeId) -> Result<Option<Envelope>> {
		let row = sqlx::query(
			r#"
			SELECT id, owner_id, kind, status, title, external_id, version,
			       global_access_auth, global_action_auth, signing_order_policy,
			       content_items, completed_at, created_at, updated_at, deleted_at
			FROM envelopes WHERE id = ? AND deleted_at IS NULL
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(row_to_envelope).transpose()
	}

	/// Insert a new envelope.
	#[tracing::instrument(skip(self, envelope), fields(envelope_id = %envelope.id))]
	pub async fn create_envelope(&self, envelope: &Envelope) -> Result<()> {
		let mut conn = self.pool.acquire().await?;
		insert(&mut conn, envelope).await
	}

	/// Soft-delete an envelope. Audit history keeps referencing the row.
	#[tracing::instrument(skip(self))]
	pub async fn soft_delete_envelope(&self, id: &EnvelopeId) -> Result<()> {
		let result = sqlx::query(
			"UPDATE envelopes SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
		)
		.bind(Utc::now().to_rfc3339())
		.bind(Utc::now().to_rfc3339())
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("envelope {id}")));
		}
		tracing::debug!(envelope_id = %id, "envelope soft-deleted");
		Ok(())
	}
}

#[async_trait]
impl EnvelopeStore for EnvelopeRepository {
	async fn get_envelope(&self, id: &EnvelopeId) -> Result<Option<Envelope>> {
		self.get_envelope(id).await
	}

	async fn create_envelope(&self, envelope: &Envelope) -> Result<()> {
		self.create_envelope(envelope).await
	}

	async fn soft_delete_envelope(&self, id: &EnvelopeId) -> Result<()> {
		self.soft_delete_envelope(id).await
	}
}

/// Insert an envelope on an existing connection/transaction.
pub async fn insert(conn: &mut SqliteConnection, envelope: &Envelope) -> Result<()> {
	sqlx::query(
		r#"
		INSERT INTO envelopes (
			id, owner_id, kind, status, title, external_id, version,
			global_access_auth, global_action_auth, signing_order_policy,
			content_items, completed_at, created_at, updated_at, deleted_at
		)
		VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(envelope.id.to_string())
	.bind(envelope.owner_id.to_string())
	.bind(envelope.kind.to_string())
	.bind(envelope.status.to_string())
	.bind(&envelope.title)
	.bind(envelope.external_id.as_deref())
	.bind(envelope.version)
	.bind(methods_to_json(&envelope.global_auth.access)?)
	.bind(methods_to_json(&envelope.global_auth.action)?)
	.bind(envelope.signing_order.to_string())
	.bind(envelope.content_items)
	.bind(envelope.completed_at.map(|t| t.to_rfc3339()))
	.bind(envelope.created_at.to_rfc3339())
	.bind(envelope.updated_at.to_rfc3339())
	.bind(envelope.deleted_at.map(|t| t.to_rfc3339()))
	.execute(&mut *conn)
	.await?;
	Ok(())
}

/// Acquire the write lock for an envelope's workflow transaction.
///
/// Issuing this UPDATE as the first statement of a transaction serializes
/// concurrent workflow operations on the same envelope: SQLite grants one
/// writer at a time and the loser waits on the busy timeout.
///
/// Returns the locked envelope, or `NotFound` if absent/soft-deleted.
pub async fn lock_row(conn: &mut SqliteConnection, id: &EnvelopeId) -> Result<Envelope> {
	let result = sqlx::query(
		"UPDATE envelopes SET updated_at = ? WHERE id = ? AND deleted_at IS NULL",
	)
	.bind(Utc::now().to_rfc3339())
	.bind(id.to_string())
	.execute(&mut *conn)
	.await?;

	if result.rows_affected() == 0 {
		return Err(DbError::NotFound(format!("envelope {id}")));
	}

	let row = sqlx::query(
		r#"
		SELECT id, owner_id, kind, status, title, external_id, version,
		       global_access_auth, global_action_auth, signing_order_policy,
		       content_items, completed_at, created_at, updated_at, deleted_at
		FROM envelopes WHERE id = ?
		"#,
	)
	.bind(id.to_string())
	.fetch_one(&mut *conn)
	.await?;

	row_to_envelope(row)
}

/// Guarded status transition: applies `from -> to` only when the stored
/// status still equals `from`. Returns whether a row changed, letting the
/// caller distinguish a won race from a lost one.
pub async fn transition_status(
	conn: &mut SqliteConnection,
	id: &EnvelopeId,
	from: EnvelopeStatus,
	to: EnvelopeStatus,
) -> Result<bool> {
	let completed_at = match to {
		EnvelopeStatus::Completed => Some(Utc::now().to_rfc3339()),
		_ => None,
	};
	let result = sqlx::query(
		r#"
		UPDATE envelopes
		SET status = ?, completed_at = COALESCE(?, completed_at), updated_at = ?
		WHERE id = ? AND status = ? AND deleted_at IS NULL
		"#,
	)
	.bind(to.to_string())
	.bind(completed_at)
	.bind(Utc::now().to_rfc3339())
	.bind(id.to_string())
	.bind(from.to_string())
	.execute(&mut *conn)
	.await?;

	Ok(result.rows_affected() == 1)
}

pub(crate) fn methods_to_json(methods: &BTreeSet<AuthMethod>) -> Result<String> {
	Ok(serde_json::to_string(methods)?)
}

pub(crate) fn methods_from_json(json: &str) -> Result<BTreeSet<AuthMethod>> {
	Ok(serde_json::from_str(json)?)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid timestamp '{value}': {e}")))
}

pub(crate) fn parse_column<T: std::str::FromStr>(value: &str, what: &str) -> Result<T>
where
	T::Err: std::fmt::Display,
{
	value
		.parse()
		.map_err(|e| DbError::Internal(format!("invalid {what} '{value}': {e}")))
}

fn row_to_envelope(row: SqliteRow) -> Result<Envelope> {
	let id: String = row.get("id");
	let owner_id: String = row.get("owner_id");
	let kind: String = row.get("kind");
	let status: String = row.get("status");
	let access: String = row.get("global_access_auth");
	let action: String = row.get("global_action_auth");
	let policy: String = row.get("signing_order_policy");
	let completed_at: Option<String> = row.get("completed_at");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");
	let deleted_at: Option<String> = row.get("deleted_at");

	Ok(Envelope {
		id: parse_column(&id, "envelope id")?,
		owner_id: parse_column(&owner_id, "owner id")?,
		kind: parse_column(&kind, "envelope kind")?,
		status: parse_column(&status, "envelope status")?,
		title: row.get("title"),
		external_id: row.get("external_id"),
		version: row.get("version"),
		global_auth: AuthOptions {
			access: methods_from_json(&access)?,
			action: methods_from_json(&action)?,
		},
		signing_order: parse_column(&policy, "signing order policy")?,
		content_items: row.get("content_items"),
		completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
		created_at: parse_timestamp(&created_at)?,
		updated_at: parse_timestamp(&updated_at)?,
		deleted_at: deleted_at.as_deref().map(parse_timestamp).transpose()?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;
	use vellum_core::envelope::{EnvelopeKind, SigningOrderPolicy};
	use vellum_core::types::AccountId;

	fn sample_envelope() -> Envelope {
		let mut envelope = Envelope::new_draft(
			AccountId::generate(),
			EnvelopeKind::Document,
			"NDA",
		);
		envelope.global_auth = AuthOptions::new(
			[AuthMethod::Account],
			[AuthMethod::TwoFactorAuth, AuthMethod::Password],
		);
		envelope.signing_order = SigningOrderPolicy::Sequential;
		envelope.content_items = 1;
		envelope
	}

	#[tokio::test]
	async fn test_create_and_get_roundtrip() {
		let pool = create_test_pool().await;
		let repo = EnvelopeRepository::new(pool);
		let envelope = sample_envelope();

		repo.create_envelope(&envelope).await.unwrap();
		let loaded = repo.get_envelope(&envelope.id).await.unwrap().unwrap();

		assert_eq!(loaded.status, EnvelopeStatus::Draft);
		assert_eq!(loaded.title, "NDA");
		assert_eq!(loaded.global_auth, envelope.global_auth);
		assert_eq!(loaded.signing_order, SigningOrderPolicy::Sequential);
	}

	#[tokio::test]
	async fn test_get_missing_returns_none() {
		let pool = create_test_pool().await;
		let repo = EnvelopeRepository::new(pool);
		assert!(repo
			.get_envelope(&EnvelopeId::generate())
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn test_soft_delete_hides_envelope() {
		let pool = create_test_pool().await;
		let repo = EnvelopeRepository::new(pool);
		let envelope = sample_envelope();
		repo.create_envelope(&envelope).await.unwrap();

		repo.soft_delete_envelope(&envelope.id).await.unwrap();
		assert!(repo.get_envelope(&envelope.id).await.unwrap().is_none());

		// Double delete reports NotFound.
		assert!(matches!(
			repo.soft_delete_envelope(&envelope.id).await,
			Err(DbError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn test_guarded_transition_applies_once() {
		let pool = create_test_pool().await;
		let repo = EnvelopeRepository::new(pool.clone());
		let envelope = sample_envelope();
		repo.create_envelope(&envelope).await.unwrap();

		let mut conn = pool.acquire().await.unwrap();
		assert!(transition_status(
			&mut conn,
			&envelope.id,
			EnvelopeStatus::Draft,
			EnvelopeStatus::Pending,
		)
		.await
		.unwrap());

		// Second identical transition loses the guard.
		assert!(!transition_status(
			&mut conn,
			&envelope.id,
			EnvelopeStatus::Draft,
			EnvelopeStatus::Pending,
		)
		.await
		.unwrap());
		drop(conn);

		let loaded = repo.get_envelope(&envelope.id).await.unwrap().unwrap();
		assert_eq!(loaded.status, EnvelopeStatus::Pending);
	}

	#[tokio::test]
	async fn test_completion_sets_completed_at() {
		let pool = create_test_pool().await;
		let repo = EnvelopeRepository::new(pool.clone());
		let envelope = sample_envelope();
		repo.create_envelope(&envelope).await.unwrap();

		let mut conn = pool.acquire().await.unwrap();
		transition_status(
			&mut conn,
			&envelope.id,
			EnvelopeStatus::Draft,
			EnvelopeStatus::Pending,
		)
		.await
		.unwrap();
		transition_status(
			&mut conn,
			&envelope.id,
			EnvelopeStatus::Pending,
			EnvelopeStatus::Completed,
		)
		.await
		.unwrap();
		drop(conn);

		let loaded = repo.get_envelope(&envelope.id).await.unwrap().unwrap();
		assert_eq!(loaded.status, EnvelopeStatus::Completed);
		assert!(loaded.completed_at.is_some());
	}
}
