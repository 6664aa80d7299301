// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit log persistence.
//!
//! Entries are append-only: [`append`] runs on the same connection as the
//! workflow transaction it records, and no update or delete statement exists
//! for the `audit_logs` table.

use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, SqliteConnection};

use vellum_core::types::EnvelopeId;
use vellum_server_audit::{Actor, AuditLogEntry};

use crate::envelope::{parse_column, parse_timestamp};
use crate::error::{DbError, Result};

/// Append one entry on an existing connection/transaction.
pub async fn append(conn: &mut SqliteConnection, entry: &AuditLogEntry) -> Result<()> {
	sqlx::query(
		r#"
		INSERT INTO audit_logs (
			id, envelope_id, timestamp, event_type, severity, actor,
			resource_type, resource_id, action, details
		)
		VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(entry.id.to_string())
	.bind(entry.envelope_id.to_string())
	.bind(entry.timestamp.to_rfc3339())
	.bind(entry.event_type.to_string())
	.bind(entry.severity.to_string())
	.bind(serde_json::to_string(&entry.actor)?)
	.bind(entry.resource_type.as_deref())
	.bind(entry.resource_id.as_deref())
	.bind(&entry.action)
	.bind(serde_json::to_string(&entry.details)?)
	.execute(&mut *conn)
	.await?;
	Ok(())
}

/// Repository for reading the audit trail.
#[derive(Clone)]
pub struct AuditRepository {
	pool: SqlitePool,
}

impl AuditRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Query an envelope's audit trail, oldest first.
	#[tracing::instrument(skip(self))]
	pub async fn query_logs(
		&self,
		envelope_id: &EnvelopeId,
		event_type: Option<&str>,
		limit: Option<i64>,
		offset: Option<i64>,
	) -> Result<(Vec<AuditLogEntry>, i64)> {
		let limit = limit.unwrap_or(100).min(1000);
		let offset = offset.unwrap_or(0);

		let mut conditions = vec!["envelope_id = ?".to_string()];
		if event_type.is_some() {
			conditions.push("event_type = ?".to_string());
		}
		let where_clause = conditions.join(" AND ");

		let count_sql = format!("SELECT COUNT(*) as cnt FROM audit_logs WHERE {where_clause}");
		let mut count_query = sqlx::query(&count_sql).bind(envelope_id.to_string());
		if let Some(v) = event_type {
			count_query = count_query.bind(v);
		}
		let count_row = count_query.fetch_one(&self.pool).await?;
		let total: i64 = count_row.get("cnt");

		let data_sql = format!(
			"SELECT id, envelope_id, timestamp, event_type, severity, actor, \
			 resource_type, resource_id, action, details \
			 FROM audit_logs WHERE {where_clause} ORDER BY timestamp, id LIMIT ? OFFSET ?"
		);
		let mut data_query = sqlx::query(&data_sql).bind(envelope_id.to_string());
		if let Some(v) = event_type {
			data_query = data_query.bind(v);
		}
		data_query = data_query.bind(limit).bind(offset);

		let rows = data_query.fetch_all(&self.pool).await?;
		let logs = rows
			.into_iter()
			.map(row_to_entry)
			.collect::<Result<Vec<_>>>()?;

		Ok((logs, total))
	}
}

fn row_to_entry(row: SqliteRow) -> Result<AuditLogEntry> {
	let id: String = row.get("id");
	let envelope_id: String = row.get("envelope_id");
	let timestamp: String = row.get("timestamp");
	let event_type: String = row.get("event_type");
	let severity: String = row.get("severity");
	let actor: String = row.get("actor");
	let details: Option<String> = row.get("details");

	let actor: Actor = serde_json::from_str(&actor)?;
	let severity = match severity.as_str() {
		"debug" => vellum_server_audit::AuditSeverity::Debug,
		"info" => vellum_server_audit::AuditSeverity::Info,
		"notice" => vellum_server_audit::AuditSeverity::Notice,
		"warning" => vellum_server_audit::AuditSeverity::Warning,
		"error" => vellum_server_audit::AuditSeverity::Error,
		"critical" => vellum_server_audit::AuditSeverity::Critical,
		other => return Err(DbError::Internal(format!("invalid severity '{other}'"))),
	};

	Ok(AuditLogEntry {
		id: uuid::Uuid::parse_str(&id)
			.map_err(|e| DbError::Internal(format!("invalid audit id '{id}': {e}")))?,
		timestamp: parse_timestamp(&timestamp)?,
		event_type: parse_column(&event_type, "audit event type")?,
		severity,
		envelope_id: parse_column(&envelope_id, "envelope id")?,
		actor,
		resource_type: row.get("resource_type"),
		resource_id: row.get("resource_id"),
		action: row.get("action"),
		details: details
			.map(|d| serde_json::from_str(&d))
			.transpose()?
			.unwrap_or(serde_json::Value::Null),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;
	use vellum_server_audit::AuditEventType;

	#[tokio::test]
	async fn test_append_and_query_roundtrip() {
		let pool = create_test_pool().await;
		let repo = AuditRepository::new(pool.clone());
		let envelope_id = EnvelopeId::generate();

		let mut conn = pool.acquire().await.unwrap();
		let entry = AuditLogEntry::builder(AuditEventType::EnvelopeSent, envelope_id)
			.actor(Actor::Recipient("a@example.com".into()))
			.diff("status", "draft", "pending")
			.build();
		append(&mut conn, &entry).await.unwrap();
		drop(conn);

		let (logs, total) = repo.query_logs(&envelope_id, None, None, None).await.unwrap();
		assert_eq!(total, 1);
		assert_eq!(logs[0].event_type, AuditEventType::EnvelopeSent);
		assert_eq!(logs[0].actor, Actor::Recipient("a@example.com".into()));
		assert_eq!(logs[0].details, entry.details);
	}

	#[tokio::test]
	async fn test_query_filters_by_event_type() {
		let pool = create_test_pool().await;
		let repo = AuditRepository::new(pool.clone());
		let envelope_id = EnvelopeId::generate();

		let mut conn = pool.acquire().await.unwrap();
		for event in [
			AuditEventType::EnvelopeSent,
			AuditEventType::RecipientSent,
			AuditEventType::RecipientSent,
		] {
			let entry = AuditLogEntry::builder(event, envelope_id).build();
			append(&mut conn, &entry).await.unwrap();
		}
		drop(conn);

		let (logs, total) = repo
			.query_logs(&envelope_id, Some("recipient_sent"), None, None)
			.await
			.unwrap();
		assert_eq!(total, 2);
		assert!(logs
			.iter()
			.all(|l| l.event_type == AuditEventType::RecipientSent));
	}

	#[tokio::test]
	async fn test_query_scoped_to_envelope() {
		let pool = create_test_pool().await;
		let repo = AuditRepository::new(pool.clone());
		let a = EnvelopeId::generate();
		let b = EnvelopeId::generate();

		let mut conn = pool.acquire().await.unwrap();
		append(
			&mut conn,
			&AuditLogEntry::builder(AuditEventType::EnvelopeCreated, a).build(),
		)
		.await
		.unwrap();
		drop(conn);

		let (_, total) = repo.query_logs(&b, None, None, None).await.unwrap();
		assert_eq!(total, 0);
	}
}
