// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema bootstrap: idempotent table creation.
//!
//! Timestamps are stored as RFC 3339 strings, IDs as UUID strings,
//! authentication method sets and field metadata as JSON text.

use sqlx::sqlite::SqlitePool;

use crate::error::Result;

/// Create all tables if they do not exist yet.
#[tracing::instrument(skip(pool))]
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
	let statements = [
		r#"
		CREATE TABLE IF NOT EXISTS envelopes (
			id TEXT PRIMARY KEY,
			owner_id TEXT NOT NULL,
			kind TEXT NOT NULL,
			status TEXT NOT NULL,
			title TEXT NOT NULL,
			external_id TEXT,
			version INTEGER NOT NULL DEFAULT 2,
			global_access_auth TEXT NOT NULL DEFAULT '[]',
			global_action_auth TEXT NOT NULL DEFAULT '[]',
			signing_order_policy TEXT NOT NULL DEFAULT 'parallel',
			content_items INTEGER NOT NULL DEFAULT 0,
			completed_at TEXT,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL,
			deleted_at TEXT
		)
		"#,
		r#"
		CREATE TABLE IF NOT EXISTS recipients (
			id TEXT PRIMARY KEY,
			envelope_id TEXT NOT NULL REFERENCES envelopes(id),
			email TEXT NOT NULL,
			name TEXT NOT NULL,
			role TEXT NOT NULL,
			access_auth TEXT NOT NULL DEFAULT '[]',
			action_auth TEXT NOT NULL DEFAULT '[]',
			signing_order INTEGER,
			send_status TEXT NOT NULL DEFAULT 'not_sent',
			signing_status TEXT NOT NULL DEFAULT 'not_signed',
			token_hash TEXT NOT NULL UNIQUE,
			rejection_reason TEXT,
			signed_at TEXT,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
		r#"
		CREATE TABLE IF NOT EXISTS fields (
			id TEXT PRIMARY KEY,
			envelope_id TEXT NOT NULL REFERENCES envelopes(id),
			recipient_id TEXT NOT NULL REFERENCES recipients(id),
			field_type TEXT NOT NULL,
			page INTEGER NOT NULL,
			x REAL NOT NULL,
			y REAL NOT NULL,
			width REAL NOT NULL,
			height REAL NOT NULL,
			meta TEXT NOT NULL DEFAULT '{"kind":"none"}',
			inserted INTEGER NOT NULL DEFAULT 0,
			value TEXT,
			created_at TEXT NOT NULL,
			updated_at TEXT NOT NULL
		)
		"#,
		// Append-only; no UPDATE or DELETE is ever issued against this table.
		r#"
		CREATE TABLE IF NOT EXISTS audit_logs (
			id TEXT PRIMARY KEY,
			envelope_id TEXT NOT NULL,
			timestamp TEXT NOT NULL,
			event_type TEXT NOT NULL,
			severity TEXT NOT NULL,
			actor TEXT NOT NULL,
			resource_type TEXT,
			resource_id TEXT,
			action TEXT NOT NULL,
			details TEXT
		)
		"#,
		// One active code per recipient; reissuing replaces the row, which
		// invalidates the previous code and resets the attempt counter.
		r#"
		CREATE TABLE IF NOT EXISTS email_codes (
			recipient_id TEXT PRIMARY KEY REFERENCES recipients(id),
			code_hash TEXT NOT NULL,
			expires_at TEXT NOT NULL,
			attempts INTEGER NOT NULL DEFAULT 0,
			max_attempts INTEGER NOT NULL,
			issued_at TEXT NOT NULL
		)
		"#,
		r#"
		CREATE TABLE IF NOT EXISTS external_codes (
			recipient_id TEXT PRIMARY KEY REFERENCES recipients(id),
			code_hash TEXT NOT NULL,
			expires_at TEXT,
			attempts INTEGER NOT NULL DEFAULT 0,
			max_attempts INTEGER NOT NULL,
			issued_at TEXT NOT NULL
		)
		"#,
		r#"
		CREATE TABLE IF NOT EXISTS passkey_challenges (
			recipient_id TEXT PRIMARY KEY REFERENCES recipients(id),
			challenge_ref TEXT NOT NULL,
			issued_at TEXT NOT NULL
		)
		"#,
		"CREATE INDEX IF NOT EXISTS idx_recipients_envelope ON recipients(envelope_id)",
		"CREATE INDEX IF NOT EXISTS idx_fields_envelope ON fields(envelope_id)",
		"CREATE INDEX IF NOT EXISTS idx_fields_recipient ON fields(recipient_id)",
		"CREATE INDEX IF NOT EXISTS idx_audit_envelope ON audit_logs(envelope_id, timestamp)",
	];

	for statement in statements {
		sqlx::query(statement).execute(pool).await?;
	}

	tracing::debug!("schema ensured");
	Ok(())
}
