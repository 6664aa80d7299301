// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Field repository for database operations.

use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, SqliteConnection};

use vellum_core::field::{Field, FieldMeta};
use vellum_core::types::{EnvelopeId, FieldId};

use crate::envelope::{parse_column, parse_timestamp};
use crate::error::Result;

/// Repository for field database operations.
#[derive(Clone)]
pub struct FieldRepository {
	pool: SqlitePool,
}

impl FieldRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_field(&self, id: &FieldId) -> Result<Option<Field>> {
		let row = sqlx::query(&select_sql("id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;
		row.map(row_to_field).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_for_envelope(&self, envelope_id: &EnvelopeId) -> Result<Vec<Field>> {
		let rows = sqlx::query(&select_sql("envelope_id = ? ORDER BY page, y, x"))
			.bind(envelope_id.to_string())
			.fetch_all(&self.pool)
			.await?;
		rows.into_iter().map(row_to_field).collect()
	}

	#[tracing::instrument(skip(self, field), fields(field_id = %field.id))]
	pub async fn create_field(&self, field: &Field) -> Result<()> {
		let mut conn = self.pool.acquire().await?;
		insert(&mut conn, field).await
	}
}

fn select_sql(predicate: &str) -> String {
	format!(
		"SELECT id, envelope_id, recipient_id, field_type, page, x, y, width, height, \
		 meta, inserted, value, created_at, updated_at FROM fields WHERE {predicate}"
	)
}

/// Insert a field on an existing connection/transaction.
pub async fn insert(conn: &mut SqliteConnection, field: &Field) -> Result<()> {
	sqlx::query(
		r#"
		INSERT INTO fields (
			id, envelope_id, recipient_id, field_type, page, x, y, width, height,
			meta, inserted, value, created_at, updated_at
		)
		VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
		"#,
	)
	.bind(field.id.to_string())
	.bind(field.envelope_id.to_string())
	.bind(field.recipient_id.to_string())
	.bind(field.field_type.to_string())
	.bind(field.page)
	.bind(field.x)
	.bind(field.y)
	.bind(field.width)
	.bind(field.height)
	.bind(serde_json::to_string(&field.meta)?)
	.bind(field.inserted as i32)
	.bind(field.value.as_deref())
	.bind(field.created_at.to_rfc3339())
	.bind(field.updated_at.to_rfc3339())
	.execute(&mut *conn)
	.await?;
	Ok(())
}

/// All fields of an envelope, on an existing connection/transaction.
pub async fn list_for_envelope(
	conn: &mut SqliteConnection,
	envelope_id: &EnvelopeId,
) -> Result<Vec<Field>> {
	let rows = sqlx::query(&select_sql("envelope_id = ? ORDER BY page, y, x"))
		.bind(envelope_id.to_string())
		.fetch_all(&mut *conn)
		.await?;
	rows.into_iter().map(row_to_field).collect()
}

/// Guarded insert marker: records the captured value and flips `inserted`.
///
/// Only applies while the field is still uninserted, so re-running an
/// auto-insert pass never overwrites a value a recipient has already seen.
pub async fn mark_inserted(
	conn: &mut SqliteConnection,
	id: &FieldId,
	value: &str,
) -> Result<bool> {
	let result = sqlx::query(
		"UPDATE fields SET inserted = 1, value = ?, updated_at = ? WHERE id = ? AND inserted = 0",
	)
	.bind(value)
	.bind(Utc::now().to_rfc3339())
	.bind(id.to_string())
	.execute(&mut *conn)
	.await?;
	Ok(result.rows_affected() == 1)
}

fn row_to_field(row: SqliteRow) -> Result<Field> {
	let id: String = row.get("id");
	let envelope_id: String = row.get("envelope_id");
	let recipient_id: String = row.get("recipient_id");
	let field_type: String = row.get("field_type");
	let meta: String = row.get("meta");
	let inserted: i32 = row.get("inserted");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	let meta: FieldMeta = serde_json::from_str(&meta)?;

	Ok(Field {
		id: parse_column(&id, "field id")?,
		envelope_id: parse_column(&envelope_id, "envelope id")?,
		recipient_id: parse_column(&recipient_id, "recipient id")?,
		field_type: parse_column(&field_type, "field type")?,
		page: row.get("page"),
		x: row.get("x"),
		y: row.get("y"),
		width: row.get("width"),
		height: row.get("height"),
		meta,
		inserted: inserted != 0,
		value: row.get("value"),
		created_at: parse_timestamp(&created_at)?,
		updated_at: parse_timestamp(&updated_at)?,
	})
}
