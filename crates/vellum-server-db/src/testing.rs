// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared helpers for tests that need a database.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use vellum_core::envelope::{Envelope, EnvelopeKind};
use vellum_core::recipient::{Recipient, RecipientRole};
use vellum_core::types::{AccountId, EnvelopeId, RecipientId};

/// In-memory pool with the full schema applied.
///
/// Pinned to a single connection that never expires: every additional pooled
/// connection to `:memory:` would open its own empty database.
pub async fn create_test_pool() -> SqlitePool {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect(":memory:")
		.await
		.unwrap();
	crate::schema::ensure_schema(&pool).await.unwrap();
	pool
}

/// Insert a minimal draft envelope and return its id.
pub async fn insert_test_envelope(pool: &SqlitePool) -> EnvelopeId {
	let mut envelope = Envelope::new_draft(
		AccountId::generate(),
		EnvelopeKind::Document,
		"test envelope",
	);
	envelope.content_items = 1;
	let mut conn = pool.acquire().await.unwrap();
	crate::envelope::insert(&mut conn, &envelope).await.unwrap();
	envelope.id
}

/// Insert a signer recipient with the given token hash and return its id.
pub async fn insert_test_recipient(
	pool: &SqlitePool,
	envelope_id: EnvelopeId,
	token_hash: &str,
) -> RecipientId {
	let recipient = Recipient::new(
		envelope_id,
		"signer@example.com",
		"Signer",
		RecipientRole::Signer,
		token_hash,
	);
	let mut conn = pool.acquire().await.unwrap();
	crate::recipient::insert(&mut conn, &recipient).await.unwrap();
	recipient.id
}
