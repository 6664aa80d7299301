// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Draft authoring: creating envelopes, attaching recipients and fields,
//! and the deletion guards.
//!
//! Recipient access tokens are generated here. The plaintext is returned to
//! the caller exactly once; only its SHA-256 hash is stored.

use rand::{distributions::Alphanumeric, Rng};
use tracing::instrument;

use vellum_core::auth_options::AuthOptions;
use vellum_core::envelope::{Envelope, EnvelopeKind, EnvelopeStatus, SigningOrderPolicy};
use vellum_core::field::{Field, FieldMeta, FieldType};
use vellum_core::recipient::{Recipient, RecipientRole};
use vellum_core::types::{AccountId, EnvelopeId, RecipientId};
use vellum_server_audit::{Actor, AuditEventType, AuditLogBuilder};
use vellum_server_auth::ChallengeContext;
use vellum_server_db::two_factor::hash_code;
use vellum_server_db::{
	audit as db_audit, envelope as db_envelope, field as db_field, recipient as db_recipient,
	EnvelopeRepository, RecipientRepository,
};

use crate::engine::WorkflowEngine;
use crate::error::{EngineError, Result};

const TOKEN_LENGTH: usize = 40;

/// Parameters for a new envelope. Defaults: parallel order, no global auth,
/// no content.
#[derive(Debug, Clone)]
pub struct EnvelopeDraft {
	pub kind: EnvelopeKind,
	pub title: String,
	pub external_id: Option<String>,
	pub global_auth: AuthOptions,
	pub signing_order: SigningOrderPolicy,
	pub content_items: i64,
}

impl EnvelopeDraft {
	pub fn new(kind: EnvelopeKind, title: impl Into<String>) -> Self {
		Self {
			kind,
			title: title.into(),
			external_id: None,
			global_auth: AuthOptions::default(),
			signing_order: SigningOrderPolicy::default(),
			content_items: 0,
		}
	}
}

/// Parameters for a new recipient.
#[derive(Debug, Clone)]
pub struct RecipientDraft {
	pub email: String,
	pub name: String,
	pub role: RecipientRole,
	pub auth_overrides: AuthOptions,
	pub signing_order: Option<i64>,
}

impl RecipientDraft {
	pub fn new(email: impl Into<String>, name: impl Into<String>, role: RecipientRole) -> Self {
		Self {
			email: email.into(),
			name: name.into(),
			role,
			auth_overrides: AuthOptions::default(),
			signing_order: None,
		}
	}
}

/// Parameters for a new field.
#[derive(Debug, Clone)]
pub struct FieldDraft {
	pub recipient_id: RecipientId,
	pub field_type: FieldType,
	pub page: i64,
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
	pub meta: FieldMeta,
}

impl WorkflowEngine {
	/// Create a draft envelope owned by `owner`.
	#[instrument(skip(self, draft), fields(owner = %owner))]
	pub async fn create_envelope(&self, owner: AccountId, draft: EnvelopeDraft) -> Result<Envelope> {
		let mut envelope = Envelope::new_draft(owner, draft.kind, draft.title);
		envelope.external_id = draft.external_id;
		envelope.global_auth = draft.global_auth;
		envelope.signing_order = draft.signing_order;
		envelope.content_items = draft.content_items;

		let mut tx = self.pool().begin().await?;
		db_envelope::insert(&mut tx, &envelope).await?;
		db_audit::append(
			&mut tx,
			&AuditLogBuilder::new(AuditEventType::EnvelopeCreated, envelope.id)
				.actor(Actor::Account(owner))
				.build(),
		)
		.await?;
		tx.commit().await?;
		Ok(envelope)
	}

	/// Attach a recipient, returning the recipient and their plaintext
	/// access token. The token is not recoverable later.
	#[instrument(skip(self, draft), fields(envelope_id = %envelope_id))]
	pub async fn add_recipient(
		&self,
		envelope_id: &EnvelopeId,
		draft: RecipientDraft,
	) -> Result<(Recipient, String)> {
		if draft.email.trim().is_empty() {
			return Err(EngineError::Validation("recipient email is empty".to_string()));
		}

		let token = generate_token();
		let mut recipient = Recipient::new(
			*envelope_id,
			draft.email,
			draft.name,
			draft.role,
			hash_code(&token),
		);
		recipient.auth_overrides = draft.auth_overrides;
		recipient.signing_order = draft.signing_order;

		let mut tx = self.pool().begin().await?;
		let envelope = db_envelope::lock_row(&mut tx, envelope_id).await?;
		if envelope.status.is_terminal() {
			return Err(EngineError::Conflict(format!(
				"envelope is {}",
				envelope.status
			)));
		}
		db_recipient::insert(&mut tx, &recipient).await?;
		db_audit::append(
			&mut tx,
			&AuditLogBuilder::new(AuditEventType::RecipientCreated, *envelope_id)
				.actor(Actor::Account(envelope.owner_id))
				.resource("recipient", recipient.id.to_string())
				.build(),
		)
		.await?;
		tx.commit().await?;
		Ok((recipient, token))
	}

	/// Attach a field to a recipient. The recipient must not have signed.
	#[instrument(skip(self, draft), fields(envelope_id = %envelope_id))]
	pub async fn add_field(&self, envelope_id: &EnvelopeId, draft: FieldDraft) -> Result<Field> {
		let mut field = Field::new(
			*envelope_id,
			draft.recipient_id,
			draft.field_type,
			draft.page,
			(draft.x, draft.y),
			(draft.width, draft.height),
		);
		field.meta = draft.meta;

		let mut tx = self.pool().begin().await?;
		let envelope = db_envelope::lock_row(&mut tx, envelope_id).await?;
		if envelope.status.is_terminal() {
			return Err(EngineError::Conflict(format!(
				"envelope is {}",
				envelope.status
			)));
		}
		let recipients = db_recipient::list_for_envelope(&mut tx, envelope_id).await?;
		let Some(recipient) = recipients.iter().find(|r| r.id == draft.recipient_id) else {
			return Err(EngineError::NotFound(format!(
				"recipient {}",
				draft.recipient_id
			)));
		};
		if !recipient.is_mutable() {
			return Err(EngineError::Conflict("recipient already signed".to_string()));
		}
		db_field::insert(&mut tx, &field).await?;
		db_audit::append(
			&mut tx,
			&AuditLogBuilder::new(AuditEventType::FieldCreated, *envelope_id)
				.actor(Actor::Account(envelope.owner_id))
				.resource("field", field.id.to_string())
				.build(),
		)
		.await?;
		tx.commit().await?;
		Ok(field)
	}

	/// Remove a recipient. Refused once they have been notified or signed.
	#[instrument(skip(self), fields(envelope_id = %envelope_id, recipient_id = %recipient_id))]
	pub async fn remove_recipient(
		&self,
		envelope_id: &EnvelopeId,
		recipient_id: &RecipientId,
	) -> Result<()> {
		let recipients = RecipientRepository::new(self.pool().clone());
		let recipient = recipients
			.get_recipient(recipient_id)
			.await?
			.filter(|r| r.envelope_id == *envelope_id)
			.ok_or_else(|| EngineError::NotFound(format!("recipient {recipient_id}")))?;
		if !recipients.delete_recipient(recipient_id).await? {
			return Err(EngineError::Conflict(
				"recipient already sent or signed".to_string(),
			));
		}
		self.append_audit(
			AuditLogBuilder::new(AuditEventType::RecipientDeleted, *envelope_id)
				.resource("recipient", recipient.id.to_string())
				.build(),
		)
		.await
	}

	/// Soft-delete an envelope. Reads exclude it from then on.
	#[instrument(skip(self, actor), fields(envelope_id = %envelope_id))]
	pub async fn delete_envelope(&self, envelope_id: &EnvelopeId, actor: Actor) -> Result<()> {
		let envelopes = EnvelopeRepository::new(self.pool().clone());
		envelopes
			.get_envelope(envelope_id)
			.await?
			.ok_or_else(|| EngineError::NotFound(format!("envelope {envelope_id}")))?;
		envelopes.soft_delete_envelope(envelope_id).await?;
		self.append_audit(
			AuditLogBuilder::new(AuditEventType::EnvelopeDeleted, *envelope_id)
				.actor(actor)
				.build(),
		)
		.await
	}

	/// Issue (or re-issue) a one-time email code to the recipient behind
	/// `token`, for the two-factor action gate.
	#[instrument(skip(self, token))]
	pub async fn issue_action_code(&self, token: &str) -> Result<()> {
		let (recipient, envelope) = self.recipient_by_token(token).await?;
		let ctx = ChallengeContext {
			recipient: recipient.clone(),
			owner_account: envelope.owner_id,
			direct_link: false,
		};
		self.executor().issue_email_code(&ctx).await?;
		self.append_audit(
			AuditLogBuilder::new(AuditEventType::TwoFactorCodeIssued, envelope.id)
				.resource("recipient", recipient.id.to_string())
				.build(),
		)
		.await
	}

	/// Record a code the sender issued to the recipient out-of-band, for
	/// the external two-factor gate. Replaces any previous code.
	#[instrument(skip(self, code), fields(envelope_id = %envelope_id, recipient_id = %recipient_id))]
	pub async fn record_external_code(
		&self,
		envelope_id: &EnvelopeId,
		recipient_id: &RecipientId,
		code: &str,
	) -> Result<()> {
		let recipients = RecipientRepository::new(self.pool().clone());
		let recipient = recipients
			.get_recipient(recipient_id)
			.await?
			.filter(|r| r.envelope_id == *envelope_id)
			.ok_or_else(|| EngineError::NotFound(format!("recipient {recipient_id}")))?;
		self.executor().set_external_code(&recipient.id, code).await?;
		self.append_audit(
			AuditLogBuilder::new(AuditEventType::ExternalCodeIssued, *envelope_id)
				.resource("recipient", recipient.id.to_string())
				.build(),
		)
		.await
	}

	async fn recipient_by_token(&self, token: &str) -> Result<(Recipient, Envelope)> {
		let recipients = RecipientRepository::new(self.pool().clone());
		let recipient = recipients
			.get_by_token_hash(&hash_code(token))
			.await?
			.ok_or_else(|| EngineError::NotFound("recipient token".to_string()))?;
		let envelope = EnvelopeRepository::new(self.pool().clone())
			.get_envelope(&recipient.envelope_id)
			.await?
			.ok_or_else(|| EngineError::NotFound(format!("envelope {}", recipient.envelope_id)))?;
		Ok((recipient, envelope))
	}
}

fn generate_token() -> String {
	rand::thread_rng()
		.sample_iter(&Alphanumeric)
		.take(TOKEN_LENGTH)
		.map(char::from)
		.collect()
}
