// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The envelope workflow state machine.
//!
//! Every mutating operation runs as one SQLite transaction whose first
//! statement is the envelope write-lock ([`vellum_server_db::envelope::lock_row`]),
//! so concurrent operations on the same envelope serialize while different
//! envelopes proceed in parallel. Status flips are guarded updates; a lost
//! race surfaces as [`EngineError::Conflict`], never as a double apply.
//! Notifications, webhooks, and sealing dispatch strictly after commit.

use std::sync::Arc;

use sqlx::sqlite::SqlitePool;
use tracing::{instrument, warn};

use vellum_core::auth_options::AuthOptions;
use vellum_core::envelope::{Envelope, EnvelopeStatus, SigningOrderPolicy};
use vellum_core::recipient::{Recipient, RecipientRole, SendStatus, SigningStatus};
use vellum_core::schedule::{blocked, next_eligible, ScheduleState};
use vellum_core::types::{EnvelopeId, RecipientId};
use vellum_server_audit::{Actor, AuditEventType, AuditLogBuilder};
use vellum_server_auth::{ChallengeContext, ChallengeExecutor, SubmittedProof};
use vellum_server_db::two_factor::hash_code;
use vellum_server_db::{
	audit as db_audit, envelope as db_envelope, field as db_field, recipient as db_recipient,
	EnvelopeRepository, RecipientRepository,
};
use vellum_server_events::{
	EnvelopeEvent, EnvelopeSnapshot, EventKind, EventPipeline, NoticeKind, RecipientNotice,
	RecipientNotifier,
};

use crate::error::{EngineError, Result};
use crate::seal::SealingJob;

/// Result of a send or complete operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOutcome {
	/// The operation sealed the envelope.
	pub finalized: bool,
	/// Recipients notified for the first time by this operation.
	pub notified: Vec<RecipientId>,
}

/// Read-only view of the signing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerView {
	pub state: ScheduleState,
	/// Recipients waiting behind the currently eligible one(s).
	pub blocked: Vec<RecipientId>,
}

pub struct WorkflowEngine {
	pool: SqlitePool,
	envelopes: EnvelopeRepository,
	recipients: RecipientRepository,
	executor: Arc<ChallengeExecutor>,
	notifier: Arc<dyn RecipientNotifier>,
	pipeline: Arc<EventPipeline>,
	sealer: Arc<dyn SealingJob>,
}

impl WorkflowEngine {
	pub fn new(
		pool: SqlitePool,
		executor: Arc<ChallengeExecutor>,
		notifier: Arc<dyn RecipientNotifier>,
		pipeline: Arc<EventPipeline>,
		sealer: Arc<dyn SealingJob>,
	) -> Self {
		Self {
			envelopes: EnvelopeRepository::new(pool.clone()),
			recipients: RecipientRepository::new(pool.clone()),
			pool,
			executor,
			notifier,
			pipeline,
			sealer,
		}
	}

	pub(crate) fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	pub(crate) fn executor(&self) -> &ChallengeExecutor {
		&self.executor
	}

	/// Transition the envelope out of Draft and notify the first eligible
	/// recipients.
	///
	/// Idempotent on re-send: an envelope already Pending gets only the
	/// notification pass, and recipients already marked sent are skipped.
	/// If every action-taking recipient has signed (or none exists), the
	/// envelope seals immediately without a Pending dwell.
	#[instrument(skip(self, actor), fields(envelope_id = %envelope_id))]
	pub async fn send(&self, envelope_id: &EnvelopeId, actor: Actor) -> Result<WorkflowOutcome> {
		let mut tx = self.pool.begin().await?;

		let mut envelope = db_envelope::lock_row(&mut tx, envelope_id).await?;
		match envelope.status {
			EnvelopeStatus::Completed => {
				return Err(EngineError::Conflict("envelope already completed".to_string()))
			}
			EnvelopeStatus::Rejected => {
				return Err(EngineError::Conflict("envelope already rejected".to_string()))
			}
			EnvelopeStatus::Draft | EnvelopeStatus::Pending => {}
		}

		let mut recipients = db_recipient::list_for_envelope(&mut tx, envelope_id).await?;
		if recipients.is_empty() {
			return Err(EngineError::Validation(
				"envelope has no recipients".to_string(),
			));
		}
		if envelope.content_items < 1 {
			return Err(EngineError::Validation(
				"envelope has no content".to_string(),
			));
		}

		match next_eligible(envelope.signing_order, &recipients) {
			ScheduleState::ReadyToFinalize => {
				let from = envelope.status;
				if !db_envelope::transition_status(
					&mut tx,
					envelope_id,
					from,
					EnvelopeStatus::Completed,
				)
				.await?
				{
					return Err(EngineError::Conflict(format!(
						"envelope is no longer {from}"
					)));
				}
				db_audit::append(
					&mut tx,
					&AuditLogBuilder::new(AuditEventType::EnvelopeCompleted, envelope.id)
						.actor(actor)
						.action("sealed on send: no pending action remained")
						.build(),
				)
				.await?;
				tx.commit().await?;

				envelope.status = EnvelopeStatus::Completed;
				envelope.completed_at = Some(chrono::Utc::now());
				self.after_finalize(&envelope, &recipients).await;
				return Ok(WorkflowOutcome {
					finalized: true,
					notified: Vec::new(),
				});
			}
			ScheduleState::Eligible(eligible) => {
				if envelope.version == 2 {
					self.auto_insert_prefills(&mut tx, &envelope, &recipients).await?;
				}

				let mut sent_event = false;
				if envelope.status == EnvelopeStatus::Draft {
					if !db_envelope::transition_status(
						&mut tx,
						envelope_id,
						EnvelopeStatus::Draft,
						EnvelopeStatus::Pending,
					)
					.await?
					{
						return Err(EngineError::Conflict(
							"envelope is no longer draft".to_string(),
						));
					}
					db_audit::append(
						&mut tx,
						&AuditLogBuilder::new(AuditEventType::EnvelopeSent, envelope.id)
							.actor(actor.clone())
							.diff("status", "draft", "pending")
							.build(),
					)
					.await?;
					envelope.status = EnvelopeStatus::Pending;
					sent_event = true;
				}

				let notified = self
					.mark_eligible_sent(&mut tx, &envelope, &mut recipients, &eligible, &actor)
					.await?;
				tx.commit().await?;

				let snapshot = EnvelopeSnapshot::capture(&envelope, &recipients);
				if sent_event {
					self.pipeline
						.publish(EnvelopeEvent::new(EventKind::EnvelopeSent, snapshot.clone()));
				}
				self.dispatch_notices(&envelope, &recipients, &notified).await;
				Ok(WorkflowOutcome {
					finalized: false,
					notified,
				})
			}
		}
	}

	/// Complete the calling recipient's action, identified by their access
	/// token, after passing the resolved action auth gate.
	#[instrument(skip(self, token, proof, next_signer_hint))]
	pub async fn complete_action(
		&self,
		token: &str,
		proof: &SubmittedProof,
		next_signer_hint: Option<RecipientId>,
	) -> Result<WorkflowOutcome> {
		let recipient = self
			.recipients
			.get_by_token_hash(&hash_code(token))
			.await?
			.ok_or_else(|| EngineError::NotFound("recipient token".to_string()))?;
		let envelope = self
			.envelopes
			.get_envelope(&recipient.envelope_id)
			.await?
			.ok_or_else(|| EngineError::NotFound(format!("envelope {}", recipient.envelope_id)))?;

		match envelope.status {
			EnvelopeStatus::Draft => {
				return Err(EngineError::Validation(
					"envelope has not been sent".to_string(),
				))
			}
			EnvelopeStatus::Completed => {
				return Err(EngineError::Conflict("envelope already completed".to_string()))
			}
			EnvelopeStatus::Rejected => {
				return Err(EngineError::Conflict("envelope already rejected".to_string()))
			}
			EnvelopeStatus::Pending => {}
		}
		if !recipient.role.takes_action() {
			return Err(EngineError::Validation(format!(
				"{} recipients take no signing action",
				recipient.role
			)));
		}

		self.enforce_action_auth(&envelope, &recipient, proof).await?;

		let mut tx = self.pool.begin().await?;
		let mut envelope = db_envelope::lock_row(&mut tx, &recipient.envelope_id).await?;
		if envelope.status != EnvelopeStatus::Pending {
			return Err(EngineError::Conflict(format!(
				"envelope is {}",
				envelope.status
			)));
		}

		let current = db_recipient::list_for_envelope(&mut tx, &envelope.id).await?;
		if let Some(r) = current.iter().find(|r| r.id == recipient.id) {
			if r.signing_status != SigningStatus::NotSigned {
				return Err(EngineError::Conflict("recipient already signed".to_string()));
			}
		}
		match next_eligible(envelope.signing_order, &current) {
			ScheduleState::Eligible(ref ids) if ids.contains(&recipient.id) => {}
			_ => {
				return Err(EngineError::Conflict(
					"recipient is not eligible to act yet".to_string(),
				))
			}
		}

		if !db_recipient::mark_signed(&mut tx, &recipient.id).await? {
			return Err(EngineError::Conflict("recipient already signed".to_string()));
		}
		let recipient_actor = Actor::Recipient(recipient.email.clone());
		db_audit::append(
			&mut tx,
			&AuditLogBuilder::new(AuditEventType::RecipientCompleted, envelope.id)
				.actor(recipient_actor.clone())
				.resource("recipient", recipient.id.to_string())
				.diff("signing_status", "not_signed", "signed")
				.build(),
		)
		.await?;

		self.capture_recipient_fields(&mut tx, &envelope, &recipient).await?;

		let mut recipients = db_recipient::list_for_envelope(&mut tx, &envelope.id).await?;
		let mut finalized = false;
		let mut notified = Vec::new();
		match next_eligible(envelope.signing_order, &recipients) {
			ScheduleState::ReadyToFinalize => {
				if !db_envelope::transition_status(
					&mut tx,
					&envelope.id,
					EnvelopeStatus::Pending,
					EnvelopeStatus::Completed,
				)
				.await?
				{
					return Err(EngineError::Conflict(
						"envelope already completed".to_string(),
					));
				}
				db_audit::append(
					&mut tx,
					&AuditLogBuilder::new(AuditEventType::EnvelopeCompleted, envelope.id)
						.actor(recipient_actor)
						.diff("status", "pending", "completed")
						.build(),
				)
				.await?;
				finalized = true;
			}
			ScheduleState::Eligible(eligible) => {
				let to_notify =
					apply_next_signer_hint(&envelope, &recipient, &recipients, eligible, next_signer_hint)?;
				notified = self
					.mark_eligible_sent(&mut tx, &envelope, &mut recipients, &to_notify, &Actor::System)
					.await?;
			}
		}
		tx.commit().await?;

		if finalized {
			envelope.status = EnvelopeStatus::Completed;
			envelope.completed_at = Some(chrono::Utc::now());
			self.after_finalize(&envelope, &recipients).await;
		} else {
			self.dispatch_notices(&envelope, &recipients, &notified).await;
		}
		Ok(WorkflowOutcome {
			finalized,
			notified,
		})
	}

	/// Reject the envelope on behalf of the calling recipient. Terminal.
	#[instrument(skip(self, token, reason))]
	pub async fn reject(&self, token: &str, reason: &str) -> Result<()> {
		let recipient = self
			.recipients
			.get_by_token_hash(&hash_code(token))
			.await?
			.ok_or_else(|| EngineError::NotFound("recipient token".to_string()))?;
		if !recipient.role.can_reject() {
			return Err(EngineError::Validation(format!(
				"{} recipients cannot reject",
				recipient.role
			)));
		}

		let mut tx = self.pool.begin().await?;
		let mut envelope = db_envelope::lock_row(&mut tx, &recipient.envelope_id).await?;
		match envelope.status {
			EnvelopeStatus::Draft => {
				return Err(EngineError::Validation(
					"envelope has not been sent".to_string(),
				))
			}
			EnvelopeStatus::Completed => {
				return Err(EngineError::Conflict("envelope already completed".to_string()))
			}
			EnvelopeStatus::Rejected => {
				return Err(EngineError::Conflict("envelope already rejected".to_string()))
			}
			EnvelopeStatus::Pending => {}
		}

		if !db_recipient::mark_rejected(&mut tx, &recipient.id, reason).await? {
			return Err(EngineError::Conflict("recipient already signed".to_string()));
		}
		if !db_envelope::transition_status(
			&mut tx,
			&envelope.id,
			EnvelopeStatus::Pending,
			EnvelopeStatus::Rejected,
		)
		.await?
		{
			return Err(EngineError::Conflict(
				"envelope is no longer pending".to_string(),
			));
		}

		let recipient_actor = Actor::Recipient(recipient.email.clone());
		db_audit::append(
			&mut tx,
			&AuditLogBuilder::new(AuditEventType::RecipientRejected, envelope.id)
				.actor(recipient_actor.clone())
				.resource("recipient", recipient.id.to_string())
				.details(serde_json::json!({ "reason": reason }))
				.build(),
		)
		.await?;
		db_audit::append(
			&mut tx,
			&AuditLogBuilder::new(AuditEventType::EnvelopeRejected, envelope.id)
				.actor(recipient_actor)
				.diff("status", "pending", "rejected")
				.build(),
		)
		.await?;

		let recipients = db_recipient::list_for_envelope(&mut tx, &envelope.id).await?;
		tx.commit().await?;

		envelope.status = EnvelopeStatus::Rejected;
		self.pipeline.publish(EnvelopeEvent::rejected(
			EnvelopeSnapshot::capture(&envelope, &recipients),
			reason,
		));
		Ok(())
	}

	/// Effective authentication requirements for one recipient of an
	/// envelope: overrides replace the document defaults per gate.
	pub async fn auth_requirements(
		&self,
		envelope_id: &EnvelopeId,
		recipient_id: &RecipientId,
	) -> Result<vellum_core::auth_options::ResolvedAuth> {
		let envelope = self
			.envelopes
			.get_envelope(envelope_id)
			.await?
			.ok_or_else(|| EngineError::NotFound(format!("envelope {envelope_id}")))?;
		let recipient = self
			.recipients
			.get_recipient(recipient_id)
			.await?
			.filter(|r| r.envelope_id == *envelope_id)
			.ok_or_else(|| EngineError::NotFound(format!("recipient {recipient_id}")))?;
		Ok(AuthOptions::resolve(
			&envelope.global_auth,
			&recipient.auth_overrides,
		))
	}

	/// Current scheduler state: who may act now, who waits behind them.
	pub async fn scheduler_state(&self, envelope_id: &EnvelopeId) -> Result<SchedulerView> {
		let envelope = self
			.envelopes
			.get_envelope(envelope_id)
			.await?
			.ok_or_else(|| EngineError::NotFound(format!("envelope {envelope_id}")))?;
		let recipients = self.recipients.list_for_envelope(envelope_id).await?;
		Ok(SchedulerView {
			state: next_eligible(envelope.signing_order, &recipients),
			blocked: blocked(envelope.signing_order, &recipients),
		})
	}

	/// Verify the access gate for the recipient behind `token`.
	///
	/// Writes an `AccessAuthPassed` / `AccessAuthFailed` audit entry either
	/// way.
	#[instrument(skip(self, token, proof))]
	pub async fn verify_access(&self, token: &str, proof: &SubmittedProof) -> Result<()> {
		let recipient = self
			.recipients
			.get_by_token_hash(&hash_code(token))
			.await?
			.ok_or_else(|| EngineError::NotFound("recipient token".to_string()))?;
		let envelope = self
			.envelopes
			.get_envelope(&recipient.envelope_id)
			.await?
			.ok_or_else(|| EngineError::NotFound(format!("envelope {}", recipient.envelope_id)))?;

		let resolved = AuthOptions::resolve(&envelope.global_auth, &recipient.auth_overrides);
		let ctx = ChallengeContext {
			recipient: recipient.clone(),
			owner_account: envelope.owner_id,
			direct_link: false,
		};
		let outcome = self.executor.satisfy(&ctx, &resolved.access, proof).await;

		let (event_type, result) = match outcome {
			Ok(_) => (AuditEventType::AccessAuthPassed, Ok(())),
			Err(e) => (AuditEventType::AccessAuthFailed, Err(EngineError::from(e))),
		};
		self.append_audit(
			AuditLogBuilder::new(event_type, envelope.id)
				.actor(Actor::Recipient(recipient.email.clone()))
				.resource("recipient", recipient.id.to_string())
				.build(),
		)
		.await?;
		result
	}

	async fn enforce_action_auth(
		&self,
		envelope: &Envelope,
		recipient: &Recipient,
		proof: &SubmittedProof,
	) -> Result<()> {
		let resolved = AuthOptions::resolve(&envelope.global_auth, &recipient.auth_overrides);
		if !resolved.action_required_for(recipient.role) {
			return Ok(());
		}
		if matches!(proof, SubmittedProof::None) {
			return Err(EngineError::AuthRequired(
				resolved.action.iter().copied().collect(),
			));
		}

		let ctx = ChallengeContext {
			recipient: recipient.clone(),
			owner_account: envelope.owner_id,
			direct_link: false,
		};
		match self.executor.satisfy(&ctx, &resolved.action, proof).await {
			Ok(_granted) => Ok(()),
			Err(e) => {
				self.append_audit(
					AuditLogBuilder::new(AuditEventType::ActionAuthFailed, envelope.id)
						.actor(Actor::Recipient(recipient.email.clone()))
						.resource("recipient", recipient.id.to_string())
						.build(),
				)
				.await?;
				Err(e.into())
			}
		}
	}

	/// Insert prefilled defaults for fields belonging to not-yet-sent
	/// recipients, one audit entry per inserted field.
	async fn auto_insert_prefills(
		&self,
		tx: &mut sqlx::SqliteConnection,
		envelope: &Envelope,
		recipients: &[Recipient],
	) -> Result<()> {
		let unsent: Vec<RecipientId> = recipients
			.iter()
			.filter(|r| r.send_status == SendStatus::NotSent)
			.map(|r| r.id)
			.collect();

		let fields = db_field::list_for_envelope(tx, &envelope.id).await?;
		for field in fields {
			if field.inserted || !unsent.contains(&field.recipient_id) {
				continue;
			}
			let Some(value) = field.prefill_value() else {
				continue;
			};
			if db_field::mark_inserted(tx, &field.id, &value).await? {
				db_audit::append(
					tx,
					&AuditLogBuilder::new(AuditEventType::FieldAutoInserted, envelope.id)
						.resource("field", field.id.to_string())
						.diff("value", serde_json::Value::Null, value.clone())
						.build(),
				)
				.await?;
			}
		}
		Ok(())
	}

	/// Capture the completing recipient's remaining fields. Signature fields
	/// without a prefill record the recipient's typed name.
	async fn capture_recipient_fields(
		&self,
		tx: &mut sqlx::SqliteConnection,
		envelope: &Envelope,
		recipient: &Recipient,
	) -> Result<()> {
		let fields = db_field::list_for_envelope(tx, &envelope.id).await?;
		for field in fields {
			if field.recipient_id != recipient.id || field.inserted {
				continue;
			}
			let value = field
				.prefill_value()
				.unwrap_or_else(|| recipient.name.clone());
			if db_field::mark_inserted(tx, &field.id, &value).await? {
				db_audit::append(
					tx,
					&AuditLogBuilder::new(AuditEventType::FieldSigned, envelope.id)
						.actor(Actor::Recipient(recipient.email.clone()))
						.resource("field", field.id.to_string())
						.build(),
				)
				.await?;
			}
		}
		Ok(())
	}

	/// Mark each listed recipient sent inside the transaction. Only the
	/// ones this call actually flipped are returned, which keeps resends
	/// from re-notifying.
	async fn mark_eligible_sent(
		&self,
		tx: &mut sqlx::SqliteConnection,
		envelope: &Envelope,
		recipients: &mut [Recipient],
		eligible: &[RecipientId],
		actor: &Actor,
	) -> Result<Vec<RecipientId>> {
		let mut notified = Vec::new();
		for id in eligible {
			if !db_recipient::mark_sent(tx, id).await? {
				continue;
			}
			if let Some(r) = recipients.iter_mut().find(|r| r.id == *id) {
				r.send_status = SendStatus::Sent;
			}
			db_audit::append(
				tx,
				&AuditLogBuilder::new(AuditEventType::RecipientSent, envelope.id)
					.actor(actor.clone())
					.resource("recipient", id.to_string())
					.diff("send_status", "not_sent", "sent")
					.build(),
			)
			.await?;
			notified.push(*id);
		}
		Ok(notified)
	}

	async fn dispatch_notices(
		&self,
		envelope: &Envelope,
		recipients: &[Recipient],
		notified: &[RecipientId],
	) {
		for id in notified {
			let Some(recipient) = recipients.iter().find(|r| r.id == *id) else {
				continue;
			};
			let notice =
				RecipientNotice::new(NoticeKind::ActionRequired, recipient, &envelope.title);
			if let Err(e) = self.notifier.notify(&notice).await {
				warn!(recipient_id = %id, error = %e, "recipient notification failed");
			}
			self.pipeline.publish(EnvelopeEvent::recipient_notified(
				EnvelopeSnapshot::capture(envelope, recipients),
				*id,
			));
		}
	}

	async fn after_finalize(&self, envelope: &Envelope, recipients: &[Recipient]) {
		if let Err(e) = self.sealer.enqueue(&envelope.id).await {
			warn!(envelope_id = %envelope.id, error = %e, "sealing enqueue failed");
		}
		self.pipeline.publish(EnvelopeEvent::new(
			EventKind::EnvelopeCompleted,
			EnvelopeSnapshot::capture(envelope, recipients),
		));
	}

	pub(crate) async fn append_audit(
		&self,
		entry: vellum_server_audit::AuditLogEntry,
	) -> Result<()> {
		let mut conn = self.pool.acquire().await?;
		db_audit::append(&mut conn, &entry).await?;
		Ok(())
	}
}

/// Resolve an assistant's next-signer designation against the scheduler's
/// eligible set.
///
/// Sequential policy only: the hint may pick any still-pending recipient of
/// the same rank as the scheduler's default choice. Anything else is a
/// validation error.
fn apply_next_signer_hint(
	envelope: &Envelope,
	completing: &Recipient,
	recipients: &[Recipient],
	eligible: Vec<RecipientId>,
	hint: Option<RecipientId>,
) -> Result<Vec<RecipientId>> {
	let Some(hint) = hint else {
		return Ok(eligible);
	};
	if completing.role != RecipientRole::Assistant {
		return Err(EngineError::Validation(
			"only assistants may designate the next signer".to_string(),
		));
	}
	if envelope.signing_order != SigningOrderPolicy::Sequential {
		return Err(EngineError::Validation(
			"next signer designation requires a sequential signing order".to_string(),
		));
	}
	let Some(first) = eligible
		.first()
		.and_then(|id| recipients.iter().find(|r| r.id == *id))
	else {
		return Err(EngineError::Validation(
			"no recipient is eligible to act".to_string(),
		));
	};

	let same_rank = recipients.iter().any(|r| {
		r.id == hint
			&& r.role != RecipientRole::Cc
			&& r.signing_status == SigningStatus::NotSigned
			&& r.signing_order == first.signing_order
	});
	if !same_rank {
		return Err(EngineError::Validation(
			"designated next signer is not eligible".to_string(),
		));
	}
	Ok(vec![hint])
}

#[cfg(test)]
mod tests {
	use super::*;

	fn recipient(
		envelope_id: EnvelopeId,
		role: RecipientRole,
		order: Option<i64>,
	) -> Recipient {
		let mut r = Recipient::new(envelope_id, "r@example.com", "R", role, "hash");
		r.signing_order = order;
		r
	}

	fn sequential_envelope() -> Envelope {
		let mut envelope = Envelope::new_draft(
			vellum_core::types::AccountId::generate(),
			vellum_core::envelope::EnvelopeKind::Document,
			"test",
		);
		envelope.signing_order = SigningOrderPolicy::Sequential;
		envelope
	}

	#[test]
	fn test_hint_requires_assistant_role() {
		let envelope = sequential_envelope();
		let signer = recipient(envelope.id, RecipientRole::Signer, Some(1));
		let next = recipient(envelope.id, RecipientRole::Signer, Some(2));
		let err = apply_next_signer_hint(
			&envelope,
			&signer,
			&[signer.clone(), next.clone()],
			vec![next.id],
			Some(next.id),
		)
		.unwrap_err();
		assert!(matches!(err, EngineError::Validation(_)));
	}

	#[test]
	fn test_hint_picks_same_rank_recipient() {
		let envelope = sequential_envelope();
		let assistant = recipient(envelope.id, RecipientRole::Assistant, Some(1));
		let a = recipient(envelope.id, RecipientRole::Signer, Some(2));
		let b = recipient(envelope.id, RecipientRole::Signer, Some(2));
		let recipients = vec![assistant.clone(), a.clone(), b.clone()];
		let default = vec![a.id.min(b.id)];

		let chosen = apply_next_signer_hint(
			&envelope,
			&assistant,
			&recipients,
			default,
			Some(b.id.max(a.id)),
		)
		.unwrap();
		assert_eq!(chosen, vec![a.id.max(b.id)]);
	}

	#[test]
	fn test_hint_rejects_other_rank() {
		let envelope = sequential_envelope();
		let assistant = recipient(envelope.id, RecipientRole::Assistant, Some(1));
		let next = recipient(envelope.id, RecipientRole::Signer, Some(2));
		let later = recipient(envelope.id, RecipientRole::Signer, Some(3));
		let recipients = vec![assistant.clone(), next.clone(), later.clone()];

		let err = apply_next_signer_hint(
			&envelope,
			&assistant,
			&recipients,
			vec![next.id],
			Some(later.id),
		)
		.unwrap_err();
		assert!(matches!(err, EngineError::Validation(_)));
	}

	#[test]
	fn test_no_hint_keeps_scheduler_choice() {
		let envelope = sequential_envelope();
		let signer = recipient(envelope.id, RecipientRole::Signer, Some(1));
		let chosen = apply_next_signer_hint(
			&envelope,
			&signer,
			&[signer.clone()],
			vec![signer.id],
			None,
		)
		.unwrap();
		assert_eq!(chosen, vec![signer.id]);
	}
}
