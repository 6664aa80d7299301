// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Envelope lifecycle events and their wire payload.
//!
//! Events are emitted post-commit only: a consumer never observes a state
//! the database has not durably reached. The payload is a normalized
//! snapshot taken inside the committing transaction's view, not a re-read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use vellum_core::envelope::{Envelope, EnvelopeStatus};
use vellum_core::recipient::{Recipient, RecipientRole, SigningStatus};
use vellum_core::types::{EnvelopeId, RecipientId};

/// What happened to the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
	#[serde(rename = "envelope.sent")]
	EnvelopeSent,
	#[serde(rename = "envelope.completed")]
	EnvelopeCompleted,
	#[serde(rename = "envelope.rejected")]
	EnvelopeRejected,
	#[serde(rename = "recipient.notified")]
	RecipientNotified,
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			EventKind::EnvelopeSent => "envelope.sent",
			EventKind::EnvelopeCompleted => "envelope.completed",
			EventKind::EnvelopeRejected => "envelope.rejected",
			EventKind::RecipientNotified => "recipient.notified",
		};
		write!(f, "{s}")
	}
}

/// Per-recipient slice of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientSummary {
	pub id: RecipientId,
	pub email: String,
	pub name: String,
	pub role: RecipientRole,
	pub signing_status: SigningStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub signing_order: Option<i64>,
}

impl From<&Recipient> for RecipientSummary {
	fn from(r: &Recipient) -> Self {
		Self {
			id: r.id,
			email: r.email.clone(),
			name: r.name.clone(),
			role: r.role,
			signing_status: r.signing_status,
			signing_order: r.signing_order,
		}
	}
}

/// Normalized envelope state carried in every event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeSnapshot {
	pub envelope_id: EnvelopeId,
	pub status: EnvelopeStatus,
	pub title: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub external_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub completed_at: Option<DateTime<Utc>>,
	pub recipients: Vec<RecipientSummary>,
}

impl EnvelopeSnapshot {
	pub fn capture(envelope: &Envelope, recipients: &[Recipient]) -> Self {
		Self {
			envelope_id: envelope.id,
			status: envelope.status,
			title: envelope.title.clone(),
			external_id: envelope.external_id.clone(),
			completed_at: envelope.completed_at,
			recipients: recipients.iter().map(RecipientSummary::from).collect(),
		}
	}
}

/// One lifecycle event, ready for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeEvent {
	/// Delivery id; consumers deduplicate on it across retries.
	pub event_id: Uuid,
	#[serde(rename = "type")]
	pub kind: EventKind,
	pub occurred_at: DateTime<Utc>,
	pub envelope: EnvelopeSnapshot,
	/// Present on `recipient.notified` only.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub recipient_id: Option<RecipientId>,
	/// Present on `envelope.rejected` only.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rejection_reason: Option<String>,
}

impl EnvelopeEvent {
	pub fn new(kind: EventKind, envelope: EnvelopeSnapshot) -> Self {
		Self {
			event_id: Uuid::new_v4(),
			kind,
			occurred_at: Utc::now(),
			envelope,
			recipient_id: None,
			rejection_reason: None,
		}
	}

	pub fn rejected(envelope: EnvelopeSnapshot, reason: impl Into<String>) -> Self {
		let mut event = Self::new(EventKind::EnvelopeRejected, envelope);
		event.rejection_reason = Some(reason.into());
		event
	}

	pub fn recipient_notified(envelope: EnvelopeSnapshot, recipient_id: RecipientId) -> Self {
		let mut event = Self::new(EventKind::RecipientNotified, envelope);
		event.recipient_id = Some(recipient_id);
		event
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use vellum_core::envelope::EnvelopeKind;
	use vellum_core::types::AccountId;

	fn snapshot() -> EnvelopeSnapshot {
		let envelope = Envelope::new_draft(AccountId::generate(), EnvelopeKind::Document, "NDA");
		let recipient = Recipient::new(
			envelope.id,
			"alice@example.com",
			"Alice",
			RecipientRole::Signer,
			"hash",
		);
		EnvelopeSnapshot::capture(&envelope, &[recipient])
	}

	#[test]
	fn test_event_kind_wire_names() {
		assert_eq!(EventKind::EnvelopeSent.to_string(), "envelope.sent");
		assert_eq!(EventKind::EnvelopeCompleted.to_string(), "envelope.completed");
		assert_eq!(EventKind::EnvelopeRejected.to_string(), "envelope.rejected");
		assert_eq!(EventKind::RecipientNotified.to_string(), "recipient.notified");
	}

	#[test]
	fn test_payload_shape() {
		let event = EnvelopeEvent::new(EventKind::EnvelopeSent, snapshot());
		let json = serde_json::to_value(&event).unwrap();
		assert_eq!(json["type"], "envelope.sent");
		assert_eq!(json["envelope"]["status"], "draft");
		assert_eq!(json["envelope"]["recipients"][0]["role"], "signer");
		// Absent optionals are omitted, not null.
		assert!(json.get("rejection_reason").is_none());
		assert!(json["envelope"].get("completed_at").is_none());
	}

	#[test]
	fn test_rejection_carries_reason() {
		let event = EnvelopeEvent::rejected(snapshot(), "terms unacceptable");
		assert_eq!(event.kind, EventKind::EnvelopeRejected);
		assert_eq!(event.rejection_reason.as_deref(), Some("terms unacceptable"));
	}
}
