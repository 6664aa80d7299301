// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Recipient-facing notifications, dispatched by the engine after commit.
//!
//! Unlike webhook events these address one recipient each, so they bypass
//! the fan-out pipeline: the engine calls the notifier directly once the
//! transaction that marked the recipient sent has committed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use vellum_core::recipient::Recipient;
use vellum_core::types::{EnvelopeId, RecipientId};

use crate::error::SinkError;

/// Why the recipient is being contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
	/// It is this recipient's turn to act.
	ActionRequired,
	/// The envelope completed; a copy is available.
	Completed,
	/// The envelope was rejected by another recipient.
	Rejected,
}

/// One notification addressed to one recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientNotice {
	pub kind: NoticeKind,
	pub recipient_id: RecipientId,
	pub email: String,
	pub name: String,
	pub envelope_id: EnvelopeId,
	pub envelope_title: String,
}

impl RecipientNotice {
	pub fn new(kind: NoticeKind, recipient: &Recipient, envelope_title: impl Into<String>) -> Self {
		Self {
			kind,
			recipient_id: recipient.id,
			email: recipient.email.clone(),
			name: recipient.name.clone(),
			envelope_id: recipient.envelope_id,
			envelope_title: envelope_title.into(),
		}
	}
}

/// Outbound recipient notification channel, typically email.
#[async_trait]
pub trait RecipientNotifier: Send + Sync {
	async fn notify(&self, notice: &RecipientNotice) -> Result<(), SinkError>;
}

/// Notifier that only records to the log. Used when no mail transport is
/// configured and as the test default.
pub struct TracingNotifier;

#[async_trait]
impl RecipientNotifier for TracingNotifier {
	async fn notify(&self, notice: &RecipientNotice) -> Result<(), SinkError> {
		tracing::info!(
			recipient_id = %notice.recipient_id,
			envelope_id = %notice.envelope_id,
			kind = ?notice.kind,
			email = %notice.email,
			"recipient notice"
		);
		Ok(())
	}
}
