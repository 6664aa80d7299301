// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Recipient entity: a party attached to an envelope.
//!
//! CC and Viewer recipients take no signing action, so they are created
//! pre-completed (sent + signed). A recipient that has signed, or whose
//! fields have been inserted, is immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth_options::AuthOptions;
use crate::types::{EnvelopeId, RecipientId};

/// What a recipient is expected to do with the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientRole {
	/// Must place a signature.
	Signer,
	/// Must approve, no signature placement.
	Approver,
	/// May view; takes no action.
	Viewer,
	/// Receives a copy once completed; takes no action.
	Cc,
	/// Helps prepare the envelope on behalf of another signer.
	Assistant,
}

impl RecipientRole {
	/// Roles that hold a pending action and therefore block completion.
	pub fn takes_action(&self) -> bool {
		matches!(
			self,
			RecipientRole::Signer | RecipientRole::Approver | RecipientRole::Assistant
		)
	}

	/// Roles allowed to reject the envelope.
	pub fn can_reject(&self) -> bool {
		matches!(self, RecipientRole::Signer | RecipientRole::Approver)
	}
}

impl fmt::Display for RecipientRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			RecipientRole::Signer => "signer",
			RecipientRole::Approver => "approver",
			RecipientRole::Viewer => "viewer",
			RecipientRole::Cc => "cc",
			RecipientRole::Assistant => "assistant",
		};
		write!(f, "{s}")
	}
}

impl std::str::FromStr for RecipientRole {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"signer" => Ok(RecipientRole::Signer),
			"approver" => Ok(RecipientRole::Approver),
			"viewer" => Ok(RecipientRole::Viewer),
			"cc" => Ok(RecipientRole::Cc),
			"assistant" => Ok(RecipientRole::Assistant),
			other => Err(format!("unknown recipient role: {other}")),
		}
	}
}

/// Whether the recipient has been notified of the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStatus {
	NotSent,
	Sent,
}

impl fmt::Display for SendStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SendStatus::NotSent => write!(f, "not_sent"),
			SendStatus::Sent => write!(f, "sent"),
		}
	}
}

impl std::str::FromStr for SendStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"not_sent" => Ok(SendStatus::NotSent),
			"sent" => Ok(SendStatus::Sent),
			other => Err(format!("unknown send status: {other}")),
		}
	}
}

/// Whether the recipient has completed (or refused) their action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningStatus {
	NotSigned,
	Signed,
	Rejected,
}

impl fmt::Display for SigningStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SigningStatus::NotSigned => write!(f, "not_signed"),
			SigningStatus::Signed => write!(f, "signed"),
			SigningStatus::Rejected => write!(f, "rejected"),
		}
	}
}

impl std::str::FromStr for SigningStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"not_signed" => Ok(SigningStatus::NotSigned),
			"signed" => Ok(SigningStatus::Signed),
			"rejected" => Ok(SigningStatus::Rejected),
			other => Err(format!("unknown signing status: {other}")),
		}
	}
}

/// A party attached to an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
	pub id: RecipientId,
	pub envelope_id: EnvelopeId,
	pub email: String,
	pub name: String,
	pub role: RecipientRole,
	/// Per-recipient authentication overrides; empty sets inherit the
	/// envelope defaults.
	pub auth_overrides: AuthOptions,
	/// Rank under the sequential policy; `None` sorts last.
	pub signing_order: Option<i64>,
	pub send_status: SendStatus,
	pub signing_status: SigningStatus,
	/// SHA-256 hash of the unique access token. Plaintext is returned to the
	/// caller exactly once at creation and never stored.
	pub token_hash: String,
	pub rejection_reason: Option<String>,
	pub signed_at: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Recipient {
	/// Create a recipient for `envelope_id`.
	///
	/// CC and Viewer recipients are created pre-completed since they take no
	/// signing action.
	pub fn new(
		envelope_id: EnvelopeId,
		email: impl Into<String>,
		name: impl Into<String>,
		role: RecipientRole,
		token_hash: impl Into<String>,
	) -> Self {
		let now = Utc::now();
		let (send_status, signing_status) = if role.takes_action() {
			(SendStatus::NotSent, SigningStatus::NotSigned)
		} else {
			(SendStatus::Sent, SigningStatus::Signed)
		};
		Self {
			id: RecipientId::generate(),
			envelope_id,
			email: email.into(),
			name: name.into(),
			role,
			auth_overrides: AuthOptions::default(),
			signing_order: None,
			send_status,
			signing_status,
			token_hash: token_hash.into(),
			rejection_reason: None,
			signed_at: None,
			created_at: now,
			updated_at: now,
		}
	}

	/// A recipient becomes immutable once they have signed.
	pub fn is_mutable(&self) -> bool {
		self.signing_status == SigningStatus::NotSigned
	}

	/// True when this recipient still holds a pending action.
	pub fn has_pending_action(&self) -> bool {
		self.role.takes_action() && self.signing_status == SigningStatus::NotSigned
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn recipient(role: RecipientRole) -> Recipient {
		Recipient::new(
			EnvelopeId::generate(),
			"alice@example.com",
			"Alice",
			role,
			"deadbeef",
		)
	}

	#[test]
	fn test_cc_and_viewer_are_pre_completed() {
		for role in [RecipientRole::Cc, RecipientRole::Viewer] {
			let r = recipient(role);
			assert_eq!(r.send_status, SendStatus::Sent);
			assert_eq!(r.signing_status, SigningStatus::Signed);
			assert!(!r.has_pending_action());
		}
	}

	#[test]
	fn test_action_roles_start_pending() {
		for role in [
			RecipientRole::Signer,
			RecipientRole::Approver,
			RecipientRole::Assistant,
		] {
			let r = recipient(role);
			assert_eq!(r.send_status, SendStatus::NotSent);
			assert_eq!(r.signing_status, SigningStatus::NotSigned);
			assert!(r.has_pending_action());
			assert!(r.is_mutable());
		}
	}

	#[test]
	fn test_rejection_roles() {
		assert!(RecipientRole::Signer.can_reject());
		assert!(RecipientRole::Approver.can_reject());
		assert!(!RecipientRole::Viewer.can_reject());
		assert!(!RecipientRole::Cc.can_reject());
		assert!(!RecipientRole::Assistant.can_reject());
	}
}
