// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Envelope entity and its lifecycle enums.
//!
//! An envelope is the signable unit: a document or a reusable template with
//! recipients and fields attached. Its status only moves forward
//! (`Draft -> Pending -> {Completed, Rejected}`); terminal states are final.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth_options::AuthOptions;
use crate::types::{AccountId, EnvelopeId};

/// Whether the envelope is a one-off document or a reusable template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
	Document,
	Template,
}

impl fmt::Display for EnvelopeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EnvelopeKind::Document => write!(f, "document"),
			EnvelopeKind::Template => write!(f, "template"),
		}
	}
}

impl std::str::FromStr for EnvelopeKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"document" => Ok(EnvelopeKind::Document),
			"template" => Ok(EnvelopeKind::Template),
			other => Err(format!("unknown envelope kind: {other}")),
		}
	}
}

/// Lifecycle status of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
	Draft,
	Pending,
	Completed,
	Rejected,
}

impl EnvelopeStatus {
	/// True once no further transition is defined out of this state.
	pub fn is_terminal(&self) -> bool {
		matches!(self, EnvelopeStatus::Completed | EnvelopeStatus::Rejected)
	}

	/// Whether the forward-only state machine permits `self -> next`.
	pub fn can_transition_to(&self, next: EnvelopeStatus) -> bool {
		matches!(
			(self, next),
			(EnvelopeStatus::Draft, EnvelopeStatus::Pending)
				| (EnvelopeStatus::Draft, EnvelopeStatus::Completed)
				| (EnvelopeStatus::Pending, EnvelopeStatus::Completed)
				| (EnvelopeStatus::Pending, EnvelopeStatus::Rejected)
		)
	}
}

impl fmt::Display for EnvelopeStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EnvelopeStatus::Draft => write!(f, "draft"),
			EnvelopeStatus::Pending => write!(f, "pending"),
			EnvelopeStatus::Completed => write!(f, "completed"),
			EnvelopeStatus::Rejected => write!(f, "rejected"),
		}
	}
}

impl std::str::FromStr for EnvelopeStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"draft" => Ok(EnvelopeStatus::Draft),
			"pending" => Ok(EnvelopeStatus::Pending),
			"completed" => Ok(EnvelopeStatus::Completed),
			"rejected" => Ok(EnvelopeStatus::Rejected),
			other => Err(format!("unknown envelope status: {other}")),
		}
	}
}

/// Whether recipients act simultaneously or in rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningOrderPolicy {
	#[default]
	Parallel,
	Sequential,
}

impl fmt::Display for SigningOrderPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SigningOrderPolicy::Parallel => write!(f, "parallel"),
			SigningOrderPolicy::Sequential => write!(f, "sequential"),
		}
	}
}

impl std::str::FromStr for SigningOrderPolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"parallel" => Ok(SigningOrderPolicy::Parallel),
			"sequential" => Ok(SigningOrderPolicy::Sequential),
			other => Err(format!("unknown signing order policy: {other}")),
		}
	}
}

/// The signable unit: a document or template with recipients and fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
	pub id: EnvelopeId,
	pub owner_id: AccountId,
	pub kind: EnvelopeKind,
	pub status: EnvelopeStatus,
	pub title: String,
	/// Optional caller-supplied correlation id, carried into webhook payloads.
	pub external_id: Option<String>,
	/// Internal document version; prefilled defaults auto-insert on v2 only.
	pub version: i64,
	/// Document-wide default authentication requirements.
	pub global_auth: AuthOptions,
	pub signing_order: SigningOrderPolicy,
	/// Number of attached content items (pages/attachments), kept denormalized
	/// so send() can validate without loading content.
	pub content_items: i64,
	pub completed_at: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub deleted_at: Option<DateTime<Utc>>,
}

impl Envelope {
	/// Create a new draft envelope owned by `owner_id`.
	pub fn new_draft(owner_id: AccountId, kind: EnvelopeKind, title: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: EnvelopeId::generate(),
			owner_id,
			kind,
			status: EnvelopeStatus::Draft,
			title: title.into(),
			external_id: None,
			version: 2,
			global_auth: AuthOptions::default(),
			signing_order: SigningOrderPolicy::default(),
			content_items: 0,
			completed_at: None,
			created_at: now,
			updated_at: now,
			deleted_at: None,
		}
	}

	/// Soft-deleted envelopes stay referenced by audit history.
	pub fn is_deleted(&self) -> bool {
		self.deleted_at.is_some()
	}
}
