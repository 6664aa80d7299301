// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core event types for the envelope audit trail.
//!
//! This module provides the foundational types for the audit system:
//!
//! - [`AuditEventType`]: Enumeration of all auditable workflow events
//! - [`AuditSeverity`]: RFC 5424-compatible severity levels
//! - [`Actor`]: Who caused the event (account, recipient, or the system)
//! - [`AuditLogEntry`]: Complete append-only record with before/after diff
//! - [`AuditLogBuilder`]: Fluent API for constructing entries
//!
//! Entries are written in the same storage transaction as the change they
//! record and are never mutated or deleted afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

use vellum_core::types::{AccountId, EnvelopeId};

/// Types of events that can be recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
	// Envelope lifecycle events
	EnvelopeCreated,
	EnvelopeSent,
	EnvelopeCompleted,
	EnvelopeRejected,
	EnvelopeDeleted,

	// Recipient events
	RecipientCreated,
	RecipientSent,
	RecipientCompleted,
	RecipientRejected,
	RecipientDeleted,

	// Field events
	FieldCreated,
	FieldAutoInserted,
	FieldSigned,

	// Authentication events
	AccessAuthPassed,
	AccessAuthFailed,
	ActionAuthFailed,
	TwoFactorCodeIssued,
	ExternalCodeIssued,
}

impl fmt::Display for AuditEventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			// Envelope lifecycle events
			AuditEventType::EnvelopeCreated => "envelope_created",
			AuditEventType::EnvelopeSent => "envelope_sent",
			AuditEventType::EnvelopeCompleted => "envelope_completed",
			AuditEventType::EnvelopeRejected => "envelope_rejected",
			AuditEventType::EnvelopeDeleted => "envelope_deleted",

			// Recipient events
			AuditEventType::RecipientCreated => "recipient_created",
			AuditEventType::RecipientSent => "recipient_sent",
			AuditEventType::RecipientCompleted => "recipient_completed",
			AuditEventType::RecipientRejected => "recipient_rejected",
			AuditEventType::RecipientDeleted => "recipient_deleted",

			// Field events
			AuditEventType::FieldCreated => "field_created",
			AuditEventType::FieldAutoInserted => "field_auto_inserted",
			AuditEventType::FieldSigned => "field_signed",

			// Authentication events
			AuditEventType::AccessAuthPassed => "access_auth_passed",
			AuditEventType::AccessAuthFailed => "access_auth_failed",
			AuditEventType::ActionAuthFailed => "action_auth_failed",
			AuditEventType::TwoFactorCodeIssued => "two_factor_code_issued",
			AuditEventType::ExternalCodeIssued => "external_code_issued",
		};
		write!(f, "{s}")
	}
}

impl std::str::FromStr for AuditEventType {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"envelope_created" => Ok(AuditEventType::EnvelopeCreated),
			"envelope_sent" => Ok(AuditEventType::EnvelopeSent),
			"envelope_completed" => Ok(AuditEventType::EnvelopeCompleted),
			"envelope_rejected" => Ok(AuditEventType::EnvelopeRejected),
			"envelope_deleted" => Ok(AuditEventType::EnvelopeDeleted),
			"recipient_created" => Ok(AuditEventType::RecipientCreated),
			"recipient_sent" => Ok(AuditEventType::RecipientSent),
			"recipient_completed" => Ok(AuditEventType::RecipientCompleted),
			"recipient_rejected" => Ok(AuditEventType::RecipientRejected),
			"recipient_deleted" => Ok(AuditEventType::RecipientDeleted),
			"field_created" => Ok(AuditEventType::FieldCreated),
			"field_auto_inserted" => Ok(AuditEventType::FieldAutoInserted),
			"field_signed" => Ok(AuditEventType::FieldSigned),
			"access_auth_passed" => Ok(AuditEventType::AccessAuthPassed),
			"access_auth_failed" => Ok(AuditEventType::AccessAuthFailed),
			"action_auth_failed" => Ok(AuditEventType::ActionAuthFailed),
			"two_factor_code_issued" => Ok(AuditEventType::TwoFactorCodeIssued),
			"external_code_issued" => Ok(AuditEventType::ExternalCodeIssued),
			other => Err(format!("unknown audit event type: {other}")),
		}
	}
}

impl AuditEventType {
	/// Returns the default severity for this event type.
	///
	/// Mapping follows RFC 5424 conventions:
	/// - `Info`: normal workflow progress
	/// - `Warning`: security-relevant failures
	/// - `Notice`: administrative/destructive actions and terminal outcomes
	pub fn default_severity(&self) -> AuditSeverity {
		match self {
			// Info: normal workflow progress
			AuditEventType::EnvelopeCreated
			| AuditEventType::EnvelopeSent
			| AuditEventType::EnvelopeCompleted
			| AuditEventType::RecipientCreated
			| AuditEventType::RecipientSent
			| AuditEventType::RecipientCompleted
			| AuditEventType::FieldCreated
			| AuditEventType::FieldAutoInserted
			| AuditEventType::FieldSigned
			| AuditEventType::AccessAuthPassed
			| AuditEventType::TwoFactorCodeIssued
			| AuditEventType::ExternalCodeIssued => AuditSeverity::Info,

			// Warning: security-relevant failures
			AuditEventType::AccessAuthFailed | AuditEventType::ActionAuthFailed => {
				AuditSeverity::Warning
			}

			// Notice: administrative/destructive actions and terminal outcomes
			AuditEventType::EnvelopeRejected
			| AuditEventType::EnvelopeDeleted
			| AuditEventType::RecipientRejected
			| AuditEventType::RecipientDeleted => AuditSeverity::Notice,
		}
	}
}

/// Severity levels for audit events, compatible with RFC 5424 syslog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
	Debug = 7,
	#[default]
	Info = 6,
	Notice = 5,
	Warning = 4,
	Error = 3,
	Critical = 2,
}

impl AuditSeverity {
	/// Returns the RFC 5424 numeric severity code.
	pub fn as_syslog_code(&self) -> u8 {
		*self as u8
	}
}

impl PartialOrd for AuditSeverity {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for AuditSeverity {
	fn cmp(&self, other: &Self) -> Ordering {
		// Lower numeric value = higher severity (Critical=2 > Debug=7)
		(*other as u8).cmp(&(*self as u8))
	}
}

impl fmt::Display for AuditSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditSeverity::Debug => "debug",
			AuditSeverity::Info => "info",
			AuditSeverity::Notice => "notice",
			AuditSeverity::Warning => "warning",
			AuditSeverity::Error => "error",
			AuditSeverity::Critical => "critical",
		};
		write!(f, "{s}")
	}
}

/// Who caused an audited event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Actor {
	/// An authenticated account (typically the envelope owner).
	Account(AccountId),
	/// A recipient acting through their access token, identified by email.
	Recipient(String),
	/// The engine itself (auto-insert, finalization).
	System,
}

impl fmt::Display for Actor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Actor::Account(id) => write!(f, "account:{id}"),
			Actor::Recipient(email) => write!(f, "recipient:{email}"),
			Actor::System => write!(f, "system"),
		}
	}
}

/// An append-only entry recording one state-relevant workflow change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
	/// Unique identifier for this audit entry.
	pub id: Uuid,
	/// When the event occurred.
	pub timestamp: DateTime<Utc>,
	/// The type of event.
	pub event_type: AuditEventType,
	/// The severity level of this event.
	pub severity: AuditSeverity,
	/// The envelope this entry belongs to.
	pub envelope_id: EnvelopeId,
	/// Who performed the action.
	pub actor: Actor,
	/// The type of resource affected (e.g., "recipient", "field").
	pub resource_type: Option<String>,
	/// The ID of the resource affected.
	pub resource_id: Option<String>,
	/// Human-readable description of the action.
	pub action: String,
	/// Structured before/after diff and event-specific details.
	pub details: serde_json::Value,
}

impl AuditLogEntry {
	/// Create a new audit log builder for the given event type.
	pub fn builder(event_type: AuditEventType, envelope_id: EnvelopeId) -> AuditLogBuilder {
		AuditLogBuilder::new(event_type, envelope_id)
	}
}

/// Builder for constructing audit log entries with a fluent API.
#[derive(Debug, Clone)]
pub struct AuditLogBuilder {
	event_type: AuditEventType,
	envelope_id: EnvelopeId,
	severity: Option<AuditSeverity>,
	actor: Actor,
	resource_type: Option<String>,
	resource_id: Option<String>,
	action: Option<String>,
	details: serde_json::Value,
}

impl AuditLogBuilder {
	/// Create a new builder; the actor defaults to [`Actor::System`].
	pub fn new(event_type: AuditEventType, envelope_id: EnvelopeId) -> Self {
		Self {
			event_type,
			envelope_id,
			severity: None,
			actor: Actor::System,
			resource_type: None,
			resource_id: None,
			action: None,
			details: serde_json::Value::Null,
		}
	}

	/// Set the severity level. Defaults to the event type's default severity.
	pub fn severity(mut self, severity: AuditSeverity) -> Self {
		self.severity = Some(severity);
		self
	}

	/// Set who performed the action.
	pub fn actor(mut self, actor: Actor) -> Self {
		self.actor = actor;
		self
	}

	/// Set the resource type and ID affected by this event.
	pub fn resource(
		mut self,
		resource_type: impl Into<String>,
		resource_id: impl Into<String>,
	) -> Self {
		self.resource_type = Some(resource_type.into());
		self.resource_id = Some(resource_id.into());
		self
	}

	/// Set the human-readable action description.
	pub fn action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	/// Set the structured before/after diff payload.
	pub fn details(mut self, details: serde_json::Value) -> Self {
		self.details = details;
		self
	}

	/// Record a before/after diff for one attribute.
	pub fn diff(
		mut self,
		attribute: &str,
		before: impl Into<serde_json::Value>,
		after: impl Into<serde_json::Value>,
	) -> Self {
		let diff = serde_json::json!({
			"attribute": attribute,
			"before": before.into(),
			"after": after.into(),
		});
		match &mut self.details {
			serde_json::Value::Array(diffs) => diffs.push(diff),
			serde_json::Value::Null => self.details = serde_json::Value::Array(vec![diff]),
			other => {
				let existing = other.take();
				self.details = serde_json::Value::Array(vec![existing, diff]);
			}
		}
		self
	}

	/// Build the audit log entry.
	pub fn build(self) -> AuditLogEntry {
		AuditLogEntry {
			id: Uuid::new_v4(),
			timestamp: Utc::now(),
			event_type: self.event_type,
			severity: self
				.severity
				.unwrap_or_else(|| self.event_type.default_severity()),
			envelope_id: self.envelope_id,
			actor: self.actor,
			resource_type: self.resource_type,
			resource_id: self.resource_id,
			action: self.action.unwrap_or_else(|| self.event_type.to_string()),
			details: self.details,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_display_returns_snake_case() {
		assert_eq!(AuditEventType::EnvelopeSent.to_string(), "envelope_sent");
		assert_eq!(
			AuditEventType::FieldAutoInserted.to_string(),
			"field_auto_inserted"
		);
	}

	#[test]
	fn test_event_type_parse_roundtrip() {
		for event in [
			AuditEventType::EnvelopeCreated,
			AuditEventType::EnvelopeSent,
			AuditEventType::EnvelopeCompleted,
			AuditEventType::EnvelopeRejected,
			AuditEventType::RecipientSent,
			AuditEventType::RecipientCompleted,
			AuditEventType::FieldAutoInserted,
			AuditEventType::ActionAuthFailed,
			AuditEventType::ExternalCodeIssued,
		] {
			let parsed: AuditEventType = event.to_string().parse().unwrap();
			assert_eq!(parsed, event);
		}
	}

	#[test]
	fn test_default_severities() {
		assert_eq!(
			AuditEventType::EnvelopeSent.default_severity(),
			AuditSeverity::Info
		);
		assert_eq!(
			AuditEventType::ActionAuthFailed.default_severity(),
			AuditSeverity::Warning
		);
		assert_eq!(
			AuditEventType::EnvelopeRejected.default_severity(),
			AuditSeverity::Notice
		);
	}

	#[test]
	fn test_severity_ordering() {
		assert!(AuditSeverity::Critical > AuditSeverity::Warning);
		assert!(AuditSeverity::Warning > AuditSeverity::Info);
		assert_eq!(AuditSeverity::Warning.as_syslog_code(), 4);
	}

	#[test]
	fn test_builder_defaults() {
		let envelope_id = EnvelopeId::generate();
		let entry = AuditLogEntry::builder(AuditEventType::EnvelopeSent, envelope_id).build();
		assert_eq!(entry.envelope_id, envelope_id);
		assert_eq!(entry.actor, Actor::System);
		assert_eq!(entry.severity, AuditSeverity::Info);
		assert_eq!(entry.action, "envelope_sent");
		assert!(entry.details.is_null());
	}

	#[test]
	fn test_builder_diff_accumulates() {
		let entry = AuditLogEntry::builder(
			AuditEventType::EnvelopeSent,
			EnvelopeId::generate(),
		)
		.diff("status", "draft", "pending")
		.diff("send_status", "not_sent", "sent")
		.build();

		let diffs = entry.details.as_array().unwrap();
		assert_eq!(diffs.len(), 2);
		assert_eq!(diffs[0]["attribute"], json!("status"));
		assert_eq!(diffs[0]["before"], json!("draft"));
		assert_eq!(diffs[1]["after"], json!("sent"));
	}

	#[test]
	fn test_actor_display() {
		assert_eq!(Actor::System.to_string(), "system");
		assert_eq!(
			Actor::Recipient("a@example.com".into()).to_string(),
			"recipient:a@example.com"
		);
	}
}
