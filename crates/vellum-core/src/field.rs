// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Field entity: a placement on the envelope requiring a value.
//!
//! Fields carry typed metadata. Some metadata configures a prefilled default
//! ([`Field::prefill_value`]); the workflow engine auto-inserts those on send
//! for version-2 envelopes, but only for recipients who have not yet been
//! sent the envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{EnvelopeId, FieldId, RecipientId};

/// The kind of value a field captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
	Signature,
	Initials,
	Text,
	Number,
	Date,
	Email,
	Name,
	Radio,
	Checkbox,
	Dropdown,
}

impl FieldType {
	/// Signature-bearing fields are the target the action-auth gate protects.
	pub fn requires_action_auth(&self) -> bool {
		matches!(self, FieldType::Signature)
	}
}

impl fmt::Display for FieldType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			FieldType::Signature => "signature",
			FieldType::Initials => "initials",
			FieldType::Text => "text",
			FieldType::Number => "number",
			FieldType::Date => "date",
			FieldType::Email => "email",
			FieldType::Name => "name",
			FieldType::Radio => "radio",
			FieldType::Checkbox => "checkbox",
			FieldType::Dropdown => "dropdown",
		};
		write!(f, "{s}")
	}
}

impl std::str::FromStr for FieldType {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"signature" => Ok(FieldType::Signature),
			"initials" => Ok(FieldType::Initials),
			"text" => Ok(FieldType::Text),
			"number" => Ok(FieldType::Number),
			"date" => Ok(FieldType::Date),
			"email" => Ok(FieldType::Email),
			"name" => Ok(FieldType::Name),
			"radio" => Ok(FieldType::Radio),
			"checkbox" => Ok(FieldType::Checkbox),
			"dropdown" => Ok(FieldType::Dropdown),
			other => Err(format!("unknown field type: {other}")),
		}
	}
}

/// One selectable option of a radio or checkbox group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
	pub value: String,
	#[serde(default)]
	pub checked: bool,
}

/// Validation rule for checkbox groups: how many boxes must be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule", content = "count")]
pub enum CheckboxRule {
	AtLeast(usize),
	AtMost(usize),
	Exactly(usize),
}

impl CheckboxRule {
	/// Whether `checked` boxes satisfy the rule.
	pub fn is_satisfied_by(&self, checked: usize) -> bool {
		match self {
			CheckboxRule::AtLeast(n) => checked >= *n,
			CheckboxRule::AtMost(n) => checked <= *n,
			CheckboxRule::Exactly(n) => checked == *n,
		}
	}
}

/// Type-specific field metadata, including prefill defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FieldMeta {
	#[default]
	None,
	Text {
		#[serde(default)]
		default: Option<String>,
	},
	Number {
		#[serde(default)]
		default: Option<f64>,
	},
	Radio {
		options: Vec<FieldOption>,
	},
	Checkbox {
		options: Vec<FieldOption>,
		#[serde(default)]
		validation: Option<CheckboxRule>,
	},
	Dropdown {
		options: Vec<String>,
		#[serde(default)]
		default: Option<String>,
	},
}

/// A placement on the envelope bound to exactly one recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
	pub id: FieldId,
	pub envelope_id: EnvelopeId,
	pub recipient_id: RecipientId,
	pub field_type: FieldType,
	pub page: i64,
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
	pub meta: FieldMeta,
	pub inserted: bool,
	pub value: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Field {
	/// Create a field at the given page position, with no metadata and no
	/// captured value.
	pub fn new(
		envelope_id: EnvelopeId,
		recipient_id: RecipientId,
		field_type: FieldType,
		page: i64,
		position: (f64, f64),
		size: (f64, f64),
	) -> Self {
		let now = Utc::now();
		Self {
			id: FieldId::generate(),
			envelope_id,
			recipient_id,
			field_type,
			page,
			x: position.0,
			y: position.1,
			width: size.0,
			height: size.1,
			meta: FieldMeta::default(),
			inserted: false,
			value: None,
			created_at: now,
			updated_at: now,
		}
	}

	/// The value this field would auto-insert on send, if any.
	///
	/// - text / number: the configured default
	/// - radio: the single pre-checked option
	/// - dropdown: the default, but only when it matches one of the options
	/// - checkbox: the checked options, when their count satisfies the
	///   configured validation rule
	pub fn prefill_value(&self) -> Option<String> {
		match &self.meta {
			FieldMeta::None => None,
			FieldMeta::Text { default } => default.clone().filter(|s| !s.is_empty()),
			FieldMeta::Number { default } => default.map(|n| n.to_string()),
			FieldMeta::Radio { options } => options
				.iter()
				.find(|o| o.checked)
				.map(|o| o.value.clone()),
			FieldMeta::Checkbox {
				options,
				validation,
			} => {
				let checked: Vec<&str> = options
					.iter()
					.filter(|o| o.checked)
					.map(|o| o.value.as_str())
					.collect();
				if checked.is_empty() {
					return None;
				}
				if let Some(rule) = validation {
					if !rule.is_satisfied_by(checked.len()) {
						return None;
					}
				}
				Some(checked.join(","))
			}
			FieldMeta::Dropdown { options, default } => default
				.clone()
				.filter(|d| options.iter().any(|o| o == d)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn field(field_type: FieldType, meta: FieldMeta) -> Field {
		let now = Utc::now();
		Field {
			id: FieldId::generate(),
			envelope_id: EnvelopeId::generate(),
			recipient_id: RecipientId::generate(),
			field_type,
			page: 1,
			x: 10.0,
			y: 10.0,
			width: 100.0,
			height: 20.0,
			meta,
			inserted: false,
			value: None,
			created_at: now,
			updated_at: now,
		}
	}

	#[test]
	fn test_text_default_prefills() {
		let f = field(
			FieldType::Text,
			FieldMeta::Text {
				default: Some("ACME Corp".into()),
			},
		);
		assert_eq!(f.prefill_value().as_deref(), Some("ACME Corp"));
	}

	#[test]
	fn test_empty_text_default_does_not_prefill() {
		let f = field(
			FieldType::Text,
			FieldMeta::Text {
				default: Some(String::new()),
			},
		);
		assert_eq!(f.prefill_value(), None);
	}

	#[test]
	fn test_number_default_prefills() {
		let f = field(FieldType::Number, FieldMeta::Number { default: Some(42.0) });
		assert_eq!(f.prefill_value().as_deref(), Some("42"));
	}

	#[test]
	fn test_radio_prechecked_option_prefills() {
		let f = field(
			FieldType::Radio,
			FieldMeta::Radio {
				options: vec![
					FieldOption {
						value: "yes".into(),
						checked: false,
					},
					FieldOption {
						value: "no".into(),
						checked: true,
					},
				],
			},
		);
		assert_eq!(f.prefill_value().as_deref(), Some("no"));
	}

	#[test]
	fn test_dropdown_default_must_match_an_option() {
		let options = vec!["red".to_string(), "green".to_string()];
		let matching = field(
			FieldType::Dropdown,
			FieldMeta::Dropdown {
				options: options.clone(),
				default: Some("green".into()),
			},
		);
		assert_eq!(matching.prefill_value().as_deref(), Some("green"));

		let stale = field(
			FieldType::Dropdown,
			FieldMeta::Dropdown {
				options,
				default: Some("blue".into()),
			},
		);
		assert_eq!(stale.prefill_value(), None);
	}

	#[test]
	fn test_checkbox_rule_gates_prefill() {
		let options = vec![
			FieldOption {
				value: "a".into(),
				checked: true,
			},
			FieldOption {
				value: "b".into(),
				checked: true,
			},
			FieldOption {
				value: "c".into(),
				checked: false,
			},
		];
		let satisfied = field(
			FieldType::Checkbox,
			FieldMeta::Checkbox {
				options: options.clone(),
				validation: Some(CheckboxRule::AtLeast(2)),
			},
		);
		assert_eq!(satisfied.prefill_value().as_deref(), Some("a,b"));

		let unsatisfied = field(
			FieldType::Checkbox,
			FieldMeta::Checkbox {
				options,
				validation: Some(CheckboxRule::Exactly(1)),
			},
		);
		assert_eq!(unsatisfied.prefill_value(), None);
	}

	#[test]
	fn test_signature_is_the_action_auth_target() {
		assert!(FieldType::Signature.requires_action_auth());
		assert!(!FieldType::Text.requires_action_auth());
		assert!(!FieldType::Initials.requires_action_auth());
	}
}
