// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication requirement model and resolver.
//!
//! An envelope carries document-wide default requirements; each recipient may
//! carry overrides. [`AuthOptions::resolve`] merges the two layers into the
//! effective requirement for one recipient:
//!
//! - a non-empty recipient override replaces the document default entirely
//! - an empty override inherits the document default
//! - when both layers are empty the effective requirement is
//!   [`AuthMethod::ExplicitNone`]
//!
//! `ExplicitNone` coexisting with other methods in an effective set is
//! tolerated: the other methods win and `ExplicitNone` is dropped. This is a
//! documented compatibility policy, not a validation error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::recipient::RecipientRole;

/// A single authentication method that can gate envelope access or actions.
///
/// This enum is closed: every dispatch site matches exhaustively, so adding a
/// variant is a compile error until all call sites handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
	/// The authenticated session email must match the recipient email.
	Account,
	/// Platform passkey challenge/response via the identity provider.
	Passkey,
	/// The document owner's account password.
	Password,
	/// Internal two-factor: authenticator app or one-time email code.
	TwoFactorAuth,
	/// A code issued out-of-band to the recipient by the document sender.
	ExternalTwoFactorAuth,
	/// No authentication required. Must not be combined with other methods.
	ExplicitNone,
}

impl AuthMethod {
	/// Returns all methods, in the order they are presented to callers.
	pub fn all() -> &'static [AuthMethod] {
		&[
			AuthMethod::Account,
			AuthMethod::Passkey,
			AuthMethod::Password,
			AuthMethod::TwoFactorAuth,
			AuthMethod::ExternalTwoFactorAuth,
			AuthMethod::ExplicitNone,
		]
	}
}

impl fmt::Display for AuthMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuthMethod::Account => "account",
			AuthMethod::Passkey => "passkey",
			AuthMethod::Password => "password",
			AuthMethod::TwoFactorAuth => "two_factor_auth",
			AuthMethod::ExternalTwoFactorAuth => "external_two_factor_auth",
			AuthMethod::ExplicitNone => "explicit_none",
		};
		write!(f, "{s}")
	}
}

impl std::str::FromStr for AuthMethod {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"account" => Ok(AuthMethod::Account),
			"passkey" => Ok(AuthMethod::Passkey),
			"password" => Ok(AuthMethod::Password),
			"two_factor_auth" => Ok(AuthMethod::TwoFactorAuth),
			"external_two_factor_auth" => Ok(AuthMethod::ExternalTwoFactorAuth),
			"explicit_none" => Ok(AuthMethod::ExplicitNone),
			other => Err(format!("unknown auth method: {other}")),
		}
	}
}

/// Sub-channel for [`AuthMethod::TwoFactorAuth`].
///
/// A recipient without an enrolled authenticator app must use the email
/// channel; that is a precondition checked by the challenge executor, not a
/// silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwoFactorChannel {
	/// Time-based code from the account's enrolled authenticator app.
	AuthenticatorApp,
	/// One-time code delivered to the recipient email.
	EmailCode,
}

impl fmt::Display for TwoFactorChannel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TwoFactorChannel::AuthenticatorApp => write!(f, "authenticator_app"),
			TwoFactorChannel::EmailCode => write!(f, "email_code"),
		}
	}
}

/// A pair of requirement sets: one gating viewing, one gating binding actions.
///
/// An empty set means "inherit" on a recipient and "no requirement configured"
/// on an envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthOptions {
	/// Methods accepted to open/view the envelope.
	#[serde(default)]
	pub access: BTreeSet<AuthMethod>,
	/// Methods accepted to complete a binding action (sign/approve).
	#[serde(default)]
	pub action: BTreeSet<AuthMethod>,
}

impl AuthOptions {
	/// Build from iterators, useful in tests and constructors.
	pub fn new<A, B>(access: A, action: B) -> Self
	where
		A: IntoIterator<Item = AuthMethod>,
		B: IntoIterator<Item = AuthMethod>,
	{
		Self {
			access: access.into_iter().collect(),
			action: action.into_iter().collect(),
		}
	}

	/// True when neither gate carries any requirement.
	pub fn is_empty(&self) -> bool {
		self.access.is_empty() && self.action.is_empty()
	}

	/// Resolve the effective requirements for one recipient.
	///
	/// `defaults` are the envelope-wide sets; `overrides` the recipient's.
	/// Each gate is resolved independently: a non-empty override wins, an
	/// empty one inherits, and an empty result collapses to `ExplicitNone`.
	pub fn resolve(defaults: &AuthOptions, overrides: &AuthOptions) -> ResolvedAuth {
		ResolvedAuth {
			access: resolve_gate(&defaults.access, &overrides.access),
			action: resolve_gate(&defaults.action, &overrides.action),
		}
	}
}

fn resolve_gate(default: &BTreeSet<AuthMethod>, overrides: &BTreeSet<AuthMethod>) -> BTreeSet<AuthMethod> {
	let layer = if !overrides.is_empty() {
		overrides
	} else {
		default
	};

	let mut effective: BTreeSet<AuthMethod> = layer.clone();
	// Tolerate ExplicitNone stored alongside real methods: the real methods win.
	if effective.len() > 1 {
		effective.remove(&AuthMethod::ExplicitNone);
	}
	if effective.is_empty() {
		effective.insert(AuthMethod::ExplicitNone);
	}
	effective
}

/// The effective, fully-resolved requirements for one recipient.
///
/// Both sets are guaranteed non-empty and never mix `ExplicitNone` with other
/// methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAuth {
	pub access: BTreeSet<AuthMethod>,
	pub action: BTreeSet<AuthMethod>,
}

impl ResolvedAuth {
	/// True when no authentication is required to view the envelope.
	pub fn access_is_open(&self) -> bool {
		self.access.contains(&AuthMethod::ExplicitNone)
	}

	/// Whether action auth applies to this recipient at all.
	///
	/// Viewer and CC recipients take no binding action, so the action gate is
	/// never enforced for them regardless of configuration.
	pub fn action_required_for(&self, role: RecipientRole) -> bool {
		if matches!(role, RecipientRole::Viewer | RecipientRole::Cc) {
			return false;
		}
		!self.action.contains(&AuthMethod::ExplicitNone)
	}

	/// The methods a caller must offer for the action gate, empty when open.
	pub fn required_action_methods(&self, role: RecipientRole) -> Vec<AuthMethod> {
		if !self.action_required_for(role) {
			return Vec::new();
		}
		self.action.iter().copied().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn set(methods: &[AuthMethod]) -> BTreeSet<AuthMethod> {
		methods.iter().copied().collect()
	}

	#[test]
	fn test_empty_layers_resolve_to_explicit_none() {
		let resolved = AuthOptions::resolve(&AuthOptions::default(), &AuthOptions::default());
		assert_eq!(resolved.access, set(&[AuthMethod::ExplicitNone]));
		assert_eq!(resolved.action, set(&[AuthMethod::ExplicitNone]));
		assert!(resolved.access_is_open());
	}

	#[test]
	fn test_override_replaces_default_entirely() {
		// Scenario D: override {Password} vs default {TwoFactorAuth}.
		let defaults = AuthOptions::new([], [AuthMethod::TwoFactorAuth]);
		let overrides = AuthOptions::new([], [AuthMethod::Password]);
		let resolved = AuthOptions::resolve(&defaults, &overrides);
		assert_eq!(resolved.action, set(&[AuthMethod::Password]));
	}

	#[test]
	fn test_empty_override_inherits_default() {
		let defaults = AuthOptions::new([AuthMethod::Account], [AuthMethod::Passkey]);
		let resolved = AuthOptions::resolve(&defaults, &AuthOptions::default());
		assert_eq!(resolved.access, set(&[AuthMethod::Account]));
		assert_eq!(resolved.action, set(&[AuthMethod::Passkey]));
	}

	#[test]
	fn test_explicit_none_dropped_when_mixed() {
		let defaults = AuthOptions::new(
			[AuthMethod::ExplicitNone, AuthMethod::Password],
			[],
		);
		let resolved = AuthOptions::resolve(&defaults, &AuthOptions::default());
		assert_eq!(resolved.access, set(&[AuthMethod::Password]));
	}

	#[test]
	fn test_explicit_none_alone_is_preserved() {
		let defaults = AuthOptions::new([AuthMethod::ExplicitNone], []);
		let resolved = AuthOptions::resolve(&defaults, &AuthOptions::default());
		assert_eq!(resolved.access, set(&[AuthMethod::ExplicitNone]));
	}

	#[test]
	fn test_action_gate_skipped_for_viewer_and_cc() {
		let defaults = AuthOptions::new([], [AuthMethod::Password]);
		let resolved = AuthOptions::resolve(&defaults, &AuthOptions::default());
		assert!(resolved.action_required_for(RecipientRole::Signer));
		assert!(resolved.action_required_for(RecipientRole::Approver));
		assert!(!resolved.action_required_for(RecipientRole::Viewer));
		assert!(!resolved.action_required_for(RecipientRole::Cc));
		assert!(resolved.required_action_methods(RecipientRole::Cc).is_empty());
	}

	#[test]
	fn test_auth_method_parse_roundtrip() {
		for method in AuthMethod::all() {
			let parsed: AuthMethod = method.to_string().parse().unwrap();
			assert_eq!(parsed, *method);
		}
	}

	fn arb_method() -> impl Strategy<Value = AuthMethod> {
		prop::sample::select(AuthMethod::all().to_vec())
	}

	fn arb_options() -> impl Strategy<Value = AuthOptions> {
		(
			prop::collection::btree_set(arb_method(), 0..4),
			prop::collection::btree_set(arb_method(), 0..4),
		)
			.prop_map(|(access, action)| AuthOptions { access, action })
	}

	proptest! {
		// Inheritance transparency: an empty override behaves exactly like an
		// override equal to the document default.
		#[test]
		fn prop_inheritance_is_transparent(defaults in arb_options()) {
			let inherited = AuthOptions::resolve(&defaults, &AuthOptions::default());
			let explicit = AuthOptions::resolve(&defaults, &defaults);
			prop_assert_eq!(inherited, explicit);
		}

		// Resolution never produces an empty gate nor mixes ExplicitNone in.
		#[test]
		fn prop_resolved_gates_are_normalized(
			defaults in arb_options(),
			overrides in arb_options(),
		) {
			let resolved = AuthOptions::resolve(&defaults, &overrides);
			for gate in [&resolved.access, &resolved.action] {
				prop_assert!(!gate.is_empty());
				if gate.len() > 1 {
					prop_assert!(!gate.contains(&AuthMethod::ExplicitNone));
				}
			}
		}
	}
}
