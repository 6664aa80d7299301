// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Signing-order scheduler.
//!
//! Pure recomputation over the recipient list: callers re-run it after every
//! transition and gate notification side effects on `send_status`, so a
//! recomputation after a no-op never re-notifies anyone.

use crate::envelope::SigningOrderPolicy;
use crate::recipient::{Recipient, RecipientRole, SigningStatus};
use crate::types::RecipientId;

/// Result of evaluating the signing order for an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleState {
	/// These recipients may act (and be notified) now.
	Eligible(Vec<RecipientId>),
	/// Every action-taking recipient has signed; the envelope can be sealed.
	ReadyToFinalize,
}

impl ScheduleState {
	/// The eligible set, empty when ready to finalize.
	pub fn eligible(&self) -> &[RecipientId] {
		match self {
			ScheduleState::Eligible(ids) => ids,
			ScheduleState::ReadyToFinalize => &[],
		}
	}
}

/// Compute which recipients are currently eligible to act.
///
/// - Parallel: every non-CC recipient still holding a pending action.
/// - Sequential: recipients sorted by (`signing_order` ascending nulls last,
///   recipient id ascending as a stable tie-break); the first pending one is
///   the sole eligible recipient.
///
/// Returns [`ScheduleState::ReadyToFinalize`] when no pending action remains,
/// an explicit signal rather than a silently empty set.
pub fn next_eligible(policy: SigningOrderPolicy, recipients: &[Recipient]) -> ScheduleState {
	let mut pending: Vec<&Recipient> = recipients
		.iter()
		.filter(|r| r.role != RecipientRole::Cc && r.signing_status == SigningStatus::NotSigned)
		.collect();

	if pending.is_empty() {
		return ScheduleState::ReadyToFinalize;
	}

	match policy {
		SigningOrderPolicy::Parallel => {
			ScheduleState::Eligible(pending.iter().map(|r| r.id).collect())
		}
		SigningOrderPolicy::Sequential => {
			pending.sort_by(|a, b| sequence_key(a).cmp(&sequence_key(b)));
			ScheduleState::Eligible(vec![pending[0].id])
		}
	}
}

/// Recipients waiting behind the currently eligible one(s).
///
/// Empty under the parallel policy: nobody blocks anybody.
pub fn blocked(policy: SigningOrderPolicy, recipients: &[Recipient]) -> Vec<RecipientId> {
	match next_eligible(policy, recipients) {
		ScheduleState::ReadyToFinalize => Vec::new(),
		ScheduleState::Eligible(eligible) => recipients
			.iter()
			.filter(|r| {
				r.role != RecipientRole::Cc
					&& r.signing_status == SigningStatus::NotSigned
					&& !eligible.contains(&r.id)
			})
			.map(|r| r.id)
			.collect(),
	}
}

/// Sort key for the sequential policy: `None` ranks sort last, recipient id
/// breaks ties deterministically.
fn sequence_key(r: &Recipient) -> (bool, i64, RecipientId) {
	(r.signing_order.is_none(), r.signing_order.unwrap_or(0), r.id)
}
