// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sealing hook: invoked after an envelope reaches Completed.
//!
//! Sealing (rendering the final artifact, certificates) runs outside the
//! engine. The engine only triggers it post-commit; a sealing fault never
//! rolls back the completion.

use async_trait::async_trait;

use vellum_core::types::EnvelopeId;

#[async_trait]
pub trait SealingJob: Send + Sync {
	/// Enqueue sealing for a completed envelope.
	async fn enqueue(&self, envelope_id: &EnvelopeId) -> Result<(), String>;
}

/// Sealer that only records to the log. Used when no sealing worker is
/// configured and as the test default.
pub struct TracingSealer;

#[async_trait]
impl SealingJob for TracingSealer {
	async fn enqueue(&self, envelope_id: &EnvelopeId) -> Result<(), String> {
		tracing::info!(envelope_id = %envelope_id, "sealing enqueued");
		Ok(())
	}
}
