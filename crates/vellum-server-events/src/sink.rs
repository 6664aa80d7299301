// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event sinks: where the pipeline fans committed events out to.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use vellum_common_webhook::{sign_payload, SIGNATURE_HEADER};
use vellum_server_config::WebhookConfig;

use crate::error::SinkError;
use crate::event::EnvelopeEvent;

/// A destination for committed envelope events.
#[async_trait]
pub trait EventSink: Send + Sync {
	fn name(&self) -> &str;

	/// Deliver one event. A `Transient` error gets the pipeline's retry
	/// budget; a `Permanent` error is dropped after one attempt.
	async fn deliver(&self, event: Arc<EnvelopeEvent>) -> Result<(), SinkError>;
}

/// Signed HTTP delivery to the configured webhook endpoint.
pub struct WebhookSink {
	client: reqwest::Client,
	config: WebhookConfig,
}

impl WebhookSink {
	pub fn new(config: WebhookConfig) -> Result<Self, SinkError> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(30))
			.build()
			.map_err(|e| SinkError::Permanent(format!("http client: {e}")))?;
		Ok(Self { client, config })
	}
}

#[async_trait]
impl EventSink for WebhookSink {
	fn name(&self) -> &str {
		"webhook"
	}

	async fn deliver(&self, event: Arc<EnvelopeEvent>) -> Result<(), SinkError> {
		let payload = serde_json::to_vec(event.as_ref())
			.map_err(|e| SinkError::Permanent(format!("serialize event: {e}")))?;
		let signature = sign_payload(
			self.config.secret.as_bytes(),
			Utc::now().timestamp(),
			&payload,
		);

		let response = self
			.client
			.post(&self.config.endpoint)
			.header("content-type", "application/json")
			.header(SIGNATURE_HEADER, signature)
			.body(payload)
			.send()
			.await
			.map_err(|e| SinkError::Transient(format!("request failed: {e}")))?;

		let status = response.status();
		if status.is_success() {
			tracing::debug!(event_id = %event.event_id, kind = %event.kind, "webhook delivered");
			Ok(())
		} else if status.is_client_error() {
			// The receiver rejected the payload; retrying the same bytes
			// cannot succeed.
			Err(SinkError::Permanent(format!("endpoint returned {status}")))
		} else {
			Err(SinkError::Transient(format!("endpoint returned {status}")))
		}
	}
}
