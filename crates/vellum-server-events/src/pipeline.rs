// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process event pipeline: a bounded queue feeding sink fan-out.
//!
//! Publication never blocks the committing request path. A full queue drops
//! the newest event with a warning; delivery faults are retried per sink
//! with exponential backoff and never propagate back to the caller.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{instrument, warn};

use vellum_server_config::EventsConfig;

use crate::backoff::retry_delay;
use crate::event::EnvelopeEvent;
use crate::sink::EventSink;

pub struct EventPipeline {
	tx: mpsc::Sender<EnvelopeEvent>,
	max_delivery_attempts: u32,
}

impl EventPipeline {
	pub fn new(config: &EventsConfig, sinks: Vec<Arc<dyn EventSink>>) -> Self {
		let (tx, rx) = mpsc::channel(config.queue_capacity);
		let max_delivery_attempts = config.max_delivery_attempts.max(1);

		tokio::spawn(Self::background_task(rx, sinks, max_delivery_attempts));

		Self {
			tx,
			max_delivery_attempts,
		}
	}

	async fn background_task(
		mut rx: mpsc::Receiver<EnvelopeEvent>,
		sinks: Vec<Arc<dyn EventSink>>,
		max_attempts: u32,
	) {
		while let Some(event) = rx.recv().await {
			let event = Arc::new(event);

			for sink in &sinks {
				let sink = Arc::clone(sink);
				let event = Arc::clone(&event);

				tokio::spawn(async move {
					deliver_with_retry(sink, event, max_attempts).await;
				});
			}
		}
	}

	/// Queue an event for delivery.
	///
	/// Returns `true` if the event was queued, `false` if dropped because
	/// the queue is full.
	#[instrument(skip(self, event), fields(event_id = %event.event_id, kind = %event.kind))]
	pub fn publish(&self, event: EnvelopeEvent) -> bool {
		let queued = self.tx.try_send(event).is_ok();
		if !queued {
			warn!("event queue full, dropping event");
		}
		queued
	}

	pub fn max_delivery_attempts(&self) -> u32 {
		self.max_delivery_attempts
	}
}

async fn deliver_with_retry(sink: Arc<dyn EventSink>, event: Arc<EnvelopeEvent>, max_attempts: u32) {
	for attempt in 1..=max_attempts {
		match sink.deliver(Arc::clone(&event)).await {
			Ok(()) => return,
			Err(e) if e.is_transient() && attempt < max_attempts => {
				let delay = retry_delay(attempt);
				warn!(
					sink = sink.name(),
					event_id = %event.event_id,
					attempt,
					delay_ms = delay.as_millis() as u64,
					error = %e,
					"event delivery failed, retrying"
				);
				tokio::time::sleep(delay).await;
			}
			Err(e) => {
				warn!(
					sink = sink.name(),
					event_id = %event.event_id,
					attempt,
					error = %e,
					"event delivery abandoned"
				);
				return;
			}
		}
	}
}
