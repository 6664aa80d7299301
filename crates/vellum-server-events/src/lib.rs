// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Post-commit event pipeline for the Vellum workflow engine.
//!
//! Lifecycle events ([`EnvelopeEvent`]) are published to a bounded in-process
//! queue after the owning transaction commits, then fanned out to sinks
//! (signed webhooks via [`WebhookSink`]). Recipient-facing notices go
//! through [`RecipientNotifier`] directly. Neither path can fail or delay a
//! request: delivery faults are retried with backoff and otherwise dropped
//! with a warning.

mod backoff;

pub mod error;
pub mod event;
pub mod notify;
pub mod pipeline;
pub mod sink;

pub use error::{EventError, SinkError};
pub use event::{EnvelopeEvent, EnvelopeSnapshot, EventKind, RecipientSummary};
pub use notify::{NoticeKind, RecipientNotice, RecipientNotifier, TracingNotifier};
pub use pipeline::EventPipeline;
pub use sink::{EventSink, WebhookSink};
