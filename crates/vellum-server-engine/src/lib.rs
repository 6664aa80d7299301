// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Envelope workflow engine for Vellum.
//!
//! [`WorkflowEngine`] drives the envelope state machine: [`send`], signing
//! via [`complete_action`], [`reject`], draft authoring, and the read-only
//! auth/scheduler surfaces. State transitions commit transactionally with
//! their audit entries; recipient notifications, webhook events, and sealing
//! dispatch only after commit.
//!
//! [`send`]: WorkflowEngine::send
//! [`complete_action`]: WorkflowEngine::complete_action
//! [`reject`]: WorkflowEngine::reject

pub mod authoring;
pub mod engine;
pub mod error;
pub mod seal;

pub use authoring::{EnvelopeDraft, FieldDraft, RecipientDraft};
pub use engine::{SchedulerView, WorkflowEngine, WorkflowOutcome};
pub use error::{EngineError, Result};
pub use seal::{SealingJob, TracingSealer};
