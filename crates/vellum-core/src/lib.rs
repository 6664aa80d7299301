// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core domain model for the Vellum signing workflow engine.
//!
//! This crate is pure: no I/O, no async, no storage. It provides:
//!
//! - [`types`]: ID newtypes and the role/status/policy enums
//! - [`auth_options`]: authentication requirement model and resolver
//! - [`envelope`], [`recipient`], [`field`]: the signable entities
//! - [`schedule`]: the signing-order scheduler

pub mod auth_options;
pub mod envelope;
pub mod field;
pub mod recipient;
pub mod schedule;
pub mod types;

pub use auth_options::{AuthMethod, AuthOptions, ResolvedAuth, TwoFactorChannel};
pub use envelope::{Envelope, EnvelopeKind, EnvelopeStatus, SigningOrderPolicy};
pub use field::{Field, FieldMeta, FieldType};
pub use recipient::{Recipient, RecipientRole, SendStatus, SigningStatus};
pub use schedule::{blocked, next_eligible, ScheduleState};
pub use types::{AccountId, EnvelopeId, FieldId, RecipientId};
