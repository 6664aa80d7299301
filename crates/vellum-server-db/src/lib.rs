// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database layer for the Vellum server.
//!
//! SQLite via sqlx. Repositories expose pool-based reads; mutations used by
//! the workflow engine are free functions over `&mut SqliteConnection` so
//! they compose into a single transaction (envelope status, recipient
//! status, field auto-insert, and audit entries commit or roll back
//! together).

pub mod audit;
pub mod envelope;
pub mod error;
pub mod field;
pub mod pool;
pub mod recipient;
pub mod schema;
pub mod testing;
pub mod two_factor;

pub use audit::AuditRepository;
pub use envelope::{EnvelopeRepository, EnvelopeStore};
pub use error::{DbError, Result};
pub use field::FieldRepository;
pub use pool::create_pool;
pub use recipient::{RecipientRepository, RecipientStore};
pub use schema::ensure_schema;
pub use two_factor::{hash_code, ChallengeCode, CodeVerdict, TwoFactorRepository};
