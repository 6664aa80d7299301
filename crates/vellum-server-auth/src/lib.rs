// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Recipient authentication for the Vellum workflow engine.
//!
//! The [`ChallengeExecutor`] validates a submitted proof against one required
//! [`AuthMethod`](vellum_core::AuthMethod), producing either an
//! [`ActionAuthProof`] or a typed [`AuthFailure`] the caller can map to a
//! retryable or terminal message. Credential and identity verification is
//! delegated to injected collaborator traits ([`providers`]).

pub mod challenge;
pub mod error;
pub mod password;
pub mod providers;
pub mod testing;

pub use challenge::{ActionAuthProof, ChallengeContext, ChallengeExecutor, SubmittedProof};
pub use error::{AuthError, AuthFailure};
pub use providers::{CodeMailer, OwnerDirectory, PasskeyVerifier, ProviderError, TotpVerifier};
