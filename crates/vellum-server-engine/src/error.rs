// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workflow engine error taxonomy.

use vellum_core::auth_options::AuthMethod;
use vellum_server_auth::{AuthError, AuthFailure};
use vellum_server_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
	/// A precondition on the request itself failed.
	#[error("Validation error: {0}")]
	Validation(String),

	/// The action gate is closed; the recipient must first pass one of
	/// these methods.
	#[error("Authentication required")]
	AuthRequired(Vec<AuthMethod>),

	/// A challenge ran and did not pass.
	#[error("Authentication failed: {0}")]
	AuthFailed(AuthFailure),

	/// The entity is in a state that forbids this operation; the message
	/// names that state.
	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Internal error: {0}")]
	Internal(String),
}

impl From<DbError> for EngineError {
	fn from(e: DbError) -> Self {
		match e {
			DbError::NotFound(what) => EngineError::NotFound(what),
			DbError::Conflict(what) => EngineError::Conflict(what),
			other => EngineError::Internal(other.to_string()),
		}
	}
}

impl From<AuthError> for EngineError {
	fn from(e: AuthError) -> Self {
		match e {
			AuthError::Failure(f) => EngineError::AuthFailed(f),
			AuthError::Storage(db) => db.into(),
		}
	}
}

impl From<sqlx::Error> for EngineError {
	fn from(e: sqlx::Error) -> Self {
		DbError::from(e).into()
	}
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_db_errors_keep_their_shape() {
		let e: EngineError = DbError::NotFound("envelope x".to_string()).into();
		assert!(matches!(e, EngineError::NotFound(_)));

		let e: EngineError = DbError::Conflict("already signed".to_string()).into();
		assert!(matches!(e, EngineError::Conflict(_)));

		let e: EngineError = DbError::Internal("boom".to_string()).into();
		assert!(matches!(e, EngineError::Internal(_)));
	}

	#[test]
	fn test_auth_failure_carries_through() {
		let e: EngineError = AuthError::Failure(AuthFailure::AttemptLimitReached).into();
		assert!(matches!(
			e,
			EngineError::AuthFailed(AuthFailure::AttemptLimitReached)
		));
	}
}
