// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventError {
	#[error("event queue is at capacity")]
	QueueFull,

	#[error("sink '{sink}' error: {source}")]
	SinkError {
		sink: String,
		#[source]
		source: SinkError,
	},
}

/// Delivery failure from one sink. Transient failures are retried with
/// backoff; permanent failures are logged and dropped.
#[derive(Error, Debug)]
pub enum SinkError {
	#[error("transient error: {0}")]
	Transient(String),

	#[error("permanent error: {0}")]
	Permanent(String),
}

impl SinkError {
	pub fn is_transient(&self) -> bool {
		matches!(self, SinkError::Transient(_))
	}
}
