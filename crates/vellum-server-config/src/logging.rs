// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracing subscriber setup for the server process.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`; falls back to `info` for the workspace crates when
/// unset. Safe to call once per process; subsequent calls are ignored.
pub fn init_tracing() {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

	let _ = fmt()
		.with_env_filter(filter)
		.with_target(true)
		.try_init();
}
