// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Exponential backoff for webhook delivery retries.

use std::time::Duration;

const BASE_RETRY_DELAY_SECS: u64 = 1;
const MAX_RETRY_DELAY_SECS: u64 = 60;
const RETRY_FACTOR: f64 = 2.0;

/// Backoff delay in seconds before retry `retry_count` (1-based).
pub(crate) fn calculate_backoff_delay(retry_count: u32) -> u64 {
	let delay = BASE_RETRY_DELAY_SECS as f64 * RETRY_FACTOR.powi(retry_count as i32 - 1);
	(delay as u64).min(MAX_RETRY_DELAY_SECS)
}

/// Backoff with up to 250ms of jitter so retries from concurrent deliveries
/// do not land on the receiver in lockstep.
pub(crate) fn retry_delay(retry_count: u32) -> Duration {
	let secs = calculate_backoff_delay(retry_count);
	Duration::from_millis(secs * 1000 + fastrand::u64(0..250))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_calculate_backoff_delay_retry_1() {
		assert_eq!(calculate_backoff_delay(1), BASE_RETRY_DELAY_SECS);
	}

	#[test]
	fn test_calculate_backoff_delay_doubles() {
		assert_eq!(calculate_backoff_delay(2), 2);
		assert_eq!(calculate_backoff_delay(3), 4);
	}

	#[test]
	fn test_calculate_backoff_delay_caps_at_max() {
		assert_eq!(calculate_backoff_delay(10), MAX_RETRY_DELAY_SECS);
		assert_eq!(calculate_backoff_delay(100), MAX_RETRY_DELAY_SECS);
	}

	#[test]
	fn test_retry_delay_jitter_bounds() {
		for _ in 0..100 {
			let d = retry_delay(1);
			assert!(d >= Duration::from_secs(1));
			assert!(d < Duration::from_millis(1250));
		}
	}
}
