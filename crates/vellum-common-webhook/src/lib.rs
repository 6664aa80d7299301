// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HMAC-SHA256 webhook signature utilities.
//!
//! Outbound envelope events are signed with a timestamped scheme so
//! receivers can reject replays: the signed material is
//! `"{timestamp}.{payload}"` and the header value is
//! `t=<unix_ts>,v1=<hex signature>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature on outbound webhook deliveries.
pub const SIGNATURE_HEADER: &str = "x-vellum-signature";

/// Compute an HMAC-SHA256 signature for a payload.
///
/// Returns the hex-encoded signature without any prefix.
pub fn compute_hmac_sha256(secret: &[u8], payload: &[u8]) -> String {
	let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
	mac.update(payload);
	let result = mac.finalize();
	hex::encode(result.into_bytes())
}

/// Verify an HMAC-SHA256 signature for a payload.
///
/// The `signature` should be the raw hex-encoded signature (no prefix).
pub fn verify_hmac_sha256(secret: &[u8], payload: &[u8], signature: &str) -> bool {
	let expected_bytes = match hex::decode(signature) {
		Ok(bytes) => bytes,
		Err(_) => return false,
	};

	let mut mac = match HmacSha256::new_from_slice(secret) {
		Ok(m) => m,
		Err(_) => return false,
	};

	mac.update(payload);
	mac.verify_slice(&expected_bytes).is_ok()
}

/// Build the `t=...,v1=...` signature header value for a delivery.
///
/// `timestamp` is seconds since the Unix epoch, supplied by the caller so
/// retries of the same delivery re-sign consistently.
pub fn sign_payload(secret: &[u8], timestamp: i64, payload: &[u8]) -> String {
	let mut signed = Vec::with_capacity(payload.len() + 24);
	signed.extend_from_slice(timestamp.to_string().as_bytes());
	signed.push(b'.');
	signed.extend_from_slice(payload);
	format!("t={timestamp},v1={}", compute_hmac_sha256(secret, &signed))
}

/// Verify a `t=...,v1=...` header against a payload.
///
/// `now` and `tolerance_secs` bound the replay window; deliveries whose
/// timestamp falls outside it are rejected even with a valid signature.
pub fn verify_signature_header(
	secret: &[u8],
	header: &str,
	payload: &[u8],
	now: i64,
	tolerance_secs: i64,
) -> bool {
	let mut timestamp: Option<i64> = None;
	let mut signature: Option<&str> = None;

	for part in header.split(',') {
		match part.split_once('=') {
			Some(("t", value)) => timestamp = value.parse().ok(),
			Some(("v1", value)) => signature = Some(value),
			_ => {}
		}
	}

	let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
		return false;
	};

	if (now - timestamp).abs() > tolerance_secs {
		return false;
	}

	let mut signed = Vec::with_capacity(payload.len() + 24);
	signed.extend_from_slice(timestamp.to_string().as_bytes());
	signed.push(b'.');
	signed.extend_from_slice(payload);
	verify_hmac_sha256(secret, &signed, signature)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_compute_hmac_sha256() {
		let secret = b"test-secret";
		let payload = b"test payload";
		let sig = compute_hmac_sha256(secret, payload);
		assert!(!sig.is_empty());
		assert_eq!(sig.len(), 64);
	}

	#[test]
	fn test_verify_hmac_sha256_valid() {
		let secret = b"test-secret";
		let payload = b"test payload";
		let sig = compute_hmac_sha256(secret, payload);
		assert!(verify_hmac_sha256(secret, payload, &sig));
	}

	#[test]
	fn test_verify_hmac_sha256_invalid_hex() {
		assert!(!verify_hmac_sha256(b"s", b"p", "not-valid-hex"));
	}

	#[test]
	fn test_verify_hmac_sha256_wrong_secret() {
		let sig = compute_hmac_sha256(b"test-secret", b"payload");
		assert!(!verify_hmac_sha256(b"wrong-secret", b"payload", &sig));
	}

	#[test]
	fn test_signature_header_roundtrip() {
		let header = sign_payload(b"secret", 1_700_000_000, b"{\"event\":\"envelope.sent\"}");
		assert!(header.starts_with("t=1700000000,v1="));
		assert!(verify_signature_header(
			b"secret",
			&header,
			b"{\"event\":\"envelope.sent\"}",
			1_700_000_030,
			300,
		));
	}

	#[test]
	fn test_signature_header_rejects_stale_timestamp() {
		let header = sign_payload(b"secret", 1_700_000_000, b"payload");
		assert!(!verify_signature_header(
			b"secret",
			&header,
			b"payload",
			1_700_000_000 + 600,
			300,
		));
	}

	#[test]
	fn test_signature_header_rejects_tampered_payload() {
		let header = sign_payload(b"secret", 1_700_000_000, b"payload");
		assert!(!verify_signature_header(
			b"secret",
			&header,
			b"payload2",
			1_700_000_000,
			300,
		));
	}

	#[test]
	fn test_signature_header_rejects_malformed_header() {
		assert!(!verify_signature_header(b"s", "v1=abc", b"p", 0, 300));
		assert!(!verify_signature_header(b"s", "t=12", b"p", 0, 300));
		assert!(!verify_signature_header(b"s", "", b"p", 0, 300));
	}

	proptest! {
		#[test]
		fn prop_sign_verify_roundtrip(
			secret in prop::collection::vec(any::<u8>(), 1..64),
			payload in prop::collection::vec(any::<u8>(), 0..512),
			timestamp in 0i64..4_000_000_000,
		) {
			let header = sign_payload(&secret, timestamp, &payload);
			prop_assert!(verify_signature_header(&secret, &header, &payload, timestamp, 300));
		}
	}
}
