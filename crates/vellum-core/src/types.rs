// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions shared across the workflow engine.
//!
//! ID newtypes are type-safe wrappers around UUIDs ([`EnvelopeId`],
//! [`RecipientId`], [`FieldId`], [`AccountId`]) preventing accidental mixing.
//! All of them implement transparent serde serialization (as UUID strings)
//! and conversion to/from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}

		impl std::str::FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Ok(Self(Uuid::parse_str(s)?))
			}
		}
	};
}

define_id_type!(EnvelopeId, "Unique identifier for an envelope.");
define_id_type!(RecipientId, "Unique identifier for a recipient.");
define_id_type!(FieldId, "Unique identifier for a field.");
define_id_type!(AccountId, "Unique identifier for an owning account.");

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_id_roundtrip_through_uuid() {
		let id = EnvelopeId::generate();
		let uuid: Uuid = id.into();
		assert_eq!(EnvelopeId::from(uuid), id);
	}

	#[test]
	fn test_id_display_matches_uuid() {
		let uuid = Uuid::new_v4();
		let id = RecipientId::new(uuid);
		assert_eq!(id.to_string(), uuid.to_string());
	}

	#[test]
	fn test_id_parse_from_str() {
		let id = FieldId::generate();
		let parsed: FieldId = id.to_string().parse().unwrap();
		assert_eq!(parsed, id);
	}

	#[test]
	fn test_id_serde_transparent() {
		let id = AccountId::generate();
		let json = serde_json::to_string(&id).unwrap();
		assert_eq!(json, format!("\"{id}\""));
	}
}
