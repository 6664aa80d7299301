// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed configuration sections, each loadable from `VELLUM_SERVER_*`
//! environment variables.

use crate::error::ConfigError;

fn env_var(name: &str) -> Result<Option<String>, ConfigError> {
	match std::env::var(name) {
		Ok(v) if v.is_empty() => Ok(None),
		Ok(v) => Ok(Some(v)),
		Err(std::env::VarError::NotPresent) => Ok(None),
		Err(e) => Err(ConfigError::Configuration(format!(
			"Failed to read {name}: {e}"
		))),
	}
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
	T::Err: std::fmt::Display,
{
	match env_var(name)? {
		Some(v) => v
			.parse()
			.map_err(|e| ConfigError::Configuration(format!("Invalid {name}: {e}"))),
		None => Ok(default),
	}
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
	/// SQLite connection string.
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: "sqlite:./vellum.db".to_string(),
		}
	}
}

impl DatabaseConfig {
	/// Environment variables:
	/// - `VELLUM_SERVER_DATABASE_URL` - SQLite connection string
	pub fn from_env() -> Result<Self, ConfigError> {
		Ok(Self {
			url: env_var("VELLUM_SERVER_DATABASE_URL")?
				.unwrap_or_else(|| DatabaseConfig::default().url),
		})
	}
}

/// Challenge executor settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Lifetime of one-time email codes, in seconds.
	pub email_code_expiry_secs: i64,
	/// Maximum verification attempts per issued email code.
	pub email_code_max_attempts: i64,
	/// Maximum verification attempts per sender-issued external code.
	pub external_code_max_attempts: i64,
	/// Timeout applied to identity/credential collaborator calls, in seconds.
	pub provider_timeout_secs: u64,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			email_code_expiry_secs: 600,
			email_code_max_attempts: 3,
			external_code_max_attempts: 3,
			provider_timeout_secs: 10,
		}
	}
}

impl AuthConfig {
	/// Environment variables:
	/// - `VELLUM_SERVER_AUTH_EMAIL_CODE_EXPIRY_SECS` (default: 600)
	/// - `VELLUM_SERVER_AUTH_EMAIL_CODE_MAX_ATTEMPTS` (default: 3)
	/// - `VELLUM_SERVER_AUTH_EXTERNAL_CODE_MAX_ATTEMPTS` (default: 3)
	/// - `VELLUM_SERVER_AUTH_PROVIDER_TIMEOUT_SECS` (default: 10)
	pub fn from_env() -> Result<Self, ConfigError> {
		let defaults = AuthConfig::default();
		let config = Self {
			email_code_expiry_secs: env_parse(
				"VELLUM_SERVER_AUTH_EMAIL_CODE_EXPIRY_SECS",
				defaults.email_code_expiry_secs,
			)?,
			email_code_max_attempts: env_parse(
				"VELLUM_SERVER_AUTH_EMAIL_CODE_MAX_ATTEMPTS",
				defaults.email_code_max_attempts,
			)?,
			external_code_max_attempts: env_parse(
				"VELLUM_SERVER_AUTH_EXTERNAL_CODE_MAX_ATTEMPTS",
				defaults.external_code_max_attempts,
			)?,
			provider_timeout_secs: env_parse(
				"VELLUM_SERVER_AUTH_PROVIDER_TIMEOUT_SECS",
				defaults.provider_timeout_secs,
			)?,
		};
		if config.email_code_max_attempts < 1 || config.external_code_max_attempts < 1 {
			return Err(ConfigError::Configuration(
				"code attempt limits must be at least 1".to_string(),
			));
		}
		Ok(config)
	}
}

/// Outbound webhook settings. Absent when no endpoint is configured.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
	/// Delivery endpoint URL.
	pub endpoint: String,
	/// Shared secret for HMAC signatures.
	pub secret: String,
	/// Receiver-side replay tolerance communicated in docs, in seconds.
	pub tolerance_secs: i64,
}

impl WebhookConfig {
	/// Environment variables:
	/// - `VELLUM_SERVER_WEBHOOK_ENDPOINT` - endpoint URL (section absent if unset)
	/// - `VELLUM_SERVER_WEBHOOK_SECRET` - required when the endpoint is set
	/// - `VELLUM_SERVER_WEBHOOK_TOLERANCE_SECS` (default: 300)
	pub fn from_env() -> Result<Option<Self>, ConfigError> {
		let Some(endpoint) = env_var("VELLUM_SERVER_WEBHOOK_ENDPOINT")? else {
			return Ok(None);
		};
		let secret = env_var("VELLUM_SERVER_WEBHOOK_SECRET")?.ok_or_else(|| {
			ConfigError::Configuration(
				"VELLUM_SERVER_WEBHOOK_SECRET is required when VELLUM_SERVER_WEBHOOK_ENDPOINT is set"
					.to_string(),
			)
		})?;
		Ok(Some(Self {
			endpoint,
			secret,
			tolerance_secs: env_parse("VELLUM_SERVER_WEBHOOK_TOLERANCE_SECS", 300)?,
		}))
	}
}

/// Post-commit event pipeline settings.
#[derive(Debug, Clone)]
pub struct EventsConfig {
	/// Capacity of the in-process event queue.
	pub queue_capacity: usize,
	/// Maximum delivery attempts per webhook event.
	pub max_delivery_attempts: u32,
}

impl Default for EventsConfig {
	fn default() -> Self {
		Self {
			queue_capacity: 1024,
			max_delivery_attempts: 3,
		}
	}
}

impl EventsConfig {
	/// Environment variables:
	/// - `VELLUM_SERVER_EVENTS_QUEUE_CAPACITY` (default: 1024)
	/// - `VELLUM_SERVER_EVENTS_MAX_DELIVERY_ATTEMPTS` (default: 3)
	pub fn from_env() -> Result<Self, ConfigError> {
		let defaults = EventsConfig::default();
		Ok(Self {
			queue_capacity: env_parse(
				"VELLUM_SERVER_EVENTS_QUEUE_CAPACITY",
				defaults.queue_capacity,
			)?,
			max_delivery_attempts: env_parse(
				"VELLUM_SERVER_EVENTS_MAX_DELIVERY_ATTEMPTS",
				defaults.max_delivery_attempts,
			)?,
		})
	}
}
