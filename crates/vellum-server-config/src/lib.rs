// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Vellum server.
//!
//! This crate provides:
//! - Type-safe configuration sections with validation
//! - Consistent environment variable naming (`VELLUM_SERVER_*`)
//! - Tracing subscriber initialization for the server process

pub mod error;
pub mod logging;
pub mod sections;

pub use error::ConfigError;
pub use logging::init_tracing;
pub use sections::{AuthConfig, DatabaseConfig, EventsConfig, WebhookConfig};

use tracing::debug;

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub auth: AuthConfig,
	pub webhook: Option<WebhookConfig>,
	pub events: EventsConfig,
}

/// Load configuration from the environment.
///
/// # Errors
/// Returns [`ConfigError::Configuration`] when a variable is present but
/// malformed. Absent optional sections (webhook) resolve to `None`.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	let config = ServerConfig {
		database: DatabaseConfig::from_env()?,
		auth: AuthConfig::from_env()?,
		webhook: WebhookConfig::from_env()?,
		events: EventsConfig::from_env()?,
	};
	debug!(
		webhook_configured = config.webhook.is_some(),
		"server configuration loaded"
	);
	Ok(config)
}
