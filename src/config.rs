//! Defaults for outgoing REST requests, as set up once by the host application.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

const HOST: &str = "COMPOSER_HTTP_HOST";
const PORT: &str = "COMPOSER_HTTP_PORT";
const HTTPS: &str = "COMPOSER_HTTP_HTTPS";
const TIMEOUT_MS: &str = "COMPOSER_HTTP_TIMEOUT_MS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid HTTP defaults: {0}")]
	Json(#[from] serde_json::Error),

	#[error("invalid value '{value}' for {variable}")]
	Env { variable: &'static str, value: String },
}

/// Where and how data stores reach the REST API.
///
/// ```
/// use composer::config::HttpDefaults;
///
/// let defaults = HttpDefaults::from_json(r#"{ "host": "api.example.com", "https": true, "timeoutMs": 5000 }"#).unwrap();
/// assert_eq!(defaults.base_url(), "https://api.example.com");
/// assert_eq!(defaults.port, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpDefaults {
	pub host: String,
	pub port: Option<u16>,
	pub https: bool,
	pub timeout_ms: Option<u64>,
	/// Sent with every request, e.g. a CSRF token.
	pub headers: BTreeMap<String, String>,
}

impl Default for HttpDefaults {
	fn default() -> Self {
		Self {
			host: "localhost".to_owned(),
			port: None,
			https: false,
			timeout_ms: None,
			headers: BTreeMap::new(),
		}
	}
}

impl HttpDefaults {
	/// # Errors
	///
	/// Iff `json` isn't an object of the expected shape. Missing fields are defaulted.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Reads `COMPOSER_HTTP_HOST`, `COMPOSER_HTTP_PORT`, `COMPOSER_HTTP_HTTPS` and `COMPOSER_HTTP_TIMEOUT_MS`.
	///
	/// # Errors
	///
	/// Iff a variable is set but can't be parsed.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|variable| std::env::var(variable).ok())
	}

	/// Like [`HttpDefaults::from_env`], with a custom variable source.
	///
	/// # Errors
	///
	/// Iff a variable is set but can't be parsed.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let mut defaults = Self::default();
		if let Some(host) = lookup(HOST) {
			defaults.host = host;
		}
		if let Some(port) = lookup(PORT) {
			defaults.port = Some(parse(PORT, &port)?);
		}
		if let Some(https) = lookup(HTTPS) {
			defaults.https = match https.trim().to_ascii_lowercase().as_str() {
				"1" | "true" | "yes" => true,
				"0" | "false" | "no" | "" => false,
				_ => return Err(ConfigError::Env { variable: HTTPS, value: https }),
			};
		}
		if let Some(timeout) = lookup(TIMEOUT_MS) {
			defaults.timeout_ms = Some(parse(TIMEOUT_MS, &timeout)?);
		}
		debug!(host = %defaults.host, port = ?defaults.port, https = defaults.https, "Loaded HTTP defaults from environment.");
		Ok(defaults)
	}

	/// Scheme, host and port, without a trailing slash.
	#[must_use]
	pub fn base_url(&self) -> String {
		let scheme = if self.https { "https" } else { "http" };
		match self.port {
			Some(port) => format!("{}://{}:{}", scheme, self.host, port),
			None => format!("{}://{}", scheme, self.host),
		}
	}
}

fn parse<T: core::str::FromStr>(variable: &'static str, value: &str) -> Result<T, ConfigError> {
	value.trim().parse().map_err(|_| ConfigError::Env {
		variable,
		value: value.to_owned(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lookup_overrides_defaults() {
		let defaults = HttpDefaults::from_lookup(|variable| match variable {
			"COMPOSER_HTTP_PORT" => Some("8080".to_owned()),
			"COMPOSER_HTTP_HTTPS" => Some("TRUE".to_owned()),
			_ => None,
		})
		.unwrap();
		assert_eq!(defaults.base_url(), "https://localhost:8080");
		assert_eq!(defaults.timeout_ms, None);
	}

	#[test]
	fn bad_port_is_reported() {
		let error = HttpDefaults::from_lookup(|variable| (variable == "COMPOSER_HTTP_PORT").then(|| "eighty".to_owned())).unwrap_err();
		assert!(matches!(error, ConfigError::Env { variable: "COMPOSER_HTTP_PORT", .. }));
	}
}
