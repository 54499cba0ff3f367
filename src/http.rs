//! REST plumbing for data stores: request options, a pluggable transport and the per-thread default client.

use crate::config::HttpDefaults;
use core::{
	cell::RefCell,
	fmt::{self, Debug, Display, Formatter},
	time::Duration,
};
use futures::{future::LocalBoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
	Get,
	Post,
	Put,
	Delete,
}

impl Display for Method {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Delete => "DELETE",
		})
	}
}

/// How a request body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyType {
	#[default]
	MultipartFormData,
	Json,
	UrlEncoded,
}

/// Per-request options. Unset fields fall back to the client's [`HttpDefaults`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpOptions {
	/// Sent as `Authorization: Bearer <token>`.
	pub access_token: Option<String>,
	pub body: Option<Map<String, Value>>,
	pub body_type: Option<BodyType>,
	pub headers: Vec<(String, String)>,
	pub host: Option<String>,
	pub port: Option<u16>,
	pub https: Option<bool>,
	pub timeout: Option<Duration>,
}

/// A fully resolved request, as handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
	pub method: Method,
	/// The path the store asked for, e.g. `/posts/5/comments`.
	pub path: String,
	/// The absolute URL.
	pub url: String,
	pub access_token: Option<String>,
	pub body: Option<Map<String, Value>>,
	pub body_type: BodyType,
	pub headers: Vec<(String, String)>,
	pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
	pub status: u16,
	/// [`Value::Null`] for empty bodies.
	pub body: Value,
}

/// The structured error body of the REST API: `{ "feedback": { "current": { "code": …, "message": … } } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub feedback: Feedback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
	pub current: FeedbackEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
	/// Machine-readable, for the application layer to translate into a localized message.
	pub code: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpError {
	#[error("{method} {url} failed with status {status}")]
	Status {
		method: Method,
		url: String,
		status: u16,
		/// Present iff the response body had the structured error shape.
		response: Option<ErrorResponse>,
	},

	#[error("transport failed: {0}")]
	Transport(String),

	#[error("undecodable response body: {0}")]
	Body(String),
}

impl HttpError {
	/// The feedback code of a structured error response.
	#[must_use]
	pub fn feedback_code(&self) -> Option<i64> {
		match self {
			Self::Status { response: Some(response), .. } => Some(response.feedback.current.code),
			_ => None,
		}
	}
}

/// Sends resolved requests. Implemented by [`ReqwestTransport`] and by test doubles.
pub trait Transport {
	fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, HttpError>>;
}

/// A transport plus the defaults its requests are resolved against.
#[derive(Clone)]
pub struct Http {
	transport: Rc<dyn Transport>,
	defaults: HttpDefaults,
}

impl Debug for Http {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Http").field("defaults", &self.defaults).finish_non_exhaustive()
	}
}

thread_local! {
	static DEFAULT_CLIENT: RefCell<Option<Http>> = RefCell::new(None);
}

/// Installs the client used by every data store on this thread that doesn't carry its own.
pub fn set_default_client(client: Http) {
	debug!(?client, "Setting default HTTP client.");
	DEFAULT_CLIENT.with(|default| *default.borrow_mut() = Some(client));
}

#[must_use]
pub fn default_client() -> Option<Http> {
	DEFAULT_CLIENT.with(|default| default.borrow().clone())
}

impl Http {
	pub fn new(transport: impl Transport + 'static, defaults: HttpDefaults) -> Self {
		Self {
			transport: Rc::new(transport),
			defaults,
		}
	}

	#[must_use]
	pub fn defaults(&self) -> &HttpDefaults {
		&self.defaults
	}

	pub(crate) fn resolve(&self, method: Method, path: &str, options: HttpOptions) -> HttpRequest {
		let defaults = &self.defaults;
		let base = HttpDefaults {
			host: options.host.unwrap_or_else(|| defaults.host.clone()),
			port: options.port.or(defaults.port),
			https: options.https.unwrap_or(defaults.https),
			..HttpDefaults::default()
		};
		let url = format!("{}{}", base.base_url(), path);
		let mut headers: Vec<(String, String)> = defaults.headers.iter().map(|(name, value)| (name.clone(), value.clone())).collect();
		headers.extend(options.headers);
		HttpRequest {
			method,
			path: path.to_owned(),
			url,
			access_token: options.access_token,
			body: options.body,
			body_type: options.body_type.unwrap_or_default(),
			headers,
			timeout: options.timeout.or_else(|| defaults.timeout_ms.map(Duration::from_millis)),
		}
	}

	/// Sends a request and yields the decoded response body.
	///
	/// # Errors
	///
	/// [`HttpError::Status`] for non-2xx responses, otherwise whatever the transport reports.
	pub fn request(&self, method: Method, path: &str, options: HttpOptions) -> LocalBoxFuture<'static, Result<Value, HttpError>> {
		let request = self.resolve(method, path, options);
		let url = request.url.clone();
		trace!(%method, %url, "Sending request.");
		let response = self.transport.send(request);
		async move {
			let HttpResponse { status, body } = response.await?;
			if (200..300).contains(&status) {
				trace!(%method, %url, status, "Request succeeded.");
				Ok(body)
			} else {
				let response = serde_json::from_value::<ErrorResponse>(body).ok();
				warn!(%method, %url, status, code = ?response.as_ref().map(|r| r.feedback.current.code), "Request failed.");
				Err(HttpError::Status { method, url, status, response })
			}
		}
		.boxed_local()
	}
}

/// Sends requests with [`reqwest`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
	client: reqwest::Client,
}

impl ReqwestTransport {
	#[must_use]
	pub fn new(client: reqwest::Client) -> Self {
		Self { client }
	}
}

impl From<reqwest::Error> for HttpError {
	fn from(error: reqwest::Error) -> Self {
		Self::Transport(error.to_string())
	}
}

fn form_value(value: &Value) -> String {
	match value {
		Value::String(string) => string.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

impl Transport for ReqwestTransport {
	fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, HttpError>> {
		let method = match request.method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Delete => reqwest::Method::DELETE,
		};
		let mut builder = self.client.request(method, &request.url);
		for (name, value) in &request.headers {
			builder = builder.header(name, value);
		}
		if let Some(token) = &request.access_token {
			builder = builder.bearer_auth(token);
		}
		#[cfg(not(target_arch = "wasm32"))]
		{
			if let Some(timeout) = request.timeout {
				builder = builder.timeout(timeout);
			}
		}
		if let Some(body) = &request.body {
			builder = match request.body_type {
				BodyType::Json => builder.json(body),
				BodyType::UrlEncoded => builder.form(&body.iter().map(|(name, value)| (name.clone(), form_value(value))).collect::<Vec<_>>()),
				BodyType::MultipartFormData => builder.multipart(
					body.iter()
						.fold(reqwest::multipart::Form::new(), |form, (name, value)| form.text(name.clone(), form_value(value))),
				),
			};
		}
		async move {
			let response = builder.send().await?;
			let status = response.status().as_u16();
			let text = response.text().await?;
			let body = if text.trim().is_empty() {
				Value::Null
			} else {
				serde_json::from_str(&text).map_err(|error| HttpError::Body(error.to_string()))?
			};
			Ok(HttpResponse { status, body })
		}
		.boxed_local()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resolves_against_defaults() {
		struct Unreachable;
		impl Transport for Unreachable {
			fn send(&self, _: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, HttpError>> {
				unreachable!()
			}
		}
		let defaults = HttpDefaults {
			host: "api.example.com".to_owned(),
			port: Some(8443),
			https: true,
			headers: [("X-CSRF-Token".to_owned(), "abc".to_owned())].into_iter().collect(),
			..HttpDefaults::default()
		};
		let http = Http::new(Unreachable, defaults);
		let request = http.resolve(
			Method::Put,
			"/users/1",
			HttpOptions {
				access_token: Some("token".to_owned()),
				port: Some(443),
				..HttpOptions::default()
			},
		);
		assert_eq!(request.url, "https://api.example.com:443/users/1");
		assert_eq!(request.body_type, BodyType::MultipartFormData);
		assert_eq!(request.headers.len(), 1);
		assert_eq!(request.access_token.as_deref(), Some("token"));
	}
}
