use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a fetch runs. Server renders have no browser cookie jar, so credentials must be forwarded explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionContext {
	ServerRender,
	#[default]
	ClientRender,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cookies {
	pub access_token: Option<String>,
	pub renewal_token: Option<String>,
	pub user_id: Option<String>,
}

/// What the web server extracted from the incoming request, threaded through every fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestInfo {
	pub params: Map<String, Value>,
	pub query: Map<String, Value>,
	pub cookies: Cookies,
	pub context: ExecutionContext,
}

impl RequestInfo {
	/// A server-side request on behalf of the visitor holding these cookies.
	#[must_use]
	pub fn server(cookies: Cookies) -> Self {
		Self {
			cookies,
			context: ExecutionContext::ServerRender,
			..Self::default()
		}
	}

	#[must_use]
	pub fn client(cookies: Cookies) -> Self {
		Self {
			cookies,
			context: ExecutionContext::ClientRender,
			..Self::default()
		}
	}
}
