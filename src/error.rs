use crate::http::HttpError;

/// Errors raised by components and data stores.
///
/// Everything except [`Error::Http`] is a defect in the calling code rather than a condition to recover from.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("model with id '{0}' is already added")]
	DuplicateId(String),

	#[error("could not get model with id '{0}'")]
	NotFound(String),

	#[error("property path '{0}' can not have more than one dot")]
	PropertyPath(String),

	#[error("'{relation}' is not a declared relation of {owner}")]
	UnknownRelation { owner: &'static str, relation: String },

	#[error("no HTTP client configured for this thread")]
	NoClient,

	#[error("{component} must render an element at its root")]
	InvalidRoot { component: &'static str },

	#[error("could not bind {component} to existing DOM: {reason}")]
	Hydration { component: &'static str, reason: String },

	#[error("{component} is already borrowed")]
	Reentrant { component: &'static str },

	#[error("malformed record: {0}")]
	Record(#[from] serde_json::Error),

	#[error(transparent)]
	Http(#[from] HttpError),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
