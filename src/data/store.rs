use super::{
	model::Model,
	request::{ExecutionContext, RequestInfo},
};
use crate::{
	emitter::{EventEmitter, ListenerId},
	http::{default_client, Http, HttpOptions},
	Error, Result,
};
use core::cell::{Ref, RefCell, RefMut};
use serde_json::Value;
use tracing::trace;

/// What data stores emit.
#[derive(Debug, Clone)]
pub enum StoreEvent {
	/// `change:{prop}` carries the property and its new value. `change` carries them too after a single [`Model::set`],
	/// and only the model after a bulk update.
	Change {
		model: Model,
		prop: Option<String>,
		value: Option<Value>,
	},
	Add(Model),
	Remove(Model),
	/// The id of the deleted record, if it had one.
	Delete(Option<String>),
}

/// State shared by models and collections: request options, events and an optional client override.
#[derive(Debug, Default)]
pub struct DataStore {
	fetch_options: RefCell<HttpOptions>,
	save_options: RefCell<HttpOptions>,
	delete_options: RefCell<HttpOptions>,
	events: EventEmitter<StoreEvent>,
	client: RefCell<Option<Http>>,
}

impl DataStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The default fetch hook: during server renders, requests are made on behalf of the visitor.
	pub fn forward_access_token(store: &DataStore, request: &RequestInfo) {
		if request.context == ExecutionContext::ServerRender {
			if let Some(token) = &request.cookies.access_token {
				trace!("Forwarding access token.");
				store.fetch_options_mut().access_token = Some(token.clone());
			}
		}
	}

	pub fn set_fetch_options(&self, options: HttpOptions) {
		*self.fetch_options.borrow_mut() = options;
	}

	pub fn set_save_options(&self, options: HttpOptions) {
		*self.save_options.borrow_mut() = options;
	}

	pub fn set_delete_options(&self, options: HttpOptions) {
		*self.delete_options.borrow_mut() = options;
	}

	#[must_use]
	pub fn fetch_options(&self) -> Ref<'_, HttpOptions> {
		self.fetch_options.borrow()
	}

	pub fn fetch_options_mut(&self) -> RefMut<'_, HttpOptions> {
		self.fetch_options.borrow_mut()
	}

	#[must_use]
	pub fn save_options(&self) -> Ref<'_, HttpOptions> {
		self.save_options.borrow()
	}

	pub fn save_options_mut(&self) -> RefMut<'_, HttpOptions> {
		self.save_options.borrow_mut()
	}

	#[must_use]
	pub fn delete_options(&self) -> Ref<'_, HttpOptions> {
		self.delete_options.borrow()
	}

	pub fn delete_options_mut(&self) -> RefMut<'_, HttpOptions> {
		self.delete_options.borrow_mut()
	}

	/// Overrides the thread's default client for this store.
	pub fn set_client(&self, client: Http) {
		*self.client.borrow_mut() = Some(client);
	}

	/// This store's client, falling back to the thread's default.
	///
	/// # Errors
	///
	/// [`Error::NoClient`] iff neither is set.
	pub fn http(&self) -> Result<Http> {
		self.client.borrow().clone().or_else(default_client).ok_or(Error::NoClient)
	}

	/// Related stores use their owner's client unless they have their own.
	pub(crate) fn inherit_client(&self, owner: &DataStore) {
		let mut client = self.client.borrow_mut();
		if client.is_none() {
			client.clone_from(&owner.client.borrow());
		}
	}

	pub fn on(&self, event: &str, callback: impl Fn(&StoreEvent) + 'static) -> ListenerId {
		self.events.on(event, callback)
	}

	pub fn off(&self, id: ListenerId) -> bool {
		self.events.off(id)
	}

	pub fn emit(&self, event: &str, payload: &StoreEvent) -> usize {
		self.events.emit(event, payload)
	}
}
