use super::{
	model::{malformed, Model, Owner},
	request::RequestInfo,
	schema::CollectionSchema,
	store::{DataStore, StoreEvent},
};
use crate::{emitter::ListenerId, http::Method, Error, Result};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use futures::{
	future::{try_join_all, LocalBoxFuture},
	FutureExt,
};
use serde::Deserialize;
use serde_json::Value;
use std::rc::{Rc, Weak};
use tracing::{debug, debug_span, warn, Instrument};

struct Member {
	model: Model,
	listeners: Vec<ListenerId>,
}

#[derive(Default)]
struct State {
	members: Vec<Member>,
	owner: Option<Owner>,
}

struct CollectionInner {
	schema: &'static CollectionSchema,
	store: DataStore,
	state: RefCell<State>,
}

/// An ordered set of records with unique ids.
///
/// Re-emits `change` from its members and drops members once they emit `delete`.
#[derive(Clone)]
pub struct Collection(Rc<CollectionInner>);

impl Debug for Collection {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let len = self.0.state.try_borrow().ok().map(|state| state.members.len());
		f.debug_struct("Collection").field("schema", &self.0.schema.name).field("len", &len).finish_non_exhaustive()
	}
}

impl PartialEq for Collection {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

#[derive(Deserialize)]
struct CollectionBody {
	collection: Vec<Value>,
}

impl Collection {
	#[must_use]
	pub fn new(schema: &'static CollectionSchema) -> Self {
		Self(Rc::new(CollectionInner {
			schema,
			store: DataStore::new(),
			state: RefCell::default(),
		}))
	}

	/// # Errors
	///
	/// Iff an item isn't an object or repeats an id.
	pub fn from_data(schema: &'static CollectionSchema, items: Vec<Value>) -> Result<Self> {
		let collection = Self::new(schema);
		collection.add_all(items)?;
		Ok(collection)
	}

	#[must_use]
	pub fn schema(&self) -> &'static CollectionSchema {
		self.0.schema
	}

	#[must_use]
	pub fn store(&self) -> &DataStore {
		&self.0.store
	}

	/// Builds a member from `data` and adds it.
	///
	/// # Errors
	///
	/// Iff `data` isn't an object, or see [`Collection::add_model`].
	pub fn add(&self, data: Value) -> Result<Model> {
		self.add_for(data, None)
	}

	fn add_for(&self, data: Value, user_id: Option<&str>) -> Result<Model> {
		let Value::Object(data) = data else {
			return Err(malformed(format_args!("{} members must be objects", self.0.schema.name)));
		};
		let model = Model::from_data_for(self.0.schema.model, data, user_id)?;
		self.add_model(model.clone())?;
		Ok(model)
	}

	/// # Errors
	///
	/// See [`Collection::add`]. Items before the failing one stay added.
	pub fn add_all(&self, items: Vec<Value>) -> Result<()> {
		self.add_all_for(items, None)
	}

	pub(crate) fn add_all_for(&self, items: Vec<Value>, user_id: Option<&str>) -> Result<()> {
		for item in items {
			self.add_for(item, user_id)?;
		}
		Ok(())
	}

	/// Appends an existing record and emits `add`.
	///
	/// # Errors
	///
	/// [`Error::DuplicateId`] iff a member with the same id is present.
	pub fn add_model(&self, model: Model) -> Result<()> {
		if let Some(id) = model.id() {
			if self.contains(&id) {
				return Err(Error::DuplicateId(id));
			}
		}
		if !core::ptr::eq(model.schema(), self.0.schema.model) {
			warn!(collection = self.0.schema.name, model = model.schema().name, "Adding model of unexpected type.");
		}
		model.inherit_client(&self.0.store);

		let collection = Rc::downgrade(&self.0);
		let change = {
			let collection = Weak::clone(&collection);
			model.on("change", move |event| {
				if let Some(collection) = collection.upgrade() {
					collection.store.emit("change", event);
				}
			})
		};
		let delete = {
			let member = Rc::downgrade(&model.0);
			model.on("delete", move |event| {
				if let (Some(collection), Some(member)) = (collection.upgrade(), member.upgrade()) {
					let collection = Collection(collection);
					collection.remove_model(&Model(member));
					collection.0.store.emit("delete", event);
				}
			})
		};

		self.0.state.borrow_mut().members.push(Member {
			model: model.clone(),
			listeners: vec![change, delete],
		});
		self.0.store.emit("add", &StoreEvent::Add(model));
		Ok(())
	}

	#[must_use]
	pub fn contains(&self, id: &str) -> bool {
		self.position(id).is_some()
	}

	fn position(&self, id: &str) -> Option<usize> {
		self.0
			.state
			.borrow()
			.members
			.iter()
			.position(|member| member.model.id().as_deref() == Some(id))
	}

	/// # Errors
	///
	/// [`Error::NotFound`] iff no member has this id.
	pub fn get(&self, id: &str) -> Result<Model> {
		let index = self.position(id).ok_or_else(|| Error::NotFound(id.to_owned()))?;
		Ok(self.0.state.borrow().members[index].model.clone())
	}

	#[must_use]
	pub fn at(&self, index: usize) -> Option<Model> {
		self.0.state.borrow().members.get(index).map(|member| member.model.clone())
	}

	/// Removes a member and emits `remove`.
	///
	/// # Errors
	///
	/// [`Error::NotFound`] iff no member has this id.
	pub fn remove(&self, id: &str) -> Result<Model> {
		let index = self.position(id).ok_or_else(|| Error::NotFound(id.to_owned()))?;
		Ok(self.remove_at(index))
	}

	fn remove_model(&self, model: &Model) -> bool {
		let index = self.0.state.borrow().members.iter().position(|member| member.model == *model);
		index.map(|index| self.remove_at(index)).is_some()
	}

	fn remove_at(&self, index: usize) -> Model {
		let member = self.0.state.borrow_mut().members.remove(index);
		for id in member.listeners {
			member.model.off(id);
		}
		self.0.store.emit("remove", &StoreEvent::Remove(member.model.clone()));
		member.model
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.state.borrow().members.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	#[must_use]
	pub fn models(&self) -> Vec<Model> {
		self.0.state.borrow().members.iter().map(|member| member.model.clone()).collect()
	}

	/// Visits the members present when called. `f` may add or remove members.
	pub fn for_each(&self, mut f: impl FnMut(&Model)) {
		for model in self.models() {
			f(&model);
		}
	}

	/// The record holding this collection, if it's reachable as `reverse_prop`.
	#[must_use]
	pub fn owner(&self, reverse_prop: &str) -> Option<Model> {
		self.0.state.borrow().owner.as_ref().and_then(|owner| owner.resolve(reverse_prop))
	}

	pub(crate) fn inherit_client(&self, owner: &DataStore) {
		self.0.store.inherit_client(owner);
		for model in self.models() {
			model.inherit_client(&self.0.store);
		}
	}

	pub(crate) fn set_owner(&self, owner: Owner) {
		self.0.state.borrow_mut().owner = Some(owner);
	}

	/// Serializes every member. `include` limits each member's top-level properties.
	#[must_use]
	pub fn to_data(&self, include: Option<&[&str]>) -> Vec<Value> {
		self.models().iter().map(|model| Value::Object(model.to_data_filtered(include))).collect()
	}

	#[must_use]
	pub fn url(&self) -> String {
		let schema = self.0.schema;
		schema.url.map_or_else(|| format!("/{}", schema.name.to_lowercase()), str::to_owned)
	}

	/// Loads `{ "collection": [...] }` and adds every item.
	pub fn fetch(&self, request: &RequestInfo, parent_url: Option<&str>) -> LocalBoxFuture<'static, Result<()>> {
		let schema = self.0.schema;
		let url = match parent_url {
			Some(parent) if !schema.no_parent_url => format!("{parent}{}", self.url()),
			_ => self.url(),
		};
		let span = debug_span!("fetch", collection = schema.name, %url);
		(schema.on_fetch)(&self.0.store, request);
		let response = self.0.store.http().map(|http| http.request(Method::Get, &url, self.0.store.fetch_options().clone()));
		let user_id = request.cookies.user_id.clone();
		let this = self.clone();
		async move {
			let body = response?.await?;
			let CollectionBody { collection } = serde_json::from_value(body)?;
			debug!(count = collection.len(), "Fetched.");
			this.add_all_for(collection, user_id.as_deref())
		}
		.instrument(span)
		.boxed_local()
	}

	/// Saves the members that are new, concurrently.
	pub fn save(&self, parent_url: Option<&str>) -> LocalBoxFuture<'static, Result<()>> {
		let saves: Vec<_> = self
			.models()
			.into_iter()
			.filter(Model::is_new)
			.map(|model| match parent_url {
				Some(parent_url) => model.save(parent_url),
				None => model.save(()),
			})
			.collect();
		async move {
			try_join_all(saves).await?;
			Ok(())
		}
		.boxed_local()
	}

	pub fn on(&self, event: &str, callback: impl Fn(&StoreEvent) + 'static) -> ListenerId {
		self.0.store.on(event, callback)
	}

	pub fn off(&self, id: ListenerId) -> bool {
		self.0.store.off(id)
	}
}

impl Drop for CollectionInner {
	fn drop(&mut self) {
		for member in &self.state.get_mut().members {
			for id in &member.listeners {
				member.model.off(*id);
			}
		}
	}
}
