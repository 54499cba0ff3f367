//! Records with change tracking, relations and REST persistence.

use super::{
	collection::Collection,
	request::RequestInfo,
	schema::{ModelSchema, Relation, RelationKind},
	store::{DataStore, StoreEvent},
};
use crate::{emitter::ListenerId, http::Method, Error, Result};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use futures::{
	future::{try_join, try_join_all, LocalBoxFuture},
	FutureExt,
};
use hashbrown::HashMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::rc::{Rc, Weak};
use tracing::{debug, debug_span, trace, warn, Instrument};

/// A related store, as held by its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationValue {
	One(Model),
	Many(Collection),
}

impl RelationValue {
	#[must_use]
	pub fn store(&self) -> &DataStore {
		match self {
			Self::One(model) => model.store(),
			Self::Many(collection) => collection.store(),
		}
	}

	#[must_use]
	pub fn to_data(&self, include: Option<&[&str]>) -> Value {
		match self {
			Self::One(model) => Value::Object(model.to_data_filtered(include)),
			Self::Many(collection) => Value::Array(collection.to_data(include)),
		}
	}

	fn inherit_client(&self, owner: &DataStore) {
		match self {
			Self::One(model) => model.inherit_client(owner),
			Self::Many(collection) => collection.inherit_client(owner),
		}
	}

	fn set_owner(&self, owner: Owner) {
		match self {
			Self::One(model) => model.0.state.borrow_mut().owner = Some(owner),
			Self::Many(collection) => collection.set_owner(owner),
		}
	}

	fn fetch(&self, request: &RequestInfo, parent_url: &str) -> LocalBoxFuture<'static, Result<()>> {
		match self {
			Self::One(model) => model.fetch(request, &[], Some(parent_url)),
			Self::Many(collection) => collection.fetch(request, Some(parent_url)),
		}
	}

	fn save(&self, parent_url: &str) -> LocalBoxFuture<'static, Result<()>> {
		match self {
			Self::One(model) => model.save(parent_url),
			Self::Many(collection) => collection.save(Some(parent_url)),
		}
	}
}

/// Back-reference from a related store to the record holding it.
#[derive(Clone)]
pub(crate) struct Owner {
	reverse_prop: &'static str,
	model: Weak<ModelInner>,
}

impl Owner {
	pub(crate) fn resolve(&self, reverse_prop: &str) -> Option<Model> {
		(self.reverse_prop == reverse_prop).then(|| self.model.upgrade().map(Model)).flatten()
	}
}

struct Slot {
	value: RelationValue,
	/// Subscriptions bubbling the related store's events to the owner.
	listeners: Vec<ListenerId>,
}

#[derive(Default)]
struct State {
	props: Map<String, Value>,
	relations: HashMap<&'static str, Slot>,
	/// Serialized data as of the last sync with the server.
	previous: Map<String, Value>,
	owned_by_me: bool,
	owner: Option<Owner>,
}

pub(crate) struct ModelInner {
	schema: &'static ModelSchema,
	store: DataStore,
	state: RefCell<State>,
}

/// A shared handle to one record. Clones refer to the same record.
#[derive(Clone)]
pub struct Model(pub(crate) Rc<ModelInner>);

impl Debug for Model {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let id = self.0.state.try_borrow().ok().and_then(|state| state.props.get("id").and_then(id_string));
		f.debug_struct("Model").field("schema", &self.0.schema.name).field("id", &id).finish_non_exhaustive()
	}
}

impl PartialEq for Model {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

/// Arguments of [`Model::save`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveArgs {
	/// Overrides for the serialized record.
	pub props: Option<Map<String, Value>>,
	pub parent_url: Option<String>,
}

impl From<()> for SaveArgs {
	fn from((): ()) -> Self {
		Self::default()
	}
}

impl From<&str> for SaveArgs {
	fn from(parent_url: &str) -> Self {
		Self {
			props: None,
			parent_url: Some(parent_url.to_owned()),
		}
	}
}

impl From<Map<String, Value>> for SaveArgs {
	fn from(props: Map<String, Value>) -> Self {
		Self {
			props: Some(props),
			parent_url: None,
		}
	}
}

impl From<(Map<String, Value>, &str)> for SaveArgs {
	fn from((props, parent_url): (Map<String, Value>, &str)) -> Self {
		Self {
			props: Some(props),
			parent_url: Some(parent_url.to_owned()),
		}
	}
}

/// A successful deletion whose `delete` event hasn't been emitted yet.
#[must_use = "the delete event is only emitted by `emit`"]
pub struct PendingDelete {
	model: Model,
	id: Option<String>,
}

impl PendingDelete {
	pub fn emit(self) {
		self.model.0.store.emit("delete", &StoreEvent::Delete(self.id));
	}
}

#[derive(Deserialize)]
struct ModelBody {
	model: Map<String, Value>,
}

pub(crate) fn id_string(value: &Value) -> Option<String> {
	match value {
		Value::String(id) if !id.is_empty() => Some(id.clone()),
		Value::Number(id) => Some(id.to_string()),
		_ => None,
	}
}

pub(crate) fn malformed(what: impl core::fmt::Display) -> Error {
	Error::Record(<serde_json::Error as serde::de::Error>::custom(what))
}

fn model_record(body: Value) -> Result<Option<Map<String, Value>>> {
	match body {
		Value::Null => Ok(None),
		body => Ok(Some(serde_json::from_value::<ModelBody>(body)?.model)),
	}
}

impl Model {
	#[must_use]
	pub fn new(schema: &'static ModelSchema) -> Self {
		Self(Rc::new(ModelInner {
			schema,
			store: DataStore::new(),
			state: RefCell::default(),
		}))
	}

	/// # Errors
	///
	/// Iff relation data is malformed or a has-many relation repeats an id.
	pub fn from_data(schema: &'static ModelSchema, data: Map<String, Value>) -> Result<Self> {
		Self::from_data_for(schema, data, None)
	}

	pub(crate) fn from_data_for(schema: &'static ModelSchema, data: Map<String, Value>, user_id: Option<&str>) -> Result<Self> {
		let model = Self::new(schema);
		model.apply(data, user_id)?;
		Ok(model)
	}

	/// # Errors
	///
	/// Iff `value` doesn't serialize to an object, or see [`Model::from_data`].
	pub fn from_typed<T: Serialize>(schema: &'static ModelSchema, value: &T) -> Result<Self> {
		match serde_json::to_value(value)? {
			Value::Object(data) => Self::from_data(schema, data),
			_ => Err(malformed(format_args!("{} must serialize to an object", schema.name))),
		}
	}

	/// # Errors
	///
	/// Iff the serialized record doesn't deserialize into `T`.
	pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T> {
		Ok(serde_json::from_value(Value::Object(self.to_data()))?)
	}

	#[must_use]
	pub fn schema(&self) -> &'static ModelSchema {
		self.0.schema
	}

	#[must_use]
	pub fn store(&self) -> &DataStore {
		&self.0.store
	}

	#[must_use]
	pub fn id(&self) -> Option<String> {
		self.0.state.borrow().props.get("id").and_then(id_string)
	}

	/// Records without an id have never been saved.
	#[must_use]
	pub fn is_new(&self) -> bool {
		self.id().is_none()
	}

	/// Whether the serialized record differs from what was last fetched or saved.
	#[must_use]
	pub fn has_changed(&self) -> bool {
		let data = self.to_data();
		data != self.0.state.borrow().previous
	}

	/// Whether `userId` matched the requesting user when the record was loaded.
	#[must_use]
	pub fn is_owned_by_me(&self) -> bool {
		self.0.state.borrow().owned_by_me
	}

	/// The record holding this one, if it's reachable as `reverse_prop`.
	#[must_use]
	pub fn owner(&self, reverse_prop: &str) -> Option<Model> {
		self.0.state.borrow().owner.as_ref().and_then(|owner| owner.resolve(reverse_prop))
	}

	#[must_use]
	pub fn has_one(&self, relation: &str) -> Option<Model> {
		match self.0.state.borrow().relations.get(relation).map(|slot| &slot.value) {
			Some(RelationValue::One(model)) => Some(model.clone()),
			_ => None,
		}
	}

	#[must_use]
	pub fn has_many(&self, relation: &str) -> Option<Collection> {
		match self.0.state.borrow().relations.get(relation).map(|slot| &slot.value) {
			Some(RelationValue::Many(collection)) => Some(collection.clone()),
			_ => None,
		}
	}

	fn declared(&self, relation: &str) -> Result<&'static Relation> {
		self.0.schema.relation(relation).ok_or_else(|| Error::UnknownRelation {
			owner: self.0.schema.name,
			relation: relation.to_owned(),
		})
	}

	/// Reads a property, or one property deep into a relation (`author.name`, `comments.7`).
	///
	/// Relations read without a path are serialized.
	///
	/// # Errors
	///
	/// [`Error::PropertyPath`] for more than one dot, [`Error::UnknownRelation`] when the part before the dot isn't a
	/// relation and [`Error::NotFound`] for unknown ids in a has-many relation.
	pub fn get(&self, path: &str) -> Result<Option<Value>> {
		let Some((relation, rest)) = path.split_once('.') else {
			let related = self.0.state.borrow().relations.get(path).map(|slot| slot.value.clone());
			return Ok(match related {
				Some(related) => Some(related.to_data(self.declared(path)?.include)),
				None => self.0.state.borrow().props.get(path).cloned(),
			});
		};
		if rest.contains('.') {
			return Err(Error::PropertyPath(path.to_owned()));
		}
		self.declared(relation)?;
		let related = self.0.state.borrow().relations.get(relation).map(|slot| slot.value.clone());
		match related {
			Some(RelationValue::One(model)) => model.get(rest),
			Some(RelationValue::Many(collection)) => Ok(Some(Value::Object(collection.get(rest)?.to_data()))),
			None => Ok(None),
		}
	}

	/// Sets one property and emits `change:{prop}` and `change` if its value changed.
	///
	/// Relation properties are replaced with a store built from `value`. [`Value::Null`] clears them.
	///
	/// # Errors
	///
	/// Iff `value` isn't valid data for a relation property.
	pub fn set(&self, prop: &str, value: impl Into<Value>) -> Result<()> {
		let value = value.into();
		#[cfg(feature = "dangerous-logging")]
		trace!(model = self.0.schema.name, prop, %value, "Setting property.");
		#[cfg(not(feature = "dangerous-logging"))]
		trace!(model = self.0.schema.name, prop, "Setting property.");
		if let Some(relation) = self.0.schema.relation(prop) {
			self.set_relation_data(relation, value.clone(), None)?;
		} else {
			let previous = self.0.state.borrow_mut().props.insert(prop.to_owned(), value.clone());
			if previous.as_ref() == Some(&value) {
				return Ok(());
			}
		}
		let event = StoreEvent::Change {
			model: self.clone(),
			prop: Some(prop.to_owned()),
			value: Some(value),
		};
		self.0.store.emit(&format!("change:{prop}"), &event);
		self.0.store.emit("change", &event);
		Ok(())
	}

	/// Sets several properties at once, emitting `change:{prop}` for each changed one and then `change` once.
	///
	/// Data carrying an `id` is treated as the server's state of the record.
	///
	/// # Errors
	///
	/// See [`Model::set`].
	pub fn set_props(&self, props: Map<String, Value>) -> Result<()> {
		self.apply(props, None)
	}

	pub(crate) fn apply(&self, props: Map<String, Value>, user_id: Option<&str>) -> Result<()> {
		let synced = props.contains_key("id");
		if let Some(user_id) = user_id {
			let owned = props.get("userId").and_then(id_string).is_some_and(|owner| owner == user_id);
			self.0.state.borrow_mut().owned_by_me = owned;
		}

		let mut changed = Vec::new();
		for (prop, value) in props {
			if let Some(relation) = self.0.schema.relation(&prop) {
				self.set_relation_data(relation, value.clone(), user_id)?;
			} else {
				let previous = self.0.state.borrow_mut().props.insert(prop.clone(), value.clone());
				if previous.as_ref() == Some(&value) {
					continue;
				}
			}
			changed.push((prop, value));
		}
		if synced {
			self.snapshot();
		}

		for (prop, value) in &changed {
			self.0.store.emit(
				&format!("change:{prop}"),
				&StoreEvent::Change {
					model: self.clone(),
					prop: Some(prop.clone()),
					value: Some(value.clone()),
				},
			);
		}
		if !changed.is_empty() {
			self.0.store.emit(
				"change",
				&StoreEvent::Change {
					model: self.clone(),
					prop: None,
					value: None,
				},
			);
		}
		Ok(())
	}

	fn snapshot(&self) {
		let data = self.to_data();
		self.0.state.borrow_mut().previous = data;
	}

	fn set_relation_data(&self, relation: &'static Relation, value: Value, user_id: Option<&str>) -> Result<()> {
		let related = match (relation.kind, value) {
			(_, Value::Null) => {
				self.detach(relation.name);
				return Ok(());
			}
			(RelationKind::HasOne(schema), Value::Object(data)) => RelationValue::One(Model::from_data_for(schema, data, user_id)?),
			(RelationKind::HasMany(schema), Value::Array(items)) => {
				let collection = Collection::new(schema);
				collection.add_all_for(items, user_id)?;
				RelationValue::Many(collection)
			}
			(RelationKind::HasOne(_), _) => return Err(malformed(format_args!("'{}' expects an object", relation.name))),
			(RelationKind::HasMany(_), _) => return Err(malformed(format_args!("'{}' expects an array", relation.name))),
		};
		self.attach(relation, related);
		Ok(())
	}

	/// Replaces a has-one relation.
	///
	/// # Errors
	///
	/// Iff `relation` isn't a declared has-one relation.
	pub fn set_has_one(&self, relation: &str, model: Model) -> Result<()> {
		let declared = self.declared(relation)?;
		if !matches!(declared.kind, RelationKind::HasOne(_)) {
			return Err(Error::UnknownRelation {
				owner: self.0.schema.name,
				relation: relation.to_owned(),
			});
		}
		self.attach(declared, RelationValue::One(model));
		Ok(())
	}

	/// Replaces a has-many relation.
	///
	/// # Errors
	///
	/// Iff `relation` isn't a declared has-many relation.
	pub fn set_has_many(&self, relation: &str, collection: Collection) -> Result<()> {
		let declared = self.declared(relation)?;
		if !matches!(declared.kind, RelationKind::HasMany(_)) {
			return Err(Error::UnknownRelation {
				owner: self.0.schema.name,
				relation: relation.to_owned(),
			});
		}
		self.attach(declared, RelationValue::Many(collection));
		Ok(())
	}

	fn attach(&self, relation: &'static Relation, related: RelationValue) {
		self.detach(relation.name);
		related.inherit_client(&self.0.store);
		let owner = Rc::downgrade(&self.0);
		let store = related.store();
		let listeners = ["add", "remove", "delete"]
			.into_iter()
			.map(|event| {
				let owner = Weak::clone(&owner);
				let bubbled = format!("{event}:{}", relation.name);
				store.on(event, move |payload| {
					if let Some(owner) = owner.upgrade() {
						owner.store.emit(&bubbled, payload);
					}
				})
			})
			.collect();
		related.set_owner(Owner {
			reverse_prop: relation.reverse_prop,
			model: owner,
		});
		trace!(model = self.0.schema.name, relation = relation.name, "Attaching relation.");
		self.0.state.borrow_mut().relations.insert(relation.name, Slot { value: related, listeners });
	}

	/// Uses `owner`'s client here and in every related store that has none of its own.
	pub(crate) fn inherit_client(&self, owner: &DataStore) {
		self.0.store.inherit_client(owner);
		let related: Vec<RelationValue> = self.0.state.borrow().relations.values().map(|slot| slot.value.clone()).collect();
		for related in related {
			related.inherit_client(&self.0.store);
		}
	}

	fn detach(&self, relation: &str) -> Option<RelationValue> {
		let slot = self.0.state.borrow_mut().relations.remove(relation)?;
		for id in slot.listeners {
			slot.value.store().off(id);
		}
		Some(slot.value)
	}

	/// Adds `by` to a numeric property. Missing properties count as zero.
	///
	/// # Errors
	///
	/// See [`Model::set`].
	#[allow(clippy::cast_precision_loss)]
	pub fn increment(&self, prop: &str, by: i64) -> Result<()> {
		let current = self.0.state.borrow().props.get(prop).cloned();
		let next = match current {
			Some(Value::Number(number)) => match number.as_i64() {
				Some(number) => Value::from(number.saturating_add(by)),
				None => Value::from(number.as_f64().unwrap_or_default() + by as f64),
			},
			None | Some(Value::Null) => Value::from(by),
			Some(_other) => {
				#[cfg(feature = "dangerous-logging")]
				warn!(model = self.0.schema.name, prop, value = %_other, "Incrementing non-numeric property from zero.");
				#[cfg(not(feature = "dangerous-logging"))]
				warn!(model = self.0.schema.name, prop, "Incrementing non-numeric property from zero.");
				Value::from(by)
			}
		};
		self.set(prop, next)
	}

	/// # Errors
	///
	/// See [`Model::set`].
	pub fn decrement(&self, prop: &str, by: i64) -> Result<()> {
		self.increment(prop, by.saturating_neg())
	}

	/// Adds a record to a has-many relation, creating the collection if needed.
	///
	/// # Errors
	///
	/// Iff `relation` isn't a declared has-many relation, or see [`Collection::add`].
	pub fn add(&self, relation: &str, data: Value) -> Result<Model> {
		let declared = self.declared(relation)?;
		let RelationKind::HasMany(schema) = declared.kind else {
			return Err(Error::UnknownRelation {
				owner: self.0.schema.name,
				relation: relation.to_owned(),
			});
		};
		let collection = match self.has_many(relation) {
			Some(collection) => collection,
			None => {
				let collection = Collection::new(schema);
				self.attach(declared, RelationValue::Many(collection.clone()));
				collection
			}
		};
		collection.add(data)
	}

	#[must_use]
	pub fn to_data(&self) -> Map<String, Value> {
		self.to_data_filtered(None)
	}

	/// Serializes the record, relations included. `include` limits the top-level properties.
	#[must_use]
	pub fn to_data_filtered(&self, include: Option<&[&str]>) -> Map<String, Value> {
		let included = |prop: &str| include.map_or(true, |include| include.contains(&prop));
		let state = self.0.state.borrow();
		let mut data: Map<String, Value> = state
			.props
			.iter()
			.filter(|(prop, _)| included(prop))
			.map(|(prop, value)| (prop.clone(), value.clone()))
			.collect();
		let relations: Vec<(&'static str, RelationValue)> = state
			.relations
			.iter()
			.filter(|(name, _)| included(name))
			.map(|(name, slot)| (*name, slot.value.clone()))
			.collect();
		drop(state);
		for (name, related) in relations {
			let include = self.0.schema.relation(name).and_then(|relation| relation.include);
			data.insert(name.to_owned(), related.to_data(include));
		}
		data
	}

	/// The record's path, or [`Model::collection_url`] while it has no id.
	#[must_use]
	pub fn url(&self) -> String {
		let schema = self.0.schema;
		match self.id() {
			None => self.collection_url(),
			Some(id) => match schema.url {
				Some(template) => template.replace(":id", &id),
				None => format!("/{}s/{}", schema.url_name(), id),
			},
		}
	}

	/// Where new records of this type are posted.
	#[must_use]
	pub fn collection_url(&self) -> String {
		let schema = self.0.schema;
		match schema.url {
			Some(template) => template.replace("/:id", "").replace(":id", ""),
			None => format!("/{}s", schema.url_name()),
		}
	}

	fn with_parent(&self, url: String, parent_url: Option<&str>) -> String {
		match parent_url {
			Some(parent) if !self.0.schema.no_parent_url => format!("{parent}{url}"),
			_ => url,
		}
	}

	/// Loads the record and the named relations concurrently.
	///
	/// Nothing is applied unless every request succeeds.
	pub fn fetch(&self, request: &RequestInfo, relations: &[&str], parent_url: Option<&str>) -> LocalBoxFuture<'static, Result<()>> {
		let schema = self.0.schema;
		let url = self.with_parent(self.url(), parent_url);
		let span = debug_span!("fetch", model = schema.name, %url);
		let declared: Result<Vec<&'static Relation>> = relations.iter().map(|relation| self.declared(relation)).collect();
		(schema.on_fetch)(&self.0.store, request);

		let this = self.clone();
		let request = request.clone();
		async move {
			let declared = declared?;
			let primary = if schema.no_server {
				None
			} else {
				let options = this.0.store.fetch_options().clone();
				Some(this.0.store.http()?.request(Method::Get, &url, options))
			};
			let primary = async move {
				Ok::<_, Error>(match primary {
					Some(response) => Some(response.await?),
					None => None,
				})
			};

			let mut fetches = Vec::new();
			let mut fetched = Vec::new();
			for relation in declared {
				let related = match relation.kind {
					RelationKind::HasOne(schema) => RelationValue::One(Model::new(schema)),
					RelationKind::HasMany(schema) => RelationValue::Many(Collection::new(schema)),
				};
				related.inherit_client(&this.0.store);
				fetches.push(related.fetch(&request, &url));
				fetched.push((relation, related));
			}

			let (body, _) = try_join(primary, try_join_all(fetches)).await?;
			if let Some(data) = body.map(model_record).transpose()?.flatten() {
				this.apply(data, request.cookies.user_id.as_deref())?;
			}
			for (relation, related) in fetched {
				this.attach(relation, related);
			}
			this.snapshot();
			debug!("Fetched.");
			Ok(())
		}
		.instrument(span)
		.boxed_local()
	}

	/// Posts new records and puts existing ones, then saves every relation under the record's path.
	///
	/// The body is the serialized record overlaid with `props`, unless the store's save options carry one.
	pub fn save(&self, args: impl Into<SaveArgs>) -> LocalBoxFuture<'static, Result<()>> {
		let SaveArgs { props, parent_url } = args.into();
		let schema = self.0.schema;
		let is_new = self.is_new();
		let span = debug_span!("save", model = schema.name, id = ?self.id());

		let mut saves: Vec<LocalBoxFuture<'static, Result<()>>> = Vec::new();
		if !schema.no_server {
			let mut options = self.0.store.save_options().clone();
			if options.body.is_none() {
				let mut body = self.to_data();
				body.extend(props.unwrap_or_default());
				options.body = Some(body);
			}
			(schema.on_save)(&mut options);
			let (method, url) = if is_new {
				(Method::Post, self.with_parent(self.collection_url(), parent_url.as_deref()))
			} else {
				(Method::Put, self.with_parent(self.url(), parent_url.as_deref()))
			};
			let http = self.0.store.http();
			let this = self.clone();
			saves.push(
				async move {
					let body = http?.request(method, &url, options).await?;
					if let Some(data) = model_record(body)? {
						this.apply(data, None)?;
					}
					this.snapshot();
					Ok(())
				}
				.boxed_local(),
			);
		}

		let record_url = self.url();
		let related: Vec<RelationValue> = self.0.state.borrow().relations.values().map(|slot| slot.value.clone()).collect();
		saves.extend(related.iter().map(|related| related.save(&record_url)));

		async move {
			try_join_all(saves).await?;
			debug!("Saved.");
			Ok(())
		}
		.instrument(span)
		.boxed_local()
	}

	/// Deletes the record on the server unless it's new or client-only, then emits `delete`.
	pub fn delete(&self) -> LocalBoxFuture<'static, Result<()>> {
		let pending = self.delete_deferred();
		async move {
			pending.await?.emit();
			Ok(())
		}
		.boxed_local()
	}

	/// Like [`Model::delete`], but leaves emitting `delete` to the caller, e.g. after an exit animation.
	pub fn delete_deferred(&self) -> LocalBoxFuture<'static, Result<PendingDelete>> {
		let id = self.id();
		let request = (!self.0.schema.no_server && id.is_some()).then(|| (self.0.store.http(), self.url(), self.0.store.delete_options().clone()));
		let span = debug_span!("delete", model = self.0.schema.name, id = ?id);
		let model = self.clone();
		async move {
			if let Some((http, url, options)) = request {
				http?.request(Method::Delete, &url, options).await?;
			}
			debug!("Deleted.");
			Ok(PendingDelete { model, id })
		}
		.instrument(span)
		.boxed_local()
	}

	pub fn on(&self, event: &str, callback: impl Fn(&StoreEvent) + 'static) -> ListenerId {
		self.0.store.on(event, callback)
	}

	pub fn off(&self, id: ListenerId) -> bool {
		self.0.store.off(id)
	}
}
