//! Component inputs and localized text tables.

use crate::{tree::Element, Localization};
use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::warn;

/// The input of a component: JSON properties, an optional data bag, a localization,
/// named layout regions and shared Rust values (models, for example).
#[derive(Clone, Default)]
pub struct Props {
	values: Map<String, Value>,
	/// Arbitrary data made available to the whole component.
	pub data: Option<Value>,
	/// Used by [`Component::localize`](`crate::Component::localize`) before each render.
	pub l: Option<Localization>,
	regions: HashMap<String, Element>,
	shared: HashMap<String, Rc<dyn Any>>,
}

impl Debug for Props {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Props")
			.field("values", &self.values.keys().collect::<Vec<_>>())
			.field("has_data", &self.data.is_some())
			.field("l", &self.l)
			.field("regions", &self.regions.keys().collect::<Vec<_>>())
			.field("shared", &self.shared.keys().collect::<Vec<_>>())
			.finish()
	}
}

impl From<Map<String, Value>> for Props {
	fn from(values: Map<String, Value>) -> Self {
		Self { values, ..Self::default() }
	}
}

impl Props {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder form of [`Props::set`].
	#[must_use]
	pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
		self.set(name, value);
		self
	}

	#[must_use]
	pub fn with_localization(mut self, l: Localization) -> Self {
		self.l = Some(l);
		self
	}

	#[must_use]
	pub fn with_data(mut self, data: Value) -> Self {
		self.data = Some(data);
		self
	}

	/// Provides a subtree for a layout component to place under `name`.
	#[must_use]
	pub fn with_region(mut self, name: &str, region: Element) -> Self {
		self.regions.insert(name.to_owned(), region);
		self
	}

	#[must_use]
	pub fn with_shared<T: 'static>(mut self, name: &str, value: Rc<T>) -> Self {
		self.shared.insert(name.to_owned(), value);
		self
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.values.get(name)
	}

	#[must_use]
	pub fn get_str(&self, name: &str) -> Option<&str> {
		self.get(name).and_then(Value::as_str)
	}

	/// Deserializes a property. Missing and mistyped properties both yield [`None`].
	#[must_use]
	pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
		let value = self.get(name)?;
		match serde_json::from_value(value.clone()) {
			Ok(value) => Some(value),
			Err(error) => {
				warn!(name, %error, "Mistyped property.");
				None
			}
		}
	}

	pub fn set(&mut self, name: &str, value: impl Into<Value>) {
		self.values.insert(name.to_owned(), value.into());
	}

	pub fn unset(&mut self, name: &str) -> Option<Value> {
		self.values.remove(name)
	}

	/// Overwrites every property present in `values`.
	pub fn merge(&mut self, values: Map<String, Value>) {
		self.values.extend(values);
	}

	#[must_use]
	pub fn values(&self) -> &Map<String, Value> {
		&self.values
	}

	/// A copy of the region's subtree, which can be rendered any number of times.
	#[must_use]
	pub fn region(&self, name: &str) -> Option<Element> {
		self.regions.get(name).cloned()
	}

	#[must_use]
	pub fn shared<T: 'static>(&self, name: &str) -> Option<Rc<T>> {
		Rc::clone(self.shared.get(name)?).downcast().ok()
	}
}

/// A component's localized strings, recomputed before each render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text(HashMap<String, String>);

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Text {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

impl Text {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The string for `key`, or an empty string if there is none.
	#[must_use]
	pub fn get(&self, key: &str) -> &str {
		match self.0.get(key) {
			Some(text) => text,
			None => {
				warn!(key, "Missing text key.");
				""
			}
		}
	}

	#[must_use]
	pub fn contains(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
		self.0.insert(key.into(), text.into());
	}
}
