use core::fmt::{self, Debug, Formatter};
use hashbrown::HashMap;
use serde_json::Value;
use std::rc::Rc;
use tracing::trace;

/// Looks up localized strings by key, optionally interpolating data.
///
/// Components only ever receive one of these through their props. Loading translations is up to the host.
#[derive(Clone)]
pub struct Localization(Rc<dyn Fn(&str, Option<&Value>) -> String>);

impl Debug for Localization {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Localization").finish_non_exhaustive()
	}
}

impl Localization {
	pub fn new(get_localization: impl Fn(&str, Option<&Value>) -> String + 'static) -> Self {
		Self(Rc::new(get_localization))
	}

	/// Builds a lookup over a fixed string table.
	///
	/// `{name}` placeholders are filled from the members of a JSON object passed as data.
	/// Unknown keys resolve to the key itself.
	///
	/// ```
	/// use composer::Localization;
	/// use serde_json::json;
	///
	/// let l = Localization::from_strings([("GREETING", "Hello {name}!")]);
	/// assert_eq!(l.get_with("GREETING", &json!({ "name": "Ada" })), "Hello Ada!");
	/// assert_eq!(l.get("MISSING"), "MISSING");
	/// ```
	pub fn from_strings<K: Into<String>, V: Into<String>>(strings: impl IntoIterator<Item = (K, V)>) -> Self {
		let strings: HashMap<String, String> = strings.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
		Self::new(move |key, data| match strings.get(key) {
			Some(template) => interpolate(template, data),
			None => {
				trace!(key, "No localization for key.");
				key.to_owned()
			}
		})
	}

	#[must_use]
	pub fn get(&self, key: &str) -> String {
		(self.0)(key, None)
	}

	#[must_use]
	pub fn get_with(&self, key: &str, data: &Value) -> String {
		(self.0)(key, Some(data))
	}
}

fn interpolate(template: &str, data: Option<&Value>) -> String {
	let Some(Value::Object(data)) = data else {
		return template.to_owned();
	};
	data.iter().fold(template.to_owned(), |text, (name, value)| {
		let placeholder = format!("{{{}}}", name);
		match value {
			Value::String(value) => text.replace(&placeholder, value),
			value => text.replace(&placeholder, &value.to_string()),
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn non_string_values_are_interpolated_as_json() {
		let l = Localization::from_strings([("COUNT", "{count} new, {count} total")]);
		assert_eq!(l.get_with("COUNT", &json!({ "count": 3 })), "3 new, 3 total");
		assert_eq!(l.get("COUNT"), "{count} new, {count} total");
	}
}
