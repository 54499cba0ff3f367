//! Static descriptions of record types: where they live on the server and how they relate.
//!
//! Schemas are `const`-constructible so they can reference each other from `static`s:
//!
//! ```
//! use composer::data::{CollectionSchema, ModelSchema, Relation};
//!
//! static USER: ModelSchema = ModelSchema::new("User");
//! static COMMENT: ModelSchema = ModelSchema::new("Comment").relations(&COMMENT_RELATIONS);
//! static COMMENT_RELATIONS: [Relation; 1] = [Relation::has_one("author", &USER, "comments")];
//! static COMMENTS: CollectionSchema = CollectionSchema::new("Comments", &COMMENT);
//! static POST: ModelSchema = ModelSchema::new("Post").url("/posts/:id").relations(&POST_RELATIONS);
//! static POST_RELATIONS: [Relation; 1] = [Relation::has_many("comments", &COMMENTS, "post").include(&["id", "body"])];
//!
//! assert_eq!(POST.relation("comments").unwrap().reverse_prop, "post");
//! assert!(POST.relation("author").is_none());
//! ```

use super::{request::RequestInfo, store::DataStore};
use crate::http::HttpOptions;
use core::fmt::{self, Debug, Formatter};

/// Called before every fetch. May adjust the store's fetch options for this request.
pub type FetchHook = fn(&DataStore, &RequestInfo);

/// Called before every save with the options about to be sent.
pub type SaveHook = fn(&mut HttpOptions);

pub struct ModelSchema {
	pub name: &'static str,
	/// Record URL template. `:id` is replaced with the record's id.
	/// Defaults to `/{name}s/{id}` with the name lowercased.
	pub url: Option<&'static str>,
	/// Don't prefix request URLs with the owning record's URL.
	pub no_parent_url: bool,
	/// Client-only records: fetch, save and delete skip the network.
	pub no_server: bool,
	pub relations: &'static [Relation],
	pub on_fetch: FetchHook,
	pub on_save: SaveHook,
}

impl Debug for ModelSchema {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModelSchema")
			.field("name", &self.name)
			.field("url", &self.url)
			.field("no_parent_url", &self.no_parent_url)
			.field("no_server", &self.no_server)
			.field("relations", &self.relations)
			.finish_non_exhaustive()
	}
}

fn keep_options(_: &mut HttpOptions) {}

impl ModelSchema {
	#[must_use]
	pub const fn new(name: &'static str) -> Self {
		Self {
			name,
			url: None,
			no_parent_url: false,
			no_server: false,
			relations: &[],
			on_fetch: DataStore::forward_access_token,
			on_save: keep_options,
		}
	}

	#[must_use]
	pub const fn url(mut self, url: &'static str) -> Self {
		self.url = Some(url);
		self
	}

	#[must_use]
	pub const fn no_parent_url(mut self) -> Self {
		self.no_parent_url = true;
		self
	}

	#[must_use]
	pub const fn no_server(mut self) -> Self {
		self.no_server = true;
		self
	}

	#[must_use]
	pub const fn relations(mut self, relations: &'static [Relation]) -> Self {
		self.relations = relations;
		self
	}

	#[must_use]
	pub const fn on_fetch(mut self, hook: FetchHook) -> Self {
		self.on_fetch = hook;
		self
	}

	#[must_use]
	pub const fn on_save(mut self, hook: SaveHook) -> Self {
		self.on_save = hook;
		self
	}

	#[must_use]
	pub fn relation(&self, name: &str) -> Option<&'static Relation> {
		self.relations.iter().find(|relation| relation.name == name)
	}

	pub(crate) fn url_name(&self) -> String {
		self.name.to_lowercase()
	}
}

#[derive(Clone, Copy)]
pub enum RelationKind {
	HasOne(&'static ModelSchema),
	HasMany(&'static CollectionSchema),
}

// Schemas may reference each other cyclically, so only names are printed.
impl Debug for RelationKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::HasOne(schema) => f.debug_tuple("HasOne").field(&schema.name).finish(),
			Self::HasMany(schema) => f.debug_tuple("HasMany").field(&schema.name).finish(),
		}
	}
}

/// A property of a record that holds another record or a collection of them.
#[derive(Debug, Clone, Copy)]
pub struct Relation {
	pub name: &'static str,
	pub kind: RelationKind,
	/// Name under which the related store can reach back to its owner.
	pub reverse_prop: &'static str,
	/// Properties to serialize when the owner is serialized. All of them if [`None`].
	pub include: Option<&'static [&'static str]>,
}

impl Relation {
	#[must_use]
	pub const fn has_one(name: &'static str, schema: &'static ModelSchema, reverse_prop: &'static str) -> Self {
		Self {
			name,
			kind: RelationKind::HasOne(schema),
			reverse_prop,
			include: None,
		}
	}

	#[must_use]
	pub const fn has_many(name: &'static str, schema: &'static CollectionSchema, reverse_prop: &'static str) -> Self {
		Self {
			name,
			kind: RelationKind::HasMany(schema),
			reverse_prop,
			include: None,
		}
	}

	#[must_use]
	pub const fn include(mut self, props: &'static [&'static str]) -> Self {
		self.include = Some(props);
		self
	}
}

pub struct CollectionSchema {
	pub name: &'static str,
	/// Defaults to `/{name}` with the name lowercased.
	pub url: Option<&'static str>,
	pub no_parent_url: bool,
	/// The type of every member.
	pub model: &'static ModelSchema,
	pub on_fetch: FetchHook,
}

impl Debug for CollectionSchema {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("CollectionSchema")
			.field("name", &self.name)
			.field("url", &self.url)
			.field("no_parent_url", &self.no_parent_url)
			.field("model", &self.model.name)
			.finish_non_exhaustive()
	}
}

impl CollectionSchema {
	#[must_use]
	pub const fn new(name: &'static str, model: &'static ModelSchema) -> Self {
		Self {
			name,
			url: None,
			no_parent_url: false,
			model,
			on_fetch: DataStore::forward_access_token,
		}
	}

	#[must_use]
	pub const fn url(mut self, url: &'static str) -> Self {
		self.url = Some(url);
		self
	}

	#[must_use]
	pub const fn no_parent_url(mut self) -> Self {
		self.no_parent_url = true;
		self
	}

	#[must_use]
	pub const fn on_fetch(mut self, hook: FetchHook) -> Self {
		self.on_fetch = hook;
		self
	}
}
