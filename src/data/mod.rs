//! Client-side data stores mirroring REST resources.
//!
//! A [`Model`] is one record, a [`Collection`] an ordered set of them. Both are described by static schemas, emit
//! [`StoreEvent`]s and persist through the thread's [`Http`](crate::http::Http) client unless given their own.

mod collection;
mod model;
mod request;
mod schema;
mod store;

pub use collection::Collection;
pub use model::{Model, PendingDelete, RelationValue, SaveArgs};
pub use request::{Cookies, ExecutionContext, RequestInfo};
pub use schema::{CollectionSchema, FetchHook, ModelSchema, Relation, RelationKind, SaveHook};
pub use store::{DataStore, StoreEvent};
