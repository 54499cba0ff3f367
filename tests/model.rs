#![cfg(not(target_arch = "wasm32"))]

use composer::{
	data::{Collection, DataStore, Model, StoreEvent},
	http::Method,
	Error,
};
use futures::executor::block_on;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{cell::RefCell, rc::Rc};

mod logging_;

use mock_transport_::MockTransport;
use schemas_::{data, COMMENTS, POST, SETTINGS, USER};

/// Records the names of the given events in emission order.
fn record(store: &DataStore, events: &[&'static str]) -> Rc<RefCell<Vec<&'static str>>> {
	let seen = Rc::new(RefCell::new(Vec::new()));
	for &event in events {
		let seen = Rc::clone(&seen);
		store.on(event, move |_| seen.borrow_mut().push(event));
	}
	seen
}

#[test]
fn seeded_records_are_clean_until_set() {
	logging_::init();
	let post = Model::from_data(&POST, data(json!({ "id": "5", "name": "a" }))).unwrap();
	assert!(!post.is_new());
	assert!(!post.has_changed());

	let seen = record(post.store(), &["change:name", "change", "change:other"]);
	post.set("name", "b").unwrap();
	assert!(post.has_changed());
	assert_eq!(*seen.borrow(), ["change:name", "change"]);

	post.set("name", "b").unwrap();
	assert_eq!(seen.borrow().len(), 2, "unchanged values emit nothing");
}

#[test]
fn new_records_have_no_id() {
	logging_::init();
	let user = Model::new(&USER);
	assert!(user.is_new());
	assert!(!user.has_changed());
	user.set("name", "Ada").unwrap();
	assert!(user.is_new());
	assert!(user.has_changed());
	user.set("id", 1).unwrap();
	assert!(!user.is_new());
	assert_eq!(user.id().as_deref(), Some("1"));
}

#[test]
fn bulk_updates_emit_one_change() {
	logging_::init();
	let user = Model::new(&USER);
	let changes = Rc::new(RefCell::new(Vec::new()));
	let changes_ = Rc::clone(&changes);
	user.on("change", move |event| {
		if let StoreEvent::Change { prop, .. } = event {
			changes_.borrow_mut().push(prop.clone());
		}
	});
	let names = record(user.store(), &["change:name", "change:email"]);

	user.set_props(data(json!({ "name": "Ada", "email": "ada@example.com" }))).unwrap();
	assert_eq!(*changes.borrow(), [None]);
	assert_eq!(names.borrow().len(), 2);

	user.set("name", "Grace").unwrap();
	assert_eq!(*changes.borrow(), [None, Some("name".to_owned())]);
}

#[test]
fn duplicate_ids_are_rejected() {
	logging_::init();
	let comments = Collection::new(&COMMENTS);
	comments.add(json!({ "id": "1", "body": "first" })).unwrap();
	assert!(matches!(comments.add(json!({ "id": "1", "body": "again" })), Err(Error::DuplicateId(id)) if id == "1"));
	assert!(matches!(comments.add(json!({ "id": 1 })), Err(Error::DuplicateId(_))));
	assert_eq!(comments.len(), 1);

	comments.add(json!({ "body": "unsaved" })).unwrap();
	comments.add(json!({ "body": "unsaved too" })).unwrap();
	assert_eq!(comments.len(), 3);
}

#[test]
fn collection_lookup_and_removal() {
	logging_::init();
	let comments = Collection::from_data(&COMMENTS, vec![json!({ "id": "1" }), json!({ "id": "2" })]).unwrap();
	assert_eq!(comments.at(1).and_then(|comment| comment.id()).as_deref(), Some("2"));
	assert!(matches!(comments.get("3"), Err(Error::NotFound(id)) if id == "3"));

	let seen = record(comments.store(), &["remove", "change"]);
	let first = comments.get("1").unwrap();
	let removed = comments.remove("1").unwrap();
	assert_eq!(removed, first);
	assert!(matches!(comments.remove("1"), Err(Error::NotFound(_))));

	first.set("body", "edited").unwrap();
	comments.get("2").unwrap().set("body", "edited").unwrap();
	assert_eq!(*seen.borrow(), ["remove", "change"]);

	let mut ids = Vec::new();
	comments.for_each(|comment| ids.extend(comment.id()));
	assert_eq!(ids, ["2"]);
	assert!(!comments.is_empty());
}

#[test]
fn dotted_paths_reach_one_level_into_relations() {
	logging_::init();
	let post = Model::from_data(
		&POST,
		data(json!({
			"id": "5",
			"title": "Hello",
			"author": { "id": "u1", "name": "Ada", "email": "ada@example.com" },
			"comments": [{ "id": "7", "body": "hi" }],
		})),
	)
	.unwrap();

	assert_eq!(post.get("title").unwrap(), Some(json!("Hello")));
	assert_eq!(post.get("subtitle").unwrap(), None);
	assert_eq!(post.get("author.email").unwrap(), Some(json!("ada@example.com")));
	assert_eq!(post.get("comments.7").unwrap(), Some(json!({ "id": "7", "body": "hi" })));
	assert_eq!(post.get("author").unwrap(), Some(json!({ "id": "u1", "name": "Ada" })));

	assert!(matches!(post.get("author.name.first"), Err(Error::PropertyPath(_))));
	assert!(matches!(post.get("comments.8"), Err(Error::NotFound(_))));
	assert!(matches!(post.get("title.length"), Err(Error::UnknownRelation { .. })));
}

#[test]
fn serialization_honours_include_lists() {
	logging_::init();
	let post = Model::from_data(
		&POST,
		data(json!({
			"id": "5",
			"author": { "id": "u1", "name": "Ada", "email": "ada@example.com" },
			"comments": [{ "id": "7", "body": "hi" }],
		})),
	)
	.unwrap();
	assert_eq!(
		Value::Object(post.to_data()),
		json!({
			"id": "5",
			"author": { "id": "u1", "name": "Ada" },
			"comments": [{ "id": "7", "body": "hi" }],
		})
	);
	assert_eq!(Value::Object(post.to_data_filtered(Some(&["id"][..]))), json!({ "id": "5" }));
}

#[test]
fn relations_know_their_owner_and_bubble_events() {
	logging_::init();
	let mock = MockTransport::new();
	mock.reply(Method::Delete, "/comments/7", 200, Value::Null);

	let post = Model::new(&POST);
	post.store().set_client(mock.client());
	post.set_props(data(json!({ "id": "5", "author": { "id": "u1" }, "comments": [] }))).unwrap();

	let comments = post.has_many("comments").unwrap();
	assert_eq!(comments.owner("post"), Some(post.clone()));
	assert_eq!(post.has_one("author").unwrap().owner("posts"), Some(post.clone()));
	assert_eq!(post.has_one("author").unwrap().owner("comments"), None);

	let seen = record(post.store(), &["add:comments", "remove:comments", "delete:comments"]);
	let comment = post.add("comments", json!({ "id": "7" })).unwrap();
	block_on(comment.delete()).unwrap();
	assert_eq!(*seen.borrow(), ["add:comments", "remove:comments", "delete:comments"]);
	assert!(comments.is_empty());
	assert_eq!(mock.calls(), [(Method::Delete, "/comments/7".to_owned())]);
}

#[test]
fn replaced_relations_stop_bubbling() {
	logging_::init();
	let post = Model::from_data(&POST, data(json!({ "id": "5", "comments": [] }))).unwrap();
	let previous = post.has_many("comments").unwrap();
	let seen = record(post.store(), &["add:comments"]);

	post.set("comments", json!([{ "id": "1" }])).unwrap();
	previous.add(json!({ "id": "2" })).unwrap();
	assert!(seen.borrow().is_empty());

	post.has_many("comments").unwrap().add(json!({ "id": "3" })).unwrap();
	assert_eq!(*seen.borrow(), ["add:comments"]);

	post.set("comments", Value::Null).unwrap();
	assert!(post.has_many("comments").is_none());
}

#[test]
fn relation_data_must_have_the_declared_shape() {
	logging_::init();
	let post = Model::new(&POST);
	assert!(matches!(post.set("comments", json!({ "id": "1" })), Err(Error::Record(_))));
	assert!(matches!(post.set("author", json!(["u1"])), Err(Error::Record(_))));
	assert!(matches!(post.add("author", json!({})), Err(Error::UnknownRelation { .. })));
	assert!(matches!(post.set_has_many("author", Collection::new(&COMMENTS)), Err(Error::UnknownRelation { .. })));
}

#[test]
fn counters() {
	logging_::init();
	let post = Model::new(&POST);
	post.increment("likes", 2).unwrap();
	post.decrement("likes", 3).unwrap();
	assert_eq!(post.get("likes").unwrap(), Some(json!(-1)));

	post.set("rating", 1.5).unwrap();
	post.increment("rating", 1).unwrap();
	assert_eq!(post.get("rating").unwrap(), Some(json!(2.5)));
}

#[test]
fn typed_records() {
	logging_::init();
	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	#[serde(rename_all = "camelCase")]
	struct User {
		id: String,
		display_name: String,
	}

	let ada = User {
		id: "u1".to_owned(),
		display_name: "Ada".to_owned(),
	};
	let user = Model::from_typed(&USER, &ada).unwrap();
	assert_eq!(user.get("displayName").unwrap(), Some(json!("Ada")));
	assert!(!user.has_changed());
	assert_eq!(user.to_typed::<User>().unwrap(), ada);

	user.set("displayName", 7).unwrap();
	assert!(matches!(user.to_typed::<User>(), Err(Error::Record(_))));
}

#[test]
fn urls() {
	logging_::init();
	let post = Model::new(&POST);
	assert_eq!(post.url(), "/posts");
	assert_eq!(post.collection_url(), "/posts");
	post.set("id", "5").unwrap();
	assert_eq!(post.url(), "/posts/5");

	let settings = Model::from_data(&SETTINGS, data(json!({ "id": "main" }))).unwrap();
	assert_eq!(settings.url(), "/me/settings/main");
	assert_eq!(settings.collection_url(), "/me/settings");
	assert_eq!(Collection::new(&COMMENTS).url(), "/comments");
}
