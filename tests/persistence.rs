#![cfg(not(target_arch = "wasm32"))]

use composer::{
	data::{Collection, Cookies, Model, ModelSchema, RequestInfo, StoreEvent},
	http::{BodyType, HttpOptions, Method},
	Error,
};
use futures::{
	executor::{block_on, LocalPool},
	task::LocalSpawnExt,
};
use serde_json::{json, Value};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

mod logging_;

use mock_transport_::MockTransport;
use schemas_::{data, COMMENTS, DRAFT, POST};

fn as_json(options: &mut HttpOptions) {
	options.body_type = Some(BodyType::Json);
}

static JSON_POST: ModelSchema = ModelSchema::new("Post").on_save(as_json);

fn connected(schema: &'static ModelSchema, mock: &MockTransport, props: Value) -> Model {
	let model = Model::new(schema);
	model.store().set_client(mock.client());
	model.set_props(data(props)).unwrap();
	model
}

fn deletions(model: &Model) -> Rc<RefCell<Vec<Option<String>>>> {
	let seen = Rc::new(RefCell::new(Vec::new()));
	let seen_ = Rc::clone(&seen);
	model.on("delete", move |event| {
		if let StoreEvent::Delete(id) = event {
			seen_.borrow_mut().push(id.clone());
		}
	});
	seen
}

#[test]
fn new_records_are_posted_then_put() {
	logging_::init();
	let mock = MockTransport::new();
	mock.reply(Method::Post, "/posts", 201, json!({ "model": { "id": "5", "title": "Hi" } }))
		.reply(Method::Put, "/posts/5", 200, Value::Null)
		.reply(Method::Put, "/posts/5", 200, Value::Null);

	let post = connected(&POST, &mock, json!({ "title": "Hi" }));
	assert!(post.is_new());
	block_on(post.save(())).unwrap();
	assert_eq!(post.id().as_deref(), Some("5"));
	assert!(!post.has_changed());

	block_on(post.save(())).unwrap();
	assert_eq!(
		mock.calls(),
		[(Method::Post, "/posts".to_owned()), (Method::Put, "/posts/5".to_owned())],
		"saving again updates the record the server created"
	);

	post.set("title", "Bye").unwrap();
	assert!(post.has_changed());
	block_on(post.save(())).unwrap();
	assert!(!post.has_changed());

	let requests = mock.requests();
	assert_eq!(requests.len(), 3);
	assert_eq!(requests[0].body, Some(data(json!({ "title": "Hi" }))));
	assert_eq!(requests[1].body, Some(data(json!({ "id": "5", "title": "Hi" }))));
	assert_eq!(requests[2].path, "/posts/5");
	assert_eq!(requests[2].body, Some(data(json!({ "id": "5", "title": "Bye" }))));
	assert_eq!(requests[2].body_type, BodyType::MultipartFormData);
	assert_eq!(requests[2].url, "http://localhost/posts/5");
}

#[test]
fn explicit_props_overlay_the_record() {
	logging_::init();
	let mock = MockTransport::new();
	mock.reply(Method::Put, "/users/1/posts/5", 200, Value::Null);

	let post = connected(&JSON_POST, &mock, json!({ "id": "5", "title": "Hi", "draft": true }));
	block_on(post.save((data(json!({ "draft": false })), "/users/1"))).unwrap();

	let requests = mock.requests();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].path, "/users/1/posts/5");
	assert_eq!(requests[0].body, Some(data(json!({ "id": "5", "title": "Hi", "draft": false }))));
	assert_eq!(requests[0].body_type, BodyType::Json);
	assert_eq!(post.get("draft").unwrap(), Some(json!(true)), "the overlay isn't applied locally");
}

#[test]
fn save_options_body_replaces_the_record() {
	logging_::init();
	let mock = MockTransport::new();
	mock.reply(Method::Put, "/posts/5", 200, Value::Null);

	let post = connected(&POST, &mock, json!({ "id": "5", "title": "Hi" }));
	post.store().save_options_mut().body = Some(data(json!({ "action": "publish" })));
	block_on(post.save(data(json!({ "ignored": true })))).unwrap();
	assert_eq!(mock.requests()[0].body, Some(data(json!({ "action": "publish" }))));
}

#[test]
fn relations_are_saved_under_the_record() {
	logging_::init();
	let mock = MockTransport::new();
	mock.reply(Method::Put, "/posts/5", 200, Value::Null)
		.reply(Method::Post, "/posts/5/comments", 201, json!({ "model": { "id": "9", "body": "new" } }));

	let post = connected(&POST, &mock, json!({ "id": "5", "comments": [{ "id": "8", "body": "old" }, { "body": "new" }] }));
	block_on(post.save(())).unwrap();

	assert_eq!(
		mock.calls(),
		[(Method::Put, "/posts/5".to_owned()), (Method::Post, "/posts/5/comments".to_owned())],
		"only new members of a has-many relation are sent"
	);
	let comments = post.has_many("comments").unwrap();
	assert_eq!(comments.at(1).and_then(|comment| comment.id()).as_deref(), Some("9"));
}

#[test]
fn fetch_waits_for_every_request_before_applying() {
	logging_::init();
	let mock = MockTransport::new();
	let primary = mock.hold(Method::Get, "/posts/5");
	let comments = mock.hold(Method::Get, "/posts/5/comments");

	let post = connected(&POST, &mock, json!({ "id": "5" }));
	let done = Rc::new(Cell::new(None));
	let mut pool = LocalPool::new();
	pool.spawner()
		.spawn_local({
			let fetch = post.fetch(&RequestInfo::default(), &["comments"], None);
			let done = Rc::clone(&done);
			async move { done.set(Some(fetch.await.is_ok())) }
		})
		.unwrap();

	pool.run_until_stalled();
	assert_eq!(
		mock.calls(),
		[(Method::Get, "/posts/5".to_owned()), (Method::Get, "/posts/5/comments".to_owned())],
		"both requests are in flight at once"
	);

	comments.respond(200, json!({ "collection": [{ "id": "7", "body": "hi" }] }));
	pool.run_until_stalled();
	assert_eq!(done.get(), None);
	assert!(post.has_many("comments").is_none());

	primary.respond(200, json!({ "model": { "id": "5", "title": "Hello" } }));
	pool.run_until_stalled();
	assert_eq!(done.get(), Some(true));
	assert_eq!(post.get("title").unwrap(), Some(json!("Hello")));
	assert_eq!(post.get("comments.7").unwrap(), Some(json!({ "id": "7", "body": "hi" })));
	assert_eq!(post.has_many("comments").unwrap().owner("post"), Some(post.clone()));
	assert!(!post.has_changed());
}

#[test]
fn failed_relation_fetch_discards_everything() {
	logging_::init();
	let mock = MockTransport::new();
	mock.reply(Method::Get, "/posts/5", 200, json!({ "model": { "id": "5", "title": "Hello" } }))
		.reply(Method::Get, "/posts/5/comments", 403, json!({ "feedback": { "current": { "code": 42, "message": "private" } } }));

	let post = connected(&POST, &mock, json!({ "id": "5" }));
	let error = block_on(post.fetch(&RequestInfo::default(), &["comments"], None)).unwrap_err();
	match error {
		Error::Http(error) => assert_eq!(error.feedback_code(), Some(42)),
		other => panic!("unexpected error: {other}"),
	}
	assert_eq!(post.get("title").unwrap(), None);
	assert!(post.has_many("comments").is_none());
}

#[test]
fn unknown_relations_are_rejected_before_sending() {
	logging_::init();
	let mock = MockTransport::new();
	let post = connected(&POST, &mock, json!({ "id": "5" }));
	let error = block_on(post.fetch(&RequestInfo::default(), &["likes"], None)).unwrap_err();
	assert!(matches!(error, Error::UnknownRelation { relation, .. } if relation == "likes"));
	assert!(mock.calls().is_empty());
}

#[test]
fn server_renders_act_for_the_visitor() {
	logging_::init();
	let cookies = Cookies {
		access_token: Some("token".to_owned()),
		user_id: Some("u1".to_owned()),
		..Cookies::default()
	};

	let mock = MockTransport::new();
	mock.reply(Method::Get, "/posts/5", 200, json!({ "model": { "id": "5", "userId": "u1" } }));
	let post = connected(&POST, &mock, json!({ "id": "5" }));
	block_on(post.fetch(&RequestInfo::server(cookies.clone()), &[], None)).unwrap();
	assert_eq!(mock.requests()[0].access_token.as_deref(), Some("token"));
	assert!(post.is_owned_by_me());

	let mock = MockTransport::new();
	mock.reply(Method::Get, "/posts/6", 200, json!({ "model": { "id": "6", "userId": "u2" } }));
	let post = connected(&POST, &mock, json!({ "id": "6" }));
	block_on(post.fetch(&RequestInfo::client(cookies), &[], None)).unwrap();
	assert_eq!(mock.requests()[0].access_token, None);
	assert!(!post.is_owned_by_me());
}

#[test]
fn collections_fetch_and_append() {
	logging_::init();
	let mock = MockTransport::new();
	mock.reply(Method::Get, "/users/1/comments", 200, json!({ "collection": [{ "id": "1" }, { "id": "2" }] }))
		.reply(Method::Get, "/comments", 200, json!({ "collection": [{ "id": "2" }] }));

	let comments = Collection::new(&COMMENTS);
	comments.store().set_client(mock.client());
	block_on(comments.fetch(&RequestInfo::default(), Some("/users/1"))).unwrap();
	assert_eq!(comments.len(), 2);

	let error = block_on(comments.fetch(&RequestInfo::default(), None)).unwrap_err();
	assert!(matches!(error, Error::DuplicateId(id) if id == "2"));
	assert_eq!(comments.len(), 2);
}

#[test]
fn deleting_new_records_stays_local() {
	logging_::init();
	let post = Model::new(&POST);
	let seen = deletions(&post);
	block_on(post.delete()).unwrap();
	assert_eq!(*seen.borrow(), [None]);
}

#[test]
fn deleting_existing_records() {
	logging_::init();
	let mock = MockTransport::new();
	mock.reply(Method::Delete, "/posts/5", 200, Value::Null)
		.reply(Method::Delete, "/posts/6", 200, Value::Null);

	let post = connected(&POST, &mock, json!({ "id": "5" }));
	let seen = deletions(&post);
	block_on(post.delete()).unwrap();
	assert_eq!(*seen.borrow(), [Some("5".to_owned())]);

	let post = connected(&POST, &mock, json!({ "id": "6" }));
	let seen = deletions(&post);
	let pending = block_on(post.delete_deferred()).unwrap();
	assert!(seen.borrow().is_empty());
	pending.emit();
	assert_eq!(*seen.borrow(), [Some("6".to_owned())]);

	assert_eq!(mock.calls(), [(Method::Delete, "/posts/5".to_owned()), (Method::Delete, "/posts/6".to_owned())]);
}

#[test]
fn failed_deletes_emit_nothing() {
	logging_::init();
	let mock = MockTransport::new();
	let post = connected(&POST, &mock, json!({ "id": "5" }));
	let seen = deletions(&post);
	assert!(matches!(block_on(post.delete()), Err(Error::Http(_))));
	assert!(seen.borrow().is_empty());
}

#[test]
fn client_only_records_skip_the_network() {
	logging_::init();
	let draft = Model::new(&DRAFT);
	draft.set("title", "unsent").unwrap();
	block_on(draft.save(())).unwrap();
	block_on(draft.fetch(&RequestInfo::default(), &[], None)).unwrap();
	draft.set("id", "1").unwrap();
	block_on(draft.delete()).unwrap();
	assert_eq!(draft.get("title").unwrap(), Some(json!("unsent")));
}

#[test]
fn requests_need_a_client() {
	logging_::init();
	let post = Model::new(&POST);
	assert!(matches!(block_on(post.save(())), Err(Error::NoClient)));
}
