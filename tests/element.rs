#![cfg(not(target_arch = "wasm32"))]

use composer::dom::{DomElement, DomEvent, Position};
use std::{cell::Cell, collections::BTreeSet, rc::Rc};

mod logging_;

fn list() -> DomElement {
	let list = DomElement::create("ul");
	for (id, class) in [("a", "Item"), ("b", "Item Selected"), ("c", "Other")] {
		list.append(DomElement::create("li").set_id(id).set_class(class));
	}
	list
}

#[test]
fn class_membership_follows_set_algebra() {
	logging_::init();
	let element = DomElement::create("div");
	let mut expected = BTreeSet::new();
	let operations = [
		(true, "A"),
		(true, "B"),
		(true, "A"),
		(false, "C"),
		(false, "A"),
		(true, "C"),
		(false, "A"),
		(true, "B"),
	];
	for (add, class) in operations {
		if add {
			element.add_class(class);
			expected.insert(class.to_owned());
		} else {
			element.remove_class(class);
			expected.remove(class);
		}
		let actual: BTreeSet<String> = element.get_classes().into_iter().collect();
		assert_eq!(actual, expected);
	}
	assert!(element.has_class("B") && element.has_class("C") && !element.has_class("A"));
	assert_eq!(element.get_classes().len(), 2);
}

#[test]
fn insertion_order() {
	logging_::init();
	let parent = DomElement::create("div");
	let middle = DomElement::create("b");
	parent.append(&middle);
	parent.prepend(&DomElement::create("a"));
	parent.append(&DomElement::create("i"));
	middle.insert_after(&DomElement::create("em"));
	middle.insert_before(&DomElement::create("s"));
	assert_eq!(parent.get_html(), "<a></a><s></s><b></b><em></em><i></i>");
	assert_eq!(parent.first_child().map(|child| child.tag_name()).as_deref(), Some("a"));
	assert_eq!(middle.parent(), Some(parent.clone()));

	middle.remove();
	assert_eq!(middle.parent(), None);
	assert_eq!(parent.children().len(), 4);
}

fn siblings() -> (DomElement, [DomElement; 3]) {
	let parent = DomElement::create("div");
	let children = [DomElement::create("a"), DomElement::create("b"), DomElement::create("i")];
	for child in &children {
		parent.append(child);
	}
	(parent, children)
}

#[test]
fn moving_an_earlier_sibling() {
	logging_::init();
	let (parent, [a, b, _]) = siblings();
	b.insert_after(&a);
	assert_eq!(parent.get_html(), "<b></b><a></a><i></i>");

	let (parent, [a, _, i]) = siblings();
	i.insert_before(&a);
	assert_eq!(parent.get_html(), "<b></b><a></a><i></i>");

	let (parent, [a, _, i]) = siblings();
	i.insert_after(&a);
	assert_eq!(parent.get_html(), "<b></b><i></i><a></a>");

	let (parent, [a, b, i]) = siblings();
	a.insert_before(&i);
	b.insert_after(&a);
	assert_eq!(parent.get_html(), "<i></i><b></b><a></a>");
	assert_eq!(parent.children().len(), 3);
}

#[test]
fn selectors() {
	logging_::init();
	let list = list();
	assert_eq!(list.find_all(".Item").len(), 2);
	assert_eq!(list.find_all("li").len(), 3);
	assert_eq!(list.find_all("*").len(), 3);
	assert_eq!(list.find_one(".Selected").map(|item| item.id()).as_deref(), Some("b"));
	assert_eq!(list.get_element("c").map(|item| item.get_classes()), Some(vec!["Other".to_owned()]));
	assert!(list.find_one("#missing").is_none());

	assert_eq!(list.find_all("li.Item").len(), 2);
	assert_eq!(list.find_all("li.Item.Selected").len(), 1);
	assert_eq!(list.find_one(".Item#a").map(|item| item.id()).as_deref(), Some("a"));
	assert!(list.find_one("li.Item#c").is_none());
	assert!(list.find_all("li > a").is_empty());
}

#[test]
fn document_lookups_use_the_body() {
	logging_::init();
	let banner = DomElement::create("div");
	banner.set_id("banner").add_class("Banner");
	banner.append_to(&DomElement::body());
	assert_eq!(DomElement::document_get_element("banner"), Some(banner.clone()));
	assert_eq!(DomElement::document_find_all(".Banner"), [banner.clone()]);

	let note = DomElement::create("p");
	note.append_to("banner");
	assert_eq!(note.parent(), Some(banner.clone()));

	banner.remove();
	assert!(DomElement::document_get_element("banner").is_none());
}

#[test]
fn text_is_escaped_and_markup_is_kept() {
	logging_::init();
	let message = DomElement::create("p");
	message.set_text("<b>bold</b> & more");
	assert_eq!(message.get_html(), "&lt;b&gt;bold&lt;/b&gt; &amp; more");
	assert_eq!(message.get_text(), "<b>bold</b> & more");

	message.set_html("<b>bold</b>");
	assert_eq!(message.outer_html(), "<p><b>bold</b></p>");
}

#[test]
fn events_bubble_until_stopped() {
	logging_::init();
	let list = list();
	let item = list.get_element("a").unwrap();
	let (list_clicks, item_clicks) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));

	let list_clicks_ = Rc::clone(&list_clicks);
	list.on_click(move |_| list_clicks_.set(list_clicks_.get() + 1));
	let item_clicks_ = Rc::clone(&item_clicks);
	let stopper = item.on_click(move |event| {
		item_clicks_.set(item_clicks_.get() + 1);
		event.stop_propagation();
	});

	item.dispatch_event(&DomEvent::new("click"));
	assert_eq!((item_clicks.get(), list_clicks.get()), (1, 0));

	assert!(item.remove_event_listener(stopper));
	assert!(!item.remove_event_listener(stopper));
	item.dispatch_event(&DomEvent::new("click"));
	assert_eq!((item_clicks.get(), list_clicks.get()), (1, 1));
}

#[test]
fn submit_can_be_prevented() {
	logging_::init();
	let form = DomElement::create("form");
	form.on_submit(|event| event.prevent_default());
	let keys = Rc::new(Cell::new(None));
	let keys_ = Rc::clone(&keys);
	form.add_event_listener("keyup", move |event| keys_.set(event.which()));

	let submit = DomEvent::new("submit");
	form.dispatch_event(&submit);
	assert!(submit.is_default_prevented());

	form.dispatch_event(&DomEvent::new("keyup").with_which(13));
	assert_eq!(keys.get(), Some(13));
}

#[test]
fn clones_are_deep_and_quiet() {
	logging_::init();
	let list = list();
	let clicks = Rc::new(Cell::new(0));
	let clicks_ = Rc::clone(&clicks);
	list.on_click(move |_| clicks_.set(clicks_.get() + 1));

	let copy = list.clone_node();
	assert_ne!(copy, list);
	assert_eq!(copy.outer_html(), list.outer_html());
	copy.dispatch_event(&DomEvent::new("click"));
	assert_eq!(clicks.get(), 0);
}

#[test]
fn styles_and_values() {
	logging_::init();
	let input = DomElement::create("input");
	input.set_height(10.0).set_width(12.5).add_style("color", "red");
	assert_eq!(input.get_style_in_pixels("height"), Some(10.0));
	assert_eq!(input.get_style("width").as_deref(), Some("12.5px"));

	input.hide();
	assert_eq!(input.get_style("display").as_deref(), Some("none"));
	input.show();
	assert_eq!(input.get_style("display"), None);
	assert_eq!(input.get_style("color").as_deref(), Some("red"));

	input.set_value("hello");
	assert_eq!(input.get_value().as_deref(), Some("hello"));
	input.set_attribute("name", "email");
	assert_eq!(input.get_attribute("name").as_deref(), Some("email"));
	input.remove_attribute("name");
	assert_eq!(input.get_attribute("name"), None);
}

#[test]
fn virtual_geometry_is_zero() {
	logging_::init();
	let element = DomElement::create("div");
	assert_eq!(element.position(), Position::default());
	assert_eq!(element.get_offset(), Position { left: 0.0, top: 0.0 });
	assert_eq!((element.get_width(), element.get_height()), (0.0, 0.0));
}
