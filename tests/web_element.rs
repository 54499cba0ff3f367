#![cfg(target_arch = "wasm32")]

use composer::{
	component::Rendered,
	dom::{DomElement, DomEvent},
	Base, Component, ComponentHandle, Element, Props,
};
use std::{cell::Cell, rc::Rc, sync::Once};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{HtmlElement, HtmlInputElement};

wasm_bindgen_test_configure!(run_in_browser);

fn init_logging() {
	static INIT: Once = Once::new();
	INIT.call_once(tracing_wasm::set_as_global_default);
}

struct Counter {
	base: Base,
	clicks: u32,
}

impl Component for Counter {
	fn create(props: Props, children: Vec<Element>) -> Self {
		Self { base: Base::new(props, children), clicks: 0 }
	}

	fn base(&self) -> &Base {
		&self.base
	}

	fn base_mut(&mut self) -> &mut Base {
		&mut self.base
	}

	fn render(&self) -> Element {
		Element::tag("form").class("Counter").children([
			Element::tag("input").with_ref("Input").attr("value", "3"),
			Element::tag("button").with_ref("Button").attr("type", "button").with_text("+"),
		])
	}

	fn bind_interactions(&mut self) {
		let weak = self.weak();
		if let Some(button) = self.base.element("Button") {
			button.on_click(move |_| {
				weak.with(|counter| counter.clicks += 1);
			});
		}
	}
}

fn clicks(counter: &ComponentHandle) -> u32 {
	counter.downcast::<Counter>().unwrap().borrow().clicks
}

#[wasm_bindgen_test]
fn elements_are_backed_by_the_document() {
	init_logging();
	let div = DomElement::create("div");
	assert!(!div.is_virtual());
	div.set_id("classes").add_class("a").add_class("b").add_class("a").remove_class("b");
	assert_eq!(div.get_classes(), ["a"]);
	div.append_to(&DomElement::body());

	let found = DomElement::document_get_element("classes").unwrap();
	assert_eq!(found, div);
	assert!(found.has_class("a"));
	assert_eq!(DomElement::document_find_all("div.a").len(), 1);
	div.remove();
	assert!(DomElement::document_get_element("classes").is_none());
}

#[wasm_bindgen_test]
fn synthetic_events_bubble() {
	init_logging();
	let outer = DomElement::create("section");
	let inner = DomElement::create("span");
	outer.append(&inner).append_to(&DomElement::body());

	let seen = Rc::new(Cell::new(0));
	let seen_ = Rc::clone(&seen);
	let id = outer.add_event_listener("ping", move |event| {
		assert_eq!(event.event_type(), "ping");
		seen_.set(seen_.get() + 1);
	});
	inner.dispatch_event(&DomEvent::new("ping"));
	assert_eq!(seen.get(), 1);

	assert!(outer.remove_event_listener(id));
	inner.dispatch_event(&DomEvent::new("ping"));
	assert_eq!(seen.get(), 1);
	outer.remove();
}

#[wasm_bindgen_test]
fn mounted_components_react_to_native_clicks() {
	init_logging();
	let counter = ComponentHandle::new::<Counter>(Props::new(), Vec::new());
	let root = counter.mount(&DomElement::body()).unwrap();
	assert_eq!(root.tag_name(), "form");

	let button = root.find_one("button").unwrap();
	button.web_element().unwrap().dyn_ref::<HtmlElement>().unwrap().click();
	assert_eq!(clicks(&counter), 1);

	let input = root.find_one("input").unwrap();
	assert_eq!(input.get_value().as_deref(), Some("3"));
	input.web_element().unwrap().dyn_ref::<HtmlInputElement>().unwrap().set_value("4");
	assert_eq!(input.get_value().as_deref(), Some("4"));

	counter.remove();
	assert!(DomElement::document_find_all("form.Counter").is_empty());
}

#[wasm_bindgen_test]
fn server_markup_is_hydrated_in_place() {
	init_logging();
	let server = ComponentHandle::new::<Counter>(Props::new(), Vec::new());
	let container = DomElement::create("div");
	container.set_html(&server.to_html().unwrap()).append_to(&DomElement::body());

	let client = ComponentHandle::new::<Counter>(Props::new(), Vec::new());
	let painted = container.first_child().unwrap();
	let Rendered { render_id, root } = client.hydrate(&painted).unwrap();
	assert!(client.bind_dom(render_id));
	assert_eq!(root, painted);

	painted.find_one("button").unwrap().web_element().unwrap().dyn_ref::<HtmlElement>().unwrap().click();
	assert_eq!(clicks(&client), 1);
	container.remove();
}
