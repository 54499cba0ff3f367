//! Browser backend of [`DomElement`](`super::DomElement`).
//!
//! Event listeners are kept alive in a thread-local registry until they're removed,
//! so closures handed to JavaScript outlive the call that created them.

use super::DomEvent;
use crate::emitter::ListenerId;
use core::cell::RefCell;
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{error, trace};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{CssStyleDeclaration, Document, Element, HtmlElement};

struct Listener {
	target: Element,
	event: String,
	closure: Closure<dyn FnMut(web_sys::Event)>,
}

thread_local! {
	static LISTENERS: RefCell<HashMap<ListenerId, Listener>> = RefCell::default();
}

pub(crate) fn document() -> Option<Document> {
	web_sys::window()?.document()
}

pub(crate) fn create_element(tag: &str) -> Option<Element> {
	match document()?.create_element(tag) {
		Ok(element) => Some(element),
		Err(error) => {
			error!(tag, ?error, "Failed to create element.");
			None
		}
	}
}

pub(crate) fn body() -> Option<Element> {
	document()?.body().map(Into::into)
}

pub(crate) fn query_all(root: &JsValue, selector: &str) -> Vec<Element> {
	let result = if let Some(element) = root.dyn_ref::<Element>() {
		element.query_selector_all(selector)
	} else if let Some(document) = root.dyn_ref::<Document>() {
		document.query_selector_all(selector)
	} else {
		return Vec::new();
	};
	let nodes = match result {
		Ok(nodes) => nodes,
		Err(error) => {
			error!(selector, ?error, "Invalid selector.");
			return Vec::new();
		}
	};
	(0..nodes.length())
		.filter_map(|i| nodes.item(i))
		.filter_map(|node| node.dyn_into::<Element>().ok())
		.collect()
}

pub(crate) fn query_one(element: &Element, selector: &str) -> Option<Element> {
	element.query_selector(selector).unwrap_or_else(|error| {
		error!(selector, ?error, "Invalid selector.");
		None
	})
}

pub(crate) fn element_children(element: &Element) -> Vec<Element> {
	let children = element.children();
	(0..children.length()).filter_map(|i| children.item(i)).collect()
}

pub(crate) fn text_content(element: &Element) -> String {
	element.text_content().unwrap_or_default()
}

pub(crate) fn set_text_content(element: &Element, text: &str) {
	element.set_text_content(Some(text));
}

pub(crate) fn value(element: &Element) -> Option<String> {
	js_sys::Reflect::get(element, &JsValue::from_str("value")).ok()?.as_string()
}

pub(crate) fn set_value(element: &Element, value: &str) {
	if let Err(error) = js_sys::Reflect::set(element, &JsValue::from_str("value"), &JsValue::from_str(value)) {
		error!(?error, "Failed to set value.");
	}
}

fn inline_style(element: &Element) -> Option<CssStyleDeclaration> {
	element.dyn_ref::<HtmlElement>().map(HtmlElement::style)
}

pub(crate) fn set_style(element: &Element, property: &str, value: &str) {
	match inline_style(element) {
		Some(style) => {
			if let Err(error) = style.set_property(property, value) {
				error!(property, ?error, "Failed to set style.");
			}
		}
		None => error!(property, "Can't style a non-HTML element."),
	}
}

pub(crate) fn computed_style(element: &Element, property: &str) -> Option<String> {
	let style = web_sys::window()?.get_computed_style(element).ok()??;
	style.get_property_value(property).ok()
}

pub(crate) fn bounding_rect(element: &Element) -> (f64, f64, f64, f64) {
	let rect = element.get_bounding_client_rect();
	(rect.left(), rect.top(), rect.width(), rect.height())
}

pub(crate) fn scroll_offset() -> (f64, f64) {
	web_sys::window().map_or((0.0, 0.0), |window| {
		(window.scroll_x().unwrap_or_default(), window.scroll_y().unwrap_or_default())
	})
}

pub(crate) fn document_client_offset() -> (f64, f64) {
	document()
		.and_then(|document| document.document_element())
		.map_or((0.0, 0.0), |root| (f64::from(root.client_left()), f64::from(root.client_top())))
}

pub(crate) fn offset(element: &Element) -> (f64, f64) {
	element
		.dyn_ref::<HtmlElement>()
		.map_or((0.0, 0.0), |element| (f64::from(element.offset_left()), f64::from(element.offset_top())))
}

pub(crate) fn add_listener(target: &Element, event: &str, callback: Rc<dyn Fn(&DomEvent)>) -> ListenerId {
	let id = ListenerId::next();
	let closure = Closure::wrap(Box::new(move |native: web_sys::Event| callback(&DomEvent::from_native(native))) as Box<dyn FnMut(web_sys::Event)>);
	if let Err(error) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
		error!(event, ?error, "Failed to add event listener.");
	}
	let listener = Listener {
		target: target.clone(),
		event: event.to_owned(),
		closure,
	};
	LISTENERS.with(|listeners| drop(listeners.borrow_mut().insert(id, listener)));
	trace!(?id, event, "Created Closure.");
	id
}

/// Returns whether the listener was still registered.
pub(crate) fn remove_listener(id: ListenerId) -> bool {
	let Some(listener) = LISTENERS.with(|listeners| listeners.borrow_mut().remove(&id)) else {
		return false;
	};
	if let Err(error) = listener
		.target
		.remove_event_listener_with_callback(&listener.event, listener.closure.as_ref().unchecked_ref())
	{
		error!(event = %listener.event, ?error, "Failed to remove event listener.");
	}
	trace!(?id, "Destroyed Closure.");
	true
}

pub(crate) fn dispatch(target: &Element, event: &DomEvent) {
	let init = web_sys::EventInit::new();
	init.set_bubbles(true);
	init.set_cancelable(true);
	match web_sys::Event::new_with_event_init_dict(event.event_type(), &init) {
		Ok(native) => {
			if let Err(error) = target.dispatch_event(&native) {
				error!(event = event.event_type(), ?error, "Failed to dispatch event.");
			}
		}
		Err(error) => error!(event = event.event_type(), ?error, "Failed to create event."),
	}
}
