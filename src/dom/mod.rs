//! A uniform element handle over browser elements and in-memory virtual nodes.
//!
//! All mutators take `&self` and return it again, so calls can be chained:
//!
//! ```
//! use composer::dom::DomElement;
//!
//! let element = DomElement::create_virtual("p");
//! element.add_class("Message").add_class("Error").set_html("Wrong password.");
//! assert!(element.has_class("Error"));
//! assert_eq!(element.get_text(), "Wrong password.");
//! ```
//!
//! Operations on an element that was already [removed](`DomElement::remove`) are allowed but meaningless.

mod event;
mod selector;
mod virtual_node;
#[cfg(target_arch = "wasm32")]
mod web;

pub use event::DomEvent;
pub use selector::Selector;
pub(crate) use virtual_node::VirtualNode;

use crate::emitter::ListenerId;
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;
use tracing::{error, trace, warn};

/// Vendor names of the transition end event. Only the first one to arrive is handled.
const TRANSITION_END_EVENTS: [&str; 4] = ["transitionend", "webkitTransitionEnd", "oTransitionEnd", "MSTransitionEnd"];

/// A handle to exactly one element, either live in a browser document or virtual.
///
/// Cloning the handle does not clone the element. Use [`DomElement::clone_node`] for that.
#[derive(Clone)]
pub struct DomElement {
	node: Node,
}

#[derive(Clone)]
enum Node {
	Virtual(VirtualNode),
	#[cfg(target_arch = "wasm32")]
	Web(web_sys::Element),
}

thread_local! {
	static VIRTUAL_BODY: VirtualNode = VirtualNode::element("body");
}

/// Where [`DomElement::append_to`] and [`DomElement::prepend_to`] place an element.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
	Element(&'a DomElement),
	/// The document element with this id.
	Id(&'a str),
}

impl<'a> From<&'a DomElement> for Target<'a> {
	fn from(element: &'a DomElement) -> Self {
		Self::Element(element)
	}
}

impl<'a> From<&'a str> for Target<'a> {
	fn from(id: &'a str) -> Self {
		Self::Id(id)
	}
}

/// Left and top coordinates in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
	pub left: f64,
	pub top: f64,
}

impl Debug for DomElement {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.node {
			Node::Virtual(node) => f.debug_tuple("DomElement::Virtual").field(node).finish(),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => f.debug_tuple("DomElement::Web").field(&element.tag_name()).finish(),
		}
	}
}

impl PartialEq for DomElement {
	fn eq(&self, other: &Self) -> bool {
		match (&self.node, &other.node) {
			(Node::Virtual(a), Node::Virtual(b)) => a.ptr_eq(b),
			#[cfg(target_arch = "wasm32")]
			(Node::Web(a), Node::Web(b)) => a == b,
			#[allow(unreachable_patterns)]
			_ => false,
		}
	}
}
impl Eq for DomElement {}

#[cfg(target_arch = "wasm32")]
impl From<web_sys::Element> for DomElement {
	fn from(element: web_sys::Element) -> Self {
		Self { node: Node::Web(element) }
	}
}

fn mixed_backends(operation: &'static str) {
	error!(operation, "Can't combine a virtual node with a browser element.");
}

impl DomElement {
	/// Creates a fresh element in the current browser document, or a virtual one where there is none.
	#[must_use]
	pub fn create(tag: &str) -> Self {
		#[cfg(target_arch = "wasm32")]
		{
			if let Some(element) = web::create_element(tag) {
				return element.into();
			}
		}
		Self::create_virtual(tag)
	}

	/// Creates a virtual element regardless of the environment.
	#[must_use]
	pub fn create_virtual(tag: &str) -> Self {
		Self::from_virtual(VirtualNode::element(tag))
	}

	pub(crate) fn from_virtual(node: VirtualNode) -> Self {
		Self { node: Node::Virtual(node) }
	}

	pub(crate) fn as_virtual(&self) -> Option<&VirtualNode> {
		match &self.node {
			Node::Virtual(node) => Some(node),
			#[cfg(target_arch = "wasm32")]
			Node::Web(_) => None,
		}
	}

	#[must_use]
	pub fn is_virtual(&self) -> bool {
		self.as_virtual().is_some()
	}

	/// The wrapped browser element, if this handle isn't virtual.
	#[cfg(target_arch = "wasm32")]
	#[must_use]
	pub fn web_element(&self) -> Option<&web_sys::Element> {
		match &self.node {
			Node::Web(element) => Some(element),
			Node::Virtual(_) => None,
		}
	}

	/// The document body, or a per-thread virtual body outside of browsers.
	#[must_use]
	pub fn body() -> Self {
		#[cfg(target_arch = "wasm32")]
		{
			if let Some(body) = web::body() {
				return body.into();
			}
		}
		VIRTUAL_BODY.with(|body| Self::from_virtual(body.clone()))
	}

	/// Looks up an element by id in the whole document.
	#[must_use]
	pub fn document_get_element(id: &str) -> Option<Self> {
		#[cfg(target_arch = "wasm32")]
		{
			if let Some(document) = web::document() {
				return document.get_element_by_id(id).map(Into::into);
			}
		}
		Self::body().get_element(id)
	}

	#[must_use]
	pub fn document_find_all(selector: &str) -> Vec<Self> {
		#[cfg(target_arch = "wasm32")]
		{
			if let Some(document) = web::document() {
				return web::query_all(&document, selector).into_iter().map(Into::into).collect();
			}
		}
		Self::body().find_all(selector)
	}

	/// Looks up a descendant by id.
	#[must_use]
	pub fn get_element(&self, id: &str) -> Option<Self> {
		self.find_one(&format!("#{}", id))
	}

	#[must_use]
	pub fn find_one(&self, selector: &str) -> Option<Self> {
		match &self.node {
			Node::Virtual(node) => node.find_one(&parse_selector(selector)?).map(Self::from_virtual),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => web::query_one(element, selector).map(Into::into),
		}
	}

	/// Descendants matching `selector`, in document order.
	///
	/// Virtual nodes understand only single compound selectors, see [`Selector`].
	#[must_use]
	pub fn find_all(&self, selector: &str) -> Vec<Self> {
		match &self.node {
			Node::Virtual(node) => parse_selector(selector)
				.map(|selector| node.find_all(&selector).into_iter().map(Self::from_virtual).collect())
				.unwrap_or_default(),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => web::query_all(element, selector).into_iter().map(Into::into).collect(),
		}
	}

	/// The lowercase tag name.
	#[must_use]
	pub fn tag_name(&self) -> String {
		match &self.node {
			Node::Virtual(node) => node.tag_name().unwrap_or_default(),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => element.tag_name().to_ascii_lowercase(),
		}
	}

	#[must_use]
	pub fn id(&self) -> String {
		self.get_attribute("id").unwrap_or_default()
	}

	pub fn set_id(&self, id: &str) -> &Self {
		self.set_attribute("id", id)
	}

	#[must_use]
	pub fn get_text(&self) -> String {
		match &self.node {
			Node::Virtual(node) => node.text_content(),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => web::text_content(element),
		}
	}

	/// Replaces the content with a single text node.
	pub fn set_text(&self, text: &str) -> &Self {
		match &self.node {
			Node::Virtual(node) => node.set_text_content(text),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => web::set_text_content(element, text),
		}
		self
	}

	#[must_use]
	pub fn get_attribute(&self, name: &str) -> Option<String> {
		match &self.node {
			Node::Virtual(node) => node.attribute(name),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => element.get_attribute(name),
		}
	}

	pub fn set_attribute(&self, name: &str, value: &str) -> &Self {
		match &self.node {
			Node::Virtual(node) => node.set_attribute(name, value),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => {
				if let Err(error) = element.set_attribute(name, value) {
					error!(name, ?error, "Failed to set attribute.");
				}
			}
		}
		self
	}

	pub fn remove_attribute(&self, name: &str) -> &Self {
		match &self.node {
			Node::Virtual(node) => node.remove_attribute(name),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => {
				if let Err(error) = element.remove_attribute(name) {
					error!(name, ?error, "Failed to remove attribute.");
				}
			}
		}
		self
	}

	#[must_use]
	pub fn get_html(&self) -> String {
		match &self.node {
			Node::Virtual(node) => node.inner_html(),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => element.inner_html(),
		}
	}

	/// Replaces the content with unescaped markup.
	pub fn set_html(&self, html: &str) -> &Self {
		match &self.node {
			Node::Virtual(node) => node.set_inner_html(html),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => element.set_inner_html(html),
		}
		self
	}

	#[must_use]
	pub fn outer_html(&self) -> String {
		match &self.node {
			Node::Virtual(node) => node.outer_html(),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => element.outer_html(),
		}
	}

	/// Moves `child` to the end of this element's content.
	pub fn append(&self, child: &Self) -> &Self {
		match (&self.node, &child.node) {
			(Node::Virtual(node), Node::Virtual(child)) => node.append_child(child),
			#[cfg(target_arch = "wasm32")]
			(Node::Web(element), Node::Web(child)) => {
				if let Err(error) = element.append_child(child) {
					error!(?error, "Failed to append.");
				}
			}
			#[allow(unreachable_patterns)]
			_ => mixed_backends("append"),
		}
		self
	}

	/// Moves `child` to the start of this element's content.
	pub fn prepend(&self, child: &Self) -> &Self {
		match (&self.node, &child.node) {
			(Node::Virtual(node), Node::Virtual(child)) => node.insert_child(0, child),
			#[cfg(target_arch = "wasm32")]
			(Node::Web(element), Node::Web(child)) => {
				if let Err(error) = element.insert_before(child, element.first_child().as_ref()) {
					error!(?error, "Failed to prepend.");
				}
			}
			#[allow(unreachable_patterns)]
			_ => mixed_backends("prepend"),
		}
		self
	}

	/// Places `sibling` directly before this element.
	pub fn insert_before(&self, sibling: &Self) -> &Self {
		match (&self.node, &sibling.node) {
			(Node::Virtual(node), Node::Virtual(sibling)) => node.insert_before_self(sibling),
			#[cfg(target_arch = "wasm32")]
			(Node::Web(element), Node::Web(sibling)) => {
				if let Err(error) = element.before_with_node_1(sibling) {
					error!(?error, "Failed to insert before.");
				}
			}
			#[allow(unreachable_patterns)]
			_ => mixed_backends("insert_before"),
		}
		self
	}

	/// Places `sibling` directly after this element.
	pub fn insert_after(&self, sibling: &Self) -> &Self {
		match (&self.node, &sibling.node) {
			(Node::Virtual(node), Node::Virtual(sibling)) => node.insert_after_self(sibling),
			#[cfg(target_arch = "wasm32")]
			(Node::Web(element), Node::Web(sibling)) => {
				if let Err(error) = element.after_with_node_1(sibling) {
					error!(?error, "Failed to insert after.");
				}
			}
			#[allow(unreachable_patterns)]
			_ => mixed_backends("insert_after"),
		}
		self
	}

	pub fn append_to<'a>(&self, target: impl Into<Target<'a>>) -> &Self {
		if let Some(target) = resolve_target(target.into()) {
			target.append(self);
		}
		self
	}

	pub fn prepend_to<'a>(&self, target: impl Into<Target<'a>>) -> &Self {
		if let Some(target) = resolve_target(target.into()) {
			target.prepend(self);
		}
		self
	}

	pub(crate) fn append_text(&self, text: &str) {
		match &self.node {
			Node::Virtual(node) => node.append_child(&VirtualNode::text(text)),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => {
				let appended = web::document()
					.map(|document| document.create_text_node(text))
					.map(|text| element.append_child(&text));
				if !matches!(appended, Some(Ok(_))) {
					error!("Failed to append text.");
				}
			}
		}
	}

	pub(crate) fn append_raw_html(&self, html: &str) {
		match &self.node {
			Node::Virtual(node) => node.append_child(&VirtualNode::raw(html)),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => {
				if let Err(error) = element.insert_adjacent_html("beforeend", html) {
					error!(?error, "Failed to append markup.");
				}
			}
		}
	}

	pub fn hide(&self) -> &Self {
		self.add_style("display", "none")
	}

	pub fn show(&self) -> &Self {
		self.add_style("display", "")
	}

	/// Detaches the element from its parent.
	pub fn remove(&self) {
		match &self.node {
			Node::Virtual(node) => node.detach(),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => element.remove(),
		}
	}

	/// Adds `class` unless it's already present.
	pub fn add_class(&self, class: &str) -> &Self {
		match &self.node {
			Node::Virtual(_) => {
				let mut classes = self.get_classes();
				if !classes.iter().any(|c| c == class) {
					classes.push(class.to_owned());
					self.set_class(&classes.join(" "));
				}
			}
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => {
				if let Err(error) = element.class_list().add_1(class) {
					error!(class, ?error, "Failed to add class.");
				}
			}
		}
		self
	}

	pub fn remove_class(&self, class: &str) -> &Self {
		match &self.node {
			Node::Virtual(_) => {
				let classes = self.get_classes();
				if classes.iter().any(|c| c == class) {
					let remaining: Vec<String> = classes.into_iter().filter(|c| c != class).collect();
					self.set_class(&remaining.join(" "));
				}
			}
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => {
				if let Err(error) = element.class_list().remove_1(class) {
					error!(class, ?error, "Failed to remove class.");
				}
			}
		}
		self
	}

	/// Replaces the whole class list.
	pub fn set_class(&self, classes: &str) -> &Self {
		self.set_attribute("class", classes)
	}

	#[must_use]
	pub fn has_class(&self, class: &str) -> bool {
		self.get_classes().iter().any(|c| c == class)
	}

	#[must_use]
	pub fn get_classes(&self) -> Vec<String> {
		self.get_attribute("class")
			.map(|classes| classes.split_whitespace().map(ToOwned::to_owned).collect())
			.unwrap_or_default()
	}

	/// Registers `listener` for events named `event` that reach this element.
	pub fn add_event_listener(&self, event: &str, listener: impl Fn(&DomEvent) + 'static) -> ListenerId {
		let listener: Rc<dyn Fn(&DomEvent)> = Rc::new(listener);
		match &self.node {
			Node::Virtual(node) => node.add_listener(event, listener),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => web::add_listener(element, event, listener),
		}
	}

	/// Returns whether the listener was still registered here.
	pub fn remove_event_listener(&self, id: ListenerId) -> bool {
		match &self.node {
			Node::Virtual(node) => node.remove_listener(id),
			#[cfg(target_arch = "wasm32")]
			Node::Web(_) => web::remove_listener(id),
		}
	}

	pub fn on_click(&self, listener: impl Fn(&DomEvent) + 'static) -> ListenerId {
		self.add_event_listener("click", listener)
	}

	pub fn on_double_click(&self, listener: impl Fn(&DomEvent) + 'static) -> ListenerId {
		self.add_event_listener("dblclick", listener)
	}

	pub fn on_submit(&self, listener: impl Fn(&DomEvent) + 'static) -> ListenerId {
		self.add_event_listener("submit", listener)
	}

	pub fn on_focus(&self, listener: impl Fn(&DomEvent) + 'static) -> ListenerId {
		self.add_event_listener("focus", listener)
	}

	pub fn on_blur(&self, listener: impl Fn(&DomEvent) + 'static) -> ListenerId {
		self.add_event_listener("blur", listener)
	}

	/// Calls `callback` once, when the first of the vendor-specific transition end events arrives.
	pub fn on_transition_end(&self, callback: impl FnOnce() + 'static) -> &Self {
		type Pending = Option<(Box<dyn FnOnce()>, Vec<ListenerId>)>;
		let pending: Rc<RefCell<Pending>> = Rc::new(RefCell::new(None));
		let ids = TRANSITION_END_EVENTS
			.iter()
			.map(|event| {
				let pending = Rc::clone(&pending);
				let this = self.clone();
				self.add_event_listener(event, move |_| {
					let taken = pending.borrow_mut().take();
					if let Some((callback, ids)) = taken {
						for id in ids {
							this.remove_event_listener(id);
						}
						trace!("Transition ended.");
						callback();
					}
				})
			})
			.collect();
		*pending.borrow_mut() = Some((Box::new(callback), ids));
		self
	}

	/// Delivers a synthetic event to this element's listeners and those of its ancestors.
	pub fn dispatch_event(&self, event: &DomEvent) -> &Self {
		match &self.node {
			Node::Virtual(node) => node.dispatch(event),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => web::dispatch(element, event),
		}
		self
	}

	/// A detached deep copy without event listeners.
	#[must_use]
	pub fn clone_node(&self) -> Self {
		match &self.node {
			Node::Virtual(node) => Self::from_virtual(node.deep_clone()),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => {
				use wasm_bindgen::JsCast;
				match element.clone_node_with_deep(true).map(|node| node.dyn_into::<web_sys::Element>()) {
					Ok(Ok(clone)) => clone.into(),
					_ => {
						error!("Failed to clone element.");
						Self::create_virtual(&self.tag_name())
					}
				}
			}
		}
	}

	/// Sets an inline style declaration. An empty `value` removes it.
	pub fn add_style(&self, property: &str, value: &str) -> &Self {
		match &self.node {
			Node::Virtual(node) => node.set_style(property, value),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => web::set_style(element, property, value),
		}
		self
	}

	pub fn set_height(&self, px: f64) -> &Self {
		self.add_style("height", &format!("{}px", px))
	}

	pub fn set_width(&self, px: f64) -> &Self {
		self.add_style("width", &format!("{}px", px))
	}

	/// The current value of a form control.
	#[must_use]
	pub fn get_value(&self) -> Option<String> {
		match &self.node {
			Node::Virtual(node) => node.value(),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => web::value(element),
		}
	}

	pub fn set_value(&self, value: &str) -> &Self {
		match &self.node {
			Node::Virtual(node) => node.set_value(value),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => web::set_value(element, value),
		}
		self
	}

	#[must_use]
	pub fn parent(&self) -> Option<Self> {
		match &self.node {
			Node::Virtual(node) => node.parent().map(Self::from_virtual),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => element.parent_element().map(Into::into),
		}
	}

	#[must_use]
	pub fn first_child(&self) -> Option<Self> {
		self.children().into_iter().next()
	}

	/// Child elements. Text content is skipped.
	#[must_use]
	pub fn children(&self) -> Vec<Self> {
		match &self.node {
			Node::Virtual(node) => node.element_children().into_iter().map(Self::from_virtual).collect(),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => web::element_children(element).into_iter().map(Into::into).collect(),
		}
	}

	/// The computed style in browsers, the inline style on virtual nodes.
	#[must_use]
	pub fn get_style(&self, property: &str) -> Option<String> {
		match &self.node {
			Node::Virtual(node) => node.style(property),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => web::computed_style(element, property),
		}
	}

	#[must_use]
	pub fn get_style_in_pixels(&self, property: &str) -> Option<f64> {
		self.get_style(property)?.trim().trim_end_matches("px").trim().parse().ok()
	}

	/// The position relative to the document.
	#[must_use]
	pub fn position(&self) -> Position {
		match &self.node {
			Node::Virtual(_) => Position::default(),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => {
				let (left, top, _, _) = web::bounding_rect(element);
				let (scroll_x, scroll_y) = web::scroll_offset();
				let (client_left, client_top) = web::document_client_offset();
				Position {
					left: left + scroll_x - client_left,
					top: top + scroll_y - client_top,
				}
			}
		}
	}

	/// The position relative to the viewport.
	#[must_use]
	pub fn get_position(&self) -> Position {
		match &self.node {
			Node::Virtual(_) => Position::default(),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => {
				let (left, top, _, _) = web::bounding_rect(element);
				Position { left, top }
			}
		}
	}

	/// The position relative to the offset parent.
	#[must_use]
	pub fn get_offset(&self) -> Position {
		match &self.node {
			Node::Virtual(_) => Position::default(),
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => {
				let (left, top) = web::offset(element);
				Position { left, top }
			}
		}
	}

	#[must_use]
	pub fn get_width(&self) -> f64 {
		match &self.node {
			Node::Virtual(_) => 0.0,
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => web::bounding_rect(element).2,
		}
	}

	#[must_use]
	pub fn get_height(&self) -> f64 {
		match &self.node {
			Node::Virtual(_) => 0.0,
			#[cfg(target_arch = "wasm32")]
			Node::Web(element) => web::bounding_rect(element).3,
		}
	}
}

fn parse_selector(selector: &str) -> Option<Selector> {
	let parsed = Selector::parse(selector);
	if parsed.is_none() {
		warn!(selector, "Unsupported selector on a virtual node.");
	}
	parsed
}

fn resolve_target(target: Target<'_>) -> Option<DomElement> {
	match target {
		Target::Element(element) => Some(element.clone()),
		Target::Id(id) => {
			let found = DomElement::document_get_element(id);
			if found.is_none() {
				warn!(id, "No element with this id.");
			}
			found
		}
	}
}
