//! In-memory nodes standing in for the browser DOM during server rendering and in headless use.

use super::{selector::Selector, DomEvent};
use crate::{emitter::ListenerId, html};
use core::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{trace, warn};

type Callback = Rc<dyn Fn(&DomEvent)>;

#[derive(Clone)]
pub(crate) struct VirtualNode(Rc<RefCell<Data>>);

struct Data {
	parent: Weak<RefCell<Data>>,
	kind: Kind,
	children: Vec<VirtualNode>,
}

enum Kind {
	Element(ElementData),
	Text(String),
	/// Markup assigned through `set_inner_html`, kept verbatim.
	Raw(String),
}

struct ElementData {
	tag: String,
	attributes: Vec<(String, String)>,
	value: Option<String>,
	listeners: Vec<(ListenerId, String, Callback)>,
}

impl core::fmt::Debug for VirtualNode {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		match &self.0.borrow().kind {
			Kind::Element(element) => write!(f, "<{}>", element.tag),
			Kind::Text(_) => f.write_str("#text"),
			Kind::Raw(_) => f.write_str("#raw"),
		}
	}
}

impl VirtualNode {
	fn new(kind: Kind) -> Self {
		Self(Rc::new(RefCell::new(Data { parent: Weak::new(), kind, children: Vec::new() })))
	}

	pub fn element(tag: &str) -> Self {
		Self::new(Kind::Element(ElementData {
			tag: tag.to_ascii_lowercase(),
			attributes: Vec::new(),
			value: None,
			listeners: Vec::new(),
		}))
	}

	pub fn text(text: &str) -> Self {
		Self::new(Kind::Text(text.to_owned()))
	}

	pub fn raw(markup: &str) -> Self {
		Self::new(Kind::Raw(markup.to_owned()))
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	pub fn is_element(&self) -> bool {
		matches!(self.0.borrow().kind, Kind::Element(_))
	}

	pub fn tag_name(&self) -> Option<String> {
		match &self.0.borrow().kind {
			Kind::Element(element) => Some(element.tag.clone()),
			Kind::Text(_) | Kind::Raw(_) => None,
		}
	}

	pub fn attribute(&self, name: &str) -> Option<String> {
		match &self.0.borrow().kind {
			Kind::Element(element) => element.attributes.iter().find(|(n, _)| n == name).map(|(_, value)| value.clone()),
			Kind::Text(_) | Kind::Raw(_) => None,
		}
	}

	pub fn set_attribute(&self, name: &str, value: &str) {
		if let Kind::Element(element) = &mut self.0.borrow_mut().kind {
			match element.attributes.iter_mut().find(|(n, _)| n == name) {
				Some((_, existing)) => value.clone_into(existing),
				None => element.attributes.push((name.to_owned(), value.to_owned())),
			}
		}
	}

	pub fn remove_attribute(&self, name: &str) {
		if let Kind::Element(element) = &mut self.0.borrow_mut().kind {
			element.attributes.retain(|(n, _)| n != name);
		}
	}

	pub fn value(&self) -> Option<String> {
		match &self.0.borrow().kind {
			Kind::Element(element) => element.value.clone().or_else(|| element.attributes.iter().find(|(n, _)| n == "value").map(|(_, v)| v.clone())),
			Kind::Text(_) | Kind::Raw(_) => None,
		}
	}

	pub fn set_value(&self, value: &str) {
		if let Kind::Element(element) = &mut self.0.borrow_mut().kind {
			element.value = Some(value.to_owned());
		}
	}

	/// The declaration of `property` in the inline `style` attribute.
	pub fn style(&self, property: &str) -> Option<String> {
		let style = self.attribute("style")?;
		style.split(';').find_map(|declaration| {
			let (name, value) = declaration.split_once(':')?;
			(name.trim() == property).then(|| value.trim().to_owned())
		})
	}

	pub fn set_style(&self, property: &str, value: &str) {
		let style = self.attribute("style").unwrap_or_default();
		let mut declarations: Vec<String> = style
			.split(';')
			.map(str::trim)
			.filter(|declaration| !declaration.is_empty())
			.filter(|declaration| declaration.split_once(':').map_or(true, |(name, _)| name.trim() != property))
			.map(ToOwned::to_owned)
			.collect();
		if !value.is_empty() {
			declarations.push(format!("{}: {}", property, value));
		}
		if declarations.is_empty() {
			self.remove_attribute("style");
		} else {
			self.set_attribute("style", &(declarations.join("; ") + ";"));
		}
	}

	pub fn parent(&self) -> Option<Self> {
		self.0.borrow().parent.upgrade().map(Self)
	}

	pub fn children(&self) -> Vec<Self> {
		self.0.borrow().children.clone()
	}

	pub fn element_children(&self) -> Vec<Self> {
		self.children().into_iter().filter(Self::is_element).collect()
	}

	fn index_in_parent(&self) -> Option<(Self, usize)> {
		let parent = self.parent()?;
		let index = parent.0.borrow().children.iter().position(|child| child.ptr_eq(self))?;
		Some((parent, index))
	}

	/// Detaches the node from its parent, if any.
	pub fn detach(&self) {
		if let Some((parent, index)) = self.index_in_parent() {
			parent.0.borrow_mut().children.remove(index);
		}
		self.0.borrow_mut().parent = Weak::new();
	}

	/// Inserts `child` at `index` (clamped), moving it away from its previous parent first.
	pub fn insert_child(&self, index: usize, child: &Self) {
		if child.ptr_eq(self) || self.has_ancestor(child) {
			return warn!("Refusing to insert a virtual node into itself.");
		}
		// `index` counts `child` itself if it's already an earlier sibling.
		let index = match child.index_in_parent() {
			Some((parent, current)) if parent.ptr_eq(self) && current < index => index - 1,
			_ => index,
		};
		child.detach();
		child.0.borrow_mut().parent = Rc::downgrade(&self.0);
		let mut data = self.0.borrow_mut();
		let index = index.min(data.children.len());
		data.children.insert(index, child.clone());
	}

	pub fn append_child(&self, child: &Self) {
		let len = self.0.borrow().children.len();
		self.insert_child(len, child);
	}

	pub fn insert_before_self(&self, node: &Self) {
		match self.index_in_parent() {
			Some((parent, index)) => parent.insert_child(index, node),
			None => warn!("Can't insert a sibling before a detached virtual node."),
		}
	}

	pub fn insert_after_self(&self, node: &Self) {
		match self.index_in_parent() {
			Some((parent, index)) => parent.insert_child(index + 1, node),
			None => warn!("Can't insert a sibling after a detached virtual node."),
		}
	}

	fn has_ancestor(&self, candidate: &Self) -> bool {
		let mut current = self.parent();
		while let Some(node) = current {
			if node.ptr_eq(candidate) {
				return true;
			}
			current = node.parent();
		}
		false
	}

	pub fn text_content(&self) -> String {
		let data = self.0.borrow();
		match &data.kind {
			Kind::Text(text) | Kind::Raw(text) => text.clone(),
			Kind::Element(_) => data.children.iter().map(Self::text_content).collect(),
		}
	}

	fn replace_children(&self, node: Option<Self>) {
		for child in self.children() {
			child.detach();
		}
		if let Some(node) = node {
			self.append_child(&node);
		}
	}

	pub fn set_text_content(&self, text: &str) {
		self.replace_children((!text.is_empty()).then(|| Self::text(text)));
	}

	/// Plain text is stored as a text node, anything else verbatim.
	pub fn set_inner_html(&self, markup: &str) {
		if markup.contains(['<', '&']) {
			self.replace_children(Some(Self::raw(markup)));
		} else {
			self.set_text_content(markup);
		}
	}

	pub fn inner_html(&self) -> String {
		let mut html = String::new();
		for child in self.0.borrow().children.iter() {
			child.write_html(&mut html);
		}
		html
	}

	pub fn outer_html(&self) -> String {
		let mut html = String::new();
		self.write_html(&mut html);
		html
	}

	fn write_html(&self, html: &mut String) {
		let data = self.0.borrow();
		match &data.kind {
			Kind::Text(text) => html.push_str(&html::escape_text(text)),
			Kind::Raw(markup) => html.push_str(markup),
			Kind::Element(element) => {
				html::write_start_tag(html, &element.tag, element.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str())));
				for child in &data.children {
					child.write_html(html);
				}
				html::write_end_tag(html, &element.tag);
			}
		}
	}

	/// A deep copy without parent and without listeners.
	pub fn deep_clone(&self) -> Self {
		let data = self.0.borrow();
		let kind = match &data.kind {
			Kind::Text(text) => Kind::Text(text.clone()),
			Kind::Raw(markup) => Kind::Raw(markup.clone()),
			Kind::Element(element) => Kind::Element(ElementData {
				tag: element.tag.clone(),
				attributes: element.attributes.clone(),
				value: element.value.clone(),
				listeners: Vec::new(),
			}),
		};
		let clone = Self::new(kind);
		for child in &data.children {
			clone.append_child(&child.deep_clone());
		}
		clone
	}

	pub fn add_listener(&self, event: &str, callback: Callback) -> ListenerId {
		let id = ListenerId::next();
		match &mut self.0.borrow_mut().kind {
			Kind::Element(element) => element.listeners.push((id, event.to_owned(), callback)),
			Kind::Text(_) | Kind::Raw(_) => warn!("Ignoring listener on a virtual non-element node."),
		}
		id
	}

	pub fn remove_listener(&self, id: ListenerId) -> bool {
		if let Kind::Element(element) = &mut self.0.borrow_mut().kind {
			let before = element.listeners.len();
			element.listeners.retain(|(listener, _, _)| *listener != id);
			return element.listeners.len() != before;
		}
		false
	}

	/// Calls matching listeners on this node, then on its ancestors, until propagation is stopped.
	pub fn dispatch(&self, event: &DomEvent) {
		let mut current = Some(self.clone());
		while let Some(node) = current {
			let callbacks: Vec<Callback> = match &node.0.borrow().kind {
				Kind::Element(element) => element
					.listeners
					.iter()
					.filter(|(_, name, _)| name == event.event_type())
					.map(|(_, _, callback)| Rc::clone(callback))
					.collect(),
				Kind::Text(_) | Kind::Raw(_) => Vec::new(),
			};
			trace!(event = event.event_type(), count = callbacks.len(), "Dispatching to virtual node.");
			for callback in callbacks {
				callback(event);
			}
			if event.is_propagation_stopped() {
				break;
			}
			current = node.parent();
		}
	}

	fn matches(&self, selector: &Selector) -> bool {
		match &self.0.borrow().kind {
			Kind::Element(element) => {
				let attribute = |name: &str| element.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str());
				selector.matches(&element.tag, attribute("id"), attribute("class"))
			}
			Kind::Text(_) | Kind::Raw(_) => false,
		}
	}

	/// Descendants (excluding `self`) in document order.
	pub fn find_all(&self, selector: &Selector) -> Vec<Self> {
		let mut found = Vec::new();
		self.collect(selector, &mut found, usize::MAX);
		found
	}

	pub fn find_one(&self, selector: &Selector) -> Option<Self> {
		let mut found = Vec::with_capacity(1);
		self.collect(selector, &mut found, 1);
		found.pop()
	}

	fn collect(&self, selector: &Selector, found: &mut Vec<Self>, limit: usize) {
		for child in self.children() {
			if found.len() >= limit {
				return;
			}
			if child.matches(selector) {
				found.push(child.clone());
			}
			child.collect(selector, found, limit);
		}
	}
}
