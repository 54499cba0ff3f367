//! Declarative element trees, as returned by [`Component::render`](`crate::Component::render`).
//!
//! A tree is plain data until it's materialized, either into an HTML string for a server paint,
//! into fresh DOM elements, or onto DOM elements that a server paint already produced (hydration).

use crate::{
	component::{Component, ComponentHandle},
	dom::DomElement,
	html,
	props::{Props, Text},
	Error, Result,
};
use core::{
	fmt::{self, Debug, Formatter},
	sync::atomic::{AtomicU64, Ordering},
};
use hashbrown::HashMap;
use serde_json::Value;
use tracing::{error, trace, trace_span};

/// Render generation. Every materialization draws a new, larger one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RenderId(u64);
impl RenderId {
	/// Precedes every drawn id.
	pub const NONE: Self = Self(0);

	#[must_use]
	pub fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextBinding {
	/// Content is set to the escaped text for this key.
	Escaped(String),
	/// Content is set to the text for this key as markup.
	Unsafe(String),
}

#[derive(Debug, Clone)]
pub struct Intrinsic {
	pub tag: String,
	pub attributes: Vec<(String, String)>,
	/// Registers the materialized element in the enclosing component's elements under this name.
	pub ref_name: Option<String>,
	pub text_binding: Option<TextBinding>,
	pub children: Vec<Element>,
}

#[derive(Clone)]
pub struct ComponentNode {
	pub name: &'static str,
	/// The key under which the instance is registered with its parent. Defaults to the type's name.
	pub ref_name: Option<String>,
	pub props: Props,
	pub children: Vec<Element>,
	factory: fn(Props, Vec<Element>) -> ComponentHandle,
}

impl Debug for ComponentNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentNode")
			.field("name", &self.name)
			.field("ref_name", &self.ref_name)
			.field("props", &self.props)
			.field("children", &self.children)
			.finish_non_exhaustive()
	}
}

impl ComponentNode {
	fn key(&self) -> String {
		self.ref_name.clone().unwrap_or_else(|| short_name(self.name).to_owned())
	}

	fn instantiate(&self) -> ComponentHandle {
		(self.factory)(self.props.clone(), self.children.clone())
	}
}

pub(crate) fn short_name(type_name: &'static str) -> &'static str {
	let base = type_name.split('<').next().unwrap_or(type_name);
	base.rsplit("::").next().unwrap_or(base)
}

#[derive(Debug, Clone)]
pub enum Element {
	Intrinsic(Intrinsic),
	Component(ComponentNode),
	Text(String),
	/// Markup inserted without escaping.
	UnsafeHtml(String),
	Fragment(Vec<Element>),
}

impl From<&str> for Element {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl From<String> for Element {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<Vec<Element>> for Element {
	fn from(elements: Vec<Element>) -> Self {
		Self::Fragment(elements)
	}
}

impl Element {
	#[must_use]
	pub fn tag(tag: &str) -> Self {
		Self::Intrinsic(Intrinsic {
			tag: tag.to_ascii_lowercase(),
			attributes: Vec::new(),
			ref_name: None,
			text_binding: None,
			children: Vec::new(),
		})
	}

	#[must_use]
	pub fn component<C: Component>(props: Props) -> Self {
		Self::Component(ComponentNode {
			name: core::any::type_name::<C>(),
			ref_name: None,
			props,
			children: Vec::new(),
			factory: ComponentHandle::new::<C>,
		})
	}

	#[must_use]
	pub fn text(text: impl Into<String>) -> Self {
		Self::Text(text.into())
	}

	#[must_use]
	pub fn unsafe_html(html: impl Into<String>) -> Self {
		Self::UnsafeHtml(html.into())
	}

	#[must_use]
	pub fn fragment(elements: impl IntoIterator<Item = Element>) -> Self {
		Self::Fragment(elements.into_iter().collect())
	}

	#[must_use]
	pub fn empty() -> Self {
		Self::Fragment(Vec::new())
	}

	/// Sets an attribute, or a string prop on component nodes.
	///
	/// `ref`, `bindText` and `bindUnsafeText` are interpreted instead of being forwarded.
	#[must_use]
	pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
		let value = value.into();
		match name {
			"ref" => return self.with_ref(value),
			"bindText" => return self.bind_text(value),
			"bindUnsafeText" => return self.bind_unsafe_text(value),
			_ => (),
		}
		match &mut self {
			Self::Intrinsic(intrinsic) => match intrinsic.attributes.iter_mut().find(|(n, _)| n == name) {
				Some((_, existing)) => *existing = value,
				None => intrinsic.attributes.push((name.to_owned(), value)),
			},
			Self::Component(node) => node.props.set(name, Value::String(value)),
			Self::Text(_) | Self::UnsafeHtml(_) | Self::Fragment(_) => error!(name, "Attributes need an element node."),
		}
		self
	}

	#[must_use]
	pub fn id(self, id: impl Into<String>) -> Self {
		self.attr("id", id)
	}

	#[must_use]
	pub fn class(self, class: impl Into<String>) -> Self {
		self.attr("class", class)
	}

	#[must_use]
	pub fn with_ref(mut self, name: impl Into<String>) -> Self {
		match &mut self {
			Self::Intrinsic(Intrinsic { ref_name, .. }) | Self::Component(ComponentNode { ref_name, .. }) => *ref_name = Some(name.into()),
			Self::Text(_) | Self::UnsafeHtml(_) | Self::Fragment(_) => error!("Refs need an element or component node."),
		}
		self
	}

	#[must_use]
	pub fn bind_text(self, key: impl Into<String>) -> Self {
		self.with_text_binding(TextBinding::Escaped(key.into()))
	}

	#[must_use]
	pub fn bind_unsafe_text(self, key: impl Into<String>) -> Self {
		self.with_text_binding(TextBinding::Unsafe(key.into()))
	}

	fn with_text_binding(mut self, binding: TextBinding) -> Self {
		match &mut self {
			Self::Intrinsic(intrinsic) => intrinsic.text_binding = Some(binding),
			_ => error!("Text bindings need an element node."),
		}
		self
	}

	#[must_use]
	pub fn child(mut self, child: impl Into<Element>) -> Self {
		match &mut self {
			Self::Intrinsic(Intrinsic { children, .. }) | Self::Component(ComponentNode { children, .. }) | Self::Fragment(children) => {
				children.push(child.into());
			}
			Self::Text(_) | Self::UnsafeHtml(_) => error!("Text can't have children."),
		}
		self
	}

	#[must_use]
	pub fn children(self, children: impl IntoIterator<Item = Element>) -> Self {
		children.into_iter().fold(self, |element, child| element.child(child))
	}

	#[must_use]
	pub fn with_text(self, text: impl Into<String>) -> Self {
		self.child(Self::Text(text.into()))
	}

	/// Serializes the tree, instantiating (but not binding) the components it references.
	///
	/// # Errors
	///
	/// Iff a referenced component fails to render.
	pub fn to_html(&self) -> Result<String> {
		let text = Text::new();
		let mut scope = Scope::new("(tree)", RenderId::next(), &text);
		let mut html = String::new();
		self.write_html(&mut html, &mut scope)?;
		Ok(html)
	}

	pub(crate) fn write_html(&self, html: &mut String, scope: &mut Scope<'_>) -> Result<()> {
		match self {
			Self::Text(text) => html.push_str(&html::escape_text(text)),
			Self::UnsafeHtml(markup) => html.push_str(markup),
			Self::Fragment(elements) => {
				for element in elements {
					element.write_html(html, scope)?;
				}
			}
			Self::Intrinsic(intrinsic) => {
				html::write_start_tag(html, &intrinsic.tag, intrinsic.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str())));
				match &intrinsic.text_binding {
					Some(TextBinding::Escaped(key)) => html.push_str(&html::escape_text(scope.text.get(key))),
					Some(TextBinding::Unsafe(key)) => html.push_str(scope.text.get(key)),
					None => {
						for child in &intrinsic.children {
							child.write_html(html, scope)?;
						}
					}
				}
				html::write_end_tag(html, &intrinsic.tag);
			}
			Self::Component(node) => {
				let handle = node.instantiate();
				handle.write_html(html, scope.render_id)?;
				scope.components.push((node.key(), handle));
			}
		}
		Ok(())
	}

	pub(crate) fn check_root(&self, component: &'static str) -> Result<()> {
		match self {
			Self::Intrinsic(_) | Self::Component(_) => Ok(()),
			Self::Fragment(elements) if elements.len() == 1 => elements[0].check_root(component),
			Self::Text(_) | Self::UnsafeHtml(_) | Self::Fragment(_) => Err(Error::InvalidRoot { component }),
		}
	}

	/// Materializes a component's root, which must be an element or another component.
	pub(crate) fn to_dom_root(&self, scope: &mut Scope<'_>) -> Result<DomElement> {
		let _span = trace_span!("to_dom", component = scope.component).entered();
		match self {
			Self::Intrinsic(intrinsic) => intrinsic.to_dom(scope),
			Self::Component(node) => {
				let handle = node.instantiate();
				let root = handle.materialize(scope.render_id)?;
				scope.components.push((node.key(), handle));
				Ok(root)
			}
			Self::Fragment(elements) if elements.len() == 1 => elements[0].to_dom_root(scope),
			Self::Text(_) | Self::UnsafeHtml(_) | Self::Fragment(_) => Err(Error::InvalidRoot { component: scope.component }),
		}
	}

	fn append_to_dom(&self, parent: &DomElement, scope: &mut Scope<'_>) -> Result<()> {
		match self {
			Self::Text(text) => parent.append_text(text),
			Self::UnsafeHtml(markup) => parent.append_raw_html(markup),
			Self::Fragment(elements) => {
				for element in elements {
					element.append_to_dom(parent, scope)?;
				}
			}
			Self::Intrinsic(_) | Self::Component(_) => {
				parent.append(&self.to_dom_root(scope)?);
			}
		}
		Ok(())
	}

	/// Binds a component's root onto existing DOM.
	pub(crate) fn hydrate_root(&self, dom: &DomElement, scope: &mut Scope<'_>) -> Result<()> {
		let _span = trace_span!("hydrate", component = scope.component).entered();
		match self {
			Self::Intrinsic(intrinsic) => intrinsic.hydrate(dom, scope),
			Self::Component(node) => {
				let handle = node.instantiate();
				handle.hydrate_materialize(dom, scope.render_id)?;
				scope.components.push((node.key(), handle));
				Ok(())
			}
			Self::Fragment(elements) if elements.len() == 1 => elements[0].hydrate_root(dom, scope),
			Self::Text(_) | Self::UnsafeHtml(_) | Self::Fragment(_) => Err(Error::InvalidRoot { component: scope.component }),
		}
	}

	/// Walks `dom_children` positionally. Text content doesn't occupy a position.
	fn hydrate_child(&self, dom_children: &[DomElement], index: &mut usize, scope: &mut Scope<'_>) -> Result<()> {
		match self {
			Self::Text(_) => Ok(()),
			Self::UnsafeHtml(markup) => {
				if markup.contains('<') {
					trace!("Skipping markup while hydrating. Later siblings may mismatch.");
				}
				Ok(())
			}
			Self::Fragment(elements) => elements.iter().try_for_each(|element| element.hydrate_child(dom_children, index, scope)),
			Self::Intrinsic(_) | Self::Component(_) => {
				let Some(dom) = dom_children.get(*index) else {
					error!(component = scope.component, index = *index, "Hydration walked past the end of the element list.");
					return Err(Error::Hydration {
						component: scope.component,
						reason: format!("missing element at position {}", index),
					});
				};
				*index += 1;
				self.hydrate_root(dom, scope)
			}
		}
	}
}

impl Intrinsic {
	fn to_dom(&self, scope: &mut Scope<'_>) -> Result<DomElement> {
		let element = DomElement::create(&self.tag);
		for (name, value) in &self.attributes {
			element.set_attribute(name, value);
		}
		match &self.text_binding {
			Some(TextBinding::Escaped(key)) => {
				element.set_text(scope.text.get(key));
			}
			Some(TextBinding::Unsafe(key)) => {
				element.set_html(scope.text.get(key));
			}
			None => {
				for child in &self.children {
					child.append_to_dom(&element, scope)?;
				}
			}
		}
		self.register_ref(&element, scope);
		Ok(element)
	}

	fn hydrate(&self, dom: &DomElement, scope: &mut Scope<'_>) -> Result<()> {
		let found = dom.tag_name();
		if !found.eq_ignore_ascii_case(&self.tag) {
			error!(component = scope.component, expected = %self.tag, %found, "Hydration found a different element.");
			return Err(Error::Hydration {
				component: scope.component,
				reason: format!("expected <{}>, found <{}>", self.tag, found),
			});
		}
		if self.text_binding.is_none() {
			let dom_children = dom.children();
			let mut index = 0;
			for child in &self.children {
				child.hydrate_child(&dom_children, &mut index, scope)?;
			}
			if index < dom_children.len() {
				trace!(component = scope.component, extra = dom_children.len() - index, "Hydration left elements unvisited.");
			}
		}
		self.register_ref(dom, scope);
		Ok(())
	}

	fn register_ref(&self, element: &DomElement, scope: &mut Scope<'_>) {
		if let Some(name) = &self.ref_name {
			if scope.refs.insert(name.clone(), element.clone()).is_some() {
				error!(component = scope.component, name = %name, "Duplicate ref. The later element wins.");
			}
		}
	}
}

/// State collected while one component's tree is materialized.
pub(crate) struct Scope<'a> {
	pub component: &'static str,
	pub render_id: RenderId,
	pub text: &'a Text,
	pub refs: HashMap<String, DomElement>,
	pub components: Vec<(String, ComponentHandle)>,
}

impl<'a> Scope<'a> {
	pub fn new(component: &'static str, render_id: RenderId, text: &'a Text) -> Self {
		Self {
			component,
			render_id,
			text,
			refs: HashMap::new(),
			components: Vec::new(),
		}
	}
}
