//! Stateful, composable UI units and their render → bind → remove lifecycle.
//!
//! A component renders an [`Element`] tree, which is materialized once per render generation.
//! Nested components are instantiated and bound while their subtree is materialized, so by the time
//! a component's own [`Component::bind_interactions`] runs, every descendant is already bound.
//!
//! Binding is keyed by [`RenderId`]: [`ComponentHandle::bind_dom`] with an id older than the last bound one
//! does nothing, which is how superseded renders are cancelled.

use crate::{
	dom::DomElement,
	emitter::{EventEmitter, ListenerId},
	props::{Props, Text},
	tree::{short_name, Element, RenderId, Scope},
	Error, Localization, Result,
};
use core::{
	any::Any,
	cell::{Ref, RefCell, RefMut},
	fmt::{self, Debug, Formatter},
	future::Future,
	mem,
};
use futures::{
	channel::oneshot,
	future::{self, join_all, LocalBoxFuture},
	FutureExt,
};
use hashbrown::HashMap;
use serde_json::{Map, Value};
use std::rc::{Rc, Weak};
use tracing::{error, instrument, trace, warn};

/// Signals that a lifecycle hook has finished, possibly after a transition.
pub type Completion = LocalBoxFuture<'static, ()>;

/// An already finished [`Completion`].
#[must_use]
pub fn ready() -> Completion {
	future::ready(()).boxed_local()
}

/// A [`Completion`] that finishes once the returned [`Resolver`] is resolved or dropped.
///
/// ```
/// use composer::{component::completion, dom::{DomElement, DomEvent}};
///
/// let overlay = DomElement::create_virtual("div");
/// let (resolver, done) = completion();
/// overlay.on_transition_end(move || resolver.resolve());
/// overlay.add_class("Hidden");
/// overlay.dispatch_event(&DomEvent::new("transitionend"));
/// futures::executor::block_on(done);
/// ```
#[must_use]
pub fn completion() -> (Resolver, Completion) {
	let (sender, receiver) = oneshot::channel();
	(Resolver(sender), receiver.map(drop).boxed_local())
}

#[derive(Debug)]
pub struct Resolver(oneshot::Sender<()>);
impl Resolver {
	pub fn resolve(self) {
		// The receiving side may be gone already.
		let _ = self.0.send(());
	}
}

/// The asynchronous lifecycle hooks [`ComponentHandle::recursively_call_method`] can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
	Remove,
	Hide,
	Show,
}

/// A stateful UI unit.
///
/// Implementors embed a [`Base`] and expose it through [`Component::base`] and [`Component::base_mut`].
pub trait Component: 'static {
	fn create(props: Props, children: Vec<Element>) -> Self
	where
		Self: Sized;

	fn base(&self) -> &Base;
	fn base_mut(&mut self) -> &mut Base;

	/// Must not touch elements or perform I/O. Called again for every render generation.
	fn render(&self) -> Element;

	/// Computes the text table ahead of each render, if the props carry a [`Localization`].
	fn localize(&self, l: &Localization) -> Text {
		let _ = l;
		self.base().text.clone()
	}

	/// Wires up event listeners once elements and child components are bound.
	fn bind_interactions(&mut self) {}

	fn on_remove(&mut self) -> Completion {
		ready()
	}

	fn on_hide(&mut self) -> Completion {
		ready()
	}

	fn on_show(&mut self) -> Completion {
		ready()
	}

	/// A handle for listeners that need to reach back into this component.
	///
	/// Empty until the component is owned by a [`ComponentHandle`].
	fn weak(&self) -> WeakComponent<Self>
	where
		Self: Sized,
	{
		let weak = self
			.base()
			.this
			.as_ref()
			.and_then(Weak::upgrade)
			.and_then(|any| any.downcast::<RefCell<Self>>().ok())
			.map_or_else(Weak::new, |strong| Rc::downgrade(&strong));
		WeakComponent(weak)
	}
}

struct Pending {
	render_id: RenderId,
	root: DomElement,
	refs: HashMap<String, DomElement>,
	components: Vec<(String, ComponentHandle)>,
}

/// Lifecycle state shared by all components.
pub struct Base {
	pub props: Props,
	pub text: Text,
	/// The children passed to the component node.
	pub children: Vec<Element>,
	elements: HashMap<String, DomElement>,
	components: Vec<(String, ComponentHandle)>,
	root: Option<DomElement>,
	has_bound_dom: bool,
	has_rendered_first_element: bool,
	last_render_id: RenderId,
	removed: bool,
	pending: Option<Pending>,
	events: EventEmitter<Value>,
	this: Option<Weak<dyn Any>>,
}

impl Debug for Base {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Base")
			.field("props", &self.props)
			.field("elements", &self.elements.keys().collect::<Vec<_>>())
			.field("components", &self.components.iter().map(|(key, _)| key).collect::<Vec<_>>())
			.field("has_bound_dom", &self.has_bound_dom)
			.field("last_render_id", &self.last_render_id)
			.field("removed", &self.removed)
			.finish_non_exhaustive()
	}
}

impl Base {
	#[must_use]
	pub fn new(props: Props, children: Vec<Element>) -> Self {
		Self {
			props,
			text: Text::new(),
			children,
			elements: HashMap::new(),
			components: Vec::new(),
			root: None,
			has_bound_dom: false,
			has_rendered_first_element: false,
			last_render_id: RenderId::NONE,
			removed: false,
			pending: None,
			events: EventEmitter::new(),
			this: None,
		}
	}

	/// The element registered under `name` by the last bound render.
	///
	/// [`None`] before binding and after removal.
	#[must_use]
	pub fn element(&self, name: &str) -> Option<&DomElement> {
		if !self.has_bound_dom || self.removed {
			warn!(name, bound = self.has_bound_dom, removed = self.removed, "Elements aren't available.");
			return None;
		}
		let element = self.elements.get(name);
		if element.is_none() {
			warn!(name, "No element with this ref.");
		}
		element
	}

	pub fn elements(&self) -> impl Iterator<Item = (&str, &DomElement)> {
		let available = self.has_bound_dom && !self.removed;
		self.elements.iter().filter(move |_| available).map(|(name, element)| (name.as_str(), element))
	}

	#[must_use]
	pub fn root(&self) -> Option<&DomElement> {
		self.root.as_ref()
	}

	#[must_use]
	pub fn has_bound_dom(&self) -> bool {
		self.has_bound_dom
	}

	#[must_use]
	pub fn has_rendered_first_element(&self) -> bool {
		self.has_rendered_first_element
	}

	#[must_use]
	pub fn last_render_id(&self) -> RenderId {
		self.last_render_id
	}

	#[must_use]
	pub fn is_removed(&self) -> bool {
		self.removed
	}

	/// Instantiated child components, keyed by ref or type name.
	pub fn instantiated_components(&self) -> impl Iterator<Item = (&str, &ComponentHandle)> {
		self.components.iter().map(|(key, handle)| (key.as_str(), handle))
	}

	/// Doesn't re-render.
	pub fn set_prop(&mut self, name: &str, value: impl Into<Value>) {
		self.props.set(name, value);
	}

	/// Doesn't re-render.
	pub fn set_props(&mut self, values: Map<String, Value>) {
		self.props.merge(values);
	}

	pub fn unset_prop(&mut self, name: &str) {
		self.props.unset(name);
	}

	pub fn on(&self, event: &str, callback: impl Fn(&Value) + 'static) -> ListenerId {
		self.events.on(event, callback)
	}

	pub fn off(&self, id: ListenerId) -> bool {
		self.events.off(id)
	}

	pub fn emit(&self, event: &str, payload: &Value) -> usize {
		self.events.emit(event, payload)
	}
}

/// The outcome of materializing a component onto DOM, not yet bound.
#[derive(Debug, Clone)]
pub struct Rendered {
	pub render_id: RenderId,
	pub root: DomElement,
}

/// Shared ownership of a live component.
#[derive(Clone)]
pub struct ComponentHandle {
	name: &'static str,
	dynamic: Rc<RefCell<dyn Component>>,
	any: Rc<dyn Any>,
}

impl Debug for ComponentHandle {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ComponentHandle").field(&self.name).finish()
	}
}

impl PartialEq for ComponentHandle {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.any, &other.any)
	}
}

impl ComponentHandle {
	#[must_use]
	pub fn new<C: Component>(props: Props, children: Vec<Element>) -> Self {
		let handle = Self::from_rc(Rc::new(RefCell::new(C::create(props, children))));
		handle.dynamic.borrow_mut().base_mut().this = Some(Rc::downgrade(&handle.any));
		handle
	}

	fn from_rc<C: Component>(component: Rc<RefCell<C>>) -> Self {
		let any: Rc<dyn Any> = Rc::clone(&component) as Rc<dyn Any>;
		Self {
			name: core::any::type_name::<C>(),
			dynamic: component,
			any,
		}
	}

	/// The component's type name.
	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}

	#[must_use]
	pub fn downcast<C: Component>(&self) -> Option<Rc<RefCell<C>>> {
		Rc::clone(&self.any).downcast::<RefCell<C>>().ok()
	}

	/// # Panics
	///
	/// Iff the component is currently mutably borrowed, e.g. from within [`WeakComponent::with`].
	#[must_use]
	pub fn borrow(&self) -> Ref<'_, dyn Component> {
		self.dynamic.borrow()
	}

	fn borrow_mut(&self) -> Result<RefMut<'_, dyn Component>> {
		self.dynamic.try_borrow_mut().map_err(|_| {
			error!(component = self.name, "Re-entrant component access.");
			Error::Reentrant { component: self.name }
		})
	}

	#[must_use]
	pub fn is_removed(&self) -> bool {
		self.dynamic.try_borrow().map_or(false, |component| component.base().removed)
	}

	fn render_tree(component: &mut dyn Component) -> Element {
		if let Some(l) = component.base().props.l.clone() {
			let text = component.localize(&l);
			component.base_mut().text = text;
		}
		component.render()
	}

	/// Renders to an HTML string for a server paint. Child components are instantiated but not bound.
	///
	/// # Errors
	///
	/// Iff this or a nested component renders an invalid root.
	pub fn to_html(&self) -> Result<String> {
		let mut html = String::new();
		self.write_html(&mut html, RenderId::next())?;
		Ok(html)
	}

	/// Instantiates the nested components of a fresh render, without producing DOM.
	///
	/// # Errors
	///
	/// Like [`ComponentHandle::to_html`].
	pub fn instantiate_components(&self) -> Result<()> {
		self.write_html(&mut String::new(), RenderId::next())
	}

	pub(crate) fn write_html(&self, html: &mut String, render_id: RenderId) -> Result<()> {
		let mut component = self.borrow_mut()?;
		let tree = Self::render_tree(&mut *component);
		tree.check_root(self.name)?;
		let text = component.base().text.clone();
		let mut scope = Scope::new(self.name, render_id, &text);
		tree.write_html(html, &mut scope)?;
		component.base_mut().components = scope.components;
		Ok(())
	}

	/// Materializes a fresh render into new DOM elements and stages it for [`ComponentHandle::bind_dom`].
	///
	/// # Errors
	///
	/// Iff this or a nested component renders an invalid root.
	/// The previously bound state is kept in that case.
	pub fn to_dom(&self) -> Result<Rendered> {
		let render_id = RenderId::next();
		let root = self.stage_dom(render_id)?;
		Ok(Rendered { render_id, root })
	}

	fn stage_dom(&self, render_id: RenderId) -> Result<DomElement> {
		let mut component = self.borrow_mut()?;
		let tree = Self::render_tree(&mut *component);
		let text = component.base().text.clone();
		let mut scope = Scope::new(self.name, render_id, &text);
		let root = match tree.to_dom_root(&mut scope) {
			Ok(root) => root,
			Err(error) => {
				drop(component);
				discard(self.name, scope.components);
				return Err(error);
			}
		};
		let Scope { refs, components, .. } = scope;
		self.stage(
			component,
			Pending {
				render_id,
				root: root.clone(),
				refs,
				components,
			},
		);
		Ok(root)
	}

	/// Replaces the staged render. Child components of an unbound earlier one are removed.
	fn stage(&self, mut component: RefMut<'_, dyn Component>, pending: Pending) {
		let superseded = component.base_mut().pending.replace(pending);
		drop(component);
		if let Some(superseded) = superseded {
			trace!(component = self.name, render_id = ?superseded.render_id, "Superseded an unbound render.");
			discard(self.name, superseded.components);
		}
	}

	pub(crate) fn materialize(&self, render_id: RenderId) -> Result<DomElement> {
		let root = self.stage_dom(render_id)?;
		self.bind_dom(render_id);
		Ok(root)
	}

	/// Attaches a fresh render to DOM that a server paint of this component produced, staging it for binding.
	///
	/// # Errors
	///
	/// [`Error::Hydration`] iff the DOM doesn't match the rendered tree.
	pub fn hydrate(&self, root: &DomElement) -> Result<Rendered> {
		let render_id = RenderId::next();
		self.stage_hydration(root, render_id)?;
		Ok(Rendered {
			render_id,
			root: root.clone(),
		})
	}

	fn stage_hydration(&self, root: &DomElement, render_id: RenderId) -> Result<()> {
		let mut component = self.borrow_mut()?;
		let tree = Self::render_tree(&mut *component);
		let text = component.base().text.clone();
		let mut scope = Scope::new(self.name, render_id, &text);
		if let Err(error) = tree.hydrate_root(root, &mut scope) {
			drop(component);
			discard(self.name, scope.components);
			return Err(error);
		}
		let Scope { refs, components, .. } = scope;
		self.stage(
			component,
			Pending {
				render_id,
				root: root.clone(),
				refs,
				components,
			},
		);
		Ok(())
	}

	pub(crate) fn hydrate_materialize(&self, root: &DomElement, render_id: RenderId) -> Result<()> {
		self.stage_hydration(root, render_id)?;
		self.bind_dom(render_id);
		Ok(())
	}

	/// Commits the render staged under `render_id`, then calls [`Component::bind_interactions`].
	///
	/// Returns whether anything was bound. Ids older than the last bound one, and ids without a staged render, are ignored.
	#[instrument(skip(self), fields(component = self.name))]
	pub fn bind_dom(&self, render_id: RenderId) -> bool {
		let Ok(mut component) = self.borrow_mut() else {
			return false;
		};
		let base = component.base_mut();
		if base.removed || render_id < base.last_render_id {
			trace!(last = ?base.last_render_id, removed = base.removed, "Ignoring stale bind.");
			return false;
		}
		let pending = match base.pending.take() {
			Some(pending) if pending.render_id == render_id => pending,
			other => {
				base.pending = other;
				trace!("Nothing staged for this render.");
				return false;
			}
		};
		base.elements = pending.refs;
		let replaced = mem::replace(&mut base.components, pending.components);
		base.root = Some(pending.root);
		base.has_bound_dom = true;
		base.has_rendered_first_element = true;
		base.last_render_id = render_id;
		component.bind_interactions();
		drop(component);
		discard(self.name, replaced);
		true
	}

	/// Materializes, appends to `parent` and binds.
	///
	/// # Errors
	///
	/// Like [`ComponentHandle::to_dom`].
	pub fn mount(&self, parent: &DomElement) -> Result<DomElement> {
		let Rendered { render_id, root } = self.to_dom()?;
		parent.append(&root);
		self.bind_dom(render_id);
		Ok(root)
	}

	/// Renders a new generation, puts its root in place of the current one and removes the previous child components.
	///
	/// # Errors
	///
	/// Like [`ComponentHandle::to_dom`]. The current DOM stays untouched in that case.
	#[instrument(skip(self), fields(component = self.name))]
	pub fn rerender(&self) -> Result<DomElement> {
		let Rendered { render_id, root } = self.to_dom()?;
		let (previous_root, previous_components) = {
			let mut component = self.borrow_mut()?;
			let base = component.base_mut();
			(base.root.clone(), mem::take(&mut base.components))
		};
		if let Some(previous_root) = previous_root {
			previous_root.insert_after(&root);
			previous_root.remove();
		}
		self.bind_dom(render_id);
		for (_, child) in previous_components {
			child.remove();
		}
		Ok(root)
	}

	/// Runs `hook` on every descendant and on this component, finishing once all of them have.
	pub fn recursively_call_method(&self, hook: Hook) -> Completion {
		let children: Vec<ComponentHandle> = match self.dynamic.try_borrow() {
			Ok(component) => component.base().components.iter().map(|(_, child)| child.clone()).collect(),
			Err(_) => {
				error!(component = self.name, ?hook, "Re-entrant component access.");
				return ready();
			}
		};
		let mut completions: Vec<Completion> = children.iter().map(|child| child.recursively_call_method(hook)).collect();
		match self.borrow_mut() {
			Ok(mut component) => completions.push(match hook {
				Hook::Remove => component.on_remove(),
				Hook::Hide => component.on_hide(),
				Hook::Show => component.on_show(),
			}),
			Err(_) => return ready(),
		}
		join_all(completions).map(drop).boxed_local()
	}

	/// Detaches the root element and removes every child component. The instance must not be reused afterwards.
	pub fn remove(&self) {
		let children = {
			let Ok(mut component) = self.borrow_mut() else {
				return;
			};
			let base = component.base_mut();
			if base.removed {
				return;
			}
			base.removed = true;
			if let Some(root) = &base.root {
				root.remove();
			}
			let mut children = mem::take(&mut base.components);
			if let Some(pending) = base.pending.take() {
				children.extend(pending.components);
			}
			children
		};
		trace!(component = self.name, children = children.len(), "Removed.");
		for (_, child) in children {
			child.remove();
		}
	}

	/// Waits for [`Component::on_remove`] across the subtree, then [removes](`ComponentHandle::remove`).
	pub fn remove_gracefully(&self) -> impl Future<Output = ()> + 'static {
		let this = self.clone();
		self.recursively_call_method(Hook::Remove).map(move |()| this.remove())
	}

	/// The instantiated child components registered under any of `names`.
	#[must_use]
	pub fn get_instances_of(&self, names: &[&str]) -> HashMap<String, ComponentHandle> {
		self.borrow()
			.base()
			.components
			.iter()
			.filter(|(key, _)| names.contains(&key.as_str()))
			.map(|(key, handle)| (key.clone(), handle.clone()))
			.collect()
	}

	/// The first child component registered under `name`, if it's a `C`.
	#[must_use]
	pub fn child<C: Component>(&self, name: &str) -> Option<Rc<RefCell<C>>> {
		let component = self.borrow();
		let (_, handle) = component.base().components.iter().find(|(key, _)| key == name)?;
		let child = handle.downcast::<C>();
		if child.is_none() {
			warn!(name, expected = short_name(core::any::type_name::<C>()), found = short_name(handle.name), "Child has a different type.");
		}
		child
	}
}

fn discard(component: &'static str, children: Vec<(String, ComponentHandle)>) {
	if !children.is_empty() {
		trace!(component, children = children.len(), "Discarding child components.");
	}
	for (_, child) in children {
		child.remove();
	}
}

/// A non-owning reference to a component, for use in event listeners.
pub struct WeakComponent<C>(Weak<RefCell<C>>);

impl<C> Clone for WeakComponent<C> {
	fn clone(&self) -> Self {
		Self(Weak::clone(&self.0))
	}
}

impl<C> Debug for WeakComponent<C> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("WeakComponent").field(&core::any::type_name::<C>()).finish()
	}
}

impl<C: Component> WeakComponent<C> {
	/// Runs `f` on the component, unless it's gone or already borrowed.
	pub fn with<R>(&self, f: impl FnOnce(&mut C) -> R) -> Option<R> {
		let component = self.0.upgrade()?;
		let result = match component.try_borrow_mut() {
			Ok(mut component) => Some(f(&mut component)),
			Err(_) => {
				error!(component = core::any::type_name::<C>(), "Skipping re-entrant component access.");
				None
			}
		};
		result
	}

	#[must_use]
	pub fn handle(&self) -> Option<ComponentHandle> {
		self.0.upgrade().map(ComponentHandle::from_rc)
	}

	/// See [`ComponentHandle::rerender`]. Does nothing once the component is gone.
	///
	/// # Errors
	///
	/// Like [`ComponentHandle::rerender`].
	pub fn rerender(&self) -> Result<()> {
		match self.handle() {
			Some(handle) => handle.rerender().map(drop),
			None => Ok(()),
		}
	}
}
