//! Named publish/subscribe channels, owned by both components and data stores.

use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	sync::atomic::{AtomicU64, Ordering},
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Identifies one registered listener, whether on an [`EventEmitter`] or on a DOM element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);
impl ListenerId {
	pub(crate) fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}
}

type Callback<T> = Rc<dyn Fn(&T)>;

/// Typed event channels keyed by name (`"change"`, `"change:name"`, `"add:comments"`, …).
///
/// Listeners may subscribe or unsubscribe while an event is being emitted.
/// Such changes take effect with the next emission.
pub struct EventEmitter<T> {
	channels: RefCell<HashMap<String, Vec<(ListenerId, Callback<T>)>>>,
}

impl<T> Default for EventEmitter<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Debug for EventEmitter<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let channels = self.channels.borrow();
		f.debug_map().entries(channels.iter().map(|(name, listeners)| (name, listeners.len()))).finish()
	}
}

impl<T> EventEmitter<T> {
	#[must_use]
	pub fn new() -> Self {
		Self { channels: RefCell::default() }
	}

	pub fn on(&self, event: &str, callback: impl Fn(&T) + 'static) -> ListenerId {
		let id = ListenerId::next();
		let callback: Callback<T> = Rc::new(callback);
		self.channels.borrow_mut().entry(event.to_owned()).or_default().push((id, callback));
		id
	}

	/// Returns whether a listener was removed.
	pub fn off(&self, id: ListenerId) -> bool {
		let mut channels = self.channels.borrow_mut();
		for listeners in channels.values_mut() {
			if let Some(index) = listeners.iter().position(|(listener, _)| *listener == id) {
				listeners.remove(index);
				return true;
			}
		}
		false
	}

	pub fn off_all(&self, event: &str) {
		self.channels.borrow_mut().remove(event);
	}

	/// Calls every listener of `event` in registration order and returns how many were called.
	pub fn emit(&self, event: &str, payload: &T) -> usize {
		let listeners: Vec<Callback<T>> = match self.channels.borrow().get(event) {
			Some(listeners) => listeners.iter().map(|(_, callback)| Rc::clone(callback)).collect(),
			None => return 0,
		};
		trace!(event, count = listeners.len(), "Emitting.");
		for listener in &listeners {
			listener(payload);
		}
		listeners.len()
	}

	#[must_use]
	pub fn listener_count(&self, event: &str) -> usize {
		self.channels.borrow().get(event).map_or(0, Vec::len)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use core::cell::Cell;

	#[test]
	fn emits_to_named_channel_only() {
		let emitter = EventEmitter::<u32>::new();
		let seen = Rc::new(Cell::new(0));
		let seen_ = Rc::clone(&seen);
		emitter.on("change", move |value| seen_.set(seen_.get() + value));
		assert_eq!(emitter.emit("change", &2), 1);
		assert_eq!(emitter.emit("change:name", &5), 0);
		assert_eq!(seen.get(), 2);
	}

	#[test]
	fn off_during_emit_applies_next_time() {
		let emitter = Rc::new(EventEmitter::<()>::new());
		let calls = Rc::new(Cell::new(0));
		let id = Rc::new(Cell::new(None));
		let (emitter_, calls_, id_) = (Rc::clone(&emitter), Rc::clone(&calls), Rc::clone(&id));
		id.set(Some(emitter.on("tick", move |_| {
			calls_.set(calls_.get() + 1);
			if let Some(id) = id_.get() {
				emitter_.off(id);
			}
		})));
		emitter.emit("tick", &());
		emitter.emit("tick", &());
		assert_eq!(calls.get(), 1);
		assert_eq!(emitter.listener_count("tick"), 0);
	}
}
