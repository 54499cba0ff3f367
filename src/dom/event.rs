use core::cell::Cell;

/// An event delivered to listeners registered through [`DomElement`](`super::DomElement`).
///
/// Events from the browser carry the native event, so [`DomEvent::prevent_default`] affects the page.
#[derive(Debug)]
pub struct DomEvent {
	event_type: String,
	which: Option<u32>,
	default_prevented: Cell<bool>,
	propagation_stopped: Cell<bool>,
	#[cfg(target_arch = "wasm32")]
	native: Option<web_sys::Event>,
}

impl DomEvent {
	/// A synthetic event, as dispatched with [`DomElement::dispatch_event`](`super::DomElement::dispatch_event`).
	#[must_use]
	pub fn new(event_type: impl Into<String>) -> Self {
		Self {
			event_type: event_type.into(),
			which: None,
			default_prevented: Cell::new(false),
			propagation_stopped: Cell::new(false),
			#[cfg(target_arch = "wasm32")]
			native: None,
		}
	}

	/// Sets the key code reported by [`DomEvent::which`].
	#[must_use]
	pub fn with_which(mut self, which: u32) -> Self {
		self.which = Some(which);
		self
	}

	#[cfg(target_arch = "wasm32")]
	pub(crate) fn from_native(event: web_sys::Event) -> Self {
		use wasm_bindgen::JsCast;
		let which = event.dyn_ref::<web_sys::KeyboardEvent>().map(web_sys::KeyboardEvent::key_code);
		Self {
			event_type: event.type_(),
			which,
			default_prevented: Cell::new(event.default_prevented()),
			propagation_stopped: Cell::new(false),
			native: Some(event),
		}
	}

	#[must_use]
	pub fn event_type(&self) -> &str {
		&self.event_type
	}

	/// The key code of keyboard events.
	#[must_use]
	pub fn which(&self) -> Option<u32> {
		self.which
	}

	pub fn prevent_default(&self) {
		self.default_prevented.set(true);
		#[cfg(target_arch = "wasm32")]
		{
			if let Some(native) = &self.native {
				native.prevent_default();
			}
		}
	}

	#[must_use]
	pub fn is_default_prevented(&self) -> bool {
		self.default_prevented.get()
	}

	pub fn stop_propagation(&self) {
		self.propagation_stopped.set(true);
		#[cfg(target_arch = "wasm32")]
		{
			if let Some(native) = &self.native {
				native.stop_propagation();
			}
		}
	}

	#[must_use]
	pub fn is_propagation_stopped(&self) -> bool {
		self.propagation_stopped.get()
	}

	#[cfg(target_arch = "wasm32")]
	#[must_use]
	pub fn native(&self) -> Option<&web_sys::Event> {
		self.native.as_ref()
	}
}
