//! Event bindings: element-scoped DOM event declarations surfaced as
//! server-side streams.

use filament_reactive::EventStream;
use serde_json::Value;
use tracing::debug;

/// The attribute carrying dispatch directives.
///
/// Each event binding contributes one `name:element_id` token; multiple
/// bindings on the same element are space-separated, like `class` tokens.
/// The client runtime reads this attribute to know which DOM events to
/// report back and under what name.
pub const DISPATCH_ATTR: &str = "data-event";

/// A typed DOM event, constructed from the raw payload of a client report.
pub trait DomEvent: Send + Sync + 'static {
	/// Builds the event from the report's payload. `None` means the payload
	/// is unusable; the report is then dropped, not raised.
	fn from_raw(raw: &Value) -> Option<Self>
	where
		Self: Sized;
}

/// A `change` event, carrying the control's new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
	/// The control's value at the time of the event.
	pub value: String,
}

impl DomEvent for Change {
	fn from_raw(raw: &Value) -> Option<Self> {
		let value = match raw.get("value") {
			Some(Value::String(s)) => s.clone(),
			Some(Value::Number(n)) => n.to_string(),
			Some(Value::Bool(b)) => b.to_string(),
			Some(_) => return None,
			None => String::new(),
		};
		Some(Self { value })
	}
}

/// A `click` event with its modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Click {
	/// Alt key held.
	pub alt: bool,
	/// Ctrl key held.
	pub ctrl: bool,
	/// Shift key held.
	pub shift: bool,
	/// Meta key held.
	pub meta: bool,
}

impl DomEvent for Click {
	fn from_raw(raw: &Value) -> Option<Self> {
		let flag = |name: &str| raw.get(name).and_then(Value::as_bool).unwrap_or(false);
		Some(Self {
			alt: flag("alt"),
			ctrl: flag("ctrl"),
			shift: flag("shift"),
			meta: flag("meta"),
		})
	}
}

/// A `keyup` event carrying the key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUp {
	/// The key code reported by the client.
	pub code: u32,
}

impl DomEvent for KeyUp {
	fn from_raw(raw: &Value) -> Option<Self> {
		let code = raw.get("code").and_then(Value::as_u64)?;
		Some(Self { code: code as u32 })
	}
}

/// Object-safe face of an event binding, as seen by the render composer and
/// the dispatch path.
pub trait EventSource: Send + Sync {
	/// The event name this binding owns (e.g. `change`).
	fn name(&self) -> &str;

	/// The dispatch directive this binding contributes to
	/// [`DISPATCH_ATTR`] when the element renders.
	fn dispatch_directive(&self, element_id: &str) -> String {
		format!("{}:{}", self.name(), element_id)
	}

	/// Feeds a raw client payload into the typed stream. Returns whether a
	/// typed event was emitted.
	fn fire_raw(&self, raw: &Value) -> bool;
}

/// A named, element-scoped source of client-originated events.
///
/// Rendering contributes the dispatch directive; inbound reports matching
/// the binding's name emit on [`EventBinding::stream`], synchronously, to
/// all current subscribers.
pub struct EventBinding<E: DomEvent> {
	name: String,
	stream: EventStream<E>,
}

impl<E: DomEvent> EventBinding<E> {
	/// Creates a binding for the named DOM event.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			stream: EventStream::new(),
		}
	}

	/// The stream of typed events arriving from clients.
	pub fn stream(&self) -> &EventStream<E> {
		&self.stream
	}
}

impl<E: DomEvent> EventSource for EventBinding<E> {
	fn name(&self) -> &str {
		&self.name
	}

	fn fire_raw(&self, raw: &Value) -> bool {
		match E::from_raw(raw) {
			Some(event) => {
				self.stream.fire(event);
				true
			}
			None => {
				debug!(event = %self.name, "undecodable event payload dropped");
				false
			}
		}
	}
}
