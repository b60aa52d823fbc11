//! Property bindings: element attributes driven by reactive variables.

use std::sync::{Arc, Weak};

use filament_reactive::Var;
use serde_json::Value;
use tracing::trace;

use crate::error::{CoreResult, DecodeError, ElementError};
use crate::page::{Page, PropertyUpdate};

/// The closed set of value types a property binding can carry.
///
/// Each supported type defines its serialization to attribute text and its
/// decoding from a client payload. Binding a property to any other type is
/// rejected when the binding is constructed — by the compiler, via this
/// bound — never at render time.
pub trait PropertyCodec: Clone + Send + Sync + 'static {
	/// Serializes the value to attribute text.
	fn to_attribute(&self) -> String;

	/// Decodes a value from a client-supplied JSON payload.
	fn from_client(raw: &Value) -> Result<Self, DecodeError>;
}

impl PropertyCodec for String {
	fn to_attribute(&self) -> String {
		self.clone()
	}

	fn from_client(raw: &Value) -> Result<Self, DecodeError> {
		match raw {
			Value::String(s) => Ok(s.clone()),
			Value::Number(n) => Ok(n.to_string()),
			Value::Bool(b) => Ok(b.to_string()),
			other => Err(DecodeError(format!("expected a string, got {other}"))),
		}
	}
}

impl PropertyCodec for i64 {
	fn to_attribute(&self) -> String {
		self.to_string()
	}

	fn from_client(raw: &Value) -> Result<Self, DecodeError> {
		match raw {
			Value::Number(n) => n
				.as_i64()
				.ok_or_else(|| DecodeError(format!("not an integer: {n}"))),
			Value::String(s) => s
				.parse()
				.map_err(|_| DecodeError(format!("not an integer: {s:?}"))),
			other => Err(DecodeError(format!("expected an integer, got {other}"))),
		}
	}
}

impl PropertyCodec for f64 {
	fn to_attribute(&self) -> String {
		self.to_string()
	}

	fn from_client(raw: &Value) -> Result<Self, DecodeError> {
		match raw {
			Value::Number(n) => n
				.as_f64()
				.ok_or_else(|| DecodeError(format!("not a number: {n}"))),
			Value::String(s) => s
				.parse()
				.map_err(|_| DecodeError(format!("not a number: {s:?}"))),
			other => Err(DecodeError(format!("expected a number, got {other}"))),
		}
	}
}

impl PropertyCodec for bool {
	fn to_attribute(&self) -> String {
		self.to_string()
	}

	fn from_client(raw: &Value) -> Result<Self, DecodeError> {
		match raw {
			Value::Bool(b) => Ok(*b),
			Value::String(s) => match s.as_str() {
				"true" | "1" => Ok(true),
				"false" | "0" | "" => Ok(false),
				other => Err(DecodeError(format!("not a boolean: {other:?}"))),
			},
			other => Err(DecodeError(format!("expected a boolean, got {other}"))),
		}
	}
}

/// Object-safe face of a property binding, as seen by the render composer
/// and the dispatch path.
pub trait PropertySource: Send + Sync {
	/// The attribute name this binding owns.
	fn name(&self) -> &str;

	/// The variable's current value, serialized for the attribute.
	fn render_attr(&self) -> String;

	/// The client event that writes back into the variable, if this binding
	/// is two-way.
	fn client_event(&self) -> Option<&str>;

	/// Subscribes the binding to its variable on behalf of `page`: each
	/// change produces one update instruction for (`element_id`, this
	/// attribute) on that page's channel. The subscription lives in the
	/// page's `Observing` scope.
	fn attach(&self, element_id: &str, page: &Arc<dyn Page>);

	/// Writes a client-supplied value into the variable, tagged with the
	/// originating page so the change is not echoed back to it.
	fn accept(&self, page: &dyn Page, raw: &Value) -> CoreResult<()>;
}

/// A named, typed, element-scoped attribute sourced from a [`Var`].
///
/// One binding serves every page the element is rendered to; `attach` is
/// called once per page and each attached page gets its own subscription.
pub struct PropertyBinding<T: PropertyCodec> {
	name: String,
	var: Var<T>,
	client_event: Option<String>,
}

impl<T: PropertyCodec> PropertyBinding<T> {
	/// Creates a one-way binding from `var` to the named attribute.
	pub fn new(name: impl Into<String>, var: Var<T>) -> Self {
		Self {
			name: name.into(),
			var,
			client_event: None,
		}
	}

	/// Makes the binding two-way: client reports for `event` write their
	/// payload's `value` field back into the variable.
	pub fn with_client_event(mut self, event: impl Into<String>) -> Self {
		self.client_event = Some(event.into());
		self
	}

	/// The underlying variable.
	pub fn var(&self) -> &Var<T> {
		&self.var
	}
}

impl<T: PropertyCodec> PropertySource for PropertyBinding<T> {
	fn name(&self) -> &str {
		&self.name
	}

	fn render_attr(&self) -> String {
		self.var.with(PropertyCodec::to_attribute)
	}

	fn client_event(&self) -> Option<&str> {
		self.client_event.as_deref()
	}

	fn attach(&self, element_id: &str, page: &Arc<dyn Page>) {
		let element_id = element_id.to_string();
		let attribute = self.name.clone();
		let page_id = page.id().to_string();
		let weak_page: Weak<dyn Page> = Arc::downgrade(page);

		let subscription = self.var.subscribe(move |value, origin| {
			if origin == Some(page_id.as_str()) {
				// The change came from this page; echoing it back would
				// oscillate.
				trace!(%element_id, %attribute, "suppressed echo to originating page");
				return;
			}
			let Some(page) = weak_page.upgrade() else {
				return;
			};
			page.enqueue(PropertyUpdate {
				element_id: element_id.clone(),
				attribute: attribute.clone(),
				value: value.to_attribute(),
			});
		});
		page.observing().adopt(subscription);
	}

	fn accept(&self, page: &dyn Page, raw: &Value) -> CoreResult<()> {
		let payload = raw.get("value").unwrap_or(raw);
		let value = T::from_client(payload).map_err(|source| ElementError::Codec {
			property: self.name.clone(),
			source,
		})?;
		self.var.set_from(value, Some(page.id()));
		Ok(())
	}
}
