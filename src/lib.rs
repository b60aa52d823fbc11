//! # Filament
//!
//! Server-driven reactive DOM elements for Rust.
//!
//! Filament lets server-resident mutable state and event streams drive the
//! rendered attributes of DOM elements across connected client sessions, and
//! routes DOM events flowing back from those sessions into server-side
//! reactive streams. It is deliberately not a UI component framework, not a
//! virtual-DOM differ, and not a transport: it assumes a session abstraction
//! that can deliver an attribute update to a browser, and concentrates on
//! the composition and synchronization model in between.
//!
//! The crates:
//!
//! - [`reactive`]: `Var`, `EventStream`, `Subscription`, `Observing` — the
//!   reactive substrate with synchronous delivery and explicit subscription
//!   lifetimes.
//! - [`core`]: markup nodes, the weak identifier registry, property and
//!   event bindings, the render composer, and the inbound dispatch path.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use filament::core::{
//!     Change, ChannelPage, Element, ElementNode, EventBinding, Page,
//!     PropertyBinding, dispatch_report, render,
//! };
//! use filament::reactive::Var;
//!
//! // An <input> whose value mirrors a server-side variable, two-way.
//! let value = Var::new(String::from("hello"));
//! let input = Element::builder(ElementNode::new("input"))
//!     .property(PropertyBinding::new("value", value.clone()).with_client_event("change"))
//!     .event(EventBinding::<Change>::new("change"))
//!     .build()
//!     .unwrap();
//!
//! // Render it for a connected session.
//! let (page, mut updates) = ChannelPage::new();
//! let page: Arc<dyn Page> = page;
//! let node = render(input, &page);
//! let id = node.attr_value("id").unwrap().to_string();
//!
//! // Server-side writes push attribute updates to the session.
//! value.set(String::from("world"));
//! assert_eq!(updates.try_recv().unwrap().value, "world");
//!
//! // Client reports write back into the variable, with no echo.
//! dispatch_report(page.as_ref(), &id, "change", &serde_json::json!({"value": "typed"}));
//! assert_eq!(value.get(), "typed");
//! assert!(updates.try_recv().is_err());
//! ```

/// The rendering composition and synchronization core.
pub mod core {
	pub use filament_core::*;
}

/// The reactive substrate: variables, streams, subscription scopes.
pub mod reactive {
	pub use filament_reactive::*;
}

pub use filament_core::{
	ChannelPage, Element, ElementNode, Node, Page, PropertyBinding, PropertyUpdate,
	dispatch_report, render, render_into,
};
pub use filament_reactive::{EventStream, Observing, Subscription, Var};
