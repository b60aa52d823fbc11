//! # filament-core
//!
//! The rendering composition and synchronization core: server-resident
//! reactive state drives the attributes of DOM elements rendered into one or
//! more connected client sessions, and client events route back into
//! server-side streams.
//!
//! The moving parts, leaves first:
//!
//! - [`ElementNode`]/[`Node`]: the immutable markup value type.
//! - [`registry`]: the process-wide weak identifier registry
//!   ([`with_id`], [`ElementRegistry`]).
//! - [`PropertyBinding`]: a named attribute sourced from a
//!   [`Var`](filament_reactive::Var), pushed to every registered session on
//!   change, optionally written back from client events (two-way, with echo
//!   suppression).
//! - [`EventBinding`]: a named DOM event declaration surfaced as an
//!   [`EventStream`](filament_reactive::EventStream), contributing a
//!   dispatch directive to the rendered element.
//! - [`render`]/[`render_into`]: the shared composition algorithm;
//!   [`dispatch_report`]: the inbound report path.
//!
//! Sessions are consumed through the [`Page`] trait; [`ChannelPage`] is the
//! bundled channel-backed implementation. The core owns no transport: an
//! update instruction is a [`PropertyUpdate`] value handed to the page's
//! channel, and how it reaches a browser is the host's concern.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use filament_core::{
//!     Change, ChannelPage, Element, ElementNode, EventBinding, Page,
//!     PropertyBinding, render,
//! };
//! use filament_reactive::Var;
//!
//! let value = Var::new(String::from("hello"));
//! let input = Element::builder(ElementNode::new("input"))
//!     .property(PropertyBinding::new("value", value.clone()).with_client_event("change"))
//!     .event(EventBinding::<Change>::new("change"))
//!     .build()
//!     .unwrap();
//!
//! let (page, mut updates) = ChannelPage::new();
//! let page: Arc<dyn Page> = page;
//! let node = render(input, &page);
//! assert_eq!(node.attr_value("value"), Some("hello"));
//!
//! value.set(String::from("world"));
//! assert_eq!(updates.try_recv().unwrap().value, "world");
//! ```

mod element;
mod error;
mod event;
mod node;
mod page;
mod property;
pub mod registry;

pub use element::{
	Element, ElementBuilder, PageSet, ReactiveElement, dispatch_report, render, render_into,
};
pub use error::{CoreResult, DecodeError, ElementError};
pub use event::{Change, Click, DISPATCH_ATTR, DomEvent, EventBinding, EventSource, KeyUp};
pub use node::{BOOLEAN_ATTRS, ElementNode, Node, is_boolean_attr_truthy};
pub use page::{ChannelPage, Page, PropertyUpdate};
pub use property::{PropertyBinding, PropertyCodec, PropertySource};
pub use registry::{ElementRegistry, with_id};
