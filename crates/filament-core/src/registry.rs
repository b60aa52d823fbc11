//! Process-wide identifier registry.
//!
//! Maps element identifiers to live elements so inbound event reports can be
//! routed. Entries are held weakly: the registry is a lookup table, never an
//! owner, and must not keep an otherwise-unreferenced element alive. Dead
//! entries are removed when a lookup trips over them, or in bulk via
//! [`ElementRegistry::prune`].

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::trace;

use crate::element::ReactiveElement;
use crate::node::ElementNode;
use crate::page::Page;

/// Length of randomized fallback identifiers, including the `f` prefix.
const FALLBACK_ID_LEN: usize = 8;

/// The process-wide registry instance.
pub fn registry() -> &'static ElementRegistry {
	static ELEMENTS: Lazy<ElementRegistry> = Lazy::new(ElementRegistry::new);
	&ELEMENTS
}

/// Concurrent weak map from element identifier to element.
pub struct ElementRegistry {
	entries: DashMap<String, Weak<dyn ReactiveElement>>,
}

impl ElementRegistry {
	fn new() -> Self {
		Self {
			entries: DashMap::new(),
		}
	}

	/// Inserts or overwrites the entry for `id`.
	pub fn register(&self, id: &str, element: &Arc<dyn ReactiveElement>) {
		self.entries
			.insert(id.to_string(), Arc::downgrade(element));
	}

	/// Returns the live element registered under `id`, or `None` if the id
	/// was never registered or the element has been collected. A miss is not
	/// an error: callers treat it as a stale reference and ignore the
	/// report. A dead entry found here is removed.
	pub fn lookup(&self, id: &str) -> Option<Arc<dyn ReactiveElement>> {
		let entry = self.entries.get(id)?;
		match entry.value().upgrade() {
			Some(element) => Some(element),
			None => {
				drop(entry);
				self.entries.remove(id);
				trace!(element_id = id, "pruned dead registry entry on lookup");
				None
			}
		}
	}

	/// Removes every entry whose element has been collected.
	pub fn prune(&self) {
		self.entries.retain(|_, weak| weak.strong_count() > 0);
	}

	/// Number of entries currently in the map, live or not.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns whether the map has no entries.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Ensures a node carries an identifier attribute.
///
/// Returns the node unchanged (plus its id) if it already has one; otherwise
/// returns a copy with a fresh id drawn from the page's generator, or a
/// randomized fallback when no page is available. Idempotent:
/// `with_id(with_id(n).0)` equals `with_id(n)`.
pub fn with_id(node: &ElementNode, page: Option<&dyn Page>) -> (ElementNode, String) {
	if let Some(id) = node.attr_value("id") {
		return (node.clone(), id.to_string());
	}
	let id = match page {
		Some(page) => page.next_id(),
		None => fallback_id(),
	};
	(node.with_attr("id", id.clone()), id)
}

/// Fixed-length printable identifier for elements identified outside any
/// session. Best-effort uniqueness only; callers needing a guarantee supply
/// their own id or a page.
fn fallback_id() -> String {
	let suffix: String = rand::thread_rng()
		.sample_iter(&Alphanumeric)
		.take(FALLBACK_ID_LEN - 1)
		.map(char::from)
		.collect();
	format!("f{suffix}")
}
