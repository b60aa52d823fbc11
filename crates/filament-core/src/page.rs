//! The session ("page") interface the core renders against.
//!
//! A page is one connected client context: it owns an identifier namespace,
//! an outbound channel for update instructions, and an [`Observing`] scope
//! that bounds the lifetime of every subscription created on its behalf.
//! The transport behind the channel is the host's concern; from the core's
//! perspective `enqueue` is fire-and-forget.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use filament_reactive::Observing;
use tokio::sync::mpsc;
use tracing::trace;

/// An out-of-band attribute update, scoped to one session.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PropertyUpdate {
	/// Identifier of the element the update targets.
	pub element_id: String,
	/// The attribute to set.
	pub attribute: String,
	/// The serialized new value.
	pub value: String,
}

/// A connected client session.
///
/// Every render/dispatch/attach operation takes the page explicitly; the
/// core never threads a session through ambient context.
pub trait Page: Send + Sync {
	/// Identifier of this page, unique among active pages.
	fn id(&self) -> &str;

	/// Allocates the next element identifier in this page's namespace.
	fn next_id(&self) -> String;

	/// Hands an update instruction to the page's outbound channel.
	/// Fire-and-forget; a closed channel is not an error here.
	fn enqueue(&self, update: PropertyUpdate);

	/// The subscription scope bindings register under for this page.
	/// Closing it is how a session ends.
	fn observing(&self) -> &Observing;
}

/// A [`Page`] backed by an unbounded in-process channel.
///
/// The receiver half is handed to whatever transport actually talks to the
/// browser. The channel preserves enqueue order, so per-binding update
/// ordering survives all the way out.
pub struct ChannelPage {
	id: String,
	token: String,
	counter: AtomicU64,
	tx: mpsc::UnboundedSender<PropertyUpdate>,
	observing: Observing,
}

impl ChannelPage {
	/// Creates a page and returns it together with the receiving end of its
	/// outbound channel.
	pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PropertyUpdate>) {
		let (tx, rx) = mpsc::unbounded_channel();
		let id = uuid::Uuid::new_v4().simple().to_string();
		// Generated element ids embed this token so pages partition the
		// process-wide registry namespace.
		let token = id[..8].to_string();
		let page = Arc::new(Self {
			id,
			token,
			counter: AtomicU64::new(0),
			tx,
			observing: Observing::new(),
		});
		(page, rx)
	}

	/// Ends the session: cancels every subscription adopted into the page's
	/// [`Observing`] scope. Deterministic; nothing waits for collection.
	pub fn close(&self) {
		trace!(page = %self.id, "closing page subscription scope");
		self.observing.close();
	}
}

impl Page for ChannelPage {
	fn id(&self) -> &str {
		&self.id
	}

	fn next_id(&self) -> String {
		let n = self.counter.fetch_add(1, Ordering::Relaxed);
		format!("{}-{:04}", self.token, n)
	}

	fn enqueue(&self, update: PropertyUpdate) {
		if self.tx.send(update).is_err() {
			// Receiver is gone; the transport shut down before the scope
			// was closed. Drop the update.
			trace!(page = %self.id, "outbound channel closed, update dropped");
		}
	}

	fn observing(&self) -> &Observing {
		&self.observing
	}
}

impl std::fmt::Debug for ChannelPage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChannelPage")
			.field("id", &self.id)
			.field("closed", &self.observing.is_closed())
			.finish()
	}
}
