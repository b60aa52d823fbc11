//! Subscription handles and the `Observing` lifetime scope.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates a process-unique subscriber id.
pub(crate) fn next_subscription_id() -> u64 {
	NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// A handle to an active subscription.
///
/// Dropping a `Subscription` does *not* cancel it; cancellation is always
/// explicit, either via [`Subscription::cancel`] or by adopting the handle
/// into an [`Observing`] scope that is later closed. This keeps subscription
/// lifetime deterministic instead of tied to drop order.
pub struct Subscription {
	canceller: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
	/// Creates a subscription whose cancellation runs the given closure.
	pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
		Self {
			canceller: Mutex::new(Some(Box::new(cancel))),
		}
	}

	/// Cancels the subscription. Idempotent.
	pub fn cancel(&self) {
		let canceller = self.canceller.lock().take();
		if let Some(cancel) = canceller {
			cancel();
		}
	}

	/// Returns whether the subscription has not been cancelled yet.
	pub fn is_active(&self) -> bool {
		self.canceller.lock().is_some()
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.is_active())
			.finish()
	}
}

/// A subscription lifetime scope.
///
/// A session owns one `Observing` scope; every subscription created on the
/// session's behalf is adopted into it. Closing the scope cancels all adopted
/// subscriptions at once, so no notification can reach a dead session.
///
/// # Examples
///
/// ```
/// use filament_reactive::{Observing, Var};
///
/// let var = Var::new(0);
/// let scope = Observing::new();
/// scope.adopt(var.subscribe(|_, _| {}));
/// assert_eq!(var.subscriber_count(), 1);
///
/// scope.close();
/// assert_eq!(var.subscriber_count(), 0);
/// ```
#[derive(Default)]
pub struct Observing {
	handles: Mutex<Vec<Subscription>>,
	closed: AtomicBool,
}

impl Observing {
	/// Creates an open scope with no adopted subscriptions.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adopts a subscription into this scope.
	///
	/// If the scope is already closed the subscription is cancelled
	/// immediately instead of being stored.
	pub fn adopt(&self, subscription: Subscription) {
		if self.closed.load(Ordering::Acquire) {
			subscription.cancel();
			return;
		}
		self.handles.lock().push(subscription);
	}

	/// Cancels every adopted subscription and marks the scope closed.
	/// Idempotent; later `adopt` calls cancel their argument on the spot.
	pub fn close(&self) {
		self.closed.store(true, Ordering::Release);
		let handles = std::mem::take(&mut *self.handles.lock());
		for handle in &handles {
			handle.cancel();
		}
	}

	/// Returns whether the scope has been closed.
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}
}

impl Drop for Observing {
	fn drop(&mut self) {
		self.close();
	}
}

impl std::fmt::Debug for Observing {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Observing")
			.field("closed", &self.is_closed())
			.field("handles", &self.handles.lock().len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::sync::Arc;
	use std::sync::atomic::AtomicUsize;

	#[rstest]
	fn test_cancel_runs_closure_once() {
		// Arrange
		let count = Arc::new(AtomicUsize::new(0));
		let count_clone = count.clone();
		let sub = Subscription::new(move || {
			count_clone.fetch_add(1, Ordering::SeqCst);
		});

		// Act
		sub.cancel();
		sub.cancel();

		// Assert
		assert_eq!(count.load(Ordering::SeqCst), 1);
		assert!(!sub.is_active());
	}

	#[rstest]
	fn test_observing_close_cancels_all() {
		let cancelled = Arc::new(AtomicUsize::new(0));
		let scope = Observing::new();
		for _ in 0..3 {
			let cancelled = cancelled.clone();
			scope.adopt(Subscription::new(move || {
				cancelled.fetch_add(1, Ordering::SeqCst);
			}));
		}

		scope.close();

		assert_eq!(cancelled.load(Ordering::SeqCst), 3);
		assert!(scope.is_closed());
	}

	#[rstest]
	fn test_adopt_after_close_cancels_immediately() {
		let cancelled = Arc::new(AtomicUsize::new(0));
		let scope = Observing::new();
		scope.close();

		let cancelled_clone = cancelled.clone();
		scope.adopt(Subscription::new(move || {
			cancelled_clone.fetch_add(1, Ordering::SeqCst);
		}));

		assert_eq!(cancelled.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	fn test_drop_closes_scope() {
		let cancelled = Arc::new(AtomicUsize::new(0));
		{
			let scope = Observing::new();
			let cancelled = cancelled.clone();
			scope.adopt(Subscription::new(move || {
				cancelled.fetch_add(1, Ordering::SeqCst);
			}));
		}
		assert_eq!(cancelled.load(Ordering::SeqCst), 1);
	}
}
