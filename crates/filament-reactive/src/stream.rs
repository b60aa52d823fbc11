//! `EventStream<T>` - a subscribable sequence of discrete occurrences.

use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};

use crate::subscription::{Subscription, next_subscription_id};

type StreamCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct StreamInner<T> {
	subscribers: RwLock<Vec<(u64, StreamCallback<T>)>>,
	/// Subscriptions a derived stream holds on its source, kept so the
	/// derivation stays wired as long as the derived stream is alive.
	upstream: Mutex<Vec<Subscription>>,
}

/// A stream of discrete event occurrences.
///
/// Firing delivers the event synchronously to every current subscriber, in
/// subscription order; ordering among subscribers is an implementation
/// detail callers must not rely on. Streams are cheap to clone and all
/// clones share the same subscriber list.
///
/// # Examples
///
/// ```
/// use filament_reactive::EventStream;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let clicks: EventStream<u32> = EventStream::new();
/// let count = Arc::new(AtomicUsize::new(0));
/// let count_clone = count.clone();
/// let _sub = clicks.subscribe(move |_| {
///     count_clone.fetch_add(1, Ordering::SeqCst);
/// });
///
/// clicks.fire(7);
/// assert_eq!(count.load(Ordering::SeqCst), 1);
/// ```
pub struct EventStream<T> {
	inner: Arc<StreamInner<T>>,
}

impl<T> Clone for EventStream<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: Send + Sync + 'static> Default for EventStream<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Send + Sync + 'static> EventStream<T> {
	/// Creates a stream with no subscribers.
	pub fn new() -> Self {
		Self {
			inner: Arc::new(StreamInner {
				subscribers: RwLock::new(Vec::new()),
				upstream: Mutex::new(Vec::new()),
			}),
		}
	}

	/// Fires an event, delivering it to all current subscribers.
	pub fn fire(&self, value: T) {
		let callbacks: Vec<StreamCallback<T>> = self
			.inner
			.subscribers
			.read()
			.iter()
			.map(|(_, cb)| cb.clone())
			.collect();
		for callback in &callbacks {
			(**callback)(&value);
		}
	}

	/// Registers a subscriber. Returns a handle that removes it when
	/// cancelled.
	pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
		let id = next_subscription_id();
		self.inner
			.subscribers
			.write()
			.push((id, Arc::new(f) as StreamCallback<T>));

		let weak: Weak<StreamInner<T>> = Arc::downgrade(&self.inner);
		Subscription::new(move || {
			if let Some(inner) = weak.upgrade() {
				inner.subscribers.write().retain(|(sid, _)| *sid != id);
			}
		})
	}

	/// Returns the number of registered subscribers.
	pub fn subscriber_count(&self) -> usize {
		self.inner.subscribers.read().len()
	}

	/// Derives a stream whose events are `f` applied to this stream's
	/// events.
	pub fn map<U: Send + Sync + 'static>(
		&self,
		f: impl Fn(&T) -> U + Send + Sync + 'static,
	) -> EventStream<U> {
		let derived: EventStream<U> = EventStream::new();
		let sink = derived.clone();
		let sub = self.subscribe(move |value| sink.fire(f(value)));
		derived.inner.upstream.lock().push(sub);
		derived
	}

	/// Derives a stream carrying only the events for which `pred` holds.
	pub fn filter(&self, pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> EventStream<T>
	where
		T: Clone,
	{
		let derived: EventStream<T> = EventStream::new();
		let sink = derived.clone();
		let sub = self.subscribe(move |value| {
			if pred(value) {
				sink.fire(value.clone());
			}
		});
		derived.inner.upstream.lock().push(sub);
		derived
	}
}

impl<T> std::fmt::Debug for EventStream<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventStream")
			.field("subscribers", &self.inner.subscribers.read().len())
			.finish()
	}
}
