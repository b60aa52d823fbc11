//! `Var<T>` - a reactive variable with synchronous change notification.

use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};

use crate::subscription::{Subscription, next_subscription_id};

type VarCallback<T> = Arc<dyn Fn(&T, Option<&str>) + Send + Sync>;

struct VarInner<T> {
	value: RwLock<T>,
	subscribers: RwLock<Vec<(u64, VarCallback<T>)>>,
	/// Serializes write-then-notify so concurrent writers cannot interleave
	/// a value change with another write's notifications.
	order: Mutex<()>,
}

/// A mutable holder of a value that notifies subscribers synchronously on
/// change.
///
/// `Var<T>` is cheap to clone; all clones share the same underlying value
/// and subscriber list. Writes can be tagged with an *origin* (an opaque
/// string, in practice a session id) via [`Var::set_from`]; subscribers
/// receive the tag alongside the new value and can use it to suppress
/// echoing a change back to wherever it came from.
///
/// Subscribers run on the writing thread while the variable's ordering lock
/// is held, so a subscriber must not write back into the same variable.
///
/// # Examples
///
/// ```
/// use filament_reactive::Var;
///
/// let name = Var::new(String::from("hello"));
/// assert_eq!(name.get(), "hello");
///
/// name.set(String::from("world"));
/// assert_eq!(name.get(), "world");
/// ```
pub struct Var<T> {
	inner: Arc<VarInner<T>>,
}

impl<T> Clone for Var<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: Send + Sync + 'static> Var<T> {
	/// Creates a new variable with the given initial value.
	pub fn new(value: T) -> Self {
		Self {
			inner: Arc::new(VarInner {
				value: RwLock::new(value),
				subscribers: RwLock::new(Vec::new()),
				order: Mutex::new(()),
			}),
		}
	}

	/// Returns a clone of the current value.
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.inner.value.read().clone()
	}

	/// Reads the current value through a borrowing closure, without cloning.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.inner.value.read())
	}

	/// Sets a new value and notifies all current subscribers, untagged.
	pub fn set(&self, value: T) {
		self.set_from(value, None);
	}

	/// Sets a new value tagged with the session it originated from.
	///
	/// The tag is delivered verbatim to every subscriber; it has no meaning
	/// to the variable itself.
	pub fn set_from(&self, value: T, origin: Option<&str>) {
		let _order = self.inner.order.lock();
		*self.inner.value.write() = value;
		self.notify(origin);
	}

	/// Mutates the value in place and notifies subscribers once, untagged.
	pub fn update(&self, f: impl FnOnce(&mut T)) {
		let _order = self.inner.order.lock();
		f(&mut self.inner.value.write());
		self.notify(None);
	}

	/// Registers a change subscriber.
	///
	/// The subscriber receives the new value and the origin tag of the write
	/// (if any), synchronously, in subscription order relative to other
	/// subscribers. Returns a handle that removes the subscriber when
	/// cancelled.
	pub fn subscribe(
		&self,
		f: impl Fn(&T, Option<&str>) + Send + Sync + 'static,
	) -> Subscription {
		let id = next_subscription_id();
		self.inner
			.subscribers
			.write()
			.push((id, Arc::new(f) as VarCallback<T>));

		let weak: Weak<VarInner<T>> = Arc::downgrade(&self.inner);
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

	fn notify(&self, origin: Option<&str>) {
		// Snapshot the callbacks so a subscriber may subscribe/cancel
		// without deadlocking against the subscriber list.
		let callbacks: Vec<VarCallback<T>> = self
			.inner
			.subscribers
			.read()
			.iter()
			.map(|(_, cb)| cb.clone())
			.collect();
		let value = self.inner.value.read();
		for callback in &callbacks {
			(**callback)(&value, origin);
		}
	}
}

impl<T: std::fmt::Debug + Send + Sync + 'static> std::fmt::Debug for Var<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Var")
			.field("value", &*self.inner.value.read())
			.field("subscribers", &self.subscriber_count())
			.finish()
	}
}
