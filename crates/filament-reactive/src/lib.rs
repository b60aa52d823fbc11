//! Reactive substrate for filament.
//!
//! Provides the three primitives the rendering core is built on:
//!
//! - [`Var<T>`]: a mutable holder of a value that notifies subscribers
//!   synchronously on change. Writes can carry an *origin tag* so that a
//!   subscriber can tell which session a change came from.
//! - [`EventStream<T>`]: a subscribable sequence of discrete occurrences,
//!   transformable via `map`/`filter` before subscription.
//! - [`Subscription`] and [`Observing`]: explicit subscription lifetime
//!   management. Every `subscribe` call returns a [`Subscription`] handle;
//!   an [`Observing`] scope adopts handles and cancels all of them
//!   deterministically when it is closed.
//!
//! Delivery is synchronous: subscribers run on the thread that performed the
//! write or fired the event, in subscription order. No queuing or threading
//! is introduced here.

mod stream;
mod subscription;
mod var;

pub use stream::EventStream;
pub use subscription::{Observing, Subscription};
pub use var::Var;
