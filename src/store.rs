//! Observable - the subject holding the router's location
//!
//! `Observable<T>` holds a value and a set of listeners. Writing the value
//! notifies every listener in registration order. Clones share the same
//! value and listener set, so a router can hand out as many handles as it
//! likes.
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_location::Observable;
//!
//! let count = Observable::new(0);
//! let _subscription = count.subscribe(|n| println!("count is now {}", n));
//!
//! count.set(1);
//! count.update(|n| *n += 1);
//! assert_eq!(count.get(), 2);
//! ```

use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

extern crate alloc;
use alloc::rc::{Rc, Weak};

/// Unique identifier of a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
	fn next() -> Self {
		static NEXT_ID: AtomicU64 = AtomicU64::new(1);
		Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
	}
}

type Listener<T> = Rc<dyn Fn(&T)>;
type ListenerList<T> = RefCell<Vec<(ListenerId, Listener<T>)>>;

/// A value that notifies its listeners when it changes.
pub struct Observable<T: 'static> {
	value: Rc<RefCell<T>>,
	listeners: Rc<ListenerList<T>>,
}

impl<T: 'static> Clone for Observable<T> {
	fn clone(&self) -> Self {
		Self {
			value: Rc::clone(&self.value),
			listeners: Rc::clone(&self.listeners),
		}
	}
}

impl<T: 'static> Observable<T> {
	/// Creates a new observable with the given initial value.
	pub fn new(value: T) -> Self {
		Self {
			value: Rc::new(RefCell::new(value)),
			listeners: Rc::new(RefCell::new(Vec::new())),
		}
	}

	/// Returns a clone of the current value.
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.value.borrow().clone()
	}

	/// Reads the current value by reference.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.value.borrow())
	}

	/// Stores a new value and notifies listeners.
	pub fn set(&self, value: T)
	where
		T: Clone,
	{
		*self.value.borrow_mut() = value;
		self.notify();
	}

	/// Mutates the value in place and notifies listeners once.
	pub fn update<F>(&self, f: F)
	where
		T: Clone,
		F: FnOnce(&mut T),
	{
		f(&mut *self.value.borrow_mut());
		self.notify();
	}

	/// Registers a listener called after every write.
	///
	/// The listener stays registered until the returned [`Subscription`]
	/// is dropped or cancelled.
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&T) + 'static,
	{
		let id = ListenerId::next();
		let listener: Listener<T> = Rc::new(listener);
		self.listeners.borrow_mut().push((id, listener));

		let listeners: Weak<ListenerList<T>> = Rc::downgrade(&self.listeners);
		Subscription::new(id, move || {
			if let Some(listeners) = listeners.upgrade() {
				listeners.borrow_mut().retain(|(entry, _)| *entry != id);
			}
		})
	}

	/// Returns the number of registered listeners.
	pub fn listener_count(&self) -> usize {
		self.listeners.borrow().len()
	}

	fn notify(&self)
	where
		T: Clone,
	{
		// Listeners may read, write or subscribe while being notified, so
		// neither the value nor the listener list stays borrowed.
		let listeners: Vec<Listener<T>> = self
			.listeners
			.borrow()
			.iter()
			.map(|(_, listener)| Rc::clone(listener))
			.collect();
		// Read per listener: an earlier one may have written back.
		for listener in listeners {
			let snapshot = self.get();
			listener(&snapshot);
		}
	}
}

impl<T: Default + 'static> Default for Observable<T> {
	fn default() -> Self {
		Self::new(T::default())
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Observable<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Observable")
			.field("value", &*self.value.borrow())
			.field("listeners", &self.listener_count())
			.finish()
	}
}

/// Handle to a registered listener.
///
/// Dropping the handle removes the listener. Use [`Subscription::detach`]
/// to keep it registered for as long as the source lives.
#[must_use = "dropping a Subscription removes its listener"]
pub struct Subscription {
	id: ListenerId,
	cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
	pub(crate) fn new(id: ListenerId, cancel: impl FnOnce() + 'static) -> Self {
		Self {
			id,
			cancel: Some(Box::new(cancel)),
		}
	}

	/// Returns the listener id.
	pub fn id(&self) -> ListenerId {
		self.id
	}

	/// Removes the listener now.
	pub fn cancel(mut self) {
		if let Some(cancel) = self.cancel.take() {
			cancel();
		}
	}

	/// Keeps the listener registered and drops the handle.
	pub fn detach(mut self) {
		self.cancel = None;
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(cancel) = self.cancel.take() {
			cancel();
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.cancel.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::cell::Cell;

	#[rstest]
	fn test_observable_creation() {
		let observable = Observable::new(42);
		assert_eq!(observable.get(), 42);
	}

	#[rstest]
	fn test_observable_set_and_update() {
		let observable = Observable::new(0);

		observable.set(10);
		assert_eq!(observable.get(), 10);

		observable.update(|n| *n *= 2);
		assert_eq!(observable.get(), 20);
	}

	#[rstest]
	fn test_observable_clone_shares_value() {
		let first = Observable::new("hello".to_string());
		let second = first.clone();

		first.set("world".to_string());
		assert_eq!(second.get(), "world");
		assert_eq!(second.with(|s| s.len()), 5);
	}

	#[rstest]
	fn test_listeners_notified_in_order() {
		let observable = Observable::new(0);
		let log = Rc::new(RefCell::new(Vec::new()));

		let first_log = Rc::clone(&log);
		let _first = observable.subscribe(move |n| first_log.borrow_mut().push(("first", *n)));
		let second_log = Rc::clone(&log);
		let _second = observable.subscribe(move |n| second_log.borrow_mut().push(("second", *n)));

		observable.set(5);

		assert_eq!(*log.borrow(), vec![("first", 5), ("second", 5)]);
	}

	#[rstest]
	fn test_dropping_subscription_removes_listener() {
		let observable = Observable::new(0);
		let calls = Rc::new(Cell::new(0));

		let counter = Rc::clone(&calls);
		let subscription = observable.subscribe(move |_| counter.set(counter.get() + 1));
		assert_eq!(observable.listener_count(), 1);

		observable.set(1);
		drop(subscription);
		observable.set(2);

		assert_eq!(calls.get(), 1);
		assert_eq!(observable.listener_count(), 0);
	}

	#[rstest]
	fn test_cancel_and_detach() {
		let observable = Observable::new(0);

		observable.subscribe(|_| {}).cancel();
		assert_eq!(observable.listener_count(), 0);

		observable.subscribe(|_| {}).detach();
		assert_eq!(observable.listener_count(), 1);
	}

	#[rstest]
	fn test_listener_may_write_back() {
		let observable = Observable::new(0);

		let handle = observable.clone();
		let _subscription = observable.subscribe(move |n| {
			if *n < 3 {
				handle.set(n + 1);
			}
		});

		observable.set(1);
		assert_eq!(observable.get(), 3);
	}

	#[rstest]
	fn test_later_listeners_see_value_written_back() {
		let observable = Observable::new(0);
		let seen = Rc::new(RefCell::new(Vec::new()));

		let handle = observable.clone();
		let _writer = observable.subscribe(move |n| {
			if *n < 3 {
				handle.set(n + 1);
			}
		});
		let sink = Rc::clone(&seen);
		let _reader = observable.subscribe(move |n| sink.borrow_mut().push(*n));

		observable.set(1);

		assert_eq!(observable.get(), 3);
		assert_eq!(seen.borrow().last(), Some(&3));
		assert!(seen.borrow().iter().all(|n| *n == 3));
	}

	#[rstest]
	fn test_subscription_outliving_observable() {
		let observable = Observable::new(0);
		let subscription = observable.subscribe(|_| {});
		drop(observable);
		drop(subscription);
	}

	#[rstest]
	fn test_listener_ids_are_unique() {
		let observable = Observable::new(0);
		let a = observable.subscribe(|_| {});
		let b = observable.subscribe(|_| {});
		assert_ne!(a.id(), b.id());
	}
}
