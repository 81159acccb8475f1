//! Derived read/write views over the router's location.
//!
//! A [`Derived<T>`] pairs a getter that projects a value out of the current
//! location with a setter that rebuilds the location and hands it back to
//! the router. Views chain: each accessor is a projection of a broader one,
//! and a write travels back up the chain to a single navigation request.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::LocationError;
use crate::location::Location;
use crate::store::{Observable, Subscription};

type Getter<T> = Rc<dyn Fn() -> T>;
type Setter<T> = Rc<dyn Fn(T) -> Result<(), LocationError>>;

/// A live read/write view derived from the router's location.
///
/// Cloning is cheap; clones share the getter and setter.
pub struct Derived<T: 'static> {
	source: Observable<Location>,
	getter: Getter<T>,
	setter: Setter<T>,
}

impl<T: 'static> Clone for Derived<T> {
	fn clone(&self) -> Self {
		Self {
			source: self.source.clone(),
			getter: Rc::clone(&self.getter),
			setter: Rc::clone(&self.setter),
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Derived<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Derived")
			.field("value", &(self.getter)())
			.finish()
	}
}

impl<T: Clone + PartialEq + 'static> Derived<T> {
	/// Creates a view from a getter and a setter.
	///
	/// `source` is the observable the getter ultimately reads from; it is
	/// what [`Derived::subscribe`] listens to.
	pub fn new<G, S>(source: Observable<Location>, get: G, set: S) -> Self
	where
		G: Fn() -> T + 'static,
		S: Fn(T) -> Result<(), LocationError> + 'static,
	{
		Self {
			source,
			getter: Rc::new(get),
			setter: Rc::new(set),
		}
	}

	/// Reads the current value.
	pub fn get(&self) -> T {
		(self.getter)()
	}

	/// Writes a value back through the chain.
	///
	/// # Errors
	///
	/// Propagates the error of whichever setter in the chain rejected the
	/// value.
	pub fn set(&self, value: T) -> Result<(), LocationError> {
		(self.setter)(value)
	}

	/// Reads, modifies and writes back the value.
	///
	/// # Errors
	///
	/// Same as [`Derived::set`].
	pub fn update<F>(&self, f: F) -> Result<(), LocationError>
	where
		F: FnOnce(&mut T),
	{
		let mut value = self.get();
		f(&mut value);
		self.set(value)
	}

	/// Calls `listener` whenever the projected value changes.
	///
	/// Location updates that leave the projection unchanged are not
	/// reported.
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&T) + 'static,
	{
		let last = RefCell::new(self.get());
		let getter = Rc::clone(&self.getter);

		self.source.subscribe(move |_| {
			let next = getter();
			if *last.borrow() == next {
				return;
			}
			*last.borrow_mut() = next.clone();
			listener(&next);
		})
	}

	/// Derives a narrower view.
	///
	/// `get` projects the part out of this view's value; `set` folds a new
	/// part into the current value, which is then written to this view.
	pub fn project<U, G, S>(&self, get: G, set: S) -> Derived<U>
	where
		U: Clone + PartialEq + 'static,
		G: Fn(&T) -> U + 'static,
		S: Fn(&T, U) -> T + 'static,
	{
		let reader = self.clone();
		let writer = self.clone();

		Derived::new(
			self.source.clone(),
			move || get(&reader.get()),
			move |part| {
				let current = writer.get();
				writer.set(set(&current, part))
			},
		)
	}

	pub(crate) fn source(&self) -> &Observable<Location> {
		&self.source
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::cell::Cell;

	fn path_view(source: &Observable<Location>) -> Derived<String> {
		let reader = source.clone();
		let writer = source.clone();
		Derived::new(
			source.clone(),
			move || reader.with(|l| l.path.clone()),
			move |path| {
				writer.update(|l| l.path = path);
				Ok(())
			},
		)
	}

	#[rstest]
	fn test_get_and_set() {
		let source = Observable::new(Location::new("/"));
		let view = path_view(&source);

		assert_eq!(view.get(), "/");
		view.set("/about".to_string()).unwrap();
		assert_eq!(source.get().path, "/about");
		assert_eq!(view.get(), "/about");
	}

	#[rstest]
	fn test_update() {
		let source = Observable::new(Location::new("/docs"));
		let view = path_view(&source);

		view.update(|path| path.push_str("/intro")).unwrap();
		assert_eq!(view.get(), "/docs/intro");
	}

	#[rstest]
	fn test_project_reads_and_writes_through_parent() {
		let source = Observable::new(Location::new("/a/b"));
		let view = path_view(&source);
		let depth = view.project(
			|path| path.matches('/').count(),
			|_, depth: usize| "/x".repeat(depth),
		);

		assert_eq!(depth.get(), 2);
		depth.set(3).unwrap();
		assert_eq!(source.get().path, "/x/x/x");
	}

	#[rstest]
	fn test_subscribe_fires_only_on_projection_change() {
		let source = Observable::new(Location::new("/"));
		let view = path_view(&source);
		let calls = Rc::new(Cell::new(0));

		let counter = Rc::clone(&calls);
		let _subscription = view.subscribe(move |_| counter.set(counter.get() + 1));

		source.update(|l| l.hash = "top".to_string());
		assert_eq!(calls.get(), 0);

		source.update(|l| l.path = "/next".to_string());
		assert_eq!(calls.get(), 1);

		source.update(|l| l.path = "/next".to_string());
		assert_eq!(calls.get(), 1);
	}

	#[rstest]
	fn test_setter_error_propagates() {
		let source = Observable::new(Location::default());
		let view: Derived<u8> = Derived::new(source, || 0, |_| Err(LocationError::OutsideSetup));

		assert_eq!(view.set(1), Err(LocationError::OutsideSetup));
		assert_eq!(view.update(|n| *n += 1), Err(LocationError::OutsideSetup));
	}
}
