//! Component context passed to the accessor factories.
//!
//! Accessors are created while a component sets itself up. Rather than
//! looking the component up from ambient state, the factories take the
//! context explicitly; the context still records whether setup is running
//! so that creating an accessor at any other time is reported as a usage
//! error.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::error::LocationError;
use crate::options::AccessorOptions;
use crate::router::Router;

/// Lifecycle phase of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	/// Created, setup not started.
	Created,
	/// Inside [`ComponentContext::setup`].
	Setup,
	/// Setup finished.
	Mounted,
}

/// The owning component's view of the router.
#[derive(Clone)]
pub struct ComponentContext {
	router: Rc<dyn Router>,
	options: AccessorOptions,
	phase: Rc<Cell<Phase>>,
}

impl fmt::Debug for ComponentContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentContext")
			.field("options", &self.options)
			.field("phase", &self.phase.get())
			.finish()
	}
}

/// Leaves the setup phase when setup returns or unwinds.
///
/// A nested setup hands the phase back to the enclosing one.
struct LeaveSetup<'a> {
	phase: &'a Cell<Phase>,
	previous: Phase,
}

impl Drop for LeaveSetup<'_> {
	fn drop(&mut self) {
		let next = match self.previous {
			Phase::Setup => Phase::Setup,
			Phase::Created | Phase::Mounted => Phase::Mounted,
		};
		self.phase.set(next);
	}
}

impl ComponentContext {
	/// Creates a context for a component rendered under `router`.
	pub fn new(router: Rc<dyn Router>) -> Self {
		Self {
			router,
			options: AccessorOptions::default(),
			phase: Rc::new(Cell::new(Phase::Created)),
		}
	}

	/// Replaces the accessor options.
	pub fn with_options(mut self, options: AccessorOptions) -> Self {
		self.options = options;
		self
	}

	/// Returns the router.
	pub fn router(&self) -> &Rc<dyn Router> {
		&self.router
	}

	/// Returns the accessor options.
	pub fn options(&self) -> &AccessorOptions {
		&self.options
	}

	/// Returns the current lifecycle phase.
	pub fn phase(&self) -> Phase {
		self.phase.get()
	}

	/// Runs the component's setup function.
	///
	/// Accessor factories may only be called from within `f`. The
	/// component is mounted once `f` returns, unless this call is nested
	/// in another setup, which then stays in progress.
	pub fn setup<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
		let _leave = LeaveSetup {
			phase: &self.phase,
			previous: self.phase.replace(Phase::Setup),
		};
		f(self)
	}

	/// Fails with [`LocationError::OutsideSetup`] unless setup is running.
	pub fn ensure_setup(&self) -> Result<(), LocationError> {
		if self.phase.get() == Phase::Setup {
			Ok(())
		} else {
			Err(LocationError::OutsideSetup)
		}
	}
}
