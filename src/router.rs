//! The router contract consumed by the accessors.
//!
//! The accessors never navigate on their own. They read the location a
//! router publishes and hand it whole-location requests, leaving
//! resolution, history and failure reporting to the router.

use serde::{Deserialize, Serialize};

use crate::location::{Location, LocationDescriptor};
use crate::store::Observable;

/// How a navigation request treats the history stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationType {
	/// Append a new history entry.
	Push,
	/// Update the current history entry in place.
	#[default]
	Replace,
}

/// A client-side router as seen by the location accessors.
///
/// Implementations resolve requests on their own schedule (possibly
/// asynchronously) and publish the resolved location through
/// [`Router::location`]. Failed navigations are reported by the router
/// itself; callers get no result back.
pub trait Router {
	/// Returns the observable holding the resolved location.
	fn location(&self) -> Observable<Location>;

	/// Returns a snapshot of the resolved location.
	fn current(&self) -> Location {
		self.location().get()
	}

	/// Requests navigation that appends a history entry.
	fn push(&self, to: LocationDescriptor);

	/// Requests navigation that replaces the current history entry.
	fn replace(&self, to: LocationDescriptor);

	/// Requests navigation of the given kind.
	fn navigate(&self, to: LocationDescriptor, kind: NavigationType) {
		match kind {
			NavigationType::Push => self.push(to),
			NavigationType::Replace => self.replace(to),
		}
	}
}
