//! In-memory router.
//!
//! [`MemoryRouter`] implements [`Router`] without a browser. It keeps the
//! location in an [`Observable`], resolves requests against a table of
//! registered route chains, and records every request it receives. It is
//! used for server-side rendering and in tests.
//!
//! # Example
//!
//! ```ignore
//! use reinhardt_location::{MemoryRouter, RouteRecord};
//!
//! let router = MemoryRouter::new()
//!     .named_route("home", "/")
//!     .named_route("user", "/users/:id")
//!     .start_at("/users/42?tab=posts")?;
//!
//! assert_eq!(router.current().params["id"], "42");
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;

use thiserror::Error;

use crate::error::LocationError;
use crate::location::{Location, LocationDescriptor, Params, RouteRecord};
use crate::pattern::RoutePattern;
use crate::router::{NavigationType, Router};
use crate::store::Observable;

/// Error type for navigation resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
	/// No registered route matches the path.
	#[error("Route not found: {0}")]
	NotFound(String),
	/// No registered route has the name.
	#[error("Invalid route name: {0}")]
	InvalidRouteName(String),
	/// A pattern could not be reversed or parsed.
	#[error(transparent)]
	Pattern(#[from] LocationError),
}

/// When requests are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
	/// Resolve each request as it arrives.
	#[default]
	Immediate,
	/// Queue requests until [`MemoryRouter::flush`].
	Deferred,
}

/// A navigation request as received by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
	/// The requested target.
	pub to: LocationDescriptor,
	/// Push or replace.
	pub kind: NavigationType,
}

/// A registered route chain.
#[derive(Debug, Clone)]
struct RouteEntry {
	/// Records from the outermost parent to the leaf.
	chain: Vec<RouteRecord>,
	/// Parsed pattern of the leaf record.
	pattern: RoutePattern,
}

impl RouteEntry {
	fn name(&self) -> Option<&str> {
		self.chain.last().and_then(|record| record.name.as_deref())
	}
}

/// A router that lives entirely in memory.
pub struct MemoryRouter {
	location: Observable<Location>,
	routes: Vec<RouteEntry>,
	named_routes: HashMap<String, usize>,
	mode: ResolveMode,
	pending: RefCell<VecDeque<NavigationRequest>>,
	requests: RefCell<Vec<NavigationRequest>>,
	failures: RefCell<Vec<RouterError>>,
	history_len: Cell<usize>,
}

impl fmt::Debug for MemoryRouter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryRouter")
			.field("routes_count", &self.routes.len())
			.field(
				"named_routes",
				&self.named_routes.keys().collect::<Vec<_>>(),
			)
			.field("mode", &self.mode)
			.field("pending", &self.pending.borrow().len())
			.finish()
	}
}

impl Default for MemoryRouter {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryRouter {
	/// Creates a router at `/` with no routes.
	pub fn new() -> Self {
		Self {
			location: Observable::new(Location::default()),
			routes: Vec::new(),
			named_routes: HashMap::new(),
			mode: ResolveMode::Immediate,
			pending: RefCell::new(VecDeque::new()),
			requests: RefCell::new(Vec::new()),
			failures: RefCell::new(Vec::new()),
			history_len: Cell::new(1),
		}
	}

	/// Registers a route chain, outermost record first.
	///
	/// The leaf record's template is used for matching and reversing, and
	/// its name for named navigation. Earlier registrations win when
	/// several chains match a path.
	///
	/// # Errors
	///
	/// Returns [`LocationError::InvalidPattern`] if the leaf template is
	/// malformed, or if `chain` is empty.
	pub fn try_route(mut self, chain: Vec<RouteRecord>) -> Result<Self, LocationError> {
		let leaf = chain
			.last()
			.ok_or_else(|| LocationError::invalid_pattern("", "empty route chain"))?;
		let pattern = RoutePattern::parse(&leaf.path)?;

		let index = self.routes.len();
		if let Some(name) = leaf.name.as_deref().filter(|name| !name.is_empty()) {
			self.named_routes.insert(name.to_string(), index);
		}
		self.routes.push(RouteEntry { chain, pattern });
		Ok(self)
	}

	/// Registers a route chain.
	///
	/// # Panics
	///
	/// Panics if the leaf template is invalid. Use [`MemoryRouter::try_route`]
	/// for fallible registration.
	pub fn route(self, chain: Vec<RouteRecord>) -> Self {
		self.try_route(chain)
			.unwrap_or_else(|e| panic!("Invalid route chain: {}", e))
	}

	/// Registers a single named route.
	///
	/// # Panics
	///
	/// Panics if the template is invalid.
	pub fn named_route(self, name: &str, path: &str) -> Self {
		self.route(vec![RouteRecord::named(name, path)])
	}

	/// Queues requests until [`MemoryRouter::flush`] is called.
	pub fn deferred(mut self) -> Self {
		self.mode = ResolveMode::Deferred;
		self
	}

	/// Resolves `href` and makes it the current location.
	///
	/// # Errors
	///
	/// Returns [`RouterError::NotFound`] if no route matches the path, or
	/// [`RouterError::Pattern`] if the query string cannot be decoded.
	pub fn start_at(self, href: &str) -> Result<Self, RouterError> {
		let parsed = Location::parse(href)?;
		let descriptor = LocationDescriptor {
			name: None,
			path: Some(parsed.path),
			params: Params::new(),
			query: parsed.query,
			hash: parsed.hash,
		};
		let location = self.resolve(&descriptor)?;
		self.location.set(location);
		Ok(self)
	}

	/// Returns the resolve mode.
	pub fn mode(&self) -> ResolveMode {
		self.mode
	}

	/// Returns every request received so far, in order.
	pub fn requests(&self) -> Vec<NavigationRequest> {
		self.requests.borrow().clone()
	}

	/// Returns the number of requests received so far.
	pub fn request_count(&self) -> usize {
		self.requests.borrow().len()
	}

	/// Returns the resolution failures recorded so far.
	pub fn failures(&self) -> Vec<RouterError> {
		self.failures.borrow().clone()
	}

	/// Returns the number of queued requests.
	pub fn pending_count(&self) -> usize {
		self.pending.borrow().len()
	}

	/// Returns the number of history entries.
	pub fn history_len(&self) -> usize {
		self.history_len.get()
	}

	/// Resolves every queued request in arrival order.
	///
	/// Returns the number of requests processed, including requests queued
	/// by listeners while flushing.
	pub fn flush(&self) -> usize {
		let mut processed = 0;
		loop {
			let next = self.pending.borrow_mut().pop_front();
			let Some(request) = next else {
				break;
			};
			self.apply(request);
			processed += 1;
		}
		processed
	}

	/// Resolves a descriptor against the route table without navigating.
	///
	/// # Errors
	///
	/// Returns [`RouterError::InvalidRouteName`] for an unknown name,
	/// [`RouterError::NotFound`] if no route matches the path, and
	/// [`RouterError::Pattern`] if a required parameter is missing.
	pub fn resolve(&self, to: &LocationDescriptor) -> Result<Location, RouterError> {
		match to.name.as_deref().filter(|name| !name.is_empty()) {
			Some(name) => {
				let index = self
					.named_routes
					.get(name)
					.ok_or_else(|| RouterError::InvalidRouteName(name.to_string()))?;
				let entry = &self.routes[*index];

				let params: Params = entry
					.pattern
					.keys()
					.into_iter()
					.filter_map(|key| {
						to.params
							.get(key)
							.filter(|value| !value.is_empty())
							.map(|value| (key.to_string(), value.clone()))
					})
					.collect();
				let path = entry.pattern.reverse(&params)?;

				Ok(Location {
					path,
					name: Some(name.to_string()),
					params,
					query: to.query.clone(),
					hash: to.hash.clone(),
					matched: entry.chain.clone(),
				})
			}
			None => {
				let path = to
					.path
					.clone()
					.unwrap_or_else(|| self.location.with(|current| current.path.clone()));

				self.routes
					.iter()
					.find_map(|entry| {
						entry.pattern.matches(&path).map(|params| Location {
							path: path.clone(),
							name: entry.name().map(str::to_string),
							params,
							query: to.query.clone(),
							hash: to.hash.clone(),
							matched: entry.chain.clone(),
						})
					})
					.ok_or(RouterError::NotFound(path))
			}
		}
	}

	fn handle(&self, request: NavigationRequest) {
		self.requests.borrow_mut().push(request.clone());
		match self.mode {
			ResolveMode::Immediate => self.apply(request),
			ResolveMode::Deferred => self.pending.borrow_mut().push_back(request),
		}
	}

	fn apply(&self, request: NavigationRequest) {
		match self.resolve(&request.to) {
			Ok(location) => {
				if request.kind == NavigationType::Push {
					self.history_len.set(self.history_len.get() + 1);
				}
				if self.location.with(|current| *current != location) {
					tracing::debug!(
						kind = ?request.kind,
						target = %location.full_path(),
						"Navigation resolved"
					);
					self.location.set(location);
				}
			}
			Err(e) => {
				tracing::warn!(kind = ?request.kind, "Navigation failed: {}", e);
				self.failures.borrow_mut().push(e);
			}
		}
	}
}

impl Router for MemoryRouter {
	fn location(&self) -> Observable<Location> {
		self.location.clone()
	}

	fn push(&self, to: LocationDescriptor) {
		self.handle(NavigationRequest {
			to,
			kind: NavigationType::Push,
		});
	}

	fn replace(&self, to: LocationDescriptor) {
		self.handle(NavigationRequest {
			to,
			kind: NavigationType::Replace,
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;

	#[fixture]
	fn router() -> MemoryRouter {
		MemoryRouter::new()
			.named_route("home", "/")
			.named_route("user", "/users/:id")
			.route(vec![
				RouteRecord::named("org", "/org/:org"),
				RouteRecord::named("repo", "/org/:org/repos/:repo"),
			])
	}

	fn named(name: &str, params: &[(&str, &str)]) -> LocationDescriptor {
		LocationDescriptor {
			name: Some(name.to_string()),
			params: params
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_string()))
				.collect(),
			..Default::default()
		}
	}

	#[rstest]
	fn test_new_router_is_at_root() {
		let router = MemoryRouter::new();
		assert_eq!(router.current().path, "/");
		assert_eq!(router.history_len(), 1);
		assert_eq!(router.mode(), ResolveMode::Immediate);
	}

	#[rstest]
	fn test_start_at_resolves_path(router: MemoryRouter) {
		let router = router.start_at("/users/42?tab=posts#bio").unwrap();
		let current = router.current();

		assert_eq!(current.name.as_deref(), Some("user"));
		assert_eq!(current.params["id"], "42");
		assert_eq!(current.query["tab"].as_single(), Some("posts"));
		assert_eq!(current.hash, "bio");
		assert_eq!(current.matched, vec![RouteRecord::named("user", "/users/:id")]);
	}

	#[rstest]
	fn test_start_at_unknown_path(router: MemoryRouter) {
		let result = router.start_at("/nowhere");
		assert!(matches!(result, Err(RouterError::NotFound(path)) if path == "/nowhere"));
	}

	#[rstest]
	fn test_resolve_named_nested(router: MemoryRouter) {
		let location = router
			.resolve(&named("repo", &[("org", "acme"), ("repo", "web")]))
			.unwrap();

		assert_eq!(location.path, "/org/acme/repos/web");
		assert_eq!(location.matched.len(), 2);
		assert_eq!(location.params.len(), 2);
	}

	#[rstest]
	fn test_resolve_named_drops_undeclared_params(router: MemoryRouter) {
		let location = router
			.resolve(&named("user", &[("id", "1"), ("extra", "x")]))
			.unwrap();
		assert_eq!(location.params.keys().collect::<Vec<_>>(), vec!["id"]);
	}

	#[rstest]
	fn test_resolve_unknown_name(router: MemoryRouter) {
		let result = router.resolve(&named("missing", &[]));
		assert_eq!(
			result,
			Err(RouterError::InvalidRouteName("missing".to_string()))
		);
	}

	#[rstest]
	fn test_resolve_missing_param(router: MemoryRouter) {
		let result = router.resolve(&named("user", &[]));
		assert!(matches!(
			result,
			Err(RouterError::Pattern(LocationError::MissingParameter { .. }))
		));
	}

	#[rstest]
	fn test_failed_navigation_keeps_location(router: MemoryRouter) {
		let router = router.start_at("/users/1").unwrap();

		router.replace(named("missing", &[]));

		assert_eq!(router.current().path, "/users/1");
		assert_eq!(router.failures().len(), 1);
		assert_eq!(router.request_count(), 1);
	}

	#[rstest]
	fn test_push_grows_history_replace_does_not(router: MemoryRouter) {
		router.replace(named("user", &[("id", "1")]));
		assert_eq!(router.history_len(), 1);

		router.push(named("user", &[("id", "2")]));
		assert_eq!(router.history_len(), 2);
		assert_eq!(router.current().params["id"], "2");
	}

	#[rstest]
	fn test_deferred_requests_resolve_fifo(router: MemoryRouter) {
		let router = router.deferred();

		router.replace(named("user", &[("id", "1")]));
		router.replace(named("user", &[("id", "2")]));

		assert_eq!(router.pending_count(), 2);
		assert_eq!(router.current().path, "/");

		assert_eq!(router.flush(), 2);
		assert_eq!(router.pending_count(), 0);
		assert_eq!(router.current().path, "/users/2");
	}

	#[rstest]
	fn test_unnamed_navigation_uses_path(router: MemoryRouter) {
		router.replace(LocationDescriptor {
			path: Some("/org/acme/repos/api".to_string()),
			..Default::default()
		});

		let current = router.current();
		assert_eq!(current.name.as_deref(), Some("repo"));
		assert_eq!(current.params["repo"], "api");
	}

	#[rstest]
	fn test_unnamed_navigation_ignores_params(router: MemoryRouter) {
		let router = router.start_at("/users/1").unwrap();

		router.replace(LocationDescriptor {
			path: Some("/users/1".to_string()),
			params: [("id".to_string(), "2".to_string())].into_iter().collect(),
			..Default::default()
		});

		assert_eq!(router.current().params["id"], "1");
	}

	#[rstest]
	fn test_empty_chain_is_rejected() {
		let result = MemoryRouter::new().try_route(Vec::new());
		assert!(matches!(result, Err(LocationError::InvalidPattern { .. })));
	}

	#[rstest]
	#[should_panic(expected = "Invalid route chain")]
	fn test_route_panics_on_invalid_pattern() {
		let _ = MemoryRouter::new().named_route("broken", "/users/{id");
	}

	#[rstest]
	fn test_router_error_display() {
		assert_eq!(
			RouterError::NotFound("/test/".to_string()).to_string(),
			"Route not found: /test/"
		);
		assert_eq!(
			RouterError::InvalidRouteName("test".to_string()).to_string(),
			"Invalid route name: test"
		);
	}
}
