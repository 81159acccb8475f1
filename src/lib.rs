//! # Reinhardt Location
//!
//! Reactive accessors for the current route of a client-side router.
//!
//! Components read and write the URL through live views instead of talking
//! to the router directly. Every view is derived from the router's current
//! location, and every write is turned into a single navigation request
//! carrying the whole rebuilt location.
//!
//! ## Accessors
//!
//! - [`use_route`] - the whole location
//! - [`use_route_queries`] / [`use_route_query`] - the query string
//! - [`use_route_params`] / [`use_route_param`] - the path parameters
//! - [`use_route_param_or_query`] - a path parameter with a query fallback
//!
//! All of them must be called while the component is being set up, see
//! [`ComponentContext::setup`].
//!
//! ## Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use reinhardt_location::{ComponentContext, MemoryRouter, RouteRecord, use_route_query};
//!
//! let router = Rc::new(
//!     MemoryRouter::new()
//!         .named_route("search", "/search")
//!         .start_at("/search?q=rust")?,
//! );
//! let cx = ComponentContext::new(router.clone());
//!
//! let q = cx.setup(|cx| use_route_query(cx, "q"))?;
//! q.set(Some("tokio".into()))?;
//!
//! assert_eq!(router.current().full_path(), "/search?q=tokio");
//! ```
//!
//! ## Logging
//!
//! The crate logs through `tracing`. Undeclared path parameter keys are
//! reported at `WARN`, navigation requests and router resolution at `DEBUG`.

#![warn(missing_docs)]

pub mod accessors;
pub mod context;
pub mod error;
pub mod location;
pub mod memory;
pub mod options;
pub mod pattern;
pub mod router;
pub mod store;
pub mod view;

pub use accessors::{
	CurrentRoute, ParamOrQuery, RouteParam, RouteParams, RouteQueries, RouteQuery, use_route,
	use_route_param, use_route_param_or_query, use_route_params, use_route_queries,
	use_route_query, use_router,
};
pub use context::{ComponentContext, Phase};
pub use error::LocationError;
pub use location::{
	Location, LocationDescriptor, Params, Query, QueryValue, RouteRecord, format_query,
	parse_query,
};
pub use memory::{MemoryRouter, NavigationRequest, ResolveMode, RouterError};
pub use options::{AccessorOptions, UnknownParamPolicy};
pub use pattern::{Modifier, RoutePattern, SegmentNames, dynamic_segment_names};
pub use router::{NavigationType, Router};
pub use store::{ListenerId, Observable, Subscription};
pub use view::Derived;

/// Result type for location accessor operations.
pub type Result<T> = std::result::Result<T, LocationError>;
