//! Location accessors: the `use_route*` family.
//!
//! Each factory is called from a component's setup function and returns a
//! [`Derived`] view:
//!
//! | Factory | View | Value |
//! |---------|------|-------|
//! | [`use_route`] | [`CurrentRoute`] | the whole [`Location`] |
//! | [`use_route_queries`] | [`RouteQueries`] | the query mapping |
//! | [`use_route_query`] | [`RouteQuery`] | one query entry |
//! | [`use_route_params`] | [`RouteParams`] | the path parameters |
//! | [`use_route_param`] | [`RouteParam`] | one path parameter |
//! | [`use_route_param_or_query`] | [`ParamOrQuery`] | a parameter, falling back to the query |
//!
//! Writes never navigate directly. They rebuild the location and pass it to
//! [`CurrentRoute`], which requests navigation only if the result differs
//! from the current location.
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_location::{ComponentContext, use_route_param, use_route_query};
//!
//! fn user_tabs(cx: &ComponentContext) -> Result<(), LocationError> {
//!     cx.setup(|cx| {
//!         let user_id = use_route_param(cx, "id")?;
//!         let tab = use_route_query(cx, "tab")?;
//!
//!         tab.set(Some("posts".into()))?;
//!         log!("user {:?}", user_id.get());
//!         Ok(())
//!     })
//! }
//! ```

use std::rc::Rc;

use crate::context::ComponentContext;
use crate::error::LocationError;
use crate::location::{Location, Params, Query, QueryValue};
use crate::options::UnknownParamPolicy;
use crate::pattern::dynamic_segment_names;
use crate::router::Router;
use crate::view::Derived;

/// View of the whole current location.
pub type CurrentRoute = Derived<Location>;

/// View of the query mapping.
pub type RouteQueries = Derived<Query>;

/// View of a single query entry.
pub type RouteQuery = Derived<Option<QueryValue>>;

/// View of the path parameters.
pub type RouteParams = Derived<Params>;

/// View of a single path parameter.
pub type RouteParam = Derived<Option<String>>;

/// View of a name that is either a path parameter or a query entry.
pub type ParamOrQuery = Derived<Option<QueryValue>>;

/// Returns the router of the component.
///
/// # Errors
///
/// Returns [`LocationError::OutsideSetup`] outside the setup phase.
pub fn use_router(cx: &ComponentContext) -> Result<Rc<dyn Router>, LocationError> {
	cx.ensure_setup()?;
	Ok(Rc::clone(cx.router()))
}

/// Returns a view of the current location.
///
/// Writing a location equal to the current one is a no-op. Any other write
/// requests navigation (replace by default, see
/// [`AccessorOptions::navigation`](crate::AccessorOptions)).
///
/// # Errors
///
/// Returns [`LocationError::OutsideSetup`] outside the setup phase.
pub fn use_route(cx: &ComponentContext) -> Result<CurrentRoute, LocationError> {
	let router = use_router(cx)?;
	let navigation = cx.options().navigation;
	let reader = Rc::clone(&router);

	Ok(Derived::new(
		router.location(),
		move || reader.current(),
		move |value: Location| {
			if value == router.current() {
				tracing::trace!(path = %value.path, "Location unchanged, skipping navigation");
				return Ok(());
			}

			tracing::debug!(
				?navigation,
				route = value.route_name().unwrap_or_default(),
				target = %value.full_path(),
				"Requesting navigation"
			);
			router.navigate(value.to_descriptor(), navigation);
			Ok(())
		},
	))
}

/// Returns a view of the query mapping.
///
/// Writing replaces the whole mapping and keeps the path parameters.
///
/// # Errors
///
/// Returns [`LocationError::OutsideSetup`] outside the setup phase.
pub fn use_route_queries(cx: &ComponentContext) -> Result<RouteQueries, LocationError> {
	let route = use_route(cx)?;
	Ok(route.project(
		|location| location.query.clone(),
		|location, query| location.with_query(query),
	))
}

/// Returns a view of the query entry `name`.
///
/// Writing `None` removes the entry.
///
/// # Errors
///
/// Returns [`LocationError::OutsideSetup`] outside the setup phase.
pub fn use_route_query(
	cx: &ComponentContext,
	name: impl Into<String>,
) -> Result<RouteQuery, LocationError> {
	let queries = use_route_queries(cx)?;
	let key = name.into();
	let read_key = key.clone();

	Ok(queries.project(
		move |query| query.get(&read_key).cloned(),
		move |query, value| {
			let mut query = query.clone();
			match value {
				Some(value) => {
					query.insert(key.clone(), value);
				}
				None => {
					query.shift_remove(&key);
				}
			}
			query
		},
	))
}

/// Returns a view of the path parameters.
///
/// Writes are checked against the dynamic segments of the matched route:
/// declared names with a non-empty value are kept, declared names without
/// one are cleared, and undeclared names are dropped.
///
/// # Errors
///
/// Returns [`LocationError::OutsideSetup`] outside the setup phase.
pub fn use_route_params(cx: &ComponentContext) -> Result<RouteParams, LocationError> {
	let route = use_route(cx)?;
	let policy = cx.options().unknown_params;

	Ok(route.project(
		|location| location.params.clone(),
		move |location, params| {
			let params = declared_params(location, &params, policy);
			location.with_params(params)
		},
	))
}

/// Returns a view of the path parameter `name`.
///
/// Writing `None` clears the parameter.
///
/// # Errors
///
/// Returns [`LocationError::OutsideSetup`] outside the setup phase.
pub fn use_route_param(
	cx: &ComponentContext,
	name: impl Into<String>,
) -> Result<RouteParam, LocationError> {
	let params = use_route_params(cx)?;
	let key = name.into();
	let read_key = key.clone();

	Ok(params.project(
		move |params| params.get(&read_key).cloned(),
		move |params, value| {
			let mut params = params.clone();
			match value {
				Some(value) => {
					params.insert(key.clone(), value);
				}
				None => {
					params.shift_remove(&key);
				}
			}
			params
		},
	))
}

/// Returns a view of `name` as a path parameter or, failing that, a query
/// entry.
///
/// Reads prefer the path parameter. Writes go to the path parameters when
/// `name` is a dynamic segment of the matched route and to the query
/// otherwise. Writing `None` clears the parameter or removes the query
/// entry.
///
/// Writing [`QueryValue::Multiple`] to a dynamic segment fails with
/// [`LocationError::InvalidParamShape`] without navigating.
///
/// # Errors
///
/// Returns [`LocationError::OutsideSetup`] outside the setup phase.
pub fn use_route_param_or_query(
	cx: &ComponentContext,
	name: impl Into<String>,
) -> Result<ParamOrQuery, LocationError> {
	let route = use_route(cx)?;
	let params = use_route_params(cx)?;
	let queries = use_route_queries(cx)?;
	let key: String = name.into();

	let getter = {
		let params = params.clone();
		let queries = queries.clone();
		let key = key.clone();
		move || match params.get().get(&key) {
			Some(value) => Some(QueryValue::Single(value.clone())),
			None => queries.get().get(&key).cloned(),
		}
	};

	let source = route.source().clone();
	let setter = move |value: Option<QueryValue>| {
		if dynamic_segment_names(&route.get()).contains(&key) {
			if value.as_ref().is_some_and(QueryValue::is_multiple) {
				return Err(LocationError::InvalidParamShape { name: key.clone() });
			}
			let mut next = params.get();
			match value.as_ref().and_then(QueryValue::as_single) {
				Some(value) => {
					next.insert(key.clone(), value.to_string());
				}
				None => {
					next.shift_remove(&key);
				}
			}
			params.set(next)
		} else {
			let mut next = queries.get();
			match value {
				Some(value) => {
					next.insert(key.clone(), value);
				}
				None => {
					next.shift_remove(&key);
				}
			}
			queries.set(next)
		}
	};

	Ok(Derived::new(source, getter, setter))
}

/// Keeps the declared segments of `params` that carry a non-empty value.
///
/// The result follows the declaration order of the matched route. Keys that
/// are not declared are dropped and reported according to `policy`.
fn declared_params(location: &Location, params: &Params, policy: UnknownParamPolicy) -> Params {
	let declared = dynamic_segment_names(location);

	if policy == UnknownParamPolicy::Warn {
		for key in params.keys().filter(|key| !declared.contains(key)) {
			tracing::warn!(
				key = %key,
				declared = %declared,
				"\"{}\" not in route params: {}",
				key,
				declared
			);
		}
	}

	declared
		.iter()
		.filter_map(|name| {
			params
				.get(name)
				.filter(|value| !value.is_empty())
				.map(|value| (name.to_string(), value.clone()))
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::location::RouteRecord;
	use rstest::rstest;

	fn params(pairs: &[(&str, &str)]) -> Params {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	fn user_location() -> Location {
		Location::new("/users/1/posts/2")
			.named("user-post")
			.param("user_id", "1")
			.param("post_id", "2")
			.matched_by(vec![
				RouteRecord::named("user", "/users/:user_id"),
				RouteRecord::named("user-post", "/users/:user_id/posts/:post_id"),
			])
	}

	#[rstest]
	fn test_declared_params_follow_declaration_order() {
		let result = declared_params(
			&user_location(),
			&params(&[("post_id", "9"), ("user_id", "8")]),
			UnknownParamPolicy::Warn,
		);

		assert_eq!(
			result.into_iter().collect::<Vec<_>>(),
			vec![
				("user_id".to_string(), "8".to_string()),
				("post_id".to_string(), "9".to_string()),
			]
		);
	}

	#[rstest]
	fn test_declared_params_drop_empty_and_missing() {
		let result = declared_params(
			&user_location(),
			&params(&[("user_id", "")]),
			UnknownParamPolicy::Warn,
		);
		assert!(result.is_empty());
	}

	#[rstest]
	#[case(UnknownParamPolicy::Warn)]
	#[case(UnknownParamPolicy::Ignore)]
	fn test_declared_params_drop_unknown(#[case] policy: UnknownParamPolicy) {
		let result = declared_params(
			&user_location(),
			&params(&[("user_id", "1"), ("post_id", "2"), ("foo", "x")]),
			policy,
		);
		assert_eq!(result, params(&[("user_id", "1"), ("post_id", "2")]));
	}

	#[rstest]
	fn test_declared_params_without_matched_route() {
		let result = declared_params(
			&Location::new("/"),
			&params(&[("id", "1")]),
			UnknownParamPolicy::Ignore,
		);
		assert!(result.is_empty());
	}
}
