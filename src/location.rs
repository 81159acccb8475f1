//! Location value types.
//!
//! A [`Location`] is the router's resolved navigation target: the path,
//! the optional route name, path parameters, query parameters, the hash
//! fragment and the chain of matched route records. The accessors only ever
//! read a snapshot of it and submit whole-location replacements in the form
//! of a [`LocationDescriptor`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::LocationError;

/// Path parameters in the order the router resolved them.
pub type Params = IndexMap<String, String>;

/// Query parameters in the order they appear in the URL.
pub type Query = IndexMap<String, QueryValue>;

/// A single query parameter value.
///
/// Repeated keys (`?tag=a&tag=b`) are represented by [`QueryValue::Multiple`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
	/// A single string value.
	Single(String),
	/// A list of values for a repeated key.
	Multiple(Vec<String>),
}

impl QueryValue {
	/// Returns the value if this is a single value.
	pub fn as_single(&self) -> Option<&str> {
		match self {
			Self::Single(value) => Some(value),
			Self::Multiple(_) => None,
		}
	}

	/// Returns whether this is a list value.
	pub fn is_multiple(&self) -> bool {
		matches!(self, Self::Multiple(_))
	}

	/// Returns all values in order.
	pub fn values(&self) -> Vec<&str> {
		match self {
			Self::Single(value) => vec![value.as_str()],
			Self::Multiple(values) => values.iter().map(String::as_str).collect(),
		}
	}
}

impl From<&str> for QueryValue {
	fn from(value: &str) -> Self {
		Self::Single(value.to_string())
	}
}

impl From<String> for QueryValue {
	fn from(value: String) -> Self {
		Self::Single(value)
	}
}

impl From<Vec<String>> for QueryValue {
	fn from(values: Vec<String>) -> Self {
		Self::Multiple(values)
	}
}

impl From<Vec<&str>> for QueryValue {
	fn from(values: Vec<&str>) -> Self {
		Self::Multiple(values.into_iter().map(str::to_string).collect())
	}
}

/// One entry of the matched route chain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteRecord {
	/// The path template, e.g. `/users/:id` or `/users/{id}/`.
	pub path: String,
	/// Optional route name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

impl RouteRecord {
	/// Creates an unnamed record.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			name: None,
		}
	}

	/// Creates a named record.
	pub fn named(name: impl Into<String>, path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			name: Some(name.into()),
		}
	}
}

/// The router's current resolved location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
	/// The resolved path, without query or hash.
	pub path: String,
	/// Name of the matched route, if it has one.
	pub name: Option<String>,
	/// Path parameters.
	pub params: Params,
	/// Query parameters.
	pub query: Query,
	/// Hash fragment without the leading `#`.
	pub hash: String,
	/// Matched route records, outermost first.
	pub matched: Vec<RouteRecord>,
}

impl Default for Location {
	fn default() -> Self {
		Self::new("/")
	}
}

impl Location {
	/// Creates a location for `path` with no parameters.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			name: None,
			params: Params::new(),
			query: Query::new(),
			hash: String::new(),
			matched: Vec::new(),
		}
	}

	/// Parses an href of the form `path?query#hash`.
	///
	/// # Errors
	///
	/// Returns [`LocationError::InvalidQuery`] if the query string cannot be
	/// decoded.
	pub fn parse(href: &str) -> Result<Self, LocationError> {
		let (rest, hash) = match href.split_once('#') {
			Some((rest, hash)) => (rest, hash),
			None => (href, ""),
		};
		let (path, query) = match rest.split_once('?') {
			Some((path, query)) => (path, parse_query(query)?),
			None => (rest, Query::new()),
		};

		let mut location = Self::new(if path.is_empty() { "/" } else { path });
		location.query = query;
		location.hash = hash.to_string();
		Ok(location)
	}

	/// Sets the route name.
	pub fn named(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Adds a path parameter.
	pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(name.into(), value.into());
		self
	}

	/// Adds a query parameter.
	pub fn query_entry(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
		self.query.insert(name.into(), value.into());
		self
	}

	/// Sets the hash fragment.
	pub fn fragment(mut self, hash: impl Into<String>) -> Self {
		self.hash = hash.into();
		self
	}

	/// Sets the matched route chain.
	pub fn matched_by(mut self, matched: Vec<RouteRecord>) -> Self {
		self.matched = matched;
		self
	}

	/// Returns this location with its query replaced and every other field kept.
	pub fn with_query(&self, query: Query) -> Self {
		Self {
			query,
			..self.clone()
		}
	}

	/// Returns this location with its params replaced and every other field kept.
	pub fn with_params(&self, params: Params) -> Self {
		Self {
			params,
			..self.clone()
		}
	}

	/// Returns the route name, treating an empty name as absent.
	pub fn route_name(&self) -> Option<&str> {
		self.name.as_deref().filter(|name| !name.is_empty())
	}

	/// Renders `path?query#hash`.
	pub fn full_path(&self) -> String {
		let mut href = self.path.clone();
		let query = format_query(&self.query);
		if !query.is_empty() {
			href.push('?');
			href.push_str(&query);
		}
		if !self.hash.is_empty() {
			href.push('#');
			href.push_str(&self.hash);
		}
		href
	}

	/// Builds the navigation request for this location.
	///
	/// An absent or empty route name requests path-based navigation.
	pub fn to_descriptor(&self) -> LocationDescriptor {
		LocationDescriptor {
			name: self.route_name().map(str::to_string),
			path: Some(self.path.clone()),
			params: self.params.clone(),
			query: self.query.clone(),
			hash: self.hash.clone(),
		}
	}
}

/// A partial location submitted to the router.
///
/// With a `name` the router resolves the named route and fills its
/// parameters from `params`. Without one it resolves `path` and `params`
/// are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationDescriptor {
	/// Target route name.
	pub name: Option<String>,
	/// Target path, used when `name` is absent.
	pub path: Option<String>,
	/// Path parameters for a named target.
	pub params: Params,
	/// Query parameters.
	pub query: Query,
	/// Hash fragment without the leading `#`.
	pub hash: String,
}

impl From<&Location> for LocationDescriptor {
	fn from(location: &Location) -> Self {
		location.to_descriptor()
	}
}

/// Decodes a query string, grouping repeated keys into [`QueryValue::Multiple`].
///
/// A leading `?` is accepted. Keys keep the order of their first occurrence.
///
/// # Errors
///
/// Returns [`LocationError::InvalidQuery`] if the string cannot be decoded.
pub fn parse_query(raw: &str) -> Result<Query, LocationError> {
	let trimmed = raw.strip_prefix('?').unwrap_or(raw);
	let pairs: Vec<(String, String)> =
		serde_urlencoded::from_str(trimmed).map_err(|e| LocationError::InvalidQuery {
			query: raw.to_string(),
			reason: e.to_string(),
		})?;

	let mut query = Query::new();
	for (key, value) in pairs {
		match query.get_mut(&key) {
			Some(slot) => match slot {
				QueryValue::Single(first) => {
					let first = std::mem::take(first);
					*slot = QueryValue::Multiple(vec![first, value]);
				}
				QueryValue::Multiple(values) => values.push(value),
			},
			None => {
				query.insert(key, QueryValue::Single(value));
			}
		}
	}
	Ok(query)
}

/// Encodes a query mapping; list values become repeated keys.
pub fn format_query(query: &Query) -> String {
	query
		.iter()
		.flat_map(|(key, value)| {
			value
				.values()
				.into_iter()
				.map(move |v| format!("{}={}", urlencoding::encode(key), urlencoding::encode(v)))
				.collect::<Vec<_>>()
		})
		.collect::<Vec<_>>()
		.join("&")
}
