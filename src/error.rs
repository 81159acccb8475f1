//! Error types for the location accessors.

use thiserror::Error;

/// Errors raised by the location accessors and route patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
	/// An accessor factory was invoked outside a component's setup phase.
	#[error("must be called in setup")]
	OutsideSetup,

	/// A path parameter was assigned a list value.
	#[error("param can't be array: {name}")]
	InvalidParamShape {
		/// Name of the path parameter.
		name: String,
	},

	/// A route template could not be parsed.
	#[error("Invalid route pattern '{pattern}': {reason}")]
	InvalidPattern {
		/// The template as written.
		pattern: String,
		/// What was wrong with it.
		reason: String,
	},

	/// A query string could not be decoded.
	#[error("Invalid query string '{query}': {reason}")]
	InvalidQuery {
		/// The raw query string.
		query: String,
		/// Decoder message.
		reason: String,
	},

	/// A required parameter was missing while reversing a pattern.
	#[error("Missing parameter '{name}' for pattern '{pattern}'")]
	MissingParameter {
		/// The template being reversed.
		pattern: String,
		/// Name of the missing parameter.
		name: String,
	},
}

impl LocationError {
	pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
		Self::InvalidPattern {
			pattern: pattern.to_string(),
			reason: reason.into(),
		}
	}
}
