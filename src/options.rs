//! Accessor configuration.
//!
//! Options are plain data with `serde` support so they can be read from the
//! application's settings alongside the rest of its configuration:
//!
//! ```ignore
//! let options: AccessorOptions = serde_json::from_str(r#"{ "unknown_params": "ignore" }"#)?;
//! let cx = ComponentContext::new(router).with_options(options);
//! ```

use serde::{Deserialize, Serialize};

use crate::router::NavigationType;

/// What to do when a parameter write names an undeclared segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownParamPolicy {
	/// Drop the key and emit a warning.
	#[default]
	Warn,
	/// Drop the key silently.
	Ignore,
}

/// Options shared by every accessor created from one component context.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessorOptions {
	/// History behaviour of navigations triggered by writes.
	pub navigation: NavigationType,
	/// Handling of undeclared path parameter keys.
	pub unknown_params: UnknownParamPolicy,
}

impl AccessorOptions {
	/// Creates the default options: replace navigation, warn on unknown keys.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the navigation type used for writes.
	pub fn navigation(mut self, navigation: NavigationType) -> Self {
		self.navigation = navigation;
		self
	}

	/// Sets the unknown parameter policy.
	pub fn unknown_params(mut self, policy: UnknownParamPolicy) -> Self {
		self.unknown_params = policy;
		self
	}
}
