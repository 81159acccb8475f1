//! Route pattern parsing.
//!
//! Route records carry their path as a template. This module extracts the
//! dynamic segment names from those templates, and can reverse a template
//! into a concrete path or match a path against it.
//!
//! Two template dialects are accepted and may be mixed:
//!
//! - `/users/:id`, `/files/:path*`, `/posts/:slug?`, `/items/:id(\d+)`, `/(.*)`
//! - `/users/{id}/`, `/static/{path:*}`

use indexmap::IndexSet;
use serde::Serialize;
use std::fmt;

use crate::error::LocationError;
use crate::location::{Location, Params};

/// Maximum allowed length for a route template in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed size for a compiled pattern regex in bytes.
const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

/// Default expression for a single path segment.
const SEGMENT_EXPR: &str = "[^/]+?";

/// Expression of a catch-all parameter such as `{path:*}` or `:path(.*)`.
const WILDCARD_EXPR: &str = ".*";

/// How many times a parameter may repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
	/// Exactly one segment.
	One,
	/// Zero or one segment (`:name?`).
	Optional,
	/// Zero or more segments (`:name*`).
	ZeroOrMore,
	/// One or more segments (`:name+`).
	OneOrMore,
}

impl Modifier {
	fn from_char(c: char) -> Option<Self> {
		match c {
			'?' => Some(Self::Optional),
			'*' => Some(Self::ZeroOrMore),
			'+' => Some(Self::OneOrMore),
			_ => None,
		}
	}

	/// Whether the parameter may be left out.
	pub fn is_optional(self) -> bool {
		matches!(self, Self::Optional | Self::ZeroOrMore)
	}

	/// Whether the parameter may span several segments.
	pub fn is_repeated(self) -> bool {
		matches!(self, Self::ZeroOrMore | Self::OneOrMore)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
	Static(String),
	Param {
		name: String,
		prefix: Option<char>,
		expr: String,
		modifier: Modifier,
	},
}

/// A parsed route template.
#[derive(Debug, Clone)]
pub struct RoutePattern {
	template: String,
	tokens: Vec<Token>,
	regex: regex::Regex,
}

impl RoutePattern {
	/// Parses a route template.
	///
	/// # Errors
	///
	/// Returns [`LocationError::InvalidPattern`] if the template is too long,
	/// has an unclosed `{` or `(`, declares a parameter without a name, or
	/// contains an invalid custom expression.
	pub fn parse(template: &str) -> Result<Self, LocationError> {
		if template.len() > MAX_PATTERN_LENGTH {
			return Err(LocationError::invalid_pattern(
				template,
				format!(
					"length {} exceeds maximum of {} bytes",
					template.len(),
					MAX_PATTERN_LENGTH
				),
			));
		}

		let tokens = tokenize(template)?;
		let regex = regex::RegexBuilder::new(&to_regex(&tokens))
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| LocationError::invalid_pattern(template, e.to_string()))?;

		Ok(Self {
			template: template.to_string(),
			tokens,
			regex,
		})
	}

	/// Returns the template as written.
	pub fn template(&self) -> &str {
		&self.template
	}

	/// Returns the dynamic segment names in declaration order.
	pub fn keys(&self) -> Vec<&str> {
		self.tokens
			.iter()
			.filter_map(|token| match token {
				Token::Param { name, .. } => Some(name.as_str()),
				Token::Static(_) => None,
			})
			.collect()
	}

	/// Returns the modifier of a parameter.
	pub fn modifier(&self, key: &str) -> Option<Modifier> {
		self.tokens.iter().find_map(|token| match token {
			Token::Param { name, modifier, .. } if name == key => Some(*modifier),
			_ => None,
		})
	}

	/// Builds a concrete path by substituting `params`.
	///
	/// Values are percent-encoded. Repeated and catch-all parameters keep
	/// their `/` separators. Optional parameters without a value are left
	/// out along with their leading `/`.
	///
	/// # Errors
	///
	/// Returns [`LocationError::MissingParameter`] if a required parameter
	/// has no non-empty value.
	pub fn reverse(&self, params: &Params) -> Result<String, LocationError> {
		let mut path = String::new();

		for token in &self.tokens {
			match token {
				Token::Static(text) => path.push_str(text),
				Token::Param {
					name,
					prefix,
					expr,
					modifier,
				} => {
					let value = params.get(name).filter(|v| !v.is_empty());
					match value {
						Some(value) => {
							if let Some(prefix) = prefix {
								path.push(*prefix);
							}
							if modifier.is_repeated() || expr == WILDCARD_EXPR {
								let encoded: Vec<_> = value
									.split('/')
									.map(|piece| urlencoding::encode(piece).into_owned())
									.collect();
								path.push_str(&encoded.join("/"));
							} else {
								path.push_str(&urlencoding::encode(value));
							}
						}
						None if modifier.is_optional() => {}
						None => {
							return Err(LocationError::MissingParameter {
								pattern: self.template.clone(),
								name: name.clone(),
							});
						}
					}
				}
			}
		}

		if path.is_empty() {
			path.push('/');
		}
		Ok(path)
	}

	/// Matches `path` against this pattern and extracts the parameters.
	///
	/// A trailing `/` on `path` is tolerated. Parameters that matched
	/// nothing are left out of the result.
	pub fn matches(&self, path: &str) -> Option<Params> {
		let caps = self.regex.captures(path)?;
		let mut params = Params::new();

		for (index, key) in self.keys().into_iter().enumerate() {
			if let Some(m) = caps.name(&format!("p{}", index)) {
				let raw = m.as_str();
				let value = urlencoding::decode(raw)
					.map(|v| v.into_owned())
					.unwrap_or_else(|_| raw.to_string());
				params.insert(key.to_string(), value);
			}
		}
		Some(params)
	}
}

impl fmt::Display for RoutePattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.template)
	}
}

fn is_name_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

/// Reads a parenthesised expression; the opening `(` is already consumed.
fn read_group(
	template: &str,
	chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<String, LocationError> {
	let mut depth = 1;
	let mut expr = String::new();

	while let Some(c) = chars.next() {
		match c {
			'\\' => {
				expr.push(c);
				if let Some(escaped) = chars.next() {
					expr.push(escaped);
				}
			}
			'(' => {
				depth += 1;
				expr.push(c);
			}
			')' => {
				depth -= 1;
				if depth == 0 {
					if expr.is_empty() {
						return Err(LocationError::invalid_pattern(template, "empty '()' group"));
					}
					return Ok(expr);
				}
				expr.push(c);
			}
			_ => expr.push(c),
		}
	}

	Err(LocationError::invalid_pattern(template, "unclosed '('"))
}

fn tokenize(template: &str) -> Result<Vec<Token>, LocationError> {
	let mut tokens = Vec::new();
	let mut text = String::new();
	let mut unnamed = 0usize;
	let mut chars = template.chars().peekable();

	// Moves a trailing '/' of the pending text into the parameter prefix.
	let take_prefix = |text: &mut String, tokens: &mut Vec<Token>| -> Option<char> {
		let prefix = if text.ends_with('/') {
			text.pop();
			Some('/')
		} else {
			None
		};
		if !text.is_empty() {
			tokens.push(Token::Static(std::mem::take(text)));
		}
		prefix
	};

	while let Some(c) = chars.next() {
		match c {
			'\\' => {
				if let Some(escaped) = chars.next() {
					text.push(escaped);
				}
			}
			':' if chars.peek().copied().is_some_and(is_name_char) => {
				let mut name = String::new();
				while let Some(&next) = chars.peek() {
					if !is_name_char(next) {
						break;
					}
					name.push(next);
					chars.next();
				}

				let expr = if chars.peek() == Some(&'(') {
					chars.next();
					read_group(template, &mut chars)?
				} else {
					SEGMENT_EXPR.to_string()
				};
				let modifier = chars
					.peek()
					.copied()
					.and_then(Modifier::from_char)
					.inspect(|_| {
						chars.next();
					})
					.unwrap_or(Modifier::One);

				let prefix = take_prefix(&mut text, &mut tokens);
				tokens.push(Token::Param {
					name,
					prefix,
					expr,
					modifier,
				});
			}
			'(' => {
				let expr = read_group(template, &mut chars)?;
				let modifier = chars
					.peek()
					.copied()
					.and_then(Modifier::from_char)
					.inspect(|_| {
						chars.next();
					})
					.unwrap_or(Modifier::One);

				let prefix = take_prefix(&mut text, &mut tokens);
				tokens.push(Token::Param {
					name: unnamed.to_string(),
					prefix,
					expr,
					modifier,
				});
				unnamed += 1;
			}
			'{' => {
				let mut body = String::new();
				let mut closed = false;
				for next in chars.by_ref() {
					if next == '}' {
						closed = true;
						break;
					}
					body.push(next);
				}
				if !closed {
					return Err(LocationError::invalid_pattern(template, "unclosed '{'"));
				}

				let (name, expr) = match body.split_once(':') {
					Some((name, "*")) => (name.to_string(), WILDCARD_EXPR.to_string()),
					Some((_, kind)) => {
						return Err(LocationError::invalid_pattern(
							template,
							format!("unsupported parameter kind ':{}'", kind),
						));
					}
					None => (body, "[^/]+".to_string()),
				};
				if name.is_empty() || !name.chars().all(is_name_char) {
					return Err(LocationError::invalid_pattern(
						template,
						format!("invalid parameter name '{}'", name),
					));
				}

				let prefix = take_prefix(&mut text, &mut tokens);
				tokens.push(Token::Param {
					name,
					prefix,
					expr,
					modifier: Modifier::One,
				});
			}
			_ => text.push(c),
		}
	}

	if !text.is_empty() {
		tokens.push(Token::Static(text));
	}
	Ok(tokens)
}

fn to_regex(tokens: &[Token]) -> String {
	let mut regex_str = String::from("^");
	let mut index = 0usize;

	for token in tokens {
		match token {
			Token::Static(text) => regex_str.push_str(&regex::escape(text)),
			Token::Param {
				prefix,
				expr,
				modifier,
				..
			} => {
				let prefix = prefix
					.map(|p| regex::escape(&p.to_string()))
					.unwrap_or_default();
				let group = format!("p{}", index);
				index += 1;

				let part = match modifier {
					Modifier::One => format!("{prefix}(?P<{group}>{expr})"),
					Modifier::Optional => format!("(?:{prefix}(?P<{group}>{expr}))?"),
					Modifier::OneOrMore => {
						format!("{prefix}(?P<{group}>(?:{expr})(?:{prefix}(?:{expr}))*)")
					}
					Modifier::ZeroOrMore => {
						format!("(?:{prefix}(?P<{group}>(?:{expr})(?:{prefix}(?:{expr}))*))?")
					}
				};
				regex_str.push_str(&part);
			}
		}
	}

	if !regex_str.ends_with('/') {
		regex_str.push_str("/?");
	}
	regex_str.push('$');
	regex_str
}

/// The dynamic segment names declared by a matched route chain.
///
/// Ordered by first declaration, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SegmentNames(IndexSet<String>);

impl SegmentNames {
	/// Returns whether `name` is a declared dynamic segment.
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains(name)
	}

	/// Iterates over the names in declaration order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Returns the number of declared names.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns whether no names are declared.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<S: Into<String>> FromIterator<S> for SegmentNames {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self(iter.into_iter().map(Into::into).collect())
	}
}

impl fmt::Display for SegmentNames {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match serde_json::to_string(self) {
			Ok(json) => f.write_str(&json),
			Err(_) => Err(fmt::Error),
		}
	}
}

/// Collects the dynamic segment names of every record in `location.matched`.
///
/// A record whose template cannot be parsed is skipped with a warning.
pub fn dynamic_segment_names(location: &Location) -> SegmentNames {
	let mut names = IndexSet::new();

	for record in &location.matched {
		match RoutePattern::parse(&record.path) {
			Ok(pattern) => {
				names.extend(pattern.keys().into_iter().map(str::to_string));
			}
			Err(e) => {
				tracing::warn!(
					route = record.name.as_deref().unwrap_or_default(),
					"Skipping route record while collecting segment names: {}",
					e
				);
			}
		}
	}

	SegmentNames(names)
}
