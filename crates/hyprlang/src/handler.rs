//! Keyword handlers: host callbacks that take over assignments the value
//! registry does not know about.
//!
//! A handler is looked up by the assignment's left-hand side, in one of
//! three ways:
//!
//! - `name`: unscoped, matches `name = ...` at any depth;
//! - `cat:sub:name` (or `:name` for the top level): matches `name = ...` only
//!   when the open categories are exactly `cat`, `sub`;
//! - with [`HandlerOptions::allow_flags`], matches any left-hand side starting
//!   with the name (`bindel = ...` for a `bind` handler), provided it
//!   contains no `:`.

use std::rc::Rc;

use crate::Config;
use crate::error::HandlerError;


/// Callback invoked with the (substituted) left-hand side and value.
///
/// Handlers receive the config itself so they can, for instance, parse a
/// sourced file with [`Config::parse_file`].
pub type HandlerFn = dyn Fn(&mut Config, &str, &str) -> Result<(), HandlerError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerOptions {
	/// Match by prefix, leaving trailing flag characters to the handler.
	pub allow_flags: bool,
}

impl HandlerOptions {
	pub fn with_allow_flags(mut self, allow_flags: bool) -> Self {
		self.allow_flags = allow_flags;
		self
	}
}

struct Handler {
	name: String,
	options: HandlerOptions,
	callback: Rc<HandlerFn>,
}

impl Handler {
	fn matches(&self, categories: &[String], lhs: &str) -> bool {
		let unscoped = !self.name.contains(':');
		let name = self.name.strip_prefix(':').unwrap_or(&self.name);

		if self.options.allow_flags {
			return lhs.starts_with(name) && !lhs.contains(':');
		}

		if unscoped {
			return name == lhs;
		}

		let mut rest = name;
		let mut depth = 0;
		while let Some(category) = categories.get(depth)
			&& let Some((segment, tail)) = rest.split_once(':')
			&& segment == category
		{
			rest = tail;
			depth += 1;
		}

		depth == categories.len() && rest == lhs
	}
}

/// Registered handlers, in registration order.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
	handlers: Vec<Handler>,
}

impl HandlerRegistry {
	pub(crate) fn register(&mut self, name: &str, options: HandlerOptions, callback: Rc<HandlerFn>) {
		tracing::debug!(handler = name, allow_flags = options.allow_flags, "registered handler");
		self.handlers.push(Handler {
			name: name.to_owned(),
			options,
			callback,
		});
	}

	/// Removes every handler registered under `name`.
	pub(crate) fn unregister(&mut self, name: &str) {
		let before = self.handlers.len();
		self.handlers.retain(|h| h.name != name);
		tracing::debug!(handler = name, removed = before - self.handlers.len(), "unregistered handler");
	}

	/// Callbacks matching `lhs` under the open `categories`, in registration
	/// order.
	pub(crate) fn matching(&self, categories: &[String], lhs: &str) -> Vec<Rc<HandlerFn>> {
		self.handlers
			.iter()
			.filter(|h| h.matches(categories, lhs))
			.map(|h| Rc::clone(&h.callback))
			.collect()
	}
}
