//! Parse driver: resets state, feeds logical lines to the grammar and
//! collects diagnostics.

use std::fs;
use std::mem;
use std::path::Path;

use crate::config::{Config, ConfigSource};
use crate::error::{Diagnostic, LineError, Origin, ParseError, Result};
use crate::grammar::Directives;
use crate::special::SpecialScope;

mod reader;

use reader::{LogicalLines, TrailingBackslash};

/// Mutable state of the parse in progress.
#[derive(Debug, Default)]
pub(crate) struct ParseState {
	/// Open categories, outermost first.
	pub(crate) categories: Vec<String>,
	pub(crate) scope: SpecialScope,
	pub(crate) directives: Directives,
	/// Diagnostics kept under the active error policy.
	diagnostics: Vec<Diagnostic>,
	/// Number of sources currently being read; above one while a handler
	/// parses a sourced file.
	depth: usize,
}

impl Config {
	/// Resets every value to its default and parses the configured source.
	///
	/// Only the first problem is reported unless
	/// [`ConfigOptions::throw_all_errors`](crate::ConfigOptions::throw_all_errors)
	/// is set. Lines after an error are still applied.
	///
	/// # Panics
	///
	/// Panics if [`commence`](Self::commence) has not been called.
	pub fn parse(&mut self) -> Result<()> {
		assert!(self.commenced, "cannot parse: not commenced, call commence() first");
		self.reset();

		match self.source.clone() {
			ConfigSource::Path(path) if !path.exists() => {
				if self.options.allow_missing_config {
					tracing::debug!(path = %path.display(), "config file missing, nothing to parse");
					return Ok(());
				}
				return Err(ParseError::new(vec![Diagnostic::MissingSource(path)]));
			}
			ConfigSource::Path(path) => {
				let path = fs::canonicalize(&path).unwrap_or(path);
				tracing::debug!(path = %path.display(), "parsing config file");
				self.state.depth += 1;
				self.run_file(&path);
				self.state.depth -= 1;
			}
			ConfigSource::Stream(text) => {
				tracing::debug!(bytes = text.len(), "parsing config stream");
				self.state.depth += 1;
				self.run_source(&text, Origin::Stream);
				self.state.depth -= 1;
			}
		}

		let open = self.state.directives.open_frames();
		if open > 0 {
			tracing::warn!(open, "#hyprlang if blocks left open at end of config");
			self.state.directives.close_frames();
		}

		let diagnostics = mem::take(&mut self.state.diagnostics);
		tracing::debug!(diagnostics = diagnostics.len(), "parse finished");
		if diagnostics.is_empty() {
			Ok(())
		} else {
			Err(ParseError::new(diagnostics))
		}
	}

	/// Parses `path` into the current state, without resetting defaults.
	///
	/// Meant for `source = path` style handlers. Categories opened in the
	/// file are scoped to it. The returned error lists the problems raised by
	/// this file; inside a running [`parse`](Self::parse) they are also
	/// reported by the outer parse, so a handler need not forward them.
	///
	/// There is no cycle detection: a file that sources itself recurses until
	/// the stack runs out.
	pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		let top_level = self.state.depth == 0;
		tracing::debug!(path = %path.display(), top_level, "parsing sourced file");

		self.state.depth += 1;
		let raised = self.run_file(path);
		self.state.depth -= 1;

		if top_level {
			self.state.diagnostics.clear();
		}
		if raised.is_empty() {
			Ok(())
		} else {
			Err(ParseError::new(raised))
		}
	}

	/// Applies a single line on top of the current state.
	///
	/// Assigning a variable this way re-evaluates every line that referenced
	/// it during the last parse. Nothing done here survives the next
	/// [`parse`](Self::parse).
	pub fn parse_dynamic(&mut self, line: &str) -> std::result::Result<(), LineError> {
		self.process_line(line, true)
	}

	/// [`parse_dynamic`](Self::parse_dynamic) for `key = value`.
	pub fn parse_dynamic_pair(&mut self, key: &str, value: &str) -> std::result::Result<(), LineError> {
		self.process_line(&format!("{key}={value}"), true)
	}

	/// Clears parse state and variables, drops dynamic special instances and
	/// puts every value back to its default.
	fn reset(&mut self) {
		self.state.categories.clear();
		self.state.scope.clear();
		self.state.directives = Directives::default();
		self.state.diagnostics.clear();

		self.vars.reset();
		self.specials.reset(&mut self.arena);
		for (name, default) in &self.defaults {
			if let Some(cell) = self.values.get(name).and_then(|h| self.arena.get_mut(*h)) {
				cell.reset_to(default);
			}
		}
	}

	fn run_file(&mut self, path: &Path) -> Vec<Diagnostic> {
		match fs::read_to_string(path) {
			Ok(text) => self.run_source(&text, Origin::File(path.to_owned())),
			Err(error) => {
				tracing::warn!(path = %path.display(), %error, "failed to read config file");
				let mut raised = Vec::new();
				self.raise(
					&mut raised,
					Diagnostic::SourceUnreadable {
						path: path.to_owned(),
						message: error.to_string(),
					},
				);
				raised
			}
		}
	}

	/// Feeds every logical line of `text` to the grammar. Returns the
	/// diagnostics raised, whether or not the error policy kept them.
	fn run_source(&mut self, text: &str, origin: Origin) -> Vec<Diagnostic> {
		let outer_categories = mem::take(&mut self.state.categories);
		let outer_scope = mem::take(&mut self.state.scope);
		let mut raised = Vec::new();

		for line in LogicalLines::new(text) {
			match line {
				Ok(line) => {
					if let Err(error) = self.process_line(&line.text, false)
						&& !self.state.directives.no_error()
					{
						let diagnostic = Diagnostic::Line {
							origin: origin.clone(),
							line: line.number,
							error,
						};
						self.raise(&mut raised, diagnostic);
					}
				}
				Err(TrailingBackslash) => {
					self.raise(&mut raised, Diagnostic::TrailingBackslash(origin.clone()));
					break;
				}
			}
		}

		if !self.state.categories.is_empty() {
			self.raise(&mut raised, Diagnostic::UnclosedCategory(origin));
		}

		self.state.categories = outer_categories;
		self.state.scope = outer_scope;
		raised
	}

	fn raise(&mut self, raised: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
		tracing::debug!(%diagnostic, "config diagnostic");
		if self.state.diagnostics.is_empty() || self.options.throw_all_errors {
			self.state.diagnostics.push(diagnostic.clone());
		}
		raised.push(diagnostic);
	}
}
