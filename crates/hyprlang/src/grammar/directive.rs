//! `#hyprlang` comment directives.
//!
//! ```text
//! #hyprlang noerror true
//! #hyprlang if MY_VAR
//! #hyprlang if !MY_VAR
//! #hyprlang endif
//! ```

use crate::error::GrammarError;
use crate::vars::VariableTable;


#[derive(Debug, Clone, Copy)]
struct IfFrame {
	failed: bool,
}

/// Directive state of one parse.
#[derive(Debug, Clone, Default)]
pub(crate) struct Directives {
	no_error: bool,
	frames: Vec<IfFrame>,
}

impl Directives {
	/// Whether errors are currently being suppressed.
	pub(crate) fn no_error(&self) -> bool {
		self.no_error
	}

	/// Whether lines are being skipped. Only the innermost `if` decides.
	pub(crate) fn skipping(&self) -> bool {
		self.frames.last().is_some_and(|f| f.failed)
	}

	pub(crate) fn open_frames(&self) -> usize {
		self.frames.len()
	}

	/// Drops every open `if` frame.
	pub(crate) fn close_frames(&mut self) {
		self.frames.clear();
	}

	/// Interprets a comment (without its leading `#`). Comments that are not
	/// directives are ignored.
	pub(crate) fn apply(&mut self, comment: &str, vars: &VariableTable) -> Result<(), GrammarError> {
		let mut args = comment.split_whitespace();
		if !args.next().is_some_and(|first| first.starts_with("hyprlang")) {
			return Ok(());
		}

		while let Some(arg) = args.next() {
			match arg {
				"noerror" => {
					self.no_error = matches!(
						args.next().unwrap_or_default(),
						"" | "true" | "yes" | "enable" | "enabled" | "set"
					);
					tracing::trace!(no_error = self.no_error, "noerror directive");
					return Ok(());
				}
				"endif" => {
					return self.frames.pop().map(drop).ok_or(GrammarError::StrayEndif);
				}
				"if" => {
					if let Some(condition) = args.next() {
						self.push_if(condition, vars);
					}
					return Ok(());
				}
				_ => {}
			}
		}

		Ok(())
	}

	fn push_if(&mut self, condition: &str, vars: &VariableTable) {
		let (negated, name) = match condition.strip_prefix('!') {
			Some(name) => (true, name),
			None => (false, condition),
		};

		let truthy = vars.get(name).is_some_and(|v| v.is_truthy());
		let failed = truthy == negated;
		tracing::trace!(variable = name, negated, failed, "if directive");
		self.frames.push(IfFrame { failed });
	}
}
