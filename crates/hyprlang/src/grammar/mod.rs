//! Line grammar: turns one logical line into a config mutation.
//!
//! Per line, in order:
//!
//! 1. `#` at the start makes a comment; `#hyprlang` comments are directives.
//! 2. Lines inside a failed `#hyprlang if` are dropped.
//! 3. Everything from the first unescaped `#` on is stripped (`##` is a
//!    literal `#`).
//! 4. What remains is a category open (`name {`), a category close (`}`), a
//!    single-line block (`name { key = value }`) or an assignment.
//! 5. Assignments go through variable and `{{ }}` expansion, then either
//!    define a variable (`$name = ...`), set a registered value, or fall
//!    through to keyword handlers.

use std::collections::VecDeque;
use std::mem;

use rustc_hash::FxHashSet;

pub(crate) use directive::Directives;

use crate::Config;
use crate::error::{GrammarError, LineError};
use crate::special::Resolution;
use crate::vars::RecordedLine;

mod directive;
mod expr;

/// Substitution passes allowed before a line is considered cyclic.
const MAX_EXPANSION_PASSES: usize = 100;

/// Lines one dynamic update may replay before giving up.
pub const MAX_REPLAYS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Statement<'a> {
	Assignment { lhs: &'a str, rhs: &'a str },
	Open(&'a str),
	Close,
	Block { category: &'a str, body: &'a str },
}

/// A recorded line queued for re-evaluation after `variable` changed.
struct Replay {
	variable: String,
	line: RecordedLine,
}

enum Target {
	Applied,
	Missing(String),
}

fn classify(line: &str) -> Result<Statement<'_>, GrammarError> {
	if let Some((category, rest)) = line.split_once('{')
		&& !category.contains(['=', '}'])
		&& let Some(body) = rest.trim_end().strip_suffix('}')
		&& body.contains('=')
	{
		return Ok(Statement::Block {
			category: category.trim(),
			body: body.trim(),
		});
	}

	if let Some((lhs, rhs)) = line.split_once('=') {
		let lhs = lhs.trim();
		if lhs.is_empty() {
			return Err(GrammarError::EmptyLhs);
		}
		return Ok(Statement::Assignment { lhs, rhs: rhs.trim() });
	}

	if line.contains('}') {
		return match line {
			"}" => Ok(Statement::Close),
			_ => Err(GrammarError::InvalidLine),
		};
	}

	match line.strip_suffix('{') {
		Some(category) => Ok(Statement::Open(category.trim())),
		None if line.contains('{') => Err(GrammarError::GarbageAfterBrace),
		None => Err(GrammarError::InvalidLine),
	}
}

/// Cuts `line` at the first `#` that is not part of a `##` pair, collapsing
/// each pair to a single `#`.
fn strip_comment(line: &str) -> String {
	let mut out = String::with_capacity(line.len());
	let mut chars = line.chars().peekable();
	while let Some(c) = chars.next() {
		if c == '#' && chars.next_if_eq(&'#').is_none() {
			break;
		}
		out.push(c);
	}
	out
}

/// Collapses `\\`, `\{` and `\}` to the escaped character.
fn unescape(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut chars = text.chars().peekable();
	while let Some(c) = chars.next() {
		if c == '\\'
			&& let Some(&next) = chars.peek()
			&& matches!(next, '\\' | '{' | '}')
		{
			out.push(next);
			chars.next();
			continue;
		}
		out.push(c);
	}
	out
}

fn qualified_name(categories: &[String], leaf: &str) -> String {
	let mut name = String::new();
	for category in categories {
		name.push_str(category);
		name.push(':');
	}
	name.push_str(leaf);
	name
}

impl Config {
	/// Runs one logical line, then any lines queued for replay by a dynamic
	/// variable update.
	pub(crate) fn process_line(&mut self, line: &str, dynamic: bool) -> Result<(), LineError> {
		tracing::trace!(line, dynamic, "processing line");
		let mut replays = VecDeque::new();
		let result = self.apply_line(line, dynamic, &mut replays);
		if replays.is_empty() {
			return result;
		}
		let replayed = self.replay(replays);
		result.and(replayed)
	}

	fn apply_line(&mut self, line: &str, dynamic: bool, replays: &mut VecDeque<Replay>) -> Result<(), LineError> {
		let line = line.trim();

		if let Some(comment) = line.strip_prefix('#') {
			return self
				.state
				.directives
				.apply(comment, &self.vars)
				.map_err(LineError::from);
		}

		if self.state.directives.skipping() {
			return Ok(());
		}

		let statement = strip_comment(line);
		let statement = statement.trim();
		if statement.is_empty() {
			return Ok(());
		}

		self.apply_statement(statement, dynamic, replays)
	}

	fn apply_statement(
		&mut self,
		statement: &str,
		dynamic: bool,
		replays: &mut VecDeque<Replay>,
	) -> Result<(), LineError> {
		match classify(statement)? {
			Statement::Assignment { lhs, rhs } => self.assign(statement, lhs, rhs, dynamic, replays),
			Statement::Open(category) => {
				self.state.categories.push(category.to_owned());
				Ok(())
			}
			Statement::Close => {
				if self.state.categories.pop().is_none() {
					return Err(GrammarError::StrayCategoryClose.into());
				}
				if self.state.categories.is_empty() {
					self.state.scope.clear();
				}
				Ok(())
			}
			Statement::Block { category, body } => {
				self.state.categories.push(category.to_owned());
				let result = self.apply_statement(body, dynamic, replays);
				self.state.categories.pop();
				if self.state.categories.is_empty() {
					self.state.scope.clear();
				}
				result
			}
		}
	}

	fn assign(
		&mut self,
		statement: &str,
		lhs: &str,
		rhs: &str,
		dynamic: bool,
		replays: &mut VecDeque<Replay>,
	) -> Result<(), LineError> {
		let is_variable = lhs.starts_with('$');
		let mut lhs = lhs.to_owned();
		let mut rhs = rhs.to_owned();
		let mut referenced = Vec::new();
		self.expand(&mut lhs, &mut rhs, !is_variable, &mut referenced)?;

		if is_variable {
			self.record_references(statement, &referenced, dynamic);
			let name = &lhs[1..];
			let variable = self.vars.define(name, rhs);
			if dynamic {
				replays.extend(variable.lines().iter().map(|line| Replay {
					variable: name.to_owned(),
					line: line.clone(),
				}));
			}
			return Ok(());
		}

		let rhs = unescape(&rhs);
		let result = self.assign_value(&lhs, &rhs);
		// Recorded once resolved, so the line keeps the special instance it
		// may just have created.
		self.record_references(statement, &referenced, dynamic);
		result
	}

	fn assign_value(&mut self, lhs: &str, rhs: &str) -> Result<(), LineError> {
		let missing = if self.options.verify_only {
			None
		} else {
			match self.set_value(lhs, rhs)? {
				Target::Applied => return Ok(()),
				Target::Missing(name) => Some(name),
			}
		};

		let mut result = match missing {
			Some(name) => Err(LineError::MissingKey(name)),
			None => Ok(()),
		};
		for handler in self.handlers.matching(&self.state.categories, lhs) {
			result = handler(self, lhs, rhs).map_err(LineError::from);
		}
		result
	}

	/// Remembers `statement` on every variable it referenced, with the
	/// categories and special instance it ran under.
	fn record_references(&mut self, statement: &str, referenced: &[String], dynamic: bool) {
		// Replays must not grow the lists they are replaying from.
		if dynamic || referenced.is_empty() {
			return;
		}
		let line = RecordedLine {
			text: statement.to_owned(),
			categories: self.state.categories.clone(),
			instance: self.state.scope.instance,
		};
		self.vars.record(referenced, &line);
	}

	/// Substitutes variables and evaluates expressions until a pass finds no
	/// variable reference.
	fn expand(
		&mut self,
		lhs: &mut String,
		rhs: &mut String,
		substitute_lhs: bool,
		referenced: &mut Vec<String>,
	) -> Result<(), LineError> {
		for pass in 1..=MAX_EXPANSION_PASSES {
			let matched = self
				.vars
				.substitute(substitute_lhs.then_some(&mut *lhs), rhs, referenced);
			expr::expand_expressions(rhs, &self.vars)?;

			if !matched {
				return Ok(());
			}
			tracing::trace!(pass, lhs = %lhs, rhs = %rhs, "expanded variables");
			if pass == MAX_EXPANSION_PASSES {
				return Err(LineError::ExpansionOverflow);
			}
		}
		Ok(())
	}

	/// Writes `rhs` into the cell named by `lhs` under the open categories.
	fn set_value(&mut self, lhs: &str, rhs: &str) -> Result<Target, LineError> {
		let mut name = qualified_name(&self.state.categories, lhs);
		if let Some(stripped) = self
			.specials
			.select_bracketed(&name, &mut self.state.scope, &mut self.arena)
		{
			name = stripped;
		}

		let handle = match self.values.get(&name) {
			Some(handle) => *handle,
			None => match self
				.specials
				.resolve(&name, rhs, &mut self.state.scope, &mut self.arena)?
			{
				Resolution::Cell(handle) => handle,
				Resolution::Ignored => return Ok(Target::Applied),
				Resolution::Missing => return Ok(Target::Missing(name)),
			},
		};

		match self.arena.get_mut(handle) {
			Some(cell) => cell.assign(rhs).map(|()| Target::Applied),
			None => Ok(Target::Missing(name)),
		}
	}

	/// Re-runs recorded lines, each under the categories and special instance
	/// it originally ran in. Lines replayed here may queue more; a line runs
	/// at most once per variable in one update.
	fn replay(&mut self, mut queue: VecDeque<Replay>) -> Result<(), LineError> {
		let saved_categories = mem::take(&mut self.state.categories);
		let saved_instance = self.state.scope.instance;
		let mut seen = FxHashSet::default();
		let mut replayed = 0;
		let mut outcome = Ok(());

		while let Some(Replay { variable, line }) = queue.pop_front() {
			if !seen.insert((variable.clone(), line.clone())) {
				continue;
			}
			if replayed == MAX_REPLAYS {
				outcome = Err(LineError::ReplayOverflow(variable));
				break;
			}
			replayed += 1;

			tracing::trace!(variable = %variable, line = %line.text, "replaying line");
			self.state.categories.clone_from(&line.categories);
			self.state.scope.instance = line.instance;
			if let Err(error) = self.apply_statement(&line.text, true, &mut queue) {
				tracing::warn!(variable = %variable, line = %line.text, %error, "replayed line failed");
			}
		}

		tracing::debug!(replayed, "replayed lines after variable update");
		self.state.categories = saved_categories;
		self.state.scope.instance = saved_instance;
		outcome
	}
}
