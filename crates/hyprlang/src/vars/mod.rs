//! Variable table: `$name` bindings and where they were used.

use std::cmp::Reverse;

use crate::special::InstanceId;


/// A line that referenced a variable, with the context it ran under, so it
/// can be replayed when the variable changes at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RecordedLine {
	pub(crate) text: String,
	pub(crate) categories: Vec<String>,
	pub(crate) instance: Option<InstanceId>,
}

#[derive(Debug, Clone)]
pub(crate) struct Variable {
	name: String,
	value: String,
	lines: Vec<RecordedLine>,
}

impl Variable {
	fn new(name: String, value: String) -> Self {
		Self {
			name,
			value,
			lines: Vec::new(),
		}
	}

	pub(crate) fn value(&self) -> &str {
		&self.value
	}

	/// Non-empty text.
	pub(crate) fn is_truthy(&self) -> bool {
		!self.value.is_empty()
	}

	pub(crate) fn lines(&self) -> &[RecordedLine] {
		&self.lines
	}
}

/// Bindings, kept longest name first so that `$FOOBAR` is substituted before
/// `$FOO` gets a chance to eat its prefix.
#[derive(Debug, Clone, Default)]
pub(crate) struct VariableTable {
	environment: Vec<Variable>,
	live: Vec<Variable>,
}

impl VariableTable {
	/// Seeds the table from `(name, value)` pairs, typically the process
	/// environment. Nameless entries are dropped.
	pub(crate) fn new(environment: impl IntoIterator<Item = (String, String)>) -> Self {
		let mut environment: Vec<Variable> = environment
			.into_iter()
			.filter(|(name, _)| !name.is_empty())
			.map(|(name, value)| Variable::new(name, value))
			.collect();
		sort_longest_first(&mut environment);

		Self {
			live: environment.clone(),
			environment,
		}
	}

	/// Drops user definitions and recorded lines.
	pub(crate) fn reset(&mut self) {
		self.live.clone_from(&self.environment);
	}

	pub(crate) fn get(&self, name: &str) -> Option<&Variable> {
		self.live.iter().find(|v| v.name == name)
	}

	/// Binds `name` to `value`, creating the variable if needed.
	pub(crate) fn define(&mut self, name: &str, value: String) -> &Variable {
		let index = match self.live.iter().position(|v| v.name == name) {
			Some(index) => {
				self.live[index].value = value;
				index
			}
			None => {
				self.live.push(Variable::new(name.to_owned(), value));
				sort_longest_first(&mut self.live);
				// Stable sort; a fresh name lands after every longer one.
				self.live
					.iter()
					.position(|v| v.name == name)
					.unwrap_or(self.live.len() - 1)
			}
		};
		&self.live[index]
	}

	/// Runs one substitution pass: every `$name` in `rhs` (and in `lhs` when
	/// given) is replaced by the variable's text, longest names first.
	///
	/// Names of the variables that matched are added to `referenced`, once.
	/// Returns whether anything matched.
	pub(crate) fn substitute(
		&mut self,
		mut lhs: Option<&mut String>,
		rhs: &mut String,
		referenced: &mut Vec<String>,
	) -> bool {
		let mut any = false;

		for var in self.live.iter().filter(|v| !v.name.is_empty()) {
			let pattern = format!("${}", var.name);
			let mut matched = false;

			if let Some(lhs) = lhs.as_deref_mut()
				&& lhs.contains(&pattern)
			{
				*lhs = lhs.replace(&pattern, &var.value);
				matched = true;
			}

			if rhs.contains(&pattern) {
				*rhs = rhs.replace(&pattern, &var.value);
				matched = true;
			}

			if !matched {
				continue;
			}

			any = true;
			if !referenced.contains(&var.name) {
				referenced.push(var.name.clone());
			}
		}

		any
	}

	/// Appends `line` to the referencing lines of each variable in `names`,
	/// skipping variables that already hold it.
	pub(crate) fn record(&mut self, names: &[String], line: &RecordedLine) {
		for var in self.live.iter_mut().filter(|v| names.contains(&v.name)) {
			if !var.lines.contains(line) {
				var.lines.push(line.clone());
			}
		}
	}
}

fn sort_longest_first(vars: &mut [Variable]) {
	vars.sort_by_key(|v| Reverse(v.name.len()));
}
