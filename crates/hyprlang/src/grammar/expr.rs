//! Inline arithmetic: `{{ a op b }}` with a single binary operator.
//!
//! Operands are variable names (without `$`) or float literals. A `{{`
//! preceded by an odd number of backslashes is escaped and left for the
//! unescape step; a span with no closing `}}` is left as is.

use crate::error::ExpressionError;
use crate::vars::VariableTable;


/// Evaluates every unescaped, terminated `{{ ... }}` span in `text`, left to
/// right, replacing each by its result.
pub(crate) fn expand_expressions(text: &mut String, vars: &VariableTable) -> Result<(), ExpressionError> {
	while let Some(open) = find_unescaped_open(text) {
		let Some(close) = text[open + 2..].find("}}").map(|i| i + open + 2) else {
			break;
		};

		let value = evaluate(&text[open + 2..close], vars)?;
		text.replace_range(open..close + 2, &value.to_string());
	}
	Ok(())
}

/// Byte offset of the first `{{` not escaped by an odd run of backslashes.
fn find_unescaped_open(text: &str) -> Option<usize> {
	let mut from = 0;
	while let Some(found) = text[from..].find("{{") {
		let open = from + found;
		let backslashes = text.as_bytes()[..open].iter().rev().take_while(|&&b| b == b'\\').count();
		if backslashes % 2 == 0 {
			return Some(open);
		}
		from = open + 1;
	}
	None
}

/// Evaluates `a op b`. Tokens past the third are ignored.
pub(crate) fn evaluate(expression: &str, vars: &VariableTable) -> Result<f32, ExpressionError> {
	if expression.is_empty() {
		return Err(ExpressionError::Empty);
	}

	let mut tokens = expression.split_whitespace();
	let left = tokens.next().unwrap_or_default();
	let op = tokens.next().unwrap_or_default();
	let right = tokens.next().unwrap_or_default();

	if !matches!(op, "+" | "-" | "*" | "/") {
		return Err(ExpressionError::InvalidOperator);
	}

	let left = operand(left, 1, vars)?;
	let right = operand(right, 2, vars)?;

	Ok(match op {
		"+" => left + right,
		"-" => left - right,
		"*" => left * right,
		_ => left / right,
	})
}

fn operand(token: &str, index: u8, vars: &VariableTable) -> Result<f32, ExpressionError> {
	match vars.get(token) {
		Some(var) => var
			.value()
			.trim()
			.parse()
			.map_err(|_| ExpressionError::NonNumericVariable { index }),
		None => token.parse().map_err(|_| ExpressionError::NotANumber { index }),
	}
}
