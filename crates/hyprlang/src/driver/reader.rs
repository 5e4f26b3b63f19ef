//! Physical to logical lines.


/// A line after continuation joining, numbered by its first physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogicalLine {
	pub(crate) number: usize,
	pub(crate) text: String,
}

/// The source ended in the middle of a continued line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrailingBackslash;

/// Yields logical lines from `text`.
///
/// A physical line ending in an unescaped backslash continues on the next
/// one: the backslash and any spaces or tabs before it are dropped and the
/// next line is appended verbatim, indentation included.
pub(crate) struct LogicalLines<'a> {
	lines: std::str::Lines<'a>,
	number: usize,
}

impl<'a> LogicalLines<'a> {
	pub(crate) fn new(text: &'a str) -> Self {
		Self {
			lines: text.lines(),
			number: 0,
		}
	}
}

impl Iterator for LogicalLines<'_> {
	type Item = Result<LogicalLine, TrailingBackslash>;

	fn next(&mut self) -> Option<Self::Item> {
		let first = self.lines.next()?;
		self.number += 1;
		let number = self.number;

		let mut text = first.to_owned();
		while let Some(joined) = continued(&text) {
			let keep = joined.len();
			text.truncate(keep);

			let Some(next) = self.lines.next() else {
				return Some(Err(TrailingBackslash));
			};
			self.number += 1;
			text.push_str(next);
		}

		Some(Ok(LogicalLine { number, text }))
	}
}

/// `line` minus its continuation backslash and the blanks before it, if it
/// ends in an odd run of backslashes.
fn continued(line: &str) -> Option<&str> {
	let run = line.bytes().rev().take_while(|&b| b == b'\\').count();
	if run % 2 == 0 {
		return None;
	}
	Some(line[..line.len() - 1].trim_end_matches([' ', '\t']))
}
