//! Error types for configuration parsing.
//!
//! Errors come in two layers. A [`LineError`] describes why a single logical
//! line was rejected; it never aborts the rest of the parse. The driver wraps
//! line errors (and source-level problems such as an unclosed category) into
//! positioned [`Diagnostic`]s and hands the accumulated list back as a
//! [`ParseError`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::value::ValueKind;

/// Why a single logical line could not be applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
	/// The fully-qualified key matches no registered value, special
	/// category leaf, or handler.
	#[error("config option <{0}> does not exist.")]
	MissingKey(String),

	/// A keyed special category was opened by a leaf other than its key.
	#[error("special category's first value must be the key. Key for <{category}> is <{key}>")]
	KeyNotFirst {
		/// Name of the special category.
		category: String,
		/// Name of the category's key leaf.
		key: String,
	},

	/// The right-hand side could not be coerced into the cell's kind.
	#[error("{message}")]
	Coercion {
		/// Declared kind of the target cell.
		kind: ValueKind,
		/// Human readable reason, naming the offending text.
		message: String,
	},

	/// The line does not follow the grammar.
	#[error(transparent)]
	Grammar(#[from] GrammarError),

	/// Variable substitution did not settle within the pass limit.
	#[error("Expanding variables exceeded max iteration limit")]
	ExpansionOverflow,

	/// An inline `{{ a op b }}` expression could not be evaluated.
	#[error(transparent)]
	Expression(#[from] ExpressionError),

	/// A registered handler or custom value parser rejected the value.
	#[error(transparent)]
	Handler(#[from] HandlerError),

	/// A dynamic variable update queued more replays than allowed.
	#[error("Replaying lines for variable ${0} exceeded max replay limit")]
	ReplayOverflow(String),
}

impl LineError {
	pub(crate) fn coercion(kind: ValueKind, message: impl Into<String>) -> Self {
		LineError::Coercion {
			kind,
			message: message.into(),
		}
	}
}

/// Structural problems with a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GrammarError {
	/// A `}` with no open category.
	#[error("Stray category close")]
	StrayCategoryClose,
	/// Neither an assignment, a category open, nor a category close.
	#[error("Invalid config line")]
	InvalidLine,
	/// Text follows the `{` of a category open.
	#[error("Invalid category open, garbage after {{")]
	GarbageAfterBrace,
	/// Nothing before the `=`.
	#[error("Empty lhs.")]
	EmptyLhs,
	/// `#hyprlang endif` without a matching `if`.
	#[error("stray endif")]
	StrayEndif,
}

/// Failures of the inline arithmetic evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
	#[error("Expression is empty")]
	Empty,
	#[error("Invalid expression type: supported +, -, *, /")]
	InvalidOperator,
	/// Operand `index` (1 or 2) names a variable whose text is not numeric.
	#[error("Failed to parse expression: value {index} holds a variable that does not look like a number")]
	NonNumericVariable { index: u8 },
	/// Operand `index` (1 or 2) is neither a variable nor a number.
	#[error("Failed to parse expression: value {index} does not look like a number or the variable doesn't exist")]
	NotANumber { index: u8 },
}

/// Error returned by host callbacks.
///
/// The message is surfaced verbatim as the line's error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
	message: String,
}

impl HandlerError {
	/// Creates a handler error with the given message.
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}

	/// The message reported for the offending line.
	pub fn message(&self) -> &str {
		&self.message
	}
}

impl From<String> for HandlerError {
	fn from(message: String) -> Self {
		Self { message }
	}
}

impl From<&str> for HandlerError {
	fn from(message: &str) -> Self {
		Self::new(message)
	}
}

impl From<ParseError> for HandlerError {
	fn from(error: ParseError) -> Self {
		Self::new(error.to_string())
	}
}

/// Where a diagnostic was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
	/// A file on disk.
	File(PathBuf),
	/// In-memory text handed to the config.
	Stream,
}

/// A positioned error collected during a parse.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
	/// A line was rejected.
	#[error("{}", LineDisplay(.origin, .line, .error))]
	Line {
		origin: Origin,
		/// 1-based number of the first physical line of the logical line.
		line: usize,
		error: LineError,
	},

	/// The source ended with categories still open.
	#[error("{}Unclosed category at EOF", Prefix(.0))]
	UnclosedCategory(Origin),

	/// The source ended while a line was still being continued.
	#[error("{}Last line ends with backslash", Prefix(.0))]
	TrailingBackslash(Origin),

	/// The configured source file does not exist.
	#[error("Config file is missing")]
	MissingSource(PathBuf),

	/// A file could not be read.
	#[error("File failed to open: {}: {message}", .path.display())]
	SourceUnreadable {
		path: PathBuf,
		message: String,
	},
}

impl Diagnostic {
	/// The underlying line error, if this diagnostic refers to a line.
	pub fn line_error(&self) -> Option<&LineError> {
		match self {
			Diagnostic::Line { error, .. } => Some(error),
			_ => None,
		}
	}
}

struct Prefix<'a>(&'a Origin);

impl fmt::Display for Prefix<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0 {
			Origin::File(path) => write!(f, "Config error in file {}: ", path.display()),
			Origin::Stream => f.write_str("Config error: "),
		}
	}
}

struct LineDisplay<'a>(&'a Origin, &'a usize, &'a LineError);

impl fmt::Display for LineDisplay<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0 {
			Origin::File(path) => write!(
				f,
				"Config error in file {} at line {}: {}",
				path.display(),
				self.1,
				self.2
			),
			Origin::Stream => write!(f, "Config error at line {}: {}", self.1, self.2),
		}
	}
}

/// The accumulated outcome of a failed parse.
///
/// Holds only the first diagnostic unless
/// [`ConfigOptions::throw_all_errors`](crate::ConfigOptions::throw_all_errors)
/// is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
	diagnostics: Vec<Diagnostic>,
}

impl ParseError {
	pub(crate) fn new(diagnostics: Vec<Diagnostic>) -> Self {
		debug_assert!(!diagnostics.is_empty());
		Self { diagnostics }
	}

	/// All collected diagnostics, in source order.
	pub fn diagnostics(&self) -> &[Diagnostic] {
		&self.diagnostics
	}

	/// Iterates the line errors among the diagnostics.
	pub fn line_errors(&self) -> impl Iterator<Item = &LineError> {
		self.diagnostics.iter().filter_map(Diagnostic::line_error)
	}
}

impl fmt::Display for ParseError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, diagnostic) in self.diagnostics.iter().enumerate() {
			if i > 0 {
				f.write_str("\n")?;
			}
			write!(f, "{diagnostic}")?;
		}
		Ok(())
	}
}

impl std::error::Error for ParseError {}

/// Result type for whole-source parse operations.
pub type Result<T> = std::result::Result<T, ParseError>;
