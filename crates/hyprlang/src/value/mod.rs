//! Value cells and their registered defaults.
//!
//! A [`ConfigValue`] is the live cell a host reads at runtime. Its kind is
//! fixed by the [`DefaultValue`] it was materialized from; every later write
//! coerces text into that kind and overwrites the payload in place.
//!
//! Five kinds exist:
//!
//! | Kind     | Payload        | Accepted text                                   |
//! |----------|----------------|-------------------------------------------------|
//! | `Int`    | `i64`          | decimal, `0x` hex, `rgb()`/`rgba()`, booleans   |
//! | `Float`  | `f32`          | any float literal                               |
//! | `String` | `String`       | anything, verbatim                              |
//! | `Vec2`   | [`Vec2`]       | two floats separated by one space               |
//! | `Custom` | [`CustomValue`]| whatever the host's parser accepts              |

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::{HandlerError, LineError};

mod coerce;

pub use coerce::{parse_float, parse_int, parse_vec2};

/// The declared type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
	Int,
	Float,
	String,
	Vec2,
	Custom,
}

impl fmt::Display for ValueKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			ValueKind::Int => "int",
			ValueKind::Float => "float",
			ValueKind::String => "string",
			ValueKind::Vec2 => "vec2",
			ValueKind::Custom => "custom",
		})
	}
}

/// A pair of floats.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
	pub x: f32,
	pub y: f32,
}

impl Vec2 {
	pub const fn new(x: f32, y: f32) -> Self {
		Self { x, y }
	}
}

impl fmt::Display for Vec2 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}, {}]", self.x, self.y)
	}
}

/// Opaque host data owned by a custom cell. Starts out as `None`.
pub type CustomData = Option<Box<dyn Any>>;

/// Parses text into a custom cell's data slot.
pub type CustomParseFn = dyn Fn(&str, &mut CustomData) -> Result<(), HandlerError>;

/// Releases a custom cell's data slot.
pub type CustomDestroyFn = dyn Fn(&mut CustomData);

/// Registration-time description of a custom value type.
///
/// Cloning is cheap; clones share the same callbacks.
#[derive(Clone)]
pub struct CustomType {
	parse: Rc<CustomParseFn>,
	destroy: Option<Rc<CustomDestroyFn>>,
	default_text: String,
}

impl CustomType {
	/// Creates a custom type whose cells are initialized by running `parse`
	/// on `default_text`.
	pub fn new(
		parse: impl Fn(&str, &mut CustomData) -> Result<(), HandlerError> + 'static,
		default_text: impl Into<String>,
	) -> Self {
		Self {
			parse: Rc::new(parse),
			destroy: None,
			default_text: default_text.into(),
		}
	}

	/// Sets the callback run when a cell's data is released.
	pub fn with_destructor(mut self, destroy: impl Fn(&mut CustomData) + 'static) -> Self {
		self.destroy = Some(Rc::new(destroy));
		self
	}

	pub fn default_text(&self) -> &str {
		&self.default_text
	}

	fn instantiate(&self) -> CustomValue {
		CustomValue {
			parse: Rc::clone(&self.parse),
			destroy: self.destroy.clone(),
			default_text: self.default_text.clone(),
			last_text: String::new(),
			data: None,
		}
	}

	fn is_same_type(&self, value: &CustomValue) -> bool {
		Rc::ptr_eq(&self.parse, &value.parse)
	}
}

impl fmt::Debug for CustomType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CustomType")
			.field("default_text", &self.default_text)
			.field("has_destructor", &self.destroy.is_some())
			.finish()
	}
}

/// Live state of a custom cell.
pub struct CustomValue {
	parse: Rc<CustomParseFn>,
	destroy: Option<Rc<CustomDestroyFn>>,
	default_text: String,
	last_text: String,
	data: CustomData,
}

impl CustomValue {
	/// The host data, if the parser has produced any.
	pub fn data(&self) -> Option<&dyn Any> {
		self.data.as_deref()
	}

	/// The host data downcast to `T`.
	pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
		self.data.as_ref()?.downcast_ref()
	}

	/// The text most recently handed to the parser.
	pub fn last_text(&self) -> &str {
		&self.last_text
	}

	pub fn default_text(&self) -> &str {
		&self.default_text
	}

	fn apply(&mut self, text: &str) -> Result<(), HandlerError> {
		let result = (self.parse)(text, &mut self.data);
		self.last_text = text.to_owned();
		result
	}
}

impl Drop for CustomValue {
	fn drop(&mut self) {
		if let Some(destroy) = self.destroy.take() {
			destroy(&mut self.data);
		}
	}
}

impl fmt::Debug for CustomValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CustomValue")
			.field("default_text", &self.default_text)
			.field("last_text", &self.last_text)
			.field("has_data", &self.data.is_some())
			.finish()
	}
}

/// A registered default. Fixes the kind of every cell created from it.
#[derive(Debug, Clone)]
pub enum DefaultValue {
	Int(i64),
	Float(f32),
	String(String),
	Vec2(Vec2),
	Custom(CustomType),
}

impl DefaultValue {
	pub fn kind(&self) -> ValueKind {
		match self {
			DefaultValue::Int(_) => ValueKind::Int,
			DefaultValue::Float(_) => ValueKind::Float,
			DefaultValue::String(_) => ValueKind::String,
			DefaultValue::Vec2(_) => ValueKind::Vec2,
			DefaultValue::Custom(_) => ValueKind::Custom,
		}
	}
}

impl From<i64> for DefaultValue {
	fn from(v: i64) -> Self {
		DefaultValue::Int(v)
	}
}

impl From<f32> for DefaultValue {
	fn from(v: f32) -> Self {
		DefaultValue::Float(v)
	}
}

impl From<&str> for DefaultValue {
	fn from(v: &str) -> Self {
		DefaultValue::String(v.to_owned())
	}
}

impl From<String> for DefaultValue {
	fn from(v: String) -> Self {
		DefaultValue::String(v)
	}
}

impl From<Vec2> for DefaultValue {
	fn from(v: Vec2) -> Self {
		DefaultValue::Vec2(v)
	}
}

impl From<CustomType> for DefaultValue {
	fn from(v: CustomType) -> Self {
		DefaultValue::Custom(v)
	}
}

/// Copies the current contents of a live cell into a new default.
///
/// Custom cells carry over their callbacks with the last parsed text as the
/// new default text.
impl From<&ConfigValue> for DefaultValue {
	fn from(cell: &ConfigValue) -> Self {
		match &cell.value {
			Value::Int(v) => DefaultValue::Int(*v),
			Value::Float(v) => DefaultValue::Float(*v),
			Value::String(v) => DefaultValue::String(v.clone()),
			Value::Vec2(v) => DefaultValue::Vec2(*v),
			Value::Custom(custom) => DefaultValue::Custom(CustomType {
				parse: Rc::clone(&custom.parse),
				destroy: custom.destroy.clone(),
				default_text: custom.last_text.clone(),
			}),
		}
	}
}

/// Payload of a live cell.
#[derive(Debug)]
pub enum Value {
	Int(i64),
	Float(f32),
	String(String),
	Vec2(Vec2),
	Custom(CustomValue),
}

impl Value {
	pub fn kind(&self) -> ValueKind {
		match self {
			Value::Int(_) => ValueKind::Int,
			Value::Float(_) => ValueKind::Float,
			Value::String(_) => ValueKind::String,
			Value::Vec2(_) => ValueKind::Vec2,
			Value::Custom(_) => ValueKind::Custom,
		}
	}
}

/// A live, typed configuration cell.
#[derive(Debug)]
pub struct ConfigValue {
	value: Value,
	set_by_user: bool,
}

impl ConfigValue {
	/// Materializes a cell holding `default`.
	pub(crate) fn from_default(default: &DefaultValue) -> Self {
		let value = match default {
			DefaultValue::Int(v) => Value::Int(*v),
			DefaultValue::Float(v) => Value::Float(*v),
			DefaultValue::String(v) => Value::String(v.clone()),
			DefaultValue::Vec2(v) => Value::Vec2(*v),
			DefaultValue::Custom(ty) => {
				let mut custom = ty.instantiate();
				run_default_parser(&mut custom);
				Value::Custom(custom)
			}
		};
		Self {
			value,
			set_by_user: false,
		}
	}

	/// Re-initializes the payload from `default` and clears the user flag.
	///
	/// # Panics
	///
	/// Panics if `default` is of a different kind than this cell.
	pub(crate) fn reset_to(&mut self, default: &DefaultValue) {
		let foreign_custom = matches!(
			(&self.value, default),
			(Value::Custom(current), DefaultValue::Custom(ty)) if !ty.is_same_type(current)
		);
		if foreign_custom {
			// The old instance and its data are released by drop.
			self.value = ConfigValue::from_default(default).value;
			self.set_by_user = false;
			return;
		}

		match (&mut self.value, default) {
			(Value::Int(v), DefaultValue::Int(d)) => *v = *d,
			(Value::Float(v), DefaultValue::Float(d)) => *v = *d,
			(Value::String(v), DefaultValue::String(d)) => d.clone_into(v),
			(Value::Vec2(v), DefaultValue::Vec2(d)) => *v = *d,
			(Value::Custom(v), DefaultValue::Custom(ty)) => {
				ty.default_text.clone_into(&mut v.default_text);
				run_default_parser(v);
			}
			(value, default) => panic!(
				"cannot reset a {} value to a {} default",
				value.kind(),
				default.kind()
			),
		}
		self.set_by_user = false;
	}

	/// Coerces `text` into this cell's kind and stores it, marking the cell as
	/// set by the user. On failure the payload is left untouched.
	pub(crate) fn assign(&mut self, text: &str) -> Result<(), LineError> {
		match &mut self.value {
			Value::Int(v) => {
				*v = parse_int(text).map_err(|e| LineError::coercion(ValueKind::Int, e))?;
			}
			Value::Float(v) => {
				*v = parse_float(text).map_err(|e| LineError::coercion(ValueKind::Float, e))?;
			}
			Value::Vec2(v) => {
				*v = parse_vec2(text).map_err(|e| LineError::coercion(ValueKind::Vec2, e))?;
			}
			Value::String(v) => text.clone_into(v),
			Value::Custom(custom) => custom.apply(text)?,
		}
		self.set_by_user = true;
		Ok(())
	}

	/// Overwrites a string cell without touching the user flag.
	///
	/// # Panics
	///
	/// Panics if this is not a string cell.
	pub(crate) fn overwrite_string(&mut self, text: &str) {
		match &mut self.value {
			Value::String(v) => text.clone_into(v),
			other => panic!("cannot store text in a {} value", other.kind()),
		}
	}

	pub fn kind(&self) -> ValueKind {
		self.value.kind()
	}

	pub fn value(&self) -> &Value {
		&self.value
	}

	/// Whether the current payload came from a config line rather than the
	/// registered default.
	pub fn set_by_user(&self) -> bool {
		self.set_by_user
	}

	pub fn as_int(&self) -> Option<i64> {
		match self.value {
			Value::Int(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_float(&self) -> Option<f32> {
		match self.value {
			Value::Float(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match &self.value {
			Value::String(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_vec2(&self) -> Option<Vec2> {
		match self.value {
			Value::Vec2(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_custom(&self) -> Option<&CustomValue> {
		match &self.value {
			Value::Custom(v) => Some(v),
			_ => None,
		}
	}

	/// Reads the cell as `T`, if the kinds agree.
	pub fn get<T: ConfigType>(&self) -> Option<T> {
		let kind = self.value.kind();
		if kind != T::KIND {
			tracing::trace!(expected = %T::KIND, found = %kind, "typed read of a mismatched cell");
			return None;
		}
		T::from_value(&self.value)
	}
}

fn run_default_parser(custom: &mut CustomValue) {
	let text = custom.default_text.clone();
	if let Err(error) = custom.apply(&text) {
		tracing::warn!(default = %text, %error, "custom value rejected its own default");
	}
}

/// Plain Rust types that can be read out of a cell.
pub trait ConfigType: Sized {
	/// The kind a cell must have to yield `Self`.
	const KIND: ValueKind;

	fn from_value(value: &Value) -> Option<Self>;
}

impl ConfigType for i64 {
	const KIND: ValueKind = ValueKind::Int;

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Int(v) => Some(*v),
			_ => None,
		}
	}
}

impl ConfigType for f32 {
	const KIND: ValueKind = ValueKind::Float;

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Float(v) => Some(*v),
			_ => None,
		}
	}
}

impl ConfigType for String {
	const KIND: ValueKind = ValueKind::String;

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::String(v) => Some(v.clone()),
			_ => None,
		}
	}
}

impl ConfigType for Vec2 {
	const KIND: ValueKind = ValueKind::Vec2;

	fn from_value(value: &Value) -> Option<Self> {
		match value {
			Value::Vec2(v) => Some(*v),
			_ => None,
		}
	}
}
