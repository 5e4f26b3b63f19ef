//! The host-facing config object.

use std::path::PathBuf;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::arena::{CellArena, ValueHandle};
use crate::driver::ParseState;
use crate::error::HandlerError;
use crate::handler::{HandlerOptions, HandlerRegistry};
use crate::special::{SpecialCategoryOptions, SpecialRegistry};
use crate::value::{ConfigType, ConfigValue, DefaultValue};
use crate::vars::VariableTable;

/// Parse behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOptions {
	/// Check the source without writing any value. Handlers still run.
	pub verify_only: bool,
	/// Report every problem instead of only the first.
	pub throw_all_errors: bool,
	/// Treat a missing config file as empty.
	pub allow_missing_config: bool,
}

impl ConfigOptions {
	pub fn with_verify_only(mut self, verify_only: bool) -> Self {
		self.verify_only = verify_only;
		self
	}

	pub fn with_throw_all_errors(mut self, throw_all_errors: bool) -> Self {
		self.throw_all_errors = throw_all_errors;
		self
	}

	pub fn with_allow_missing_config(mut self, allow_missing_config: bool) -> Self {
		self.allow_missing_config = allow_missing_config;
		self
	}
}

/// Where [`Config::parse`] reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
	/// A file, read afresh on every parse.
	Path(PathBuf),
	/// In-memory text.
	Stream(String),
}

/// A typed configuration store and its parser.
///
/// Setup happens in two phases. Before [`commence`](Self::commence), plain
/// values are declared with [`add_config_value`](Self::add_config_value).
/// After it, [`parse`](Self::parse) may be called any number of times; each
/// call starts from the declared defaults.
///
/// ```
/// use hyprlang::{Config, ConfigOptions, ConfigSource};
///
/// let mut config = Config::new(
/// 	ConfigSource::Stream("general {\n  gaps = 5\n}\n".into()),
/// 	ConfigOptions::default(),
/// );
/// config.add_config_value("general:gaps", 0i64);
/// config.commence();
/// config.parse().unwrap();
///
/// assert_eq!(config.get::<i64>("general:gaps"), Some(5));
/// ```
pub struct Config {
	pub(crate) options: ConfigOptions,
	pub(crate) source: ConfigSource,
	pub(crate) commenced: bool,
	/// Declared plain values, in declaration order.
	pub(crate) defaults: IndexMap<String, DefaultValue>,
	/// Live cells of the declared plain values, filled by `commence`.
	pub(crate) values: FxHashMap<String, ValueHandle>,
	pub(crate) arena: CellArena,
	pub(crate) specials: SpecialRegistry,
	pub(crate) vars: VariableTable,
	pub(crate) handlers: HandlerRegistry,
	pub(crate) state: ParseState,
}

impl Config {
	/// Creates a config seeded with the process environment as variables.
	pub fn new(source: ConfigSource, options: ConfigOptions) -> Self {
		let environment = std::env::vars_os().map(|(name, value)| {
			(
				name.to_string_lossy().into_owned(),
				value.to_string_lossy().into_owned(),
			)
		});
		Self::with_environment(source, options, environment)
	}

	/// Creates a config whose variable table is seeded from `environment`
	/// instead of the process environment.
	pub fn with_environment(
		source: ConfigSource,
		options: ConfigOptions,
		environment: impl IntoIterator<Item = (String, String)>,
	) -> Self {
		Self {
			options,
			source,
			commenced: false,
			defaults: IndexMap::new(),
			values: FxHashMap::default(),
			arena: CellArena::default(),
			specials: SpecialRegistry::default(),
			vars: VariableTable::new(environment),
			handlers: HandlerRegistry::default(),
			state: ParseState::default(),
		}
	}

	/// Config reading the file at `path`.
	pub fn from_path(path: impl Into<PathBuf>, options: ConfigOptions) -> Self {
		Self::new(ConfigSource::Path(path.into()), options)
	}

	/// Config reading `text`.
	pub fn from_stream(text: impl Into<String>, options: ConfigOptions) -> Self {
		Self::new(ConfigSource::Stream(text.into()), options)
	}

	pub fn options(&self) -> &ConfigOptions {
		&self.options
	}

	pub fn is_commenced(&self) -> bool {
		self.commenced
	}

	/// Declares a plain value under its fully-qualified name
	/// (`category:sub:leaf`).
	///
	/// # Panics
	///
	/// Panics if called after [`commence`](Self::commence).
	pub fn add_config_value(&mut self, name: &str, default: impl Into<DefaultValue>) {
		assert!(!self.commenced, "cannot add config value <{name}> after commence()");
		self.defaults.insert(name.to_owned(), default.into());
	}

	/// Freezes the plain value schema and materializes every declared value.
	///
	/// Calling it again is a no-op.
	pub fn commence(&mut self) {
		if self.commenced {
			return;
		}
		self.commenced = true;

		for (name, default) in &self.defaults {
			let handle = self.arena.insert(ConfigValue::from_default(default));
			self.values.insert(name.clone(), handle);
		}
		tracing::debug!(values = self.values.len(), cells = self.arena.len(), "config commenced");
	}

	/// Registers a keyword handler, see [`crate::handler`] for the matching
	/// rules.
	///
	/// Handlers only see assignments no registered value claims.
	pub fn register_handler(
		&mut self,
		name: &str,
		options: HandlerOptions,
		handler: impl Fn(&mut Config, &str, &str) -> Result<(), HandlerError> + 'static,
	) {
		self.handlers.register(name, options, Rc::new(handler));
	}

	pub fn unregister_handler(&mut self, name: &str) {
		self.handlers.unregister(name);
	}

	/// Registers a special category. May be called at any time; a static
	/// category gets its single instance immediately.
	pub fn add_special_category(&mut self, name: &str, options: SpecialCategoryOptions) {
		tracing::debug!(category = name, ?options, "added special category");
		self.specials.add_category(name, options, &mut self.arena);
	}

	pub fn has_special_category(&self, name: &str) -> bool {
		self.specials.has_category(name)
	}

	/// Removes a special category along with all of its instances.
	pub fn remove_special_category(&mut self, name: &str) {
		self.specials.remove_category(name, &mut self.arena);
	}

	/// Declares `leaf` on a special category. Leaves may be nested
	/// (`nested:leaf`).
	///
	/// # Panics
	///
	/// Panics if `category` is not a registered special category.
	pub fn add_special_config_value(&mut self, category: &str, leaf: &str, default: impl Into<DefaultValue>) {
		self.specials.add_value(category, leaf, default.into(), &mut self.arena);
	}

	/// # Panics
	///
	/// Panics if `category` is not a registered special category.
	pub fn remove_special_config_value(&mut self, category: &str, leaf: &str) {
		self.specials.remove_value(category, leaf, &mut self.arena);
	}

	/// Stable handle to a plain value. Available once
	/// [`commence`](Self::commence) has run.
	pub fn value_handle(&self, name: &str) -> Option<ValueHandle> {
		self.values.get(name).copied()
	}

	/// Handle to `leaf` in the instance of `category` keyed by `key`.
	///
	/// Static categories ignore `key`. Handles into keyed and anonymous
	/// instances go stale on the next [`parse`](Self::parse).
	pub fn special_value_handle(&self, category: &str, leaf: &str, key: Option<&str>) -> Option<ValueHandle> {
		self.specials.value_handle(category, leaf, key, &self.arena)
	}

	/// The cell behind `handle`, or `None` if it no longer exists.
	pub fn value(&self, handle: ValueHandle) -> Option<&ConfigValue> {
		self.arena.get(handle)
	}

	pub fn config_value(&self, name: &str) -> Option<&ConfigValue> {
		self.value(self.value_handle(name)?)
	}

	pub fn special_config_value(&self, category: &str, leaf: &str, key: Option<&str>) -> Option<&ConfigValue> {
		self.value(self.special_value_handle(category, leaf, key)?)
	}

	/// Reads a plain value as `T`; `None` if it is missing or of another kind.
	pub fn get<T: ConfigType>(&self, name: &str) -> Option<T> {
		self.config_value(name)?.get()
	}

	/// Reads a special category leaf as `T`.
	pub fn get_special<T: ConfigType>(&self, category: &str, leaf: &str, key: Option<&str>) -> Option<T> {
		self.special_config_value(category, leaf, key)?.get()
	}

	/// Keys of the live instances of `category`, in creation order.
	pub fn list_keys_for_special_category(&self, category: &str) -> Vec<String> {
		self.specials.keys(category, &self.arena)
	}

	pub fn special_category_exists_for_key(&self, category: &str, key: &str) -> bool {
		self.specials.exists_for_key(category, key, &self.arena)
	}
}
