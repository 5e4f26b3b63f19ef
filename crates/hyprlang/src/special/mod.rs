//! Special categories: repeatable, optionally keyed sub-records.
//!
//! A [`Descriptor`] is the template registered by the host. Live
//! [`Instance`]s are stamped out from it:
//!
//! - static descriptors (no key) own exactly one instance, created with the
//!   descriptor and kept across parses;
//! - keyed descriptors get one instance per key observed while parsing, either
//!   through `name[key]:leaf = ...` or a block whose first assignment is the
//!   key leaf;
//! - anonymous descriptors get one instance per block, numbered from a
//!   counter shared by every instance.
//!
//! Keyed and anonymous instances are discarded at the start of every parse.

use std::cmp::Reverse;

use indexmap::IndexMap;

use crate::arena::{CellArena, ValueHandle};
use crate::error::LineError;
use crate::value::{ConfigValue, DefaultValue};


/// Key leaf used by anonymous descriptors. Never written by users.
pub(crate) const ANONYMOUS_KEY: &str = "__hyprlang_internal_anonymous_key";

/// How a special category is instantiated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialCategoryOptions {
	/// Leaf holding the instance key. `None` makes the category static,
	/// unless it is anonymous.
	pub key: Option<String>,
	/// Silently accept assignments to leaves the category does not declare.
	pub ignore_missing: bool,
	/// One instance per block, keyed by an automatically assigned number.
	/// Takes precedence over `key`.
	pub anonymous_key_based: bool,
}

impl SpecialCategoryOptions {
	/// A single, always present instance.
	pub fn generic() -> Self {
		Self::default()
	}

	/// One instance per distinct value of the `key` leaf.
	pub fn keyed(key: impl Into<String>) -> Self {
		Self {
			key: Some(key.into()),
			..Self::default()
		}
	}

	/// One instance per occurrence.
	pub fn anonymous() -> Self {
		Self {
			anonymous_key_based: true,
			..Self::default()
		}
	}

	pub fn with_ignore_missing(mut self, ignore_missing: bool) -> Self {
		self.ignore_missing = ignore_missing;
		self
	}
}

pub(crate) struct Descriptor {
	name: String,
	key: Option<String>,
	ignore_missing: bool,
	anonymous: bool,
	defaults: IndexMap<String, DefaultValue>,
}

impl Descriptor {
	fn new(name: &str, options: SpecialCategoryOptions) -> Self {
		let key = if options.anonymous_key_based {
			Some(ANONYMOUS_KEY.to_owned())
		} else {
			options.key
		};

		let mut defaults = IndexMap::new();
		if let Some(key) = &key {
			defaults.insert(key.clone(), DefaultValue::String(String::new()));
		}

		Self {
			name: name.to_owned(),
			key,
			ignore_missing: options.ignore_missing,
			anonymous: options.anonymous_key_based,
			defaults,
		}
	}

	fn is_static(&self) -> bool {
		self.key.is_none()
	}
}

/// Identifies a live instance. Never reused, so an id recorded before a
/// parse simply stops resolving once its instance is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct InstanceId(u64);

pub(crate) struct Instance {
	id: InstanceId,
	category: String,
	key_leaf: Option<String>,
	anonymous_id: usize,
	values: IndexMap<String, ValueHandle>,
}

impl Instance {
	fn is_static(&self) -> bool {
		self.key_leaf.is_none()
	}

	/// Current text of the key leaf; `None` for static instances.
	fn key<'a>(&self, arena: &'a CellArena) -> Option<&'a str> {
		let handle = self.values.get(self.key_leaf.as_deref()?)?;
		arena.get(*handle)?.as_str()
	}

	/// Whether lookups with `key` select this instance. Static instances
	/// match any key.
	fn selected_by(&self, key: &str, arena: &CellArena) -> bool {
		self.is_static() || self.key(arena) == Some(key)
	}
}

/// Which special instance subsequent lines write into.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpecialScope {
	/// Key of the instance most recently selected or created.
	pub(crate) key: String,
	pub(crate) instance: Option<InstanceId>,
}

impl SpecialScope {
	pub(crate) fn clear(&mut self) {
		self.key.clear();
		self.instance = None;
	}
}

/// Outcome of resolving a fully-qualified name against special categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
	Cell(ValueHandle),
	/// The category ignores unknown leaves.
	Ignored,
	Missing,
}

/// Strips `category:` off the front of `name`.
fn leaf_under<'a>(category: &str, name: &'a str) -> Option<&'a str> {
	name.strip_prefix(category)?.strip_prefix(':')
}

/// Descriptors and live instances.
#[derive(Default)]
pub(crate) struct SpecialRegistry {
	/// Longest name first, so `a:b` is tried before `a`.
	descriptors: Vec<Descriptor>,
	/// Creation order.
	instances: Vec<Instance>,
	next_id: u64,
}

impl SpecialRegistry {
	pub(crate) fn add_category(&mut self, name: &str, options: SpecialCategoryOptions, arena: &mut CellArena) {
		if self.descriptor(name).is_some() {
			tracing::warn!(category = name, "special category registered twice, replacing");
			self.remove_category(name, arena);
		}

		let descriptor = Descriptor::new(name, options);
		if descriptor.is_static() {
			let id = self.next_instance_id();
			self.instances.push(Instance {
				id,
				category: name.to_owned(),
				key_leaf: None,
				anonymous_id: 0,
				values: IndexMap::new(),
			});
		}

		self.descriptors.push(descriptor);
		self.descriptors.sort_by_key(|d| Reverse(d.name.len()));
	}

	pub(crate) fn remove_category(&mut self, name: &str, arena: &mut CellArena) {
		self.descriptors.retain(|d| d.name != name);
		self.instances.retain(|instance| {
			if instance.category != name {
				return true;
			}
			instance.values.values().for_each(|h| arena.remove(*h));
			false
		});
	}

	/// Declares `leaf` on `category`, materializing it in the static
	/// instance if there is one.
	///
	/// # Panics
	///
	/// Panics if `category` was never registered.
	pub(crate) fn add_value(&mut self, category: &str, leaf: &str, default: DefaultValue, arena: &mut CellArena) {
		let Some(descriptor) = self.descriptors.iter_mut().find(|d| d.name == category) else {
			panic!("no special category named <{category}>");
		};

		if let Some(instance) = self.instances.iter_mut().find(|i| i.category == category && i.is_static()) {
			let cell = ConfigValue::from_default(&default);
			if let Some(old) = instance.values.insert(leaf.to_owned(), arena.insert(cell)) {
				arena.remove(old);
			}
		}

		descriptor.defaults.insert(leaf.to_owned(), default);
	}

	/// Forgets `leaf` on `category` and drops its cells from live instances.
	///
	/// # Panics
	///
	/// Panics if `category` was never registered.
	pub(crate) fn remove_value(&mut self, category: &str, leaf: &str, arena: &mut CellArena) {
		let Some(descriptor) = self.descriptors.iter_mut().find(|d| d.name == category) else {
			panic!("no special category named <{category}>");
		};
		descriptor.defaults.shift_remove(leaf);

		for instance in self.instances.iter_mut().filter(|i| i.category == category) {
			if let Some(handle) = instance.values.shift_remove(leaf) {
				arena.remove(handle);
			}
		}
	}

	/// Drops every keyed and anonymous instance and resets static ones to
	/// their defaults.
	pub(crate) fn reset(&mut self, arena: &mut CellArena) {
		self.instances.retain(|instance| {
			if instance.is_static() {
				return true;
			}
			instance.values.values().for_each(|h| arena.remove(*h));
			false
		});

		for instance in &self.instances {
			let Some(descriptor) = self.descriptors.iter().find(|d| d.name == instance.category) else {
				continue;
			};
			for (leaf, default) in &descriptor.defaults {
				if let Some(cell) = instance.values.get(leaf).and_then(|h| arena.get_mut(*h)) {
					cell.reset_to(default);
				}
			}
		}
	}

	/// Handles a `category[key]` segment in `name`.
	///
	/// Records `key` as the active special key and creates the keyed instance
	/// if it does not exist yet. Returns `name` with the bracketed part
	/// removed, or `None` if there is no well-formed bracket pair.
	pub(crate) fn select_bracketed(
		&mut self,
		name: &str,
		scope: &mut SpecialScope,
		arena: &mut CellArena,
	) -> Option<String> {
		let open = name.find('[')?;
		let close = name.rfind(']')?;
		if open >= close {
			return None;
		}

		let key = &name[open + 1..close];
		let stripped = format!("{}{}", &name[..open], &name[close + 1..]);

		key.clone_into(&mut scope.key);
		// An instance selected by an earlier line may carry another key.
		scope.instance = None;

		let Some(index) = self
			.descriptors
			.iter()
			.position(|d| !d.is_static() && leaf_under(&d.name, &stripped).is_some())
		else {
			return Some(stripped);
		};

		let category = &self.descriptors[index].name;
		let exists = self
			.instances
			.iter()
			.any(|i| &i.category == category && !i.is_static() && i.key(arena) == Some(key));

		if !exists {
			let slot = self.instantiate(index, arena);
			self.write_key(slot, key, arena);
			tracing::debug!(category = %self.instances[slot].category, key, "created special category instance");
		}

		Some(stripped)
	}

	/// Resolves `name` (already fully qualified, brackets removed) against
	/// live instances and, failing that, creates an instance on demand.
	///
	/// `rhs` becomes the active key when a keyed instance is opened by its
	/// key leaf.
	pub(crate) fn resolve(
		&mut self,
		name: &str,
		rhs: &str,
		scope: &mut SpecialScope,
		arena: &mut CellArena,
	) -> Result<Resolution, LineError> {
		if let Some(instance) = scope.instance.and_then(|id| self.instances.iter().find(|i| i.id == id))
			&& let Some(handle) = leaf_under(&instance.category, name).and_then(|leaf| instance.values.get(leaf))
		{
			return Ok(Resolution::Cell(*handle));
		}

		for slot in self.lookup_order() {
			let instance = &self.instances[slot];
			let Some(leaf) = leaf_under(&instance.category, name) else {
				continue;
			};
			if !instance.selected_by(&scope.key, arena) {
				continue;
			}

			scope.instance = Some(instance.id);
			if let Some(handle) = instance.values.get(leaf) {
				return Ok(Resolution::Cell(*handle));
			}
			if self.descriptor(&instance.category).is_some_and(|d| d.ignore_missing) {
				return Ok(Resolution::Ignored);
			}
			break;
		}

		self.instantiate_on_demand(name, rhs, scope, arena)
	}

	fn instantiate_on_demand(
		&mut self,
		name: &str,
		rhs: &str,
		scope: &mut SpecialScope,
		arena: &mut CellArena,
	) -> Result<Resolution, LineError> {
		let mut target = None;
		for (index, descriptor) in self.descriptors.iter().enumerate() {
			let Some(key_leaf) = descriptor.key.as_deref() else {
				continue;
			};
			let Some(trunk) = leaf_under(&descriptor.name, name) else {
				continue;
			};
			if !descriptor.defaults.contains_key(trunk) {
				break;
			}
			if !descriptor.anonymous && trunk != key_leaf {
				return Err(LineError::KeyNotFirst {
					category: descriptor.name.clone(),
					key: key_leaf.to_owned(),
				});
			}
			target = Some((index, trunk));
			break;
		}

		let Some((index, trunk)) = target else {
			return Ok(Resolution::Missing);
		};

		let slot = self.instantiate(index, arena);
		scope.instance = Some(self.instances[slot].id);

		if self.descriptors[index].anonymous {
			let next = self.instances.iter().map(|i| i.anonymous_id).max().unwrap_or(0) + 1;
			self.instances[slot].anonymous_id = next;
			let key = next.to_string();
			self.write_key(slot, &key, arena);
			scope.key = key;
		} else {
			rhs.clone_into(&mut scope.key);
		}

		let instance = &self.instances[slot];
		tracing::debug!(category = %instance.category, key = %scope.key, "created special category instance");
		Ok(instance
			.values
			.get(trunk)
			.map_or(Resolution::Missing, |h| Resolution::Cell(*h)))
	}

	/// Stamps out a fresh instance of `descriptors[index]` and returns its
	/// position in `instances`.
	fn instantiate(&mut self, index: usize, arena: &mut CellArena) -> usize {
		let id = self.next_instance_id();
		let descriptor = &self.descriptors[index];
		let values = descriptor
			.defaults
			.iter()
			.map(|(leaf, default)| (leaf.clone(), arena.insert(ConfigValue::from_default(default))))
			.collect();

		self.instances.push(Instance {
			id,
			category: descriptor.name.clone(),
			key_leaf: descriptor.key.clone(),
			anonymous_id: 0,
			values,
		});
		self.instances.len() - 1
	}

	fn write_key(&self, slot: usize, key: &str, arena: &mut CellArena) {
		let instance = &self.instances[slot];
		let handle = instance.key_leaf.as_deref().and_then(|leaf| instance.values.get(leaf));
		if let Some(cell) = handle.and_then(|h| arena.get_mut(*h)) {
			cell.overwrite_string(key);
		}
	}

	/// Instance positions, longest category name first, creation order
	/// among equals.
	fn lookup_order(&self) -> Vec<usize> {
		let mut order: Vec<usize> = (0..self.instances.len()).collect();
		order.sort_by_key(|&slot| Reverse(self.instances[slot].category.len()));
		order
	}

	fn next_instance_id(&mut self) -> InstanceId {
		self.next_id += 1;
		InstanceId(self.next_id)
	}

	fn descriptor(&self, name: &str) -> Option<&Descriptor> {
		self.descriptors.iter().find(|d| d.name == name)
	}

	pub(crate) fn has_category(&self, name: &str) -> bool {
		self.descriptor(name).is_some()
	}

	/// The cell for `leaf` in the instance of `category` selected by `key`.
	/// Static instances ignore `key`; keyed ones compare against `""` when it
	/// is `None`.
	pub(crate) fn value_handle(
		&self,
		category: &str,
		leaf: &str,
		key: Option<&str>,
		arena: &CellArena,
	) -> Option<ValueHandle> {
		let key = key.unwrap_or_default();
		self.instances
			.iter()
			.find(|i| i.category == category && i.selected_by(key, arena))?
			.values
			.get(leaf)
			.copied()
	}

	/// Keys of the non-static instances of `category`, in creation order.
	pub(crate) fn keys(&self, category: &str, arena: &CellArena) -> Vec<String> {
		self.instances
			.iter()
			.filter(|i| i.category == category && !i.is_static())
			.filter_map(|i| i.key(arena))
			.map(str::to_owned)
			.collect()
	}

	pub(crate) fn exists_for_key(&self, category: &str, key: &str, arena: &CellArena) -> bool {
		self.instances
			.iter()
			.any(|i| i.category == category && !i.is_static() && i.key(arena) == Some(key))
	}

	#[cfg(test)]
	pub(crate) fn instance_count(&self) -> usize {
		self.instances.len()
	}
}
