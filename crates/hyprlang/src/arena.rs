//! Stable storage for live value cells.
//!
//! Cells never move once inserted: a [`ValueHandle`] stays valid across any
//! number of parses and only ever observes its cell's contents changing.
//! Removing a cell (special category instances are discarded at the start of
//! every parse) retires its handle for good; slots are recycled, but a
//! generation stamp keeps a retired handle from aliasing the new occupant.

use slab::Slab;

use crate::value::ConfigValue;


/// A stable reference to a live cell, resolved through
/// [`Config::value`](crate::Config::value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueHandle {
	slot: usize,
	generation: u64,
}

struct Slot {
	generation: u64,
	cell: ConfigValue,
}

#[derive(Default)]
pub(crate) struct CellArena {
	slots: Slab<Slot>,
	next_generation: u64,
}

impl CellArena {
	pub(crate) fn insert(&mut self, cell: ConfigValue) -> ValueHandle {
		let generation = self.next_generation;
		self.next_generation += 1;
		let slot = self.slots.insert(Slot { generation, cell });
		ValueHandle { slot, generation }
	}

	pub(crate) fn get(&self, handle: ValueHandle) -> Option<&ConfigValue> {
		self.slots
			.get(handle.slot)
			.filter(|s| s.generation == handle.generation)
			.map(|s| &s.cell)
	}

	pub(crate) fn get_mut(&mut self, handle: ValueHandle) -> Option<&mut ConfigValue> {
		self.slots
			.get_mut(handle.slot)
			.filter(|s| s.generation == handle.generation)
			.map(|s| &mut s.cell)
	}

	/// Removes the cell behind `handle`, dropping it. Stale handles are
	/// ignored.
	pub(crate) fn remove(&mut self, handle: ValueHandle) {
		if self.get(handle).is_some() {
			self.slots.remove(handle.slot);
		}
	}

	pub(crate) fn len(&self) -> usize {
		self.slots.len()
	}
}
