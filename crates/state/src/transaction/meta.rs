//! Transaction metadata slots.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;

/// A typed, string-keyed metadata slot.
///
/// Slots with the same name share storage, so names must be unique per
/// value type.
pub struct MetaSlot<T> {
	name: &'static str,
	_marker: PhantomData<fn() -> T>,
}

impl<T> Clone for MetaSlot<T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T> Copy for MetaSlot<T> {}

impl<T> fmt::Debug for MetaSlot<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("MetaSlot").field(&self.name).finish()
	}
}

impl<T> MetaSlot<T> {
	/// Defines a slot.
	pub const fn define(name: &'static str) -> Self {
		Self {
			name,
			_marker: PhantomData,
		}
	}

	/// Returns the slot's key.
	pub const fn name(&self) -> &'static str {
		self.name
	}
}

/// Time the transaction was started, in milliseconds since the Unix epoch.
pub const TIME: MetaSlot<u64> = MetaSlot::define("time");

/// Whether a history collaborator should record the transaction.
pub const ADD_TO_HISTORY: MetaSlot<bool> = MetaSlot::define("add_to_history");

/// How many times the transaction was rebased over concurrent changes.
pub const REBASED: MetaSlot<u32> = MetaSlot::define("rebased");

/// The metadata table carried by a transaction.
#[derive(Clone, Default)]
pub(crate) struct Meta {
	entries: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl Meta {
	pub(crate) fn get<T: Clone + 'static>(&self, slot: MetaSlot<T>) -> Option<T> {
		self.entries.get(slot.name()).and_then(|value| value.downcast_ref::<T>()).cloned()
	}

	pub(crate) fn insert<T: Send + Sync + 'static>(&mut self, slot: MetaSlot<T>, value: T) {
		self.entries.insert(slot.name(), Arc::new(value));
	}

	pub(crate) fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.entries.keys().copied()
	}
}
