//! Transactions: accumulate changes, selection updates and metadata against
//! a start state, then commit them into a new state.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use tessera_primitives::{Change, ChangeSet, CharIdx, Range, Selection, Text};

use crate::config::Configuration;
use crate::error::Result;
use crate::extension::Extension;
use crate::state::{EditorState, selection_policy};

pub mod meta;
#[cfg(test)]
mod tests;

use meta::{Meta, MetaSlot};

bitflags! {
	/// What a transaction did besides changing the document.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct TransactionFlags: u8 {
		/// The selection was set explicitly rather than only mapped.
		const SELECTION_SET = 1 << 0;
		/// The view was asked to scroll the selection into view.
		const SCROLL_INTO_VIEW = 1 << 1;
		/// The transaction replaces the configuration.
		const RECONFIGURE = 1 << 2;
	}
}

/// An update to a state, built up step by step.
///
/// Every building method consumes the transaction and returns the next one;
/// clone a transaction to branch it. The metadata table is shared between
/// clones and copied on the first write. Nothing reaches a state until
/// [`Transaction::apply`] commits it.
#[derive(Clone)]
#[must_use = "a transaction does nothing until applied"]
pub struct Transaction<'s> {
	start: &'s EditorState,
	changes: ChangeSet,
	/// Document after each change; `docs[i]` is the result of `changes[i]`.
	docs: Vec<Text>,
	selection: Selection,
	meta: Arc<Meta>,
	flags: TransactionFlags,
	reconfigure: Option<Extension>,
}

impl<'s> Transaction<'s> {
	pub(crate) fn new(start: &'s EditorState, time: u64) -> Self {
		let mut meta = Meta::default();
		meta.insert(meta::TIME, time);
		Self {
			start,
			changes: ChangeSet::new(),
			docs: Vec::new(),
			selection: start.selection().clone(),
			meta: Arc::new(meta),
			flags: TransactionFlags::empty(),
			reconfigure: None,
		}
	}

	/// Returns the state this transaction started from.
	pub fn start_state(&self) -> &'s EditorState {
		self.start
	}

	/// Returns the document as it stands after every change so far.
	pub fn doc(&self) -> &Text {
		self.docs.last().unwrap_or_else(|| self.start.doc())
	}

	/// Returns the intermediate documents, one per change.
	pub fn docs(&self) -> &[Text] {
		&self.docs
	}

	/// Returns the changes in application order.
	pub fn changes(&self) -> &ChangeSet {
		&self.changes
	}

	/// Returns the current selection.
	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	/// Returns true if any change was made to the document.
	pub fn doc_changed(&self) -> bool {
		!self.changes.is_empty()
	}

	/// Returns the flags raised so far.
	pub fn flags(&self) -> TransactionFlags {
		self.flags
	}

	/// Returns true if the selection was set explicitly.
	pub fn selection_set(&self) -> bool {
		self.flags.contains(TransactionFlags::SELECTION_SET)
	}

	/// Returns true if a scroll into view was requested.
	pub fn scrolled_into_view(&self) -> bool {
		self.flags.contains(TransactionFlags::SCROLL_INTO_VIEW)
	}

	/// Returns the timestamp, in milliseconds since the Unix epoch.
	pub fn time(&self) -> u64 {
		self.meta.get(meta::TIME).unwrap_or_default()
	}

	/// Adds a change, expressed in the coordinates of [`Transaction::doc`].
	///
	/// The selection is mapped through the new change. No-op changes leave
	/// the transaction as it is.
	pub fn change(mut self, change: Change) -> Self {
		if change.is_noop() {
			return self;
		}
		let doc = change.apply(self.doc());
		self.selection = self.selection.map(&change);
		self.changes.push(change);
		self.docs.push(doc);
		self
	}

	/// Replaces `[from, to)` of the current document with `text`.
	pub fn replace(self, from: CharIdx, to: CharIdx, text: impl Into<String>) -> Self {
		self.change(Change::new(from, to, text))
	}

	/// Runs `f` once per range of the current selection.
	///
	/// Each range is first mapped through the changes made by earlier calls,
	/// so `f` always sees coordinates in the document as it stands. The range
	/// returned by `f` is mapped through the changes made by later calls, and
	/// the results become the new selection.
	pub fn reduce_ranges<F>(self, mut f: F) -> Self
	where
		F: FnMut(Self, Range) -> (Self, Range),
	{
		let selection = self.selection.clone();
		let start = self.changes.len();
		let mut tr = self;
		let mut reduced: Vec<(Range, usize)> = Vec::with_capacity(selection.len());

		for range in selection.iter() {
			let range = range.map(tr.changes.since(start));
			let (next, range) = f(tr, range);
			tr = next;
			reduced.push((range, tr.changes.len()));
		}

		let ranges = reduced.into_iter().map(|(range, seen)| range.map(tr.changes.since(seen))).collect();
		tr.set_selection(Selection::from_vec(ranges, selection.primary_index()))
	}

	/// Replaces every selected range with `text`, leaving a cursor after
	/// each insertion.
	pub fn replace_selection(self, text: &str) -> Self {
		let len = text.chars().count();
		self.reduce_ranges(|tr, range| {
			let tr = tr.replace(range.from(), range.to(), text);
			(tr, Range::point(range.from() + len))
		})
	}

	/// Replaces the selection outright.
	pub fn set_selection(mut self, selection: Selection) -> Self {
		self.selection = selection;
		self.flags |= TransactionFlags::SELECTION_SET;
		self
	}

	/// Stores a metadata value.
	pub fn set_meta<T: Send + Sync + 'static>(mut self, slot: MetaSlot<T>, value: T) -> Self {
		Arc::make_mut(&mut self.meta).insert(slot, value);
		self
	}

	/// Reads a metadata value.
	pub fn get_meta<T: Clone + 'static>(&self, slot: MetaSlot<T>) -> Option<T> {
		self.meta.get(slot)
	}

	/// Asks the view to bring the selection into view.
	pub fn scroll_into_view(mut self) -> Self {
		self.flags |= TransactionFlags::SCROLL_INTO_VIEW;
		self
	}

	/// Replaces the configuration when this transaction is applied.
	///
	/// The new state keeps the document and selection; every field starts
	/// over from its init rule.
	pub fn reconfigure(mut self, extension: Extension) -> Self {
		self.reconfigure = Some(extension);
		self.flags |= TransactionFlags::RECONFIGURE;
		self
	}

	/// Commits the transaction into a new state.
	///
	/// Fields are updated in configuration order. Each apply rule sees the
	/// transaction, its own previous value and the new state, whose fields
	/// cannot be read until the pass is over.
	///
	/// # Errors
	///
	/// Fails if the new configuration does not resolve, the final selection
	/// does not fit the document, or a field rule fails. The start state is
	/// untouched either way.
	pub fn apply(self) -> Result<EditorState> {
		let doc = self.doc().clone();

		if let Some(extension) = &self.reconfigure {
			let config = Configuration::resolve(extension)?;
			tracing::debug!(fields = config.field_count(), "reconfiguring state");
			return EditorState::initialize(config, doc, self.selection.clone());
		}

		let config = Arc::clone(self.start.config());
		let selection = selection_policy(&config, self.selection.clone());
		let state = EditorState::new(Arc::clone(&config), doc, selection)?;

		tracing::trace!(
			changes = self.changes.len(),
			selection_set = self.selection_set(),
			fields = config.field_count(),
			"applying transaction",
		);

		state.seal_fields();
		let mut values = Vec::with_capacity(config.field_count());
		for (index, field) in config.fields().iter().enumerate() {
			let old = self.start.slot_value(index)?;
			values.push(field.apply(&self, &old, &state)?);
		}
		state.install_fields(values);

		Ok(state)
	}
}

impl fmt::Debug for Transaction<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Transaction")
			.field("changes", &self.changes)
			.field("selection", &self.selection)
			.field("meta", &self.meta.keys().collect::<Vec<_>>())
			.field("flags", &self.flags)
			.finish()
	}
}
