use super::types::{Bias, Change};
use super::PosMapping;
use crate::range::CharIdx;
use crate::text::Text;

/// An ordered sequence of changes.
///
/// Unlike a single [`Change`], whose coordinates refer to one document, each
/// change in a set is expressed in the coordinates of the document produced
/// by the change before it. Mapping a position through the set folds the
/// changes left to right.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
	changes: Vec<Change>,
}

impl ChangeSet {
	/// Creates an empty changeset.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the number of changes.
	pub fn len(&self) -> usize {
		self.changes.len()
	}

	/// Returns true if this changeset contains no changes.
	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	/// Returns all changes in application order.
	pub fn changes(&self) -> &[Change] {
		&self.changes
	}

	/// Iterates over the changes in application order.
	pub fn iter(&self) -> impl Iterator<Item = &Change> {
		self.changes.iter()
	}

	/// Appends a change. No-op changes are dropped.
	///
	/// Returns whether the change was kept.
	pub fn push(&mut self, change: Change) -> bool {
		if change.is_noop() {
			return false;
		}
		self.changes.push(change);
		true
	}

	/// Returns the changes from index `start` onward.
	///
	/// Used to map positions that were taken after the first `start` changes
	/// had already been applied.
	pub fn since(&self, start: usize) -> &[Change] {
		&self.changes[start.min(self.changes.len())..]
	}

	/// Applies every change to `doc` in order.
	pub fn apply(&self, doc: &Text) -> Text {
		self.changes.iter().fold(doc.clone(), |doc, change| change.apply(&doc))
	}

	/// Produces the changeset that undoes this one.
	///
	/// `docs[i]` must be the document change `i` was applied to. The inverse
	/// runs the individual inversions in reverse order.
	///
	/// # Panics
	///
	/// Panics if fewer documents than changes are supplied.
	pub fn invert(&self, docs: &[Text]) -> ChangeSet {
		assert!(
			docs.len() >= self.changes.len(),
			"need a document per change ({} docs for {} changes)",
			docs.len(),
			self.changes.len()
		);
		let changes = self.changes.iter().zip(docs).rev().map(|(change, doc)| change.invert(doc)).collect();
		ChangeSet { changes }
	}
}

impl PosMapping for ChangeSet {
	fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		self.changes.as_slice().map_pos(pos, bias)
	}
}

impl From<Vec<Change>> for ChangeSet {
	fn from(changes: Vec<Change>) -> Self {
		let mut set = ChangeSet::new();
		for change in changes {
			set.push(change);
		}
		set
	}
}

impl<'a> IntoIterator for &'a ChangeSet {
	type Item = &'a Change;
	type IntoIter = std::slice::Iter<'a, Change>;

	fn into_iter(self) -> Self::IntoIter {
		self.changes.iter()
	}
}
