//! Text changes and position mapping.

mod changeset;
mod types;


pub use changeset::ChangeSet;
pub use types::{Bias, Change, Insertion, Tendril};

use crate::range::CharIdx;

/// Anything that can carry an offset from an old document to a new one.
pub trait PosMapping {
	/// Maps `pos` to its position after the edit(s), using `bias` to resolve
	/// positions that sit exactly at an insertion point.
	fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx;
}

impl PosMapping for Change {
	fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		Change::map_pos(self, pos, bias)
	}
}

impl PosMapping for [Change] {
	fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		self.iter().fold(pos, |pos, change| change.map_pos(pos, bias))
	}
}
