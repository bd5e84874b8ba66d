use serde::{Deserialize, Serialize};

use crate::change::{Bias, PosMapping};

/// Selection direction (anchor to head).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	/// Head is at or after anchor.
	Forward,
	/// Head is before anchor.
	Backward,
}

/// A position in the text, measured in characters (not bytes).
pub type CharIdx = usize;

/// A length or count in the text, measured in characters (not bytes).
///
/// This is distinct from CharIdx to avoid accidentally passing an index
/// where a length is expected or vice versa.
pub type CharLen = usize;

/// A text range defined by anchor and head positions.
///
/// The anchor is the fixed end, and the head moves during selection extension.
/// The covered extent is the half-open interval `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
	/// The fixed end of the range.
	pub anchor: CharIdx,
	/// The moving end of the range (cursor position).
	pub head: CharIdx,
}

impl Range {
	/// Creates a new range from anchor to head.
	pub fn new(anchor: CharIdx, head: CharIdx) -> Self {
		Self { anchor, head }
	}

	/// Creates a zero-width range (cursor) at the given position.
	pub fn point(pos: CharIdx) -> Self {
		Self::new(pos, pos)
	}

	/// Returns the start of the extent, `min(anchor, head)`.
	#[inline]
	pub fn from(&self) -> CharIdx {
		std::cmp::min(self.anchor, self.head)
	}

	/// Returns the end of the extent, `max(anchor, head)`.
	#[inline]
	pub fn to(&self) -> CharIdx {
		std::cmp::max(self.anchor, self.head)
	}

	/// Returns the length of the range in characters.
	#[inline]
	pub fn len(&self) -> CharLen {
		self.to() - self.from()
	}

	/// Returns true if anchor equals head (zero-width cursor).
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.anchor == self.head
	}

	/// Returns the direction of this range.
	#[inline]
	pub fn direction(&self) -> Direction {
		if self.head < self.anchor {
			Direction::Backward
		} else {
			Direction::Forward
		}
	}

	/// Returns a new range with anchor and head swapped.
	pub fn flip(&self) -> Self {
		Self {
			anchor: self.head,
			head: self.anchor,
		}
	}

	/// Maps both ends through `mapping` with the default bias.
	///
	/// Anchor and head are mapped independently, so a backward range stays
	/// backward unless the edit collapses it.
	pub fn map<M: PosMapping + ?Sized>(self, mapping: &M) -> Self {
		self.map_positions(|pos| mapping.map_pos(pos, Bias::default()))
	}

	/// Applies a function to both anchor and head.
	pub fn map_positions(self, mut f: impl FnMut(CharIdx) -> CharIdx) -> Self {
		Self {
			anchor: f(self.anchor),
			head: f(self.head),
		}
	}

	/// Returns true if the position is within `[from, to)`.
	pub fn contains(&self, pos: CharIdx) -> bool {
		pos >= self.from() && pos < self.to()
	}

	/// Returns true if this range overlaps with another.
	///
	/// Two cursors at the same position count as overlapping.
	pub fn overlaps(&self, other: &Range) -> bool {
		if self.from() < other.to() && other.from() < self.to() {
			return true;
		}

		self.is_empty() && other.is_empty() && self.from() == other.from()
	}

	/// Merges two ranges, preserving direction of self.
	pub fn merge(&self, other: &Range) -> Self {
		let from = std::cmp::min(self.from(), other.from());
		let to = std::cmp::max(self.to(), other.to());

		if self.direction() == Direction::Forward {
			Self::new(from, to)
		} else {
			Self::new(to, from)
		}
	}

	/// Clamps anchor and head to `[0, max_char]`.
	pub fn clamp(&self, max_char: CharIdx) -> Self {
		Self {
			anchor: self.anchor.min(max_char),
			head: self.head.min(max_char),
		}
	}
}

impl Default for Range {
	fn default() -> Self {
		Self::point(0)
	}
}
