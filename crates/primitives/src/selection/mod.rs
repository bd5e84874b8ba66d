use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::change::PosMapping;
use crate::range::{CharIdx, Direction, Range};


/// A set of non-overlapping ranges with a designated primary.
///
/// A selection always contains at least one range. The primary range
/// is used for cursor positioning and scroll following.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SelectionRepr", into = "SelectionRepr")]
pub struct Selection {
	/// The collection of selection ranges (always non-empty).
	ranges: SmallVec<[Range; 1]>,
	/// Index of the primary range within `ranges`.
	primary_index: usize,
}

impl Selection {
	/// Create a new selection with at least one range.
	///
	/// The `primary` range is the one that will be used for most operations
	/// (like scrolling or cursor-based motions). Additional ranges can be
	/// provided via the `others` iterator.
	pub fn new(primary: Range, others: impl IntoIterator<Item = Range>) -> Self {
		let mut ranges: SmallVec<[Range; 1]> = smallvec![primary];
		ranges.extend(others);

		let mut sel = Self { ranges, primary_index: 0 };
		sel.normalize();
		sel
	}

	/// Creates a selection from a vector of ranges.
	///
	/// # Panics
	///
	/// Panics if `ranges` is empty or `primary_index` is out of bounds.
	pub fn from_vec(ranges: Vec<Range>, primary_index: usize) -> Self {
		assert!(!ranges.is_empty(), "Selection cannot be empty");
		assert!(
			primary_index < ranges.len(),
			"primary_index ({primary_index}) out of bounds for {} ranges",
			ranges.len()
		);

		let mut sel = Self {
			ranges: ranges.into_iter().collect(),
			primary_index,
		};
		sel.normalize();
		sel
	}

	/// Creates a single-range selection.
	pub fn single(anchor: CharIdx, head: CharIdx) -> Self {
		Self {
			ranges: smallvec![Range::new(anchor, head)],
			primary_index: 0,
		}
	}

	/// Creates a point selection (zero-width cursor).
	pub fn point(pos: CharIdx) -> Self {
		Self::single(pos, pos)
	}

	/// Returns the primary range.
	pub fn primary(&self) -> Range {
		self.ranges[self.primary_index]
	}

	/// Returns the index of the primary range.
	pub fn primary_index(&self) -> usize {
		self.primary_index
	}

	/// Returns all ranges as a slice.
	pub fn ranges(&self) -> &[Range] {
		&self.ranges
	}

	/// Returns the number of ranges in this selection.
	///
	/// This is always at least 1 (Selection cannot be empty).
	#[allow(clippy::len_without_is_empty, reason = "Selection is never empty by design")]
	pub fn len(&self) -> usize {
		self.ranges.len()
	}

	/// Iterates over all ranges.
	pub fn iter(&self) -> impl Iterator<Item = &Range> {
		self.ranges.iter()
	}

	/// Maps every range through `mapping`.
	///
	/// Ranges that collide after the edit are merged.
	pub fn map<M: PosMapping + ?Sized>(&self, mapping: &M) -> Self {
		self.transform(|r| r.map(mapping))
	}

	/// Transforms all ranges using the given function, returning a new selection.
	pub fn transform<F>(&self, mut f: F) -> Self
	where
		F: FnMut(&Range) -> Range,
	{
		let ranges: Vec<Range> = self.ranges.iter().map(&mut f).collect();
		Self::from_vec(ranges, self.primary_index)
	}

	/// Collapses the selection to its primary range.
	pub fn as_single(&self) -> Self {
		if self.ranges.len() == 1 {
			return self.clone();
		}
		Self::from(self.primary())
	}

	/// Normalize the selection by sorting ranges and merging overlaps.
	///
	/// Adjacent ranges stay separate: `[0, 5)` and `[5, 10)` remain two ranges.
	fn normalize(&mut self) {
		if self.ranges.len() <= 1 {
			return;
		}

		let primary = self.ranges[self.primary_index];

		self.ranges.sort_by_key(|r: &Range| r.from());

		let mut merged: SmallVec<[Range; 1]> = SmallVec::new();
		let mut primary_index = 0;

		for range in &self.ranges {
			if let Some(last) = merged.last_mut()
				&& last.overlaps(range)
			{
				let old_last = *last;
				*last = last.merge(range);
				if *range == primary || old_last == primary {
					primary_index = merged.len() - 1;
				}
				continue;
			}

			if *range == primary {
				primary_index = merged.len();
			}
			merged.push(*range);
		}

		self.ranges = merged;
		self.primary_index = primary_index.min(self.ranges.len().saturating_sub(1));
	}

	/// Returns true if any range contains the given position.
	pub fn contains(&self, pos: CharIdx) -> bool {
		self.ranges.iter().any(|r: &Range| r.contains(pos))
	}

	/// Returns the direction of the primary range.
	pub fn direction(&self) -> Direction {
		self.primary().direction()
	}

	/// Clamps all ranges to `[0, max_char]`.
	pub fn clamp(&mut self, max_char: CharIdx) {
		for range in &mut self.ranges {
			*range = range.clamp(max_char);
		}
		self.normalize();
	}

	/// Returns `true` if every range lies within `[0, len]`.
	#[inline]
	pub fn is_in_bounds(&self, len: CharIdx) -> bool {
		self.ranges.iter().all(|r| r.to() <= len)
	}
}

impl Default for Selection {
	fn default() -> Self {
		Self::point(0)
	}
}

impl From<Range> for Selection {
	fn from(range: Range) -> Self {
		Self {
			ranges: smallvec![range],
			primary_index: 0,
		}
	}
}

/// Wire form of a [`Selection`].
#[derive(Serialize, Deserialize)]
struct SelectionRepr {
	ranges: Vec<Range>,
	#[serde(default)]
	primary_index: usize,
}

impl TryFrom<SelectionRepr> for Selection {
	type Error = String;

	fn try_from(repr: SelectionRepr) -> Result<Self, Self::Error> {
		if repr.ranges.is_empty() {
			return Err("selection must contain at least one range".to_string());
		}
		if repr.primary_index >= repr.ranges.len() {
			return Err(format!(
				"primary_index ({}) out of bounds for {} ranges",
				repr.primary_index,
				repr.ranges.len()
			));
		}
		Ok(Selection::from_vec(repr.ranges, repr.primary_index))
	}
}

impl From<Selection> for SelectionRepr {
	fn from(sel: Selection) -> Self {
		Self {
			ranges: sel.ranges.into_vec(),
			primary_index: sel.primary_index,
		}
	}
}
