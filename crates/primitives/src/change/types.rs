use crate::range::{CharIdx, CharLen};
use crate::text::Text;

/// Owned replacement text.
pub type Tendril = String;

/// Bias determines how positions at change boundaries are mapped.
///
/// When mapping a position through a change, bias determines whether the position
/// moves with insertions or stays before them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Bias {
	/// Position stays before insertions at the same location.
	Left,
	/// Position moves after insertions at the same location.
	#[default]
	Right,
}

/// A text insertion with cached character length.
///
/// Storing the character count avoids repeated O(n) `.chars().count()` calls
/// in hot paths like position mapping.
///
/// Fields are private to enforce the invariant that `char_len` always equals
/// `text.chars().count()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Insertion {
	text: Tendril,
	char_len: CharLen,
}

impl Insertion {
	/// Creates a new insertion, computing the character length once.
	#[inline]
	pub fn new(text: Tendril) -> Self {
		let char_len = text.chars().count();
		Self { text, char_len }
	}

	/// Returns true if this insertion is empty.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.char_len == 0
	}

	/// Returns the inserted text.
	#[inline]
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Returns the cached character length.
	#[inline]
	pub fn char_len(&self) -> CharLen {
		self.char_len
	}
}

/// A single text replacement.
///
/// Replaces the half-open interval `[from, to)` of the document it was
/// created against with `text`. A change with `from == to` and empty text is
/// a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
	/// Start of the replaced interval.
	pub from: CharIdx,
	/// End of the replaced interval (exclusive).
	pub to: CharIdx,
	insert: Insertion,
}

impl Change {
	/// Creates a change replacing `[from, to)` with `text`.
	///
	/// # Panics
	///
	/// Panics if `from > to`.
	pub fn new(from: CharIdx, to: CharIdx, text: impl Into<Tendril>) -> Self {
		assert!(from <= to, "change start ({from}) is after its end ({to})");
		Self {
			from,
			to,
			insert: Insertion::new(text.into()),
		}
	}

	/// Creates a pure insertion at `pos`.
	pub fn insert(pos: CharIdx, text: impl Into<Tendril>) -> Self {
		Self::new(pos, pos, text)
	}

	/// Creates a pure deletion of `[from, to)`.
	pub fn delete(from: CharIdx, to: CharIdx) -> Self {
		Self::new(from, to, Tendril::new())
	}

	/// Returns the replacement text.
	#[inline]
	pub fn text(&self) -> &str {
		self.insert.text()
	}

	/// Returns the replacement length in characters.
	#[inline]
	pub fn text_len(&self) -> CharLen {
		self.insert.char_len()
	}

	/// Returns true if applying this change leaves the document untouched.
	#[inline]
	pub fn is_noop(&self) -> bool {
		self.from == self.to && self.insert.is_empty()
	}

	/// Returns the change in document length caused by this change.
	#[inline]
	pub fn len_delta(&self) -> isize {
		self.text_len() as isize - (self.to - self.from) as isize
	}

	/// Maps a position in the old document to the new one.
	///
	/// Positions before `from` stay put and positions after `to` shift by the
	/// length delta. A position on the replaced interval lands on one of its
	/// new edges: the leading edge `from` stays before the replacement, the
	/// trailing edge `to` ends up after it, and anything strictly inside (or
	/// any position at a pure insertion) follows `bias`.
	pub fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		if pos < self.from || (bias == Bias::Left && pos == self.from) {
			return pos;
		}
		if pos > self.to {
			return pos - (self.to - self.from) + self.text_len();
		}

		let side = if self.from == self.to {
			bias
		} else if pos == self.from {
			Bias::Left
		} else if pos == self.to {
			Bias::Right
		} else {
			bias
		};

		match side {
			Bias::Left => self.from,
			Bias::Right => self.from + self.text_len(),
		}
	}

	/// Returns the change that undoes this one.
	///
	/// `doc` must be the document this change was created against.
	pub fn invert(&self, doc: &Text) -> Change {
		Change::new(self.from, self.from + self.text_len(), doc.slice(self.from, self.to))
	}

	/// Applies this change to `doc`, returning the new document.
	pub fn apply(&self, doc: &Text) -> Text {
		doc.replace(self.from, self.to, self.text())
	}
}
