//! Immutable document text backed by a shared rope.

use std::fmt;

use ropey::Rope;

use crate::range::{CharIdx, CharLen};

/// An immutable document.
///
/// Line breaks are normalized to `\n` when the text is built, so every line
/// break counts as exactly one character. Cloning is cheap: the underlying
/// rope shares its nodes, and [`Text::replace`] returns a new value instead of
/// editing in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
	rope: Rope,
}

impl Text {
	/// Builds a text from already-split lines.
	pub fn of<I, S>(lines: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut content = String::new();
		for (i, line) in lines.into_iter().enumerate() {
			if i > 0 {
				content.push('\n');
			}
			content.push_str(line.as_ref());
		}
		Self {
			rope: Rope::from(content.as_str()),
		}
	}

	/// Splits `content` into lines and builds a text from them.
	///
	/// With no separator (or an empty one), any of `\r\n`, `\r` and `\n` ends a
	/// line.
	pub fn split(content: &str, separator: Option<&str>) -> Self {
		match separator {
			Some(sep) if !sep.is_empty() => Self::of(content.split(sep)),
			_ => Self::of(content.replace("\r\n", "\n").split(['\r', '\n'])),
		}
	}

	/// Returns the length in characters.
	#[inline]
	pub fn len(&self) -> CharLen {
		self.rope.len_chars()
	}

	/// Returns true if the text has no characters.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.rope.len_chars() == 0
	}

	/// Returns the characters in `[from, to)`.
	pub fn slice(&self, from: CharIdx, to: CharIdx) -> String {
		self.rope.slice(from..to).to_string()
	}

	/// Returns a new text with `[from, to)` replaced by `text`.
	///
	/// `text` is inserted verbatim; callers that accept foreign line breaks
	/// normalize them first.
	pub fn replace(&self, from: CharIdx, to: CharIdx, text: &str) -> Self {
		let mut rope = self.rope.clone();
		if to > from {
			rope.remove(from..to);
		}
		if !text.is_empty() {
			rope.insert(from, text);
		}
		Self { rope }
	}

	/// Returns the lines of the text, without their line breaks.
	pub fn lines(&self) -> Vec<String> {
		self.rope.to_string().split('\n').map(str::to_owned).collect()
	}

	/// Returns the number of lines. An empty text has one (empty) line.
	pub fn line_count(&self) -> usize {
		self.rope.chars().filter(|&c| c == '\n').count() + 1
	}

	/// Joins the lines back together with `separator`.
	pub fn join_lines(&self, separator: &str) -> String {
		self.lines().join(separator)
	}
}

impl fmt::Display for Text {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for chunk in self.rope.chunks() {
			f.write_str(chunk)?;
		}
		Ok(())
	}
}

impl From<&str> for Text {
	fn from(content: &str) -> Self {
		Self::split(content, None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_split_default_line_breaks() {
		let text = Text::split("a\r\nb\rc\nd", None);
		assert_eq!(text.lines(), vec!["a", "b", "c", "d"]);
		assert_eq!(text.to_string(), "a\nb\nc\nd");
		assert_eq!(text.len(), 7);
	}

	#[test]
	fn test_split_custom_separator() {
		let text = Text::split("one||two\nstill two", Some("||"));
		assert_eq!(text.line_count(), 3);
		assert_eq!(text.lines(), vec!["one", "two", "still two"]);
	}

	#[test]
	fn test_empty() {
		let text = Text::from("");
		assert!(text.is_empty());
		assert_eq!(text.line_count(), 1);
		assert_eq!(text.lines(), vec![""]);
	}

	#[test]
	fn test_only_newline() {
		let text = Text::from("\n");
		assert_eq!(text.len(), 1);
		assert_eq!(text.line_count(), 2);
	}

	#[test]
	fn test_replace_is_persistent() {
		let before = Text::from("hello world");
		let after = before.replace(0, 5, "hi");
		assert_eq!(before.to_string(), "hello world");
		assert_eq!(after.to_string(), "hi world");
	}

	#[test]
	fn test_slice_counts_chars() {
		let text = Text::from("héllo");
		assert_eq!(text.len(), 5);
		assert_eq!(text.slice(1, 3), "él");
	}

	#[test]
	fn test_join_lines() {
		let text = Text::of(["a", "b"]);
		assert_eq!(text.join_lines("\r\n"), "a\r\nb");
	}
}
