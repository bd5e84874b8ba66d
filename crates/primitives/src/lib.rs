//! Core value types for text editing: ranges, selections, changes, and the
//! immutable document text they refer to.

/// Text changes, changesets, and position mapping.
pub mod change;
/// Text range types: anchor/head pairs over character offsets.
pub mod range;
/// Selection types for single and multi-cursor editing.
pub mod selection;
/// Immutable, rope-backed document text.
pub mod text;

pub use change::{Bias, Change, ChangeSet, PosMapping};
pub use range::{CharIdx, CharLen, Direction, Range};
pub use selection::Selection;
pub use text::Text;
