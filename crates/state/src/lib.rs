//! Persistent editor state and the transaction algebra that derives new
//! states from old ones.
//!
//! A [`Configuration`] is resolved from an [`Extension`] tree. An
//! [`EditorState`] pairs a document and selection with the slot values that
//! configuration defines, and a [`Transaction`] started from a state
//! accumulates changes, selection updates and metadata before committing them
//! into the next state.
//!
//! ```
//! use tessera_state::{EditorState, EditorStateConfig, StateField};
//!
//! # fn main() -> tessera_state::Result<()> {
//! let edits = StateField::define("edits", |_| Ok(0usize), |tr, n, _| Ok(n + tr.changes().len()));
//! let state = EditorState::create(EditorStateConfig {
//!     doc: Some("hello".into()),
//!     extensions: edits.extension(),
//!     ..Default::default()
//! })?;
//! let next = state.transaction().replace(0, 5, "hi").apply()?;
//! assert_eq!(next.doc().to_string(), "hi");
//! assert_eq!(next.field(&edits)?, 1);
//! # Ok(())
//! # }
//! ```

/// Configuration resolution and slot addressing.
pub mod config;
/// Error types.
pub mod error;
/// Extension trees and precedence.
pub mod extension;
/// Facets and the built-in facets.
pub mod facet;
/// State fields.
pub mod field;
/// Editor state snapshots.
pub mod state;
/// Transactions and metadata.
pub mod transaction;

pub use config::Configuration;
pub use error::{ConfigurationError, Result, StateError};
pub use extension::{Extension, Precedence};
pub use facet::{Facet, FacetId, FacetInput, allow_multiple_selections, line_separator};
pub use field::{FieldId, FieldSpec, StateField};
pub use state::{EditorState, EditorStateConfig, MAX_SLOT_DEPTH, StateJson};
pub use tessera_primitives as primitives;
pub use transaction::meta::{self, MetaSlot};
pub use transaction::{Transaction, TransactionFlags};
