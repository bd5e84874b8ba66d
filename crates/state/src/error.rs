//! Error types for state construction, lookup and serialization.

use thiserror::Error;

/// Errors raised while resolving or evaluating a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
	/// The same state field was installed more than once.
	#[error("field {name:?} is installed more than once")]
	DuplicateField {
		/// Name of the duplicated field.
		name: String,
	},

	/// A static facet was given an input computed from the state.
	#[error("static facet {name:?} cannot take computed inputs")]
	ComputedStaticFacet {
		/// Name of the facet.
		name: String,
	},

	/// A slot's value depends on itself.
	#[error("circular dependency between slots: {}", path.join(" -> "))]
	Cycle {
		/// Slot names from the outermost read to the repeated slot.
		path: Vec<String>,
	},

	/// Slot evaluation nested deeper than the supported limit.
	#[error("evaluating {name:?} nests more than {depth} slots deep")]
	DepthExceeded {
		/// Name of the slot that would exceed the limit.
		name: String,
		/// The limit.
		depth: usize,
	},

	/// A field was read from a state whose fields are still being committed.
	#[error("field {name:?} was read from a state that is still being committed")]
	FieldSealed {
		/// Name of the field.
		name: String,
	},
}

/// Errors produced by the state core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
	/// The configuration could not be resolved or evaluated.
	#[error(transparent)]
	Configuration(#[from] ConfigurationError),

	/// A required field is not part of the state's configuration.
	#[error("{name:?} is not present in this configuration")]
	Lookup {
		/// Name of the missing field or facet.
		name: String,
	},

	/// A selection range lies outside the document.
	#[error("selection range {from}..{to} is outside the document (length {len})")]
	Range {
		/// Start of the offending range.
		from: usize,
		/// End of the offending range.
		to: usize,
		/// Document length.
		len: usize,
	},

	/// A serialized state could not be read.
	#[error("malformed state JSON: {0}")]
	Format(String),
}

/// Result type for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
