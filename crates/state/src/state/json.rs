//! Portable form of a state: document text and selection only.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tessera_primitives::Selection;

use super::{EditorState, EditorStateConfig};
use crate::error::{Result, StateError};
use crate::extension::Extension;

/// Serialized state. Field and facet values are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateJson {
	/// Document text, lines joined with the state's line break.
	pub doc: String,
	/// The selection.
	pub selection: Selection,
}

impl EditorState {
	/// Returns the portable form of this state.
	pub fn to_json(&self) -> StateJson {
		StateJson {
			doc: self.doc.join_lines(&self.line_break()),
			selection: self.selection.clone(),
		}
	}

	/// Rebuilds a state from its portable form.
	///
	/// Extensions are not serialized and must be supplied again. A missing or
	/// `null` selection falls back to the default cursor.
	///
	/// # Errors
	///
	/// Fails with [`StateError::Format`] if `doc` is missing or not a string,
	/// or if the selection is malformed.
	pub fn from_json(json: &Json, extensions: Extension) -> Result<Self> {
		let doc = json
			.get("doc")
			.and_then(Json::as_str)
			.ok_or_else(|| StateError::Format("`doc` must be a string".to_string()))?;

		let selection = match json.get("selection") {
			None | Some(Json::Null) => None,
			Some(selection) => Some(
				Selection::deserialize(selection).map_err(|err| StateError::Format(format!("selection: {err}")))?,
			),
		};

		EditorState::create(EditorStateConfig {
			doc: Some(doc.to_string()),
			selection,
			extensions,
		})
	}
}
