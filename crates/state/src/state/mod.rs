//! Immutable editor state snapshots.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tessera_primitives::{Selection, Text};

use crate::config::{Address, Configuration, Slot};
use crate::error::{ConfigurationError, Result, StateError};
use crate::extension::Extension;
use crate::facet::{Facet, Provider, Value, allow_multiple_selections, downcast, line_separator};
use crate::field::StateField;
use crate::transaction::Transaction;

mod json;

pub use json::StateJson;

/// Maximum number of slots that may be under evaluation at once.
pub const MAX_SLOT_DEPTH: usize = 128;

/// Evaluation status of a per-state slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotStatus {
	Unresolved,
	InProgress,
	Done,
}

/// Lazily filled slot values.
///
/// Every slot is written at most once per state; later reads are lookups.
struct SlotTable {
	values: Vec<Option<Value>>,
	status: Vec<SlotStatus>,
	/// Slots currently being evaluated, outermost first.
	stack: Vec<usize>,
	/// Set while a transaction computes the fields of this state.
	sealed: bool,
}

impl SlotTable {
	fn new(len: usize) -> Self {
		Self {
			values: vec![None; len],
			status: vec![SlotStatus::Unresolved; len],
			stack: Vec::new(),
			sealed: false,
		}
	}
}

/// Input to [`EditorState::create`].
#[derive(Debug, Clone, Default)]
pub struct EditorStateConfig {
	/// Initial document content. Defaults to the empty document.
	pub doc: Option<String>,
	/// Initial selection. Defaults to a cursor at offset 0.
	pub selection: Option<Selection>,
	/// Extensions making up the configuration.
	pub extensions: Extension,
}

/// An immutable snapshot of a document, its selection and every field and
/// facet value derived from them.
///
/// New states are produced by committing a [`Transaction`]. The only interior
/// mutation is the memoization of lazily evaluated slots, which is not
/// observable from outside. A state is meant to be used from one thread.
///
/// Slots that read other slots are evaluated recursively. A chain of such
/// reads deeper than [`MAX_SLOT_DEPTH`] fails with
/// [`ConfigurationError::DepthExceeded`].
pub struct EditorState {
	config: Arc<Configuration>,
	doc: Text,
	selection: Selection,
	slots: RefCell<SlotTable>,
}

impl EditorState {
	/// Creates a state from scratch.
	///
	/// The document is split on the configured line separator. Fields are
	/// initialized eagerly, in configuration order.
	///
	/// # Errors
	///
	/// Fails if the extensions do not resolve, the selection does not fit the
	/// document, or a field's init rule fails.
	pub fn create(config: EditorStateConfig) -> Result<Self> {
		let configuration = Configuration::resolve(&config.extensions)?;
		let separator = configuration.static_facet(line_separator()).flatten();
		let doc = Text::split(config.doc.as_deref().unwrap_or_default(), separator.as_deref());
		Self::initialize(configuration, doc, config.selection.unwrap_or_default())
	}

	/// Builds a state whose fields all run their init rule.
	pub(crate) fn initialize(config: Arc<Configuration>, doc: Text, selection: Selection) -> Result<Self> {
		let selection = selection_policy(&config, selection);
		let state = Self::new(config, doc, selection)?;
		for index in 0..state.config.field_count() {
			state.slot_value(index)?;
		}
		Ok(state)
	}

	/// Builds a state with every slot unresolved.
	pub(crate) fn new(config: Arc<Configuration>, doc: Text, selection: Selection) -> Result<Self> {
		if let Some(range) = selection.iter().find(|r| r.to() > doc.len()) {
			return Err(StateError::Range {
				from: range.from(),
				to: range.to(),
				len: doc.len(),
			});
		}

		let slots = RefCell::new(SlotTable::new(config.slot_count()));
		Ok(Self {
			config,
			doc,
			selection,
			slots,
		})
	}

	/// Returns the document.
	pub fn doc(&self) -> &Text {
		&self.doc
	}

	/// Returns the selection.
	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	/// Returns the configuration this state was built against.
	pub fn config(&self) -> &Arc<Configuration> {
		&self.config
	}

	/// Reads a field.
	///
	/// # Errors
	///
	/// Fails with [`StateError::Lookup`] if the field is not installed.
	pub fn field<T>(&self, field: &StateField<T>) -> Result<T>
	where
		T: Clone + Send + Sync + 'static,
	{
		self.field_opt(field)?.ok_or_else(|| StateError::Lookup {
			name: field.name().to_string(),
		})
	}

	/// Reads a field, returning `None` if it is not installed.
	pub fn field_opt<T>(&self, field: &StateField<T>) -> Result<Option<T>>
	where
		T: Clone + Send + Sync + 'static,
	{
		let Some(index) = self.config.field_address(field.id()) else {
			return Ok(None);
		};
		let value = self.slot_value(index)?;
		downcast(&value, field.name()).map(Some)
	}

	/// Reads a facet's combined value.
	pub fn facet<I, O>(&self, facet: &Facet<I, O>) -> Result<O>
	where
		I: Clone + Send + Sync + 'static,
		O: Clone + Send + Sync + 'static,
	{
		let value = match self.config.facet_address(facet.id()) {
			None => return Ok(facet.default_value()),
			Some(Address::Static(index)) => self.config.static_value(index).clone(),
			Some(Address::Dynamic(index)) => self.slot_value(index)?,
		};
		downcast(&value, facet.name())
	}

	/// Returns the string used to join lines when serializing.
	pub fn line_break(&self) -> String {
		self.config
			.static_facet(line_separator())
			.flatten()
			.filter(|sep| !sep.is_empty())
			.unwrap_or_else(|| "\n".to_string())
	}

	/// Returns true if selections may hold more than one range.
	pub fn allows_multiple_selections(&self) -> bool {
		self.config.static_facet(allow_multiple_selections()).unwrap_or(false)
	}

	/// Starts a transaction stamped with the current time.
	pub fn transaction(&self) -> Transaction<'_> {
		let now = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|elapsed| elapsed.as_millis() as u64)
			.unwrap_or_default();
		self.transaction_at(now)
	}

	/// Starts a transaction with a caller-supplied timestamp, in milliseconds.
	pub fn transaction_at(&self, time: u64) -> Transaction<'_> {
		Transaction::new(self, time)
	}

	/// Resolves a slot, evaluating it on first access.
	pub(crate) fn slot_value(&self, index: usize) -> Result<Value> {
		{
			let mut table = self.slots.borrow_mut();
			if table.sealed && index < self.config.field_count() {
				return Err(ConfigurationError::FieldSealed {
					name: self.config.slot(index).name().to_string(),
				}
				.into());
			}
			match table.status[index] {
				SlotStatus::Done => {
					if let Some(value) = &table.values[index] {
						return Ok(value.clone());
					}
				}
				SlotStatus::InProgress => {
					let mut path: Vec<String> =
						table.stack.iter().map(|&slot| self.config.slot(slot).name().to_string()).collect();
					path.push(self.config.slot(index).name().to_string());
					return Err(ConfigurationError::Cycle { path }.into());
				}
				SlotStatus::Unresolved => {}
			}
			if table.stack.len() >= MAX_SLOT_DEPTH {
				return Err(ConfigurationError::DepthExceeded {
					name: self.config.slot(index).name().to_string(),
					depth: MAX_SLOT_DEPTH,
				}
				.into());
			}
			table.status[index] = SlotStatus::InProgress;
			table.stack.push(index);
		}

		tracing::trace!(slot = self.config.slot(index).name(), "resolving slot");
		let result = self.compute_slot(index);

		let mut table = self.slots.borrow_mut();
		table.stack.pop();
		match result {
			Ok(value) => {
				table.values[index] = Some(value.clone());
				table.status[index] = SlotStatus::Done;
				Ok(value)
			}
			Err(err) => {
				table.status[index] = SlotStatus::Unresolved;
				Err(err)
			}
		}
	}

	fn compute_slot(&self, index: usize) -> Result<Value> {
		match self.config.slot(index) {
			Slot::Field(field) => field.init(self),
			Slot::Facet { facet, providers } => {
				let inputs = providers
					.iter()
					.map(|provider| match provider {
						Provider::Static(value) => Ok(value.clone()),
						Provider::Computed(get) => get(self),
					})
					.collect::<Result<Vec<_>>>()?;
				Ok(facet.combine(&inputs))
			}
		}
	}

	/// Marks the fields as being computed by a commit.
	pub(crate) fn seal_fields(&self) {
		self.slots.borrow_mut().sealed = true;
	}

	/// Stores the committed field values and lifts the seal.
	pub(crate) fn install_fields(&self, values: Vec<Value>) {
		let mut table = self.slots.borrow_mut();
		for (index, value) in values.into_iter().enumerate() {
			table.values[index] = Some(value);
			table.status[index] = SlotStatus::Done;
		}
		table.sealed = false;
	}

	#[cfg(test)]
	pub(crate) fn slot_status(&self, index: usize) -> SlotStatus {
		self.slots.borrow().status[index]
	}
}

impl fmt::Debug for EditorState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EditorState")
			.field("doc", &self.doc.to_string())
			.field("selection", &self.selection)
			.field("config", &self.config)
			.finish()
	}
}

/// Collapses the selection to its primary range unless the configuration
/// allows multiple ranges.
pub(crate) fn selection_policy(config: &Configuration, selection: Selection) -> Selection {
	if selection.len() > 1 && !config.static_facet(allow_multiple_selections()).unwrap_or(false) {
		tracing::debug!(ranges = selection.len(), "multiple selections disabled; keeping the primary range");
		return selection.as_single();
	}
	selection
}
