//! State fields: slots with their own init and apply rules.

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, StateError};
use crate::extension::Extension;
use crate::facet::{Value, next_id};
use crate::state::EditorState;
use crate::transaction::Transaction;

/// Unique identity of a state field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u64);

type Init<T> = Box<dyn Fn(&EditorState) -> Result<T> + Send + Sync>;
type Apply<T> = Box<dyn Fn(&Transaction<'_>, &T, &EditorState) -> Result<T> + Send + Sync>;

struct FieldInner<T> {
	id: FieldId,
	name: String,
	init: Init<T>,
	apply: Apply<T>,
}

/// A slot holding a value of type `T` in every state.
///
/// `init` produces the value for a freshly created (or reconfigured) state.
/// `apply` runs on every committed transaction with the previous value and
/// the state being created, and returns the next value.
///
/// While `apply` runs, the fields of the new state are sealed: read other
/// fields' previous values through [`Transaction::start_state`].
pub struct StateField<T> {
	inner: Arc<FieldInner<T>>,
}

impl<T> Clone for StateField<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<T> fmt::Debug for StateField<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StateField")
			.field("id", &self.inner.id)
			.field("name", &self.inner.name)
			.finish()
	}
}

impl<T> StateField<T>
where
	T: Clone + Send + Sync + 'static,
{
	/// Defines a new field.
	pub fn define(
		name: impl Into<String>,
		init: impl Fn(&EditorState) -> Result<T> + Send + Sync + 'static,
		apply: impl Fn(&Transaction<'_>, &T, &EditorState) -> Result<T> + Send + Sync + 'static,
	) -> Self {
		Self {
			inner: Arc::new(FieldInner {
				id: FieldId(next_id()),
				name: name.into(),
				init: Box::new(init),
				apply: Box::new(apply),
			}),
		}
	}

	/// Returns this field's identity.
	pub fn id(&self) -> FieldId {
		self.inner.id
	}

	/// Returns the field's name.
	pub fn name(&self) -> &str {
		&self.inner.name
	}

	/// Wraps this field as an extension that installs it.
	pub fn extension(&self) -> Extension {
		Extension::Field(FieldSpec {
			field: self.inner.clone(),
		})
	}
}

impl<T> From<&StateField<T>> for Extension
where
	T: Clone + Send + Sync + 'static,
{
	fn from(field: &StateField<T>) -> Self {
		field.extension()
	}
}

/// Field operations the resolver and commit path need without knowing `T`.
pub(crate) trait ErasedField: Send + Sync {
	fn id(&self) -> FieldId;
	fn name(&self) -> &str;
	fn init(&self, state: &EditorState) -> Result<Value>;
	fn apply(&self, tr: &Transaction<'_>, old: &Value, state: &EditorState) -> Result<Value>;
}

impl<T> ErasedField for FieldInner<T>
where
	T: Clone + Send + Sync + 'static,
{
	fn id(&self) -> FieldId {
		self.id
	}

	fn name(&self) -> &str {
		&self.name
	}

	fn init(&self, state: &EditorState) -> Result<Value> {
		Ok(Arc::new((self.init)(state)?) as Value)
	}

	fn apply(&self, tr: &Transaction<'_>, old: &Value, state: &EditorState) -> Result<Value> {
		let old = old.downcast_ref::<T>().ok_or_else(|| StateError::Lookup {
			name: self.name.clone(),
		})?;
		Ok(Arc::new((self.apply)(tr, old, state)?) as Value)
	}
}

/// A field installation, as carried by an [`Extension`].
#[derive(Clone)]
pub struct FieldSpec {
	pub(crate) field: Arc<dyn ErasedField>,
}

impl FieldSpec {
	/// Returns the identity of the installed field.
	pub fn field_id(&self) -> FieldId {
		self.field.id()
	}
}

impl fmt::Debug for FieldSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("FieldSpec").field(&self.field.name()).finish()
	}
}
