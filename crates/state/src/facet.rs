//! Facets: typed extension points that combine many inputs into one value.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use crate::error::Result;
use crate::extension::Extension;
use crate::state::EditorState;

/// Type-erased slot value.
pub(crate) type Value = Arc<dyn Any + Send + Sync>;

/// Counter shared by facet and field identities.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_id() -> u64 {
	NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Unique identity of a facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FacetId(u64);

type Combine<I, O> = Box<dyn Fn(&[I]) -> O + Send + Sync>;
type Compute = Arc<dyn Fn(&EditorState) -> Result<Value> + Send + Sync>;

struct FacetInner<I, O> {
	id: FacetId,
	name: String,
	is_static: bool,
	combine: Combine<I, O>,
}

/// A named extension point.
///
/// Any number of extensions may provide an input of type `I`; the facet's
/// combine rule reduces them, highest precedence first, into a single `O`.
/// A facet that never receives an input reads as its combine rule applied to
/// an empty slice.
///
/// Static facets only accept plain values and are combined once, when the
/// configuration is resolved. Other facets may also take inputs computed from
/// the state, which are recomputed for every new state.
pub struct Facet<I, O = I> {
	inner: Arc<FacetInner<I, O>>,
}

impl<I, O> Clone for Facet<I, O> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<I, O> fmt::Debug for Facet<I, O> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Facet")
			.field("id", &self.inner.id)
			.field("name", &self.inner.name)
			.field("static", &self.inner.is_static)
			.finish()
	}
}

impl<I, O> Facet<I, O>
where
	I: Clone + Send + Sync + 'static,
	O: Clone + Send + Sync + 'static,
{
	/// Defines a facet whose inputs may be computed from the state.
	pub fn define(name: impl Into<String>, combine: impl Fn(&[I]) -> O + Send + Sync + 'static) -> Self {
		Self::new(name.into(), false, Box::new(combine))
	}

	/// Defines a facet that only accepts plain values.
	pub fn define_static(name: impl Into<String>, combine: impl Fn(&[I]) -> O + Send + Sync + 'static) -> Self {
		Self::new(name.into(), true, Box::new(combine))
	}

	fn new(name: String, is_static: bool, combine: Combine<I, O>) -> Self {
		Self {
			inner: Arc::new(FacetInner {
				id: FacetId(next_id()),
				name,
				is_static,
				combine,
			}),
		}
	}

	/// Returns this facet's identity.
	pub fn id(&self) -> FacetId {
		self.inner.id
	}

	/// Returns the facet's name.
	pub fn name(&self) -> &str {
		&self.inner.name
	}

	/// Returns true if the facet only accepts plain values.
	pub fn is_static(&self) -> bool {
		self.inner.is_static
	}

	/// Provides a plain input value.
	pub fn of(&self, value: I) -> Extension {
		Extension::Leaf(FacetInput {
			facet: self.erased(),
			provider: Provider::Static(Arc::new(value)),
		})
	}

	/// Provides an input computed from the state it is read from.
	///
	/// The closure may read other facets and fields through the state.
	pub fn compute(&self, get: impl Fn(&EditorState) -> Result<I> + Send + Sync + 'static) -> Extension {
		Extension::Leaf(FacetInput {
			facet: self.erased(),
			provider: Provider::Computed(Arc::new(move |state: &EditorState| -> Result<Value> {
				Ok(Arc::new(get(state)?) as Value)
			})),
		})
	}

	/// Combines an empty input list.
	pub fn default_value(&self) -> O {
		(self.inner.combine)(&[])
	}

	fn erased(&self) -> Arc<dyn ErasedFacet> {
		self.inner.clone()
	}
}

/// Facet operations the resolver needs without knowing `I` and `O`.
pub(crate) trait ErasedFacet: Send + Sync {
	fn id(&self) -> FacetId;
	fn name(&self) -> &str;
	fn is_static(&self) -> bool;
	fn combine(&self, inputs: &[Value]) -> Value;
}

impl<I, O> ErasedFacet for FacetInner<I, O>
where
	I: Clone + Send + Sync + 'static,
	O: Clone + Send + Sync + 'static,
{
	fn id(&self) -> FacetId {
		self.id
	}

	fn name(&self) -> &str {
		&self.name
	}

	fn is_static(&self) -> bool {
		self.is_static
	}

	fn combine(&self, inputs: &[Value]) -> Value {
		// Inputs are only ever created through `Facet::of`/`Facet::compute`,
		// so every value has type `I`.
		let inputs: Vec<I> = inputs.iter().filter_map(|v| v.downcast_ref::<I>().cloned()).collect();
		Arc::new((self.combine)(&inputs))
	}
}

/// Where a facet input comes from.
#[derive(Clone)]
pub(crate) enum Provider {
	Static(Value),
	Computed(Compute),
}

impl Provider {
	pub(crate) fn is_computed(&self) -> bool {
		matches!(self, Provider::Computed(_))
	}
}

/// One input to a facet, as carried by an [`Extension`].
#[derive(Clone)]
pub struct FacetInput {
	pub(crate) facet: Arc<dyn ErasedFacet>,
	pub(crate) provider: Provider,
}

impl fmt::Debug for FacetInput {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FacetInput")
			.field("facet", &self.facet.name())
			.field("computed", &self.provider.is_computed())
			.finish()
	}
}

static LINE_SEPARATOR: LazyLock<Facet<String, Option<String>>> =
	LazyLock::new(|| Facet::define_static("line_separator", |inputs: &[String]| inputs.first().cloned()));

static ALLOW_MULTIPLE_SELECTIONS: LazyLock<Facet<bool>> = LazyLock::new(|| {
	Facet::define_static("allow_multiple_selections", |inputs: &[bool]| inputs.iter().any(|&on| on))
});

/// The line separator used to split and join documents.
///
/// The highest-precedence input wins. Without one, any of `\r\n`, `\r` and
/// `\n` splits lines and `\n` joins them.
pub fn line_separator() -> &'static Facet<String, Option<String>> {
	&LINE_SEPARATOR
}

/// Whether a selection may hold more than one range. Off unless some
/// extension enables it.
pub fn allow_multiple_selections() -> &'static Facet<bool> {
	&ALLOW_MULTIPLE_SELECTIONS
}

/// Downcasts a slot value to a concrete type.
pub(crate) fn downcast<T: Clone + 'static>(value: &Value, name: &str) -> Result<T> {
	value.downcast_ref::<T>().cloned().ok_or_else(|| crate::error::StateError::Lookup {
		name: name.to_string(),
	})
}
