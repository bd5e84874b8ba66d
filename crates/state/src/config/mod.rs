//! Configuration resolution.
//!
//! A [`Configuration`] is the flattened, grouped and addressed form of an
//! [`Extension`] tree. It is resolved once and shared by every state derived
//! from it until a reconfiguration replaces it.
//!
//! # Addressing
//!
//! Fields always get a slot in the per-state value array, in flattening order.
//! Facets whose inputs are all plain values are combined right away and stored
//! in the configuration itself. Facets with at least one computed input get a
//! slot after the fields and are evaluated lazily by each state.

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use crate::error::ConfigurationError;
use crate::extension::{Extension, Precedence};
use crate::facet::{ErasedFacet, Facet, FacetId, FacetInput, Provider, Value};
use crate::field::{ErasedField, FieldId, FieldSpec};

#[cfg(test)]
mod tests;

/// Where a facet's value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Address {
	/// Index into the configuration's pre-combined values.
	Static(usize),
	/// Index into each state's slot array.
	Dynamic(usize),
}

/// A per-state slot and the rule that fills it.
pub(crate) enum Slot {
	Field(Arc<dyn ErasedField>),
	Facet {
		facet: Arc<dyn ErasedFacet>,
		providers: Vec<Provider>,
	},
}

impl Slot {
	pub(crate) fn name(&self) -> &str {
		match self {
			Slot::Field(field) => field.name(),
			Slot::Facet { facet, .. } => facet.name(),
		}
	}
}

/// The resolved configuration of one editor instance.
pub struct Configuration {
	fields: Vec<Arc<dyn ErasedField>>,
	field_addresses: HashMap<FieldId, usize>,
	facet_addresses: HashMap<FacetId, Address>,
	slots: Vec<Slot>,
	static_values: Vec<Value>,
}

/// A flattened extension leaf.
enum Flat {
	Input(FacetInput),
	Field(FieldSpec),
}

impl Configuration {
	/// Flattens, groups and addresses an extension tree.
	///
	/// # Errors
	///
	/// Fails if a field is installed twice or a static facet receives a
	/// computed input.
	pub fn resolve(extension: &Extension) -> Result<Arc<Self>, ConfigurationError> {
		let mut buckets: [Vec<Flat>; Precedence::COUNT] = Default::default();
		let mut seen = HashSet::default();
		flatten(extension, Precedence::Default, &mut buckets, &mut seen)?;

		let mut fields: Vec<Arc<dyn ErasedField>> = Vec::new();
		let mut groups: Vec<(Arc<dyn ErasedFacet>, Vec<Provider>)> = Vec::new();
		let mut group_index: HashMap<FacetId, usize> = HashMap::default();

		for item in buckets.into_iter().flatten() {
			match item {
				Flat::Field(spec) => fields.push(spec.field),
				Flat::Input(input) => {
					let id = input.facet.id();
					if let Some(&index) = group_index.get(&id) {
						groups[index].1.push(input.provider);
					} else {
						group_index.insert(id, groups.len());
						groups.push((input.facet, vec![input.provider]));
					}
				}
			}
		}

		let field_addresses = fields.iter().enumerate().map(|(index, field)| (field.id(), index)).collect();
		let mut slots: Vec<Slot> = fields.iter().cloned().map(Slot::Field).collect();
		let mut facet_addresses = HashMap::default();
		let mut static_values = Vec::new();

		for (facet, providers) in groups {
			if !providers.iter().any(Provider::is_computed) {
				let inputs: Vec<Value> = providers
					.iter()
					.filter_map(|provider| match provider {
						Provider::Static(value) => Some(value.clone()),
						Provider::Computed(_) => None,
					})
					.collect();
				facet_addresses.insert(facet.id(), Address::Static(static_values.len()));
				static_values.push(facet.combine(&inputs));
			} else if facet.is_static() {
				return Err(ConfigurationError::ComputedStaticFacet {
					name: facet.name().to_string(),
				});
			} else {
				facet_addresses.insert(facet.id(), Address::Dynamic(slots.len()));
				slots.push(Slot::Facet { facet, providers });
			}
		}

		tracing::debug!(
			fields = fields.len(),
			static_facets = static_values.len(),
			dynamic_facets = slots.len() - fields.len(),
			"resolved configuration",
		);

		Ok(Arc::new(Self {
			fields,
			field_addresses,
			facet_addresses,
			slots,
			static_values,
		}))
	}

	/// Returns the number of installed fields.
	pub fn field_count(&self) -> usize {
		self.fields.len()
	}

	/// Returns the number of per-state slots (fields plus dynamic facets).
	pub fn slot_count(&self) -> usize {
		self.slots.len()
	}

	/// Returns the field names in commit order.
	pub fn field_names(&self) -> impl Iterator<Item = &str> {
		self.fields.iter().map(|field| field.name())
	}

	/// Returns true if the facet has at least one input.
	pub fn contains_facet(&self, id: FacetId) -> bool {
		self.facet_addresses.contains_key(&id)
	}

	/// Returns true if the facet's value is recomputed for every state.
	pub fn is_dynamic(&self, id: FacetId) -> bool {
		matches!(self.facet_addresses.get(&id), Some(Address::Dynamic(_)))
	}

	/// Reads a facet that can be evaluated without a state.
	///
	/// Returns `None` when the facet has computed inputs.
	pub fn static_facet<I, O>(&self, facet: &Facet<I, O>) -> Option<O>
	where
		I: Clone + Send + Sync + 'static,
		O: Clone + Send + Sync + 'static,
	{
		match self.facet_addresses.get(&facet.id()) {
			None => Some(facet.default_value()),
			Some(Address::Static(index)) => self.static_values[*index].downcast_ref::<O>().cloned(),
			Some(Address::Dynamic(_)) => None,
		}
	}

	pub(crate) fn fields(&self) -> &[Arc<dyn ErasedField>] {
		&self.fields
	}

	pub(crate) fn field_address(&self, id: FieldId) -> Option<usize> {
		self.field_addresses.get(&id).copied()
	}

	pub(crate) fn facet_address(&self, id: FacetId) -> Option<Address> {
		self.facet_addresses.get(&id).copied()
	}

	pub(crate) fn static_value(&self, index: usize) -> &Value {
		&self.static_values[index]
	}

	pub(crate) fn slot(&self, index: usize) -> &Slot {
		&self.slots[index]
	}
}

impl fmt::Debug for Configuration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Configuration")
			.field("slots", &self.slots.iter().map(Slot::name).collect::<Vec<_>>())
			.field("static_values", &self.static_values.len())
			.finish()
	}
}

/// Depth-first flattening into precedence buckets.
fn flatten(
	extension: &Extension,
	prec: Precedence,
	buckets: &mut [Vec<Flat>; Precedence::COUNT],
	seen: &mut HashSet<FieldId>,
) -> Result<(), ConfigurationError> {
	match extension {
		Extension::Leaf(input) => buckets[prec.bucket()].push(Flat::Input(input.clone())),
		Extension::Field(spec) => {
			if !seen.insert(spec.field_id()) {
				return Err(ConfigurationError::DuplicateField {
					name: spec.field.name().to_string(),
				});
			}
			buckets[prec.bucket()].push(Flat::Field(spec.clone()));
		}
		Extension::Group(extensions) => {
			for extension in extensions {
				flatten(extension, prec, buckets, seen)?;
			}
		}
		Extension::Prec(inner_prec, inner) => flatten(inner, *inner_prec, buckets, seen)?,
	}
	Ok(())
}
