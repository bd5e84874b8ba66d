//! Extension trees supplied when a state is created.

use crate::facet::FacetInput;
use crate::field::FieldSpec;

/// Precedence bucket for a group of extensions.
///
/// Flattening keeps every contribution in its bucket, orders buckets from
/// `Highest` to `Lowest`, and keeps depth-first order inside a bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
	/// Ahead of everything else.
	Highest,
	/// Ahead of default contributions.
	High,
	/// The bucket used when no precedence is given.
	#[default]
	Default,
	/// Behind default contributions.
	Low,
	/// Behind everything else.
	Lowest,
}

impl Precedence {
	/// Number of precedence buckets.
	pub(crate) const COUNT: usize = 5;

	pub(crate) fn bucket(self) -> usize {
		self as usize
	}

	/// Wraps `extension` so that everything inside it uses this precedence,
	/// unless a nested wrapper says otherwise.
	pub fn wrap(self, extension: impl Into<Extension>) -> Extension {
		Extension::Prec(self, Box::new(extension.into()))
	}
}

/// A composable contribution to a configuration.
///
/// Earlier entries of a group outrank later ones, and an entry outranks
/// whatever follows its enclosing group.
#[derive(Debug, Clone)]
pub enum Extension {
	/// One input to a facet.
	Leaf(FacetInput),
	/// Installs a state field.
	Field(FieldSpec),
	/// An ordered list of extensions.
	Group(Vec<Extension>),
	/// A subtree with an explicit precedence.
	Prec(Precedence, Box<Extension>),
}

impl Extension {
	/// An extension that contributes nothing.
	pub fn none() -> Self {
		Extension::Group(Vec::new())
	}

	/// Groups extensions in precedence order.
	pub fn group(extensions: impl IntoIterator<Item = Extension>) -> Self {
		Extension::Group(extensions.into_iter().collect())
	}
}

impl Default for Extension {
	fn default() -> Self {
		Self::none()
	}
}

impl From<Vec<Extension>> for Extension {
	fn from(extensions: Vec<Extension>) -> Self {
		Extension::Group(extensions)
	}
}

impl FromIterator<Extension> for Extension {
	fn from_iter<I: IntoIterator<Item = Extension>>(iter: I) -> Self {
		Extension::group(iter)
	}
}
