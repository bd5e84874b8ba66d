use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::{EditorState, Facet, StateField};

fn list_facet(name: &str) -> Facet<&'static str, Vec<&'static str>> {
	Facet::define(name, |inputs: &[&'static str]| inputs.to_vec())
}

fn counter(name: &str) -> StateField<u32> {
	StateField::define(name, |_| Ok(0), |_, value, _| Ok(value + 1))
}

#[test]
fn test_flatten_keeps_depth_first_order() {
	let facet = list_facet("order");
	let ext = Extension::group([
		facet.of("a"),
		Extension::group([facet.of("b"), Extension::group([facet.of("c")])]),
		facet.of("d"),
	]);
	let config = Configuration::resolve(&ext).unwrap();
	assert_eq!(config.static_facet(&facet), Some(vec!["a", "b", "c", "d"]));
}

#[test]
fn test_precedence_buckets() {
	let facet = list_facet("prec");
	let ext = Extension::group([
		facet.of("default-1"),
		Precedence::Low.wrap(facet.of("low")),
		Precedence::Highest.wrap(vec![facet.of("highest-1"), Precedence::Lowest.wrap(facet.of("lowest"))]),
		facet.of("default-2"),
		Precedence::Highest.wrap(facet.of("highest-2")),
	]);
	let config = Configuration::resolve(&ext).unwrap();
	assert_eq!(
		config.static_facet(&facet),
		Some(vec!["highest-1", "highest-2", "default-1", "default-2", "low", "lowest"])
	);
}

#[test]
fn test_duplicate_field_is_rejected() {
	let field = counter("twice");
	let ext = Extension::group([field.extension(), Extension::group([field.extension()])]);
	let err = Configuration::resolve(&ext).unwrap_err();
	assert_eq!(
		err,
		ConfigurationError::DuplicateField {
			name: "twice".to_string()
		}
	);
}

#[test]
fn test_distinct_fields_with_same_name_are_allowed() {
	let ext = Extension::group([counter("same").extension(), counter("same").extension()]);
	let config = Configuration::resolve(&ext).unwrap();
	assert_eq!(config.field_count(), 2);
}

#[test]
fn test_static_facet_rejects_computed_input() {
	let facet: Facet<usize> = Facet::define_static("static", |inputs: &[usize]| inputs.iter().sum());
	let ext = facet.compute(|state| Ok(state.doc().len()));
	let err = Configuration::resolve(&ext).unwrap_err();
	assert_eq!(
		err,
		ConfigurationError::ComputedStaticFacet {
			name: "static".to_string()
		}
	);
}

#[test]
fn test_addressing() {
	let plain = list_facet("plain");
	let dynamic: Facet<usize> = Facet::define("dynamic", |inputs: &[usize]| inputs.iter().sum());
	let a = counter("a");
	let b = counter("b");
	let ext = Extension::group([
		plain.of("x"),
		dynamic.of(1),
		a.extension(),
		dynamic.compute(|state| Ok(state.doc().len())),
		b.extension(),
	]);
	let config = Configuration::resolve(&ext).unwrap();

	assert_eq!(config.field_names().collect::<Vec<_>>(), vec!["a", "b"]);
	assert_eq!(config.field_address(a.id()), Some(0));
	assert_eq!(config.field_address(b.id()), Some(1));
	assert_eq!(config.facet_address(plain.id()), Some(Address::Static(0)));
	assert_eq!(config.facet_address(dynamic.id()), Some(Address::Dynamic(2)));
	assert_eq!(config.slot_count(), 3);
	assert!(config.is_dynamic(dynamic.id()));
	assert!(!config.is_dynamic(plain.id()));
	assert_eq!(config.static_facet(&dynamic), None);
}

#[test]
fn test_absent_facet_reads_as_empty_combination() {
	let facet = list_facet("absent");
	let config = Configuration::resolve(&Extension::none()).unwrap();
	assert!(!config.contains_facet(facet.id()));
	assert_eq!(config.static_facet(&facet), Some(Vec::new()));
}

#[test]
fn test_foreign_facets_pass_through() {
	// A facet only a view collaborator reads is resolved like any other.
	let view_only: Facet<String, Option<String>> =
		Facet::define_static("theme", |inputs: &[String]| inputs.first().cloned());
	let field = counter("field");
	let ext = Extension::group([view_only.of("dark".into()), field.extension()]);
	let config = Configuration::resolve(&ext).unwrap();
	assert_eq!(config.field_count(), 1);
	assert_eq!(config.static_facet(&view_only), Some(Some("dark".to_string())));
}

#[test]
fn test_configuration_is_shared_by_derived_states() {
	let field = counter("shared");
	let state = EditorState::create(crate::EditorStateConfig {
		extensions: field.extension(),
		..Default::default()
	})
	.unwrap();
	let next = state.transaction().replace(0, 0, "x").apply().unwrap();
	assert!(Arc::ptr_eq(state.config(), next.config()));
}
