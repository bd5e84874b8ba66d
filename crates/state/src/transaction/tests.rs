use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tessera_primitives::Range;

use super::*;
use crate::{ConfigurationError, EditorStateConfig, Facet, StateError, StateField, allow_multiple_selections};

fn state_with(doc: &str, selection: Option<Selection>, extensions: Extension) -> EditorState {
	EditorState::create(EditorStateConfig {
		doc: Some(doc.to_string()),
		selection,
		extensions,
	})
	.unwrap()
}

fn cursors(positions: &[usize]) -> Selection {
	Selection::from_vec(positions.iter().map(|&p| Range::point(p)).collect(), 0)
}

#[test]
fn test_replace_maps_selection() {
	let state = state_with("hello", Some(Selection::point(5)), Extension::none());
	let tr = state.transaction().replace(0, 5, "hi");
	assert_eq!(tr.doc().to_string(), "hi");
	assert_eq!(tr.selection(), &Selection::point(2));
	assert!(!tr.selection_set());

	let next = tr.apply().unwrap();
	assert_eq!(next.doc().to_string(), "hi");
	assert_eq!(next.selection(), &Selection::point(2));
	assert_eq!(state.doc().to_string(), "hello");
}

#[test]
fn test_noop_change_is_elided() {
	let state = state_with("abc", None, Extension::none());
	let tr = state.transaction().replace(1, 1, "");
	assert!(!tr.doc_changed());
	assert!(tr.docs().is_empty());
	assert_eq!(tr.doc(), state.doc());
}

#[test]
fn test_docs_track_each_change() {
	let state = state_with("abc", None, Extension::none());
	let tr = state.transaction().replace(0, 1, "x").replace(3, 3, "!");
	let docs: Vec<String> = tr.docs().iter().map(ToString::to_string).collect();
	assert_eq!(docs, vec!["xbc", "xbc!"]);
	assert_eq!(tr.changes().len(), 2);
}

#[test]
fn test_reduce_ranges_sees_shifted_positions() {
	let ext = allow_multiple_selections().of(true);
	let state = state_with("abcdef", Some(cursors(&[0, 3])), ext);

	let mut seen = Vec::new();
	let tr = state.transaction().reduce_ranges(|tr, range| {
		seen.push(range.from());
		let tr = tr.replace(range.from(), range.to(), "X");
		(tr, Range::point(range.from() + 1))
	});

	assert_eq!(seen, vec![0, 4]);
	assert_eq!(tr.doc().to_string(), "XabcXdef");
	assert_eq!(tr.selection(), &cursors(&[1, 5]));
	assert!(tr.selection_set());
}

#[test]
fn test_replace_selection() {
	let ext = allow_multiple_selections().of(true);
	let sel = Selection::from_vec(vec![Range::new(0, 2), Range::new(4, 6)], 1);
	let state = state_with("abcdef", Some(sel), ext);

	let next = state.transaction().replace_selection("--").apply().unwrap();
	assert_eq!(next.doc().to_string(), "--cd--");
	assert_eq!(next.selection(), &Selection::from_vec(vec![Range::point(2), Range::point(6)], 1));
}

#[test]
fn test_set_selection_raises_flag() {
	let state = state_with("abc", None, Extension::none());
	let tr = state.transaction().set_selection(Selection::single(1, 3));
	assert!(tr.selection_set());
	assert_eq!(tr.flags(), TransactionFlags::SELECTION_SET);
	assert_eq!(tr.apply().unwrap().selection(), &Selection::single(1, 3));
}

#[test]
fn test_out_of_bounds_selection_fails_on_apply() {
	let state = state_with("abc", None, Extension::none());
	let err = state.transaction().set_selection(Selection::point(9)).apply().unwrap_err();
	assert_eq!(err, StateError::Range { from: 9, to: 9, len: 3 });
}

#[test]
fn test_meta_is_copy_on_write() {
	const ORIGIN: MetaSlot<&'static str> = MetaSlot::define("origin");
	let state = state_with("", None, Extension::none());

	let base = state.transaction_at(42).set_meta(ORIGIN, "input");
	let branch = base.clone().set_meta(ORIGIN, "paste").set_meta(meta::ADD_TO_HISTORY, false);

	assert_eq!(base.get_meta(ORIGIN), Some("input"));
	assert_eq!(base.get_meta(meta::ADD_TO_HISTORY), None);
	assert_eq!(branch.get_meta(ORIGIN), Some("paste"));
	assert_eq!(branch.get_meta(meta::ADD_TO_HISTORY), Some(false));
	assert_eq!(branch.get_meta(meta::REBASED), None);
	assert_eq!(branch.time(), 42);
}

#[test]
fn test_transaction_is_stamped() {
	let state = state_with("", None, Extension::none());
	let tr = state.transaction();
	assert!(tr.time() > 0);
	assert_eq!(tr.get_meta(meta::TIME), Some(tr.time()));
}

#[test]
fn test_scroll_into_view_flag() {
	let state = state_with("", None, Extension::none());
	let tr = state.transaction().scroll_into_view();
	assert!(tr.scrolled_into_view());
	assert!(!tr.selection_set());
}

#[test]
fn test_empty_transaction_still_runs_field_apply() {
	let applies = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&applies);
	let field = StateField::define(
		"applies",
		|_| Ok(0usize),
		move |_, value, _| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(value + 1)
		},
	);
	let state = state_with("same", Some(Selection::single(1, 3)), field.extension());

	let next = state.transaction().apply().unwrap();
	assert_eq!(next.doc(), state.doc());
	assert_eq!(next.selection(), state.selection());
	assert_eq!(next.field(&field), Ok(1));
	assert_eq!(applies.load(Ordering::SeqCst), 1);
	assert_eq!(state.field(&field), Ok(0));
}

#[test]
fn test_field_apply_sees_transaction_and_new_state() {
	let field = StateField::define(
		"history",
		|state| Ok(vec![state.doc().to_string()]),
		|tr, history: &Vec<String>, state| {
			let mut history = history.clone();
			assert_eq!(tr.doc(), state.doc());
			history.push(state.doc().to_string());
			Ok(history)
		},
	);
	let state = state_with("a", None, field.extension());
	let next = state.transaction().replace(1, 1, "b").apply().unwrap();
	let last = next.transaction().replace(2, 2, "c").apply().unwrap();
	assert_eq!(last.field(&field), Ok(vec!["a".to_string(), "ab".to_string(), "abc".to_string()]));
}

#[test]
fn test_fields_cannot_read_new_values_during_commit() {
	let first = StateField::define("first", |_| Ok(1u32), |_, v, _| Ok(v + 1));
	let first_ref = first.clone();
	let second = StateField::define(
		"second",
		|_| Ok(0u32),
		move |tr, _, state| {
			// The previous value is available through the start state.
			let old = tr.start_state().field(&first_ref)?;
			// The new one is not.
			assert_eq!(
				state.field(&first_ref),
				Err(StateError::Configuration(ConfigurationError::FieldSealed {
					name: "first".to_string()
				}))
			);
			Ok(old * 10)
		},
	);
	let state = state_with("", None, Extension::group([first.extension(), second.extension()]));
	let next = state.transaction().apply().unwrap();
	assert_eq!(next.field(&first), Ok(2));
	assert_eq!(next.field(&second), Ok(10));
}

#[test]
fn test_field_apply_can_read_facets_of_new_state() {
	let len: Facet<usize> = Facet::define("len", |inputs: &[usize]| inputs.iter().sum());
	let len_ref = len.clone();
	let field = StateField::define(
		"max_len",
		|_| Ok(0usize),
		move |_, best, state| Ok((*best).max(state.facet(&len_ref)?)),
	);
	let ext = Extension::group([len.compute(|state| Ok(state.doc().len())), field.extension()]);
	let state = state_with("abc", None, ext);

	let grown = state.transaction().replace(3, 3, "def").apply().unwrap();
	let shrunk = grown.transaction().replace(0, 6, "").apply().unwrap();
	assert_eq!(grown.field(&field), Ok(6));
	assert_eq!(shrunk.field(&field), Ok(6));
	assert_eq!(shrunk.facet(&len), Ok(0));
}

#[test]
fn test_failed_apply_leaves_start_state_usable() {
	let field = StateField::define(
		"picky",
		|_| Ok(0u8),
		|tr, v, _| {
			if tr.doc().to_string().contains('!') {
				Err(StateError::Lookup { name: "no bangs".into() })
			} else {
				Ok(*v)
			}
		},
	);
	let state = state_with("ok", None, field.extension());
	assert!(state.transaction().replace(2, 2, "!").apply().is_err());
	assert_eq!(state.field(&field), Ok(0));
	assert!(state.transaction().replace(2, 2, "?").apply().is_ok());
}

#[test]
fn test_multiple_selections_collapse_on_apply() {
	let state = state_with("abcdef", None, Extension::none());
	let next = state
		.transaction()
		.set_selection(Selection::from_vec(vec![Range::point(1), Range::point(4)], 1))
		.apply()
		.unwrap();
	assert_eq!(next.selection(), &Selection::point(4));
}

#[test]
fn test_reconfigure_reinitializes_fields() {
	let field = StateField::define("count", |_| Ok(0u32), |_, v, _| Ok(v + 1));
	let extra = StateField::define("extra", |state| Ok(state.doc().len()), |_, v, _| Ok(*v));
	let state = state_with("abc", None, field.extension());
	let bumped = state.transaction().apply().unwrap().transaction().apply().unwrap();
	assert_eq!(bumped.field(&field), Ok(2));

	let reconfigured = bumped
		.transaction()
		.replace(0, 0, "x")
		.reconfigure(Extension::group([field.extension(), extra.extension()]))
		.apply()
		.unwrap();
	assert_eq!(reconfigured.doc().to_string(), "xabc");
	assert_eq!(reconfigured.field(&field), Ok(0));
	assert_eq!(reconfigured.field(&extra), Ok(4));
	assert!(!Arc::ptr_eq(reconfigured.config(), bumped.config()));
}

#[test]
fn test_reconfigure_with_duplicate_field_fails() {
	let field = StateField::define("count", |_| Ok(0u32), |_, v, _| Ok(v + 1));
	let state = state_with("", None, field.extension());
	let err = state
		.transaction()
		.reconfigure(Extension::group([field.extension(), field.extension()]))
		.apply()
		.unwrap_err();
	assert!(matches!(err, StateError::Configuration(ConfigurationError::DuplicateField { .. })));
}

proptest! {
	/// The final document equals the start document with every change applied
	/// in order, and the selection always fits it.
	#[test]
	fn prop_transaction_doc_matches_changeset(
		doc in "[a-z]{0,40}",
		edits in prop::collection::vec((0usize..100, 0usize..5, "[A-Z]{0,4}"), 0..6),
	) {
		let state = state_with(&doc, Some(Selection::point(doc.len())), Extension::none());
		let mut tr = state.transaction();
		for (at, del, text) in edits {
			let len = tr.doc().len();
			let from = at % (len + 1);
			let to = (from + del).min(len);
			tr = tr.replace(from, to, text);
		}
		prop_assert_eq!(&tr.changes().apply(state.doc()), tr.doc());
		prop_assert!(tr.selection().is_in_bounds(tr.doc().len()));

		let undo = tr.changes().invert(&std::iter::once(state.doc().clone()).chain(tr.docs().iter().cloned()).collect::<Vec<_>>());
		prop_assert_eq!(&undo.apply(tr.doc()), state.doc());

		let next = tr.apply().unwrap();
		prop_assert!(next.selection().is_in_bounds(next.doc().len()));
	}
}
