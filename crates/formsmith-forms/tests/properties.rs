//! Property tests for the path codec, collection renumbering and output markers

use formsmith_forms::collection::CollectionState;
use formsmith_forms::path::{extract, flatten, reconstruct, tokenize};
use formsmith_forms::renderer::wrap_with_markers;
use proptest::prelude::*;
use rstest::rstest;
use serde_json::{Map, Value, json};

fn leaf() -> impl Strategy<Value = Value> {
	"[a-zA-Z ]{1,8}".prop_map(Value::String)
}

fn node() -> impl Strategy<Value = Value> {
	leaf().prop_recursive(3, 24, 4, |inner| {
		prop_oneof![
			prop::collection::vec(inner.clone(), 1..4).prop_map(Value::Array),
			prop::collection::btree_map("[a-z_]{1,6}", inner, 1..4)
				.prop_map(|map| Value::Object(map.into_iter().collect())),
		]
	})
}

fn tree() -> impl Strategy<Value = Map<String, Value>> {
	prop::collection::btree_map("[a-z_]{1,6}", node(), 1..5).prop_map(|map| map.into_iter().collect())
}

proptest! {
	/// Test: flattening a nested tree and extracting it again is lossless
	/// Category: Property
	#[rstest]
	fn prop_flatten_extract_round_trip(original in tree()) {
		let rebuilt = extract(flatten(&original), false);
		prop_assert_eq!(Value::Object(rebuilt), Value::Object(original));
	}

	/// Test: tokens survive reconstruct and re-tokenize unchanged
	/// Category: Property
	#[rstest]
	fn prop_tokenize_reconstruct_idempotent(key in "[a-z0-9_.\\[\\]]{0,24}") {
		let tokens = tokenize(&key);
		prop_assert_eq!(tokenize(&reconstruct(&tokens)), tokens);
	}

	/// Test: removing any item leaves indices contiguous from zero
	/// Category: Property
	#[rstest]
	fn prop_remove_keeps_indices_contiguous(count in 1usize..12, pick in 0usize..12) {
		let index = pick % count;
		let items: Vec<Value> = (0..count).map(|i| json!({"id": i.to_string()})).collect();
		let mut state = CollectionState::from_submission("pets", Some(&Value::Array(items)), 0, 12).unwrap();

		state.remove(index).unwrap();

		let flat = state.to_flat();
		prop_assert_eq!(flat.len(), count - 1);
		for (position, (key, value)) in flat.iter().enumerate() {
			prop_assert_eq!(key, &format!("pets[{}].id", position));
			let original = if position < index { position } else { position + 1 };
			prop_assert_eq!(value, &original.to_string());
		}
	}

	/// Test: wrapping twice gives the same output as wrapping once
	/// Category: Property
	#[rstest]
	fn prop_markers_idempotent(html in "(?s).{0,40}") {
		let once = wrap_with_markers(&html, true);
		prop_assert_eq!(wrap_with_markers(&once, true), once.clone());
		prop_assert!(once.starts_with("<!-- Start formsmith -->\n"));
		prop_assert!(once.ends_with("\n<!-- End formsmith -->"));
	}
}

#[rstest]
fn test_sparse_arrays_round_trip_modulo_nulls() {
	let Value::Object(sparse) = json!({"tags": [null, "b"]}) else {
		unreachable!()
	};
	let flat = flatten(&sparse);
	assert_eq!(flat, vec![("tags[1]".to_string(), "b".to_string())]);
	assert_eq!(Value::Object(extract(flat, false)), json!({"tags": [null, "b"]}));
}
