//! Path codec
//!
//! Converts between flat form submissions and nested JSON. A flat key such as
//! `pets[0].name` is split into tokens (`pets`, `0`, `name`) and assigned into a
//! tree of objects and arrays; [`flatten`] goes the other way.
//!
//! Index digits too large for `usize` are kept as a name token. Indexes above
//! [`MAX_INDEX`] are rejected at assignment.

use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

/// Largest array index [`assign`] will pad up to
pub const MAX_INDEX: usize = 10_000;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([^\.\[\]]+)|\[(\d+)\]").unwrap());

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathToken {
	Name(String),
	Index(usize),
}

impl fmt::Display for PathToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PathToken::Name(name) => f.write_str(name),
			PathToken::Index(index) => write!(f, "[{}]", index),
		}
	}
}

/// Why an assignment could not be applied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignError {
	#[error("path is empty")]
	EmptyPath,

	#[error("path '{0}' starts with an index")]
	LeadingIndex(String),

	#[error("path '{path}' conflicts with an existing {existing} value")]
	Conflict { path: String, existing: &'static str },

	#[error("path '{path}' uses index {index}, above the limit of {max}")]
	IndexTooLarge { path: String, index: usize, max: usize },
}

enum StepError {
	Conflict(&'static str),
	IndexTooLarge(usize),
}

/// Split a flat key into tokens. Characters that are neither part of a name nor
/// a well-formed `[digits]` index are skipped.
///
/// # Examples
///
/// ```
/// use formsmith_forms::path::{PathToken, tokenize};
///
/// assert_eq!(
///     tokenize("pets[0].name"),
///     vec![
///         PathToken::Name("pets".into()),
///         PathToken::Index(0),
///         PathToken::Name("name".into()),
///     ]
/// );
/// assert!(tokenize("[]").is_empty());
/// ```
pub fn tokenize(key: &str) -> Vec<PathToken> {
	TOKEN
		.captures_iter(key)
		.filter_map(|caps| {
			if let Some(name) = caps.get(1) {
				return Some(PathToken::Name(name.as_str().to_string()));
			}
			caps.get(2).map(|digits| match digits.as_str().parse::<usize>() {
				Ok(index) => PathToken::Index(index),
				Err(_) => PathToken::Name(digits.as_str().to_string()),
			})
		})
		.collect()
}

/// Tokens of a key usable as an assignment path: non-empty and starting with a name.
pub fn parse_path(key: &str) -> Option<Vec<PathToken>> {
	let tokens = tokenize(key);
	match tokens.first() {
		Some(PathToken::Name(_)) => Some(tokens),
		_ => None,
	}
}

/// Rebuild the canonical flat key for a token list
///
/// # Examples
///
/// ```
/// use formsmith_forms::path::{reconstruct, tokenize};
///
/// assert_eq!(reconstruct(&tokenize("pets.0.name")), "pets.0.name");
/// assert_eq!(reconstruct(&tokenize("pets[0].tags[2]")), "pets[0].tags[2]");
/// ```
pub fn reconstruct(tokens: &[PathToken]) -> String {
	let mut out = String::new();
	for (i, token) in tokens.iter().enumerate() {
		match token {
			PathToken::Name(name) => {
				if i > 0 {
					out.push('.');
				}
				out.push_str(name);
			}
			PathToken::Index(index) => {
				out.push('[');
				out.push_str(&index.to_string());
				out.push(']');
			}
		}
	}
	out
}

/// Assign `value` at `tokens` inside `target`, creating containers on the way.
///
/// Missing or null slots and scalars become the container the next token needs,
/// arrays are padded with nulls up to the index, and the final token overwrites
/// whatever was there. An object found where an index is needed is replaced by
/// a fresh array. A populated array is never replaced: a name step into one is
/// reported as a conflict. Indexes above [`MAX_INDEX`] are rejected.
pub fn assign(
	target: &mut Map<String, Value>,
	tokens: &[PathToken],
	value: Value,
) -> Result<(), AssignError> {
	let Some((head, rest)) = tokens.split_first() else {
		return Err(AssignError::EmptyPath);
	};
	let PathToken::Name(key) = head else {
		return Err(AssignError::LeadingIndex(reconstruct(tokens)));
	};
	if let Some(index) = rest.iter().find_map(|token| match token {
		PathToken::Index(index) if *index > MAX_INDEX => Some(*index),
		_ => None,
	}) {
		return Err(AssignError::IndexTooLarge {
			path: reconstruct(tokens),
			index,
			max: MAX_INDEX,
		});
	}

	let slot = target.entry(key.clone()).or_insert(Value::Null);
	assign_into(slot, rest, value).map_err(|err| match err {
		StepError::Conflict(existing) => AssignError::Conflict {
			path: reconstruct(tokens),
			existing,
		},
		StepError::IndexTooLarge(index) => AssignError::IndexTooLarge {
			path: reconstruct(tokens),
			index,
			max: MAX_INDEX,
		},
	})
}

fn assign_into(node: &mut Value, tokens: &[PathToken], value: Value) -> Result<(), StepError> {
	let Some((head, rest)) = tokens.split_first() else {
		*node = value;
		return Ok(());
	};

	match head {
		PathToken::Name(key) => {
			match node {
				Value::Object(_) => {}
				Value::Array(items) if !items.is_empty() => return Err(StepError::Conflict("array")),
				_ => *node = Value::Object(Map::new()),
			}
			let Value::Object(map) = node else {
				unreachable!("node was just made an object");
			};
			let child = map.entry(key.clone()).or_insert(Value::Null);
			assign_into(child, rest, value)
		}
		PathToken::Index(index) => {
			let len = match index.checked_add(1) {
				Some(len) if *index <= MAX_INDEX => len,
				_ => return Err(StepError::IndexTooLarge(*index)),
			};
			if let Value::Object(map) = node
				&& !map.is_empty()
			{
				tracing::debug!("Replacing object with array at index {}", index);
			}
			if !node.is_array() {
				*node = Value::Array(Vec::new());
			}
			let Value::Array(items) = node else {
				unreachable!("node was just made an array");
			};
			if items.len() < len {
				items.resize(len, Value::Null);
			}
			assign_into(&mut items[*index], rest, value)
		}
	}
}

/// Boolean coercion applied to submitted strings, case-insensitive.
///
/// # Examples
///
/// ```
/// use formsmith_forms::path::coerce_form_value;
/// use serde_json::json;
///
/// assert_eq!(coerce_form_value("On"), json!(true));
/// assert_eq!(coerce_form_value("no"), json!(false));
/// assert_eq!(coerce_form_value("Rex"), json!("Rex"));
/// ```
pub fn coerce_form_value(raw: &str) -> Value {
	match raw.to_lowercase().as_str() {
		"true" | "on" | "yes" | "1" => Value::Bool(true),
		"false" | "off" | "no" | "0" => Value::Bool(false),
		_ => Value::String(raw.to_string()),
	}
}

/// Build a nested tree from flat `(key, value)` pairs, processed in order.
///
/// Keys without a usable path (empty, or starting with an index) are stored
/// literally at the top level. Assignments that conflict with data already in
/// the tree are dropped with a warning.
///
/// # Examples
///
/// ```
/// use formsmith_forms::path::extract;
/// use serde_json::json;
///
/// let tree = extract(
///     [("pets[0].name", "Rex"), ("pets[1].name", "Tom"), ("newsletter", "on")],
///     true,
/// );
/// assert_eq!(
///     serde_json::Value::Object(tree),
///     json!({"pets": [{"name": "Rex"}, {"name": "Tom"}], "newsletter": true})
/// );
/// ```
pub fn extract<I, K, V>(pairs: I, coerce: bool) -> Map<String, Value>
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
	V: AsRef<str>,
{
	let mut tree = Map::new();
	for (key, raw) in pairs {
		let key = key.as_ref();
		let value = if coerce {
			coerce_form_value(raw.as_ref())
		} else {
			Value::String(raw.as_ref().to_string())
		};

		match parse_path(key) {
			Some(tokens) => {
				if let Err(err) = assign(&mut tree, &tokens, value) {
					tracing::warn!("Dropping form value for '{}': {}", key, err);
				}
			}
			None => {
				tree.insert(key.to_string(), value);
			}
		}
	}
	tree
}

/// Nest already-typed data whose keys may be flat paths (`"pets[0].name"`).
///
/// Plain keys are copied as they are; path keys are assigned into the tree in
/// order, so a later flat key refines an earlier nested value.
pub fn nest_flat_keys(data: &Map<String, Value>) -> Map<String, Value> {
	let mut tree = Map::new();
	for (key, value) in data {
		match parse_path(key).filter(|tokens| tokens.len() > 1) {
			Some(tokens) => {
				if let Err(err) = assign(&mut tree, &tokens, value.clone()) {
					tracing::warn!("Dropping form value for '{}': {}", key, err);
				}
			}
			None => {
				tree.insert(key.clone(), value.clone());
			}
		}
	}
	tree
}

/// Flatten a nested tree into `(key, value)` pairs using `name[index].child` keys.
///
/// Nulls and empty containers produce no pairs; booleans and numbers are
/// rendered with their JSON spelling.
pub fn flatten(tree: &Map<String, Value>) -> Vec<(String, String)> {
	let mut out = Vec::new();
	for (key, value) in tree {
		flatten_into(key.clone(), value, &mut out);
	}
	out
}

fn flatten_into(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
	match value {
		Value::Null => {}
		Value::Bool(b) => out.push((prefix, b.to_string())),
		Value::Number(n) => out.push((prefix, n.to_string())),
		Value::String(s) => out.push((prefix, s.clone())),
		Value::Array(items) => {
			for (i, item) in items.iter().enumerate() {
				flatten_into(format!("{}[{}]", prefix, i), item, out);
			}
		}
		Value::Object(map) => {
			for (key, child) in map {
				flatten_into(format!("{}.{}", prefix, key), child, out);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn tree(pairs: &[(&str, &str)]) -> Value {
		Value::Object(extract(pairs.iter().copied(), false))
	}

	#[rstest]
	#[case("name", vec![PathToken::Name("name".into())])]
	#[case("a.b.c", vec![PathToken::Name("a".into()), PathToken::Name("b".into()), PathToken::Name("c".into())])]
	#[case("a[10]", vec![PathToken::Name("a".into()), PathToken::Index(10)])]
	#[case("a[x]", vec![PathToken::Name("a".into()), PathToken::Name("x".into())])]
	#[case("[3].b", vec![PathToken::Index(3), PathToken::Name("b".into())])]
	#[case("", vec![])]
	fn test_tokenize(#[case] key: &str, #[case] expected: Vec<PathToken>) {
		assert_eq!(tokenize(key), expected);
	}

	#[rstest]
	fn test_oversized_index_becomes_name() {
		let tokens = tokenize("a[99999999999999999999999999]");
		assert_eq!(
			tokens,
			vec![
				PathToken::Name("a".into()),
				PathToken::Name("99999999999999999999999999".into())
			]
		);
	}

	#[rstest]
	#[case("")]
	#[case("[0]")]
	#[case("...")]
	fn test_parse_path_rejects(#[case] key: &str) {
		assert!(parse_path(key).is_none());
	}

	#[rstest]
	fn test_nested_collection_extraction() {
		assert_eq!(
			tree(&[
				("pets[0].name", "Rex"),
				("pets[0].vaccines[1].date", "2024-01-01"),
				("owner.address.city", "Oslo"),
			]),
			json!({
				"pets": [{"name": "Rex", "vaccines": [null, {"date": "2024-01-01"}]}],
				"owner": {"address": {"city": "Oslo"}}
			})
		);
	}

	#[rstest]
	fn test_sparse_indices_pad_with_null() {
		assert_eq!(tree(&[("a[2]", "x")]), json!({"a": [null, null, "x"]}));
	}

	#[rstest]
	fn test_later_assignment_overwrites() {
		assert_eq!(tree(&[("a", "1"), ("a", "2")]), json!({"a": "2"}));
	}

	#[rstest]
	fn test_scalar_is_replaced_by_container() {
		assert_eq!(tree(&[("a", "x"), ("a.b", "y")]), json!({"a": {"b": "y"}}));
		assert_eq!(tree(&[("a", "x"), ("a[0]", "y")]), json!({"a": ["y"]}));
	}

	#[rstest]
	fn test_profile_name_is_nested_not_flat() {
		assert_eq!(
			tree(&[("profile.name", "Ada"), ("profile.email", "ada@example.com")]),
			json!({"profile": {"name": "Ada", "email": "ada@example.com"}})
		);
	}

	#[rstest]
	fn test_conflicting_assignment_is_dropped() {
		let mut target = Map::new();
		assign(&mut target, &tokenize("a[0]"), json!("x")).unwrap();
		let err = assign(&mut target, &tokenize("a.b"), json!("y")).unwrap_err();
		assert_eq!(
			err,
			AssignError::Conflict {
				path: "a.b".to_string(),
				existing: "array"
			}
		);
		assert_eq!(Value::Object(target), json!({"a": ["x"]}));
	}

	#[rstest]
	#[case("a[18446744073709551615]", usize::MAX)]
	#[case("a[18446744073709551614]", usize::MAX - 1)]
	#[case("a[4000000000].b", 4_000_000_000)]
	#[case("a[0].b[10001]", 10_001)]
	fn test_huge_index_is_rejected(#[case] key: &str, #[case] index: usize) {
		let mut target = Map::new();
		let err = assign(&mut target, &tokenize(key), json!("x")).unwrap_err();
		assert!(matches!(err, AssignError::IndexTooLarge { index: i, max: MAX_INDEX, .. } if i == index));
		assert!(target.is_empty());
	}

	#[rstest]
	fn test_huge_index_is_dropped_from_submission() {
		let data = extract(
			[("a[18446744073709551615]", "x"), ("b[4000000000]", "y"), ("c[10000]", "z")],
			false,
		);
		assert_eq!(data.keys().collect::<Vec<_>>(), vec!["c"]);
		assert_eq!(data["c"].as_array().map(Vec::len), Some(MAX_INDEX + 1));
		assert_eq!(data["c"][MAX_INDEX], json!("z"));

		let Value::Object(flat) = json!({"pets[18446744073709551615].name": "Rex"}) else {
			unreachable!()
		};
		assert!(nest_flat_keys(&flat).is_empty());
	}

	#[rstest]
	fn test_object_is_replaced_by_array() {
		assert_eq!(
			tree(&[("a.b", "x"), ("a[1]", "y")]),
			json!({"a": [null, "y"]})
		);
	}

	#[rstest]
	fn test_null_parent_is_repaired() {
		let mut target = Map::new();
		target.insert("profile".to_string(), Value::Null);
		assign(&mut target, &tokenize("profile.name"), json!("Ada")).unwrap();
		assert_eq!(Value::Object(target), json!({"profile": {"name": "Ada"}}));
	}

	#[rstest]
	fn test_nest_flat_keys_keeps_types() {
		let Value::Object(data) = json!({"pets[0].age": 3, "pets[0].name": "Rex", "agree": true}) else {
			unreachable!()
		};
		assert_eq!(
			Value::Object(nest_flat_keys(&data)),
			json!({"pets": [{"age": 3, "name": "Rex"}], "agree": true})
		);
	}

	#[rstest]
	fn test_unparseable_keys_are_literal() {
		assert_eq!(
			tree(&[("[0]", "x"), ("", "y")]),
			json!({"[0]": "x", "": "y"})
		);
	}

	#[rstest]
	#[case("true", json!(true))]
	#[case("TRUE", json!(true))]
	#[case("Yes", json!(true))]
	#[case("1", json!(true))]
	#[case("off", json!(false))]
	#[case("No", json!(false))]
	#[case("0", json!(false))]
	#[case("maybe", json!("maybe"))]
	#[case("", json!(""))]
	fn test_coercion(#[case] raw: &str, #[case] expected: Value) {
		assert_eq!(coerce_form_value(raw), expected);
	}

	#[rstest]
	fn test_coercion_is_optional() {
		let tree = extract([("agree", "on")], false);
		assert_eq!(tree["agree"], json!("on"));
	}

	#[rstest]
	fn test_flatten() {
		let value = json!({"pets": [{"name": "Rex", "age": 3}], "ok": true, "gone": null});
		let Value::Object(map) = value else {
			unreachable!()
		};
		assert_eq!(
			flatten(&map),
			vec![
				("pets[0].name".to_string(), "Rex".to_string()),
				("pets[0].age".to_string(), "3".to_string()),
				("ok".to_string(), "true".to_string()),
			]
		);
	}
}
