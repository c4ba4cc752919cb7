//! Validation error correlation
//!
//! Validation errors arrive as a flat map from field path to message. This module
//! normalizes the accepted error payloads into an [`ErrorMap`], narrows maps to
//! nested sections and collection items, and turns paths into the labels shown
//! in the summary at the top of the form.

use crate::path::{PathToken, tokenize};
use formsmith_widgets::{Markup, Slots, StyleRole, Template, Theme};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// Path used for errors that belong to the form as a whole
pub const FORM_ERROR_KEY: &str = "form";

/// One error as reported by a validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
	#[serde(default)]
	pub name: String,
	pub message: String,
}

/// Flat map from field path to message, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorMap {
	entries: IndexMap<String, String>,
}

impl ErrorMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a message; a second message for the same path is appended with `"; "`.
	pub fn insert(&mut self, path: impl Into<String>, message: impl Into<String>) {
		let message = message.into();
		match self.entries.entry(path.into()) {
			indexmap::map::Entry::Occupied(mut entry) => {
				let existing = entry.get_mut();
				if !existing.split("; ").any(|m| m == message) {
					existing.push_str("; ");
					existing.push_str(&message);
				}
			}
			indexmap::map::Entry::Vacant(entry) => {
				entry.insert(message);
			}
		}
	}

	pub fn get(&self, path: &str) -> Option<&str> {
		self.entries.get(path).map(String::as_str)
	}

	pub fn contains_key(&self, path: &str) -> bool {
		self.entries.contains_key(path)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Normalize an error payload.
	///
	/// Accepted shapes: `{"errors": [{"name", "message"}]}`, a bare list of such
	/// records, a flat `{path: message}` object, or a nested object whose keys
	/// are joined with dots. Lists of messages are kept in order; a bare string
	/// becomes a form-level error.
	///
	/// # Examples
	///
	/// ```
	/// use formsmith_forms::ErrorMap;
	/// use serde_json::json;
	///
	/// let nested = ErrorMap::from_value(&json!({
	///     "profile": {"email": ["Invalid email"]},
	///     "": "Something went wrong"
	/// }));
	/// assert_eq!(nested.get("profile.email"), Some("Invalid email"));
	/// assert_eq!(nested.get("form"), Some("Something went wrong"));
	///
	/// let records = ErrorMap::from_value(&json!({
	///     "errors": [{"name": "pets[0].name", "message": "Field required"}]
	/// }));
	/// assert_eq!(records.get("pets[0].name"), Some("Field required"));
	/// ```
	pub fn from_value(payload: &Value) -> Self {
		if let Some(records) = as_records(payload) {
			return Self::from_records(records);
		}

		let mut map = Self::new();
		flatten_messages(payload, String::new(), &mut map);
		map
	}

	/// Build from validator records; an empty name addresses the whole form.
	pub fn from_records<I: IntoIterator<Item = ErrorRecord>>(records: I) -> Self {
		let mut map = Self::new();
		for record in records {
			let name = if record.name.is_empty() {
				FORM_ERROR_KEY.to_string()
			} else {
				record.name
			};
			map.insert(name, record.message);
		}
		map
	}

	/// Errors under `prefix.`, with the prefix stripped.
	///
	/// # Examples
	///
	/// ```
	/// use formsmith_forms::ErrorMap;
	///
	/// let mut errors = ErrorMap::new();
	/// errors.insert("profile.email", "Invalid email");
	/// errors.insert("profile", "Incomplete profile");
	/// errors.insert("username", "Taken");
	///
	/// let scoped = errors.scoped("profile");
	/// assert_eq!(scoped.len(), 1);
	/// assert_eq!(scoped.get("email"), Some("Invalid email"));
	/// ```
	pub fn scoped(&self, prefix: &str) -> Self {
		let mut out = Self::new();
		for (key, message) in &self.entries {
			if let Some(rest) = key
				.strip_prefix(prefix)
				.and_then(|rest| rest.strip_prefix('.'))
				&& !rest.is_empty()
			{
				out.insert(rest, message.clone());
			}
		}
		out
	}

	/// Re-key the errors of collection `field` from `field[i].leaf` to `i.leaf`.
	///
	/// Only the first `].` is rewritten, so errors of collections nested inside
	/// an item keep their bracket form for the next level. Dotted index paths
	/// (`field.i.leaf`) are accepted too. Errors addressing a whole item or the
	/// collection itself are not carried over.
	///
	/// # Examples
	///
	/// ```
	/// use formsmith_forms::ErrorMap;
	///
	/// let mut errors = ErrorMap::new();
	/// errors.insert("pets[0].weight", "Too heavy");
	/// errors.insert("pets[1].vaccines[0].date", "Invalid date");
	/// errors.insert("pets", "Too many pets");
	///
	/// let rekeyed = errors.rekey_collection("pets");
	/// assert_eq!(rekeyed.get("0.weight"), Some("Too heavy"));
	/// assert_eq!(rekeyed.get("1.vaccines[0].date"), Some("Invalid date"));
	/// assert_eq!(rekeyed.len(), 2);
	/// ```
	pub fn rekey_collection(&self, field: &str) -> Self {
		let mut out = Self::new();
		for (key, message) in &self.entries {
			let Some(rest) = key.strip_prefix(field) else {
				continue;
			};
			if let Some(bracketed) = rest.strip_prefix('[') {
				if let Some((index, leaf)) = bracketed.split_once("].")
					&& is_index(index)
					&& !leaf.is_empty()
				{
					out.insert(format!("{}.{}", index, leaf), message.clone());
				}
			} else if let Some(dotted) = rest.strip_prefix('.')
				&& let Some((index, leaf)) = dotted.split_once('.')
				&& is_index(index)
				&& !leaf.is_empty()
			{
				out.insert(format!("{}.{}", index, leaf), message.clone());
			}
		}
		out
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ErrorMap {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut map = Self::new();
		for (key, message) in iter {
			map.insert(key, message);
		}
		map
	}
}

impl From<Vec<ErrorRecord>> for ErrorMap {
	fn from(records: Vec<ErrorRecord>) -> Self {
		Self::from_records(records)
	}
}

impl From<&Value> for ErrorMap {
	fn from(payload: &Value) -> Self {
		Self::from_value(payload)
	}
}

fn is_index(s: &str) -> bool {
	!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn as_records(payload: &Value) -> Option<Vec<ErrorRecord>> {
	let list = match payload {
		Value::Object(map) => map.get("errors")?.as_array()?,
		Value::Array(list) => list,
		_ => return None,
	};
	if list.is_empty() || !list.iter().all(|item| item.get("message").is_some()) {
		return None;
	}
	list.iter()
		.map(|item| serde_json::from_value(item.clone()).ok())
		.collect()
}

fn flatten_messages(payload: &Value, prefix: String, out: &mut ErrorMap) {
	match payload {
		Value::Null => {}
		Value::Object(map) => {
			for (key, child) in map {
				let path = if prefix.is_empty() {
					key.clone()
				} else if key.is_empty() {
					prefix.clone()
				} else {
					format!("{}.{}", prefix, key)
				};
				flatten_messages(child, path, out);
			}
		}
		Value::Array(items) => {
			for item in items {
				flatten_messages(item, prefix.clone(), out);
			}
		}
		Value::String(message) => out.insert(error_path(prefix), message.clone()),
		other => out.insert(error_path(prefix), other.to_string()),
	}
}

fn error_path(prefix: String) -> String {
	if prefix.is_empty() {
		FORM_ERROR_KEY.to_string()
	} else {
		prefix
	}
}

/// Naive singular form: `ies` becomes `y`, otherwise one trailing `s` is dropped.
///
/// # Examples
///
/// ```
/// use formsmith_forms::errors::singularize;
///
/// assert_eq!(singularize("companies"), "company");
/// assert_eq!(singularize("pets"), "pet");
/// assert_eq!(singularize("s"), "s");
/// assert_eq!(singularize("data"), "data");
/// ```
pub fn singularize(word: &str) -> String {
	if word.len() > 3
		&& let Some(stem) = word.strip_suffix("ies")
	{
		return format!("{}y", stem);
	}
	if word.len() > 1
		&& let Some(stem) = word.strip_suffix('s')
	{
		return stem.to_string();
	}
	word.to_string()
}

/// `tax_id` becomes `Tax Id`.
pub fn title_case(word: &str) -> String {
	word.split(['_', ' ', '-'])
		.filter(|part| !part.is_empty())
		.map(|part| {
			let mut chars = part.chars();
			match chars.next() {
				Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

enum LabelPart {
	Name(String),
	Item(String, usize),
	Index(usize),
}

/// User-facing label for an error path.
///
/// # Examples
///
/// ```
/// use formsmith_forms::errors::humanize_error_path;
///
/// assert_eq!(humanize_error_path("pets[7].name"), "Pet #8 — Name");
/// assert_eq!(humanize_error_path("companies[1].tax_id"), "Company #2 — Tax Id");
/// assert_eq!(humanize_error_path("form"), "Form");
/// ```
pub fn humanize_error_path(path: &str) -> String {
	let tokens = tokenize(path);
	if tokens.is_empty() || path == FORM_ERROR_KEY {
		return "Form".to_string();
	}

	let mut parts: Vec<LabelPart> = Vec::with_capacity(tokens.len());
	for token in tokens {
		let index = match token {
			PathToken::Index(index) => Some(index),
			PathToken::Name(ref name) if is_index(name) => name.parse::<usize>().ok(),
			PathToken::Name(_) => None,
		};
		match (index, token) {
			(Some(index), _) => match parts.pop() {
				Some(LabelPart::Name(name)) => parts.push(LabelPart::Item(name, index)),
				Some(previous) => {
					parts.push(previous);
					parts.push(LabelPart::Index(index));
				}
				None => parts.push(LabelPart::Index(index)),
			},
			(None, PathToken::Name(name)) => parts.push(LabelPart::Name(name)),
			(None, PathToken::Index(_)) => {}
		}
	}

	parts
		.into_iter()
		.map(|part| match part {
			LabelPart::Name(name) => title_case(&name),
			LabelPart::Item(name, index) => {
				format!("{} #{}", title_case(&singularize(&name)), index + 1)
			}
			LabelPart::Index(index) => format!("Item #{}", index + 1),
		})
		.collect::<Vec<_>>()
		.join(" — ")
}

/// One summary line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
	pub path: Vec<PathToken>,
	pub key: String,
	pub message: String,
}

impl ErrorEntry {
	pub fn label(&self) -> String {
		humanize_error_path(&self.key)
	}
}

static SUMMARY: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(concat!(
		r#"<div class="{class}" role="alert" data-formsmith-error-summary>"#,
		r#"<p><strong>Please correct the following errors:</strong></p>"#,
		"<ul>{items}</ul>",
		"</div>",
	))
});

static SUMMARY_ITEM: LazyLock<Template> =
	LazyLock::new(|| Template::parse("<li><strong>{label}:</strong> {message}</li>"));

/// Ordered summary of every validation problem
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSummary {
	entries: Vec<ErrorEntry>,
}

impl ErrorSummary {
	pub fn from_errors(errors: &ErrorMap) -> Self {
		Self {
			entries: errors
				.iter()
				.map(|(key, message)| ErrorEntry {
					path: tokenize(key),
					key: key.to_string(),
					message: message.to_string(),
				})
				.collect(),
		}
	}

	pub fn entries(&self) -> &[ErrorEntry] {
		&self.entries
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Summary panel; empty markup when there are no errors.
	pub fn render(&self, theme: &dyn Theme) -> Markup {
		if self.entries.is_empty() {
			return Markup::empty();
		}

		let items: Result<Markup, _> = self
			.entries
			.iter()
			.map(|entry| {
				SUMMARY_ITEM.render(
					&Slots::new()
						.text("label", entry.label())
						.text("message", entry.message.as_str()),
				)
			})
			.collect();

		let class = format!(
			"{} formsmith-error-summary",
			theme.class(StyleRole::ErrorSummary)
		);
		items
			.and_then(|items| {
				SUMMARY.render(
					&Slots::new()
						.text("class", class.trim())
						.markup("items", items),
				)
			})
			.unwrap_or_else(|err| {
				tracing::warn!("Failed to render error summary: {}", err);
				Markup::empty()
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use formsmith_widgets::{Bootstrap5Theme, PlainTheme};
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("pets[7].name", "Pet #8 — Name")]
	#[case("companies[1].tax_id", "Company #2 — Tax Id")]
	#[case("form", "Form")]
	#[case("", "Form")]
	#[case("email", "Email")]
	#[case("first_name", "First Name")]
	#[case("profile.email", "Profile — Email")]
	#[case("pets.0.name", "Pet #1 — Name")]
	#[case("pets[0].vaccines[2].date", "Pet #1 — Vaccine #3 — Date")]
	#[case("grid[0][1]", "Grid #1 — Item #2")]
	#[case("[4]", "Item #5")]
	#[case("s[0]", "S #1")]
	fn test_humanize_error_path(#[case] path: &str, #[case] expected: &str) {
		assert_eq!(humanize_error_path(path), expected);
	}

	#[rstest]
	#[case("categories", "category")]
	#[case("ies", "ie")]
	#[case("boxes", "boxe")]
	#[case("address", "addres")]
	#[case("x", "x")]
	fn test_singularize(#[case] word: &str, #[case] expected: &str) {
		assert_eq!(singularize(word), expected);
	}

	#[rstest]
	fn test_insert_joins_distinct_messages() {
		let mut errors = ErrorMap::new();
		errors.insert("a", "first");
		errors.insert("a", "second");
		errors.insert("a", "first");
		assert_eq!(errors.get("a"), Some("first; second"));
	}

	#[rstest]
	fn test_from_value_nested_lists() {
		let errors = ErrorMap::from_value(&json!({
			"pets": {"0": {"name": ["Required", "Too short"]}},
			"__all__": "Bad"
		}));
		assert_eq!(errors.get("pets.0.name"), Some("Required; Too short"));
		assert_eq!(errors.get("__all__"), Some("Bad"));
	}

	#[rstest]
	fn test_from_value_bare_records() {
		let errors = ErrorMap::from_value(&json!([
			{"name": "", "message": "Form invalid"},
			{"name": "age", "message": "Too young"}
		]));
		assert_eq!(errors.get("form"), Some("Form invalid"));
		assert_eq!(errors.get("age"), Some("Too young"));
	}

	#[rstest]
	fn test_from_value_plain_string() {
		let errors = ErrorMap::from_value(&json!("Server unavailable"));
		assert_eq!(errors.get("form"), Some("Server unavailable"));
		assert!(ErrorMap::from_value(&Value::Null).is_empty());
	}

	#[rstest]
	fn test_field_named_errors_is_not_a_record_list() {
		let errors = ErrorMap::from_value(&json!({"errors": "count too high"}));
		assert_eq!(errors.get("errors"), Some("count too high"));
	}

	#[rstest]
	fn test_rekey_collection_ignores_other_fields() {
		let errors: ErrorMap = [
			("pets[0].name", "Required"),
			("petsitter.name", "Required"),
			("pets.1.age", "Too old"),
			("pets[x].name", "odd"),
		]
		.into_iter()
		.collect();

		let rekeyed = errors.rekey_collection("pets");
		assert_eq!(rekeyed.get("0.name"), Some("Required"));
		assert_eq!(rekeyed.get("1.age"), Some("Too old"));
		assert_eq!(rekeyed.len(), 2);
	}

	#[rstest]
	fn test_scoped_requires_separator() {
		let errors: ErrorMap = [("profile.email", "x"), ("profiles.email", "y")]
			.into_iter()
			.collect();
		let scoped = errors.scoped("profile");
		assert_eq!(scoped.get("email"), Some("x"));
		assert_eq!(scoped.len(), 1);
	}

	#[rstest]
	fn test_summary_preserves_order_and_escapes() {
		let errors: ErrorMap = [("pets[0].name", "<b>Required</b>"), ("form", "Nope")]
			.into_iter()
			.collect();
		let summary = ErrorSummary::from_errors(&errors);
		assert_eq!(summary.entries().len(), 2);
		assert_eq!(summary.entries()[0].label(), "Pet #1 — Name");

		let html = summary.render(&Bootstrap5Theme).into_string();
		assert!(html.contains(r#"class="alert alert-danger formsmith-error-summary""#));
		assert!(html.contains(r#"role="alert""#));
		assert!(html.contains("<li><strong>Pet #1 — Name:</strong> &lt;b&gt;Required&lt;/b&gt;</li>"));
		let first = html.find("Pet #1").unwrap();
		let second = html.find("<strong>Form:</strong>").unwrap();
		assert!(first < second);
	}

	#[rstest]
	fn test_empty_summary_renders_nothing() {
		let summary = ErrorSummary::from_errors(&ErrorMap::new());
		assert!(summary.render(&PlainTheme).is_empty());
	}
}
