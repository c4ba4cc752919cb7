//! Ordered HTML attribute sets

use crate::markup::{Markup, html_escape};
use regex::Regex;
use std::sync::LazyLock;

static ATTR_NAME: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[A-Za-z_:][-A-Za-z0-9_:.]*$").expect("valid attribute regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrValue {
	Text(String),
	Flag,
}

/// Attribute set that renders in insertion order.
///
/// `class` and `style` merge additively; every other key is replaced.
///
/// # Examples
///
/// ```
/// use formsmith_widgets::Attrs;
///
/// let attrs = Attrs::new()
///     .class("form-control")
///     .class("is-invalid")
///     .data("index", "2")
///     .required();
/// assert_eq!(attrs.get("class"), Some("form-control is-invalid"));
/// assert_eq!(
///     attrs.render().as_str(),
///     r#" class="form-control is-invalid" data-index="2" required"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs {
	entries: Vec<(String, AttrValue)>,
}

impl Attrs {
	/// Create a new empty attribute set
	pub fn new() -> Self {
		Self::default()
	}

	/// Set an attribute, replacing any previous value
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		let key = key.into();
		let value = value.into();
		match key.as_str() {
			"class" => self.merge("class", &value, " "),
			"style" => self.merge("style", &value, "; "),
			_ => self.replace(key, AttrValue::Text(value)),
		}
	}

	/// Set a boolean attribute such as `required`
	pub fn set_flag(&mut self, key: impl Into<String>) {
		self.replace(key.into(), AttrValue::Flag);
	}

	/// Append CSS classes
	pub fn add_class(&mut self, class: &str) {
		self.merge("class", class, " ");
	}

	/// Append inline style declarations
	pub fn add_style(&mut self, style: &str) {
		self.merge("style", style.trim_end_matches(';'), "; ");
	}

	pub fn remove(&mut self, key: &str) {
		self.entries.retain(|(k, _)| k != key);
	}

	/// Value of an attribute; flags read as their own name
	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries.iter().find(|(k, _)| k == key).map(|(k, v)| match v {
			AttrValue::Text(text) => text.as_str(),
			AttrValue::Flag => k.as_str(),
		})
	}

	pub fn contains(&self, key: &str) -> bool {
		self.entries.iter().any(|(k, _)| k == key)
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Merge another set on top of this one
	pub fn extend(&mut self, other: &Attrs) {
		for (key, value) in &other.entries {
			match value {
				AttrValue::Text(text) => self.set(key.clone(), text.clone()),
				AttrValue::Flag => self.set_flag(key.clone()),
			}
		}
	}

	/// Add a custom attribute
	pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.set(key, value);
		self
	}

	/// Add a data-* attribute
	pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.set(format!("data-{}", key.into()), value);
		self
	}

	/// Add an ARIA attribute
	pub fn aria(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.set(format!("aria-{}", key.into()), value);
		self
	}

	/// Add a CSS class
	pub fn class(mut self, value: impl Into<String>) -> Self {
		self.add_class(&value.into());
		self
	}

	/// Add an ID attribute
	pub fn id(mut self, value: impl Into<String>) -> Self {
		self.set("id", value);
		self
	}

	/// Add a placeholder attribute
	pub fn placeholder(mut self, value: impl Into<String>) -> Self {
		self.set("placeholder", value);
		self
	}

	/// Add a required attribute
	pub fn required(mut self) -> Self {
		self.set_flag("required");
		self
	}

	/// Add a disabled attribute
	pub fn disabled(mut self) -> Self {
		self.set_flag("disabled");
		self
	}

	/// Add a readonly attribute
	pub fn readonly(mut self) -> Self {
		self.set_flag("readonly");
		self
	}

	/// Render as ` key="value"` pairs. Keys that are not valid attribute names are dropped.
	pub fn render(&self) -> Markup {
		let mut out = String::new();
		for (key, value) in &self.entries {
			if !ATTR_NAME.is_match(key) {
				tracing::warn!("Dropping invalid attribute name: {:?}", key);
				continue;
			}
			match value {
				AttrValue::Text(text) => {
					out.push(' ');
					out.push_str(key);
					out.push_str("=\"");
					out.push_str(&html_escape(text));
					out.push('"');
				}
				AttrValue::Flag => {
					out.push(' ');
					out.push_str(key);
				}
			}
		}
		Markup::raw(out)
	}

	fn replace(&mut self, key: String, value: AttrValue) {
		if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
			entry.1 = value;
		} else {
			self.entries.push((key, value));
		}
	}

	fn merge(&mut self, key: &str, value: &str, separator: &str) {
		let value = value.trim();
		if value.is_empty() {
			return;
		}
		match self.entries.iter_mut().find(|(k, _)| k == key) {
			Some((_, AttrValue::Text(existing))) if !existing.is_empty() => {
				existing.push_str(separator);
				existing.push_str(value);
			}
			Some(entry) => entry.1 = AttrValue::Text(value.to_string()),
			None => self
				.entries
				.push((key.to_string(), AttrValue::Text(value.to_string()))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_attrs_builder() {
		let attrs = Attrs::new()
			.class("form-control")
			.data("id", "123")
			.aria("label", "Username")
			.placeholder("Enter username")
			.required();

		assert_eq!(attrs.get("class"), Some("form-control"));
		assert_eq!(attrs.get("data-id"), Some("123"));
		assert_eq!(attrs.get("aria-label"), Some("Username"));
		assert_eq!(attrs.get("placeholder"), Some("Enter username"));
		assert_eq!(attrs.get("required"), Some("required"));
	}

	#[rstest]
	fn test_style_merges_additively() {
		let mut attrs = Attrs::new();
		attrs.add_style("color: red;");
		attrs.set("style", "margin: 0");
		assert_eq!(attrs.get("style"), Some("color: red; margin: 0"));
	}

	#[rstest]
	fn test_set_replaces_plain_keys() {
		let mut attrs = Attrs::new().id("a");
		attrs.set("id", "b");
		assert_eq!(attrs.render().as_str(), r#" id="b""#);
	}

	#[rstest]
	fn test_render_escapes_values() {
		let attrs = Attrs::new().attr("title", r#""><script>alert(1)</script>"#);
		let html = attrs.render();
		assert!(!html.contains("<script>"));
		assert!(html.contains("&quot;&gt;&lt;script&gt;"));
	}

	#[rstest]
	#[case("onclick=\"x\" data-a")]
	#[case("a b")]
	#[case("")]
	fn test_render_drops_invalid_names(#[case] key: &str) {
		let attrs = Attrs::new().attr(key, "1").attr("ok", "2");
		assert_eq!(attrs.render().as_str(), r#" ok="2""#);
	}

	#[rstest]
	fn test_extend_merges_classes() {
		let mut base = Attrs::new().class("a").id("x");
		base.extend(&Attrs::new().class("b").disabled());
		assert_eq!(base.get("class"), Some("a b"));
		assert!(base.contains("disabled"));
	}
}
