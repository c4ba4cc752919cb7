//! Markup fragments and slot templates
//!
//! Every fragment the renderer emits is a [`Markup`]. Text only becomes markup
//! through [`html_escape`] or a [`Template`] slot of kind [`Slot::Text`], so user
//! supplied values never reach the output unescaped.

use crate::error::WidgetError;
use std::collections::HashMap;
use std::fmt;

/// Escape HTML special characters in text and attribute values.
///
/// # Examples
///
/// ```
/// use formsmith_widgets::html_escape;
///
/// assert_eq!(html_escape("<b>\"Tom\" & 'Jerry'</b>"),
///     "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;");
/// ```
pub fn html_escape(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
		.replace('\'', "&#x27;")
}

/// Trusted HTML fragment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
	/// Wrap already-safe HTML.
	pub fn raw(html: impl Into<String>) -> Self {
		Self(html.into())
	}

	/// Escape plain text into markup.
	pub fn text(text: &str) -> Self {
		Self(html_escape(text))
	}

	pub fn empty() -> Self {
		Self(String::new())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_string(self) -> String {
		self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn contains(&self, needle: &str) -> bool {
		self.0.contains(needle)
	}

	/// Append another fragment.
	pub fn push(&mut self, other: &Markup) {
		self.0.push_str(&other.0);
	}
}

impl fmt::Display for Markup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<Markup> for String {
	fn from(markup: Markup) -> Self {
		markup.0
	}
}

impl FromIterator<Markup> for Markup {
	fn from_iter<I: IntoIterator<Item = Markup>>(iter: I) -> Self {
		let mut out = String::new();
		for fragment in iter {
			out.push_str(&fragment.0);
		}
		Self(out)
	}
}

/// Value bound to a template slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
	/// Escaped on substitution
	Text(String),
	/// Inserted verbatim
	Markup(Markup),
}

/// Named slot values for one template rendering
#[derive(Debug, Clone, Default)]
pub struct Slots {
	values: HashMap<String, Slot>,
}

impl Slots {
	pub fn new() -> Self {
		Self::default()
	}

	/// Bind a text slot
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.values.insert(name.into(), Slot::Text(value.into()));
		self
	}

	/// Bind a markup slot
	pub fn markup(mut self, name: impl Into<String>, value: Markup) -> Self {
		self.values.insert(name.into(), Slot::Markup(value));
		self
	}

	pub fn get(&self, name: &str) -> Option<&Slot> {
		self.values.get(name)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Slot(String),
}

/// Template with `{name}` slots; `{{` and `}}` produce literal braces.
///
/// Text that looks like a slot but is not a valid identifier (for example a
/// CSS or script block) is kept literally.
///
/// # Examples
///
/// ```
/// use formsmith_widgets::{Markup, Slots, Template};
///
/// let template = Template::parse(r#"<p class="{class}">{body} {{ok}}</p>"#);
/// let html = template
///     .render(&Slots::new().text("class", "note").markup("body", Markup::raw("<b>hi</b>")))
///     .unwrap();
/// assert_eq!(html.as_str(), r#"<p class="note"><b>hi</b> {ok}</p>"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
	segments: Vec<Segment>,
}

impl Template {
	/// Parse template source into literal and slot segments
	pub fn parse(source: &str) -> Self {
		let mut segments = Vec::new();
		let mut literal = String::new();
		let mut rest = source;

		while let Some(pos) = rest.find(['{', '}']) {
			literal.push_str(&rest[..pos]);
			let tail = &rest[pos..];

			if let Some(after) = tail.strip_prefix("{{") {
				literal.push('{');
				rest = after;
				continue;
			}
			if let Some(after) = tail.strip_prefix("}}") {
				literal.push('}');
				rest = after;
				continue;
			}
			if let Some(body) = tail.strip_prefix('{')
				&& let Some(end) = body.find('}')
				&& is_slot_name(&body[..end])
			{
				if !literal.is_empty() {
					segments.push(Segment::Literal(std::mem::take(&mut literal)));
				}
				segments.push(Segment::Slot(body[..end].to_string()));
				rest = &body[end + 1..];
				continue;
			}

			literal.push_str(&tail[..1]);
			rest = &tail[1..];
		}

		literal.push_str(rest);
		if !literal.is_empty() {
			segments.push(Segment::Literal(literal));
		}

		Self { segments }
	}

	/// Slot names in order of appearance
	pub fn slot_names(&self) -> impl Iterator<Item = &str> {
		self.segments.iter().filter_map(|segment| match segment {
			Segment::Slot(name) => Some(name.as_str()),
			Segment::Literal(_) => None,
		})
	}

	/// Substitute slots; every slot in the template must be bound.
	pub fn render(&self, slots: &Slots) -> Result<Markup, WidgetError> {
		let mut out = String::new();
		for segment in &self.segments {
			match segment {
				Segment::Literal(text) => out.push_str(text),
				Segment::Slot(name) => match slots.get(name) {
					Some(Slot::Text(text)) => out.push_str(&html_escape(text)),
					Some(Slot::Markup(markup)) => out.push_str(markup.as_str()),
					None => return Err(WidgetError::UnknownSlot(name.clone())),
				},
			}
		}
		Ok(Markup(out))
	}
}

fn is_slot_name(name: &str) -> bool {
	let mut chars = name.chars();
	matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_html_escape() {
		assert_eq!(html_escape("<script>"), "&lt;script&gt;");
		assert_eq!(html_escape("A & B"), "A &amp; B");
		assert_eq!(html_escape(r#"He said "hi""#), "He said &quot;hi&quot;");
		assert_eq!(html_escape("it's"), "it&#x27;s");
	}

	#[rstest]
	fn test_text_slot_is_escaped() {
		let template = Template::parse("<span>{label}</span>");
		let html = template
			.render(&Slots::new().text("label", "<img src=x onerror=alert(1)>"))
			.unwrap();
		assert_eq!(
			html.as_str(),
			"<span>&lt;img src=x onerror=alert(1)&gt;</span>"
		);
	}

	#[rstest]
	fn test_markup_slot_is_verbatim() {
		let template = Template::parse("<div>{body}</div>");
		let html = template
			.render(&Slots::new().markup("body", Markup::raw("<input />")))
			.unwrap();
		assert_eq!(html.as_str(), "<div><input /></div>");
	}

	#[rstest]
	fn test_missing_slot_is_an_error() {
		let template = Template::parse("{a}{b}");
		let result = template.render(&Slots::new().text("a", "x"));
		assert!(matches!(result, Err(WidgetError::UnknownSlot(name)) if name == "b"));
	}

	#[rstest]
	#[case("a {{b}} c", "a {b} c")]
	#[case(".x { color: red; }", ".x { color: red; }")]
	#[case("if (a) { go(); }", "if (a) { go(); }")]
	#[case("unclosed {brace", "unclosed {brace")]
	#[case("}", "}")]
	fn test_literal_braces(#[case] source: &str, #[case] expected: &str) {
		let template = Template::parse(source);
		assert_eq!(template.slot_names().count(), 0);
		assert_eq!(template.render(&Slots::new()).unwrap().as_str(), expected);
	}

	#[rstest]
	fn test_slot_names_in_order() {
		let template = Template::parse("{first}-{second_2}-{first}");
		let names: Vec<&str> = template.slot_names().collect();
		assert_eq!(names, vec!["first", "second_2", "first"]);
	}

	#[rstest]
	fn test_markup_collect() {
		let joined: Markup = vec![Markup::raw("<a>"), Markup::text("&"), Markup::raw("</a>")]
			.into_iter()
			.collect();
		assert_eq!(joined.as_str(), "<a>&amp;</a>");
	}
}
