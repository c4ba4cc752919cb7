//! Escaping guarantees of the widget layer
//!
//! Whatever a caller puts into values, labels or attribute values, the emitted
//! markup must not contain a live tag or break out of an attribute.

use formsmith_widgets::{
	Attrs, BUILTIN_TAGS, Markup, SelectOption, Slots, Template, WidgetRegistry, WidgetRequest,
	html_escape, theme_for,
};
use proptest::prelude::*;
use rstest::rstest;

fn render_all(value: &str, label: &str) -> Vec<String> {
	let registry = WidgetRegistry::with_builtins();
	let theme = theme_for("bootstrap");
	let attrs = Attrs::new().placeholder(value).attr("title", label);
	let options = vec![SelectOption::new(value, label).selected(true)];

	BUILTIN_TAGS
		.iter()
		.copied()
		.map(|element| {
			registry
				.render(&WidgetRequest {
					element,
					name: "field",
					id: "id_field",
					value: Some(value),
					checked: true,
					attrs: &attrs,
					options: &options,
					theme: theme.as_ref(),
				})
				.unwrap()
				.into_string()
		})
		.collect()
}

#[rstest]
#[case("<script>alert(1)</script>")]
#[case(r#""><img src=x onerror=alert(1)>"#)]
#[case("' onmouseover='alert(1)")]
fn test_builtins_escape_hostile_values(#[case] payload: &str) {
	for html in render_all(payload, payload) {
		assert!(!html.contains("<script>"), "{}", html);
		assert!(!html.contains("<img"), "{}", html);
		assert!(!html.contains("' onmouseover"), "{}", html);
	}
}

proptest! {
	/// Test: escaped text never contains raw markup delimiters
	/// Category: Property
	#[rstest]
	fn prop_html_escape_removes_delimiters(input in ".*") {
		let escaped = html_escape(&input);
		prop_assert!(!escaped.contains('<'));
		prop_assert!(!escaped.contains('>'));
		prop_assert!(!escaped.contains('"'));
		prop_assert!(!escaped.contains('\''));
	}

	/// Test: a text slot renders exactly the escaped value
	/// Category: Property
	#[rstest]
	fn prop_text_slot_matches_html_escape(input in ".*") {
		let template = Template::parse("[{v}]");
		let html = template.render(&Slots::new().text("v", input.clone())).unwrap();
		prop_assert_eq!(html, Markup::raw(format!("[{}]", html_escape(&input))));
	}
}
