//! Field rendering
//!
//! Turns one [`FieldDescriptor`] plus its value and error into a labelled
//! control. The widget itself comes from the context's [`WidgetRegistry`];
//! this module owns the surrounding chrome (label, help text, inline error)
//! and the mapping from schema constraints to HTML attributes.
//!
//! [`WidgetRegistry`]: formsmith_widgets::WidgetRegistry

use crate::context::{FormContext, LayoutMode};
use crate::schema::{FieldDescriptor, FieldType};
use formsmith_widgets::{
	Attrs, Markup, SelectOption, Slots, StyleRole, Template, Theme, WidgetRequest, html_escape,
};
use serde_json::Value;
use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::LazyLock;

const TEXT_LIKE: &[&str] = &[
	"text", "email", "password", "url", "tel", "search", "textarea",
];
const NUMERIC: &[&str] = &["number", "range"];
const CHECK_LIKE: &[&str] = &["checkbox", "toggle"];
const CHOICE: &[&str] = &["select", "multiselect", "radio"];

static FIELD: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(r#"<div{class} data-field="{name}" data-layout="{layout}">{label}{control}{help}{error}</div>"#)
});

static CHECK_FIELD: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(concat!(
		r#"<div{class} data-field="{name}" data-layout="{layout}">"#,
		"<div{check_class}>{control}{label}</div>",
		"{help}{error}",
		"</div>",
	))
});

static GROUP_FIELD: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(r#"<fieldset{class} data-field="{name}" data-layout="{layout}">{label}{control}{help}{error}</fieldset>"#)
});

static LABEL: LazyLock<Template> =
	LazyLock::new(|| Template::parse(r#"<label for="{id}"{class}>{text}{marker}</label>"#));

static LEGEND: LazyLock<Template> =
	LazyLock::new(|| Template::parse(r#"<legend{class}>{text}{marker}</legend>"#));

static REQUIRED_MARKER: LazyLock<Template> =
	LazyLock::new(|| Template::parse(r#" <span{class} aria-hidden="true">*</span>"#));

static HELP: LazyLock<Template> =
	LazyLock::new(|| Template::parse(r#"<div id="{id}"{class}>{text}</div>"#));

static ERROR: LazyLock<Template> =
	LazyLock::new(|| Template::parse(r#"<div id="{id}"{class} role="alert">{text}</div>"#));

static DIAGNOSTIC: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(concat!(
		"<!-- formsmith: {comment} -->",
		r#"<div{class} data-formsmith-field-error="{name}">Field "{label}" could not be rendered.</div>"#,
	))
});

/// Inputs for rendering one leaf field
#[derive(Debug, Clone, Copy)]
pub struct FieldRequest<'r> {
	/// Name relative to the context scope
	pub name: &'r str,
	pub field: &'r FieldDescriptor,
	pub value: Option<&'r Value>,
	pub error: Option<&'r str>,
	pub required_fields: &'r BTreeSet<String>,
	pub layout: LayoutMode,
}

/// ` class="..."` for a role, or nothing when the theme has no class for it
pub(crate) fn class_attr(theme: &dyn Theme, role: StyleRole) -> Markup {
	class_attr_with(theme, role, "")
}

pub(crate) fn class_attr_with(theme: &dyn Theme, role: StyleRole, extra: &str) -> Markup {
	Attrs::new().class(theme.class(role)).class(extra).render()
}

/// HTML id for a submission name: `pets[0].name` becomes `id_pets_0__name`.
pub fn field_id(html_name: &str) -> String {
	let sanitized: String = html_name
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
		.collect();
	format!("id_{}", sanitized)
}

/// Scalar value as submitted text; `None` for null and absent values.
pub fn value_to_string(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(s) => Some(s.clone()),
		Value::Bool(b) => Some(b.to_string()),
		Value::Number(n) => Some(n.to_string()),
		other => Some(other.to_string()),
	}
}

/// Checked state of a checkbox-like control: `true`, `"true"`, `"1"` or `"on"`,
/// matched exactly.
pub fn is_checked(value: Option<&Value>) -> bool {
	match value {
		Some(Value::Bool(b)) => *b,
		Some(Value::String(s)) => matches!(s.as_str(), "true" | "1" | "on"),
		_ => false,
	}
}

/// Choices for a selection control, marked selected against `current`.
///
/// Explicit `options`/`choices` hints win over `enum` values. An option may be
/// a scalar, a `{"value", "label"}` object or a `[value, label]` pair.
pub fn resolve_options(field: &FieldDescriptor, current: Option<&Value>) -> Vec<SelectOption> {
	let explicit = ["options", "choices"]
		.iter()
		.find_map(|key| field.ui.get(*key).and_then(Value::as_array));

	let options: Vec<SelectOption> = match explicit {
		Some(items) => items.iter().filter_map(option_from_value).collect(),
		None => field
			.enum_values
			.iter()
			.filter_map(|v| value_to_string(v).map(|s| SelectOption::new(s.clone(), s)))
			.collect(),
	};

	let selected: Vec<String> = match current {
		Some(Value::Array(values)) => values.iter().filter_map(value_to_string).collect(),
		Some(value) => value_to_string(value).into_iter().collect(),
		None => Vec::new(),
	};

	options
		.into_iter()
		.map(|option| {
			let is_selected = selected.contains(&option.value);
			option.selected(is_selected)
		})
		.collect()
}

fn option_from_value(item: &Value) -> Option<SelectOption> {
	match item {
		Value::Object(map) => {
			let value = map.get("value").and_then(value_to_string)?;
			let label = map
				.get("label")
				.and_then(value_to_string)
				.unwrap_or_else(|| value.clone());
			Some(SelectOption::new(value, label))
		}
		Value::Array(pair) => {
			let value = pair.first().and_then(value_to_string)?;
			let label = pair
				.get(1)
				.and_then(value_to_string)
				.unwrap_or_else(|| value.clone());
			Some(SelectOption::new(value, label))
		}
		other => value_to_string(other).map(|s| SelectOption::new(s.clone(), s)),
	}
}

pub(crate) fn format_number(n: f64) -> String {
	if n.fract() == 0.0 && n.abs() < 1e15 {
		format!("{}", n as i64)
	} else {
		n.to_string()
	}
}

/// Control attributes derived from constraints, UI hints and error state
fn build_attributes(
	field: &FieldDescriptor,
	required: bool,
	help_id: Option<&str>,
	error_id: Option<&str>,
	theme: &dyn Theme,
) -> Attrs {
	let element = field.element.as_str();
	let mut attrs = Attrs::new();
	let constraints = &field.constraints;

	if required && !CHECK_LIKE.contains(&element) {
		attrs.set_flag("required");
	}

	if TEXT_LIKE.contains(&element) {
		if let Some(min) = constraints.min_length {
			attrs.set("minlength", min.to_string());
		}
		if let Some(max) = constraints.max_length {
			attrs.set("maxlength", max.to_string());
		}
		if let Some(pattern) = &constraints.pattern
			&& element != "textarea"
		{
			attrs.set("pattern", pattern.clone());
		}
	}

	if NUMERIC.contains(&element) {
		if let Some(min) = constraints.minimum.or(constraints.exclusive_minimum) {
			attrs.set("min", format_number(min));
		}
		if let Some(max) = constraints.maximum.or(constraints.exclusive_maximum) {
			attrs.set("max", format_number(max));
		}
		match constraints.multiple_of {
			Some(step) => attrs.set("step", format_number(step)),
			None if field.field_type == FieldType::Integer => attrs.set("step", "1"),
			None if field.field_type == FieldType::Number => attrs.set("step", "any"),
			None => {}
		}
	}

	if let Some(placeholder) = field.ui_str("placeholder")
		&& (TEXT_LIKE.contains(&element) || NUMERIC.contains(&element) || element == "select")
	{
		attrs.set("placeholder", placeholder);
	}
	for key in ["autocomplete", "inputmode", "rows", "cols", "accept", "title"] {
		if let Some(value) = field.ui.get(key).and_then(value_to_string) {
			attrs.set(key, value);
		}
	}
	for key in ["disabled", "readonly", "autofocus", "multiple"] {
		if field.ui_flag(key) {
			attrs.set_flag(key);
		}
	}
	if let Some(class) = field.ui_str("class") {
		attrs.add_class(class);
	}
	if let Some(style) = field.ui_str("style") {
		attrs.add_style(style);
	}
	if let Some(Value::Object(extra)) = field.ui.get("attrs") {
		for (key, value) in extra {
			match value {
				Value::Bool(true) => attrs.set_flag(key.clone()),
				Value::Bool(false) | Value::Null => {}
				other => {
					if let Some(text) = value_to_string(other) {
						attrs.set(key.clone(), text);
					}
				}
			}
		}
	}

	if error_id.is_some() {
		attrs.add_class(theme.class(StyleRole::InvalidInput));
		attrs.set("aria-invalid", "true");
	}
	let described_by: Vec<&str> = [help_id, error_id].into_iter().flatten().collect();
	if !described_by.is_empty() {
		attrs.set("aria-describedby", described_by.join(" "));
	}

	attrs
}

/// Render one leaf field with its label, help text and error.
///
/// Failures of the widget renderer never propagate: the field is replaced by a
/// diagnostic comment and a short visible notice, and the rest of the form is
/// unaffected.
pub fn render_field(request: &FieldRequest<'_>, ctx: &FormContext<'_>) -> Markup {
	let field = request.field;
	let theme = ctx.theme;
	let html_name = ctx.qualify(request.name);
	let id = field_id(&html_name);
	let element = field.element.as_str();

	let value = request.value.or(field.default.as_ref());
	let value_text = match element {
		"password" if !ctx.preserve_passwords => None,
		"file" => None,
		_ if CHECK_LIKE.contains(&element) || element == "multiselect" => None,
		_ => value.and_then(value_to_string),
	};

	if field.is_hidden() {
		let attrs = Attrs::new();
		return invoke_widget(
			ctx,
			field,
			&html_name,
			&WidgetRequest {
				element: "hidden",
				name: &html_name,
				id: &id,
				value: value_text.as_deref(),
				checked: false,
				attrs: &attrs,
				options: &[],
				theme,
			},
		);
	}

	let required = field.required || request.required_fields.contains(request.name);
	let help_id = field.help_text.as_ref().map(|_| format!("{}_help", id));
	let error_id = request.error.map(|_| format!("{}_error", id));
	let attrs = build_attributes(field, required, help_id.as_deref(), error_id.as_deref(), theme);

	let options = if CHOICE.contains(&element) {
		resolve_options(field, value)
	} else {
		Vec::new()
	};

	let control = invoke_widget(
		ctx,
		field,
		&html_name,
		&WidgetRequest {
			element,
			name: &html_name,
			id: &id,
			value: value_text.as_deref(),
			checked: CHECK_LIKE.contains(&element) && is_checked(value),
			attrs: &attrs,
			options: &options,
			theme,
		},
	);

	let check_like = CHECK_LIKE.contains(&element);
	let label_role = if check_like {
		StyleRole::CheckLabel
	} else {
		StyleRole::Label
	};
	let marker = if required {
		render_or_empty(
			&REQUIRED_MARKER,
			Slots::new().markup("class", class_attr(theme, StyleRole::RequiredMarker)),
		)
	} else {
		Markup::empty()
	};
	// radio ids are per option, so the group is labelled by a legend
	let grouped = element == "radio";
	let label_slots = Slots::new()
		.markup("class", class_attr(theme, label_role))
		.text("text", field.label.as_str())
		.markup("marker", marker);
	let label = if grouped {
		render_or_empty(&LEGEND, label_slots)
	} else {
		render_or_empty(&LABEL, label_slots.text("id", id.as_str()))
	};
	let help = match (&field.help_text, &help_id) {
		(Some(text), Some(help_id)) => render_or_empty(
			&HELP,
			Slots::new()
				.text("id", help_id.as_str())
				.markup("class", class_attr(theme, StyleRole::HelpText))
				.text("text", text.as_str()),
		),
		_ => Markup::empty(),
	};
	let error = match (request.error, &error_id) {
		(Some(text), Some(error_id)) => render_or_empty(
			&ERROR,
			Slots::new()
				.text("id", error_id.as_str())
				.markup("class", class_attr(theme, StyleRole::ErrorText))
				.text("text", text),
		),
		_ => Markup::empty(),
	};

	let slots = Slots::new()
		.markup("class", class_attr(theme, StyleRole::FieldWrapper))
		.text("name", html_name.as_str())
		.text("layout", request.layout.as_str())
		.markup("label", label)
		.markup("control", control)
		.markup("help", help)
		.markup("error", error);

	if check_like {
		let wrapper = if element == "toggle" {
			StyleRole::SwitchWrapper
		} else {
			StyleRole::CheckWrapper
		};
		render_or_empty(&CHECK_FIELD, slots.markup("check_class", class_attr(theme, wrapper)))
	} else if grouped {
		render_or_empty(&GROUP_FIELD, slots)
	} else {
		render_or_empty(&FIELD, slots)
	}
}

fn invoke_widget(
	ctx: &FormContext<'_>,
	field: &FieldDescriptor,
	html_name: &str,
	request: &WidgetRequest<'_>,
) -> Markup {
	let outcome = catch_unwind(AssertUnwindSafe(|| ctx.registry.render(request)));
	let message = match outcome {
		Ok(Ok(markup)) => return markup,
		Ok(Err(err)) => format!("{:#}", err),
		Err(_) => "widget renderer panicked".to_string(),
	};

	tracing::warn!(
		"Failed to render field '{}' with element '{}': {}",
		html_name,
		request.element,
		message
	);
	diagnostic(ctx.theme, html_name, &field.label, &field.element, &message)
}

fn diagnostic(theme: &dyn Theme, html_name: &str, label: &str, element: &str, message: &str) -> Markup {
	let comment = format!(
		"field '{}' (element '{}') failed to render: {}",
		html_name, element, message
	)
	.replace("--", "- -");

	render_or_empty(
		&DIAGNOSTIC,
		Slots::new()
			.markup("comment", Markup::raw(html_escape(&comment)))
			.markup("class", class_attr(theme, StyleRole::WarningAlert))
			.text("name", html_name)
			.text("label", label),
	)
}

pub(crate) fn render_or_empty(template: &Template, slots: Slots) -> Markup {
	template.render(&slots).unwrap_or_else(|err| {
		tracing::warn!("Template rendering failed: {}", err);
		Markup::empty()
	})
}
