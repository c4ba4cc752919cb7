//! Built-in widgets

use crate::markup::{Markup, Slots, Template, html_escape};
use crate::registry::{WidgetFn, WidgetRegistry, WidgetRequest};
use crate::theme::StyleRole;
use std::sync::{Arc, LazyLock};

static INPUT: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(r#"<input type="{input_type}" name="{name}" id="{id}"{value}{attrs} />"#)
});

static TEXTAREA: LazyLock<Template> =
	LazyLock::new(|| Template::parse(r#"<textarea name="{name}" id="{id}"{attrs}>{value}</textarea>"#));

static CHECKBOX: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(
		r#"<input type="checkbox" name="{name}" id="{id}" value="true"{checked}{attrs} />"#,
	)
});

static SELECT: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(r#"<select name="{name}" id="{id}"{multiple}{attrs}>{options}</select>"#)
});

static OPTION: LazyLock<Template> =
	LazyLock::new(|| Template::parse(r#"<option value="{value}"{selected}>{label}</option>"#));

static RADIO: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(concat!(
		r#"<div class="{wrapper_class}">"#,
		r#"<input type="radio" name="{name}" id="{id}" value="{value}"{checked}{attrs} />"#,
		r#"<label class="{label_class}" for="{id}">{label}</label>"#,
		"</div>",
	))
});

/// Label of the empty choice prepended to single selects
pub const EMPTY_CHOICE_LABEL: &str = "---------";

/// Tags of the built-in widgets
pub const BUILTIN_TAGS: &[&str] = &[
	"text", "email", "password", "number", "url", "tel", "search", "date", "time", "datetime",
	"month", "week", "color", "range", "hidden", "file", "textarea", "checkbox", "toggle",
	"select", "multiselect", "radio",
];

/// Alternate spellings accepted for built-in tags
pub const BUILTIN_ALIASES: &[(&str, &str)] = &[
	("input", "text"),
	("string", "text"),
	("textfield", "text"),
	("integer", "number"),
	("float", "number"),
	("uri", "url"),
	("phone", "tel"),
	("date-time", "datetime"),
	("datetime-local", "datetime"),
	("colour", "color"),
	("slider", "range"),
	("upload", "file"),
	("text_area", "textarea"),
	("long_text", "textarea"),
	("boolean", "toggle"),
	("switch", "toggle"),
	("dropdown", "select"),
	("choice", "select"),
	("multi_select", "multiselect"),
	("multiple_select", "multiselect"),
	("radios", "radio"),
	("radio_group", "radio"),
];

pub(crate) fn register_builtins(registry: &mut WidgetRegistry) {
	for (tag, input_type, role) in [
		("text", "text", StyleRole::Input),
		("email", "email", StyleRole::Input),
		("number", "number", StyleRole::Input),
		("url", "url", StyleRole::Input),
		("tel", "tel", StyleRole::Input),
		("search", "search", StyleRole::Input),
		("date", "date", StyleRole::Input),
		("time", "time", StyleRole::Input),
		("datetime", "datetime-local", StyleRole::Input),
		("month", "month", StyleRole::Input),
		("week", "week", StyleRole::Input),
		("password", "password", StyleRole::Input),
		("color", "color", StyleRole::ColorInput),
		("range", "range", StyleRole::RangeInput),
	] {
		registry.register_shared(tag, input(input_type, role));
	}

	registry.register("hidden", |req: &WidgetRequest<'_>| {
		render_input(req, "hidden", None, req.value)
	});
	registry.register("file", |req: &WidgetRequest<'_>| {
		render_input(req, "file", Some(StyleRole::FileInput), None)
	});
	registry.register("textarea", render_textarea);
	registry.register("checkbox", |req: &WidgetRequest<'_>| render_checkbox(req, false));
	registry.register("toggle", |req: &WidgetRequest<'_>| render_checkbox(req, true));
	registry.register("select", |req: &WidgetRequest<'_>| render_select(req, false));
	registry.register("multiselect", |req: &WidgetRequest<'_>| render_select(req, true));
	registry.register("radio", render_radio);

	for (alias, target) in BUILTIN_ALIASES {
		registry.alias(*alias, target);
	}
}

pub(crate) fn text_input() -> WidgetFn {
	input("text", StyleRole::Input)
}

fn input(input_type: &'static str, role: StyleRole) -> WidgetFn {
	Arc::new(move |req: &WidgetRequest<'_>| render_input(req, input_type, Some(role), req.value))
}

fn render_input(
	req: &WidgetRequest<'_>,
	input_type: &str,
	role: Option<StyleRole>,
	value: Option<&str>,
) -> anyhow::Result<Markup> {
	let mut attrs = req.attrs.clone();
	if let Some(role) = role {
		attrs.add_class(req.theme.class(role));
	}
	let value = value
		.map(|v| Markup::raw(format!(r#" value="{}""#, html_escape(v))))
		.unwrap_or_default();

	Ok(INPUT.render(
		&Slots::new()
			.text("input_type", input_type)
			.text("name", req.name)
			.text("id", req.id)
			.markup("value", value)
			.markup("attrs", attrs.render()),
	)?)
}

fn render_textarea(req: &WidgetRequest<'_>) -> anyhow::Result<Markup> {
	let mut attrs = req.attrs.clone();
	attrs.add_class(req.theme.class(StyleRole::Textarea));
	if !attrs.contains("rows") {
		attrs.set("rows", "4");
	}

	Ok(TEXTAREA.render(
		&Slots::new()
			.text("name", req.name)
			.text("id", req.id)
			.text("value", req.value.unwrap_or_default())
			.markup("attrs", attrs.render()),
	)?)
}

fn render_checkbox(req: &WidgetRequest<'_>, switch: bool) -> anyhow::Result<Markup> {
	let mut attrs = req.attrs.clone();
	attrs.add_class(req.theme.class(StyleRole::CheckInput));
	if switch {
		attrs.set("role", "switch");
	}
	let checked = if req.checked {
		Markup::raw(" checked")
	} else {
		Markup::empty()
	};

	Ok(CHECKBOX.render(
		&Slots::new()
			.text("name", req.name)
			.text("id", req.id)
			.markup("checked", checked)
			.markup("attrs", attrs.render()),
	)?)
}

fn render_select(req: &WidgetRequest<'_>, multiple: bool) -> anyhow::Result<Markup> {
	let mut attrs = req.attrs.clone();
	attrs.add_class(req.theme.class(StyleRole::Select));
	attrs.remove("placeholder");

	let mut options = Vec::with_capacity(req.options.len() + 1);
	if !multiple {
		let label = req
			.attrs
			.get("placeholder")
			.unwrap_or(EMPTY_CHOICE_LABEL);
		options.push(render_option("", label, false)?);
	}
	for option in req.options {
		options.push(render_option(&option.value, &option.label, option.selected)?);
	}

	let multiple = if multiple {
		Markup::raw(" multiple")
	} else {
		Markup::empty()
	};

	Ok(SELECT.render(
		&Slots::new()
			.text("name", req.name)
			.text("id", req.id)
			.markup("multiple", multiple)
			.markup("attrs", attrs.render())
			.markup("options", options.into_iter().collect()),
	)?)
}

fn render_option(value: &str, label: &str, selected: bool) -> anyhow::Result<Markup> {
	let selected = if selected {
		Markup::raw(" selected")
	} else {
		Markup::empty()
	};
	Ok(OPTION.render(
		&Slots::new()
			.text("value", value)
			.text("label", label)
			.markup("selected", selected),
	)?)
}

fn render_radio(req: &WidgetRequest<'_>) -> anyhow::Result<Markup> {
	let mut attrs = req.attrs.clone();
	attrs.remove("placeholder");
	attrs.add_class(req.theme.class(StyleRole::CheckInput));
	let attrs = attrs.render();

	req.options
		.iter()
		.enumerate()
		.map(|(i, option)| -> anyhow::Result<Markup> {
			let checked = if option.selected {
				Markup::raw(" checked")
			} else {
				Markup::empty()
			};
			Ok(RADIO.render(
				&Slots::new()
					.text("wrapper_class", req.theme.class(StyleRole::RadioWrapper))
					.text("label_class", req.theme.class(StyleRole::CheckLabel))
					.text("name", req.name)
					.text("id", format!("{}_{}", req.id, i))
					.text("value", option.value.as_str())
					.text("label", option.label.as_str())
					.markup("checked", checked)
					.markup("attrs", attrs.clone()),
			)?)
		})
		.collect()
}
