//! Layout composition
//!
//! Arranges the fields of one schema scope: stacked vertically, paired into
//! two-column rows, or grouped into tabs. Fields that are themselves schemas
//! become nested sections rendered recursively with a narrowed context;
//! repeatable collections are handed to [`crate::collection`].

use crate::collection;
use crate::context::{FormContext, LayoutMode};
use crate::error::SchemaError;
use crate::field::{FieldRequest, class_attr, class_attr_with, field_id, render_field, render_or_empty};
use crate::schema::{FieldDescriptor, SchemaMetadata, build_schema_metadata, split_layout_fields};
use formsmith_conf::RenderSettings;
use formsmith_widgets::{Markup, Slots, StyleRole, Template};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::LazyLock;

/// Attribute marking a tab container in the output
pub(crate) const TABS_MARKER: &str = "data-formsmith-tabs";

static ROW: LazyLock<Template> =
	LazyLock::new(|| Template::parse(r#"<div{class} data-formsmith-row>{columns}</div>"#));

static COLUMN: LazyLock<Template> = LazyLock::new(|| Template::parse("<div{class}>{content}</div>"));

static TAB_CONTAINER: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(concat!(
		r#"<div{class} id="{id}" data-formsmith-tabs data-active-class="{active_class}">"#,
		r#"<div{list_class} role="tablist">{buttons}</div>"#,
		"{panels}",
		"</div>",
	))
});

static TAB_BUTTON: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(concat!(
		r#"<button type="button"{class} role="tab" id="{id}-tab-{index}" "#,
		r#"aria-controls="{id}-panel-{index}" aria-selected="{selected}" data-formsmith-tab="{index}">"#,
		"{title}</button>",
	))
});

static TAB_PANEL: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(concat!(
		r#"<div{class} role="tabpanel" id="{id}-panel-{index}" aria-labelledby="{id}-tab-{index}" "#,
		r#"data-formsmith-panel="{index}"{hidden}>{content}</div>"#,
	))
});

static SECTION: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(concat!(
		r#"<section{class} data-formsmith-section="{name}">"#,
		"<div{header_class}>{title}</div>",
		r#"<div{body_class}>{help}<div class="formsmith-section-content">{body}</div>{error}</div>"#,
		"</section>",
	))
});

static SECTION_HELP: LazyLock<Template> = LazyLock::new(|| Template::parse("<p{class}>{text}</p>"));

static SECTION_ERROR: LazyLock<Template> =
	LazyLock::new(|| Template::parse(r#"<div{class} role="alert">{text}</div>"#));

static SECTION_WARNING: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(concat!(
		r#"<div{class} role="alert" data-formsmith-section-error="{name}">"#,
		r#"<p>Error rendering section "{title}": {message}</p>{help}"#,
		"</div>",
	))
});

/// Client-side tab switching: toggles `hidden` on panels and the active class on buttons.
pub const TAB_SCRIPT: &str = r#"<script data-formsmith-script="tabs">
(function () {
	document.querySelectorAll('[data-formsmith-tabs]').forEach(function (container) {
		if (container.dataset.formsmithReady) { return; }
		container.dataset.formsmithReady = 'true';
		var activeClasses = (container.getAttribute('data-active-class') || '').split(' ').filter(Boolean);
		var buttons = container.querySelectorAll(':scope > [role="tablist"] > [data-formsmith-tab]');
		var panels = container.querySelectorAll(':scope > [data-formsmith-panel]');
		buttons.forEach(function (button) {
			button.addEventListener('click', function () {
				var target = button.getAttribute('data-formsmith-tab');
				buttons.forEach(function (other) {
					var active = other === button;
					other.setAttribute('aria-selected', active ? 'true' : 'false');
					activeClasses.forEach(function (name) { other.classList.toggle(name, active); });
				});
				panels.forEach(function (panel) {
					panel.hidden = panel.getAttribute('data-formsmith-panel') !== target;
				});
			});
		});
	});
})();
</script>"#;

/// Render every field of `meta` in the requested arrangement.
///
/// A scope made only of nested sections (more than one, and nothing else) is
/// promoted to one tab per section when `auto_tab_layout_fields` is set.
pub fn render_fields(meta: &SchemaMetadata, ctx: &FormContext<'_>, layout: LayoutMode) -> Markup {
	let (sections, others) = split_layout_fields(&meta.fields);
	if ctx.settings.auto_tab_layout_fields && sections.len() > 1 && others.is_empty() {
		return render_layout_fields_as_tabs(meta, &sections, ctx);
	}

	match layout {
		LayoutMode::Vertical => meta
			.fields
			.iter()
			.map(|field| render_entry(meta, field, ctx, layout))
			.collect(),
		LayoutMode::SideBySide => render_side_by_side(meta, ctx),
		LayoutMode::Tabbed => {
			let fields: Vec<&FieldDescriptor> = meta.fields.iter().collect();
			let tabs = group_fields_into_tabs(&fields, ctx.settings)
				.into_iter()
				.map(|(title, fields)| {
					let content = fields
						.into_iter()
						.map(|field| render_entry(meta, field, ctx, LayoutMode::Vertical))
						.collect();
					(title, content)
				})
				.collect();
			render_tabs(tabs, ctx)
		}
	}
}

/// Render one field of any kind: leaf, nested section or collection.
pub fn render_entry(
	meta: &SchemaMetadata,
	field: &FieldDescriptor,
	ctx: &FormContext<'_>,
	layout: LayoutMode,
) -> Markup {
	if field.is_layout() {
		render_nested_section(meta, field, ctx)
	} else if field.is_collection() {
		collection::render_collection(meta, field, ctx)
	} else {
		render_field(
			&FieldRequest {
				name: &field.name,
				field,
				value: ctx.value(&field.name),
				error: ctx.error(&field.name),
				required_fields: &meta.required,
				layout,
			},
			ctx,
		)
	}
}

/// Pair leaf fields into two-column rows. Sections and collections take a full row.
fn render_side_by_side(meta: &SchemaMetadata, ctx: &FormContext<'_>) -> Markup {
	let theme = ctx.theme;
	let mut out = Markup::empty();
	let mut pending: Vec<Markup> = Vec::with_capacity(2);

	let flush = |pending: &mut Vec<Markup>, out: &mut Markup| {
		if pending.is_empty() {
			return;
		}
		let columns: Markup = pending
			.drain(..)
			.map(|content| {
				render_or_empty(
					&COLUMN,
					Slots::new()
						.markup("class", class_attr_with(theme, StyleRole::Column, "side-by-side-column"))
						.markup("content", content),
				)
			})
			.collect();
		out.push(&render_or_empty(
			&ROW,
			Slots::new()
				.markup("class", class_attr_with(theme, StyleRole::Row, "side-by-side-row"))
				.markup("columns", columns),
		));
	};

	for field in &meta.fields {
		let content = render_entry(meta, field, ctx, LayoutMode::SideBySide);
		if field.is_layout() || field.is_collection() {
			flush(&mut pending, &mut out);
			out.push(&content);
			continue;
		}
		pending.push(content);
		if pending.len() == 2 {
			flush(&mut pending, &mut out);
		}
	}
	flush(&mut pending, &mut out);
	out
}

/// Group fields by the first tab rule whose keyword occurs in the field name.
///
/// Tabs appear in rule order followed by the fallback tab; empty tabs are
/// dropped. When nothing was grouped at all, one tab titled
/// `settings.empty_tab_title` holds every field.
///
/// # Examples
///
/// ```
/// use formsmith_conf::RenderSettings;
/// use formsmith_forms::layout::group_fields_into_tabs;
/// use formsmith_forms::schema::FieldDescriptor;
/// use serde_json::json;
///
/// let settings = RenderSettings::default();
/// let fields: Vec<FieldDescriptor> = ["email", "username", "newsletter"]
///     .iter()
///     .map(|name| FieldDescriptor::from_schema(name, &json!({"type": "string"}), false, &settings))
///     .collect();
/// let refs: Vec<&FieldDescriptor> = fields.iter().collect();
///
/// let titles: Vec<String> = group_fields_into_tabs(&refs, &settings)
///     .into_iter()
///     .map(|(title, _)| title)
///     .collect();
/// assert_eq!(titles, ["Personal", "Contact", "Additional"]);
/// ```
pub fn group_fields_into_tabs<'f>(
	fields: &[&'f FieldDescriptor],
	settings: &RenderSettings,
) -> Vec<(String, Vec<&'f FieldDescriptor>)> {
	let mut groups: Vec<(String, Vec<&'f FieldDescriptor>)> = settings
		.tab_groups
		.iter()
		.map(|rule| (rule.title.clone(), Vec::new()))
		.collect();
	groups.push((settings.fallback_tab_title.clone(), Vec::new()));

	for field in fields {
		let title = settings.tab_title_for(&field.name);
		if let Some((_, members)) = groups.iter_mut().find(|(t, _)| t == title) {
			members.push(field);
		}
	}

	groups.retain(|(_, members)| !members.is_empty());
	if groups.is_empty() {
		groups.push((settings.empty_tab_title.clone(), fields.to_vec()));
	}
	groups
}

/// One tab per nested section, titled with the section label.
pub fn render_layout_fields_as_tabs(
	meta: &SchemaMetadata,
	sections: &[&FieldDescriptor],
	ctx: &FormContext<'_>,
) -> Markup {
	let tabs = sections
		.iter()
		.map(|field| (field.label.clone(), render_nested_section(meta, field, ctx)))
		.collect();
	render_tabs(tabs, ctx)
}

/// Tab container with one button and one panel per `(title, content)`; the first tab is active.
pub fn render_tabs(tabs: Vec<(String, Markup)>, ctx: &FormContext<'_>) -> Markup {
	let theme = ctx.theme;
	let id = field_id(&ctx.qualify("tabs"));
	let active_class = theme.class(StyleRole::TabButtonActive);

	let mut buttons = Markup::empty();
	let mut panels = Markup::empty();
	for (index, (title, content)) in tabs.into_iter().enumerate() {
		let active = index == 0;
		let extra = if active { active_class } else { "" };
		let index = index.to_string();

		buttons.push(&render_or_empty(
			&TAB_BUTTON,
			Slots::new()
				.markup("class", class_attr_with(theme, StyleRole::TabButton, extra))
				.text("id", id.as_str())
				.text("index", index.as_str())
				.text("selected", if active { "true" } else { "false" })
				.text("title", title),
		));
		panels.push(&render_or_empty(
			&TAB_PANEL,
			Slots::new()
				.markup("class", class_attr_with(theme, StyleRole::TabPanel, extra))
				.text("id", id.as_str())
				.text("index", index.as_str())
				.markup(
					"hidden",
					if active {
						Markup::empty()
					} else {
						Markup::raw(" hidden")
					},
				)
				.markup("content", content),
		));
	}

	render_or_empty(
		&TAB_CONTAINER,
		Slots::new()
			.markup("class", class_attr(theme, StyleRole::TabContainer))
			.text("id", id)
			.text("active_class", active_class)
			.markup("list_class", class_attr(theme, StyleRole::TabList))
			.markup("buttons", buttons)
			.markup("panels", panels),
	)
}

/// Data for a nested section.
///
/// Uses `data[field_name]` when it is an object, then any configured fallback
/// keys, then flat leftovers such as `"profile.name"` re-keyed to `"name"`.
pub fn nested_form_data<'d>(
	field_name: &str,
	data: &'d Map<String, Value>,
	settings: &RenderSettings,
) -> Cow<'d, Map<String, Value>> {
	if let Some(Value::Object(nested)) = data.get(field_name) {
		return Cow::Borrowed(nested);
	}
	for key in settings.nested_fallbacks(field_name) {
		if let Some(Value::Object(nested)) = data.get(key) {
			tracing::debug!("Section '{}' uses data from fallback key '{}'", field_name, key);
			return Cow::Borrowed(nested);
		}
	}

	let prefix = format!("{}.", field_name);
	let flat: Map<String, Value> = data
		.iter()
		.filter_map(|(key, value)| {
			key.strip_prefix(&prefix)
				.filter(|rest| !rest.is_empty())
				.map(|rest| (rest.to_string(), value.clone()))
		})
		.collect();
	Cow::Owned(flat)
}

/// Nested section card, or a contained warning when the section cannot be resolved.
pub fn render_nested_section(
	meta: &SchemaMetadata,
	field: &FieldDescriptor,
	ctx: &FormContext<'_>,
) -> Markup {
	let theme = ctx.theme;
	let html_name = ctx.qualify(&field.name);
	let help = field
		.help_text
		.as_deref()
		.map(|text| {
			render_or_empty(
				&SECTION_HELP,
				Slots::new()
					.markup("class", class_attr(theme, StyleRole::HelpText))
					.text("text", text),
			)
		})
		.unwrap_or_default();

	let body = match section_body(meta, field, ctx) {
		Ok(body) => body,
		Err(err) => {
			tracing::warn!("Failed to render section '{}': {}", html_name, err);
			return section_warning(ctx, &html_name, &field.label, &err.to_string(), help);
		}
	};

	let error = ctx
		.error(&field.name)
		.map(|text| {
			render_or_empty(
				&SECTION_ERROR,
				Slots::new()
					.markup("class", class_attr(theme, StyleRole::ErrorText))
					.text("text", text),
			)
		})
		.unwrap_or_default();

	render_or_empty(
		&SECTION,
		Slots::new()
			.markup("class", class_attr_with(theme, StyleRole::Card, "layout-field"))
			.text("name", html_name)
			.markup("header_class", class_attr(theme, StyleRole::CardHeader))
			.text("title", field.label.as_str())
			.markup("body_class", class_attr(theme, StyleRole::CardBody))
			.markup("help", help)
			.markup("body", body)
			.markup("error", error),
	)
}

fn section_body(
	meta: &SchemaMetadata,
	field: &FieldDescriptor,
	ctx: &FormContext<'_>,
) -> Result<Markup, SchemaError> {
	if ctx.depth() >= ctx.settings.max_nesting_depth {
		return Err(SchemaError::DepthExceeded(ctx.depth() + 1));
	}

	let sub = meta.sub_schema(field)?;
	let sub_meta = build_schema_metadata(&sub, ctx.settings)
		.map_err(|e| SchemaError::Invalid(e.to_string()))?;
	let data = nested_form_data(&field.name, ctx.data(), ctx.settings);
	let errors = ctx.errors().scoped(&field.name);
	let child = ctx.descend(&format!("{}.", field.name), data, errors);

	let layout = field
		.ui_str("layout")
		.and_then(|layout| layout.parse().ok())
		.unwrap_or(LayoutMode::Vertical);
	Ok(render_fields(&sub_meta, &child, layout))
}

pub(crate) fn section_warning(
	ctx: &FormContext<'_>,
	html_name: &str,
	title: &str,
	message: &str,
	help: Markup,
) -> Markup {
	render_or_empty(
		&SECTION_WARNING,
		Slots::new()
			.markup("class", class_attr_with(ctx.theme, StyleRole::WarningAlert, "layout-field-error"))
			.text("name", html_name)
			.text("title", title)
			.text("message", message)
			.markup("help", help),
	)
}
