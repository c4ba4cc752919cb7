//! Repeatable collections
//!
//! A collection field holds a list of sub-form items. Every leaf of item `i`
//! is submitted as `name[i].leaf`, which the path codec turns back into
//! `{"name": [{"leaf": ...}, ...]}`. That round trip relies on contiguous
//! zero-based indices, so both [`CollectionState`] and the client script keep
//! items numbered `0..n` after every removal.

use crate::context::{FormContext, LayoutMode};
use crate::error::{CollectionError, RenderError, RenderResult, SchemaError};
use crate::errors::{ErrorMap, singularize, title_case};
use crate::field::{class_attr, class_attr_with, field_id, render_or_empty};
use crate::layout::{render_fields, section_warning};
use crate::path;
use crate::schema::{FieldDescriptor, SchemaMetadata, build_schema_metadata};
use formsmith_conf::RenderSettings;
use formsmith_widgets::{Attrs, Markup, Slots, StyleRole, Template};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Attribute marking a collection container in the output
pub(crate) const COLLECTION_MARKER: &str = "data-formsmith-collection";

static CONTAINER: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(concat!(
		r#"<div class="formsmith-collection" data-formsmith-collection="{name}" data-min-items="{min}" "#,
		r#"data-max-items="{max}" data-title-template="{title_template}" data-index-placeholder="{index_placeholder}" "#,
		r#"data-number-placeholder="{number_placeholder}">"#,
		"<label{label_class}>{label}{marker}</label>",
		"{help}",
		"<div data-formsmith-items>{items}</div>",
		"{error}",
		r#"<button type="button"{add_class} data-formsmith-add="{name}"{add_disabled}>Add {item_label}</button>"#,
		r#"<template data-formsmith-item-template="{name}">{template}</template>"#,
		"</div>",
	))
});

static ITEM: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(concat!(
		r#"<div{class} data-formsmith-item data-index="{index}" data-collapsed="{collapsed}">"#,
		"<div{header_class} data-formsmith-item-header>",
		r#"<button type="button" class="formsmith-item-toggle" data-formsmith-toggle aria-expanded="{expanded}" "#,
		r#"aria-controls="{body_id}"><span data-formsmith-item-title>{title}</span></button>"#,
		r#"<button type="button"{remove_class} data-formsmith-remove data-index="{index}" "#,
		r#"aria-label="Remove {title}"{remove_disabled}>Remove</button>"#,
		"</div>",
		r#"<div{body_class} id="{body_id}"{hidden}>{fields}</div>"#,
		"</div>",
	))
});

static HELP: LazyLock<Template> = LazyLock::new(|| Template::parse("<div{class}>{text}</div>"));

static ERROR: LazyLock<Template> =
	LazyLock::new(|| Template::parse(r#"<div{class} role="alert">{text}</div>"#));

static REQUIRED_MARKER: LazyLock<Template> =
	LazyLock::new(|| Template::parse(r#" <span{class} aria-hidden="true">*</span>"#));

/// Client-side add/remove/collapse for rendered collections.
pub const COLLECTION_SCRIPT: &str = r##"<script data-formsmith-script="collections">
(function () {
	if (window.formsmithCollections) { return; }
	window.formsmithCollections = true;

	var NAME_ATTRS = [
		'name', 'data-field', 'data-formsmith-collection', 'data-formsmith-add',
		'data-formsmith-item-template', 'data-formsmith-section'
	];
	var ID_ATTRS = ['id', 'for', 'aria-controls', 'aria-describedby', 'aria-labelledby'];

	function escapeRegExp(text) { return text.replace(/[.*+?^${}()|[\]\\]/g, '\\$&'); }
	function sanitize(name) { return name.replace(/[^A-Za-z0-9_-]/g, '_'); }
	function bound(container, attr) { return parseInt(container.getAttribute(attr) || '0', 10); }
	function list(container) { return container.querySelector(':scope > [data-formsmith-items]'); }
	function items(container) {
		return Array.prototype.filter.call(list(container).children, function (el) {
			return el.hasAttribute('data-formsmith-item');
		});
	}
	function title(container, index) {
		var template = container.getAttribute('data-title-template') || 'Item #{index}';
		return template.replace('{index}', String(index + 1));
	}

	function refresh(container) {
		var count = items(container).length;
		var add = container.querySelector(':scope > [data-formsmith-add]');
		if (add) { add.disabled = count >= bound(container, 'data-max-items'); }
		items(container).forEach(function (item) {
			var remove = item.querySelector(':scope > [data-formsmith-item-header] > [data-formsmith-remove]');
			if (remove) { remove.disabled = count <= bound(container, 'data-min-items'); }
		});
	}

	function rewrite(root, name, index) {
		var namePattern = new RegExp('^' + escapeRegExp(name) + '\\[\\d+\\]');
		var idPattern = new RegExp('^id_' + escapeRegExp(sanitize(name)) + '_\\d+_');
		NAME_ATTRS.forEach(function (attr) {
			root.querySelectorAll('[' + attr + ']').forEach(function (el) {
				el.setAttribute(attr, el.getAttribute(attr).replace(namePattern, name + '[' + index + ']'));
			});
		});
		ID_ATTRS.forEach(function (attr) {
			root.querySelectorAll('[' + attr + ']').forEach(function (el) {
				var value = el.getAttribute(attr).split(' ').map(function (part) {
					return part.replace(idPattern, 'id_' + sanitize(name) + '_' + index + '_');
				}).join(' ');
				el.setAttribute(attr, value);
			});
		});
		// template contents are a separate fragment
		root.querySelectorAll('template').forEach(function (template) {
			rewrite(template.content, name, index);
		});
	}

	function renumber(container) {
		var name = container.getAttribute('data-formsmith-collection');
		items(container).forEach(function (item, index) {
			item.setAttribute('data-index', String(index));
			rewrite(item, name, index);
			var header = item.querySelector(':scope > [data-formsmith-item-header]');
			if (header) {
				var remove = header.querySelector('[data-formsmith-remove]');
				if (remove) {
					remove.setAttribute('data-index', String(index));
					remove.setAttribute('aria-label', 'Remove ' + title(container, index));
				}
				var heading = header.querySelector('[data-formsmith-item-title]');
				if (heading) { heading.textContent = title(container, index); }
			}
		});
		refresh(container);
	}

	function add(container) {
		var count = items(container).length;
		if (count >= bound(container, 'data-max-items')) {
			console.warn('formsmith: maximum number of items reached');
			return;
		}
		var template = container.querySelector(':scope > template[data-formsmith-item-template]');
		if (!template) { return; }
		var html = template.innerHTML
			.split(container.getAttribute('data-index-placeholder')).join(String(count))
			.split(container.getAttribute('data-number-placeholder')).join(String(count + 1));
		list(container).insertAdjacentHTML('beforeend', html);
		refresh(container);
	}

	function remove(item) {
		var container = item.parentElement.closest('[data-formsmith-collection]');
		if (!container) { return; }
		if (items(container).length <= bound(container, 'data-min-items')) {
			console.warn('formsmith: minimum number of items reached');
			return;
		}
		item.remove();
		renumber(container);
	}

	document.addEventListener('click', function (event) {
		var addButton = event.target.closest('[data-formsmith-add]');
		if (addButton) {
			add(addButton.closest('[data-formsmith-collection]'));
			return;
		}
		var removeButton = event.target.closest('[data-formsmith-remove]');
		if (removeButton) {
			var item = removeButton.closest('[data-formsmith-item]');
			if (item) { remove(item); }
			return;
		}
		var toggle = event.target.closest('[data-formsmith-toggle]');
		if (toggle) {
			var body = document.getElementById(toggle.getAttribute('aria-controls'));
			if (body) {
				body.hidden = !body.hidden;
				toggle.setAttribute('aria-expanded', body.hidden ? 'false' : 'true');
			}
		}
	});
})();
</script>"##;

/// One item block of a collection render
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionItem {
	pub index: usize,
	/// Item data, keyed by leaf name
	pub data: Map<String, Value>,
	/// Item errors, keyed by leaf name
	pub errors: ErrorMap,
	/// Render the body collapsed; never set on an item with errors
	pub collapsed: bool,
}

/// Items to render for collection `name`.
///
/// K submitted items give K blocks. With nothing submitted, `min_items` empty
/// blocks are produced, or a single empty block when the minimum is zero.
/// Submitted items beyond the collection's maximum are kept; only adding is
/// blocked.
///
/// # Examples
///
/// ```
/// use formsmith_forms::ErrorMap;
/// use formsmith_forms::collection::collection_items;
/// use serde_json::json;
///
/// let errors: ErrorMap = [("pets[0].weight", "too small"), ("pets[2].name", "required")]
///     .into_iter()
///     .collect();
/// let items = collection_items("pets", Some(&json!([{}, {}, {}])), &errors, 0, false);
///
/// assert_eq!(items[0].errors.get("weight"), Some("too small"));
/// assert!(items[1].errors.is_empty());
/// assert_eq!(items[2].errors.get("name"), Some("required"));
/// ```
pub fn collection_items(
	name: &str,
	value: Option<&Value>,
	errors: &ErrorMap,
	min_items: usize,
	collapsed: bool,
) -> Vec<CollectionItem> {
	let rekeyed = errors.rekey_collection(name);
	let mut submitted = submitted_items(value);
	if submitted.is_empty() {
		submitted = vec![Value::Object(Map::new()); initial_count(min_items)];
	}

	submitted
		.into_iter()
		.enumerate()
		.map(|(index, item)| {
			let errors = rekeyed.scoped(&index.to_string());
			let data = match item {
				Value::Object(map) => map,
				_ => Map::new(),
			};
			CollectionItem {
				index,
				collapsed: collapsed && errors.is_empty(),
				data,
				errors,
			}
		})
		.collect()
}

fn initial_count(min_items: usize) -> usize {
	if min_items > 0 { min_items } else { 1 }
}

/// Items of a submitted collection value. An object keyed by indices
/// (`{"0": {...}, "1": {...}}`) is read in index order.
fn submitted_items(value: Option<&Value>) -> Vec<Value> {
	match value {
		Some(Value::Array(items)) => items.clone(),
		Some(Value::Object(map)) => {
			let indexed: BTreeMap<usize, &Value> = map
				.iter()
				.filter_map(|(key, item)| key.parse::<usize>().ok().map(|index| (index, item)))
				.collect();
			indexed.into_values().cloned().collect()
		}
		_ => Vec::new(),
	}
}

/// Singular label for one item: `ui.item_label`, else the referenced
/// definition name without a `Model` suffix, else the singular field name.
pub fn item_label(field: &FieldDescriptor) -> String {
	if let Some(label) = field.ui_str("item_label") {
		return label.to_string();
	}
	if let Some(reference) = field.reference.as_deref() {
		let def = reference.rsplit('/').next().unwrap_or(reference);
		let def = def.strip_suffix("Model").filter(|d| !d.is_empty()).unwrap_or(def);
		return def.to_string();
	}
	title_case(&singularize(&field.name))
}

/// Item heading pattern; `{index}` is the one-based item number.
fn title_template(field: &FieldDescriptor) -> String {
	field
		.ui_str("item_title")
		.map(str::to_string)
		.unwrap_or_else(|| format!("{} #{{index}}", item_label(field)))
}

fn placeholders(depth: usize) -> (String, String) {
	if depth == 0 {
		("__INDEX__".to_string(), "__NUMBER__".to_string())
	} else {
		(format!("__INDEX_{}__", depth), format!("__NUMBER_{}__", depth))
	}
}

/// Render a collection with its items, add button and item template.
pub fn render_collection(
	meta: &SchemaMetadata,
	field: &FieldDescriptor,
	ctx: &FormContext<'_>,
) -> Markup {
	let html_name = ctx.qualify(&field.name);
	match collection_body(meta, field, ctx, &html_name) {
		Ok(markup) => markup,
		Err(err) => {
			tracing::warn!("Failed to render collection '{}': {}", html_name, err);
			section_warning(ctx, &html_name, &field.label, &err.to_string(), Markup::empty())
		}
	}
}

fn collection_body(
	meta: &SchemaMetadata,
	field: &FieldDescriptor,
	ctx: &FormContext<'_>,
	html_name: &str,
) -> Result<Markup, SchemaError> {
	let theme = ctx.theme;
	if ctx.depth() >= ctx.settings.max_nesting_depth {
		return Err(SchemaError::DepthExceeded(ctx.depth() + 1));
	}

	let sub = meta.sub_schema(field)?;
	let sub_meta = build_schema_metadata(&sub, ctx.settings)
		.map_err(|e| SchemaError::Invalid(e.to_string()))?;
	let (min_items, max_items) = field
		.collection_bounds(ctx.settings)
		.map_err(|e| SchemaError::Invalid(e.to_string()))?;
	let layout = field
		.ui_str("item_layout")
		.and_then(|layout| layout.parse().ok())
		.unwrap_or(LayoutMode::Vertical);

	let items = collection_items(
		&field.name,
		ctx.value(&field.name),
		ctx.errors(),
		min_items,
		field.ui_flag("collapsed"),
	);
	let count = items.len();
	let template = title_template(field);
	let (index_placeholder, number_placeholder) = placeholders(ctx.depth());

	let rendered: Markup = items
		.iter()
		.map(|item| {
			let child = ctx.descend(
				&format!("{}[{}].", field.name, item.index),
				Cow::Borrowed(&item.data),
				item.errors.clone(),
			);
			render_item(
				ctx,
				html_name,
				&item.index.to_string(),
				&template.replace("{index}", &(item.index + 1).to_string()),
				item.collapsed,
				count <= min_items,
				render_fields(&sub_meta, &child, layout),
			)
		})
		.collect();

	let blank = Map::new();
	let template_ctx = ctx.descend(
		&format!("{}[{}].", field.name, index_placeholder),
		Cow::Borrowed(&blank),
		ErrorMap::new(),
	);
	let template_item = render_item(
		ctx,
		html_name,
		&index_placeholder,
		&template.replace("{index}", &number_placeholder),
		false,
		false,
		render_fields(&sub_meta, &template_ctx, layout),
	);

	let required = field.required || meta.required.contains(&field.name);
	let marker = if required {
		render_or_empty(
			&REQUIRED_MARKER,
			Slots::new().markup("class", class_attr(theme, StyleRole::RequiredMarker)),
		)
	} else {
		Markup::empty()
	};
	let help = field
		.help_text
		.as_deref()
		.map(|text| {
			render_or_empty(
				&HELP,
				Slots::new()
					.markup("class", class_attr(theme, StyleRole::HelpText))
					.text("text", text),
			)
		})
		.unwrap_or_default();
	let error = ctx
		.error(&field.name)
		.map(|text| {
			render_or_empty(
				&ERROR,
				Slots::new()
					.markup("class", class_attr(theme, StyleRole::ErrorText))
					.text("text", text),
			)
		})
		.unwrap_or_default();

	Ok(render_or_empty(
		&CONTAINER,
		Slots::new()
			.text("name", html_name)
			.text("min", min_items.to_string())
			.text("max", max_items.to_string())
			.text("title_template", template)
			.text("index_placeholder", index_placeholder)
			.text("number_placeholder", number_placeholder)
			.markup("label_class", class_attr(theme, StyleRole::Label))
			.text("label", field.label.as_str())
			.markup("marker", marker)
			.markup("help", help)
			.markup("items", rendered)
			.markup("error", error)
			.markup("add_class", class_attr(theme, StyleRole::AddButton))
			.markup("add_disabled", disabled_flag(count >= max_items))
			.text("item_label", item_label(field))
			.markup("template", template_item),
	))
}

fn render_item(
	ctx: &FormContext<'_>,
	html_name: &str,
	index: &str,
	title: &str,
	collapsed: bool,
	at_minimum: bool,
	fields: Markup,
) -> Markup {
	let theme = ctx.theme;
	let body_id = format!("{}_body", field_id(&format!("{}[{}]", html_name, index)));
	render_or_empty(
		&ITEM,
		Slots::new()
			.markup("class", class_attr_with(theme, StyleRole::CollectionItem, "formsmith-collection-item"))
			.text("index", index)
			.text("collapsed", collapsed.to_string())
			.markup("header_class", class_attr(theme, StyleRole::CollectionItemHeader))
			.text("expanded", (!collapsed).to_string())
			.text("body_id", body_id)
			.text("title", title)
			.markup("remove_class", class_attr(theme, StyleRole::RemoveButton))
			.markup("remove_disabled", disabled_flag(at_minimum))
			.markup("body_class", class_attr(theme, StyleRole::CardBody))
			.markup("hidden", if collapsed { Markup::raw(" hidden") } else { Markup::empty() })
			.markup("fields", fields),
	)
}

fn disabled_flag(disabled: bool) -> Markup {
	if disabled {
		let mut attrs = Attrs::new();
		attrs.set_flag("disabled");
		attrs.render()
	} else {
		Markup::empty()
	}
}

/// Server-side model of a collection's items with the same add/remove rules
/// as the rendered controls.
///
/// # Examples
///
/// ```
/// use formsmith_forms::collection::CollectionState;
/// use serde_json::json;
///
/// let mut pets = CollectionState::from_submission(
///     "pets",
///     Some(&json!([{"name": "Rex"}, {"name": "Tom"}, {"name": "Kit"}])),
///     1,
///     10,
/// )
/// .unwrap();
/// pets.remove(1).unwrap();
///
/// assert_eq!(pets.to_value(), json!([{"name": "Rex"}, {"name": "Kit"}]));
/// assert_eq!(pets.field_name(1, "name"), "pets[1].name");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState {
	name: String,
	items: Vec<Value>,
	min_items: usize,
	max_items: usize,
}

impl CollectionState {
	/// Fresh collection holding the initial empty items.
	pub fn new(name: impl Into<String>, min_items: usize, max_items: usize) -> RenderResult<Self> {
		Self::from_submission(name, None, min_items, max_items)
	}

	/// Collection seeded from a submitted value, falling back to the initial
	/// empty items when nothing was submitted.
	pub fn from_submission(
		name: impl Into<String>,
		value: Option<&Value>,
		min_items: usize,
		max_items: usize,
	) -> RenderResult<Self> {
		let name = name.into();
		if min_items > max_items {
			return Err(RenderError::InvalidCollectionBounds {
				field: name,
				min: min_items,
				max: max_items,
			});
		}
		let mut items = submitted_items(value);
		if items.is_empty() {
			items = vec![Value::Object(Map::new()); initial_count(min_items).min(max_items)];
		}
		Ok(Self {
			name,
			items,
			min_items,
			max_items,
		})
	}

	/// Collection for a schema field, using its declared bounds
	pub fn for_field(
		field: &FieldDescriptor,
		value: Option<&Value>,
		settings: &RenderSettings,
	) -> RenderResult<Self> {
		let (min_items, max_items) = field.collection_bounds(settings)?;
		Self::from_submission(field.name.clone(), value, min_items, max_items)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn items(&self) -> &[Value] {
		&self.items
	}

	pub fn min_items(&self) -> usize {
		self.min_items
	}

	pub fn max_items(&self) -> usize {
		self.max_items
	}

	pub fn can_add(&self) -> bool {
		self.items.len() < self.max_items
	}

	pub fn can_remove(&self) -> bool {
		self.items.len() > self.min_items
	}

	/// Append a blank copy of the last item's structure; returns the new index.
	pub fn add(&mut self) -> Result<usize, CollectionError> {
		if !self.can_add() {
			tracing::warn!(
				"Cannot add to '{}': maximum of {} items reached",
				self.name,
				self.max_items
			);
			return Err(CollectionError::MaxItemsReached {
				field: self.name.clone(),
				max: self.max_items,
			});
		}
		let blank = self
			.items
			.last()
			.map(cleared)
			.unwrap_or_else(|| Value::Object(Map::new()));
		self.items.push(blank);
		Ok(self.items.len() - 1)
	}

	/// Remove the item at `index`; later items move down by one.
	pub fn remove(&mut self, index: usize) -> Result<Value, CollectionError> {
		if index >= self.items.len() {
			return Err(CollectionError::IndexOutOfRange {
				field: self.name.clone(),
				index,
			});
		}
		if !self.can_remove() {
			tracing::warn!(
				"Cannot remove from '{}': minimum of {} items reached",
				self.name,
				self.min_items
			);
			return Err(CollectionError::MinItemsReached {
				field: self.name.clone(),
				min: self.min_items,
			});
		}
		Ok(self.items.remove(index))
	}

	/// Submission name of `leaf` inside item `index`
	pub fn field_name(&self, index: usize, leaf: &str) -> String {
		format!("{}[{}].{}", self.name, index, leaf)
	}

	pub fn to_value(&self) -> Value {
		Value::Array(self.items.clone())
	}

	/// Flat `(key, value)` pairs as the form would submit them
	pub fn to_flat(&self) -> Vec<(String, String)> {
		let mut tree = Map::new();
		tree.insert(self.name.clone(), self.to_value());
		path::flatten(&tree)
	}
}

/// Same shape with every value cleared
fn cleared(value: &Value) -> Value {
	match value {
		Value::Object(map) => Value::Object(
			map.iter()
				.map(|(key, child)| (key.clone(), cleared(child)))
				.collect(),
		),
		Value::Array(_) => Value::Array(Vec::new()),
		_ => Value::Null,
	}
}

/// Renumber the items of collection `name` in flat submitted keys so indices
/// run `0..n` in their original order. Other keys pass through unchanged.
///
/// # Examples
///
/// ```
/// use formsmith_forms::collection::compact_indices;
///
/// let pairs = vec![
///     ("pets[0].name", "Rex"),
///     ("pets[3].name", "Kit"),
///     ("pets[3].age", "2"),
///     ("owner", "Ada"),
/// ];
/// let keys: Vec<String> = compact_indices("pets", pairs).into_iter().map(|(k, _)| k).collect();
/// assert_eq!(keys, ["pets[0].name", "pets[1].name", "pets[1].age", "owner"]);
/// ```
pub fn compact_indices<I, K, V>(name: &str, pairs: I) -> Vec<(String, V)>
where
	I: IntoIterator<Item = (K, V)>,
	K: AsRef<str>,
{
	let pairs: Vec<(String, V)> = pairs
		.into_iter()
		.map(|(key, value)| (key.as_ref().to_string(), value))
		.collect();

	let renumbered: BTreeMap<usize, usize> = pairs
		.iter()
		.filter_map(|(key, _)| split_index(name, key).map(|(index, _)| index))
		.collect::<std::collections::BTreeSet<usize>>()
		.into_iter()
		.enumerate()
		.map(|(new, old)| (old, new))
		.collect();

	pairs
		.into_iter()
		.map(|(key, value)| match split_index(name, &key) {
			Some((old, rest)) => {
				let new = renumbered.get(&old).copied().unwrap_or(old);
				(format!("{}[{}]{}", name, new, rest), value)
			}
			None => (key, value),
		})
		.collect()
}

/// `name[7].leaf` splits into `(7, ".leaf")`
fn split_index<'k>(name: &str, key: &'k str) -> Option<(usize, &'k str)> {
	let rest = key.strip_prefix(name)?.strip_prefix('[')?;
	let (digits, rest) = rest.split_once(']')?;
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	digits.parse().ok().map(|index| (index, rest))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::FormSchema;
	use formsmith_widgets::{Bootstrap5Theme, WidgetRegistry};
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[fixture]
	fn pets_schema() -> FormSchema {
		FormSchema::new()
			.field(
				"pets",
				json!({"type": "array", "items": {"$ref": "#/$defs/PetModel"}, "ui": {"min_items": 1, "max_items": 3}}),
			)
			.definition(
				"PetModel",
				json!({"type": "object", "properties": {
					"name": {"type": "string"},
					"weight": {"type": "number"}
				}, "required": ["name"]}),
			)
	}

	fn render(schema: &FormSchema, data: Value, errors: ErrorMap) -> String {
		let settings = RenderSettings::default();
		let registry = WidgetRegistry::with_builtins();
		let meta = build_schema_metadata(schema, &settings).unwrap();
		let Value::Object(data) = data else {
			unreachable!()
		};
		let ctx = FormContext::new(&data, errors, &Bootstrap5Theme, &registry, &settings);
		render_fields(&meta, &ctx, LayoutMode::Vertical).into_string()
	}

	fn rendered_items(html: &str) -> usize {
		let template_start = html.find("<template").unwrap_or(html.len());
		html[..template_start].matches("data-formsmith-item ").count()
	}

	#[rstest]
	#[case(0, 1)]
	#[case(2, 2)]
	fn test_initial_items_without_submission(#[case] min_items: usize, #[case] expected: usize) {
		let items = collection_items("pets", None, &ErrorMap::new(), min_items, false);
		assert_eq!(items.len(), expected);
		assert!(items.iter().all(|item| item.data.is_empty()));
	}

	#[rstest]
	fn test_indexed_object_is_read_in_order() {
		let value = json!({"1": {"name": "Tom"}, "0": {"name": "Rex"}});
		let items = collection_items("pets", Some(&value), &ErrorMap::new(), 0, false);
		assert_eq!(items[0].data["name"], json!("Rex"));
		assert_eq!(items[1].data["name"], json!("Tom"));
	}

	#[rstest]
	fn test_items_with_errors_stay_expanded() {
		let errors: ErrorMap = [("pets[1].name", "required")].into_iter().collect();
		let items = collection_items("pets", Some(&json!([{}, {}])), &errors, 0, true);
		assert!(items[0].collapsed);
		assert!(!items[1].collapsed);
	}

	#[rstest]
	fn test_min_items_renders_one_empty_block(pets_schema: FormSchema) {
		let html = render(&pets_schema, json!({}), ErrorMap::new());
		assert_eq!(rendered_items(&html), 1);
		assert!(html.contains(r#"name="pets[0].name""#));
		assert!(html.contains(">Pet #1</span>"));
		assert!(html.contains(r#"data-min-items="1" data-max-items="3""#));
		assert!(html.contains(r#"data-formsmith-remove data-index="0" aria-label="Remove Pet #1" disabled>"#));
	}

	#[rstest]
	fn test_submitted_items_and_errors(pets_schema: FormSchema) {
		let mut errors = ErrorMap::new();
		errors.insert("pets[1].weight", "too small");
		let html = render(
			&pets_schema,
			json!({"pets": [{"name": "Rex", "weight": 4}, {"name": "Tom", "weight": 0}]}),
			errors,
		);
		assert_eq!(rendered_items(&html), 2);
		assert!(html.contains(r#"value="Rex""#));
		assert!(html.contains(r#"id="id_pets_1__weight_error""#));
		assert!(html.contains(">too small</div>"));
		assert!(!html.contains(r#"id="id_pets_0__weight_error""#));
	}

	#[rstest]
	fn test_items_beyond_max_are_kept(pets_schema: FormSchema) {
		let pets: Vec<Value> = ["Rex", "Tom", "Kit", "Bo"].iter().map(|name| json!({"name": name})).collect();
		let html = render(&pets_schema, json!({"pets": pets}), ErrorMap::new());
		assert_eq!(rendered_items(&html), 4);
		assert!(html.contains(r#"name="pets[3].name""#));
		assert!(html.contains(r#"value="Bo""#));
		assert!(html.contains(r#"data-formsmith-add="pets" disabled>Add Pet</button>"#));
	}

	#[rstest]
	fn test_add_disabled_at_max(pets_schema: FormSchema) {
		let html = render(&pets_schema, json!({"pets": [{}, {}, {}]}), ErrorMap::new());
		assert!(html.contains(r#"data-formsmith-add="pets" disabled>Add Pet</button>"#));
	}

	#[rstest]
	fn test_template_uses_placeholder(pets_schema: FormSchema) {
		let html = render(&pets_schema, json!({}), ErrorMap::new());
		let template = &html[html.find("<template").unwrap()..];
		assert!(template.contains(r#"name="pets[__INDEX__].name""#));
		assert!(template.contains(">Pet #__NUMBER__</span>"));
		assert!(!template.contains("value="));
	}

	#[rstest]
	fn test_nested_collection_placeholders_differ() {
		let schema = FormSchema::new()
			.field("pets", json!({"type": "array", "items": {"$ref": "#/$defs/Pet"}}))
			.definition("Pet", json!({"type": "object", "properties": {
				"vaccines": {"type": "array", "items": {"$ref": "#/$defs/Vaccine"}}
			}}))
			.definition("Vaccine", json!({"type": "object", "properties": {"date": {"type": "string", "format": "date"}}}));
		let html = render(&schema, json!({}), ErrorMap::new());
		assert!(html.contains(r#"name="pets[0].vaccines[0].date""#));
		assert!(html.contains(r#"data-index-placeholder="__INDEX_1__""#));
		assert!(html.contains(r#"name="pets[0].vaccines[__INDEX_1__].date""#));
	}

	#[rstest]
	fn test_nested_templates_are_renumbered_with_their_item() {
		let schema = FormSchema::new()
			.field("pets", json!({"type": "array", "items": {"$ref": "#/$defs/Pet"}}))
			.definition("Pet", json!({"type": "object", "properties": {
				"vaccines": {"type": "array", "items": {"$ref": "#/$defs/Vaccine"}}
			}}))
			.definition("Vaccine", json!({"type": "object", "properties": {"date": {"type": "string"}}}));
		let html = render(&schema, json!({"pets": [{}, {}]}), ErrorMap::new());

		// outer index baked into the nested item template
		assert!(html.contains(r#"<template data-formsmith-item-template="pets[1].vaccines">"#));
		assert!(html.contains(r#"name="pets[1].vaccines[__INDEX_1__].date""#));

		assert!(COLLECTION_SCRIPT.contains("'data-formsmith-item-template'"));
		assert!(COLLECTION_SCRIPT.contains("rewrite(template.content, name, index);"));
		assert!(COLLECTION_SCRIPT.contains("rewrite(item, name, index);"));
	}

	#[rstest]
	fn test_missing_item_definition_is_contained() {
		let schema = FormSchema::new()
			.field("pets", json!({"type": "array", "items": {"$ref": "#/$defs/Missing"}}));
		let html = render(&schema, json!({}), ErrorMap::new());
		assert!(html.contains("alert alert-warning"));
		assert!(html.contains("was not found"));
	}

	#[rstest]
	#[case(json!({"type": "array", "items": {"$ref": "#/$defs/PetModel"}}), "Pet")]
	#[case(json!({"type": "array", "items": {"type": "object", "properties": {"x": {"type": "string"}}}}), "Company")]
	#[case(json!({"type": "array", "items": {"$ref": "#/$defs/Pet"}, "ui": {"item_label": "Animal"}}), "Animal")]
	fn test_item_label(#[case] schema: Value, #[case] expected: &str) {
		let field = FieldDescriptor::from_schema("companies", &schema, false, &RenderSettings::default());
		assert_eq!(item_label(&field), expected);
	}

	#[rstest]
	fn test_max_items_guard() {
		let mut state = CollectionState::from_submission("pets", Some(&json!(vec![json!({}); 10])), 0, 10).unwrap();
		assert_eq!(
			state.add(),
			Err(CollectionError::MaxItemsReached {
				field: "pets".to_string(),
				max: 10
			})
		);
		assert_eq!(state.len(), 10);
	}

	#[rstest]
	fn test_min_items_guard() {
		let mut state = CollectionState::new("pets", 1, 5).unwrap();
		assert_eq!(state.len(), 1);
		assert!(matches!(state.remove(0), Err(CollectionError::MinItemsReached { .. })));
		assert!(matches!(state.remove(4), Err(CollectionError::IndexOutOfRange { index: 4, .. })));
	}

	#[rstest]
	fn test_add_clears_values_and_keeps_shape() {
		let mut state = CollectionState::from_submission(
			"pets",
			Some(&json!([{"name": "Rex", "tags": ["a"], "vet": {"city": "Oslo"}}])),
			0,
			5,
		)
		.unwrap();
		assert_eq!(state.add(), Ok(1));
		assert_eq!(state.items()[1], json!({"name": null, "tags": [], "vet": {"city": null}}));
	}

	#[rstest]
	fn test_invalid_bounds() {
		assert!(CollectionState::new("pets", 4, 2).is_err());
	}

	#[rstest]
	fn test_to_flat_is_contiguous() {
		let mut state = CollectionState::from_submission(
			"pets",
			Some(&json!([{"name": "A"}, {"name": "B"}, {"name": "C"}])),
			0,
			5,
		)
		.unwrap();
		state.remove(0).unwrap();
		assert_eq!(
			state.to_flat(),
			vec![
				("pets[0].name".to_string(), "B".to_string()),
				("pets[1].name".to_string(), "C".to_string()),
			]
		);
	}

	#[rstest]
	fn test_compact_indices_ignores_other_collections() {
		let pairs = vec![("pets[2].name", 1), ("petsitters[5].name", 2), ("pets[9]", 3)];
		let compacted = compact_indices("pets", pairs);
		assert_eq!(
			compacted,
			vec![
				("pets[0].name".to_string(), 1),
				("petsitters[5].name".to_string(), 2),
				("pets[1]".to_string(), 3),
			]
		);
	}
}
