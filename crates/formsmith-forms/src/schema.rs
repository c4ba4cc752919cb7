//! Schema metadata
//!
//! A [`FormSchema`] is the JSON Schema object a form is rendered from. Each of
//! its properties becomes a [`FieldDescriptor`] carrying the resolved UI element
//! tag, constraints and presentation hints. [`SchemaMetadata`] orders the
//! descriptors and splits them into layout sections and everything else.

use crate::error::{RenderError, RenderResult, SchemaError};
use crate::errors::title_case;
use formsmith_conf::RenderSettings;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Element tag of a field rendered as a nested section
pub const LAYOUT_ELEMENT: &str = "layout";

/// Element tag of a field rendered as a repeatable collection
pub const COLLECTION_ELEMENT: &str = "model_list";

/// Sort key of fields without an explicit `order`
pub const DEFAULT_FIELD_ORDER: i64 = 999;

const ELEMENT_KEYS: [&str; 3] = ["element", "widget", "input_type"];

/// JSON Schema type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
	String,
	Integer,
	Number,
	Boolean,
	Array,
	Object,
	Null,
	Unknown,
}

impl FieldType {
	fn from_name(name: &str) -> Self {
		match name {
			"string" => FieldType::String,
			"integer" => FieldType::Integer,
			"number" => FieldType::Number,
			"boolean" => FieldType::Boolean,
			"array" => FieldType::Array,
			"object" => FieldType::Object,
			"null" => FieldType::Null,
			_ => FieldType::Unknown,
		}
	}

	fn of(schema: &Value) -> Self {
		match schema.get("type") {
			Some(Value::String(name)) => return Self::from_name(name),
			Some(Value::Array(names)) => {
				return names
					.iter()
					.filter_map(Value::as_str)
					.find(|name| *name != "null")
					.map(Self::from_name)
					.unwrap_or(FieldType::Null);
			}
			_ => {}
		}
		if direct_reference(schema).is_some() || schema.get("properties").is_some() {
			FieldType::Object
		} else if schema.get("items").is_some() {
			FieldType::Array
		} else if schema.get("enum").is_some() {
			FieldType::String
		} else {
			FieldType::Unknown
		}
	}

	pub fn is_numeric(self) -> bool {
		matches!(self, FieldType::Integer | FieldType::Number)
	}
}

/// Validation constraints declared on a field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
	pub min_length: Option<u64>,
	pub max_length: Option<u64>,
	pub minimum: Option<f64>,
	pub maximum: Option<f64>,
	pub exclusive_minimum: Option<f64>,
	pub exclusive_maximum: Option<f64>,
	pub multiple_of: Option<f64>,
	pub pattern: Option<String>,
	pub min_items: Option<usize>,
	pub max_items: Option<usize>,
}

impl Constraints {
	fn from_schema(schema: &Value) -> Self {
		let uint = |key: &str| schema.get(key).and_then(Value::as_u64);
		let float = |key: &str| schema.get(key).and_then(Value::as_f64);
		Self {
			min_length: uint("minLength"),
			max_length: uint("maxLength"),
			minimum: float("minimum"),
			maximum: float("maximum"),
			exclusive_minimum: float("exclusiveMinimum"),
			exclusive_maximum: float("exclusiveMaximum"),
			multiple_of: float("multipleOf"),
			pattern: schema
				.get("pattern")
				.and_then(Value::as_str)
				.map(str::to_string),
			min_items: uint("minItems").map(|n| n as usize),
			max_items: uint("maxItems").map(|n| n as usize),
		}
	}
}

/// Everything the renderer needs to know about one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
	pub name: String,
	pub field_type: FieldType,
	pub format: Option<String>,
	pub constraints: Constraints,
	pub required: bool,
	/// Resolved UI element tag
	pub element: String,
	/// Merged UI hints (`ui_*` keys, `ui_options`, then the `ui` object)
	pub ui: Map<String, Value>,
	pub label: String,
	pub help_text: Option<String>,
	pub default: Option<Value>,
	/// Allowed values, from `enum` or `items.enum`
	pub enum_values: Vec<Value>,
	/// Name of the referenced definition (the field's own or its items')
	pub reference: Option<String>,
	pub order: i64,
	/// Field schema with single-variant `anyOf` unions folded in
	pub schema: Value,
}

impl FieldDescriptor {
	/// Build a descriptor from a property schema
	///
	/// # Examples
	///
	/// ```
	/// use formsmith_conf::RenderSettings;
	/// use formsmith_forms::schema::{FieldDescriptor, FieldType};
	/// use serde_json::json;
	///
	/// let field = FieldDescriptor::from_schema(
	///     "contact_email",
	///     &json!({"type": "string", "format": "email", "ui": {"placeholder": "you@example.com"}}),
	///     true,
	///     &RenderSettings::default(),
	/// );
	/// assert_eq!(field.element, "email");
	/// assert_eq!(field.field_type, FieldType::String);
	/// assert_eq!(field.label, "Contact Email");
	/// assert_eq!(field.ui_str("placeholder"), Some("you@example.com"));
	/// ```
	pub fn from_schema(
		name: &str,
		field_schema: &Value,
		required: bool,
		settings: &RenderSettings,
	) -> Self {
		let schema = effective_schema(field_schema).into_owned();
		let field_type = FieldType::of(&schema);
		let ui = ui_options(&schema);
		let element = resolve_ui_element(&schema, settings.long_text_threshold);

		let mut constraints = Constraints::from_schema(&schema);
		if let Some(min) = ui.get("min_items").and_then(Value::as_u64) {
			constraints.min_items = Some(min as usize);
		}
		if let Some(max) = ui.get("max_items").and_then(Value::as_u64) {
			constraints.max_items = Some(max as usize);
		}

		let items = schema.get("items");
		let enum_values = schema
			.get("enum")
			.or_else(|| items.and_then(|items| items.get("enum")))
			.and_then(Value::as_array)
			.cloned()
			.unwrap_or_default();
		let reference = direct_reference(&schema)
			.or_else(|| items.and_then(direct_reference))
			.map(str::to_string);

		let label = ui
			.get("label")
			.and_then(Value::as_str)
			.or_else(|| schema.get("title").and_then(Value::as_str))
			.map(str::to_string)
			.unwrap_or_else(|| title_case(name));
		let help_text = ["help_text", "help"]
			.iter()
			.find_map(|key| ui.get(*key).and_then(Value::as_str))
			.or_else(|| schema.get("description").and_then(Value::as_str))
			.map(str::to_string);
		let order = ui
			.get("order")
			.and_then(Value::as_i64)
			.unwrap_or(DEFAULT_FIELD_ORDER);

		Self {
			name: name.to_string(),
			field_type,
			format: schema.get("format").and_then(Value::as_str).map(str::to_string),
			constraints,
			required,
			element,
			ui,
			label,
			help_text,
			default: schema.get("default").cloned(),
			enum_values,
			reference,
			order,
			schema,
		}
	}

	pub fn ui_str(&self, key: &str) -> Option<&str> {
		self.ui.get(key).and_then(Value::as_str)
	}

	/// True for `true`, `"true"` and non-zero numbers
	pub fn ui_flag(&self, key: &str) -> bool {
		match self.ui.get(key) {
			Some(Value::Bool(b)) => *b,
			Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
			Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
			_ => false,
		}
	}

	pub fn is_layout(&self) -> bool {
		self.element == LAYOUT_ELEMENT
	}

	pub fn is_collection(&self) -> bool {
		self.element == COLLECTION_ELEMENT
	}

	pub fn is_hidden(&self) -> bool {
		self.element == "hidden"
	}

	/// `(min_items, max_items)` of a collection field.
	///
	/// A missing maximum falls back to `settings.default_max_items`, raised to the
	/// minimum when the declared minimum is larger than that default.
	pub fn collection_bounds(&self, settings: &RenderSettings) -> RenderResult<(usize, usize)> {
		let min = self.constraints.min_items.unwrap_or(0);
		let max = match self.constraints.max_items {
			Some(max) => max,
			None => settings.default_max_items.max(min),
		};
		if min > max {
			return Err(RenderError::InvalidCollectionBounds {
				field: self.name.clone(),
				min,
				max,
			});
		}
		Ok((min, max))
	}
}

/// Root schema of a form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSchema {
	pub title: Option<String>,
	pub description: Option<String>,
	/// Properties in declaration order
	pub properties: Map<String, Value>,
	pub required: Vec<String>,
	/// Definitions referenced with `$ref`
	pub defs: Map<String, Value>,
}

impl FormSchema {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse a JSON Schema object.
	///
	/// # Examples
	///
	/// ```
	/// use formsmith_forms::FormSchema;
	/// use serde_json::json;
	///
	/// let schema = FormSchema::from_value(&json!({
	///     "title": "Signup",
	///     "type": "object",
	///     "properties": {"username": {"type": "string"}},
	///     "required": ["username"]
	/// }))
	/// .unwrap();
	/// assert_eq!(schema.title.as_deref(), Some("Signup"));
	/// assert_eq!(schema.required, vec!["username".to_string()]);
	///
	/// assert!(FormSchema::from_value(&json!(["not", "an", "object"])).is_err());
	/// ```
	pub fn from_value(schema: &Value) -> RenderResult<Self> {
		let Value::Object(root) = schema else {
			return Err(RenderError::InvalidSchema(
				"schema root must be an object".to_string(),
			));
		};

		let properties = match root.get("properties") {
			None | Some(Value::Null) => Map::new(),
			Some(Value::Object(properties)) => properties.clone(),
			Some(_) => {
				return Err(RenderError::InvalidSchema(
					"'properties' must be an object".to_string(),
				));
			}
		};

		let required = root
			.get("required")
			.and_then(Value::as_array)
			.map(|names| {
				names
					.iter()
					.filter_map(Value::as_str)
					.map(str::to_string)
					.collect()
			})
			.unwrap_or_default();

		let defs = root
			.get("$defs")
			.or_else(|| root.get("definitions"))
			.and_then(Value::as_object)
			.cloned()
			.unwrap_or_default();

		Ok(Self {
			title: root.get("title").and_then(Value::as_str).map(str::to_string),
			description: root
				.get("description")
				.and_then(Value::as_str)
				.map(str::to_string),
			properties,
			required,
			defs,
		})
	}

	pub fn from_json_str(source: &str) -> RenderResult<Self> {
		let value: Value = serde_json::from_str(source)
			.map_err(|e| RenderError::InvalidSchema(format!("JSON parse error: {}", e)))?;
		Self::from_value(&value)
	}

	/// Set the form title
	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	/// Add a property
	pub fn field(mut self, name: impl Into<String>, schema: Value) -> Self {
		self.properties.insert(name.into(), schema);
		self
	}

	/// Add a required property
	pub fn required_field(mut self, name: impl Into<String>, schema: Value) -> Self {
		let name = name.into();
		self.required.push(name.clone());
		self.properties.insert(name, schema);
		self
	}

	/// Add a definition
	pub fn definition(mut self, name: impl Into<String>, schema: Value) -> Self {
		self.defs.insert(name.into(), schema);
		self
	}

	/// Look up a definition by `$ref` (`#/$defs/Name`, `#/definitions/Name` or `Name`).
	pub fn resolve_reference(&self, reference: &str) -> Option<&Value> {
		lookup_definition(&self.defs, reference)
	}
}

/// Ordered, classified field descriptors of one (sub-)schema
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaMetadata {
	pub title: Option<String>,
	pub description: Option<String>,
	/// Descriptors sorted by `order`, ties keeping declaration order
	pub fields: Vec<FieldDescriptor>,
	pub required: BTreeSet<String>,
	pub defs: Map<String, Value>,
}

impl SchemaMetadata {
	pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
		self.fields.iter().find(|field| field.name == name)
	}

	pub fn layout_fields(&self) -> Vec<&FieldDescriptor> {
		split_layout_fields(&self.fields).0
	}

	pub fn non_layout_fields(&self) -> Vec<&FieldDescriptor> {
		split_layout_fields(&self.fields).1
	}

	/// Schema of a nested section or of one collection item.
	///
	/// Resolved from the field's `$ref` (or its items' `$ref`), falling back to an
	/// inline object schema. The result inherits this schema's definitions.
	pub fn sub_schema(&self, field: &FieldDescriptor) -> Result<FormSchema, SchemaError> {
		let inline = if field.is_collection() {
			field.schema.get("items")
		} else {
			Some(&field.schema)
		};

		let (source, fallback_title) = match field.reference.as_deref() {
			Some(reference) => {
				let def = lookup_definition(&self.defs, reference)
					.ok_or_else(|| SchemaError::MissingDefinition(reference.to_string()))?;
				(def, Some(definition_name(reference)))
			}
			None => match inline {
				Some(schema) if schema.get("properties").is_some() => (schema, None),
				_ => return Err(SchemaError::NoSubSchema),
			},
		};

		let mut sub = FormSchema::from_value(source).map_err(|e| SchemaError::Invalid(e.to_string()))?;
		if sub.title.is_none() {
			sub.title = fallback_title.map(str::to_string);
		}
		for (name, def) in &self.defs {
			sub.defs.entry(name.clone()).or_insert_with(|| def.clone());
		}
		Ok(sub)
	}
}

/// Build metadata for a schema; fails only on contradictory collection bounds.
///
/// # Examples
///
/// ```
/// use formsmith_conf::RenderSettings;
/// use formsmith_forms::{FormSchema, build_schema_metadata};
/// use serde_json::json;
///
/// let schema = FormSchema::new()
///     .field("b", json!({"type": "string", "ui": {"order": 2}}))
///     .field("a", json!({"type": "string", "ui": {"order": 1}}))
///     .field("c", json!({"type": "string"}));
/// let meta = build_schema_metadata(&schema, &RenderSettings::default()).unwrap();
/// let names: Vec<&str> = meta.fields.iter().map(|f| f.name.as_str()).collect();
/// assert_eq!(names, ["a", "b", "c"]);
/// ```
pub fn build_schema_metadata(
	schema: &FormSchema,
	settings: &RenderSettings,
) -> RenderResult<SchemaMetadata> {
	let required: BTreeSet<String> = schema.required.iter().cloned().collect();

	let mut fields: Vec<FieldDescriptor> = schema
		.properties
		.iter()
		.map(|(name, field_schema)| {
			FieldDescriptor::from_schema(name, field_schema, required.contains(name), settings)
		})
		.collect();
	fields.sort_by_key(|field| field.order);

	for field in fields.iter().filter(|field| field.is_collection()) {
		field.collection_bounds(settings)?;
	}

	Ok(SchemaMetadata {
		title: schema.title.clone(),
		description: schema.description.clone(),
		fields,
		required,
		defs: schema.defs.clone(),
	})
}

/// Check every schema reachable from `schema` for contradictory collection bounds.
pub fn validate_schema_tree(schema: &FormSchema, settings: &RenderSettings) -> RenderResult<()> {
	let meta = build_schema_metadata(schema, settings)?;
	validate_inline(&meta, settings, 0)?;

	for def in schema.defs.values() {
		if def.get("properties").is_none() {
			continue;
		}
		let sub = FormSchema::from_value(def)?;
		let sub_meta = build_schema_metadata(&sub, settings)?;
		validate_inline(&sub_meta, settings, 0)?;
	}
	Ok(())
}

fn validate_inline(meta: &SchemaMetadata, settings: &RenderSettings, depth: usize) -> RenderResult<()> {
	if depth >= settings.max_nesting_depth {
		return Ok(());
	}
	for field in &meta.fields {
		if field.reference.is_some() || !(field.is_layout() || field.is_collection()) {
			continue;
		}
		if let Ok(sub) = meta.sub_schema(field) {
			let sub_meta = build_schema_metadata(&sub, settings)?;
			validate_inline(&sub_meta, settings, depth + 1)?;
		}
	}
	Ok(())
}

/// Partition descriptors into layout sections and all other fields, keeping order.
pub fn split_layout_fields(
	fields: &[FieldDescriptor],
) -> (Vec<&FieldDescriptor>, Vec<&FieldDescriptor>) {
	fields.iter().partition(|field| field.is_layout())
}

/// Explicitly requested element tag, if any.
///
/// Looks for `element`, `widget` and `input_type` (in that order) in the merged
/// UI hints, then as plain keys of the field schema. A truthy `hidden` hint
/// requests the hidden element.
pub fn explicit_ui_element(field_schema: &Value) -> Option<String> {
	let ui = ui_options(field_schema);
	let from_ui = ELEMENT_KEYS
		.iter()
		.find_map(|key| ui.get(*key).and_then(Value::as_str))
		.filter(|tag| !tag.trim().is_empty());
	let from_field = || {
		ELEMENT_KEYS
			.iter()
			.find_map(|key| field_schema.get(*key).and_then(Value::as_str))
			.filter(|tag| !tag.trim().is_empty())
	};

	if let Some(tag) = from_ui.or_else(from_field) {
		return Some(tag.trim().to_string());
	}
	if ui.get("hidden").and_then(Value::as_bool) == Some(true) {
		return Some("hidden".to_string());
	}
	None
}

/// Element tag inferred from type, format, enum and constraints
pub fn infer_ui_element(field_schema: &Value, long_text_threshold: u64) -> &'static str {
	let schema = effective_schema(field_schema);
	let field_type = FieldType::of(&schema);
	let has_enum = schema
		.get("enum")
		.and_then(Value::as_array)
		.is_some_and(|values| !values.is_empty());

	if has_enum && field_type != FieldType::Array {
		return "select";
	}

	match field_type {
		FieldType::String => {
			let format = schema.get("format").and_then(Value::as_str).unwrap_or_default();
			match format {
				"email" => return "email",
				"date" => return "date",
				"time" => return "time",
				"date-time" => return "datetime",
				"uri" | "url" => return "url",
				"password" => return "password",
				"color" => return "color",
				_ => {}
			}
			if schema.get("writeOnly").and_then(Value::as_bool) == Some(true) {
				return "password";
			}
			match schema.get("maxLength").and_then(Value::as_u64) {
				Some(max) if max > long_text_threshold => "textarea",
				_ => "text",
			}
		}
		FieldType::Boolean => "toggle",
		FieldType::Integer | FieldType::Number => "number",
		FieldType::Array => {
			let items = schema.get("items");
			let items_are_objects = items.is_some_and(|items| {
				direct_reference(items).is_some() || items.get("properties").is_some()
			});
			if items_are_objects {
				COLLECTION_ELEMENT
			} else if items.and_then(|items| items.get("enum")).is_some() {
				"multiselect"
			} else {
				"text"
			}
		}
		FieldType::Object => {
			if direct_reference(&schema).is_some() || schema.get("properties").is_some() {
				LAYOUT_ELEMENT
			} else {
				"text"
			}
		}
		FieldType::Null | FieldType::Unknown => "text",
	}
}

/// Explicit element tag if present, otherwise the inferred one
///
/// # Examples
///
/// ```
/// use formsmith_forms::schema::resolve_ui_element;
/// use serde_json::json;
///
/// assert_eq!(resolve_ui_element(&json!({"type": "string", "ui": {"widget": "color"}}), 256), "color");
/// assert_eq!(resolve_ui_element(&json!({"type": "string", "maxLength": 1000}), 256), "textarea");
/// assert_eq!(resolve_ui_element(&json!({"type": "boolean"}), 256), "toggle");
/// assert_eq!(resolve_ui_element(&json!({"$ref": "#/$defs/Address"}), 256), "layout");
/// ```
pub fn resolve_ui_element(field_schema: &Value, long_text_threshold: u64) -> String {
	explicit_ui_element(field_schema)
		.unwrap_or_else(|| infer_ui_element(field_schema, long_text_threshold).to_string())
}

/// Merge UI hints: `ui_*` keys with the prefix stripped, then `ui_options`, then `ui`.
pub fn ui_options(field_schema: &Value) -> Map<String, Value> {
	let mut ui = Map::new();
	let Some(field) = field_schema.as_object() else {
		return ui;
	};

	for (key, value) in field {
		if let Some(stripped) = key.strip_prefix("ui_")
			&& stripped != "options"
		{
			ui.insert(stripped.to_string(), value.clone());
		}
	}
	for key in ["ui_options", "ui"] {
		if let Some(Value::Object(options)) = field.get(key) {
			for (name, value) in options {
				ui.insert(name.clone(), value.clone());
			}
		}
	}
	ui
}

/// Fold a nullable `anyOf`/`oneOf` union into the field schema.
///
/// `{"anyOf": [{"type": "string", "format": "email"}, {"type": "null"}], "title": "Email"}`
/// reads as a string field with the email format.
fn effective_schema(field_schema: &Value) -> Cow<'_, Value> {
	let Some(field) = field_schema.as_object() else {
		return Cow::Borrowed(field_schema);
	};
	if field.contains_key("type") {
		return Cow::Borrowed(field_schema);
	}

	let union = field
		.get("anyOf")
		.or_else(|| field.get("oneOf"))
		.and_then(Value::as_array);
	let Some(variants) = union else {
		return Cow::Borrowed(field_schema);
	};
	let mut non_null = variants
		.iter()
		.filter(|variant| variant.get("type").and_then(Value::as_str) != Some("null"));
	let (Some(Value::Object(variant)), None) = (non_null.next(), non_null.next()) else {
		return Cow::Borrowed(field_schema);
	};

	let mut merged = field.clone();
	merged.remove("anyOf");
	merged.remove("oneOf");
	for (key, value) in variant {
		merged.entry(key.clone()).or_insert_with(|| value.clone());
	}
	Cow::Owned(Value::Object(merged))
}

/// `$ref` of a schema, also looking through `allOf` wrappers and nullable unions.
fn direct_reference(schema: &Value) -> Option<&str> {
	if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
		return Some(reference);
	}
	["allOf", "anyOf", "oneOf"]
		.iter()
		.filter_map(|key| schema.get(*key).and_then(Value::as_array))
		.flatten()
		.find_map(|variant| variant.get("$ref").and_then(Value::as_str))
}

fn definition_name(reference: &str) -> &str {
	reference.rsplit('/').next().unwrap_or(reference)
}

fn lookup_definition<'a>(defs: &'a Map<String, Value>, reference: &str) -> Option<&'a Value> {
	defs.get(definition_name(reference))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn settings() -> RenderSettings {
		RenderSettings::default()
	}

	#[rstest]
	#[case(json!({"type": "string"}), "text")]
	#[case(json!({"type": "string", "format": "email"}), "email")]
	#[case(json!({"type": "string", "format": "date"}), "date")]
	#[case(json!({"type": "string", "format": "date-time"}), "datetime")]
	#[case(json!({"type": "string", "format": "password", "writeOnly": true}), "password")]
	#[case(json!({"type": "string", "maxLength": 256}), "text")]
	#[case(json!({"type": "string", "maxLength": 257}), "textarea")]
	#[case(json!({"type": "string", "enum": ["a", "b"]}), "select")]
	#[case(json!({"enum": ["a", "b"]}), "select")]
	#[case(json!({"type": "boolean"}), "toggle")]
	#[case(json!({"type": "integer"}), "number")]
	#[case(json!({"type": "number"}), "number")]
	#[case(json!({"type": "array", "items": {"$ref": "#/$defs/Pet"}}), "model_list")]
	#[case(json!({"type": "array", "items": {"type": "string", "enum": ["x"]}}), "multiselect")]
	#[case(json!({"type": "array", "items": {"type": "string"}}), "text")]
	#[case(json!({"$ref": "#/$defs/Address"}), "layout")]
	#[case(json!({"allOf": [{"$ref": "#/$defs/Address"}]}), "layout")]
	#[case(json!({"anyOf": [{"type": "string", "format": "email"}, {"type": "null"}]}), "email")]
	#[case(json!({"type": ["integer", "null"]}), "number")]
	#[case(json!({}), "text")]
	fn test_inferred_elements(#[case] schema: Value, #[case] expected: &str) {
		assert_eq!(resolve_ui_element(&schema, 256), expected);
	}

	#[rstest]
	#[case(json!({"ui": {"element": "radio", "widget": "select"}}), Some("radio"))]
	#[case(json!({"ui_element": "textarea"}), Some("textarea"))]
	#[case(json!({"ui_widget": "range"}), Some("range"))]
	#[case(json!({"widget": "color"}), Some("color"))]
	#[case(json!({"input_type": "tel"}), Some("tel"))]
	#[case(json!({"ui": {"element": "  "}, "widget": "search"}), Some("search"))]
	#[case(json!({"ui": {"hidden": true}}), Some("hidden"))]
	#[case(json!({"type": "string"}), None)]
	fn test_explicit_elements(#[case] schema: Value, #[case] expected: Option<&str>) {
		assert_eq!(explicit_ui_element(&schema).as_deref(), expected);
	}

	#[rstest]
	fn test_ui_options_precedence() {
		let ui = ui_options(&json!({
			"ui_placeholder": "prefix",
			"ui_options": {"placeholder": "options", "rows": 3},
			"ui": {"placeholder": "ui"}
		}));
		assert_eq!(ui["placeholder"], json!("ui"));
		assert_eq!(ui["rows"], json!(3));
	}

	#[rstest]
	fn test_descriptor_details() {
		let field = FieldDescriptor::from_schema(
			"pets",
			&json!({
				"type": "array",
				"title": "Your pets",
				"description": "Every animal you own",
				"items": {"$ref": "#/$defs/Pet"},
				"minItems": 1,
				"ui": {"max_items": 3, "order": 5}
			}),
			false,
			&settings(),
		);
		assert!(field.is_collection());
		assert_eq!(field.label, "Your pets");
		assert_eq!(field.help_text.as_deref(), Some("Every animal you own"));
		assert_eq!(field.reference.as_deref(), Some("#/$defs/Pet"));
		assert_eq!(field.order, 5);
		assert_eq!(field.collection_bounds(&settings()).unwrap(), (1, 3));
	}

	#[rstest]
	fn test_collection_bounds_defaults() {
		let field = FieldDescriptor::from_schema(
			"tags",
			&json!({"type": "array", "items": {"type": "object", "properties": {}}, "minItems": 12}),
			false,
			&settings(),
		);
		assert_eq!(field.collection_bounds(&settings()).unwrap(), (12, 12));
	}

	#[rstest]
	fn test_contradictory_bounds_are_fatal() {
		let schema = FormSchema::new().field(
			"pets",
			json!({"type": "array", "items": {"$ref": "#/$defs/Pet"}, "minItems": 4, "maxItems": 2}),
		);
		let err = build_schema_metadata(&schema, &settings()).unwrap_err();
		assert!(matches!(
			err,
			RenderError::InvalidCollectionBounds { ref field, min: 4, max: 2 } if field == "pets"
		));
	}

	#[rstest]
	fn test_bounds_inside_definitions_are_checked() {
		let schema = FormSchema::new()
			.field("owner", json!({"$ref": "#/$defs/Owner"}))
			.definition(
				"Owner",
				json!({"type": "object", "properties": {
					"pets": {"type": "array", "items": {"type": "object", "properties": {"n": {"type": "string"}}}, "minItems": 3, "maxItems": 1}
				}}),
			);
		assert!(build_schema_metadata(&schema, &settings()).is_ok());
		assert!(validate_schema_tree(&schema, &settings()).is_err());
	}

	#[rstest]
	fn test_layout_split_preserves_order() {
		let schema = FormSchema::new()
			.field("name", json!({"type": "string"}))
			.field("address", json!({"$ref": "#/$defs/Address"}))
			.field("email", json!({"type": "string"}))
			.field("billing", json!({"type": "object", "properties": {"iban": {"type": "string"}}}));
		let meta = build_schema_metadata(&schema, &settings()).unwrap();

		let layout: Vec<&str> = meta.layout_fields().iter().map(|f| f.name.as_str()).collect();
		let other: Vec<&str> = meta.non_layout_fields().iter().map(|f| f.name.as_str()).collect();
		assert_eq!(layout, ["address", "billing"]);
		assert_eq!(other, ["name", "email"]);
	}

	#[rstest]
	fn test_sub_schema_resolution() {
		let schema = FormSchema::new()
			.field("address", json!({"$ref": "#/$defs/Address"}))
			.field("missing", json!({"$ref": "#/$defs/Nowhere"}))
			.definition(
				"Address",
				json!({"type": "object", "properties": {"city": {"type": "string"}}}),
			);
		let meta = build_schema_metadata(&schema, &settings()).unwrap();

		let sub = meta.sub_schema(meta.field("address").unwrap()).unwrap();
		assert_eq!(sub.title.as_deref(), Some("Address"));
		assert!(sub.properties.contains_key("city"));
		assert!(sub.defs.contains_key("Address"));

		assert_eq!(
			meta.sub_schema(meta.field("missing").unwrap()),
			Err(SchemaError::MissingDefinition("#/$defs/Nowhere".to_string()))
		);
	}

	#[rstest]
	fn test_invalid_properties_rejected() {
		let err = FormSchema::from_value(&json!({"properties": ["a"]})).unwrap_err();
		assert!(matches!(err, RenderError::InvalidSchema(_)));
	}
}
