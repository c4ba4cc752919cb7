//! Server-side validation
//!
//! Checks submitted data against the declared constraints and produces the
//! flat error map the renderer attaches to fields. Problems are returned as
//! data, never raised.

use crate::collection::collection_items;
use crate::errors::ErrorMap;
use crate::field::{format_number, value_to_string};
use crate::layout::nested_form_data;
use crate::schema::{FieldDescriptor, FieldType, SchemaMetadata, build_schema_metadata};
use formsmith_conf::RenderSettings;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

pub const REQUIRED_MESSAGE: &str = "This field is required";

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Validate `data` against `meta`, recursing into sections and collection items.
///
/// # Examples
///
/// ```
/// use formsmith_conf::RenderSettings;
/// use formsmith_forms::{FormSchema, build_schema_metadata};
/// use formsmith_forms::validation::validate;
/// use serde_json::json;
///
/// let settings = RenderSettings::default();
/// let schema = FormSchema::from_value(&json!({
///     "properties": {
///         "username": {"type": "string", "minLength": 3},
///         "pets": {"type": "array", "items": {"$ref": "#/$defs/Pet"}}
///     },
///     "required": ["username"],
///     "$defs": {"Pet": {"type": "object", "properties": {"name": {"type": "string"}}, "required": ["name"]}}
/// }))
/// .unwrap();
/// let meta = build_schema_metadata(&schema, &settings).unwrap();
///
/// let data = json!({"username": "al", "pets": [{"name": "Rex"}, {"name": ""}]});
/// let errors = validate(&meta, data.as_object().unwrap(), &settings);
///
/// assert_eq!(errors.get("username"), Some("Must be at least 3 characters long"));
/// assert_eq!(errors.get("pets[1].name"), Some("This field is required"));
/// assert_eq!(errors.len(), 2);
/// ```
pub fn validate(meta: &SchemaMetadata, data: &Map<String, Value>, settings: &RenderSettings) -> ErrorMap {
	let mut errors = ErrorMap::new();
	validate_scope(meta, data, settings, "", 0, &mut errors);
	errors
}

fn validate_scope(
	meta: &SchemaMetadata,
	data: &Map<String, Value>,
	settings: &RenderSettings,
	prefix: &str,
	depth: usize,
	out: &mut ErrorMap,
) {
	for field in &meta.fields {
		let path = format!("{}{}", prefix, field.name);
		let required = field.required || meta.required.contains(&field.name);

		if field.is_layout() || field.is_collection() {
			if depth >= settings.max_nesting_depth {
				tracing::debug!("Skipping validation below '{}': nesting limit reached", path);
				continue;
			}
			let sub_meta = match meta
				.sub_schema(field)
				.ok()
				.and_then(|sub| build_schema_metadata(&sub, settings).ok())
			{
				Some(sub_meta) => sub_meta,
				None => {
					tracing::debug!("Skipping validation of '{}': no resolvable sub-schema", path);
					continue;
				}
			};

			if field.is_layout() {
				let nested = nested_form_data(&field.name, data, settings);
				validate_scope(&sub_meta, &nested, settings, &format!("{}.", path), depth + 1, out);
			} else {
				validate_collection(field, &sub_meta, data.get(&field.name), required, settings, &path, depth, out);
			}
			continue;
		}

		if let Some(message) = check_field(field, data.get(&field.name), required) {
			out.insert(path, message);
		}
	}
}

#[allow(clippy::too_many_arguments)]
fn validate_collection(
	field: &FieldDescriptor,
	item_meta: &SchemaMetadata,
	value: Option<&Value>,
	required: bool,
	settings: &RenderSettings,
	path: &str,
	depth: usize,
	out: &mut ErrorMap,
) {
	let submitted = match value {
		Some(Value::Array(items)) => items.len(),
		Some(Value::Object(map)) => map.keys().filter(|k| k.parse::<usize>().is_ok()).count(),
		_ => 0,
	};
	let (min_items, max_items) = field.collection_bounds(settings).unwrap_or((0, usize::MAX));

	if submitted == 0 {
		if required || min_items > 0 {
			out.insert(path, too_few_items(min_items.max(1)));
		}
		return;
	}
	if submitted < min_items {
		out.insert(path, too_few_items(min_items));
	}
	if submitted > max_items {
		out.insert(path, too_many_items(max_items));
	}

	for item in collection_items(&field.name, value, &ErrorMap::new(), 0, false) {
		let prefix = format!("{}[{}].", path, item.index);
		validate_scope(item_meta, &item.data, settings, &prefix, depth + 1, out);
	}
}

fn too_few_items(min: usize) -> String {
	format!("Add at least {} {}", min, if min == 1 { "item" } else { "items" })
}

fn too_many_items(max: usize) -> String {
	format!("No more than {} {} allowed", max, if max == 1 { "item" } else { "items" })
}

/// First problem with one leaf value, if any.
pub fn check_field(field: &FieldDescriptor, value: Option<&Value>, required: bool) -> Option<String> {
	let Some(value) = value.filter(|value| !is_blank(value)) else {
		return required.then(|| REQUIRED_MESSAGE.to_string());
	};

	let type_problem = match field.field_type {
		FieldType::Boolean => check_boolean(value),
		FieldType::Integer | FieldType::Number => check_number(field, value),
		FieldType::String => check_string(field, value),
		FieldType::Array => check_array(field, value),
		_ => None,
	};
	type_problem.or_else(|| check_choice(field, value))
}

fn is_blank(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::String(s) => s.trim().is_empty(),
		Value::Array(items) => items.is_empty(),
		_ => false,
	}
}

fn check_boolean(value: &Value) -> Option<String> {
	let valid = match value {
		Value::Bool(_) => true,
		Value::String(s) => matches!(
			s.to_lowercase().as_str(),
			"true" | "false" | "on" | "off" | "yes" | "no" | "1" | "0"
		),
		Value::Number(n) => matches!(n.as_f64(), Some(v) if v == 0.0 || v == 1.0),
		_ => false,
	};
	(!valid).then(|| "Must be true or false".to_string())
}

fn check_number(field: &FieldDescriptor, value: &Value) -> Option<String> {
	let number = match value {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse::<f64>().ok(),
		_ => None,
	};
	let Some(number) = number.filter(|n| n.is_finite()) else {
		return Some("Invalid numeric value".to_string());
	};
	let constraints = &field.constraints;

	if field.field_type == FieldType::Integer && number.fract() != 0.0 {
		return Some("Must be a whole number".to_string());
	}
	match (constraints.minimum, constraints.maximum) {
		(Some(min), Some(max)) if number < min || number > max => {
			return Some(format!(
				"Must be between {} and {}",
				format_number(min),
				format_number(max)
			));
		}
		(Some(min), None) if number < min => {
			return Some(format!("Must be at least {}", format_number(min)));
		}
		(None, Some(max)) if number > max => {
			return Some(format!("Must be no more than {}", format_number(max)));
		}
		_ => {}
	}
	if let Some(min) = constraints.exclusive_minimum
		&& number <= min
	{
		return Some(format!("Must be greater than {}", format_number(min)));
	}
	if let Some(max) = constraints.exclusive_maximum
		&& number >= max
	{
		return Some(format!("Must be less than {}", format_number(max)));
	}
	if let Some(step) = constraints.multiple_of
		&& step > 0.0
	{
		let ratio = number / step;
		if (ratio - ratio.round()).abs() > 1e-9 {
			return Some(format!("Must be a multiple of {}", format_number(step)));
		}
	}
	None
}

fn check_string(field: &FieldDescriptor, value: &Value) -> Option<String> {
	let text = match value {
		Value::String(s) => s.clone(),
		Value::Array(_) | Value::Object(_) => return Some("Must be text".to_string()),
		other => value_to_string(other).unwrap_or_default(),
	};
	let constraints = &field.constraints;
	let length = text.chars().count() as u64;

	if let Some(min) = constraints.min_length
		&& length < min
	{
		return Some(format!("Must be at least {} characters long", min));
	}
	if let Some(max) = constraints.max_length
		&& length > max
	{
		return Some(format!("Must be no more than {} characters long", max));
	}
	if let Some(pattern) = &constraints.pattern {
		match Regex::new(pattern) {
			Ok(re) if !re.is_match(&text) => return Some("Invalid format".to_string()),
			Ok(_) => {}
			Err(err) => tracing::warn!("Ignoring invalid pattern on '{}': {}", field.name, err),
		}
	}
	if field.format.as_deref() == Some("email") && !EMAIL.is_match(&text) {
		return Some("Please enter a valid email address".to_string());
	}
	None
}

fn check_array(field: &FieldDescriptor, value: &Value) -> Option<String> {
	let count = match value {
		Value::Array(items) => items.len(),
		_ => 1,
	};
	if let Some(min) = field.constraints.min_items
		&& count < min
	{
		return Some(too_few_items(min));
	}
	if let Some(max) = field.constraints.max_items
		&& count > max
	{
		return Some(too_many_items(max));
	}
	None
}

fn check_choice(field: &FieldDescriptor, value: &Value) -> Option<String> {
	if field.enum_values.is_empty() {
		return None;
	}
	let allowed: Vec<String> = field.enum_values.iter().filter_map(value_to_string).collect();
	let chosen: Vec<&Value> = match value {
		Value::Array(items) => items.iter().collect(),
		other => vec![other],
	};
	let valid = chosen
		.into_iter()
		.filter_map(value_to_string)
		.all(|choice| allowed.contains(&choice));
	(!valid).then(|| "Select a valid choice".to_string())
}
