//! End-to-end rendering scenarios

use formsmith_forms::collection::{CollectionState, collection_items};
use formsmith_forms::path::extract;
use formsmith_forms::validation::validate;
use formsmith_forms::{
	CollectionError, ErrorMap, FormRenderer, FormSchema, LayoutMode, RenderOptions,
	build_schema_metadata, humanize_error_path,
};
use formsmith_conf::RenderSettings;
use rstest::{fixture, rstest};
use serde_json::{Map, Value, json};

#[fixture]
fn pet_schema() -> FormSchema {
	registration_schema()
}

fn registration_schema() -> FormSchema {
	FormSchema::from_value(&json!({
		"title": "Pet registration",
		"properties": {
			"owner": {"type": "string", "title": "Owner name"},
			"profile": {"$ref": "#/$defs/Profile"},
			"pets": {
				"type": "array",
				"items": {"$ref": "#/$defs/PetModel"},
				"ui": {"min_items": 1, "max_items": 10}
			}
		},
		"required": ["owner"],
		"$defs": {
			"Profile": {
				"type": "object",
				"properties": {
					"name": {"type": "string"},
					"email": {"type": "string", "format": "email"}
				}
			},
			"PetModel": {
				"type": "object",
				"properties": {
					"name": {"type": "string"},
					"weight": {"type": "number", "minimum": 0.1},
					"species": {"type": "string", "enum": ["cat", "dog"]}
				},
				"required": ["name"]
			}
		}
	}))
	.unwrap()
}

fn render(schema: &FormSchema, data: &Map<String, Value>, errors: &ErrorMap) -> String {
	FormRenderer::default()
		.render_form(schema, data, errors, &RenderOptions::new("/pets"))
		.unwrap()
}

#[rstest]
#[case("pets[7].name", "Pet #8 — Name")]
#[case("companies[1].tax_id", "Company #2 — Tax Id")]
#[case("form", "Form")]
#[case("pets.0.name", "Pet #1 — Name")]
#[case("[2]", "Item #3")]
fn test_humanization(#[case] path: &str, #[case] expected: &str) {
	assert_eq!(humanize_error_path(path), expected);
}

#[rstest]
fn test_min_items_with_empty_submission(pet_schema: FormSchema) {
	let html = render(&pet_schema, &Map::new(), &ErrorMap::new());
	let items_end = html.find("<template").unwrap();
	assert_eq!(html[..items_end].matches(r#"data-formsmith-item data-index="#).count(), 1);
	assert!(html.contains(r#"name="pets[0].name""#));
	assert!(!html.contains(r#"name="pets[1].name""#));
}

#[rstest]
fn test_max_items_guard() {
	let items = Value::Array((0..10).map(|i| json!({"name": format!("pet {}", i)})).collect());
	let mut pets = CollectionState::from_submission("pets", Some(&items), 1, 10).unwrap();

	let result = pets.add();

	assert_eq!(
		result,
		Err(CollectionError::MaxItemsReached {
			field: "pets".to_string(),
			max: 10
		})
	);
	assert_eq!(pets.len(), 10);
}

#[rstest]
fn test_error_rekeying_per_item() {
	let errors: ErrorMap = [("pets[0].weight", "too small"), ("pets[2].name", "required")]
		.into_iter()
		.collect();
	let value = json!([{}, {}, {}]);

	let items = collection_items("pets", Some(&value), &errors, 0, false);
	let rekeyed = errors.rekey_collection("pets");

	assert_eq!(rekeyed.get("0.weight"), Some("too small"));
	assert_eq!(rekeyed.get("2.name"), Some("required"));
	assert_eq!(items[0].errors.iter().collect::<Vec<_>>(), vec![("weight", "too small")]);
	assert!(items[1].errors.is_empty());
	assert_eq!(items[2].errors.iter().collect::<Vec<_>>(), vec![("name", "required")]);
}

#[rstest]
fn test_flat_submission_renders_back_into_names(pet_schema: FormSchema) {
	let data = extract(
		[
			("owner", "Ada"),
			("profile.name", "Ada Lovelace"),
			("pets[0].name", "Rex"),
			("pets[1].name", "Tom"),
			("pets[1].species", "cat"),
		],
		true,
	);
	assert_eq!(data["profile"], json!({"name": "Ada Lovelace"}));

	let html = render(&pet_schema, &data, &ErrorMap::new());
	assert!(html.contains(r#"name="profile.name""#));
	assert!(html.contains(r#"value="Ada Lovelace""#));
	assert!(html.contains(r#"name="pets[1].name""#));
	assert!(html.contains(r#"value="Tom""#));
	assert!(html.contains(r#"<option value="cat" selected>"#));
}

#[rstest]
fn test_validation_feeds_summary_and_fields(pet_schema: FormSchema) {
	let settings = RenderSettings::default();
	let meta = build_schema_metadata(&pet_schema, &settings).unwrap();
	let data = extract(
		[
			("profile.email", "not-an-email"),
			("pets[0].name", "Rex"),
			("pets[0].weight", "0"),
			("pets[1].name", ""),
		],
		false,
	);

	let errors = validate(&meta, &data, &settings);
	assert_eq!(errors.get("owner"), Some("This field is required"));
	assert_eq!(errors.get("profile.email"), Some("Please enter a valid email address"));
	assert_eq!(errors.get("pets[0].weight"), Some("Must be at least 0.1"));
	assert_eq!(errors.get("pets[1].name"), Some("This field is required"));

	let html = render(&pet_schema, &data, &errors);
	assert!(html.contains("<strong>Owner:</strong> This field is required"));
	assert!(html.contains("<strong>Pet #1 — Weight:</strong> Must be at least 0.1"));
	assert!(html.contains(r#"id="id_pets_1__name_error""#));
	assert!(html.contains(r#"id="id_profile_email_error""#));
}

#[rstest]
fn test_error_records_are_accepted(pet_schema: FormSchema) {
	let errors = ErrorMap::from_value(&json!({
		"errors": [
			{"name": "owner", "message": "Owner is banned"},
			{"message": "Try again later"}
		]
	}));
	let html = render(&pet_schema, &Map::new(), &errors);
	assert!(html.contains("<strong>Owner:</strong> Owner is banned"));
	assert!(html.contains("<strong>Form:</strong> Try again later"));
}

#[rstest]
fn test_broken_section_does_not_abort_form() {
	let schema = FormSchema::new()
		.field("before", json!({"type": "string"}))
		.field("billing", json!({"$ref": "#/$defs/Billing"}))
		.field("after", json!({"type": "string"}));

	let html = render(&schema, &Map::new(), &ErrorMap::new());
	assert!(html.contains(r#"name="before""#));
	assert!(html.contains(r#"Error rendering section "Billing""#));
	assert!(html.contains(r#"name="after""#));
	assert!(html.contains("</form>"));
}

#[rstest]
#[case(LayoutMode::Vertical, "data-layout=\"vertical\"")]
#[case(LayoutMode::SideBySide, "data-formsmith-row")]
#[case(LayoutMode::Tabbed, "data-formsmith-tabs")]
fn test_layout_modes(pet_schema: FormSchema, #[case] layout: LayoutMode, #[case] marker: &str) {
	let html = FormRenderer::default()
		.render_fields_only(&pet_schema, &Map::new(), &ErrorMap::new(), layout)
		.unwrap();
	assert!(html.contains(marker));
}

#[tokio::test]
async fn test_async_render_matches_sync() {
	let schema = registration_schema();
	let data = extract([("owner", "Ada")], true);
	let renderer = FormRenderer::default();
	let options = RenderOptions::new("/pets");

	let sync = renderer
		.render_form(&schema, &data, &ErrorMap::new(), &options)
		.unwrap();
	let async_html = renderer
		.render_form_async(schema, data, ErrorMap::new(), options)
		.await
		.unwrap();

	assert_eq!(sync, async_html);
}

#[tokio::test]
async fn test_async_propagates_caller_errors() {
	let result = FormRenderer::default()
		.render_form_async(FormSchema::new(), Map::new(), ErrorMap::new(), RenderOptions::new(""))
		.await;
	assert!(matches!(result, Err(formsmith_forms::RenderError::MissingSubmitUrl)));
}
