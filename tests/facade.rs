//! Integration tests for the facade re-exports

use formsmith::prelude::*;
use rstest::rstest;
use serde_json::{Map, json};

#[rstest]
#[case("bootstrap", "form-control")]
#[case("tailwind", "border-gray-300")]
fn test_settings_select_theme(#[case] framework: &str, #[case] expected_class: &str) {
	let settings =
		RenderSettings::from_toml_str(&format!("framework = \"{}\"", framework)).unwrap();
	let renderer = FormRenderer::new(settings).unwrap();
	let schema = FormSchema::new().field("city", json!({"type": "string"}));

	let html = renderer
		.render_form(&schema, &Map::new(), &ErrorMap::new(), &RenderOptions::new("/go"))
		.unwrap();

	assert!(html.contains(expected_class));
}

#[rstest]
fn test_collection_state_round_trips_through_extract() {
	let data = extract([("tags[0].label", "a"), ("tags[1].label", "b")], false);
	let mut tags = CollectionState::from_submission("tags", data.get("tags"), 0, 5).unwrap();

	tags.remove(0).unwrap();

	assert_eq!(tags.to_flat(), vec![("tags[0].label".to_string(), "b".to_string())]);
	assert_eq!(flatten(&extract(tags.to_flat(), false)), tags.to_flat());
}

#[tokio::test]
async fn test_async_entry_point_is_reexported() {
	let html = FormRenderer::default()
		.render_form_async(FormSchema::new(), Map::new(), ErrorMap::new(), RenderOptions::new("/x"))
		.await
		.unwrap();
	assert!(html.starts_with("<!-- Start formsmith -->"));
}
