//! # formsmith-forms
//!
//! Schema-driven form rendering.
//!
//! ## Pipeline
//!
//! 1. A [`FormSchema`] is compiled into [`SchemaMetadata`]: ordered
//!    [`FieldDescriptor`]s with resolved UI elements and constraints.
//! 2. Submitted data is nested with the [`path`] codec (`pets[0].name` becomes
//!    `{"pets": [{"name": ...}]}`).
//! 3. The [`layout`] engine walks the fields, rendering leaves through
//!    [`field::render_field`], nested sections recursively, and repeatable
//!    groups through [`collection`].
//! 4. [`ErrorMap`] entries are attached inline by path and listed, humanized,
//!    in an [`ErrorSummary`] at the top of the form.
//!
//! ## Example
//!
//! ```
//! use formsmith_forms::{ErrorMap, FormRenderer, FormSchema, LayoutMode, RenderOptions};
//! use formsmith_forms::path::extract;
//!
//! let schema = FormSchema::from_json_str(r##"{
//!     "properties": {
//!         "owner": {"type": "string"},
//!         "pets": {"type": "array", "items": {"$ref": "#/$defs/Pet"}, "ui": {"min_items": 1}}
//!     },
//!     "$defs": {"Pet": {"type": "object", "properties": {"name": {"type": "string"}}}}
//! }"##)
//! .unwrap();
//!
//! let data = extract([("owner", "Ada"), ("pets[0].name", "Rex"), ("pets[1].name", "Tom")], true);
//! let errors: ErrorMap = [("pets[1].name", "Name taken")].into_iter().collect();
//!
//! let html = FormRenderer::default()
//!     .render_form(&schema, &data, &errors, &RenderOptions::new("/pets").layout(LayoutMode::Vertical))
//!     .unwrap();
//!
//! assert!(html.contains(r#"name="pets[1].name""#));
//! assert!(html.contains("<strong>Pet #2 — Name:</strong> Name taken"));
//! ```

pub mod collection;
pub mod context;
pub mod error;
pub mod errors;
pub mod field;
pub mod layout;
pub mod path;
pub mod renderer;
pub mod schema;
pub mod validation;

pub use collection::{CollectionItem, CollectionState, compact_indices};
pub use context::{FormContext, LayoutMode, UnknownLayout};
pub use error::{CollectionError, RenderError, RenderResult, SchemaError};
pub use errors::{ErrorEntry, ErrorMap, ErrorRecord, ErrorSummary, humanize_error_path};
pub use path::{PathToken, extract, flatten, tokenize};
pub use renderer::{FormRenderer, RenderOptions};
pub use schema::{
	FieldDescriptor, FieldType, FormSchema, SchemaMetadata, build_schema_metadata,
	resolve_ui_element, split_layout_fields,
};
pub use validation::validate;
