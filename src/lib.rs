//! # Formsmith
//!
//! Schema-driven HTML form rendering.
//!
//! Formsmith turns a JSON Schema document into a complete HTML form: typed
//! controls for every property, nested sections for object references,
//! repeatable collections for arrays of objects, inline errors next to the
//! offending control and a humanized summary at the top.
//!
//! ## Feature Flags
//!
//! - `full` (default) - Everything below
//! - `conf` - [`RenderSettings`] and settings file loading
//! - `widgets` - Markup, attributes, themes and the widget registry
//! - `forms` - Schema compilation, layout, collections, validation and the renderer
//! - `async` - [`FormRenderer::render_form_async`] on the tokio blocking pool
//!
//! ## Quick Example
//!
//! ```
//! use formsmith::prelude::*;
//! use serde_json::json;
//!
//! let schema = FormSchema::new()
//!     .required_field("username", json!({"type": "string", "minLength": 3}))
//!     .field("bio", json!({"type": "string", "maxLength": 500}));
//!
//! let data = extract([("username", "ad")], true);
//! let renderer = FormRenderer::default();
//! let meta = build_schema_metadata(&schema, renderer.settings()).unwrap();
//! let errors = validate(&meta, &data, renderer.settings());
//!
//! let html = renderer
//!     .render_form(&schema, &data, &errors, &RenderOptions::new("/signup"))
//!     .unwrap();
//!
//! assert!(html.contains("Must be at least 3 characters long"));
//! assert!(html.contains(r#"<textarea"#));
//! ```

#[cfg(feature = "conf")]
pub mod conf;
#[cfg(feature = "forms")]
pub mod forms;
#[cfg(feature = "widgets")]
pub mod widgets;

// Re-export settings
#[cfg(feature = "conf")]
pub use formsmith_conf::{ConfError, RenderSettings, TabGroupRule};

// Re-export rendering primitives
#[cfg(feature = "widgets")]
pub use formsmith_widgets::{
	Attrs, CssFramework, Markup, Theme, WidgetError, WidgetRegistry, WidgetRequest, theme_for,
};

// Re-export the form layer
#[cfg(feature = "forms")]
pub use formsmith_forms::{
	CollectionError, CollectionState, ErrorMap, ErrorSummary, FieldDescriptor, FieldType,
	FormSchema, FormRenderer, LayoutMode, RenderError, RenderOptions, RenderResult, SchemaError,
	SchemaMetadata, build_schema_metadata, humanize_error_path, validate,
};

/// Path codec helpers, available at the top level since most callers start
/// from a flat form submission.
#[cfg(feature = "forms")]
pub use formsmith_forms::path::{extract, flatten};

/// Prelude module for convenient imports
///
/// ```
/// use formsmith::prelude::*;
///
/// let settings = RenderSettings::default();
/// assert_eq!(settings.layout, "vertical");
/// ```
pub mod prelude {
	#[cfg(feature = "conf")]
	pub use crate::RenderSettings;

	#[cfg(feature = "widgets")]
	pub use crate::{Attrs, Markup, Theme, WidgetRegistry, theme_for};

	#[cfg(feature = "forms")]
	pub use crate::{
		CollectionState, ErrorMap, FormRenderer, FormSchema, LayoutMode, RenderOptions,
		build_schema_metadata, extract, flatten, validate,
	};
}
