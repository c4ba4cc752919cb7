//! HTML widgets for formsmith
//!
//! This crate provides the rendering primitives the form layer is built on:
//! - [`Markup`] fragments and [`Template`]s with escaped text slots
//! - ordered [`Attrs`] with additive `class` and `style`
//! - [`Theme`]s mapping structural roles to Bootstrap 5, Material, Tailwind or no classes
//! - a [`WidgetRegistry`] of element renderers with the built-in HTML controls
//!
//! ## Example
//!
//! ```
//! use formsmith_widgets::{Attrs, WidgetRegistry, WidgetRequest, theme_for};
//!
//! let registry = WidgetRegistry::with_builtins();
//! let theme = theme_for("bootstrap");
//! let attrs = Attrs::new().required();
//! let html = registry
//!     .render(&WidgetRequest {
//!         element: "email",
//!         name: "email",
//!         id: "id_email",
//!         value: Some("a@b.c"),
//!         checked: false,
//!         attrs: &attrs,
//!         options: &[],
//!         theme: theme.as_ref(),
//!     })
//!     .unwrap();
//! assert!(html.as_str().contains(r#"type="email""#));
//! assert!(html.as_str().contains("form-control"));
//! ```

pub mod attrs;
pub mod error;
pub mod markup;
pub mod registry;
pub mod theme;
pub mod widgets;

pub use attrs::Attrs;
pub use error::{WidgetError, WidgetResult};
pub use markup::{Markup, Slot, Slots, Template, html_escape};
pub use registry::{SelectOption, WidgetFn, WidgetRegistry, WidgetRequest};
pub use theme::{
	Bootstrap5Theme, CssFramework, MaterialTheme, PlainTheme, StyleRole, TailwindTheme, Theme,
	UnknownFramework, theme_for,
};
pub use widgets::{BUILTIN_ALIASES, BUILTIN_TAGS, EMPTY_CHOICE_LABEL};
