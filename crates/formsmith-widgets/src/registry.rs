//! Widget registry
//!
//! Maps UI element tags to widget renderers. Unknown tags resolve to the text
//! input renderer, so a schema naming an element nobody registered still
//! produces a usable control.

use crate::attrs::Attrs;
use crate::markup::Markup;
use crate::theme::Theme;
use crate::widgets;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One selectable choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
	pub value: String,
	pub label: String,
	pub selected: bool,
}

impl SelectOption {
	pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			value: value.into(),
			label: label.into(),
			selected: false,
		}
	}

	pub fn selected(mut self, selected: bool) -> Self {
		self.selected = selected;
		self
	}
}

/// Everything a widget needs to render one control
#[derive(Debug, Clone, Copy)]
pub struct WidgetRequest<'a> {
	/// Resolved element tag
	pub element: &'a str,
	pub name: &'a str,
	pub id: &'a str,
	pub value: Option<&'a str>,
	/// Checked state for checkbox-like widgets
	pub checked: bool,
	pub attrs: &'a Attrs,
	pub options: &'a [SelectOption],
	pub theme: &'a dyn Theme,
}

/// Widget renderer
pub type WidgetFn = Arc<dyn Fn(&WidgetRequest<'_>) -> anyhow::Result<Markup> + Send + Sync>;

/// Tag to renderer table
///
/// # Examples
///
/// ```
/// use formsmith_widgets::{Attrs, Markup, WidgetRegistry, WidgetRequest, theme_for};
///
/// let mut registry = WidgetRegistry::with_builtins();
/// registry.register("stars", |req: &WidgetRequest<'_>| {
///     Ok(Markup::raw(format!("<x-stars name=\"{}\"></x-stars>", req.name)))
/// });
///
/// let theme = theme_for("plain");
/// let attrs = Attrs::new();
/// let request = WidgetRequest {
///     element: "stars",
///     name: "rating",
///     id: "id_rating",
///     value: None,
///     checked: false,
///     attrs: &attrs,
///     options: &[],
///     theme: theme.as_ref(),
/// };
/// assert_eq!(
///     registry.render(&request).unwrap().as_str(),
///     "<x-stars name=\"rating\"></x-stars>"
/// );
/// ```
#[derive(Clone)]
pub struct WidgetRegistry {
	renderers: HashMap<String, WidgetFn>,
	fallback: WidgetFn,
}

impl WidgetRegistry {
	/// Registry with no tags; everything renders as a text input.
	pub fn empty() -> Self {
		Self {
			renderers: HashMap::new(),
			fallback: widgets::text_input(),
		}
	}

	/// Registry with the built-in widgets and their aliases
	pub fn with_builtins() -> Self {
		let mut registry = Self::empty();
		widgets::register_builtins(&mut registry);
		registry
	}

	/// Register (or replace) a renderer for a tag
	pub fn register<F>(&mut self, tag: impl Into<String>, renderer: F)
	where
		F: Fn(&WidgetRequest<'_>) -> anyhow::Result<Markup> + Send + Sync + 'static,
	{
		self.renderers.insert(tag.into(), Arc::new(renderer));
	}

	/// Register a shared renderer under a tag
	pub fn register_shared(&mut self, tag: impl Into<String>, renderer: WidgetFn) {
		self.renderers.insert(tag.into(), renderer);
	}

	/// Make `alias` render like `target`. Returns false if `target` is unknown.
	pub fn alias(&mut self, alias: impl Into<String>, target: &str) -> bool {
		match self.renderers.get(target).cloned() {
			Some(renderer) => {
				self.renderers.insert(alias.into(), renderer);
				true
			}
			None => false,
		}
	}

	pub fn contains(&self, tag: &str) -> bool {
		self.renderers.contains_key(tag)
	}

	/// Renderer for a tag, or the text input fallback
	pub fn resolve(&self, tag: &str) -> &WidgetFn {
		self.renderers.get(tag).unwrap_or(&self.fallback)
	}

	pub fn render(&self, request: &WidgetRequest<'_>) -> anyhow::Result<Markup> {
		(self.resolve(request.element))(request)
	}

	pub fn tags(&self) -> impl Iterator<Item = &str> {
		self.renderers.keys().map(String::as_str)
	}
}

impl Default for WidgetRegistry {
	fn default() -> Self {
		Self::with_builtins()
	}
}

impl fmt::Debug for WidgetRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut tags: Vec<&str> = self.tags().collect();
		tags.sort_unstable();
		f.debug_struct("WidgetRegistry").field("tags", &tags).finish()
	}
}
