//! Per-render context

use crate::errors::ErrorMap;
use formsmith_conf::RenderSettings;
use formsmith_widgets::{Theme, WidgetRegistry};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// How a set of fields is arranged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
	#[default]
	Vertical,
	SideBySide,
	Tabbed,
}

impl LayoutMode {
	pub fn as_str(self) -> &'static str {
		match self {
			LayoutMode::Vertical => "vertical",
			LayoutMode::SideBySide => "side-by-side",
			LayoutMode::Tabbed => "tabbed",
		}
	}
}

impl fmt::Display for LayoutMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown layout mode: {0}")]
pub struct UnknownLayout(pub String);

impl FromStr for LayoutMode {
	type Err = UnknownLayout;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"vertical" | "" => Ok(LayoutMode::Vertical),
			"side-by-side" | "side_by_side" | "sidebyside" | "horizontal" => {
				Ok(LayoutMode::SideBySide)
			}
			"tabbed" | "tabs" => Ok(LayoutMode::Tabbed),
			other => Err(UnknownLayout(other.to_string())),
		}
	}
}

/// Data, errors and collaborators for one scope of a render.
///
/// The root context covers the whole form. Nested sections and collection
/// items get a derived context from [`FormContext::descend`]: its data and
/// errors are keyed relative to the section, while [`FormContext::qualify`]
/// still produces the full submission name.
#[derive(Clone)]
pub struct FormContext<'a> {
	data: Cow<'a, Map<String, Value>>,
	errors: ErrorMap,
	prefix: String,
	depth: usize,
	pub theme: &'a dyn Theme,
	pub registry: &'a WidgetRegistry,
	pub settings: &'a RenderSettings,
	/// Re-emit submitted password values
	pub preserve_passwords: bool,
}

impl<'a> FormContext<'a> {
	pub fn new(
		data: &'a Map<String, Value>,
		errors: ErrorMap,
		theme: &'a dyn Theme,
		registry: &'a WidgetRegistry,
		settings: &'a RenderSettings,
	) -> Self {
		Self {
			data: Cow::Borrowed(data),
			errors,
			prefix: String::new(),
			depth: 0,
			theme,
			registry,
			settings,
			preserve_passwords: false,
		}
	}

	pub fn with_preserved_passwords(mut self, preserve: bool) -> Self {
		self.preserve_passwords = preserve;
		self
	}

	/// Derived context for a nested scope; `segment` is appended to the name
	/// prefix (`"profile."`, `"pets[0]."`).
	pub fn descend<'b>(
		&'b self,
		segment: &str,
		data: Cow<'b, Map<String, Value>>,
		errors: ErrorMap,
	) -> FormContext<'b> {
		FormContext {
			data,
			errors,
			prefix: format!("{}{}", self.prefix, segment),
			depth: self.depth + 1,
			theme: self.theme,
			registry: self.registry,
			settings: self.settings,
			preserve_passwords: self.preserve_passwords,
		}
	}

	pub fn data(&self) -> &Map<String, Value> {
		&self.data
	}

	pub fn value(&self, name: &str) -> Option<&Value> {
		self.data.get(name)
	}

	pub fn errors(&self) -> &ErrorMap {
		&self.errors
	}

	pub fn error(&self, name: &str) -> Option<&str> {
		self.errors.get(name)
	}

	/// Full submission name of a field in this scope
	pub fn qualify(&self, name: &str) -> String {
		format!("{}{}", self.prefix, name)
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	/// Number of nested scopes above this one
	pub fn depth(&self) -> usize {
		self.depth
	}
}

impl fmt::Debug for FormContext<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FormContext")
			.field("prefix", &self.prefix)
			.field("depth", &self.depth)
			.field("fields", &self.data.len())
			.field("errors", &self.errors.len())
			.field("theme", &self.theme.name())
			.finish()
	}
}
