//! Render settings
//!
//! Every threshold and heuristic the renderer consults lives here, so a deployment
//! can tune layout behavior from a TOML or JSON file instead of patching code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Tab grouping rule: a field lands in this tab when its name contains any keyword.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabGroupRule {
	pub title: String,
	#[serde(default)]
	pub keywords: Vec<String>,
}

impl TabGroupRule {
	/// Create a new grouping rule
	///
	/// # Examples
	///
	/// ```
	/// use formsmith_conf::TabGroupRule;
	///
	/// let rule = TabGroupRule::new("Billing", ["card", "iban"]);
	/// assert!(rule.matches("card_number"));
	/// assert!(!rule.matches("nickname"));
	/// ```
	pub fn new<I, S>(title: impl Into<String>, keywords: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			title: title.into(),
			keywords: keywords.into_iter().map(Into::into).collect(),
		}
	}

	/// Case-insensitive substring match against the field name.
	pub fn matches(&self, field_name: &str) -> bool {
		let lowered = field_name.to_lowercase();
		self.keywords
			.iter()
			.any(|keyword| !keyword.is_empty() && lowered.contains(&keyword.to_lowercase()))
	}
}

/// Settings consulted by the form renderer
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
	/// Styling framework identifier ("bootstrap", "material", "tailwind", "plain")
	#[serde(default = "default_framework")]
	pub framework: String,

	/// Default layout mode when the caller does not pick one
	#[serde(default = "default_layout")]
	pub layout: String,

	/// String fields whose maximum length exceeds this become text areas
	#[serde(default = "default_long_text_threshold")]
	pub long_text_threshold: u64,

	/// Upper bound for collections that do not declare one
	#[serde(default = "default_max_items")]
	pub default_max_items: usize,

	/// Nested sections and collections deeper than this are replaced by a warning
	#[serde(default = "default_max_nesting_depth")]
	pub max_nesting_depth: usize,

	/// Promote a form made only of layout fields to a tab set
	#[serde(default = "default_true")]
	pub auto_tab_layout_fields: bool,

	/// Keyword rules used to group fields into tabs, first match wins
	#[serde(default = "default_tab_groups")]
	pub tab_groups: Vec<TabGroupRule>,

	/// Tab that receives fields matching no rule
	#[serde(default = "default_fallback_tab_title")]
	pub fallback_tab_title: String,

	/// Tab title used when no field could be grouped at all
	#[serde(default = "default_empty_tab_title")]
	pub empty_tab_title: String,

	/// Additional data keys probed when a nested section's own key holds no mapping
	#[serde(default)]
	pub nested_data_fallbacks: BTreeMap<String, Vec<String>>,

	/// Wrap complete forms in start/end marker comments
	#[serde(default = "default_true")]
	pub include_markers: bool,
}

fn default_framework() -> String {
	"bootstrap".to_string()
}

fn default_layout() -> String {
	"vertical".to_string()
}

fn default_long_text_threshold() -> u64 {
	256
}

fn default_max_items() -> usize {
	10
}

fn default_max_nesting_depth() -> usize {
	8
}

fn default_true() -> bool {
	true
}

fn default_tab_groups() -> Vec<TabGroupRule> {
	vec![
		TabGroupRule::new("Personal", ["name", "username", "password", "bio", "role"]),
		TabGroupRule::new("Contact", ["email", "phone", "address", "subject", "message"]),
	]
}

fn default_fallback_tab_title() -> String {
	"Additional".to_string()
}

fn default_empty_tab_title() -> String {
	"Form Fields".to_string()
}

impl Default for RenderSettings {
	fn default() -> Self {
		Self {
			framework: default_framework(),
			layout: default_layout(),
			long_text_threshold: default_long_text_threshold(),
			default_max_items: default_max_items(),
			max_nesting_depth: default_max_nesting_depth(),
			auto_tab_layout_fields: true,
			tab_groups: default_tab_groups(),
			fallback_tab_title: default_fallback_tab_title(),
			empty_tab_title: default_empty_tab_title(),
			nested_data_fallbacks: BTreeMap::new(),
			include_markers: true,
		}
	}
}

impl RenderSettings {
	/// Create new settings with defaults
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse settings from a TOML document; absent keys keep their defaults.
	///
	/// # Examples
	///
	/// ```
	/// use formsmith_conf::RenderSettings;
	///
	/// let settings = RenderSettings::from_toml_str(
	///     r#"
	///     framework = "tailwind"
	///     long_text_threshold = 120
	///     "#,
	/// )
	/// .unwrap();
	/// assert_eq!(settings.framework, "tailwind");
	/// assert_eq!(settings.long_text_threshold, 120);
	/// assert_eq!(settings.default_max_items, 10);
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self, ConfError> {
		let settings: RenderSettings = toml::from_str(source)
			.map_err(|e| ConfError::ParseError(format!("TOML parse error: {}", e)))?;
		settings.validate()?;
		Ok(settings)
	}

	/// Load settings from a `.toml` or `.json` file
	pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfError> {
		let path = path.into();
		let contents = std::fs::read_to_string(&path).map_err(|e| {
			ConfError::FileError(format!("Failed to read {}: {}", path.display(), e))
		})?;

		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml_str(&contents),
			Some("json") => {
				let settings: RenderSettings = serde_json::from_str(&contents)
					.map_err(|e| ConfError::ParseError(format!("JSON parse error: {}", e)))?;
				settings.validate()?;
				Ok(settings)
			}
			_ => Err(ConfError::UnsupportedFormat(
				"Supported formats: .toml, .json".to_string(),
			)),
		}
	}

	/// Validate settings
	pub fn validate(&self) -> Result<(), ConfError> {
		if self.max_nesting_depth == 0 {
			return Err(ConfError::ValidationError(
				"max_nesting_depth must be at least 1".to_string(),
			));
		}

		if self.fallback_tab_title.trim().is_empty() || self.empty_tab_title.trim().is_empty() {
			return Err(ConfError::ValidationError(
				"tab titles must not be empty".to_string(),
			));
		}

		if let Some(rule) = self.tab_groups.iter().find(|r| r.title.trim().is_empty()) {
			return Err(ConfError::ValidationError(format!(
				"tab group with keywords {:?} has an empty title",
				rule.keywords
			)));
		}

		Ok(())
	}

	/// Title of the tab a field belongs to, falling back to `fallback_tab_title`.
	///
	/// # Examples
	///
	/// ```
	/// use formsmith_conf::RenderSettings;
	///
	/// let settings = RenderSettings::default();
	/// assert_eq!(settings.tab_title_for("first_name"), "Personal");
	/// assert_eq!(settings.tab_title_for("email"), "Contact");
	/// assert_eq!(settings.tab_title_for("newsletter"), "Additional");
	/// ```
	pub fn tab_title_for(&self, field_name: &str) -> &str {
		self.tab_groups
			.iter()
			.find(|rule| rule.matches(field_name))
			.map(|rule| rule.title.as_str())
			.unwrap_or(self.fallback_tab_title.as_str())
	}

	/// Extra data keys to probe for a nested section named `field_name`.
	pub fn nested_fallbacks(&self, field_name: &str) -> &[String] {
		self.nested_data_fallbacks
			.get(field_name)
			.map(Vec::as_slice)
			.unwrap_or(&[])
	}
}

/// Settings error types
#[derive(Debug, thiserror::Error)]
pub enum ConfError {
	#[error("File error: {0}")]
	FileError(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Unsupported format: {0}")]
	UnsupportedFormat(String),
}
