//! Styling themes
//!
//! A theme maps each structural role of the rendered form to the CSS classes of
//! one framework. Widgets and layouts only ever ask for a [`StyleRole`], never
//! for a framework-specific class name.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Structural role of an element in the rendered form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleRole {
	Form,
	FieldWrapper,
	Label,
	RequiredMarker,
	Input,
	Select,
	Textarea,
	CheckWrapper,
	SwitchWrapper,
	CheckInput,
	CheckLabel,
	RadioWrapper,
	FileInput,
	RangeInput,
	ColorInput,
	HelpText,
	ErrorText,
	InvalidInput,
	Row,
	Column,
	TabContainer,
	TabList,
	TabButton,
	TabButtonActive,
	TabPanel,
	Card,
	CardHeader,
	CardBody,
	ErrorSummary,
	WarningAlert,
	SubmitButton,
	AddButton,
	RemoveButton,
	CollectionItem,
	CollectionItemHeader,
}

/// CSS classes for each [`StyleRole`]
pub trait Theme: Send + Sync + fmt::Debug {
	/// Framework identifier
	fn name(&self) -> &'static str;

	/// Classes for a role; empty when the framework has none
	fn class(&self, role: StyleRole) -> &'static str;
}

/// CSS Framework rendering styles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CssFramework {
	/// Bootstrap 5 CSS framework
	Bootstrap5,
	/// Material Design 3 styling
	Material,
	/// Tailwind CSS framework
	TailwindCSS,
	/// No CSS framework (plain HTML)
	None,
}

impl CssFramework {
	pub fn theme(self) -> Arc<dyn Theme> {
		match self {
			CssFramework::Bootstrap5 => Arc::new(Bootstrap5Theme),
			CssFramework::Material => Arc::new(MaterialTheme),
			CssFramework::TailwindCSS => Arc::new(TailwindTheme),
			CssFramework::None => Arc::new(PlainTheme),
		}
	}
}

/// Error returned when a framework identifier is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown CSS framework: {0}")]
pub struct UnknownFramework(pub String);

impl FromStr for CssFramework {
	type Err = UnknownFramework;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"bootstrap" | "bootstrap5" | "default" => Ok(CssFramework::Bootstrap5),
			"material" | "material3" | "material-design" => Ok(CssFramework::Material),
			"tailwind" | "tailwindcss" => Ok(CssFramework::TailwindCSS),
			"plain" | "none" | "" => Ok(CssFramework::None),
			other => Err(UnknownFramework(other.to_string())),
		}
	}
}

/// Resolve a theme by identifier, falling back to Bootstrap for unknown names.
///
/// # Examples
///
/// ```
/// use formsmith_widgets::{StyleRole, theme_for};
///
/// assert_eq!(theme_for("tailwind").name(), "tailwind");
/// assert_eq!(theme_for("no-such-theme").name(), "bootstrap");
/// assert_eq!(theme_for("bootstrap").class(StyleRole::Input), "form-control");
/// ```
pub fn theme_for(id: &str) -> Arc<dyn Theme> {
	match id.parse::<CssFramework>() {
		Ok(framework) => framework.theme(),
		Err(err) => {
			tracing::warn!("{}; falling back to bootstrap", err);
			CssFramework::Bootstrap5.theme()
		}
	}
}

/// Bootstrap 5 classes
#[derive(Debug, Clone, Copy, Default)]
pub struct Bootstrap5Theme;

impl Theme for Bootstrap5Theme {
	fn name(&self) -> &'static str {
		"bootstrap"
	}

	fn class(&self, role: StyleRole) -> &'static str {
		match role {
			StyleRole::Form => "needs-validation",
			StyleRole::FieldWrapper => "mb-3",
			StyleRole::Label => "form-label",
			StyleRole::RequiredMarker => "text-danger",
			StyleRole::Input | StyleRole::Textarea => "form-control",
			StyleRole::Select => "form-select",
			StyleRole::CheckWrapper | StyleRole::RadioWrapper => "form-check",
			StyleRole::SwitchWrapper => "form-check form-switch",
			StyleRole::CheckInput => "form-check-input",
			StyleRole::CheckLabel => "form-check-label",
			StyleRole::FileInput => "form-control",
			StyleRole::RangeInput => "form-range",
			StyleRole::ColorInput => "form-control form-control-color",
			StyleRole::HelpText => "form-text",
			StyleRole::ErrorText => "invalid-feedback d-block",
			StyleRole::InvalidInput => "is-invalid",
			StyleRole::Row => "row",
			StyleRole::Column => "col-md-6",
			StyleRole::TabContainer => "formsmith-tabs",
			StyleRole::TabList => "nav nav-tabs mb-3",
			StyleRole::TabButton => "nav-link",
			StyleRole::TabButtonActive => "active",
			StyleRole::TabPanel => "tab-pane",
			StyleRole::Card => "card mb-3",
			StyleRole::CardHeader => "card-header",
			StyleRole::CardBody => "card-body",
			StyleRole::ErrorSummary => "alert alert-danger",
			StyleRole::WarningAlert => "alert alert-warning",
			StyleRole::SubmitButton => "btn btn-primary",
			StyleRole::AddButton => "btn btn-outline-primary btn-sm",
			StyleRole::RemoveButton => "btn btn-outline-danger btn-sm",
			StyleRole::CollectionItem => "card mb-2",
			StyleRole::CollectionItemHeader => {
				"card-header d-flex justify-content-between align-items-center"
			}
		}
	}
}

/// Material Design 3 classes
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialTheme;

impl Theme for MaterialTheme {
	fn name(&self) -> &'static str {
		"material"
	}

	fn class(&self, role: StyleRole) -> &'static str {
		match role {
			StyleRole::Form => "md-form",
			StyleRole::FieldWrapper => "md-field",
			StyleRole::Label => "md-field__label",
			StyleRole::RequiredMarker => "md-field__required",
			StyleRole::Input | StyleRole::FileInput | StyleRole::ColorInput => "md-field__input",
			StyleRole::Textarea => "md-field__input md-field__input--multiline",
			StyleRole::Select => "md-field__input md-select",
			StyleRole::RangeInput => "md-slider",
			StyleRole::CheckWrapper => "md-checkbox",
			StyleRole::SwitchWrapper => "md-switch",
			StyleRole::RadioWrapper => "md-radio",
			StyleRole::CheckInput => "md-checkbox__input",
			StyleRole::CheckLabel => "md-checkbox__label",
			StyleRole::HelpText => "md-field__supporting-text",
			StyleRole::ErrorText => "md-field__error-text",
			StyleRole::InvalidInput => "md-field__input--error",
			StyleRole::Row => "md-layout-row",
			StyleRole::Column => "md-layout-column",
			StyleRole::TabContainer => "md-tabs",
			StyleRole::TabList => "md-tabs__bar",
			StyleRole::TabButton => "md-tab",
			StyleRole::TabButtonActive => "md-tab--active",
			StyleRole::TabPanel => "md-tabs__panel",
			StyleRole::Card | StyleRole::CollectionItem => "md-card",
			StyleRole::CardHeader | StyleRole::CollectionItemHeader => "md-card__header",
			StyleRole::CardBody => "md-card__content",
			StyleRole::ErrorSummary => "md-banner md-banner--error",
			StyleRole::WarningAlert => "md-banner md-banner--warning",
			StyleRole::SubmitButton => "md-button md-button--filled",
			StyleRole::AddButton => "md-button md-button--tonal",
			StyleRole::RemoveButton => "md-button md-button--text md-button--danger",
		}
	}
}

/// Tailwind CSS utility classes
#[derive(Debug, Clone, Copy, Default)]
pub struct TailwindTheme;

impl Theme for TailwindTheme {
	fn name(&self) -> &'static str {
		"tailwind"
	}

	fn class(&self, role: StyleRole) -> &'static str {
		match role {
			StyleRole::Form => "space-y-6",
			StyleRole::FieldWrapper => "mb-4",
			StyleRole::Label => "block text-sm font-medium text-gray-700",
			StyleRole::RequiredMarker => "text-red-600",
			StyleRole::Input | StyleRole::Textarea | StyleRole::FileInput => {
				"block w-full rounded-md border-gray-300 shadow-sm focus:border-indigo-500 focus:ring-indigo-500 sm:text-sm"
			}
			StyleRole::Select => {
				"block w-full rounded-md border-gray-300 py-2 pl-3 pr-10 text-base focus:border-indigo-500 focus:outline-none focus:ring-indigo-500 sm:text-sm"
			}
			StyleRole::RangeInput => "w-full accent-indigo-600",
			StyleRole::ColorInput => "h-10 w-14 rounded border-gray-300",
			StyleRole::CheckWrapper | StyleRole::SwitchWrapper | StyleRole::RadioWrapper => {
				"flex items-center gap-2"
			}
			StyleRole::CheckInput => {
				"h-4 w-4 rounded border-gray-300 text-indigo-600 focus:ring-indigo-500"
			}
			StyleRole::CheckLabel => "text-sm text-gray-700",
			StyleRole::HelpText => "mt-1 text-sm text-gray-500",
			StyleRole::ErrorText => "mt-1 text-sm text-red-600",
			StyleRole::InvalidInput => "border-red-500",
			StyleRole::Row => "grid grid-cols-1 gap-4 md:grid-cols-2",
			StyleRole::Column => "",
			StyleRole::TabContainer => "formsmith-tabs",
			StyleRole::TabList => "flex border-b border-gray-200 mb-4",
			StyleRole::TabButton => "px-4 py-2 text-sm font-medium text-gray-600",
			StyleRole::TabButtonActive => "border-b-2 border-indigo-500 text-indigo-600",
			StyleRole::TabPanel => "",
			StyleRole::Card | StyleRole::CollectionItem => {
				"rounded-lg border border-gray-200 mb-4"
			}
			StyleRole::CardHeader | StyleRole::CollectionItemHeader => {
				"flex items-center justify-between border-b border-gray-200 px-4 py-2 font-semibold"
			}
			StyleRole::CardBody => "p-4",
			StyleRole::ErrorSummary => "rounded-md bg-red-50 p-4 text-red-800",
			StyleRole::WarningAlert => "rounded-md bg-yellow-50 p-4 text-yellow-800",
			StyleRole::SubmitButton => {
				"rounded-md bg-indigo-600 px-4 py-2 text-white hover:bg-indigo-500"
			}
			StyleRole::AddButton => "rounded-md border border-indigo-600 px-3 py-1 text-indigo-600",
			StyleRole::RemoveButton => "rounded-md border border-red-600 px-3 py-1 text-red-600",
		}
	}
}

/// No framework classes at all
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTheme;

impl Theme for PlainTheme {
	fn name(&self) -> &'static str {
		"plain"
	}

	fn class(&self, _role: StyleRole) -> &'static str {
		""
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("bootstrap", "bootstrap")]
	#[case("Bootstrap5", "bootstrap")]
	#[case("material", "material")]
	#[case("tailwindcss", "tailwind")]
	#[case("none", "plain")]
	#[case("unheard-of", "bootstrap")]
	fn test_theme_for(#[case] id: &str, #[case] expected: &str) {
		assert_eq!(theme_for(id).name(), expected);
	}

	#[rstest]
	fn test_framework_parse_error() {
		let err = "bulma".parse::<CssFramework>().unwrap_err();
		assert_eq!(err, UnknownFramework("bulma".to_string()));
	}

	#[rstest]
	fn test_bootstrap_classes() {
		let theme = Bootstrap5Theme;
		assert_eq!(theme.class(StyleRole::Input), "form-control");
		assert_eq!(theme.class(StyleRole::Select), "form-select");
		assert_eq!(theme.class(StyleRole::CheckInput), "form-check-input");
		assert_eq!(theme.class(StyleRole::InvalidInput), "is-invalid");
	}

	#[rstest]
	fn test_plain_theme_is_classless() {
		assert!(PlainTheme.class(StyleRole::Card).is_empty());
		assert!(PlainTheme.class(StyleRole::ErrorSummary).is_empty());
	}
}
