//! Form rendering entry points
//!
//! [`FormRenderer`] holds the long-lived collaborators (theme, widget registry,
//! settings). Everything that belongs to one call (data, errors, options)
//! is passed in and lives in a [`FormContext`] for the duration of that call.

use crate::collection::{COLLECTION_MARKER, COLLECTION_SCRIPT};
use crate::context::{FormContext, LayoutMode};
use crate::error::{RenderError, RenderResult};
use crate::errors::{ErrorMap, ErrorSummary};
use crate::field::{class_attr, render_or_empty};
use crate::layout::{TAB_SCRIPT, TABS_MARKER, render_fields};
use crate::path::nest_flat_keys;
use crate::schema::{FormSchema, SchemaMetadata, build_schema_metadata, validate_schema_tree};
use formsmith_conf::RenderSettings;
use formsmith_widgets::{
	Attrs, Markup, Slots, StyleRole, Template, Theme, WidgetRegistry, theme_for,
};
use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

pub const START_MARKER: &str = "<!-- Start formsmith -->";
pub const END_MARKER: &str = "<!-- End formsmith -->";

/// Name of the hidden CSRF input
pub const CSRF_FIELD_NAME: &str = "csrfmiddlewaretoken";

static FORM: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(concat!(
		r#"<form method="{method}" action="{action}"{attrs} novalidate data-formsmith-form>"#,
		"{csrf}{summary}{body}{submit}",
		"</form>",
	))
});

static CSRF: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(r#"<input type="hidden" name="{name}" value="{token}" />"#)
});

static SUBMIT: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(r#"<div class="formsmith-actions"><button type="submit"{class}>{label}</button></div>"#)
});

static DEBUG_PANEL: LazyLock<Template> = LazyLock::new(|| {
	Template::parse(concat!(
		r#"<div class="formsmith-debug-panel"><details>"#,
		"<summary>Debug panel (development only, rendered in {elapsed} ms)</summary>",
		"<h6>Rendered HTML</h6><pre>{html}</pre>",
		"<h6>Fields</h6><pre>{fields}</pre>",
		"<h6>Payload</h6><pre>{payload}</pre>",
		"</details></div>",
	))
});

/// Per-call options of [`FormRenderer::render_form`]
///
/// # Examples
///
/// ```
/// use formsmith_forms::{LayoutMode, RenderOptions};
///
/// let options = RenderOptions::new("/signup")
///     .layout(LayoutMode::SideBySide)
///     .csrf_token("t0ken")
///     .submit_label("Create account")
///     .form_attr("id", "signup-form");
/// assert_eq!(options.submit_url, "/signup");
/// assert_eq!(options.method, "post");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct RenderOptions {
	pub submit_url: String,
	pub method: String,
	/// Overrides `RenderSettings::layout`
	pub layout: Option<LayoutMode>,
	pub include_submit_button: bool,
	pub submit_label: String,
	pub csrf_token: Option<String>,
	/// Extra `<form>` attributes; `action` and `method` are ignored
	pub form_attrs: Vec<(String, String)>,
	pub preserve_passwords: bool,
	/// Overrides `RenderSettings::include_markers`
	pub include_markers: Option<bool>,
	pub debug: bool,
}

impl RenderOptions {
	pub fn new(submit_url: impl Into<String>) -> Self {
		Self {
			submit_url: submit_url.into(),
			method: "post".to_string(),
			layout: None,
			include_submit_button: true,
			submit_label: "Submit".to_string(),
			csrf_token: None,
			form_attrs: Vec::new(),
			preserve_passwords: false,
			include_markers: None,
			debug: false,
		}
	}

	pub fn method(mut self, method: impl Into<String>) -> Self {
		self.method = method.into();
		self
	}

	pub fn layout(mut self, layout: LayoutMode) -> Self {
		self.layout = Some(layout);
		self
	}

	pub fn submit_button(mut self, include: bool) -> Self {
		self.include_submit_button = include;
		self
	}

	pub fn submit_label(mut self, label: impl Into<String>) -> Self {
		self.submit_label = label.into();
		self
	}

	pub fn csrf_token(mut self, token: impl Into<String>) -> Self {
		self.csrf_token = Some(token.into());
		self
	}

	pub fn form_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.form_attrs.push((key.into(), value.into()));
		self
	}

	/// Re-emit submitted password values, e.g. when re-rendering after failed validation
	pub fn preserve_passwords(mut self, preserve: bool) -> Self {
		self.preserve_passwords = preserve;
		self
	}

	pub fn markers(mut self, include: bool) -> Self {
		self.include_markers = Some(include);
		self
	}

	pub fn debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}
}

/// Renders schemas into HTML forms.
///
/// # Examples
///
/// ```
/// use formsmith_forms::{ErrorMap, FormRenderer, FormSchema, RenderOptions};
/// use serde_json::{Map, json};
///
/// let schema = FormSchema::new()
///     .required_field("username", json!({"type": "string", "minLength": 3}));
/// let mut errors = ErrorMap::new();
/// errors.insert("username", "Too short");
///
/// let html = FormRenderer::default()
///     .render_form(&schema, &Map::new(), &errors, &RenderOptions::new("/signup"))
///     .unwrap();
/// assert!(html.starts_with("<!-- Start formsmith -->"));
/// assert!(html.contains(r#"action="/signup""#));
/// assert!(html.contains("<strong>Username:</strong> Too short"));
/// ```
#[derive(Clone)]
pub struct FormRenderer {
	theme: Arc<dyn Theme>,
	registry: Arc<WidgetRegistry>,
	settings: Arc<RenderSettings>,
}

impl FormRenderer {
	/// Renderer for validated settings, themed after `settings.framework`.
	pub fn new(settings: RenderSettings) -> RenderResult<Self> {
		settings.validate()?;
		Ok(Self::from_valid_settings(settings))
	}

	fn from_valid_settings(settings: RenderSettings) -> Self {
		Self {
			theme: theme_for(&settings.framework),
			registry: Arc::new(WidgetRegistry::with_builtins()),
			settings: Arc::new(settings),
		}
	}

	pub fn with_theme(mut self, theme: Arc<dyn Theme>) -> Self {
		self.theme = theme;
		self
	}

	pub fn with_registry(mut self, registry: WidgetRegistry) -> Self {
		self.registry = Arc::new(registry);
		self
	}

	pub fn theme(&self) -> &dyn Theme {
		self.theme.as_ref()
	}

	pub fn registry(&self) -> &WidgetRegistry {
		&self.registry
	}

	pub fn settings(&self) -> &RenderSettings {
		&self.settings
	}

	/// Layout used when the options do not pick one
	pub fn default_layout(&self) -> LayoutMode {
		self.settings.layout.parse().unwrap_or_else(|err| {
			tracing::warn!("{}, using vertical layout", err);
			LayoutMode::Vertical
		})
	}

	fn context<'a>(
		&'a self,
		data: &'a Map<String, Value>,
		errors: &ErrorMap,
		preserve_passwords: bool,
	) -> FormContext<'a> {
		FormContext::new(
			data,
			errors.clone(),
			self.theme.as_ref(),
			&self.registry,
			&self.settings,
		)
		.with_preserved_passwords(preserve_passwords)
	}

	fn compile(&self, schema: &FormSchema) -> RenderResult<SchemaMetadata> {
		validate_schema_tree(schema, &self.settings)?;
		build_schema_metadata(schema, &self.settings)
	}

	/// Render a complete `<form>`.
	///
	/// `data` may be nested or use flat `name[i].leaf` keys. Fails only on
	/// caller mistakes: an empty submit URL or contradictory collection bounds.
	#[tracing::instrument(skip_all, fields(action = %options.submit_url))]
	pub fn render_form(
		&self,
		schema: &FormSchema,
		data: &Map<String, Value>,
		errors: &ErrorMap,
		options: &RenderOptions,
	) -> RenderResult<String> {
		let started = Instant::now();
		if options.submit_url.trim().is_empty() {
			return Err(RenderError::MissingSubmitUrl);
		}
		let meta = self.compile(schema)?;
		let layout = options.layout.unwrap_or_else(|| self.default_layout());

		let data = nest_flat_keys(data);
		let ctx = self.context(&data, errors, options.preserve_passwords);
		let body = render_fields(&meta, &ctx, layout);
		let summary = ErrorSummary::from_errors(errors).render(ctx.theme);

		let mut out = self.form_chrome(options, summary, body).into_string();
		out.push_str(&scripts_for(&out));

		if options.debug {
			let elapsed = started.elapsed().as_secs_f64() * 1000.0;
			out.push_str(debug_panel(&out, &meta, &data, errors, elapsed).as_str());
		}

		let include_markers = options.include_markers.unwrap_or(self.settings.include_markers);
		let out = wrap_with_markers(&out, include_markers);

		tracing::debug!(
			fields = meta.fields.len(),
			layout = %layout,
			elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
			"Form rendered"
		);
		Ok(out)
	}

	/// Render only the fields, without `<form>`, summary or submit button.
	#[tracing::instrument(skip_all, fields(layout = %layout))]
	pub fn render_fields_only(
		&self,
		schema: &FormSchema,
		data: &Map<String, Value>,
		errors: &ErrorMap,
		layout: LayoutMode,
	) -> RenderResult<String> {
		let meta = self.compile(schema)?;
		let data = nest_flat_keys(data);
		let ctx = self.context(&data, errors, false);

		let mut out = render_fields(&meta, &ctx, layout).into_string();
		out.push_str(&scripts_for(&out));
		Ok(out)
	}

	/// [`render_form`](Self::render_form) on a blocking worker thread.
	///
	/// Dropping the returned future does not stop the worker.
	#[cfg(feature = "async")]
	pub async fn render_form_async(
		&self,
		schema: FormSchema,
		data: Map<String, Value>,
		errors: ErrorMap,
		options: RenderOptions,
	) -> RenderResult<String> {
		let renderer = self.clone();
		tokio::task::spawn_blocking(move || renderer.render_form(&schema, &data, &errors, &options))
			.await?
	}

	fn form_chrome(&self, options: &RenderOptions, summary: Markup, body: Markup) -> Markup {
		let theme = self.theme.as_ref();

		let mut attrs = Attrs::new().class(theme.class(StyleRole::Form));
		for (key, value) in &options.form_attrs {
			if key.eq_ignore_ascii_case("action") || key.eq_ignore_ascii_case("method") {
				tracing::warn!("Ignoring form attribute '{}': set it through RenderOptions", key);
				continue;
			}
			attrs.set(key.as_str(), value.as_str());
		}

		let csrf = options
			.csrf_token
			.as_deref()
			.map(|token| {
				render_or_empty(
					&CSRF,
					Slots::new().text("name", CSRF_FIELD_NAME).text("token", token),
				)
			})
			.unwrap_or_default();
		let submit = if options.include_submit_button {
			render_or_empty(
				&SUBMIT,
				Slots::new()
					.markup("class", class_attr(theme, StyleRole::SubmitButton))
					.text("label", options.submit_label.as_str()),
			)
		} else {
			Markup::empty()
		};

		render_or_empty(
			&FORM,
			Slots::new()
				.text("method", options.method.to_lowercase())
				.text("action", options.submit_url.as_str())
				.markup("attrs", attrs.render())
				.markup("csrf", csrf)
				.markup("summary", summary)
				.markup("body", body)
				.markup("submit", submit),
		)
	}
}

impl Default for FormRenderer {
	fn default() -> Self {
		Self::from_valid_settings(RenderSettings::default())
	}
}

impl fmt::Debug for FormRenderer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FormRenderer")
			.field("theme", &self.theme.name())
			.field("registry", &self.registry)
			.field("settings", &self.settings)
			.finish()
	}
}

/// Client scripts needed by the rendered markup, each at most once
fn scripts_for(html: &str) -> String {
	let mut scripts = String::new();
	if html.contains(TABS_MARKER) {
		scripts.push_str(TAB_SCRIPT);
	}
	if html.contains(COLLECTION_MARKER) {
		scripts.push_str(COLLECTION_SCRIPT);
	}
	scripts
}

fn debug_panel(
	html: &str,
	meta: &SchemaMetadata,
	data: &Map<String, Value>,
	errors: &ErrorMap,
	elapsed_ms: f64,
) -> Markup {
	let fields: Vec<String> = meta
		.fields
		.iter()
		.map(|field| {
			let mut line = format!("{}: {} ({:?})", field.name, field.element, field.field_type);
			if field.required || meta.required.contains(&field.name) {
				line.push_str(", required");
			}
			let c = &field.constraints;
			for (key, value) in [
				("minLength", c.min_length.map(|v| v.to_string())),
				("maxLength", c.max_length.map(|v| v.to_string())),
				("minimum", c.minimum.map(|v| v.to_string())),
				("maximum", c.maximum.map(|v| v.to_string())),
				("pattern", c.pattern.clone()),
				("minItems", c.min_items.map(|v| v.to_string())),
				("maxItems", c.max_items.map(|v| v.to_string())),
			] {
				if let Some(value) = value {
					line.push_str(&format!(", {}={}", key, value));
				}
			}
			line
		})
		.collect();

	let payload = serde_json::to_string_pretty(&json!({"data": data, "errors": errors}))
		.unwrap_or_else(|err| {
			tracing::warn!("Failed to serialize debug payload: {}", err);
			String::new()
		});

	render_or_empty(
		&DEBUG_PANEL,
		Slots::new()
			.text("elapsed", format!("{:.2}", elapsed_ms))
			.text("html", html)
			.text("fields", fields.join("\n"))
			.text("payload", payload),
	)
}

/// Put the start marker on the first line and the end marker on the last.
/// Existing markers are not duplicated.
///
/// # Examples
///
/// ```
/// use formsmith_forms::renderer::wrap_with_markers;
///
/// let once = wrap_with_markers("  <form></form>\n", true);
/// assert_eq!(once, "<!-- Start formsmith -->\n<form></form>\n<!-- End formsmith -->");
/// assert_eq!(wrap_with_markers(&once, true), once);
/// assert_eq!(wrap_with_markers("<p></p>", false), "<p></p>");
/// ```
pub fn wrap_with_markers(html: &str, enabled: bool) -> String {
	if !enabled {
		return html.to_string();
	}
	let mut inner = html.trim();
	if let Some(rest) = inner.strip_prefix(START_MARKER) {
		inner = rest.trim_start();
	}
	if let Some(rest) = inner.strip_suffix(END_MARKER) {
		inner = rest.trim_end();
	}
	if inner.is_empty() {
		format!("{}\n{}", START_MARKER, END_MARKER)
	} else {
		format!("{}\n{}\n{}", START_MARKER, inner, END_MARKER)
	}
}
