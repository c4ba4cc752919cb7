/// Widget layer errors
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
	#[error("Template slot '{0}' has no value")]
	UnknownSlot(String),

	#[error("Widget '{element}' failed: {source}")]
	Render {
		element: String,
		#[source]
		source: anyhow::Error,
	},
}

pub type WidgetResult<T> = Result<T, WidgetError>;
