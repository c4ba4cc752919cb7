use formsmith_conf::ConfError;

/// Errors that abort a render before any markup is produced
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
	#[error("submit_url is required and must not be empty")]
	MissingSubmitUrl,

	#[error("Invalid collection bounds for '{field}': min_items {min} exceeds max_items {max}")]
	InvalidCollectionBounds {
		field: String,
		min: usize,
		max: usize,
	},

	#[error("Invalid schema: {0}")]
	InvalidSchema(String),

	#[error("Configuration error: {0}")]
	Conf(#[from] ConfError),

	#[cfg(feature = "async")]
	#[error("Render worker failed: {0}")]
	Worker(#[from] tokio::task::JoinError),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Problems with one part of a schema; rendered inline in place of that part
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
	#[error("definition '{0}' was not found")]
	MissingDefinition(String),

	#[error("no sub-schema could be resolved for this field")]
	NoSubSchema,

	#[error("nesting depth {0} exceeds the configured maximum")]
	DepthExceeded(usize),

	#[error("{0}")]
	Invalid(String),
}

/// Rejected add/remove on a collection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
	#[error("'{field}' already has the maximum of {max} items")]
	MaxItemsReached { field: String, max: usize },

	#[error("'{field}' already has the minimum of {min} items")]
	MinItemsReached { field: String, min: usize },

	#[error("'{field}' has no item at index {index}")]
	IndexOutOfRange { field: String, index: usize },
}
