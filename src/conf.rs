//! Renderer configuration.
//!
//! # Examples
//!
//! ```
//! use formsmith::conf::RenderSettings;
//!
//! let settings = RenderSettings::from_toml_str("framework = \"tailwind\"").unwrap();
//! assert_eq!(settings.framework, "tailwind");
//! ```

pub use formsmith_conf::*;
