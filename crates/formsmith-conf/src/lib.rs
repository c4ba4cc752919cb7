//! Configuration for formsmith
//!
//! [`RenderSettings`] holds the tunable knobs of the form renderer: the styling
//! framework, the default layout, the long-text threshold, collection defaults,
//! the nesting depth cutoff and the keyword rules that group fields into tabs.

pub mod settings;

pub use settings::{ConfError, RenderSettings, TabGroupRule};
