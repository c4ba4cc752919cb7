//! Markup, themes and the widget registry.

pub use formsmith_widgets::*;
