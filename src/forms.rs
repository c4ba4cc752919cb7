//! Schema-driven forms.
//!
//! # Examples
//!
//! ```
//! use formsmith::forms::path::tokenize;
//! use formsmith::forms::PathToken;
//!
//! assert_eq!(
//!     tokenize("pets[0].name"),
//!     vec![PathToken::Name("pets".into()), PathToken::Index(0), PathToken::Name("name".into())]
//! );
//! ```

pub use formsmith_forms::*;
