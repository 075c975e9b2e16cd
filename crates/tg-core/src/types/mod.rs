//! Domain types for the model graph.
//!
//! # Module Organization
//!
//! - [`location`] - Source positions of declarations
//! - [`model`] - Models, their kinds and generic parameters
//! - [`schema`] - Classified schema fields and type references
//!
//! All public types are re-exported at this module level and at the crate
//! root:
//!
//! ```
//! use tg_core::{Model, ModelKind, SchemaField, TypeRef};
//! use tg_core::types::{FieldShape, ModelRef};
//! ```

mod location;
mod model;
mod schema;

pub use location::{SourceLocation, SourceSpan};
pub use model::{Model, ModelKind, ModelRef, ModelType, TypeParameter, find_model};
pub use schema::{FieldShape, FunctionArgument, FunctionReturn, SchemaField, TypeRef};
