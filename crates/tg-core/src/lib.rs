//! Core types, errors, and utilities for the ts-model-graph workspace.
//!
//! This crate provides the foundational types shared by the parser, the
//! model extractor and the command line tool:
//!
//! - [`Model`] and [`SchemaField`], the extracted dependency graph
//! - [`Config`] and its sections, loaded from JSON
//! - [`ConfigError`] for configuration failures
//! - `FxHashMap`/`FxHashSet` aliases used across the workspace
//!
//! # Example
//!
//! ```
//! use tg_core::{FieldShape, Model, ModelKind, SchemaField, TypeRef};
//!
//! let mut model = Model::new("User", ModelKind::interface());
//! model.schema.push(SchemaField::new("id", false, FieldShape::scalar(TypeRef::text("string"))));
//!
//! assert_eq!(model.id, "User");
//! assert!(model.dependencies.is_empty());
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
pub mod types;

pub use config::{Config, ExtractConfig, OutputConfig, WatchConfig};
pub use error::ConfigError;
pub use hash::{FxHashMap, FxHashSet};
pub use types::{
    FieldShape, FunctionArgument, FunctionReturn, Model, ModelKind, ModelRef, ModelType,
    SchemaField, SourceLocation, SourceSpan, TypeParameter, TypeRef, find_model,
};
