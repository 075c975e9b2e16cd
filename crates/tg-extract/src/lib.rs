//! Model extraction for TypeScript declarations.
//!
//! A [`ModelParser`] turns the interfaces, type aliases and classes of one
//! source buffer into [`Model`](tg_core::Model)s: a flat schema per
//! declaration, every field classified by shape, and symmetric
//! `dependencies`/`dependants` links between the models.
//!
//! ```
//! use tg_extract::ModelParser;
//!
//! let parser = ModelParser::new(r"
//!     interface User { name: string; posts: Post[] }
//!     interface Post { author: User }
//! ")?;
//! let models = parser.get_models();
//!
//! assert_eq!(models[0].dependencies, ["Post"]);
//! assert_eq!(models[0].dependants, ["Post"]);
//! # Ok::<(), tg_ts_parser::ParseError>(())
//! ```
//!
//! [`Graph`] lays the models out as nodes and edges for a renderer, and
//! [`ModelDiff`] summarizes what changed between two extractions.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod diff;
pub mod graph;
mod model_parser;
pub mod samples;

pub use diff::ModelDiff;
pub use graph::{EdgeDecoration, EdgeKind, Graph, GraphEdge, GraphNode, HoverState, field_handle};
pub use model_parser::ModelParser;
pub use samples::Sample;
