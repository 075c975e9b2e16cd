//! TypeScript declaration parser and type checker built on tree-sitter.
//!
//! This crate turns one TypeScript source buffer into structured
//! declarations and answers the type questions model extraction needs:
//!
//! - Collects top-level interfaces, type aliases, classes and enums, whether
//!   written bare, `export`ed or `declare`d
//! - Merges repeated declarations of the same name
//! - Copies members of local supertypes into interfaces and classes
//! - Expands local aliases and resolves indexed access types
//! - Re-parses incrementally when the buffer changes
//!
//! # Overview
//!
//! The main entry point is [`Parser`]. Its [`Checker`] resolves names
//! against the declarations of the same buffer; everything else is opaque.
//!
//! ```
//! use tg_ts_parser::Parser;
//!
//! let parser = Parser::new(r#"
//!     interface User { name: string; posts: Post[] }
//!     type Post = { title: string };
//!     type Title = Post["title"];
//! "#)?;
//!
//! let user = &parser.interfaces()[0];
//! assert_eq!(user.name, "User");
//! assert_eq!(user.members.len(), 2);
//!
//! let title = parser.declarations().type_alias("Title").expect("declared");
//! assert_eq!(title.ty.checker_text(), "string");
//! # Ok::<(), tg_ts_parser::ParseError>(())
//! ```
//!
//! # Malformed Source
//!
//! Parsing never fails on bad TypeScript. A declaration whose name cannot be
//! read is dropped, a member containing a syntax error is skipped, and types
//! the checker does not model keep their source text as
//! [`TypeKind::Unsupported`].
//!
//! # Thread Safety
//!
//! [`Parser`] is `Send` but not `Sync`. The compiled declaration query is
//! shared by every parser in the process.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod checker;
pub mod declarations;
pub mod error;
mod lower;
mod parser;
pub mod queries;
pub mod types;

pub use checker::{Checker, DeclarationKind, strip_module_qualifier};
pub use declarations::{
    Declarations, MemberKind, MemberOrigin, ParsedClass, ParsedEnum, ParsedInterface,
    ParsedMember, ParsedTypeAlias,
};
pub use error::ParseError;
pub use parser::{DEFAULT_ALIAS_DEPTH_LIMIT, Parser, compute_edit};
pub use types::{GenericParam, ObjectType, Parameter, Signature, TypeKind, TypeNode};

// Re-export tree-sitter types that appear in our public API
pub use tree_sitter::{InputEdit, Point, Tree};
