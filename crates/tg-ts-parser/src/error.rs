//! Error types for the tg-ts-parser crate.
//!
//! Malformed TypeScript never produces an error: broken declarations are
//! left out of the parsed lists. [`ParseError`] only covers faults in the
//! parsing environment itself.

use std::sync::Arc;

/// Errors that can occur while setting up the TypeScript parser.
///
/// # Examples
///
/// ```
/// use tg_ts_parser::ParseError;
///
/// fn describe(err: &ParseError) -> String {
///     match err {
///         ParseError::LanguageInit => "grammar/runtime version mismatch".to_owned(),
///         ParseError::QueryCompile { offset, .. } => format!("bad query at {offset}"),
///     }
/// }
///
/// assert_eq!(describe(&ParseError::LanguageInit), "grammar/runtime version mismatch");
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    /// Failed to set the TypeScript language on the parser.
    #[error("failed to set TypeScript language")]
    LanguageInit,

    /// Failed to compile a tree-sitter query.
    #[error("failed to compile query at offset {offset}: {kind}")]
    QueryCompile {
        /// The byte offset in the query string where the error occurred.
        offset: usize,
        /// The underlying query error.
        kind: Arc<tree_sitter::QueryError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_init_display() {
        let err = ParseError::LanguageInit;
        assert_eq!(err.to_string(), "failed to set TypeScript language");
    }

    #[test]
    fn test_query_compile_display() {
        let language: tree_sitter::Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        let source_error = tree_sitter::Query::new(&language, "(not_a_node) @x").unwrap_err();
        let err = ParseError::QueryCompile {
            offset: source_error.offset,
            kind: Arc::new(source_error),
        };
        assert!(err.to_string().starts_with("failed to compile query at offset 1"));
    }
}
