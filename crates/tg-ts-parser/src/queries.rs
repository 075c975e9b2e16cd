//! Pre-compiled tree-sitter query for top-level type declarations.
//!
//! [`DECLARATION_QUERY`] matches interfaces, type aliases, classes and enums
//! that are direct statements of the program, whether written bare,
//! `export`ed or `declare`d. Declarations nested in namespaces, functions or
//! blocks are not top-level and are not matched. [`declaration_query`]
//! compiles the query once per process.

use std::sync::{Arc, OnceLock};

use tree_sitter::{Language, Query};

use crate::error::ParseError;

/// Tree-sitter query for top-level declarations.
///
/// # Capture Names
///
/// - `decl.interface` - `interface_declaration`
/// - `decl.type_alias` - `type_alias_declaration`
/// - `decl.class` - `class_declaration` or `abstract_class_declaration`
/// - `decl.enum` - `enum_declaration`
pub const DECLARATION_QUERY: &str = r"
; Bare declarations: interface A {}
(program
  [(interface_declaration) @decl.interface
   (type_alias_declaration) @decl.type_alias
   (class_declaration) @decl.class
   (abstract_class_declaration) @decl.class
   (enum_declaration) @decl.enum])

; Exported declarations: export interface A {}
(program
  (export_statement
    declaration: [(interface_declaration) @decl.interface
                  (type_alias_declaration) @decl.type_alias
                  (class_declaration) @decl.class
                  (abstract_class_declaration) @decl.class
                  (enum_declaration) @decl.enum]))

; Ambient declarations: declare interface A {}
(program
  (ambient_declaration
    [(interface_declaration) @decl.interface
     (type_alias_declaration) @decl.type_alias
     (class_declaration) @decl.class
     (abstract_class_declaration) @decl.class
     (enum_declaration) @decl.enum]))

; Exported ambient declarations: export declare class A {}
(program
  (export_statement
    declaration: (ambient_declaration
      [(interface_declaration) @decl.interface
       (type_alias_declaration) @decl.type_alias
       (class_declaration) @decl.class
       (abstract_class_declaration) @decl.class
       (enum_declaration) @decl.enum])))
";

/// Capture index for `decl.interface`.
pub const CAPTURE_DECL_INTERFACE: u32 = 0;

/// Capture index for `decl.type_alias`.
pub const CAPTURE_DECL_TYPE_ALIAS: u32 = 1;

/// Capture index for `decl.class`.
pub const CAPTURE_DECL_CLASS: u32 = 2;

/// Capture index for `decl.enum`.
pub const CAPTURE_DECL_ENUM: u32 = 3;

/// Global cache for the compiled declaration query.
static COMPILED_QUERY: OnceLock<Query> = OnceLock::new();

/// Returns the compiled declaration query.
///
/// The query is compiled once and cached for all subsequent calls.
/// This function is thread-safe.
///
/// # Errors
///
/// Returns [`ParseError::QueryCompile`] if the query fails to compile.
pub fn declaration_query() -> Result<&'static Query, ParseError> {
    if let Some(query) = COMPILED_QUERY.get() {
        return Ok(query);
    }

    let language: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
    let query = compile_query(&language)?;

    Ok(COMPILED_QUERY.get_or_init(|| query))
}

/// Compiles the declaration query for the given language.
fn compile_query(language: &Language) -> Result<Query, ParseError> {
    Query::new(language, DECLARATION_QUERY).map_err(|e| ParseError::QueryCompile {
        offset: e.offset,
        kind: Arc::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_compiles() {
        let result = declaration_query();
        assert!(result.is_ok(), "Query should compile: {result:?}");
    }

    #[test]
    fn test_capture_indices_match_names() {
        let query = declaration_query().expect("Query should compile");

        assert_eq!(
            query.capture_index_for_name("decl.interface"),
            Some(CAPTURE_DECL_INTERFACE)
        );
        assert_eq!(
            query.capture_index_for_name("decl.type_alias"),
            Some(CAPTURE_DECL_TYPE_ALIAS)
        );
        assert_eq!(query.capture_index_for_name("decl.class"), Some(CAPTURE_DECL_CLASS));
        assert_eq!(query.capture_index_for_name("decl.enum"), Some(CAPTURE_DECL_ENUM));
    }

    #[test]
    fn test_query_pattern_count() {
        let query = declaration_query().expect("Query should compile");
        assert_eq!(query.pattern_count(), 4);
    }
}
