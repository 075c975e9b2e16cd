//! Source-buffer parser producing the top-level declarations.
//!
//! This module provides the [`Parser`] struct, which owns one TypeScript
//! source buffer, its tree-sitter syntax tree and the declarations found in
//! it. Replacing the buffer re-parses incrementally against the previous
//! tree.

use streaming_iterator::StreamingIterator;
use tree_sitter::{InputEdit, Language, Node, Point, Query, QueryCursor, Tree};

use crate::checker::Checker;
use crate::declarations::{
    Declarations, ParsedClass, ParsedEnum, ParsedInterface, ParsedTypeAlias,
};
use crate::error::ParseError;
use crate::lower::Lowerer;
use crate::queries::{
    CAPTURE_DECL_CLASS, CAPTURE_DECL_ENUM, CAPTURE_DECL_INTERFACE, CAPTURE_DECL_TYPE_ALIAS,
    declaration_query,
};

/// Alias expansion depth used by [`Parser::new`].
pub const DEFAULT_ALIAS_DEPTH_LIMIT: usize = 32;

/// Parser for a single TypeScript source buffer.
///
/// Holds the buffer, its syntax tree and the declarations lowered from it.
/// Malformed source never fails: declarations whose name cannot be read are
/// left out, and members containing syntax errors are skipped.
///
/// # Examples
///
/// ```
/// use tg_ts_parser::Parser;
///
/// let mut parser = Parser::new("interface User { name: string }")?;
/// assert_eq!(parser.interfaces().len(), 1);
///
/// parser.set_source("interface User { name: string } type Id = string;");
/// assert_eq!(parser.type_aliases().len(), 1);
/// # Ok::<(), tg_ts_parser::ParseError>(())
/// ```
pub struct Parser {
    /// The underlying tree-sitter parser.
    parser: tree_sitter::Parser,
    /// Compiled declaration query, shared by every parser.
    query: &'static Query,
    /// The current source buffer.
    source: String,
    /// Syntax tree of `source`; `None` only if tree-sitter gave up.
    tree: Option<Tree>,
    /// Declarations lowered from `tree`.
    declarations: Declarations,
    /// Maximum number of alias hops when expanding types.
    alias_depth_limit: usize,
}

impl Parser {
    /// Creates a parser over `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::LanguageInit`] if the TypeScript grammar cannot
    /// be loaded, or [`ParseError::QueryCompile`] if the declaration query
    /// fails to compile.
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Self::with_alias_depth_limit(source, DEFAULT_ALIAS_DEPTH_LIMIT)
    }

    /// Creates a parser over `source` that expands at most
    /// `alias_depth_limit` alias hops per type.
    ///
    /// # Errors
    ///
    /// See [`Parser::new`].
    pub fn with_alias_depth_limit(source: &str, alias_depth_limit: usize) -> Result<Self, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        let language: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        parser
            .set_language(&language)
            .map_err(|_| ParseError::LanguageInit)?;

        let mut this = Self {
            parser,
            query: declaration_query()?,
            source: String::new(),
            tree: None,
            declarations: Declarations::default(),
            alias_depth_limit: alias_depth_limit.max(1),
        };
        this.set_source(source);
        Ok(this)
    }

    /// Replaces the source buffer and re-parses it.
    ///
    /// The previous syntax tree is edited with the changed byte range and
    /// reused, so unchanged regions are not parsed again.
    pub fn set_source(&mut self, source: &str) {
        let old_tree = match self.tree.take() {
            Some(mut tree) => match compute_edit(&self.source, source) {
                Some(edit) => {
                    tree.edit(&edit);
                    Some(tree)
                }
                None if self.source == source => Some(tree),
                None => None,
            },
            None => None,
        };

        self.source.clear();
        self.source.push_str(source);
        self.tree = self.parser.parse(&self.source, old_tree.as_ref());
        if self.tree.is_none() {
            tracing::warn!(len = source.len(), "tree-sitter returned no tree");
        }

        self.declarations = collect_declarations(
            &self.source,
            self.tree.as_ref(),
            self.query,
            self.alias_depth_limit,
        );
        tracing::debug!(
            interfaces = self.declarations.interfaces().len(),
            type_aliases = self.declarations.type_aliases().len(),
            classes = self.declarations.classes().len(),
            enums = self.declarations.enums().len(),
            "parsed source"
        );
    }

    /// The current source buffer.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The current syntax tree.
    #[inline]
    #[must_use]
    pub const fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    /// Returns `true` if the syntax tree contains errors or missing nodes.
    #[must_use]
    pub fn has_syntax_errors(&self) -> bool {
        self.tree.as_ref().is_some_and(|tree| tree.root_node().has_error())
    }

    /// Top-level interfaces, one per name, in source order.
    #[inline]
    #[must_use]
    pub fn interfaces(&self) -> &[ParsedInterface] {
        self.declarations.interfaces()
    }

    /// Top-level type aliases, one per name, in source order.
    #[inline]
    #[must_use]
    pub fn type_aliases(&self) -> &[ParsedTypeAlias] {
        self.declarations.type_aliases()
    }

    /// Top-level classes, one per name, in source order.
    #[inline]
    #[must_use]
    pub fn classes(&self) -> &[ParsedClass] {
        self.declarations.classes()
    }

    /// Top-level enums, one per name, in source order.
    #[inline]
    #[must_use]
    pub fn enums(&self) -> &[ParsedEnum] {
        self.declarations.enums()
    }

    /// All declarations of the current buffer.
    #[inline]
    #[must_use]
    pub const fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    /// A checker over the current declarations.
    #[must_use]
    pub const fn checker(&self) -> Checker<'_> {
        Checker::new(&self.declarations, self.alias_depth_limit)
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("source_len", &self.source.len())
            .field("declarations", &self.declarations)
            .field("alias_depth_limit", &self.alias_depth_limit)
            .finish_non_exhaustive()
    }
}

/// Runs the declaration query and lowers every match in source order.
fn collect_declarations(
    source: &str,
    tree: Option<&Tree>,
    query: &Query,
    alias_depth_limit: usize,
) -> Declarations {
    let mut declarations = Declarations::default();
    let Some(tree) = tree else {
        return declarations;
    };

    let mut captured: Vec<(u32, Node<'_>)> = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source.as_bytes());
    while let Some(m) = matches.next() {
        captured.extend(m.captures.iter().map(|c| (c.index, c.node)));
    }
    captured.sort_by_key(|(_, node)| node.start_byte());
    captured.dedup_by_key(|(_, node)| node.id());

    let lowerer = Lowerer::new(source);
    for (index, node) in captured {
        match index {
            CAPTURE_DECL_INTERFACE => match lowerer.interface(node) {
                Some(interface) => declarations.add_interface(interface),
                None => skipped(node),
            },
            CAPTURE_DECL_TYPE_ALIAS => match lowerer.type_alias(node) {
                Some(alias) => declarations.add_type_alias(alias),
                None => skipped(node),
            },
            CAPTURE_DECL_CLASS => match lowerer.class(node) {
                Some(class) => declarations.add_class(class),
                None => skipped(node),
            },
            CAPTURE_DECL_ENUM => match lowerer.enumeration(node) {
                Some(enumeration) => declarations.add_enum(enumeration),
                None => skipped(node),
            },
            _ => {}
        }
    }

    declarations.resolve_inheritance();
    declarations.expand_aliases(alias_depth_limit);
    declarations
}

fn skipped(node: Node<'_>) {
    tracing::debug!(
        kind = node.kind(),
        line = node.start_position().row + 1,
        "skipping declaration without a usable name"
    );
}

/// Computes the single edit that turns `old` into `new`.
///
/// The edit spans from the first differing byte to the last differing byte,
/// both snapped to character boundaries. Returns `None` when the buffers are
/// equal.
#[must_use]
pub fn compute_edit(old: &str, new: &str) -> Option<InputEdit> {
    if old == new {
        return None;
    }
    let (old_bytes, new_bytes) = (old.as_bytes(), new.as_bytes());

    let mut prefix = old_bytes
        .iter()
        .zip(new_bytes)
        .take_while(|(a, b)| a == b)
        .count();
    while !old.is_char_boundary(prefix) || !new.is_char_boundary(prefix) {
        prefix -= 1;
    }

    let max_suffix = old.len().min(new.len()) - prefix;
    let mut suffix = old_bytes
        .iter()
        .rev()
        .zip(new_bytes.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();
    while !old.is_char_boundary(old.len() - suffix) || !new.is_char_boundary(new.len() - suffix) {
        suffix -= 1;
    }

    let old_end = old.len() - suffix;
    let new_end = new.len() - suffix;
    Some(InputEdit {
        start_byte: prefix,
        old_end_byte: old_end,
        new_end_byte: new_end,
        start_position: point_at(old, prefix),
        old_end_position: point_at(old, old_end),
        new_end_position: point_at(new, new_end),
    })
}

/// Row and byte column of `byte` in `text`.
fn point_at(text: &str, byte: usize) -> Point {
    let before = &text.as_bytes()[..byte];
    let row = before.iter().filter(|&&b| b == b'\n').count();
    let column = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(byte, |newline| byte - newline - 1);
    Point::new(row, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::MemberOrigin;

    fn parser(source: &str) -> Parser {
        Parser::new(source).expect("Parser creation failed")
    }

    fn names<'a>(items: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
        items.collect()
    }

    #[test]
    fn test_parser_new() {
        let parser = Parser::new("");
        assert!(parser.is_ok());
        let parser = parser.expect("Parser creation failed");
        assert!(parser.interfaces().is_empty());
        assert!(parser.type_aliases().is_empty());
        assert!(parser.classes().is_empty());
        assert!(!parser.has_syntax_errors());
    }

    #[test]
    fn test_collects_top_level_declarations_in_order() {
        let parser = parser(
            r"
export interface B { x: string }
type A = { y: number };
declare class C { z: boolean }
export declare interface D {}
export abstract class E {}
enum F { One }
interface G {}
",
        );
        assert_eq!(
            names(parser.interfaces().iter().map(|i| i.name.as_str())),
            ["B", "D", "G"]
        );
        assert_eq!(names(parser.type_aliases().iter().map(|a| a.name.as_str())), ["A"]);
        assert_eq!(names(parser.classes().iter().map(|c| c.name.as_str())), ["C", "E"]);
        assert!(parser.classes()[1].is_abstract);
        assert_eq!(names(parser.enums().iter().map(|e| e.name.as_str())), ["F"]);
    }

    #[test]
    fn test_nested_declarations_ignored() {
        let parser = parser(
            r"
namespace Inner { export interface Hidden { a: string } }
function f() { interface Local { b: string } }
interface Visible { c: string }
",
        );
        assert_eq!(
            names(parser.interfaces().iter().map(|i| i.name.as_str())),
            ["Visible"]
        );
    }

    #[test]
    fn test_interface_merging() {
        let parser = parser(
            r"
interface User { name: string }
interface Other {}
interface User { age: number; name: number }
",
        );
        assert_eq!(parser.interfaces().len(), 2);
        let user = &parser.interfaces()[0];
        let rendered: Vec<String> = user.members.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["name: string;", "age: number;"]);
        assert_eq!(user.members[1].origin, MemberOrigin::Merged);
    }

    #[test]
    fn test_inherited_members_resolved() {
        let parser = parser(
            r"
interface Named<T> { name: T }
interface User extends Named<string> { age: number }
",
        );
        let user = parser.declarations().interface("User").expect("User parsed");
        let rendered: Vec<String> = user.members.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["age: number;", "name: string;"]);
        assert_eq!(
            user.members[1].origin,
            MemberOrigin::Inherited {
                from: "Named".to_owned()
            }
        );
    }

    #[test]
    fn test_class_members_snapshot() {
        let parser = parser(
            r"
class Base<T> { value: T; protected touch(): void {} }
export class Account extends Base<number> implements Named {
    static count = 0;
    constructor(public readonly id: string, private owner?: User) { super(); }
    name = 'x';
    get balance(): number { return 0; }
    set balance(v: number) {}
    load(id: string): Promise<Account>;
    load(id: number): Promise<Account>;
    load(id: string | number) { return fetch(id); }
}
",
        );
        let account = parser.declarations().class("Account").expect("Account parsed");
        let rendered: Vec<String> = account.members.iter().map(ToString::to_string).collect();
        insta::assert_snapshot!(rendered.join("\n"), @r"
        readonly id: string;
        owner?: User;
        name: string;
        get balance(): number;
        load(id: string): Promise<Account>; load(id: number): Promise<Account>; load(id: string | number): any;
        value: number;
        touch(): void;
        ");
    }

    #[test]
    fn test_alias_types_expanded() {
        let parser = parser("type Id = string; type Key = Id; type Pair<T> = [T, T]; type P = Pair<Id>;");
        let key = parser.declarations().type_alias("Key").expect("Key parsed");
        assert_eq!(key.declared.checker_text(), "Id");
        assert_eq!(key.ty.checker_text(), "string");
        let pair = parser.declarations().type_alias("P").expect("P parsed");
        assert_eq!(pair.ty.checker_text(), "[Id, Id]");
    }

    #[test]
    fn test_syntax_errors_tolerated() {
        let parser = parser(
            r"
interface Good { a: string }
interface Broken { b: ; c: number }
interface Also { d: boolean }
",
        );
        assert!(parser.has_syntax_errors());
        let names: Vec<&str> = parser.interfaces().iter().map(|i| i.name.as_str()).collect();
        assert!(names.contains(&"Good"));
        assert!(names.contains(&"Also"));
    }

    #[test]
    fn test_set_source_matches_fresh_parse() {
        let first = "interface User { name: string }\n";
        let second = "interface User { name: string; age: number }\ntype Id = string;\n";

        let mut incremental = parser(first);
        incremental.set_source(second);
        let fresh = parser(second);

        assert_eq!(incremental.source(), second);
        assert_eq!(incremental.interfaces(), fresh.interfaces());
        assert_eq!(incremental.type_aliases(), fresh.type_aliases());
        assert_eq!(incremental.interfaces()[0].members.len(), 2);
    }

    #[test]
    fn test_set_source_to_empty_and_back() {
        let mut parser = parser("interface A {}");
        parser.set_source("");
        assert!(parser.interfaces().is_empty());
        parser.set_source("interface A {}");
        assert_eq!(parser.interfaces().len(), 1);
    }

    #[test]
    fn test_compute_edit_insertion() {
        let edit = compute_edit("ab\ncd", "ab\nxcd").expect("edit");
        assert_eq!(edit.start_byte, 3);
        assert_eq!(edit.old_end_byte, 3);
        assert_eq!(edit.new_end_byte, 4);
        assert_eq!(edit.start_position, Point::new(1, 0));
        assert_eq!(edit.new_end_position, Point::new(1, 1));
    }

    #[test]
    fn test_compute_edit_replacement_and_deletion() {
        let edit = compute_edit("let a = 1;", "let b = 1;").expect("edit");
        assert_eq!((edit.start_byte, edit.old_end_byte, edit.new_end_byte), (4, 5, 5));

        let edit = compute_edit("aaaa", "aa").expect("edit");
        assert_eq!((edit.start_byte, edit.old_end_byte, edit.new_end_byte), (2, 4, 2));

        assert!(compute_edit("same", "same").is_none());
    }

    #[test]
    fn test_compute_edit_char_boundaries() {
        // "é" and "è" share their first UTF-8 byte.
        let edit = compute_edit("aé", "aè").expect("edit");
        assert_eq!(edit.start_byte, 1);
        assert_eq!(edit.old_end_byte, 3);
        assert_eq!(edit.new_end_byte, 3);
    }
}
