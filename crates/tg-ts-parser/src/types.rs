//! Structured type expressions lowered from the syntax tree.
//!
//! A [`TypeNode`] pairs a structural [`TypeKind`] with the text the author
//! wrote (whitespace-normalized). The structural form drives classification
//! and printing, while the declared text is what model extraction prefers
//! when naming a type. Nodes built by the checker (substitution, inference,
//! indexed-access resolution) carry no declared text.

use std::fmt;

use tg_core::FxHashMap;

use crate::declarations::ParsedMember;

/// A type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    kind: TypeKind,
    text: String,
}

/// Structural kinds of type expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Predefined keyword: `string`, `number`, `any`, `void`, `null`, ...
    Keyword(String),

    /// Literal type: `"a"`, `1`, `-1`, `true`, `false`.
    Literal(String),

    /// Named reference, possibly generic: `User`, `Map<K, V>`, `ns.Thing`.
    Reference {
        /// The referenced name as written, module qualification included.
        name: String,
        /// Type arguments; empty for a plain reference.
        arguments: Vec<TypeNode>,
    },

    /// `T[]` or `readonly T[]`; holds the element type.
    Array(Box<TypeNode>),

    /// `[A, B]`.
    Tuple(Vec<TypeNode>),

    /// `A | B`, flattened.
    Union(Vec<TypeNode>),

    /// `A & B`, flattened.
    Intersection(Vec<TypeNode>),

    /// `(a: A) => R`.
    Function(Box<Signature>),

    /// `{ a: A; (x: X): Y }`.
    Object(ObjectType),

    /// `Object["key"]`.
    IndexedAccess {
        /// The indexed type.
        object: Box<TypeNode>,
        /// The index type.
        index: Box<TypeNode>,
    },

    /// `this`.
    This,

    /// Any construct the checker does not model (conditional, mapped,
    /// `keyof`, `typeof`, template literal, ...). Only its text survives.
    Unsupported,
}

/// Members and call signatures of an object literal type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectType {
    /// Named members in declaration order, first occurrence per name.
    pub members: Vec<ParsedMember>,
    /// Call signatures (`(x: X): Y`).
    pub call_signatures: Vec<Signature>,
}

/// A generic type parameter with its optional constraint and default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericParam {
    /// Parameter name.
    pub name: String,
    /// `extends` constraint.
    pub constraint: Option<TypeNode>,
    /// `= Default` type.
    pub default: Option<TypeNode>,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name, or the pattern text for destructured parameters.
    pub name: String,
    /// Declared with `?` or with a default value.
    pub optional: bool,
    /// Declared as `...rest`.
    pub rest: bool,
    /// Declared type, if annotated.
    pub ty: Option<TypeNode>,
}

/// One call signature of a function type, method or accessor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    /// Signature-level generic parameters.
    pub type_parameters: Vec<GenericParam>,
    /// Parameters in order.
    pub parameters: Vec<Parameter>,
    /// Annotated or inferred return type. `None` means `any`.
    pub return_type: Option<TypeNode>,
    /// The signature has an implementation body.
    pub has_body: bool,
    /// The signature comes from the member's own (first) declaration.
    pub declared_by_member: bool,
}

impl TypeNode {
    /// Creates a node with the text the author wrote.
    pub fn new(kind: TypeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: normalize_whitespace(&text.into()),
        }
    }

    /// Creates a node that has no source text.
    #[must_use]
    pub const fn synthesized(kind: TypeKind) -> Self {
        Self {
            kind,
            text: String::new(),
        }
    }

    /// A synthesized keyword type such as `any` or `void`.
    #[must_use]
    pub fn keyword(keyword: &str) -> Self {
        Self::synthesized(TypeKind::Keyword(keyword.to_owned()))
    }

    /// A synthesized reference to `name` with the given arguments.
    #[must_use]
    pub fn reference(name: impl Into<String>, arguments: Vec<TypeNode>) -> Self {
        Self::synthesized(TypeKind::Reference {
            name: name.into(),
            arguments,
        })
    }

    /// The structural kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// The text as written in the source, if this node came from the source.
    #[inline]
    #[must_use]
    pub fn declared_text(&self) -> Option<&str> {
        (!self.text.is_empty()).then_some(self.text.as_str())
    }

    /// The normalized rendering, independent of how the author formatted it.
    #[must_use]
    pub fn checker_text(&self) -> String {
        self.to_string()
    }

    /// The referenced name for [`TypeKind::Reference`] nodes.
    #[must_use]
    pub fn reference_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Reference { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Type arguments of a reference; empty for every other kind.
    #[must_use]
    pub fn type_arguments(&self) -> &[TypeNode] {
        match &self.kind {
            TypeKind::Reference { arguments, .. } => arguments,
            _ => &[],
        }
    }

    /// Returns `true` for keyword and literal types.
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Keyword(_) | TypeKind::Literal(_))
    }

    /// Replaces references to type parameters by their arguments.
    ///
    /// Returns a clone when nothing was replaced. Replaced subtrees lose
    /// their declared text, since it no longer describes them.
    #[must_use]
    pub fn substitute(&self, map: &FxHashMap<String, TypeNode>) -> Self {
        if map.is_empty() {
            return self.clone();
        }
        self.substituted(map).unwrap_or_else(|| self.clone())
    }

    fn substituted(&self, map: &FxHashMap<String, TypeNode>) -> Option<Self> {
        let kind = match &self.kind {
            TypeKind::Reference { name, arguments } if arguments.is_empty() => {
                return map.get(name).cloned();
            }
            TypeKind::Reference { name, arguments } => TypeKind::Reference {
                name: name.clone(),
                arguments: substitute_all(arguments, map)?,
            },
            TypeKind::Array(element) => TypeKind::Array(Box::new(element.substituted(map)?)),
            TypeKind::Tuple(items) => TypeKind::Tuple(substitute_all(items, map)?),
            TypeKind::Union(items) => TypeKind::Union(substitute_all(items, map)?),
            TypeKind::Intersection(items) => TypeKind::Intersection(substitute_all(items, map)?),
            TypeKind::Function(signature) => {
                TypeKind::Function(Box::new(signature.substituted(map)?))
            }
            TypeKind::Object(object) => TypeKind::Object(object.substituted(map)?),
            TypeKind::IndexedAccess { object, index } => {
                let new_object = object.substituted(map);
                let new_index = index.substituted(map);
                if new_object.is_none() && new_index.is_none() {
                    return None;
                }
                TypeKind::IndexedAccess {
                    object: Box::new(new_object.unwrap_or_else(|| (**object).clone())),
                    index: Box::new(new_index.unwrap_or_else(|| (**index).clone())),
                }
            }
            TypeKind::Keyword(_) | TypeKind::Literal(_) | TypeKind::This | TypeKind::Unsupported => {
                return None;
            }
        };
        Some(Self::synthesized(kind))
    }
}

/// Substitutes every item, or returns `None` when no item changed.
fn substitute_all(items: &[TypeNode], map: &FxHashMap<String, TypeNode>) -> Option<Vec<TypeNode>> {
    let replaced: Vec<Option<TypeNode>> = items.iter().map(|item| item.substituted(map)).collect();
    if replaced.iter().all(Option::is_none) {
        return None;
    }
    Some(
        replaced
            .into_iter()
            .zip(items)
            .map(|(new, old)| new.unwrap_or_else(|| old.clone()))
            .collect(),
    )
}

impl ObjectType {
    fn substituted(&self, map: &FxHashMap<String, TypeNode>) -> Option<Self> {
        let members: Vec<Option<ParsedMember>> =
            self.members.iter().map(|m| m.substituted(map)).collect();
        let signatures: Vec<Option<Signature>> = self
            .call_signatures
            .iter()
            .map(|s| s.substituted(map))
            .collect();
        if members.iter().all(Option::is_none) && signatures.iter().all(Option::is_none) {
            return None;
        }
        Some(Self {
            members: members
                .into_iter()
                .zip(&self.members)
                .map(|(new, old)| new.unwrap_or_else(|| old.clone()))
                .collect(),
            call_signatures: signatures
                .into_iter()
                .zip(&self.call_signatures)
                .map(|(new, old)| new.unwrap_or_else(|| old.clone()))
                .collect(),
        })
    }

    /// Looks up a named member.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&ParsedMember> {
        self.members.iter().find(|member| member.name == name)
    }
}

impl Signature {
    /// Applies a substitution, honoring names shadowed by the signature's
    /// own type parameters. Returns `None` when nothing changed.
    pub(crate) fn substituted(&self, map: &FxHashMap<String, TypeNode>) -> Option<Self> {
        let shadowed;
        let map = if self
            .type_parameters
            .iter()
            .any(|param| map.contains_key(&param.name))
        {
            let mut narrowed = map.clone();
            for param in &self.type_parameters {
                narrowed.remove(&param.name);
            }
            shadowed = narrowed;
            &shadowed
        } else {
            map
        };

        let parameters: Vec<Option<TypeNode>> = self
            .parameters
            .iter()
            .map(|p| p.ty.as_ref().and_then(|ty| ty.substituted(map)))
            .collect();
        let return_type = self.return_type.as_ref().and_then(|ty| ty.substituted(map));
        if return_type.is_none() && parameters.iter().all(Option::is_none) {
            return None;
        }

        let mut signature = self.clone();
        for (param, new) in signature.parameters.iter_mut().zip(parameters) {
            if new.is_some() {
                param.ty = new;
            }
        }
        if return_type.is_some() {
            signature.return_type = return_type;
        }
        Some(signature)
    }

    /// Number of parameters.
    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::Keyword(keyword) => f.write_str(keyword),
            TypeKind::Literal(literal) => f.write_str(&normalize_literal(literal)),
            TypeKind::Reference { name, arguments } => {
                f.write_str(name)?;
                if !arguments.is_empty() {
                    f.write_str("<")?;
                    write_list(f, arguments, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeKind::Array(element) => {
                if needs_parens_in_array(element) {
                    write!(f, "({element})[]")
                } else {
                    write!(f, "{element}[]")
                }
            }
            TypeKind::Tuple(items) => {
                f.write_str("[")?;
                write_list(f, items, ", ")?;
                f.write_str("]")
            }
            TypeKind::Union(items) => write_operands(f, items, " | "),
            TypeKind::Intersection(items) => write_operands(f, items, " & "),
            TypeKind::Function(signature) => {
                write_parameters(f, signature)?;
                f.write_str(" => ")?;
                write_return(f, signature)
            }
            TypeKind::Object(object) => fmt::Display::fmt(object, f),
            TypeKind::IndexedAccess { object, index } => write!(f, "{object}[{index}]"),
            TypeKind::This => f.write_str("this"),
            TypeKind::Unsupported => f.write_str(&self.text),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.members.is_empty() && self.call_signatures.is_empty() {
            return f.write_str("{}");
        }
        f.write_str("{ ")?;
        for signature in &self.call_signatures {
            write_parameters(f, signature)?;
            f.write_str(": ")?;
            write_return(f, signature)?;
            f.write_str("; ")?;
        }
        for member in &self.members {
            write!(f, "{member} ")?;
        }
        f.write_str("}")
    }
}

fn needs_parens_in_array(element: &TypeNode) -> bool {
    matches!(
        element.kind,
        TypeKind::Union(_) | TypeKind::Intersection(_) | TypeKind::Function(_)
    )
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeNode], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_operands(f: &mut fmt::Formatter<'_>, items: &[TypeNode], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        if matches!(item.kind, TypeKind::Function(_)) {
            write!(f, "({item})")?;
        } else {
            write!(f, "{item}")?;
        }
    }
    Ok(())
}

pub(crate) fn write_parameters(f: &mut fmt::Formatter<'_>, signature: &Signature) -> fmt::Result {
    f.write_str("(")?;
    for (i, param) in signature.parameters.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        if param.rest {
            f.write_str("...")?;
        }
        f.write_str(&param.name)?;
        if param.optional {
            f.write_str("?")?;
        }
        match &param.ty {
            Some(ty) => write!(f, ": {ty}")?,
            None => f.write_str(": any")?,
        }
    }
    f.write_str(")")
}

pub(crate) fn write_return(f: &mut fmt::Formatter<'_>, signature: &Signature) -> fmt::Result {
    match &signature.return_type {
        Some(ty) => write!(f, "{ty}"),
        None => f.write_str("any"),
    }
}

/// Collapses whitespace runs into single spaces and trims the ends.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Renders single-quoted string literals with double quotes.
fn normalize_literal(literal: &str) -> String {
    match literal
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        Some(inner) => format!("\"{}\"", inner.replace("\\'", "'").replace('"', "\\\"")),
        None => literal.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(name: &str) -> TypeNode {
        TypeNode::new(
            TypeKind::Reference {
                name: name.to_owned(),
                arguments: Vec::new(),
            },
            name,
        )
    }

    #[test]
    fn test_declared_text_is_whitespace_normalized() {
        let node = TypeNode::new(TypeKind::Unsupported, "keyof   \n  User");
        assert_eq!(node.declared_text(), Some("keyof User"));
        assert_eq!(node.checker_text(), "keyof User");
    }

    #[test]
    fn test_synthesized_has_no_declared_text() {
        assert_eq!(TypeNode::keyword("any").declared_text(), None);
        assert_eq!(TypeNode::keyword("any").checker_text(), "any");
    }

    #[test]
    fn test_printer_normalizes_literals_and_arrays() {
        let union = TypeNode::synthesized(TypeKind::Union(vec![
            TypeNode::new(TypeKind::Literal("'a'".to_owned()), "'a'"),
            reference("B"),
        ]));
        assert_eq!(union.checker_text(), "\"a\" | B");

        let array = TypeNode::synthesized(TypeKind::Array(Box::new(union)));
        assert_eq!(array.checker_text(), "(\"a\" | B)[]");
    }

    #[test]
    fn test_printer_function() {
        let signature = Signature {
            parameters: vec![
                Parameter {
                    name: "id".to_owned(),
                    optional: false,
                    rest: false,
                    ty: Some(TypeNode::keyword("string")),
                },
                Parameter {
                    name: "rest".to_owned(),
                    optional: false,
                    rest: true,
                    ty: None,
                },
            ],
            return_type: Some(reference("User")),
            ..Signature::default()
        };
        let node = TypeNode::synthesized(TypeKind::Function(Box::new(signature)));
        assert_eq!(node.checker_text(), "(id: string, ...rest: any) => User");
    }

    #[test]
    fn test_substitute_replaces_parameters() {
        let mut map = FxHashMap::default();
        map.insert("T".to_owned(), reference("User"));

        let generic = TypeNode::new(
            TypeKind::Reference {
                name: "Map".to_owned(),
                arguments: vec![TypeNode::keyword("string"), reference("T")],
            },
            "Map<string, T>",
        );
        let substituted = generic.substitute(&map);
        assert_eq!(substituted.declared_text(), None);
        assert_eq!(substituted.checker_text(), "Map<string, User>");

        let direct = reference("T").substitute(&map);
        assert_eq!(direct.declared_text(), Some("User"));
    }

    #[test]
    fn test_substitute_keeps_untouched_nodes() {
        let mut map = FxHashMap::default();
        map.insert("T".to_owned(), reference("User"));

        let node = TypeNode::new(
            TypeKind::Array(Box::new(reference("Other"))),
            "Other[]",
        );
        assert_eq!(node.substitute(&map), node);
    }

    #[test]
    fn test_signature_type_parameters_shadow() {
        let mut map = FxHashMap::default();
        map.insert("T".to_owned(), reference("User"));

        let signature = Signature {
            type_parameters: vec![GenericParam {
                name: "T".to_owned(),
                constraint: None,
                default: None,
            }],
            return_type: Some(reference("T")),
            ..Signature::default()
        };
        assert!(signature.substituted(&map).is_none());
    }
}
