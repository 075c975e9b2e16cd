//! Semantic queries over the declarations of one source buffer.
//!
//! The [`Checker`] answers the questions model extraction asks about a type:
//! what it expands to, whether it is callable, an array, a union or a plain
//! value, what a property or indexed access resolves to, and how it should
//! be named. Only declarations in the same buffer are known; every other
//! name is opaque.

use std::borrow::Cow;

use crate::declarations::{Declarations, MemberKind, ParsedMember, bind_type_arguments};
use crate::types::{Signature, TypeKind, TypeNode};

/// Keywords whose types are plain values rather than shapes.
const VALUE_KEYWORDS: &[&str] = &[
    "string",
    "number",
    "boolean",
    "bigint",
    "symbol",
    "undefined",
    "null",
    "any",
    "unknown",
    "never",
    "void",
];

/// The kind of a top-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// `interface`
    Interface,
    /// `type`
    TypeAlias,
    /// `class`
    Class,
    /// `enum`
    Enum,
}

/// Type queries bound to one set of parsed declarations.
#[derive(Debug, Clone, Copy)]
pub struct Checker<'p> {
    declarations: &'p Declarations,
    depth_limit: usize,
}

impl<'p> Checker<'p> {
    pub(crate) const fn new(declarations: &'p Declarations, depth_limit: usize) -> Self {
        Self {
            declarations,
            depth_limit,
        }
    }

    /// The declarations this checker resolves names against.
    #[must_use]
    pub const fn declarations(&self) -> &'p Declarations {
        self.declarations
    }

    /// The kind of the top-level declaration named `name`, if any.
    #[must_use]
    pub fn declaration_kind(&self, name: &str) -> Option<DeclarationKind> {
        let decls = self.declarations;
        if decls.interface(name).is_some() {
            Some(DeclarationKind::Interface)
        } else if decls.type_alias(name).is_some() {
            Some(DeclarationKind::TypeAlias)
        } else if decls.class(name).is_some() {
            Some(DeclarationKind::Class)
        } else if decls.enumeration(name).is_some() {
            Some(DeclarationKind::Enum)
        } else {
            None
        }
    }

    /// Expands local aliases (substituting their type arguments) and
    /// resolvable indexed accesses until a structural type is reached.
    ///
    /// Expansion stops after the configured number of hops, so cyclic
    /// aliases terminate.
    #[must_use]
    pub fn apparent_type<'a>(&self, ty: &'a TypeNode) -> Cow<'a, TypeNode> {
        let mut current = Cow::Borrowed(ty);
        for _ in 0..self.depth_limit {
            let next = match current.kind() {
                TypeKind::Reference { name, arguments } => {
                    let Some(alias) = self.declarations.type_alias(name) else {
                        return current;
                    };
                    let map = bind_type_arguments(&alias.type_parameters, arguments);
                    alias.declared.substitute(&map)
                }
                TypeKind::IndexedAccess { .. } => match self.resolve_indexed_access(&current) {
                    Some(resolved) => resolved,
                    None => return current,
                },
                _ => return current,
            };
            current = Cow::Owned(next);
        }
        tracing::debug!(ty = %ty, limit = self.depth_limit, "alias expansion depth limit reached");
        current
    }

    /// The alias name a type is referred to by, when it names a local alias.
    #[must_use]
    pub fn alias_symbol<'a>(&self, ty: &'a TypeNode) -> Option<&'a str> {
        let name = ty.reference_name()?;
        self.declarations.type_alias(name).map(|_| name)
    }

    /// Call signatures of a function or object type, as written.
    #[must_use]
    pub fn call_signatures<'a>(&self, ty: &'a TypeNode) -> &'a [Signature] {
        match ty.kind() {
            TypeKind::Function(signature) => std::slice::from_ref(&**signature),
            TypeKind::Object(object) => &object.call_signatures,
            _ => &[],
        }
    }

    /// Element type of an array type (`T[]`, `readonly T[]`), as written.
    ///
    /// `Array<T>` is a generic reference, not an array type.
    #[must_use]
    pub fn array_element<'a>(&self, ty: &'a TypeNode) -> Option<&'a TypeNode> {
        match ty.kind() {
            TypeKind::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Members of a union type, as written.
    #[must_use]
    pub fn union_members<'a>(&self, ty: &'a TypeNode) -> Option<&'a [TypeNode]> {
        match ty.kind() {
            TypeKind::Union(members) => Some(members),
            _ => None,
        }
    }

    /// Returns `true` if the type, once expanded, is a primitive keyword,
    /// a literal, an enum or an enum member.
    #[must_use]
    pub fn is_value_like(&self, ty: &TypeNode) -> bool {
        let apparent = self.apparent_type(ty);
        match apparent.kind() {
            TypeKind::Keyword(keyword) => VALUE_KEYWORDS.contains(&keyword.as_str()),
            TypeKind::Literal(_) => true,
            TypeKind::Reference { name, arguments } if arguments.is_empty() => {
                self.is_enum_or_member(name)
            }
            _ => false,
        }
    }

    fn is_enum_or_member(&self, name: &str) -> bool {
        if self.declarations.enumeration(name).is_some() {
            return true;
        }
        name.split_once('.').is_some_and(|(owner, member)| {
            self.declarations
                .enumeration(owner)
                .is_some_and(|e| e.members.iter().any(|m| m == member))
        })
    }

    /// Type of the property `name` on `ty`, looking through aliases,
    /// local interfaces and classes, unions and intersections.
    #[must_use]
    pub fn property_of_type(&self, ty: &TypeNode, name: &str) -> Option<TypeNode> {
        let apparent = self.apparent_type(ty);
        match apparent.kind() {
            TypeKind::Object(object) => object.member(name).and_then(member_type),
            TypeKind::Reference {
                name: target,
                arguments,
            } => {
                let (params, member) = if let Some(interface) = self.declarations.interface(target)
                {
                    (&interface.type_parameters, interface.member(name)?)
                } else if let Some(class) = self.declarations.class(target) {
                    (&class.type_parameters, class.member(name)?)
                } else {
                    return None;
                };
                let map = bind_type_arguments(params, arguments);
                member_type(member).map(|ty| ty.substitute(&map))
            }
            TypeKind::Union(items) => {
                let found: Vec<TypeNode> = items
                    .iter()
                    .filter_map(|item| self.property_of_type(item, name))
                    .collect();
                join_union(found)
            }
            TypeKind::Intersection(items) => items
                .iter()
                .find_map(|item| self.property_of_type(item, name)),
            _ => None,
        }
    }

    /// Resolves `Object["key"]`, `Object["a" | "b"]` and `Array[number]`.
    ///
    /// Returns `None` when `ty` is not an indexed access or the key cannot
    /// be resolved against a local type.
    #[must_use]
    pub fn resolve_indexed_access(&self, ty: &TypeNode) -> Option<TypeNode> {
        let TypeKind::IndexedAccess { object, index } = ty.kind() else {
            return None;
        };
        let index = self.apparent_type(index);
        let keys: Vec<&TypeNode> = match index.kind() {
            TypeKind::Union(items) => items.iter().collect(),
            _ => vec![&*index],
        };

        let mut resolved = Vec::with_capacity(keys.len());
        for key in keys {
            match key.kind() {
                TypeKind::Literal(literal) => {
                    resolved.push(self.property_of_type(object, unquote_literal(literal))?);
                }
                TypeKind::Keyword(keyword) if keyword == "number" => {
                    let apparent = self.apparent_type(object);
                    resolved.push(self.array_element(&apparent)?.clone());
                }
                _ => return None,
            }
        }
        join_union(resolved)
    }

    /// The checker's rendering of a type, without alias expansion.
    #[must_use]
    pub fn type_to_string(&self, ty: &TypeNode) -> String {
        ty.checker_text()
    }

    /// Name for a type: the declared text when the type came from the
    /// source, else the alias it refers to, else the checker's rendering.
    #[must_use]
    pub fn type_name(&self, ty: &TypeNode) -> String {
        ty.declared_text()
            .or_else(|| self.alias_symbol(ty))
            .map_or_else(|| self.type_to_string(ty), str::to_owned)
    }
}

/// The value type of a member, with methods as function types.
fn member_type(member: &ParsedMember) -> Option<TypeNode> {
    match &member.kind {
        MemberKind::Property { ty } | MemberKind::Getter { ty } => ty.clone(),
        MemberKind::Setter { parameter } => parameter.as_ref().and_then(|p| p.ty.clone()),
        MemberKind::Method { signatures } => signatures
            .first()
            .map(|signature| TypeNode::synthesized(TypeKind::Function(Box::new(signature.clone())))),
    }
}

/// A single type, or the union of several with duplicates removed.
fn join_union(types: Vec<TypeNode>) -> Option<TypeNode> {
    let mut flat: Vec<TypeNode> = Vec::with_capacity(types.len());
    for ty in types {
        let items = match ty.kind() {
            TypeKind::Union(items) => items.clone(),
            _ => vec![ty],
        };
        for item in items {
            if !flat.iter().any(|seen| seen.checker_text() == item.checker_text()) {
                flat.push(item);
            }
        }
    }
    match flat.len() {
        0 => None,
        1 => flat.pop(),
        _ => Some(TypeNode::synthesized(TypeKind::Union(flat))),
    }
}

fn unquote_literal(literal: &str) -> &str {
    literal
        .strip_prefix(['"', '\''])
        .and_then(|rest| rest.strip_suffix(['"', '\'']))
        .unwrap_or(literal)
}

/// Removes `import("...").` qualifiers from rendered type text.
///
/// # Examples
///
/// ```
/// use tg_ts_parser::strip_module_qualifier;
///
/// assert_eq!(strip_module_qualifier(r#"import("/source").User"#), "User");
/// assert_eq!(strip_module_qualifier("Map<string, User>"), "Map<string, User>");
/// ```
#[must_use]
pub fn strip_module_qualifier(text: &str) -> Cow<'_, str> {
    if !text.contains("import(") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("import(") {
        let Some(close) = rest[start..].find(").") else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &rest[start + close + 2..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}
