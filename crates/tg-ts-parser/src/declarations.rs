//! Parsed declarations and their merged, name-keyed collections.
//!
//! Every top-level interface, type alias and class becomes exactly one
//! parsed declaration per name. Repeated declarations of the same name are
//! merged: supertypes accumulate, and members are appended unless a member
//! of that name was already captured (first occurrence wins).

use std::fmt;

use smallvec::SmallVec;
use tg_core::{FxHashMap, FxHashSet, SourceSpan};

use crate::checker::Checker;
use crate::types::{GenericParam, ObjectType, Parameter, Signature, TypeKind, TypeNode};
use crate::types::{write_parameters, write_return};

/// Where a member of a merged declaration came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberOrigin {
    /// Declared in the first declaration of the name.
    Own,
    /// Declared in a later declaration of the same name.
    Merged,
    /// Inherited from a local supertype.
    Inherited {
        /// Name of the declaration that declares the member.
        from: String,
    },
}

/// What kind of member this is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    /// Property with its declared or inferred type.
    Property {
        /// `None` when neither annotated nor inferable.
        ty: Option<TypeNode>,
    },
    /// Method with one or more overload signatures, in declaration order.
    Method {
        /// Non-empty list of signatures.
        signatures: Vec<Signature>,
    },
    /// `get name(): T`.
    Getter {
        /// Return type of the accessor.
        ty: Option<TypeNode>,
    },
    /// `set name(value: T)`.
    Setter {
        /// The accessor's single parameter.
        parameter: Option<Parameter>,
    },
}

/// One named member of an interface, class or object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMember {
    /// Member name; quoted names are unquoted.
    pub name: String,
    /// Declared with a trailing `?`.
    pub optional: bool,
    /// Declared `readonly`.
    pub readonly: bool,
    /// Member kind and type information.
    pub kind: MemberKind,
    /// Source range of the member.
    pub span: SourceSpan,
    /// Where the member came from.
    pub origin: MemberOrigin,
}

impl ParsedMember {
    /// The member's value type for properties and getters.
    #[must_use]
    pub const fn ty(&self) -> Option<&TypeNode> {
        match &self.kind {
            MemberKind::Property { ty } | MemberKind::Getter { ty } => ty.as_ref(),
            MemberKind::Method { .. } | MemberKind::Setter { .. } => None,
        }
    }

    /// Returns `true` for members inherited from a supertype.
    #[must_use]
    pub const fn is_inherited(&self) -> bool {
        matches!(self.origin, MemberOrigin::Inherited { .. })
    }

    pub(crate) fn substituted(&self, map: &FxHashMap<String, TypeNode>) -> Option<Self> {
        let kind = match &self.kind {
            MemberKind::Property { ty } => MemberKind::Property {
                ty: Some(ty.as_ref()?.substitute_changed(map)?),
            },
            MemberKind::Getter { ty } => MemberKind::Getter {
                ty: Some(ty.as_ref()?.substitute_changed(map)?),
            },
            MemberKind::Setter { parameter } => {
                let parameter = parameter.as_ref()?;
                let ty = parameter.ty.as_ref()?.substitute_changed(map)?;
                MemberKind::Setter {
                    parameter: Some(Parameter {
                        ty: Some(ty),
                        ..parameter.clone()
                    }),
                }
            }
            MemberKind::Method { signatures } => {
                let replaced: Vec<Option<Signature>> =
                    signatures.iter().map(|s| s.substituted(map)).collect();
                if replaced.iter().all(Option::is_none) {
                    return None;
                }
                MemberKind::Method {
                    signatures: replaced
                        .into_iter()
                        .zip(signatures)
                        .map(|(new, old)| new.unwrap_or_else(|| old.clone()))
                        .collect(),
                }
            }
        };
        Some(Self {
            kind,
            ..self.clone()
        })
    }

    fn inherited_from(&self, from: &str, map: &FxHashMap<String, TypeNode>) -> Self {
        let mut member = self.substituted(map).unwrap_or_else(|| self.clone());
        if !member.is_inherited() {
            member.origin = MemberOrigin::Inherited {
                from: from.to_owned(),
            };
        }
        member
    }
}

impl TypeNode {
    /// Like [`TypeNode::substitute`], but `None` when nothing changed.
    fn substitute_changed(&self, map: &FxHashMap<String, TypeNode>) -> Option<Self> {
        let substituted = self.substitute(map);
        (substituted != *self).then_some(substituted)
    }
}

impl fmt::Display for ParsedMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let optional = if self.optional { "?" } else { "" };
        match &self.kind {
            MemberKind::Property { ty } => {
                if self.readonly {
                    f.write_str("readonly ")?;
                }
                write!(f, "{}{optional}: ", self.name)?;
                match ty {
                    Some(ty) => write!(f, "{ty};"),
                    None => f.write_str("any;"),
                }
            }
            MemberKind::Method { signatures } => {
                for (i, signature) in signatures.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}{optional}", self.name)?;
                    write_parameters(f, signature)?;
                    f.write_str(": ")?;
                    write_return(f, signature)?;
                    f.write_str(";")?;
                }
                Ok(())
            }
            MemberKind::Getter { ty } => match ty {
                Some(ty) => write!(f, "get {}(): {ty};", self.name),
                None => write!(f, "get {}(): any;", self.name),
            },
            MemberKind::Setter { parameter } => match parameter {
                Some(Parameter { name, ty: Some(ty), .. }) => {
                    write!(f, "set {}({name}: {ty});", self.name)
                }
                Some(Parameter { name, ty: None, .. }) => write!(f, "set {}({name});", self.name),
                None => write!(f, "set {}();", self.name),
            },
        }
    }
}

/// A merged interface declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInterface {
    /// Interface name.
    pub name: String,
    /// Source range of the first declaration.
    pub span: SourceSpan,
    /// Generic parameters of the first declaration.
    pub type_parameters: Vec<GenericParam>,
    /// `extends` clauses accumulated across declarations.
    pub extends: SmallVec<[TypeNode; 2]>,
    /// Own, merged and inherited members, in that order.
    pub members: Vec<ParsedMember>,
}

impl ParsedInterface {
    /// Property members.
    pub fn properties(&self) -> impl Iterator<Item = &ParsedMember> {
        self.members
            .iter()
            .filter(|m| matches!(m.kind, MemberKind::Property { .. }))
    }

    /// Method members.
    pub fn methods(&self) -> impl Iterator<Item = &ParsedMember> {
        self.members
            .iter()
            .filter(|m| matches!(m.kind, MemberKind::Method { .. }))
    }

    /// Looks up a member by name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&ParsedMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// A type alias declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTypeAlias {
    /// Alias name.
    pub name: String,
    /// Source range of the declaration.
    pub span: SourceSpan,
    /// Generic parameters.
    pub type_parameters: Vec<GenericParam>,
    /// Right-hand side as written.
    pub declared: TypeNode,
    /// Right-hand side with local aliases expanded.
    pub ty: TypeNode,
}

/// A merged class declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClass {
    /// Class name.
    pub name: String,
    /// Source range of the first declaration.
    pub span: SourceSpan,
    /// Generic parameters of the first declaration.
    pub type_parameters: Vec<GenericParam>,
    /// Declared `abstract class`.
    pub is_abstract: bool,
    /// `extends` base class.
    pub extends: Option<TypeNode>,
    /// `implements` clause, accumulated across declarations.
    pub implements: SmallVec<[TypeNode; 2]>,
    /// Own, merged and inherited instance members.
    pub members: Vec<ParsedMember>,
}

impl ParsedClass {
    /// Property members (fields and parameter properties).
    pub fn properties(&self) -> impl Iterator<Item = &ParsedMember> {
        self.members
            .iter()
            .filter(|m| matches!(m.kind, MemberKind::Property { .. }))
    }

    /// Method members.
    pub fn methods(&self) -> impl Iterator<Item = &ParsedMember> {
        self.members
            .iter()
            .filter(|m| matches!(m.kind, MemberKind::Method { .. }))
    }

    /// Looks up a member by name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&ParsedMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// An enum declaration. Enums are not models; they make member references
/// value-like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEnum {
    /// Enum name.
    pub name: String,
    /// Member names in declaration order.
    pub members: Vec<String>,
}

/// Appends `incoming` members whose names are not yet present.
fn merge_members(members: &mut Vec<ParsedMember>, incoming: Vec<ParsedMember>, origin: &MemberOrigin) {
    let mut seen: FxHashSet<String> = members.iter().map(|m| m.name.clone()).collect();
    for mut member in incoming {
        if !seen.insert(member.name.clone()) {
            tracing::trace!(member = %member.name, "skipping member already declared");
            continue;
        }
        member.origin = origin.clone();
        members.push(member);
    }
}

/// All top-level declarations of one source buffer, merged by name.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    interfaces: Vec<ParsedInterface>,
    type_aliases: Vec<ParsedTypeAlias>,
    classes: Vec<ParsedClass>,
    enums: Vec<ParsedEnum>,
    interface_index: FxHashMap<String, usize>,
    alias_index: FxHashMap<String, usize>,
    class_index: FxHashMap<String, usize>,
    enum_index: FxHashMap<String, usize>,
}

impl Declarations {
    /// Merged interfaces in first-declaration order.
    #[must_use]
    pub fn interfaces(&self) -> &[ParsedInterface] {
        &self.interfaces
    }

    /// Type aliases in declaration order.
    #[must_use]
    pub fn type_aliases(&self) -> &[ParsedTypeAlias] {
        &self.type_aliases
    }

    /// Merged classes in first-declaration order.
    #[must_use]
    pub fn classes(&self) -> &[ParsedClass] {
        &self.classes
    }

    /// Enums in declaration order.
    #[must_use]
    pub fn enums(&self) -> &[ParsedEnum] {
        &self.enums
    }

    /// Looks up an interface by name.
    #[must_use]
    pub fn interface(&self, name: &str) -> Option<&ParsedInterface> {
        self.interface_index.get(name).map(|&i| &self.interfaces[i])
    }

    /// Looks up a type alias by name.
    #[must_use]
    pub fn type_alias(&self, name: &str) -> Option<&ParsedTypeAlias> {
        self.alias_index.get(name).map(|&i| &self.type_aliases[i])
    }

    /// Looks up a class by name.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ParsedClass> {
        self.class_index.get(name).map(|&i| &self.classes[i])
    }

    /// Looks up an enum by name.
    #[must_use]
    pub fn enumeration(&self, name: &str) -> Option<&ParsedEnum> {
        self.enum_index.get(name).map(|&i| &self.enums[i])
    }

    /// Adds an interface, merging it into an existing one of the same name.
    pub(crate) fn add_interface(&mut self, interface: ParsedInterface) {
        if let Some(&i) = self.interface_index.get(&interface.name) {
            let existing = &mut self.interfaces[i];
            existing.extends.extend(interface.extends);
            merge_members(&mut existing.members, interface.members, &MemberOrigin::Merged);
            return;
        }
        self.interface_index
            .insert(interface.name.clone(), self.interfaces.len());
        self.interfaces.push(interface);
    }

    /// Adds a type alias; a repeated name keeps the first declaration.
    pub(crate) fn add_type_alias(&mut self, alias: ParsedTypeAlias) {
        if self.alias_index.contains_key(&alias.name) {
            tracing::trace!(alias = %alias.name, "skipping duplicate type alias");
            return;
        }
        self.alias_index
            .insert(alias.name.clone(), self.type_aliases.len());
        self.type_aliases.push(alias);
    }

    /// Adds a class, merging it into an existing one of the same name.
    pub(crate) fn add_class(&mut self, class: ParsedClass) {
        if let Some(&i) = self.class_index.get(&class.name) {
            let existing = &mut self.classes[i];
            if existing.extends.is_none() {
                existing.extends = class.extends;
            }
            existing.implements.extend(class.implements);
            merge_members(&mut existing.members, class.members, &MemberOrigin::Merged);
            return;
        }
        self.class_index.insert(class.name.clone(), self.classes.len());
        self.classes.push(class);
    }

    /// Adds an enum; repeated declarations accumulate members.
    pub(crate) fn add_enum(&mut self, enumeration: ParsedEnum) {
        if let Some(&i) = self.enum_index.get(&enumeration.name) {
            self.enums[i].members.extend(enumeration.members);
            return;
        }
        self.enum_index
            .insert(enumeration.name.clone(), self.enums.len());
        self.enums.push(enumeration);
    }

    /// Copies members of local supertypes into each interface and class.
    ///
    /// Interfaces inherit from every local `extends` target (interfaces,
    /// classes and object-literal aliases); classes inherit from their local
    /// base class. Type arguments written on the supertype replace its type
    /// parameters. A member already present keeps its own declaration.
    pub(crate) fn resolve_inheritance(&mut self) {
        let interface_inherited: Vec<Vec<ParsedMember>> = self
            .interfaces
            .iter()
            .map(|interface| {
                let mut visited = FxHashSet::default();
                visited.insert(interface.name.clone());
                interface
                    .extends
                    .iter()
                    .flat_map(|base| self.inherited_members(base, &mut visited))
                    .collect()
            })
            .collect();
        let class_inherited: Vec<Vec<ParsedMember>> = self
            .classes
            .iter()
            .map(|class| {
                let mut visited = FxHashSet::default();
                visited.insert(class.name.clone());
                class
                    .extends
                    .iter()
                    .flat_map(|base| self.inherited_members(base, &mut visited))
                    .collect()
            })
            .collect();

        for (interface, inherited) in self.interfaces.iter_mut().zip(interface_inherited) {
            append_inherited(&mut interface.members, inherited);
        }
        for (class, inherited) in self.classes.iter_mut().zip(class_inherited) {
            append_inherited(&mut class.members, inherited);
        }
    }

    /// Fills each alias's `ty` with its declared type expanded through
    /// other local aliases.
    pub(crate) fn expand_aliases(&mut self, depth_limit: usize) {
        let expanded: Vec<TypeNode> = {
            let checker = Checker::new(self, depth_limit);
            self.type_aliases
                .iter()
                .map(|alias| checker.apparent_type(&alias.declared).into_owned())
                .collect()
        };
        for (alias, ty) in self.type_aliases.iter_mut().zip(expanded) {
            alias.ty = ty;
        }
    }

    /// Members declared by the supertype `base`, deepest supertypes last.
    fn inherited_members(&self, base: &TypeNode, visited: &mut FxHashSet<String>) -> Vec<ParsedMember> {
        let TypeKind::Reference { name, arguments } = base.kind() else {
            return Vec::new();
        };
        if !visited.insert(name.clone()) {
            tracing::trace!(supertype = %name, "inheritance cycle");
            return Vec::new();
        }

        let (params, members, bases): (&[GenericParam], Vec<&ParsedMember>, Vec<&TypeNode>) =
            if let Some(interface) = self.interface(name) {
                (
                    interface.type_parameters.as_slice(),
                    interface.members.iter().filter(|m| !m.is_inherited()).collect(),
                    interface.extends.iter().collect(),
                )
            } else if let Some(class) = self.class(name) {
                (
                    class.type_parameters.as_slice(),
                    class.members.iter().filter(|m| !m.is_inherited()).collect(),
                    class.extends.iter().collect(),
                )
            } else if let Some(alias) = self.type_alias(name) {
                match alias.declared.kind() {
                    TypeKind::Object(ObjectType { members, .. }) => {
                        (alias.type_parameters.as_slice(), members.iter().collect(), Vec::new())
                    }
                    _ => return Vec::new(),
                }
            } else {
                return Vec::new();
            };

        let map = bind_type_arguments(params, arguments);
        let mut inherited: Vec<ParsedMember> = members
            .into_iter()
            .map(|member| member.inherited_from(name, &map))
            .collect();
        for next in bases {
            let next = next.substitute(&map);
            inherited.extend(self.inherited_members(&next, visited));
        }
        inherited
    }
}

fn append_inherited(members: &mut Vec<ParsedMember>, inherited: Vec<ParsedMember>) {
    let mut seen: FxHashSet<String> = members.iter().map(|m| m.name.clone()).collect();
    for member in inherited {
        if seen.insert(member.name.clone()) {
            members.push(member);
        }
    }
}

/// Maps type parameters to the written arguments, falling back to each
/// parameter's default and then to `unknown`.
pub(crate) fn bind_type_arguments(
    params: &[GenericParam],
    arguments: &[TypeNode],
) -> FxHashMap<String, TypeNode> {
    params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            let ty = arguments
                .get(i)
                .or(param.default.as_ref())
                .cloned()
                .unwrap_or_else(|| TypeNode::keyword("unknown"));
            (param.name.clone(), ty)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(name: &str, ty: &str) -> ParsedMember {
        ParsedMember {
            name: name.to_owned(),
            optional: false,
            readonly: false,
            kind: MemberKind::Property {
                ty: Some(TypeNode::new(
                    TypeKind::Reference {
                        name: ty.to_owned(),
                        arguments: Vec::new(),
                    },
                    ty,
                )),
            },
            span: SourceSpan::default(),
            origin: MemberOrigin::Own,
        }
    }

    fn interface(name: &str, members: Vec<ParsedMember>) -> ParsedInterface {
        ParsedInterface {
            name: name.to_owned(),
            span: SourceSpan::default(),
            type_parameters: Vec::new(),
            extends: SmallVec::new(),
            members,
        }
    }

    #[test]
    fn test_merge_keeps_first_occurrence() {
        let mut decls = Declarations::default();
        decls.add_interface(interface("A", vec![property("a", "T1")]));
        decls.add_interface(interface("A", vec![property("a", "Other"), property("b", "T2")]));

        let merged = decls.interface("A").expect("merged interface");
        let names: Vec<_> = merged.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(merged.members[0].to_string(), "a: T1;");
        assert_eq!(merged.members[1].origin, MemberOrigin::Merged);
    }

    #[test]
    fn test_inheritance_substitutes_arguments() {
        let mut decls = Declarations::default();
        let mut base = interface("Box", vec![property("item", "T")]);
        base.type_parameters.push(GenericParam {
            name: "T".to_owned(),
            constraint: None,
            default: None,
        });
        decls.add_interface(base);

        let mut child = interface("UserBox", vec![property("label", "string")]);
        child.extends.push(TypeNode::new(
            TypeKind::Reference {
                name: "Box".to_owned(),
                arguments: vec![TypeNode::new(
                    TypeKind::Reference {
                        name: "User".to_owned(),
                        arguments: Vec::new(),
                    },
                    "User",
                )],
            },
            "Box<User>",
        ));
        decls.add_interface(child);
        decls.resolve_inheritance();

        let child = decls.interface("UserBox").expect("interface");
        let item = child.member("item").expect("inherited member");
        assert_eq!(
            item.origin,
            MemberOrigin::Inherited {
                from: "Box".to_owned()
            }
        );
        assert_eq!(item.to_string(), "item: User;");
    }

    #[test]
    fn test_inheritance_cycle_terminates() {
        let mut decls = Declarations::default();
        let mut a = interface("A", vec![property("a", "string")]);
        a.extends.push(TypeNode::reference("B", Vec::new()));
        let mut b = interface("B", vec![property("b", "string")]);
        b.extends.push(TypeNode::reference("A", Vec::new()));
        decls.add_interface(a);
        decls.add_interface(b);
        decls.resolve_inheritance();

        let names: Vec<_> = decls
            .interface("A")
            .expect("interface")
            .members
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_duplicate_alias_keeps_first() {
        let mut decls = Declarations::default();
        for text in ["string", "number"] {
            decls.add_type_alias(ParsedTypeAlias {
                name: "A".to_owned(),
                span: SourceSpan::default(),
                type_parameters: Vec::new(),
                declared: TypeNode::new(TypeKind::Keyword(text.to_owned()), text),
                ty: TypeNode::keyword(text),
            });
        }
        assert_eq!(decls.type_aliases().len(), 1);
        assert_eq!(
            decls.type_alias("A").map(|a| a.declared.checker_text()),
            Some("string".to_owned())
        );
    }

    #[test]
    fn test_bind_type_arguments_defaults() {
        let params = vec![
            GenericParam {
                name: "K".to_owned(),
                constraint: None,
                default: None,
            },
            GenericParam {
                name: "V".to_owned(),
                constraint: None,
                default: Some(TypeNode::keyword("string")),
            },
        ];
        let map = bind_type_arguments(&params, &[TypeNode::keyword("number")]);
        assert_eq!(map["K"].checker_text(), "number");
        assert_eq!(map["V"].checker_text(), "string");
        assert_eq!(bind_type_arguments(&params, &[])["K"].checker_text(), "unknown");
    }
}
