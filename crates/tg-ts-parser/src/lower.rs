//! Lowering of tree-sitter nodes into parsed declarations and types.
//!
//! Lowering never fails. Nodes the checker does not model become
//! [`TypeKind::Unsupported`], members containing syntax errors are skipped,
//! and declarations without a usable name are dropped by returning `None`.

use smallvec::SmallVec;
use tg_core::{SourceLocation, SourceSpan};
use tree_sitter::Node;

use crate::declarations::{
    MemberKind, MemberOrigin, ParsedClass, ParsedEnum, ParsedInterface, ParsedMember,
    ParsedTypeAlias,
};
use crate::types::{GenericParam, ObjectType, Parameter, Signature, TypeKind, TypeNode};

/// Nodes whose bodies belong to a different function when looking for
/// `return` statements.
const FUNCTION_BOUNDARIES: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function_declaration",
    "generator_function",
    "generator_function_declaration",
    "method_definition",
    "class",
    "class_declaration",
];

/// Converts syntax nodes of one source buffer.
pub(crate) struct Lowerer<'s> {
    source: &'s [u8],
}

impl<'s> Lowerer<'s> {
    pub(crate) const fn new(source: &'s str) -> Self {
        Self {
            source: source.as_bytes(),
        }
    }

    fn text(&self, node: Node<'_>) -> &'s str {
        node_text(node, self.source).unwrap_or_default()
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    /// Lowers an `interface_declaration`.
    pub(crate) fn interface(&self, node: Node<'_>) -> Option<ParsedInterface> {
        let name = self.declaration_name(node)?;
        let mut extends = SmallVec::new();
        let mut cursor = node.walk();
        for child in named_children(node, &mut cursor) {
            if child.kind() == "extends_type_clause" {
                let mut inner = child.walk();
                extends.extend(named_children(child, &mut inner).map(|ty| self.lower_type(ty)));
            }
        }
        let members = node
            .child_by_field_name("body")
            .map(|body| self.object_members(body).members)
            .unwrap_or_default();

        Some(ParsedInterface {
            name,
            span: node_span(node),
            type_parameters: self.type_parameters(node),
            extends,
            members,
        })
    }

    /// Lowers a `type_alias_declaration`. The expanded type is filled in by
    /// the parser once every alias is known.
    pub(crate) fn type_alias(&self, node: Node<'_>) -> Option<ParsedTypeAlias> {
        let name = self.declaration_name(node)?;
        let value = node.child_by_field_name("value")?;
        if value.is_missing() {
            return None;
        }
        let declared = self.lower_type(value);
        Some(ParsedTypeAlias {
            name,
            span: node_span(node),
            type_parameters: self.type_parameters(node),
            ty: declared.clone(),
            declared,
        })
    }

    /// Lowers a `class_declaration` or `abstract_class_declaration`.
    pub(crate) fn class(&self, node: Node<'_>) -> Option<ParsedClass> {
        let name = self.declaration_name(node)?;
        let mut extends = None;
        let mut implements = SmallVec::new();

        let mut cursor = node.walk();
        for child in named_children(node, &mut cursor) {
            if child.kind() != "class_heritage" {
                continue;
            }
            let mut heritage = child.walk();
            for clause in named_children(child, &mut heritage) {
                match clause.kind() {
                    "extends_clause" => extends = self.extends_clause(clause),
                    "implements_clause" => {
                        let mut inner = clause.walk();
                        implements
                            .extend(named_children(clause, &mut inner).map(|ty| self.lower_type(ty)));
                    }
                    _ => {}
                }
            }
        }
        let members = node
            .child_by_field_name("body")
            .map(|body| self.class_members(body))
            .unwrap_or_default();

        Some(ParsedClass {
            name,
            span: node_span(node),
            type_parameters: self.type_parameters(node),
            is_abstract: node.kind() == "abstract_class_declaration",
            extends,
            implements,
            members,
        })
    }

    /// Lowers an `enum_declaration`.
    pub(crate) fn enumeration(&self, node: Node<'_>) -> Option<ParsedEnum> {
        let name = self.declaration_name(node)?;
        let mut members = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in named_children(body, &mut cursor) {
                let name_node = match child.kind() {
                    "enum_assignment" => child.child_by_field_name("name"),
                    _ => Some(child),
                };
                if let Some(name_node) = name_node {
                    members.push(self.property_name(name_node));
                }
            }
        }
        Some(ParsedEnum { name, members })
    }

    fn declaration_name(&self, node: Node<'_>) -> Option<String> {
        let name = node.child_by_field_name("name")?;
        if name.is_missing() || name.is_error() {
            return None;
        }
        let text = self.text(name);
        (!text.is_empty()).then(|| text.to_owned())
    }

    /// `class A extends Base<T>`: the base expression plus its type arguments.
    fn extends_clause(&self, clause: Node<'_>) -> Option<TypeNode> {
        let value = clause.child_by_field_name("value")?;
        let arguments_node = clause.child_by_field_name("type_arguments");
        let arguments = arguments_node
            .map(|args| self.type_arguments(args))
            .unwrap_or_default();
        let end = arguments_node.map_or(value.end_byte(), |args| args.end_byte());
        let declared = self
            .source
            .get(value.start_byte()..end)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .unwrap_or_default();

        Some(TypeNode::new(
            TypeKind::Reference {
                name: crate::types::normalize_whitespace(self.text(value)),
                arguments,
            },
            declared,
        ))
    }

    fn type_parameters(&self, node: Node<'_>) -> Vec<GenericParam> {
        let Some(params) = node.child_by_field_name("type_parameters") else {
            return Vec::new();
        };
        let mut cursor = params.walk();
        named_children(params, &mut cursor)
            .filter(|param| param.kind() == "type_parameter")
            .filter_map(|param| {
                let name = param.child_by_field_name("name")?;
                Some(GenericParam {
                    name: self.text(name).to_owned(),
                    constraint: param
                        .child_by_field_name("constraint")
                        .and_then(first_named)
                        .map(|ty| self.lower_type(ty)),
                    default: param
                        .child_by_field_name("value")
                        .and_then(first_named)
                        .map(|ty| self.lower_type(ty)),
                })
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Members
    // ---------------------------------------------------------------------

    /// Members of an `interface_body` or `object_type`.
    fn object_members(&self, body: Node<'_>) -> ObjectType {
        let mut object = ObjectType::default();
        let mut cursor = body.walk();
        for child in named_children(body, &mut cursor) {
            if child.has_error() {
                tracing::trace!(kind = child.kind(), "skipping member with syntax errors");
                continue;
            }
            match child.kind() {
                "property_signature" => {
                    let ty = child
                        .child_by_field_name("type")
                        .and_then(|annotation| self.annotation(annotation));
                    push_member(
                        &mut object.members,
                        self.member(child, MemberKind::Property { ty }),
                    );
                }
                "method_signature" => {
                    let member = self.method(child, false);
                    push_member(&mut object.members, member);
                }
                "call_signature" => object.call_signatures.push(self.signature(child, false)),
                other => tracing::trace!(kind = other, "skipping unsupported signature kind"),
            }
        }
        object
    }

    /// Instance members of a `class_body`.
    fn class_members(&self, body: Node<'_>) -> Vec<ParsedMember> {
        let mut members = Vec::new();
        let mut cursor = body.walk();
        for child in named_children(body, &mut cursor) {
            if child.has_error() {
                tracing::trace!(kind = child.kind(), "skipping member with syntax errors");
                continue;
            }
            let modifiers = self.modifiers(child);
            if modifiers.is_static {
                continue;
            }
            match child.kind() {
                "public_field_definition" => {
                    let ty = child
                        .child_by_field_name("type")
                        .and_then(|annotation| self.annotation(annotation))
                        .or_else(|| {
                            child
                                .child_by_field_name("value")
                                .map(|value| self.infer_expression(value))
                        });
                    push_member(&mut members, self.member(child, MemberKind::Property { ty }));
                }
                "method_definition" if self.is_constructor(child) => {
                    for property in self.parameter_properties(child) {
                        push_member(&mut members, Some(property));
                    }
                }
                "method_definition" => push_member(&mut members, self.method(child, true)),
                "method_signature" | "abstract_method_signature" => {
                    push_member(&mut members, self.method(child, false));
                }
                _ => {}
            }
        }
        members
    }

    fn member(&self, node: Node<'_>, kind: MemberKind) -> Option<ParsedMember> {
        let name = node.child_by_field_name("name")?;
        if name.is_missing() {
            return None;
        }
        let modifiers = self.modifiers(node);
        Some(ParsedMember {
            name: self.property_name(name),
            optional: modifiers.optional,
            readonly: modifiers.readonly,
            kind,
            span: node_span(node),
            origin: MemberOrigin::Own,
        })
    }

    /// Methods and accessors from method signatures and definitions.
    fn method(&self, node: Node<'_>, has_body: bool) -> Option<ParsedMember> {
        let modifiers = self.modifiers(node);
        let mut signature = self.signature(node, has_body);
        signature.declared_by_member = true;

        if signature.return_type.is_none() {
            if let Some(body) = node.child_by_field_name("body") {
                let inferred = if has_return_value(body) {
                    TypeNode::keyword("any")
                } else {
                    TypeNode::keyword("void")
                };
                signature.return_type = Some(inferred);
            }
        }
        let returns_promise = signature
            .return_type
            .as_ref()
            .and_then(TypeNode::reference_name)
            == Some("Promise");
        if modifiers.is_async && !returns_promise {
            let inner = signature
                .return_type
                .take()
                .unwrap_or_else(|| TypeNode::keyword("any"));
            signature.return_type = Some(TypeNode::reference("Promise", vec![inner]));
        }

        let kind = match modifiers.accessor {
            Some(Accessor::Get) => MemberKind::Getter {
                ty: signature.return_type,
            },
            Some(Accessor::Set) => MemberKind::Setter {
                parameter: signature.parameters.into_iter().next(),
            },
            None => MemberKind::Method {
                signatures: vec![signature],
            },
        };
        self.member(node, kind)
    }

    fn is_constructor(&self, node: Node<'_>) -> bool {
        node.child_by_field_name("name")
            .is_some_and(|name| self.text(name) == "constructor")
    }

    /// `constructor(public id: string, readonly name?: string)`.
    fn parameter_properties(&self, constructor: Node<'_>) -> Vec<ParsedMember> {
        let Some(params) = constructor.child_by_field_name("parameters") else {
            return Vec::new();
        };
        let mut properties = Vec::new();
        let mut cursor = params.walk();
        for param in named_children(params, &mut cursor) {
            let mut inner = param.walk();
            let has_modifier = param.children(&mut inner).any(|child| {
                matches!(
                    child.kind(),
                    "accessibility_modifier" | "override_modifier" | "readonly"
                )
            });
            if !has_modifier {
                continue;
            }
            let Some(parameter) = self.parameter(param) else {
                continue;
            };
            let readonly = {
                let mut inner = param.walk();
                param
                    .children(&mut inner)
                    .any(|child| child.kind() == "readonly")
            };
            properties.push(ParsedMember {
                name: parameter.name,
                optional: param.kind() == "optional_parameter",
                readonly,
                kind: MemberKind::Property { ty: parameter.ty },
                span: node_span(param),
                origin: MemberOrigin::Own,
            });
        }
        properties
    }

    fn modifiers(&self, node: Node<'_>) -> Modifiers {
        let name_start = node
            .child_by_field_name("name")
            .map_or(usize::MAX, |name| name.start_byte());
        let mut modifiers = Modifiers::default();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let before_name = child.start_byte() < name_start;
            match child.kind() {
                "?" if !before_name => modifiers.optional = true,
                "readonly" if before_name => modifiers.readonly = true,
                "static" if before_name => modifiers.is_static = true,
                "async" if before_name => modifiers.is_async = true,
                "get" if before_name && !child.is_named() => modifiers.accessor = Some(Accessor::Get),
                "set" if before_name && !child.is_named() => modifiers.accessor = Some(Accessor::Set),
                _ => {}
            }
        }
        modifiers
    }

    fn property_name(&self, node: Node<'_>) -> String {
        let text = self.text(node);
        if node.kind() == "string" {
            return unquote(text).to_owned();
        }
        crate::types::normalize_whitespace(text)
    }

    // ---------------------------------------------------------------------
    // Signatures
    // ---------------------------------------------------------------------

    /// Any node carrying `type_parameters`, `parameters` and `return_type`.
    fn signature(&self, node: Node<'_>, has_body: bool) -> Signature {
        let return_type = node.child_by_field_name("return_type").and_then(|ret| {
            if node.kind() == "function_type" {
                Some(self.lower_type(ret))
            } else {
                self.annotation(ret)
            }
        });
        let parameters = node
            .child_by_field_name("parameters")
            .map(|params| self.parameters(params))
            .or_else(|| {
                node.child_by_field_name("parameter").map(|param| {
                    vec![Parameter {
                        name: self.text(param).to_owned(),
                        optional: false,
                        rest: false,
                        ty: None,
                    }]
                })
            })
            .unwrap_or_default();

        Signature {
            type_parameters: self.type_parameters(node),
            parameters,
            return_type,
            has_body,
            declared_by_member: false,
        }
    }

    fn parameters(&self, params: Node<'_>) -> Vec<Parameter> {
        let mut cursor = params.walk();
        named_children(params, &mut cursor)
            .filter_map(|param| self.parameter(param))
            .collect()
    }

    fn parameter(&self, param: Node<'_>) -> Option<Parameter> {
        if !matches!(param.kind(), "required_parameter" | "optional_parameter") {
            return None;
        }
        let pattern = param.child_by_field_name("pattern")?;
        if pattern.kind() == "this" {
            return None;
        }
        let (name, rest) = if pattern.kind() == "rest_pattern" {
            let inner = first_named(pattern).map_or("", |inner| self.text(inner));
            (inner.to_owned(), true)
        } else {
            (crate::types::normalize_whitespace(self.text(pattern)), false)
        };
        Some(Parameter {
            name,
            optional: param.kind() == "optional_parameter"
                || param.child_by_field_name("value").is_some(),
            rest,
            ty: param
                .child_by_field_name("type")
                .and_then(|annotation| self.annotation(annotation)),
        })
    }

    /// The type inside a `type_annotation` and its predicate variants.
    fn annotation(&self, annotation: Node<'_>) -> Option<TypeNode> {
        match annotation.kind() {
            "type_annotation" => first_named(annotation).map(|ty| self.lower_type(ty)),
            "type_predicate_annotation" => Some(TypeNode::new(
                TypeKind::Keyword("boolean".to_owned()),
                self.text(annotation).trim_start_matches(':'),
            )),
            "asserts_annotation" => Some(TypeNode::keyword("void")),
            _ => Some(self.lower_type(annotation)),
        }
    }

    fn type_arguments(&self, node: Node<'_>) -> Vec<TypeNode> {
        let mut cursor = node.walk();
        named_children(node, &mut cursor)
            .map(|ty| self.lower_type(ty))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------------

    /// Lowers any type node.
    pub(crate) fn lower_type(&self, node: Node<'_>) -> TypeNode {
        let text = self.text(node);
        let kind = match node.kind() {
            "parenthesized_type" => {
                return first_named(node).map_or_else(
                    || TypeNode::new(TypeKind::Unsupported, text),
                    |inner| self.lower_type(inner),
                );
            }
            "predefined_type" => TypeKind::Keyword(text.to_owned()),
            "type_identifier" | "nested_type_identifier" | "identifier" => TypeKind::Reference {
                name: crate::types::normalize_whitespace(text),
                arguments: Vec::new(),
            },
            "generic_type" => TypeKind::Reference {
                name: node
                    .child_by_field_name("name")
                    .map(|name| crate::types::normalize_whitespace(self.text(name)))
                    .unwrap_or_default(),
                arguments: node
                    .child_by_field_name("type_arguments")
                    .map(|args| self.type_arguments(args))
                    .unwrap_or_default(),
            },
            "array_type" => match first_named(node) {
                Some(element) => TypeKind::Array(Box::new(self.lower_type(element))),
                None => TypeKind::Unsupported,
            },
            "readonly_type" => {
                return match first_named(node).map(|inner| self.lower_type(inner)) {
                    Some(inner) => TypeNode::new(inner.kind().clone(), text),
                    None => TypeNode::new(TypeKind::Unsupported, text),
                };
            }
            "tuple_type" => {
                let mut cursor = node.walk();
                TypeKind::Tuple(
                    named_children(node, &mut cursor)
                        .map(|member| self.tuple_member(member))
                        .collect(),
                )
            }
            "union_type" => TypeKind::Union(self.flatten(node, "union_type")),
            "intersection_type" => TypeKind::Intersection(self.flatten(node, "intersection_type")),
            "function_type" => TypeKind::Function(Box::new(self.signature(node, false))),
            "object_type" => TypeKind::Object(self.object_members(node)),
            "lookup_type" => {
                let mut cursor = node.walk();
                let mut operands = named_children(node, &mut cursor);
                match (operands.next(), operands.next()) {
                    (Some(object), Some(index)) => TypeKind::IndexedAccess {
                        object: Box::new(self.lower_type(object)),
                        index: Box::new(self.lower_type(index)),
                    },
                    _ => TypeKind::Unsupported,
                }
            }
            "literal_type" => match first_named(node).map(|literal| literal.kind()) {
                Some("null" | "undefined") => TypeKind::Keyword(text.to_owned()),
                _ => TypeKind::Literal(text.to_owned()),
            },
            "this_type" => TypeKind::This,
            "type_predicate" => TypeKind::Keyword("boolean".to_owned()),
            "existential_type" => TypeKind::Keyword("any".to_owned()),
            _ => TypeKind::Unsupported,
        };
        TypeNode::new(kind, text)
    }

    fn tuple_member(&self, member: Node<'_>) -> TypeNode {
        match member.kind() {
            "tuple_parameter" | "optional_tuple_parameter" => member
                .child_by_field_name("type")
                .and_then(|annotation| self.annotation(annotation))
                .unwrap_or_else(|| TypeNode::keyword("any")),
            "optional_type" | "rest_type" => first_named(member)
                .map_or_else(|| TypeNode::keyword("any"), |inner| self.lower_type(inner)),
            _ => self.lower_type(member),
        }
    }

    /// Operands of nested binary `|`/`&` types, left to right.
    ///
    /// The grammar nests `a | b | c` as a left-leaning chain, one node per
    /// operator, so this walks with an explicit stack instead of recursing.
    fn flatten(&self, node: Node<'_>, kind: &str) -> Vec<TypeNode> {
        let mut operands = Vec::new();
        let mut pending = vec![node];
        let mut cursor = node.walk();
        while let Some(current) = pending.pop() {
            if current.kind() == kind {
                let children: Vec<Node<'_>> = named_children(current, &mut cursor).collect();
                pending.extend(children.into_iter().rev());
            } else {
                operands.push(self.lower_type(current));
            }
        }
        operands
    }

    // ---------------------------------------------------------------------
    // Inference
    // ---------------------------------------------------------------------

    /// Type of an untyped field from its initializer expression.
    fn infer_expression(&self, value: Node<'_>) -> TypeNode {
        match value.kind() {
            "string" | "template_string" => TypeNode::keyword("string"),
            "number" => TypeNode::keyword("number"),
            "true" | "false" => TypeNode::keyword("boolean"),
            "regex" => TypeNode::reference("RegExp", Vec::new()),
            "object" => TypeNode::keyword("object"),
            "unary_expression" => match value.child_by_field_name("argument").map(|a| a.kind()) {
                Some("number") => TypeNode::keyword("number"),
                _ => TypeNode::keyword("any"),
            },
            "new_expression" => {
                let Some(constructor) = value.child_by_field_name("constructor") else {
                    return TypeNode::keyword("any");
                };
                let arguments = value
                    .child_by_field_name("type_arguments")
                    .map(|args| self.type_arguments(args))
                    .unwrap_or_default();
                TypeNode::reference(
                    crate::types::normalize_whitespace(self.text(constructor)),
                    arguments,
                )
            }
            "array" => {
                let element = first_named(value)
                    .map_or_else(|| TypeNode::keyword("any"), |first| self.infer_expression(first));
                TypeNode::synthesized(TypeKind::Array(Box::new(element)))
            }
            "arrow_function" | "function_expression" | "function" => {
                let mut signature = self.signature(value, true);
                if signature.return_type.is_none() {
                    let returns_value = value.child_by_field_name("body").is_some_and(|body| {
                        body.kind() != "statement_block" || has_return_value(body)
                    });
                    let ret = if returns_value { "any" } else { "void" };
                    signature.return_type = Some(TypeNode::keyword(ret));
                }
                TypeNode::synthesized(TypeKind::Function(Box::new(signature)))
            }
            "as_expression" => {
                let mut cursor = value.walk();
                named_children(value, &mut cursor)
                    .nth(1)
                    .map_or_else(|| TypeNode::keyword("any"), |ty| self.lower_type(ty))
            }
            "satisfies_expression" | "parenthesized_expression" => first_named(value)
                .map_or_else(|| TypeNode::keyword("any"), |inner| self.infer_expression(inner)),
            _ => TypeNode::keyword("any"),
        }
    }
}

/// Modifier tokens of a member declaration.
#[derive(Debug, Default, Clone, Copy)]
struct Modifiers {
    optional: bool,
    readonly: bool,
    is_static: bool,
    is_async: bool,
    accessor: Option<Accessor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accessor {
    Get,
    Set,
}

/// Adds a member to a single declaration body. A repeated method name adds
/// an overload; any other repeated name is ignored.
fn push_member(members: &mut Vec<ParsedMember>, member: Option<ParsedMember>) {
    let Some(member) = member else {
        return;
    };
    let Some(existing) = members.iter_mut().find(|m| m.name == member.name) else {
        members.push(member);
        return;
    };
    match (&mut existing.kind, member.kind) {
        (MemberKind::Method { signatures }, MemberKind::Method { signatures: more }) => {
            signatures.extend(more.into_iter().map(|mut signature| {
                signature.declared_by_member = false;
                signature
            }));
        }
        _ => tracing::trace!(member = %member.name, "skipping member already declared"),
    }
}

/// Returns `true` if a function body contains `return <expr>`, ignoring
/// nested functions and classes.
fn has_return_value(body: Node<'_>) -> bool {
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        if node.kind() == "return_statement" && first_named(node).is_some() {
            return true;
        }
        let mut cursor = node.walk();
        for child in named_children(node, &mut cursor) {
            if !FUNCTION_BOUNDARIES.contains(&child.kind()) {
                stack.push(child);
            }
        }
    }
    false
}

/// Named children, skipping comments.
pub(crate) fn named_children<'tree, 'c>(
    node: Node<'tree>,
    cursor: &'c mut tree_sitter::TreeCursor<'tree>,
) -> impl Iterator<Item = Node<'tree>> + 'c
where
    'tree: 'c,
{
    node.named_children(cursor)
        .filter(|child| child.kind() != "comment")
}

/// First named child that is not a comment.
fn first_named(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let first = named_children(node, &mut cursor).next();
    first
}

/// Extracts the text content of a node.
fn node_text<'a>(node: Node<'_>, source: &'a [u8]) -> Option<&'a str> {
    let start = node.start_byte();
    let end = node.end_byte();
    std::str::from_utf8(source.get(start..end)?).ok()
}

/// Converts a node's range to a [`SourceSpan`].
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn node_span(node: Node<'_>) -> SourceSpan {
    let start = node.start_position();
    let end = node.end_position();
    SourceSpan::new(
        SourceLocation::new(start.row as u32 + 1, start.column as u32, node.start_byte() as u32),
        SourceLocation::new(end.row as u32 + 1, end.column as u32, node.end_byte() as u32),
    )
}

fn unquote(text: &str) -> &str {
    text.strip_prefix(['"', '\''])
        .and_then(|rest| rest.strip_suffix(['"', '\'']))
        .unwrap_or(text)
}
