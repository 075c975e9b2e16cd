//! Extraction of [`Model`]s from the declarations of one source buffer.
//!
//! [`ModelParser::get_models`] runs three passes over the parser's current
//! declarations:
//!
//! 1. **Stubs**: one model per distinct name, with generic parameters and
//!    supertypes resolved against the complete set of names.
//! 2. **Fields**: every member is classified by the detector chain
//!    (function, array, generic, union, default) and each model reference
//!    met on the way is collected into the model's dependency set.
//! 3. **Links**: dependency sets become `dependencies` on the model and
//!    `dependants` on each target.
//!
//! Nothing is cached between calls. The result depends only on the parser's
//! current source.

use std::borrow::Cow;

use indexmap::IndexSet;
use tg_core::{
    ExtractConfig, FieldShape, FunctionArgument, FunctionReturn, FxHashMap, Model, ModelKind,
    ModelRef, SchemaField, TypeParameter, TypeRef, hash::fx_hash_map_with_capacity,
};
use tg_ts_parser::{
    Checker, GenericParam, MemberKind, ParseError, ParsedClass, ParsedInterface, ParsedMember,
    ParsedTypeAlias, Parser, Signature, TypeKind, TypeNode, strip_module_qualifier,
};

/// Models one declaration references, in first-reference order.
type Dependencies = IndexSet<ModelRef>;

/// A field classifier. Returns `None` when the type does not have its shape.
///
/// A detector registers dependencies only when it matches.
type Detector = fn(&Extraction<'_>, &TypeNode, &mut Dependencies) -> Option<FieldShape>;

/// Field classifiers in priority order; the first match wins.
///
/// Functions come before generics because a callable type may also be a
/// reference with type arguments.
const DETECTORS: [(&str, Detector); 5] = [
    ("function", detect_function),
    ("array", detect_array),
    ("generic", detect_generic),
    ("union", detect_union),
    ("default", detect_default),
];

/// Extracts the model graph from TypeScript source.
///
/// # Examples
///
/// ```
/// use tg_core::FieldShape;
/// use tg_extract::ModelParser;
///
/// let parser = ModelParser::new("type A = { a: B[] }; type B = { b: string };")?;
/// let models = parser.get_models();
///
/// assert_eq!(models.len(), 2);
/// assert!(matches!(models[0].schema[0].shape, FieldShape::Array { .. }));
/// assert_eq!(models[0].dependencies, ["B"]);
/// assert_eq!(models[1].dependants, ["A"]);
/// # Ok::<(), tg_ts_parser::ParseError>(())
/// ```
#[derive(Debug)]
pub struct ModelParser {
    parser: Parser,
    config: ExtractConfig,
}

impl ModelParser {
    /// Creates a model parser over `source` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the TypeScript parser cannot be set up.
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Self::with_config(source, ExtractConfig::default())
    }

    /// Creates a model parser over `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the TypeScript parser cannot be set up.
    pub fn with_config(source: &str, config: ExtractConfig) -> Result<Self, ParseError> {
        let parser = Parser::with_alias_depth_limit(source, config.alias_depth_limit)?;
        Ok(Self { parser, config })
    }

    /// Replaces the source text.
    pub fn set_source(&mut self, source: &str) {
        self.parser.set_source(source);
    }

    /// The underlying declaration parser.
    #[inline]
    #[must_use]
    pub const fn parser(&self) -> &Parser {
        &self.parser
    }

    /// The extraction options.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Builds the models of the current source.
    ///
    /// Models are ordered interfaces first, then type aliases, then classes,
    /// each in source order. A name declared by more than one kind keeps the
    /// first.
    #[must_use]
    pub fn get_models(&self) -> Vec<Model> {
        let _span = tracing::debug_span!("get_models").entered();

        let mut extraction = Extraction::new(self.parser.checker(), self.config);
        let declarations = extraction.create_stubs(&self.parser);
        let dependencies = extraction.classify_fields(&declarations);
        let models = extraction.link(dependencies);

        tracing::debug!(
            models = models.len(),
            edges = models.iter().map(|m| m.dependencies.len()).sum::<usize>(),
            "extracted models"
        );
        models
    }
}

/// A top-level declaration that becomes a model.
#[derive(Debug, Clone, Copy)]
enum Declaration<'p> {
    Interface(&'p ParsedInterface),
    TypeAlias(&'p ParsedTypeAlias),
    Class(&'p ParsedClass),
}

impl<'p> Declaration<'p> {
    fn name(self) -> &'p str {
        match self {
            Self::Interface(interface) => interface.name.as_str(),
            Self::TypeAlias(alias) => alias.name.as_str(),
            Self::Class(class) => class.name.as_str(),
        }
    }

    fn type_parameters(self) -> &'p [GenericParam] {
        match self {
            Self::Interface(interface) => &interface.type_parameters,
            Self::TypeAlias(alias) => &alias.type_parameters,
            Self::Class(class) => &class.type_parameters,
        }
    }
}

/// A member as the detectors see it: a name, an optional flag and one type.
///
/// Methods and accessors are presented as function types, and a type
/// alias's own value as the synthetic [`SchemaField::ALIAS_VALUE`] member.
struct FieldSource<'a> {
    name: &'a str,
    optional: bool,
    ty: Cow<'a, TypeNode>,
}

impl<'a> FieldSource<'a> {
    fn member(member: &'a ParsedMember) -> Self {
        let ty = match &member.kind {
            MemberKind::Property { ty } => ty
                .as_ref()
                .map_or_else(|| Cow::Owned(TypeNode::keyword("any")), Cow::Borrowed),
            MemberKind::Method { signatures } => {
                let signature = pick_signature(signatures).cloned().unwrap_or_default();
                Cow::Owned(function_type(signature))
            }
            MemberKind::Getter { ty } => Cow::Owned(function_type(Signature {
                return_type: Some(ty.clone().unwrap_or_else(|| TypeNode::keyword("any"))),
                ..Signature::default()
            })),
            MemberKind::Setter { parameter } => Cow::Owned(function_type(Signature {
                parameters: parameter.iter().cloned().collect(),
                return_type: Some(TypeNode::keyword("void")),
                ..Signature::default()
            })),
        };
        Self {
            name: &member.name,
            optional: member.optional,
            ty,
        }
    }

    const fn alias_value(ty: &'a TypeNode) -> Self {
        Self {
            name: SchemaField::ALIAS_VALUE,
            optional: false,
            ty: Cow::Borrowed(ty),
        }
    }
}

/// The signature that represents an overloaded method: the one its own
/// declaration introduces, else one with a body, else the last.
fn pick_signature(signatures: &[Signature]) -> Option<&Signature> {
    signatures
        .iter()
        .find(|s| s.declared_by_member)
        .or_else(|| signatures.iter().find(|s| s.has_body))
        .or_else(|| signatures.last())
}

fn function_type(signature: Signature) -> TypeNode {
    TypeNode::synthesized(TypeKind::Function(Box::new(signature)))
}

/// State of one `get_models` run.
struct Extraction<'p> {
    checker: Checker<'p>,
    config: ExtractConfig,
    models: Vec<Model>,
    index: FxHashMap<String, usize>,
}

impl<'p> Extraction<'p> {
    fn new(checker: Checker<'p>, config: ExtractConfig) -> Self {
        Self {
            checker,
            config,
            models: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    // ---------------------------------------------------------------------
    // Pass 1: stubs
    // ---------------------------------------------------------------------

    /// Creates one model per distinct name and resolves supertypes.
    ///
    /// Returns the declarations in model order.
    fn create_stubs(&mut self, parser: &'p Parser) -> Vec<Declaration<'p>> {
        let include_classes = self.config.include_classes;
        let capacity = parser.interfaces().len() + parser.type_aliases().len() + parser.classes().len();
        self.index = fx_hash_map_with_capacity(capacity);
        self.models.reserve(capacity);

        let candidates = parser
            .interfaces()
            .iter()
            .map(Declaration::Interface)
            .chain(parser.type_aliases().iter().map(Declaration::TypeAlias))
            .chain(
                parser
                    .classes()
                    .iter()
                    .filter(|_| include_classes)
                    .map(Declaration::Class),
            );

        let mut declarations = Vec::new();
        for declaration in candidates {
            let name = declaration.name();
            if self.index.contains_key(name) {
                tracing::debug!(name, "skipping declaration with a name already in use");
                continue;
            }
            let mut model = Model::new(name, ModelKind::type_alias());
            model.arguments = declaration
                .type_parameters()
                .iter()
                .map(|param| {
                    let extends = param.constraint.as_ref().map(|c| self.checker.type_name(c));
                    TypeParameter::new(param.name.as_str(), extends)
                })
                .collect();
            self.index.insert(name.to_owned(), self.models.len());
            self.models.push(model);
            declarations.push(declaration);
        }

        for (i, declaration) in declarations.iter().enumerate() {
            let kind = match declaration {
                Declaration::Interface(interface) => ModelKind::Interface {
                    extends: interface
                        .extends
                        .iter()
                        .map(|ty| self.resolve_supertype(ty))
                        .collect(),
                },
                Declaration::TypeAlias(_) => ModelKind::type_alias(),
                Declaration::Class(class) => ModelKind::Class {
                    extends: class.extends.as_ref().map(|ty| self.resolve_supertype(ty)),
                    implements: class
                        .implements
                        .iter()
                        .map(|ty| self.resolve_supertype(ty))
                        .collect(),
                },
            };
            self.models[i].kind = kind;
        }

        tracing::debug!(stubs = self.models.len(), "created model stubs");
        declarations
    }

    /// A supertype names a model by its base name, type arguments aside.
    fn resolve_supertype(&self, ty: &TypeNode) -> TypeRef {
        let base = ty.reference_name().map(strip_module_qualifier);
        match base {
            Some(name) if self.index.contains_key(&*name) => {
                TypeRef::model(name.into_owned())
            }
            _ => TypeRef::text(strip_module_qualifier(&self.checker.type_name(ty)).into_owned()),
        }
    }

    // ---------------------------------------------------------------------
    // Pass 2: fields
    // ---------------------------------------------------------------------

    /// Fills every model's schema and returns its dependency set.
    fn classify_fields(&mut self, declarations: &[Declaration<'p>]) -> Vec<Dependencies> {
        let mut all = Vec::with_capacity(declarations.len());
        for (i, declaration) in declarations.iter().enumerate() {
            let mut dependencies: Dependencies = self.models[i]
                .kind
                .supertypes()
                .filter_map(TypeRef::as_model)
                .cloned()
                .collect();

            let schema = match declaration {
                Declaration::Interface(interface) => {
                    self.member_fields(&interface.members, &mut dependencies)
                }
                Declaration::Class(class) => self.member_fields(&class.members, &mut dependencies),
                Declaration::TypeAlias(alias) => self.alias_fields(alias, &mut dependencies),
            };
            tracing::trace!(
                model = declaration.name(),
                fields = schema.len(),
                dependencies = dependencies.len(),
                "classified fields"
            );
            self.models[i].schema = schema;
            all.push(dependencies);
        }
        all
    }

    fn member_fields(
        &self,
        members: &[ParsedMember],
        dependencies: &mut Dependencies,
    ) -> Vec<SchemaField> {
        members
            .iter()
            .filter(|member| self.config.inherited_fields || !member.is_inherited())
            .map(|member| self.classify(&FieldSource::member(member), dependencies))
            .collect()
    }

    /// Object-literal aliases get one field per member; every other alias
    /// gets a single [`SchemaField::ALIAS_VALUE`] field.
    fn alias_fields(
        &self,
        alias: &ParsedTypeAlias,
        dependencies: &mut Dependencies,
    ) -> Vec<SchemaField> {
        let declared = &alias.declared;
        match declared.kind() {
            TypeKind::Object(object)
                if !object.members.is_empty() || object.call_signatures.is_empty() =>
            {
                self.member_fields(&object.members, dependencies)
            }
            TypeKind::IndexedAccess { object, .. } => {
                if let Some(base) = self.model_for(object) {
                    dependencies.insert(base);
                }
                match self.checker.resolve_indexed_access(declared) {
                    Some(resolved) => vec![self.alias_value(&resolved, dependencies)],
                    None => vec![self.alias_value(declared, dependencies)],
                }
            }
            _ => vec![self.alias_value(declared, dependencies)],
        }
    }

    /// The synthetic field of a non-object alias: a union of its members,
    /// a plain value, or whatever the detector chain makes of it.
    fn alias_value(&self, ty: &TypeNode, dependencies: &mut Dependencies) -> SchemaField {
        if let Some(members) = self.checker.union_members(ty) {
            let types = members
                .iter()
                .map(|member| self.resolve_type(member, dependencies))
                .collect();
            return SchemaField::new(SchemaField::ALIAS_VALUE, false, FieldShape::Union { types });
        }
        if self.checker.is_value_like(ty) {
            let value = self.resolve_type(ty, dependencies);
            return SchemaField::new(SchemaField::ALIAS_VALUE, false, FieldShape::scalar(value));
        }
        self.classify(&FieldSource::alias_value(ty), dependencies)
    }

    /// Runs the detector chain over one field.
    fn classify(&self, source: &FieldSource<'_>, dependencies: &mut Dependencies) -> SchemaField {
        let shape = DETECTORS
            .iter()
            .find_map(|&(kind, detect)| {
                let shape = detect(self, &source.ty, dependencies)?;
                tracing::trace!(field = source.name, kind, "classified field");
                Some(shape)
            })
            .unwrap_or_else(|| FieldShape::scalar(self.resolve_type(&source.ty, dependencies)));
        SchemaField::new(source.name, source.optional, shape)
    }

    // ---------------------------------------------------------------------
    // Pass 3: links
    // ---------------------------------------------------------------------

    /// Turns dependency sets into `dependencies` and `dependants` lists.
    fn link(self, all: Vec<Dependencies>) -> Vec<Model> {
        let Self {
            mut models, index, ..
        } = self;
        for (i, dependencies) in all.into_iter().enumerate() {
            let dependant = models[i].to_ref();
            for dependency in dependencies {
                if let Some(&target) = index.get(dependency.id()) {
                    models[target].dependants.push(dependant.clone());
                }
                models[i].dependencies.push(dependency);
            }
        }
        models
    }

    // ---------------------------------------------------------------------
    // Name resolution
    // ---------------------------------------------------------------------

    /// The model a type names, if any.
    fn model_for(&self, ty: &TypeNode) -> Option<ModelRef> {
        let name = self.checker.type_name(ty);
        let name = strip_module_qualifier(&name);
        self.index
            .contains_key(&*name)
            .then(|| ModelRef::new(name.into_owned()))
    }

    /// The model an array type holds, if any.
    fn element_model(&self, ty: &TypeNode) -> Option<ModelRef> {
        self.checker
            .array_element(ty)
            .and_then(|element| self.model_for(element))
    }

    /// Resolves a type to a model, registering it as a dependency, or to
    /// its text.
    fn resolve_type(&self, ty: &TypeNode, dependencies: &mut Dependencies) -> TypeRef {
        let name = self.checker.type_name(ty);
        let name = strip_module_qualifier(&name).into_owned();
        if self.index.contains_key(&name) {
            let model = ModelRef::new(name);
            dependencies.insert(model.clone());
            TypeRef::from(model)
        } else {
            TypeRef::Text(name)
        }
    }
}

// -------------------------------------------------------------------------
// Detectors
// -------------------------------------------------------------------------

/// Exactly one call signature: methods, accessors, function types and
/// callable object types.
fn detect_function(
    extraction: &Extraction<'_>,
    ty: &TypeNode,
    dependencies: &mut Dependencies,
) -> Option<FieldShape> {
    let [signature] = extraction.checker.call_signatures(ty) else {
        return None;
    };

    // `X[]` parameters keep their text but still depend on `X`.
    let arguments = signature
        .parameters
        .iter()
        .map(|param| {
            let ty = param.ty.as_ref().map_or_else(
                || TypeRef::text("any"),
                |ty| {
                    if let Some(model) = extraction.element_model(ty) {
                        dependencies.insert(model);
                    }
                    extraction.resolve_type(ty, dependencies)
                },
            );
            FunctionArgument::new(param.name.as_str(), ty)
        })
        .collect();

    let any = TypeNode::keyword("any");
    let returned = signature.return_type.as_ref().unwrap_or(&any);
    let return_type = match extraction.element_model(returned) {
        Some(model) => {
            dependencies.insert(model.clone());
            FunctionReturn::ModelArray([model])
        }
        None => FunctionReturn::Type(extraction.resolve_type(returned, dependencies)),
    };

    Some(FieldShape::Function {
        arguments,
        return_type,
    })
}

/// `T[]` and `readonly T[]`.
fn detect_array(
    extraction: &Extraction<'_>,
    ty: &TypeNode,
    dependencies: &mut Dependencies,
) -> Option<FieldShape> {
    let element = extraction.checker.array_element(ty)?;
    Some(FieldShape::array(extraction.resolve_type(element, dependencies)))
}

/// Any named type with type arguments, `Array<T>` included.
fn detect_generic(
    extraction: &Extraction<'_>,
    ty: &TypeNode,
    dependencies: &mut Dependencies,
) -> Option<FieldShape> {
    let TypeKind::Reference { name, arguments } = ty.kind() else {
        return None;
    };
    if arguments.is_empty() {
        return None;
    }
    Some(FieldShape::Generic {
        generic_name: strip_module_qualifier(name).into_owned(),
        arguments: arguments
            .iter()
            .map(|argument| extraction.resolve_type(argument, dependencies))
            .collect(),
    })
}

/// A union with at least one member naming a model.
fn detect_union(
    extraction: &Extraction<'_>,
    ty: &TypeNode,
    dependencies: &mut Dependencies,
) -> Option<FieldShape> {
    let members = extraction.checker.union_members(ty)?;
    if !members.iter().any(|m| extraction.model_for(m).is_some()) {
        return None;
    }
    Some(FieldShape::Union {
        types: members
            .iter()
            .map(|member| extraction.resolve_type(member, dependencies))
            .collect(),
    })
}

/// Everything else: a model reference or the type's text.
#[allow(clippy::unnecessary_wraps)]
fn detect_default(
    extraction: &Extraction<'_>,
    ty: &TypeNode,
    dependencies: &mut Dependencies,
) -> Option<FieldShape> {
    Some(FieldShape::scalar(extraction.resolve_type(ty, dependencies)))
}
