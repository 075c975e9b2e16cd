//! Models: one per uniquely named top-level declaration.
//!
//! A [`Model`] is keyed by its declaration name. Graph edges
//! (`dependencies`/`dependants`) hold [`ModelRef`]s rather than owned
//! models, so the list returned by extraction is a flat, serializable
//! snapshot whose references are resolved with [`find_model`].

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::schema::{SchemaField, TypeRef};

/// A reference to a model by its stable, name-based identity.
///
/// # Examples
///
/// ```
/// use tg_core::ModelRef;
///
/// let user = ModelRef::new("User");
/// assert_eq!(user.id(), "User");
/// assert_eq!(user, *"User");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelRef(String);

impl ModelRef {
    /// Creates a reference to the model named `id`.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The referenced model's id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ModelRef {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ModelRef {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for ModelRef {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModelRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The closed set of declaration kinds a model can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelType {
    /// An `interface` declaration.
    Interface,
    /// A `type` alias.
    TypeAlias,
    /// A `class` declaration.
    Class,
}

impl ModelType {
    /// The tag used in serialized output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interface => "interface",
            Self::TypeAlias => "typeAlias",
            Self::Class => "class",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific data of a model, tagged by `type` when serialized.
///
/// Supertypes are [`TypeRef::Model`] when they name a known declaration
/// and [`TypeRef::Text`] otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModelKind {
    /// Interface with its accumulated `extends` clauses.
    Interface {
        /// Supertypes, in declaration order across merged declarations.
        extends: Vec<TypeRef>,
    },

    /// Type alias.
    TypeAlias,

    /// Class with an optional base class and implemented interfaces.
    Class {
        /// The `extends` base class, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extends: Option<TypeRef>,
        /// The `implements` clause.
        implements: Vec<TypeRef>,
    },
}

impl ModelKind {
    /// An interface without supertypes.
    #[inline]
    #[must_use]
    pub const fn interface() -> Self {
        Self::Interface {
            extends: Vec::new(),
        }
    }

    /// A type alias.
    #[inline]
    #[must_use]
    pub const fn type_alias() -> Self {
        Self::TypeAlias
    }

    /// A class without a base class or implemented interfaces.
    #[inline]
    #[must_use]
    pub const fn class() -> Self {
        Self::Class {
            extends: None,
            implements: Vec::new(),
        }
    }

    /// The discriminant of this kind.
    #[must_use]
    pub const fn model_type(&self) -> ModelType {
        match self {
            Self::Interface { .. } => ModelType::Interface,
            Self::TypeAlias => ModelType::TypeAlias,
            Self::Class { .. } => ModelType::Class,
        }
    }

    /// Every supertype reference, `extends` before `implements`.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeRef> {
        let (extends, implements): (&[TypeRef], &[TypeRef]) = match self {
            Self::Interface { extends } => (extends.as_slice(), &[]),
            Self::TypeAlias => (&[], &[]),
            Self::Class {
                extends,
                implements,
            } => (extends.as_slice(), implements.as_slice()),
        };
        extends.iter().chain(implements)
    }
}

/// A generic type parameter, e.g. `T extends Base`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeParameter {
    /// Parameter name.
    pub name: String,

    /// Constraint text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
}

impl TypeParameter {
    /// Creates a type parameter.
    pub fn new(name: impl Into<String>, extends: Option<String>) -> Self {
        Self {
            name: name.into(),
            extends,
        }
    }
}

/// One named top-level declaration with its schema and graph edges.
///
/// # Examples
///
/// ```
/// use tg_core::{FieldShape, Model, ModelKind, ModelRef, ModelType, SchemaField, TypeRef};
///
/// let mut tree = Model::new("Node", ModelKind::interface());
/// tree.schema.push(SchemaField::new(
///     "children",
///     false,
///     FieldShape::array(TypeRef::model("Node")),
/// ));
/// tree.dependencies.push(ModelRef::new("Node"));
///
/// assert_eq!(tree.model_type(), ModelType::Interface);
/// assert!(tree.depends_on("Node"));
/// assert!(tree.field("children").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Stable identity; always equal to `name`.
    pub id: String,

    /// Declaration name.
    pub name: String,

    /// Kind-specific data.
    #[serde(flatten)]
    pub kind: ModelKind,

    /// Generic type parameters in declaration order.
    pub arguments: Vec<TypeParameter>,

    /// Classified fields in declaration order.
    pub schema: Vec<SchemaField>,

    /// Models this model references, without duplicates.
    pub dependencies: Vec<ModelRef>,

    /// Models referencing this model, without duplicates.
    pub dependants: Vec<ModelRef>,
}

impl Model {
    /// Creates an empty model stub named `name`.
    pub fn new(name: impl Into<String>, kind: ModelKind) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            kind,
            arguments: Vec::new(),
            schema: Vec::new(),
            dependencies: Vec::new(),
            dependants: Vec::new(),
        }
    }

    /// The discriminant of this model's kind.
    #[inline]
    #[must_use]
    pub const fn model_type(&self) -> ModelType {
        self.kind.model_type()
    }

    /// A reference to this model.
    #[must_use]
    pub fn to_ref(&self) -> ModelRef {
        ModelRef::new(self.id.as_str())
    }

    /// Returns `true` if `id` is among this model's dependencies.
    #[must_use]
    pub fn depends_on(&self, id: &str) -> bool {
        self.dependencies.iter().any(|dep| dep == id)
    }

    /// Returns `true` if `id` is among this model's dependants.
    #[must_use]
    pub fn is_depended_on_by(&self, id: &str) -> bool {
        self.dependants.iter().any(|dep| dep == id)
    }

    /// Looks up a schema field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.schema.iter().find(|field| field.name == name)
    }
}

/// Finds the model with the given id in an extracted model list.
#[must_use]
pub fn find_model<'a>(models: &'a [Model], id: &str) -> Option<&'a Model> {
    models.iter().find(|model| model.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldShape;

    #[test]
    fn test_model_new_uses_name_as_id() {
        let model = Model::new("User", ModelKind::type_alias());
        assert_eq!(model.id, "User");
        assert_eq!(model.name, "User");
        assert_eq!(model.model_type(), ModelType::TypeAlias);
    }

    #[test]
    fn test_model_type_display() {
        assert_eq!(ModelType::Interface.to_string(), "interface");
        assert_eq!(ModelType::TypeAlias.to_string(), "typeAlias");
        assert_eq!(ModelType::Class.to_string(), "class");
    }

    #[test]
    fn test_supertypes_order() {
        let kind = ModelKind::Class {
            extends: Some(TypeRef::model("Base")),
            implements: vec![TypeRef::text("Serializable"), TypeRef::model("Named")],
        };
        let names: Vec<_> = kind.supertypes().map(ToString::to_string).collect();
        assert_eq!(names, ["Base", "Serializable", "Named"]);
    }

    #[test]
    fn test_find_model() {
        let models = vec![
            Model::new("A", ModelKind::interface()),
            Model::new("B", ModelKind::class()),
        ];
        assert_eq!(find_model(&models, "B").map(Model::model_type), Some(ModelType::Class));
        assert!(find_model(&models, "C").is_none());
    }

    #[test]
    fn test_interface_serialization_shape() {
        let mut model = Model::new("A", ModelKind::interface());
        model
            .schema
            .push(SchemaField::new("a", false, FieldShape::scalar(TypeRef::text("string"))));

        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "A",
                "name": "A",
                "type": "interface",
                "extends": [],
                "arguments": [],
                "schema": [{ "name": "a", "optional": false, "kind": "default", "type": "string" }],
                "dependencies": [],
                "dependants": []
            })
        );
    }

    #[test]
    fn test_class_round_trip() {
        let mut model = Model::new(
            "Dog",
            ModelKind::Class {
                extends: Some(TypeRef::model("Animal")),
                implements: vec![TypeRef::text("Pet")],
            },
        );
        model.arguments.push(TypeParameter::new("T", Some("object".to_owned())));
        model.dependencies.push(ModelRef::new("Animal"));

        let json = serde_json::to_string(&model).unwrap();
        let parsed: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(model, parsed);
    }
}
