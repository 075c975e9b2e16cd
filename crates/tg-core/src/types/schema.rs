//! Schema fields: the classified members of a model.
//!
//! Every field carries a [`FieldShape`], a closed set of variants tagged by
//! `kind` when serialized. Type payloads are [`TypeRef`]s, which either name
//! a known model or keep the raw type text.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::ModelRef;

/// A type that either resolved to a known model or stayed as text.
///
/// Serialized untagged: a model reference is `{"model": "User"}`, text is a
/// plain JSON string.
///
/// # Examples
///
/// ```
/// use tg_core::TypeRef;
///
/// let user = TypeRef::model("User");
/// assert_eq!(user.as_model().map(|m| m.id()), Some("User"));
/// assert_eq!(serde_json::to_string(&user).unwrap(), r#"{"model":"User"}"#);
///
/// let text = TypeRef::text("string");
/// assert_eq!(serde_json::to_string(&text).unwrap(), r#""string""#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    /// A reference to a top-level declaration known to the parser.
    Model {
        /// The referenced model.
        model: ModelRef,
    },

    /// Raw type text for anything that is not a known declaration.
    Text(String),
}

impl TypeRef {
    /// A reference to the model named `id`.
    #[inline]
    pub fn model(id: impl Into<String>) -> Self {
        Self::Model {
            model: ModelRef::new(id),
        }
    }

    /// Raw type text.
    #[inline]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// The referenced model, if resolved.
    #[inline]
    #[must_use]
    pub const fn as_model(&self) -> Option<&ModelRef> {
        match self {
            Self::Model { model } => Some(model),
            Self::Text(_) => None,
        }
    }

    /// The raw text, if unresolved.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Model { .. } => None,
            Self::Text(text) => Some(text),
        }
    }

    /// Returns `true` if this names a known model.
    #[inline]
    #[must_use]
    pub const fn is_model(&self) -> bool {
        matches!(self, Self::Model { .. })
    }
}

impl From<ModelRef> for TypeRef {
    fn from(model: ModelRef) -> Self {
        Self::Model { model }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model { model } => fmt::Display::fmt(model, f),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionArgument {
    /// Parameter name as written (`...rest` keeps its name without dots).
    pub name: String,

    /// Parameter type.
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl FunctionArgument {
    /// Creates a function argument.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// The return type of a function field.
///
/// A return type that is an array of a known model is kept as a one-element
/// list so "returns `X[]`" stays distinct from "returns `X`".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionReturn {
    /// Array of a known model, serialized as `["X"]`.
    ModelArray([ModelRef; 1]),

    /// Any other return type.
    Type(TypeRef),
}

impl FunctionReturn {
    /// The model this return type references, if any.
    #[must_use]
    pub fn model(&self) -> Option<&ModelRef> {
        match self {
            Self::ModelArray([model]) => Some(model),
            Self::Type(ty) => ty.as_model(),
        }
    }
}

impl fmt::Display for FunctionReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelArray([model]) => write!(f, "{model}[]"),
            Self::Type(ty) => fmt::Display::fmt(ty, f),
        }
    }
}

/// The classified shape of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FieldShape {
    /// Scalar or plain reference.
    Default {
        /// The field type.
        #[serde(rename = "type")]
        ty: TypeRef,
    },

    /// `T[]` or `readonly T[]`.
    Array {
        /// The element type.
        element_type: TypeRef,
    },

    /// A named type with one or more type arguments, e.g. `Map<K, V>`.
    Generic {
        /// The generic's name without module qualification.
        generic_name: String,
        /// Type arguments in order.
        arguments: Vec<TypeRef>,
    },

    /// A callable member.
    Function {
        /// Parameters in order.
        arguments: Vec<FunctionArgument>,
        /// Return type.
        return_type: FunctionReturn,
    },

    /// A union of types.
    Union {
        /// Union members in declaration order.
        types: Vec<TypeRef>,
    },
}

impl FieldShape {
    /// A scalar/reference shape.
    #[inline]
    #[must_use]
    pub const fn scalar(ty: TypeRef) -> Self {
        Self::Default { ty }
    }

    /// An array shape.
    #[inline]
    #[must_use]
    pub const fn array(element_type: TypeRef) -> Self {
        Self::Array { element_type }
    }

    /// The serialized `kind` tag.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Default { .. } => "default",
            Self::Array { .. } => "array",
            Self::Generic { .. } => "generic",
            Self::Function { .. } => "function",
            Self::Union { .. } => "union",
        }
    }

    /// Every model this shape references, in order, duplicates included.
    #[must_use]
    pub fn referenced_models(&self) -> Vec<&ModelRef> {
        match self {
            Self::Default { ty } | Self::Array { element_type: ty } => {
                ty.as_model().into_iter().collect()
            }
            Self::Generic { arguments, .. } => {
                arguments.iter().filter_map(TypeRef::as_model).collect()
            }
            Self::Function {
                arguments,
                return_type,
            } => arguments
                .iter()
                .filter_map(|arg| arg.ty.as_model())
                .chain(return_type.model())
                .collect(),
            Self::Union { types } => types.iter().filter_map(TypeRef::as_model).collect(),
        }
    }
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default { ty } => write!(f, "{ty}"),
            Self::Array { element_type } => write!(f, "{element_type}[]"),
            Self::Generic {
                generic_name,
                arguments,
            } => {
                write!(f, "{generic_name}<")?;
                write_joined(f, arguments, ", ")?;
                f.write_str(">")
            }
            Self::Function {
                arguments,
                return_type,
            } => {
                f.write_str("(")?;
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", arg.name, arg.ty)?;
                }
                write!(f, ") => {return_type}")
            }
            Self::Union { types } => write_joined(f, types, " | "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[TypeRef], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// One classified member of a model.
///
/// # Examples
///
/// ```
/// use tg_core::{FieldShape, SchemaField, TypeRef};
///
/// let field = SchemaField::new("tags", true, FieldShape::array(TypeRef::text("string")));
/// assert_eq!(field.to_string(), "tags?: string[]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaField {
    /// Member name, or [`SchemaField::ALIAS_VALUE`] for a type alias's own type.
    pub name: String,

    /// Whether the member was declared with a trailing `?`.
    pub optional: bool,

    /// The classified shape.
    #[serde(flatten)]
    pub shape: FieldShape,
}

impl SchemaField {
    /// Name of the synthetic field holding a non-object type alias's value.
    pub const ALIAS_VALUE: &'static str = "==>";

    /// Creates a schema field.
    pub fn new(name: impl Into<String>, optional: bool, shape: FieldShape) -> Self {
        Self {
            name: name.into(),
            optional,
            shape,
        }
    }

    /// Returns `true` for the synthetic alias value field.
    #[inline]
    #[must_use]
    pub fn is_alias_value(&self) -> bool {
        self.name == Self::ALIAS_VALUE
    }
}

impl fmt::Display for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.optional { "?" } else { "" };
        write!(f, "{}{marker}: {}", self.name, self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_ref_untagged_round_trip() {
        let refs = vec![TypeRef::model("User"), TypeRef::text("string")];
        let json = serde_json::to_value(&refs).unwrap();
        assert_eq!(json, json!([{ "model": "User" }, "string"]));

        let parsed: Vec<TypeRef> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, refs);
    }

    #[test]
    fn test_field_shape_tags() {
        let field = SchemaField::new(
            "lookup",
            false,
            FieldShape::Generic {
                generic_name: "Map".to_owned(),
                arguments: vec![TypeRef::text("string"), TypeRef::model("User")],
            },
        );
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({
                "name": "lookup",
                "optional": false,
                "kind": "generic",
                "genericName": "Map",
                "arguments": ["string", { "model": "User" }]
            })
        );
    }

    #[test]
    fn test_function_return_model_array() {
        let field = SchemaField::new(
            "list",
            false,
            FieldShape::Function {
                arguments: vec![FunctionArgument::new("limit", TypeRef::text("number"))],
                return_type: FunctionReturn::ModelArray([ModelRef::new("User")]),
            },
        );
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["returnType"], json!(["User"]));
        assert_eq!(field.to_string(), "list: (limit: number) => User[]");

        let parsed: SchemaField = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, field);
    }

    #[test]
    fn test_referenced_models_keeps_duplicates() {
        let shape = FieldShape::Generic {
            generic_name: "Map".to_owned(),
            arguments: vec![TypeRef::model("A"), TypeRef::model("A")],
        };
        assert_eq!(shape.referenced_models().len(), 2);

        let shape = FieldShape::Function {
            arguments: vec![FunctionArgument::new("a", TypeRef::model("A"))],
            return_type: FunctionReturn::Type(TypeRef::model("B")),
        };
        let ids: Vec<_> = shape.referenced_models().into_iter().map(ModelRef::id).collect();
        assert_eq!(ids, ["A", "B"]);
    }

    #[test]
    fn test_union_display() {
        let field = SchemaField::new(
            SchemaField::ALIAS_VALUE,
            false,
            FieldShape::Union {
                types: vec![TypeRef::text("\"a\""), TypeRef::model("B")],
            },
        );
        assert!(field.is_alias_value());
        assert_eq!(field.to_string(), "==>: \"a\" | B");
    }
}
