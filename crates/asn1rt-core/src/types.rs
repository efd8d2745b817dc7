use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{EnumItem, IntegerBounds, RealBounds, SizeBounds};
use crate::schema::TypeNode;

/// Kind of a schema type together with its declared bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    /// Signed INTEGER with an inclusive value range.
    Integer(IntegerBounds),
    /// REAL with an inclusive value range.
    Real(RealBounds),
    Boolean,
    Null,
    Enumerated(EnumeratedType),
    /// OCTET STRING; size counted in bytes.
    OctetString(SizeBounds),
    /// BIT STRING; size counted in bits.
    BitString(SizeBounds),
    /// IA5String; size counted in characters.
    Ia5String(SizeBounds),
    SequenceOf(SequenceOfType),
    Sequence(SequenceType),
    Choice(ChoiceType),
    /// Named reference to another type assignment in the same module.
    Reference(ReferenceType),
}

impl TypeKind {
    /// Short kind label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            TypeKind::Integer(_) => "integer",
            TypeKind::Real(_) => "real",
            TypeKind::Boolean => "boolean",
            TypeKind::Null => "null",
            TypeKind::Enumerated(_) => "enumerated",
            TypeKind::OctetString(_) => "octet_string",
            TypeKind::BitString(_) => "bit_string",
            TypeKind::Ia5String(_) => "ia5_string",
            TypeKind::SequenceOf(_) => "sequence_of",
            TypeKind::Sequence(_) => "sequence",
            TypeKind::Choice(_) => "choice",
            TypeKind::Reference(_) => "reference",
        }
    }

    /// Whether a node of this kind must carry its own constraint id.
    pub fn requires_check(&self) -> bool {
        !matches!(
            self,
            TypeKind::Boolean | TypeKind::Null | TypeKind::Reference(_)
        )
    }
}

/// ENUMERATED item list in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnumeratedType {
    pub items: Vec<EnumItem>,
}

impl EnumeratedType {
    pub fn item_by_value(&self, value: i64) -> Option<&EnumItem> {
        self.items.iter().find(|item| item.value == value)
    }

    pub fn item_by_name(&self, name: &str) -> Option<&EnumItem> {
        self.items.iter().find(|item| item.name == name)
    }
}

/// SEQUENCE OF with size bounds and an element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SequenceOfType {
    pub min_size: u64,
    pub max_size: u64,
    pub element: Box<TypeNode>,
}

impl SequenceOfType {
    pub fn size(&self) -> SizeBounds {
        SizeBounds::new(self.min_size, self.max_size)
    }
}

/// SEQUENCE: ordered fields. Declaration order is wire order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SequenceType {
    pub fields: Vec<Field>,
}

impl SequenceType {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// CHOICE: exactly one alternative is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChoiceType {
    pub alternatives: Vec<Alternative>,
}

impl ChoiceType {
    pub fn alternative(&self, name: &str) -> Option<&Alternative> {
        self.alternatives.iter().find(|alt| alt.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceType {
    pub target: String,
}

/// Named SEQUENCE component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Field {
    pub name: String,
    /// OPTIONAL components may be absent from an instance.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    #[serde(rename = "type")]
    pub ty: TypeNode,
}

impl Field {
    pub fn mandatory(name: impl Into<String>, ty: TypeNode) -> Self {
        Self {
            name: name.into(),
            optional: false,
            ty,
        }
    }

    pub fn optional(name: impl Into<String>, ty: TypeNode) -> Self {
        Self {
            name: name.into(),
            optional: true,
            ty,
        }
    }
}

/// Named CHOICE alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Alternative {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeNode,
}

impl Alternative {
    pub fn new(name: impl Into<String>, ty: TypeNode) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}
