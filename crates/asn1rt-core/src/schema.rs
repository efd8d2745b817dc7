use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{ConstraintId, EnumItem, IntegerBounds, RealBounds, SizeBounds};
use crate::error::{Error, Result};
use crate::types::{
    Alternative, ChoiceType, EnumeratedType, Field, ReferenceType, SequenceOfType, SequenceType,
    TypeKind,
};

/// Compilation unit produced by the schema front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TypeModule {
    /// Contract version for this model format.
    pub module_version: String,
    /// ASN.1 module name.
    pub name: String,
    /// Type assignments in declaration order.
    pub types: Vec<TypeAssignment>,
}

impl TypeModule {
    pub fn new(name: impl Into<String>, types: Vec<TypeAssignment>) -> Self {
        Self {
            module_version: crate::MODEL_VERSION.to_string(),
            name: name.into(),
            types,
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeAssignment> {
        self.types.iter().find(|assignment| assignment.name == name)
    }

    /// Look up a type assignment, failing when the name is not declared.
    pub fn require(&self, name: &str) -> Result<&TypeAssignment> {
        self.get(name)
            .ok_or_else(|| Error::UnknownType(format!("{}.{}", self.name, name)))
    }

    /// Follow reference nodes until a concrete node is reached.
    ///
    /// Callers are expected to have run `validate_module`, which rejects
    /// reference cycles; a chain longer than the module is still reported
    /// as malformed instead of looping.
    pub fn resolve<'a>(&'a self, node: &'a TypeNode) -> Result<&'a TypeNode> {
        let mut current = node;
        for _ in 0..=self.types.len() {
            match &current.kind {
                TypeKind::Reference(reference) => {
                    current = &self.require(&reference.target)?.ty;
                }
                _ => return Ok(current),
            }
        }
        Err(Error::MalformedTypeModel(format!(
            "reference chain does not terminate in module {}",
            self.name
        )))
    }
}

/// A named type definition (`Name ::= Type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TypeAssignment {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeNode,
}

impl TypeAssignment {
    pub fn new(name: impl Into<String>, ty: TypeNode) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// One schema type or field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TypeNode {
    /// Id of this node's own check; `0` when it has none.
    #[serde(default, skip_serializing_if = "is_unconstrained")]
    pub id: ConstraintId,
    #[serde(flatten)]
    pub kind: TypeKind,
}

fn is_unconstrained(id: &ConstraintId) -> bool {
    id.is_none()
}

impl TypeNode {
    pub fn new(id: impl Into<ConstraintId>, kind: TypeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    pub fn integer(id: u32, min: i64, max: i64) -> Self {
        Self::new(id, TypeKind::Integer(IntegerBounds::new(min, max)))
    }

    pub fn real(id: u32, min: f64, max: f64) -> Self {
        Self::new(id, TypeKind::Real(RealBounds::new(min, max)))
    }

    pub fn boolean(id: u32) -> Self {
        Self::new(id, TypeKind::Boolean)
    }

    pub fn null(id: u32) -> Self {
        Self::new(id, TypeKind::Null)
    }

    pub fn enumerated(id: u32, items: Vec<EnumItem>) -> Self {
        Self::new(id, TypeKind::Enumerated(EnumeratedType { items }))
    }

    pub fn octet_string(id: u32, size: SizeBounds) -> Self {
        Self::new(id, TypeKind::OctetString(size))
    }

    pub fn bit_string(id: u32, size: SizeBounds) -> Self {
        Self::new(id, TypeKind::BitString(size))
    }

    pub fn ia5_string(id: u32, size: SizeBounds) -> Self {
        Self::new(id, TypeKind::Ia5String(size))
    }

    pub fn sequence_of(id: u32, size: SizeBounds, element: TypeNode) -> Self {
        Self::new(
            id,
            TypeKind::SequenceOf(SequenceOfType {
                min_size: size.min_size,
                max_size: size.max_size,
                element: Box::new(element),
            }),
        )
    }

    pub fn sequence(id: u32, fields: Vec<Field>) -> Self {
        Self::new(id, TypeKind::Sequence(SequenceType { fields }))
    }

    pub fn choice(id: u32, alternatives: Vec<Alternative>) -> Self {
        Self::new(id, TypeKind::Choice(ChoiceType { alternatives }))
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Self::new(
            ConstraintId::NONE,
            TypeKind::Reference(ReferenceType {
                target: target.into(),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_follows_reference_chain() {
        let module = TypeModule::new(
            "M",
            vec![
                TypeAssignment::new("A", TypeNode::reference("B")),
                TypeAssignment::new("B", TypeNode::integer(1, 0, 9)),
            ],
        );
        let start = TypeNode::reference("A");
        let resolved = module.resolve(&start).expect("resolve");
        assert_eq!(resolved, &TypeNode::integer(1, 0, 9));
    }

    #[test]
    fn resolve_reports_unknown_target() {
        let module = TypeModule::new("M", Vec::new());
        let start = TypeNode::reference("Missing");
        assert!(matches!(
            module.resolve(&start),
            Err(Error::UnknownType(name)) if name == "M.Missing"
        ));
    }

    #[test]
    fn resolve_stops_on_cycle() {
        let module = TypeModule::new(
            "M",
            vec![
                TypeAssignment::new("A", TypeNode::reference("B")),
                TypeAssignment::new("B", TypeNode::reference("A")),
            ],
        );
        let start = TypeNode::reference("A");
        assert!(matches!(
            module.resolve(&start),
            Err(Error::MalformedTypeModel(_))
        ));
    }
}
