use asn1rt_core::{Error, Result, TypeKind, TypeModule, TypeNode, Value};

/// Build the default instance of a named type assignment.
pub fn initialize_type(module: &TypeModule, type_name: &str) -> Result<Value> {
    let assignment = module.require(type_name)?;
    initialize(module, &assignment.ty)
}

/// Build the canonical default instance of `node`.
///
/// Numbers take their lower bound, sized kinds their minimum size filled with
/// zero elements, optional fields are left out and a choice selects its
/// first alternative. The result always passes the node's validation plan.
pub fn initialize(module: &TypeModule, node: &TypeNode) -> Result<Value> {
    let mut expanding = Vec::new();
    init_node(module, node, &mut expanding)
}

fn init_node<'a>(
    module: &'a TypeModule,
    node: &'a TypeNode,
    expanding: &mut Vec<&'a str>,
) -> Result<Value> {
    let value = match &node.kind {
        TypeKind::Integer(bounds) => Value::Integer(bounds.min),
        TypeKind::Real(bounds) => Value::Real(bounds.min),
        TypeKind::Boolean => Value::Boolean(false),
        TypeKind::Null => Value::Null,
        TypeKind::Enumerated(enumerated) => {
            let first = enumerated.items.first().ok_or_else(|| {
                Error::MalformedTypeModel("enumerated type has no items".to_string())
            })?;
            Value::Enumerated(first.value)
        }
        TypeKind::OctetString(size) => Value::OctetString(vec![0; to_len(size.min_size)?]),
        TypeKind::BitString(size) => Value::BitString(vec![false; to_len(size.min_size)?]),
        TypeKind::Ia5String(size) => Value::Ia5String(" ".repeat(to_len(size.min_size)?)),
        TypeKind::SequenceOf(sequence_of) => {
            let len = to_len(sequence_of.min_size)?;
            let mut items = Vec::with_capacity(len);
            if len > 0 {
                let element = init_node(module, &sequence_of.element, expanding)?;
                items.resize(len, element);
            }
            Value::SequenceOf(items)
        }
        TypeKind::Sequence(sequence) => {
            let mut fields = Vec::with_capacity(sequence.fields.len());
            for field in sequence.fields.iter().filter(|field| !field.optional) {
                fields.push((field.name.clone(), init_node(module, &field.ty, expanding)?));
            }
            Value::Sequence(fields)
        }
        TypeKind::Choice(choice) => {
            let first = choice.alternatives.first().ok_or_else(|| {
                Error::MalformedTypeModel("choice has no alternatives".to_string())
            })?;
            Value::Choice {
                alternative: first.name.clone(),
                value: Box::new(init_node(module, &first.ty, expanding)?),
            }
        }
        TypeKind::Reference(reference) => {
            let target = reference.target.as_str();
            if expanding.contains(&target) {
                return Err(Error::MalformedTypeModel(format!(
                    "recursive reference to {target}"
                )));
            }
            let assignment = module.require(target)?;
            expanding.push(target);
            let value = init_node(module, &assignment.ty, expanding)?;
            expanding.pop();
            value
        }
    };
    Ok(value)
}

/// Longest string or collection an instance is built with.
pub const MAX_INSTANCE_LEN: u64 = 1 << 24;

pub(crate) fn to_len(size: u64) -> Result<usize> {
    if size > MAX_INSTANCE_LEN {
        return Err(Error::MalformedTypeModel(format!(
            "size {size} exceeds the instance limit of {MAX_INSTANCE_LEN}"
        )));
    }
    usize::try_from(size)
        .map_err(|_| Error::MalformedTypeModel(format!("size {size} does not fit in memory")))
}

#[cfg(test)]
mod tests {
    use asn1rt_core::{Alternative, EnumItem, Field, SizeBounds, TypeAssignment};

    use super::*;

    #[test]
    fn numbers_take_their_lower_bound() {
        let module = TypeModule::new("M", Vec::new());
        assert_eq!(
            initialize(&module, &TypeNode::integer(1, 5, 9)).expect("init"),
            Value::Integer(5)
        );
        assert_eq!(
            initialize(&module, &TypeNode::real(1, -2.5, 9.0)).expect("init"),
            Value::Real(-2.5)
        );
    }

    #[test]
    fn oversized_minimum_is_rejected() {
        let module = TypeModule::new("M", Vec::new());
        let node = TypeNode::octet_string(1, SizeBounds::fixed(u64::MAX / 2));
        let err = initialize(&module, &node).unwrap_err();
        assert!(matches!(err, Error::MalformedTypeModel(_)));
        assert!(err.to_string().contains("exceeds the instance limit"));

        let node = TypeNode::bit_string(1, SizeBounds::fixed(MAX_INSTANCE_LEN + 1));
        assert!(initialize(&module, &node).is_err());
    }

    #[test]
    fn sized_kinds_use_minimum_size() {
        let module = TypeModule::new("M", Vec::new());
        assert_eq!(
            initialize(&module, &TypeNode::octet_string(1, SizeBounds::fixed(3))).expect("init"),
            Value::OctetString(vec![0, 0, 0])
        );
        assert_eq!(
            initialize(&module, &TypeNode::bit_string(1, SizeBounds::new(2, 8))).expect("init"),
            Value::BitString(vec![false, false])
        );
        assert_eq!(
            initialize(&module, &TypeNode::ia5_string(1, SizeBounds::new(4, 8))).expect("init"),
            Value::Ia5String("    ".to_string())
        );
        assert_eq!(
            initialize(
                &module,
                &TypeNode::sequence_of(6, SizeBounds::new(0, 4), TypeNode::integer(1, 0, 1))
            )
            .expect("init"),
            Value::SequenceOf(Vec::new())
        );
    }

    #[test]
    fn composites_recurse_and_skip_optional_fields() {
        let module = TypeModule::new(
            "M",
            vec![
                TypeAssignment::new(
                    "Color",
                    TypeNode::enumerated(1, vec![EnumItem::new("red", 3), EnumItem::new("blue", 7)]),
                ),
                TypeAssignment::new(
                    "Shape",
                    TypeNode::sequence(
                        16,
                        vec![
                            Field::mandatory("color", TypeNode::reference("Color")),
                            Field::optional("label", TypeNode::ia5_string(6, SizeBounds::new(1, 4))),
                            Field::mandatory(
                                "kind",
                                TypeNode::choice(
                                    11,
                                    vec![
                                        Alternative::new("dot", TypeNode::null(0)),
                                        Alternative::new("flag", TypeNode::boolean(0)),
                                    ],
                                ),
                            ),
                        ],
                    ),
                ),
            ],
        );

        let value = initialize_type(&module, "Shape").expect("init");
        assert_eq!(
            value,
            Value::Sequence(vec![
                ("color".to_string(), Value::Enumerated(3)),
                (
                    "kind".to_string(),
                    Value::Choice {
                        alternative: "dot".to_string(),
                        value: Box::new(Value::Null),
                    }
                ),
            ])
        );
    }

    #[test]
    fn unknown_type_is_reported() {
        let module = TypeModule::new("M", Vec::new());
        assert!(matches!(
            initialize_type(&module, "Missing"),
            Err(Error::UnknownType(_))
        ));
    }
}
