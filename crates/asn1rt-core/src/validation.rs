use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::graph::build_reference_graph_report;
use crate::schema::{TypeModule, TypeNode};
use crate::types::TypeKind;

/// Validate internal consistency of a type module.
///
/// This checks:
/// - duplicate type, field, alternative and enumerated item names
/// - bounds with `min > max` (and NaN real bounds)
/// - missing or duplicated constraint ids
/// - references to unknown types and recursive types
pub fn validate_module(module: &TypeModule) -> Result<()> {
    let mut names = BTreeSet::new();
    for assignment in &module.types {
        if !names.insert(assignment.name.as_str()) {
            return Err(Error::MalformedTypeModel(format!(
                "duplicate type name: {}.{}",
                module.name, assignment.name
            )));
        }
    }

    let mut ids: BTreeMap<u32, String> = BTreeMap::new();
    for assignment in &module.types {
        validate_node(module, &assignment.ty, &assignment.name, &mut ids)?;
    }

    let report = build_reference_graph_report(module);
    if let Some(cycle) = report.cycle {
        return Err(Error::MalformedTypeModel(format!(
            "recursive types are not supported: {}",
            cycle.join(", ")
        )));
    }

    Ok(())
}

fn validate_node(
    module: &TypeModule,
    node: &TypeNode,
    path: &str,
    ids: &mut BTreeMap<u32, String>,
) -> Result<()> {
    if node.id.is_none() {
        if node.kind.requires_check() {
            return Err(malformed(path, "missing constraint id"));
        }
    } else if let TypeKind::Reference(_) = node.kind {
        return Err(malformed(path, "reference nodes cannot carry a constraint id"));
    } else if let Some(previous) = ids.insert(node.id.get(), path.to_string()) {
        return Err(malformed(
            path,
            &format!("constraint id {} already used by {previous}", node.id),
        ));
    }

    match &node.kind {
        TypeKind::Integer(bounds) => {
            if !bounds.is_consistent() {
                return Err(malformed(
                    path,
                    &format!("integer bounds min {} > max {}", bounds.min, bounds.max),
                ));
            }
        }
        TypeKind::Real(bounds) => {
            if !bounds.is_consistent() {
                return Err(malformed(
                    path,
                    &format!("real bounds [{}, {}] are inconsistent", bounds.min, bounds.max),
                ));
            }
        }
        TypeKind::Boolean | TypeKind::Null => {}
        TypeKind::Enumerated(enumerated) => {
            if enumerated.items.is_empty() {
                return Err(malformed(path, "enumerated type has no items"));
            }
            let mut item_names = BTreeSet::new();
            let mut item_values = BTreeSet::new();
            for item in &enumerated.items {
                if !item_names.insert(item.name.as_str()) {
                    return Err(malformed(
                        path,
                        &format!("duplicate enumerated item name: {}", item.name),
                    ));
                }
                if !item_values.insert(item.value) {
                    return Err(malformed(
                        path,
                        &format!("duplicate enumerated item value: {}", item.value),
                    ));
                }
            }
        }
        TypeKind::OctetString(size) | TypeKind::BitString(size) | TypeKind::Ia5String(size) => {
            if !size.is_consistent() {
                return Err(malformed(
                    path,
                    &format!("size bounds {} > {}", size.min_size, size.max_size),
                ));
            }
        }
        TypeKind::SequenceOf(sequence_of) => {
            let size = sequence_of.size();
            if !size.is_consistent() {
                return Err(malformed(
                    path,
                    &format!("size bounds {} > {}", size.min_size, size.max_size),
                ));
            }
            validate_node(module, &sequence_of.element, &format!("{path}[]"), ids)?;
        }
        TypeKind::Sequence(sequence) => {
            let mut field_names = BTreeSet::new();
            for field in &sequence.fields {
                if !field_names.insert(field.name.as_str()) {
                    return Err(malformed(
                        path,
                        &format!("duplicate field name: {}", field.name),
                    ));
                }
                validate_node(module, &field.ty, &format!("{path}.{}", field.name), ids)?;
            }
        }
        TypeKind::Choice(choice) => {
            if choice.alternatives.is_empty() {
                return Err(malformed(path, "choice has no alternatives"));
            }
            let mut alternative_names = BTreeSet::new();
            for alternative in &choice.alternatives {
                if !alternative_names.insert(alternative.name.as_str()) {
                    return Err(malformed(
                        path,
                        &format!("duplicate alternative name: {}", alternative.name),
                    ));
                }
                validate_node(
                    module,
                    &alternative.ty,
                    &format!("{path}.{}", alternative.name),
                    ids,
                )?;
            }
        }
        TypeKind::Reference(reference) => {
            if module.get(&reference.target).is_none() {
                return Err(malformed(
                    path,
                    &format!("reference to unknown type: {}", reference.target),
                ));
            }
        }
    }

    Ok(())
}

fn malformed(path: &str, message: &str) -> Error {
    Error::MalformedTypeModel(format!("{path}: {message}"))
}
