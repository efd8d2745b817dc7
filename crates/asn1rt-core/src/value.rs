use serde_json::{Map, Number, Value as Json};

use crate::error::{Error, Result};
use crate::schema::{TypeModule, TypeNode};
use crate::types::TypeKind;

/// Concrete instance of a schema type.
///
/// Instances are owned and mutated by callers; validation only borrows them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Null,
    /// Numeric value of the selected ENUMERATED item.
    Enumerated(i64),
    OctetString(Vec<u8>),
    BitString(Vec<bool>),
    Ia5String(String),
    SequenceOf(Vec<Value>),
    /// Present components in declaration order; absent OPTIONAL fields are omitted.
    Sequence(Vec<(String, Value)>),
    Choice {
        alternative: String,
        value: Box<Value>,
    },
}

impl Value {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Boolean(_) => "boolean",
            Value::Null => "null",
            Value::Enumerated(_) => "enumerated",
            Value::OctetString(_) => "octet_string",
            Value::BitString(_) => "bit_string",
            Value::Ia5String(_) => "ia5_string",
            Value::SequenceOf(_) => "sequence_of",
            Value::Sequence(_) => "sequence",
            Value::Choice { .. } => "choice",
        }
    }

    /// Component of a SEQUENCE value, if present.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Sequence(fields) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Mutable component of a SEQUENCE value, if present.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        match self {
            Value::Sequence(fields) => fields
                .iter_mut()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Set a SEQUENCE component, replacing it when present and appending otherwise.
    pub fn set_field(&mut self, name: &str, value: Value) -> bool {
        match self {
            Value::Sequence(fields) => {
                match fields.iter_mut().find(|(field, _)| field == name) {
                    Some((_, slot)) => *slot = value,
                    None => fields.push((name.to_string(), value)),
                }
                true
            }
            _ => false,
        }
    }

    /// Remove a SEQUENCE component, returning it when it was present.
    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        match self {
            Value::Sequence(fields) => {
                let idx = fields.iter().position(|(field, _)| field == name)?;
                Some(fields.remove(idx).1)
            }
            _ => None,
        }
    }

    /// Number of elements for sized kinds.
    pub fn size(&self) -> Option<usize> {
        match self {
            Value::OctetString(bytes) => Some(bytes.len()),
            Value::BitString(bits) => Some(bits.len()),
            Value::Ia5String(text) => Some(text.chars().count()),
            Value::SequenceOf(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Short rendering used in diagnostics.
    pub fn summary(&self) -> String {
        match self {
            Value::Integer(value) => value.to_string(),
            Value::Real(value) => value.to_string(),
            Value::Boolean(value) => value.to_string(),
            Value::Null => "NULL".to_string(),
            Value::Enumerated(value) => format!("enumerated({value})"),
            Value::OctetString(bytes) => format!("{} bytes", bytes.len()),
            Value::BitString(bits) => format!("{} bits", bits.len()),
            Value::Ia5String(text) => format!("{:?}", text),
            Value::SequenceOf(items) => format!("{} elements", items.len()),
            Value::Sequence(fields) => format!(
                "{{{}}}",
                fields
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Value::Choice { alternative, .. } => format!("choice({alternative})"),
        }
    }

    /// Build an instance from its JSON form, guided by the type model.
    pub fn from_json(module: &TypeModule, node: &TypeNode, json: &Json) -> Result<Value> {
        parse_json(module, node, json, "$")
    }

    /// Render an instance as JSON, guided by the type model.
    pub fn to_json(&self, module: &TypeModule, node: &TypeNode) -> Result<Json> {
        render_json(module, node, self, "$")
    }

    /// Copy with SEQUENCE components in declaration order at every level.
    ///
    /// Undeclared components follow the declared ones in their original order.
    pub fn normalized(&self, module: &TypeModule, node: &TypeNode) -> Result<Value> {
        normalize(module, node, self)
    }
}

fn normalize(module: &TypeModule, node: &TypeNode, value: &Value) -> Result<Value> {
    let node = module.resolve(node)?;
    let normalized = match (&node.kind, value) {
        (TypeKind::SequenceOf(sequence_of), Value::SequenceOf(items)) => Value::SequenceOf(
            items
                .iter()
                .map(|item| normalize(module, &sequence_of.element, item))
                .collect::<Result<Vec<_>>>()?,
        ),
        (TypeKind::Sequence(sequence), Value::Sequence(fields)) => {
            let mut ordered = Vec::with_capacity(fields.len());
            for field in &sequence.fields {
                for (name, item) in fields.iter().filter(|(name, _)| *name == field.name) {
                    ordered.push((name.clone(), normalize(module, &field.ty, item)?));
                }
            }
            ordered.extend(
                fields
                    .iter()
                    .filter(|(name, _)| sequence.field(name).is_none())
                    .cloned(),
            );
            Value::Sequence(ordered)
        }
        (TypeKind::Choice(choice), Value::Choice { alternative, value: inner }) => {
            match choice.alternative(alternative) {
                Some(declared) => Value::Choice {
                    alternative: alternative.clone(),
                    value: Box::new(normalize(module, &declared.ty, inner)?),
                },
                None => value.clone(),
            }
        }
        _ => value.clone(),
    };
    Ok(normalized)
}

fn parse_json(module: &TypeModule, node: &TypeNode, json: &Json, path: &str) -> Result<Value> {
    let node = module.resolve(node)?;
    match &node.kind {
        TypeKind::Integer(_) => json
            .as_i64()
            .map(Value::Integer)
            .ok_or_else(|| mismatch(path, "an integer", json)),
        TypeKind::Real(_) => json
            .as_f64()
            .map(Value::Real)
            .ok_or_else(|| mismatch(path, "a number", json)),
        TypeKind::Boolean => json
            .as_bool()
            .map(Value::Boolean)
            .ok_or_else(|| mismatch(path, "a boolean", json)),
        TypeKind::Null => {
            if json.is_null() {
                Ok(Value::Null)
            } else {
                Err(mismatch(path, "null", json))
            }
        }
        TypeKind::Enumerated(enumerated) => {
            let name = json
                .as_str()
                .ok_or_else(|| mismatch(path, "an enumerated item name", json))?;
            enumerated
                .item_by_name(name)
                .map(|item| Value::Enumerated(item.value))
                .ok_or_else(|| {
                    Error::InvalidValue(format!("{path}: unknown enumerated item '{name}'"))
                })
        }
        TypeKind::OctetString(_) => {
            let text = json
                .as_str()
                .ok_or_else(|| mismatch(path, "a hex string", json))?;
            hex::decode(text)
                .map(Value::OctetString)
                .map_err(|err| Error::InvalidValue(format!("{path}: {err}")))
        }
        TypeKind::BitString(_) => {
            let text = json
                .as_str()
                .ok_or_else(|| mismatch(path, "a string of '0'/'1'", json))?;
            text.chars()
                .map(|ch| match ch {
                    '0' => Ok(false),
                    '1' => Ok(true),
                    other => Err(Error::InvalidValue(format!(
                        "{path}: unexpected bit character '{other}'"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::BitString)
        }
        TypeKind::Ia5String(_) => json
            .as_str()
            .map(|text| Value::Ia5String(text.to_string()))
            .ok_or_else(|| mismatch(path, "a string", json)),
        TypeKind::SequenceOf(sequence_of) => {
            let items = json
                .as_array()
                .ok_or_else(|| mismatch(path, "an array", json))?;
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    parse_json(module, &sequence_of.element, item, &format!("{path}[{idx}]"))
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::SequenceOf)
        }
        TypeKind::Sequence(sequence) => {
            let object = json
                .as_object()
                .ok_or_else(|| mismatch(path, "an object", json))?;
            for key in object.keys() {
                if sequence.field(key).is_none() {
                    return Err(Error::InvalidValue(format!("{path}: unknown field '{key}'")));
                }
            }
            // Missing mandatory fields are left for validation to report.
            let mut fields = Vec::with_capacity(sequence.fields.len());
            for field in &sequence.fields {
                if let Some(item) = object.get(&field.name) {
                    let value =
                        parse_json(module, &field.ty, item, &format!("{path}.{}", field.name))?;
                    fields.push((field.name.clone(), value));
                }
            }
            Ok(Value::Sequence(fields))
        }
        TypeKind::Choice(choice) => {
            let object = json
                .as_object()
                .ok_or_else(|| mismatch(path, "a single-key object", json))?;
            let mut entries = object.iter();
            let (name, item) = match (entries.next(), entries.next()) {
                (Some(entry), None) => entry,
                _ => return Err(mismatch(path, "a single-key object", json)),
            };
            let alternative = choice.alternative(name).ok_or_else(|| {
                Error::InvalidValue(format!("{path}: unknown alternative '{name}'"))
            })?;
            let value = parse_json(module, &alternative.ty, item, &format!("{path}.{name}"))?;
            Ok(Value::Choice {
                alternative: name.clone(),
                value: Box::new(value),
            })
        }
        TypeKind::Reference(_) => Err(Error::MalformedTypeModel(format!(
            "{path}: unresolved reference"
        ))),
    }
}

fn render_json(module: &TypeModule, node: &TypeNode, value: &Value, path: &str) -> Result<Json> {
    let node = module.resolve(node)?;
    match (&node.kind, value) {
        (TypeKind::Integer(_), Value::Integer(value)) => Ok(Json::from(*value)),
        (TypeKind::Real(_), Value::Real(value)) => Number::from_f64(*value)
            .map(Json::Number)
            .ok_or_else(|| Error::InvalidValue(format!("{path}: {value} is not representable"))),
        (TypeKind::Boolean, Value::Boolean(value)) => Ok(Json::Bool(*value)),
        (TypeKind::Null, Value::Null) => Ok(Json::Null),
        (TypeKind::Enumerated(enumerated), Value::Enumerated(value)) => enumerated
            .item_by_value(*value)
            .map(|item| Json::String(item.name.clone()))
            .ok_or_else(|| {
                Error::InvalidValue(format!("{path}: {value} is not a declared item"))
            }),
        (TypeKind::OctetString(_), Value::OctetString(bytes)) => Ok(Json::String(hex::encode(bytes))),
        (TypeKind::BitString(_), Value::BitString(bits)) => Ok(Json::String(
            bits.iter().map(|bit| if *bit { '1' } else { '0' }).collect(),
        )),
        (TypeKind::Ia5String(_), Value::Ia5String(text)) => Ok(Json::String(text.clone())),
        (TypeKind::SequenceOf(sequence_of), Value::SequenceOf(items)) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                render_json(module, &sequence_of.element, item, &format!("{path}[{idx}]"))
            })
            .collect::<Result<Vec<_>>>()
            .map(Json::Array),
        (TypeKind::Sequence(sequence), Value::Sequence(_)) => {
            let mut object = Map::new();
            for field in &sequence.fields {
                if let Some(item) = value.field(&field.name) {
                    let rendered =
                        render_json(module, &field.ty, item, &format!("{path}.{}", field.name))?;
                    object.insert(field.name.clone(), rendered);
                }
            }
            Ok(Json::Object(object))
        }
        (TypeKind::Choice(choice), Value::Choice { alternative, value }) => {
            let declared = choice.alternative(alternative).ok_or_else(|| {
                Error::InvalidValue(format!("{path}: unknown alternative '{alternative}'"))
            })?;
            let rendered =
                render_json(module, &declared.ty, value, &format!("{path}.{alternative}"))?;
            let mut object = Map::new();
            object.insert(alternative.clone(), rendered);
            Ok(Json::Object(object))
        }
        (kind, value) => Err(Error::InvalidValue(format!(
            "{path}: expected {} value, found {}",
            kind.label(),
            value.kind_label()
        ))),
    }
}

fn mismatch(path: &str, expected: &str, found: &Json) -> Error {
    Error::InvalidValue(format!("{path}: expected {expected}, found {found}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::constraints::{EnumItem, SizeBounds};
    use crate::schema::TypeAssignment;
    use crate::types::{Alternative, Field};

    fn module() -> TypeModule {
        TypeModule::new(
            "Test",
            vec![
                TypeAssignment::new(
                    "Color",
                    TypeNode::enumerated(1, vec![EnumItem::new("red", 0), EnumItem::new("green", 1)]),
                ),
                TypeAssignment::new(
                    "Record",
                    TypeNode::sequence(
                        20,
                        vec![
                            Field::mandatory("id", TypeNode::integer(6, 0, 100)),
                            Field::optional("color", TypeNode::reference("Color")),
                            Field::mandatory(
                                "payload",
                                TypeNode::octet_string(11, SizeBounds::new(0, 4)),
                            ),
                            Field::mandatory(
                                "pick",
                                TypeNode::choice(
                                    16,
                                    vec![
                                        Alternative::new("flag", TypeNode::boolean(0)),
                                        Alternative::new("bits", TypeNode::bit_string(17, SizeBounds::fixed(3))),
                                    ],
                                ),
                            ),
                        ],
                    ),
                ),
            ],
        )
    }

    #[test]
    fn parses_sequence_in_declaration_order() {
        let module = module();
        let record = &module.require("Record").expect("record").ty;
        let json = json!({"pick": {"bits": "101"}, "payload": "0aff", "id": 7, "color": "green"});

        let value = Value::from_json(&module, record, &json).expect("parse");
        let names: Vec<_> = match &value {
            Value::Sequence(fields) => fields.iter().map(|(name, _)| name.as_str()).collect(),
            other => panic!("unexpected value {other:?}"),
        };
        assert_eq!(names, vec!["id", "color", "payload", "pick"]);
        assert_eq!(value.field("color"), Some(&Value::Enumerated(1)));
        assert_eq!(value.field("payload"), Some(&Value::OctetString(vec![0x0a, 0xff])));

        let rendered = value.to_json(&module, record).expect("render");
        assert_eq!(rendered, json);
    }

    #[test]
    fn leaves_missing_mandatory_field_for_validation() {
        let module = module();
        let record = &module.require("Record").expect("record").ty;
        let value = Value::from_json(&module, record, &json!({"id": 1})).expect("parse");
        assert_eq!(value, Value::Sequence(vec![("id".to_string(), Value::Integer(1))]));
    }

    #[test]
    fn rejects_unknown_field_and_wrong_shape() {
        let module = module();
        let record = &module.require("Record").expect("record").ty;
        let err = Value::from_json(&module, record, &json!({"nope": 1})).unwrap_err();
        assert!(err.to_string().contains("unknown field 'nope'"));

        let err = Value::from_json(&module, record, &json!({"id": "seven"})).unwrap_err();
        assert!(err.to_string().contains("$.id: expected an integer"));
    }

    #[test]
    fn normalized_restores_declaration_order() {
        let module = module();
        let record = &module.require("Record").expect("record").ty;
        let json = json!({"id": 7, "color": "green", "payload": "0aff"});
        let parsed = Value::from_json(&module, record, &json).expect("parse");

        let mut shuffled = parsed.clone();
        let id = shuffled.remove_field("id").expect("id");
        shuffled.set_field("id", id);
        assert_ne!(shuffled, parsed);
        assert_eq!(shuffled.normalized(&module, record).expect("normalize"), parsed);
    }

    #[test]
    fn set_and_remove_field() {
        let mut value = Value::Sequence(vec![("a".to_string(), Value::Integer(1))]);
        assert!(value.set_field("a", Value::Integer(2)));
        assert!(value.set_field("b", Value::Boolean(true)));
        assert_eq!(value.field("a"), Some(&Value::Integer(2)));
        assert_eq!(value.remove_field("b"), Some(Value::Boolean(true)));
        assert_eq!(value.field("b"), None);
    }
}
