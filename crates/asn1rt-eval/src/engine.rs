use std::ops::ControlFlow;

use asn1rt_core::Value;
use asn1rt_plan::{Check, CheckRule, FieldPath, PathSegment, SizeUnit, ValidationPlan};
use tracing::debug;

use crate::errors::ConstraintViolation;

/// Flat pass/fail form of a validation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOutcome {
    error_code: u32,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.error_code == 0
    }

    /// Failing constraint id, or 0 when the instance is valid.
    pub fn error_code(&self) -> u32 {
        self.error_code
    }
}

impl From<&Result<(), ConstraintViolation>> for ValidationOutcome {
    fn from(result: &Result<(), ConstraintViolation>) -> Self {
        Self {
            error_code: result.as_ref().err().map_or(0, ConstraintViolation::error_code),
        }
    }
}

/// Check `value` against `plan`, stopping at the first violated check.
///
/// The instance is walked depth first in declaration order: a component
/// failure is reported before the aggregate check of the composite that
/// holds it, and every check of element `i` runs before element `i + 1`.
pub fn validate(plan: &ValidationPlan, value: &Value) -> Result<(), ConstraintViolation> {
    let mut first = None;
    let _ = walk(&plan.checks, 0, value, &mut Vec::new(), &mut |check, indices, found| {
        first = Some(violation(check, indices, found));
        ControlFlow::Break(())
    });
    match first {
        Some(violation) => {
            debug!(
                type_name = %plan.type_name,
                id = %violation.id,
                path = %violation.path,
                "validation failed"
            );
            Err(violation)
        }
        None => Ok(()),
    }
}

/// Same as [`validate`] in the flat form.
pub fn validate_outcome(plan: &ValidationPlan, value: &Value) -> ValidationOutcome {
    ValidationOutcome::from(&validate(plan, value))
}

/// Every violation in walk order; the first one is what `validate` reports.
pub fn validate_all(plan: &ValidationPlan, value: &Value) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();
    let _ = walk(&plan.checks, 0, value, &mut Vec::new(), &mut |check, indices, found| {
        violations.push(violation(check, indices, found));
        ControlFlow::Continue(())
    });
    violations
}

// `checks` all share the first `depth` path segments, which lead to `value`.
// Plans are post-order, so the checks below one component form a contiguous
// run; each run is evaluated against that component before moving on, and a
// `[*]` run is evaluated element by element. Absent optional fields and
// unselected alternatives reach nothing.
fn walk<F>(
    checks: &[Check],
    depth: usize,
    value: &Value,
    indices: &mut Vec<usize>,
    visit: &mut F,
) -> ControlFlow<()>
where
    F: FnMut(&Check, &[usize], String) -> ControlFlow<()>,
{
    let mut rest = checks;
    while let Some(check) = rest.first() {
        let Some(segment) = check.path.segments().get(depth) else {
            if let Err(found) = satisfies(&check.rule, value) {
                visit(check, &indices[..], found)?;
            }
            rest = &rest[1..];
            continue;
        };
        let run = rest
            .iter()
            .take_while(|next| next.path.segments().get(depth) == Some(segment))
            .count();
        let (block, tail) = rest.split_at(run);
        match (segment, value) {
            (PathSegment::Field(name), Value::Sequence(_)) => {
                if let Some(field) = value.field(name) {
                    walk(block, depth + 1, field, indices, visit)?;
                }
            }
            (PathSegment::Alternative(name), Value::Choice { alternative, value }) => {
                if alternative == name {
                    walk(block, depth + 1, value, indices, visit)?;
                }
            }
            (PathSegment::Element, Value::SequenceOf(items)) => {
                for (idx, item) in items.iter().enumerate() {
                    indices.push(idx);
                    let flow = walk(block, depth + 1, item, indices, visit);
                    indices.pop();
                    flow?;
                }
            }
            // The enclosing composite's own check reports the shape mismatch.
            _ => {}
        }
        rest = tail;
    }
    ControlFlow::Continue(())
}

fn violation(check: &Check, indices: &[usize], found: String) -> ConstraintViolation {
    ConstraintViolation {
        id: check.id,
        path: concrete_path(&check.path, indices),
        rule: check.rule.clone(),
        found,
    }
}

fn concrete_path(path: &FieldPath, indices: &[usize]) -> String {
    let mut rendered = String::from("$");
    let mut indices = indices.iter();
    for segment in path.segments() {
        match segment {
            PathSegment::Field(name) => {
                rendered.push('.');
                rendered.push_str(name);
            }
            PathSegment::Alternative(name) => {
                rendered.push_str("::");
                rendered.push_str(name);
            }
            PathSegment::Element => match indices.next() {
                Some(idx) => rendered.push_str(&format!("[{idx}]")),
                None => rendered.push_str("[*]"),
            },
        }
    }
    rendered
}

/// `Err` carries a rendering of what was found instead.
fn satisfies(rule: &CheckRule, value: &Value) -> Result<(), String> {
    match (rule, value) {
        (CheckRule::IntegerRange { min, max }, Value::Integer(found)) => {
            check(min <= found && found <= max, || found.to_string())
        }
        (CheckRule::RealRange { min, max }, Value::Real(found)) => {
            check(*min <= *found && *found <= *max, || found.to_string())
        }
        (
            CheckRule::Size {
                min_size,
                max_size,
                unit,
            },
            value,
        ) => {
            let len = match (unit, value) {
                (SizeUnit::Bytes, Value::OctetString(bytes)) => bytes.len(),
                (SizeUnit::Bits, Value::BitString(bits)) => bits.len(),
                (SizeUnit::Elements, Value::SequenceOf(items)) => items.len(),
                _ => return Err(wrong_kind(value)),
            };
            let len = len as u64;
            check(*min_size <= len && len <= *max_size, || format!("{len} {unit}"))
        }
        (CheckRule::CharacterString { min_size, max_size }, Value::Ia5String(text)) => {
            if let Some(bad) = text.chars().find(|c| !c.is_ascii()) {
                return Err(format!("non-IA5 character {bad:?}"));
            }
            let len = text.chars().count() as u64;
            check(*min_size <= len && len <= *max_size, || {
                format!("{len} characters")
            })
        }
        (CheckRule::EnumeratedValues { values }, Value::Enumerated(found)) => {
            check(values.contains(found), || format!("enumerated({found})"))
        }
        (CheckRule::IsBoolean, Value::Boolean(_)) | (CheckRule::IsNull, Value::Null) => Ok(()),
        (CheckRule::MandatoryFields { mandatory, declared }, Value::Sequence(fields)) => {
            if let Some(missing) = mandatory
                .iter()
                .find(|name| !fields.iter().any(|(field, _)| field == *name))
            {
                return Err(format!("missing component '{missing}'"));
            }
            if let Some((extra, _)) = fields.iter().find(|(field, _)| !declared.contains(field)) {
                return Err(format!("undeclared component '{extra}'"));
            }
            for (idx, (name, _)) in fields.iter().enumerate() {
                if fields[..idx].iter().any(|(earlier, _)| earlier == name) {
                    return Err(format!("duplicate component '{name}'"));
                }
            }
            Ok(())
        }
        (CheckRule::SingleAlternative { alternatives }, Value::Choice { alternative, .. }) => {
            check(alternatives.contains(alternative), || {
                format!("undeclared alternative '{alternative}'")
            })
        }
        (_, value) => Err(wrong_kind(value)),
    }
}

fn check(ok: bool, found: impl FnOnce() -> String) -> Result<(), String> {
    if ok { Ok(()) } else { Err(found()) }
}

fn wrong_kind(value: &Value) -> String {
    format!("{} value {}", value.kind_label(), value.summary())
}

#[cfg(test)]
mod tests {
    use asn1rt_core::{ConstraintId, Field, SizeBounds, TypeAssignment, TypeModule, TypeNode};
    use asn1rt_plan::compile;

    use super::*;

    fn message_plan() -> ValidationPlan {
        let module = TypeModule::new(
            "sample",
            vec![TypeAssignment::new(
                "Message",
                TypeNode::sequence(
                    26,
                    vec![
                        Field::mandatory("msgId", TypeNode::integer(1, 0, 65535)),
                        Field::mandatory("myflag", TypeNode::integer(6, 1, 10)),
                        Field::mandatory("value", TypeNode::real(11, -1000.0, 1000.0)),
                        Field::mandatory(
                            "szDescription",
                            TypeNode::octet_string(16, SizeBounds::fixed(10)),
                        ),
                        Field::mandatory("isReady", TypeNode::boolean(21)),
                    ],
                ),
            )],
        );
        compile(&module, "Message").expect("compile")
    }

    fn message(msg_id: i64, myflag: i64, description_len: usize) -> Value {
        Value::Sequence(vec![
            ("msgId".to_string(), Value::Integer(msg_id)),
            ("myflag".to_string(), Value::Integer(myflag)),
            ("value".to_string(), Value::Real(0.5)),
            (
                "szDescription".to_string(),
                Value::OctetString(vec![b'x'; description_len]),
            ),
            ("isReady".to_string(), Value::Boolean(true)),
        ])
    }

    #[test]
    fn valid_message_passes() {
        let plan = message_plan();
        assert_eq!(validate(&plan, &message(7, 3, 10)), Ok(()));
        let outcome = validate_outcome(&plan, &message(7, 3, 10));
        assert!(outcome.is_valid());
        assert_eq!(outcome.error_code(), 0);
    }

    #[test]
    fn out_of_range_field_reports_its_id() {
        let plan = message_plan();
        let violation = validate(&plan, &message(7, 0, 10)).unwrap_err();
        assert_eq!(violation.id, ConstraintId(6));
        assert_eq!(violation.path, "$.myflag");
        assert_eq!(violation.found, "0");
        assert_eq!(
            violation.to_string(),
            "constraint 6 violated at $.myflag: expected value in 1..10, found 0"
        );
    }

    #[test]
    fn earliest_failing_check_wins() {
        let plan = message_plan();
        let violation = validate(&plan, &message(70000, 3, 9)).unwrap_err();
        assert_eq!(violation.error_code(), 1);

        let all = validate_all(&plan, &message(70000, 3, 9));
        let ids: Vec<u32> = all.iter().map(ConstraintViolation::error_code).collect();
        assert_eq!(ids, vec![1, 16]);
        assert_eq!(all[0], violation);
    }

    #[test]
    fn wrong_kind_fails_the_check() {
        let plan = message_plan();
        let mut value = message(7, 3, 10);
        value.set_field("msgId", Value::Real(7.0));
        let violation = validate(&plan, &value).unwrap_err();
        assert_eq!(violation.id, ConstraintId(1));
        assert_eq!(violation.found, "real value 7");
    }

    #[test]
    fn missing_component_fails_the_aggregate() {
        let plan = message_plan();
        let mut value = message(7, 3, 10);
        value.remove_field("isReady");
        let violation = validate(&plan, &value).unwrap_err();
        assert_eq!(violation.id, ConstraintId(26));
        assert_eq!(violation.path, "$");
        assert_eq!(violation.found, "missing component 'isReady'");
    }

    #[test]
    fn undeclared_component_fails_the_aggregate() {
        let plan = message_plan();
        let mut value = message(7, 3, 10);
        value.set_field("extra", Value::Null);
        let violation = validate(&plan, &value).unwrap_err();
        assert_eq!(violation.id, ConstraintId(26));
        assert_eq!(violation.found, "undeclared component 'extra'");
    }

    #[test]
    fn element_paths_are_rendered_with_indices() {
        let module = TypeModule::new(
            "M",
            vec![TypeAssignment::new(
                "Batch",
                TypeNode::sequence(
                    11,
                    vec![Field::mandatory(
                        "codes",
                        TypeNode::sequence_of(6, SizeBounds::new(0, 8), TypeNode::integer(1, 0, 9)),
                    )],
                ),
            )],
        );
        let plan = compile(&module, "Batch").expect("compile");
        let value = Value::Sequence(vec![(
            "codes".to_string(),
            Value::SequenceOf(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
                Value::Integer(12),
            ]),
        )]);
        let violation = validate(&plan, &value).unwrap_err();
        assert_eq!(violation.id, ConstraintId(1));
        assert_eq!(violation.path, "$.codes[3]");
    }

    #[test]
    fn elements_are_checked_one_at_a_time() {
        let module = TypeModule::new(
            "M",
            vec![TypeAssignment::new(
                "Pairs",
                TypeNode::sequence_of(
                    16,
                    SizeBounds::new(0, 4),
                    TypeNode::sequence(
                        11,
                        vec![
                            Field::mandatory("a", TypeNode::integer(1, 0, 9)),
                            Field::mandatory("b", TypeNode::integer(6, 0, 9)),
                        ],
                    ),
                ),
            )],
        );
        let plan = compile(&module, "Pairs").expect("compile");
        let pair = |a, b| {
            Value::Sequence(vec![
                ("a".to_string(), Value::Integer(a)),
                ("b".to_string(), Value::Integer(b)),
            ])
        };
        let value = Value::SequenceOf(vec![pair(0, 99), pair(99, 0)]);

        let violation = validate(&plan, &value).unwrap_err();
        assert_eq!(violation.id, ConstraintId(6));
        assert_eq!(violation.path, "$[0].b");

        let all = validate_all(&plan, &value);
        let found: Vec<(u32, &str)> = all
            .iter()
            .map(|v| (v.error_code(), v.path.as_str()))
            .collect();
        assert_eq!(found, vec![(6, "$[0].b"), (1, "$[1].a")]);
        assert_eq!(all[0], violation);
    }

    #[test]
    fn collection_size_is_checked_after_its_elements() {
        let module = TypeModule::new(
            "M",
            vec![TypeAssignment::new(
                "Codes",
                TypeNode::sequence_of(6, SizeBounds::new(0, 2), TypeNode::integer(1, 0, 9)),
            )],
        );
        let plan = compile(&module, "Codes").expect("compile");
        let value = Value::SequenceOf(vec![Value::Integer(1), Value::Integer(2), Value::Integer(30)]);
        let ids: Vec<u32> = validate_all(&plan, &value)
            .iter()
            .map(ConstraintViolation::error_code)
            .collect();
        assert_eq!(ids, vec![1, 6]);
        assert_eq!(validate(&plan, &value).unwrap_err().path, "$[2]");
    }

    #[test]
    fn ia5_rejects_eight_bit_characters() {
        let module = TypeModule::new(
            "M",
            vec![TypeAssignment::new(
                "Name",
                TypeNode::ia5_string(1, SizeBounds::new(0, 8)),
            )],
        );
        let plan = compile(&module, "Name").expect("compile");
        assert!(validate(&plan, &Value::Ia5String("plain".to_string())).is_ok());
        let violation = validate(&plan, &Value::Ia5String("café".to_string())).unwrap_err();
        assert_eq!(violation.found, "non-IA5 character 'é'");
    }
}
