use asn1rt_core::{Error, Result, TypeKind, TypeModule, TypeNode, validate_module};
use tracing::debug;

use crate::model::{Check, CheckRule, FieldPath, PathSegment, SizeUnit, ValidationPlan};

/// Validate `module` and compile the plan for one of its type assignments.
pub fn compile(module: &TypeModule, type_name: &str) -> Result<ValidationPlan> {
    validate_module(module)?;
    compile_unchecked(module, type_name)
}

/// Compile a plan for a type of a module already accepted by `validate_module`.
pub fn compile_unchecked(module: &TypeModule, type_name: &str) -> Result<ValidationPlan> {
    let assignment = module.require(type_name)?;
    let mut plan = compile_node(module, &assignment.ty)?;
    plan.type_name = assignment.name.clone();
    debug!(
        module = %module.name,
        type_name = %assignment.name,
        checks = plan.checks.len(),
        "compiled validation plan"
    );
    Ok(plan)
}

/// Compile the plan for an arbitrary node; references resolve against `module`.
pub fn compile_node(module: &TypeModule, node: &TypeNode) -> Result<ValidationPlan> {
    let mut compiler = PlanCompiler {
        module,
        checks: Vec::new(),
        expanding: Vec::new(),
    };
    let mut path = FieldPath::root();
    compiler.visit(node, &mut path)?;
    Ok(ValidationPlan {
        type_name: String::new(),
        root_id: module.resolve(node)?.id,
        checks: compiler.checks,
    })
}

struct PlanCompiler<'a> {
    module: &'a TypeModule,
    checks: Vec<Check>,
    // References currently being inlined; a repeat means the type is recursive.
    expanding: Vec<&'a str>,
}

impl<'a> PlanCompiler<'a> {
    fn visit(&mut self, node: &'a TypeNode, path: &mut FieldPath) -> Result<()> {
        let rule = match &node.kind {
            TypeKind::Reference(reference) => {
                let target = reference.target.as_str();
                if self.expanding.contains(&target) {
                    return Err(Error::MalformedTypeModel(format!(
                        "{path}: recursive reference to {target}"
                    )));
                }
                let assignment = self.module.require(target)?;
                self.expanding.push(target);
                self.visit(&assignment.ty, path)?;
                self.expanding.pop();
                return Ok(());
            }
            TypeKind::Integer(bounds) => Some(CheckRule::IntegerRange {
                min: bounds.min,
                max: bounds.max,
            }),
            TypeKind::Real(bounds) => Some(CheckRule::RealRange {
                min: bounds.min,
                max: bounds.max,
            }),
            TypeKind::Boolean => Some(CheckRule::IsBoolean),
            TypeKind::Null => Some(CheckRule::IsNull),
            TypeKind::Enumerated(enumerated) => Some(CheckRule::EnumeratedValues {
                values: enumerated.items.iter().map(|item| item.value).collect(),
            }),
            TypeKind::OctetString(size) => Some(CheckRule::Size {
                min_size: size.min_size,
                max_size: size.max_size,
                unit: SizeUnit::Bytes,
            }),
            TypeKind::BitString(size) => Some(CheckRule::Size {
                min_size: size.min_size,
                max_size: size.max_size,
                unit: SizeUnit::Bits,
            }),
            TypeKind::Ia5String(size) => Some(CheckRule::CharacterString {
                min_size: size.min_size,
                max_size: size.max_size,
            }),
            TypeKind::SequenceOf(sequence_of) => {
                path.push(PathSegment::Element);
                self.visit(&sequence_of.element, path)?;
                path.pop();
                Some(CheckRule::Size {
                    min_size: sequence_of.min_size,
                    max_size: sequence_of.max_size,
                    unit: SizeUnit::Elements,
                })
            }
            TypeKind::Sequence(sequence) => {
                for field in &sequence.fields {
                    path.push(PathSegment::Field(field.name.clone()));
                    self.visit(&field.ty, path)?;
                    path.pop();
                }
                Some(CheckRule::MandatoryFields {
                    mandatory: sequence
                        .fields
                        .iter()
                        .filter(|field| !field.optional)
                        .map(|field| field.name.clone())
                        .collect(),
                    declared: sequence
                        .fields
                        .iter()
                        .map(|field| field.name.clone())
                        .collect(),
                })
            }
            TypeKind::Choice(choice) => {
                for alternative in &choice.alternatives {
                    path.push(PathSegment::Alternative(alternative.name.clone()));
                    self.visit(&alternative.ty, path)?;
                    path.pop();
                }
                Some(CheckRule::SingleAlternative {
                    alternatives: choice
                        .alternatives
                        .iter()
                        .map(|alternative| alternative.name.clone())
                        .collect(),
                })
            }
        };

        // Id 0 means the node carries no check of its own.
        if let Some(rule) = rule
            && !node.id.is_none()
        {
            self.checks.push(Check {
                id: node.id,
                path: path.clone(),
                rule,
            });
        }
        Ok(())
    }
}
