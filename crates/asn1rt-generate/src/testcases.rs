use asn1rt_core::{
    Error, IntegerBounds, RealBounds, SizeBounds, TypeKind, TypeModule, TypeNode, Value,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::errors::GenerationError;
use crate::initializer::to_len;
use crate::model::{TestCase, TestCaseOptions, TestCaseReport};

/// Draws random instances that satisfy every declared constraint.
///
/// Every case gets its own RNG seeded from the base seed, the type name and
/// the case index, so a single case can be replayed without the others.
#[derive(Debug, Clone)]
pub struct TestCaseGenerator<'a> {
    module: &'a TypeModule,
    options: TestCaseOptions,
}

impl<'a> TestCaseGenerator<'a> {
    pub fn new(module: &'a TypeModule, options: TestCaseOptions) -> Result<Self, GenerationError> {
        for (name, probability) in [
            ("optional_presence", options.optional_presence),
            ("boundary_bias", options.boundary_bias),
        ] {
            if !(0.0..=1.0).contains(&probability) {
                return Err(GenerationError::InvalidOptions(format!(
                    "{name} must be within 0..=1, got {probability}"
                )));
            }
        }
        Ok(Self { module, options })
    }

    pub fn options(&self) -> &TestCaseOptions {
        &self.options
    }

    /// Seed used for case `index` of `type_name`.
    pub fn case_seed(&self, type_name: &str, index: u64) -> u64 {
        hash_case_seed(hash_seed(self.options.seed, type_name), index)
    }

    /// Generate `count` instances of a type assignment.
    pub fn generate(&self, type_name: &str, count: u64) -> Result<Vec<Value>, GenerationError> {
        let assignment = self.module.require(type_name)?;
        let mut values = Vec::new();
        for index in 0..count {
            let mut rng = ChaCha8Rng::seed_from_u64(self.case_seed(type_name, index));
            values.push(self.value(&assignment.ty, &mut rng)?);
        }
        info!(
            type_name = %type_name,
            count,
            seed = self.options.seed,
            "generated test cases"
        );
        Ok(values)
    }

    /// Generate cases and render them as JSON.
    pub fn report(&self, type_name: &str, count: u64) -> Result<TestCaseReport, GenerationError> {
        let assignment = self.module.require(type_name)?;
        let values = self.generate(type_name, count)?;
        let mut cases = Vec::with_capacity(values.len());
        for (index, value) in (0_u64..).zip(values) {
            cases.push(TestCase {
                index,
                seed: self.case_seed(type_name, index),
                value: value.to_json(self.module, &assignment.ty)?,
            });
        }
        Ok(TestCaseReport {
            type_name: assignment.name.clone(),
            seed: self.options.seed,
            cases,
        })
    }

    /// Draw one instance of `node` from `rng`.
    pub fn value<R: Rng>(
        &self,
        node: &TypeNode,
        rng: &mut R,
    ) -> Result<Value, GenerationError> {
        let mut expanding = Vec::new();
        self.draw(node, rng, &mut expanding)
    }

    fn draw<'n, R: Rng>(
        &self,
        node: &'n TypeNode,
        rng: &mut R,
        expanding: &mut Vec<&'n str>,
    ) -> Result<Value, GenerationError>
    where
        'a: 'n,
    {
        let value = match &node.kind {
            TypeKind::Integer(bounds) => Value::Integer(self.draw_integer(bounds, rng)),
            TypeKind::Real(bounds) => Value::Real(self.draw_real(bounds, rng)),
            TypeKind::Boolean => Value::Boolean(rng.random_bool(0.5)),
            TypeKind::Null => Value::Null,
            TypeKind::Enumerated(enumerated) => {
                if enumerated.items.is_empty() {
                    return Err(Error::MalformedTypeModel(
                        "enumerated type has no items".to_string(),
                    )
                    .into());
                }
                let item = &enumerated.items[rng.random_range(0..enumerated.items.len())];
                Value::Enumerated(item.value)
            }
            TypeKind::OctetString(size) => {
                let len = self.draw_len(size, rng)?;
                Value::OctetString((0..len).map(|_| rng.random::<u8>()).collect())
            }
            TypeKind::BitString(size) => {
                let len = self.draw_len(size, rng)?;
                Value::BitString((0..len).map(|_| rng.random_bool(0.5)).collect())
            }
            TypeKind::Ia5String(size) => {
                let len = self.draw_len(size, rng)?;
                // Printable subset of IA5.
                Value::Ia5String(
                    (0..len)
                        .map(|_| char::from(rng.random_range(0x20_u8..=0x7e)))
                        .collect(),
                )
            }
            TypeKind::SequenceOf(sequence_of) => {
                let len = self.draw_len(&sequence_of.size(), rng)?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.draw(&sequence_of.element, rng, expanding)?);
                }
                Value::SequenceOf(items)
            }
            TypeKind::Sequence(sequence) => {
                let mut fields = Vec::with_capacity(sequence.fields.len());
                for field in &sequence.fields {
                    if field.optional && !rng.random_bool(self.options.optional_presence) {
                        continue;
                    }
                    fields.push((field.name.clone(), self.draw(&field.ty, rng, expanding)?));
                }
                Value::Sequence(fields)
            }
            TypeKind::Choice(choice) => {
                if choice.alternatives.is_empty() {
                    return Err(
                        Error::MalformedTypeModel("choice has no alternatives".to_string()).into(),
                    );
                }
                let pick = rng.random_range(0..choice.alternatives.len());
                let alternative = &choice.alternatives[pick];
                Value::Choice {
                    alternative: alternative.name.clone(),
                    value: Box::new(self.draw(&alternative.ty, rng, expanding)?),
                }
            }
            TypeKind::Reference(reference) => {
                let target = reference.target.as_str();
                if expanding.contains(&target) {
                    return Err(Error::MalformedTypeModel(format!(
                        "recursive reference to {target}"
                    ))
                    .into());
                }
                let assignment = self.module.require(target)?;
                expanding.push(target);
                let value = self.draw(&assignment.ty, rng, expanding)?;
                expanding.pop();
                value
            }
        };
        Ok(value)
    }

    fn draw_integer<R: Rng>(&self, bounds: &IntegerBounds, rng: &mut R) -> i64 {
        if bounds.min == bounds.max {
            return bounds.min;
        }
        if rng.random_bool(self.options.boundary_bias) {
            return if rng.random_bool(0.5) {
                bounds.min
            } else {
                bounds.max
            };
        }
        rng.random_range(bounds.min..=bounds.max)
    }

    fn draw_real<R: Rng>(&self, bounds: &RealBounds, rng: &mut R) -> f64 {
        if bounds.min == bounds.max {
            return bounds.min;
        }
        if rng.random_bool(self.options.boundary_bias) {
            return if rng.random_bool(0.5) {
                bounds.min
            } else {
                bounds.max
            };
        }
        if (bounds.max - bounds.min).is_finite() {
            rng.random_range(bounds.min..=bounds.max)
        } else {
            // Span overflows f64; draw a fraction of one half instead.
            let fraction: f64 = rng.random_range(0.0..=1.0);
            if rng.random_bool(0.5) {
                bounds.min * fraction
            } else {
                bounds.max * fraction
            }
        }
    }

    fn draw_len<R: Rng>(
        &self,
        size: &SizeBounds,
        rng: &mut R,
    ) -> Result<usize, GenerationError> {
        let upper = size
            .max_size
            .min(size.min_size.max(self.options.max_collection_len));
        let len = if size.min_size == upper {
            size.min_size
        } else if rng.random_bool(self.options.boundary_bias) {
            if rng.random_bool(0.5) {
                size.min_size
            } else {
                upper
            }
        } else {
            rng.random_range(size.min_size..=upper)
        };
        debug!(len, min_size = size.min_size, max_size = size.max_size, "drew size");
        Ok(to_len(len)?)
    }
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn hash_case_seed(type_seed: u64, index: u64) -> u64 {
    let hash = type_seed ^ index.wrapping_mul(0x9e3779b97f4a7c15);
    hash.wrapping_mul(0x100000001b3)
}

#[cfg(test)]
mod tests {
    use asn1rt_core::{Alternative, EnumItem, Field, TypeAssignment};

    use super::*;

    fn module() -> TypeModule {
        TypeModule::new(
            "M",
            vec![
                TypeAssignment::new(
                    "Level",
                    TypeNode::enumerated(1, vec![EnumItem::new("low", 1), EnumItem::new("high", 9)]),
                ),
                TypeAssignment::new(
                    "Reading",
                    TypeNode::sequence(
                        26,
                        vec![
                            Field::mandatory("count", TypeNode::integer(6, -3, 3)),
                            Field::mandatory("ratio", TypeNode::real(11, 0.0, 1.0)),
                            Field::optional("name", TypeNode::ia5_string(16, SizeBounds::new(2, 100))),
                            Field::mandatory(
                                "levels",
                                TypeNode::sequence_of(21, SizeBounds::new(1, 3), TypeNode::reference("Level")),
                            ),
                            Field::mandatory(
                                "extra",
                                TypeNode::choice(
                                    31,
                                    vec![
                                        Alternative::new("none", TypeNode::null(0)),
                                        Alternative::new("flag", TypeNode::boolean(0)),
                                    ],
                                ),
                            ),
                        ],
                    ),
                ),
            ],
        )
    }

    fn within_bounds(value: &Value) -> bool {
        let Value::Sequence(fields) = value else {
            return false;
        };
        fields.iter().all(|(name, field)| match (name.as_str(), field) {
            ("count", Value::Integer(count)) => (-3..=3).contains(count),
            ("ratio", Value::Real(ratio)) => (0.0..=1.0).contains(ratio),
            ("name", Value::Ia5String(text)) => {
                (2..=8).contains(&text.len()) && text.chars().all(|c| c.is_ascii_graphic() || c == ' ')
            }
            ("levels", Value::SequenceOf(levels)) => {
                (1..=3).contains(&levels.len())
                    && levels
                        .iter()
                        .all(|level| matches!(level, Value::Enumerated(1) | Value::Enumerated(9)))
            }
            ("extra", Value::Choice { alternative, .. }) => alternative == "none" || alternative == "flag",
            _ => false,
        })
    }

    #[test]
    fn generated_values_stay_within_bounds() {
        let module = module();
        let options = TestCaseOptions {
            max_collection_len: 8,
            ..TestCaseOptions::default()
        };
        let generator = TestCaseGenerator::new(&module, options).expect("generator");
        let values = generator.generate("Reading", 200).expect("generate");
        assert_eq!(values.len(), 200);
        assert!(values.iter().all(within_bounds));
    }

    #[test]
    fn same_seed_same_cases() {
        let module = module();
        let first = TestCaseGenerator::new(&module, TestCaseOptions::default())
            .expect("generator")
            .generate("Reading", 20)
            .expect("generate");
        let second = TestCaseGenerator::new(&module, TestCaseOptions::default())
            .expect("generator")
            .generate("Reading", 20)
            .expect("generate");
        assert_eq!(first, second);

        let other = TestCaseGenerator::new(
            &module,
            TestCaseOptions {
                seed: 7,
                ..TestCaseOptions::default()
            },
        )
        .expect("generator")
        .generate("Reading", 20)
        .expect("generate");
        assert_ne!(first, other);
    }

    #[test]
    fn single_case_replays_from_its_seed() {
        let module = module();
        let generator = TestCaseGenerator::new(&module, TestCaseOptions::default()).expect("generator");
        let values = generator.generate("Reading", 5).expect("generate");
        let mut rng = ChaCha8Rng::seed_from_u64(generator.case_seed("Reading", 3));
        let node = &module.require("Reading").expect("type").ty;
        assert_eq!(generator.value(node, &mut rng).expect("value"), values[3]);
    }

    #[test]
    fn full_range_reals_stay_finite() {
        let module = TypeModule::new("M", Vec::new());
        let generator = TestCaseGenerator::new(
            &module,
            TestCaseOptions {
                boundary_bias: 0.0,
                ..TestCaseOptions::default()
            },
        )
        .expect("generator");
        let node = TypeNode::new(1_u32, TypeKind::Real(RealBounds::unconstrained()));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            match generator.value(&node, &mut rng).expect("value") {
                Value::Real(value) => assert!(value.is_finite()),
                other => panic!("unexpected value: {other:?}"),
            }
        }
    }

    #[test]
    fn oversized_minimum_fails_instead_of_allocating() {
        let module = module();
        let generator =
            TestCaseGenerator::new(&module, TestCaseOptions::default()).expect("generator");
        let node = TypeNode::ia5_string(1, SizeBounds::fixed(u64::MAX));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = generator.value(&node, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Model(Error::MalformedTypeModel(_))
        ));
    }

    #[test]
    fn rejects_probabilities_outside_unit_interval() {
        let module = module();
        let err = TestCaseGenerator::new(
            &module,
            TestCaseOptions {
                optional_presence: 1.5,
                ..TestCaseOptions::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("optional_presence"));
    }
}
