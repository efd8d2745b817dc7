use std::fmt;
use std::str::FromStr;

use asn1rt_core::ConstraintId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One step from a value to one of its components.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Named SEQUENCE component.
    Field(String),
    /// Named CHOICE alternative; matches only when that alternative is selected.
    Alternative(String),
    /// Every element of a SEQUENCE OF.
    Element,
}

/// Location of the values a check applies to, relative to the plan root.
///
/// Rendered as `$`, `.field`, `::alternative` and `[*]`, e.g.
/// `$::command.addresses[*]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            match segment {
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Alternative(name) => write!(f, "::{name}")?,
                PathSegment::Element => f.write_str("[*]")?,
            }
        }
        Ok(())
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for FieldPath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for FieldPath {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut rest = text
            .strip_prefix('$')
            .ok_or_else(|| format!("path must start with '$': {text}"))?;
        let mut segments = Vec::new();

        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix("[*]") {
                segments.push(PathSegment::Element);
                rest = tail;
                continue;
            }
            let (is_alternative, tail) = if let Some(tail) = rest.strip_prefix("::") {
                (true, tail)
            } else if let Some(tail) = rest.strip_prefix('.') {
                (false, tail)
            } else {
                return Err(format!("unexpected path segment in {text}"));
            };
            let end = tail.find(['.', ':', '[']).unwrap_or(tail.len());
            if end == 0 {
                return Err(format!("empty path segment in {text}"));
            }
            let name = tail[..end].to_string();
            segments.push(if is_alternative {
                PathSegment::Alternative(name)
            } else {
                PathSegment::Field(name)
            });
            rest = &tail[end..];
        }

        Ok(Self(segments))
    }
}

impl JsonSchema for FieldPath {
    fn schema_name() -> String {
        "FieldPath".to_string()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(generator)
    }
}

/// What a size is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SizeUnit {
    Bytes,
    Bits,
    Elements,
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SizeUnit::Bytes => "bytes",
            SizeUnit::Bits => "bits",
            SizeUnit::Elements => "elements",
        };
        f.write_str(label)
    }
}

/// Declared bound checked by a plan entry, with its limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CheckRule {
    IntegerRange { min: i64, max: i64 },
    RealRange { min: f64, max: f64 },
    Size {
        min_size: u64,
        max_size: u64,
        unit: SizeUnit,
    },
    /// IA5 size range plus the 7-bit character set.
    CharacterString { min_size: u64, max_size: u64 },
    EnumeratedValues { values: Vec<i64> },
    IsBoolean,
    IsNull,
    /// Every mandatory component present and no undeclared component.
    MandatoryFields {
        mandatory: Vec<String>,
        declared: Vec<String>,
    },
    /// Exactly one declared alternative selected.
    SingleAlternative { alternatives: Vec<String> },
}

impl fmt::Display for CheckRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckRule::IntegerRange { min, max } => write!(f, "value in {min}..{max}"),
            CheckRule::RealRange { min, max } => write!(f, "value in {min}..{max}"),
            CheckRule::Size {
                min_size,
                max_size,
                unit,
            } => {
                if min_size == max_size {
                    write!(f, "SIZE({min_size}) {unit}")
                } else {
                    write!(f, "SIZE({min_size}..{max_size}) {unit}")
                }
            }
            CheckRule::CharacterString { min_size, max_size } => {
                write!(f, "IA5 characters, SIZE({min_size}..{max_size})")
            }
            CheckRule::EnumeratedValues { values } => {
                let values: Vec<_> = values.iter().map(|value| value.to_string()).collect();
                write!(f, "one of {{{}}}", values.join(", "))
            }
            CheckRule::IsBoolean => f.write_str("boolean value"),
            CheckRule::IsNull => f.write_str("NULL value"),
            CheckRule::MandatoryFields { mandatory, .. } => {
                write!(f, "components present: {}", mandatory.join(", "))
            }
            CheckRule::SingleAlternative { alternatives } => {
                write!(f, "one alternative of: {}", alternatives.join(", "))
            }
        }
    }
}

/// Atomic check tagged with its constraint id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Check {
    pub id: ConstraintId,
    pub path: FieldPath,
    #[serde(flatten)]
    pub rule: CheckRule,
}

/// Ordered checks for one type: depth-first, declaration order, components
/// before the composite that contains them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationPlan {
    /// Type assignment the plan was compiled from.
    pub type_name: String,
    /// Id of the root node's own check (0 when it has none).
    pub root_id: ConstraintId,
    pub checks: Vec<Check>,
}

impl ValidationPlan {
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Distinct constraint ids in plan order.
    pub fn ids(&self) -> Vec<ConstraintId> {
        let mut ids = Vec::new();
        for check in &self.checks {
            if !ids.contains(&check.id) {
                ids.push(check.id);
            }
        }
        ids
    }

    /// First check in plan order carrying `id`.
    ///
    /// An inlined reference repeats its ids at every use; see [`checks_for`].
    ///
    /// [`checks_for`]: ValidationPlan::checks_for
    pub fn check(&self, id: ConstraintId) -> Option<&Check> {
        self.checks_for(id).next()
    }

    /// Every check carrying `id`, in plan order.
    pub fn checks_for(&self, id: ConstraintId) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(move |check| check.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_round_trips_through_text() {
        let path = FieldPath::from(vec![
            PathSegment::Alternative("command".to_string()),
            PathSegment::Field("addresses".to_string()),
            PathSegment::Element,
        ]);
        let text = path.to_string();
        assert_eq!(text, "$::command.addresses[*]");
        assert_eq!(text.parse::<FieldPath>(), Ok(path));
        assert_eq!("$".parse::<FieldPath>(), Ok(FieldPath::root()));
    }

    #[test]
    fn path_rejects_garbage() {
        assert!("msgId".parse::<FieldPath>().is_err());
        assert!("$..a".parse::<FieldPath>().is_err());
        assert!("$/a".parse::<FieldPath>().is_err());
    }

    #[test]
    fn fixed_size_rule_renders_single_bound() {
        let rule = CheckRule::Size {
            min_size: 10,
            max_size: 10,
            unit: SizeUnit::Bytes,
        };
        assert_eq!(rule.to_string(), "SIZE(10) bytes");
    }
}
