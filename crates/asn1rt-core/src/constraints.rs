use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Stable identifier of a single constraint within a compilation unit.
///
/// `0` is reserved for "no constraint"; every other value names exactly one
/// checkable bound.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(transparent)]
pub struct ConstraintId(pub u32);

impl ConstraintId {
    /// Reserved id for nodes that carry no check of their own.
    pub const NONE: ConstraintId = ConstraintId(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ConstraintId {
    fn from(value: u32) -> Self {
        ConstraintId(value)
    }
}

/// Inclusive range for signed integer kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IntegerBounds {
    #[serde(default = "integer_min")]
    pub min: i64,
    #[serde(default = "integer_max")]
    pub max: i64,
}

impl IntegerBounds {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Full `i64` range, i.e. an INTEGER without a value constraint.
    pub fn unconstrained() -> Self {
        Self::new(i64::MIN, i64::MAX)
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn is_consistent(&self) -> bool {
        self.min <= self.max
    }
}

impl Default for IntegerBounds {
    fn default() -> Self {
        Self::unconstrained()
    }
}

fn integer_min() -> i64 {
    i64::MIN
}

fn integer_max() -> i64 {
    i64::MAX
}

/// Inclusive range for REAL kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RealBounds {
    #[serde(default = "real_min")]
    pub min: f64,
    #[serde(default = "real_max")]
    pub max: f64,
}

impl RealBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn unconstrained() -> Self {
        Self::new(f64::MIN, f64::MAX)
    }

    /// NaN never satisfies a range.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn is_consistent(&self) -> bool {
        !self.min.is_nan() && !self.max.is_nan() && self.min <= self.max
    }
}

impl Default for RealBounds {
    fn default() -> Self {
        Self::unconstrained()
    }
}

fn real_min() -> f64 {
    f64::MIN
}

fn real_max() -> f64 {
    f64::MAX
}

/// Inclusive size range for strings and collections.
///
/// A fixed-size array is the degenerate case `min_size == max_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SizeBounds {
    pub min_size: u64,
    pub max_size: u64,
}

impl SizeBounds {
    pub fn new(min_size: u64, max_size: u64) -> Self {
        Self { min_size, max_size }
    }

    pub fn fixed(size: u64) -> Self {
        Self::new(size, size)
    }

    pub fn is_fixed(&self) -> bool {
        self.min_size == self.max_size
    }

    pub fn contains(&self, len: usize) -> bool {
        let len = len as u64;
        self.min_size <= len && len <= self.max_size
    }

    pub fn is_consistent(&self) -> bool {
        self.min_size <= self.max_size
    }
}

/// Named item of an ENUMERATED type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnumItem {
    pub name: String,
    pub value: i64,
}

impl EnumItem {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
