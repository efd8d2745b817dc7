use serde::{Deserialize, Serialize};

/// Options for the test-case generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseOptions {
    /// Base seed; the same seed always yields the same cases.
    pub seed: u64,
    /// Upper bound on generated string and collection lengths, unless the
    /// declared minimum size is larger.
    pub max_collection_len: u64,
    /// Probability that an OPTIONAL field is present.
    pub optional_presence: f64,
    /// Probability that a number or size is drawn from its bounds' edges.
    pub boundary_bias: f64,
}

impl Default for TestCaseOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            max_collection_len: 16,
            optional_presence: 0.5,
            boundary_bias: 0.3,
        }
    }
}

/// One generated instance in its JSON form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub index: u64,
    /// Seed that reproduces this case on its own.
    pub seed: u64,
    pub value: serde_json::Value,
}

/// Output of a generation run for one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseReport {
    pub type_name: String,
    pub seed: u64,
    pub cases: Vec<TestCase>,
}
