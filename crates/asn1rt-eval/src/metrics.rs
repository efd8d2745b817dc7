use std::collections::BTreeMap;

use asn1rt_core::Value;
use asn1rt_plan::ValidationPlan;
use serde::{Deserialize, Serialize};

use crate::engine::validate;
use crate::errors::ConstraintViolation;

/// Metrics contract version for batch validation.
pub const METRICS_VERSION: &str = "0.1";

/// Outcome counts for a batch of instances validated against one plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchMetrics {
    pub metrics_version: String,
    pub type_name: String,
    pub checks: u64,
    pub instances: u64,
    pub passed: u64,
    pub failed: u64,
    /// First-failure counts keyed by constraint id.
    pub violations_by_id: BTreeMap<u32, ConstraintStats>,
}

/// How often one constraint was the first one violated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintStats {
    pub path: String,
    pub rule: String,
    pub violations: u64,
}

impl BatchMetrics {
    pub fn new(plan: &ValidationPlan) -> Self {
        Self {
            metrics_version: METRICS_VERSION.to_string(),
            type_name: plan.type_name.clone(),
            checks: plan.len() as u64,
            instances: 0,
            passed: 0,
            failed: 0,
            violations_by_id: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, result: &Result<(), ConstraintViolation>) {
        self.instances += 1;
        match result {
            Ok(()) => self.passed += 1,
            Err(violation) => {
                self.failed += 1;
                let stats = self
                    .violations_by_id
                    .entry(violation.error_code())
                    .or_insert_with(|| ConstraintStats {
                        path: violation.path.clone(),
                        rule: violation.rule.to_string(),
                        violations: 0,
                    });
                stats.violations += 1;
            }
        }
    }
}

/// Validate every instance and return the metrics plus the violations found.
pub fn collect_batch_metrics(
    plan: &ValidationPlan,
    values: &[Value],
) -> (BatchMetrics, Vec<(usize, ConstraintViolation)>) {
    let mut metrics = BatchMetrics::new(plan);
    let mut violations = Vec::new();
    for (idx, value) in values.iter().enumerate() {
        let result = validate(plan, value);
        metrics.record(&result);
        if let Err(violation) = result {
            violations.push((idx, violation));
        }
    }
    (metrics, violations)
}
