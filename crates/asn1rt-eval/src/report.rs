use crate::errors::ConstraintViolation;
use crate::metrics::BatchMetrics;

/// Render a deterministic markdown report from batch metrics and violations.
pub fn render_report(
    metrics: &BatchMetrics,
    violations: &[(usize, ConstraintViolation)],
    max_examples: usize,
) -> String {
    let mut lines = Vec::new();

    lines.push("# asn1rt Validation Report".to_string());
    lines.push(String::new());
    lines.push("## Summary".to_string());
    lines.push(format!("- type: {}", metrics.type_name));
    lines.push(format!("- checks: {}", metrics.checks));
    lines.push(format!("- instances: {}", metrics.instances));
    lines.push(format!("- passed: {}", metrics.passed));
    lines.push(format!("- failed: {}", metrics.failed));
    lines.push(String::new());

    if !metrics.violations_by_id.is_empty() {
        lines.push("## Violations by constraint".to_string());
        lines.push("| id | path | rule | violations |".to_string());
        lines.push("| --- | --- | --- | --- |".to_string());
        for (id, stats) in &metrics.violations_by_id {
            lines.push(format!(
                "| {} | {} | {} | {} |",
                id, stats.path, stats.rule, stats.violations
            ));
        }
        lines.push(String::new());
    }

    if !violations.is_empty() {
        lines.push("## First violations".to_string());
        for (idx, violation) in violations.iter().take(max_examples) {
            lines.push(format!("- instance {idx}: {violation}"));
        }
        if violations.len() > max_examples {
            lines.push(format!("- ... {} more", violations.len() - max_examples));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use asn1rt_core::{TypeAssignment, TypeModule, TypeNode, Value};
    use asn1rt_plan::compile;

    use super::*;
    use crate::metrics::collect_batch_metrics;

    #[test]
    fn report_lists_violations_deterministically() {
        let module = TypeModule::new(
            "M",
            vec![TypeAssignment::new("Small", TypeNode::integer(1, 0, 9))],
        );
        let plan = compile(&module, "Small").expect("compile");
        let values = vec![Value::Integer(11), Value::Integer(12), Value::Integer(1)];
        let (metrics, violations) = collect_batch_metrics(&plan, &values);

        let report = render_report(&metrics, &violations, 1);
        assert!(report.contains("- failed: 2"));
        assert!(report.contains("| 1 | $ | value in 0..9 | 2 |"));
        assert!(report.contains("- instance 0: constraint 1 violated at $"));
        assert!(report.contains("- ... 1 more"));
        assert_eq!(report, render_report(&metrics, &violations, 1));
    }
}
