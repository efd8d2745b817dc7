use std::path::Path;

use asn1rt_core::{Error as CoreError, MODEL_VERSION, TypeKind, TypeModule, TypeNode};
use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::{info, warn};

use crate::cache::CompiledModule;
use crate::errors::{IssueSeverity, PlanError, ValidationIssue, ValidationReport};
use crate::schema::model_json_schema;

/// Compiled module with the warnings accumulated while loading it.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub compiled: CompiledModule,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a model JSON document against the model JSON Schema.
pub fn validate_model_json(
    model_json: &Value,
    model_schema: &Value,
) -> Result<ValidationReport, PlanError> {
    let compiled =
        JSONSchema::compile(model_schema).map_err(|err| PlanError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(model_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Check a parsed module for version drift and well-formedness.
pub fn validate_model_semantics(module: &TypeModule) -> ValidationReport {
    let mut report = ValidationReport::default();

    if module.module_version != MODEL_VERSION {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "model_version_mismatch",
            "/module_version",
            format!(
                "model version '{}' is not supported (expected '{}')",
                module.module_version, MODEL_VERSION
            ),
            Some("regenerate the model with a matching front-end".to_string()),
        ));
    }

    if module.types.is_empty() {
        report.push_warning(ValidationIssue::new(
            IssueSeverity::Warning,
            "types_empty",
            "/types",
            "module declares no types".to_string(),
            None,
        ));
    }

    for (idx, assignment) in module.types.iter().enumerate() {
        collect_node_warnings(&assignment.ty, &format!("/types/{idx}/type"), &mut report);
    }

    if let Err(err) = asn1rt_core::validate_module(module) {
        let code = match &err {
            CoreError::MalformedTypeModel(_) => "malformed_type_model",
            CoreError::UnknownType(_) => "unknown_type",
            CoreError::InvalidValue(_) => "invalid_value",
        };
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            code,
            "/types",
            err.to_string(),
            None,
        ));
    }

    report
}

/// Validate and compile a model document end-to-end.
pub fn load_model(model_json: &Value) -> Result<LoadedModel, ValidationReport> {
    let model_schema = match serde_json::to_value(model_json_schema()) {
        Ok(schema) => schema,
        Err(err) => return Err(single_error("schema_generation_error", err.to_string())),
    };

    let structural = match validate_model_json(model_json, &model_schema) {
        Ok(report) => report,
        Err(err) => return Err(single_error("schema_validation_error", err.to_string())),
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let module: TypeModule = match serde_json::from_value(model_json.clone()) {
        Ok(module) => module,
        Err(err) => return Err(single_error("invalid_model_json", err.to_string())),
    };

    let semantic = validate_model_semantics(&module);
    if !semantic.is_ok() {
        return Err(semantic);
    }

    let compiled = match CompiledModule::new(module) {
        Ok(compiled) => compiled,
        Err(err) => return Err(single_error("compile_error", err.to_string())),
    };

    for issue in &semantic.warnings {
        warn!(code = %issue.code, path = %issue.path, "{}", issue.message);
    }

    Ok(LoadedModel {
        compiled,
        warnings: semantic.warnings,
    })
}

/// Read a `*.model.json` file and load it.
pub fn load_model_file(path: &Path) -> Result<LoadedModel, PlanError> {
    let contents = std::fs::read_to_string(path)?;
    let model_json: Value = serde_json::from_str(&contents)?;
    let loaded = load_model(&model_json).map_err(PlanError::Rejected)?;
    info!(
        path = %path.display(),
        module = %loaded.compiled.module().name,
        warnings = loaded.warnings.len(),
        "model loaded"
    );
    Ok(loaded)
}

fn collect_node_warnings(node: &TypeNode, path: &str, report: &mut ValidationReport) {
    match &node.kind {
        TypeKind::Sequence(sequence) => {
            if sequence.fields.is_empty() {
                report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "empty_sequence",
                    path,
                    "sequence declares no fields".to_string(),
                    None,
                ));
            }
            for (idx, field) in sequence.fields.iter().enumerate() {
                collect_node_warnings(&field.ty, &format!("{path}/fields/{idx}/type"), report);
            }
        }
        TypeKind::Choice(choice) => {
            for (idx, alternative) in choice.alternatives.iter().enumerate() {
                collect_node_warnings(
                    &alternative.ty,
                    &format!("{path}/alternatives/{idx}/type"),
                    report,
                );
            }
        }
        TypeKind::SequenceOf(sequence_of) => {
            if sequence_of.max_size == 0 {
                report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "zero_size_collection",
                    path,
                    "sequence_of can only ever be empty".to_string(),
                    Some("check the declared SIZE constraint".to_string()),
                ));
            }
            collect_node_warnings(&sequence_of.element, &format!("{path}/element"), report);
        }
        _ => {}
    }
}

fn single_error(code: &str, message: String) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.push_error(ValidationIssue::new(
        IssueSeverity::Error,
        code,
        "/",
        message,
        None,
    ));
    report
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
