//! Constraint compiler for asn1rt.
//!
//! Turns a type model into validation plans: ordered lists of atomic checks,
//! each tagged with the id of the constraint it enforces. Also loads model
//! documents, checking them structurally (JSON Schema) and semantically.

pub mod cache;
pub mod compile;
pub mod errors;
pub mod model;
pub mod schema;
pub mod validate;

pub use cache::CompiledModule;
pub use compile::{compile, compile_node, compile_unchecked};
pub use errors::{IssueSeverity, PlanError, Result, ValidationIssue, ValidationReport};
pub use model::{Check, CheckRule, FieldPath, PathSegment, SizeUnit, ValidationPlan};
pub use schema::{model_json_schema, plan_json_schema};
pub use validate::{
    LoadedModel, load_model, load_model_file, validate_model_json, validate_model_semantics,
};
