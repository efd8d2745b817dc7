use schemars::schema::RootSchema;
use schemars::schema_for;

use asn1rt_core::TypeModule;

use crate::model::ValidationPlan;

/// Emit the JSON Schema for `*.model.json`.
pub fn model_json_schema() -> RootSchema {
    schema_for!(TypeModule)
}

/// Emit the JSON Schema for compiled plans.
pub fn plan_json_schema() -> RootSchema {
    schema_for!(ValidationPlan)
}
