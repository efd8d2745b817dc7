use std::collections::BTreeMap;

use asn1rt_core::{Error, Result, TypeModule, TypeNode, validate_module};
use tracing::info;

use crate::compile::compile_unchecked;
use crate::model::ValidationPlan;

/// A validated module with one compiled plan per type assignment.
///
/// All plans are built in `new`; afterwards the value is read-only and can be
/// shared across threads (e.g. behind an `Arc`) without further locking.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    module: TypeModule,
    plans: BTreeMap<String, ValidationPlan>,
}

impl CompiledModule {
    pub fn new(module: TypeModule) -> Result<Self> {
        validate_module(&module)?;

        let mut plans = BTreeMap::new();
        for assignment in &module.types {
            let plan = compile_unchecked(&module, &assignment.name)?;
            plans.insert(assignment.name.clone(), plan);
        }

        info!(
            module = %module.name,
            types = plans.len(),
            checks = plans.values().map(|plan| plan.len()).sum::<usize>(),
            "module compiled"
        );

        Ok(Self { module, plans })
    }

    pub fn module(&self) -> &TypeModule {
        &self.module
    }

    /// Type names in declaration order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.module
            .types
            .iter()
            .map(|assignment| assignment.name.as_str())
    }

    pub fn plan(&self, type_name: &str) -> Option<&ValidationPlan> {
        self.plans.get(type_name)
    }

    pub fn require_plan(&self, type_name: &str) -> Result<&ValidationPlan> {
        self.plan(type_name)
            .ok_or_else(|| Error::UnknownType(format!("{}.{}", self.module.name, type_name)))
    }

    pub fn type_node(&self, type_name: &str) -> Result<&TypeNode> {
        Ok(&self.module.require(type_name)?.ty)
    }
}
