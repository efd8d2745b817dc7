//! Core contracts for asn1rt.
//!
//! This crate defines the type model produced by the schema front-end, the
//! instance values checked against it, and the well-formedness rules every
//! model must satisfy before plans are compiled from it.

pub mod constraints;
pub mod error;
pub mod graph;
pub mod ids;
pub mod schema;
pub mod types;
pub mod validation;
pub mod value;

pub use constraints::{ConstraintId, EnumItem, IntegerBounds, RealBounds, SizeBounds};
pub use error::{Error, Result};
pub use graph::{build_reference_graph_report, ReferenceGraphReport, ReferenceGraphSummary};
pub use ids::{assign_constraint_ids, ConstraintIdAllocator};
pub use schema::{TypeAssignment, TypeModule, TypeNode};
pub use types::{
    Alternative, ChoiceType, EnumeratedType, Field, ReferenceType, SequenceOfType, SequenceType,
    TypeKind,
};
pub use validation::validate_module;
pub use value::Value;

/// Current contract version for `*.model.json` artifacts.
pub const MODEL_VERSION: &str = "0.1";
