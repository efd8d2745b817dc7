//! Validation engine and codec boundary for asn1rt.
//!
//! Instances are checked against compiled validation plans; the boundary
//! refuses to encode invalid values and rejects invalid decodes.

pub mod boundary;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod report;

pub use boundary::{CodecBoundary, JsonCodec, JsonCodecError, WireDecoder, WireEncoder};
pub use engine::{ValidationOutcome, validate, validate_all, validate_outcome};
pub use errors::{BoundaryError, ConstraintViolation, RoundTripError, RoundTripStage};
pub use metrics::{BatchMetrics, ConstraintStats, METRICS_VERSION, collect_batch_metrics};
pub use report::render_report;
