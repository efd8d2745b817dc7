//! Value construction for asn1rt.
//!
//! The initializer builds the canonical default instance of a type, the one
//! decoders start from. The test-case generator draws seeded, reproducible
//! instances that satisfy every declared constraint, favoring boundaries.

pub mod errors;
pub mod initializer;
pub mod model;
pub mod testcases;

pub use errors::GenerationError;
pub use initializer::{MAX_INSTANCE_LEN, initialize, initialize_type};
pub use model::{TestCase, TestCaseOptions, TestCaseReport};
pub use testcases::TestCaseGenerator;
