use asn1rt_core::ConstraintId;
use asn1rt_plan::CheckRule;
use thiserror::Error;

/// First declared bound an instance does not satisfy.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("constraint {id} violated at {path}: expected {rule}, found {found}")]
pub struct ConstraintViolation {
    pub id: ConstraintId,
    /// Location of the offending value, with concrete element indices.
    pub path: String,
    pub rule: CheckRule,
    pub found: String,
}

impl ConstraintViolation {
    /// Numeric code reported to callers; never 0.
    pub fn error_code(&self) -> u32 {
        self.id.get()
    }
}

/// Errors raised at the encode/decode boundary.
#[derive(Debug, Error)]
pub enum BoundaryError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Model(#[from] asn1rt_core::Error),
    #[error("value rejected: {0}")]
    Rejected(ConstraintViolation),
    #[error("codec error: {0}")]
    Codec(#[source] E),
}

impl<E: std::error::Error + 'static> BoundaryError<E> {
    pub fn violation(&self) -> Option<&ConstraintViolation> {
        match self {
            BoundaryError::Rejected(violation) => Some(violation),
            _ => None,
        }
    }
}

/// Stage at which a round trip stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTripStage {
    Encode,
    Decode,
    Constraint,
    Mismatch,
}

impl RoundTripStage {
    pub fn code(self) -> u32 {
        match self {
            RoundTripStage::Encode => 1,
            RoundTripStage::Decode => 2,
            RoundTripStage::Constraint => 3,
            RoundTripStage::Mismatch => 4,
        }
    }
}

/// Failure of an encode, decode, validate and compare cycle.
#[derive(Debug, Error)]
pub enum RoundTripError<E: std::error::Error + 'static> {
    #[error("encode failed: {0}")]
    Encode(#[source] BoundaryError<E>),
    #[error("decode failed: {0}")]
    Decode(#[source] BoundaryError<E>),
    #[error("decoded value is invalid: {0}")]
    Constraint(ConstraintViolation),
    #[error("decoded value differs: expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },
}

impl<E: std::error::Error + 'static> RoundTripError<E> {
    pub fn stage(&self) -> RoundTripStage {
        match self {
            RoundTripError::Encode(_) => RoundTripStage::Encode,
            RoundTripError::Decode(_) => RoundTripStage::Decode,
            RoundTripError::Constraint(_) => RoundTripStage::Constraint,
            RoundTripError::Mismatch { .. } => RoundTripStage::Mismatch,
        }
    }
}
