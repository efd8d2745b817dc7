use thiserror::Error;

/// Core error type shared across asn1rt crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The type model violates its own invariants. This is a defect in the
    /// schema front-end, not bad instance data.
    #[error("malformed type model: {0}")]
    MalformedTypeModel(String),
    /// A type name is not declared in the module.
    #[error("unknown type: {0}")]
    UnknownType(String),
    /// An instance document does not have the shape of its type.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Convenience alias for results returned by asn1rt crates.
pub type Result<T> = std::result::Result<T, Error>;
