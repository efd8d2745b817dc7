use asn1rt_core::{TypeModule, TypeNode, Value};
use asn1rt_generate::initialize;
use asn1rt_plan::CompiledModule;
use thiserror::Error;
use tracing::debug;

use crate::engine::validate;
use crate::errors::{BoundaryError, RoundTripError};

/// Serializes values into some wire format.
pub trait WireEncoder {
    type Error: std::error::Error + 'static;

    fn encode(
        &mut self,
        module: &TypeModule,
        ty: &TypeNode,
        value: &Value,
    ) -> Result<(), Self::Error>;
}

/// Reads values back from some wire format.
pub trait WireDecoder {
    type Error: std::error::Error + 'static;

    /// `seed` is the default instance of `ty`; decoders overwrite whatever
    /// the wire data carries and return the populated value.
    fn decode(
        &mut self,
        module: &TypeModule,
        ty: &TypeNode,
        seed: Value,
    ) -> Result<Value, Self::Error>;
}

/// Guards codecs with the validation plans of a compiled module.
///
/// Nothing invalid is handed to an encoder, and nothing invalid comes back
/// out of a decode.
#[derive(Debug, Clone, Copy)]
pub struct CodecBoundary<'a> {
    compiled: &'a CompiledModule,
}

impl<'a> CodecBoundary<'a> {
    pub fn new(compiled: &'a CompiledModule) -> Self {
        Self { compiled }
    }

    /// Validate `value` and encode it; the encoder is not called on violation.
    pub fn encode<E: WireEncoder>(
        &self,
        type_name: &str,
        value: &Value,
        encoder: &mut E,
    ) -> Result<(), BoundaryError<E::Error>> {
        let plan = self.compiled.require_plan(type_name)?;
        validate(plan, value).map_err(BoundaryError::Rejected)?;
        let ty = self.compiled.type_node(type_name)?;
        encoder
            .encode(self.compiled.module(), ty, value)
            .map_err(BoundaryError::Codec)?;
        debug!(type_name = %type_name, "encoded value");
        Ok(())
    }

    /// Decode a value starting from the type's default instance and reject
    /// it unless it validates.
    pub fn decode<D: WireDecoder>(
        &self,
        type_name: &str,
        decoder: &mut D,
    ) -> Result<Value, BoundaryError<D::Error>> {
        let plan = self.compiled.require_plan(type_name)?;
        let ty = self.compiled.type_node(type_name)?;
        let seed = initialize(self.compiled.module(), ty)?;
        let value = decoder
            .decode(self.compiled.module(), ty, seed)
            .map_err(BoundaryError::Codec)?;
        validate(plan, &value).map_err(BoundaryError::Rejected)?;
        debug!(type_name = %type_name, "decoded value");
        Ok(value)
    }

    /// Encode, decode, validate and compare one value.
    pub fn round_trip<C, E>(
        &self,
        type_name: &str,
        value: &Value,
        codec: &mut C,
    ) -> Result<Value, RoundTripError<E>>
    where
        C: WireEncoder<Error = E> + WireDecoder<Error = E>,
        E: std::error::Error + 'static,
    {
        self.encode(type_name, value, codec)
            .map_err(RoundTripError::Encode)?;
        let decoded = self.decode(type_name, codec).map_err(|err| match err {
            BoundaryError::Rejected(violation) => RoundTripError::Constraint(violation),
            other => RoundTripError::Decode(other),
        })?;
        // Component order is not part of a SEQUENCE value.
        let module = self.compiled.module();
        let normalize = |value: &Value| -> Result<Value, RoundTripError<E>> {
            self.compiled
                .type_node(type_name)
                .and_then(|ty| value.normalized(module, ty))
                .map_err(|err| RoundTripError::Decode(BoundaryError::Model(err)))
        };
        let expected = normalize(value)?;
        if normalize(&decoded)? != expected {
            return Err(RoundTripError::Mismatch {
                expected: format!("{expected:?}"),
                found: format!("{decoded:?}"),
            });
        }
        Ok(decoded)
    }
}

/// Errors from [`JsonCodec`].
#[derive(Debug, Error)]
pub enum JsonCodecError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Model(#[from] asn1rt_core::Error),
    #[error("no more encoded values")]
    Exhausted,
}

/// Line-delimited JSON codec.
///
/// Values are appended on encode and consumed in order on decode. The JSON
/// form always carries complete values, so the decode seed is replaced.
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    buffer: Vec<u8>,
    cursor: usize,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec reading from previously encoded bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            buffer: bytes.into(),
            cursor: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl WireEncoder for JsonCodec {
    type Error = JsonCodecError;

    fn encode(
        &mut self,
        module: &TypeModule,
        ty: &TypeNode,
        value: &Value,
    ) -> Result<(), Self::Error> {
        let json = value.to_json(module, ty)?;
        serde_json::to_writer(&mut self.buffer, &json)?;
        self.buffer.push(b'\n');
        Ok(())
    }
}

impl WireDecoder for JsonCodec {
    type Error = JsonCodecError;

    fn decode(
        &mut self,
        module: &TypeModule,
        ty: &TypeNode,
        _seed: Value,
    ) -> Result<Value, Self::Error> {
        let rest = &self.buffer[self.cursor..];
        let start = rest
            .iter()
            .position(|byte| !byte.is_ascii_whitespace())
            .ok_or(JsonCodecError::Exhausted)?;
        let len = rest[start..]
            .iter()
            .position(|byte| *byte == b'\n')
            .unwrap_or(rest.len() - start);
        let json: serde_json::Value = serde_json::from_slice(&rest[start..start + len])?;
        self.cursor += start + len;
        Ok(Value::from_json(module, ty, &json)?)
    }
}
