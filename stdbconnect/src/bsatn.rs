// The binary codec: little-endian, length-prefixed, type-driven.
//
// `Encoder` is an append-only buffer with typed append operations;
// `Decoder` is a cursor over a borrowed byte slice. Both sides also offer a
// polymorphic entry point: `Encoder::encode_value` dispatches on the value's
// runtime tag, `Decoder::decode_value` is driven by an `AlgebraicType`.

mod decode;
mod encode;

pub use {decode::Decoder, encode::encode_fields_as_product, encode::Encoder};

use crate::types::{AlgebraicType, AlgebraicValue};
use crate::{StdbError, StdbResult};

/// Encodes one value into a fresh buffer.
pub fn to_vec(value: &AlgebraicValue) -> StdbResult<Vec<u8>> {
    let mut encoder = Encoder::new();
    encoder.encode_value(value)?;
    Ok(encoder.into_bytes())
}

/// Decodes one value of the given type from `bytes`, requiring that the
/// bytes are consumed exactly.
pub fn from_slice(ty: &AlgebraicType, bytes: &[u8]) -> StdbResult<AlgebraicValue> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.decode_value(ty)?;
    let trailing = decoder.remaining();
    if trailing == 0 {
        Ok(value)
    } else {
        Err(StdbError::UsageDetailed(format!(
            "{trailing} trailing bytes after a complete value"
        )))
    }
}
