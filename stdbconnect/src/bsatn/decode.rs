use byteorder::{ByteOrder, LittleEndian};

use crate::types::{AlgebraicType, AlgebraicValue, Field};
use crate::{StdbError, StdbResult};

/// A decode cursor over a borrowed byte slice.
///
/// Each decode operation advances the cursor by exactly the number of bytes
/// the operation requires; running short yields
/// [`BufferTooShort`](StdbError::BufferTooShort).
#[derive(Debug)]
pub struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Consumes and returns the next `n` bytes.
    pub fn take(&mut self, n: usize) -> StdbResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(StdbError::BufferTooShort {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> StdbResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn i8(&mut self) -> StdbResult<i8> {
        #[allow(clippy::cast_possible_wrap)]
        Ok(self.take(1)?[0] as i8)
    }

    pub fn bool(&mut self) -> StdbResult<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(StdbError::InvalidBool(other)),
        }
    }

    pub fn u16(&mut self) -> StdbResult<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn i16(&mut self) -> StdbResult<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn u32(&mut self) -> StdbResult<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn i32(&mut self) -> StdbResult<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn u64(&mut self) -> StdbResult<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn i64(&mut self) -> StdbResult<i64> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    pub fn u128(&mut self) -> StdbResult<u128> {
        Ok(LittleEndian::read_u128(self.take(16)?))
    }

    pub fn i128(&mut self) -> StdbResult<i128> {
        Ok(LittleEndian::read_i128(self.take(16)?))
    }

    // 256-bit integers pass through as 32 raw bytes.
    pub fn b256(&mut self) -> StdbResult<[u8; 32]> {
        let slice = self.take(32)?;
        let mut raw = [0_u8; 32];
        raw.copy_from_slice(slice);
        Ok(raw)
    }

    pub fn f32(&mut self) -> StdbResult<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn f64(&mut self) -> StdbResult<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    /// Reads a `u32` length prefix as a `usize`.
    pub fn len(&mut self) -> StdbResult<usize> {
        let len = self.u32()?;
        usize::try_from(len).map_err(|_| StdbError::Overflow("u32 length prefix"))
    }

    /// Reads a length-prefixed byte slice, borrowed from the cursor.
    pub fn bytes(&mut self) -> StdbResult<&'a [u8]> {
        let len = self.len()?;
        self.take(len)
    }

    /// Reads a length-prefixed UTF-8 string into an owned `String`.
    pub fn string(&mut self) -> StdbResult<String> {
        let raw = self.bytes()?;
        let s = std::str::from_utf8(raw)?;
        Ok(s.to_string())
    }

    /// Decodes one value of the given type, recursively.
    ///
    /// `ty` must be schema-resolved: a `Ref` at any level is a usage error.
    pub fn decode_value(&mut self, ty: &AlgebraicType) -> StdbResult<AlgebraicValue> {
        Ok(match ty {
            AlgebraicType::Bool => AlgebraicValue::Bool(self.bool()?),
            AlgebraicType::U8 => AlgebraicValue::U8(self.u8()?),
            AlgebraicType::I8 => AlgebraicValue::I8(self.i8()?),
            AlgebraicType::U16 => AlgebraicValue::U16(self.u16()?),
            AlgebraicType::I16 => AlgebraicValue::I16(self.i16()?),
            AlgebraicType::U32 => AlgebraicValue::U32(self.u32()?),
            AlgebraicType::I32 => AlgebraicValue::I32(self.i32()?),
            AlgebraicType::U64 => AlgebraicValue::U64(self.u64()?),
            AlgebraicType::I64 => AlgebraicValue::I64(self.i64()?),
            AlgebraicType::U128 => AlgebraicValue::U128(self.u128()?),
            AlgebraicType::I128 => AlgebraicValue::I128(self.i128()?),
            AlgebraicType::U256 => AlgebraicValue::U256(self.b256()?),
            AlgebraicType::I256 => AlgebraicValue::I256(self.b256()?),
            AlgebraicType::F32 => AlgebraicValue::F32(self.f32()?),
            AlgebraicType::F64 => AlgebraicValue::F64(self.f64()?),
            AlgebraicType::String => AlgebraicValue::String(self.string()?),
            AlgebraicType::Bytes => AlgebraicValue::Bytes(self.bytes()?.to_vec()),
            AlgebraicType::Array(element_ty) => {
                let count = self.len()?;
                let mut elements = Vec::with_capacity(count.min(4096));
                for _ in 0..count {
                    elements.push(self.decode_value(element_ty)?);
                }
                AlgebraicValue::Array(elements)
            }
            AlgebraicType::Option(inner_ty) => match self.u8()? {
                0 => AlgebraicValue::Option(Some(Box::new(self.decode_value(inner_ty)?))),
                1 => AlgebraicValue::Option(None),
                other => return Err(StdbError::InvalidOptionTag(other)),
            },
            AlgebraicType::Product(columns) => {
                let mut fields = Vec::with_capacity(columns.len());
                for column in columns {
                    fields.push(Field {
                        name: column.name.clone(),
                        value: self.decode_value(&column.ty)?,
                    });
                }
                AlgebraicValue::Product(fields)
            }
            AlgebraicType::Sum(variants) => {
                let tag = self.u8()?;
                let variant =
                    variants
                        .get(usize::from(tag))
                        .ok_or(StdbError::InvalidSumTag {
                            tag,
                            variants: variants.len(),
                        })?;
                AlgebraicValue::Sum {
                    tag,
                    value: Box::new(self.decode_value(&variant.ty)?),
                }
            }
            AlgebraicType::Ref(index) => return Err(StdbError::InvalidTypeRef(*index)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsatn::{from_slice, to_vec, Encoder};
    use crate::types::{AlgebraicType, AlgebraicValue, Column, Field};

    fn roundtrip(ty: &AlgebraicType, value: &AlgebraicValue) {
        let bytes = to_vec(value).unwrap();
        assert_eq!(&from_slice(ty, &bytes).unwrap(), value);
    }

    #[test]
    fn primitive_frame_decodes_exactly() {
        let bytes = [0xEF, 0xBE, 0xAD, 0xDE, 0x60, 0x79, 0xFE, 0xFF];
        let mut decoder = Decoder::new(&bytes);
        assert_eq!(decoder.u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(decoder.i32().unwrap(), -100_000);
        assert_eq!(decoder.remaining(), 0);
    }

    #[test]
    fn integer_boundaries_roundtrip() {
        roundtrip(&AlgebraicType::U8, &AlgebraicValue::U8(0));
        roundtrip(&AlgebraicType::U8, &AlgebraicValue::U8(255));
        roundtrip(&AlgebraicType::I8, &AlgebraicValue::I8(-128));
        roundtrip(&AlgebraicType::I8, &AlgebraicValue::I8(127));
        roundtrip(&AlgebraicType::U128, &AlgebraicValue::U128(u128::MAX));
        roundtrip(&AlgebraicType::I128, &AlgebraicValue::I128(i128::MIN));
        let mut raw = [0_u8; 32];
        raw[0] = 0xFE;
        raw[31] = 0x80;
        roundtrip(&AlgebraicType::U256, &AlgebraicValue::U256(raw));
    }

    #[test]
    fn strings_roundtrip() {
        roundtrip(
            &AlgebraicType::String,
            &AlgebraicValue::String(String::new()),
        );
        roundtrip(
            &AlgebraicType::String,
            &AlgebraicValue::String("grüße, 世界".to_string()),
        );
    }

    #[test]
    fn composites_roundtrip() {
        let ty = AlgebraicType::Product(vec![
            Column::new("id", AlgebraicType::U32),
            Column::new(
                "tags",
                AlgebraicType::Array(Box::new(AlgebraicType::String)),
            ),
            Column::new(
                "score",
                AlgebraicType::Option(Box::new(AlgebraicType::F64)),
            ),
        ]);
        let value = AlgebraicValue::Product(vec![
            Field::new("id", AlgebraicValue::U32(9)),
            Field::new(
                "tags",
                AlgebraicValue::Array(vec![
                    AlgebraicValue::String("a".to_string()),
                    AlgebraicValue::String("b".to_string()),
                ]),
            ),
            Field::new(
                "score",
                AlgebraicValue::Option(Some(Box::new(AlgebraicValue::F64(1.5)))),
            ),
        ]);
        roundtrip(&ty, &value);
    }

    #[test]
    fn sum_roundtrip_and_tag_bound() {
        let ty = AlgebraicType::Sum(vec![
            Column::new("none", AlgebraicType::Product(vec![])),
            Column::new("some", AlgebraicType::I64),
        ]);
        let value = AlgebraicValue::Sum {
            tag: 1,
            value: Box::new(AlgebraicValue::I64(-5)),
        };
        roundtrip(&ty, &value);

        let err = from_slice(&ty, &[9]).unwrap_err();
        assert!(matches!(
            err,
            crate::StdbError::InvalidSumTag { tag: 9, variants: 2 }
        ));
    }

    #[test]
    fn invalid_scalars_are_format_errors() {
        assert!(matches!(
            from_slice(&AlgebraicType::Bool, &[2]),
            Err(crate::StdbError::InvalidBool(2))
        ));
        assert!(matches!(
            from_slice(
                &AlgebraicType::Option(Box::new(AlgebraicType::U8)),
                &[7, 0]
            ),
            Err(crate::StdbError::InvalidOptionTag(7))
        ));
        assert!(matches!(
            from_slice(&AlgebraicType::U32, &[1, 2]),
            Err(crate::StdbError::BufferTooShort {
                needed: 4,
                remaining: 2
            })
        ));
    }

    #[test]
    fn decoding_a_ref_is_rejected() {
        let mut encoder = Encoder::new();
        encoder.put_u8(0);
        let err = from_slice(&AlgebraicType::Ref(3), &encoder.into_bytes()).unwrap_err();
        assert!(matches!(err, crate::StdbError::InvalidTypeRef(3)));
    }
}
