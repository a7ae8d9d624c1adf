use byteorder::{ByteOrder, LittleEndian};

use crate::types::{AlgebraicType, AlgebraicValue, Column, Field};
use crate::{StdbError, StdbResult};

/// An append-only encode buffer with typed append operations.
///
/// All fixed-width integers are written little-endian; strings, byte slices
/// and arrays get a `u32` length prefix. Extracting the bytes takes
/// ownership of the buffer.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Takes ownership of the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn put_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_i8(&mut self, v: i8) {
        #[allow(clippy::cast_sign_loss)]
        self.buf.push(v as u8);
    }

    pub fn put_u16(&mut self, v: u16) {
        let mut raw = [0_u8; 2];
        LittleEndian::write_u16(&mut raw, v);
        self.buf.extend_from_slice(&raw);
    }

    pub fn put_i16(&mut self, v: i16) {
        let mut raw = [0_u8; 2];
        LittleEndian::write_i16(&mut raw, v);
        self.buf.extend_from_slice(&raw);
    }

    pub fn put_u32(&mut self, v: u32) {
        let mut raw = [0_u8; 4];
        LittleEndian::write_u32(&mut raw, v);
        self.buf.extend_from_slice(&raw);
    }

    pub fn put_i32(&mut self, v: i32) {
        let mut raw = [0_u8; 4];
        LittleEndian::write_i32(&mut raw, v);
        self.buf.extend_from_slice(&raw);
    }

    pub fn put_u64(&mut self, v: u64) {
        let mut raw = [0_u8; 8];
        LittleEndian::write_u64(&mut raw, v);
        self.buf.extend_from_slice(&raw);
    }

    pub fn put_i64(&mut self, v: i64) {
        let mut raw = [0_u8; 8];
        LittleEndian::write_i64(&mut raw, v);
        self.buf.extend_from_slice(&raw);
    }

    pub fn put_u128(&mut self, v: u128) {
        let mut raw = [0_u8; 16];
        LittleEndian::write_u128(&mut raw, v);
        self.buf.extend_from_slice(&raw);
    }

    pub fn put_i128(&mut self, v: i128) {
        let mut raw = [0_u8; 16];
        LittleEndian::write_i128(&mut raw, v);
        self.buf.extend_from_slice(&raw);
    }

    // 256-bit integers are carried and written as 32 raw bytes.
    pub fn put_u256(&mut self, v: &[u8; 32]) {
        self.buf.extend_from_slice(v);
    }

    pub fn put_i256(&mut self, v: &[u8; 32]) {
        self.buf.extend_from_slice(v);
    }

    pub fn put_f32(&mut self, v: f32) {
        let mut raw = [0_u8; 4];
        LittleEndian::write_f32(&mut raw, v);
        self.buf.extend_from_slice(&raw);
    }

    pub fn put_f64(&mut self, v: f64) {
        let mut raw = [0_u8; 8];
        LittleEndian::write_f64(&mut raw, v);
        self.buf.extend_from_slice(&raw);
    }

    /// Writes a `u32` length prefix followed by the raw bytes.
    pub fn put_bytes(&mut self, v: &[u8]) -> StdbResult<()> {
        self.put_len(v.len())?;
        self.buf.extend_from_slice(v);
        Ok(())
    }

    /// Writes a `u32` length prefix followed by the UTF-8 bytes.
    pub fn put_str(&mut self, v: &str) -> StdbResult<()> {
        self.put_bytes(v.as_bytes())
    }

    /// Writes a length or count as its `u32` prefix.
    pub fn put_len(&mut self, len: usize) -> StdbResult<()> {
        let len = u32::try_from(len).map_err(|_| StdbError::Overflow("u32 length prefix"))?;
        self.put_u32(len);
        Ok(())
    }

    /// Appends one value, dispatching on its runtime tag.
    pub fn encode_value(&mut self, value: &AlgebraicValue) -> StdbResult<()> {
        match value {
            AlgebraicValue::Bool(v) => self.put_bool(*v),
            AlgebraicValue::U8(v) => self.put_u8(*v),
            AlgebraicValue::I8(v) => self.put_i8(*v),
            AlgebraicValue::U16(v) => self.put_u16(*v),
            AlgebraicValue::I16(v) => self.put_i16(*v),
            AlgebraicValue::U32(v) => self.put_u32(*v),
            AlgebraicValue::I32(v) => self.put_i32(*v),
            AlgebraicValue::U64(v) => self.put_u64(*v),
            AlgebraicValue::I64(v) => self.put_i64(*v),
            AlgebraicValue::U128(v) => self.put_u128(*v),
            AlgebraicValue::I128(v) => self.put_i128(*v),
            AlgebraicValue::U256(v) => self.put_u256(v),
            AlgebraicValue::I256(v) => self.put_i256(v),
            AlgebraicValue::F32(v) => self.put_f32(*v),
            AlgebraicValue::F64(v) => self.put_f64(*v),
            AlgebraicValue::String(v) => self.put_str(v)?,
            AlgebraicValue::Bytes(v) => self.put_bytes(v)?,
            AlgebraicValue::Array(elements) => {
                self.put_len(elements.len())?;
                for element in elements {
                    self.encode_value(element)?;
                }
            }
            AlgebraicValue::Option(None) => self.put_u8(1),
            AlgebraicValue::Option(Some(inner)) => {
                self.put_u8(0);
                self.encode_value(inner)?;
            }
            AlgebraicValue::Product(fields) => {
                // no separators, no length prefix
                for field in fields {
                    self.encode_value(&field.value)?;
                }
            }
            AlgebraicValue::Sum { tag, value } => {
                self.put_u8(*tag);
                self.encode_value(value)?;
            }
        }
        Ok(())
    }

    /// Appends one value after checking it against its intended type.
    ///
    /// The byte output is identical to [`Encoder::encode_value`]; the type
    /// additionally validates carriers level by level and bounds sum tags.
    pub fn encode_value_as(
        &mut self,
        value: &AlgebraicValue,
        ty: &AlgebraicType,
    ) -> StdbResult<()> {
        value.check_against(ty)?;
        match (value, ty) {
            (AlgebraicValue::Array(elements), AlgebraicType::Array(element_ty)) => {
                self.put_len(elements.len())?;
                for element in elements {
                    self.encode_value_as(element, element_ty)?;
                }
                Ok(())
            }
            (AlgebraicValue::Option(None), AlgebraicType::Option(_)) => {
                self.put_u8(1);
                Ok(())
            }
            (AlgebraicValue::Option(Some(inner)), AlgebraicType::Option(inner_ty)) => {
                self.put_u8(0);
                self.encode_value_as(inner, inner_ty)
            }
            (AlgebraicValue::Product(fields), AlgebraicType::Product(columns)) => {
                if fields.len() != columns.len() {
                    return Err(StdbError::TypeMismatch {
                        expected: "product of matching arity",
                        found: "product",
                    });
                }
                for (field, column) in fields.iter().zip(columns) {
                    self.encode_value_as(&field.value, &column.ty)?;
                }
                Ok(())
            }
            (AlgebraicValue::Sum { tag, value }, AlgebraicType::Sum(variants)) => {
                let variant = variants.get(usize::from(*tag)).ok_or_else(|| {
                    StdbError::InvalidSumTag {
                        tag: *tag,
                        variants: variants.len(),
                    }
                })?;
                self.put_u8(*tag);
                self.encode_value_as(value, &variant.ty)
            }
            _ => self.encode_value(value),
        }
    }
}

/// Encodes named fields as a product over `columns`, in column declaration
/// order, looking each field up by name.
///
/// This is the encoding used for reducer arguments: the caller supplies
/// fields in any order, the column list of the reducer's parameters decides
/// layout. A column with no matching field is a
/// [`MissingField`](StdbError::MissingField) error.
pub fn encode_fields_as_product(fields: &[Field], columns: &[Column]) -> StdbResult<Vec<u8>> {
    let mut encoder = Encoder::new();
    for (index, column) in columns.iter().enumerate() {
        let field = fields
            .iter()
            .find(|field| field.name.is_some() && field.name == column.name)
            .ok_or_else(|| {
                StdbError::MissingField(
                    column
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("#{index}")),
                )
            })?;
        encoder.encode_value_as(&field.value, &column.ty)?;
    }
    Ok(encoder.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlgebraicType, AlgebraicValue, Column, Field};

    #[test]
    fn primitives_are_little_endian() {
        let mut encoder = Encoder::new();
        encoder.put_u32(0xDEAD_BEEF);
        encoder.put_i32(-100_000);
        assert_eq!(
            encoder.into_bytes(),
            [0xEF, 0xBE, 0xAD, 0xDE, 0x60, 0x79, 0xFE, 0xFF]
        );
    }

    #[test]
    fn string_gets_length_prefix() {
        let mut encoder = Encoder::new();
        encoder.put_str("abc").unwrap();
        assert_eq!(encoder.into_bytes(), [3, 0, 0, 0, b'a', b'b', b'c']);

        let mut encoder = Encoder::new();
        encoder.put_str("").unwrap();
        assert_eq!(encoder.into_bytes(), [0, 0, 0, 0]);
    }

    #[test]
    fn option_layout() {
        let some = AlgebraicValue::Option(Some(Box::new(AlgebraicValue::U64(42))));
        assert_eq!(
            crate::bsatn::to_vec(&some).unwrap(),
            [0x00, 0x2A, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        let none = AlgebraicValue::Option(None);
        assert_eq!(crate::bsatn::to_vec(&none).unwrap(), [0x01]);
    }

    #[test]
    fn product_is_plain_concatenation() {
        let product = AlgebraicValue::Product(vec![
            Field::new("a", AlgebraicValue::U8(1)),
            Field::new("b", AlgebraicValue::U16(0x0302)),
        ]);
        assert_eq!(crate::bsatn::to_vec(&product).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn empty_array_is_four_zero_bytes() {
        let array = AlgebraicValue::Array(vec![]);
        assert_eq!(crate::bsatn::to_vec(&array).unwrap(), [0, 0, 0, 0]);
    }

    #[test]
    fn typed_encoding_rejects_wrong_carrier() {
        let mut encoder = Encoder::new();
        let err = encoder
            .encode_value_as(&AlgebraicValue::U8(1), &AlgebraicType::String)
            .unwrap_err();
        assert!(matches!(err, crate::StdbError::TypeMismatch { .. }));
    }

    #[test]
    fn typed_encoding_bounds_sum_tags() {
        let ty = AlgebraicType::Sum(vec![Column::new("only", AlgebraicType::U8)]);
        let value = AlgebraicValue::Sum {
            tag: 3,
            value: Box::new(AlgebraicValue::U8(0)),
        };
        let mut encoder = Encoder::new();
        let err = encoder.encode_value_as(&value, &ty).unwrap_err();
        assert!(matches!(
            err,
            crate::StdbError::InvalidSumTag { tag: 3, variants: 1 }
        ));
    }

    #[test]
    fn fields_are_looked_up_by_name() {
        let columns = vec![
            Column::new("id", AlgebraicType::U32),
            Column::new("name", AlgebraicType::String),
        ];
        // supplied out of order
        let fields = vec![
            Field::new("name", AlgebraicValue::String("x".to_string())),
            Field::new("id", AlgebraicValue::U32(7)),
        ];
        let bytes = encode_fields_as_product(&fields, &columns).unwrap();
        assert_eq!(bytes, [7, 0, 0, 0, 1, 0, 0, 0, b'x']);

        let err = encode_fields_as_product(&fields[..1], &columns).unwrap_err();
        assert!(matches!(err, crate::StdbError::MissingField(name) if name == "id"));
    }
}
