use crate::bsatn::Decoder;
use crate::protocol::RowList;
use crate::types::{AlgebraicValue, Column, Field};
use crate::{StdbError, StdbResult};

/// A single decoded row: one named value per table column, positionally
/// aligned to the schema's column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    fields: Vec<Field>,
}

impl Row {
    pub(crate) fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Decodes one row from its payload bytes, driven by the column list.
    ///
    /// The payload must be consumed exactly; trailing bytes are a format
    /// error.
    pub fn decode(columns: &[Column], bytes: &[u8]) -> StdbResult<Self> {
        let mut decoder = Decoder::new(bytes);
        let mut fields = Vec::with_capacity(columns.len());
        for column in columns {
            fields.push(Field {
                name: column.name.clone(),
                value: decoder.decode_value(&column.ty)?,
            });
        }
        let trailing = decoder.remaining();
        if trailing > 0 {
            return Err(StdbError::UsageDetailed(format!(
                "{trailing} trailing bytes after the last column of a row"
            )));
        }
        Ok(Self { fields })
    }

    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The value at column position `index`.
    pub fn field(&self, index: usize) -> Option<&AlgebraicValue> {
        self.fields.get(index).map(|field| &field.value)
    }

    /// The value of the column named `name`.
    pub fn get(&self, name: &str) -> Option<&AlgebraicValue> {
        self.fields
            .iter()
            .find(|field| field.name.as_deref() == Some(name))
            .map(|field| &field.value)
    }

    /// The underlying fields, in column order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

/// Support indexing.
impl std::ops::Index<usize> for Row {
    type Output = AlgebraicValue;
    fn index(&self, index: usize) -> &AlgebraicValue {
        &self.fields[index].value
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        for field in &self.fields {
            write!(fmt, "{field}, ")?;
        }
        Ok(())
    }
}

/// Decodes every row of a [`RowList`] with the given column list.
///
/// Fails on the first row that does not decode; rows decoded up to that
/// point are discarded with the returned error.
pub fn decode_rows(list: &RowList<'_>, columns: &[Column]) -> StdbResult<Vec<Row>> {
    let mut rows = Vec::with_capacity(list.num_rows());
    for slice in list.iter() {
        rows.push(Row::decode(columns, slice?)?);
    }
    Ok(rows)
}

/// A record type that mirrors one table, field-for-field in column order.
///
/// Hand-written or generated by `stdb-codegen`; gives the application typed
/// access to cached rows via `find_typed` and `get_typed`.
pub trait TableRow: Sized {
    /// The mirrored table's name.
    const TABLE_NAME: &'static str;

    /// Builds the typed record from a decoded row.
    fn from_row(row: &Row) -> StdbResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsatn::Encoder;
    use crate::types::AlgebraicType;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", AlgebraicType::U32),
            Column::new("name", AlgebraicType::String),
        ]
    }

    fn encode_row(id: u32, name: &str) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.put_u32(id);
        encoder.put_str(name).unwrap();
        encoder.into_bytes()
    }

    #[test]
    fn row_decodes_positionally() {
        let row = Row::decode(&columns(), &encode_row(7, "Nina")).unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(row[0], AlgebraicValue::U32(7));
        assert_eq!(row.get("name"), Some(&AlgebraicValue::String("Nina".to_string())));
    }

    #[test]
    fn trailing_bytes_are_a_format_error() {
        let mut bytes = encode_row(7, "Nina");
        bytes.push(0xFF);
        assert!(Row::decode(&columns(), &bytes).is_err());
    }

    #[test]
    fn row_list_decodes_row_by_row() {
        let mut rows_data = encode_row(1, "a");
        rows_data.extend_from_slice(&encode_row(2, "b"));

        let mut encoder = Encoder::new();
        encoder.put_u8(1); // offset table
        encoder.put_u32(2);
        encoder.put_u64(0);
        encoder.put_u64(9); // 4 bytes id + 4 bytes length + 1 byte text
        encoder.put_bytes(&rows_data).unwrap();
        let bytes = encoder.into_bytes();

        let mut decoder = Decoder::new(&bytes);
        let list = RowList::parse(&mut decoder).unwrap();
        let rows = decode_rows(&list, &columns()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], AlgebraicValue::U32(2));
    }

    #[test]
    fn failed_row_aborts_the_list() {
        // second row is truncated
        let mut rows_data = encode_row(1, "a");
        rows_data.extend_from_slice(&[5, 0]);

        let mut encoder = Encoder::new();
        encoder.put_u8(1);
        encoder.put_u32(2);
        encoder.put_u64(0);
        encoder.put_u64(9);
        encoder.put_bytes(&rows_data).unwrap();
        let bytes = encoder.into_bytes();

        let mut decoder = Decoder::new(&bytes);
        let list = RowList::parse(&mut decoder).unwrap();
        assert!(decode_rows(&list, &columns()).is_err());
    }
}
