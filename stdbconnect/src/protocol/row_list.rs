use byteorder::{ByteOrder, LittleEndian};

use crate::bsatn::Decoder;
use crate::{StdbError, StdbResult};

// Size-hint sum tags.
const HINT_FIXED_STRIDE: u8 = 0;
const HINT_OFFSET_TABLE: u8 = 1;

/// A zero-copy view over the concatenated row payloads of one table.
///
/// Both the row bytes and the offset table alias the received frame; an
/// individual row's interval is computed on demand. Framing is either
/// fixed-stride (every row the same number of bytes) or an offset table of
/// little-endian `u64` row starts.
#[derive(Debug, Clone)]
pub struct RowList<'a> {
    hint: SizeHint<'a>,
    rows_data: &'a [u8],
}

#[derive(Debug, Clone)]
enum SizeHint<'a> {
    FixedStride(u16),
    OffsetTable {
        count: usize,
        // count * 8 unparsed bytes; offsets are read lazily
        offsets: &'a [u8],
    },
}

impl<'a> RowList<'a> {
    pub(crate) fn parse(decoder: &mut Decoder<'a>) -> StdbResult<Self> {
        let hint = match decoder.u8()? {
            HINT_FIXED_STRIDE => SizeHint::FixedStride(decoder.u16()?),
            HINT_OFFSET_TABLE => {
                let count = decoder.len()?;
                let table_len = count
                    .checked_mul(8)
                    .ok_or(StdbError::Overflow("offset table length"))?;
                SizeHint::OffsetTable {
                    count,
                    offsets: decoder.take(table_len)?,
                }
            }
            other => return Err(StdbError::UnknownRowSizeHint(other)),
        };
        let rows_data = decoder.bytes()?;
        Ok(Self { hint, rows_data })
    }

    /// Builds a fixed-stride row list over `rows_data`.
    pub fn fixed_stride(stride: u16, rows_data: &'a [u8]) -> Self {
        Self {
            hint: SizeHint::FixedStride(stride),
            rows_data,
        }
    }

    /// The raw concatenated row payload.
    pub fn rows_data(&self) -> &'a [u8] {
        self.rows_data
    }

    /// Number of rows in the view.
    pub fn num_rows(&self) -> usize {
        match self.hint {
            SizeHint::FixedStride(stride) => {
                if stride == 0 || self.rows_data.is_empty() {
                    0
                } else {
                    self.rows_data.len() / usize::from(stride)
                }
            }
            SizeHint::OffsetTable { count, .. } => count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// The byte interval of row `index`.
    ///
    /// For the offset table, row `index` occupies
    /// `[offset[index], offset[index + 1])`, the last row ending at the end
    /// of the payload.
    pub fn row(&self, index: usize) -> StdbResult<&'a [u8]> {
        match self.hint {
            SizeHint::FixedStride(stride) => {
                let stride = usize::from(stride);
                let start = index * stride;
                let end = start + stride;
                self.interval(start, end)
            }
            SizeHint::OffsetTable { count, offsets } => {
                if index >= count {
                    return Err(StdbError::UsageDetailed(format!(
                        "row index {index} out of range for {count} rows"
                    )));
                }
                let start = Self::read_offset(offsets, index)?;
                let end = if index + 1 < count {
                    Self::read_offset(offsets, index + 1)?
                } else {
                    self.rows_data.len()
                };
                self.interval(start, end)
            }
        }
    }

    /// Iterates the row byte slices in order.
    pub fn iter(&self) -> RowSlices<'a> {
        RowSlices {
            list: self.clone(),
            index: 0,
        }
    }

    fn read_offset(offsets: &[u8], index: usize) -> StdbResult<usize> {
        let at = index * 8;
        let raw = LittleEndian::read_u64(&offsets[at..at + 8]);
        usize::try_from(raw).map_err(|_| StdbError::Overflow("row offset"))
    }

    fn interval(&self, start: usize, end: usize) -> StdbResult<&'a [u8]> {
        if start > end || end > self.rows_data.len() {
            return Err(StdbError::BufferTooShort {
                needed: end,
                remaining: self.rows_data.len(),
            });
        }
        Ok(&self.rows_data[start..end])
    }
}

/// Iterator over the row byte slices of a [`RowList`].
#[derive(Debug)]
pub struct RowSlices<'a> {
    list: RowList<'a>,
    index: usize,
}

impl<'a> Iterator for RowSlices<'a> {
    type Item = StdbResult<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.list.num_rows() {
            return None;
        }
        let row = self.list.row(self.index);
        self.index += 1;
        Some(row)
    }
}
