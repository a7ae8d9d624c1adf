use std::collections::HashMap;

use crate::bsatn::Encoder;
use crate::cache::Change;
use crate::row::Row;
use crate::types::Column;
use crate::StdbResult;

/// The keyed row store of one table.
///
/// Rows are keyed by the concatenated encoding of their primary-key
/// columns, in declaration order. A table without a declared primary key is
/// keyed by the encoding of the whole row; the store then behaves as a set
/// and genuine updates surface as delete plus insert.
#[derive(Debug)]
pub struct TableStore {
    entries: HashMap<Vec<u8>, Row>,
    columns: Vec<Column>,
    pk_indices: Vec<usize>,
}

impl TableStore {
    pub(crate) fn new(columns: Vec<Column>, pk_indices: Vec<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            columns,
            pk_indices,
        }
    }

    /// The table's column list, in schema order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of cached rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Computes the store key of one row.
    pub fn key_for(&self, row: &Row) -> StdbResult<Vec<u8>> {
        let mut encoder = Encoder::new();
        if self.pk_indices.is_empty() {
            for field in row.fields() {
                encoder.encode_value(&field.value)?;
            }
        } else {
            for &index in &self.pk_indices {
                if let Some(value) = row.field(index) {
                    encoder.encode_value(value)?;
                }
            }
        }
        Ok(encoder.into_bytes())
    }

    pub(crate) fn get(&self, key: &[u8]) -> Option<&Row> {
        self.entries.get(key)
    }

    pub(crate) fn insert(&mut self, key: Vec<u8>, row: Row) {
        if self.entries.insert(key, row).is_some() {
            warn!("replacing a row that was already cached under the same key");
        }
    }

    /// An owned copy of every cached row.
    pub fn snapshot(&self) -> Vec<Row> {
        self.entries.values().cloned().collect()
    }

    // Applies one persistent batch of already-decoded rows.
    //
    // Deletes come first: each matched entry leaves the store and is parked
    // in a scratch list under its key (an unmatched delete parks the
    // decoded row itself). Each insert whose key is parked becomes an
    // `update`, the rest become `insert`s; whatever stays parked becomes a
    // `delete`, in delete order.
    pub(crate) fn apply_persistent(
        &mut self,
        table: &str,
        deletes: Vec<Row>,
        inserts: Vec<Row>,
        changes: &mut Vec<Change>,
    ) -> StdbResult<()> {
        let mut scratch: Vec<(Vec<u8>, Row)> = Vec::with_capacity(deletes.len());
        for deleted in deletes {
            let key = self.key_for(&deleted)?;
            let old = self.entries.remove(&key).unwrap_or(deleted);
            scratch.push((key, old));
        }

        for inserted in inserts {
            let key = self.key_for(&inserted)?;
            if let Some(at) = scratch.iter().position(|(parked, _)| *parked == key) {
                let (_, old) = scratch.remove(at);
                changes.push(Change::Update {
                    table: table.to_string(),
                    old,
                    new: inserted.clone(),
                });
            } else {
                changes.push(Change::Insert {
                    table: table.to_string(),
                    row: inserted.clone(),
                });
            }
            self.insert(key, inserted);
        }

        for (_, old) in scratch {
            changes.push(Change::Delete {
                table: table.to_string(),
                row: old,
            });
        }
        Ok(())
    }
}
