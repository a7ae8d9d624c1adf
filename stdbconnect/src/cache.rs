// The client cache: a local mirror of the subscribed rows, one keyed store
// per table, driven by initial subscriptions and transaction updates.

mod change;
mod table_store;

pub use {change::Change, table_store::TableStore};

use std::collections::HashMap;

use crate::protocol::{QueryRows, QuerySetUpdate, TableUpdateRows};
use crate::row::{decode_rows, Row};
use crate::schema::Schema;
use crate::types::AlgebraicValue;
use crate::StdbResult;

/// The per-table keyed stores mirroring the subscribed view.
///
/// All mutation happens through `apply_subscribe_applied` and
/// `apply_transaction_update`, which return the ordered change list the
/// application observes. Snapshot readers get owned copies.
#[derive(Debug, Default)]
pub struct ClientCache {
    tables: HashMap<String, TableStore>,
}

impl ClientCache {
    /// Builds an empty cache with one store per schema table.
    pub fn new(schema: &Schema) -> Self {
        let tables = schema
            .tables
            .iter()
            .map(|table| {
                (
                    table.name.clone(),
                    TableStore::new(table.columns.clone(), table.primary_key.clone()),
                )
            })
            .collect();
        Self { tables }
    }

    /// The store of one table, if the schema declared it.
    pub fn table(&self, name: &str) -> Option<&TableStore> {
        self.tables.get(name)
    }

    /// Applies the initial rows of a subscription.
    ///
    /// Every inserted row is emitted as an `insert` change. Tables the
    /// schema does not declare are tolerated and skipped.
    pub fn apply_subscribe_applied(&mut self, rows: &QueryRows<'_>) -> StdbResult<Vec<Change>> {
        let mut changes = Vec::new();
        for table_rows in &rows.tables {
            let Some(store) = self.tables.get_mut(&table_rows.table_name) else {
                warn!(
                    "subscribe delivered rows for undeclared table {:?}; skipping",
                    table_rows.table_name
                );
                continue;
            };
            let decoded = decode_rows(&table_rows.rows, store.columns())?;
            for row in decoded {
                let key = store.key_for(&row)?;
                changes.push(Change::Insert {
                    table: table_rows.table_name.clone(),
                    row: row.clone(),
                });
                store.insert(key, row);
            }
        }
        debug!("subscription applied: {} inserts", changes.len());
        Ok(changes)
    }

    /// Applies one transaction's row changes across all its query sets.
    ///
    /// A `delete` and an `insert` with the same primary key within one
    /// persistent batch collapse into a single `update` change. Per batch,
    /// inserts and updates come first in the server's insert order,
    /// followed by the unmatched deletes in delete order.
    ///
    /// Both row lists of a persistent batch are fully decoded before the
    /// store is touched, so a decode failure leaves the cache as if only
    /// the preceding table updates had been applied.
    pub fn apply_transaction_update(
        &mut self,
        updates: &[QuerySetUpdate<'_>],
    ) -> StdbResult<Vec<Change>> {
        let mut changes = Vec::new();
        for query_set_update in updates {
            for table_update in &query_set_update.tables {
                let Some(store) = self.tables.get_mut(&table_update.table_name) else {
                    warn!(
                        "transaction update for undeclared table {:?}; skipping",
                        table_update.table_name
                    );
                    continue;
                };
                // decode every batch before touching the store, so one
                // table update applies all-or-nothing
                let mut decoded = Vec::with_capacity(table_update.updates.len());
                for batch in &table_update.updates {
                    match batch {
                        TableUpdateRows::Persistent { inserts, deletes } => {
                            decoded.push((
                                decode_rows(deletes, store.columns())?,
                                decode_rows(inserts, store.columns())?,
                            ));
                        }
                        // transient rows are delivered, never cached
                        TableUpdateRows::Event(rows) => {
                            trace!(
                                "ignoring {} transient rows for table {:?}",
                                rows.num_rows(),
                                table_update.table_name
                            );
                        }
                    }
                }
                for (deletes, inserts) in decoded {
                    store.apply_persistent(
                        &table_update.table_name,
                        deletes,
                        inserts,
                        &mut changes,
                    )?;
                }
            }
        }
        Ok(changes)
    }

    /// Number of cached rows of one table.
    pub fn count(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, TableStore::len)
    }

    /// An owned snapshot of all cached rows of one table.
    pub fn get_all(&self, table: &str) -> Vec<Row> {
        self.tables
            .get(table)
            .map_or_else(Vec::new, TableStore::snapshot)
    }

    /// Looks one row up by its primary-key value.
    ///
    /// For a multi-column primary key, pass a product value whose fields
    /// are the key columns in declaration order; its encoding is exactly
    /// the concatenation the store keys by.
    pub fn find(&self, table: &str, pk_value: &AlgebraicValue) -> StdbResult<Option<Row>> {
        let Some(store) = self.tables.get(table) else {
            return Ok(None);
        };
        let key = crate::bsatn::to_vec(pk_value)?;
        Ok(store.get(&key).cloned())
    }
}
