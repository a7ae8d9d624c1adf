use crate::types::{AlgebraicType, Column};
use crate::{StdbError, StdbResult};

/// The parsed, fully resolved schema of one database.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Subscribed tables, in descriptor order.
    pub tables: Vec<Table>,
    /// Callable reducers, in descriptor order.
    pub reducers: Vec<Reducer>,
    /// The typespace the descriptor's `ref`s pointed into, itself resolved.
    pub typespace: Vec<AlgebraicType>,
}

impl Schema {
    /// Parses and resolves a JSON schema descriptor.
    pub fn from_json(descriptor: &str) -> StdbResult<Self> {
        super::json::parse_schema(descriptor)
    }

    /// Looks a table up by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == name)
    }

    /// Looks a reducer up by name.
    pub fn reducer(&self, name: &str) -> Option<&Reducer> {
        self.reducers.iter().find(|reducer| reducer.name == name)
    }

    // Uniqueness and index-range invariants, checked after parse.
    pub(crate) fn validate(&self) -> StdbResult<()> {
        for (index, table) in self.tables.iter().enumerate() {
            if self.tables[..index].iter().any(|t| t.name == table.name) {
                return Err(StdbError::UsageDetailed(format!(
                    "duplicate table name {:?} in schema",
                    table.name
                )));
            }
            for &pk_index in &table.primary_key {
                if pk_index >= table.columns.len() {
                    return Err(StdbError::UsageDetailed(format!(
                        "primary key index {pk_index} out of range for table {:?} with {} columns",
                        table.name,
                        table.columns.len()
                    )));
                }
            }
        }
        for (index, reducer) in self.reducers.iter().enumerate() {
            if self.reducers[..index]
                .iter()
                .any(|r| r.name == reducer.name)
            {
                return Err(StdbError::UsageDetailed(format!(
                    "duplicate reducer name {:?} in schema",
                    reducer.name
                )));
            }
        }
        Ok(())
    }
}

/// One subscribed table: name, column list, and primary-key column indices.
///
/// An empty `primary_key` means the table has no declared primary key; the
/// cache then keys such a table by the encoding of the whole row.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<usize>,
}

/// One callable reducer: name and parameter columns.
#[derive(Debug, Clone)]
pub struct Reducer {
    pub name: String,
    pub params: Vec<Column>,
}
