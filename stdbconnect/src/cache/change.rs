use crate::row::Row;

/// One row-level event emitted by the cache.
///
/// The rows in a change are owned copies; a change list stays valid after
/// further cache mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// A row entered the cached view.
    Insert { table: String, row: Row },
    /// A row left the cached view.
    Delete { table: String, row: Row },
    /// A row was replaced under the same primary key.
    Update { table: String, old: Row, new: Row },
}

impl Change {
    /// The table the change belongs to.
    pub fn table(&self) -> &str {
        match self {
            Self::Insert { table, .. } | Self::Delete { table, .. } | Self::Update { table, .. } => {
                table
            }
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
            Self::Update { .. } => "update",
        }
    }
}
