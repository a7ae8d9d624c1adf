use crate::protocol::{ProcedureStatus, QueryRows, ReducerOutcome};
use crate::row::Row;

/// The capability set an application provides to observe a connection.
///
/// Every callback is optional; the default implementations do nothing.
/// Row callbacks fire in the order the cache emitted the changes, and all
/// row callbacks of a transaction fire before the reducer-result callback
/// when a reducer's outcome embeds that transaction.
///
/// Borrowed arguments are only valid for the duration of the call; clone
/// what you keep.
#[allow(unused_variables)]
pub trait EventHandler {
    /// The server accepted the connection and issued credentials.
    fn on_connect(&mut self, identity: &[u8; 32], connection_id: &[u8; 16], token: &str) {}

    /// The connection ended; `reason` describes why.
    fn on_disconnect(&mut self, reason: &str) {}

    /// A subscription took effect; fires once per table with the number of
    /// rows delivered for it, after that table's `on_insert` calls.
    fn on_subscribe_applied(&mut self, table: &str, count: usize) {}

    /// A row entered the cached view.
    fn on_insert(&mut self, table: &str, row: &Row) {}

    /// A row left the cached view.
    fn on_delete(&mut self, table: &str, row: &Row) {}

    /// A row was replaced under the same primary key.
    fn on_update(&mut self, table: &str, old: &Row, new: &Row) {}

    /// The reply to a reducer call, after any embedded row callbacks.
    fn on_reducer_result(&mut self, request_id: u32, outcome: &ReducerOutcome<'_>) {}

    /// The reply to a procedure call.
    fn on_procedure_result(
        &mut self,
        request_id: u32,
        status: &ProcedureStatus<'_>,
        host_duration: i64,
    ) {
    }

    /// An unsubscribe took effect; the dropped rows when they were asked
    /// for.
    fn on_unsubscribe_applied(&mut self, query_set_id: u32, rows: Option<&QueryRows<'_>>) {}

    /// The reply to a one-off query.
    fn on_query_result(&mut self, request_id: u32, result: &Result<QueryRows<'_>, String>) {}

    /// A non-fatal error: a frame that did not decode, a rejected
    /// subscription, a reducer that failed inside the host. The connection
    /// stays up.
    fn on_error(&mut self, message: &str) {}
}

/// An [`EventHandler`] that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl EventHandler for NoopHandler {}
