#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use flexi_logger::{Logger, LoggerHandle};
use stdbconnect::{
    EventHandler, ProcedureStatus, QueryRows, Received, ReducerOutcome, Row, Schema, StdbResult,
    WsTransport,
};

pub fn init_logger() -> LoggerHandle {
    Logger::try_with_env_or_str("info")
        .unwrap()
        .log_to_stdout()
        .start()
        .unwrap()
}

pub const SCHEMA: &str = r#"{
    "tables": [
        {
            "name": "players",
            "columns": [
                {"name": "id", "type": "u32"},
                {"name": "name", "type": "string"}
            ],
            "primary_key": [0]
        },
        {
            "name": "scores",
            "columns": [
                {"name": "player_id", "type": "u32"},
                {"name": "points", "type": "i64"}
            ],
            "primary_key": [0]
        }
    ],
    "reducers": [
        {
            "name": "rename",
            "params": [
                {"name": "id", "type": "u32"},
                {"name": "name", "type": "string"}
            ]
        }
    ]
}"#;

pub fn schema() -> Schema {
    Schema::from_json(SCHEMA).unwrap()
}

/// A transport double that replays a script of receive outcomes and
/// records every sent frame.
#[derive(Debug)]
pub struct ScriptedTransport {
    incoming: VecDeque<Received>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ScriptedTransport {
    pub fn new() -> (Self, Arc<Mutex<Vec<Vec<u8>>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                incoming: VecDeque::new(),
                sent: Arc::clone(&sent),
            },
            sent,
        )
    }

    /// Queues a binary frame for a later receive.
    pub fn push_frame(&mut self, frame: Vec<u8>) {
        self.incoming.push_back(Received::Frame(frame));
    }

    /// Queues a non-binary event (ping, text).
    pub fn push_nothing(&mut self) {
        self.incoming.push_back(Received::Nothing);
    }
}

impl WsTransport for ScriptedTransport {
    fn send(&mut self, frame: Vec<u8>) -> StdbResult<()> {
        self.sent.lock().unwrap().push(frame);
        Ok(())
    }

    fn receive(&mut self) -> StdbResult<Received> {
        Ok(self.incoming.pop_front().unwrap_or(Received::Closed))
    }

    fn close(&mut self) -> StdbResult<()> {
        self.incoming.clear();
        Ok(())
    }
}

/// What a [`RecordingHandler`] observed, in callback order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connect {
        identity: [u8; 32],
        connection_id: [u8; 16],
        token: String,
    },
    Disconnect(String),
    SubscribeApplied {
        table: String,
        count: usize,
    },
    Insert {
        table: String,
        row: Row,
    },
    Delete {
        table: String,
        row: Row,
    },
    Update {
        table: String,
        old: Row,
        new: Row,
    },
    ReducerResult {
        request_id: u32,
        outcome: String,
    },
    ProcedureResult {
        request_id: u32,
    },
    UnsubscribeApplied {
        query_set_id: u32,
    },
    QueryResult {
        request_id: u32,
        ok: bool,
    },
    Error(String),
}

/// An [`EventHandler`] that appends every callback to a shared list.
#[derive(Debug)]
pub struct RecordingHandler {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingHandler {
    pub fn new() -> (Self, Arc<Mutex<Vec<Event>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: Arc::clone(&events),
            },
            events,
        )
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl EventHandler for RecordingHandler {
    fn on_connect(&mut self, identity: &[u8; 32], connection_id: &[u8; 16], token: &str) {
        self.record(Event::Connect {
            identity: *identity,
            connection_id: *connection_id,
            token: token.to_string(),
        });
    }

    fn on_disconnect(&mut self, reason: &str) {
        self.record(Event::Disconnect(reason.to_string()));
    }

    fn on_subscribe_applied(&mut self, table: &str, count: usize) {
        self.record(Event::SubscribeApplied {
            table: table.to_string(),
            count,
        });
    }

    fn on_insert(&mut self, table: &str, row: &Row) {
        self.record(Event::Insert {
            table: table.to_string(),
            row: row.clone(),
        });
    }

    fn on_delete(&mut self, table: &str, row: &Row) {
        self.record(Event::Delete {
            table: table.to_string(),
            row: row.clone(),
        });
    }

    fn on_update(&mut self, table: &str, old: &Row, new: &Row) {
        self.record(Event::Update {
            table: table.to_string(),
            old: old.clone(),
            new: new.clone(),
        });
    }

    fn on_reducer_result(&mut self, request_id: u32, outcome: &ReducerOutcome<'_>) {
        let outcome = match outcome {
            ReducerOutcome::Ok { .. } => "ok",
            ReducerOutcome::OkEmpty => "ok_empty",
            ReducerOutcome::Err(_) => "err",
            ReducerOutcome::InternalError(_) => "internal_error",
        };
        self.record(Event::ReducerResult {
            request_id,
            outcome: outcome.to_string(),
        });
    }

    fn on_procedure_result(
        &mut self,
        request_id: u32,
        _status: &ProcedureStatus<'_>,
        _host_duration: i64,
    ) {
        self.record(Event::ProcedureResult { request_id });
    }

    fn on_unsubscribe_applied(&mut self, query_set_id: u32, _rows: Option<&QueryRows<'_>>) {
        self.record(Event::UnsubscribeApplied { query_set_id });
    }

    fn on_query_result(&mut self, request_id: u32, result: &Result<QueryRows<'_>, String>) {
        self.record(Event::QueryResult {
            request_id,
            ok: result.is_ok(),
        });
    }

    fn on_error(&mut self, message: &str) {
        self.record(Event::Error(message.to_string()));
    }
}

// ---- frame builders ------------------------------------------------------

fn le32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

fn put_string(frame: &mut Vec<u8>, value: &str) {
    frame.extend_from_slice(&le32(u32::try_from(value.len()).unwrap()));
    frame.extend_from_slice(value.as_bytes());
}

pub fn player_row(id: u32, name: &str) -> Vec<u8> {
    let mut row = Vec::new();
    row.extend_from_slice(&le32(id));
    put_string(&mut row, name);
    row
}

// offset-table row list over pre-encoded rows
pub fn row_list(rows: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![1];
    out.extend_from_slice(&le32(u32::try_from(rows.len()).unwrap()));
    let mut offset = 0_u64;
    for row in rows {
        out.extend_from_slice(&offset.to_le_bytes());
        offset += row.len() as u64;
    }
    let rows_data: Vec<u8> = rows.concat();
    out.extend_from_slice(&le32(u32::try_from(rows_data.len()).unwrap()));
    out.extend_from_slice(&rows_data);
    out
}

/// An `initial_connection` frame (uncompressed envelope).
pub fn initial_connection_frame(
    identity: &[u8; 32],
    connection_id: &[u8; 16],
    token: &str,
) -> Vec<u8> {
    let mut frame = vec![0x00, 0x00];
    frame.extend_from_slice(identity);
    frame.extend_from_slice(connection_id);
    put_string(&mut frame, token);
    frame
}

/// A `subscribe_applied` frame carrying one table's rows.
pub fn subscribe_applied_frame(
    request_id: u32,
    query_set_id: u32,
    table: &str,
    rows: &[Vec<u8>],
) -> Vec<u8> {
    let mut frame = vec![0x00, 0x01];
    frame.extend_from_slice(&le32(request_id));
    frame.extend_from_slice(&le32(query_set_id));
    frame.extend_from_slice(&le32(1));
    put_string(&mut frame, table);
    frame.extend_from_slice(&row_list(rows));
    frame
}

/// A `transaction_update` frame with one persistent batch for one table.
pub fn transaction_update_frame(
    query_set_id: u32,
    table: &str,
    deletes: &[Vec<u8>],
    inserts: &[Vec<u8>],
) -> Vec<u8> {
    let mut frame = vec![0x00, 0x04];
    frame.extend_from_slice(&le32(1)); // one query set update
    frame.extend_from_slice(&le32(query_set_id));
    frame.extend_from_slice(&le32(1)); // one table update
    put_string(&mut frame, table);
    frame.extend_from_slice(&le32(1)); // one batch
    frame.push(0); // persistent
    frame.extend_from_slice(&row_list(inserts));
    frame.extend_from_slice(&row_list(deletes));
    frame
}

/// An `unsubscribe_applied` frame without dropped rows.
pub fn unsubscribe_applied_frame(request_id: u32, query_set_id: u32) -> Vec<u8> {
    let mut frame = vec![0x00, 0x02];
    frame.extend_from_slice(&le32(request_id));
    frame.extend_from_slice(&le32(query_set_id));
    frame.push(1); // option: none
    frame
}

/// A `subscription_error` frame with a present request id.
pub fn subscription_error_frame(request_id: u32, query_set_id: u32, error: &str) -> Vec<u8> {
    let mut frame = vec![0x00, 0x03];
    frame.push(0); // option: some
    frame.extend_from_slice(&le32(request_id));
    frame.extend_from_slice(&le32(query_set_id));
    put_string(&mut frame, error);
    frame
}

/// A `one_off_query_result` frame with an error result.
pub fn one_off_error_frame(request_id: u32, error: &str) -> Vec<u8> {
    let mut frame = vec![0x00, 0x05];
    frame.extend_from_slice(&le32(request_id));
    frame.push(1); // result: err
    put_string(&mut frame, error);
    frame
}

/// A `procedure_result` frame whose status is returned bytes.
pub fn procedure_result_frame(request_id: u32, return_value: &[u8]) -> Vec<u8> {
    let mut frame = vec![0x00, 0x07];
    frame.push(0); // status: returned
    frame.extend_from_slice(&le32(u32::try_from(return_value.len()).unwrap()));
    frame.extend_from_slice(return_value);
    frame.extend_from_slice(&1_700_000_000_i64.to_le_bytes());
    frame.extend_from_slice(&2_500_i64.to_le_bytes());
    frame.extend_from_slice(&le32(request_id));
    frame
}

/// A `reducer_result` frame whose `ok` outcome embeds a transaction.
pub fn reducer_result_ok_frame(
    request_id: u32,
    query_set_id: u32,
    table: &str,
    deletes: &[Vec<u8>],
    inserts: &[Vec<u8>],
) -> Vec<u8> {
    let mut frame = vec![0x00, 0x06];
    frame.extend_from_slice(&le32(request_id));
    frame.extend_from_slice(&1_700_000_000_i64.to_le_bytes());
    frame.push(0); // outcome: ok
    frame.extend_from_slice(&le32(0)); // empty return value
    frame.extend_from_slice(&le32(1)); // one query set update
    frame.extend_from_slice(&le32(query_set_id));
    frame.extend_from_slice(&le32(1));
    put_string(&mut frame, table);
    frame.extend_from_slice(&le32(1));
    frame.push(0); // persistent
    frame.extend_from_slice(&row_list(inserts));
    frame.extend_from_slice(&row_list(deletes));
    frame
}
