use crate::bsatn::Decoder;
use crate::protocol::RowList;
use crate::{StdbError, StdbResult};

// Leading tag bytes of the server message family (after the envelope).
const TAG_INITIAL_CONNECTION: u8 = 0;
const TAG_SUBSCRIBE_APPLIED: u8 = 1;
const TAG_UNSUBSCRIBE_APPLIED: u8 = 2;
const TAG_SUBSCRIPTION_ERROR: u8 = 3;
const TAG_TRANSACTION_UPDATE: u8 = 4;
const TAG_ONE_OFF_QUERY_RESULT: u8 = 5;
const TAG_REDUCER_RESULT: u8 = 6;
const TAG_PROCEDURE_RESULT: u8 = 7;

/// A message from the server, parsed from a decompressed frame payload.
///
/// Leaf byte data (row payloads, return values) borrows from the payload;
/// composite structure is owned. The borrows end with the frame: callers
/// materialize whatever they keep before the next receive.
#[derive(Debug)]
pub enum ServerMessage<'a> {
    /// First message after the transport opens; carries the credentials.
    InitialConnection {
        identity: [u8; 32],
        connection_id: [u8; 16],
        token: String,
    },
    /// A subscribe took effect; carries the matching rows.
    SubscribeApplied {
        request_id: u32,
        query_set_id: u32,
        rows: QueryRows<'a>,
    },
    /// An unsubscribe took effect; the dropped rows only when requested.
    UnsubscribeApplied {
        request_id: u32,
        query_set_id: u32,
        rows: Option<QueryRows<'a>>,
    },
    /// The server rejected a subscription.
    SubscriptionError {
        request_id: Option<u32>,
        query_set_id: u32,
        error: String,
    },
    /// Row changes produced by one server-side transaction.
    TransactionUpdate(Vec<QuerySetUpdate<'a>>),
    /// The reply to a one-off query.
    OneOffQueryResult {
        request_id: u32,
        result: Result<QueryRows<'a>, String>,
    },
    /// The reply to a reducer call.
    ReducerResult {
        request_id: u32,
        timestamp: i64,
        outcome: ReducerOutcome<'a>,
    },
    /// The reply to a procedure call.
    ProcedureResult {
        status: ProcedureStatus<'a>,
        timestamp: i64,
        host_duration: i64,
        request_id: u32,
    },
}

impl<'a> ServerMessage<'a> {
    /// Parses one decompressed frame payload.
    pub fn parse(payload: &'a [u8]) -> StdbResult<Self> {
        let mut decoder = Decoder::new(payload);
        let tag = decoder.u8().map_err(|_| StdbError::EmptyFrame)?;
        let message = match tag {
            TAG_INITIAL_CONNECTION => {
                let mut identity = [0_u8; 32];
                identity.copy_from_slice(decoder.take(32)?);
                let mut connection_id = [0_u8; 16];
                connection_id.copy_from_slice(decoder.take(16)?);
                Self::InitialConnection {
                    identity,
                    connection_id,
                    token: decoder.string()?,
                }
            }
            TAG_SUBSCRIBE_APPLIED => Self::SubscribeApplied {
                request_id: decoder.u32()?,
                query_set_id: decoder.u32()?,
                rows: QueryRows::parse(&mut decoder)?,
            },
            TAG_UNSUBSCRIBE_APPLIED => Self::UnsubscribeApplied {
                request_id: decoder.u32()?,
                query_set_id: decoder.u32()?,
                rows: match decoder.u8()? {
                    0 => Some(QueryRows::parse(&mut decoder)?),
                    1 => None,
                    other => return Err(StdbError::InvalidOptionTag(other)),
                },
            },
            TAG_SUBSCRIPTION_ERROR => Self::SubscriptionError {
                request_id: match decoder.u8()? {
                    0 => Some(decoder.u32()?),
                    1 => None,
                    other => return Err(StdbError::InvalidOptionTag(other)),
                },
                query_set_id: decoder.u32()?,
                error: decoder.string()?,
            },
            TAG_TRANSACTION_UPDATE => {
                Self::TransactionUpdate(parse_query_set_updates(&mut decoder)?)
            }
            TAG_ONE_OFF_QUERY_RESULT => Self::OneOffQueryResult {
                request_id: decoder.u32()?,
                result: match decoder.u8()? {
                    0 => Ok(QueryRows::parse(&mut decoder)?),
                    1 => Err(decoder.string()?),
                    other => return Err(StdbError::UnknownOneOffResult(other)),
                },
            },
            TAG_REDUCER_RESULT => Self::ReducerResult {
                request_id: decoder.u32()?,
                timestamp: decoder.i64()?,
                outcome: ReducerOutcome::parse(&mut decoder)?,
            },
            TAG_PROCEDURE_RESULT => Self::ProcedureResult {
                status: ProcedureStatus::parse(&mut decoder)?,
                timestamp: decoder.i64()?,
                host_duration: decoder.i64()?,
                request_id: decoder.u32()?,
            },
            other => return Err(StdbError::UnknownMessageTag(other)),
        };
        trace!(
            "parsed server frame: {} of {} bytes",
            message.kind_name(),
            payload.len()
        );
        Ok(message)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::InitialConnection { .. } => "initial_connection",
            Self::SubscribeApplied { .. } => "subscribe_applied",
            Self::UnsubscribeApplied { .. } => "unsubscribe_applied",
            Self::SubscriptionError { .. } => "subscription_error",
            Self::TransactionUpdate(_) => "transaction_update",
            Self::OneOffQueryResult { .. } => "one_off_query_result",
            Self::ReducerResult { .. } => "reducer_result",
            Self::ProcedureResult { .. } => "procedure_result",
        }
    }
}

/// Per-table row lists, as carried by subscribe and one-off replies.
#[derive(Debug)]
pub struct QueryRows<'a> {
    pub tables: Vec<TableRows<'a>>,
}

impl<'a> QueryRows<'a> {
    fn parse(decoder: &mut Decoder<'a>) -> StdbResult<Self> {
        let count = decoder.len()?;
        let mut tables = Vec::with_capacity(count.min(256));
        for _ in 0..count {
            tables.push(TableRows {
                table_name: decoder.string()?,
                rows: RowList::parse(decoder)?,
            });
        }
        Ok(Self { tables })
    }
}

/// The rows of one table inside a [`QueryRows`].
#[derive(Debug)]
pub struct TableRows<'a> {
    pub table_name: String,
    pub rows: RowList<'a>,
}

/// All row changes one transaction produced for one query set.
#[derive(Debug)]
pub struct QuerySetUpdate<'a> {
    pub query_set_id: u32,
    pub tables: Vec<TableUpdate<'a>>,
}

/// The changes of one table within a [`QuerySetUpdate`].
#[derive(Debug)]
pub struct TableUpdate<'a> {
    pub table_name: String,
    pub updates: Vec<TableUpdateRows<'a>>,
}

/// One batch of row changes for a table.
#[derive(Debug)]
pub enum TableUpdateRows<'a> {
    /// Rows that enter and leave the cached view.
    Persistent {
        inserts: RowList<'a>,
        deletes: RowList<'a>,
    },
    /// Transient rows; delivered but never cached.
    Event(RowList<'a>),
}

const TABLE_UPDATE_PERSISTENT: u8 = 0;
const TABLE_UPDATE_EVENT: u8 = 1;

pub(crate) fn parse_query_set_updates<'a>(
    decoder: &mut Decoder<'a>,
) -> StdbResult<Vec<QuerySetUpdate<'a>>> {
    let count = decoder.len()?;
    let mut updates = Vec::with_capacity(count.min(256));
    for _ in 0..count {
        let query_set_id = decoder.u32()?;
        let table_count = decoder.len()?;
        let mut tables = Vec::with_capacity(table_count.min(256));
        for _ in 0..table_count {
            let table_name = decoder.string()?;
            let batch_count = decoder.len()?;
            let mut batches = Vec::with_capacity(batch_count.min(256));
            for _ in 0..batch_count {
                batches.push(match decoder.u8()? {
                    TABLE_UPDATE_PERSISTENT => TableUpdateRows::Persistent {
                        inserts: RowList::parse(decoder)?,
                        deletes: RowList::parse(decoder)?,
                    },
                    TABLE_UPDATE_EVENT => TableUpdateRows::Event(RowList::parse(decoder)?),
                    other => return Err(StdbError::UnknownTableUpdateTag(other)),
                });
            }
            tables.push(TableUpdate {
                table_name,
                updates: batches,
            });
        }
        updates.push(QuerySetUpdate {
            query_set_id,
            tables,
        });
    }
    Ok(updates)
}

/// The server-side result of a reducer call.
#[derive(Debug)]
pub enum ReducerOutcome<'a> {
    /// The reducer returned a value; its transaction rides along.
    Ok {
        return_value: &'a [u8],
        transaction: Vec<QuerySetUpdate<'a>>,
    },
    /// The reducer returned nothing.
    OkEmpty,
    /// The reducer signalled an application-level error.
    Err(&'a [u8]),
    /// The host failed while running the reducer.
    InternalError(String),
}

const REDUCER_OK: u8 = 0;
const REDUCER_OK_EMPTY: u8 = 1;
const REDUCER_ERR: u8 = 2;
const REDUCER_INTERNAL_ERROR: u8 = 3;

impl<'a> ReducerOutcome<'a> {
    fn parse(decoder: &mut Decoder<'a>) -> StdbResult<Self> {
        Ok(match decoder.u8()? {
            REDUCER_OK => Self::Ok {
                return_value: decoder.bytes()?,
                transaction: parse_query_set_updates(decoder)?,
            },
            REDUCER_OK_EMPTY => Self::OkEmpty,
            REDUCER_ERR => Self::Err(decoder.bytes()?),
            REDUCER_INTERNAL_ERROR => Self::InternalError(decoder.string()?),
            other => return Err(StdbError::UnknownReducerOutcome(other)),
        })
    }
}

/// The server-side status of a procedure call.
#[derive(Debug)]
pub enum ProcedureStatus<'a> {
    /// The procedure returned a value.
    Returned(&'a [u8]),
    /// The procedure signalled an application-level error.
    Err(&'a [u8]),
    /// The host failed while running the procedure.
    InternalError(String),
}

const PROCEDURE_RETURNED: u8 = 0;
const PROCEDURE_ERR: u8 = 1;
const PROCEDURE_INTERNAL_ERROR: u8 = 2;

impl<'a> ProcedureStatus<'a> {
    fn parse(decoder: &mut Decoder<'a>) -> StdbResult<Self> {
        Ok(match decoder.u8()? {
            PROCEDURE_RETURNED => Self::Returned(decoder.bytes()?),
            PROCEDURE_ERR => Self::Err(decoder.bytes()?),
            PROCEDURE_INTERNAL_ERROR => Self::InternalError(decoder.string()?),
            other => return Err(StdbError::UnknownProcedureStatus(other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsatn::Encoder;

    #[test]
    fn initial_connection_parses_byte_exact() {
        let mut encoder = Encoder::new();
        encoder.put_u8(0); // tag
        let identity = [0xAB_u8; 32];
        encoder.put_u256(&identity);
        let connection_id: [u8; 16] = *b"0123456789abcdef";
        for byte in connection_id {
            encoder.put_u8(byte);
        }
        encoder.put_str("tok-1").unwrap();
        let payload = encoder.into_bytes();

        match ServerMessage::parse(&payload).unwrap() {
            ServerMessage::InitialConnection {
                identity: got_identity,
                connection_id: got_connection_id,
                token,
            } => {
                assert_eq!(got_identity, identity);
                assert_eq!(got_connection_id, connection_id);
                assert_eq!(token, "tok-1");
            }
            other => panic!("unexpected message {}", other.kind_name()),
        }
    }

    #[test]
    fn subscription_error_with_absent_request_id() {
        let mut encoder = Encoder::new();
        encoder.put_u8(3); // tag
        encoder.put_u8(1); // option: none
        encoder.put_u32(12);
        encoder.put_str("no such table").unwrap();
        let payload = encoder.into_bytes();

        match ServerMessage::parse(&payload).unwrap() {
            ServerMessage::SubscriptionError {
                request_id,
                query_set_id,
                error,
            } => {
                assert_eq!(request_id, None);
                assert_eq!(query_set_id, 12);
                assert_eq!(error, "no such table");
            }
            other => panic!("unexpected message {}", other.kind_name()),
        }
    }

    #[test]
    fn transaction_update_structure() {
        let mut encoder = Encoder::new();
        encoder.put_u8(4); // tag
        encoder.put_u32(1); // one query set update
        encoder.put_u32(5); // query_set_id
        encoder.put_u32(1); // one table update
        encoder.put_str("users").unwrap();
        encoder.put_u32(2); // two batches
        encoder.put_u8(0); // persistent
        encoder.put_u8(0); // inserts: fixed stride
        encoder.put_u16(1);
        encoder.put_bytes(&[1, 2]).unwrap();
        encoder.put_u8(0); // deletes: fixed stride
        encoder.put_u16(1);
        encoder.put_bytes(&[]).unwrap();
        encoder.put_u8(1); // event
        encoder.put_u8(0);
        encoder.put_u16(1);
        encoder.put_bytes(&[9]).unwrap();
        let payload = encoder.into_bytes();

        match ServerMessage::parse(&payload).unwrap() {
            ServerMessage::TransactionUpdate(updates) => {
                assert_eq!(updates.len(), 1);
                assert_eq!(updates[0].query_set_id, 5);
                let table = &updates[0].tables[0];
                assert_eq!(table.table_name, "users");
                assert_eq!(table.updates.len(), 2);
                match &table.updates[0] {
                    TableUpdateRows::Persistent { inserts, deletes } => {
                        assert_eq!(inserts.num_rows(), 2);
                        assert_eq!(deletes.num_rows(), 0);
                    }
                    TableUpdateRows::Event(_) => panic!("expected persistent batch"),
                }
                match &table.updates[1] {
                    TableUpdateRows::Event(rows) => assert_eq!(rows.num_rows(), 1),
                    TableUpdateRows::Persistent { .. } => panic!("expected event batch"),
                }
            }
            other => panic!("unexpected message {}", other.kind_name()),
        }
    }

    #[test]
    fn reducer_result_outcomes() {
        let mut encoder = Encoder::new();
        encoder.put_u8(6); // tag
        encoder.put_u32(11);
        encoder.put_i64(1_700_000_000);
        encoder.put_u8(1); // ok_empty
        let payload = encoder.into_bytes();
        match ServerMessage::parse(&payload).unwrap() {
            ServerMessage::ReducerResult {
                request_id,
                timestamp,
                outcome,
            } => {
                assert_eq!(request_id, 11);
                assert_eq!(timestamp, 1_700_000_000);
                assert!(matches!(outcome, ReducerOutcome::OkEmpty));
            }
            other => panic!("unexpected message {}", other.kind_name()),
        }

        let mut encoder = Encoder::new();
        encoder.put_u8(6);
        encoder.put_u32(12);
        encoder.put_i64(0);
        encoder.put_u8(9); // bad outcome tag
        assert!(matches!(
            ServerMessage::parse(&encoder.into_bytes()),
            Err(StdbError::UnknownReducerOutcome(9))
        ));
    }

    #[test]
    fn unknown_message_tag_is_rejected() {
        assert!(matches!(
            ServerMessage::parse(&[0xEE]),
            Err(StdbError::UnknownMessageTag(0xEE))
        ));
        assert!(matches!(
            ServerMessage::parse(&[]),
            Err(StdbError::EmptyFrame)
        ));
    }
}
