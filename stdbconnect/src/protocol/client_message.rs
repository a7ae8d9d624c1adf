use crate::bsatn::Encoder;
use crate::StdbResult;

// Leading tag bytes of the client message family.
const TAG_SUBSCRIBE: u8 = 0;
const TAG_UNSUBSCRIBE: u8 = 1;
const TAG_ONE_OFF_QUERY: u8 = 2;
const TAG_CALL_REDUCER: u8 = 3;
const TAG_CALL_PROCEDURE: u8 = 4;

/// Unsubscribe flag bit: ask the server to send the rows the dropped
/// queries were matching.
pub const UNSUBSCRIBE_SEND_DROPPED_ROWS: u8 = 0b1;

/// A message from the client to the server.
///
/// Client frames are sent as-is, without a compression envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Register a set of queries under a fresh query-set id.
    Subscribe {
        request_id: u32,
        query_set_id: u32,
        queries: Vec<String>,
    },
    /// Drop one query set.
    Unsubscribe {
        request_id: u32,
        query_set_id: u32,
        flags: u8,
    },
    /// A single query without a subscription.
    OneOffQuery { request_id: u32, query: String },
    /// Invoke a reducer; `args` is the BSATN product of its parameters.
    CallReducer {
        request_id: u32,
        reducer: String,
        args: Vec<u8>,
    },
    /// Invoke a procedure; `args` as for reducers.
    CallProcedure {
        request_id: u32,
        procedure: String,
        args: Vec<u8>,
    },
}

impl ClientMessage {
    /// Encodes the message into one binary frame.
    pub fn encode(&self) -> StdbResult<Vec<u8>> {
        let mut encoder = Encoder::new();
        match self {
            Self::Subscribe {
                request_id,
                query_set_id,
                queries,
            } => {
                encoder.put_u8(TAG_SUBSCRIBE);
                encoder.put_u32(*request_id);
                encoder.put_u32(*query_set_id);
                encoder.put_len(queries.len())?;
                for query in queries {
                    encoder.put_str(query)?;
                }
            }
            Self::Unsubscribe {
                request_id,
                query_set_id,
                flags,
            } => {
                encoder.put_u8(TAG_UNSUBSCRIBE);
                encoder.put_u32(*request_id);
                encoder.put_u32(*query_set_id);
                encoder.put_u8(*flags);
            }
            Self::OneOffQuery { request_id, query } => {
                encoder.put_u8(TAG_ONE_OFF_QUERY);
                encoder.put_u32(*request_id);
                encoder.put_str(query)?;
            }
            Self::CallReducer {
                request_id,
                reducer,
                args,
            } => {
                encoder.put_u8(TAG_CALL_REDUCER);
                encoder.put_u32(*request_id);
                encoder.put_u8(0); // flags, fixed
                encoder.put_str(reducer)?;
                encoder.put_bytes(args)?;
            }
            Self::CallProcedure {
                request_id,
                procedure,
                args,
            } => {
                encoder.put_u8(TAG_CALL_PROCEDURE);
                encoder.put_u32(*request_id);
                encoder.put_u8(0); // flags, fixed
                encoder.put_str(procedure)?;
                encoder.put_bytes(args)?;
            }
        }
        trace!("encoded client message of {} bytes", encoder.len());
        Ok(encoder.into_bytes())
    }
}
