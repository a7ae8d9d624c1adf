// The wire protocol: client messages are emitted as plain BSATN frames,
// server frames carry a one-byte compression envelope around a tagged
// message. Row payloads inside server messages stay unparsed byte slices
// aliasing the frame until row decoding materializes them.

mod client_message;
mod compression;
mod row_list;
mod server_message;

pub use {
    client_message::{ClientMessage, UNSUBSCRIBE_SEND_DROPPED_ROWS},
    compression::Compression,
    row_list::{RowList, RowSlices},
    server_message::{
        ProcedureStatus, QueryRows, QuerySetUpdate, ReducerOutcome, ServerMessage, TableRows,
        TableUpdate, TableUpdateRows,
    },
};

pub(crate) use compression::decompress;

// Envelope bytes on server frames.
const COMPRESSION_NONE: u8 = 0x00;
const COMPRESSION_BROTLI: u8 = 0x01;
const COMPRESSION_GZIP: u8 = 0x02;
