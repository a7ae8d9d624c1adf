//! A synchronous client for SpacetimeDB-style row-streaming databases.
//!
//! The server continuously streams row-level changes for subscribed SQL
//! queries over a binary websocket protocol; this crate keeps a local
//! cache mirroring that view, forwards reducer calls, and delivers change
//! events through an application-provided [`EventHandler`].
//!
//! The building blocks, bottom up:
//!
//! * [`AlgebraicType`] / [`AlgebraicValue`]: the closed type system every
//!   wire value lives in.
//! * [`bsatn`]: the little-endian binary codec.
//! * [`Schema`]: tables, reducers, and the typespace, loaded once from
//!   the server's JSON descriptor.
//! * [`ClientMessage`] / [`ServerMessage`]: the wire protocol, with
//!   zero-copy row payloads.
//! * [`ClientCache`]: the per-table keyed mirror with
//!   delete-plus-insert-to-update collapse.
//! * [`DbClient`]: the orchestrator. Connect, subscribe, call, dispatch.
//!
//! ```rust,no_run
//! use stdbconnect::{ConnectParams, DbClient, NoopHandler, Schema};
//!
//! # fn main() -> stdbconnect::StdbResult<()> {
//! let params = ConnectParams::builder()
//!     .host("localhost:3000")
//!     .database("quickstart")
//!     .build()?;
//! let api = stdbconnect::ApiClient::from_params(&params)?;
//! let mut client = DbClient::new(api.schema("quickstart")?, Box::new(NoopHandler));
//! client.connect_real(params)?;
//! client.subscribe(vec!["SELECT * FROM players".to_string()])?;
//! while client.frame_tick()? {}
//! # Ok(())
//! # }
//! ```

#![deny(missing_debug_implementations)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate log;

pub mod bsatn;
mod cache;
mod callbacks;
mod client;
mod conn;
mod creds;
mod http;
mod protocol;
mod row;
mod schema;
mod stdb_error;
mod types;
pub mod url;

pub use crate::{
    cache::{Change, ClientCache, TableStore},
    callbacks::{EventHandler, NoopHandler},
    client::DbClient,
    conn::{
        ConnectParams, ConnectParamsBuilder, ConnectionConfiguration, ConnectionCore,
        ConnectionState, IntoConnectParams, Received, TungsteniteClient, WsTransport,
    },
    creds::Credentials,
    http::{ApiClient, ApiResponse, IdentityToken},
    protocol::{
        ClientMessage, Compression, ProcedureStatus, QueryRows, QuerySetUpdate, ReducerOutcome,
        RowList, RowSlices, ServerMessage, TableRows, TableUpdate, TableUpdateRows,
        UNSUBSCRIBE_SEND_DROPPED_ROWS,
    },
    row::{decode_rows, Row, TableRow},
    schema::{Reducer, Schema, Table},
    stdb_error::{StdbError, StdbResult},
    types::{AlgebraicType, AlgebraicValue, Column, Field},
};
