// The connection: parameters for creating one, the websocket transport,
// and the lifecycle state machine.

mod configuration;
mod connection_core;
mod params;
mod ws_client;

pub use {
    configuration::ConnectionConfiguration,
    connection_core::{ConnectionCore, ConnectionState},
    params::{ConnectParams, ConnectParamsBuilder, IntoConnectParams},
    ws_client::{Received, TungsteniteClient, WsTransport},
};
