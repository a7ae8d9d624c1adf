use std::time::Duration;

use crate::conn::{
    ConnectParams, ConnectionConfiguration, Received, TungsteniteClient, WsTransport,
};
use crate::{StdbError, StdbResult};

/// The discrete lifecycle states of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Authenticated,
    Closing,
}

/// The connection state machine: transport custody, lifecycle state,
/// request-id allocation, and reconnect backoff.
///
/// The identity, connection id, and token arrive with the server's first
/// message and stay populated until teardown. Both id counters start at 1
/// and only ever grow within a connection.
#[derive(Debug)]
pub struct ConnectionCore {
    state: ConnectionState,
    transport: Option<Box<dyn WsTransport>>,
    configuration: ConnectionConfiguration,
    identity: Option<[u8; 32]>,
    connection_id: Option<[u8; 16]>,
    token: Option<String>,
    next_request_id: u32,
    next_query_set_id: u32,
    reconnect_attempts: u32,
}

impl ConnectionCore {
    pub fn new(configuration: ConnectionConfiguration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            transport: None,
            configuration,
            identity: None,
            connection_id: None,
            token: None,
            next_request_id: 1,
            next_query_set_id: 1,
            reconnect_attempts: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn configuration(&self) -> &ConnectionConfiguration {
        &self.configuration
    }

    /// The 256-bit identity issued at connect time.
    pub fn identity(&self) -> Option<&[u8; 32]> {
        self.identity.as_ref()
    }

    /// The 128-bit connection id issued at connect time.
    pub fn connection_id(&self) -> Option<&[u8; 16]> {
        self.connection_id.as_ref()
    }

    /// The token issued (or confirmed) at connect time.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Attaches an already-open transport.
    ///
    /// Counters restart for the new connection and the reconnect counter
    /// is zeroed.
    pub fn attach(&mut self, transport: Box<dyn WsTransport>) {
        debug!("transport attached");
        self.transport = Some(transport);
        self.state = ConnectionState::Connected;
        self.next_request_id = 1;
        self.next_query_set_id = 1;
        self.reconnect_attempts = 0;
    }

    /// Dials the subscribe endpoint and attaches the resulting transport.
    pub fn connect_real(&mut self, params: &ConnectParams) -> StdbResult<()> {
        self.state = ConnectionState::Connecting;
        match TungsteniteClient::connect(params, self.configuration.handshake_timeout()) {
            Ok(client) => {
                self.attach(Box::new(client));
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                self.reconnect_attempts += 1;
                Err(e)
            }
        }
    }

    /// Allocates the next request id.
    pub fn next_request_id(&mut self) -> u32 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Allocates the next query-set id.
    pub fn next_query_set_id(&mut self) -> u32 {
        let id = self.next_query_set_id;
        self.next_query_set_id += 1;
        id
    }

    /// Sends one binary frame over the attached transport.
    pub fn send(&mut self, frame: Vec<u8>) -> StdbResult<()> {
        if !matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Authenticated
        ) {
            return Err(StdbError::NotConnected);
        }
        self.transport
            .as_mut()
            .ok_or(StdbError::NotConnected)?
            .send(frame)
    }

    /// Blocks for the next transport event.
    pub fn receive(&mut self) -> StdbResult<Received> {
        self.transport
            .as_mut()
            .ok_or(StdbError::NotConnected)?
            .receive()
    }

    /// Records the credentials of the server's first message.
    pub fn mark_authenticated(
        &mut self,
        identity: [u8; 32],
        connection_id: [u8; 16],
        token: String,
    ) {
        debug!(
            "authenticated as {} (connection {})",
            hex::encode(identity),
            hex::encode(connection_id)
        );
        self.identity = Some(identity);
        self.connection_id = Some(connection_id);
        self.token = Some(token);
        self.state = ConnectionState::Authenticated;
    }

    /// Transitions to `disconnected` after a transport error or EOF and
    /// counts the attempt for backoff purposes.
    pub fn record_disconnect(&mut self) {
        debug!("disconnected (attempt counter now {})", self.reconnect_attempts + 1);
        self.state = ConnectionState::Disconnected;
        self.transport = None;
        self.reconnect_attempts += 1;
    }

    /// Whether another reconnect attempt is allowed.
    pub fn should_reconnect(&self) -> bool {
        self.state == ConnectionState::Disconnected
            && self.reconnect_attempts < self.configuration.max_reconnect_attempts()
    }

    /// Reconnect attempts recorded since the last successful connect.
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// The delay before reconnect attempt `attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.configuration.base_reconnect_delay_ms();
        let delay = base
            .saturating_mul(u64::from(attempt) + 1)
            .min(self.configuration.max_reconnect_delay_ms());
        Duration::from_millis(delay)
    }

    /// Closes the connection from any state; no further events follow.
    pub fn close(&mut self) {
        self.state = ConnectionState::Closing;
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close() {
                trace!("transport close reported {e}");
            }
        }
        self.state = ConnectionState::Disconnected;
        self.identity = None;
        self.connection_id = None;
        self.token = None;
    }
}
