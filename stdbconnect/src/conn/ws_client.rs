use std::net::TcpStream;

use tungstenite::client::IntoClientRequest;
use tungstenite::handshake::HandshakeError;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::conn::ConnectParams;
use crate::{StdbError, StdbResult};

/// One outcome of a blocking receive.
#[derive(Debug)]
pub enum Received {
    /// A binary frame.
    Frame(Vec<u8>),
    /// Something else arrived (ping, pong, text); call receive again.
    Nothing,
    /// The peer closed the stream.
    Closed,
}

/// The narrow transport surface the connection consumes.
///
/// The shipped implementation is [`TungsteniteClient`]; tests substitute a
/// scripted double.
pub trait WsTransport: Send + std::fmt::Debug {
    /// Sends one binary frame.
    fn send(&mut self, frame: Vec<u8>) -> StdbResult<()>;

    /// Blocks until something arrives.
    fn receive(&mut self) -> StdbResult<Received>;

    /// Closes the stream; subsequent receives report [`Received::Closed`].
    fn close(&mut self) -> StdbResult<()>;
}

/// A blocking websocket connection.
pub struct TungsteniteClient {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl TungsteniteClient {
    /// Dials the subscribe endpoint of `params`.
    ///
    /// The TCP connect is bounded by `handshake_timeout`; the websocket
    /// upgrade carries the fixed subprotocol header and, when a token is
    /// configured, a bearer `Authorization` header.
    pub fn connect(params: &ConnectParams, handshake_timeout: std::time::Duration) -> StdbResult<Self> {
        let url = params.subscribe_url()?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| StdbError::ConnectionFailed(e.to_string()))?;
        let headers = request.headers_mut();
        headers.insert(
            "Sec-WebSocket-Protocol",
            crate::url::SUBPROTOCOL
                .parse()
                .map_err(|_| StdbError::Usage("invalid subprotocol header"))?,
        );
        if let Some(token) = params.token() {
            headers.insert(
                "Authorization",
                format!("Bearer {token}")
                    .parse()
                    .map_err(|_| StdbError::Usage("token is not a valid header value"))?,
            );
        }

        let addr = url
            .socket_addrs(|| Some(3000))
            .map_err(|e| StdbError::ConnectionFailed(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| StdbError::ConnectionFailed("host resolved to no address".to_string()))?;
        debug!("dialing {addr} for {}", url.as_str());
        let stream = TcpStream::connect_timeout(&addr, handshake_timeout)
            .map_err(|e| StdbError::ConnectionFailed(e.to_string()))?;
        stream
            .set_read_timeout(Some(handshake_timeout))
            .map_err(|e| StdbError::ConnectionFailed(e.to_string()))?;

        let (socket, response) = tungstenite::client(request, MaybeTlsStream::Plain(stream))
            .map_err(|e| match e {
                HandshakeError::Failure(e) => StdbError::HandshakeFailed(e.to_string()),
                HandshakeError::Interrupted(_) => {
                    StdbError::HandshakeFailed("handshake timed out".to_string())
                }
            })?;
        trace!("websocket accepted with status {}", response.status());

        // The handshake deadline does not apply to the receive loop.
        if let MaybeTlsStream::Plain(stream) = socket.get_ref() {
            stream.set_read_timeout(None)?;
        }
        Ok(Self { socket })
    }
}

impl std::fmt::Debug for TungsteniteClient {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct("TungsteniteClient").finish_non_exhaustive()
    }
}

impl WsTransport for TungsteniteClient {
    fn send(&mut self, frame: Vec<u8>) -> StdbResult<()> {
        self.socket.send(Message::Binary(frame))?;
        Ok(())
    }

    fn receive(&mut self) -> StdbResult<Received> {
        match self.socket.read() {
            Ok(Message::Binary(frame)) => Ok(Received::Frame(frame)),
            Ok(Message::Close(_)) => Ok(Received::Closed),
            Ok(other) => {
                trace!("ignoring non-binary websocket message: {other:?}");
                Ok(Received::Nothing)
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(Received::Closed)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) -> StdbResult<()> {
        match self.socket.close(None) {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
