use thiserror::Error;

/// A list specifying the categories of [`StdbError`](crate::StdbError).
///
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StdbError {
    /// The decode cursor ran out of bytes.
    #[error("Buffer too short: needed {needed} more bytes, {remaining} remaining")]
    BufferTooShort {
        /// Bytes the current decode step required.
        needed: usize,
        /// Bytes left in the cursor.
        remaining: usize,
    },

    /// A bool on the wire was neither `0x00` nor `0x01`.
    #[error("Invalid bool byte {0:#04x}")]
    InvalidBool(u8),

    /// An option tag on the wire was neither `0` (some) nor `1` (none).
    #[error("Invalid option tag {0:#04x}")]
    InvalidOptionTag(u8),

    /// A sum tag on the wire did not name a variant of the expected sum type.
    #[error("Invalid sum tag {tag} for a sum with {variants} variants")]
    InvalidSumTag {
        /// The tag byte that was read.
        tag: u8,
        /// Number of variants the type declares.
        variants: usize,
    },

    /// A length or count on the wire exceeds what this platform can address.
    #[error("Numeric overflow in {0}")]
    Overflow(&'static str),

    /// A string consumer required UTF-8 and the bytes were not.
    #[error("Invalid UTF-8 in a wire string")]
    InvalidUtf8 {
        /// The causing error.
        #[from]
        source: std::str::Utf8Error,
    },

    /// The compression envelope byte of a server frame is unknown.
    #[error("Unknown compression envelope {0:#04x}")]
    UnknownCompression(u8),

    /// The server sent a zero-length frame.
    #[error("Empty frame")]
    EmptyFrame,

    /// Inflating a compressed server frame failed.
    #[error("Decompression failed")]
    DecompressionFailed {
        /// The causing error.
        source: std::io::Error,
    },

    /// The leading tag of a server message is unknown.
    #[error("Unknown server message tag {0:#04x}")]
    UnknownMessageTag(u8),

    /// The size-hint tag of a row list is unknown.
    #[error("Unknown row list size hint {0:#04x}")]
    UnknownRowSizeHint(u8),

    /// The tag of a table-update entry is unknown.
    #[error("Unknown table update tag {0:#04x}")]
    UnknownTableUpdateTag(u8),

    /// The tag of a reducer outcome is unknown.
    #[error("Unknown reducer outcome tag {0:#04x}")]
    UnknownReducerOutcome(u8),

    /// The tag of a one-off query result is unknown.
    #[error("Unknown one-off query result tag {0:#04x}")]
    UnknownOneOffResult(u8),

    /// The tag of a procedure status is unknown.
    #[error("Unknown procedure status tag {0:#04x}")]
    UnknownProcedureStatus(u8),

    /// The schema descriptor is not valid JSON, or misses required parts.
    #[error("Invalid schema JSON")]
    InvalidJson {
        /// The causing error.
        #[from]
        source: serde_json::Error,
    },

    /// The schema descriptor names a type this library does not know.
    #[error("Unknown type {0:?} in schema")]
    UnknownType(String),

    /// A type reference points outside the typespace, or into a cycle.
    #[error("Invalid type reference {0} in schema")]
    InvalidTypeRef(usize),

    /// A named field required for encoding was not supplied.
    #[error("Missing field {0:?}")]
    MissingField(String),

    /// A value's runtime carrier does not match the expected type.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the type demanded.
        expected: &'static str,
        /// What the value carried.
        found: &'static str,
    },

    /// The operation needs an established connection.
    #[error("Not connected")]
    NotConnected,

    /// The server did not complete the connect handshake.
    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    /// The transport could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The transport failed mid-connection.
    #[error("Transport error")]
    TransportError {
        /// The causing error.
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The HTTP collaborator could not perform a request.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The HTTP collaborator got a response it cannot interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The server rejected the configured credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// The addressed database or identity does not exist.
    #[error("Not found")]
    NotFound,

    /// The server reported an internal failure.
    #[error("Server error (status {status}): {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// Error occured in communication with the database.
    #[error(transparent)]
    Io {
        /// The causing error.
        #[from]
        source: std::io::Error,
    },

    /// Error caused by wrong usage.
    #[error("Wrong usage: {}", _0)]
    Usage(&'static str),

    /// Error caused by wrong usage.
    #[error("Wrong usage: {}", _0)]
    UsageDetailed(String),
}

/// Abbreviation of `Result<T, StdbError>`.
pub type StdbResult<T> = std::result::Result<T, StdbError>;

impl StdbError {
    pub(crate) fn transport<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::TransportError {
            source: Box::new(error),
        }
    }

    pub(crate) fn decompression(error: std::io::Error) -> Self {
        Self::DecompressionFailed { source: error }
    }

    /// Reveal the inner error, where one exists.
    pub fn inner(&self) -> Option<&dyn std::error::Error> {
        match self {
            Self::InvalidUtf8 { source } => Some(source),
            Self::DecompressionFailed { source } | Self::Io { source } => Some(source),
            Self::InvalidJson { source } => Some(source),
            Self::TransportError { source } => Some(&**source),
            _ => None,
        }
    }
}

impl From<tungstenite::Error> for StdbError {
    fn from(error: tungstenite::Error) -> Self {
        match error {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Self::NotConnected
            }
            error => Self::transport(error),
        }
    }
}
