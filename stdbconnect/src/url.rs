//! Constants for the server's URL surface.
//!
//! A subscription runs over a websocket at
//!
//! ```text
//! ws://<host>/v1/database/<database>/subscribe?compression=<None|Brotli|Gzip>
//! ```
//!
//! with the subprotocol header carrying [`SUBPROTOCOL`] and, when a token
//! is configured, an `Authorization: Bearer <token>` header.
//!
//! The sibling HTTP surface lives under the same `/v1` base path; see
//! [`ApiClient`](crate::ApiClient).

//! Connection parameters can also be written as one URL,
//!
//! ```text
//! stdb://<host>:<port>/<database>[?<key>[=<value>][{&<key>[=<value>]}]]
//! ```
//!
//! with the supported options
//! - `compression=None|Brotli|Gzip` selecting the server-to-client frame
//!   compression
//! - `token=<value>` carrying the bearer token
//!
//! and converted with
//! [`IntoConnectParams`](crate::IntoConnectParams):
//!
//! ```rust,no_run
//! use stdbconnect::IntoConnectParams;
//!
//! let params = "stdb://localhost:3000/quickstart?compression=Gzip"
//!     .into_connect_params()
//!     .unwrap();
//! ```

/// The URL scheme naming a connection parameter set.
pub const STDB: &str = "stdb";

/// Option-key for selecting the server-to-client frame compression.
pub const OPTION_COMPRESSION: &str = "compression";

/// Option-key for carrying the bearer token.
pub const OPTION_TOKEN: &str = "token";

/// The websocket scheme. TLS endpoints are not supported.
pub const WS_SCHEME: &str = "ws";

/// The plain HTTP scheme of the REST surface.
pub const HTTP_SCHEME: &str = "http";

/// Base path shared by the websocket and REST surfaces.
pub const BASE_PATH: &str = "/v1";

/// The fixed subprotocol token identifying the binary protocol variant.
pub const SUBPROTOCOL: &str = "v2.bsatn.spacetimedb";

/// Query-parameter key selecting the server-to-client frame compression.
pub const COMPRESSION: &str = "compression";
