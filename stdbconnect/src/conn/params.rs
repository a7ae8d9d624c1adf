use crate::protocol::Compression;
use crate::{StdbError, StdbResult};

/// Immutable parameters for one connection attempt.
///
/// Build with a [`ConnectParamsBuilder`]:
///
/// ```rust,no_run
/// use stdbconnect::ConnectParams;
///
/// let params = ConnectParams::builder()
///     .host("localhost:3000")
///     .database("quickstart")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConnectParams {
    host: String,
    database: String,
    token: Option<String>,
    compression: Compression,
}

impl ConnectParams {
    pub fn builder() -> ConnectParamsBuilder {
        ConnectParamsBuilder::default()
    }

    /// Host and port, e.g. `localhost:3000`.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The database name addressed by this connection.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// The bearer token, when one is configured.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The frame compression requested from the server.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Replaces the token, e.g. after the server issued a fresh one.
    pub fn set_token<S: Into<String>>(&mut self, token: S) {
        self.token = Some(token.into());
    }

    /// The websocket subscribe URL for these parameters.
    pub fn subscribe_url(&self) -> StdbResult<url::Url> {
        let raw = format!(
            "{}://{}{}/database/{}/subscribe?{}={}",
            crate::url::WS_SCHEME,
            self.host,
            crate::url::BASE_PATH,
            self.database,
            crate::url::COMPRESSION,
            self.compression.as_query_value(),
        );
        url::Url::parse(&raw).map_err(|e| StdbError::ConnectionFailed(e.to_string()))
    }

    /// The base URL of the sibling REST surface.
    pub fn http_base_url(&self) -> String {
        format!(
            "{}://{}{}",
            crate::url::HTTP_SCHEME,
            self.host,
            crate::url::BASE_PATH
        )
    }
}

/// Builder for [`ConnectParams`].
#[derive(Debug, Clone, Default)]
pub struct ConnectParamsBuilder {
    host: Option<String>,
    database: Option<String>,
    token: Option<String>,
    compression: Compression,
}

impl ConnectParamsBuilder {
    /// Sets host and port, e.g. `localhost:3000`.
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the database name.
    pub fn database<S: Into<String>>(mut self, database: S) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the bearer token.
    pub fn token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Requests server-to-client frame compression.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Produces the parameters.
    ///
    /// # Errors
    ///
    /// `StdbError::Usage` if host or database are missing.
    pub fn build(self) -> StdbResult<ConnectParams> {
        Ok(ConnectParams {
            host: self.host.ok_or(StdbError::Usage("host is required"))?,
            database: self
                .database
                .ok_or(StdbError::Usage("database is required"))?,
            token: self.token,
            compression: self.compression,
        })
    }
}

/// Conversion into [`ConnectParams`], for URLs in the
/// [`stdb://` form](crate::url).
pub trait IntoConnectParams {
    fn into_connect_params(self) -> StdbResult<ConnectParams>;
}

impl IntoConnectParams for ConnectParams {
    fn into_connect_params(self) -> StdbResult<ConnectParams> {
        Ok(self)
    }
}

impl IntoConnectParams for url::Url {
    fn into_connect_params(self) -> StdbResult<ConnectParams> {
        if self.scheme() != crate::url::STDB {
            return Err(StdbError::UsageDetailed(format!(
                "unsupported scheme {:?} in connection URL",
                self.scheme()
            )));
        }
        let host = self
            .host_str()
            .ok_or(StdbError::Usage("connection URL misses a host"))?;
        let mut builder = ConnectParams::builder().host(match self.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        });

        let database = self.path().trim_start_matches('/');
        if database.is_empty() || database.contains('/') {
            return Err(StdbError::Usage(
                "connection URL path must name exactly the database",
            ));
        }
        builder = builder.database(database);

        for (key, value) in self.query_pairs() {
            match key.as_ref() {
                crate::url::OPTION_COMPRESSION => {
                    builder = builder.compression(match value.as_ref() {
                        "None" => Compression::None,
                        "Brotli" => Compression::Brotli,
                        "Gzip" => Compression::Gzip,
                        other => {
                            return Err(StdbError::UsageDetailed(format!(
                                "unknown compression {other:?} in connection URL"
                            )))
                        }
                    });
                }
                crate::url::OPTION_TOKEN => {
                    builder = builder.token(value.as_ref());
                }
                other => {
                    return Err(StdbError::UsageDetailed(format!(
                        "unknown option {other:?} in connection URL"
                    )))
                }
            }
        }
        builder.build()
    }
}

impl IntoConnectParams for &str {
    fn into_connect_params(self) -> StdbResult<ConnectParams> {
        url::Url::parse(self)
            .map_err(|e| StdbError::UsageDetailed(format!("malformed connection URL: {e}")))?
            .into_connect_params()
    }
}

impl IntoConnectParams for String {
    fn into_connect_params(self) -> StdbResult<ConnectParams> {
        self.as_str().into_connect_params()
    }
}
