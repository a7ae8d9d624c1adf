// The REST surface under `/v1`: schema fetch, identity management, direct
// reducer calls, SQL, logs. All calls are blocking; the websocket side
// never depends on this module.

use serde::Deserialize;

use crate::conn::ConnectParams;
use crate::schema::Schema;
use crate::{StdbError, StdbResult};

/// Status and raw body of one REST exchange.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Identity and token as issued by `POST /v1/identity`.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityToken {
    pub identity: String,
    pub token: String,
}

/// A thin blocking client for the server's REST surface.
///
/// Carries the base URL (`http://<host>/v1`) and an optional bearer token
/// that is attached to every request.
#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

impl ApiClient {
    /// Builds a client for `host` (e.g. `localhost:3000`).
    pub fn new(host: &str) -> StdbResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| StdbError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            base_url: format!(
                "{}://{host}{}",
                crate::url::HTTP_SCHEME,
                crate::url::BASE_PATH
            ),
            token: None,
            client,
        })
    }

    /// Builds a client for the host and token of `params`.
    pub fn from_params(params: &ConnectParams) -> StdbResult<Self> {
        let mut api = Self::new(params.host())?;
        if let Some(token) = params.token() {
            api.token = Some(token.to_string());
        }
        Ok(api)
    }

    /// Builder-method for attaching a bearer token.
    #[must_use]
    pub fn with_token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Replaces the bearer token.
    pub fn set_token<S: Into<String>>(&mut self, token: S) {
        self.token = Some(token.into());
    }

    /// `GET /v1/ping`.
    pub fn ping(&self) -> StdbResult<()> {
        self.get("/ping").map(|_| ())
    }

    /// `GET /v1/database/{name}/schema?version=9`, raw descriptor.
    pub fn schema_descriptor(&self, database: &str) -> StdbResult<String> {
        let response = self.get(&format!("/database/{database}/schema?version=9"))?;
        String::from_utf8(response.body)
            .map_err(|_| StdbError::InvalidResponse("schema descriptor is not UTF-8".to_string()))
    }

    /// Fetches and parses the schema of one database.
    pub fn schema(&self, database: &str) -> StdbResult<Schema> {
        Schema::from_json(&self.schema_descriptor(database)?)
    }

    /// `POST /v1/identity`, a fresh identity and token.
    pub fn create_identity(&self) -> StdbResult<IdentityToken> {
        let response = self.post("/identity", None)?;
        serde_json::from_slice(&response.body).map_err(Into::into)
    }

    /// `GET /v1/identity/{id}/verify`; whether the configured token is
    /// valid for `identity`.
    pub fn verify_identity(&self, identity: &str) -> StdbResult<bool> {
        match self.get(&format!("/identity/{identity}/verify")) {
            Ok(_) => Ok(true),
            Err(StdbError::Unauthorized | StdbError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// `GET /v1/identity/public-key`, the token-signing key (DER bytes).
    pub fn public_key(&self) -> StdbResult<Vec<u8>> {
        self.get("/identity/public-key").map(|r| r.body)
    }

    /// `GET /v1/identity/{id}/databases`, the databases owned by an
    /// identity.
    pub fn databases(&self, identity: &str) -> StdbResult<Vec<String>> {
        #[derive(Deserialize)]
        struct Databases {
            databases: Vec<String>,
        }
        let response = self.get(&format!("/identity/{identity}/databases"))?;
        let parsed: Databases = serde_json::from_slice(&response.body)?;
        Ok(parsed.databases)
    }

    /// `POST /v1/identity/websocket-token`, a short-lived token for the
    /// subscribe handshake.
    pub fn websocket_token(&self) -> StdbResult<String> {
        #[derive(Deserialize)]
        struct WebsocketToken {
            token: String,
        }
        let response = self.post("/identity/websocket-token", None)?;
        let parsed: WebsocketToken = serde_json::from_slice(&response.body)?;
        Ok(parsed.token)
    }

    /// `POST /v1/database/{name}/call/{reducer}` with pre-encoded args
    /// (JSON or BSATN); the raw response body.
    pub fn call_reducer(&self, database: &str, reducer: &str, args: Vec<u8>) -> StdbResult<Vec<u8>> {
        self.post(&format!("/database/{database}/call/{reducer}"), Some(args))
            .map(|r| r.body)
    }

    /// `POST /v1/database/{name}/sql`, the raw result body.
    pub fn sql(&self, database: &str, query: &str) -> StdbResult<Vec<u8>> {
        self.post(
            &format!("/database/{database}/sql"),
            Some(query.as_bytes().to_vec()),
        )
        .map(|r| r.body)
    }

    /// `GET /v1/database/{name}`, the database descriptor.
    pub fn database_info(&self, database: &str) -> StdbResult<serde_json::Value> {
        let response = self.get(&format!("/database/{database}"))?;
        serde_json::from_slice(&response.body).map_err(Into::into)
    }

    /// `GET /v1/database/{name}/names`, the registered names.
    pub fn database_names(&self, database: &str) -> StdbResult<Vec<String>> {
        #[derive(Deserialize)]
        struct Names {
            names: Vec<String>,
        }
        let response = self.get(&format!("/database/{database}/names"))?;
        let parsed: Names = serde_json::from_slice(&response.body)?;
        Ok(parsed.names)
    }

    /// `GET /v1/database/{name}/identity`, the owning identity (hex).
    pub fn database_identity(&self, database: &str) -> StdbResult<String> {
        let response = self.get(&format!("/database/{database}/identity"))?;
        String::from_utf8(response.body)
            .map_err(|_| StdbError::InvalidResponse("identity is not UTF-8".to_string()))
    }

    /// `GET /v1/database/{name}/logs?num_lines=N`, the module log tail.
    pub fn logs(&self, database: &str, num_lines: u32) -> StdbResult<String> {
        let response = self.get(&format!("/database/{database}/logs?num_lines={num_lines}"))?;
        String::from_utf8(response.body)
            .map_err(|_| StdbError::InvalidResponse("log output is not UTF-8".to_string()))
    }

    /// One GET against the REST surface; `path` is relative to `/v1`.
    pub fn get(&self, path: &str) -> StdbResult<ApiResponse> {
        let mut request = self.client.get(format!("{}{path}", self.base_url));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        trace!("GET {path}");
        Self::evaluate(request.send())
    }

    /// One POST against the REST surface; `path` is relative to `/v1`.
    pub fn post(&self, path: &str, body: Option<Vec<u8>>) -> StdbResult<ApiResponse> {
        let mut request = self.client.post(format!("{}{path}", self.base_url));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.body(body);
        }
        trace!("POST {path}");
        Self::evaluate(request.send())
    }

    fn evaluate(
        result: Result<reqwest::blocking::Response, reqwest::Error>,
    ) -> StdbResult<ApiResponse> {
        let response = result.map_err(|e| {
            if e.is_connect() {
                StdbError::ConnectionFailed(e.to_string())
            } else {
                StdbError::RequestFailed(e.to_string())
            }
        })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| StdbError::RequestFailed(e.to_string()))?
            .to_vec();
        match status {
            200..=299 => Ok(ApiResponse { status, body }),
            401 | 403 => Err(StdbError::Unauthorized),
            404 => Err(StdbError::NotFound),
            _ => Err(StdbError::ServerError {
                status,
                message: String::from_utf8_lossy(&body).into_owned(),
            }),
        }
    }
}
