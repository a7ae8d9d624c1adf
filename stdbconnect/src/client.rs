use std::collections::HashMap;

use crate::cache::{Change, ClientCache};
use crate::callbacks::EventHandler;
use crate::conn::{
    ConnectParams, ConnectionConfiguration, ConnectionCore, ConnectionState, Received, WsTransport,
};
use crate::protocol::{
    decompress, ClientMessage, ReducerOutcome, ServerMessage, UNSUBSCRIBE_SEND_DROPPED_ROWS,
};
use crate::row::{Row, TableRow};
use crate::schema::Schema;
use crate::types::{AlgebraicValue, Field};
use crate::{bsatn, StdbError, StdbResult};

/// The high-level client: one connection, one schema, one local cache.
///
/// All methods run on the single consumer of the transport. `frame_tick`
/// drives one receive from the calling thread; `run_threaded` moves the
/// client into an owned background loop. Snapshot readers (`get_all`,
/// `get_typed`) return owned copies and may be handed across threads.
pub struct DbClient {
    core: ConnectionCore,
    schema: Schema,
    cache: ClientCache,
    handler: Box<dyn EventHandler + Send>,
    subscriptions: HashMap<u32, Vec<String>>,
    params: Option<ConnectParams>,
}

impl std::fmt::Debug for DbClient {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct("DbClient")
            .field("state", &self.core.state())
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

impl DbClient {
    /// Builds a client over a parsed schema with default configuration.
    pub fn new(schema: Schema, handler: Box<dyn EventHandler + Send>) -> Self {
        Self::with_configuration(schema, handler, ConnectionConfiguration::default())
    }

    /// Builds a client with explicit connection configuration.
    pub fn with_configuration(
        schema: Schema,
        handler: Box<dyn EventHandler + Send>,
        configuration: ConnectionConfiguration,
    ) -> Self {
        let cache = ClientCache::new(&schema);
        Self {
            core: ConnectionCore::new(configuration),
            schema,
            cache,
            handler,
            subscriptions: HashMap::new(),
            params: None,
        }
    }

    /// The connection's lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.core.state()
    }

    /// The schema the client was built over.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The token issued at connect time, e.g. for persisting.
    pub fn token(&self) -> Option<&str> {
        self.core.token()
    }

    /// The identity issued at connect time.
    pub fn identity(&self) -> Option<&[u8; 32]> {
        self.core.identity()
    }

    /// Attaches an already-open transport.
    pub fn connect(&mut self, transport: Box<dyn WsTransport>) {
        self.core.attach(transport);
    }

    /// Dials the subscribe endpoint of `params` and attaches the owned
    /// transport.
    pub fn connect_real(&mut self, params: ConnectParams) -> StdbResult<()> {
        let result = self.core.connect_real(&params);
        self.params = Some(params);
        result
    }

    /// One backoff-governed reconnect attempt with the parameters of the
    /// last `connect_real`.
    ///
    /// Sleeps the backoff delay for the current attempt, then dials.
    /// Resubscribing is the application's task, from `on_connect`.
    pub fn reconnect(&mut self) -> StdbResult<()> {
        if !self.core.should_reconnect() {
            return Err(StdbError::Usage(
                "reconnect attempts exhausted or connection still up",
            ));
        }
        let params = self
            .params
            .clone()
            .ok_or(StdbError::Usage("reconnect requires a prior connect_real"))?;
        let delay = self.core.backoff_delay(self.core.reconnect_attempts());
        debug!("reconnecting after {delay:?}");
        std::thread::sleep(delay);
        self.core.connect_real(&params)
    }

    /// Closes the connection; no further events are emitted.
    pub fn close(&mut self) {
        self.core.close();
        self.subscriptions.clear();
    }

    /// Subscribes a set of queries; returns the query-set id addressing
    /// them.
    pub fn subscribe(&mut self, queries: Vec<String>) -> StdbResult<u32> {
        let request_id = self.core.next_request_id();
        let query_set_id = self.core.next_query_set_id();
        let frame = ClientMessage::Subscribe {
            request_id,
            query_set_id,
            queries: queries.clone(),
        }
        .encode()?;
        self.core.send(frame)?;
        self.subscriptions.insert(query_set_id, queries);
        Ok(query_set_id)
    }

    /// Drops one query set; returns the request id of the unsubscribe.
    pub fn unsubscribe(&mut self, query_set_id: u32, send_dropped_rows: bool) -> StdbResult<u32> {
        let request_id = self.core.next_request_id();
        let frame = ClientMessage::Unsubscribe {
            request_id,
            query_set_id,
            flags: if send_dropped_rows {
                UNSUBSCRIBE_SEND_DROPPED_ROWS
            } else {
                0
            },
        }
        .encode()?;
        self.core.send(frame)?;
        Ok(request_id)
    }

    /// Invokes a reducer with pre-encoded arguments.
    pub fn call_reducer_raw(&mut self, reducer: &str, args: Vec<u8>) -> StdbResult<u32> {
        let request_id = self.core.next_request_id();
        let frame = ClientMessage::CallReducer {
            request_id,
            reducer: reducer.to_string(),
            args,
        }
        .encode()?;
        self.core.send(frame)?;
        Ok(request_id)
    }

    /// Invokes a reducer, encoding `fields` against its parameter columns.
    ///
    /// Fields are matched by name, in the reducer's declaration order; an
    /// unknown reducer is a synchronous usage error.
    pub fn call_reducer(&mut self, reducer: &str, fields: &[Field]) -> StdbResult<u32> {
        let reducer_def = self
            .schema
            .reducer(reducer)
            .ok_or_else(|| StdbError::UsageDetailed(format!("unknown reducer {reducer:?}")))?;
        let args = bsatn::encode_fields_as_product(fields, &reducer_def.params)?;
        self.call_reducer_raw(reducer, args)
    }

    /// Invokes a procedure with pre-encoded arguments.
    pub fn call_procedure_raw(&mut self, procedure: &str, args: Vec<u8>) -> StdbResult<u32> {
        let request_id = self.core.next_request_id();
        let frame = ClientMessage::CallProcedure {
            request_id,
            procedure: procedure.to_string(),
            args,
        }
        .encode()?;
        self.core.send(frame)?;
        Ok(request_id)
    }

    /// Submits a single query without a subscription.
    pub fn one_off_query(&mut self, query: &str) -> StdbResult<u32> {
        let request_id = self.core.next_request_id();
        let frame = ClientMessage::OneOffQuery {
            request_id,
            query: query.to_string(),
        }
        .encode()?;
        self.core.send(frame)?;
        Ok(request_id)
    }

    /// An owned snapshot of all cached rows of one table.
    pub fn get_all(&self, table: &str) -> Vec<Row> {
        self.cache.get_all(table)
    }

    /// Number of cached rows of one table.
    pub fn count(&self, table: &str) -> usize {
        self.cache.count(table)
    }

    /// Looks one cached row up by primary-key value.
    pub fn find(&self, table: &str, pk_value: &AlgebraicValue) -> StdbResult<Option<Row>> {
        self.cache.find(table, pk_value)
    }

    /// Typed lookup by primary-key value.
    pub fn find_typed<T: TableRow>(&self, pk_value: &AlgebraicValue) -> StdbResult<Option<T>> {
        self.cache
            .find(T::TABLE_NAME, pk_value)?
            .map(|row| T::from_row(&row))
            .transpose()
    }

    /// Typed owned snapshot of one table.
    pub fn get_typed<T: TableRow>(&self) -> StdbResult<Vec<T>> {
        self.cache
            .get_all(T::TABLE_NAME)
            .iter()
            .map(T::from_row)
            .collect()
    }

    /// The query sets currently considered active.
    pub fn active_subscriptions(&self) -> impl Iterator<Item = u32> + '_ {
        self.subscriptions.keys().copied()
    }

    /// Drives one transport event through the state machine.
    ///
    /// Returns `false` once the connection is down. Frame-scoped errors
    /// (codec, framing, cache application) are reported via `on_error` and
    /// leave the connection up; transport errors and EOF transition to
    /// `disconnected` and emit `on_disconnect`.
    pub fn frame_tick(&mut self) -> StdbResult<bool> {
        match self.core.receive() {
            Ok(Received::Frame(frame)) => {
                if let Err(e) = self.process_frame(&frame) {
                    error!("dropping frame: {e}");
                    self.handler.on_error(&e.to_string());
                }
                Ok(true)
            }
            Ok(Received::Nothing) => Ok(true),
            Ok(Received::Closed) => {
                self.core.record_disconnect();
                self.handler.on_disconnect("connection closed by server");
                Ok(false)
            }
            Err(StdbError::NotConnected) => Err(StdbError::NotConnected),
            Err(e) => {
                self.core.record_disconnect();
                self.handler.on_disconnect(&e.to_string());
                Ok(false)
            }
        }
    }

    /// Runs the receive loop on an owned background thread until the
    /// connection goes down; the client is handed back at the end.
    pub fn run_threaded(mut self) -> std::thread::JoinHandle<Self> {
        std::thread::spawn(move || {
            loop {
                match self.frame_tick() {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => {
                        error!("receive loop stopped: {e}");
                        break;
                    }
                }
            }
            self
        })
    }

    /// Decodes one received frame and dispatches it.
    pub fn process_frame(&mut self, frame: &[u8]) -> StdbResult<()> {
        let payload = decompress(frame)?;
        let message = ServerMessage::parse(&payload)?;
        trace!("dispatching {}", message.kind_name());
        match message {
            ServerMessage::InitialConnection {
                identity,
                connection_id,
                token,
            } => {
                self.core.mark_authenticated(identity, connection_id, token);
                self.handler.on_connect(
                    &identity,
                    &connection_id,
                    self.core.token().unwrap_or_default(),
                );
            }
            ServerMessage::SubscribeApplied {
                request_id,
                query_set_id,
                rows,
            } => {
                trace!("subscribe {request_id}/{query_set_id} applied");
                let changes = self.cache.apply_subscribe_applied(&rows)?;
                Self::dispatch_changes(self.handler.as_mut(), &changes);
                for table_rows in &rows.tables {
                    self.handler
                        .on_subscribe_applied(&table_rows.table_name, table_rows.rows.num_rows());
                }
            }
            ServerMessage::UnsubscribeApplied {
                request_id,
                query_set_id,
                rows,
            } => {
                trace!("unsubscribe {request_id}/{query_set_id} applied");
                self.subscriptions.remove(&query_set_id);
                self.handler
                    .on_unsubscribe_applied(query_set_id, rows.as_ref());
            }
            ServerMessage::SubscriptionError {
                request_id,
                query_set_id,
                error,
            } => {
                warn!(
                    "subscription error for query set {query_set_id} (request {request_id:?}): {error}"
                );
                self.subscriptions.remove(&query_set_id);
                self.handler.on_error(&error);
            }
            ServerMessage::TransactionUpdate(updates) => {
                let changes = self.cache.apply_transaction_update(&updates)?;
                Self::dispatch_changes(self.handler.as_mut(), &changes);
            }
            ServerMessage::OneOffQueryResult { request_id, result } => {
                self.handler.on_query_result(request_id, &result);
            }
            ServerMessage::ReducerResult {
                request_id,
                timestamp,
                outcome,
            } => {
                trace!("reducer result for request {request_id} at {timestamp}");
                if let ReducerOutcome::Ok { transaction, .. } = &outcome {
                    let changes = self.cache.apply_transaction_update(transaction)?;
                    Self::dispatch_changes(self.handler.as_mut(), &changes);
                }
                self.handler.on_reducer_result(request_id, &outcome);
            }
            ServerMessage::ProcedureResult {
                status,
                timestamp,
                host_duration,
                request_id,
            } => {
                trace!("procedure result for request {request_id} at {timestamp}");
                self.handler
                    .on_procedure_result(request_id, &status, host_duration);
            }
        }
        Ok(())
    }

    fn dispatch_changes(handler: &mut (dyn EventHandler + Send), changes: &[Change]) {
        for change in changes {
            match change {
                Change::Insert { table, row } => handler.on_insert(table, row),
                Change::Delete { table, row } => handler.on_delete(table, row),
                Change::Update { table, old, new } => handler.on_update(table, old, new),
            }
        }
    }
}
