use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::col::ResultSetMetaData;
use crate::error::{Error, Result, eyre};
use crate::opts::Opts;
use crate::params::Parameters;
use crate::params_pool::ParametersPool;
use crate::protocol::data::{Owner, ProtocolData, ResultSetId};
use crate::protocol::database::{
    DatabaseProtocol, PreparedStatementResult, RetrievedRows, SqlOutcome,
};
use crate::protocol::state::{Capabilities, State, StateMachine};
use crate::protocol::wire::{Inbound, Outbound, StringEncoder, Wire};
use crate::resultset::{Backing, ResultRetrieval, StreamingResultSet, SwappableResultSet};
use crate::share::Sharing;

/// Result set as shared between the connection and its handle
pub type SharedResultSet<P> = SwappableResultSet<Arc<<P as DatabaseProtocol>::Decoder>>;

pub type ResultSetCell<P, S> = <S as Sharing>::Cell<SharedResultSet<P>>;

/// Outcome of `execute_sql`
pub enum SqlExecution<C> {
    ResultSet(ResultSetId, C),
    UpdateCount(u32),
    None,
}

/// Drives one connection's conversation through its states
///
/// All byte-level work is delegated to the vendor `DatabaseProtocol`. Before
/// anything else is sent, a connection-attached result set is read to the
/// end into memory so its rows stay available.
pub struct ConnectionProtocol<P: DatabaseProtocol, S: Sharing> {
    wire: Wire,
    database: P,
    decoder: Arc<P::Decoder>,
    encoder: StringEncoder,
    states: StateMachine,
    within_transaction: bool,
    auto_commit: bool,
    data: ProtocolData<ResultSetCell<P, S>>,
    parameters_pool: Option<ParametersPool>,
    evict_delta: Duration,
    next_handle: u64,
}

impl<P: DatabaseProtocol, S: Sharing> ConnectionProtocol<P, S> {
    pub fn new(database: P, inbound: Inbound, outbound: Outbound, evict_delta: Duration) -> Self {
        let decoder = database.row_decoder();
        let encoder = StringEncoder::new(database.max_string_bytes());
        Self {
            wire: Wire::new(inbound, outbound),
            database,
            decoder,
            encoder,
            states: StateMachine::new(),
            within_transaction: false,
            auto_commit: false,
            data: ProtocolData::new(),
            parameters_pool: None,
            evict_delta,
            next_handle: 1,
        }
    }

    pub fn state(&self) -> State {
        self.states.state()
    }

    pub fn is_closed(&self) -> bool {
        self.states.state() == State::Closed
    }

    pub fn within_transaction(&self) -> bool {
        self.within_transaction
    }

    pub fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    pub fn database(&self) -> &P {
        &self.database
    }

    pub fn database_mut(&mut self) -> &mut P {
        &mut self.database
    }

    /// Number of result sets not yet closed
    pub fn open_result_sets(&self) -> usize {
        self.data.len()
    }

    /// Fresh identifier for a statement or prepared statement handle
    pub fn next_handle_id(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    // ========================================================================
    // Transition helpers
    // ========================================================================

    /// Run `op` in `temporary`, then move to `next` (or back to where it
    /// started). A failed `op` leaves the connection idle.
    fn with_temporary_state<R>(
        &mut self,
        temporary: State,
        next: Option<State>,
        op: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let previous = self.states.enter(temporary)?;
        let result = op(self);
        let target = match (&result, next) {
            (Ok(_), Some(next)) => next,
            (Ok(_), None) => previous,
            (Err(_), _) => State::Idle,
        };
        let left = self.states.leave(target);
        let value = result?;
        left?;
        Ok(value)
    }

    fn find_connection_attached_result_set(&self) -> Result<Option<ResultSetCell<P, S>>> {
        let mut found = None;
        for cell in self.data.all() {
            if S::with(&cell, |rs| Ok(rs.is_connection_attached()))? {
                if found.is_some() {
                    return Err(Error::LibraryBug(eyre!(
                        "more than one connection-attached result set"
                    )));
                }
                found = Some(cell);
            }
        }
        Ok(found)
    }

    /// Materialize the connection-attached result set, if any
    fn buffer_any_ongoing_result_set(&mut self) -> Result<()> {
        let Some(cell) = self.find_connection_attached_result_set()? else {
            return Ok(());
        };
        let materialized = S::with(&cell, |rs| rs.materialize(self));
        if self.states.state() == State::RetrievingResultSet {
            self.states.set_state(State::Idle)?;
        }
        if let Err(err) = &materialized {
            tracing::warn!(error = %err, "materializing failed, closing the result set");
            let id = S::with(&cell, |rs| {
                rs.invalidate();
                Ok(rs.id())
            })?;
            self.data.remove(id);
        }
        materialized.map(|_swapped| ())
    }

    fn begin_transaction_if_not_started(&mut self) -> Result<()> {
        if !self.within_transaction {
            self.database.send_begin(&mut self.wire)?;
            self.within_transaction = true;
        }
        Ok(())
    }

    /// Read result metadata and attach a streaming result set for it
    fn retrieve_result_set(
        &mut self,
        owner: Owner,
        retrieve: impl FnOnce(&mut Self) -> Result<ResultSetMetaData<P::DataType>>,
    ) -> Result<(ResultSetId, ResultSetCell<P, S>)> {
        let metadata = self.with_temporary_state(State::RetrievingResultSetMetaData, None, retrieve)?;

        let id = self.data.next_id();
        let streaming = StreamingResultSet::new(Arc::new(metadata), Arc::clone(&self.decoder));
        let attached = streaming.is_attached();
        let cell = S::share(SwappableResultSet::new(id, Backing::Streaming(streaming)));
        self.data.add(id, owner, cell.clone());

        self.states.set_state(if attached {
            State::RetrievingResultSet
        } else {
            State::Idle
        })?;
        Ok((id, cell))
    }

    // ========================================================================
    // Operations
    // ========================================================================

    #[tracing::instrument(skip_all)]
    pub fn perform_initial_setup(&mut self, opts: &Opts) -> Result<()> {
        self.states.check_state(State::Created)?;
        self.with_temporary_state(State::PerformingInitialSetup, Some(State::Idle), |this| {
            this.database
                .perform_initial_setup(&mut this.wire, &this.encoder, opts)
        })?;
        if opts.auto_commit {
            self.set_auto_commit(true)?;
        }
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn set_auto_commit(&mut self, on: bool) -> Result<()> {
        self.states.check_capability(Capabilities::EXECUTE_SQL)?;
        self.buffer_any_ongoing_result_set()?;
        self.database
            .set_auto_commit(&mut self.wire, &self.encoder, on)?;
        self.auto_commit = on;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn execute_query(
        &mut self,
        owner: Owner,
        sql: &str,
    ) -> Result<(ResultSetId, ResultSetCell<P, S>)> {
        self.states.check_capability(Capabilities::EXECUTE_SQL)?;
        self.buffer_any_ongoing_result_set()?;
        self.begin_transaction_if_not_started()?;
        self.with_temporary_state(State::ExecutingQuery, Some(State::ExecutedQuery), |this| {
            this.database.execute_query(&mut this.wire, &this.encoder, sql)
        })?;
        self.retrieve_result_set(owner, |this| {
            this.database.retrieve_result_metadata(&mut this.wire)
        })
    }

    #[tracing::instrument(skip_all)]
    pub fn execute_update(&mut self, sql: &str) -> Result<u32> {
        self.states.check_capability(Capabilities::EXECUTE_SQL)?;
        self.buffer_any_ongoing_result_set()?;
        self.begin_transaction_if_not_started()?;
        self.with_temporary_state(State::ExecutingUpdate, Some(State::ExecutedUpdate), |this| {
            this.database.execute_update(&mut this.wire, &this.encoder, sql)
        })
    }

    #[tracing::instrument(skip_all)]
    pub fn execute_sql(&mut self, owner: Owner, sql: &str) -> Result<SqlExecution<ResultSetCell<P, S>>> {
        self.states.check_capability(Capabilities::EXECUTE_SQL)?;
        self.buffer_any_ongoing_result_set()?;
        self.begin_transaction_if_not_started()?;
        let outcome = self.with_temporary_state(State::ExecutingSql, Some(State::ExecutedSql), |this| {
            this.database.execute_sql(&mut this.wire, &this.encoder, sql)
        })?;
        Ok(match outcome {
            SqlOutcome::ResultSet => {
                let (id, cell) = self.retrieve_result_set(owner, |this| {
                    this.database.retrieve_result_metadata(&mut this.wire)
                })?;
                SqlExecution::ResultSet(id, cell)
            }
            SqlOutcome::UpdateCount(count) => SqlExecution::UpdateCount(count),
            SqlOutcome::None => SqlExecution::None,
        })
    }

    #[tracing::instrument(skip_all)]
    pub fn prepare(&mut self, sql: &str) -> Result<PreparedStatementResult<P::PreparedStatement>> {
        self.states.check_capability(Capabilities::PREPARE_STATEMENTS)?;
        self.buffer_any_ongoing_result_set()?;
        self.with_temporary_state(State::PreparingStatement, None, |this| {
            this.database.prepare_statement(&mut this.wire, &this.encoder, sql)
        })
    }

    #[tracing::instrument(skip_all)]
    pub fn execute_prepared_query(
        &mut self,
        owner: Owner,
        statement: &P::PreparedStatement,
        parameters: &Parameters,
    ) -> Result<(ResultSetId, ResultSetCell<P, S>)> {
        self.states.check_capability(Capabilities::EXECUTE_PREPARED_QUERY)?;
        check_all_set(parameters)?;
        self.buffer_any_ongoing_result_set()?;
        self.begin_transaction_if_not_started()?;
        self.with_temporary_state(
            State::ExecutingPreparedQuery,
            Some(State::ExecutedPreparedQuery),
            |this| {
                this.database
                    .execute_prepared_query(statement, &mut this.wire, &this.encoder, parameters)
            },
        )?;
        self.retrieve_result_set(owner, |this| {
            this.database
                .retrieve_prepared_result_metadata(&mut this.wire, statement)
        })
    }

    #[tracing::instrument(skip_all)]
    pub fn execute_prepared_update(
        &mut self,
        statement: &P::PreparedStatement,
        parameters: &Parameters,
    ) -> Result<u32> {
        self.states.check_capability(Capabilities::EXECUTE_PREPARED_UPDATE)?;
        check_all_set(parameters)?;
        self.buffer_any_ongoing_result_set()?;
        self.begin_transaction_if_not_started()?;
        self.with_temporary_state(
            State::ExecutingPreparedUpdate,
            Some(State::ExecutedPreparedUpdate),
            |this| {
                this.database
                    .execute_prepared_update(statement, &mut this.wire, &this.encoder, parameters)
            },
        )
    }

    #[tracing::instrument(skip_all)]
    pub fn execute_batches(
        &mut self,
        statement: &P::PreparedStatement,
        batches: &[Parameters],
    ) -> Result<Vec<i32>> {
        self.states.check_capability(Capabilities::EXECUTE_BATCH)?;
        for batch in batches {
            check_all_set(batch)?;
        }
        self.buffer_any_ongoing_result_set()?;
        self.begin_transaction_if_not_started()?;
        self.with_temporary_state(State::ExecutingBatches, Some(State::ExecutedBatches), |this| {
            this.database
                .execute_batches(statement, batches, &mut this.wire, &this.encoder)
        })
    }

    /// Whether batch entries may be added in the current state
    pub fn check_add_batches(&self) -> Result<()> {
        self.states.check_capability(Capabilities::ADD_BATCHES)
    }

    #[tracing::instrument(skip_all)]
    pub fn close_prepared_statement(&mut self, statement: &P::PreparedStatement) -> Result<()> {
        self.states.check_capability(Capabilities::CLOSE_PREPARED_STATEMENT)?;
        self.buffer_any_ongoing_result_set()?;
        self.database
            .close_prepared_statement(statement, &mut self.wire)
    }

    #[tracing::instrument(skip_all)]
    pub fn commit(&mut self) -> Result<()> {
        self.states.check_capability(Capabilities::EXECUTE_SQL)?;
        self.buffer_any_ongoing_result_set()?;
        let committed = self.database.send_commit(&mut self.wire);
        self.within_transaction = false;
        committed
    }

    /// Close every open result set of `owner`
    pub fn close_result_sets_of(&mut self, owner: Owner) -> Result<()> {
        let mut outcome = Ok(());
        for (_id, cell) in self.data.result_sets_of(owner) {
            let closed = S::with(&cell, |rs| {
                if rs.is_closed() {
                    Ok(())
                } else {
                    rs.close(self)
                }
            });
            outcome = outcome.and(closed);
        }
        outcome
    }

    /// Disconnect; the connection ends up closed whatever the server answers
    #[tracing::instrument(skip_all)]
    pub fn close(&mut self) -> Result<()> {
        self.states.check_not_closed()?;
        let mut outcome = Ok(());
        for cell in self.data.all() {
            outcome = outcome.and(S::with(&cell, |rs| {
                rs.invalidate();
                Ok(())
            }));
        }
        self.data.clear();
        let sent = self.database.send_close(&mut self.wire);
        self.states.close()?;
        outcome.and(sent)
    }

    // ========================================================================
    // Parameter containers
    // ========================================================================

    fn parameters_pool(&mut self) -> Result<&mut ParametersPool> {
        if self.parameters_pool.is_none() {
            self.parameters_pool = Some(ParametersPool::new(self.evict_delta)?);
        }
        self.parameters_pool
            .as_mut()
            .ok_or_else(|| Error::LibraryBug(eyre!("parameter pool missing after creation")))
    }

    pub fn allocate_parameters(&mut self, count: usize) -> Result<Parameters> {
        if count == 0 {
            return Ok(Parameters::new(0));
        }
        self.parameters_pool()?.allocate(count)
    }

    pub fn allocate_parameters_copy(&mut self, source: &Parameters) -> Result<Parameters> {
        if source.is_empty() {
            return Ok(Parameters::new(0));
        }
        self.parameters_pool()?.allocate_copy(source)
    }

    pub fn free_parameters(&mut self, parameters: Parameters) -> Result<()> {
        if parameters.is_empty() {
            return Ok(());
        }
        self.parameters_pool()?.free(parameters, Instant::now())
    }
}

fn check_all_set(parameters: &Parameters) -> Result<()> {
    if !parameters.are_all_set() {
        return Err(Error::BadUsageError(
            "all parameters must be set before execution".to_string(),
        ));
    }
    Ok(())
}

impl<P: DatabaseProtocol, S: Sharing> ResultRetrieval for ConnectionProtocol<P, S> {
    fn retrieve_rows(
        &mut self,
        dst: &mut [u8],
        max_rows: usize,
        bytes_per_row: usize,
        retrieved: &mut RetrievedRows,
    ) -> Result<()> {
        self.states.check_state(State::RetrievingResultSet)?;
        let fetched = self
            .database
            .retrieve_result_rows(&mut self.wire, dst, max_rows, bytes_per_row, retrieved);
        if fetched.is_err() {
            // the error reply ends the result on the server side
            self.states.set_state(State::Idle)?;
        }
        fetched
    }

    fn end_result_retrieval(&mut self) -> Result<()> {
        self.states.check_state(State::RetrievingResultSet)?;
        self.states.set_state(State::Idle)
    }

    fn close_result_set(&mut self) -> Result<()> {
        self.states.check_state(State::RetrievingResultSet)?;
        let drained = self.database.close_result_set(&mut self.wire);
        self.states.set_state(State::Idle)?;
        drained
    }

    fn result_set_closed(&mut self, id: ResultSetId) -> Result<()> {
        self.data.remove(id);
        Ok(())
    }
}
