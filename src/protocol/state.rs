use crate::error::{Error, Result, eyre};

/// State of the client/server conversation on one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Created,
    PerformingInitialSetup,
    Idle,
    PreparingStatement,
    ExecutingQuery,
    ExecutedQuery,
    ExecutingPreparedQuery,
    ExecutedPreparedQuery,
    RetrievingResultSetMetaData,
    RetrievingResultSet,
    ExecutingUpdate,
    ExecutedUpdate,
    ExecutingSql,
    ExecutedSql,
    ExecutingPreparedUpdate,
    ExecutedPreparedUpdate,
    ExecutingBatches,
    ExecutedBatches,
    Closed,
}

bitflags::bitflags! {
    /// Operations a state allows to start
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        const PREPARE_STATEMENTS = 1 << 0;
        const CLOSE_PREPARED_STATEMENT = 1 << 1;
        const EXECUTE_SQL = 1 << 2;
        const EXECUTE_PREPARED_QUERY = 1 << 3;
        const EXECUTE_PREPARED_UPDATE = 1 << 4;
        const ADD_BATCHES = 1 << 5;
        const EXECUTE_BATCH = 1 << 6;
    }
}

impl State {
    pub fn capabilities(self) -> Capabilities {
        match self {
            State::Idle
            | State::RetrievingResultSet
            | State::ExecutedUpdate
            | State::ExecutedSql
            | State::ExecutedPreparedUpdate
            | State::ExecutedBatches => Capabilities::all(),

            State::ExecutedQuery | State::ExecutedPreparedQuery => {
                Capabilities::PREPARE_STATEMENTS
                    | Capabilities::CLOSE_PREPARED_STATEMENT
                    | Capabilities::EXECUTE_SQL
                    | Capabilities::EXECUTE_PREPARED_QUERY
                    | Capabilities::EXECUTE_PREPARED_UPDATE
            }

            State::RetrievingResultSetMetaData => {
                Capabilities::PREPARE_STATEMENTS | Capabilities::CLOSE_PREPARED_STATEMENT
            }

            State::Created
            | State::PerformingInitialSetup
            | State::PreparingStatement
            | State::ExecutingQuery
            | State::ExecutingPreparedQuery
            | State::ExecutingUpdate
            | State::ExecutingSql
            | State::ExecutingPreparedUpdate
            | State::ExecutingBatches
            | State::Closed => Capabilities::empty(),
        }
    }

    pub fn allows(self, capability: Capabilities) -> bool {
        self.capabilities().contains(capability)
    }

    /// Transitional state held while a vendor call is in flight
    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            State::PerformingInitialSetup
                | State::PreparingStatement
                | State::ExecutingQuery
                | State::ExecutingPreparedQuery
                | State::RetrievingResultSetMetaData
                | State::ExecutingUpdate
                | State::ExecutingSql
                | State::ExecutingPreparedUpdate
                | State::ExecutingBatches
        )
    }
}

/// Holder of the current state with checked transitions
#[derive(Debug)]
pub struct StateMachine {
    state: State,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: State::Created,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn check_not_closed(&self) -> Result<()> {
        if self.state == State::Closed {
            return Err(Error::ProtocolState(self.state));
        }
        Ok(())
    }

    /// Fail unless the current state is exactly `expected`
    pub fn check_state(&self, expected: State) -> Result<()> {
        self.check_not_closed()?;
        if self.state != expected {
            return Err(Error::ProtocolState(self.state));
        }
        Ok(())
    }

    /// Fail unless the current state allows `capability`
    pub fn check_capability(&self, capability: Capabilities) -> Result<()> {
        self.check_not_closed()?;
        if !self.state.allows(capability) {
            return Err(Error::ProtocolState(self.state));
        }
        Ok(())
    }

    /// Move to `next`, which must differ from the current state
    pub fn set_state(&mut self, next: State) -> Result<()> {
        if self.state == next {
            return Err(Error::LibraryBug(eyre!(
                "transition from {:?} to itself",
                next
            )));
        }
        if self.state == State::Closed {
            return Err(Error::LibraryBug(eyre!(
                "transition out of {:?} to {:?}",
                self.state,
                next
            )));
        }
        tracing::trace!(from = ?self.state, to = ?next, "protocol state");
        self.state = next;
        Ok(())
    }

    /// Enter a transitional state, returning the state to restore afterwards
    pub fn enter(&mut self, temporary: State) -> Result<State> {
        self.check_not_closed()?;
        let previous = self.state;
        self.set_state(temporary)?;
        Ok(previous)
    }

    /// Leave a transitional state for `next`
    pub fn leave(&mut self, next: State) -> Result<()> {
        if self.state == next {
            return Ok(());
        }
        self.set_state(next)
    }

    /// Terminal transition; allowed from every state but `Closed`
    pub fn close(&mut self) -> Result<()> {
        self.set_state(State::Closed)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
