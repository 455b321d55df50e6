use crate::error::{Error, Result};
use crate::protocol::connection::SqlExecution;
use crate::protocol::data::Owner;
use crate::protocol::database::DatabaseProtocol;
use crate::share::{Sharing, Unsynchronized};
use crate::sync::conn::ProtocolCell;
use crate::sync::result_set::ResultSet;

/// Outcome of [`Statement::execute`]
pub enum ExecuteResult<P: DatabaseProtocol, S: Sharing = Unsynchronized> {
    ResultSet(ResultSet<P, S>),
    UpdateCount(u32),
    None,
}

/// Executes plain SQL text on its connection
pub struct Statement<P: DatabaseProtocol, S: Sharing = Unsynchronized> {
    protocol: ProtocolCell<P, S>,
    id: u64,
    closed: bool,
}

impl<P: DatabaseProtocol, S: Sharing> Statement<P, S> {
    pub(crate) fn new(protocol: ProtocolCell<P, S>, id: u64) -> Self {
        Self {
            protocol,
            id,
            closed: false,
        }
    }

    fn owner(&self) -> Owner {
        Owner::Statement(self.id)
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::AlreadyClosed);
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn execute_query(&self, sql: &str) -> Result<ResultSet<P, S>> {
        self.check_open()?;
        let (id, cell) = S::with(&self.protocol, |p| p.execute_query(self.owner(), sql))?;
        Ok(ResultSet::new(self.protocol.clone(), id, cell))
    }

    pub fn execute_update(&self, sql: &str) -> Result<u32> {
        self.check_open()?;
        S::with(&self.protocol, |p| p.execute_update(sql))
    }

    /// Execute `sql` whatever it produces
    pub fn execute(&self, sql: &str) -> Result<ExecuteResult<P, S>> {
        self.check_open()?;
        let execution = S::with(&self.protocol, |p| p.execute_sql(self.owner(), sql))?;
        Ok(match execution {
            SqlExecution::ResultSet(id, cell) => {
                ExecuteResult::ResultSet(ResultSet::new(self.protocol.clone(), id, cell))
            }
            SqlExecution::UpdateCount(count) => ExecuteResult::UpdateCount(count),
            SqlExecution::None => ExecuteResult::None,
        })
    }

    /// Close the statement along with the result sets it produced
    pub fn close(&mut self) -> Result<()> {
        self.check_open()?;
        self.closed = true;
        S::with(&self.protocol, |p| p.close_result_sets_of(self.owner()))
    }
}
