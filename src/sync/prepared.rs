use std::mem;

use crate::error::{Error, Result};
use crate::params::Parameters;
use crate::protocol::connection::ConnectionProtocol;
use crate::protocol::data::Owner;
use crate::protocol::database::DatabaseProtocol;
use crate::share::{Sharing, Unsynchronized};
use crate::sync::conn::ProtocolCell;
use crate::sync::result_set::ResultSet;
use crate::value::Value;

/// Statement prepared on the server, executed with bound parameters
///
/// Parameter indexes start at 0. Every parameter must be set before an
/// execution; values stay bound across executions until
/// [`clear_parameters`](Self::clear_parameters).
pub struct PreparedStatement<P: DatabaseProtocol, S: Sharing = Unsynchronized> {
    protocol: ProtocolCell<P, S>,
    id: u64,
    statement: P::PreparedStatement,
    parameters: Parameters,
    batches: Vec<Parameters>,
    closed: bool,
}

impl<P: DatabaseProtocol, S: Sharing> PreparedStatement<P, S> {
    pub(crate) fn new(
        protocol: ProtocolCell<P, S>,
        id: u64,
        statement: P::PreparedStatement,
        parameters: Parameters,
    ) -> Self {
        Self {
            protocol,
            id,
            statement,
            parameters,
            batches: Vec::new(),
            closed: false,
        }
    }

    fn owner(&self) -> Owner {
        Owner::PreparedStatement(self.id)
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::PreparedStatementClosed);
        }
        Ok(())
    }

    fn parameters_mut(&mut self) -> Result<&mut Parameters> {
        self.check_open()?;
        Ok(&mut self.parameters)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Vendor handle of the statement
    pub fn statement(&self) -> &P::PreparedStatement {
        &self.statement
    }

    pub fn num_parameters(&self) -> usize {
        self.parameters.len()
    }

    /// Entries added with [`add_batch`](Self::add_batch) and not yet executed
    pub fn num_batches(&self) -> usize {
        self.batches.len()
    }

    pub fn set(&mut self, index: usize, value: Value) -> Result<()> {
        self.parameters_mut()?.set(index, value)
    }

    pub fn set_null(&mut self, index: usize) -> Result<()> {
        self.parameters_mut()?.set_null(index)
    }

    pub fn set_bool(&mut self, index: usize, value: bool) -> Result<()> {
        self.parameters_mut()?.set_bool(index, value)
    }

    pub fn set_byte(&mut self, index: usize, value: i8) -> Result<()> {
        self.parameters_mut()?.set_byte(index, value)
    }

    pub fn set_short(&mut self, index: usize, value: i16) -> Result<()> {
        self.parameters_mut()?.set_short(index, value)
    }

    pub fn set_int(&mut self, index: usize, value: i32) -> Result<()> {
        self.parameters_mut()?.set_int(index, value)
    }

    pub fn set_long(&mut self, index: usize, value: i64) -> Result<()> {
        self.parameters_mut()?.set_long(index, value)
    }

    pub fn set_float(&mut self, index: usize, value: f32) -> Result<()> {
        self.parameters_mut()?.set_float(index, value)
    }

    pub fn set_double(&mut self, index: usize, value: f64) -> Result<()> {
        self.parameters_mut()?.set_double(index, value)
    }

    #[cfg(feature = "with-rust-decimal")]
    pub fn set_decimal(&mut self, index: usize, value: rust_decimal::Decimal) -> Result<()> {
        self.parameters_mut()?.set_decimal(index, value)
    }

    pub fn set_string(&mut self, index: usize, value: &str) -> Result<()> {
        self.parameters_mut()?.set_string(index, value)
    }

    pub fn clear_parameters(&mut self) -> Result<()> {
        self.parameters_mut()?.clear();
        Ok(())
    }

    pub fn execute_query(&self) -> Result<ResultSet<P, S>> {
        self.check_open()?;
        let (id, cell) = S::with(&self.protocol, |p| {
            p.execute_prepared_query(self.owner(), &self.statement, &self.parameters)
        })?;
        Ok(ResultSet::new(self.protocol.clone(), id, cell))
    }

    pub fn execute_update(&self) -> Result<u32> {
        self.check_open()?;
        S::with(&self.protocol, |p| {
            p.execute_prepared_update(&self.statement, &self.parameters)
        })
    }

    /// Snapshot the current parameters as one batch entry
    pub fn add_batch(&mut self) -> Result<()> {
        self.check_open()?;
        let batch = S::with(&self.protocol, |p| {
            p.check_add_batches()?;
            p.allocate_parameters_copy(&self.parameters)
        })?;
        self.batches.push(batch);
        Ok(())
    }

    /// Run every added batch entry, returning one update count per entry
    ///
    /// The entries are consumed whether or not the server accepts them.
    pub fn execute_batches(&mut self) -> Result<Vec<i32>> {
        self.check_open()?;
        let batches = mem::take(&mut self.batches);
        S::with(&self.protocol, |p| {
            let counts = p.execute_batches(&self.statement, &batches);
            let freed = free_all(p, batches);
            let counts = counts?;
            freed?;
            Ok(counts)
        })
    }

    /// Close the statement on the server and return its containers to the pool
    pub fn close(&mut self) -> Result<()> {
        self.check_open()?;
        self.closed = true;
        let parameters = mem::replace(&mut self.parameters, Parameters::new(0));
        let batches = mem::take(&mut self.batches);
        S::with(&self.protocol, |p| {
            let result_sets = p.close_result_sets_of(self.owner());
            let closed = if p.is_closed() {
                Ok(())
            } else {
                p.close_prepared_statement(&self.statement)
            };
            let freed = p
                .free_parameters(parameters)
                .and(free_all(p, batches));
            result_sets.and(closed).and(freed)
        })
    }
}

fn free_all<P: DatabaseProtocol, S: Sharing>(
    protocol: &mut ConnectionProtocol<P, S>,
    batches: Vec<Parameters>,
) -> Result<()> {
    batches
        .into_iter()
        .try_for_each(|batch| protocol.free_parameters(batch))
}
