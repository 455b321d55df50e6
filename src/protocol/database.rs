use std::fmt::Debug;
use std::sync::Arc;

use crate::col::ResultSetMetaData;
use crate::error::Result;
use crate::opts::Opts;
use crate::params::Parameters;
use crate::protocol::decoder::RowDecoder;
use crate::protocol::wire::{StringEncoder, Wire};

/// Row lengths reported by one fetch
#[derive(Debug, Default, Clone)]
pub struct RetrievedRows {
    row_lengths: Vec<u32>,
}

impl RetrievedRows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.row_lengths.clear();
    }

    pub fn push(&mut self, row_length: u32) {
        self.row_lengths.push(row_length);
    }

    pub fn num_rows(&self) -> usize {
        self.row_lengths.len()
    }

    pub fn row_length(&self, index: usize) -> Option<u32> {
        self.row_lengths.get(index).copied()
    }

    pub fn row_lengths(&self) -> &[u32] {
        &self.row_lengths
    }

    /// Total bytes of the rows from `from` on
    pub fn bytes_from(&self, from: usize) -> usize {
        self.row_lengths
            .get(from..)
            .map_or(0, |lengths| lengths.iter().map(|&len| len as usize).sum())
    }
}

/// What the server answered to a free-form SQL statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlOutcome {
    /// Result set metadata follows on the wire
    ResultSet,
    UpdateCount(u32),
    None,
}

#[derive(Debug)]
pub struct PreparedStatementResult<PS> {
    pub statement: PS,
    pub num_parameters: usize,
}

/// Byte-level half of a vendor protocol
///
/// Implementations read and write the wire but never track conversation
/// state; the connection protocol calls them only when the call is legal.
pub trait DatabaseProtocol {
    type PreparedStatement: Debug;
    type DataType: Copy + Debug;
    type Decoder: RowDecoder<DataType = Self::DataType>;

    /// Largest encoded string the server accepts
    fn max_string_bytes(&self) -> usize;

    fn row_decoder(&self) -> Arc<Self::Decoder>;

    fn prepared_statement_id(&self, statement: &Self::PreparedStatement) -> u64;

    fn perform_initial_setup(&mut self, wire: &mut Wire, encoder: &StringEncoder, opts: &Opts)
    -> Result<()>;

    fn set_auto_commit(&mut self, wire: &mut Wire, encoder: &StringEncoder, on: bool) -> Result<()>;

    fn execute_query(&mut self, wire: &mut Wire, encoder: &StringEncoder, sql: &str) -> Result<()>;

    fn execute_update(&mut self, wire: &mut Wire, encoder: &StringEncoder, sql: &str) -> Result<u32>;

    fn execute_sql(&mut self, wire: &mut Wire, encoder: &StringEncoder, sql: &str)
    -> Result<SqlOutcome>;

    fn prepare_statement(
        &mut self,
        wire: &mut Wire,
        encoder: &StringEncoder,
        sql: &str,
    ) -> Result<PreparedStatementResult<Self::PreparedStatement>>;

    fn execute_prepared_query(
        &mut self,
        statement: &Self::PreparedStatement,
        wire: &mut Wire,
        encoder: &StringEncoder,
        parameters: &Parameters,
    ) -> Result<()>;

    fn execute_prepared_update(
        &mut self,
        statement: &Self::PreparedStatement,
        wire: &mut Wire,
        encoder: &StringEncoder,
        parameters: &Parameters,
    ) -> Result<u32>;

    fn close_prepared_statement(
        &mut self,
        statement: &Self::PreparedStatement,
        wire: &mut Wire,
    ) -> Result<()>;

    /// One update count per batch entry
    fn execute_batches(
        &mut self,
        statement: &Self::PreparedStatement,
        batches: &[Parameters],
        wire: &mut Wire,
        encoder: &StringEncoder,
    ) -> Result<Vec<i32>>;

    fn send_begin(&mut self, wire: &mut Wire) -> Result<()>;

    fn send_commit(&mut self, wire: &mut Wire) -> Result<()>;

    fn retrieve_result_metadata(
        &mut self,
        wire: &mut Wire,
    ) -> Result<ResultSetMetaData<Self::DataType>>;

    fn retrieve_prepared_result_metadata(
        &mut self,
        wire: &mut Wire,
        statement: &Self::PreparedStatement,
    ) -> Result<ResultSetMetaData<Self::DataType>>;

    /// Read up to `max_rows` rows into `dst`, recording each row's length
    ///
    /// Zero rows means the result is exhausted.
    fn retrieve_result_rows(
        &mut self,
        wire: &mut Wire,
        dst: &mut [u8],
        max_rows: usize,
        bytes_per_row: usize,
        retrieved: &mut RetrievedRows,
    ) -> Result<()>;

    /// Discard the rest of the current result
    fn close_result_set(&mut self, wire: &mut Wire) -> Result<()>;

    fn send_close(&mut self, wire: &mut Wire) -> Result<()>;
}
