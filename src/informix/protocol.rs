use std::sync::Arc;

use zerocopy::byteorder::big_endian::U16 as U16BE;
use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::col::{ColumnDescription, ResultSetMetaData};
use crate::error::{Error, Result};
use crate::informix::data_type::InformixDataType;
use crate::informix::decoder::InformixRowDecoder;
use crate::informix::message::{
    MAX_STRING_BYTES, MessageType, OperationType, ResultType, TERMINATOR, check_num_columns,
    check_prepared_statement_id,
};
use crate::opts::Opts;
use crate::params::Parameters;
use crate::protocol::database::{
    DatabaseProtocol, PreparedStatementResult, RetrievedRows, SqlOutcome,
};
use crate::protocol::primitive::{write_int_1, write_int_2, write_int_4};
use crate::protocol::wire::{LengthPrefix, StringEncoder, Wire};
use crate::value::Value;

/// Fixed part of a column description on the wire, followed by the name
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
struct ColumnHeader {
    data_type: U16BE,
    length: U16BE,
}

/// Statement prepared on the server
#[derive(Debug, Clone)]
pub struct InformixPreparedStatement {
    id: u16,
    num_parameters: usize,
    /// Result columns; `None` for statements that return no rows
    metadata: Option<ResultSetMetaData<InformixDataType>>,
}

impl InformixPreparedStatement {
    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn num_parameters(&self) -> usize {
        self.num_parameters
    }

    pub fn metadata(&self) -> Option<&ResultSetMetaData<InformixDataType>> {
        self.metadata.as_ref()
    }
}

/// Informix message framing
///
/// Every outbound message is a `u16` message code, its body and a closing
/// `TERMINATOR`. Strings are a `u32` byte length followed by UTF-8. Inbound
/// replies use the same framing; an `ERROR` reply carries an `i32` server code.
#[derive(Debug)]
pub struct InformixProtocol {
    decoder: Arc<InformixRowDecoder>,
    /// Rows of the current result still on the wire; `None` when not announced
    pending_rows: Option<u64>,
    /// Whether the current result still has rows or its terminator to read
    in_result: bool,
    last_generated_key: Option<i32>,
}

impl Default for InformixProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl InformixProtocol {
    pub fn new() -> Self {
        Self {
            decoder: Arc::new(InformixRowDecoder::new()),
            pending_rows: None,
            in_result: false,
            last_generated_key: None,
        }
    }

    /// Key the server generated for the last insert, if it reported one
    pub fn last_generated_key(&self) -> Option<i32> {
        self.last_generated_key
    }

    // ========================================================================
    // Framing
    // ========================================================================

    fn begin(wire: &mut Wire, message: MessageType) {
        write_int_2(wire.message(), message.code());
    }

    fn begin_operation(wire: &mut Wire, operation: OperationType, statement: &InformixPreparedStatement) {
        Self::begin(wire, MessageType::Operation);
        write_int_2(wire.message(), operation.code());
        write_int_2(wire.message(), statement.id);
    }

    fn send(wire: &mut Wire) -> Result<()> {
        write_int_2(wire.message(), TERMINATOR);
        wire.flush()?;
        Ok(())
    }

    /// Build one outbound message and send it; a failed build sends nothing
    fn send_with(wire: &mut Wire, build: impl FnOnce(&mut Wire) -> Result<()>) -> Result<()> {
        if let Err(e) = build(wire) {
            wire.discard();
            return Err(e);
        }
        Self::send(wire)
    }

    fn read_message_type(wire: &mut Wire) -> Result<MessageType> {
        let code = wire.read_u16()?;
        match MessageType::from_code(code) {
            Some(MessageType::Error) => {
                let error_code = wire.read_i32()?;
                Self::expect_terminator(wire)?;
                tracing::warn!(error_code, "server returned an error");
                Err(Error::ProtocolErrorCode(error_code))
            }
            Some(message) => Ok(message),
            None => Err(Error::protocol(format!("unknown message code 0x{:04X}", code))),
        }
    }

    fn expect(wire: &mut Wire, expected: MessageType) -> Result<()> {
        let message = Self::read_message_type(wire)?;
        if message != expected {
            return Err(Error::protocol(format!(
                "expected {:?}, got {:?}",
                expected, message
            )));
        }
        Ok(())
    }

    fn expect_terminator(wire: &mut Wire) -> Result<()> {
        let code = wire.read_u16()?;
        if code != TERMINATOR {
            return Err(Error::protocol(format!(
                "expected terminator, got 0x{:04X}",
                code
            )));
        }
        Ok(())
    }

    fn expect_status(wire: &mut Wire) -> Result<()> {
        Self::expect(wire, MessageType::ResponseStatus)?;
        Self::expect_terminator(wire)
    }

    fn read_result_type(wire: &mut Wire) -> Result<ResultType> {
        Self::expect(wire, MessageType::Result)?;
        let code = wire.read_u16()?;
        ResultType::from_code(code)
            .ok_or_else(|| Error::protocol(format!("unknown result type 0x{:04X}", code)))
    }

    /// Update count and optional generated key, up to the terminator
    fn read_update_count(&mut self, wire: &mut Wire) -> Result<u32> {
        let count = wire.read_i32()?;
        let count = u32::try_from(count)
            .map_err(|_e| Error::protocol(format!("negative update count {}", count)))?;
        self.last_generated_key = None;
        loop {
            match Self::read_message_type(wire)? {
                MessageType::AutoGeneratedKey => {
                    self.last_generated_key = Some(wire.read_i32()?);
                }
                MessageType::Terminator => return Ok(count),
                other => {
                    return Err(Error::protocol(format!(
                        "unexpected {:?} after update count",
                        other
                    )));
                }
            }
        }
    }

    // ========================================================================
    // Bodies
    // ========================================================================

    fn write_properties(wire: &mut Wire, encoder: &StringEncoder, properties: &[(&str, &str)]) -> Result<()> {
        let count = u16::try_from(properties.len())
            .map_err(|_e| Error::BadConfigError(format!("too many properties: {}", properties.len())))?;
        Self::begin(wire, MessageType::Properties);
        write_int_2(wire.message(), count);
        for (key, value) in properties {
            encoder.write_string(wire.message(), key)?;
            encoder.write_string(wire.message(), value)?;
        }
        Ok(())
    }

    fn write_parameter(out: &mut Vec<u8>, encoder: &StringEncoder, value: &Value) -> Result<()> {
        match value {
            Value::Null => {
                write_int_2(out, InformixDataType::Char.code());
                write_int_1(out, 1);
            }
            Value::Byte(v) => Self::write_integer(out, i32::from(*v)),
            Value::Short(v) => Self::write_integer(out, i32::from(*v)),
            Value::Int(v) => Self::write_integer(out, *v),
            Value::Str(s) => {
                let (data_type, prefix) = if s.len() <= usize::from(u8::MAX) {
                    (InformixDataType::VarChar, LengthPrefix::U8)
                } else {
                    (InformixDataType::Char, LengthPrefix::U16)
                };
                write_int_2(out, data_type.code());
                write_int_1(out, 0);
                encoder.write_prefixed(out, s, prefix)?;
            }
            other => {
                return Err(Error::unsupported(format!(
                    "{:?} parameters",
                    other.parameter_type()
                )));
            }
        }
        Ok(())
    }

    fn write_integer(out: &mut Vec<u8>, value: i32) {
        write_int_2(out, InformixDataType::Integer.code());
        write_int_1(out, 0);
        write_int_4(out, value as u32);
    }

    fn write_parameters(wire: &mut Wire, encoder: &StringEncoder, parameters: &Parameters) -> Result<()> {
        for value in parameters.values()? {
            Self::write_parameter(wire.message(), encoder, value)?;
        }
        Ok(())
    }

    /// Column descriptions; every header and name is read before an unknown
    /// type is rejected so the reply stays in step
    fn read_columns(wire: &mut Wire, num_columns: u16) -> Result<Vec<ColumnDescription<InformixDataType>>> {
        let mut headers = Vec::with_capacity(usize::from(num_columns));
        for _ in 0..num_columns {
            let mut buf = [0; size_of::<ColumnHeader>()];
            wire.read_exact(&mut buf)?;
            let header = ColumnHeader::read_from_bytes(&buf)
                .map_err(|_e| Error::protocol("short column header"))?;
            let name = wire.read_string(MAX_STRING_BYTES)?;
            headers.push((header, name));
        }
        headers
            .into_iter()
            .map(|(header, name)| {
                let code = header.data_type.get();
                let data_type = InformixDataType::from_code(code)
                    .ok_or_else(|| Error::unsupported(format!("column type 0x{:04X}", code)))?;
                let max_length = u32::from(header.length.get());
                Ok(ColumnDescription {
                    data_type,
                    sql_type: data_type.sql_type(),
                    name,
                    max_length,
                    constant_length: data_type.is_constant_length(),
                    max_row_bytes: data_type.row_bytes(max_length),
                })
            })
            .collect()
    }

    /// Row count announced by a `QUERY_RESPONSE`; -1 stands for unknown
    fn read_total_rows(wire: &mut Wire) -> Result<Option<u64>> {
        Self::expect(wire, MessageType::QueryResponse)?;
        match wire.read_i32()? {
            -1 => Ok(None),
            total => u64::try_from(total)
                .map(Some)
                .map_err(|_e| Error::protocol(format!("invalid row count {}", total))),
        }
    }

    /// Start tracking the rows of a result announced with `total_rows`
    fn start_result(&mut self, wire: &mut Wire, total_rows: Option<u64>) -> Result<()> {
        self.pending_rows = total_rows;
        self.in_result = total_rows != Some(0);
        if total_rows == Some(0) {
            Self::expect_terminator(wire)?;
        }
        Ok(())
    }

    fn end_result(&mut self) {
        self.in_result = false;
        self.pending_rows = None;
    }
}

impl DatabaseProtocol for InformixProtocol {
    type PreparedStatement = InformixPreparedStatement;
    type DataType = InformixDataType;
    type Decoder = InformixRowDecoder;

    fn max_string_bytes(&self) -> usize {
        MAX_STRING_BYTES
    }

    fn row_decoder(&self) -> Arc<InformixRowDecoder> {
        Arc::clone(&self.decoder)
    }

    fn prepared_statement_id(&self, statement: &InformixPreparedStatement) -> u64 {
        u64::from(statement.id)
    }

    fn perform_initial_setup(&mut self, wire: &mut Wire, encoder: &StringEncoder, opts: &Opts) -> Result<()> {
        let properties: Vec<(&str, &str)> = opts
            .properties
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        Self::send_with(wire, |wire| {
            Self::begin(wire, MessageType::Protocols);
            Self::write_properties(wire, encoder, &properties)?;
            if let Some(database) = &opts.database {
                Self::begin(wire, MessageType::SelectDatabase);
                encoder.write_string(wire.message(), database)?;
            }
            Ok(())
        })?;
        Self::expect_status(wire)
    }

    fn set_auto_commit(&mut self, wire: &mut Wire, encoder: &StringEncoder, on: bool) -> Result<()> {
        let value = if on { "on" } else { "off" };
        Self::send_with(wire, |wire| {
            Self::write_properties(wire, encoder, &[("autocommit", value)])
        })?;
        Self::expect_status(wire)
    }

    fn execute_query(&mut self, wire: &mut Wire, encoder: &StringEncoder, sql: &str) -> Result<()> {
        match self.execute_sql(wire, encoder, sql)? {
            SqlOutcome::ResultSet => Ok(()),
            other => Err(Error::protocol(format!("query answered with {:?}", other))),
        }
    }

    fn execute_update(&mut self, wire: &mut Wire, encoder: &StringEncoder, sql: &str) -> Result<u32> {
        match self.execute_sql(wire, encoder, sql)? {
            SqlOutcome::UpdateCount(count) => Ok(count),
            SqlOutcome::None => Ok(0),
            SqlOutcome::ResultSet => {
                self.retrieve_result_metadata(wire)?;
                self.close_result_set(wire)?;
                Err(Error::BadUsageError("update statement returned rows".to_string()))
            }
        }
    }

    fn execute_sql(&mut self, wire: &mut Wire, encoder: &StringEncoder, sql: &str) -> Result<SqlOutcome> {
        Self::send_with(wire, |wire| {
            Self::begin(wire, MessageType::ExecuteSql);
            encoder.write_string(wire.message(), sql)
        })?;
        match Self::read_result_type(wire)? {
            ResultType::Select => Ok(SqlOutcome::ResultSet),
            ResultType::InsertUpdate => self.read_update_count(wire).map(SqlOutcome::UpdateCount),
            ResultType::ExecuteSql => {
                Self::expect_terminator(wire)?;
                Ok(SqlOutcome::None)
            }
        }
    }

    fn prepare_statement(
        &mut self,
        wire: &mut Wire,
        encoder: &StringEncoder,
        sql: &str,
    ) -> Result<PreparedStatementResult<InformixPreparedStatement>> {
        Self::send_with(wire, |wire| {
            Self::begin(wire, MessageType::Operation);
            write_int_2(wire.message(), OperationType::Prepare.code());
            encoder.write_string(wire.message(), sql)
        })?;

        Self::expect(wire, MessageType::ValuesForPreparedResponse)?;
        let id = check_prepared_statement_id(wire.read_u32()?)?;
        let num_parameters = usize::from(wire.read_u16()?);
        let num_columns = check_num_columns(wire.read_u32()?)?;
        let columns = Self::read_columns(wire, num_columns);
        Self::expect_terminator(wire)?;
        let columns = columns?;

        tracing::debug!(id, num_parameters, num_columns, "prepared statement");
        let metadata = (!columns.is_empty()).then(|| ResultSetMetaData::new(columns, None));
        Ok(PreparedStatementResult {
            statement: InformixPreparedStatement {
                id,
                num_parameters,
                metadata,
            },
            num_parameters,
        })
    }

    fn execute_prepared_query(
        &mut self,
        statement: &InformixPreparedStatement,
        wire: &mut Wire,
        encoder: &StringEncoder,
        parameters: &Parameters,
    ) -> Result<()> {
        if statement.metadata.is_none() {
            return Err(Error::BadUsageError(
                "prepared statement returns no rows".to_string(),
            ));
        }
        Self::send_with(wire, |wire| {
            Self::begin_operation(wire, OperationType::ExecuteQuery, statement);
            Self::write_parameters(wire, encoder, parameters)
        })
    }

    fn execute_prepared_update(
        &mut self,
        statement: &InformixPreparedStatement,
        wire: &mut Wire,
        encoder: &StringEncoder,
        parameters: &Parameters,
    ) -> Result<u32> {
        Self::send_with(wire, |wire| {
            Self::begin_operation(wire, OperationType::Insert, statement);
            Self::write_parameters(wire, encoder, parameters)
        })?;
        match Self::read_result_type(wire)? {
            ResultType::InsertUpdate => self.read_update_count(wire),
            other => Err(Error::protocol(format!("update answered with {:?}", other))),
        }
    }

    fn close_prepared_statement(&mut self, statement: &InformixPreparedStatement, wire: &mut Wire) -> Result<()> {
        Self::begin_operation(wire, OperationType::Close, statement);
        Self::send(wire)?;
        Self::expect_status(wire)
    }

    fn execute_batches(
        &mut self,
        statement: &InformixPreparedStatement,
        batches: &[Parameters],
        wire: &mut Wire,
        encoder: &StringEncoder,
    ) -> Result<Vec<i32>> {
        let num_batches = u32::try_from(batches.len())
            .map_err(|_e| Error::BadUsageError(format!("too many batches: {}", batches.len())))?;
        Self::send_with(wire, |wire| {
            Self::begin_operation(wire, OperationType::ExecuteBatch, statement);
            write_int_4(wire.message(), num_batches);
            batches
                .iter()
                .try_for_each(|batch| Self::write_parameters(wire, encoder, batch))
        })?;

        Self::expect(wire, MessageType::ExecuteBatchResponse)?;
        let num_counts = wire.read_u32()?;
        if num_counts != num_batches {
            return Err(Error::protocol(format!(
                "{} update counts for {} batches",
                num_counts, num_batches
            )));
        }
        let counts = (0..num_counts)
            .map(|_| wire.read_i32())
            .collect::<std::io::Result<Vec<_>>>()?;
        Self::expect_terminator(wire)?;
        Ok(counts)
    }

    fn send_begin(&mut self, wire: &mut Wire) -> Result<()> {
        Self::begin(wire, MessageType::Begin);
        Self::send(wire)?;
        Self::expect_status(wire)
    }

    fn send_commit(&mut self, wire: &mut Wire) -> Result<()> {
        Self::begin(wire, MessageType::Commit);
        Self::send(wire)?;
        Self::expect(wire, MessageType::CommitResponse)?;
        Self::expect_terminator(wire)
    }

    fn retrieve_result_metadata(&mut self, wire: &mut Wire) -> Result<ResultSetMetaData<InformixDataType>> {
        let total_rows = Self::read_total_rows(wire)?;
        let num_columns = check_num_columns(wire.read_u32()?)?;
        let columns = Self::read_columns(wire, num_columns);
        self.start_result(wire, total_rows)?;
        match columns {
            Ok(columns) => Ok(ResultSetMetaData::new(columns, total_rows)),
            Err(err) => {
                // rows of an undecodable result are skipped
                self.close_result_set(wire)?;
                Err(err)
            }
        }
    }

    fn retrieve_prepared_result_metadata(
        &mut self,
        wire: &mut Wire,
        statement: &InformixPreparedStatement,
    ) -> Result<ResultSetMetaData<InformixDataType>> {
        let total_rows = Self::read_total_rows(wire)?;
        let metadata = statement
            .metadata
            .as_ref()
            .ok_or_else(|| Error::protocol("rows for a statement without result columns"))?
            .with_total_rows(total_rows);
        self.start_result(wire, total_rows)?;
        Ok(metadata)
    }

    fn retrieve_result_rows(
        &mut self,
        wire: &mut Wire,
        dst: &mut [u8],
        max_rows: usize,
        bytes_per_row: usize,
        retrieved: &mut RetrievedRows,
    ) -> Result<()> {
        let mut offset = 0;
        while self.in_result && retrieved.num_rows() < max_rows {
            let message = Self::read_message_type(wire).inspect_err(|_e| self.end_result())?;
            match message {
                MessageType::ResultRow => {
                    let len = usize::from(wire.read_u16()?);
                    if len > bytes_per_row {
                        return Err(Error::protocol(format!(
                            "row of {} bytes exceeds the {} announced",
                            len, bytes_per_row
                        )));
                    }
                    let row = dst
                        .get_mut(offset..offset + len)
                        .ok_or_else(|| Error::protocol("row does not fit the fetch buffer"))?;
                    wire.read_exact(row)?;
                    retrieved.push(len as u32);
                    offset += len;

                    if let Some(pending) = self.pending_rows.as_mut() {
                        *pending = pending.saturating_sub(1);
                        if *pending == 0 {
                            Self::expect_terminator(wire)?;
                            self.end_result();
                        }
                    }
                }
                MessageType::Terminator => {
                    if let Some(pending) = self.pending_rows.filter(|&n| n > 0) {
                        return Err(Error::protocol(format!(
                            "result ended with {} rows outstanding",
                            pending
                        )));
                    }
                    self.end_result();
                }
                other => {
                    return Err(Error::protocol(format!("unexpected {:?} among rows", other)));
                }
            }
        }
        Ok(())
    }

    fn close_result_set(&mut self, wire: &mut Wire) -> Result<()> {
        let mut skipped = Vec::new();
        while self.in_result {
            match Self::read_message_type(wire)? {
                MessageType::ResultRow => {
                    let len = usize::from(wire.read_u16()?);
                    wire.read_into(len, &mut skipped)?;
                }
                MessageType::Terminator => self.end_result(),
                other => {
                    self.end_result();
                    return Err(Error::protocol(format!("unexpected {:?} among rows", other)));
                }
            }
        }
        self.end_result();
        Ok(())
    }

    fn send_close(&mut self, wire: &mut Wire) -> Result<()> {
        self.end_result();
        Self::send(wire)
    }
}
