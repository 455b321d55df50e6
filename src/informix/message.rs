//! Message, operation and result codes of the Informix wire protocol.

use crate::error::{Error, Result};

/// Closes every message in both directions
pub const TERMINATOR: u16 = 0x000C;

pub const MAX_STRING_CHARACTERS: usize = 1 << 16;

/// Worst case of four UTF-8 bytes per character
pub const MAX_STRING_BYTES: usize = MAX_STRING_CHARACTERS * 4;

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    // Outbound
    SetIsolation = 0x0001,
    ExecuteSql = 0x0002,
    Operation = 0x0004,
    Commit = 0x0013,
    Begin = 0x0023,
    SelectDatabase = 0x0024,
    Properties = 0x0051,
    Protocols = 0x007E,

    // Inbound
    ResultRow = 0x0006,
    Result = 0x0008,
    Error = 0x000D,
    QueryResponse = 0x000E,
    ResponseStatus = 0x000F,
    ValuesForPreparedResponse = 0x005E,
    CommitResponse = 0x0063,
    ExecuteBatchResponse = 0x007D,
    AutoGeneratedKey = 0x0088,

    Terminator = 0x000C,
}

impl MessageType {
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0x0001 => Self::SetIsolation,
            0x0002 => Self::ExecuteSql,
            0x0004 => Self::Operation,
            0x0006 => Self::ResultRow,
            0x0008 => Self::Result,
            0x000C => Self::Terminator,
            0x000D => Self::Error,
            0x000E => Self::QueryResponse,
            0x000F => Self::ResponseStatus,
            0x0013 => Self::Commit,
            0x0023 => Self::Begin,
            0x0024 => Self::SelectDatabase,
            0x0051 => Self::Properties,
            0x005E => Self::ValuesForPreparedResponse,
            0x0063 => Self::CommitResponse,
            0x007D => Self::ExecuteBatchResponse,
            0x007E => Self::Protocols,
            0x0088 => Self::AutoGeneratedKey,
            _ => return None,
        })
    }

    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Sub-command carried by an `Operation` message
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Prepare = 0x0003,
    Insert = 0x0005,
    Close = 0x000B,
    ExecuteQuery = 0x0064,
    ExecuteBatch = 0x007C,
}

impl OperationType {
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Kind of statement a `Result` message answers
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Select = 0x0002,
    InsertUpdate = 0x0006,
    ExecuteSql = 0x002D,
}

impl ResultType {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0002 => Some(Self::Select),
            0x0006 => Some(Self::InsertUpdate),
            0x002D => Some(Self::ExecuteSql),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        self as u16
    }
}

pub fn check_prepared_statement_id(id: u32) -> Result<u16> {
    u16::try_from(id)
        .map_err(|_e| Error::protocol(format!("prepared statement id {} out of range", id)))
}

pub fn check_num_columns(num_columns: u32) -> Result<u16> {
    u16::try_from(num_columns)
        .map_err(|_e| Error::protocol(format!("column count {} out of range", num_columns)))
}
