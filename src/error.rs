use thiserror::Error;

use crate::constant::SqlType;
use crate::protocol::state::State;

pub use color_eyre::eyre::eyre;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Operation not allowed in protocol state {0:?}")]
    ProtocolState(State),

    #[error("Protocol IO error: {0}")]
    ProtocolIo(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Server error code {0}")]
    ProtocolErrorCode(i32),

    #[error("Result set is closed")]
    ResultSetClosed,

    #[error("Prepared statement is closed")]
    PreparedStatementClosed,

    #[error("Already closed")]
    AlreadyClosed,

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Wrong column type for column {index}: {actual:?}")]
    WrongColumnType { index: usize, actual: SqlType },

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Bad config error: {0}")]
    BadConfigError(String),

    #[error("Bad usage error: {0}")]
    BadUsageError(String),

    #[error("Library bug: {0}")]
    LibraryBug(color_eyre::eyre::Report),
}

impl Error {
    /// Shorthand for a protocol error with a formatted message
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Error::ProtocolError(message.into())
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        Error::Unsupported(what.into())
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(err: std::convert::Infallible) -> Self {
        match err {}
    }
}

pub type Result<T> = std::result::Result<T, Error>;
