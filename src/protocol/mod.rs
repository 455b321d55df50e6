//! Vendor-neutral protocol core: byte primitives, the wire, the conversation
//! state machine and the connection protocol that ties them together.

pub mod connection;
pub mod data;
pub mod database;
pub mod decoder;
pub mod primitive;
pub mod state;
pub mod wire;

pub use connection::{ConnectionProtocol, ResultSetCell, SharedResultSet, SqlExecution};
pub use data::{Owner, ResultSetId};
pub use database::{DatabaseProtocol, PreparedStatementResult, RetrievedRows, SqlOutcome};
pub use decoder::RowDecoder;
pub use state::{Capabilities, State};
pub use wire::{Inbound, LengthPrefix, Outbound, StringEncoder, Wire};

#[cfg(test)]
mod primitive_test;
