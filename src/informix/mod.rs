//! Informix vendor protocol: data types, message codes, row layout and the
//! message exchanges behind every connection operation.

pub mod data_type;
pub mod decoder;
pub mod message;
pub mod protocol;

pub use data_type::InformixDataType;
pub use decoder::InformixRowDecoder;
pub use protocol::{InformixPreparedStatement, InformixProtocol};

#[cfg(test)]
mod data_type_test;
#[cfg(test)]
mod decoder_test;
