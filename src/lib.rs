//! Client core for vendor binary database protocols
//!
//! [`protocol::ConnectionProtocol`] drives one connection through its state
//! machine on top of a [`protocol::DatabaseProtocol`] implementation such as
//! [`informix::InformixProtocol`]. Result sets stream rows off the wire and
//! switch to an in-memory copy when the connection is needed for something
//! else.

pub mod buffer_pool;
pub mod cache;
pub mod chunks;
pub mod col;
pub mod constant;
pub mod error;
pub mod informix;
pub mod list;
mod opts;
pub mod params;
pub mod params_pool;
pub mod protocol;
pub mod resultset;
pub mod share;
pub mod value;

#[cfg(feature = "sync")]
pub mod sync;

pub use opts::Opts;

#[cfg(test)]
mod col_test;
#[cfg(test)]
mod list_test;
