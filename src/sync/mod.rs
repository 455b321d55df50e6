//! Blocking connection handles over `std::net` sockets

mod conn;
mod driver;
mod prepared;
mod result_set;
mod statement;
mod stream;

pub use conn::Connection;
pub use driver::Driver;
pub use prepared::PreparedStatement;
pub use result_set::ResultSet;
pub use statement::{ExecuteResult, Statement};
pub use stream::Stream;

use crate::informix::InformixProtocol;
use crate::share::Synchronized;

pub type InformixDriver = Driver<InformixProtocol>;
pub type InformixConnection = Connection<InformixProtocol>;

/// Handles that can be moved across threads
pub type SharedInformixDriver = Driver<InformixProtocol, Synchronized>;
pub type SharedInformixConnection = Connection<InformixProtocol, Synchronized>;
