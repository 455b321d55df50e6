use std::sync::Arc;

use crate::error::{Error, Result};
use crate::params::Parameters;
use crate::protocol::connection::ConnectionProtocol;
use crate::protocol::database::DatabaseProtocol;
use crate::protocol::state::State;
use crate::share::{Sharing, Unsynchronized};
use crate::sync::driver::Registry;
use crate::sync::prepared::PreparedStatement;
use crate::sync::statement::Statement;
use crate::sync::stream::Stream;

pub(crate) type ProtocolCell<P, S> = <S as Sharing>::Cell<ConnectionProtocol<P, S>>;

/// A connection to the database server
///
/// Statements, prepared statements and result sets created from a connection
/// share its protocol state. Closing the connection closes all of them.
pub struct Connection<P: DatabaseProtocol, S: Sharing = Unsynchronized> {
    protocol: ProtocolCell<P, S>,
    stream: Option<Stream>,
    registry: Arc<Registry>,
    id: u64,
}

impl<P: DatabaseProtocol, S: Sharing> Connection<P, S> {
    pub(crate) fn new(
        protocol: ProtocolCell<P, S>,
        stream: Option<Stream>,
        registry: Arc<Registry>,
        id: u64,
    ) -> Self {
        Self {
            protocol,
            stream,
            registry,
            id,
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut ConnectionProtocol<P, S>) -> Result<R>) -> Result<R> {
        S::with(&self.protocol, f)
    }

    pub fn state(&self) -> Result<State> {
        self.with(|p| Ok(p.state()))
    }

    pub fn is_closed(&self) -> Result<bool> {
        self.with(|p| Ok(p.is_closed()))
    }

    /// Run `f` against the vendor protocol, e.g. to read vendor specific results
    pub fn with_database<R>(&self, f: impl FnOnce(&P) -> R) -> Result<R> {
        self.with(|p| Ok(f(p.database())))
    }

    pub fn create_statement(&self) -> Result<Statement<P, S>> {
        let id = self.with(|p| {
            if p.is_closed() {
                return Err(Error::ConnectionClosed);
            }
            Ok(p.next_handle_id())
        })?;
        Ok(Statement::new(self.protocol.clone(), id))
    }

    /// Prepare `sql` on the server
    pub fn prepare(&self, sql: &str) -> Result<PreparedStatement<P, S>> {
        let (id, prepared, parameters) = self.with(|p| {
            let prepared = p.prepare(sql)?;
            let parameters = p.allocate_parameters(prepared.num_parameters)?;
            Ok((p.next_handle_id(), prepared.statement, parameters))
        })?;
        Ok(PreparedStatement::new(
            self.protocol.clone(),
            id,
            prepared,
            parameters,
        ))
    }

    pub fn set_auto_commit(&self, on: bool) -> Result<()> {
        self.with(|p| p.set_auto_commit(on))
    }

    pub fn auto_commit(&self) -> Result<bool> {
        self.with(|p| Ok(p.auto_commit()))
    }

    pub fn within_transaction(&self) -> Result<bool> {
        self.with(|p| Ok(p.within_transaction()))
    }

    pub fn commit(&self) -> Result<()> {
        self.with(|p| p.commit())
    }

    /// Take a parameter container of `count` slots from the connection's pool
    pub fn allocate_parameters(&self, count: usize) -> Result<Parameters> {
        self.with(|p| p.allocate_parameters(count))
    }

    pub fn free_parameters(&self, parameters: Parameters) -> Result<()> {
        self.with(|p| p.free_parameters(parameters))
    }

    /// Disconnect from the server
    ///
    /// The socket is shut down and the driver stops tracking the connection
    /// even when the server could not be told.
    pub fn close(&mut self) -> Result<()> {
        let closed = self.with(|p| p.close());
        if matches!(closed, Err(Error::ProtocolState(State::Closed))) {
            return Err(Error::AlreadyClosed);
        }
        let shutdown = match self.stream.take() {
            Some(stream) => stream.shutdown().map_err(Error::from),
            None => Ok(()),
        };
        self.registry.untrack(self.id);
        closed.and(shutdown)
    }
}

impl<P: DatabaseProtocol, S: Sharing> Drop for Connection<P, S> {
    fn drop(&mut self) {
        if let Ok(false) = self.is_closed()
            && let Err(e) = self.close()
        {
            tracing::warn!(error = %e, "failed to close connection on drop");
        }
    }
}
