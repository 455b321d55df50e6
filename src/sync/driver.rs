use std::collections::HashSet;
use std::marker::PhantomData;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::opts::Opts;
use crate::protocol::connection::ConnectionProtocol;
use crate::protocol::database::DatabaseProtocol;
use crate::protocol::wire::{Inbound, Outbound};
use crate::share::{Sharing, Unsynchronized};
use crate::sync::conn::Connection;
use crate::sync::stream::Stream;

/// Open connections of one driver
#[derive(Debug, Default)]
pub(crate) struct Registry {
    next_id: AtomicU64,
    open: Mutex<HashSet<u64>>,
}

impl Registry {
    fn track(&self) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.open.lock().insert(id);
        id
    }

    pub(crate) fn untrack(&self, id: u64) {
        self.open.lock().remove(&id);
    }

    fn len(&self) -> usize {
        self.open.lock().len()
    }
}

/// Entry point opening connections of vendor protocol `P`
///
/// `S` picks how connection state is shared between the handles of one
/// connection: [`Unsynchronized`] for single-threaded use, or
/// [`Synchronized`](crate::share::Synchronized) to move handles across threads.
pub struct Driver<P, S = Unsynchronized> {
    registry: Arc<Registry>,
    _protocol: PhantomData<fn() -> (P, S)>,
}

impl<P: DatabaseProtocol + Default, S: Sharing> Default for Driver<P, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: DatabaseProtocol + Default, S: Sharing> Driver<P, S> {
    pub fn new() -> Self {
        Self {
            registry: Arc::default(),
            _protocol: PhantomData,
        }
    }

    /// Open a TCP connection and run the initial setup
    ///
    /// ```text
    /// informix://host[:port][/database][?property=value&...]
    /// ```
    pub fn connect<O: TryInto<Opts>>(&self, opts: O) -> Result<Connection<P, S>>
    where
        Error: From<O::Error>,
    {
        let opts: Opts = opts.try_into()?;
        let stream = TcpStream::connect((opts.host.as_str(), opts.port))?;
        stream.set_nodelay(opts.tcp_nodelay)?;
        self.connect_with_stream(Stream::tcp(stream), &opts)
    }

    /// Run the initial setup over an already connected socket
    pub fn connect_with_stream(&self, stream: Stream, opts: &Opts) -> Result<Connection<P, S>> {
        let (inbound, outbound) = stream.split()?;
        match self.setup(inbound, outbound, opts) {
            Ok(protocol) => Ok(self.track(protocol, Some(stream))),
            Err(e) => {
                // The setup error is the one worth reporting
                let _shutdown = stream.shutdown();
                Err(e)
            }
        }
    }

    /// Run the initial setup over arbitrary byte streams
    pub fn connect_with_io(&self, inbound: Inbound, outbound: Outbound, opts: &Opts) -> Result<Connection<P, S>> {
        let protocol = self.setup(inbound, outbound, opts)?;
        Ok(self.track(protocol, None))
    }

    /// Number of connections opened by this driver and not yet closed
    pub fn open_connections(&self) -> usize {
        self.registry.len()
    }

    fn setup(&self, inbound: Inbound, outbound: Outbound, opts: &Opts) -> Result<ConnectionProtocol<P, S>> {
        let mut protocol =
            ConnectionProtocol::new(P::default(), inbound, outbound, opts.parameter_evict_delta);
        protocol.perform_initial_setup(opts)?;
        tracing::debug!(host = %opts.host, port = opts.port, "connected");
        Ok(protocol)
    }

    fn track(&self, protocol: ConnectionProtocol<P, S>, stream: Option<Stream>) -> Connection<P, S> {
        let id = self.registry.track();
        Connection::new(S::share(protocol), stream, Arc::clone(&self.registry), id)
    }
}
