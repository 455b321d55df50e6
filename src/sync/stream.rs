use std::io;
use std::net::{Shutdown, TcpStream};
use std::os::unix::net::UnixStream;

use crate::protocol::wire::{Inbound, Outbound};

/// Socket a connection runs over
#[derive(Debug)]
pub enum Stream {
    Tcp(TcpStream),
    Unix(UnixStream),
}

impl Stream {
    pub fn tcp(stream: TcpStream) -> Self {
        Self::Tcp(stream)
    }

    pub fn unix(stream: UnixStream) -> Self {
        Self::Unix(stream)
    }

    /// Independent inbound and outbound halves over the same socket
    pub fn split(&self) -> io::Result<(Inbound, Outbound)> {
        match self {
            Self::Tcp(s) => Ok((Box::new(s.try_clone()?), Box::new(s.try_clone()?))),
            Self::Unix(s) => Ok((Box::new(s.try_clone()?), Box::new(s.try_clone()?))),
        }
    }

    pub fn shutdown(&self) -> io::Result<()> {
        match self {
            Self::Tcp(s) => s.shutdown(Shutdown::Both),
            Self::Unix(s) => s.shutdown(Shutdown::Both),
        }
    }
}
