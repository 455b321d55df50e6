use std::io::{BufReader, Read, Write};

use zerocopy::byteorder::big_endian::{I16 as I16BE, I32 as I32BE, U16 as U16BE, U32 as U32BE};

use crate::error::{Error, Result};
use crate::protocol::primitive::{write_int_1, write_int_2, write_int_4};

pub type Inbound = Box<dyn Read + Send>;
pub type Outbound = Box<dyn Write + Send>;

/// The two byte streams of a connection
///
/// Outbound bytes are collected in a message buffer and reach the stream only
/// on `flush`, so a partially built message never hits the wire.
pub struct Wire {
    reader: BufReader<Inbound>,
    writer: Outbound,
    message: Vec<u8>,
}

impl Wire {
    pub fn new(inbound: Inbound, outbound: Outbound) -> Self {
        Self {
            reader: BufReader::new(inbound),
            writer: outbound,
            message: Vec::new(),
        }
    }

    /// Buffer of the outbound message under construction
    pub fn message(&mut self) -> &mut Vec<u8> {
        &mut self.message
    }

    /// Drop a partially built message
    pub fn discard(&mut self) {
        self.message.clear();
    }

    /// Send the buffered message as a whole
    pub fn flush(&mut self) -> std::io::Result<()> {
        let result = self
            .writer
            .write_all(&self.message)
            .and_then(|()| self.writer.flush());
        self.message.clear();
        result
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        self.reader.read_exact(buf)
    }

    pub fn read_u8(&mut self) -> std::io::Result<u8> {
        let mut buf = [0; 1];
        self.reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16(&mut self) -> std::io::Result<u16> {
        let mut buf = [0; 2];
        self.reader.read_exact(&mut buf)?;
        Ok(U16BE::from_bytes(buf).get())
    }

    pub fn read_i16(&mut self) -> std::io::Result<i16> {
        let mut buf = [0; 2];
        self.reader.read_exact(&mut buf)?;
        Ok(I16BE::from_bytes(buf).get())
    }

    pub fn read_u32(&mut self) -> std::io::Result<u32> {
        let mut buf = [0; 4];
        self.reader.read_exact(&mut buf)?;
        Ok(U32BE::from_bytes(buf).get())
    }

    pub fn read_i32(&mut self) -> std::io::Result<i32> {
        let mut buf = [0; 4];
        self.reader.read_exact(&mut buf)?;
        Ok(I32BE::from_bytes(buf).get())
    }

    /// Read `len` bytes into `dst`, replacing its contents
    pub fn read_into(&mut self, len: usize, dst: &mut Vec<u8>) -> std::io::Result<()> {
        dst.clear();
        dst.resize(len, 0);
        self.reader.read_exact(dst)
    }

    /// Read a `u32` length-prefixed UTF-8 string of at most `max_bytes`
    pub fn read_string(&mut self, max_bytes: usize) -> Result<String> {
        let len = self.read_u32()? as usize;
        if len > max_bytes {
            return Err(Error::protocol(format!(
                "string of {} bytes exceeds limit of {}",
                len, max_bytes
            )));
        }
        let mut bytes = Vec::new();
        self.read_into(len, &mut bytes)?;
        simdutf8::basic::from_utf8(&bytes)
            .map(ToOwned::to_owned)
            .map_err(|_e| Error::protocol("string is not valid UTF-8"))
    }
}

// ============================================================================
// Outbound string encoding
// ============================================================================

/// Width of the length prefix written before encoded string bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPrefix {
    U8,
    U16,
    U32,
}

impl LengthPrefix {
    fn max(self) -> usize {
        match self {
            LengthPrefix::U8 => usize::from(u8::MAX),
            LengthPrefix::U16 => usize::from(u16::MAX),
            LengthPrefix::U32 => u32::MAX as usize,
        }
    }
}

/// Turns strings into length-prefixed UTF-8 bytes on the outbound message
#[derive(Debug, Clone, Copy)]
pub struct StringEncoder {
    max_bytes: usize,
}

impl StringEncoder {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Write `s` with a `u32` length prefix
    pub fn write_string(&self, out: &mut Vec<u8>, s: &str) -> Result<()> {
        self.write_prefixed(out, s, LengthPrefix::U32)
    }

    pub fn write_prefixed(&self, out: &mut Vec<u8>, s: &str, prefix: LengthPrefix) -> Result<()> {
        let bytes = s.as_bytes();
        let limit = self.max_bytes.min(prefix.max());
        if bytes.len() > limit {
            return Err(Error::BadUsageError(format!(
                "string of {} bytes exceeds limit of {}",
                bytes.len(),
                limit
            )));
        }
        // Lengths are bounded by `limit` above
        match prefix {
            LengthPrefix::U8 => write_int_1(out, bytes.len() as u8),
            LengthPrefix::U16 => write_int_2(out, bytes.len() as u16),
            LengthPrefix::U32 => write_int_4(out, bytes.len() as u32),
        }
        out.extend_from_slice(bytes);
        Ok(())
    }
}
