//! Scripted server for driving connections without a database

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use zero_wiredb::Opts;
use zero_wiredb::informix::InformixDataType;
use zero_wiredb::informix::message::{MessageType, ResultType, TERMINATOR};
use zero_wiredb::protocol::primitive::{write_bytes, write_int_2, write_int_4};
use zero_wiredb::sync::{InformixConnection, InformixDriver};

/// Everything the client wrote
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    pub fn bytes(&self) -> Vec<u8> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Server replies, in the order the client asks for them
#[derive(Default)]
pub struct Script(pub Vec<u8>);

impl Script {
    /// Reply to the initial setup
    pub fn setup() -> Self {
        Self::default().status()
    }

    pub fn message(mut self, message: MessageType) -> Self {
        write_int_2(&mut self.0, message.code());
        self
    }

    pub fn u16(mut self, value: u16) -> Self {
        write_int_2(&mut self.0, value);
        self
    }

    pub fn i32(mut self, value: i32) -> Self {
        write_int_4(&mut self.0, value as u32);
        self
    }

    pub fn string(mut self, s: &str) -> Self {
        write_int_4(&mut self.0, s.len() as u32);
        write_bytes(&mut self.0, s.as_bytes());
        self
    }

    pub fn end(self) -> Self {
        self.u16(TERMINATOR)
    }

    pub fn status(self) -> Self {
        self.message(MessageType::ResponseStatus).end()
    }

    pub fn commit(self) -> Self {
        self.message(MessageType::CommitResponse).end()
    }

    pub fn error(self, code: i32) -> Self {
        self.message(MessageType::Error).i32(code).end()
    }

    /// Answer to a statement that neither returns rows nor counts them
    pub fn executed(self) -> Self {
        self.message(MessageType::Result)
            .u16(ResultType::ExecuteSql.code())
            .end()
    }

    pub fn update_count(self, count: i32) -> Self {
        self.message(MessageType::Result)
            .u16(ResultType::InsertUpdate.code())
            .i32(count)
            .end()
    }

    pub fn column(self, data_type: InformixDataType, length: u16, name: &str) -> Self {
        self.u16(data_type.code()).u16(length).string(name)
    }

    /// `SELECT` answer up to the column descriptions
    pub fn query(self, total: i32, columns: &[(InformixDataType, u16, &str)]) -> Self {
        let script = self
            .message(MessageType::Result)
            .u16(ResultType::Select.code())
            .message(MessageType::QueryResponse)
            .i32(total)
            .i32(columns.len() as i32);
        columns
            .iter()
            .fold(script, |s, &(data_type, length, name)| s.column(data_type, length, name))
    }

    pub fn row(mut self, bytes: &[u8]) -> Self {
        write_int_2(&mut self.0, MessageType::ResultRow.code());
        write_int_2(&mut self.0, bytes.len() as u16);
        write_bytes(&mut self.0, bytes);
        self
    }

    pub fn int_row(self, n: i32) -> Self {
        self.row(&n.to_be_bytes())
    }

    pub fn connect(self, opts: &Opts) -> (InformixDriver, InformixConnection, Captured) {
        let driver = InformixDriver::new();
        let captured = Captured::default();
        let conn = driver
            .connect_with_io(
                Box::new(Cursor::new(self.0)),
                Box::new(captured.clone()),
                opts,
            )
            .unwrap();
        (driver, conn, captured)
    }
}

/// One VARCHAR value followed by one INTEGER, as laid out in a row
pub fn varchar_int_row(s: &str, n: i32) -> Vec<u8> {
    let mut row = vec![s.len() as u8];
    row.extend_from_slice(s.as_bytes());
    row.extend_from_slice(&n.to_be_bytes());
    row
}

/// Outbound bytes of a message with `body`, terminator included
pub fn outbound(message: MessageType, body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_int_2(&mut bytes, message.code());
    write_bytes(&mut bytes, body);
    write_int_2(&mut bytes, TERMINATOR);
    bytes
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
