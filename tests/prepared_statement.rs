mod common;

use std::io::Cursor;
use std::thread;

use common::{Captured, Script};
use pretty_assertions::assert_eq;
use zero_wiredb::Opts;
use zero_wiredb::error::Error;
use zero_wiredb::informix::InformixDataType;
use zero_wiredb::informix::message::{MessageType, OperationType, TERMINATOR};
use zero_wiredb::protocol::State;
use zero_wiredb::protocol::primitive::{write_bytes, write_int_1, write_int_2, write_int_4};
use zero_wiredb::sync::SharedInformixDriver;

impl Script {
    fn prepared(self, id: i32, num_parameters: u16, columns: &[(InformixDataType, u16, &str)]) -> Self {
        let script = self
            .message(MessageType::ValuesForPreparedResponse)
            .i32(id)
            .u16(num_parameters)
            .i32(columns.len() as i32);
        columns
            .iter()
            .fold(script, |s, &(data_type, length, name)| s.column(data_type, length, name))
            .end()
    }

    fn batch_counts(self, counts: &[i32]) -> Self {
        let script = self
            .message(MessageType::ExecuteBatchResponse)
            .i32(counts.len() as i32);
        counts.iter().fold(script, |s, &n| s.i32(n)).end()
    }
}

fn operation(operation: OperationType, id: u16) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_int_2(&mut bytes, MessageType::Operation.code());
    write_int_2(&mut bytes, operation.code());
    write_int_2(&mut bytes, id);
    bytes
}

fn int_parameter(bytes: &mut Vec<u8>, value: i32) {
    write_int_2(bytes, InformixDataType::Integer.code());
    write_int_1(bytes, 0);
    write_int_4(bytes, value as u32);
}

#[test]
fn bound_parameters_are_sent_with_update() {
    let script = Script::setup()
        .prepared(3, 2, &[])
        .status()
        .update_count(1)
        .update_count(1);
    let (_driver, conn, captured) = script.connect(&Opts::default());
    let mut ps = conn.prepare("update t set name = ? where id = ?").unwrap();
    assert_eq!(ps.num_parameters(), 2);

    ps.set_string(0, "x").unwrap();
    ps.set_int(1, 5).unwrap();
    captured.clear();
    assert_eq!(ps.execute_update().unwrap(), 1);

    let mut expected = Vec::new();
    write_int_2(&mut expected, MessageType::Begin.code());
    write_int_2(&mut expected, TERMINATOR);
    expected.extend(operation(OperationType::Insert, 3));
    write_int_2(&mut expected, InformixDataType::VarChar.code());
    write_int_1(&mut expected, 0);
    write_int_1(&mut expected, 1);
    write_bytes(&mut expected, b"x");
    int_parameter(&mut expected, 5);
    write_int_2(&mut expected, TERMINATOR);
    assert_eq!(captured.bytes(), expected);

    // Still bound for the next execution
    assert_eq!(ps.execute_update().unwrap(), 1);
    assert!(matches!(ps.set_int(2, 0), Err(Error::BadUsageError(_))));
}

#[test]
fn unset_parameters_fail_before_io() {
    let script = Script::setup().prepared(1, 2, &[]);
    let (_driver, conn, captured) = script.connect(&Opts::default());
    let mut ps = conn.prepare("insert into t values (?, ?)").unwrap();
    ps.set_int(0, 1).unwrap();
    let sent = captured.len();

    assert!(matches!(ps.execute_update(), Err(Error::BadUsageError(_))));
    ps.set_int(1, 2).unwrap();
    ps.clear_parameters().unwrap();
    assert!(matches!(ps.execute_update(), Err(Error::BadUsageError(_))));
    assert_eq!(captured.len(), sent);
    assert_eq!(conn.state().unwrap(), State::Idle);
}

#[test]
fn prepared_query_uses_statement_columns() {
    let script = Script::setup()
        .prepared(4, 1, &[(InformixDataType::Integer, 4, "n")])
        .status()
        .message(MessageType::QueryResponse)
        .i32(2)
        .int_row(11)
        .int_row(12)
        .end();
    let (_driver, conn, _captured) = script.connect(&Opts::default());
    let mut ps = conn.prepare("select n from t where n > ?").unwrap();
    ps.set_short(0, 10).unwrap();

    let mut rs = ps.execute_query().unwrap();
    assert_eq!(rs.metadata().unwrap().total_rows(), Some(2));
    assert_eq!(rs.column_label(0).unwrap(), "n");
    let mut values = Vec::new();
    while rs.next().unwrap() {
        values.push(rs.get_int(0).unwrap());
    }
    assert_eq!(values, [11, 12]);
}

#[test]
fn query_without_result_columns_is_rejected() {
    let script = Script::setup().prepared(2, 0, &[]).status();
    let (_driver, conn, _captured) = script.connect(&Opts::default());
    let ps = conn.prepare("delete from t").unwrap();
    assert!(matches!(ps.execute_query(), Err(Error::BadUsageError(_))));
    assert_eq!(conn.state().unwrap(), State::Idle);
}

#[test]
fn batches_run_in_one_round_trip() {
    let script = Script::setup()
        .prepared(7, 1, &[])
        .status()
        .batch_counts(&[1, 0, 1]);
    let (_driver, conn, captured) = script.connect(&Opts::default());
    let mut ps = conn.prepare("delete from t where id = ?").unwrap();
    for id in [1, 2, 3] {
        ps.set_int(0, id).unwrap();
        ps.add_batch().unwrap();
    }
    assert_eq!(ps.num_batches(), 3);
    captured.clear();

    assert_eq!(ps.execute_batches().unwrap(), [1, 0, 1]);
    assert_eq!(ps.num_batches(), 0);
    assert_eq!(conn.state().unwrap(), State::ExecutedBatches);

    let sent = captured.bytes();
    let mut body = operation(OperationType::ExecuteBatch, 7);
    write_int_4(&mut body, 3);
    for id in [1, 2, 3] {
        int_parameter(&mut body, id);
    }
    write_int_2(&mut body, TERMINATOR);
    assert!(sent.ends_with(&body));
}

#[test]
fn incomplete_batch_is_consumed_without_io() {
    let script = Script::setup().prepared(7, 2, &[]);
    let (_driver, conn, captured) = script.connect(&Opts::default());
    let mut ps = conn.prepare("insert into t values (?, ?)").unwrap();
    ps.set_int(0, 1).unwrap();
    ps.add_batch().unwrap();
    let sent = captured.len();

    assert!(matches!(ps.execute_batches(), Err(Error::BadUsageError(_))));
    assert_eq!(ps.num_batches(), 0);
    assert_eq!(captured.len(), sent);
}

#[test]
fn closed_statement_rejects_use() {
    let script = Script::setup().prepared(9, 1, &[]).status();
    let (_driver, conn, captured) = script.connect(&Opts::default());
    let mut ps = conn.prepare("delete from t where id = ?").unwrap();
    ps.set_int(0, 1).unwrap();
    captured.clear();

    ps.close().unwrap();
    let mut expected = operation(OperationType::Close, 9);
    write_int_2(&mut expected, TERMINATOR);
    assert_eq!(captured.bytes(), expected);

    assert!(ps.is_closed());
    assert!(matches!(ps.set_int(0, 2), Err(Error::PreparedStatementClosed)));
    assert!(matches!(ps.execute_update(), Err(Error::PreparedStatementClosed)));
    assert!(matches!(ps.add_batch(), Err(Error::PreparedStatementClosed)));
    assert!(matches!(ps.close(), Err(Error::PreparedStatementClosed)));
}

#[test]
fn server_error_on_prepare_leaves_connection_idle() {
    let script = Script::setup().error(-201).prepared(1, 0, &[]);
    let (_driver, conn, _captured) = script.connect(&Opts::default());
    assert!(matches!(
        conn.prepare("selec oops"),
        Err(Error::ProtocolErrorCode(-201))
    ));
    assert_eq!(conn.state().unwrap(), State::Idle);
    assert!(conn.prepare("select 1 from t").is_ok());
}

#[test]
fn shared_connection_moves_across_threads() {
    let script = Script::setup().prepared(5, 1, &[]).status().update_count(1);
    let driver = SharedInformixDriver::new();
    let conn = driver
        .connect_with_io(
            Box::new(Cursor::new(script.0)),
            Box::new(Captured::default()),
            &Opts::default(),
        )
        .unwrap();

    let count = thread::spawn(move || {
        let mut ps = conn.prepare("delete from t where id = ?").unwrap();
        ps.set_int(0, 1).unwrap();
        ps.execute_update().unwrap()
    })
    .join()
    .unwrap();
    assert_eq!(count, 1);
    assert_eq!(driver.open_connections(), 0);
}
