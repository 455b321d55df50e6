mod common;

use std::io::Read;
use std::os::unix::net::UnixStream;
use std::thread;

use common::{Script, init_tracing, outbound};
use pretty_assertions::assert_eq;
use zero_wiredb::Opts;
use zero_wiredb::error::Error;
use zero_wiredb::informix::message::{MessageType, TERMINATOR};
use zero_wiredb::protocol::State;
use zero_wiredb::sync::{ExecuteResult, InformixDriver, Stream};

fn setup_bytes() -> Vec<u8> {
    // PROTOCOLS, then PROPERTIES with no entries
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&MessageType::Protocols.code().to_be_bytes());
    bytes.extend_from_slice(&MessageType::Properties.code().to_be_bytes());
    bytes.extend_from_slice(&0u16.to_be_bytes());
    bytes.extend_from_slice(&TERMINATOR.to_be_bytes());
    bytes
}

#[test]
fn connect_runs_initial_setup() {
    init_tracing();
    let (driver, mut conn, captured) = Script::setup().connect(&Opts::default());

    assert_eq!(captured.bytes(), setup_bytes());
    assert_eq!(conn.state().unwrap(), State::Idle);
    assert!(!conn.auto_commit().unwrap());
    assert_eq!(driver.open_connections(), 1);

    conn.close().unwrap();
    assert_eq!(driver.open_connections(), 0);
    assert!(captured.bytes().ends_with(&TERMINATOR.to_be_bytes()));
}

#[test]
fn failed_setup_does_not_track_connection() {
    let driver = InformixDriver::new();
    let script = Script::default().error(-908);
    let err = driver
        .connect_with_io(
            Box::new(std::io::Cursor::new(script.0)),
            Box::new(std::io::sink()),
            &Opts::default(),
        )
        .err()
        .unwrap();
    assert!(matches!(err, Error::ProtocolErrorCode(-908)));
    assert_eq!(driver.open_connections(), 0);
}

#[test]
fn closed_connection_rejects_work_without_io() {
    let (_driver, mut conn, captured) = Script::setup().connect(&Opts::default());
    conn.close().unwrap();
    let sent = captured.len();

    assert!(matches!(conn.create_statement(), Err(Error::ConnectionClosed)));
    assert!(matches!(
        conn.set_auto_commit(true),
        Err(Error::ProtocolState(State::Closed))
    ));
    assert!(matches!(conn.commit(), Err(Error::ProtocolState(State::Closed))));
    assert!(matches!(
        conn.prepare("select 1"),
        Err(Error::ProtocolState(State::Closed))
    ));
    assert!(matches!(conn.close(), Err(Error::AlreadyClosed)));
    assert_eq!(captured.len(), sent);
}

#[test]
fn statement_fails_once_connection_closes() {
    let (_driver, mut conn, _captured) = Script::setup().connect(&Opts::default());
    let stmt = conn.create_statement().unwrap();
    conn.close().unwrap();
    assert!(matches!(
        stmt.execute_update("delete from t"),
        Err(Error::ProtocolState(State::Closed))
    ));
}

#[test]
fn auto_commit_from_url() {
    let opts = Opts::try_from("informix://localhost/stores?auto_commit=on").unwrap();
    let (_driver, conn, captured) = Script::setup().status().connect(&opts);
    assert!(conn.auto_commit().unwrap());

    let mut database = Vec::new();
    database.extend_from_slice(&6u32.to_be_bytes());
    database.extend_from_slice(b"stores");
    let sent = captured.bytes();
    assert!(
        sent.windows(database.len()).any(|w| w == database.as_slice()),
        "database name not sent"
    );

    let mut autocommit = Vec::new();
    autocommit.extend_from_slice(&1u16.to_be_bytes());
    for s in ["autocommit", "on"] {
        autocommit.extend_from_slice(&(s.len() as u32).to_be_bytes());
        autocommit.extend_from_slice(s.as_bytes());
    }
    assert!(sent.ends_with(&outbound(MessageType::Properties, &autocommit)));
}

#[test]
fn update_opens_transaction_until_commit() {
    let script = Script::setup().status().update_count(2).update_count(1).commit();
    let (_driver, conn, captured) = script.connect(&Opts::default());
    let stmt = conn.create_statement().unwrap();
    captured.clear();

    assert_eq!(stmt.execute_update("update t set a = 1").unwrap(), 2);
    assert!(conn.within_transaction().unwrap());
    assert!(captured.bytes().starts_with(&outbound(MessageType::Begin, &[])));

    // Already within the transaction: no second BEGIN
    captured.clear();
    assert_eq!(stmt.execute_update("update t set a = 2").unwrap(), 1);
    assert_eq!(
        &captured.bytes()[..2],
        MessageType::ExecuteSql.code().to_be_bytes().as_slice()
    );

    conn.commit().unwrap();
    assert!(!conn.within_transaction().unwrap());
}

#[test]
fn server_error_leaves_connection_idle() {
    let script = Script::setup().status().error(-206).update_count(1);
    let (_driver, conn, _captured) = script.connect(&Opts::default());
    let stmt = conn.create_statement().unwrap();

    let err = stmt.execute_update("delete from missing").unwrap_err();
    assert!(matches!(err, Error::ProtocolErrorCode(-206)));
    assert_eq!(conn.state().unwrap(), State::Idle);

    assert_eq!(stmt.execute_update("delete from t").unwrap(), 1);
}

#[test]
fn execute_reports_each_outcome() {
    let script = Script::setup()
        .status()
        .executed()
        .update_count(4);
    let (_driver, conn, _captured) = script.connect(&Opts::default());
    let stmt = conn.create_statement().unwrap();

    assert!(matches!(
        stmt.execute("create table t (a int)").unwrap(),
        ExecuteResult::None
    ));
    assert!(matches!(
        stmt.execute("insert into t select * from u").unwrap(),
        ExecuteResult::UpdateCount(4)
    ));
    assert_eq!(conn.state().unwrap(), State::ExecutedSql);
}

#[test]
fn connects_over_socket() {
    let (client, mut server) = UnixStream::pair().unwrap();
    let reply = Script::setup().0;
    let server = thread::spawn(move || {
        std::io::Write::write_all(&mut server, &reply).unwrap();
        let mut received = Vec::new();
        server.read_to_end(&mut received).unwrap();
        received
    });

    let driver = InformixDriver::new();
    let mut conn = driver
        .connect_with_stream(Stream::unix(client), &Opts::default())
        .unwrap();
    assert_eq!(driver.open_connections(), 1);
    conn.close().unwrap();

    let mut expected = setup_bytes();
    expected.extend_from_slice(&TERMINATOR.to_be_bytes());
    assert_eq!(server.join().unwrap(), expected);
    assert_eq!(driver.open_connections(), 0);
}
