//! Two sessions talking to each other, the way a host talks to a device.

use std::sync::mpsc;
use std::time::Duration;

use linkrpc_codec::{Value, Values};
use linkrpc_frame::ReadLoopExit;
use linkrpc_rpc::{Session, SessionConfig};
use linkrpc_transport::memory;

const PING: u16 = 1;
const PONG: u16 = 2;
const TIMEOUT: Duration = Duration::from_secs(5);

fn answer_pings<S>(session: &Session<S>)
where
    S: linkrpc_transport::ByteSink + Send + 'static,
{
    let rpc = std::sync::Arc::downgrade(session.rpc());
    session
        .rpc()
        .add_handler(PING, move |_: u16, args: &Values| {
            let Some(rpc) = rpc.upgrade() else {
                return false;
            };
            rpc.call(PONG, args).is_ok()
        });
}

#[test]
fn ping_is_answered_with_pong() {
    let (host_end, device_end) = memory::pair();

    let (source, sink) = device_end.split();
    let device = Session::with_config(
        source,
        sink,
        SessionConfig::default().with_thread_name("device-reader"),
    )
    .unwrap();
    answer_pings(&device);

    let (source, sink) = host_end.split();
    let host = Session::start(source, sink).unwrap();
    let (tx, rx) = mpsc::channel();
    host.rpc().add_handler(PONG, move |_: u16, args: &Values| {
        tx.send(args.int_at(0)).is_ok()
    });

    for stamp in [1_000_i64, 2_000, 3_000] {
        host.rpc().call(PING, &[Value::Int64(stamp)]).unwrap();
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), Some(stamp));
    }

    assert_eq!(host.stop(), Some(ReadLoopExit::Stopped));
    assert_eq!(device.join(), Some(ReadLoopExit::Closed));
}

#[test]
fn many_values_cross_the_link_intact() {
    let (host_end, device_end) = memory::pair();
    let (source, sink) = device_end.split();
    let device = Session::start(source, sink).unwrap();
    let (tx, rx) = mpsc::channel();
    device.rpc().add_catch_all(move |function_id: u16, args: &Values| {
        tx.send((function_id, args.clone())).is_ok()
    });

    let (source, sink) = host_end.split();
    let host = Session::start(source, sink).unwrap();
    let args = vec![
        Value::Int8(-10),
        Value::UInt8(10),
        Value::Int16(320),
        Value::UInt16(65_535),
        Value::Int32(-70_000),
        Value::UInt32(4_000_000_000),
        Value::Int64(-1),
        Value::Float32(2.5),
        Value::from("x".repeat(255)),
        Value::from(""),
    ];
    host.rpc().call(300, &args).unwrap();

    let (function_id, received) = rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(function_id, 300);
    assert_eq!(received.into_inner(), args);
}

#[cfg(unix)]
#[test]
fn sessions_over_unix_socket() {
    use linkrpc_transport::UnixDomainSocket;

    let dir = std::env::temp_dir().join(format!("linkrpc-session-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("rpc.sock");
    let listener = UnixDomainSocket::bind(&path).unwrap();

    let client_path = path.clone();
    let client = std::thread::spawn(move || UnixDomainSocket::connect(client_path).unwrap());
    let server_link = listener.accept().unwrap();
    let client_link = client.join().unwrap();

    let device = Session::from_link(server_link, SessionConfig::default()).unwrap();
    answer_pings(&device);

    let host = Session::from_link(client_link, SessionConfig::default()).unwrap();
    let (tx, rx) = mpsc::channel();
    host.rpc().add_handler(PONG, move |_: u16, args: &Values| {
        tx.send(args.int_at(0)).is_ok()
    });
    host.rpc().call(PING, &[Value::Int64(42)]).unwrap();
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), Some(42));

    drop(host);
    drop(device);
    drop(listener);
    let _ = std::fs::remove_dir_all(&dir);
}
