//! Ping-pong between a "host" and a "device" over an in-memory link.
//!
//! Run with:
//!   cargo run --example ping-pong
//!
//! The device answers function 1 (ping) with function 2 (pong), echoing the
//! timestamp it was given. The host prints the round trip of each exchange.

use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use linkrpc::codec::{Value, Values};
use linkrpc::rpc::Session;
use linkrpc::transport::memory;

const PING: u16 = 1;
const PONG: u16 = 2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (host_end, device_end) = memory::pair();

    let (source, sink) = device_end.split();
    let device = Session::start(source, sink)?;
    let device_rpc = Arc::downgrade(device.rpc());
    device
        .rpc()
        .add_handler(PING, move |_: u16, args: &Values| {
            device_rpc
                .upgrade()
                .is_some_and(|rpc| rpc.call(PONG, args).is_ok())
        });

    let (source, sink) = host_end.split();
    let host = Session::start(source, sink)?;
    let (tx, rx) = mpsc::channel();
    host.rpc().add_handler(PONG, move |_: u16, args: &Values| {
        tx.send(args.int_at(0)).is_ok()
    });

    let epoch = Instant::now();
    for _ in 0..5 {
        let sent = epoch.elapsed().as_micros() as i64;
        host.rpc().call(PING, &[Value::Int64(sent)])?;

        match rx.recv_timeout(Duration::from_secs(1))? {
            Some(echoed) => {
                let rtt = epoch.elapsed().as_micros() as i64 - echoed;
                eprintln!("pong: sent at {echoed} us, round trip {rtt} us");
            }
            None => eprintln!("pong without a timestamp"),
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    host.stop();
    device.join();
    Ok(())
}
