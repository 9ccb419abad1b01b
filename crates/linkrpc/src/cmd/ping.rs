use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use linkrpc_codec::{Value, Values};
use linkrpc_rpc::SessionConfig;
use tracing::{info, warn};

use crate::cmd::link::{self, Role};
use crate::cmd::{install_ctrlc_handler, now_millis, parse_duration, PingArgs, PING, PONG};
use crate::exit::{rpc_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_pong, OutputFormat};

pub fn run(args: PingArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let timeout = parse_duration(&args.timeout)?;

    let connection = link::open(&args.link, Role::Connect, SessionConfig::default())?;
    let session = &connection.session;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let (tx, rx) = mpsc::channel();
    session.rpc().add_handler(PONG, move |_: u16, values: &Values| {
        match values.int_at(1) {
            Some(seq) => tx.send(seq).is_ok(),
            None => false,
        }
    });

    let mut sent = 0usize;
    let mut received = 0usize;
    for seq in 0..args.count {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        if seq > 0 {
            std::thread::sleep(interval);
        }

        let started = Instant::now();
        let call_args = [Value::Int64(now_millis()), Value::UInt32(seq as i64)];
        session
            .rpc()
            .call(PING, &call_args)
            .map_err(|err| rpc_error("ping failed", err))?;
        sent += 1;

        match wait_for_pong(&rx, seq as i64, started, timeout) {
            Some(rtt) => {
                received += 1;
                print_pong(seq, rtt, format);
            }
            None => warn!(seq, "no pong within {timeout:?}"),
        }
    }

    info!(sent, received, "ping finished");
    drop(connection);

    if sent > 0 && received == 0 {
        return Err(CliError::new(TIMEOUT, "no pong received"));
    }
    Ok(SUCCESS)
}

/// Wait for the pong carrying `seq`, skipping late replies to earlier pings.
///
/// Returns the round trip time measured from `started`.
fn wait_for_pong(
    rx: &mpsc::Receiver<i64>,
    seq: i64,
    started: Instant,
    timeout: Duration,
) -> Option<Duration> {
    let deadline = started + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(got) if got == seq => return Some(started.elapsed()),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
}
