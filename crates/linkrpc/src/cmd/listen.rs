use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use linkrpc_codec::Values;
use linkrpc_rpc::SessionConfig;
use tracing::{info, warn};

use crate::cmd::link::{self, Role};
use crate::cmd::{install_ctrlc_handler, ListenArgs, PING, PONG};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_call, OutputFormat};

const POLL: Duration = Duration::from_millis(100);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let connection = link::open(
        &args.link,
        Role::Accept,
        SessionConfig::default().with_thread_name("listen-reader"),
    )?;
    let session = &connection.session;

    // Pings are answered but not consumed, so the catch-all prints them too.
    let rpc = Arc::downgrade(session.rpc());
    session.rpc().add_handler(PING, move |_: u16, args: &Values| {
        if let Some(rpc) = rpc.upgrade() {
            if let Err(err) = rpc.call(PONG, args) {
                warn!(error = %err, "pong failed");
            }
        }
        false
    });

    let (tx, rx) = mpsc::channel();
    session
        .rpc()
        .add_catch_all(move |function_id: u16, args: &Values| {
            tx.send((function_id, args.clone())).is_ok()
        });

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(POLL) {
            Ok((function_id, values)) => {
                print_call(function_id, &values, format);
                printed = printed.saturating_add(1);
                if let Some(count) = args.count {
                    if printed >= count {
                        break;
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if session.is_finished() {
                    info!("peer disconnected");
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    drop(connection);
    Ok(SUCCESS)
}
