use std::sync::mpsc;

use linkrpc_codec::Values;
use linkrpc_rpc::SessionConfig;
use tracing::debug;

use crate::cmd::link::{self, Role};
use crate::cmd::{parse_duration, CallArgs};
use crate::exit::{rpc_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_call, OutputFormat};

pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;

    let connection = link::open(&args.link, Role::Connect, SessionConfig::default())?;
    let session = &connection.session;

    let (tx, rx) = mpsc::channel();
    if args.wait {
        session
            .rpc()
            .add_catch_all(move |function_id: u16, values: &Values| {
                tx.send((function_id, values.clone())).is_ok()
            });
    }

    session
        .rpc()
        .call(args.function_id, &args.args)
        .map_err(|err| rpc_error("call failed", err))?;
    debug!(function_id = args.function_id, args = args.args.len(), "call sent");

    if args.wait {
        let (function_id, values) = rx.recv_timeout(wait_timeout).map_err(|_| {
            CliError::new(
                TIMEOUT,
                format!("no call received within {wait_timeout:?}"),
            )
        })?;
        print_call(function_id, &values, format);
    }

    drop(connection);
    Ok(SUCCESS)
}
