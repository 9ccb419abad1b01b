use std::sync::mpsc;

use linkrpc_codec::Values;
use linkrpc_frame::{Frame, FrameAssembler};
use linkrpc_rpc::{Dispatch, Rpc};
use tracing::{debug, warn};

use crate::cmd::DecodeArgs;
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_call, print_frame, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.hex)?;
    let frames = find_frames(&bytes);
    if frames.is_empty() {
        return Err(CliError::new(
            DATA_INVALID,
            format!("no valid frame found in {} bytes", bytes.len()),
        ));
    }

    // Decoding goes through the same dispatch path a live link uses.
    let rpc = Rpc::new(Vec::new());
    let (tx, rx) = mpsc::channel();
    rpc.add_catch_all(move |function_id: u16, values: &Values| {
        tx.send((function_id, values.clone())).is_ok()
    });

    for frame in &frames {
        match rpc.dispatch(frame) {
            Ok(Dispatch::Handled { .. }) => {
                if let Ok((function_id, values)) = rx.try_recv() {
                    print_call(function_id, &values, format);
                }
            }
            Ok(Dispatch::Unhandled { function_id }) => {
                debug!(function_id, "call not captured");
                print_frame(frame, format);
            }
            Err(err) => {
                if frame.frame_type == rpc.config().frame_type {
                    warn!(error = %err, "rpc payload did not decode");
                }
                print_frame(frame, format);
            }
        }
    }
    Ok(SUCCESS)
}

fn parse_hex(parts: &[String]) -> CliResult<Vec<u8>> {
    let cleaned: String = parts
        .iter()
        .map(|part| part.trim_start_matches("0x"))
        .flat_map(str::chars)
        .filter(|c| !c.is_whitespace())
        .collect();
    hex::decode(&cleaned).map_err(|err| CliError::new(USAGE, format!("invalid hex: {err}")))
}

/// Every frame in `bytes`, accepting any size the header can declare.
fn find_frames(bytes: &[u8]) -> Vec<Frame> {
    let mut assembler = FrameAssembler::with_max_frame_size(usize::from(u16::MAX));
    bytes.iter().filter_map(|&b| assembler.push(b)).collect()
}
