use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use linkrpc_codec::{Value, ValueType};

use crate::exit::{CliError, CliResult, INTERNAL, USAGE};
use crate::output::OutputFormat;

pub mod call;
pub mod decode;
pub mod link;
pub mod listen;
pub mod ping;
pub mod ports;
pub mod version;

use link::LinkArgs;

/// Function id of a ping call. Its single Int64 argument is echoed back.
pub const PING: u16 = 1;
/// Function id of the reply to a ping.
pub const PONG: u16 = 2;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept one peer, print every call it makes, and answer pings.
    Listen(ListenArgs),
    /// Make a single call.
    Call(CallArgs),
    /// Measure round trips with ping/pong calls.
    Ping(PingArgs),
    /// Find frames in hex bytes and print their contents.
    Decode(DecodeArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Call(args) => call::run(args, format),
        Command::Ping(args) => ping::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Exit after printing N calls.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Function id to call.
    pub function_id: u16,
    /// Arguments as TYPE:VALUE (types: str, i8, u8, i16, u16, i32, u32, i64, f32).
    #[arg(value_parser = parse_value)]
    pub args: Vec<Value>,
    /// Wait for one incoming call and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct PingArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Number of pings to send.
    #[arg(long, short = 'c', default_value = "4")]
    pub count: usize,
    /// Pause between pings (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Maximum time to wait for each pong.
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex bytes; whitespace between bytes is allowed.
    #[arg(required = true, num_args = 1..)]
    pub hex: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PortsArgs {
    /// Only show ports that look like a device (ACM, USB, rfcomm).
    #[arg(long)]
    pub devices: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a `TYPE:VALUE` argument token.
pub fn parse_value(token: &str) -> Result<Value, String> {
    let (ty, raw) = token
        .split_once(':')
        .ok_or_else(|| format!("expected TYPE:VALUE, got {token:?}"))?;

    let value = match ty.to_ascii_lowercase().as_str() {
        "str" | "string" => Value::from(raw),
        "f32" | "float" => raw
            .parse::<f32>()
            .map(Value::Float32)
            .map_err(|err| format!("invalid float {raw:?}: {err}"))?,
        other => {
            let value_type = integer_type(other).ok_or_else(|| {
                format!("unknown type {other:?} (expected str, i8, u8, i16, u16, i32, u32, i64, f32)")
            })?;
            let number: i64 = raw
                .parse()
                .map_err(|err| format!("invalid integer {raw:?}: {err}"))?;
            Value::integer(value_type, number)
                .ok_or_else(|| format!("{value_type} is not an integer type"))?
        }
    };
    value.validate().map_err(|err| err.to_string())?;
    Ok(value)
}

fn integer_type(name: &str) -> Option<ValueType> {
    Some(match name {
        "i8" => ValueType::Int8,
        "u8" => ValueType::UInt8,
        "i16" => ValueType::Int16,
        "u16" => ValueType::UInt16,
        "i32" => ValueType::Int32,
        "u32" => ValueType::UInt32,
        "i64" => ValueType::Int64,
        _ => return None,
    })
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Clear `running` on Ctrl-C.
pub fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

/// Milliseconds since the Unix epoch, the timestamp carried by pings.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
