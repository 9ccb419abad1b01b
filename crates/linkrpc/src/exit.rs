use std::fmt;
use std::io;

use linkrpc_codec::CodecError;
use linkrpc_frame::FrameError;
use linkrpc_rpc::RpcError;
use linkrpc_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::PathTooLong { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        TransportError::Closed => CliError::new(FAILURE, format!("{context}: {err}")),
        TransportError::Serial { ref source, .. } | TransportError::PortList(ref source) => {
            let code = match source.kind() {
                serialport::ErrorKind::NoDevice => FAILURE,
                serialport::ErrorKind::InvalidInput => USAGE,
                serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => PERMISSION_DENIED,
                serialport::ErrorKind::Io(io::ErrorKind::NotFound) => FAILURE,
                _ => TRANSPORT_ERROR,
            };
            CliError::new(code, format!("{context}: {err}"))
        }
    }
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::PayloadTooLarge { .. } | FrameError::CrcMismatch { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ZeroType => CliError::new(USAGE, format!("{context}: {err}")),
        FrameError::Closed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn rpc_error(context: &str, err: RpcError) -> CliError {
    match err {
        RpcError::Codec(err) => codec_error(context, err),
        RpcError::Frame(err) => frame_error(context, err),
        RpcError::Spawn(err) => io_error(context, err),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_kinds_map_to_codes() {
        let err = io_error("x", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(err.code, PERMISSION_DENIED);
        let err = io_error("x", io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(err.code, TIMEOUT);
        let err = io_error("x", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn layered_errors_unwrap_to_the_root_cause() {
        let err = rpc_error(
            "call failed",
            RpcError::Frame(FrameError::Transport(TransportError::Closed)),
        );
        assert_eq!(err.code, FAILURE);
        assert!(err.message.starts_with("call failed: "));

        let err = rpc_error(
            "call failed",
            RpcError::Codec(CodecError::StringTooLong { len: 300, max: 255 }),
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn serial_errors_map_by_kind() {
        let serial = |kind| TransportError::Serial {
            port: "/dev/ttyACM0".into(),
            source: serialport::Error::new(kind, "test"),
        };
        let err = transport_error("open failed", serial(serialport::ErrorKind::NoDevice));
        assert_eq!(err.code, FAILURE);
        let err = transport_error(
            "open failed",
            serial(serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied)),
        );
        assert_eq!(err.code, PERMISSION_DENIED);
        let err = transport_error("open failed", serial(serialport::ErrorKind::Unknown));
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.contains("/dev/ttyACM0"));
    }

    #[test]
    fn path_too_long_is_usage() {
        let err = transport_error(
            "bind failed",
            TransportError::PathTooLong {
                path: "/tmp/x".into(),
                len: 200,
                max: 108,
            },
        );
        assert_eq!(err.code, USAGE);
    }
}
