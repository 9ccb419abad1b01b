use clap::Args;
use linkrpc_rpc::{Session, SessionConfig};
use linkrpc_transport::serial::{self, SerialConfig, SerialLink};
use linkrpc_transport::uds::DEFAULT_READ_TIMEOUT;
use linkrpc_transport::{ByteSink, ByteSource, UnixDomainSocket};
use tracing::info;

use crate::cmd::parse_duration;
use crate::exit::{rpc_error, transport_error, CliError, CliResult, FAILURE};

/// Serial port name that asks for discovery instead of a fixed port.
pub const AUTO_PORT: &str = "auto";

/// Session type shared by socket and serial links.
pub type CliSession = Session<Box<dyn ByteSink + Send>>;

/// Where a command's link goes.
#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Socket path, or a serial port with --serial ("auto" picks a device port).
    #[arg(value_name = "TARGET")]
    pub target: String,
    /// Open TARGET as a serial port.
    #[arg(long)]
    pub serial: bool,
    /// Serial baud rate [default: 9600].
    #[arg(long, requires = "serial")]
    pub baud: Option<u32>,
    /// Longest a single read blocks, e.g. 100ms [default: 100ms socket, 1s serial].
    #[arg(long, value_name = "DURATION")]
    pub read_timeout: Option<String>,
}

/// Which side of a socket link a command takes. Serial links have no sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Accept,
    Connect,
}

/// A running session plus whatever must outlive it.
pub struct Connection {
    pub session: CliSession,
    // Dropped after the session, so the socket path stays until the reader stops.
    _listener: Option<UnixDomainSocket>,
}

impl LinkArgs {
    fn parsed_read_timeout(&self) -> CliResult<Option<std::time::Duration>> {
        self.read_timeout.as_deref().map(parse_duration).transpose()
    }

    pub fn serial_config(&self) -> CliResult<SerialConfig> {
        let mut config = SerialConfig::default();
        if let Some(baud) = self.baud {
            config = config.with_baud_rate(baud);
        }
        if let Some(timeout) = self.parsed_read_timeout()? {
            config = config.with_read_timeout(timeout);
        }
        Ok(config)
    }
}

/// Open the link described by `link` and start a session on it.
pub fn open(link: &LinkArgs, role: Role, config: SessionConfig) -> CliResult<Connection> {
    if link.serial {
        let port = resolve_port(&link.target)?;
        let (source, sink) = SerialLink::open(&port, &link.serial_config()?)
            .map_err(|err| transport_error("open failed", err))?
            .split();
        return Ok(Connection {
            session: start(source, sink, config)?,
            _listener: None,
        });
    }

    let read_timeout = link.parsed_read_timeout()?.or(Some(DEFAULT_READ_TIMEOUT));
    match role {
        Role::Accept => {
            let listener = UnixDomainSocket::bind(&link.target)
                .map_err(|err| transport_error("bind failed", err))?
                .with_read_timeout(read_timeout);
            info!(path = ?listener.path(), "waiting for peer");
            let (source, sink) = listener
                .accept()
                .map_err(|err| transport_error("accept failed", err))?
                .split();
            Ok(Connection {
                session: start(source, sink, config)?,
                _listener: Some(listener),
            })
        }
        Role::Connect => {
            let (source, sink) = UnixDomainSocket::connect_with_timeout(&link.target, read_timeout)
                .map_err(|err| transport_error("connect failed", err))?
                .split();
            Ok(Connection {
                session: start(source, sink, config)?,
                _listener: None,
            })
        }
    }
}

fn start<R, W>(source: R, sink: W, config: SessionConfig) -> CliResult<CliSession>
where
    R: ByteSource + Send + 'static,
    W: ByteSink + Send + 'static,
{
    let sink: Box<dyn ByteSink + Send> = Box::new(sink);
    Session::with_config(source, sink, config).map_err(|err| rpc_error("session failed", err))
}

fn resolve_port(target: &str) -> CliResult<String> {
    if target != AUTO_PORT {
        return Ok(target.to_string());
    }
    let port = serial::find_device_port()
        .map_err(|err| transport_error("port discovery failed", err))?
        .ok_or_else(|| CliError::new(FAILURE, "no serial device port found"))?;
    info!(port = %port, "using discovered serial port");
    Ok(port)
}
