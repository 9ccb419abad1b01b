use linkrpc_transport::serial;

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_ports, OutputFormat};

pub fn run(args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let mut ports =
        serial::list_ports().map_err(|err| transport_error("listing ports failed", err))?;
    if args.devices {
        ports.retain(|port| port.is_device_port());
    }
    print_ports(&ports, format);
    Ok(SUCCESS)
}
