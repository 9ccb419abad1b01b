//! Serial port links.
//!
//! A port is opened once and cloned into a read half and a write half. The
//! read half carries a timeout so a silent device yields `NoData` and the
//! read loop can still observe its stop flag.

use std::time::Duration;

use serialport::{SerialPort, SerialPortType};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::io::{IoSink, IoSource};

/// Baud rate used when none is given.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Read timeout used when none is given.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// Name fragments of ports that usually lead to a device: USB CDC-ACM,
/// USB-serial bridges and Bluetooth RFCOMM.
const DEVICE_PORT_MARKERS: [&str; 3] = ["ACM", "USB", "rfcomm"];

/// How a serial port is opened.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl SerialConfig {
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

/// An open serial port split into its byte source and byte sink halves.
pub struct SerialLink {
    pub source: IoSource<Box<dyn SerialPort>>,
    pub sink: IoSink<Box<dyn SerialPort>>,
}

impl SerialLink {
    /// Open `path` and split it.
    pub fn open(path: &str, config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(path, config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::Serial {
                port: path.to_string(),
                source,
            })?;
        let writer = port.try_clone().map_err(|source| TransportError::Serial {
            port: path.to_string(),
            source,
        })?;
        info!(port = path, baud = config.baud_rate, "serial port opened");
        Ok(Self {
            source: IoSource::new(port),
            sink: IoSink::new(writer),
        })
    }

    /// Split into the source and sink halves.
    pub fn split(self) -> (IoSource<Box<dyn SerialPort>>, IoSink<Box<dyn SerialPort>>) {
        (self.source, self.sink)
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("source", &self.source)
            .field("sink", &self.sink)
            .finish()
    }
}

/// A serial port present on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    /// "usb", "pci", "bluetooth" or "unknown".
    pub kind: &'static str,
    /// USB product string, when the port reports one.
    pub product: Option<String>,
}

impl PortInfo {
    /// Returns true if the port name looks like it leads to a device.
    pub fn is_device_port(&self) -> bool {
        is_device_port_name(&self.name)
    }
}

/// Enumerate serial ports.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::PortList)?;
    Ok(ports
        .into_iter()
        .map(|port| {
            let (kind, product) = match port.port_type {
                SerialPortType::UsbPort(usb) => ("usb", usb.product),
                SerialPortType::PciPort => ("pci", None),
                SerialPortType::BluetoothPort => ("bluetooth", None),
                SerialPortType::Unknown => ("unknown", None),
            };
            PortInfo {
                name: port.port_name,
                kind,
                product,
            }
        })
        .collect())
}

/// Pick a port when the user did not name one: the last listed port whose
/// name looks like a device.
pub fn find_device_port() -> Result<Option<String>> {
    let ports = list_ports()?;
    let found = pick_device_port(&ports);
    debug!(candidates = ports.len(), ?found, "serial port discovery");
    Ok(found)
}

fn pick_device_port(ports: &[PortInfo]) -> Option<String> {
    ports
        .iter()
        .rev()
        .find(|port| port.is_device_port())
        .map(|port| port.name.clone())
}

fn is_device_port_name(name: &str) -> bool {
    DEVICE_PORT_MARKERS
        .iter()
        .any(|marker| name.contains(marker))
}
