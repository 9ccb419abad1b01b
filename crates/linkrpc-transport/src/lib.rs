//! Byte-oriented link abstraction for linkrpc.
//!
//! The framing and RPC layers never see a serial port or a socket. They see
//! a [`ByteSource`] that yields one byte at a time and a [`ByteSink`] that
//! accepts whole buffers. This crate defines those two capabilities and
//! provides a few concrete links:
//! - [`IoSource`] / [`IoSink`] over any `std::io::Read` / `std::io::Write`
//! - Unix domain sockets (Linux/macOS)
//! - Serial ports (feature `serial`)
//! - An in-process [`memory`] loopback for tests and simulation

pub mod error;
pub mod io;
pub mod memory;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;
#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use io::{IoSink, IoSource};
pub use traits::{ByteSink, ByteSource, ReadOutcome};

#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialLink};
#[cfg(unix)]
pub use uds::{Link, UnixDomainSocket};
