//! Function-id RPC over linkrpc frames.
//!
//! An RPC message is one frame of type [`RPC`](linkrpc_frame::RPC) whose
//! payload is a serialized value sequence. The first value is a UInt16
//! function id; the rest are the call's arguments.
//!
//! [`Rpc`] is both ends of that exchange: it dispatches incoming frames to
//! handlers registered per function id, and [`Rpc::call`] sends calls the
//! other way. [`Session`] wires an `Rpc` to a link and runs the read loop
//! on its own thread.

pub mod config;
pub mod error;
pub mod handler;
pub mod rpc;
pub mod session;

pub use config::{RpcConfig, SessionConfig};
pub use error::{Result, RpcError};
pub use handler::{HandlerId, RpcHandler};
pub use rpc::{encode_call, Dispatch, Rpc};
pub use session::Session;
