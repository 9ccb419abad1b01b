use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use linkrpc_codec::{Value, Values};
use linkrpc_frame::{Frame, FrameHandler, FrameWriter};
use linkrpc_transport::ByteSink;
use tracing::{debug, trace, warn};

use crate::config::RpcConfig;
use crate::error::{Result, RpcError};
use crate::handler::{HandlerId, HandlerTable, RpcHandler};

/// Outcome of dispatching one RPC frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler consumed the call.
    Handled { function_id: u16 },
    /// No handler consumed the call; it was dropped.
    Unhandled { function_id: u16 },
}

/// Encode a call's payload: the function id as UInt16, then `args`.
pub fn encode_call(function_id: u16, args: &[Value]) -> Result<Bytes> {
    let mut values = Vec::with_capacity(args.len() + 1);
    values.push(Value::UInt16(i64::from(function_id)));
    values.extend_from_slice(args);
    Ok(linkrpc_codec::encode(&values)?)
}

/// RPC endpoint over one byte sink.
///
/// Register it with a [`HandlerRegistry`](linkrpc_frame::HandlerRegistry)
/// for its frame type to receive calls; use [`call`](Self::call) to send
/// them. Calls may come from any thread. Writes are serialized so frames
/// from concurrent calls never interleave.
pub struct Rpc<S> {
    writer: Mutex<FrameWriter<S>>,
    handlers: Mutex<HandlerTable>,
    config: RpcConfig,
}

impl<S: ByteSink> Rpc<S> {
    /// Create an endpoint with default configuration.
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, RpcConfig::default())
    }

    /// Create an endpoint with explicit configuration.
    pub fn with_config(sink: S, config: RpcConfig) -> Self {
        Self {
            writer: Mutex::new(FrameWriter::with_config(sink, config.frame.clone())),
            handlers: Mutex::new(HandlerTable::default()),
            config,
        }
    }

    /// Append `handler` to the chain for `function_id`.
    ///
    /// Handlers in a chain are tried in registration order until one
    /// returns `true`. Registering the same handler twice adds it twice.
    pub fn add_handler<H>(&self, function_id: u16, handler: H) -> HandlerId
    where
        H: RpcHandler + 'static,
    {
        let id = self.table().add(function_id, Arc::new(handler));
        debug!(function_id, handler = id.get(), "rpc handler added");
        id
    }

    /// Add a handler that is tried for every function id, after that id's
    /// own chain.
    pub fn add_catch_all<H>(&self, handler: H) -> HandlerId
    where
        H: RpcHandler + 'static,
    {
        let id = self.table().add_catch_all(Arc::new(handler));
        debug!(handler = id.get(), "rpc catch-all handler added");
        id
    }

    /// Remove every handler registered for `function_id`.
    ///
    /// Returns how many were removed. Catch-all handlers are unaffected.
    pub fn remove_handler(&self, function_id: u16) -> usize {
        let removed = self.table().remove_function(function_id);
        debug!(function_id, removed, "rpc handlers removed");
        removed
    }

    /// Remove one registration.
    pub fn remove_handler_id(&self, id: HandlerId) -> bool {
        self.table().remove_id(id)
    }

    /// Total registrations, catch-alls included.
    pub fn handler_count(&self) -> usize {
        self.table().len()
    }

    /// Function ids that have at least one handler, ascending.
    pub fn function_ids(&self) -> Vec<u16> {
        self.table().function_ids()
    }

    /// Send a call to the peer.
    ///
    /// Encoding errors are returned before anything is written.
    pub fn call(&self, function_id: u16, args: &[Value]) -> Result<()> {
        let payload = encode_call(function_id, args)?;
        trace!(function_id, args = args.len(), size = payload.len(), "rpc call");

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.send(self.config.frame_type, &payload)?;
        Ok(())
    }

    /// Decode an RPC frame and run the handlers for its function id.
    ///
    /// Handlers run without any lock held, so they may call, register, or
    /// remove handlers themselves.
    pub fn dispatch(&self, frame: &Frame) -> Result<Dispatch> {
        if frame.frame_type != self.config.frame_type {
            return Err(RpcError::WrongFrameType {
                expected: self.config.frame_type,
                actual: frame.frame_type,
            });
        }

        let mut args = Values::decode(&frame.payload)?;
        if args.is_empty() {
            return Err(RpcError::MissingFunctionId);
        }
        let first = args.remove(0);
        let function_id = first
            .as_i64()
            .and_then(|id| u16::try_from(id).ok())
            .ok_or(RpcError::InvalidFunctionId(first))?;

        let chain = self.table().snapshot(function_id);
        for handler in chain {
            if handler.on_call(function_id, &args) {
                return Ok(Dispatch::Handled { function_id });
            }
        }
        Ok(Dispatch::Unhandled { function_id })
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    fn table(&self) -> MutexGuard<'_, HandlerTable> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: ByteSink + Send> FrameHandler for Rpc<S> {
    fn on_frame(&self, frame: &Frame) {
        match self.dispatch(frame) {
            Ok(Dispatch::Handled { function_id }) => {
                debug!(function_id, "rpc call handled");
            }
            Ok(Dispatch::Unhandled { function_id }) => {
                debug!(function_id, "no rpc handler consumed call");
            }
            Err(err) => {
                warn!(error = %err, size = frame.size(), "dropping rpc frame");
            }
        }
    }
}

impl<S> fmt::Debug for Rpc<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rpc")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
