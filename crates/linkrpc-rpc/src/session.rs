use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use linkrpc_frame::{HandlerRegistry, ReadLoopExit, StreamParser};
use linkrpc_transport::{ByteSink, ByteSource};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::{Result, RpcError};
use crate::rpc::Rpc;

/// An [`Rpc`] endpoint attached to a link, with its read loop running on a
/// dedicated thread.
///
/// Dropping the session stops the reader and waits for it.
pub struct Session<S: ByteSink + Send + 'static> {
    rpc: Arc<Rpc<S>>,
    frame_handlers: HandlerRegistry,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<ReadLoopExit>>,
}

impl<S: ByteSink + Send + 'static> Session<S> {
    /// Start a session with default configuration.
    pub fn start<R>(source: R, sink: S) -> Result<Self>
    where
        R: ByteSource + Send + 'static,
    {
        Self::with_config(source, sink, SessionConfig::default())
    }

    /// Start a session with explicit configuration.
    pub fn with_config<R>(source: R, sink: S, config: SessionConfig) -> Result<Self>
    where
        R: ByteSource + Send + 'static,
    {
        let frame_config = config.rpc.frame.clone();
        let frame_type = config.rpc.frame_type;
        let rpc = Arc::new(Rpc::with_config(sink, config.rpc));

        let frame_handlers = HandlerRegistry::new();
        frame_handlers.register_shared(frame_type, rpc.clone());

        let stop = Arc::new(AtomicBool::new(false));
        let reader = {
            let handlers = frame_handlers.clone();
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name(config.thread_name.clone())
                .spawn(move || {
                    let mut parser = StreamParser::with_config(source, handlers, frame_config);
                    let exit = parser.run(&stop);
                    debug!(?exit, "reader thread finished");
                    exit
                })
                .map_err(RpcError::Spawn)?
        };
        debug!(thread = %config.thread_name, frame_type, "session started");

        Ok(Self {
            rpc,
            frame_handlers,
            stop,
            reader: Some(reader),
        })
    }

    /// The RPC endpoint: register handlers and make calls here.
    pub fn rpc(&self) -> &Arc<Rpc<S>> {
        &self.rpc
    }

    /// Frame handlers consulted by the reader. Other frame types sharing the
    /// link can be registered here.
    pub fn frame_handlers(&self) -> &HandlerRegistry {
        &self.frame_handlers
    }

    /// Returns true once the reader thread has exited.
    pub fn is_finished(&self) -> bool {
        self.reader.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Ask the reader to stop and wait for it.
    ///
    /// The reader notices the request between bytes, so this returns within
    /// one read timeout of the byte source.
    pub fn stop(mut self) -> Option<ReadLoopExit> {
        self.stop.store(true, Ordering::SeqCst);
        self.wait()
    }

    /// Wait for the reader to exit on its own, usually because the link
    /// closed.
    pub fn join(mut self) -> Option<ReadLoopExit> {
        self.wait()
    }

    fn wait(&mut self) -> Option<ReadLoopExit> {
        let handle = self.reader.take()?;
        match handle.join() {
            Ok(exit) => Some(exit),
            Err(_) => {
                warn!("reader thread panicked");
                None
            }
        }
    }
}

impl<S: ByteSink + Send + 'static> Drop for Session<S> {
    fn drop(&mut self) {
        if self.reader.is_some() {
            self.stop.store(true, Ordering::SeqCst);
            self.wait();
        }
    }
}

impl<S: ByteSink + Send + 'static> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("rpc", &self.rpc)
            .field("frame_handlers", &self.frame_handlers)
            .field("running", &!self.is_finished())
            .finish()
    }
}

#[cfg(unix)]
impl Session<linkrpc_transport::IoSink<std::os::unix::net::UnixStream>> {
    /// Start a session over a connected Unix socket link.
    pub fn from_link(link: linkrpc_transport::Link, config: SessionConfig) -> Result<Self> {
        let (source, sink) = link.split();
        Self::with_config(source, sink, config)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use linkrpc_codec::{Value, Values};
    use linkrpc_frame::Frame;
    use linkrpc_transport::memory;

    use super::*;

    #[test]
    fn stop_ends_reader() {
        let (near, _far) = memory::pair();
        let (source, sink) = near.split();
        let session = Session::start(source, sink).unwrap();
        assert!(!session.is_finished());
        assert_eq!(session.stop(), Some(ReadLoopExit::Stopped));
    }

    #[test]
    fn reader_sees_calls_from_peer() {
        let (near, far) = memory::pair();
        let (source, sink) = near.split();
        let session = Session::start(source, sink).unwrap();

        let (tx, rx) = mpsc::channel();
        session
            .rpc()
            .add_handler(12, move |function_id: u16, args: &Values| {
                tx.send((function_id, args.clone())).is_ok()
            });

        let peer = Rpc::new(far.sink);
        peer.call(12, &[Value::from("hi")]).unwrap();

        let (function_id, args) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(function_id, 12);
        assert_eq!(args.str_at(0), Some("hi"));
    }

    #[test]
    fn other_frame_types_share_the_link() {
        let (near, far) = memory::pair();
        let (source, sink) = near.split();
        let session = Session::start(source, sink).unwrap();

        let (tx, rx) = mpsc::channel();
        session.frame_handlers().register(3, move |frame: &Frame| {
            let _ = tx.send(frame.payload.clone());
        });

        let mut writer = linkrpc_frame::FrameWriter::new(far.sink);
        writer.send(3, b"raw").unwrap();
        let payload = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(payload.as_ref(), b"raw");
    }

    #[test]
    fn peer_hangup_closes_reader() {
        let (near, far) = memory::pair();
        let (source, sink) = near.split();
        let session = Session::start(source, sink).unwrap();
        drop(far);
        assert_eq!(session.join(), Some(ReadLoopExit::Closed));
    }
}
