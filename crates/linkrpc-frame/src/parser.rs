use std::sync::atomic::{AtomicBool, Ordering};

use linkrpc_transport::{ByteSource, ReadOutcome};
use tracing::debug;

use crate::assembler::{AssemblerState, FrameAssembler};
use crate::codec::FrameConfig;
use crate::frame_types::type_name;
use crate::handler::HandlerRegistry;

/// Why a read loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadLoopExit {
    /// The byte source reported end of stream or a permanent failure.
    Closed,
    /// The stop flag was observed between bytes.
    Stopped,
}

/// Drives a [`FrameAssembler`] from a byte source and hands every complete
/// frame to the handler registered for its type.
///
/// The parser never polls on its own: each [`parse`](Self::parse) call reads
/// at most one byte. [`run`](Self::run) is the blocking loop meant for a
/// dedicated reader thread.
#[derive(Debug)]
pub struct StreamParser<S> {
    source: S,
    assembler: FrameAssembler,
    handlers: HandlerRegistry,
    config: FrameConfig,
}

impl<S: ByteSource> StreamParser<S> {
    /// Create a parser with default configuration.
    pub fn new(source: S, handlers: HandlerRegistry) -> Self {
        Self::with_config(source, handlers, FrameConfig::default())
    }

    /// Create a parser with explicit configuration.
    pub fn with_config(source: S, handlers: HandlerRegistry, config: FrameConfig) -> Self {
        Self {
            source,
            assembler: FrameAssembler::with_max_frame_size(config.max_frame_size),
            handlers,
            config,
        }
    }

    /// Read one byte from the source and advance the state machine with it.
    ///
    /// Returns what the source produced.
    pub fn parse(&mut self) -> ReadOutcome {
        let outcome = self.source.read_byte();
        if let ReadOutcome::Byte(byte) = outcome {
            self.feed(byte);
        }
        outcome
    }

    /// Advance the state machine with a byte obtained elsewhere.
    ///
    /// Returns true if the byte completed a frame and a handler received it.
    pub fn feed(&mut self, byte: u8) -> bool {
        let Some(frame) = self.assembler.push(byte) else {
            return false;
        };

        debug!(
            frame_type = frame.frame_type,
            kind = type_name(frame.frame_type),
            size = frame.size(),
            "frame received"
        );
        let handled = self.handlers.dispatch(&frame);
        if !handled {
            debug!(frame_type = frame.frame_type, "no handler for frame type");
        }
        handled
    }

    /// Loop until the source closes or `stop` is set.
    ///
    /// A frame in progress when stopping is abandoned.
    pub fn run(&mut self, stop: &AtomicBool) -> ReadLoopExit {
        loop {
            if stop.load(Ordering::SeqCst) {
                self.assembler.reset();
                debug!("read loop stopped");
                return ReadLoopExit::Stopped;
            }
            match self.parse() {
                ReadOutcome::Byte(_) => {}
                ReadOutcome::NoData => {
                    if let Some(backoff) = self.config.idle_backoff {
                        std::thread::sleep(backoff);
                    }
                }
                ReadOutcome::Closed => {
                    debug!("byte source closed");
                    return ReadLoopExit::Closed;
                }
            }
        }
    }

    /// Current state of the frame state machine.
    pub fn state(&self) -> AssemblerState {
        self.assembler.state()
    }

    /// The handler table consulted for every complete frame.
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Borrow the byte source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the byte source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the parser and return the byte source.
    pub fn into_inner(self) -> S {
        self.source
    }
}
