//! In-process loopback link.
//!
//! [`pair`] returns two connected ends. Bytes written to one end's sink are
//! read from the other end's source, in order. Used by tests and by code that
//! wants to run both sides of a conversation in one process.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, ByteSource, ReadOutcome};

/// Default time a [`MemorySource`] waits for data before reporting `NoData`.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Receiving half of a loopback link.
#[derive(Debug)]
pub struct MemorySource {
    rx: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    poll_timeout: Option<Duration>,
}

impl MemorySource {
    /// Set how long `read_byte` waits for data. `None` never waits.
    pub fn set_poll_timeout(&mut self, timeout: Option<Duration>) {
        self.poll_timeout = timeout;
    }

    fn pull(&mut self) -> Option<ReadOutcome> {
        let next = match self.poll_timeout {
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(chunk) => chunk,
                Err(RecvTimeoutError::Timeout) => return Some(ReadOutcome::NoData),
                Err(RecvTimeoutError::Disconnected) => return Some(ReadOutcome::Closed),
            },
            None => match self.rx.try_recv() {
                Ok(chunk) => chunk,
                Err(TryRecvError::Empty) => return Some(ReadOutcome::NoData),
                Err(TryRecvError::Disconnected) => return Some(ReadOutcome::Closed),
            },
        };
        self.pending.extend(next);
        None
    }
}

impl ByteSource for MemorySource {
    fn read_byte(&mut self) -> ReadOutcome {
        loop {
            if let Some(byte) = self.pending.pop_front() {
                return ReadOutcome::Byte(byte);
            }
            if let Some(outcome) = self.pull() {
                return outcome;
            }
        }
    }
}

/// Sending half of a loopback link.
#[derive(Debug, Clone)]
pub struct MemorySink {
    tx: Sender<Vec<u8>>,
}

impl ByteSink for MemorySink {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        self.tx
            .send(data.to_vec())
            .map_err(|_| TransportError::Closed)?;
        Ok(data.len())
    }
}

/// One end of a loopback link.
#[derive(Debug)]
pub struct MemoryEnd {
    pub source: MemorySource,
    pub sink: MemorySink,
}

impl MemoryEnd {
    /// Split into the source and sink halves.
    pub fn split(self) -> (MemorySource, MemorySink) {
        (self.source, self.sink)
    }
}

/// Create two connected loopback ends.
pub fn pair() -> (MemoryEnd, MemoryEnd) {
    let (a_tx, a_rx) = mpsc::channel();
    let (b_tx, b_rx) = mpsc::channel();

    let a = MemoryEnd {
        source: source(b_rx),
        sink: MemorySink { tx: a_tx },
    };
    let b = MemoryEnd {
        source: source(a_rx),
        sink: MemorySink { tx: b_tx },
    };
    (a, b)
}

/// A single one-way pipe: bytes written to the sink come out of the source.
pub fn pipe() -> (MemorySink, MemorySource) {
    let (tx, rx) = mpsc::channel();
    (MemorySink { tx }, source(rx))
}

fn source(rx: Receiver<Vec<u8>>) -> MemorySource {
    MemorySource {
        rx,
        pending: VecDeque::new(),
        poll_timeout: Some(DEFAULT_POLL_TIMEOUT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_crossed() {
        let (mut a, mut b) = pair();
        a.sink.write_bytes(b"hi").unwrap();
        b.sink.write_bytes(b"yo").unwrap();

        assert_eq!(b.source.read_byte(), ReadOutcome::Byte(b'h'));
        assert_eq!(b.source.read_byte(), ReadOutcome::Byte(b'i'));
        assert_eq!(a.source.read_byte(), ReadOutcome::Byte(b'y'));
        assert_eq!(a.source.read_byte(), ReadOutcome::Byte(b'o'));
    }

    #[test]
    fn empty_queue_is_no_data() {
        let (_sink, mut source) = pipe();
        source.set_poll_timeout(None);
        assert_eq!(source.read_byte(), ReadOutcome::NoData);
        source.set_poll_timeout(Some(Duration::from_millis(1)));
        assert_eq!(source.read_byte(), ReadOutcome::NoData);
    }

    #[test]
    fn dropped_sink_closes_after_drain() {
        let (mut sink, mut source) = pipe();
        sink.write_bytes(&[1, 2]).unwrap();
        drop(sink);

        assert_eq!(source.read_byte(), ReadOutcome::Byte(1));
        assert_eq!(source.read_byte(), ReadOutcome::Byte(2));
        assert_eq!(source.read_byte(), ReadOutcome::Closed);
    }

    #[test]
    fn dropped_source_rejects_writes() {
        let (mut sink, source) = pipe();
        drop(source);
        assert!(matches!(
            sink.write_bytes(b"x"),
            Err(TransportError::Closed)
        ));
    }

    #[test]
    fn cloned_sinks_share_the_pipe() {
        let (sink, mut source) = pipe();
        let mut first = sink.clone();
        let mut second = sink;
        first.write_bytes(&[1]).unwrap();
        second.write_bytes(&[2]).unwrap();
        assert_eq!(source.read_byte(), ReadOutcome::Byte(1));
        assert_eq!(source.read_byte(), ReadOutcome::Byte(2));
    }
}
