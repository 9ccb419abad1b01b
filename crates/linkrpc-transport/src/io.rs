use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, ByteSource, ReadOutcome};

const READ_CHUNK_SIZE: usize = 512;

/// Pause before retrying a write the stream could not take yet.
pub const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(1);

/// Byte source over any `Read` stream.
///
/// Reads are done in chunks and handed out one byte at a time, so a serial
/// port or socket is not hit with a syscall per byte.
pub struct IoSource<R> {
    inner: R,
    chunk: Box<[u8]>,
    pos: usize,
    len: usize,
    closed: bool,
}

impl<R: Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            chunk: vec![0u8; READ_CHUNK_SIZE].into_boxed_slice(),
            pos: 0,
            len: 0,
            closed: false,
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the source and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn refill(&mut self) -> ReadOutcome {
        loop {
            match self.inner.read(&mut self.chunk) {
                Ok(0) => {
                    debug!("byte source reached end of stream");
                    self.closed = true;
                    return ReadOutcome::Closed;
                }
                Ok(n) => {
                    self.pos = 0;
                    self.len = n;
                    return ReadOutcome::Byte(self.next_buffered());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return ReadOutcome::NoData;
                }
                Err(err) => {
                    warn!(error = %err, "byte source failed; treating link as closed");
                    self.closed = true;
                    return ReadOutcome::Closed;
                }
            }
        }
    }

    fn next_buffered(&mut self) -> u8 {
        let byte = self.chunk[self.pos];
        self.pos += 1;
        byte
    }
}

impl<R: Read> ByteSource for IoSource<R> {
    fn read_byte(&mut self) -> ReadOutcome {
        if self.pos < self.len {
            return ReadOutcome::Byte(self.next_buffered());
        }
        if self.closed {
            return ReadOutcome::Closed;
        }
        self.refill()
    }
}

impl<R> std::fmt::Debug for IoSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoSource")
            .field("buffered", &(self.len - self.pos))
            .field("closed", &self.closed)
            .finish()
    }
}

/// Byte sink over any `Write` stream.
pub struct IoSink<W> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the sink and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteSink for IoSink<W> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize> {
        loop {
            match self.inner.write(data) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(WOULD_BLOCK_BACKOFF);
                }
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    return Err(TransportError::Closed)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(WOULD_BLOCK_BACKOFF);
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<W> std::fmt::Debug for IoSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn drain<S: ByteSource>(source: &mut S) -> Vec<u8> {
        let mut out = Vec::new();
        while let ReadOutcome::Byte(b) = source.read_byte() {
            out.push(b);
        }
        out
    }

    #[test]
    fn yields_bytes_then_closed() {
        let mut source = IoSource::new(Cursor::new(vec![1u8, 2, 3]));
        assert_eq!(drain(&mut source), vec![1, 2, 3]);
        assert_eq!(source.read_byte(), ReadOutcome::Closed);
        assert_eq!(source.read_byte(), ReadOutcome::Closed);
    }

    #[test]
    fn spans_multiple_chunks() {
        let data: Vec<u8> = (0..READ_CHUNK_SIZE * 2 + 17).map(|i| i as u8).collect();
        let mut source = IoSource::new(Cursor::new(data.clone()));
        assert_eq!(drain(&mut source), data);
    }

    #[test]
    fn would_block_maps_to_no_data() {
        let mut source = IoSource::new(WouldBlockThenData {
            state: 0,
            bytes: vec![9],
            pos: 0,
        });
        assert_eq!(source.read_byte(), ReadOutcome::NoData);
        assert_eq!(source.read_byte(), ReadOutcome::Byte(9));
        assert_eq!(source.read_byte(), ReadOutcome::Closed);
    }

    #[test]
    fn interrupted_read_retries() {
        let mut source = IoSource::new(InterruptedThenData {
            state: 0,
            bytes: vec![4, 5],
        });
        assert_eq!(source.read_byte(), ReadOutcome::Byte(4));
        assert_eq!(source.read_byte(), ReadOutcome::Byte(5));
    }

    #[test]
    fn hard_error_closes() {
        let mut source = IoSource::new(FailingReader);
        assert_eq!(source.read_byte(), ReadOutcome::Closed);
    }

    #[test]
    fn sink_writes_and_flushes() {
        let mut sink = IoSink::new(Cursor::new(Vec::<u8>::new()));
        assert_eq!(sink.write_bytes(b"hello").unwrap(), 5);
        sink.flush().unwrap();
        assert_eq!(sink.into_inner().into_inner(), b"hello");
    }

    #[test]
    fn sink_broken_pipe_is_closed() {
        let mut sink = IoSink::new(BrokenPipeWriter);
        let err = sink.write_bytes(b"x").unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[test]
    fn sink_backs_off_while_stream_is_full() {
        let mut sink = IoSink::new(FullThenDrains {
            refusals: 3,
            attempts: 0,
            data: Vec::new(),
        });
        let started = std::time::Instant::now();
        assert_eq!(sink.write_bytes(b"late").unwrap(), 4);
        assert!(started.elapsed() >= WOULD_BLOCK_BACKOFF * 3);

        let inner = sink.into_inner();
        assert_eq!(inner.attempts, 4);
        assert_eq!(inner.data, b"late");
    }

    /// A non-blocking writer that refuses the first few writes.
    struct FullThenDrains {
        refusals: usize,
        attempts: usize,
        data: Vec<u8>,
    }

    impl Write for FullThenDrains {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.attempts += 1;
            if self.refusals > 0 {
                self.refusals -= 1;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct WouldBlockThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for WouldBlockThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let n = self.bytes.len().min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[..n]);
            self.bytes.drain(..n);
            Ok(n)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::ConnectionReset))
        }
    }

    struct BrokenPipeWriter;

    impl Write for BrokenPipeWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
