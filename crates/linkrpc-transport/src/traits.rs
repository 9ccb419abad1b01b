use crate::error::Result;

/// Result of asking a [`ByteSource`] for its next byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// One byte of stream data.
    Byte(u8),
    /// Nothing available right now. Not an error; the caller should retry.
    NoData,
    /// The stream is closed or failed permanently.
    Closed,
}

impl ReadOutcome {
    /// The byte carried by this outcome, if any.
    pub fn byte(self) -> Option<u8> {
        match self {
            ReadOutcome::Byte(b) => Some(b),
            _ => None,
        }
    }

    /// Returns true for the terminal `Closed` outcome.
    pub fn is_closed(self) -> bool {
        matches!(self, ReadOutcome::Closed)
    }
}

/// Producer side of a link: yields the stream one byte at a time.
///
/// Implementations may block inside `read_byte` until a byte arrives or a
/// read timeout elapses; a timeout is reported as [`ReadOutcome::NoData`].
pub trait ByteSource {
    fn read_byte(&mut self) -> ReadOutcome;
}

/// Consumer side of a link: accepts outbound bytes.
pub trait ByteSink {
    /// Write some prefix of `data`, returning how many bytes were accepted.
    ///
    /// `Ok(0)` for a non-empty buffer means the link no longer accepts data.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize>;

    /// Push any buffered bytes to the link.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn read_byte(&mut self) -> ReadOutcome {
        (**self).read_byte()
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Box<T> {
    fn read_byte(&mut self) -> ReadOutcome {
        (**self).read_byte()
    }
}

impl<T: ByteSink + ?Sized> ByteSink for &mut T {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write_bytes(data)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<T: ByteSink + ?Sized> ByteSink for Box<T> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write_bytes(data)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl ByteSink for Vec<u8> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize> {
        self.extend_from_slice(data);
        Ok(data.len())
    }
}
