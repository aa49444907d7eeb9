//! Byte sources for the live scanner and the loop that drives it.

use std::{
    io::{self, BufReader, ErrorKind, Read},
    net::TcpStream,
    time::Duration,
};

use crate::{LiveScanner, PrinterHandler, ScanError};

/// Outcome of waiting for the next byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEvent {
    Byte(u8),
    /// The deadline passed without data
    Idle,
    /// The peer closed the connection or the capture ended
    Closed,
}

/// Where the live scanner gets its bytes from.
///
/// The deadline is how long to wait for the next byte; `None` waits forever.
/// Tests implement this to script idle timeouts without sleeping.
pub trait ByteSource {
    fn next_byte(&mut self, deadline: Option<Duration>) -> io::Result<ReadEvent>;
}

/// A reader whose blocking reads can be bounded by a timeout.
pub trait ReadTimeout {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
}

impl ReadTimeout for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }
}

/// Wraps a reader that never times out, e.g. a captured printer stream on disk.
#[derive(Debug)]
pub struct Untimed<R>(pub R);

impl<R: Read> Read for Untimed<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R> ReadTimeout for Untimed<R> {
    fn set_read_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }
}

/// Buffered [`ByteSource`] over a socket or any other [`ReadTimeout`] reader.
pub struct StreamSource<R: Read + ReadTimeout> {
    reader: BufReader<R>,
    deadline: Option<Duration>,
}

impl<R: Read + ReadTimeout> StreamSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            deadline: None,
        }
    }

    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }
}

impl<R: Read + ReadTimeout> ByteSource for StreamSource<R> {
    fn next_byte(&mut self, deadline: Option<Duration>) -> io::Result<ReadEvent> {
        if deadline != self.deadline {
            self.reader.get_ref().set_read_timeout(deadline)?;
            self.deadline = deadline;
        }
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(ReadEvent::Closed),
                Ok(_) => return Ok(ReadEvent::Byte(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => return Ok(ReadEvent::Idle),
                Err(e) => return Err(e),
            }
        }
    }
}

/// Feeds `source` into `scanner` until the source is closed.
///
/// While a job is in progress every read is bounded by the configured idle
/// timeout; its expiry ends the job. Between jobs reads wait indefinitely.
/// End of stream flushes a pending line and ends a job in progress before
/// returning `Ok`. Any other read error is returned as is, without flushing.
/// A zero idle timeout is rejected before the first read.
pub fn scan_live(source: &mut dyn ByteSource, scanner: &mut LiveScanner, sink: &mut dyn PrinterHandler) -> Result<(), ScanError> {
    if scanner.config().idle_timeout.is_zero() {
        return Err(ScanError::ZeroIdleTimeout);
    }
    loop {
        let deadline = scanner.job_in_progress().then_some(scanner.config().idle_timeout);
        match source.next_byte(deadline)? {
            ReadEvent::Byte(b) => scanner.feed_byte(b, sink),
            ReadEvent::Idle => scanner.idle_timeout(sink),
            ReadEvent::Closed => {
                log::info!("[{}] printer stream closed", scanner.config().name);
                scanner.finish(sink);
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untimed_reader_reports_bytes_then_closed() {
        let mut source = StreamSource::new(Untimed(&b"AB"[..]));
        assert_eq!(source.next_byte(None).unwrap(), ReadEvent::Byte(b'A'));
        assert_eq!(source.next_byte(Some(Duration::from_millis(500))).unwrap(), ReadEvent::Byte(b'B'));
        assert_eq!(source.next_byte(None).unwrap(), ReadEvent::Closed);
    }
}
