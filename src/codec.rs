//! Line framing: turns a byte-level [`Transport`] into a stream of logical
//! request/reply lines, skipping comment and blank lines on read.

use crate::{error::EngineError, transport::Transport};
use std::io;

/// Maximum length of a single logical line, not counting the terminating
/// newline. One byte longer than this is a fatal [`EngineError::LineTooLong`].
pub const MAX_LINE_BYTES: usize = 1024;

const READ_CHUNK: usize = 512;

/// Buffers raw bytes off a transport and hands back one logical line at a
/// time. Owns a persistent read buffer so partial reads across calls are not
/// lost.
#[derive(Debug, Default)]
pub struct LineCodec {
    buf: Vec<u8>,
    start: usize,
    filled: usize,
    scratch: Vec<u8>,
}

impl LineCodec {
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; MAX_LINE_BYTES + READ_CHUNK],
            start: 0,
            filled: 0,
            scratch: Vec::new(),
        }
    }

    /// Reads the next non-comment, non-blank request line, with the
    /// terminating newline stripped.
    pub fn read_line<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<&[u8], EngineError> {
        loop {
            if let Some(nl_rel) = self.buf[self.start..self.filled].iter().position(|&b| b == b'\n') {
                let nl = self.start + nl_rel;
                self.scratch.clear();
                self.scratch.extend_from_slice(&self.buf[self.start..nl]);
                self.start = nl + 1;

                if self.scratch.is_empty() || self.scratch[0] == b'#' {
                    continue;
                }
                return Ok(&self.scratch[..]);
            }

            let pending = self.filled - self.start;
            if pending > MAX_LINE_BYTES - 1 {
                return Err(EngineError::LineTooLong { max: MAX_LINE_BYTES });
            }

            self.compact();
            let n = transport.read(&mut self.buf[self.filled..])?;
            if n == 0 {
                return Err(EngineError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed the connection",
                )));
            }
            self.filled += n;
        }
    }

    fn compact(&mut self) {
        if self.start == 0 {
            return;
        }
        self.buf.copy_within(self.start..self.filled, 0);
        self.filled -= self.start;
        self.start = 0;
    }
}

/// Writes one logical reply line, appending the terminating newline.
///
/// Builds the full line in one buffer and writes it with a single call: a
/// datagram transport turns each `Transport::write` call into one datagram,
/// so writing the body and the newline separately would split one reply
/// across two datagrams.
pub fn write_line<T: Transport + ?Sized>(transport: &mut T, bytes: &[u8]) -> Result<(), EngineError> {
    let mut line = Vec::with_capacity(bytes.len() + 1);
    line.extend_from_slice(bytes);
    line.push(b'\n');
    write_all(transport, &line)?;
    Ok(())
}

fn write_all<T: Transport + ?Sized>(transport: &mut T, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        let n = transport.write(buf)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "transport accepted zero bytes"));
        }
        buf = &buf[n..];
    }
    Ok(())
}
