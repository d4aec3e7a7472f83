//! Pipe transport: two caller-owned descriptors, one per direction.
//!
//! Adapted from the stream abstraction over a raw descriptor; unlike a
//! socket transport, teardown here is a no-op on the descriptors themselves
//! -- they are owned by whoever started the process, not by us.

use super::Transport;
use nix::unistd;
use std::io;
use std::os::unix::io::RawFd;

#[derive(Clone, Copy, Debug)]
struct Fd(RawFd);

impl Fd {
    fn read(self, buf: &mut [u8]) -> io::Result<usize> {
        unistd::read(self.0, buf).map_err(io::Error::from)
    }

    fn write(self, buf: &[u8]) -> io::Result<usize> {
        unistd::write(self.0, buf).map_err(io::Error::from)
    }
}

/// Two distinct descriptors, one for each direction, as handed to
/// `assuan_init_pipe_server`.
#[derive(Debug)]
pub struct PipeTransport {
    input: Fd,
    output: Fd,
}

impl PipeTransport {
    pub fn new(input_fd: RawFd, output_fd: RawFd) -> Self {
        Self {
            input: Fd(input_fd),
            output: Fd(output_fd),
        }
    }

    pub(crate) fn raw_descriptors(&self) -> (RawFd, RawFd) {
        (self.input.0, self.output.0)
    }
}

impl Transport for PipeTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf)
    }
}
