//! Byte-level transports underneath the line codec.

use std::io;
use std::os::unix::io::RawFd;

pub mod domain;
pub mod pipe;

pub use domain::DomainTransport;
pub use pipe::PipeTransport;

/// POSIX file-descriptor read/write semantics: non-negative return, short
/// reads/writes permitted, `0` from `read` means the peer closed a
/// streaming transport.
pub trait Transport: std::fmt::Debug {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

/// The two transport strategies a session can be wired up with.
#[derive(Debug)]
pub enum TransportKind {
    Pipe(PipeTransport),
    Domain(DomainTransport),
}

impl TransportKind {
    /// The session's own inbound/outbound descriptor numbers, used only to
    /// detect `INPUT`/`OUTPUT` negotiating a descriptor the transport itself
    /// already owns.
    pub(crate) fn raw_descriptors(&self) -> (RawFd, RawFd) {
        match self {
            TransportKind::Pipe(t) => t.raw_descriptors(),
            TransportKind::Domain(t) => t.raw_descriptors(),
        }
    }
}

impl Transport for TransportKind {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            TransportKind::Pipe(t) => t.read(buf),
            TransportKind::Domain(t) => t.read(buf),
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            TransportKind::Pipe(t) => t.write(buf),
            TransportKind::Domain(t) => t.write(buf),
        }
    }
}
