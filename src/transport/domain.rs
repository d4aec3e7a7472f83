//! Datagram-domain transport: a single connectionless Unix domain socket
//! re-framed into a byte stream for the line codec.
//!
//! Grounded in the source's `domain_reader`/`domain_writer`/`_assuan_domain_init`:
//! peek with `MSG_PEEK | MSG_TRUNC` to discover the real datagram size before
//! committing a buffer, doubling from 4 KiB; reject datagrams whose sender
//! does not match the rendezvous-negotiated peer path.

use super::Transport;
use crate::error::EngineError;
use nix::sys::socket::{
    bind, getpeername, recvmsg, sendto, socket, AddressFamily, MsgFlags, SockFlag, SockType, UnixAddr,
};
use std::{
    fs, io,
    io::{BufRead, BufReader, IoSliceMut, Write},
    os::{
        fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd},
        unix::ffi::OsStrExt,
    },
    path::{Path, PathBuf},
    process,
};
use tempfile::Builder;
use tracing::{debug, warn};

const INITIAL_BUFFER: usize = 4 * 1024;
const BIND_ATTEMPTS: u32 = 16;

#[derive(Debug, Default)]
struct DatagramBuffer {
    data: Vec<u8>,
    size: usize,
    offset: usize,
}

impl DatagramBuffer {
    fn take(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.size);
        out[..n].copy_from_slice(&self.data[self.offset..self.offset + n]);
        self.offset += n;
        self.size -= n;
        n
    }

    fn grow(&mut self) {
        let new_len = if self.data.is_empty() { INITIAL_BUFFER } else { self.data.len() * 2 };
        self.data = vec![0u8; new_len];
        self.size = 0;
        self.offset = 0;
    }
}

/// A connectionless Unix domain socket, paired with a specific peer address
/// learned via the rendezvous protocol.
#[derive(Debug)]
pub struct DomainTransport {
    socket: OwnedFd,
    peer_addr: UnixAddr,
    local_path: Option<PathBuf>,
    buffer: DatagramBuffer,
}

impl DomainTransport {
    /// Binds a fresh local socket and performs the rendezvous handshake over
    /// `rendezvous_fd`: write our own bound path, then read the peer's back.
    pub fn connect_server(rendezvous_fd: RawFd) -> Result<Self, EngineError> {
        let (socket, local_path) = bind_fresh_socket()?;
        let peer_path = rendezvous(rendezvous_fd, &local_path)?;
        let peer_addr = UnixAddr::new(&peer_path).map_err(io::Error::from)?;

        debug!(local = %local_path.display(), peer = %peer_path.display(), "domain transport rendezvous complete");

        Ok(Self {
            socket,
            peer_addr,
            local_path: Some(local_path),
            buffer: DatagramBuffer::default(),
        })
    }

    /// Adopts an already-connected datagram socket (the `_assuan_connection_fd`
    /// bootstrap path). The peer rendezvous is assumed to have already
    /// concluded externally; the peer address is recovered via `getpeername`.
    pub fn adopt_connected(fd: RawFd) -> Result<Self, EngineError> {
        // SAFETY: the caller (bootstrap) has validated this is a live socket
        // descriptor handed to us for the lifetime of the process.
        let socket = unsafe { OwnedFd::from_raw_fd(fd) };
        let peer_addr: UnixAddr = getpeername(socket.as_raw_fd()).map_err(io::Error::from)?;

        Ok(Self {
            socket,
            peer_addr,
            local_path: None,
            buffer: DatagramBuffer::default(),
        })
    }

    pub(crate) fn raw_descriptors(&self) -> (RawFd, RawFd) {
        let fd = self.socket.as_raw_fd();
        (fd, fd)
    }

    fn same_peer(&self, addr: Option<&UnixAddr>) -> bool {
        addr.and_then(UnixAddr::path) == self.peer_addr.path()
    }

    fn fill(&mut self) -> io::Result<()> {
        loop {
            if self.buffer.data.is_empty() {
                self.buffer.grow();
            }

            let mut iov = [IoSliceMut::new(&mut self.buffer.data)];
            let peek = recvmsg::<UnixAddr>(
                self.socket.as_raw_fd(),
                &mut iov,
                None,
                MsgFlags::MSG_PEEK | MsgFlags::MSG_TRUNC,
            )
            .map_err(io::Error::from)?;

            if !self.same_peer(peek.address.as_ref()) {
                warn!("discarding datagram from unexpected sender");
                let mut discard = [IoSliceMut::new(&mut self.buffer.data)];
                recvmsg::<UnixAddr>(self.socket.as_raw_fd(), &mut discard, None, MsgFlags::empty())
                    .map_err(io::Error::from)?;
                continue;
            }

            if peek.bytes > self.buffer.data.len() {
                self.buffer.grow();
                continue;
            }

            let mut iov = [IoSliceMut::new(&mut self.buffer.data)];
            let real = recvmsg::<UnixAddr>(self.socket.as_raw_fd(), &mut iov, None, MsgFlags::empty())
                .map_err(io::Error::from)?;
            self.buffer.size = real.bytes;
            self.buffer.offset = 0;
            return Ok(());
        }
    }
}

impl Transport for DomainTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.buffer.size > 0 {
                return Ok(self.buffer.take(buf));
            }
            self.fill()?;
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        sendto(self.socket.as_raw_fd(), buf, &self.peer_addr, MsgFlags::empty()).map_err(io::Error::from)
    }
}

impl Drop for DomainTransport {
    fn drop(&mut self) {
        if let Some(path) = self.local_path.take() {
            if let Err(err) = fs::remove_file(&path) {
                warn!(?path, %err, "failed to unlink domain transport socket path");
            }
            if let Some(parent) = path.parent() {
                let _ = fs::remove_dir(parent);
            }
        }
    }
}

fn bind_fresh_socket() -> Result<(OwnedFd, PathBuf), EngineError> {
    let fd = socket(
        AddressFamily::Unix,
        SockType::Datagram,
        SockFlag::SOCK_CLOEXEC,
        None,
    )
    .map_err(io::Error::from)?;

    let dir = Builder::new()
        .prefix(&format!("assuan-{}-", process::id()))
        .tempdir()
        .map_err(EngineError::Io)?;
    let dir_path = dir.into_path();

    let mut last_err = None;
    for attempt in 0..BIND_ATTEMPTS {
        let candidate = dir_path.join(format!("S.{attempt}"));
        let addr = match UnixAddr::new(&candidate) {
            Ok(addr) => addr,
            Err(err) => {
                last_err = Some(err);
                continue;
            }
        };
        match bind(fd.as_raw_fd(), &addr) {
            Ok(()) => return Ok((fd, candidate)),
            Err(err) => last_err = Some(err),
        }
    }

    Err(EngineError::Io(io::Error::new(
        io::ErrorKind::AddrInUse,
        format!("failed to bind a rendezvous socket after {BIND_ATTEMPTS} attempts: {last_err:?}"),
    )))
}

fn rendezvous(rendezvous_fd: RawFd, own_path: &Path) -> Result<PathBuf, EngineError> {
    // SAFETY: the caller guarantees `rendezvous_fd` is a valid, open
    // descriptor dedicated to this handshake; ownership is handed back via
    // `into_raw_fd` below so it is never closed here.
    let file = unsafe { fs::File::from_raw_fd(rendezvous_fd) };

    {
        let mut writer = &file;
        writer
            .write_all(own_path.as_os_str().as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(EngineError::Io)?;
    }

    let mut line = Vec::new();
    {
        let mut reader = BufReader::new(&file);
        reader.read_until(b'\n', &mut line).map_err(EngineError::Io)?;
    }
    let _ = file.into_raw_fd();

    if line.last() == Some(&b'\n') {
        line.pop();
    }
    Ok(PathBuf::from(std::ffi::OsStr::from_bytes(&line)))
}
