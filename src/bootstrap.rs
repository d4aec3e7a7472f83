//! Environment-variable bootstrap consulted by `SessionContext::init_pipe_server`,
//! mirroring `assuan_init_pipe_server`'s handling of `_assuan_connection_fd`
//! and `_assuan_pipe_connect_pid`.

use nix::sys::stat::{fstat, SFlag};
use std::env;
use std::os::unix::io::RawFd;

const ENV_CONNECTION_FD: &str = "_assuan_connection_fd";
const ENV_PEER_PID: &str = "_assuan_pipe_connect_pid";

/// If `_assuan_connection_fd` names a valid socket descriptor, the caller has
/// already set up a datagram-domain transport for us to adopt in place of
/// the pipe descriptors we were given.
pub(crate) fn connection_fd_from_env() -> Option<RawFd> {
    let raw = env::var(ENV_CONNECTION_FD).ok()?;
    let fd: RawFd = raw.trim().parse().ok()?;
    is_valid_socket(fd).then_some(fd)
}

fn is_valid_socket(fd: RawFd) -> bool {
    match fstat(fd) {
        Ok(st) => (SFlag::from_bits_truncate(st.st_mode) & SFlag::S_IFMT) == SFlag::S_IFSOCK,
        Err(_) => false,
    }
}

/// The peer pid recorded by whoever forked this process, if any.
pub(crate) fn peer_pid_from_env() -> Option<i32> {
    env::var(ENV_PEER_PID).ok()?.trim().parse().ok()
}
