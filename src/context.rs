//! Per-session state and its two bootstrap paths, mirroring
//! `assuan_init_pipe_server` / `_assuan_domain_init`.

use crate::{
    bootstrap,
    codec::LineCodec,
    engine,
    error::{EngineError, ProtocolError},
    handlers,
    registry::{BoxedHandler, CommandRegistry, DataHandler},
    transport::{DomainTransport, PipeTransport, TransportKind},
};
use getset::CopyGetters;
use std::os::unix::io::RawFd;
use tracing::debug;

/// Session state: transport, line codec, command registry, and the
/// descriptors negotiated over the wire via `INPUT`/`OUTPUT`.
#[derive(CopyGetters)]
pub struct SessionContext {
    pub(crate) transport: TransportKind,
    pub(crate) codec: LineCodec,
    pub(crate) commands: CommandRegistry,
    pub(crate) data_handler: DataHandler,

    #[get_copy = "pub"]
    pub(crate) input_fd: Option<RawFd>,
    #[get_copy = "pub"]
    pub(crate) output_fd: Option<RawFd>,
    #[get_copy = "pub"]
    is_server: bool,
    #[get_copy = "pub"]
    pipe_mode: bool,
    #[get_copy = "pub"]
    pid: Option<i32>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("transport", &self.transport)
            .field("commands", &self.commands)
            .field("input_fd", &self.input_fd)
            .field("output_fd", &self.output_fd)
            .field("is_server", &self.is_server)
            .field("pipe_mode", &self.pipe_mode)
            .field("pid", &self.pid)
            .finish()
    }
}

impl SessionContext {
    fn assemble(transport: TransportKind, pipe_mode: bool, pid: Option<i32>) -> Self {
        Self {
            transport,
            codec: LineCodec::new(),
            commands: CommandRegistry::new(),
            data_handler: Box::new(handlers::default_data_line),
            input_fd: None,
            output_fd: None,
            is_server: true,
            pipe_mode,
            pid,
        }
    }

    /// Starts a session over two caller-owned descriptors, one per
    /// direction, unless `_assuan_connection_fd` names a pre-connected
    /// datagram socket to adopt instead.
    pub fn init_pipe_server(input_fd: RawFd, output_fd: RawFd) -> Result<Self, EngineError> {
        let pid = bootstrap::peer_pid_from_env();

        let transport = match bootstrap::connection_fd_from_env() {
            Some(fd) => {
                debug!(fd, "adopting pre-connected datagram transport from the environment");
                TransportKind::Domain(DomainTransport::adopt_connected(fd)?)
            }
            None => {
                debug!(input_fd, output_fd, "starting pipe transport");
                TransportKind::Pipe(PipeTransport::new(input_fd, output_fd))
            }
        };

        let mut ctx = Self::assemble(transport, true, pid);
        ctx.register_std_commands()
            .map_err(|e| EngineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
        Ok(ctx)
    }

    /// Starts a session by binding a fresh datagram socket and rendezvousing
    /// with the peer over `rendezvous_fd`.
    pub fn init_domain_server(rendezvous_fd: RawFd, peer_pid: Option<i32>) -> Result<Self, EngineError> {
        debug!(rendezvous_fd, ?peer_pid, "starting datagram-domain transport via rendezvous");
        let transport = TransportKind::Domain(DomainTransport::connect_server(rendezvous_fd)?);
        let mut ctx = Self::assemble(transport, false, peer_pid);
        ctx.register_std_commands()
            .map_err(|e| EngineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
        Ok(ctx)
    }

    /// Registers every standard command that is always present (see
    /// `CommandRegistry::register_std_commands`). Called automatically by
    /// both `init_*` constructors; exposed separately for a context built by
    /// hand in tests.
    pub fn register_std_commands(&mut self) -> Result<(), ProtocolError> {
        self.commands.register_std_commands()
    }

    /// Registers a command; see `CommandRegistry::register` for the
    /// standard-vs-user id rules.
    pub fn register(&mut self, id: u32, name: Option<&str>, handler: Option<BoxedHandler>) -> Result<(), ProtocolError> {
        self.commands.register(id, name, handler)
    }

    /// Overrides the handler invoked for `D `-prefixed data lines.
    pub fn set_data_handler(&mut self, handler: DataHandler) {
        self.data_handler = handler;
    }

    /// The session's own inbound descriptor, used to reject `INPUT`/`OUTPUT`
    /// negotiating a descriptor the transport already owns.
    pub fn inbound_fd(&self) -> RawFd {
        self.transport.raw_descriptors().0
    }

    /// The session's own outbound descriptor; see [`Self::inbound_fd`].
    pub fn outbound_fd(&self) -> RawFd {
        self.transport.raw_descriptors().1
    }

    /// Drives the session to completion: reads requests, dispatches them,
    /// and writes replies until `BYE` or a fatal transport error.
    pub fn process(&mut self) -> Result<(), EngineError> {
        engine::process(self)
    }
}

#[cfg(test)]
impl SessionContext {
    pub(crate) fn for_test(transport: TransportKind) -> Self {
        let mut ctx = Self::assemble(transport, true, None);
        ctx.register_std_commands().unwrap();
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::PipeTransport;

    #[test]
    fn std_commands_are_registered_on_construction() {
        let ctx = SessionContext::for_test(TransportKind::Pipe(PipeTransport::new(0, 1)));
        assert!(ctx.commands.find("NOP").is_some());
        assert!(ctx.commands.find("BYE").is_some());
        assert!(ctx.commands.find("INPUT").is_none());
    }
}
