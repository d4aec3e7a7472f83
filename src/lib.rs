//! Server-side engine for a text-line, request/response IPC protocol: line
//! framing, command dispatch, and pipe and datagram-domain transports.
//!
//! See [`SessionContext`] for the session lifecycle, [`transport`] for the
//! two supported byte-level transports, and [`registry`] for the command
//! dispatch table.

pub mod config;

mod bootstrap;
mod codec;
mod context;
mod engine;
mod error;
mod handlers;
mod macros;
mod registry;
mod transport;

pub use context::SessionContext;
pub use error::{EngineError, ErrorCode, ProtocolError};
pub use registry::{BoxedHandler, DataHandler, HandlerResult, Outcome, StdCommand, USER_BASE};
pub use transport::{DomainTransport, PipeTransport, Transport, TransportKind};
