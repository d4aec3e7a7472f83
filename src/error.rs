//! Error taxonomy for the protocol engine.
//!
//! Two independent error types exist on purpose: [`ProtocolError`] is always
//! reported to the peer as an `ERR` line and never ends the session by
//! itself; [`EngineError`] comes only out of the transport/line codec and is
//! always fatal to the session (see `engine::process`).

use std::fmt;
use thiserror::Error;

/// Stable numeric identifiers and canonical "strerror" text for
/// protocol-level failures, mirroring the source's `assuan_strerror` table.
///
/// Every variant but [`ErrorCode::ServerFault`] carries a code `>= 100`.
/// `ServerFault` itself is `< 100`, the reserved band for internal
/// protocol-engine faults (see `engine::format_reply_line`'s banner guard,
/// which fires on any code `< 100` and always names `ServerFault` as the
/// printed code).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    #[error("invalid value")]
    InvalidValue,
    #[error("syntax error")]
    SyntaxError,
    #[error("invalid command")]
    InvalidCommand,
    #[error("unknown command")]
    UnknownCommand,
    #[error("parameter conflict")]
    ParameterConflict,
    #[error("not implemented")]
    NotImplemented,
    #[error("out of core")]
    OutOfCore,
    #[error("server fault")]
    ServerFault,
    #[error("connect failed")]
    ConnectFailed,
}

impl ErrorCode {
    /// The numeric code placed on the wire in an `ERR <code> ...` line.
    pub const fn code(self) -> u32 {
        match self {
            ErrorCode::ServerFault => 0,
            ErrorCode::InvalidValue => 100,
            ErrorCode::SyntaxError => 101,
            ErrorCode::InvalidCommand => 102,
            ErrorCode::UnknownCommand => 103,
            ErrorCode::ParameterConflict => 104,
            ErrorCode::NotImplemented => 105,
            ErrorCode::OutOfCore => 106,
            ErrorCode::ConnectFailed => 107,
        }
    }
}

/// The detail-bearing error a handler returns to report a failed command.
///
/// Folds the source's sticky `ctx->err_no`/`ctx->err_str` pair directly into
/// the dispatch result instead of carrying it as session state.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    pub code: ErrorCode,
    pub detail: Option<String>,
}

impl ProtocolError {
    pub fn new(code: ErrorCode) -> Self {
        Self { code, detail: None }
    }

    pub fn with_detail(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: Some(detail.into()),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} - {detail}", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<ErrorCode> for ProtocolError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

/// Fatal, session-ending failure out of the transport or line codec.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("line exceeds maximum length of {max} bytes")]
    LineTooLong { max: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
