//! The protocol engine: command dispatch and the main read-dispatch-write
//! loop, mirroring `dispatch_command`/`assuan_process`.

use crate::{
    codec::write_line,
    context::SessionContext,
    error::{EngineError, ErrorCode, ProtocolError},
    handlers,
    registry::{HandlerResult, Outcome},
};

/// Codes below this are the reserved internal-fault band; only
/// [`ErrorCode::ServerFault`] itself carries one.
const SERVER_FAULT_BANNER_THRESHOLD: u32 = 100;
const MAX_DETAIL_LEN: usize = 100;

/// Reads requests and writes exactly one reply per request until a handler
/// asks to terminate (`BYE`) or the transport fails.
pub(crate) fn process(ctx: &mut SessionContext) -> Result<(), EngineError> {
    loop {
        let raw = ctx.codec.read_line(&mut ctx.transport)?;
        let line = raw.to_vec();

        tracing::debug!(line = %String::from_utf8_lossy(&line), "dispatching request");

        match dispatch(ctx, &line) {
            Ok(Outcome::Success) => write_line(&mut ctx.transport, b"OK")?,
            Ok(Outcome::Terminate) => {
                write_line(&mut ctx.transport, b"OK  Bye, bye - hope to meet you again")?;
                return Ok(());
            }
            Err(err) => {
                let reply = format_error(&err);
                write_line(&mut ctx.transport, reply.as_bytes())?;
            }
        }
    }
}

/// Splits one request line into a command name and argument, or treats it as
/// a `D `-prefixed data line, and invokes the matching handler.
pub(crate) fn dispatch(ctx: &mut SessionContext, line: &[u8]) -> HandlerResult {
    if let Some(rest) = line.strip_prefix(b"D ") {
        let mut handler = std::mem::replace(&mut ctx.data_handler, Box::new(handlers::default_data_line));
        let result = handler(ctx, rest);
        ctx.data_handler = handler;
        return result;
    }

    if matches!(line.first(), Some(b' ') | Some(b'\t')) {
        return Err(ProtocolError::with_detail(ErrorCode::InvalidCommand, "leading white-space"));
    }

    let split = line.iter().position(|&b| b == b' ' || b == b'\t').unwrap_or(line.len());
    let (name_bytes, rest) = line.split_at(split);
    let name = String::from_utf8_lossy(name_bytes);

    let arg_start = rest.iter().position(|&b| b != b' ' && b != b'\t').unwrap_or(rest.len());
    let arg = String::from_utf8_lossy(&rest[arg_start..]);

    let idx = ctx
        .commands
        .find(&name)
        .ok_or_else(|| ProtocolError::new(ErrorCode::UnknownCommand))?;

    let mut handler = ctx.commands.take_handler(idx);
    let result = handler(ctx, &arg);
    ctx.commands.restore_handler(idx, handler);
    result
}

pub(crate) fn format_error(err: &ProtocolError) -> String {
    format_reply_line(err.code.code(), &err.code.to_string(), err.detail.as_deref())
}

/// Codes below 100 are internal engine faults and get a fixed banner naming
/// `ServerFault`'s own code rather than the original numeric code; `>= 100`
/// is the normal `ERR <code> <message>[ - <detail>]` form.
pub(crate) fn format_reply_line(code: u32, message: &str, detail: Option<&str>) -> String {
    if code < SERVER_FAULT_BANNER_THRESHOLD {
        format!("ERR {} server fault ({message})", ErrorCode::ServerFault.code())
    } else {
        match detail {
            Some(d) => format!("ERR {code} {message} - {}", truncate_detail(d)),
            None => format!("ERR {code} {message}"),
        }
    }
}

fn truncate_detail(detail: &str) -> &str {
    if detail.len() <= MAX_DETAIL_LEN {
        return detail;
    }
    let mut end = MAX_DETAIL_LEN;
    while !detail.is_char_boundary(end) {
        end -= 1;
    }
    &detail[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_codes_get_server_fault_banner() {
        let line = format_reply_line(42, "some internal fault", None);
        assert_eq!(line, format!("ERR {} server fault (some internal fault)", ErrorCode::ServerFault.code()));
    }

    #[test]
    fn normal_codes_include_detail() {
        let line = format_reply_line(101, "syntax error", Some("number required"));
        assert_eq!(line, "ERR 101 syntax error - number required");
    }

    #[test]
    fn normal_codes_without_detail() {
        let line = format_reply_line(103, "unknown command", None);
        assert_eq!(line, "ERR 103 unknown command");
    }

    #[test]
    fn detail_is_truncated() {
        let long = "x".repeat(200);
        let line = format_reply_line(101, "syntax error", Some(&long));
        assert_eq!(line.len(), "ERR 101 syntax error - ".len() + MAX_DETAIL_LEN);
    }
}
