//! Standard command handlers, mirroring `assuan-handler.c`'s `std_handler_*`
//! and `parse_cmd_input_output`.

use crate::{
    context::SessionContext,
    error::{ErrorCode, ProtocolError},
    registry::{HandlerResult, Outcome},
};

pub fn nop(_ctx: &mut SessionContext, _arg: &str) -> HandlerResult {
    Ok(Outcome::Success)
}

pub fn bye(_ctx: &mut SessionContext, _arg: &str) -> HandlerResult {
    Ok(Outcome::Terminate)
}

pub fn cancel(_ctx: &mut SessionContext, _arg: &str) -> HandlerResult {
    Err(ProtocolError::new(ErrorCode::NotImplemented))
}

pub fn auth(_ctx: &mut SessionContext, _arg: &str) -> HandlerResult {
    Err(ProtocolError::new(ErrorCode::NotImplemented))
}

pub fn reset(_ctx: &mut SessionContext, _arg: &str) -> HandlerResult {
    Err(ProtocolError::new(ErrorCode::NotImplemented))
}

pub fn end(_ctx: &mut SessionContext, _arg: &str) -> HandlerResult {
    Err(ProtocolError::new(ErrorCode::NotImplemented))
}

pub fn input(ctx: &mut SessionContext, arg: &str) -> HandlerResult {
    let fd = parse_fd(ctx, arg)?;
    ctx.input_fd = Some(fd);
    Ok(Outcome::Success)
}

pub fn output(ctx: &mut SessionContext, arg: &str) -> HandlerResult {
    let fd = parse_fd(ctx, arg)?;
    ctx.output_fd = Some(fd);
    Ok(Outcome::Success)
}

fn parse_fd(ctx: &SessionContext, arg: &str) -> Result<i32, ProtocolError> {
    let rest = arg
        .strip_prefix("FD=")
        .ok_or_else(|| ProtocolError::with_detail(ErrorCode::SyntaxError, "FD=<n> expected"))?;

    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if digits_end == 0 {
        return Err(ProtocolError::with_detail(ErrorCode::SyntaxError, "number required"));
    }
    let (digits, garbage) = rest.split_at(digits_end);
    if !garbage.is_empty() {
        return Err(ProtocolError::with_detail(ErrorCode::SyntaxError, "garbage found"));
    }

    let fd: i32 = digits
        .parse()
        .map_err(|_| ProtocolError::with_detail(ErrorCode::SyntaxError, "number required"))?;

    if fd == ctx.inbound_fd() {
        return Err(ProtocolError::with_detail(ErrorCode::ParameterConflict, "fd same as inbound fd"));
    }
    if fd == ctx.outbound_fd() {
        return Err(ProtocolError::with_detail(ErrorCode::ParameterConflict, "fd same as outbound fd"));
    }

    Ok(fd)
}

/// Substituted for a user command registered without an explicit handler.
pub fn dummy(_ctx: &mut SessionContext, _arg: &str) -> HandlerResult {
    Err(ProtocolError::with_detail(ErrorCode::ServerFault, "no handler registered"))
}

/// Default handler for `D `-prefixed data lines, until overridden.
pub fn default_data_line(_ctx: &mut SessionContext, _data: &[u8]) -> HandlerResult {
    Err(ProtocolError::new(ErrorCode::NotImplemented))
}

/// Transient filler used only while a registered handler is swapped out of
/// the registry for the duration of its own invocation; never actually
/// called.
pub fn placeholder(_ctx: &mut SessionContext, _arg: &str) -> HandlerResult {
    Ok(Outcome::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SessionContext;
    use crate::transport::{PipeTransport, TransportKind};

    fn test_ctx() -> SessionContext {
        SessionContext::for_test(TransportKind::Pipe(PipeTransport::new(10, 11)))
    }

    #[test]
    fn input_rejects_garbage() {
        let mut ctx = test_ctx();
        let err = input(&mut ctx, "FD=12x").unwrap_err();
        assert_eq!(err.code, ErrorCode::SyntaxError);
    }

    #[test]
    fn input_rejects_missing_digits() {
        let mut ctx = test_ctx();
        let err = input(&mut ctx, "FD=").unwrap_err();
        assert_eq!(err.code, ErrorCode::SyntaxError);
    }

    #[test]
    fn input_rejects_collision_with_inbound_fd() {
        let mut ctx = test_ctx();
        let err = input(&mut ctx, "FD=10").unwrap_err();
        assert_eq!(err.code, ErrorCode::ParameterConflict);
    }

    #[test]
    fn input_accepts_valid_fd() {
        let mut ctx = test_ctx();
        assert!(matches!(input(&mut ctx, "FD=99"), Ok(Outcome::Success)));
        assert_eq!(ctx.input_fd(), Some(99));
    }

    #[test]
    fn bye_terminates() {
        let mut ctx = test_ctx();
        assert!(matches!(bye(&mut ctx, ""), Ok(Outcome::Terminate)));
    }
}
