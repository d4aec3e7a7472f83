//! Command registry: `(name, id, handler)` triples, with the `USER_BASE`
//! split between standard pre-named ids and free-form user ids.

use crate::{
    context::SessionContext,
    error::{ErrorCode, ProtocolError},
    handlers,
};

pub type HandlerResult = Result<Outcome, ProtocolError>;

/// What a successful handler invocation does to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Terminate,
}

pub trait Handler: FnMut(&mut SessionContext, &str) -> HandlerResult + Send {}
impl<F> Handler for F where F: FnMut(&mut SessionContext, &str) -> HandlerResult + Send {}

pub type BoxedHandler = Box<dyn Handler>;
pub type DataHandler = Box<dyn FnMut(&mut SessionContext, &[u8]) -> HandlerResult + Send>;

/// Ids below this value are the fixed standard commands; at or above it,
/// callers register their own free-form command names.
pub const USER_BASE: u32 = 256;

crate::std_commands! {
    (Nop, 1, "NOP", true, handlers::nop),
    (Cancel, 2, "CANCEL", true, handlers::cancel),
    (Bye, 3, "BYE", true, handlers::bye),
    (Auth, 4, "AUTH", true, handlers::auth),
    (Reset, 5, "RESET", true, handlers::reset),
    (End, 6, "END", true, handlers::end),
    (Input, 7, "INPUT", false, handlers::input),
    (Output, 8, "OUTPUT", false, handlers::output),
}

struct Entry {
    name: String,
    #[allow(dead_code)]
    id: u32,
    handler: BoxedHandler,
}

/// First-match-wins linear lookup over registered commands. Deliberately not
/// a map: duplicate names are permitted and registration order is an
/// observable part of the contract.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<Entry>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("names", &self.entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>())
            .finish()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self { entries: Vec::with_capacity(10) }
    }

    /// Registers every standard command flagged `always` (the source's
    /// `_assuan_register_std_commands`).
    pub fn register_std_commands(&mut self) -> Result<(), ProtocolError> {
        for cmd in StdCommand::ALL.iter().copied().filter(|c| c.always()) {
            self.register(cmd.id(), None, None)?;
        }
        Ok(())
    }

    /// Registers a command. `id < USER_BASE` selects a standard command and
    /// requires an empty `name` (the canonical name is filled in
    /// automatically); `id >= USER_BASE` requires an explicit non-empty
    /// name. A missing handler falls back to the standard command's own
    /// default, or to [`handlers::dummy`] for user commands.
    pub fn register(
        &mut self,
        id: u32,
        name: Option<&str>,
        handler: Option<BoxedHandler>,
    ) -> Result<(), ProtocolError> {
        let name = name.filter(|n| !n.is_empty());

        if id < USER_BASE {
            if name.is_some() {
                return Err(ProtocolError::new(ErrorCode::InvalidValue));
            }
            let std_cmd = StdCommand::from_id(id).ok_or_else(|| ProtocolError::new(ErrorCode::InvalidValue))?;
            let handler = handler.unwrap_or_else(|| std_cmd.default_handler());
            self.push(std_cmd.name().to_string(), id, handler);
        } else {
            let name = name.ok_or_else(|| ProtocolError::new(ErrorCode::InvalidValue))?;
            let handler = handler.unwrap_or_else(|| Box::new(handlers::dummy));
            self.push(name.to_string(), id, handler);
        }
        Ok(())
    }

    fn push(&mut self, name: String, id: u32, handler: BoxedHandler) {
        if self.entries.len() == self.entries.capacity() {
            self.entries.reserve(10);
        }
        self.entries.push(Entry { name, id, handler });
    }

    pub(crate) fn find(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    pub(crate) fn take_handler(&mut self, idx: usize) -> BoxedHandler {
        std::mem::replace(&mut self.entries[idx].handler, Box::new(handlers::placeholder))
    }

    pub(crate) fn restore_handler(&mut self, idx: usize, handler: BoxedHandler) {
        self.entries[idx].handler = handler;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_command_requires_empty_name() {
        let mut reg = CommandRegistry::new();
        let err = reg.register(StdCommand::Nop.id(), Some("NOP"), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidValue);
    }

    #[test]
    fn user_command_requires_a_name() {
        let mut reg = CommandRegistry::new();
        let err = reg.register(USER_BASE, None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidValue);
    }

    #[test]
    fn duplicate_names_keep_first_match() {
        let mut reg = CommandRegistry::new();
        reg.register(USER_BASE, Some("FOO"), None).unwrap();
        reg.register(USER_BASE + 1, Some("FOO"), None).unwrap();
        let idx = reg.find("FOO").unwrap();
        assert_eq!(reg.entries[idx].id, USER_BASE);
    }

    #[test]
    fn unregistered_user_command_gets_dummy_handler() {
        let mut reg = CommandRegistry::new();
        reg.register(USER_BASE, Some("FOO"), None).unwrap();
        let idx = reg.find("FOO").unwrap();
        assert!(reg.find("FOO").is_some());
        let _ = idx;
    }
}
