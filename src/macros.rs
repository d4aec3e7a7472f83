/// Declares the standard command table in one place: enum variants, numeric
/// ids, canonical names, whether the command is registered unconditionally
/// by `register_std_commands`, and which handler backs it by default.
#[macro_export]
macro_rules! std_commands {
    ($(($variant:ident, $id:expr, $name:expr, $always:expr, $handler:path)),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum StdCommand {
            $($variant),+
        }

        impl StdCommand {
            pub const ALL: &'static [StdCommand] = &[$(StdCommand::$variant),+];

            pub const fn id(self) -> u32 {
                match self {
                    $(StdCommand::$variant => $id,)+
                }
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $(StdCommand::$variant => $name,)+
                }
            }

            pub const fn always(self) -> bool {
                match self {
                    $(StdCommand::$variant => $always,)+
                }
            }

            pub fn from_id(id: u32) -> Option<Self> {
                match id {
                    $($id => Some(StdCommand::$variant),)+
                    _ => None,
                }
            }

            pub fn default_handler(self) -> $crate::registry::BoxedHandler {
                match self {
                    $(StdCommand::$variant => Box::new($handler),)+
                }
            }
        }
    };
}
