//! Host shell collaborator.
//!
//! The bridge talks to the shell only through [`ShellHost`]: variable lookup
//! and binding, variable enumeration, function binding and command
//! execution. Builtins the host can dispatch to implement [`Builtin`].
//!
//! Host methods take `&self`; implementations keep their tables behind
//! interior mutability and must not hold a borrow across a call back into
//! a builtin, since a builtin may re-enter the host.

pub mod command;
pub mod mini;
pub mod word;

use bitflags::bitflags;
use std::rc::Rc;

pub use command::{
    make_simple_command, Command, CommandFlags, HostFlavor, Redirect, SimpleComV2, SimpleComV3,
    SimpleCommand,
};
pub use mini::MiniShell;
pub use word::{Word, WordFlags, WordList};

use crate::core::ExitStatus;

bitflags! {
    /// Variable attributes as the host tracks them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VarAttributes: i32 {
        /// Passed to child processes through `exportstr`.
        const EXPORTED = 0x001;
    }
}

/// A snapshot of one shell variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellVariable {
    pub name: String,
    /// `None` for a declared but unset variable.
    pub value: Option<String>,
    /// `NAME=value` string handed to child processes, if exported.
    pub exportstr: Option<String>,
    pub attributes: VarAttributes,
}

impl ShellVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            exportstr: None,
            attributes: VarAttributes::empty(),
        }
    }

    pub fn is_exported(&self) -> bool {
        self.attributes.contains(VarAttributes::EXPORTED)
    }
}

/// A builtin command the host can dispatch to by name.
pub trait Builtin {
    /// Run with the words following the builtin's own name.
    fn run(&self, args: WordList) -> ExitStatus;
}

/// Operations the bridge needs from the host shell.
pub trait ShellHost {
    /// Look up a variable by name.
    fn find_variable(&self, name: &str) -> Option<ShellVariable>;

    /// Create or overwrite a variable.
    fn bind_variable(&self, name: &str, value: &str);

    /// Snapshot of every variable, in host order.
    fn all_shell_variables(&self) -> Vec<ShellVariable>;

    /// Install `body` as the shell function `name`, replacing any previous
    /// definition.
    fn bind_function(&self, name: &str, body: Command);

    /// Execute a command synchronously and return its exit status.
    fn execute_command(&self, command: Command) -> ExitStatus;

    /// Make `builtin` callable under `name`.
    fn enable_builtin(&self, name: &str, builtin: Rc<dyn Builtin>);
}
