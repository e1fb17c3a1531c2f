//! Version-adapted command records.
//!
//! The host's "simple command" record changed field order between major
//! versions 2 and 3. Each shape is its own struct, wrapped in a tagged enum;
//! the tag is chosen once from the detected [`HostFlavor`] and every read
//! goes through a match on it. A host only accepts records of its own shape.

use bitflags::bitflags;
use std::fmt;

use super::word::WordList;
use crate::core::{BridgeError, BridgeResult};

/// Binary shape of the host's command records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostFlavor {
    /// `flags, words, redirects, line`
    V2,
    /// `flags, line, words, redirects`
    V3,
}

impl HostFlavor {
    /// Detect the flavor from a host-reported version string.
    ///
    /// Only the leading character matters: `2` selects the version-2 shape,
    /// a digit from `3` to `9` the version-3 shape. Anything else is
    /// unrecognized.
    pub fn detect(version: &str) -> Option<HostFlavor> {
        match version.chars().next()? {
            '2' => Some(HostFlavor::V2),
            '3'..='9' => Some(HostFlavor::V3),
            _ => None,
        }
    }
}

impl fmt::Display for HostFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostFlavor::V2 => f.write_str("version-2-shape"),
            HostFlavor::V3 => f.write_str("version-3-shape"),
        }
    }
}

bitflags! {
    /// Flags controlling how a command's status is reported.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CommandFlags: i32 {
        /// `! command`: report failure as success and vice versa.
        const INVERT_RETURN = 0x04;
    }
}

/// A redirection attached to a command. The bridge never builds any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub fd: i32,
    pub target: String,
}

/// Version-2 simple command shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleComV2 {
    pub flags: CommandFlags,
    pub words: WordList,
    pub redirects: Vec<Redirect>,
    pub line: i32,
}

/// Version-3 simple command shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleComV3 {
    pub flags: CommandFlags,
    pub line: i32,
    pub words: WordList,
    pub redirects: Vec<Redirect>,
}

/// A simple command in whichever shape the host expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleCommand {
    V2(SimpleComV2),
    V3(SimpleComV3),
}

impl SimpleCommand {
    /// Build a plain invocation in the shape matching `flavor`.
    pub fn new(flavor: HostFlavor, words: WordList) -> Self {
        match flavor {
            HostFlavor::V2 => SimpleCommand::V2(SimpleComV2 {
                flags: CommandFlags::empty(),
                words,
                redirects: Vec::new(),
                line: 0,
            }),
            HostFlavor::V3 => SimpleCommand::V3(SimpleComV3 {
                flags: CommandFlags::empty(),
                line: 0,
                words,
                redirects: Vec::new(),
            }),
        }
    }

    pub fn flavor(&self) -> HostFlavor {
        match self {
            SimpleCommand::V2(_) => HostFlavor::V2,
            SimpleCommand::V3(_) => HostFlavor::V3,
        }
    }

    pub fn words(&self) -> &WordList {
        match self {
            SimpleCommand::V2(c) => &c.words,
            SimpleCommand::V3(c) => &c.words,
        }
    }

    pub fn flags(&self) -> CommandFlags {
        match self {
            SimpleCommand::V2(c) => c.flags,
            SimpleCommand::V3(c) => c.flags,
        }
    }

    pub fn line(&self) -> i32 {
        match self {
            SimpleCommand::V2(c) => c.line,
            SimpleCommand::V3(c) => c.line,
        }
    }

    pub fn redirects(&self) -> &[Redirect] {
        match self {
            SimpleCommand::V2(c) => &c.redirects,
            SimpleCommand::V3(c) => &c.redirects,
        }
    }

    pub fn insert_flags(&mut self, flags: CommandFlags) {
        match self {
            SimpleCommand::V2(c) => c.flags |= flags,
            SimpleCommand::V3(c) => c.flags |= flags,
        }
    }

    pub fn set_line(&mut self, line: i32) {
        match self {
            SimpleCommand::V2(c) => c.line = line,
            SimpleCommand::V3(c) => c.line = line,
        }
    }

    pub fn into_words(self) -> WordList {
        match self {
            SimpleCommand::V2(c) => c.words,
            SimpleCommand::V3(c) => c.words,
        }
    }
}

/// The host's generic command wrapper around a simple command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub simple: SimpleCommand,
}

impl Command {
    pub fn simple(simple: SimpleCommand) -> Self {
        Self { simple }
    }

    pub fn flavor(&self) -> HostFlavor {
        self.simple.flavor()
    }

    pub fn words(&self) -> &WordList {
        self.simple.words()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.words(), f)
    }
}

/// Build a plain simple command for execution.
///
/// Fails without building anything when no flavor has been detected.
pub fn make_simple_command(flavor: Option<HostFlavor>, words: WordList) -> BridgeResult<Command> {
    let flavor = flavor.ok_or_else(|| {
        BridgeError::UnsupportedHostVersion("host flavor not detected".to_string())
    })?;
    Ok(Command::simple(SimpleCommand::new(flavor, words)))
}

impl WordList {
    /// Hand the list off to the command builder.
    pub fn into_simple_command(self, flavor: Option<HostFlavor>) -> BridgeResult<Command> {
        make_simple_command(flavor, self)
    }
}
