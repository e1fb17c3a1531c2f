//! Shell-visible entry point: `init`, `load <path>`, `call <fn> [args...]`.

use std::path::PathBuf;

use super::Bridge;
use crate::core::{BridgeError, BridgeResult, ExitStatus, EXECUTION_SUCCESS};
use crate::host::{Builtin, WordList};

pub const BRIDGE_VERSION: &str = concat!("shell bridge ", env!("CARGO_PKG_VERSION"));

/// A parsed builtin invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    Init,
    Load(PathBuf),
    Call { function: String, args: WordList },
}

impl BridgeCommand {
    /// Parse the words following the builtin name.
    pub fn parse(words: WordList) -> BridgeResult<Self> {
        let (command, rest) = words
            .split_first()
            .ok_or_else(|| BridgeError::MalformedInvocation("missing sub-command".to_string()))?;

        match command.as_str() {
            "init" => Ok(BridgeCommand::Init),
            "load" => match rest.first() {
                Some(path) if !path.is_empty() => Ok(BridgeCommand::Load(PathBuf::from(&path.text))),
                _ => Err(BridgeError::MalformedInvocation(
                    "load: missing chunk path".to_string(),
                )),
            },
            "call" => match rest.split_first() {
                Some((function, args)) if !function.is_empty() => Ok(BridgeCommand::Call {
                    function: function.text,
                    args,
                }),
                _ => Err(BridgeError::MalformedInvocation(
                    "call: missing function name".to_string(),
                )),
            },
            other => Err(BridgeError::MalformedInvocation(format!(
                "unknown sub-command '{}'",
                other
            ))),
        }
    }
}

/// Usage text for the builtin.
pub fn usage(builtin_name: &str) -> String {
    format!(
        "{}\nusage:\n\t{name} init\n\t{name} load <script chunk>\n\t{name} call <script function> [arguments]\n\
         note: while a script function runs, `{name} call` (and registered functions)\n\
         cannot be used from commands it starts; such calls fail with status 1",
        BRIDGE_VERSION,
        name = builtin_name
    )
}

impl Bridge {
    /// Execute a parsed invocation.
    pub fn execute(&self, command: BridgeCommand) -> BridgeResult<ExitStatus> {
        match command {
            BridgeCommand::Init => self.init().map(|_| EXECUTION_SUCCESS),
            BridgeCommand::Load(path) => self.load(&path).map(|_| EXECUTION_SUCCESS),
            BridgeCommand::Call { function, args } => self.call_function(&function, &args),
        }
    }

    /// Parse, execute and convert any error into an exit status plus a
    /// diagnostic on stderr.
    pub fn run_words(&self, words: WordList) -> ExitStatus {
        match BridgeCommand::parse(words).and_then(|command| self.execute(command)) {
            Ok(status) => status,
            Err(err) => {
                self.report(&err);
                err.exit_status()
            }
        }
    }

    fn report(&self, err: &BridgeError) {
        let name = &self.config().builtin_name;
        if err.wants_usage() {
            tracing::debug!(target: "bridge", "{}", err);
            eprintln!("{}", usage(name));
            return;
        }
        match err {
            BridgeError::UnexpectedReturnType(_) => {
                tracing::warn!(target: "bridge.dispatch", "{}", err);
                eprintln!("{}: {}", name, err);
            }
            _ => {
                tracing::error!(target: "bridge", "{}", err);
                eprintln!("{} error: {}", name, err);
            }
        }
    }
}

impl Builtin for Bridge {
    fn run(&self, args: WordList) -> ExitStatus {
        self.run_words(args)
    }
}
