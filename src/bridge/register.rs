//! Script-side `register`: install a shell function that calls back into the
//! script engine.

use crate::core::{BridgeError, BridgeResult};
use crate::host::{make_simple_command, Command, HostFlavor, ShellHost, WordList};

/// Sub-command the function body invokes.
pub const CALL_SUBCOMMAND: &str = "call";
/// Expanded by the host to the function's positional parameters.
pub const FORWARD_ALL_ARGS: &str = "$@";

/// Body of a registered function: `<builtin> call <name> $@`.
pub fn function_body(
    flavor: Option<HostFlavor>,
    builtin_name: &str,
    name: &str,
) -> BridgeResult<Command> {
    let words: WordList = [builtin_name, CALL_SUBCOMMAND, name, FORWARD_ALL_ARGS]
        .into_iter()
        .collect();
    make_simple_command(flavor, words)
}

/// Bind `name` as a shell function forwarding to the script function of the
/// same name. An existing function called `name` is replaced.
pub fn register_function(
    host: &dyn ShellHost,
    flavor: Option<HostFlavor>,
    builtin_name: &str,
    name: &str,
) -> BridgeResult<()> {
    if name.is_empty() {
        return Err(BridgeError::MalformedInvocation(
            "register: empty function name".to_string(),
        ));
    }

    let body = function_body(flavor, builtin_name, name)?;
    tracing::debug!(target: "bridge", "register shell function {}", name);
    host.bind_function(name, body);
    Ok(())
}
