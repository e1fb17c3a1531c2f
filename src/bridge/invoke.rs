//! Script-side `call`: run an arbitrary shell command.

use crate::core::{BridgeResult, ExitStatus, EX_NOTFOUND};
use crate::host::{HostFlavor, ShellHost, WordList};

/// Build a command from `args` (program name first) and execute it.
///
/// With no arguments nothing is built and 127 is returned.
pub fn invoke_command(
    host: &dyn ShellHost,
    flavor: Option<HostFlavor>,
    args: Vec<String>,
) -> BridgeResult<ExitStatus> {
    if args.is_empty() {
        return Ok(EX_NOTFOUND);
    }

    let words: WordList = args.into_iter().collect();
    let command = words.into_simple_command(flavor)?;
    tracing::debug!(target: "bridge", "invoke {}", command);
    Ok(host.execute_command(command))
}
