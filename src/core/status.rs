//! Shell exit status conventions.

/// Exit status as the host shell reports it.
pub type ExitStatus = i32;

pub const EXECUTION_SUCCESS: ExitStatus = 0;
pub const EXECUTION_FAILURE: ExitStatus = 1;
/// Permission denied / not executable.
pub const EX_NOEXEC: ExitStatus = 126;
/// Command not found.
pub const EX_NOTFOUND: ExitStatus = 127;
