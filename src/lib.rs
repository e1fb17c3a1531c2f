//! # Shell Bridge
//!
//! A two-way bridge between a command shell and an embedded QuickJS script
//! engine.
//!
//! ## Features
//!
//! - **Shell → script**: `bridge init`, `bridge load <chunk>` and
//!   `bridge call <fn> [args...]`, with the script's return value mapped onto
//!   an exit status
//! - **Script → shell**: a `bash` namespace with `register`, `getVariable`,
//!   `setVariable`, `getEnvironment` and `call`
//! - **Version skew**: host command records are built in the version-2 or
//!   version-3 layout depending on the detected host version
//!
//! ## Architecture
//!
//! The host shell is reached only through the [`host::ShellHost`] trait. A
//! [`bridge::Bridge`] is the explicit context object holding the detected
//! flavor and the script engine; it is enabled in the host as a builtin.
//! [`host::MiniShell`] is a small in-process host used by the binary and
//! the tests.
//!
//! The engine is not re-entrant. While a script function is running, any
//! shell command it starts through `bash.call` cannot call back into the
//! engine: `bridge call`, and registered functions (which expand to
//! `bridge call`), fail there with status 1 and an "engine is busy"
//! diagnostic. Registered functions therefore cannot call each other through
//! `bash.call`; call the script function directly instead.
//!
//! ### Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use shell_bridge::{Bridge, BridgeConfig, MiniShell};
//!
//! let shell = Rc::new(MiniShell::with_version("5.2.21(1)-release"));
//! let _bridge = Bridge::attach(&shell, BridgeConfig::default());
//! shell.run_line("bridge load ./hooks.js");
//! shell.run_line("bridge call greet world");
//! ```

/// Error types, exit status conventions and shared macros
pub mod core;
/// Configuration loading and logging setup
pub mod config;
/// Host shell collaborator: words, command records, the host trait
pub mod host;
/// Embedded script engine and the API installed into it
pub mod scripting;
/// Bridge lifecycle, entry point and call marshaling
pub mod bridge;

pub use bridge::{Bridge, BridgeCommand};
pub use config::BridgeConfig;
pub use core::{BridgeError, BridgeResult, ExitStatus};
pub use host::{MiniShell, ShellHost};
