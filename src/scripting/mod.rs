pub mod api;
pub mod engine;

pub use api::{install, ShellApi};
pub use engine::{ScriptEngine, ScriptReturn};
