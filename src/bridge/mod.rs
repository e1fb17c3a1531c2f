//! The bridge context: lifecycle, engine ownership and shell-to-script calls.
//!
//! A [`Bridge`] is created once per host and starts Uninitialized. `init`
//! detects the host flavor from the version variable, creates the script
//! engine and installs the shell namespace into it; after that the bridge is
//! Initialized for the rest of its life. Flavor and engine live in
//! `OnceCell`s and are never reset.

pub mod builtin;
pub mod dispatch;
pub mod invoke;
pub mod register;
pub mod variables;

use std::cell::{Cell, OnceCell};
use std::path::Path;
use std::rc::{Rc, Weak};

pub use builtin::{usage, BridgeCommand, BRIDGE_VERSION};

use crate::config::BridgeConfig;
use crate::core::{BridgeError, BridgeResult, ExitStatus};
use crate::host::{HostFlavor, ShellHost, WordList};
use crate::scripting::{self, ScriptEngine, ShellApi};

pub struct Bridge {
    host: Weak<dyn ShellHost>,
    config: BridgeConfig,
    flavor: OnceCell<HostFlavor>,
    engine: OnceCell<ScriptEngine>,
    busy: Cell<bool>,
}

impl Bridge {
    pub fn new(host: Weak<dyn ShellHost>, config: BridgeConfig) -> Self {
        Self {
            host,
            config,
            flavor: OnceCell::new(),
            engine: OnceCell::new(),
            busy: Cell::new(false),
        }
    }

    /// Create a bridge for `host` and enable it there under the configured
    /// builtin name.
    pub fn attach<H: ShellHost + 'static>(host: &Rc<H>, config: BridgeConfig) -> Rc<Bridge> {
        let host: Rc<dyn ShellHost> = host.clone();
        let bridge = Rc::new(Bridge::new(Rc::downgrade(&host), config));
        host.enable_builtin(&bridge.config.builtin_name, bridge.clone());
        bridge
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn flavor(&self) -> Option<HostFlavor> {
        self.flavor.get().copied()
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.get().is_some()
    }

    fn host(&self) -> BridgeResult<Rc<dyn ShellHost>> {
        self.host.upgrade().ok_or(BridgeError::HostUnavailable)
    }

    /// Initialize the engine. A no-op once initialized; after a failure the
    /// bridge stays Uninitialized and `init` may be retried.
    pub fn init(&self) -> BridgeResult<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let host = self.host()?;
        let var = &self.config.version_variable;
        let version = host
            .find_variable(var)
            .and_then(|v| v.value)
            .ok_or_else(|| BridgeError::UnsupportedHostVersion(format!("{} is not set", var)))?;
        let detected = HostFlavor::detect(&version)
            .ok_or_else(|| BridgeError::UnsupportedHostVersion(version.clone()))?;
        let flavor = *self.flavor.get_or_init(|| detected);

        let engine = ScriptEngine::new()?;
        let api = Rc::new(ShellApi::new(
            self.host.clone(),
            flavor,
            &self.config.builtin_name,
        ));
        engine
            .with(|ctx| scripting::install(&ctx, &self.config.namespace, api))
            .map_err(|e| BridgeError::EngineCreation(e.to_string()))?;

        if self.engine.set(engine).is_err() {
            return Err(BridgeError::EngineBusy);
        }
        tracing::info!(
            target: "bridge",
            "initialized for host {} ({}), namespace '{}'",
            version,
            flavor,
            self.config.namespace
        );
        Ok(())
    }

    /// Initialize if needed, then load and run the chunk at `path`.
    pub fn load(&self, path: &Path) -> BridgeResult<()> {
        self.init()?;
        let engine = self.engine.get().ok_or(BridgeError::UninitializedAccess)?;
        let _guard = self.enter()?;
        tracing::debug!(target: "bridge", "load {}", path.display());
        engine.eval_file(path)
    }

    /// Call the global script function `name` with `args`.
    ///
    /// Empty words are not passed. The returned status follows the script's
    /// return value; see [`dispatch::exit_status`].
    pub fn call_function(&self, name: &str, args: &WordList) -> BridgeResult<ExitStatus> {
        let engine = self.engine.get().ok_or(BridgeError::UninitializedAccess)?;
        let _guard = self.enter()?;

        let args = dispatch::marshal_args(args);
        tracing::debug!(target: "bridge.dispatch", "call {} with {} args", name, args.len());
        let ret = engine.call_global(name, args)?;
        dispatch::exit_status(&ret)
    }

    fn enter(&self) -> BridgeResult<BusyGuard<'_>> {
        if self.busy.replace(true) {
            return Err(BridgeError::EngineBusy);
        }
        Ok(BusyGuard(&self.busy))
    }
}

/// Clears the busy flag when the engine call returns.
struct BusyGuard<'a>(&'a Cell<bool>);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MiniShell;
    use std::io::Write;

    fn bridge_for(version: &str) -> (Rc<MiniShell>, Rc<Bridge>) {
        let shell = Rc::new(MiniShell::with_version(version));
        let bridge = Bridge::attach(&shell, BridgeConfig::default());
        (shell, bridge)
    }

    fn chunk(source: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".js").tempfile().unwrap();
        file.write_all(source.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_attach_enables_builtin() {
        let (shell, bridge) = bridge_for("5.2");
        assert!(shell.has_builtin("bridge"));
        assert!(!bridge.is_initialized());
        assert_eq!(bridge.flavor(), None);
    }

    #[test]
    fn test_init_detects_flavor() {
        let (_shell, bridge) = bridge_for("2.05b.0(1)-release");
        bridge.init().unwrap();
        assert_eq!(bridge.flavor(), Some(HostFlavor::V2));

        let (_shell, bridge) = bridge_for("4.4.23(1)-release");
        bridge.init().unwrap();
        assert_eq!(bridge.flavor(), Some(HostFlavor::V3));
    }

    #[test]
    fn test_init_rejects_unknown_version() {
        let (_shell, bridge) = bridge_for("1.14.7");
        let err = bridge.init().unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedHostVersion(_)));
        assert!(!bridge.is_initialized());
        assert_eq!(bridge.flavor(), None);
    }

    #[test]
    fn test_init_requires_version_variable() {
        let shell = Rc::new(MiniShell::with_version("5.2"));
        let config = BridgeConfig {
            version_variable: "NO_SUCH_VERSION".to_string(),
            ..BridgeConfig::default()
        };
        let bridge = Bridge::attach(&shell, config);
        assert!(matches!(
            bridge.init(),
            Err(BridgeError::UnsupportedHostVersion(_))
        ));

        // retry succeeds once the variable exists
        shell.bind_variable("NO_SUCH_VERSION", "3.0");
        bridge.init().unwrap();
        assert!(bridge.is_initialized());
    }

    #[test]
    fn test_init_is_idempotent() {
        let (_shell, bridge) = bridge_for("5.2");
        bridge.init().unwrap();
        let file = chunk("var counter = 41; function bump() { counter += 1; return counter; }");
        bridge.load(file.path()).unwrap();

        bridge.init().unwrap();
        // state survived the second init
        assert_eq!(bridge.call_function("bump", &WordList::new()).unwrap(), 42);
    }

    #[test]
    fn test_call_before_init() {
        let (_shell, bridge) = bridge_for("5.2");
        let err = bridge.call_function("anything", &WordList::new()).unwrap_err();
        assert!(matches!(err, BridgeError::UninitializedAccess));
        assert!(!bridge.is_initialized());
    }

    #[test]
    fn test_load_auto_initializes() {
        let (_shell, bridge) = bridge_for("5.2");
        let file = chunk("function ok() { return 0; }");
        bridge.load(file.path()).unwrap();
        assert!(bridge.is_initialized());
        assert_eq!(bridge.call_function("ok", &WordList::new()).unwrap(), 0);
    }

    #[test]
    fn test_load_errors() {
        let (_shell, bridge) = bridge_for("5.2");
        let err = bridge.load(Path::new("/no/such/chunk.js")).unwrap_err();
        assert!(matches!(err, BridgeError::ChunkLoad { .. }));

        let file = chunk("throw new Error('at load time');");
        let err = bridge.load(file.path()).unwrap_err();
        assert!(matches!(err, BridgeError::ScriptRuntime(msg) if msg.contains("at load time")));
    }

    #[test]
    fn test_host_dropped() {
        let (shell, bridge) = bridge_for("5.2");
        drop(shell);
        assert!(matches!(bridge.init(), Err(BridgeError::HostUnavailable)));
    }
}
