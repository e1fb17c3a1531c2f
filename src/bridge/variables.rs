//! Shell variable accessors.

use crate::host::ShellHost;

/// Value of `name`, or `None` if it is undefined or has no value.
pub fn get_variable(host: &dyn ShellHost, name: &str) -> Option<String> {
    host.find_variable(name).and_then(|var| var.value)
}

/// Create or overwrite `name`.
pub fn set_variable(host: &dyn ShellHost, name: &str, value: &str) {
    host.bind_variable(name, value);
}

/// Every variable in host order. Valueless variables are kept as `None`.
pub fn environment(host: &dyn ShellHost) -> Vec<(String, Option<String>)> {
    host.all_shell_variables()
        .into_iter()
        .map(|var| (var.name, var.value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MiniShell;

    #[test]
    fn test_set_then_get() {
        let shell = MiniShell::with_version("5.2");
        assert_eq!(get_variable(&shell, "X"), None);

        set_variable(&shell, "X", "v");
        assert_eq!(get_variable(&shell, "X").as_deref(), Some("v"));

        set_variable(&shell, "X", "w");
        assert_eq!(get_variable(&shell, "X").as_deref(), Some("w"));
    }

    #[test]
    fn test_environment_keeps_valueless_entries() {
        let shell = MiniShell::with_version("5.2");
        set_variable(&shell, "X", "v");
        shell.declare("DECLARED");

        let env = environment(&shell);
        assert!(env.contains(&("X".to_string(), Some("v".to_string()))));
        assert!(env.contains(&("DECLARED".to_string(), None)));
        assert!(env.iter().any(|(name, _)| name == "BASH_VERSION"));
    }
}
