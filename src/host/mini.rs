//! A small in-process host shell.
//!
//! `MiniShell` implements [`ShellHost`] with just enough of a shell to drive
//! the bridge end to end: a variable table, a function table, builtins,
//! positional parameters, `$` expansion, plain `NAME=value` assignments and
//! external programs. It reads one command per line; there are no pipes,
//! lists, redirections or compound commands.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::process;
use std::rc::Rc;

use super::command::{make_simple_command, Command, CommandFlags, HostFlavor};
use super::word::{Word, WordFlags, WordList};
use super::{Builtin, ShellHost, ShellVariable, VarAttributes};
use crate::config::HostConfig;
use crate::core::{ExitStatus, EXECUTION_FAILURE, EXECUTION_SUCCESS, EX_NOEXEC, EX_NOTFOUND};

/// Name reported as `$0`.
const SHELL_NAME: &str = "mini-shell";

pub struct MiniShell {
    config: HostConfig,
    flavor: Option<HostFlavor>,
    variables: RefCell<BTreeMap<String, ShellVariable>>,
    functions: RefCell<HashMap<String, Command>>,
    builtins: RefCell<HashMap<String, Rc<dyn Builtin>>>,
    /// One frame per active function call.
    positional: RefCell<Vec<Vec<String>>>,
    last_status: Cell<ExitStatus>,
    depth: Cell<usize>,
}

impl MiniShell {
    /// Create a shell reporting `config.version` as its `BASH_VERSION`.
    pub fn new(config: HostConfig) -> Self {
        let flavor = HostFlavor::detect(&config.version);
        let shell = Self {
            flavor,
            variables: RefCell::new(BTreeMap::new()),
            functions: RefCell::new(HashMap::new()),
            builtins: RefCell::new(HashMap::new()),
            positional: RefCell::new(Vec::new()),
            last_status: Cell::new(EXECUTION_SUCCESS),
            depth: Cell::new(0),
            config,
        };
        let version = shell.config.version.clone();
        shell.bind_variable("BASH_VERSION", &version);
        shell
    }

    /// Create a shell with the default host configuration.
    pub fn with_version(version: &str) -> Self {
        Self::new(HostConfig {
            version: version.to_string(),
            ..HostConfig::default()
        })
    }

    /// Import the process environment as exported variables.
    pub fn import_environment(&self) {
        for (name, value) in std::env::vars() {
            if name == "BASH_VERSION" {
                continue;
            }
            self.bind_variable(&name, &value);
            self.export(&name);
        }
    }

    /// Mark a variable as exported to child processes.
    pub fn export(&self, name: &str) {
        let mut vars = self.variables.borrow_mut();
        if let Some(var) = vars.get_mut(name) {
            var.attributes |= VarAttributes::EXPORTED;
            var.exportstr = var.value.as_ref().map(|v| format!("{}={}", name, v));
        }
    }

    /// Declare a variable without a value.
    pub fn declare(&self, name: &str) {
        self.variables
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| ShellVariable {
                name: name.to_string(),
                value: None,
                exportstr: None,
                attributes: VarAttributes::empty(),
            });
    }

    pub fn flavor(&self) -> Option<HostFlavor> {
        self.flavor
    }

    pub fn last_status(&self) -> ExitStatus {
        self.last_status.get()
    }

    pub fn function_body(&self, name: &str) -> Option<Command> {
        self.functions.borrow().get(name).cloned()
    }

    pub fn has_builtin(&self, name: &str) -> bool {
        self.builtins.borrow().contains_key(name)
    }

    /// Parse and execute one line.
    ///
    /// A leading unquoted `!` inverts the command's status.
    pub fn run_line(&self, line: &str) -> ExitStatus {
        self.run_numbered(0, line)
    }

    /// Execute every line of `source`, returning the last status.
    pub fn run_script(&self, source: &str) -> ExitStatus {
        for (index, line) in source.lines().enumerate() {
            let number = i32::try_from(index + 1).unwrap_or(i32::MAX);
            self.run_numbered(number, line);
        }
        self.last_status()
    }

    fn run_numbered(&self, number: i32, line: &str) -> ExitStatus {
        let words = match parse_line(line) {
            Ok(Some(words)) => words,
            Ok(None) => return self.last_status(),
            Err(msg) => {
                eprintln!("{}{}", diagnostic_prefix(number), msg);
                return self.finish(EXECUTION_FAILURE);
            }
        };

        let invert = words
            .first()
            .is_some_and(|w| w.text == "!" && !w.flags.contains(WordFlags::QUOTED));
        let words = if invert {
            words.split_first().map(|(_, rest)| rest).unwrap_or_default()
        } else {
            words
        };

        match make_simple_command(self.flavor, words) {
            Ok(mut command) => {
                command.simple.set_line(number);
                if invert {
                    command.simple.insert_flags(CommandFlags::INVERT_RETURN);
                }
                self.execute_command(command)
            }
            Err(e) => {
                eprintln!("{}{}", diagnostic_prefix(number), e);
                self.finish(EXECUTION_FAILURE)
            }
        }
    }

    fn finish(&self, status: ExitStatus) -> ExitStatus {
        self.last_status.set(status);
        status
    }

    fn current_args(&self) -> Vec<String> {
        self.positional.borrow().last().cloned().unwrap_or_default()
    }

    /// Expand one word into zero or more fields.
    fn expand_word(&self, word: &Word) -> Vec<String> {
        if !word.flags.contains(WordFlags::HAS_DOLLAR) || word.flags.contains(WordFlags::NOEXPAND)
        {
            return vec![word.text.clone()];
        }
        if word.text == "$@" {
            return self.current_args();
        }

        let expanded = self.expand_inline(&word.text);
        if expanded.is_empty() && !word.flags.contains(WordFlags::QUOTED) {
            Vec::new()
        } else {
            vec![expanded]
        }
    }

    fn expand_inline(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            match chars.peek().copied() {
                Some('{') => {
                    chars.next();
                    let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
                    out.push_str(&self.parameter(&name));
                }
                Some(c) if c.is_ascii_digit() => {
                    chars.next();
                    out.push_str(&self.parameter(&c.to_string()));
                }
                Some(c @ ('?' | '#' | '@' | '*')) => {
                    chars.next();
                    out.push_str(&self.parameter(&c.to_string()));
                }
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                    let mut name = String::new();
                    while let Some(&c) = chars.peek() {
                        if c.is_ascii_alphanumeric() || c == '_' {
                            name.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    out.push_str(&self.parameter(&name));
                }
                _ => out.push('$'),
            }
        }
        out
    }

    fn parameter(&self, name: &str) -> String {
        match name {
            "?" => self.last_status().to_string(),
            "#" => self.current_args().len().to_string(),
            "@" | "*" => self.current_args().join(" "),
            "0" => SHELL_NAME.to_string(),
            _ if name.chars().all(|c| c.is_ascii_digit()) => name
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.current_args().get(i).cloned())
                .unwrap_or_default(),
            _ => self
                .find_variable(name)
                .and_then(|v| v.value)
                .unwrap_or_default(),
        }
    }

    fn call_function(&self, name: &str, body: Command, args: Vec<String>) -> ExitStatus {
        if self.depth.get() >= self.config.max_call_depth {
            eprintln!(
                "{}: {}: maximum function nesting level exceeded ({})",
                SHELL_NAME, name, self.config.max_call_depth
            );
            return EXECUTION_FAILURE;
        }

        self.depth.set(self.depth.get() + 1);
        self.positional.borrow_mut().push(args);
        let status = self.execute_command(body);
        self.positional.borrow_mut().pop();
        self.depth.set(self.depth.get() - 1);
        status
    }

    fn run_words(&self, line: i32, words: WordList) -> ExitStatus {
        if !words.is_empty() && words.iter().all(|w| w.assignment().is_some()) {
            for word in &words {
                if let Some((name, value)) = word.assignment() {
                    let value = self.expand_inline(value);
                    self.bind_variable(name, &value);
                }
            }
            return EXECUTION_SUCCESS;
        }

        let mut fields: Vec<String> = words.iter().flat_map(|w| self.expand_word(w)).collect();
        if fields.is_empty() {
            return EXECUTION_SUCCESS;
        }
        let name = fields.remove(0);
        tracing::trace!(target: "bridge.host", "execute {} {:?}", name, fields);

        let function = self.functions.borrow().get(&name).cloned();
        if let Some(body) = function {
            return self.call_function(&name, body, fields);
        }

        let builtin = self.builtins.borrow().get(&name).cloned();
        if let Some(builtin) = builtin {
            let args: WordList = fields
                .into_iter()
                .map(|f| Word::with_flags(f, WordFlags::NOEXPAND))
                .collect();
            return builtin.run(args);
        }

        if let Some(status) = self.run_internal(&name, &fields) {
            return status;
        }

        self.run_external(line, &name, &fields)
    }

    fn run_internal(&self, name: &str, args: &[String]) -> Option<ExitStatus> {
        match name {
            "true" | ":" => Some(EXECUTION_SUCCESS),
            "false" => Some(EXECUTION_FAILURE),
            "echo" => {
                println!("{}", args.join(" "));
                Some(EXECUTION_SUCCESS)
            }
            _ => None,
        }
    }

    fn run_external(&self, line: i32, name: &str, args: &[String]) -> ExitStatus {
        // exported variables are passed as their export strings
        let exported: Vec<(String, String)> = self
            .variables
            .borrow()
            .values()
            .filter_map(|v| v.exportstr.as_deref())
            .filter_map(|s| s.split_once('='))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        match process::Command::new(name).args(args).envs(exported).status() {
            Ok(status) => status.code().unwrap_or_else(|| signal_status(&status)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                eprintln!("{}{}: command not found", diagnostic_prefix(line), name);
                EX_NOTFOUND
            }
            Err(e) => {
                eprintln!("{}{}: {}", diagnostic_prefix(line), name, e);
                EX_NOEXEC
            }
        }
    }
}

fn diagnostic_prefix(line: i32) -> String {
    if line > 0 {
        format!("{}: line {}: ", SHELL_NAME, line)
    } else {
        format!("{}: ", SHELL_NAME)
    }
}

#[cfg(unix)]
fn signal_status(status: &process::ExitStatus) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|sig| 128 + sig).unwrap_or(EXECUTION_FAILURE)
}

#[cfg(not(unix))]
fn signal_status(_status: &process::ExitStatus) -> ExitStatus {
    EXECUTION_FAILURE
}

impl ShellHost for MiniShell {
    fn find_variable(&self, name: &str) -> Option<ShellVariable> {
        self.variables.borrow().get(name).cloned()
    }

    fn bind_variable(&self, name: &str, value: &str) {
        let mut vars = self.variables.borrow_mut();
        let var = vars
            .entry(name.to_string())
            .or_insert_with(|| ShellVariable::new(name, ""));
        var.value = Some(value.to_string());
        if var.is_exported() {
            var.exportstr = Some(format!("{}={}", name, value));
        }
    }

    fn all_shell_variables(&self) -> Vec<ShellVariable> {
        self.variables.borrow().values().cloned().collect()
    }

    fn bind_function(&self, name: &str, body: Command) {
        tracing::debug!(target: "bridge.host", "bind function {} -> {}", name, body);
        self.functions.borrow_mut().insert(name.to_string(), body);
    }

    fn execute_command(&self, command: Command) -> ExitStatus {
        if self.flavor != Some(command.flavor()) {
            eprintln!(
                "{}: refusing {} command record on a {} host",
                SHELL_NAME,
                command.flavor(),
                self.flavor
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "unrecognized".to_string())
            );
            return self.finish(EXECUTION_FAILURE);
        }

        let line = command.simple.line();
        if !command.simple.redirects().is_empty() {
            eprintln!("{}redirections are not supported", diagnostic_prefix(line));
            return self.finish(EXECUTION_FAILURE);
        }

        let invert = command.simple.flags().contains(CommandFlags::INVERT_RETURN);
        let status = self.run_words(line, command.simple.into_words());
        if invert {
            let inverted = if status == EXECUTION_SUCCESS {
                EXECUTION_FAILURE
            } else {
                EXECUTION_SUCCESS
            };
            return self.finish(inverted);
        }
        self.finish(status)
    }

    fn enable_builtin(&self, name: &str, builtin: Rc<dyn Builtin>) {
        tracing::debug!(target: "bridge.host", "enable builtin {}", name);
        self.builtins.borrow_mut().insert(name.to_string(), builtin);
    }
}

/// Split a line into words, honoring quotes, backslashes and `#` comments.
///
/// Returns `Ok(None)` for blank and comment-only lines.
pub fn parse_line(line: &str) -> Result<Option<WordList>, String> {
    let mut words = WordList::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.peek() {
            None => break,
            Some('#') => break,
            Some(_) => {}
        }

        let mut text = String::new();
        let mut quoted = false;
        let mut live_dollar = false;
        let mut dead_dollar = false;

        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            chars.next();
            match c {
                '\'' => {
                    quoted = true;
                    loop {
                        match chars.next() {
                            Some('\'') => break,
                            Some(c) => {
                                dead_dollar |= c == '$';
                                text.push(c);
                            }
                            None => return Err("unexpected EOF while looking for `''".into()),
                        }
                    }
                }
                '"' => {
                    quoted = true;
                    loop {
                        match chars.next() {
                            Some('"') => break,
                            Some('\\') => match chars.next() {
                                Some(c @ ('"' | '\\' | '$')) => {
                                    dead_dollar |= c == '$';
                                    text.push(c);
                                }
                                Some(c) => {
                                    text.push('\\');
                                    text.push(c);
                                }
                                None => return Err("unexpected EOF while looking for `\"'".into()),
                            },
                            Some(c) => {
                                live_dollar |= c == '$';
                                text.push(c);
                            }
                            None => return Err("unexpected EOF while looking for `\"'".into()),
                        }
                    }
                }
                '\\' => {
                    quoted = true;
                    if let Some(c) = chars.next() {
                        dead_dollar |= c == '$';
                        text.push(c);
                    }
                }
                c => {
                    live_dollar |= c == '$';
                    text.push(c);
                }
            }
        }

        let mut flags = Word::new(text.as_str()).flags;
        flags.remove(WordFlags::QUOTED);
        if quoted {
            flags |= WordFlags::QUOTED;
        }
        if !live_dollar {
            flags.remove(WordFlags::HAS_DOLLAR);
            if dead_dollar {
                flags |= WordFlags::NOEXPAND;
            }
        }
        words.push(Word::with_flags(text, flags));
    }

    Ok(if words.is_empty() { None } else { Some(words) })
}
