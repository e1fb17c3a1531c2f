//! 脚本API - 安装到引擎中的 shell 接口
//!
//! Installs the namespace object (`bash` by default) with `register`,
//! `getVariable`, `setVariable`, `getEnvironment` and `call`, plus a
//! `console` object and a global `print`.

use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{Ctx, Exception, Function, Object, Value};
use std::rc::{Rc, Weak};

use crate::bridge::invoke::invoke_command;
use crate::bridge::register::register_function;
use crate::bridge::variables::{environment, get_variable, set_variable};
use crate::core::BridgeError;
use crate::host::{HostFlavor, ShellHost};

/// Everything the namespace functions need from the bridge.
pub struct ShellApi {
    host: Weak<dyn ShellHost>,
    flavor: HostFlavor,
    builtin_name: String,
}

impl ShellApi {
    pub fn new(host: Weak<dyn ShellHost>, flavor: HostFlavor, builtin_name: &str) -> Self {
        Self {
            host,
            flavor,
            builtin_name: builtin_name.to_string(),
        }
    }

    fn host(&self, ctx: &Ctx<'_>) -> rquickjs::Result<Rc<dyn ShellHost>> {
        self.host
            .upgrade()
            .ok_or_else(|| throw(ctx, BridgeError::HostUnavailable))
    }
}

fn throw(ctx: &Ctx<'_>, err: BridgeError) -> rquickjs::Error {
    Exception::throw_message(ctx, &err.to_string())
}

/// Install the shell namespace and the console helpers into `ctx`.
pub fn install<'js>(ctx: &Ctx<'js>, namespace: &str, api: Rc<ShellApi>) -> rquickjs::Result<()> {
    let global = ctx.globals();
    let shell_obj = Object::new(ctx.clone())?;

    // bash.register(name)
    let a = Rc::clone(&api);
    shell_obj.set(
        "register",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, name: Coerced<String>| -> rquickjs::Result<()> {
                let host = a.host(&ctx)?;
                register_function(host.as_ref(), Some(a.flavor), &a.builtin_name, &name.0)
                    .map_err(|e| throw(&ctx, e))
            },
        )?,
    )?;

    // bash.getVariable(name) -> string | undefined
    let a = Rc::clone(&api);
    shell_obj.set(
        "getVariable",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, name: Coerced<String>| -> rquickjs::Result<Option<String>> {
                let host = a.host(&ctx)?;
                Ok(get_variable(host.as_ref(), &name.0))
            },
        )?,
    )?;

    // bash.setVariable(name, value)
    let a = Rc::clone(&api);
    shell_obj.set(
        "setVariable",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>,
                  name: Coerced<String>,
                  value: Coerced<String>|
                  -> rquickjs::Result<()> {
                let host = a.host(&ctx)?;
                set_variable(host.as_ref(), &name.0, &value.0);
                Ok(())
            },
        )?,
    )?;

    // bash.getEnvironment() -> { NAME: value, ... }
    // The snapshot has no prototype so names like `__proto__` stay plain keys.
    let a = Rc::clone(&api);
    shell_obj.set(
        "getEnvironment",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>| -> rquickjs::Result<Object<'js>> {
                let host = a.host(&ctx)?;
                let env = bare_object(&ctx)?;
                for (name, value) in environment(host.as_ref()) {
                    env.set(name, value)?;
                }
                Ok(env)
            },
        )?,
    )?;

    // bash.call(program, ...args) -> exit status
    let a = Rc::clone(&api);
    shell_obj.set(
        "call",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, args: Rest<Coerced<String>>| -> rquickjs::Result<i32> {
                let host = a.host(&ctx)?;
                let args = args.0.into_iter().map(|arg| arg.0).collect();
                invoke_command(host.as_ref(), Some(a.flavor), args).map_err(|e| throw(&ctx, e))
            },
        )?,
    )?;

    global.set(namespace, shell_obj)?;

    let console_obj = Object::new(ctx.clone())?;
    console_obj.set(
        "log",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            tracing::info!(target: "script.console", "{}", join(args));
        })?,
    )?;
    console_obj.set(
        "warn",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            tracing::warn!(target: "script.console", "{}", join(args));
        })?,
    )?;
    console_obj.set(
        "error",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            tracing::error!(target: "script.console", "{}", join(args));
        })?,
    )?;
    global.set("console", console_obj)?;

    global.set(
        "print",
        Function::new(ctx.clone(), |args: Rest<Coerced<String>>| {
            println!("{}", join(args));
        })?,
    )?;

    Ok(())
}

/// `Object.create(null)`
fn bare_object<'js>(ctx: &Ctx<'js>) -> rquickjs::Result<Object<'js>> {
    let object: Object = ctx.globals().get("Object")?;
    let create: Function = object.get("create")?;
    create.call((Value::new_null(ctx.clone()),))
}

fn join(args: Rest<Coerced<String>>) -> String {
    args.0
        .into_iter()
        .map(|arg| arg.0)
        .collect::<Vec<_>>()
        .join(" ")
}
