// ============================================================================
// 脚本引擎封装
// 持有 QuickJS 运行时与上下文，负责执行代码块、按名称调用全局函数，
// 并把引擎异常转换为文本
// ============================================================================

use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{Context, Ctx, Runtime, Value};
use std::fs;
use std::path::Path;

use crate::core::{BridgeError, BridgeResult};

/// 脚本函数的返回值（已脱离引擎生命周期）
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptReturn {
    Number(f64),
    Bool(bool),
    /// `undefined` 或 `null`
    Nil,
    /// 其他类型，保存类型名
    Other(String),
}

impl ScriptReturn {
    fn from_value(value: &Value<'_>) -> Self {
        if let Some(n) = value.as_number() {
            ScriptReturn::Number(n)
        } else if let Some(b) = value.as_bool() {
            ScriptReturn::Bool(b)
        } else if value.is_undefined() || value.is_null() {
            ScriptReturn::Nil
        } else {
            ScriptReturn::Other(format!("{:?}", value.type_of()).to_lowercase())
        }
    }
}

/// 嵌入式脚本引擎
pub struct ScriptEngine {
    #[allow(dead_code)]
    runtime: Runtime,
    context: Context,
}

impl ScriptEngine {
    pub fn new() -> BridgeResult<Self> {
        let runtime = Runtime::new().map_err(|e| BridgeError::EngineCreation(e.to_string()))?;
        let context =
            Context::full(&runtime).map_err(|e| BridgeError::EngineCreation(e.to_string()))?;

        Ok(Self { runtime, context })
    }

    /// 在引擎上下文中执行闭包
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: for<'js> FnOnce(Ctx<'js>) -> R,
    {
        self.context.with(f)
    }

    /// 读取并执行脚本文件
    pub fn eval_file(&self, path: &Path) -> BridgeResult<()> {
        let source = fs::read_to_string(path).map_err(|e| BridgeError::ChunkLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.eval_chunk(path, &source)
    }

    /// 执行一段源码；语法错误视为加载失败，其余异常视为运行时错误
    pub fn eval_chunk(&self, path: &Path, source: &str) -> BridgeResult<()> {
        self.context.with(|ctx| match ctx.eval::<(), _>(source) {
            Ok(()) => Ok(()),
            Err(e) => {
                let thrown = Thrown::catch(&ctx, e);
                if thrown.is_syntax_error() {
                    Err(BridgeError::ChunkLoad {
                        path: path.to_path_buf(),
                        reason: thrown.to_string(),
                    })
                } else {
                    Err(BridgeError::ScriptRuntime(format!(
                        "{}: {}",
                        path.display(),
                        thrown
                    )))
                }
            }
        })
    }

    /// 按名称调用全局函数，参数按顺序传入
    pub fn call_global(&self, name: &str, args: Vec<String>) -> BridgeResult<ScriptReturn> {
        self.context.with(|ctx| {
            let value: Value = ctx
                .globals()
                .get(name)
                .map_err(|e| BridgeError::ScriptRuntime(Thrown::catch(&ctx, e).to_string()))?;
            let Some(func) = value.as_function() else {
                return Err(BridgeError::FunctionNotFound(name.to_string()));
            };

            match func.call::<_, Value>((Rest(args),)) {
                Ok(result) => Ok(ScriptReturn::from_value(&result)),
                Err(e) => Err(BridgeError::ScriptRuntime(
                    Thrown::catch(&ctx, e).to_string(),
                )),
            }
        })
    }
}

/// 从引擎中取出的异常描述
struct Thrown {
    name: Option<String>,
    message: String,
}

impl Thrown {
    fn catch(ctx: &Ctx<'_>, err: rquickjs::Error) -> Self {
        if !err.is_exception() {
            return Self {
                name: None,
                message: err.to_string(),
            };
        }

        let value = ctx.catch();
        if let Some(obj) = value.as_object() {
            let name = obj.get::<_, Option<String>>("name").ok().flatten();
            let message = obj
                .get::<_, Option<String>>("message")
                .ok()
                .flatten()
                .unwrap_or_default();
            Self { name, message }
        } else {
            // 非对象异常值按 JS 的 String() 规则转换
            let message = value
                .get::<Coerced<String>>()
                .map(|s| s.0)
                .unwrap_or_else(|_| format!("uncaught {:?}", value.type_of()).to_lowercase());
            Self {
                name: None,
                message,
            }
        }
    }

    fn is_syntax_error(&self) -> bool {
        self.name.as_deref() == Some("SyntaxError")
    }
}

impl std::fmt::Display for Thrown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}: {}", name, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn chunk() -> PathBuf {
        PathBuf::from("test.js")
    }

    #[test]
    fn test_engine_creation() {
        let engine = ScriptEngine::new().unwrap();
        engine.eval_chunk(&chunk(), "var ready = true;").unwrap();
    }

    #[test]
    fn test_call_global_with_args() {
        let engine = ScriptEngine::new().unwrap();
        engine
            .eval_chunk(&chunk(), "function count() { return arguments.length; }")
            .unwrap();
        let result = engine
            .call_global("count", vec!["a".into(), "b".into(), "c".into()])
            .unwrap();
        assert_eq!(result, ScriptReturn::Number(3.0));
    }

    #[test]
    fn test_return_types() {
        let engine = ScriptEngine::new().unwrap();
        engine
            .eval_chunk(
                &chunk(),
                r#"
                function yes() { return true; }
                function nothing() {}
                function nul() { return null; }
                function table() { return { a: 1 }; }
                function text() { return "5"; }
                "#,
            )
            .unwrap();

        assert_eq!(engine.call_global("yes", vec![]).unwrap(), ScriptReturn::Bool(true));
        assert_eq!(engine.call_global("nothing", vec![]).unwrap(), ScriptReturn::Nil);
        assert_eq!(engine.call_global("nul", vec![]).unwrap(), ScriptReturn::Nil);
        assert!(matches!(
            engine.call_global("table", vec![]).unwrap(),
            ScriptReturn::Other(_)
        ));
        assert!(matches!(
            engine.call_global("text", vec![]).unwrap(),
            ScriptReturn::Other(_)
        ));
    }

    #[test]
    fn test_missing_function() {
        let engine = ScriptEngine::new().unwrap();
        let err = engine.call_global("ghost", vec![]).unwrap_err();
        assert!(matches!(err, BridgeError::FunctionNotFound(name) if name == "ghost"));
    }

    #[test]
    fn test_exception_is_stringified() {
        let engine = ScriptEngine::new().unwrap();
        engine
            .eval_chunk(&chunk(), "function boom(what) { throw new Error('bad ' + what); }")
            .unwrap();
        let err = engine.call_global("boom", vec!["input".into()]).unwrap_err();
        match err {
            BridgeError::ScriptRuntime(msg) => assert_eq!(msg, "Error: bad input"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_thrown_primitives_are_stringified() {
        let engine = ScriptEngine::new().unwrap();
        engine
            .eval_chunk(
                &chunk(),
                r#"
                function number() { throw 5; }
                function text() { throw "plain text"; }
                function flag() { throw false; }
                "#,
            )
            .unwrap();

        for (name, expected) in [("number", "5"), ("text", "plain text"), ("flag", "false")] {
            match engine.call_global(name, vec![]).unwrap_err() {
                BridgeError::ScriptRuntime(msg) => assert_eq!(msg, expected),
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_syntax_error_is_load_error() {
        let engine = ScriptEngine::new().unwrap();
        let err = engine.eval_chunk(&chunk(), "function (").unwrap_err();
        assert!(matches!(err, BridgeError::ChunkLoad { .. }));

        let err = engine.eval_chunk(&chunk(), "undefinedThing();").unwrap_err();
        assert!(matches!(err, BridgeError::ScriptRuntime(_)));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let engine = ScriptEngine::new().unwrap();
        let err = engine
            .eval_file(Path::new("/definitely/not/here.js"))
            .unwrap_err();
        assert!(matches!(err, BridgeError::ChunkLoad { .. }));
    }
}
