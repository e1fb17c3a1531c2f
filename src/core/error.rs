//! 统一错误处理模块
//!
//! 桥接层范围内的统一错误类型定义。
//!
//! 错误只在发生的边界处理：在内建命令入口转换为 shell 退出码，并向标准错误
//! 输出诊断信息；脚本侧的错误在命名空间函数中转换为 JS 异常。不存在跨越
//! shell/脚本边界的异常传播。

use std::path::PathBuf;

use thiserror::Error;

use super::status::{ExitStatus, EXECUTION_FAILURE, EXECUTION_SUCCESS};

/// 桥接层错误类型
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("not initialized yet!")]
    UninitializedAccess,

    #[error("unknown/unsupported bash version: {0}")]
    UnsupportedHostVersion(String),

    #[error("failed to initialize script engine: {0}")]
    EngineCreation(String),

    #[error("cannot load chunk {path}: {reason}")]
    ChunkLoad { path: PathBuf, reason: String },

    #[error("{0}")]
    ScriptRuntime(String),

    #[error("'{0}' is not a function")]
    FunctionNotFound(String),

    /// 仅用于诊断，不会导致失败
    #[error("unexpected type '{0}' returned")]
    UnexpectedReturnType(String),

    #[error("malformed invocation: {0}")]
    MalformedInvocation(String),

    #[error("host shell is no longer available")]
    HostUnavailable,

    #[error("script engine is busy; re-entrant calls are not supported")]
    EngineBusy,
}

impl BridgeError {
    /// 错误对应的 shell 退出码
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            BridgeError::UnexpectedReturnType(_) => EXECUTION_SUCCESS,
            _ => EXECUTION_FAILURE,
        }
    }

    /// 是否应在错误信息之后打印用法
    pub fn wants_usage(&self) -> bool {
        matches!(self, BridgeError::MalformedInvocation(_))
    }
}

/// 桥接层结果类型别名
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::UnsupportedHostVersion("1.14.7".to_string());
        assert_eq!(err.to_string(), "unknown/unsupported bash version: 1.14.7");

        let err = BridgeError::ChunkLoad {
            path: PathBuf::from("/tmp/missing.js"),
            reason: "No such file or directory".to_string(),
        };
        assert!(err.to_string().contains("/tmp/missing.js"));
    }

    #[test]
    fn test_failure_statuses() {
        assert_eq!(BridgeError::EngineBusy.exit_status(), EXECUTION_FAILURE);
        assert_eq!(BridgeError::HostUnavailable.exit_status(), EXECUTION_FAILURE);
        assert_eq!(
            BridgeError::FunctionNotFound("ghost".into()).exit_status(),
            EXECUTION_FAILURE
        );
    }

    #[test]
    fn test_unexpected_return_is_not_fatal() {
        let err = BridgeError::UnexpectedReturnType("object".to_string());
        assert_eq!(err.exit_status(), 0);
        assert!(!err.wants_usage());
        assert!(BridgeError::MalformedInvocation("load".into()).wants_usage());
    }
}
